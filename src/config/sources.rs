//! Configuration sources: global user file and workspace files.

pub mod global_file;
pub mod workspace_file;
