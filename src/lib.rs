//! Baycut: Deterministic Bay Segmentation
//!
//! Turns a window or door bay (overall dimensions, three horizontal zones,
//! a bill of materials and user-placed mullions and transoms) into the full
//! list of profile pieces to cut, then computes each piece's cut length from
//! the thicknesses of the bars it meets.

pub mod config;
pub mod confirm;
pub mod cutting;
pub mod error;
pub mod formula;
pub mod generation;
pub mod geometry;
pub mod logging;
pub mod nomenclature;
pub mod piece;
pub mod regeneration;
pub mod store;
pub mod types;

pub use config::{BaycutConfig, ConfigLoader};
pub use error::{ChassisError, StorageError};
pub use regeneration::{GenerationReport, LengthReport, Regenerator};
