//! Cut-Length Computation
//!
//! Neighbour resolution and thickness deduction over a complete piece set,
//! plus the thickness cache the engine reads from.

pub mod engine;
pub mod thickness;

pub use engine::{CutLengthEngine, EngineSettings};
pub use thickness::{Thickness, ThicknessCache, ThicknessSource};
