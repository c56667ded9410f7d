//! Property-based tests for the geometry and length invariants

mod determinism;
