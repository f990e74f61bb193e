//! Mock implementations for testing and development.
//!
//! This module provides simulated data lines that can be controlled
//! programmatically without requiring physical hardware.

pub mod edge;

pub use edge::{MockEdgeHandle, MockEdgeSource, MockLine};
