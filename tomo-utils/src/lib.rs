//! Utility library for the tomography simulator: convergence statistics and helpers that are
//! shared between the simulator and its reporting binaries.

pub mod convergence;
pub mod other;
