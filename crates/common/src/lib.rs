//! Plumbing shared by the binaries and benchmarks.

pub mod logging;
