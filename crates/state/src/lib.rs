//! State interfaces used by execution, plus an in-memory canonical state.
//!
//! The executor only ever sees state through the traits in [`traits`].  The
//! in-memory implementation exists for tests, benchmarks and the parity tool;
//! a persistent database would implement the same traits.

mod account;
mod inert;
mod mem;
mod root;
pub mod traits;

pub use account::Account;
pub use inert::InertOp;
pub use mem::{MemSnapshot, MemState};
pub use root::compute_state_root;
pub use traits::*;
