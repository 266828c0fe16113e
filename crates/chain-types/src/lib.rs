//! Chain data types consumed and produced by block execution.
//!
//! Messages arrive already decoded and signature-checked.  Nothing here
//! touches state, so the analyzer and the state transition can both depend on
//! it without a cycle.

mod block;
mod message;
mod payload;
mod receipt;

pub use block::*;
pub use message::*;
pub use payload::*;
pub use receipt::*;
