//! Level-parallel block executor.
//!
//! Every transaction kind has a footprint that can be read off the message
//! itself, so a block is split up front into levels of pairwise
//! non-conflicting transactions.  Each level runs concurrently against
//! private overlays of one shared snapshot, then the overlays are merged back
//! single-threaded in block order.  The result is identical to running the
//! block one transaction at a time, which [`execute_serial`] does and which shadow
//! mode checks against.

mod access;
mod errors;
mod executor;
pub mod instrumentation;
mod levels;
mod output;
mod phase;
mod serial;
mod verify;
mod write_buffer;

pub use access::{AccessSet, analyze_tx};
pub use errors::{ExecError, ExecResult};
pub use executor::BlockExecutor;
pub use levels::{build_levels, serial_levels};
pub use output::{BlockExecutionOutput, ExecPath};
pub use phase::{BlockPhase, PhaseTracker};
pub use serial::execute_serial;
pub use verify::{ParityReport, check_parity};
pub use write_buffer::{PendingWrites, WriteBuffer};
