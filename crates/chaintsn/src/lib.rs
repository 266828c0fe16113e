//! State transition for a single message.
//!
//! [`apply_message`] is the only entry point.  It is generic over
//! [`ExecState`](parexec_state::ExecState) so the very same code runs against
//! canonical state in the serial executor and against a per-transaction
//! overlay in the parallel one.

pub mod errors;
pub mod events;
pub mod gas;
mod handlers;
pub mod transition;

pub use errors::{TsnError, TxFailure};
pub use gas::{GasMeter, GasPool, GasPoolError};
pub use handlers::{kvstore, validator};
pub use transition::{TxOutcome, apply_message};
