//! Component identifiers for tracing spans in block execution.

pub mod components {
    /// Whole-block execution. Fields: number, txs
    pub const EXEC_BLOCK: &str = "exec:block";

    /// One level of the parallel path. Fields: level, txs
    pub const EXEC_LEVEL: &str = "exec:level";

    /// Serial reference path. Fields: number, txs
    pub const EXEC_SERIAL: &str = "exec:serial";

    /// Shadow verification. Fields: number, txs
    pub const EXEC_SHADOW: &str = "exec:shadow";
}
