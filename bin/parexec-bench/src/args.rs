use std::path::PathBuf;

use argh::FromArgs;
use parexec_config::ExecMode;

/// Run generated blocks through the block executor and report timings.
#[derive(Debug, Clone, FromArgs)]
pub(crate) struct Args {
    /// path to a TOML config file, defaults are used if omitted
    #[argh(option, short = 'c')]
    pub(crate) config: Option<PathBuf>,

    /// execution mode overriding the config: serial, parallel or shadow
    #[argh(option, from_str_fn(parse_mode))]
    pub(crate) mode: Option<ExecMode>,

    /// seed for the block generator
    #[argh(option, default = "0")]
    pub(crate) seed: u64,

    /// number of blocks to run
    #[argh(option, default = "1")]
    pub(crate) blocks: u64,

    /// transactions per block
    #[argh(option, default = "256")]
    pub(crate) txs: usize,

    /// number of funded accounts senders are drawn from
    #[argh(option, default = "64")]
    pub(crate) accounts: usize,

    /// chance a sender is drawn from the two hot accounts
    #[argh(option, default = "0.2")]
    pub(crate) hot_rate: f64,

    /// gas limit of every block
    #[argh(option, default = "30_000_000")]
    pub(crate) gas_limit: u64,

    /// compare each block against the serial path before executing it
    #[argh(switch)]
    pub(crate) verify: bool,
}

fn parse_mode(raw: &str) -> Result<ExecMode, String> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "serial" => Ok(ExecMode::Serial),
        "parallel" => Ok(ExecMode::Parallel),
        "shadow" => Ok(ExecMode::Shadow),
        other => Err(format!("unknown mode '{other}'")),
    }
}
