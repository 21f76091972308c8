use std::path::PathBuf;

use clap::Parser;
use tracing::level_filters::LevelFilter;

#[derive(Parser)]
pub struct DaemonArgs {
    #[arg(long)]
    pub force: bool,
    #[arg(long)]
    pub dir: Option<PathBuf>,
    /// This option is for debugging purposes only.
    #[arg(long = "log-console")]
    pub log_console: bool,
    #[arg(long = "log-filter")]
    pub log: Option<LevelFilter>,
    /// Milliseconds between foreground polls.
    #[arg(long, default_value_t = 1000)]
    pub interval_ms: u64,
    /// Run the background application scan every Nth poll.
    #[arg(long, default_value_t = 5)]
    pub background_cadence: u32,
}
