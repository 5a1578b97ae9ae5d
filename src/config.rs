use clap::Parser;

/// Recognized options (§6), each settable by flag or by an environment
/// variable of the same upper-snake-case name; flags win on conflict.
#[derive(Parser, Debug)]
#[command(name = "vault-sync", about = "Client-side vault synchronization")]
pub struct Config {
    /// Remote endpoint, host:port.
    #[arg(long, env = "ADDRESS", default_value = "localhost:8080")]
    pub address: String,

    /// debug | info | warn | error
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Log destination file; stdout if unset.
    #[arg(long, env = "LOG_FILE")]
    pub log_file: Option<String>,

    /// Per-RPC deadline, in seconds.
    #[arg(long, env = "REQUEST_TIMEOUT", default_value_t = 3)]
    pub request_timeout: u64,

    /// Reconciler tick period, in seconds.
    #[arg(long, env = "SYNC_INTERVAL", default_value_t = 10)]
    pub sync_interval: u64,

    /// Run against the bundled in-process remote store instead of `address`.
    #[arg(long, env = "DEMO")]
    pub demo: bool,
}
