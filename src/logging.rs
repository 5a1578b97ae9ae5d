use std::fs::File;
use std::str::FromStr;

use crate::config::Config;

/// Installs a `tracing-subscriber` `fmt` layer: to `log_file` if configured,
/// stdout otherwise. Level comes from `log_level`, falling back to `info`
/// on an unrecognized value.
pub fn init_logging(config: &Config) {
    let level = tracing::Level::from_str(&config.log_level).unwrap_or(tracing::Level::INFO);
    let filter = tracing_subscriber::EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match &config.log_file {
        Some(path) => match File::create(path) {
            Ok(file) => builder.with_writer(file).init(),
            Err(e) => {
                builder.init();
                tracing::warn!(path, error = %e, "failed to open log file, logging to stdout");
            }
        },
        None => builder.init(),
    }
}
