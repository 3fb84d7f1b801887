use std::io::Write;

use env_logger::{Builder, Target};
use log::LevelFilter;

/// Installs the global logger.
///
/// An explicit `level` wins, then `RUST_LOG`, then `info`. Calling it twice
/// keeps the first logger.
pub fn init_logging(level: Option<LevelFilter>) {
    let log_level = level
        .or_else(|| {
            std::env::var("RUST_LOG")
                .ok()
                .and_then(|v| v.parse::<LevelFilter>().ok())
        })
        .unwrap_or(LevelFilter::Info);

    let _ = Builder::new()
        .filter_level(log_level)
        .target(Target::Stdout)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {:5} {}:{}] {}",
                buf.timestamp_millis(),
                record.level(),
                record
                    .file()
                    .unwrap_or("unknown")
                    .rsplit('/')
                    .next()
                    .unwrap_or("unknown"),
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .try_init();
}
