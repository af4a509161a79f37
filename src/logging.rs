use std::io::Write;
use std::str::FromStr;

use chrono::Local;
use log::{LevelFilter, SetLoggerError};

/// Installs the process logger.
///
/// `default_level` applies when `RUST_LOG` is unset; `RUST_LOG` directives
/// always win.
pub fn init(default_level: LevelFilter) -> Result<(), SetLoggerError> {
    env_logger::Builder::new()
        .filter_level(default_level)
        .parse_default_env()
        .format(|buf, record| {
            writeln!(
                buf,
                "{} [{}] {}: {}",
                Local::now().to_rfc3339(),
                record.level(),
                record.target(),
                record.args()
            )
        })
        .try_init()?;
    log::info!("Logging initialized");
    Ok(())
}

/// Parses a configured level name, falling back to `Info` for anything unknown.
pub fn level_from_name(name: Option<&str>) -> LevelFilter {
    name.and_then(|name| LevelFilter::from_str(name).ok())
        .unwrap_or(LevelFilter::Info)
}
