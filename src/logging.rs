use log::{LevelFilter, SetLoggerError};
use simple_logger::SimpleLogger;

/// Installs the process-wide logger at `Info`. `RUST_LOG` overrides the level.
pub fn init() -> Result<(), SetLoggerError> {
    SimpleLogger::new()
        .with_level(LevelFilter::Info)
        .env()
        .init()
}
