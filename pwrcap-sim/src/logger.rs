//! Stdout logger for the `log` facade

use std::io::Write;

use log::{Level, Metadata, Record};

/// Writes `LEVEL - message` lines to stdout
pub struct StdoutLogger {
    level: Level,
}

static LOGGER_INFO: StdoutLogger = StdoutLogger { level: Level::Info };
static LOGGER_DEBUG: StdoutLogger = StdoutLogger { level: Level::Debug };
static LOGGER_TRACE: StdoutLogger = StdoutLogger { level: Level::Trace };

/// Install the logger
///
/// `verbosity` 0 logs info and above, 1 adds debug, 2 or more adds trace.
/// Calling this twice keeps the first logger.
pub fn init(verbosity: u8) {
    let logger = match verbosity {
        0 => &LOGGER_INFO,
        1 => &LOGGER_DEBUG,
        _ => &LOGGER_TRACE,
    };
    if log::set_logger(logger).is_ok() {
        log::set_max_level(logger.level.to_level_filter());
    }
}

impl log::Log for StdoutLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let mut out = std::io::stdout().lock();
            // Ignore errors from a closed pipe
            let _ = writeln!(out, "{} - {}", record.level(), record.args());
        }
    }

    fn flush(&self) {
        let _ = std::io::stdout().flush();
    }
}
