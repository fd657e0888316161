use colored::{ColoredString, Colorize};
use log::{Level, LevelFilter, Metadata, Record, SetLoggerError};
use std::io::{self, Write};

/// Writes log records to stderr, stdout is reserved for `--parse` output.
///
/// Info records are printed as is, other levels get a `warning:` style prefix
/// matching the error printed by the binary. With debug output enabled every
/// record also shows its target and source location.
pub struct Logger;

static LOGGER: Logger = Logger;

impl Logger {
    pub fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        log::set_logger(&LOGGER)?;
        log::set_max_level(level);
        Ok(())
    }
}

impl log::Log for Logger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let mut stderr = io::stderr().lock();

        let _ = if log::max_level() >= LevelFilter::Debug {
            writeln!(
                stderr,
                "{} {} {}",
                label(record.level()),
                location(record),
                record.args()
            )
        } else if record.level() == Level::Info {
            writeln!(stderr, "{}", record.args())
        } else {
            writeln!(stderr, "{} {}", label(record.level()), record.args())
        };
    }

    fn flush(&self) {
        let _ = io::stderr().flush();
    }
}

fn label(level: Level) -> ColoredString {
    match level {
        Level::Error => "error:".bold().red(),
        Level::Warn => "warning:".bold().yellow(),
        Level::Info => "info:".bold().green(),
        Level::Debug => "debug:".bold().blue(),
        Level::Trace => "trace:".bold().purple(),
    }
}

fn location(record: &Record) -> ColoredString {
    let location = match (record.file(), record.line()) {
        (Some(file), Some(line)) => format!("{} [{}:{}]", record.target(), file, line),
        _ => record.target().to_owned(),
    };

    location.dimmed()
}
