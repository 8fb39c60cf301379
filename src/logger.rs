use std::io::Write;

use log::{Level, LevelFilter, Log, Metadata, Record};

struct Logger;

impl Log for Logger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let color = match record.level() {
            Level::Error => 31,
            Level::Warn => 93,
            Level::Info => 32,
            Level::Debug => 36,
            Level::Trace => 90,
        };
        let mut stderr = std::io::stderr().lock();
        writeln!(
            stderr,
            "\x1b[{}m[{:>5} {}]\x1b[0m {}",
            color,
            record.level(),
            record.target(),
            record.args()
        )
        .ok();
    }

    fn flush(&self) {}
}

static LOGGER: Logger = Logger;

/// Installs the stderr logger. `verbose` counts `-v` flags on top of `warn`.
pub fn init(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(level);
    }
}
