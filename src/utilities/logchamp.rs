//! joe: logchamp
//! joe: call it logchamp
//! joe: please

use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::sync::Mutex;

use colored::{Color, Colorize};
use log::{Level, LevelFilter, Log, Metadata, Record};
use time::macros::format_description;

const CRATE_TARGET: &str = env!("CARGO_CRATE_NAME");

struct Logger {
    own_level: Level,
    file: Option<Mutex<BufWriter<File>>>,
}

impl Logger {
    fn new(log_file: Option<&Path>, verbose: bool) -> io::Result<Self> {
        let file = match log_file {
            Some(path) => Some(Mutex::new(BufWriter::new(
                OpenOptions::new().append(true).create(true).open(path)?,
            ))),
            None => None,
        };

        Ok(Self { own_level: if verbose { Level::Debug } else { Level::Info }, file })
    }
}

impl Log for Logger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        let max_level = match metadata.target().split("::").next() {
            Some(CRATE_TARGET) => self.own_level,
            _ => Level::Info,
        };
        metadata.level() <= max_level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let timestamp = time::OffsetDateTime::now_utc()
            .format(format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"))
            .unwrap_or_default();
        let target = record.target();
        let level = record.level().as_str();
        let args = record.args();

        let color = match record.level() {
            Level::Error => Color::BrightRed,
            Level::Warn => Color::BrightYellow,
            Level::Info => Color::BrightCyan,
            Level::Debug => Color::BrightMagenta,
            Level::Trace => Color::BrightGreen,
        };

        // stdout is reserved for model text and the artifact path
        eprintln!("{} {} {args}", timestamp.color(Color::BrightBlack), level.color(color));

        if let Some(file) = &self.file {
            if let Ok(mut file) = file.lock() {
                writeln!(file, "{timestamp} [{target} {level}] {args}").ok();
            }
        }
    }

    fn flush(&self) {
        if let Some(file) = &self.file {
            if let Ok(mut file) = file.lock() {
                file.flush().ok();
            }
        }
    }
}

pub fn init(log_file: Option<&Path>, verbose: bool) -> io::Result<()> {
    let logger = Logger::new(log_file, verbose)?;
    log::set_boxed_logger(Box::new(logger)).map_err(io::Error::other)?;
    log::set_max_level(LevelFilter::Debug);

    Ok(())
}
