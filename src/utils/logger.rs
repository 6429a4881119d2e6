use crate::shared::constants;
use lazy_static::lazy_static;
use log::{Level, LevelFilter, Log, Metadata, Record};
use std::backtrace::Backtrace;
use std::fs::OpenOptions;
use std::io::Write;
use std::panic;
use std::path::Path;
use std::sync::Mutex;

#[derive(Clone)]
struct LoggerPaths {
    error_path: String,
    debug_path: String,
    console_level: LevelFilter,
}

lazy_static! {
    static ref LOGGER: Mutex<Option<LoggerPaths>> = Mutex::new(None);
}

/// `log` backend: every record goes to debug.log, errors also to error.log,
/// and anything at or above the console level is echoed to stderr.
struct FileLogger;

static FILE_LOGGER: FileLogger = FileLogger;

fn append_line(path: &str, line: &str) {
    if let Ok(mut file) = OpenOptions::new().create(true).append(true).open(path) {
        let _ = writeln!(file, "{}", line);
    }
}

fn format_line(level: Level, msg: &str) -> String {
    let timestamp = chrono::Local::now().format("%H:%M:%S%.3f");
    format!("[{}][{}] {}", timestamp, level, msg)
}

impl Log for FileLogger {
    fn enabled(&self, _metadata: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        let paths = match LOGGER.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        };
        if let Some(paths) = paths {
            let line = format_line(record.level(), &record.args().to_string());
            if record.level() <= paths.console_level {
                eprintln!("{}", line);
            }
            append_line(&paths.debug_path, &line);
            if record.level() == Level::Error {
                append_line(&paths.error_path, &line);
            }
        }
    }

    fn flush(&self) {}
}

/// Installs the logger. Truncates both log files under `log_dir` and sets a
/// panic hook that records the backtrace before the process dies.
pub fn init(log_dir: &Path, verbose: bool) {
    let error_path = log_dir.join(constants::ERROR_LOG_FILE);
    let debug_path = log_dir.join(constants::DEBUG_LOG_FILE);

    for (path, title) in [(&error_path, "Error"), (&debug_path, "Debug")] {
        if let Ok(mut file) = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)
        {
            let _ = writeln!(
                file,
                "=== {} {} Log Started: {} ===",
                constants::APP_NAME,
                title,
                chrono::Local::now()
            );
        }
    }

    let paths = LoggerPaths {
        error_path: error_path.to_string_lossy().to_string(),
        debug_path: debug_path.to_string_lossy().to_string(),
        console_level: if verbose { LevelFilter::Debug } else { LevelFilter::Info },
    };
    match LOGGER.lock() {
        Ok(mut guard) => *guard = Some(paths.clone()),
        Err(poisoned) => *poisoned.into_inner() = Some(paths.clone()),
    }

    if log::set_logger(&FILE_LOGGER).is_ok() {
        log::set_max_level(LevelFilter::Debug);
    }

    panic::set_hook(Box::new(move |info| {
        let payload = info.payload();
        let reason = payload
            .downcast_ref::<&str>()
            .copied()
            .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
            .unwrap_or("non-string panic payload");
        let place = info
            .location()
            .map_or_else(|| "<unknown>".to_string(), |l| format!("{}:{}", l.file(), l.line()));

        let report = format_line(
            Level::Error,
            &format!(
                "{} aborted at {}: {}\n{}",
                constants::APP_NAME,
                place,
                reason,
                Backtrace::capture()
            ),
        );
        append_line(&paths.error_path, &report);
        append_line(&paths.debug_path, &report);

        eprintln!("{} aborted: {} (details in {})", constants::APP_NAME, reason, paths.error_path);
    }));
}
