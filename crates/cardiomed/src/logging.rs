use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use log::LevelFilter;
use simplelog::{CombinedLogger, ConfigBuilder, SharedLogger, WriteLogger};

use cardiomed_platform::AppPaths;

/// Appends to the log file, reopening it when it was removed while running.
struct ReopeningLog {
    path: PathBuf,
    file: File,
}

impl ReopeningLog {
    fn open(path: PathBuf) -> io::Result<Self> {
        let file = Self::append_to(&path)?;
        Ok(Self { path, file })
    }

    fn append_to(path: &Path) -> io::Result<File> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        OpenOptions::new().create(true).append(true).open(path)
    }

    fn current(&mut self) -> io::Result<&mut File> {
        if !self.path.exists() {
            self.file = Self::append_to(&self.path)?;
        }
        Ok(&mut self.file)
    }
}

impl Write for ReopeningLog {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.current()?.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.current()?.flush()
    }
}

/// Drop the oldest entries of a log above `max_size`, keeping roughly the
/// newest `max_size / 2` bytes starting at a line boundary.
fn trim_log_file_if_oversized(path: &Path, max_size: u64) {
    let Ok(contents) = std::fs::read(path) else {
        return;
    };
    let len = contents.len();
    if u64::try_from(len).is_ok_and(|len| len <= max_size) {
        return;
    }

    let keep = usize::try_from(max_size / 2).unwrap_or(len).min(len);
    let cut = len - keep;
    let start = if cut == 0 || contents[cut - 1] == b'\n' {
        cut
    } else {
        contents[cut..]
            .iter()
            .position(|&b| b == b'\n')
            .map_or(len, |pos| cut + pos + 1)
    };
    let _ = std::fs::write(path, &contents[start..]);
}

/// Route `log` records from the CardioMed crates to `<data_dir>/debug.log`,
/// and to stderr in debug builds.
pub fn init_logging(paths: &AppPaths, debug_enabled: bool, max_log_size: u64) {
    let log_path = paths.log_file();
    trim_log_file_if_oversized(&log_path, max_log_size);

    let config = ConfigBuilder::new()
        .set_time_format_rfc3339()
        .add_filter_allow_str("cardiomed")
        .build();

    let mut loggers: Vec<Box<dyn SharedLogger>> = Vec::new();
    #[cfg(debug_assertions)]
    loggers.push(simplelog::TermLogger::new(
        LevelFilter::Debug,
        config.clone(),
        simplelog::TerminalMode::Stderr,
        simplelog::ColorChoice::Auto,
    ));
    match ReopeningLog::open(log_path.clone()) {
        Ok(file) => loggers.push(WriteLogger::new(LevelFilter::Debug, config, file)),
        Err(error) => eprintln!("Cannot write {}: {error}", log_path.display()),
    }

    if !loggers.is_empty() {
        let _ = CombinedLogger::init(loggers);
    }
    set_logging_enabled(debug_enabled);

    log::debug!("Debug logging enabled, writing to {}", log_path.display());
}

/// Warnings and errors are always recorded; debug output only on request.
fn set_logging_enabled(debug_enabled: bool) {
    log::set_max_level(if debug_enabled {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    });
}
