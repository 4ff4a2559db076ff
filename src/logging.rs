use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use std::fs;
use std::io;
use std::sync::{Arc, Mutex};
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Runtime-toggleable file log destination.
///
/// The subscriber is built once at startup with a file layer writing
/// through this handle. While disabled the layer writes to a discard sink;
/// [`enable()`](Self::enable) opens a fresh timestamped log file
/// (`<prefix>_<YYMMDDHHMMSS>.log`) and [`disable()`](Self::disable) drops
/// it again, flushing buffered lines. This backs the "Activate Logging"
/// menu toggle.
#[derive(Clone)]
pub struct FileLogHandle {
    log_dir: Utf8PathBuf,
    prefix: String,
    sink: Arc<Mutex<Option<ActiveLog>>>,
}

struct ActiveLog {
    writer: NonBlocking,
    path: Utf8PathBuf,
    // Held so the background writer thread keeps flushing
    _guard: WorkerGuard,
}

impl FileLogHandle {
    fn new(log_dir: Utf8PathBuf, prefix: String) -> Self {
        Self {
            log_dir,
            prefix,
            sink: Arc::new(Mutex::new(None)),
        }
    }

    /// Start logging to a new timestamped file. No-op when already enabled.
    ///
    /// # Returns
    /// The path of the active log file.
    pub fn enable(&self) -> Result<Utf8PathBuf> {
        // The file layer locks this sink on every event, so the guard must
        // be released before anything is logged here
        let path = {
            let mut sink = self.sink.lock().unwrap();
            if let Some(active) = sink.as_ref() {
                return Ok(active.path.clone());
            }

            if !self.log_dir.exists() {
                fs::create_dir_all(&self.log_dir).with_context(|| {
                    format!("Failed to create log directory: {}", self.log_dir)
                })?;
            }

            let file_name = format!(
                "{}_{}.log",
                self.prefix,
                chrono::Local::now().format("%y%m%d%H%M%S")
            );
            let path = self.log_dir.join(&file_name);

            let appender = tracing_appender::rolling::never(&self.log_dir, &file_name);
            let (writer, guard) = tracing_appender::non_blocking(appender);

            *sink = Some(ActiveLog {
                writer,
                path: path.clone(),
                _guard: guard,
            });
            path
        };

        tracing::info!("File logging enabled: {}", path);
        Ok(path)
    }

    /// Stop logging to file and flush what's buffered. No-op when disabled.
    pub fn disable(&self) {
        // Take the sink out under the lock, log after releasing it
        let taken = self.sink.lock().unwrap().take();
        if let Some(active) = taken {
            tracing::info!("File logging disabled: {}", active.path);
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.sink.lock().unwrap().is_some()
    }

    /// Path of the currently active log file, if any.
    pub fn current_path(&self) -> Option<Utf8PathBuf> {
        self.sink.lock().unwrap().as_ref().map(|a| a.path.clone())
    }
}

/// Writer handed to the fmt layer on each event.
pub enum FileLogWriter {
    Active(NonBlocking),
    Disabled,
}

impl io::Write for FileLogWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            FileLogWriter::Active(writer) => writer.write(buf),
            FileLogWriter::Disabled => Ok(buf.len()),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            FileLogWriter::Active(writer) => writer.flush(),
            FileLogWriter::Disabled => Ok(()),
        }
    }
}

impl<'a> MakeWriter<'a> for FileLogHandle {
    type Writer = FileLogWriter;

    fn make_writer(&'a self) -> Self::Writer {
        match self.sink.lock().unwrap().as_ref() {
            Some(active) => FileLogWriter::Active(active.writer.clone()),
            None => FileLogWriter::Disabled,
        }
    }
}

/// Setup logging: console output always on, plus a file layer controlled by
/// the returned [`FileLogHandle`].
///
/// # Arguments
/// * `log_dir` - Directory for log files (e.g., "logs")
/// * `log_prefix` - Prefix for log file names (e.g., "ini-reporter")
/// * `debug_mode` - If true, use debug level; otherwise use info level
///
/// # Returns
/// A handle that must be kept for the duration of the program; the GUI uses
/// it to toggle file logging at runtime.
pub fn setup_logging(
    log_dir: impl AsRef<Utf8Path>,
    log_prefix: &str,
    debug_mode: bool,
) -> Result<FileLogHandle> {
    let handle = FileLogHandle::new(log_dir.as_ref().to_path_buf(), log_prefix.to_string());

    let env_filter = if debug_mode {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    let console_layer = tracing_subscriber::fmt::layer()
        .with_ansi(true)
        .with_target(false);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(handle.clone())
        .with_ansi(false) // No ANSI codes in log files
        .with_target(true)
        .with_thread_ids(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .context("Failed to initialize tracing subscriber")?;

    tracing::info!(
        "Logging initialized: dir={}, prefix={}, debug={}",
        log_dir.as_ref(),
        log_prefix,
        debug_mode
    );

    Ok(handle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn test_handle(temp_dir: &TempDir) -> FileLogHandle {
        let dir = Utf8PathBuf::try_from(temp_dir.path().to_path_buf()).unwrap();
        FileLogHandle::new(dir, "test".to_string())
    }

    #[test]
    fn handle_starts_disabled() {
        let temp_dir = TempDir::new().unwrap();
        let handle = test_handle(&temp_dir);

        assert!(!handle.is_enabled());
        assert!(handle.current_path().is_none());

        // Disabled writer swallows output
        let mut writer = handle.make_writer();
        assert_eq!(writer.write(b"dropped").unwrap(), 7);
    }

    #[test]
    fn enable_creates_timestamped_file_path() {
        let temp_dir = TempDir::new().unwrap();
        let handle = test_handle(&temp_dir);

        let path = handle.enable().unwrap();
        assert!(handle.is_enabled());
        assert!(path.file_name().unwrap().starts_with("test_"));
        assert!(path.as_str().ends_with(".log"));
        assert_eq!(handle.current_path(), Some(path.clone()));

        // Enabling twice keeps the same file
        assert_eq!(handle.enable().unwrap(), path);
    }

    #[test]
    fn disable_clears_active_sink() {
        let temp_dir = TempDir::new().unwrap();
        let handle = test_handle(&temp_dir);

        handle.enable().unwrap();
        handle.disable();

        assert!(!handle.is_enabled());
        assert!(handle.current_path().is_none());

        // Disabling twice is harmless
        handle.disable();
    }

    #[test]
    fn toggling_is_safe_with_the_subscriber_installed() {
        // With the global subscriber active, every tracing call inside
        // enable()/disable() goes back through make_writer and the sink
        // mutex; the toggle must not log while holding that lock
        let temp_dir = TempDir::new().unwrap();
        let dir = Utf8PathBuf::try_from(temp_dir.path().to_path_buf()).unwrap();
        let handle = setup_logging(&dir, "toggle", false).unwrap();

        let path = handle.enable().unwrap();
        assert!(handle.is_enabled());
        tracing::info!("file logging round trip");

        handle.disable();
        assert!(!handle.is_enabled());

        let contents = fs::read_to_string(&path).unwrap();
        assert!(contents.contains("file logging round trip"));

        // A second toggle cycle must not block either
        handle.enable().unwrap();
        assert!(handle.is_enabled());
        handle.disable();
    }

    #[test]
    fn writes_reach_the_log_file() {
        let temp_dir = TempDir::new().unwrap();
        let handle = test_handle(&temp_dir);

        let path = handle.enable().unwrap();
        {
            let mut writer = handle.make_writer();
            writer.write_all(b"hello log\n").unwrap();
        }
        // Dropping the guard flushes the background writer
        handle.disable();

        let contents = fs::read_to_string(&path).unwrap();
        assert!(contents.contains("hello log"));
    }
}
