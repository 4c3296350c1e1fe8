//! Decoupled logging pipeline for orchestrator runs.
//!
//! # Architecture
//!
//! ```text
//! log::info!() ...
//!     |
//! [LogCollector] (log::Log impl, non-blocking)
//!     | (crossbeam unbounded channel)
//!     v
//! [DiskPersister thread]
//!     |-- stderr (operator console)
//!     `-- <campaign>/logs/orchestrator/<stage>_<timestamp>.log
//! ```
//!
//! The session file is optional and opened late: until `start_session` is called
//! lines go to stderr and are held in memory, then written to the file first. A
//! run that never opens a session leaves nothing on disk. `flush()` blocks until
//! every line sent so far has been written, so `main` can exit without losing output.

use chrono::Local;
use crossbeam_channel::{unbounded, Sender};
use log::{Level, LevelFilter, Log, Metadata, Record};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Internal log line or special marker
enum LogMessage {
    Line(LogLine),
    /// Switch output to a new session file.
    Session(PathBuf),
    /// Flush marker with channel sender to signal completion
    Flush(std::sync::mpsc::Sender<()>),
}

/// A log line with metadata
#[derive(Clone, Debug)]
pub struct LogLine {
    pub level: Level,
    pub message: String,
    pub timestamp: String,
}

impl LogLine {
    pub fn new(level: Level, message: String) -> Self {
        LogLine {
            level,
            message,
            timestamp: Local::now().format("%Y-%m-%d %H:%M:%S%.3f").to_string(),
        }
    }

    fn format(&self) -> String {
        format!("[{}] {:<5} {}\n", self.timestamp, self.level, self.message)
    }
}

/// Unified logger writing to stderr and an optional session file.
#[derive(Clone)]
pub struct LogCollector {
    tx: Sender<LogMessage>,
    level: LevelFilter,
    session_path: Arc<Mutex<Option<PathBuf>>>,
}

impl LogCollector {
    /// Spawn the persister thread.
    pub fn new(level: LevelFilter, echo_stderr: bool) -> Self {
        let (tx, rx) = unbounded::<LogMessage>();

        std::thread::spawn(move || {
            let mut session: Option<File> = None;
            let mut backlog: Vec<String> = Vec::new();
            while let Ok(msg) = rx.recv() {
                match msg {
                    LogMessage::Line(line) => {
                        let formatted = line.format();
                        if echo_stderr {
                            eprint!("{}", formatted);
                        }
                        match session.as_mut() {
                            Some(file) => {
                                let _ = file.write_all(formatted.as_bytes());
                            }
                            None => backlog.push(formatted),
                        }
                    }
                    LogMessage::Session(path) => {
                        session = OpenOptions::new().create(true).append(true).open(&path).ok();
                        match session.as_mut() {
                            Some(file) => {
                                for line in backlog.drain(..) {
                                    let _ = file.write_all(line.as_bytes());
                                }
                            }
                            None => {
                                eprintln!("[Log] Could not open session log {}", path.display())
                            }
                        }
                    }
                    LogMessage::Flush(done) => {
                        if let Some(file) = session.as_mut() {
                            let _ = file.flush();
                        }
                        let _ = done.send(());
                    }
                }
            }
        });

        LogCollector {
            tx,
            level,
            session_path: Arc::new(Mutex::new(None)),
        }
    }

    /// Register as the global `log` backend.
    pub fn install(self) -> Result<Self, log::SetLoggerError> {
        let level = self.level;
        log::set_boxed_logger(Box::new(self.clone()))?;
        log::set_max_level(level);
        Ok(self)
    }

    /// Start a dedicated session file `<log_dir>/<stage>_<timestamp>.log`.
    ///
    /// Lines logged before this call are written to the new file first.
    pub fn start_session(&self, log_dir: &Path, stage: &str) -> Result<PathBuf, String> {
        std::fs::create_dir_all(log_dir)
            .map_err(|e| format!("Failed to create log dir {}: {}", log_dir.display(), e))?;
        let filename = format!("{}_{}.log", stage, Local::now().format("%Y%m%d_%H%M%S"));
        let path = log_dir.join(filename);
        if let Ok(mut current) = self.session_path.lock() {
            *current = Some(path.clone());
        }
        let _ = self.tx.send(LogMessage::Session(path.clone()));
        Ok(path)
    }

    pub fn session_path(&self) -> Option<PathBuf> {
        self.session_path.lock().ok().and_then(|p| p.clone())
    }

    /// Send a log line (non-blocking)
    pub fn log_line(&self, line: LogLine) {
        let _ = self.tx.send(LogMessage::Line(line));
    }

    /// Block until every queued line has been written.
    pub fn wait_for_empty(&self) {
        let (done_tx, done_rx) = std::sync::mpsc::channel();
        if self.tx.send(LogMessage::Flush(done_tx)).is_ok() {
            let _ = done_rx.recv();
        }
    }
}

impl Log for LogCollector {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            self.log_line(LogLine::new(record.level(), record.args().to_string()));
        }
    }

    fn flush(&self) {
        self.wait_for_empty();
    }
}
