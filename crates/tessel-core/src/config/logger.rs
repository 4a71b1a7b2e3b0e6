use super::GlobalConfig;
use super::compilation::CompilationLogLevel;
use core::fmt::Display;
use hashbrown::HashSet;
use std::{
    fs::{File, OpenOptions},
    io::{BufWriter, Write},
    path::PathBuf,
    sync::Arc,
};

/// Configuration of one logging channel, parameterized by a log level type.
///
/// Note that you can use multiple sinks at the same time.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(bound = "")]
pub struct LoggerConfig<L: LogLevel> {
    /// Path to the log file, if file logging is enabled.
    #[serde(default)]
    pub file: Option<PathBuf>,

    /// Whether to append to the log file (true) or overwrite it (false). Defaults to true.
    #[serde(default = "append_default")]
    pub append: bool,

    /// Whether to log to standard output.
    #[serde(default)]
    pub stdout: bool,

    /// Whether to log to standard error.
    #[serde(default)]
    pub stderr: bool,

    /// Optional forwarding to the `log` crate at the given level.
    #[serde(default)]
    pub log: Option<LogCrateLevel>,

    /// The log level for this channel.
    #[serde(default)]
    pub level: L,
}

impl<L: LogLevel> Default for LoggerConfig<L> {
    fn default() -> Self {
        Self {
            file: None,
            append: true,
            stdout: false,
            stderr: false,
            log: None,
            level: L::default(),
        }
    }
}

/// Log levels using the `log` crate.
#[derive(
    Clone, Copy, Debug, Default, serde::Serialize, serde::Deserialize, Hash, PartialEq, Eq,
)]
pub enum LogCrateLevel {
    /// Logs informational messages.
    #[default]
    #[serde(rename = "info")]
    Info,

    /// Logs debugging messages.
    #[serde(rename = "debug")]
    Debug,

    /// Logs trace-level messages.
    #[serde(rename = "trace")]
    Trace,
}

fn append_default() -> bool {
    true
}

/// Trait for types that can be used as log levels in `LoggerConfig`.
pub trait LogLevel:
    serde::de::DeserializeOwned + serde::Serialize + Clone + Copy + core::fmt::Debug + Default
{
}

/// Binary log level for enabling or disabling logging.
#[derive(Default, Copy, Clone, Debug, serde::Serialize, serde::Deserialize)]
pub enum BinaryLogLevel {
    /// Logging is disabled.
    #[default]
    #[serde(rename = "disabled")]
    Disabled,

    /// Logging is fully enabled.
    #[serde(rename = "full")]
    Full,
}

impl LogLevel for BinaryLogLevel {}

/// Writes compiled kernels to the sinks configured in the `compilation` section.
#[derive(Debug)]
pub struct CompilationLogger {
    sinks: Vec<LoggerKind>,

    /// Global configuration the sinks were created from.
    pub config: Arc<GlobalConfig>,
}

impl Default for CompilationLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl CompilationLogger {
    /// Creates a logger from the global configuration.
    ///
    /// Note that creating a logger opens its file sink, so it should be reused.
    pub fn new() -> Self {
        Self::from_config(GlobalConfig::get())
    }

    pub fn from_config(config: Arc<GlobalConfig>) -> Self {
        let settings = &config.compilation.logger;
        let mut sinks = Vec::new();

        if let CompilationLogLevel::Full = settings.level {
            let mut seen = HashSet::new();

            if let Some(file) = &settings.file {
                if seen.insert(SinkId::File(file.clone())) {
                    match FileLogger::new(file, settings.append) {
                        Ok(logger) => sinks.push(LoggerKind::File(logger)),
                        Err(err) => log::warn!("Can't open {} for logging: {err}", file.display()),
                    }
                }
            }
            if settings.stdout && seen.insert(SinkId::Stdout) {
                sinks.push(LoggerKind::Stdout);
            }
            if settings.stderr && seen.insert(SinkId::Stderr) {
                sinks.push(LoggerKind::Stderr);
            }
            if let Some(level) = settings.log {
                sinks.push(LoggerKind::Log(level));
            }
        }

        Self { sinks, config }
    }

    /// Logs a message to every configured sink.
    pub fn log_compilation<S: Display>(&mut self, msg: &S) {
        match self.sinks.len() {
            0 => {}
            1 => self.sinks[0].log(msg),
            _ => {
                let msg = msg.to_string();
                for sink in self.sinks.iter_mut() {
                    sink.log(&msg);
                }
            }
        }
    }

    pub fn is_enabled(&self) -> bool {
        !self.sinks.is_empty()
    }
}

#[derive(Hash, PartialEq, Eq)]
enum SinkId {
    File(PathBuf),
    Stdout,
    Stderr,
}

/// Represents different types of loggers.
#[derive(Debug)]
enum LoggerKind {
    /// Logs to a file.
    File(FileLogger),

    /// Logs to standard output.
    Stdout,

    /// Logs to standard error.
    Stderr,

    /// Logs using the `log` crate with a specified level.
    Log(LogCrateLevel),
}

impl LoggerKind {
    fn log<S: Display>(&mut self, msg: &S) {
        match self {
            LoggerKind::File(file_logger) => file_logger.log(msg),
            LoggerKind::Stdout => println!("{msg}"),
            LoggerKind::Stderr => eprintln!("{msg}"),
            LoggerKind::Log(level) => match level {
                LogCrateLevel::Info => log::info!("{msg}"),
                LogCrateLevel::Debug => log::debug!("{msg}"),
                LogCrateLevel::Trace => log::trace!("{msg}"),
            },
        }
    }
}

/// Logger that writes messages to a file.
#[derive(Debug)]
struct FileLogger {
    writer: BufWriter<File>,
}

impl FileLogger {
    // Creates a new file logger.
    fn new(path: &PathBuf, append: bool) -> std::io::Result<Self> {
        let file = OpenOptions::new()
            .write(true)
            .append(append)
            .truncate(!append)
            .create(true)
            .open(path)?;

        Ok(Self {
            writer: BufWriter::new(file),
        })
    }

    // Logs a message to the file, flushing the buffer to ensure immediate write.
    fn log<S: Display>(&mut self, msg: &S) {
        let written = writeln!(self.writer, "{msg}").and_then(|_| self.writer.flush());
        if let Err(err) = written {
            log::warn!("Failed to write to the compilation log: {err}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::compilation::CompilationConfig;

    #[test]
    fn disabled_channel_has_no_sink() {
        let logger = CompilationLogger::from_config(Arc::new(GlobalConfig::default()));

        assert!(!logger.is_enabled());
    }

    #[test]
    fn file_sink_receives_messages() {
        let path = std::env::temp_dir().join(format!("tessel-logger-{}.log", std::process::id()));
        let mut config = GlobalConfig {
            compilation: CompilationConfig::default(),
            ..Default::default()
        };
        config.compilation.logger.level = CompilationLogLevel::Full;
        config.compilation.logger.file = Some(path.clone());
        config.compilation.logger.append = false;

        let mut logger = CompilationLogger::from_config(Arc::new(config));
        logger.log_compilation(&"E_45_195");

        let content = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(content, "E_45_195\n");
    }
}
