//! # Logger
//!
//! Installs the process-wide `tracing` subscriber used by the SchemeFS binaries.
//!
//! Console output is compact and colored; file output is optional, rolls over on a schedule,
//! and is written through a non-blocking worker. `RUST_LOG` always applies on top of the
//! configured level, and [`LoggerBuilder::env_filter`] sets a programmatic default directive.
//!
//! ## Example
//!
//! ```rust
//! # use schemefs_logger::{Logger, LevelFilter};
//! let _logger = Logger::builder()
//!     .name("schemefs-desktop")
//!     .level(LevelFilter::DEBUG)
//!     .init()
//!     .unwrap();
//! ```

mod error;

pub use crate::error::{LoggerError, LoggerErrorExt};
pub use tracing::level_filters::LevelFilter;
pub use tracing_appender::rolling::Rotation;

use private::Sealed;
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::RollingFileAppender;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt};

const DEFAULT_MAX_FILES: usize = 7;
const LOG_FILE_SUFFIX: &str = "log";

/// Rolling file output settings.
#[derive(Debug, Clone)]
pub struct FileOutput {
    dir: PathBuf,
    rotation: Rotation,
    max_files: usize,
    json: bool,
}

impl FileOutput {
    fn new(dir: PathBuf) -> Self {
        Self { dir, rotation: Rotation::DAILY, max_files: DEFAULT_MAX_FILES, json: false }
    }
}

#[derive(Debug)]
struct LoggerConfig {
    console: bool,
    level: LevelFilter,
    env_filter: Option<String>,
    file: Option<FileOutput>,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self { console: true, level: LevelFilter::INFO, env_filter: None, file: None }
    }
}

#[derive(Debug)]
pub struct Unnamed;
#[derive(Debug)]
pub struct Named(String);

mod private {
    pub trait Sealed {}
}
impl Sealed for Unnamed {}
impl Sealed for Named {}

/// Configures and installs the global subscriber. A name is required before [`init`].
///
/// [`init`]: LoggerBuilder::init
#[derive(Debug)]
pub struct LoggerBuilder<N: Sealed = Unnamed> {
    config: LoggerConfig,
    name: N,
}

impl LoggerBuilder<Unnamed> {
    /// Names the application; the name also prefixes rolled log files.
    pub fn name(self, name: impl Into<String>) -> LoggerBuilder<Named> {
        LoggerBuilder { config: self.config, name: Named(name.into()) }
    }
}

impl<N: Sealed> LoggerBuilder<N> {
    #[must_use = "The builder does nothing until `init()` is called"]
    pub const fn level(mut self, level: LevelFilter) -> Self {
        self.config.level = level;
        self
    }

    /// Programmatic filter directive (e.g. `schemefs_protocol=debug`); `RUST_LOG` still wins.
    #[must_use = "The builder does nothing until `init()` is called"]
    pub fn env_filter(mut self, filter: impl Into<String>) -> Self {
        self.config.env_filter = Some(filter.into());
        self
    }

    #[must_use = "The builder does nothing until `init()` is called"]
    pub const fn console(mut self, enabled: bool) -> Self {
        self.config.console = enabled;
        self
    }

    /// Writes logs to rolling files under `dir`.
    #[must_use = "The builder does nothing until `init()` is called"]
    pub fn file(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.file = Some(FileOutput::new(dir.into()));
        self
    }

    /// Adjusts the rolling file output. No-op when [`file`](Self::file) was not set.
    #[must_use = "The builder does nothing until `init()` is called"]
    pub fn file_options(mut self, rotation: Rotation, max_files: usize, json: bool) -> Self {
        if let Some(file) = self.config.file.as_mut() {
            file.rotation = rotation;
            file.max_files = max_files;
            file.json = json;
        }
        self
    }
}

impl LoggerBuilder<Named> {
    /// Installs the global subscriber.
    ///
    /// The returned [`Logger`] owns the non-blocking file worker; keep it alive until shutdown
    /// or buffered lines are lost.
    ///
    /// # Errors
    /// * [`LoggerError::InvalidConfiguration`] for an empty name, a bad filter, zero retained
    ///   files, or when no output is enabled.
    /// * [`LoggerError::Subscriber`] if a global subscriber is already installed.
    pub fn init(self) -> Result<Logger, LoggerError> {
        let Self { config, name: Named(name) } = self;
        validate(&config, &name)?;

        let filter = env_filter(&config)?;
        let mut layers: Vec<Box<dyn Layer<Registry> + Send + Sync>> = Vec::new();

        if config.console {
            layers.push(fmt::layer().compact().with_ansi(true).boxed());
        }

        let guard = match &config.file {
            Some(file) => {
                let (layer, guard) = file_layer(&name, file)?;
                layers.push(layer);
                Some(guard)
            },
            None => None,
        };

        if layers.is_empty() {
            return Err(LoggerError::InvalidConfiguration {
                message: "Enable console or file output".into(),
                context: None,
            });
        }

        tracing_subscriber::registry().with(layers).with(filter).try_init()?;

        Ok(Logger { guard })
    }
}

fn file_layer(
    name: &str,
    file: &FileOutput,
) -> Result<(Box<dyn Layer<Registry> + Send + Sync>, WorkerGuard), LoggerError> {
    std::fs::create_dir_all(&file.dir)
        .context(format!("Failed to create log directory {}", file.dir.display()))?;

    let appender = RollingFileAppender::builder()
        .rotation(file.rotation.clone())
        .filename_prefix(name)
        .filename_suffix(LOG_FILE_SUFFIX)
        .max_log_files(file.max_files)
        .build(&file.dir)?;

    let (writer, guard) = tracing_appender::non_blocking(appender);
    let layer = fmt::layer().with_writer(writer).with_ansi(false);
    let layer = if file.json { layer.json().boxed() } else { layer.boxed() };

    Ok((layer, guard))
}

fn validate(config: &LoggerConfig, name: &str) -> Result<(), LoggerError> {
    if name.trim().is_empty() {
        return Err(LoggerError::InvalidConfiguration {
            message: "Logger name cannot be empty".into(),
            context: None,
        });
    }
    if config.file.as_ref().is_some_and(|f| f.max_files == 0) {
        return Err(LoggerError::InvalidConfiguration {
            message: "max_files must be greater than zero".into(),
            context: None,
        });
    }
    Ok(())
}

fn env_filter(config: &LoggerConfig) -> Result<EnvFilter, LoggerError> {
    let builder = EnvFilter::builder().with_default_directive(config.level.into());
    match &config.env_filter {
        None => Ok(builder.from_env_lossy()),
        Some(directive) => {
            builder.parse(directive).map_err(|e| LoggerError::InvalidConfiguration {
                message: format!("Invalid env filter '{directive}': {e}").into(),
                context: None,
            })
        },
    }
}

/// Handle to the installed subscriber. Dropping it flushes and stops the file worker.
#[must_use = "Dropping this handle stops background log writing"]
#[derive(Debug)]
pub struct Logger {
    guard: Option<WorkerGuard>,
}

impl Logger {
    #[must_use = "The builder does nothing until `init()` is called"]
    pub fn builder() -> LoggerBuilder {
        LoggerBuilder { config: LoggerConfig::default(), name: Unnamed }
    }

    /// Whether a file worker is attached.
    #[must_use]
    pub const fn writes_files(&self) -> bool {
        self.guard.is_some()
    }
}

impl Drop for Logger {
    fn drop(&mut self) {
        if self.guard.is_some() {
            tracing::info!("Logging system shutting down, flushing buffers...");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_defaults() {
        let builder = Logger::builder().name("schemefs-test");
        assert!(builder.config.console);
        assert_eq!(builder.config.level, LevelFilter::INFO);
        assert!(builder.config.file.is_none());
        assert!(builder.config.env_filter.is_none());
    }

    #[test]
    fn file_options_apply_only_with_file_output() {
        let without = Logger::builder().name("a").file_options(Rotation::HOURLY, 3, true);
        assert!(without.config.file.is_none());

        let with = Logger::builder().name("a").file("/tmp/logs").file_options(
            Rotation::HOURLY,
            3,
            true,
        );
        let file = with.config.file.expect("file output configured");
        assert_eq!(file.max_files, 3);
        assert!(file.json);
        assert_eq!(file.dir, PathBuf::from("/tmp/logs"));
    }

    #[test]
    fn invalid_settings_are_rejected_before_install() {
        let err = Logger::builder().name("  ").init().expect_err("empty name");
        assert!(matches!(err, LoggerError::InvalidConfiguration { .. }));

        let err = Logger::builder().name("x").console(false).init().expect_err("no outputs");
        assert!(matches!(err, LoggerError::InvalidConfiguration { .. }));

        let err = Logger::builder()
            .name("x")
            .env_filter("schemefs=notalevel")
            .init()
            .expect_err("bad directive");
        assert!(matches!(err, LoggerError::InvalidConfiguration { .. }));

        let err = Logger::builder()
            .name("x")
            .file("/tmp/never-created")
            .file_options(Rotation::NEVER, 0, false)
            .init()
            .expect_err("zero files");
        assert!(matches!(err, LoggerError::InvalidConfiguration { .. }));
    }
}
