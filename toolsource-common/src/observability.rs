//! Shared observability helpers for binaries and integration tests.
//!
//! Stdout carries captured page content, so events only ever go to a daily
//! rolling file and, optionally, stderr. Call [`init_logging`] once near
//! process start; later callers get the already resolved log file path back.
//! When the log directory is unusable, [`init_stderr_logging`] keeps warnings
//! visible without a file sink.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::OnceLock;

use anyhow::Context;
use chrono::Local;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling;
use tracing_subscriber::{
    fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry,
};

/// Capture steps and session lifecycle at `info`, everything else at `warn`.
pub const DEFAULT_FILTER: &str = "warn,capture=info,browser=info,toolsource=info";

/// Filter used by the stderr-only fallback when `RUST_LOG` is unset.
const FALLBACK_FILTER: &str = "warn";

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();
static LOG_PATH: OnceLock<PathBuf> = OnceLock::new();

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync + 'static>;

/// Output encoding for structured logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(raw: &str) -> anyhow::Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "text" | "plain" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(anyhow::anyhow!("unknown log format `{other}`")),
        }
    }
}

/// Configuration passed to [`init_logging`].
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Used for the default directory and the file name.
    pub app_name: &'static str,
    /// Explicit log directory. Falls back to `TOOLSOURCE_LOG_DIR`, then
    /// `~/.local/share/<app_name>`.
    pub log_dir: Option<PathBuf>,
    /// Duplicate events to stderr.
    pub emit_stderr: bool,
    pub format: LogFormat,
    /// Applied when `RUST_LOG` is unset.
    pub default_filter: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            app_name: "toolsource",
            log_dir: None,
            emit_stderr: false,
            format: LogFormat::Text,
            default_filter: DEFAULT_FILTER.to_string(),
        }
    }
}

/// Where a day's events land.
#[derive(Debug, Clone, PartialEq, Eq)]
struct LogFile {
    dir: PathBuf,
    prefix: String,
    today: PathBuf,
}

/// Install the global subscriber with the file sink.
///
/// Returns today's log file. Fails when the log directory cannot be created
/// or another subscriber is already installed.
pub fn init_logging(config: LogConfig) -> anyhow::Result<PathBuf> {
    if let Some(path) = LOG_PATH.get() {
        return Ok(path.clone());
    }

    let file = prepare_log_file(&config)?;
    let (writer, guard) = tracing_appender::non_blocking(rolling::daily(&file.dir, &file.prefix));
    let _ = LOG_GUARD.set(guard);

    let mut layers = vec![file_layer(config.format, writer)];
    if config.emit_stderr {
        layers.push(stderr_layer(config.format));
    }
    install(layers, &config.default_filter)?;

    let _ = LOG_PATH.set(file.today.clone());
    Ok(file.today)
}

/// Install a stderr-only subscriber, for when the file sink is unavailable.
pub fn init_stderr_logging(config: &LogConfig) -> anyhow::Result<()> {
    if LOG_PATH.get().is_some() {
        return Ok(());
    }
    install(vec![stderr_layer(config.format)], FALLBACK_FILTER)
}

fn install(layers: Vec<BoxedLayer>, default_filter: &str) -> anyhow::Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::registry()
        .with(layers)
        .with(env_filter)
        .try_init()
        .map_err(|e| anyhow::anyhow!("tracing setup failed: {e}"))
}

fn file_layer(format: LogFormat, writer: NonBlocking) -> BoxedLayer {
    match format {
        LogFormat::Text => fmt::layer().with_writer(writer).with_ansi(false).boxed(),
        LogFormat::Json => fmt::layer().json().with_writer(writer).boxed(),
    }
}

fn stderr_layer(format: LogFormat) -> BoxedLayer {
    match format {
        LogFormat::Text => fmt::layer().with_writer(std::io::stderr).boxed(),
        LogFormat::Json => fmt::layer().json().with_writer(std::io::stderr).boxed(),
    }
}

fn prepare_log_file(config: &LogConfig) -> anyhow::Result<LogFile> {
    let dir = resolve_log_dir(config.app_name, config.log_dir.as_deref());
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create log directory: {}", dir.display()))?;

    // rolling::daily appends the date to the prefix
    let prefix = format!("{}.log", config.app_name);
    let today = dir.join(format!("{prefix}.{}", Local::now().format("%Y-%m-%d")));
    Ok(LogFile { dir, prefix, today })
}

fn resolve_log_dir(app_name: &str, explicit: Option<&Path>) -> PathBuf {
    if let Some(dir) = explicit {
        return expand_home(dir);
    }

    if let Ok(env_dir) = std::env::var("TOOLSOURCE_LOG_DIR") {
        return expand_home(Path::new(&env_dir));
    }

    default_data_dir(app_name)
}

fn expand_home(path: &Path) -> PathBuf {
    if let Some(rest) = path.to_str().and_then(|s| s.strip_prefix("~/")) {
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home).join(rest);
        }
    }
    path.to_path_buf()
}

fn default_data_dir(app_name: &str) -> PathBuf {
    match std::env::var("HOME") {
        Ok(home) => PathBuf::from(home).join(".local").join("share").join(app_name),
        Err(_) => PathBuf::from(".").join(app_name),
    }
}
