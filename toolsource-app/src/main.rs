use anyhow::Result;
use clap::Parser;
use cli::Cli;
use std::path::PathBuf;
use std::process::ExitCode;
use tokio_util::sync::CancellationToken;
use toolsource_capture::{CapturePlan, DropdownCapturer, SourceCapturer, failure_report};
use toolsource_common::ToolsourceError;
use toolsource_common::observability::{LogConfig, init_logging, init_stderr_logging};
use toolsource_config::{LoggingConfig, ToolsourceConfig};
use toolsource_drivers::browser::driver::WebDriverLauncher;
use tracing::{error, info, warn};

mod cli;
mod output;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // 1) Load config (env and flags win)
    let config = match cli.load_config() {
        Ok(config) => config,
        Err(e) => return Ok(report(&ToolsourceError::Config(e.to_string()))),
    };

    // 2) Logging goes to a file (and optionally stderr); stdout is for content
    match log_config(&config.logging) {
        Ok(log) => {
            start_logging(log);
        }
        Err(e) => return Ok(report(&e)),
    }

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received; cancelling capture");
            trigger.cancel();
        }
    });

    Ok(match run(&cli, &config, &cancel).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => report(&e),
    })
}

async fn run(
    cli: &Cli,
    config: &ToolsourceConfig,
    cancel: &CancellationToken,
) -> toolsource_common::Result<()> {
    let mut plan = CapturePlan::from_config(config);
    if cli.fixed_delays {
        plan = plan.with_fixed_delays();
    }
    let capturer = DropdownCapturer::new(WebDriverLauncher::new(config.browser.clone()), plan);

    info!(url = %cli.url, "capturing tool source");
    let captured = capturer.capture(&cli.url, cancel).await?;
    let text = output::render(&captured, &config.output)?;
    output::emit(&text, config.output.file.as_deref()).await
}

fn log_config(logging: &LoggingConfig) -> Result<LogConfig, ToolsourceError> {
    let format = logging
        .format
        .parse()
        .map_err(|e: anyhow::Error| ToolsourceError::Config(e.to_string()))?;
    Ok(LogConfig {
        app_name: "toolsource",
        log_dir: logging.dir.clone(),
        emit_stderr: logging.stderr,
        format,
        default_filter: logging.filter.clone(),
    })
}

/// A broken log directory must not stop the capture: fall back to stderr.
fn start_logging(log: LogConfig) -> Option<PathBuf> {
    match init_logging(log.clone()) {
        Ok(path) => Some(path),
        Err(e) => {
            // nothing left to log through if this fails too
            let _ = init_stderr_logging(&log);
            warn!(error = %format!("{e:#}"), "file logging unavailable; using stderr");
            None
        }
    }
}

fn report(err: &ToolsourceError) -> ExitCode {
    error!(kind = %err.kind(), error = %err, "capture failed");
    eprintln!("{}", failure_report(err));
    ExitCode::from(err.exit_code())
}
