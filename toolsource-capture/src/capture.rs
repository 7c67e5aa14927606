use crate::{extract, plan::CapturePlan, ready::wait_until};
use async_trait::async_trait;
use std::future::Future;
use tokio_util::sync::CancellationToken;
use toolsource_common::{Result, ToolsourceError};
use toolsource_drivers::browser::session::{BrowserSession, SessionLauncher};
use tracing::{debug, error, info, warn};

/// Prefix of the single diagnostic line printed when a capture fails.
pub const FAILURE_PREFIX: &str = "Error capturing content:";

/// Rendered markup of the page reached through the "view source" action.
#[derive(Debug, Clone, PartialEq)]
pub struct CapturedSource {
    pub url: String,
    pub html: String,
    /// blake3 of `html`, hex encoded.
    pub checksum: String,
}

impl CapturedSource {
    pub fn new(url: &str, html: String) -> Self {
        Self {
            url: url.to_string(),
            checksum: extract::checksum(&html),
            html,
        }
    }

    /// Text of the first `<code>` block carrying `class`, if the page has one.
    pub fn code_block(&self, class: &str) -> Option<String> {
        extract::extract_code_block(&self.html, class)
    }
}

#[async_trait]
pub trait SourceCapturer: Send + Sync {
    async fn capture(&self, url: &str, cancel: &CancellationToken) -> Result<CapturedSource>;
}

/// Opens the tool dropdown, follows its "view source" item and captures
/// the resulting document.
pub struct DropdownCapturer<L> {
    launcher: L,
    plan: CapturePlan,
}

impl<L: SessionLauncher> DropdownCapturer<L> {
    pub fn new(launcher: L, plan: CapturePlan) -> Self {
        Self { launcher, plan }
    }
}

#[async_trait]
impl<L: SessionLauncher> SourceCapturer for DropdownCapturer<L> {
    async fn capture(&self, url: &str, cancel: &CancellationToken) -> Result<CapturedSource> {
        capture_with(&self.launcher, url, &self.plan, cancel).await
    }
}

/// Run one capture: launch, drive the page, and close the session on every
/// exit path.
///
/// When the steps succeed but closing fails, the close error is returned.
/// When a step fails, that error is returned and a close failure is only
/// logged.
pub async fn capture_with<L>(
    launcher: &L,
    url: &str,
    plan: &CapturePlan,
    cancel: &CancellationToken,
) -> Result<CapturedSource>
where
    L: SessionLauncher + ?Sized,
{
    if cancel.is_cancelled() {
        return Err(ToolsourceError::Cancelled);
    }

    // launch is not raced against cancellation: a session created by a
    // dropped launch future could not be closed
    let mut session = launcher.launch().await?;
    info!(target: "capture.step", step = "launch", %url, "browser session open");

    let outcome = run_steps(&mut session, url, plan, cancel).await;
    let released = session.close().await;

    match (outcome, released) {
        (Ok(html), Ok(())) => {
            let captured = CapturedSource::new(url, html);
            info!(
                target: "capture.step",
                step = "done",
                %url,
                bytes = captured.html.len(),
                checksum = %captured.checksum,
                "capture complete"
            );
            Ok(captured)
        }
        (Ok(_), Err(close_err)) => Err(close_err),
        (Err(err), Ok(())) => Err(err),
        (Err(err), Err(close_err)) => {
            warn!(
                target: "capture.step",
                error = %close_err,
                "session close failed after capture error"
            );
            Err(err)
        }
    }
}

async fn run_steps<S>(
    session: &mut S,
    url: &str,
    plan: &CapturePlan,
    cancel: &CancellationToken,
) -> Result<String>
where
    S: BrowserSession,
{
    step("navigate", cancel, session.goto(url)).await?;
    step(
        "await_dropdown",
        cancel,
        session.wait_for_element(&plan.dropdown, plan.element_timeout, plan.poll_interval),
    )
    .await?;
    step("open_menu", cancel, session.click(&plan.toggle)).await?;
    step("menu_ready", cancel, wait_until(session, &plan.menu_ready, plan)).await?;
    step("view_source", cancel, session.click(&plan.item)).await?;
    step(
        "content_ready",
        cancel,
        wait_until(session, &plan.content_ready, plan),
    )
    .await?;
    step("extract", cancel, async {
        // client-side routing may have moved the page since navigation
        let at = session.current_url().await?;
        debug!(target: "capture.step", step = "extract", %at, "reading document");
        session.source().await
    })
    .await
}

async fn step<T, F>(name: &'static str, cancel: &CancellationToken, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    info!(target: "capture.step", step = name, "start");
    let result = tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(ToolsourceError::Cancelled),
        res = fut => res,
    };
    if let Err(err) = &result {
        error!(target: "capture.step", step = name, kind = %err.kind(), error = %err, "step failed");
    }
    result
}

/// The diagnostic line for a failed capture, identical in shape for every
/// error kind.
pub fn failure_report(err: &ToolsourceError) -> String {
    format!("{FAILURE_PREFIX} {err}")
}
