use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use toolsource_common::Result;

/// A live handle to a browser process and its open page.
///
/// A session is owned by exactly one capture. Once [`close`](Self::close)
/// has run, every other operation fails with
/// [`ToolsourceError::SessionClosed`](toolsource_common::ToolsourceError::SessionClosed)
/// and further `close` calls are no-ops.
#[async_trait]
pub trait BrowserSession: Send {
    /// Navigate the page to `url` and wait for the load to finish.
    async fn goto(&mut self, url: &str) -> Result<()>;

    /// Wait until `selector` matches an element, checking every `poll`.
    async fn wait_for_element(
        &mut self,
        selector: &str,
        timeout: Duration,
        poll: Duration,
    ) -> Result<()>;

    /// Click the first element matching `selector`.
    async fn click(&mut self, selector: &str) -> Result<()>;

    /// Run a script body in the page and return its result. The body must `return`.
    async fn evaluate(&mut self, script: &str) -> Result<Value>;

    /// Serialized markup of the current document.
    async fn source(&mut self) -> Result<String>;

    async fn current_url(&mut self) -> Result<String>;

    /// End the session and release the browser.
    async fn close(&mut self) -> Result<()>;

    fn is_closed(&self) -> bool;
}

/// Opens browser sessions.
#[async_trait]
pub trait SessionLauncher: Send + Sync {
    type Session: BrowserSession;

    async fn launch(&self) -> Result<Self::Session>;
}
