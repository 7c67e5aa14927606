use crate::browser::{
    args::build_capabilities,
    session::{BrowserSession, SessionLauncher},
};
use async_trait::async_trait;
use fantoccini::{error::CmdError, Client, ClientBuilder, Locator};
use serde_json::Value;
use std::time::Duration;
use toolsource_common::{Result, ToolsourceError};
use toolsource_config::BrowserConfig;
use tracing::{debug, warn};

/// Opens `fantoccini` WebDriver sessions against a running WebDriver
/// service; creating the session is what starts the browser process.
#[derive(Debug, Clone)]
pub struct WebDriverLauncher {
    config: BrowserConfig,
}

impl WebDriverLauncher {
    pub fn new(config: BrowserConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl SessionLauncher for WebDriverLauncher {
    type Session = WebDriverSession;

    async fn launch(&self) -> Result<WebDriverSession> {
        let caps = build_capabilities(&self.config);
        debug!(
            target: "browser.session",
            webdriver = %self.config.webdriver_url,
            headless = self.config.headless,
            "opening WebDriver session"
        );

        let client = ClientBuilder::native()
            .capabilities(caps)
            .connect(&self.config.webdriver_url)
            .await
            .map_err(|e| {
                ToolsourceError::Session(format!(
                    "could not start a session at {}: {e}",
                    self.config.webdriver_url
                ))
            })?;

        Ok(WebDriverSession {
            client: Some(client),
        })
    }
}

/// Thin wrapper around a `fantoccini` client mapping its errors onto
/// [`ToolsourceError`] kinds.
pub struct WebDriverSession {
    client: Option<Client>,
}

impl WebDriverSession {
    fn client(&self) -> Result<&Client> {
        self.client.as_ref().ok_or(ToolsourceError::SessionClosed)
    }
}

#[async_trait]
impl BrowserSession for WebDriverSession {
    async fn goto(&mut self, url: &str) -> Result<()> {
        self.client()?
            .goto(url)
            .await
            .map_err(|e| ToolsourceError::Navigation {
                url: url.to_string(),
                reason: e.to_string(),
            })
    }

    async fn wait_for_element(
        &mut self,
        selector: &str,
        timeout: Duration,
        poll: Duration,
    ) -> Result<()> {
        self.client()?
            .wait()
            .at_most(timeout)
            .every(poll)
            .for_element(Locator::Css(selector))
            .await
            .map(|_| ())
            .map_err(|e| classify_wait_error(e, selector, timeout))
    }

    async fn click(&mut self, selector: &str) -> Result<()> {
        let element = self
            .client()?
            .find(Locator::Css(selector))
            .await
            .map_err(|e| classify_lookup_error(e, selector))?;
        element
            .click()
            .await
            .map_err(|e| ToolsourceError::Interaction {
                selector: selector.to_string(),
                reason: e.to_string(),
            })
    }

    async fn evaluate(&mut self, script: &str) -> Result<Value> {
        self.client()?
            .execute(script, vec![])
            .await
            .map_err(|e| ToolsourceError::Script(e.to_string()))
    }

    async fn source(&mut self) -> Result<String> {
        self.client()?
            .source()
            .await
            .map_err(|e| ToolsourceError::Extraction(e.to_string()))
    }

    async fn current_url(&mut self) -> Result<String> {
        self.client()?
            .current_url()
            .await
            .map(|url| url.to_string())
            .map_err(|e| ToolsourceError::Session(e.to_string()))
    }

    async fn close(&mut self) -> Result<()> {
        let Some(client) = self.client.take() else {
            return Ok(());
        };
        debug!(target: "browser.session", "closing WebDriver session");
        client.close().await.map_err(|e| {
            warn!(target: "browser.session", error = %e, "session close failed");
            ToolsourceError::Session(format!("failed to end session: {e}"))
        })
    }

    fn is_closed(&self) -> bool {
        self.client.is_none()
    }
}

fn classify_wait_error(err: CmdError, selector: &str, timeout: Duration) -> ToolsourceError {
    match err {
        CmdError::WaitTimeout => ToolsourceError::ElementTimeout {
            selector: selector.to_string(),
            timeout,
        },
        other => ToolsourceError::Session(other.to_string()),
    }
}

fn classify_lookup_error(err: CmdError, selector: &str) -> ToolsourceError {
    match err {
        e if e.is_no_such_element() => ToolsourceError::ElementNotFound {
            selector: selector.to_string(),
        },
        other => ToolsourceError::Interaction {
            selector: selector.to_string(),
            reason: other.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fantoccini::error::{ErrorStatus, WebDriver};
    use toolsource_common::ErrorKind;

    fn detached() -> WebDriverSession {
        WebDriverSession { client: None }
    }

    #[test]
    fn wait_timeout_is_an_element_timeout() {
        let err = classify_wait_error(
            CmdError::WaitTimeout,
            ".tool-dropdown",
            Duration::from_secs(30),
        );
        assert_eq!(err.kind(), ErrorKind::ElementTimeout);
        assert!(err.to_string().contains(".tool-dropdown"));
    }

    #[test]
    fn missing_element_on_lookup_is_not_found() {
        let err = classify_lookup_error(
            CmdError::Standard(WebDriver::new(
                ErrorStatus::NoSuchElement,
                "no such element: Unable to locate element",
            )),
            ".dropdown-item:has(svg.fa-eye)",
        );
        assert_eq!(err.kind(), ErrorKind::ElementNotFound);
        assert!(err.to_string().contains("fa-eye"));
    }

    #[test]
    fn other_lookup_failures_are_interaction_errors() {
        let err = classify_lookup_error(
            CmdError::Standard(WebDriver::new(
                ErrorStatus::InvalidSelector,
                "invalid selector",
            )),
            "button[",
        );
        assert_eq!(err.kind(), ErrorKind::Interaction);
    }

    #[tokio::test]
    async fn closed_session_rejects_operations() {
        let mut session = detached();
        assert!(session.is_closed());
        let err = session.goto("http://localhost/").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SessionClosed);
        let err = session.source().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SessionClosed);
    }

    #[tokio::test]
    async fn closing_twice_is_a_no_op() {
        let mut session = detached();
        session.close().await.unwrap();
        session.close().await.unwrap();
    }
}
