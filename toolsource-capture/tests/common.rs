#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::{Value, json};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock};
use std::time::Duration;
use tokio::time::{Instant, sleep};
use toolsource_common::observability::{LogConfig, LogFormat};
use toolsource_common::{Result, ToolsourceError};
use toolsource_config::{
    DEFAULT_CONTENT_SELECTOR, DEFAULT_DROPDOWN_SELECTOR, DEFAULT_ITEM_SELECTOR,
    DEFAULT_TOGGLE_SELECTOR,
};
use toolsource_drivers::browser::session::{BrowserSession, SessionLauncher};

static INIT_PATH: OnceLock<std::path::PathBuf> = OnceLock::new();

pub fn init_test_tracing() {
    let _ = INIT_PATH.get_or_init(|| {
        let config = LogConfig {
            app_name: "toolsource-tests",
            emit_stderr: true,
            format: if std::env::var("TOOLSOURCE_LOG_FORMAT")
                .map(|raw| raw.trim().eq_ignore_ascii_case("json"))
                .unwrap_or(false)
            {
                LogFormat::Json
            } else {
                LogFormat::Text
            },
            default_filter: "debug".to_string(),
            ..LogConfig::default()
        };

        toolsource_common::observability::init_logging(config).unwrap_or_default()
    });
}

/// Marker the fixture reveals once the "view source" item is clicked.
pub const SOURCE_MARKER: &str = "SOURCE-OK";

/// Shape of the simulated page.
#[derive(Debug, Clone)]
pub struct FixturePage {
    pub has_dropdown: bool,
    pub has_item: bool,
    /// Number of `document.readyState` polls answered `false` first.
    pub loading_polls: usize,
    /// Client-side render time between the item click and the source
    /// appearing. `readyState` stays `complete` throughout, like a
    /// single-page app route change.
    pub render_delay: Duration,
}

impl Default for FixturePage {
    fn default() -> Self {
        Self {
            has_dropdown: true,
            has_item: true,
            loading_polls: 0,
            render_delay: Duration::ZERO,
        }
    }
}

impl FixturePage {
    pub fn without_dropdown() -> Self {
        Self {
            has_dropdown: false,
            ..Self::default()
        }
    }

    pub fn rendering_after(render_delay: Duration) -> Self {
        Self {
            render_delay,
            ..Self::default()
        }
    }
}

/// Counters shared between a launcher, its sessions and the test.
#[derive(Debug, Default)]
pub struct SessionStats {
    pub launched: AtomicUsize,
    pub closed: AtomicUsize,
    pub calls: Mutex<Vec<String>>,
}

impl SessionStats {
    pub fn launched(&self) -> usize {
        self.launched.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

pub struct FixtureLauncher {
    page: FixturePage,
    pub stats: Arc<SessionStats>,
}

impl FixtureLauncher {
    pub fn new(page: FixturePage) -> Self {
        Self {
            page,
            stats: Arc::new(SessionStats::default()),
        }
    }
}

#[async_trait]
impl SessionLauncher for FixtureLauncher {
    type Session = FixtureSession;

    async fn launch(&self) -> Result<FixtureSession> {
        self.stats.launched.fetch_add(1, Ordering::SeqCst);
        Ok(FixtureSession::new(self.page.clone(), self.stats.clone()))
    }
}

/// In-process stand-in for a browser tab showing the fixture page.
pub struct FixtureSession {
    page: FixturePage,
    stats: Arc<SessionStats>,
    url: Option<String>,
    menu_open: bool,
    item_clicked_at: Option<Instant>,
    ready_polls: usize,
    closed: bool,
}

impl FixtureSession {
    pub fn new(page: FixturePage, stats: Arc<SessionStats>) -> Self {
        Self {
            page,
            stats,
            url: None,
            menu_open: false,
            item_clicked_at: None,
            ready_polls: 0,
            closed: false,
        }
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed {
            Err(ToolsourceError::SessionClosed)
        } else {
            Ok(())
        }
    }

    fn revealed(&self) -> bool {
        self.item_clicked_at
            .is_some_and(|clicked| clicked.elapsed() >= self.page.render_delay)
    }

    fn present(&self, selector: &str) -> bool {
        if self.url.is_none() {
            return false;
        }
        match selector {
            DEFAULT_DROPDOWN_SELECTOR | DEFAULT_TOGGLE_SELECTOR => self.page.has_dropdown,
            DEFAULT_ITEM_SELECTOR => self.page.has_item && self.menu_open,
            DEFAULT_CONTENT_SELECTOR | "#tool-source" => self.revealed(),
            _ => false,
        }
    }

    fn markup(&self) -> String {
        let mut html = String::from("<html><head><title>fixture</title></head><body>");
        if self.page.has_dropdown {
            html.push_str(r#"<div class="tool-dropdown"><button>Options</button>"#);
            if self.menu_open && self.page.has_item {
                html.push_str(
                    r#"<a class="dropdown-item"><svg class="fa-eye"></svg>View Tool source</a>"#,
                );
            }
            html.push_str("</div>");
        }
        if self.revealed() {
            html.push_str(&format!(
                r#"<pre id="tool-source"><code class="language-xml">&lt;tool id=&quot;fixture&quot;&gt;{SOURCE_MARKER}&lt;/tool&gt;</code></pre>"#
            ));
        }
        html.push_str("</body></html>");
        html
    }
}

#[async_trait]
impl BrowserSession for FixtureSession {
    async fn goto(&mut self, url: &str) -> Result<()> {
        self.ensure_open()?;
        self.stats.record(format!("goto {url}"));
        if url.contains(".invalid") {
            return Err(ToolsourceError::Navigation {
                url: url.to_string(),
                reason: "unknown error: net::ERR_NAME_NOT_RESOLVED".to_string(),
            });
        }
        self.url = Some(url.to_string());
        self.menu_open = false;
        self.item_clicked_at = None;
        self.ready_polls = 0;
        Ok(())
    }

    async fn wait_for_element(
        &mut self,
        selector: &str,
        timeout: Duration,
        poll: Duration,
    ) -> Result<()> {
        self.ensure_open()?;
        self.stats.record(format!("wait {selector}"));
        let deadline = Instant::now() + timeout;
        loop {
            if self.present(selector) {
                return Ok(());
            }
            let now = Instant::now();
            if now >= deadline {
                return Err(ToolsourceError::ElementTimeout {
                    selector: selector.to_string(),
                    timeout,
                });
            }
            sleep(poll.max(Duration::from_millis(1)).min(deadline - now)).await;
        }
    }

    async fn click(&mut self, selector: &str) -> Result<()> {
        self.ensure_open()?;
        self.stats.record(format!("click {selector}"));
        if !self.present(selector) {
            return Err(ToolsourceError::ElementNotFound {
                selector: selector.to_string(),
            });
        }
        match selector {
            DEFAULT_TOGGLE_SELECTOR => self.menu_open = true,
            DEFAULT_ITEM_SELECTOR => self.item_clicked_at = Some(Instant::now()),
            _ => {}
        }
        Ok(())
    }

    async fn evaluate(&mut self, script: &str) -> Result<Value> {
        self.ensure_open()?;
        self.stats.record("evaluate".to_string());
        if script.contains("readyState") {
            self.ready_polls += 1;
            return Ok(json!(self.ready_polls > self.page.loading_polls));
        }
        if script.contains("explode") {
            return Err(ToolsourceError::Script(
                "javascript error: explode is not defined".to_string(),
            ));
        }
        if script.contains("#tool-source") {
            return Ok(json!(self.revealed()));
        }
        Ok(Value::Null)
    }

    async fn source(&mut self) -> Result<String> {
        self.ensure_open()?;
        self.stats.record("source".to_string());
        Ok(self.markup())
    }

    async fn current_url(&mut self) -> Result<String> {
        self.ensure_open()?;
        self.stats.record("current_url".to_string());
        Ok(self.url.clone().unwrap_or_else(|| "about:blank".to_string()))
    }

    async fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.stats.closed.fetch_add(1, Ordering::SeqCst);
        self.stats.record("close".to_string());
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.closed
    }
}
