//! Loader for toolsource configuration with YAML + environment overlays.
//!
//! Sources are merged in the order they are attached, later sources winning,
//! and `TOOLSOURCE__`-prefixed environment variables are applied last
//! (`TOOLSOURCE__BROWSER__HEADLESS=false` sets `browser.headless`). String
//! values may reference `${VAR}` placeholders, which are expanded before the
//! merged tree is deserialized. Every field has a default, so an empty
//! configuration is valid.
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::path::{Path, PathBuf};

const MAXIMUM_ENV_EXPANSION_DEPTH: usize = 8;

pub const DEFAULT_DROPDOWN_SELECTOR: &str = ".tool-dropdown";
pub const DEFAULT_TOGGLE_SELECTOR: &str = ".tool-dropdown button";
pub const DEFAULT_ITEM_SELECTOR: &str = ".dropdown-item:has(svg.fa-eye)";
/// Present once the "view source" page has rendered the tool XML.
pub const DEFAULT_CONTENT_SELECTOR: &str = "code.language-xml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsourceConfig {
    pub browser: BrowserConfig,
    pub selectors: SelectorConfig,
    pub waits: WaitConfig,
    pub output: OutputConfig,
    pub logging: LoggingConfig,
}

/// WebDriver endpoint and browser launch options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    pub webdriver_url: String,
    pub headless: bool,
    pub window_width: u32,
    pub window_height: u32,
    pub user_agent: Option<String>,
    /// Appended verbatim after the generated arguments.
    pub extra_args: Vec<String>,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            webdriver_url: "http://localhost:9515".to_string(),
            headless: true,
            window_width: 1920,
            window_height: 1080,
            user_agent: None,
            extra_args: Vec::new(),
        }
    }
}

/// CSS selectors for the dropdown, its toggle and the "view source" item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    pub dropdown: String,
    pub toggle: String,
    pub item: String,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            dropdown: DEFAULT_DROPDOWN_SELECTOR.to_string(),
            toggle: DEFAULT_TOGGLE_SELECTOR.to_string(),
            item: DEFAULT_ITEM_SELECTOR.to_string(),
        }
    }
}

/// A condition the capture waits on before moving to the next step.
///
/// The tag is `kind`:
///
/// ```yaml
/// menu_ready: { kind: delay, millis: 1000 }
/// content_ready: { kind: script, expression: "document.querySelector('pre') !== null" }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReadyCondition {
    /// Unconditional sleep.
    Delay { millis: u64 },
    /// Wait until the selector matches an element.
    Element { selector: String },
    /// Wait until `document.readyState` is `complete`. Client-side route
    /// changes do not reset it, so it only helps after a full page load.
    DocumentComplete,
    /// Wait until a JavaScript expression evaluates truthy.
    Script { expression: String },
}

impl fmt::Display for ReadyCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReadyCondition::Delay { millis } => write!(f, "delay {millis}ms"),
            ReadyCondition::Element { selector } => write!(f, "element `{selector}`"),
            ReadyCondition::DocumentComplete => f.write_str("document complete"),
            ReadyCondition::Script { expression } => write!(f, "script `{expression}`"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaitConfig {
    pub element_timeout_ms: u64,
    pub ready_timeout_ms: u64,
    pub poll_interval_ms: u64,
    /// Defaults to an element wait on `selectors.item` when unset.
    pub menu_ready: Option<ReadyCondition>,
    pub content_ready: ReadyCondition,
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            element_timeout_ms: 30_000,
            ready_timeout_ms: 30_000,
            poll_interval_ms: 100,
            menu_ready: None,
            content_ready: ReadyCondition::Element {
                selector: DEFAULT_CONTENT_SELECTOR.to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Emit only the text of the first `<code>` carrying `code_class`.
    pub extract_xml: bool,
    pub code_class: String,
    /// Write to this file instead of stdout.
    pub file: Option<PathBuf>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            extract_xml: false,
            code_class: "language-xml".to_string(),
            file: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub dir: Option<PathBuf>,
    /// `text` or `json`.
    pub format: String,
    pub stderr: bool,
    /// `EnvFilter` directives; `RUST_LOG` takes precedence.
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dir: None,
            format: "text".to_string(),
            stderr: false,
            filter: "warn,capture=info,browser=info,toolsource=info".to_string(),
        }
    }
}

/// Semantic problems the deserializer cannot catch.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum InvalidConfig {
    #[error("selector `{0}` must not be empty")]
    EmptySelector(&'static str),
    #[error("`waits.poll_interval_ms` must be greater than zero")]
    ZeroPollInterval,
    #[error("`browser.webdriver_url` must not be empty")]
    EmptyWebdriverUrl,
    #[error("browser window must be at least 1x1, got {0}x{1}")]
    EmptyWindow(u32, u32),
}

impl ToolsourceConfig {
    /// The menu readiness condition, falling back to an element wait on the item.
    pub fn menu_ready(&self) -> ReadyCondition {
        self.waits
            .menu_ready
            .clone()
            .unwrap_or_else(|| ReadyCondition::Element {
                selector: self.selectors.item.clone(),
            })
    }

    pub fn validate(&self) -> Result<(), InvalidConfig> {
        let selectors = [
            ("selectors.dropdown", &self.selectors.dropdown),
            ("selectors.toggle", &self.selectors.toggle),
            ("selectors.item", &self.selectors.item),
        ];
        for (name, value) in selectors {
            if value.trim().is_empty() {
                return Err(InvalidConfig::EmptySelector(name));
            }
        }
        if let Some(ReadyCondition::Element { selector }) = &self.waits.menu_ready {
            if selector.trim().is_empty() {
                return Err(InvalidConfig::EmptySelector("waits.menu_ready.selector"));
            }
        }
        if let ReadyCondition::Element { selector } = &self.waits.content_ready {
            if selector.trim().is_empty() {
                return Err(InvalidConfig::EmptySelector("waits.content_ready.selector"));
            }
        }
        if self.waits.poll_interval_ms == 0 {
            return Err(InvalidConfig::ZeroPollInterval);
        }
        if self.browser.webdriver_url.trim().is_empty() {
            return Err(InvalidConfig::EmptyWebdriverUrl);
        }
        if self.browser.window_width == 0 || self.browser.window_height == 0 {
            return Err(InvalidConfig::EmptyWindow(
                self.browser.window_width,
                self.browser.window_height,
            ));
        }
        Ok(())
    }
}

/// `<config_dir>/toolsource/toolsource.yaml`, if the platform has a config dir.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("toolsource").join("toolsource.yaml"))
}

fn expand_env_in_value(v: &mut Value) {
    match v {
        Value::String(s) => {
            if s.contains('$') {
                let mut cur = std::mem::take(s);
                for _ in 0..MAXIMUM_ENV_EXPANSION_DEPTH {
                    let expanded = match shellexpand::env(&cur) {
                        Ok(cow) => cow.into_owned(),
                        Err(_) => cur.clone(),
                    };
                    if expanded == cur {
                        break;
                    }
                    cur = expanded;
                }
                *s = cur;
            }
        }
        Value::Array(arr) => arr.iter_mut().for_each(expand_env_in_value),
        Value::Object(obj) => obj.values_mut().for_each(expand_env_in_value),
        _ => {}
    }
}

/// Builder hides the `config` crate wiring (YAML + env overrides).
pub struct ToolsourceConfigLoader {
    builder: config::ConfigBuilder<config::builder::DefaultState>,
}

impl Default for ToolsourceConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolsourceConfigLoader {
    /// Start with no file sources; environment overrides are applied on [`load`](Self::load).
    ///
    /// ```
    /// use toolsource_config::ToolsourceConfigLoader;
    ///
    /// let config = ToolsourceConfigLoader::new().load().expect("defaults load");
    /// assert_eq!(config.selectors.dropdown, ".tool-dropdown");
    /// assert!(config.browser.headless);
    /// ```
    pub fn new() -> Self {
        Self {
            builder: Config::builder(),
        }
    }

    /// Attach a YAML/TOML/JSON file that must exist; the `config` crate infers format by suffix.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(true));
        self
    }

    /// Attach a file that is silently skipped when missing.
    pub fn with_optional_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(false));
        self
    }

    /// Allow tests/CLI to merge inline YAML snippets.
    ///
    /// ```
    /// use toolsource_config::{ReadyCondition, ToolsourceConfigLoader};
    ///
    /// let cfg = ToolsourceConfigLoader::new()
    ///     .with_yaml_str(
    ///         r#"
    /// waits:
    ///   menu_ready: { kind: delay, millis: 1000 }
    ///   content_ready: { kind: delay, millis: 5000 }
    /// "#,
    ///     )
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(cfg.menu_ready(), ReadyCondition::Delay { millis: 1000 });
    /// assert_eq!(cfg.waits.content_ready, ReadyCondition::Delay { millis: 5000 });
    /// ```
    pub fn with_yaml_str(mut self, yaml: &str) -> Self {
        self.builder = self
            .builder
            .add_source(File::from_str(yaml, config::FileFormat::Yaml));
        self
    }

    /// Consume the builder and deserialize the merged sources into strongly typed config.
    ///
    /// `${VAR}` placeholders are expanded and the result is validated.
    ///
    /// ```
    /// use toolsource_config::ToolsourceConfigLoader;
    ///
    /// unsafe { std::env::set_var("GALAXY_UA", "toolsource-doctest"); }
    ///
    /// let config = ToolsourceConfigLoader::new()
    ///     .with_yaml_str("browser:\n  user_agent: \"${GALAXY_UA}\"\n")
    ///     .load()
    ///     .expect("valid configuration");
    ///
    /// assert_eq!(config.browser.user_agent.as_deref(), Some("toolsource-doctest"));
    ///
    /// unsafe { std::env::remove_var("GALAXY_UA"); }
    /// ```
    pub fn load(self) -> Result<ToolsourceConfig, ConfigError> {
        let cfg = self
            .builder
            .add_source(
                Environment::with_prefix("TOOLSOURCE")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        // Convert to serde_json::Value first
        let mut v: Value = cfg.try_deserialize()?;
        expand_env_in_value(&mut v);

        let typed: ToolsourceConfig =
            serde_json::from_value(v).map_err(|e| ConfigError::Message(e.to_string()))?;
        typed
            .validate()
            .map_err(|e| ConfigError::Message(e.to_string()))?;

        Ok(typed)
    }
}
