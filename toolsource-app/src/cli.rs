use clap::Parser;
use std::path::PathBuf;
use toolsource_config::{ToolsourceConfig, ToolsourceConfigLoader, default_config_path};

/// Capture the rendered tool source reached through a page's dropdown menu.
#[derive(Debug, Parser)]
#[command(name = "toolsource", version)]
pub struct Cli {
    /// Address of the page exposing the tool dropdown.
    pub url: String,

    /// Configuration file; must exist when given.
    #[arg(long, env = "TOOLSOURCE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Write the captured content here instead of stdout.
    #[arg(long, short)]
    pub output: Option<PathBuf>,

    /// Emit only the tool XML from the captured page.
    #[arg(long)]
    pub extract_xml: bool,

    #[arg(long)]
    pub webdriver_url: Option<String>,

    /// Show the browser window.
    #[arg(long)]
    pub headful: bool,

    /// Use the fixed 1s/5s sleeps instead of condition waits.
    #[arg(long)]
    pub fixed_delays: bool,
}

impl Cli {
    /// Load the config file (explicit, else the optional per-user default)
    /// with env overrides, then apply the flags on top.
    pub fn load_config(&self) -> anyhow::Result<ToolsourceConfig> {
        let loader = match (&self.config, default_config_path()) {
            (Some(path), _) => ToolsourceConfigLoader::new().with_file(path),
            (None, Some(default)) => ToolsourceConfigLoader::new().with_optional_file(default),
            (None, None) => ToolsourceConfigLoader::new(),
        };
        let mut config = loader.load()?;
        self.apply_overrides(&mut config);
        Ok(config)
    }

    pub fn apply_overrides(&self, config: &mut ToolsourceConfig) {
        if let Some(url) = &self.webdriver_url {
            config.browser.webdriver_url = url.clone();
        }
        if self.headful {
            config.browser.headless = false;
        }
        if self.extract_xml {
            config.output.extract_xml = true;
        }
        if let Some(path) = &self.output {
            config.output.file = Some(path.clone());
        }
    }
}
