use serde_json::{json, Map, Value};
use toolsource_config::BrowserConfig;
use webdriver::capabilities::Capabilities;

/// Construct Chrome command‑line arguments for the configured browser.
pub fn build_chrome_arguments(config: &BrowserConfig) -> Vec<String> {
    let mut args = vec![
        "--no-sandbox".to_string(),
        "--disable-dev-shm-usage".to_string(),
        "--disable-infobars".to_string(),
        "--disable-extensions".to_string(),
        format!(
            "--window-size={},{}",
            config.window_width, config.window_height
        ),
    ];
    if config.headless {
        args.push("--headless=new".to_string());
        args.push("--disable-gpu".to_string());
    }
    if let Some(user_agent) = config.user_agent.as_deref() {
        args.push(format!("--user-agent={user_agent}"));
    }
    args.extend(config.extra_args.iter().cloned());
    args
}

/// WebDriver capabilities requesting a Chrome session with [`build_chrome_arguments`].
pub fn build_capabilities(config: &BrowserConfig) -> Capabilities {
    let mut chrome_opts = Map::new();
    chrome_opts.insert("args".to_string(), json!(build_chrome_arguments(config)));

    let mut caps = Capabilities::new();
    caps.insert("browserName".to_string(), Value::from("chrome"));
    caps.insert("goog:chromeOptions".to_string(), Value::Object(chrome_opts));
    caps
}
