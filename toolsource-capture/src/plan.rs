use std::time::Duration;
use toolsource_config::{ReadyCondition, ToolsourceConfig};

/// Everything one capture needs besides the address.
#[derive(Debug, Clone, PartialEq)]
pub struct CapturePlan {
    pub dropdown: String,
    pub toggle: String,
    pub item: String,
    pub menu_ready: ReadyCondition,
    pub content_ready: ReadyCondition,
    pub element_timeout: Duration,
    pub ready_timeout: Duration,
    pub poll_interval: Duration,
}

impl CapturePlan {
    pub fn from_config(config: &ToolsourceConfig) -> Self {
        Self {
            dropdown: config.selectors.dropdown.clone(),
            toggle: config.selectors.toggle.clone(),
            item: config.selectors.item.clone(),
            menu_ready: config.menu_ready(),
            content_ready: config.waits.content_ready.clone(),
            element_timeout: Duration::from_millis(config.waits.element_timeout_ms),
            ready_timeout: Duration::from_millis(config.waits.ready_timeout_ms),
            poll_interval: Duration::from_millis(config.waits.poll_interval_ms),
        }
    }

    /// Swap both readiness conditions for the fixed 1s / 5s sleeps of the
    /// original script.
    pub fn with_fixed_delays(mut self) -> Self {
        self.menu_ready = ReadyCondition::Delay { millis: 1_000 };
        self.content_ready = ReadyCondition::Delay { millis: 5_000 };
        self
    }
}

impl Default for CapturePlan {
    fn default() -> Self {
        Self::from_config(&ToolsourceConfig::default())
    }
}
