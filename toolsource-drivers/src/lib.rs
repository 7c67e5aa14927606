//! Driver layer for browser automation.
//!
//! This crate exposes the browser session abstraction the capture procedure
//! runs against, and its WebDriver implementation.
//!
//! - [`browser::session::BrowserSession`]: one exclusively-owned page/tab
//! - [`browser::session::SessionLauncher`]: opens sessions
//! - [`browser::driver::WebDriverLauncher`]: `fantoccini` client against a
//!   running WebDriver service (chromedriver by default)
//! - [`browser::args`]: Chrome command-line arguments and capabilities
pub mod browser;
