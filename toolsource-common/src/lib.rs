//! Common types and utilities shared across toolsource crates.
//!
//! This crate defines the error taxonomy and the observability helpers used
//! throughout the workspace. It is intentionally lightweight so that every
//! crate can depend on it without pulling in the browser stack.
//!
//! # Overview
//!
//! - [`ToolsourceError`] and [`Result`]: shared error handling
//! - [`ErrorKind`]: flat classification callers can branch on
//! - [`observability`]: centralised tracing/logging initialisation
//!
//! # Examples
//!
//! Branching on the kind of a failure instead of its message:
//!
//! ```rust
//! use std::time::Duration;
//! use toolsource_common::{ErrorKind, ToolsourceError};
//!
//! let err = ToolsourceError::ElementTimeout {
//!     selector: ".tool-dropdown".into(),
//!     timeout: Duration::from_secs(30),
//! };
//! assert_eq!(err.kind(), ErrorKind::ElementTimeout);
//! assert_eq!(err.exit_code(), 5);
//! ```
use std::fmt;
use std::time::Duration;

pub mod observability;

/// Error types used across the toolsource system.
#[derive(thiserror::Error, Debug)]
pub enum ToolsourceError {
    /// Configuration was incomplete or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The browser session could not be started or talked to.
    #[error("Browser session error: {0}")]
    Session(String),

    /// Navigating to the target address failed.
    #[error("Navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    /// A selector did not match anything before the wait expired.
    #[error("Timed out after {timeout:?} waiting for element `{selector}`")]
    ElementTimeout { selector: String, timeout: Duration },

    /// A selector did not match anything when an action needed it.
    #[error("No element matches `{selector}`")]
    ElementNotFound { selector: String },

    /// The element was found but the browser refused the interaction.
    #[error("Interaction with `{selector}` failed: {reason}")]
    Interaction { selector: String, reason: String },

    /// A readiness condition never became true.
    #[error("Page not ready after {timeout:?}: {condition}")]
    Readiness { condition: String, timeout: Duration },

    /// A page script could not be evaluated.
    #[error("Script evaluation failed: {0}")]
    Script(String),

    /// Document content could not be read back from the page.
    #[error("Content extraction failed: {0}")]
    Extraction(String),

    /// The session was used after it had been closed.
    #[error("Browser session is closed")]
    SessionClosed,

    /// The capture was cancelled before it finished.
    #[error("Capture cancelled")]
    Cancelled,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Flat classification of [`ToolsourceError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Config,
    Session,
    Navigation,
    ElementTimeout,
    ElementNotFound,
    Interaction,
    Readiness,
    Script,
    Extraction,
    SessionClosed,
    Cancelled,
    Io,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Config => "config",
            ErrorKind::Session => "session",
            ErrorKind::Navigation => "navigation",
            ErrorKind::ElementTimeout => "element_timeout",
            ErrorKind::ElementNotFound => "element_not_found",
            ErrorKind::Interaction => "interaction",
            ErrorKind::Readiness => "readiness",
            ErrorKind::Script => "script",
            ErrorKind::Extraction => "extraction",
            ErrorKind::SessionClosed => "session_closed",
            ErrorKind::Cancelled => "cancelled",
            ErrorKind::Io => "io",
        }
    }

    /// Process exit status reported by the binary for this kind.
    pub fn exit_code(&self) -> u8 {
        match self {
            ErrorKind::Config => 2,
            ErrorKind::Session | ErrorKind::SessionClosed => 3,
            ErrorKind::Navigation => 4,
            ErrorKind::ElementTimeout | ErrorKind::ElementNotFound => 5,
            ErrorKind::Interaction | ErrorKind::Readiness | ErrorKind::Script => 6,
            ErrorKind::Extraction => 7,
            ErrorKind::Cancelled => 130,
            ErrorKind::Io => 1,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ToolsourceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ToolsourceError::Config(_) => ErrorKind::Config,
            ToolsourceError::Session(_) => ErrorKind::Session,
            ToolsourceError::Navigation { .. } => ErrorKind::Navigation,
            ToolsourceError::ElementTimeout { .. } => ErrorKind::ElementTimeout,
            ToolsourceError::ElementNotFound { .. } => ErrorKind::ElementNotFound,
            ToolsourceError::Interaction { .. } => ErrorKind::Interaction,
            ToolsourceError::Readiness { .. } => ErrorKind::Readiness,
            ToolsourceError::Script(_) => ErrorKind::Script,
            ToolsourceError::Extraction(_) => ErrorKind::Extraction,
            ToolsourceError::SessionClosed => ErrorKind::SessionClosed,
            ToolsourceError::Cancelled => ErrorKind::Cancelled,
            ToolsourceError::Io(_) => ErrorKind::Io,
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.kind().exit_code()
    }
}

/// Convenient alias for results that use [`ToolsourceError`].
pub type Result<T> = std::result::Result<T, ToolsourceError>;
