//! Capture of a page's "view source" sub-page.
//!
//! - [`capture`]: the capture procedure and the [`SourceCapturer`] trait
//! - [`plan`]: selectors, readiness conditions and timeouts for one capture
//! - [`ready`]: condition waits used between interactions
//! - [`extract`]: checksum and code-block extraction from captured markup

pub mod capture;
pub mod extract;
pub mod plan;
pub mod ready;

pub use capture::{
    capture_with, failure_report, CapturedSource, DropdownCapturer, SourceCapturer,
    FAILURE_PREFIX,
};
pub use plan::CapturePlan;
