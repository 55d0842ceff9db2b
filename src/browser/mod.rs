//! Browser automation seam. The game is only reachable through the DOM, so
//! everything above this module talks to a [`GamePage`] instead of a
//! concrete browser.

mod chrome;
#[cfg(test)]
pub(crate) mod fake;

pub use chrome::{ChromeOptions, ChromePage};

use std::fmt;
use std::time::Duration;

use crate::error::DriverError;

/// `id` and `className` of one cell element as reported by the page.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
pub struct CellElement {
    pub id: String,
    pub class: String,
}

/// Minimal set of page operations the game driver needs.
///
/// All calls block until the browser has completed them.
pub trait GamePage {
    /// Load a URL and wait for navigation to finish.
    fn goto(&mut self, url: &str) -> Result<(), DriverError>;

    /// Left-click the first element matching a CSS selector.
    fn click(&mut self, selector: &str) -> Result<(), DriverError>;

    /// Right-click (context-menu) the first element matching a CSS selector.
    fn right_click(&mut self, selector: &str) -> Result<(), DriverError>;

    /// The `class` attribute of the first element matching a CSS selector.
    /// An element without a class reads as an empty string.
    fn class_of(&mut self, selector: &str) -> Result<String, DriverError>;

    /// Every element whose id starts with `cell_`, in DOM order.
    fn cell_elements(&mut self) -> Result<Vec<CellElement>, DriverError>;

    /// Block for a fixed time, letting the page settle.
    fn pause(&mut self, duration: Duration);

    /// Release the browser.
    fn close(&mut self) -> Result<(), DriverError> {
        Ok(())
    }
}

/// Result of a cleanup step whose failure must not stop the caller.
/// Errors are debug-logged and dropped.
pub(crate) fn best_effort<T, E: fmt::Display>(what: &str, result: Result<T, E>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::debug!(error = %e, "{what} failed");
            None
        }
    }
}
