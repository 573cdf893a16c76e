//! The browser primitives the validation workflow depends on.
//!
//! Implementations own one browser instance and one page. Element-not-found
//! and navigation timeouts are reported as ordinary [`BrowserError`] values.

use async_trait::async_trait;
use url::Url;

use crate::error::BrowserError;

#[async_trait]
pub trait BrowserSession: Send {
    /// Navigates the page and waits for network activity to settle.
    async fn navigate(&mut self, url: &Url) -> Result<(), BrowserError>;

    /// Whether any element currently matches `selector`.
    async fn element_exists(&mut self, selector: &str) -> Result<bool, BrowserError>;

    /// Clicks the first element matching `selector`.
    async fn click(&mut self, selector: &str) -> Result<(), BrowserError>;

    /// Focuses the first element matching `selector` and types `text` into it.
    async fn type_text(&mut self, selector: &str, text: &str) -> Result<(), BrowserError>;

    /// Sends a key press to whichever element has focus.
    async fn press_key(&mut self, key: &str) -> Result<(), BrowserError>;

    /// Trimmed text content of the first element matching `selector`, read
    /// inside the page. `None` when nothing matches.
    async fn text_content(&mut self, selector: &str) -> Result<Option<String>, BrowserError>;

    /// Shuts the browser down. Called once per session.
    async fn close(&mut self) -> Result<(), BrowserError>;
}

/// Starts fresh, exclusively-owned browser sessions.
#[async_trait]
pub trait SessionLauncher: Send + Sync {
    async fn launch(&self) -> Result<Box<dyn BrowserSession>, BrowserError>;
}
