use thiserror::Error;

#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("failed to launch browser: {0}")]
    Launch(String),

    #[error("navigation to {url} timed out after {timeout_secs}s")]
    NavigationTimeout { url: String, timeout_secs: u64 },

    #[error("navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    #[error("element not found: {selector} ({reason})")]
    ElementNotFound { selector: String, reason: String },

    #[error("unsupported key: {0}")]
    UnsupportedKey(String),

    #[error("failed to build key event: {0}")]
    Input(String),

    #[error("unexpected script result for {context}: {source}")]
    Script {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("cannot build cart URL from {store_url}: {source}")]
    CartUrl {
        store_url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("{step} failed: {reason}")]
    StepFailed { step: &'static str, reason: String },

    #[error("browser protocol error: {0}")]
    Protocol(#[from] chromiumoxide::error::CdpError),
}
