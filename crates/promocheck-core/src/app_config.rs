use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// Launch settings for the controlled browser.
///
/// Sandboxing is always disabled; only headless mode, the executable and the
/// timeouts are configurable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowserOptions {
    pub headless: bool,
    pub executable: Option<PathBuf>,
    /// Bound on a single navigation, including the wait for network idle.
    pub navigation_timeout: Duration,
    /// Bound on every other browser protocol request.
    pub element_timeout: Duration,
}

impl Default for BrowserOptions {
    fn default() -> Self {
        Self {
            headless: true,
            executable: None,
            navigation_timeout: Duration::from_secs(30),
            element_timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub storefronts_path: PathBuf,
    pub default_storefront: String,
    pub browser: BrowserOptions,
}
