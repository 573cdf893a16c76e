pub mod app_config;
pub mod config;
pub mod storefronts;
pub mod validation;

use thiserror::Error;

pub use app_config::{AppConfig, BrowserOptions, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use storefronts::{
    load_storefronts, SelectorTable, SettleDelays, StorefrontCatalog, StorefrontProfile,
    DEFAULT_STOREFRONT,
};
pub use validation::{
    compute_verdict, PriceReading, RequestError, ValidationRequest, ValidationResult, Verdict,
    PROMO_INPUT_NOT_FOUND,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read storefronts file {path}: {source}")]
    StorefrontsFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse storefronts file: {0}")]
    StorefrontsFileParse(#[from] serde_yaml::Error),

    #[error("storefront validation failed: {0}")]
    Validation(String),
}
