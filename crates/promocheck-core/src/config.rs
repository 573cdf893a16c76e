use crate::app_config::{AppConfig, BrowserOptions, Environment};
use crate::storefronts::DEFAULT_STOREFRONT;
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a variable holds an invalid value.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a variable holds an invalid value.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Every variable has a default, so an empty environment is valid.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::{IpAddr, SocketAddr};
    use std::path::PathBuf;
    use std::time::Duration;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_port = |var: &str, default: &str| -> Result<u16, ConfigError> {
        let raw = or_default(var, default);
        raw.trim()
            .parse::<u16>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_ip = |var: &str, default: &str| -> Result<IpAddr, ConfigError> {
        let raw = or_default(var, default);
        raw.trim()
            .parse::<IpAddr>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_secs = |var: &str, default: &str| -> Result<Duration, ConfigError> {
        let raw = or_default(var, default);
        let secs = raw
            .trim()
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))?;
        if secs == 0 {
            return Err(invalid(var, "must be greater than zero".to_string()));
        }
        Ok(Duration::from_secs(secs))
    };

    let env = parse_environment(&or_default("PROMOCHECK_ENV", "development"))?;

    let port = parse_port("PORT", "3000")?;
    let host = parse_ip("PROMOCHECK_HOST", "0.0.0.0")?;
    let bind_addr = SocketAddr::new(host, port);
    let log_level = or_default("PROMOCHECK_LOG_LEVEL", "info");
    let storefronts_path = PathBuf::from(or_default(
        "PROMOCHECK_STOREFRONTS_PATH",
        "./config/storefronts.yaml",
    ));
    let default_storefront = or_default("PROMOCHECK_DEFAULT_STOREFRONT", DEFAULT_STOREFRONT);
    if default_storefront.trim().is_empty() {
        return Err(invalid(
            "PROMOCHECK_DEFAULT_STOREFRONT",
            "must be non-empty".to_string(),
        ));
    }

    let headless = parse_bool(
        "PROMOCHECK_BROWSER_HEADLESS",
        &or_default("PROMOCHECK_BROWSER_HEADLESS", "true"),
    )?;
    let executable = lookup("PROMOCHECK_BROWSER_EXECUTABLE")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .map(PathBuf::from);
    let navigation_timeout = parse_secs("PROMOCHECK_NAVIGATION_TIMEOUT_SECS", "30")?;
    let element_timeout = parse_secs("PROMOCHECK_ELEMENT_TIMEOUT_SECS", "30")?;

    Ok(AppConfig {
        env,
        bind_addr,
        log_level,
        storefronts_path,
        default_storefront,
        browser: BrowserOptions {
            headless,
            executable,
            navigation_timeout,
            element_timeout,
        },
    })
}

/// Parse a string into an `Environment` variant.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "PROMOCHECK_ENV".to_string(),
            reason: format!("unknown environment '{other}'"),
        }),
    }
}

fn parse_bool(var: &str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        other => Err(ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: format!("expected a boolean, got '{other}'"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
