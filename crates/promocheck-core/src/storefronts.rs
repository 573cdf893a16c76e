use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::ConfigError;

/// Profile used when neither the request nor the environment names one.
pub const DEFAULT_STOREFRONT: &str = "noon-sa";

/// CSS selectors for every element the workflow touches on one storefront.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectorTable {
    pub price: String,
    pub add_to_cart: String,
    pub promo_input: String,
    pub apply_button: String,
    pub total: String,
    pub error: String,
}

/// Fixed waits after each interaction, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SettleDelays {
    pub after_add_to_cart_ms: u64,
    pub after_type_ms: u64,
    pub after_apply_ms: u64,
}

impl Default for SettleDelays {
    fn default() -> Self {
        Self {
            after_add_to_cart_ms: 2_000,
            after_type_ms: 1_000,
            after_apply_ms: 3_000,
        }
    }
}

impl SettleDelays {
    #[must_use]
    pub fn after_add_to_cart(&self) -> Duration {
        Duration::from_millis(self.after_add_to_cart_ms)
    }

    #[must_use]
    pub fn after_type(&self) -> Duration {
        Duration::from_millis(self.after_type_ms)
    }

    #[must_use]
    pub fn after_apply(&self) -> Duration {
        Duration::from_millis(self.after_apply_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorefrontProfile {
    pub name: String,
    /// Absolute path of the cart page, joined onto the store origin.
    pub cart_path: String,
    pub selectors: SelectorTable,
    #[serde(default)]
    pub settle: SettleDelays,
}

impl StorefrontProfile {
    /// Built-in profile for noon.com (Saudi Arabia, English).
    #[must_use]
    pub fn noon_saudi() -> Self {
        Self {
            name: DEFAULT_STOREFRONT.to_string(),
            cart_path: "/saudi-en/cart/".to_string(),
            selectors: SelectorTable {
                price: r#"[data-qa="div-price-now"]"#.to_string(),
                add_to_cart: ".QuickAtc-module-scss-module__x7ROma__atcCta".to_string(),
                promo_input: r#"[data-qa="cart-input_coupon_code"]"#.to_string(),
                apply_button: r#"[data-qa="cart-apply_coupon_code"]"#.to_string(),
                total: ".CartInvoiceSummary-module-scss-module__97FMcq__column.CartInvoiceSummary-module-scss-module__97FMcq__largerText".to_string(),
                error: r#".error, .alert-danger, [class*="error"]"#.to_string(),
            },
            settle: SettleDelays::default(),
        }
    }

    /// Cart page URL: the store's origin followed by this profile's cart path.
    ///
    /// Any path, query or fragment on `store_url` is discarded.
    ///
    /// # Errors
    ///
    /// Returns a parse error if the joined URL is not valid.
    pub fn cart_url(&self, store_url: &Url) -> Result<Url, url::ParseError> {
        let origin = store_url.origin().ascii_serialization();
        Url::parse(&format!("{origin}{}", self.cart_path))
    }
}

#[derive(Debug, Deserialize)]
pub struct StorefrontsFile {
    pub storefronts: Vec<StorefrontProfile>,
}

/// Load and validate storefront profiles from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_storefronts(path: &Path) -> Result<StorefrontsFile, ConfigError> {
    let content =
        std::fs::read_to_string(path).map_err(|e| ConfigError::StorefrontsFileIo {
            path: path.display().to_string(),
            source: e,
        })?;

    let file: StorefrontsFile = serde_yaml::from_str(&content)?;

    validate_storefronts(&file.storefronts)?;

    Ok(file)
}

fn validate_storefronts(profiles: &[StorefrontProfile]) -> Result<(), ConfigError> {
    let mut seen_names = HashSet::new();

    for profile in profiles {
        if profile.name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "storefront name must be non-empty".to_string(),
            ));
        }

        if !seen_names.insert(profile.name.to_lowercase()) {
            return Err(ConfigError::Validation(format!(
                "duplicate storefront name: '{}'",
                profile.name
            )));
        }

        if !profile.cart_path.starts_with('/') {
            return Err(ConfigError::Validation(format!(
                "storefront '{}' has cart_path '{}'; it must start with '/'",
                profile.name, profile.cart_path
            )));
        }

        let selectors = &profile.selectors;
        let named = [
            ("price", &selectors.price),
            ("add_to_cart", &selectors.add_to_cart),
            ("promo_input", &selectors.promo_input),
            ("apply_button", &selectors.apply_button),
            ("total", &selectors.total),
            ("error", &selectors.error),
        ];
        if let Some((field, _)) = named.iter().find(|(_, sel)| sel.trim().is_empty()) {
            return Err(ConfigError::Validation(format!(
                "storefront '{}' has an empty '{field}' selector",
                profile.name
            )));
        }
    }

    Ok(())
}

/// The set of profiles a process can validate against, plus its default.
#[derive(Debug, Clone)]
pub struct StorefrontCatalog {
    profiles: Vec<StorefrontProfile>,
    default_name: String,
}

impl StorefrontCatalog {
    /// Catalog holding only the built-in profile.
    #[must_use]
    pub fn builtin() -> Self {
        Self {
            profiles: vec![StorefrontProfile::noon_saudi()],
            default_name: DEFAULT_STOREFRONT.to_string(),
        }
    }

    /// Builds a catalog from explicit profiles. The built-in profile is added
    /// unless a profile with the same name is already present.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] if the profiles are invalid or
    /// `default_name` does not match any of them.
    pub fn new(
        mut profiles: Vec<StorefrontProfile>,
        default_name: &str,
    ) -> Result<Self, ConfigError> {
        validate_storefronts(&profiles)?;

        let builtin = StorefrontProfile::noon_saudi();
        if !profiles
            .iter()
            .any(|p| p.name.eq_ignore_ascii_case(&builtin.name))
        {
            profiles.push(builtin);
        }

        let catalog = Self {
            profiles,
            default_name: default_name.to_string(),
        };

        if catalog.resolve(None).is_none() {
            return Err(ConfigError::Validation(format!(
                "default storefront '{default_name}' is not defined"
            )));
        }

        Ok(catalog)
    }

    /// Loads profiles from `path` when the file exists, otherwise falls back
    /// to the built-in profile alone.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if an existing file cannot be loaded or the
    /// default profile is unknown.
    pub fn load(path: &Path, default_name: &str) -> Result<Self, ConfigError> {
        let profiles = if path.exists() {
            load_storefronts(path)?.storefronts
        } else {
            Vec::new()
        };
        Self::new(profiles, default_name)
    }

    /// Looks up a profile by name (case-insensitive); `None` selects the default.
    #[must_use]
    pub fn resolve(&self, name: Option<&str>) -> Option<&StorefrontProfile> {
        let wanted = name.unwrap_or(&self.default_name);
        self.profiles
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(wanted))
    }

    #[must_use]
    pub fn default_name(&self) -> &str {
        &self.default_name
    }

    pub fn profiles(&self) -> impl Iterator<Item = &StorefrontProfile> {
        self.profiles.iter()
    }
}
