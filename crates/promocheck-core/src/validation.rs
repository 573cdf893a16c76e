//! Request, price reading, and result types for one promo-code validation.

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use thiserror::Error;
use url::Url;

/// Reason carried by the result when the cart page has no promo input.
pub const PROMO_INPUT_NOT_FOUND: &str = "Promo code input field not found";

const MISSING: &str = "N/A";
const NO_ERROR_TEXT: &str = "None";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RequestError {
    #[error("invalid {field} \"{value}\": {reason}")]
    InvalidUrl {
        field: &'static str,
        value: String,
        reason: String,
    },

    #[error("code must be non-empty")]
    EmptyCode,
}

/// One caller-supplied validation job. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationRequest {
    store_url: Url,
    code: String,
    product_url: Url,
    storefront: Option<String>,
}

impl ValidationRequest {
    /// Parses and checks the caller's fields.
    ///
    /// Both URLs must be absolute `http` or `https` URLs.
    ///
    /// # Errors
    ///
    /// Returns [`RequestError::InvalidUrl`] for an unparseable or non-HTTP URL
    /// and [`RequestError::EmptyCode`] for a blank code.
    pub fn parse(
        store_url: &str,
        code: &str,
        product_url: &str,
        storefront: Option<&str>,
    ) -> Result<Self, RequestError> {
        if code.trim().is_empty() {
            return Err(RequestError::EmptyCode);
        }
        Ok(Self {
            store_url: parse_http_url("store_url", store_url)?,
            code: code.to_string(),
            product_url: parse_http_url("product_url", product_url)?,
            storefront: storefront
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
        })
    }

    #[must_use]
    pub fn store_url(&self) -> &Url {
        &self.store_url
    }

    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }

    #[must_use]
    pub fn product_url(&self) -> &Url {
        &self.product_url
    }

    #[must_use]
    pub fn storefront(&self) -> Option<&str> {
        self.storefront.as_deref()
    }
}

fn parse_http_url(field: &'static str, raw: &str) -> Result<Url, RequestError> {
    let invalid = |reason: String| RequestError::InvalidUrl {
        field,
        value: raw.to_string(),
        reason,
    };
    let url = Url::parse(raw.trim()).map_err(|e| invalid(e.to_string()))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(invalid(format!("unsupported scheme '{other}'"))),
    }
}

/// Text scraped from a price or total node, or `N/A` when the node is absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PriceReading {
    Shown(String),
    Missing,
}

impl PriceReading {
    /// Builds a reading from an optional node text; the text is trimmed.
    #[must_use]
    pub fn from_text(text: Option<String>) -> Self {
        match text {
            Some(t) => Self::Shown(t.trim().to_string()),
            None => Self::Missing,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Shown(text) => text,
            Self::Missing => MISSING,
        }
    }
}

impl std::fmt::Display for PriceReading {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for PriceReading {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Verdict {
    Pass,
    Fail,
    Error,
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Verdict::Pass => write!(f, "PASS"),
            Verdict::Fail => write!(f, "FAIL"),
            Verdict::Error => write!(f, "ERROR"),
        }
    }
}

/// Decides whether the code took effect.
///
/// The totals are compared as strings, so any change in the rendered text
/// counts as a discount.
#[must_use]
pub fn compute_verdict(
    original: &PriceReading,
    final_total: &PriceReading,
    error_text: &str,
) -> Verdict {
    let discount_applied = original.as_str() != final_total.as_str()
        && final_total.as_str() != MISSING
        && error_text.is_empty();
    if discount_applied {
        Verdict::Pass
    } else {
        Verdict::Fail
    }
}

/// The single, final answer for one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    code: String,
    valid: Verdict,
    #[serde(skip_serializing_if = "Option::is_none")]
    original_price: Option<PriceReading>,
    #[serde(skip_serializing_if = "Option::is_none")]
    final_price: Option<PriceReading>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<String>,
    timestamp: DateTime<Utc>,
}

impl ValidationResult {
    /// PASS or FAIL, derived from the two readings and the scraped error text.
    #[must_use]
    pub fn checked(
        code: impl Into<String>,
        original: PriceReading,
        final_total: PriceReading,
        error_text: &str,
    ) -> Self {
        let valid = compute_verdict(&original, &final_total, error_text);
        let error_message = if error_text.is_empty() {
            NO_ERROR_TEXT.to_string()
        } else {
            error_text.to_string()
        };
        Self {
            code: code.into(),
            valid,
            original_price: Some(original),
            final_price: Some(final_total),
            error_message: Some(error_message),
            reason: None,
            timestamp: Utc::now(),
        }
    }

    /// ERROR for a missing promo input, keeping the price already read.
    #[must_use]
    pub fn promo_input_missing(code: impl Into<String>, original: PriceReading) -> Self {
        Self {
            code: code.into(),
            valid: Verdict::Error,
            original_price: Some(original),
            final_price: Some(PriceReading::Missing),
            error_message: None,
            reason: Some(PROMO_INPUT_NOT_FOUND.to_string()),
            timestamp: Utc::now(),
        }
    }

    /// ERROR for anything that stopped the run.
    #[must_use]
    pub fn failed(code: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            valid: Verdict::Error,
            original_price: None,
            final_price: None,
            error_message: None,
            reason: Some(reason.into()),
            timestamp: Utc::now(),
        }
    }

    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }

    #[must_use]
    pub fn valid(&self) -> Verdict {
        self.valid
    }

    #[must_use]
    pub fn original_price(&self) -> Option<&PriceReading> {
        self.original_price.as_ref()
    }

    #[must_use]
    pub fn final_price(&self) -> Option<&PriceReading> {
        self.final_price.as_ref()
    }

    /// Scraped error text; `"None"` when the page showed none.
    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    #[must_use]
    pub fn reason(&self) -> Option<&str> {
        self.reason.as_deref()
    }
}
