//! The ordered steps of one validation run and the policy that drives them.

use promocheck_core::{PriceReading, StorefrontProfile, ValidationRequest, ValidationResult};

use crate::error::BrowserError;
use crate::session::BrowserSession;

const ENTER: &str = "Enter";

/// What a single step produced.
#[derive(Debug)]
pub(crate) enum StepOutcome<T> {
    Completed(T),
    /// An expected gap on the page (usually a missing element).
    SoftFail(String),
    Fatal(BrowserError),
}

impl<T> From<Result<T, BrowserError>> for StepOutcome<T> {
    fn from(result: Result<T, BrowserError>) -> Self {
        match result {
            Ok(value) => Self::Completed(value),
            Err(e) => Self::Fatal(e),
        }
    }
}

impl<T> StepOutcome<T> {
    /// For steps with no soft-failure policy: anything short of completion
    /// ends the run.
    fn required(self, step: &'static str) -> Result<T, BrowserError> {
        match self {
            Self::Completed(value) => Ok(value),
            Self::SoftFail(reason) => Err(BrowserError::StepFailed { step, reason }),
            Self::Fatal(e) => Err(e),
        }
    }
}

/// Runs every step against `session` and builds the result.
///
/// The caller owns the session and closes it afterwards; this function never
/// closes it. An `Err` means a fatal step failure.
pub(crate) async fn drive(
    session: &mut dyn BrowserSession,
    profile: &StorefrontProfile,
    request: &ValidationRequest,
) -> Result<ValidationResult, BrowserError> {
    let selectors = &profile.selectors;
    let settle = &profile.settle;

    let original = load_product_price(session, request, &selectors.price)
        .await
        .required("product page load")?;
    tracing::info!(original_price = %original, "validate: product page loaded");

    match add_to_cart(session, &selectors.add_to_cart).await {
        StepOutcome::Completed(()) => {
            tracing::info!("validate: added to cart");
            tokio::time::sleep(settle.after_add_to_cart()).await;
        }
        StepOutcome::SoftFail(reason) => {
            tracing::info!(reason = %reason, "validate: add-to-cart skipped");
        }
        StepOutcome::Fatal(e) => return Err(e),
    }

    match open_cart(session, profile, request).await {
        StepOutcome::Completed(()) => tracing::info!("validate: cart page loaded"),
        StepOutcome::SoftFail(reason) => {
            tracing::warn!(reason = %reason, "validate: cart navigation failed; continuing");
        }
        StepOutcome::Fatal(e) => return Err(e),
    }

    match enter_promo_code(session, &selectors.promo_input, request.code()).await {
        StepOutcome::Completed(()) => {
            tracing::info!("validate: promo code entered");
            tokio::time::sleep(settle.after_type()).await;
        }
        StepOutcome::SoftFail(reason) => {
            tracing::info!(reason = %reason, "validate: stopping early");
            return Ok(ValidationResult::promo_input_missing(
                request.code(),
                original,
            ));
        }
        StepOutcome::Fatal(e) => return Err(e),
    }

    match click_apply(session, &selectors.apply_button).await {
        StepOutcome::Completed(()) => tracing::info!("validate: apply clicked"),
        StepOutcome::SoftFail(reason) => {
            tracing::info!(reason = %reason, "validate: apply button missing; pressing Enter");
            press_enter(session).await.required("enter fallback")?;
        }
        StepOutcome::Fatal(e) => return Err(e),
    }
    tokio::time::sleep(settle.after_apply()).await;

    let (final_total, error_text) = read_totals(session, &selectors.total, &selectors.error)
        .await
        .required("result extraction")?;

    let result = ValidationResult::checked(request.code(), original, final_total, &error_text);
    tracing::info!(
        verdict = %result.valid(),
        final_price = %result.final_price().map_or("N/A", PriceReading::as_str),
        "validate: finished"
    );
    Ok(result)
}

/// Reads the trimmed text of `selector`, or `N/A` when nothing matches.
///
/// Purely a read: calling it twice without interaction gives the same value.
pub async fn read_price(
    session: &mut dyn BrowserSession,
    selector: &str,
) -> Result<PriceReading, BrowserError> {
    Ok(PriceReading::from_text(session.text_content(selector).await?))
}

async fn load_product_price(
    session: &mut dyn BrowserSession,
    request: &ValidationRequest,
    price_selector: &str,
) -> StepOutcome<PriceReading> {
    if let Err(e) = session.navigate(request.product_url()).await {
        return StepOutcome::Fatal(e);
    }
    read_price(session, price_selector).await.into()
}

async fn add_to_cart(session: &mut dyn BrowserSession, selector: &str) -> StepOutcome<()> {
    match session.click(selector).await {
        Ok(()) => StepOutcome::Completed(()),
        Err(e) => StepOutcome::SoftFail(e.to_string()),
    }
}

async fn open_cart(
    session: &mut dyn BrowserSession,
    profile: &StorefrontProfile,
    request: &ValidationRequest,
) -> StepOutcome<()> {
    let cart_url = match profile.cart_url(request.store_url()) {
        Ok(url) => url,
        Err(source) => {
            return StepOutcome::Fatal(BrowserError::CartUrl {
                store_url: request.store_url().to_string(),
                source,
            });
        }
    };
    match session.navigate(&cart_url).await {
        Ok(()) => StepOutcome::Completed(()),
        Err(e) => StepOutcome::SoftFail(e.to_string()),
    }
}

/// A failed lookup counts as an absent input.
async fn enter_promo_code(
    session: &mut dyn BrowserSession,
    selector: &str,
    code: &str,
) -> StepOutcome<()> {
    match session.element_exists(selector).await {
        Ok(true) => session.type_text(selector, code).await.into(),
        Ok(false) => StepOutcome::SoftFail(format!("promo input {selector} not present")),
        Err(e) => StepOutcome::SoftFail(e.to_string()),
    }
}

/// A failed lookup counts as an absent button.
async fn click_apply(session: &mut dyn BrowserSession, selector: &str) -> StepOutcome<()> {
    match session.element_exists(selector).await {
        Ok(true) => session.click(selector).await.into(),
        Ok(false) => StepOutcome::SoftFail(format!("apply button {selector} not present")),
        Err(e) => StepOutcome::SoftFail(e.to_string()),
    }
}

async fn press_enter(session: &mut dyn BrowserSession) -> StepOutcome<()> {
    session.press_key(ENTER).await.into()
}

async fn read_totals(
    session: &mut dyn BrowserSession,
    total_selector: &str,
    error_selector: &str,
) -> StepOutcome<(PriceReading, String)> {
    let total = match read_price(session, total_selector).await {
        Ok(total) => total,
        Err(e) => return StepOutcome::Fatal(e),
    };
    session
        .text_content(error_selector)
        .await
        .map(|text| (total, text.unwrap_or_default()))
        .into()
}
