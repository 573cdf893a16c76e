//! Promo-code validation: one browser session per request, run to completion.

mod steps;

pub use steps::read_price;

use std::sync::Arc;

use promocheck_core::{StorefrontCatalog, StorefrontProfile, ValidationRequest, ValidationResult};

use crate::session::SessionLauncher;

/// Entry point shared by the HTTP server and the CLI.
///
/// Cloning is cheap; clones share the launcher and the storefront catalog.
#[derive(Clone)]
pub struct Workflow {
    launcher: Arc<dyn SessionLauncher>,
    storefronts: Arc<StorefrontCatalog>,
}

impl Workflow {
    #[must_use]
    pub fn new(launcher: Arc<dyn SessionLauncher>, storefronts: Arc<StorefrontCatalog>) -> Self {
        Self {
            launcher,
            storefronts,
        }
    }

    #[must_use]
    pub fn storefronts(&self) -> &StorefrontCatalog {
        &self.storefronts
    }

    /// Runs the full workflow for `request`.
    ///
    /// Never fails: every error becomes an `ERROR` result. A launched session
    /// is closed exactly once before this returns.
    pub async fn validate(&self, request: &ValidationRequest) -> ValidationResult {
        let Some(profile) = self.storefronts.resolve(request.storefront()) else {
            let name = request
                .storefront()
                .unwrap_or_else(|| self.storefronts.default_name());
            tracing::warn!(
                code = request.code(),
                storefront = name,
                "validate: unknown storefront"
            );
            return ValidationResult::failed(
                request.code(),
                format!("unknown storefront profile: {name}"),
            );
        };

        self.run(request, profile).await
    }

    #[tracing::instrument(
        name = "validate_code",
        skip_all,
        fields(code = %request.code(), storefront = %profile.name)
    )]
    async fn run(
        &self,
        request: &ValidationRequest,
        profile: &StorefrontProfile,
    ) -> ValidationResult {
        tracing::info!(product_url = %request.product_url(), "validate: launching browser");
        let mut session = match self.launcher.launch().await {
            Ok(session) => session,
            Err(e) => {
                tracing::error!(error = %e, "validate: browser launch failed");
                return ValidationResult::failed(request.code(), e.to_string());
            }
        };

        let outcome = steps::drive(session.as_mut(), profile, request).await;

        if let Err(e) = session.close().await {
            tracing::warn!(error = %e, "validate: closing browser failed");
        }

        match outcome {
            Ok(result) => result,
            Err(e) => {
                tracing::error!(error = %e, "validate: aborted");
                ValidationResult::failed(request.code(), e.to_string())
            }
        }
    }
}

impl std::fmt::Debug for Workflow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Workflow")
            .field("storefronts", &self.storefronts)
            .finish_non_exhaustive()
    }
}
