//! `validate` command: one workflow run against a real Chrome.

use std::process::ExitCode;
use std::sync::Arc;

use promocheck_browser::{ChromiumLauncher, Workflow};
use promocheck_core::{AppConfig, StorefrontCatalog, ValidationRequest, ValidationResult, Verdict};

#[derive(Debug)]
pub(crate) struct ValidateArgs {
    pub store_url: String,
    pub product_url: String,
    pub code: String,
    pub storefront: Option<String>,
}

pub(crate) async fn run_validate(
    config: &AppConfig,
    storefronts: StorefrontCatalog,
    args: &ValidateArgs,
) -> anyhow::Result<ExitCode> {
    let result = match ValidationRequest::parse(
        &args.store_url,
        &args.code,
        &args.product_url,
        args.storefront.as_deref(),
    ) {
        Ok(request) => {
            tracing::info!(code = request.code(), "validate: starting single run");
            let launcher = ChromiumLauncher::new(config.browser.clone());
            let workflow = Workflow::new(Arc::new(launcher), Arc::new(storefronts));
            workflow.validate(&request).await
        }
        Err(e) => ValidationResult::failed(args.code.clone(), e.to_string()),
    };

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(exit_code(result.valid()))
}

/// 0 for PASS, 1 for FAIL, 2 for ERROR.
pub(crate) fn exit_code(verdict: Verdict) -> ExitCode {
    ExitCode::from(exit_status(verdict))
}

pub(crate) fn exit_status(verdict: Verdict) -> u8 {
    match verdict {
        Verdict::Pass => 0,
        Verdict::Fail => 1,
        Verdict::Error => 2,
    }
}
