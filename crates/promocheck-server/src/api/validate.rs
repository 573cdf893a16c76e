use axum::{
    extract::{rejection::JsonRejection, State},
    Extension, Json,
};
use promocheck_core::{ValidationRequest, ValidationResult};
use serde::Deserialize;

use super::AppState;
use crate::middleware::RequestId;

#[derive(Debug, Deserialize)]
pub(super) struct ValidateCodeBody {
    store_url: String,
    code: String,
    product_url: String,
    #[serde(default)]
    storefront: Option<String>,
}

/// `POST /validate-code`. Every outcome, including a bad body, is a 200 with
/// the verdict in the payload.
pub(super) async fn validate_code(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    body: Result<Json<ValidateCodeBody>, JsonRejection>,
) -> Json<ValidationResult> {
    let body = match body {
        Ok(Json(body)) => body,
        Err(rejection) => {
            let reason = rejection.body_text();
            tracing::warn!(
                request_id = %req_id.0,
                reason = %reason,
                "rejected validate-code body"
            );
            return Json(ValidationResult::failed("", reason));
        }
    };

    let request = match ValidationRequest::parse(
        &body.store_url,
        &body.code,
        &body.product_url,
        body.storefront.as_deref(),
    ) {
        Ok(request) => request,
        Err(e) => {
            tracing::warn!(
                request_id = %req_id.0,
                code = %body.code,
                error = %e,
                "invalid validate-code request"
            );
            return Json(ValidationResult::failed(body.code, e.to_string()));
        }
    };

    tracing::info!(request_id = %req_id.0, code = request.code(), "validate-code request accepted");
    let result = state.workflow.validate(&request).await;
    tracing::info!(
        request_id = %req_id.0,
        code = result.code(),
        verdict = %result.valid(),
        "validate-code request finished"
    );
    Json(result)
}
