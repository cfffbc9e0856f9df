use crate::api::dto::VerifyRequest;
use crate::api::state::AppState;
use crate::errors::error::AppError;
use crate::services::facilitator_service::{SupportedKinds, VerifyResult};
use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;

pub async fn supported(State(state): State<AppState>) -> Json<SupportedKinds> {
    Json(state.facilitator.supported())
}

pub async fn verify(
    State(state): State<AppState>,
    body: Result<Json<VerifyRequest>, JsonRejection>,
) -> Result<Json<VerifyResult>, AppError> {
    let Json(req) = body?;
    let (payload, requirements) = match (req.payment_payload, req.payment_requirements) {
        (Some(p), Some(r)) if !p.is_null() && !r.is_null() => (p, r),
        _ => {
            return Err(AppError::Validation(
                "Missing paymentPayload or paymentRequirements".into(),
            ));
        }
    };
    Ok(Json(state.facilitator.verify(&payload, &requirements)))
}
