use axum::{Json, extract::State};
use pgcb_sdk::objects::CallbackResult;

use super::CallbackApiError;
use super::extractors::CallbackPayload;
use crate::state::AppState;

/// `POST /callback`: apply a payment outcome reported by the gateway.
///
/// Responds 200 with a one-element list on success, including repeated
/// deliveries of an already applied completion, and 400 with a message
/// otherwise.
pub(super) async fn handle_callback(
    State(state): State<AppState>,
    CallbackPayload(request): CallbackPayload,
) -> Result<Json<CallbackResult>, CallbackApiError> {
    let result = state.callbacks.handle(request).await?;
    Ok(Json(result))
}
