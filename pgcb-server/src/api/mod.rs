//! Gateway-facing API.
//!
//! # Endpoints
//!
//! - `POST /callback` – payment outcome notification from the gateway,
//!   as JSON or as a urlencoded form

use axum::{
    Json, Router,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
};
use pgcb_core::callback::CallbackError;
use pgcb_sdk::objects::ErrorBody;

use crate::state::AppState;

mod callback;
mod extractors;

/// Build the gateway API router.
pub fn router() -> Router<AppState> {
    Router::new().route("/callback", post(callback::handle_callback))
}

// ---------------------------------------------------------------------------
// Error handling
// ---------------------------------------------------------------------------

/// A rejected callback as seen by the gateway: 400 and a single message.
#[derive(Debug)]
pub(crate) struct CallbackApiError(CallbackError);

impl From<CallbackError> for CallbackApiError {
    fn from(err: CallbackError) -> Self {
        Self(err)
    }
}

impl IntoResponse for CallbackApiError {
    fn into_response(self) -> Response {
        bad_request(self.0.external_message())
    }
}

fn bad_request(message: String) -> Response {
    let status =
        StatusCode::from_u16(CallbackError::STATUS_CODE).unwrap_or(StatusCode::BAD_REQUEST);
    (status, Json(ErrorBody { message })).into_response()
}
