//! Extractor for the inbound callback body.
//!
//! The gateway may post the notification either as JSON or as an
//! `application/x-www-form-urlencoded` form. Both carry the same snake_case
//! keys and end up as a [`CallbackRequest`].

use axum::{
    Form, Json,
    extract::{
        FromRequest, Request,
        rejection::{FormRejection, JsonRejection},
    },
    http::header::CONTENT_TYPE,
    response::{IntoResponse, Response},
};
use pgcb_sdk::objects::CallbackRequest;

use super::bad_request;

pub struct CallbackPayload(pub CallbackRequest);

#[derive(Debug, thiserror::Error)]
pub enum CallbackPayloadError {
    #[error("unsupported content type")]
    UnsupportedContentType,
    #[error("invalid form body: {0}")]
    Form(#[from] FormRejection),
    #[error("invalid JSON body: {0}")]
    Json(#[from] JsonRejection),
}

impl IntoResponse for CallbackPayloadError {
    fn into_response(self) -> Response {
        tracing::debug!(error = %self, "Unreadable callback body");
        bad_request(format!("Bad Request - {self}"))
    }
}

impl<S: Send + Sync> FromRequest<S> for CallbackPayload {
    type Rejection = CallbackPayloadError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();

        if content_type.starts_with("application/x-www-form-urlencoded") {
            let Form(request) = Form::<CallbackRequest>::from_request(req, state).await?;
            Ok(Self(request))
        } else if content_type.starts_with("application/json") {
            let Json(request) = Json::<CallbackRequest>::from_request(req, state).await?;
            Ok(Self(request))
        } else {
            Err(CallbackPayloadError::UnsupportedContentType)
        }
    }
}
