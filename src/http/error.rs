use crate::notifier::Error as NotifierError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use base64::DecodeError;
use hex::FromHexError;
use ring::error::Unspecified;
use serde_json::{error::Error as SerdeError, json};
use std::error::Error as StdError;
use tracing::error;

pub(crate) type Result<T> = std::result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
    Unauthorized,
    InvalidJson,
    Notification(NotifierError),
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Error::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized"),
            Error::InvalidJson => (StatusCode::BAD_REQUEST, "invalid JSON"),
            Error::Notification(e) => {
                error!(error = %e, source = ?e.source(), "failed to dispatch notification");
                (StatusCode::BAD_GATEWAY, "failed to deliver notification")
            }
        };

        let body = Json(json!({ "message": message }));
        (status, body).into_response()
    }
}

impl From<SerdeError> for Error {
    fn from(_: SerdeError) -> Self {
        Error::InvalidJson
    }
}

impl From<NotifierError> for Error {
    fn from(e: NotifierError) -> Self {
        Error::Notification(e)
    }
}

impl From<FromHexError> for Error {
    fn from(_: FromHexError) -> Self {
        Error::Unauthorized
    }
}

impl From<DecodeError> for Error {
    fn from(_: DecodeError) -> Self {
        Error::Unauthorized
    }
}

impl From<Unspecified> for Error {
    fn from(_: Unspecified) -> Self {
        Error::Unauthorized
    }
}
