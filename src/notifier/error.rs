use reqwest::Error as ReqwestError;
use thiserror::Error as ThisError;

pub type Result<T> = std::result::Result<T, Error>;

/// Possible errors that can arise when sending a notification
#[derive(Debug, ThisError)]
pub enum Error {
    // initialization errors
    #[error("failed to build the HTTP client")]
    Builder(#[source] ReqwestError),

    // runtime errors
    #[error("failed to serialize request body")]
    Serialize(#[source] ReqwestError),
    #[error("unexpected status code {code}")]
    Status { code: u16, source: ReqwestError },
    #[error("request timed out")]
    Timeout(#[source] ReqwestError),
    #[error("could not connect to the notification endpoint")]
    Connect(#[source] ReqwestError),
    #[error("an unknown error occurred while sending the request")]
    Unknown(#[source] ReqwestError),
}

impl From<ReqwestError> for Error {
    fn from(error: ReqwestError) -> Error {
        if error.is_timeout() {
            Error::Timeout(error)
        } else if error.is_status() {
            Error::Status {
                code: error.status().unwrap_or_default().as_u16(),
                source: error,
            }
        } else if error.is_connect() {
            Error::Connect(error)
        } else if error.is_builder() {
            Error::Builder(error)
        } else if error.is_body() {
            Error::Serialize(error)
        } else {
            Error::Unknown(error)
        }
    }
}
