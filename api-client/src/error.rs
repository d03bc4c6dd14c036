//! Error types for API Clients
use std::fmt;

use http::StatusCode;
use thiserror::Error;

use crate::response::ApiResponse;

pub(crate) type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// An error occured while sending or recieving an HTTP request
#[derive(Debug, Error)]
pub enum Error {
    /// The server answered with a non-success status
    #[error(transparent)]
    Response(#[from] HttpResponseError),

    /// An error occured while recieving or decoding the response body
    #[error("Error reading response body: {0}")]
    ResponseBody(#[source] BoxError),

    /// An error occured while sending the request
    #[error(transparent)]
    Request(#[from] hyperdriver::client::Error),

    /// The request could not be assembled
    #[error("Invalid request: {0}")]
    Build(#[from] http::Error),
}

impl Error {
    /// The HTTP status returned by the server, if the request got that far.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Error::Response(response) => Some(response.status),
            _ => None,
        }
    }
}

/// A server returned an error response
#[derive(Debug, Clone)]
pub struct HttpResponseError {
    /// The HTTP status code of the response
    pub status: StatusCode,

    /// The message body of the response
    pub message: String,
}

impl HttpResponseError {
    /// Create a new HTTP response error from a response
    pub async fn from_response(response: ApiResponse) -> Self {
        let status = response.status();
        let message = response
            .text()
            .await
            .unwrap_or_else(|err| format!("Failed to read response body: {}", err));

        Self { status, message }
    }
}

impl fmt::Display for HttpResponseError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "HTTP {} response: {}", self.status, self.message)
    }
}

impl std::error::Error for HttpResponseError {}
