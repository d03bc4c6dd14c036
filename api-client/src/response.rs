//! Responses returned by an [`ApiClient`](crate::ApiClient).

use bytes::Bytes;
use http_body_util::BodyExt as _;
use hyperdriver::Body;

use crate::error::{BoxError, HttpResponseError};

/// Wrapper around an HTTP response with helpers for collecting the body.
#[derive(Debug)]
pub struct ApiResponse {
    response: http::response::Parts,
    body: Body,
}

impl ApiResponse {
    /// Create a new `ApiResponse` instance.
    pub fn new(response: http::Response<Body>) -> Self {
        let (response, body) = response.into_parts();
        Self { response, body }
    }

    /// Get the status code of the response.
    pub fn status(&self) -> http::StatusCode {
        self.response.status
    }

    /// Get the headers of the response.
    pub fn headers(&self) -> &http::HeaderMap {
        &self.response.headers
    }

    /// Collect the response body.
    pub async fn bytes(self) -> Result<Bytes, BoxError> {
        let collected = self.body.collect().await.map_err(Into::<BoxError>::into)?;
        Ok(collected.to_bytes())
    }

    /// Collect the response body as UTF-8 text.
    pub async fn text(self) -> Result<String, BoxError> {
        let bytes = self.bytes().await?;
        Ok(String::from_utf8(bytes.to_vec())?)
    }

    /// Collect the body and deserialize it as JSON.
    pub async fn json<T>(self) -> Result<T, BoxError>
    where
        T: serde::de::DeserializeOwned,
    {
        let bytes = self.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Convert the response into an [`HttpResponseError`] when the status is not a success.
    pub async fn error_for_status(self) -> Result<Self, HttpResponseError> {
        if self.status().is_success() {
            Ok(self)
        } else {
            Err(HttpResponseError::from_response(self).await)
        }
    }
}
