//! An in-memory transport for exercising API clients without a network.
//!
//! Routes are matched on the request path and query (`/orgs/acme/repos?page=2`),
//! falling back to the bare path. Every request is recorded so tests can
//! assert on what was, and was not, sent.

use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;
use parking_lot::Mutex;

#[derive(Debug, Clone)]
struct MockResponse {
    status: http::StatusCode,
    headers: http::HeaderMap,
    body: Bytes,
}

/// A request observed by the [`MockService`].
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    /// Request method.
    pub method: http::Method,
    /// Request path, without the query.
    pub path: String,
    /// Request path and query.
    pub path_and_query: String,
    /// The `Authorization` header, if one was sent.
    pub authorization: Option<String>,
}

/// A [`tower::Service`] which answers requests from a table of canned responses.
///
/// Clones share the same routes and request log.
#[derive(Debug, Default, Clone)]
pub struct MockService {
    responses: Arc<Mutex<HashMap<String, MockResponse>>>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockService {
    /// Create an empty mock, which panics on any request.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a response for a path (optionally including a query).
    pub fn add<B: Into<Bytes>>(
        &self,
        path: &str,
        status: http::StatusCode,
        headers: http::HeaderMap,
        body: B,
    ) {
        let response = MockResponse {
            status,
            headers,
            body: body.into(),
        };
        self.responses.lock().insert(path.to_owned(), response);
    }

    /// Register a `200 OK` JSON response.
    pub fn json<T: serde::Serialize>(&self, path: &str, value: &T) {
        self.json_with_headers(path, http::HeaderMap::new(), value);
    }

    /// Register a `200 OK` JSON response with extra headers, such as `Link`.
    pub fn json_with_headers<T: serde::Serialize>(
        &self,
        path: &str,
        mut headers: http::HeaderMap,
        value: &T,
    ) {
        headers.insert(
            http::header::CONTENT_TYPE,
            http::HeaderValue::from_static("application/json"),
        );
        let body = serde_json::to_vec(value).expect("mock body serializes");
        self.add(path, http::StatusCode::OK, headers, body);
    }

    /// Every request received so far, in order.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().clone()
    }
}

impl tower::Service<http::Request<hyperdriver::Body>> for MockService {
    type Response = http::Response<hyperdriver::Body>;
    type Error = hyperdriver::client::Error;
    type Future = std::future::Ready<Result<Self::Response, Self::Error>>;

    fn poll_ready(
        &mut self,
        _cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        std::task::Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: http::Request<hyperdriver::Body>) -> Self::Future {
        let path = req.uri().path().to_owned();
        let path_and_query = req
            .uri()
            .path_and_query()
            .map(|pq| pq.as_str().to_owned())
            .unwrap_or_else(|| path.clone());

        self.requests.lock().push(RecordedRequest {
            method: req.method().clone(),
            path: path.clone(),
            path_and_query: path_and_query.clone(),
            authorization: req
                .headers()
                .get(http::header::AUTHORIZATION)
                .and_then(|value| value.to_str().ok())
                .map(str::to_owned),
        });

        let response = {
            let responses = self.responses.lock();
            responses
                .get(&path_and_query)
                .or_else(|| responses.get(&path))
                .cloned()
                .unwrap_or_else(|| panic!("No response configured for path: {path_and_query}"))
        };

        let mut builder = http::response::Builder::new()
            .status(response.status)
            .version(http::Version::HTTP_11);

        for (key, value) in response.headers.iter() {
            builder = builder.header(key, value);
        }

        let response = builder
            .body(hyperdriver::Body::from(response.body))
            .expect("mock response is valid");

        std::future::ready(Ok(response))
    }
}
