use std::fmt;

use http::Uri;

use crate::error::Error;
use crate::uri::UriExtension as _;
use crate::{response::ApiResponse, ApiClient, Authentication};

/// Builder for a single request against an [`ApiClient`].
#[derive(Debug)]
pub struct RequestBuilder<A> {
    req: http::request::Builder,
    client: ApiClient<A>,
}

impl<A> RequestBuilder<A> {
    /// Start a request with a method and an absolute URI.
    pub fn new(client: ApiClient<A>, uri: Uri, method: http::Method) -> Self {
        Self {
            req: http::Request::builder().method(method).uri(uri),
            client,
        }
    }

    /// Set a query parameter, replacing any existing value for `key`.
    pub fn query<V: fmt::Display>(mut self, key: &str, value: V) -> Self {
        if let Some(uri) = self.req.uri_ref().cloned() {
            self.req = self.req.uri(uri.replace_query(key, &value.to_string()));
        }
        self
    }

    /// Assemble the request, with an empty body, without sending it.
    pub fn build(self) -> Result<http::Request<hyperdriver::Body>, http::Error> {
        self.req.body(hyperdriver::Body::empty())
    }

    /// Send the request through the client.
    pub async fn send(self) -> Result<ApiResponse, Error>
    where
        A: Authentication,
    {
        let client = self.client.clone();
        let req = self.build()?;
        Ok(client.execute(req).await?)
    }
}

/// Copy a request, including its body when the body can be replayed.
pub(crate) fn try_clone_request(
    req: &http::Request<hyperdriver::Body>,
) -> Option<http::Request<hyperdriver::Body>> {
    let body = req.body().try_clone()?;

    let mut next = http::Request::builder()
        .method(req.method().clone())
        .uri(req.uri().clone())
        .version(req.version())
        .body(body)
        .ok()?;

    *next.extensions_mut() = req.extensions().clone();
    *next.headers_mut() = req.headers().clone();

    Some(next)
}
