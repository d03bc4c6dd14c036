//! Authentication for API clients.
//!
//! The [`Authentication`] trait decorates every request sent through an
//! [`ApiClient`](crate::ApiClient). [`BearerAuth`] covers OAuth2-style token
//! credentials, which is all the GitHub REST API needs.

use std::sync::Arc;

use http::HeaderValue;
use tower::layer::Layer;

use crate::secret::Secret;

/// Trait to represent authenticating with an API.
pub trait Authentication: Clone {
    /// Called by the `ApiClient` to implement authorization.
    fn authenticate<B>(&self, req: http::Request<B>) -> http::Request<B>;
}

/// Authentication with a bearer token, often used with an API key.
///
/// The token is stored as a [Secret] to prevent it from being logged.
///
/// # Example
/// ```rust
/// use api_client::BearerAuth;
///
/// let auth = BearerAuth::new("my-secret");
/// let header = auth.header_value();
///
/// assert_eq!(header.to_str().unwrap(), "Bearer my-secret");
/// ```
#[derive(Debug, Clone)]
pub struct BearerAuth(Secret);

impl BearerAuth {
    /// Create a new Bearer authentication with a given token.
    pub fn new<K: Into<Secret>>(token: K) -> Self {
        BearerAuth(token.into())
    }

    /// Get the header value for the Bearer token.
    pub fn header_value(&self) -> HeaderValue {
        self.0
            .bearer()
            .expect("bearer token is a valid HTTP header value")
    }
}

impl Authentication for BearerAuth {
    fn authenticate<B>(&self, mut req: http::Request<B>) -> http::Request<B> {
        if !req.headers().contains_key(http::header::AUTHORIZATION) {
            req.headers_mut()
                .append(http::header::AUTHORIZATION, self.header_value());
        } else {
            tracing::warn!("{} header already set", http::header::AUTHORIZATION);
        }
        req
    }
}

/// A layer which applies an [`Authentication`] to every request.
#[derive(Debug)]
pub struct AuthenticationLayer<A> {
    auth: Arc<A>,
}

impl<A> Clone for AuthenticationLayer<A> {
    fn clone(&self) -> Self {
        Self {
            auth: self.auth.clone(),
        }
    }
}

impl<A> AuthenticationLayer<A> {
    pub(crate) fn new(auth: Arc<A>) -> Self {
        Self { auth }
    }
}

impl<A, S> Layer<S> for AuthenticationLayer<A> {
    type Service = AuthenticationService<A, S>;

    fn layer(&self, inner: S) -> Self::Service {
        AuthenticationService {
            inner,
            auth: self.auth.clone(),
        }
    }
}

/// Service produced by [`AuthenticationLayer`].
#[derive(Debug)]
pub struct AuthenticationService<A, S> {
    inner: S,
    auth: Arc<A>,
}

impl<A, S: Clone> Clone for AuthenticationService<A, S> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            auth: self.auth.clone(),
        }
    }
}

impl<A, S, BIn, BOut> tower::Service<http::Request<BIn>> for AuthenticationService<A, S>
where
    A: Authentication,
    S: tower::Service<http::Request<BIn>, Response = http::Response<BOut>>,
    S::Future: Send + 'static,
{
    type Response = http::Response<BOut>;
    type Error = S::Error;
    type Future = S::Future;

    fn poll_ready(
        &mut self,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: http::Request<BIn>) -> Self::Future {
        let req = self.auth.authenticate(req);
        self.inner.call(req)
    }
}
