//! A small framework for authenticated JSON API clients built on `hyperdriver`.

use std::marker::PhantomData;
use std::sync::Arc;

use http::Method;
use http::Uri;
use hyperdriver::service::SharedService;
use tower::ServiceExt;

mod authentication;
pub mod error;
pub mod mock;
mod paginate;
pub mod request;
pub mod response;
mod retry;
pub mod secret;
pub mod uri;

pub use self::authentication::{
    Authentication, AuthenticationLayer, AuthenticationService, BearerAuth,
};
pub use self::error::{Error, HttpResponseError};
pub use self::paginate::{
    LinkPaginated, Links, Paginated, PaginationError, PaginationInfo, Paginator,
};
pub use self::request::RequestBuilder;
pub use self::response::ApiResponse;
pub use self::retry::{Backoff, BackoffFuture};
pub use self::secret::{MissingSecret, Secret};
use self::uri::UriExtension as _;

/// A client for accessing APIs over HTTP / HTTPS
///
/// Useful inner object to wrap for individual API clients.
#[derive(Debug, Clone)]
pub struct ApiClient<A> {
    base: Uri,
    inner: hyperdriver::client::SharedClientService<hyperdriver::Body, hyperdriver::Body>,
    authentication: PhantomData<A>,
}

impl<A> ApiClient<A>
where
    A: Authentication + Send + Sync + 'static,
{
    /// Create a new API client which sends requests through `inner`,
    /// authenticating each one with `authentication`.
    pub fn new_with_inner_service<S>(base: Uri, authentication: A, inner: S) -> Self
    where
        S: tower::Service<
                http::Request<hyperdriver::Body>,
                Response = http::Response<hyperdriver::Body>,
                Error = hyperdriver::client::Error,
            > + Clone
            + Send
            + Sync
            + 'static,
        S::Future: Send + 'static,
    {
        let authentication = Arc::new(authentication);

        let service = tower::ServiceBuilder::new()
            .layer(SharedService::layer())
            .layer(AuthenticationLayer::new(authentication.clone()))
            .service(inner);

        ApiClient {
            base,
            inner: service,
            authentication: PhantomData,
        }
    }
}

impl<A> ApiClient<A>
where
    A: Authentication,
{
    /// Build a GET request for an endpoint relative to the base URI.
    ///
    /// Fails when `endpoint` does not form a valid URI path.
    pub fn get(&self, endpoint: &str) -> Result<RequestBuilder<A>, Error> {
        let url = self.base.clone().join(endpoint)?;
        Ok(RequestBuilder::new(self.clone(), url, Method::GET))
    }

    /// Send a fully built request.
    pub async fn execute(
        &self,
        req: http::Request<hyperdriver::Body>,
    ) -> Result<ApiResponse, hyperdriver::client::Error> {
        let response = self.inner.clone().oneshot(req).await?;
        Ok(ApiResponse::new(response))
    }
}

#[cfg(test)]
mod test {

    use super::*;

    fn client(mock: mock::MockService) -> ApiClient<BearerAuth> {
        ApiClient::new_with_inner_service(
            "http://api.github.test/".parse().unwrap(),
            BearerAuth::new(Secret::from("secret garden")),
            mock,
        )
    }

    #[test]
    fn extensions_produce_send_futures() {
        let client = client(mock::MockService::new());
        let builder = client.get("frobulator").unwrap();

        fn assert_send<T: Send>(_t: T) {}

        let fut = builder.send();
        assert_send(fut);
    }

    #[tokio::test]
    async fn mock_client_works() {
        let mock = mock::MockService::new();
        mock.add("/zen", http::StatusCode::OK, http::HeaderMap::new(), "frobulator");

        let client = client(mock.clone());

        let response = client.get("zen").unwrap().send().await.unwrap();
        assert_eq!(response.status(), http::StatusCode::OK);
        assert_eq!(response.text().await.unwrap(), "frobulator");

        let seen = mock.requests();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].path, "/zen");
        assert_eq!(seen[0].authorization.as_deref(), Some("Bearer secret garden"));
    }

    #[tokio::test]
    async fn query_parameters_are_routed() {
        let mock = mock::MockService::new();
        mock.json("/orgs/acme/repos?per_page=10", &serde_json::json!([]));

        let client = client(mock.clone());
        let response = client
            .get("orgs/acme/repos")
            .unwrap()
            .query("per_page", 10)
            .send()
            .await
            .unwrap();
        assert!(response.status().is_success());
    }

    #[test]
    fn invalid_endpoint_is_an_error() {
        let client = client(mock::MockService::new());
        let err = client.get("orgs/acme corp/repos").unwrap_err();
        assert!(matches!(err, Error::Build(_)));
    }

    #[tokio::test]
    async fn error_for_status_keeps_body() {
        let mock = mock::MockService::new();
        mock.add(
            "/missing",
            http::StatusCode::NOT_FOUND,
            http::HeaderMap::new(),
            "Not Found",
        );

        let client = client(mock);
        let err = client
            .get("missing")
            .unwrap()
            .send()
            .await
            .unwrap()
            .error_for_status()
            .await
            .unwrap_err();
        assert_eq!(err.status, http::StatusCode::NOT_FOUND);
        assert_eq!(err.message, "Not Found");
    }
}
