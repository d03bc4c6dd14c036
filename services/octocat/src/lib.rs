//! Simple token-authenticated client for the Github REST API.

use api_client::{ApiClient, Backoff, BearerAuth, LinkPaginated, RequestBuilder, Secret};

use http::header;
use http::{HeaderName, HeaderValue, StatusCode, Uri};
use hyperdriver::client::conn::transport::tcp::TcpTransportConfig;
use hyperdriver::Client;
use thiserror::Error;
use tower_http::set_header::SetRequestHeaderLayer;

mod config;
pub mod models;

pub use crate::config::{ConfigError, GithubConfig, GITHUB_API_URL, GITHUB_TOKEN};
use crate::models::{Commit, Repository};

const CONNECT_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(30);
const TIMEOUT: std::time::Duration = std::time::Duration::from_secs(60);
const GITHUB_ACCEPT: &str = "application/vnd.github+json";
const GITHUB_API_VERSION: &str = "2022-11-28";
const GITHUB_API_VERSION_HEADER: &str = "x-github-api-version";
const GITHUB_BASE: &str = "https://api.github.com/";
const USER_AGENT: &str = concat!("octocat/", env!("CARGO_PKG_VERSION"));

/// Errors that can occur when using the Github client.
#[derive(Debug, Error)]
pub enum Error {
    /// An error that occurs when sending a request.
    #[error("Sending request: {0}")]
    Request(#[from] api_client::Error),

    /// A response not in the 200-299 range.
    #[error("Response: {0}")]
    Response(#[from] api_client::HttpResponseError),

    /// An error that occurs when receiving or decoding a response body.
    #[error("Receiving body: {0}")]
    Body(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
    /// The HTTP status Github answered with, if it answered at all.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Error::Response(response) => Some(response.status),
            Error::Request(error) => error.status(),
            Error::Body(_) => None,
        }
    }
}

/// A lazily paginated listing from the Github API.
pub type Paginated<T> = api_client::Paginated<BearerAuth, T, LinkPaginated<T>>;

/// A Github client which authenticates every request with a bearer token.
#[derive(Debug, Clone)]
pub struct GithubClient {
    client: ApiClient<BearerAuth>,
}

impl GithubClient {
    /// Create a client from configuration.
    ///
    /// Transient failures (timeouts, rate limits, server errors) are retried
    /// with exponential backoff.
    pub fn from_config(config: &GithubConfig) -> Self {
        let mut tcp = TcpTransportConfig::default();
        tcp.connect_timeout = Some(CONNECT_TIMEOUT);

        let client = Client::builder()
            .layer(SetRequestHeaderLayer::if_not_present(
                header::ACCEPT,
                HeaderValue::from_static(GITHUB_ACCEPT),
            ))
            .layer(SetRequestHeaderLayer::if_not_present(
                HeaderName::from_static(GITHUB_API_VERSION_HEADER),
                HeaderValue::from_static(GITHUB_API_VERSION),
            ))
            .with_tcp(tcp)
            .with_default_tls()
            .with_auto_http()
            .with_user_agent(USER_AGENT.to_owned())
            .with_timeout(TIMEOUT)
            .build_service();

        let retrying = tower::ServiceBuilder::new()
            .layer(tower::retry::RetryLayer::new(Backoff::default()))
            .service(client);

        let base = config
            .api_url
            .clone()
            .unwrap_or_else(|| Uri::from_static(GITHUB_BASE));

        Self::with_service(base, config.token.clone(), retrying)
    }

    /// Create a client which sends requests through an arbitrary service.
    ///
    /// No retry policy is added; wrap `service` in one if needed.
    pub fn with_service<S>(base: Uri, token: Secret, service: S) -> Self
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
        Self {
            client: ApiClient::new_with_inner_service(base, BearerAuth::new(token), service),
        }
    }

    /// Build a GET request against a Github endpoint.
    pub fn get(&self, endpoint: &str) -> Result<RequestBuilder<BearerAuth>, Error> {
        Ok(self.client.get(endpoint)?)
    }

    /// List the repositories of an organization, `per_page` at a time.
    ///
    /// Pages are requested lazily, following the `Link: rel="next"` header.
    #[tracing::instrument(skip(self))]
    pub fn org_repositories(
        &self,
        organization: &str,
        per_page: usize,
    ) -> Result<Paginated<Repository>, Error> {
        let request = self
            .get(&format!("orgs/{organization}/repos"))?
            .query("per_page", per_page)
            .build()
            .map_err(api_client::Error::from)?;

        Ok(api_client::Paginated::new(self.client.clone(), request))
    }

    /// Fetch the most recent commit on the default branch of a repository.
    ///
    /// Returns `None` when the repository has no commits at all.
    #[tracing::instrument(skip(self))]
    pub async fn latest_commit(&self, owner: &str, repo: &str) -> Result<Option<Commit>, Error> {
        let response = self
            .get(&format!("repos/{owner}/{repo}/commits"))?
            .query("per_page", 1)
            .send()
            .await?;

        // Github answers 409 Conflict for a repository without any commits.
        if response.status() == StatusCode::CONFLICT {
            tracing::debug!("{owner}/{repo} is an empty repository");
            return Ok(None);
        }

        let response = response.error_for_status().await?;
        let commits: Vec<Commit> = response.json().await.map_err(Error::Body)?;
        Ok(commits.into_iter().next())
    }
}

#[cfg(test)]
mod tests {
    use api_client::mock::MockService;

    use super::*;

    fn client(mock: &MockService) -> GithubClient {
        GithubClient::with_service(
            "http://api.github.test/".parse().unwrap(),
            Secret::from("ghp_test"),
            mock.clone(),
        )
    }

    static_assertions::assert_impl_all!(GithubClient: Send, Sync);
    static_assertions::assert_impl_all!(Error: Send, Sync);

    #[tokio::test]
    async fn latest_commit_requests_a_single_commit() {
        let mock = MockService::new();
        mock.json(
            "/repos/acme/widgets/commits?per_page=1",
            &serde_json::json!([{
                "sha": "abc123",
                "commit": {
                    "url": "http://api.github.test/repos/acme/widgets/git/commits/abc123",
                    "author": {"name": "Wile E.", "email": "wile@acme.test", "date": "2024-01-02T03:04:05Z"},
                    "message": "Add rocket skates"
                },
                "author": {"login": "wile", "id": 7}
            }]),
        );

        let commit = client(&mock)
            .latest_commit("acme", "widgets")
            .await
            .unwrap()
            .unwrap();

        assert_eq!(commit.sha, "abc123");
        assert_eq!(commit.author.unwrap().login, "wile");

        let requests = mock.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].authorization.as_deref(), Some("Bearer ghp_test"));
    }

    #[tokio::test]
    async fn empty_repository_has_no_latest_commit() {
        let mock = MockService::new();
        mock.add(
            "/repos/acme/empty/commits?per_page=1",
            StatusCode::CONFLICT,
            http::HeaderMap::new(),
            r#"{"message": "Git Repository is empty."}"#,
        );
        mock.json("/repos/acme/blank/commits?per_page=1", &serde_json::json!([]));

        let client = client(&mock);
        assert!(client.latest_commit("acme", "empty").await.unwrap().is_none());
        assert!(client.latest_commit("acme", "blank").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn latest_commit_reports_status() {
        let mock = MockService::new();
        mock.add(
            "/repos/acme/secret/commits?per_page=1",
            StatusCode::NOT_FOUND,
            http::HeaderMap::new(),
            r#"{"message": "Not Found"}"#,
        );

        let err = client(&mock)
            .latest_commit("acme", "secret")
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));
    }

    #[tokio::test]
    async fn org_repositories_follow_link_header() {
        use futures::TryStreamExt as _;

        let repo = |id: u64| {
            serde_json::json!({
                "id": id,
                "name": format!("repo-{id}"),
                "owner": {"login": "acme", "id": 1},
                "url": format!("http://api.github.test/repos/acme/repo-{id}"),
            })
        };

        let mock = MockService::new();
        let mut headers = http::HeaderMap::new();
        headers.insert(
            header::LINK,
            HeaderValue::from_static(
                r#"<http://api.github.test/orgs/acme/repos?per_page=2&page=2>; rel="next", <http://api.github.test/orgs/acme/repos?per_page=2&page=2>; rel="last""#,
            ),
        );
        mock.json_with_headers(
            "/orgs/acme/repos?per_page=2",
            headers,
            &serde_json::json!([repo(1), repo(2)]),
        );
        mock.json("/orgs/acme/repos?per_page=2&page=2", &serde_json::json!([repo(3)]));

        let repos: Vec<Repository> = client(&mock)
            .org_repositories("acme", 2)
            .unwrap()
            .try_collect()
            .await
            .unwrap();

        let ids: Vec<u64> = repos.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(mock.requests().len(), 2);
    }

    #[test]
    fn invalid_organization_is_an_error() {
        let mock = MockService::new();
        let err = client(&mock).org_repositories("acme corp", 10).unwrap_err();

        assert!(matches!(err, Error::Request(api_client::Error::Build(_))));
        assert!(mock.requests().is_empty());
    }

    #[tokio::test]
    async fn org_repositories_error_ends_stream() {
        use futures::StreamExt as _;

        let mock = MockService::new();
        mock.add(
            "/orgs/nobody/repos?per_page=10",
            StatusCode::NOT_FOUND,
            http::HeaderMap::new(),
            r#"{"message": "Not Found"}"#,
        );

        let mut repos = client(&mock).org_repositories("nobody", 10).unwrap();
        assert!(repos.next().await.unwrap().is_err());
        assert!(repos.next().await.is_none());
    }
}
