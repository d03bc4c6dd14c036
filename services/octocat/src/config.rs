use std::env::VarError;

use api_client::{MissingSecret, Secret};
use http::uri::InvalidUri;
use http::Uri;

/// Environment variable holding the API token.
pub const GITHUB_TOKEN: &str = "GITHUB_TOKEN";

/// Environment variable overriding the API base URL (e.g. Github Enterprise).
pub const GITHUB_API_URL: &str = "GITHUB_API_URL";

/// Github client configuration could not be loaded.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// No usable token.
    #[error(transparent)]
    Token(#[from] MissingSecret),

    /// The API base URL override is not a valid URI.
    #[error("GITHUB_API_URL is not a valid URI: {0}")]
    ApiUrl(#[source] InvalidUri),
}

/// Configuration for a token-authenticated Github client.
#[derive(Debug, Clone)]
pub struct GithubConfig {
    /// Personal access or OAuth token, sent as a bearer credential.
    pub token: Secret,

    /// API base URL, when not `https://api.github.com/`.
    pub api_url: Option<Uri>,
}

impl GithubConfig {
    /// Load configuration from `GITHUB_TOKEN` and `GITHUB_API_URL`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name))
    }

    /// Load configuration using an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Result<String, VarError>,
    {
        let token = Secret::from_lookup(GITHUB_TOKEN, &lookup)?;

        let api_url = match lookup(GITHUB_API_URL) {
            Ok(url) if !url.trim().is_empty() => {
                let url = if url.ends_with('/') { url } else { format!("{url}/") };
                Some(url.parse().map_err(ConfigError::ApiUrl)?)
            }
            _ => None,
        };

        Ok(Self { token, api_url })
    }
}
