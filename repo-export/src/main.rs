//! `repo-export`: write a CSV export of a Github organization's repositories.

use clap::Parser as _;
use octocat::{GithubClient, GithubConfig};
use repo_export::Settings;
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> eyre::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let settings = Settings::parse();

    // Fail on a missing token before any client exists.
    let config = GithubConfig::from_env().inspect_err(|error| {
        tracing::error!("Unable to configure the Github client: {error}");
    })?;
    let client = GithubClient::from_config(&config);

    let path = repo_export::export_organization(
        &client,
        &settings.org,
        settings.per_page,
        &settings.output_dir,
        chrono::Utc::now(),
    )
    .await
    .inspect_err(|error| tracing::error!("Export failed: {error}"))?;

    tracing::info!("Export written to {path}");
    println!("{path}");
    Ok(())
}
