//! Command line settings.

use camino::Utf8PathBuf;
use clap::builder::TypedValueParser as _;
use clap::Parser;

use crate::enumerate::DEFAULT_PER_PAGE;

/// Organization exported when none is given.
pub const DEFAULT_ORGANIZATION: &str = "pantheon-systems";

/// Export every repository of a Github organization, with its latest commit, to CSV.
///
/// Authenticates with the token in `GITHUB_TOKEN`.
#[derive(Debug, Clone, Parser)]
#[command(version, about)]
pub struct Settings {
    /// Organization to export.
    #[arg(long, default_value = DEFAULT_ORGANIZATION, value_parser = parse_organization)]
    pub org: String,

    /// Repositories requested per listing page.
    #[arg(
        long,
        default_value_t = DEFAULT_PER_PAGE,
        value_parser = clap::value_parser!(u16).range(1..=100).map(usize::from),
    )]
    pub per_page: usize,

    /// Directory the `repos.<random>.csv` file is written to.
    #[arg(long, default_value = ".")]
    pub output_dir: Utf8PathBuf,
}

/// Github logins are 1 to 39 ASCII letters, digits or hyphens, and never
/// start with a hyphen.
fn parse_organization(value: &str) -> Result<String, String> {
    let valid = !value.is_empty()
        && value.len() <= 39
        && !value.starts_with('-')
        && value.chars().all(|c| c.is_ascii_alphanumeric() || c == '-');

    if valid {
        Ok(value.to_owned())
    } else {
        Err(format!("'{value}' is not a Github organization name"))
    }
}
