//! Application configuration and environment variable parsing.
//!
//! Settings are loaded from the environment (optionally seeded from a `.env` file).
//! Every field has a default, so the service starts with no configuration at all
//! and talks to public github.com anonymously.

use crate::types::ProjectSlug;
use serde::Deserialize;

/// Application configuration loaded from environment variables.
#[derive(Clone, Debug, Deserialize)]
pub struct AppConfig {
    /// Base URL of the GitHub REST API. Point this at `https://<host>/api/v3` for GitHub Enterprise.
    #[serde(default = "default_github_api_base")]
    pub github_api_base: String,

    /// Optional GitHub token used when a request carries no bearer credential of its own.
    #[serde(default)]
    pub github_token: Option<String>,

    /// Number of most recent pull requests the statistics are computed over.
    #[serde(default = "default_stats_page_size")]
    pub stats_page_size: u32,

    /// Default number of rows per page for pull request listings.
    #[serde(default = "default_table_page_size")]
    pub table_page_size: u32,

    /// Project used by the `/api/projects/...` routes when a request names no slug.
    /// Expected format: "owner/repo".
    #[serde(default, deserialize_with = "deserialize_project_slug")]
    pub project_slug: ProjectSlug,

    /// Browser origin allowed to call the API, e.g. "http://localhost:3000".
    #[serde(default)]
    pub cors_allowed_origin: Option<String>,
}

fn default_github_api_base() -> String {
    "https://api.github.com".to_string()
}

fn default_stats_page_size() -> u32 {
    20
}

fn default_table_page_size() -> u32 {
    5
}

impl AppConfig {
    pub fn from_env() -> Result<Self, envy::Error> {
        envy::from_env()
    }
}

fn deserialize_project_slug<'de, D>(deserializer: D) -> Result<ProjectSlug, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: Option<String> = Deserialize::deserialize(deserializer)?;
    Ok(ProjectSlug::from_annotation(s.as_deref()))
}
