//! GitHub pull request listing.
//!
//! `PullRequestsApi` is the seam the statistics service and the table view fetch through;
//! `GitHubPullRequestsClient` is its octocrab-backed implementation.

use crate::pagination;
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use http::Uri;
use octocrab::{Octocrab, Page};
use serde::{Deserialize, Serialize};

/// State filter accepted by the pull request list endpoint.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PullRequestState {
    Open,
    Closed,
    #[default]
    All,
}

impl PullRequestState {
    pub fn as_str(self) -> &'static str {
        match self {
            PullRequestState::Open => "open",
            PullRequestState::Closed => "closed",
            PullRequestState::All => "all",
        }
    }
}

/// Where a single pull request is in its lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PullRequestStatus {
    Open,
    Closed,
    Merged,
}

/// One pull request as returned by the list endpoint.
///
/// GitHub sets `closed_at` whenever it sets `merged_at`; nothing here checks that.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestRecord {
    pub id: u64,
    pub number: u64,
    pub title: String,
    pub url: String,
    pub creator_nickname: String,
    pub creator_profile_link: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub merged_at: Option<DateTime<Utc>>,
    pub closed_at: Option<DateTime<Utc>>,
}

impl PullRequestRecord {
    pub fn status(&self) -> PullRequestStatus {
        if self.merged_at.is_some() {
            PullRequestStatus::Merged
        } else if self.closed_at.is_some() {
            PullRequestStatus::Closed
        } else {
            PullRequestStatus::Open
        }
    }
}

/// Wire shape of a pull request in `GET /repos/{owner}/{repo}/pulls`, trimmed to what we use.
#[derive(Debug, Deserialize)]
struct ApiPullRequest {
    id: u64,
    number: u64,
    title: Option<String>,
    html_url: String,
    user: Option<ApiUser>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    merged_at: Option<DateTime<Utc>>,
    closed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct ApiUser {
    login: String,
    html_url: String,
}

impl From<ApiPullRequest> for PullRequestRecord {
    fn from(pr: ApiPullRequest) -> Self {
        let (creator_nickname, creator_profile_link) = pr
            .user
            .map(|user| (user.login, user.html_url))
            .unwrap_or_default();

        Self {
            id: pr.id,
            number: pr.number,
            title: pr.title.unwrap_or_default(),
            url: pr.html_url,
            creator_nickname,
            creator_profile_link,
            created_at: pr.created_at,
            updated_at: pr.updated_at,
            merged_at: pr.merged_at,
            closed_at: pr.closed_at,
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PaginationError {
    #[error("page must be at least 1")]
    ZeroPage,
    #[error("page_size must be at least 1")]
    ZeroPageSize,
}

/// Parameters for listing one page of pull requests.
///
/// The default value has an empty repository, which lists nothing.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ListPullRequestsParams {
    pub owner: String,
    pub repo: String,
    pub state: PullRequestState,
    /// 1-based page index.
    pub page: u32,
    /// Forwarded to GitHub as `per_page` unchanged; GitHub itself caps it at 100.
    pub page_size: u32,
}

impl ListPullRequestsParams {
    fn validate(&self) -> Result<(), PaginationError> {
        if self.page == 0 {
            return Err(PaginationError::ZeroPage);
        }
        if self.page_size == 0 {
            return Err(PaginationError::ZeroPageSize);
        }
        Ok(())
    }
}

/// One page of pull requests, in the order GitHub returned them.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PullRequestsPage {
    pub items: Vec<PullRequestRecord>,
    /// Upper bound on the total number of pull requests matching the filter,
    /// known only when GitHub sends a `rel="last"` link.
    pub total_estimate: Option<u64>,
}

#[async_trait]
pub trait PullRequestsApi: Send + Sync {
    /// Fetches a single page of pull requests. An empty repository name lists nothing
    /// and makes no request. Upstream failures are returned as-is, without retries.
    async fn list_pull_requests(
        &self,
        params: &ListPullRequestsParams,
        token: &str,
    ) -> Result<PullRequestsPage>;
}

pub struct GitHubPullRequestsClient {
    api_base: Uri,
}

impl GitHubPullRequestsClient {
    pub fn new(api_base: impl AsRef<str>) -> Result<Self> {
        let api_base = api_base.as_ref().parse::<Uri>()?;
        Ok(Self { api_base })
    }

    /// Builds a client for one call; an empty token yields an anonymous client.
    fn octocrab(&self, token: &str) -> Result<Octocrab> {
        let mut builder = Octocrab::builder().base_uri(self.api_base.clone())?;
        if !token.is_empty() {
            builder = builder.personal_token(token.to_string());
        }
        Ok(builder.build()?)
    }
}

#[async_trait]
impl PullRequestsApi for GitHubPullRequestsClient {
    async fn list_pull_requests(
        &self,
        params: &ListPullRequestsParams,
        token: &str,
    ) -> Result<PullRequestsPage> {
        if params.repo.trim().is_empty() {
            tracing::debug!(owner = %params.owner, "No repository given, skipping pull request fetch");
            return Ok(PullRequestsPage::default());
        }

        params.validate()?;

        // Sanitize inputs to prevent path traversal or unintended endpoint access
        let owner = params.owner.trim().replace("..", "");
        let repo = params.repo.trim().replace("..", "");

        let page = params.page.to_string();
        let per_page = params.page_size.to_string();
        let query = [
            ("state", params.state.as_str()),
            ("per_page", per_page.as_str()),
            ("page", page.as_str()),
        ];

        let response: Page<ApiPullRequest> = self
            .octocrab(token)?
            .get(format!("/repos/{owner}/{repo}/pulls"), Some(&query))
            .await?;

        let total_estimate =
            pagination::estimate_total(response.number_of_pages(), params.page_size);

        tracing::debug!(
            owner = %owner,
            repo = %repo,
            page = params.page,
            items = response.items.len(),
            ?total_estimate,
            "Fetched pull requests"
        );

        Ok(PullRequestsPage {
            items: response.items.into_iter().map(Into::into).collect(),
            total_estimate,
        })
    }
}
