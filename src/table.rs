//! Paging state for the pull requests table.
//!
//! Every state change issues a [`TableRequest`] carrying a sequence number. Only the
//! response to the most recently issued request is applied, so a slow response for a
//! superseded page or filter cannot overwrite newer data.

use crate::auth::TokenProvider;
use crate::github::{
    ListPullRequestsParams, PullRequestRecord, PullRequestState, PullRequestStatus,
    PullRequestsApi, PullRequestsPage,
};
use crate::humanize;
use crate::types::ProjectSlug;
use chrono::{DateTime, Utc};
use serde::Serialize;

pub const DEFAULT_PAGE_SIZE: u32 = 5;

/// A pull request as displayed in the table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PullRequestRow {
    pub id: u64,
    pub number: u64,
    pub title: String,
    pub url: String,
    pub status: PullRequestStatus,
    pub creator_nickname: String,
    pub creator_profile_link: String,
    /// Creation time relative to when the row was built, e.g. "3 days ago".
    pub created_time: String,
    pub updated_time: String,
}

impl PullRequestRow {
    pub fn from_record(record: &PullRequestRecord, now: DateTime<Utc>) -> Self {
        Self {
            id: record.id,
            number: record.number,
            title: record.title.clone(),
            url: record.url.clone(),
            status: record.status(),
            creator_nickname: record.creator_nickname.clone(),
            creator_profile_link: record.creator_profile_link.clone(),
            created_time: humanize::relative(record.created_at, now),
            updated_time: humanize::relative(record.updated_at, now),
        }
    }
}

/// A fetch issued by the table. Hand it back to [`PullRequestsTable::apply`] with the result.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TableRequest {
    pub seq: u64,
    pub params: ListPullRequestsParams,
}

#[derive(Debug)]
pub struct PullRequestsTable {
    project: ProjectSlug,
    state: PullRequestState,
    /// 0-based; GitHub pages are 1-based.
    page: u32,
    page_size: u32,
    total: u64,
    rows: Vec<PullRequestRow>,
    latest_seq: u64,
}

impl PullRequestsTable {
    pub fn new(project: ProjectSlug) -> Self {
        Self {
            project,
            state: PullRequestState::Open,
            page: 0,
            page_size: DEFAULT_PAGE_SIZE,
            total: 0,
            rows: Vec::new(),
            latest_seq: 0,
        }
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn state(&self) -> PullRequestState {
        self.state
    }

    /// Last known total estimate; kept when a response carries none.
    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn rows(&self) -> &[PullRequestRow] {
        &self.rows
    }

    /// Issues a request for the current page, filter and page size.
    pub fn request(&mut self) -> TableRequest {
        self.latest_seq += 1;

        let (owner, repo) = match self.project.repo_id() {
            Some(repo_id) => (repo_id.owner.clone(), repo_id.repo.clone()),
            None => (String::new(), String::new()),
        };

        TableRequest {
            seq: self.latest_seq,
            params: ListPullRequestsParams {
                owner,
                repo,
                state: self.state,
                page: self.page + 1,
                page_size: self.page_size,
            },
        }
    }

    pub fn set_page(&mut self, page: u32) -> TableRequest {
        self.page = page;
        self.request()
    }

    pub fn set_page_size(&mut self, page_size: u32) -> TableRequest {
        self.page_size = page_size;
        self.request()
    }

    /// Changing the filter starts over from the first page.
    pub fn set_state(&mut self, state: PullRequestState) -> TableRequest {
        self.state = state;
        self.page = 0;
        self.request()
    }

    /// Stores the result of `request` unless a newer request has been issued since.
    /// Returns whether the result was applied.
    pub fn apply(
        &mut self,
        request: &TableRequest,
        page: PullRequestsPage,
        now: DateTime<Utc>,
    ) -> bool {
        if request.seq != self.latest_seq {
            tracing::debug!(
                seq = request.seq,
                latest_seq = self.latest_seq,
                "Discarding stale pull requests response"
            );
            return false;
        }

        if let Some(total) = page.total_estimate {
            self.total = total;
        }
        self.rows = page
            .items
            .iter()
            .map(|record| PullRequestRow::from_record(record, now))
            .collect();
        true
    }

    /// Fetches and applies the current page.
    pub async fn refresh(
        &mut self,
        api: &dyn PullRequestsApi,
        tokens: &dyn TokenProvider,
    ) -> anyhow::Result<()> {
        let request = self.request();
        let token = tokens.access_token().await?;
        let page = api.list_pull_requests(&request.params, &token).await?;
        self.apply(&request, page, Utc::now());
        Ok(())
    }
}
