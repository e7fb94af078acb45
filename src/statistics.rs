//! Merge-time and merge-ratio statistics over a batch of pull requests.

use crate::auth::TokenProvider;
use crate::github::{ListPullRequestsParams, PullRequestRecord, PullRequestState, PullRequestsApi};
use crate::humanize;
use crate::types::RepoId;
use chrono::Duration;
use serde::Serialize;
use std::sync::Arc;

/// Reported as the average merge time when nothing in the batch was merged.
pub const NEVER_MERGED: &str = "Never";
/// Reported as the ratio when there is not enough data to compute one.
pub const NO_RATIO: &str = "0%";

/// The statistics shown on the pull requests summary card.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PullRequestStats {
    /// Humanized mean of `merged_at - created_at` over merged pull requests.
    pub average_merge_time: String,
    /// Merged pull requests as a rounded percentage of closed ones, e.g. "75%".
    pub merged_to_closed_ratio: String,
}

impl PullRequestStats {
    pub fn insufficient_data() -> Self {
        Self {
            average_merge_time: NEVER_MERGED.to_string(),
            merged_to_closed_ratio: NO_RATIO.to_string(),
        }
    }
}

#[derive(Debug, Default)]
struct StatsCount {
    total_merge_latency_ms: i64,
    merged_count: u64,
    closed_count: u64,
}

/// Reduces a batch of pull requests to its summary statistics.
///
/// A batch with no closed or no merged pull requests yields the `"Never"` / `"0%"` pair.
pub fn aggregate(items: &[PullRequestRecord]) -> PullRequestStats {
    let count = items.iter().fold(StatsCount::default(), |mut acc, pr| {
        if let Some(merged_at) = pr.merged_at {
            acc.total_merge_latency_ms += (merged_at - pr.created_at).num_milliseconds();
            acc.merged_count += 1;
        }
        if pr.closed_at.is_some() {
            acc.closed_count += 1;
        }
        acc
    });

    if count.closed_count == 0 || count.merged_count == 0 {
        return PullRequestStats::insufficient_data();
    }

    let average =
        Duration::milliseconds(count.total_merge_latency_ms / count.merged_count as i64);

    PullRequestStats {
        average_merge_time: humanize::duration(average),
        merged_to_closed_ratio: format!(
            "{}%",
            rounded_percentage(count.merged_count, count.closed_count)
        ),
    }
}

/// `round(part / whole * 100)` with halves rounded up, in integer arithmetic.
fn rounded_percentage(part: u64, whole: u64) -> u64 {
    (part * 200 + whole) / (whole * 2)
}

/// Which slice of a repository's pull requests the statistics are computed over.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatisticsRequest {
    pub repo_id: RepoId,
    pub state: PullRequestState,
    pub page_size: u32,
}

impl StatisticsRequest {
    /// The most recent 20 closed pull requests.
    pub fn new(repo_id: RepoId) -> Self {
        Self {
            repo_id,
            state: PullRequestState::Closed,
            page_size: 20,
        }
    }
}

/// Fetches the most recent page of pull requests and summarizes it.
pub struct PullRequestsStatistics {
    api: Arc<dyn PullRequestsApi>,
    tokens: Arc<dyn TokenProvider>,
}

impl PullRequestsStatistics {
    pub fn new(api: Arc<dyn PullRequestsApi>, tokens: Arc<dyn TokenProvider>) -> Self {
        Self { api, tokens }
    }

    pub async fn statistics(
        &self,
        request: &StatisticsRequest,
    ) -> anyhow::Result<PullRequestStats> {
        if request.repo_id.repo.trim().is_empty() {
            return Ok(PullRequestStats::insufficient_data());
        }

        let token = self.tokens.access_token().await?;
        let params = ListPullRequestsParams {
            owner: request.repo_id.owner.clone(),
            repo: request.repo_id.repo.clone(),
            state: request.state,
            page: 1,
            page_size: request.page_size,
        };

        let page = self.api.list_pull_requests(&params, &token).await?;
        let stats = aggregate(&page.items);

        tracing::debug!(
            repo_id = %request.repo_id,
            items = page.items.len(),
            average_merge_time = %stats.average_merge_time,
            merged_to_closed_ratio = %stats.merged_to_closed_ratio,
            "Calculated pull request statistics"
        );

        Ok(stats)
    }
}
