pub mod auth;
pub mod config;
pub mod github;
pub mod humanize;
pub mod pagination;
pub mod statistics;
pub mod table;
pub mod types;

use auth::{StaticTokenProvider, TokenProvider};
use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, HeaderValue, Method, StatusCode},
    routing::get,
    Json, Router,
};
use chrono::Utc;
use config::AppConfig;
use github::{
    GitHubPullRequestsClient, ListPullRequestsParams, PaginationError, PullRequestState,
    PullRequestsApi,
};
use serde::{Deserialize, Serialize};
use statistics::{PullRequestStats, PullRequestsStatistics, StatisticsRequest};
use std::sync::Arc;
use table::PullRequestRow;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use types::{ProjectSlug, RepoId};

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    service: &'static str,
    version: &'static str,
}

/// One page of pull requests as served to the portal.
#[derive(Debug, Serialize)]
pub struct ListPullRequestsResponse {
    /// Upper bound on the number of matching pull requests, when GitHub reports a last page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_total_items: Option<u64>,
    pub pull_requests_data: Vec<PullRequestRow>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListPullRequestsQuery {
    pub slug: Option<String>,
    pub state: Option<PullRequestState>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct StatisticsQuery {
    pub slug: Option<String>,
    pub state: Option<PullRequestState>,
    pub page_size: Option<u32>,
}

type ApiError = (StatusCode, String);

/// Shared application state accessible to all request handlers.
pub struct AppState {
    /// Source of pull request pages.
    pub api: Arc<dyn PullRequestsApi>,
    /// Token used when a request carries no bearer credential.
    pub tokens: Arc<dyn TokenProvider>,
    /// Application configuration loaded from environment variables.
    pub config: AppConfig,
}

impl AppState {
    /// Wires the GitHub client and the configured token from `config`.
    pub fn new(config: AppConfig) -> anyhow::Result<Self> {
        let api = Arc::new(GitHubPullRequestsClient::new(&config.github_api_base)?);
        let tokens = Arc::new(StaticTokenProvider::new(config.github_token.clone()));
        Ok(Self::with_collaborators(config, api, tokens))
    }

    pub fn with_collaborators(
        config: AppConfig,
        api: Arc<dyn PullRequestsApi>,
        tokens: Arc<dyn TokenProvider>,
    ) -> Self {
        Self {
            api,
            tokens,
            config,
        }
    }

    /// A caller's own bearer token takes precedence over the configured one.
    fn token_provider(&self, headers: &HeaderMap) -> Arc<dyn TokenProvider> {
        match bearer_token(headers) {
            Some(token) => Arc::new(StaticTokenProvider::new(Some(token))),
            None => self.tokens.clone(),
        }
    }

    fn project(&self, slug: Option<&str>) -> ProjectSlug {
        match slug {
            Some(slug) => ProjectSlug::parse(slug),
            None => self.config.project_slug.clone(),
        }
    }
}

pub fn create_app(state: Arc<AppState>) -> Router {
    let router = Router::new()
        .route("/api/health", get(health_check))
        .route("/api/repos/{owner}/{repo}/pulls", get(get_repo_pull_requests))
        .route(
            "/api/repos/{owner}/{repo}/pulls/stats",
            get(get_repo_statistics),
        )
        .route("/api/projects/pulls", get(get_project_pull_requests))
        .route("/api/projects/pulls/stats", get(get_project_statistics));

    let router = match cors_layer(&state.config) {
        Some(cors) => router.layer(cors),
        None => router,
    };

    router.layer(TraceLayer::new_for_http()).with_state(state)
}

fn cors_layer(config: &AppConfig) -> Option<CorsLayer> {
    let origin = config.cors_allowed_origin.as_deref()?;
    match origin.parse::<HeaderValue>() {
        Ok(origin) => Some(
            CorsLayer::new()
                .allow_origin(origin)
                .allow_methods([Method::GET])
                .allow_headers([header::AUTHORIZATION]),
        ),
        Err(e) => {
            tracing::warn!("Ignoring invalid CORS_ALLOWED_ORIGIN '{}': {}", origin, e);
            None
        }
    }
}

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        service: "github-pull-requests",
        version: env!("CARGO_PKG_VERSION"),
    })
}

pub async fn get_repo_pull_requests(
    Path(repo_id): Path<RepoId>,
    Query(query): Query<ListPullRequestsQuery>,
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<ListPullRequestsResponse>, ApiError> {
    list_pull_requests(&state, &headers, &ProjectSlug::Repo(repo_id), &query).await
}

pub async fn get_project_pull_requests(
    Query(query): Query<ListPullRequestsQuery>,
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<ListPullRequestsResponse>, ApiError> {
    let project = state.project(query.slug.as_deref());
    list_pull_requests(&state, &headers, &project, &query).await
}

pub async fn get_repo_statistics(
    Path(repo_id): Path<RepoId>,
    Query(query): Query<StatisticsQuery>,
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<PullRequestStats>, ApiError> {
    statistics(&state, &headers, &ProjectSlug::Repo(repo_id), &query).await
}

pub async fn get_project_statistics(
    Query(query): Query<StatisticsQuery>,
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<PullRequestStats>, ApiError> {
    let project = state.project(query.slug.as_deref());
    statistics(&state, &headers, &project, &query).await
}

async fn list_pull_requests(
    state: &AppState,
    headers: &HeaderMap,
    project: &ProjectSlug,
    query: &ListPullRequestsQuery,
) -> Result<Json<ListPullRequestsResponse>, ApiError> {
    let Some(repo_id) = project.repo_id() else {
        tracing::debug!("No GitHub project configured, returning no pull requests");
        return Ok(Json(ListPullRequestsResponse {
            max_total_items: None,
            pull_requests_data: Vec::new(),
        }));
    };

    let params = ListPullRequestsParams {
        owner: repo_id.owner.clone(),
        repo: repo_id.repo.clone(),
        state: query.state.unwrap_or_default(),
        page: query.page.unwrap_or(1),
        page_size: query.page_size.unwrap_or(state.config.table_page_size),
    };

    let token = state
        .token_provider(headers)
        .access_token()
        .await
        .map_err(|e| error_response(repo_id, e))?;
    let page = state
        .api
        .list_pull_requests(&params, &token)
        .await
        .map_err(|e| error_response(repo_id, e))?;

    let now = Utc::now();
    Ok(Json(ListPullRequestsResponse {
        max_total_items: page.total_estimate,
        pull_requests_data: page
            .items
            .iter()
            .map(|record| PullRequestRow::from_record(record, now))
            .collect(),
    }))
}

async fn statistics(
    state: &AppState,
    headers: &HeaderMap,
    project: &ProjectSlug,
    query: &StatisticsQuery,
) -> Result<Json<PullRequestStats>, ApiError> {
    let Some(repo_id) = project.repo_id() else {
        tracing::debug!("No GitHub project configured, returning empty statistics");
        return Ok(Json(PullRequestStats::insufficient_data()));
    };

    let service = PullRequestsStatistics::new(state.api.clone(), state.token_provider(headers));
    let request = StatisticsRequest {
        repo_id: repo_id.clone(),
        state: query.state.unwrap_or(PullRequestState::Closed),
        page_size: query.page_size.unwrap_or(state.config.stats_page_size),
    };

    match service.statistics(&request).await {
        Ok(stats) => {
            tracing::debug!(repo_id = %repo_id, "Returning statistics");
            Ok(Json(stats))
        }
        Err(e) => Err(error_response(repo_id, e)),
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then(|| token.to_string())
}

fn error_response(repo_id: &RepoId, e: anyhow::Error) -> ApiError {
    if let Some(pagination) = e.downcast_ref::<PaginationError>() {
        return (StatusCode::BAD_REQUEST, pagination.to_string());
    }

    tracing::error!("Failed to fetch PRs for {}: {}", repo_id, e);

    if let Some(octocrab::Error::GitHub { source, .. }) = e.downcast_ref::<octocrab::Error>() {
        if source.message.to_lowercase().contains("rate limit") {
            return (
                StatusCode::TOO_MANY_REQUESTS,
                "GitHub Rate Limit Exceeded".to_string(),
            );
        }
        match source.status_code.as_u16() {
            401 => {
                return (
                    StatusCode::UNAUTHORIZED,
                    "GitHub Authorization Failed".to_string(),
                )
            }
            403 => return (StatusCode::FORBIDDEN, "GitHub Access Denied".to_string()),
            404 => return (StatusCode::NOT_FOUND, "Repository Not Found".to_string()),
            _ => {}
        }
    }

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "Internal Server Error".to_string(),
    )
}
