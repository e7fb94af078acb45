use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use github_pull_requests::{
    auth::StaticTokenProvider, config::AppConfig, create_app, github::GitHubPullRequestsClient,
    types::ProjectSlug, AppState,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt; // for `oneshot`
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_config(github_api_base: String) -> AppConfig {
    AppConfig {
        github_api_base,
        github_token: Some("config-token".to_string()),
        stats_page_size: 20,
        table_page_size: 5,
        project_slug: ProjectSlug::Unset,
        cors_allowed_origin: None,
    }
}

fn app_for(server: &MockServer) -> Router {
    app_with_config(test_config(server.uri()))
}

fn app_with_config(config: AppConfig) -> Router {
    let api = Arc::new(
        GitHubPullRequestsClient::new(&config.github_api_base).expect("Failed to create client"),
    );
    let tokens = Arc::new(StaticTokenProvider::new(config.github_token.clone()));
    let state = Arc::new(AppState::with_collaborators(config, api, tokens));
    create_app(state)
}

async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&body_bytes).unwrap_or(Value::Null);
    (status, body)
}

/// Two closed pull requests, merged 10 and 24 hours after creation.
fn closed_pulls() -> Value {
    json!([
        {
            "id": 1001,
            "number": 12,
            "title": "Add sync button",
            "html_url": "https://github.com/RoadieHQ/backstage-plugin-argo-cd/pull/12",
            "user": { "login": "alice", "html_url": "https://github.com/alice" },
            "created_at": "2020-09-01T08:00:00Z",
            "updated_at": "2020-09-01T18:00:00Z",
            "merged_at": "2020-09-01T18:00:00Z",
            "closed_at": "2020-09-01T18:00:00Z"
        },
        {
            "id": 1002,
            "number": 13,
            "title": "Bump dependencies",
            "html_url": "https://github.com/RoadieHQ/backstage-plugin-argo-cd/pull/13",
            "user": { "login": "bob", "html_url": "https://github.com/bob" },
            "created_at": "2020-09-02T08:00:00Z",
            "updated_at": "2020-09-03T08:00:00Z",
            "merged_at": "2020-09-03T08:00:00Z",
            "closed_at": "2020-09-03T08:00:00Z"
        }
    ])
}

async fn mount_closed_pulls(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/repos/RoadieHQ/backstage-plugin-argo-cd/pulls"))
        .and(query_param("state", "closed"))
        .and(query_param("per_page", "20"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(closed_pulls()))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_health_check() {
    let app = app_with_config(test_config("https://api.github.com".to_string()));

    let (status, body) = get_json(app, "/api/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "github-pull-requests");
}

#[tokio::test]
async fn test_repo_statistics() {
    let server = MockServer::start().await;
    mount_closed_pulls(&server).await;

    let (status, body) = get_json(
        app_for(&server),
        "/api/repos/RoadieHQ/backstage-plugin-argo-cd/pulls/stats",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["average_merge_time"], "17 hours");
    assert_eq!(body["merged_to_closed_ratio"], "100%");
}

#[tokio::test]
async fn test_project_statistics_by_slug() {
    let server = MockServer::start().await;
    mount_closed_pulls(&server).await;

    let (status, body) = get_json(
        app_for(&server),
        "/api/projects/pulls/stats?slug=RoadieHQ/backstage-plugin-argo-cd",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["average_merge_time"], "17 hours");
    assert_eq!(body["merged_to_closed_ratio"], "100%");
}

#[tokio::test]
async fn test_unset_project_returns_sentinels_without_calling_github() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let (status, body) = get_json(app_for(&server), "/api/projects/pulls/stats").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["average_merge_time"], "Never");
    assert_eq!(body["merged_to_closed_ratio"], "0%");

    let (status, body) = get_json(app_for(&server), "/api/projects/pulls?slug=not-a-slug").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["pull_requests_data"], json!([]));
    assert!(body.get("max_total_items").is_none());
}

#[tokio::test]
async fn test_project_routes_fall_back_to_configured_slug() {
    let server = MockServer::start().await;
    mount_closed_pulls(&server).await;

    let mut config = test_config(server.uri());
    config.project_slug = ProjectSlug::parse("RoadieHQ/backstage-plugin-argo-cd");

    let (status, body) = get_json(app_with_config(config), "/api/projects/pulls/stats").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["merged_to_closed_ratio"], "100%");
}

#[tokio::test]
async fn test_list_pull_requests() {
    let server = MockServer::start().await;
    let last = format!(
        "{}/repositories/7/pulls?state=closed&per_page=20&page=5",
        server.uri()
    );

    Mock::given(method("GET"))
        .and(path("/repos/RoadieHQ/backstage-plugin-argo-cd/pulls"))
        .and(query_param("state", "closed"))
        .and(query_param("per_page", "20"))
        .and(query_param("page", "2"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(closed_pulls())
                .insert_header("Link", format!("<{last}>; rel=\"last\"").as_str()),
        )
        .expect(1)
        .mount(&server)
        .await;

    let (status, body) = get_json(
        app_for(&server),
        "/api/repos/RoadieHQ/backstage-plugin-argo-cd/pulls?state=closed&page=2&page_size=20",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["max_total_items"], 100);

    let rows = body["pull_requests_data"].as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["number"], 12);
    assert_eq!(rows[0]["title"], "Add sync button");
    assert_eq!(rows[0]["status"], "merged");
    assert_eq!(rows[0]["creator_nickname"], "alice");
    assert_eq!(rows[0]["creator_profile_link"], "https://github.com/alice");
    assert!(rows[0]["created_time"]
        .as_str()
        .is_some_and(|t| t.ends_with(" ago")));
    assert_eq!(rows[1]["number"], 13);
}

#[tokio::test]
async fn test_list_pull_requests_defaults() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/repos/owner/repo/pulls"))
        .and(query_param("state", "all"))
        .and(query_param("per_page", "5"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let (status, body) = get_json(app_for(&server), "/api/repos/owner/repo/pulls").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["pull_requests_data"], json!([]));
    assert!(body.get("max_total_items").is_none());
}

#[tokio::test]
async fn test_large_page_size_is_accepted() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/repos/owner/repo/pulls"))
        .and(query_param("per_page", "150"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let (status, body) = get_json(app_for(&server), "/api/repos/owner/repo/pulls?page_size=150").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["pull_requests_data"], json!([]));
}

#[tokio::test]
async fn test_caller_bearer_token_is_forwarded() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/repos/owner/repo/pulls"))
        .and(header("authorization", "Bearer caller-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let response = app_for(&server)
        .oneshot(
            Request::builder()
                .uri("/api/repos/owner/repo/pulls")
                .header("Authorization", "Bearer caller-token")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_repository_not_found() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/repos/owner/missing/pulls"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "message": "Not Found",
            "documentation_url": "https://docs.github.com/rest/pulls/pulls#list-pull-requests"
        })))
        .mount(&server)
        .await;

    let (status, _) = get_json(app_for(&server), "/api/repos/owner/missing/pulls/stats").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_invalid_page_is_bad_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let (status, _) = get_json(app_for(&server), "/api/repos/owner/repo/pulls?page=0").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = get_json(app_for(&server), "/api/repos/owner/repo/pulls?page_size=0").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = get_json(app_for(&server), "/api/repos/owner/repo/pulls?state=merged").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
