//! Access-token acquisition for calls to the GitHub API.

use anyhow::Result;
use async_trait::async_trait;

/// Supplies a bearer token for the GitHub API on demand.
///
/// Tokens are opaque to this crate; they are fetched per operation and never cached here.
/// An empty token means "call anonymously".
#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn access_token(&self) -> Result<String>;
}

/// Hands out a fixed token, typically `GITHUB_TOKEN` or a caller's bearer credential.
#[derive(Clone, Debug, Default)]
pub struct StaticTokenProvider {
    token: Option<String>,
}

impl StaticTokenProvider {
    pub fn new(token: Option<String>) -> Self {
        Self { token }
    }
}

#[async_trait]
impl TokenProvider for StaticTokenProvider {
    async fn access_token(&self) -> Result<String> {
        Ok(self.token.clone().unwrap_or_default())
    }
}
