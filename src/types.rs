//! Repository identity types shared by the fetcher, the statistics service and the HTTP layer.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Catalog annotation holding the `owner/repo` slug of a component's GitHub project.
pub const PROJECT_SLUG_ANNOTATION: &str = "github.com/project-slug";

/// A unique identifier for a GitHub repository.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepoId {
    /// The owner of the repository (e.g., "RoadieHQ").
    pub owner: String,
    /// The name of the repository (e.g., "backstage-plugin-argo-cd").
    pub repo: String,
}

impl RepoId {
    pub fn new(owner: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
        }
    }
}

impl fmt::Display for RepoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

/// The GitHub project a catalogued component points at, if any.
///
/// Components without a usable `github.com/project-slug` annotation are `Unset`;
/// callers treat that as "feature unavailable" rather than as an error.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum ProjectSlug {
    #[default]
    Unset,
    Repo(RepoId),
}

impl ProjectSlug {
    /// Parses an `owner/repo` slug. Anything other than exactly two non-empty
    /// segments yields `Unset`.
    pub fn parse(value: &str) -> Self {
        let mut parts = value.trim().split('/');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(owner), Some(repo), None) if !owner.trim().is_empty() && !repo.trim().is_empty() => {
                ProjectSlug::Repo(RepoId::new(owner.trim(), repo.trim()))
            }
            _ => ProjectSlug::Unset,
        }
    }

    /// Builds a slug from an optional annotation value.
    pub fn from_annotation(value: Option<&str>) -> Self {
        value.map(Self::parse).unwrap_or_default()
    }

    pub fn repo_id(&self) -> Option<&RepoId> {
        match self {
            ProjectSlug::Unset => None,
            ProjectSlug::Repo(repo_id) => Some(repo_id),
        }
    }

    pub fn is_set(&self) -> bool {
        matches!(self, ProjectSlug::Repo(_))
    }
}
