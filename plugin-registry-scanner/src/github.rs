//! Repository host access.
//!
//! [`RepositoryHost`] is the capability seam the resolution engine works
//! against; [`GitHubHost`] is the production implementation on top of the
//! GitHub REST API.

#[cfg(test)]
use mockall::automock;

use async_trait::async_trait;
use octocrab::Octocrab;
use thiserror::Error;
use tracing::debug;

use crate::catalog::RepoCoordinate;
use crate::rate_limit::RateLimitInfo;

/// Results per page for branch and tag listings.
const RESULTS_PER_PAGE: u8 = 100;

/// Errors that can occur during repository-host reads.
#[derive(Debug, Error)]
pub enum HostError {
    /// GitHub API error.
    #[error("GitHub API error: {0}")]
    Api(#[from] octocrab::Error),

    /// A file was present but its content could not be decoded.
    #[error("Could not decode content of '{path}'")]
    UndecodableContent { path: String },

    /// Transport failure reported by a non-GitHub [`RepositoryHost`]
    /// implementation.
    #[error("Repository host request failed: {message}")]
    Transport { message: String },
}

/// Repository metadata shown in the registry report.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RepoMetadata {
    pub description: Option<String>,
    pub homepage: Option<String>,
    pub topics: Vec<String>,
    pub stargazers_count: Option<u32>,
    pub language: Option<String>,
    pub default_branch: Option<String>,
}

/// Read access to a source-control host.
///
/// Every operation is a single attempt; callers wrap calls in the configured
/// retry policy where the resolution algorithm asks for one.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait RepositoryHost: Send + Sync {
    /// Branch names of the repository.
    async fn list_branches(&self, coordinate: &RepoCoordinate)
        -> Result<Vec<String>, HostError>;

    /// Tag names of the repository.
    async fn list_tags(&self, coordinate: &RepoCoordinate) -> Result<Vec<String>, HostError>;

    /// Decoded content of a file at a reference. `Ok(None)` when the file
    /// does not exist on that reference.
    async fn file_content(
        &self,
        coordinate: &RepoCoordinate,
        path: &str,
        reference: &str,
    ) -> Result<Option<String>, HostError>;

    /// Display metadata of the repository.
    async fn repo_metadata(&self, coordinate: &RepoCoordinate)
        -> Result<RepoMetadata, HostError>;

    /// Core-API quota, when the host reports one.
    async fn rate_limit(&self) -> Result<Option<RateLimitInfo>, HostError>;
}

/// GitHub-backed [`RepositoryHost`].
pub struct GitHubHost {
    octocrab: Octocrab,
}

impl GitHubHost {
    #[must_use]
    pub fn new(octocrab: Octocrab) -> Self {
        Self { octocrab }
    }
}

#[async_trait]
impl RepositoryHost for GitHubHost {
    async fn list_branches(
        &self,
        coordinate: &RepoCoordinate,
    ) -> Result<Vec<String>, HostError> {
        let page = self
            .octocrab
            .repos(&coordinate.owner, &coordinate.name)
            .list_branches()
            .per_page(RESULTS_PER_PAGE)
            .send()
            .await?;
        let branches = drain_pages(&self.octocrab, page).await?;

        debug!(repo = %coordinate, count = branches.len(), "Listed branches");
        Ok(branches.into_iter().map(|branch| branch.name).collect())
    }

    async fn list_tags(&self, coordinate: &RepoCoordinate) -> Result<Vec<String>, HostError> {
        let page = self
            .octocrab
            .repos(&coordinate.owner, &coordinate.name)
            .list_tags()
            .per_page(RESULTS_PER_PAGE)
            .send()
            .await?;
        let tags = drain_pages(&self.octocrab, page).await?;

        debug!(repo = %coordinate, count = tags.len(), "Listed tags");
        Ok(tags.into_iter().map(|tag| tag.name).collect())
    }

    async fn file_content(
        &self,
        coordinate: &RepoCoordinate,
        path: &str,
        reference: &str,
    ) -> Result<Option<String>, HostError> {
        let response = self
            .octocrab
            .repos(&coordinate.owner, &coordinate.name)
            .get_content()
            .path(path)
            .r#ref(reference)
            .send()
            .await;

        let contents = match response {
            Ok(contents) => contents,
            Err(error) if is_not_found(&error) => {
                debug!(repo = %coordinate, path, reference, "File not present");
                return Ok(None);
            }
            Err(error) => return Err(error.into()),
        };

        let Some(item) = contents.items.into_iter().next() else {
            return Ok(None);
        };
        match item.decoded_content() {
            Some(text) => Ok(Some(text)),
            None => Err(HostError::UndecodableContent {
                path: path.to_string(),
            }),
        }
    }

    async fn repo_metadata(
        &self,
        coordinate: &RepoCoordinate,
    ) -> Result<RepoMetadata, HostError> {
        let repository = self
            .octocrab
            .repos(&coordinate.owner, &coordinate.name)
            .get()
            .await?;

        Ok(RepoMetadata {
            description: repository.description,
            homepage: repository.homepage,
            topics: repository.topics.unwrap_or_default(),
            stargazers_count: repository.stargazers_count,
            language: repository
                .language
                .and_then(|value| value.as_str().map(String::from)),
            default_branch: repository.default_branch,
        })
    }

    async fn rate_limit(&self) -> Result<Option<RateLimitInfo>, HostError> {
        let rate_limit = self.octocrab.ratelimit().get().await?;
        let core = &rate_limit.resources.core;

        Ok(Some(RateLimitInfo {
            remaining: core.remaining as u32,
            reset: core.reset,
            limit: core.limit as u32,
        }))
    }
}

/// Collects the remaining pages of a paginated listing.
async fn drain_pages<T: serde::de::DeserializeOwned>(
    octocrab: &Octocrab,
    mut page: octocrab::Page<T>,
) -> Result<Vec<T>, octocrab::Error> {
    let mut items = page.take_items();
    while let Some(mut next_page) = octocrab.get_page::<T>(&page.next).await? {
        items.append(&mut next_page.take_items());
        page.next = next_page.next;
    }
    Ok(items)
}

/// GitHub reports missing files and repositories as API errors; match on the
/// message rather than transport internals.
fn is_not_found(error: &octocrab::Error) -> bool {
    let message = error.to_string().to_lowercase();
    message.contains("404") || message.contains("not found")
}
