use crate::domain::entities::{
    Template, TemplateDiffResponse, TemplateVersion, DEFAULT_TEMPLATE_HTML,
};
use crate::domain::ports::template_repository::TemplateRepository;
use crate::domain::services::{combine_change_description, summarize};
use crate::infrastructure::http::middleware::error::{ApiError, ApiResult};
use crate::infrastructure::observability::{
    TEMPLATE_REVERTS_TOTAL, TEMPLATE_SAVES_TOTAL, TEMPLATE_SAVE_CONFLICTS_TOTAL,
    TEMPLATE_VERSIONS_PRUNED_TOTAL,
};
use std::sync::Arc;

/// Snapshots kept in history unless configured otherwise
pub const DEFAULT_MAX_VERSIONS: usize = 30;

pub const RESET_DESCRIPTION: &str = "Restored default template";

/// Re-read attempts when another writer bumps the version mid-save
const MAX_SAVE_ATTEMPTS: usize = 3;

/// Versioned store for the shared offer template.
///
/// Every save after the first snapshots the previous content into
/// history, history is bounded to `max_versions` entries, and reverts
/// always move forward to a new version.
#[derive(Clone)]
pub struct TemplateService {
    template_repo: Arc<dyn TemplateRepository>,
    max_versions: usize,
}

impl TemplateService {
    pub fn new(template_repo: Arc<dyn TemplateRepository>, max_versions: usize) -> Self {
        Self {
            template_repo,
            max_versions,
        }
    }

    pub fn max_versions(&self) -> usize {
        self.max_versions
    }

    /// Current template, `None` if it was never saved
    pub async fn get(&self) -> ApiResult<Option<Template>> {
        self.template_repo.get_current_template().await
    }

    /// Current HTML, or the built-in default when nothing was saved yet
    pub async fn effective_html(&self) -> ApiResult<String> {
        Ok(self
            .get()
            .await?
            .map(|t| t.html_content)
            .unwrap_or_else(|| DEFAULT_TEMPLATE_HTML.to_string()))
    }

    /// Save new template content.
    ///
    /// The write is a compare-and-swap on the version read at the start;
    /// on a lost race the current row is re-read and the save retried.
    pub async fn save(
        &self,
        html_content: &str,
        author_id: &str,
        author_name: &str,
        change_description: Option<&str>,
    ) -> ApiResult<Template> {
        for attempt in 1..=MAX_SAVE_ATTEMPTS {
            let current = self.template_repo.get_current_template().await?;
            let expected_version = current.as_ref().map(|t| t.version);

            let (snapshot, next) = match &current {
                Some(current) => {
                    let summary = summarize(&current.html_content, html_content);
                    let description =
                        combine_change_description(change_description, Some(&summary));
                    (
                        Some(TemplateVersion::snapshot_of(current, description)),
                        current.next_revision(
                            html_content.to_string(),
                            author_id.to_string(),
                            author_name.to_string(),
                        ),
                    )
                }
                None => (
                    None,
                    Template::initial(
                        html_content.to_string(),
                        author_id.to_string(),
                        author_name.to_string(),
                    ),
                ),
            };

            let committed = self
                .template_repo
                .commit_template_save(expected_version, snapshot.as_ref(), &next)
                .await?;

            if committed {
                metrics::counter!(TEMPLATE_SAVES_TOTAL).increment(1);
                tracing::info!(
                    "Template saved as version {} by {} ({})",
                    next.version,
                    author_name,
                    author_id
                );
                self.prune_history().await;
                return Ok(next);
            }

            metrics::counter!(TEMPLATE_SAVE_CONFLICTS_TOTAL).increment(1);
            tracing::warn!(
                "Template changed during save (expected version {:?}, attempt {}/{})",
                expected_version,
                attempt,
                MAX_SAVE_ATTEMPTS
            );
        }

        Err(ApiError::Conflict(
            "Template was modified concurrently, please retry".to_string(),
        ))
    }

    /// Save the built-in default template as a new version
    pub async fn reset(&self, author_id: &str, author_name: &str) -> ApiResult<Template> {
        self.save(
            DEFAULT_TEMPLATE_HTML,
            author_id,
            author_name,
            Some(RESET_DESCRIPTION),
        )
        .await
    }

    /// History, newest version number first
    pub async fn list_versions(&self, limit: i64) -> ApiResult<Vec<TemplateVersion>> {
        self.template_repo
            .list_template_versions(limit.max(0))
            .await
    }

    pub async fn get_version(&self, version_id: &str) -> ApiResult<TemplateVersion> {
        self.template_repo
            .get_template_version(version_id)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("Template version {} not found", version_id)))
    }

    /// Save the content of an old snapshot as a new forward version
    pub async fn revert_to(
        &self,
        version_id: &str,
        author_id: &str,
        author_name: &str,
    ) -> ApiResult<Template> {
        let version = self.get_version(version_id).await?;
        let description = format!("Restored version #{}", version.version_number);

        let template = self
            .save(&version.html_content, author_id, author_name, Some(&description))
            .await?;

        metrics::counter!(TEMPLATE_REVERTS_TOTAL).increment(1);
        tracing::info!(
            "Template reverted to snapshot of version {} (now version {})",
            version.version_number,
            template.version
        );
        Ok(template)
    }

    /// True when a saved template exists and differs from the default
    pub async fn is_customized(&self) -> ApiResult<bool> {
        Ok(self.get().await?.map(|t| !t.is_default()).unwrap_or(false))
    }

    /// Word diff from a snapshot to the current content
    pub async fn compare_with_current(&self, version_id: &str) -> ApiResult<TemplateDiffResponse> {
        let version = self.get_version(version_id).await?;
        let current = self.effective_html().await?;
        Ok(TemplateDiffResponse::between(&version.html_content, &current))
    }

    /// Failures are logged only; the next save prunes again.
    async fn prune_history(&self) {
        match self
            .template_repo
            .prune_template_versions(self.max_versions as i64)
            .await
        {
            Ok(0) => {}
            Ok(deleted) => {
                metrics::counter!(TEMPLATE_VERSIONS_PRUNED_TOTAL).increment(deleted);
                tracing::debug!("Pruned {} old template versions", deleted);
            }
            Err(e) => {
                tracing::warn!("Failed to prune template history: {}", e);
            }
        }
    }
}
