use crate::domain::entities::{Template, TemplateVersion};
use crate::infrastructure::http::middleware::error::ApiResult;
use async_trait::async_trait;

/// Persistence collaborator for the singleton template and its history.
#[async_trait]
pub trait TemplateRepository: Send + Sync {
    /// Read the singleton template, `None` if it was never saved.
    async fn get_current_template(&self) -> ApiResult<Option<Template>>;

    /// Insert `snapshot` (if any) and upsert `template` in one atomic step.
    ///
    /// The write only happens when the stored version equals
    /// `expected_version` (`None` means no row may exist yet). Returns
    /// `false` when another writer got there first.
    async fn commit_template_save(
        &self,
        expected_version: Option<i64>,
        snapshot: Option<&TemplateVersion>,
        template: &Template,
    ) -> ApiResult<bool>;

    /// Snapshots ordered by `version_number` descending.
    async fn list_template_versions(&self, limit: i64) -> ApiResult<Vec<TemplateVersion>>;

    async fn get_template_version(&self, id: &str) -> ApiResult<Option<TemplateVersion>>;

    /// Delete every snapshot beyond the `keep` most recent by version number.
    /// Returns the number of deleted rows.
    async fn prune_template_versions(&self, keep: i64) -> ApiResult<u64>;
}
