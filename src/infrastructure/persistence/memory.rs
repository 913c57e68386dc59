use crate::domain::entities::{Template, TemplateVersion};
use crate::domain::ports::template_repository::TemplateRepository;
use crate::infrastructure::http::middleware::error::{ApiError, ApiResult};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;

#[derive(Debug, Default)]
struct MemoryState {
    current: Option<Template>,
    versions: Vec<TemplateVersion>,
}

/// Template store kept in process memory.
///
/// Can be switched into failure modes to exercise the error paths of its
/// callers: `unavailable` fails every call, `conflicting` makes every
/// commit lose its version check.
#[derive(Debug, Default)]
pub struct InMemoryTemplateRepository {
    state: Mutex<MemoryState>,
    unavailable: AtomicBool,
    conflicting: AtomicBool,
}

impl InMemoryTemplateRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn set_conflicting(&self, conflicting: bool) {
        self.conflicting.store(conflicting, Ordering::SeqCst);
    }

    fn check_available(&self) -> ApiResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(ApiError::Internal("Template store unavailable".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl TemplateRepository for InMemoryTemplateRepository {
    async fn get_current_template(&self) -> ApiResult<Option<Template>> {
        self.check_available()?;
        Ok(self.state.lock().await.current.clone())
    }

    async fn commit_template_save(
        &self,
        expected_version: Option<i64>,
        snapshot: Option<&TemplateVersion>,
        template: &Template,
    ) -> ApiResult<bool> {
        self.check_available()?;
        let mut state = self.state.lock().await;

        let stored_version = state.current.as_ref().map(|t| t.version);
        if self.conflicting.load(Ordering::SeqCst) || stored_version != expected_version {
            return Ok(false);
        }

        if let Some(snapshot) = snapshot {
            state.versions.push(snapshot.clone());
        }
        state.current = Some(template.clone());
        Ok(true)
    }

    async fn list_template_versions(&self, limit: i64) -> ApiResult<Vec<TemplateVersion>> {
        self.check_available()?;
        let state = self.state.lock().await;

        let mut versions = state.versions.clone();
        versions.sort_by(|a, b| b.version_number.cmp(&a.version_number));
        versions.truncate(limit.max(0) as usize);
        Ok(versions)
    }

    async fn get_template_version(&self, id: &str) -> ApiResult<Option<TemplateVersion>> {
        self.check_available()?;
        let state = self.state.lock().await;
        Ok(state.versions.iter().find(|v| v.id == id).cloned())
    }

    async fn prune_template_versions(&self, keep: i64) -> ApiResult<u64> {
        self.check_available()?;
        let mut state = self.state.lock().await;

        let before = state.versions.len();
        state
            .versions
            .sort_by(|a, b| b.version_number.cmp(&a.version_number));
        state.versions.truncate(keep.max(0) as usize);
        Ok((before - state.versions.len()) as u64)
    }
}
