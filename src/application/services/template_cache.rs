use crate::application::services::template_service::TemplateService;
use crate::domain::entities::{Template, DEFAULT_TEMPLATE_HTML};
use crate::infrastructure::http::middleware::error::ApiResult;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Metadata of the last template version the cache saw from the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateMeta {
    pub version: i64,
    pub updated_at: String,
    pub updated_by: String,
    pub updated_by_name: String,
}

impl From<&Template> for TemplateMeta {
    fn from(t: &Template) -> Self {
        Self {
            version: t.version,
            updated_at: t.updated_at.clone(),
            updated_by: t.updated_by.clone(),
            updated_by_name: t.updated_by_name.clone(),
        }
    }
}

#[derive(Debug)]
struct CacheState {
    html: String,
    meta: Option<TemplateMeta>,
    loaded: bool,
    pending_local: bool,
}

impl Default for CacheState {
    fn default() -> Self {
        Self {
            html: DEFAULT_TEMPLATE_HTML.to_string(),
            meta: None,
            loaded: false,
            pending_local: false,
        }
    }
}

/// In-memory copy of the current template for synchronous readers.
///
/// The store is the source of truth. The copy is refreshed by [`load`],
/// replaced after every successful write, and runs ahead of the store
/// only between [`apply_locally`] and [`persist`]. A failed `persist`
/// keeps the local value; call `load` to discard it. Until the first
/// successful load the default template is served.
///
/// [`load`]: TemplateCache::load
/// [`apply_locally`]: TemplateCache::apply_locally
/// [`persist`]: TemplateCache::persist
#[derive(Debug, Default)]
pub struct TemplateCache {
    state: RwLock<CacheState>,
}

impl TemplateCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, CacheState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, CacheState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Refresh from the store. Returns `false` when the store could not be
    /// read, in which case the previous copy (or the default) stays.
    pub async fn load(&self, service: &TemplateService) -> bool {
        match service.get().await {
            Ok(Some(template)) => {
                self.store(&template);
                true
            }
            Ok(None) => {
                let mut state = self.write();
                *state = CacheState {
                    loaded: true,
                    ..CacheState::default()
                };
                true
            }
            Err(e) => {
                tracing::error!("Failed to load template into cache: {}", e);
                false
            }
        }
    }

    pub fn get(&self) -> String {
        self.read().html.clone()
    }

    pub fn meta(&self) -> Option<TemplateMeta> {
        self.read().meta.clone()
    }

    pub fn is_loaded(&self) -> bool {
        self.read().loaded
    }

    /// Local content not yet confirmed by the store
    pub fn has_pending_changes(&self) -> bool {
        self.read().pending_local
    }

    /// Forget everything; readers get the default until the next `load`
    pub fn invalidate(&self) {
        *self.write() = CacheState::default();
    }

    /// Optimistic local update, visible to `get` immediately
    pub fn apply_locally(&self, html: &str) {
        let mut state = self.write();
        state.html = html.to_string();
        state.pending_local = true;
    }

    /// Take over a template the store just confirmed
    pub fn store(&self, template: &Template) {
        let mut state = self.write();
        state.html = template.html_content.clone();
        state.meta = Some(TemplateMeta::from(template));
        state.loaded = true;
        state.pending_local = false;
    }

    /// Save `html` through the service and update the copy on success.
    ///
    /// A newer local edit made while the save was in flight is kept.
    pub async fn persist(
        &self,
        service: &TemplateService,
        html: &str,
        author_id: &str,
        author_name: &str,
        change_description: Option<&str>,
    ) -> ApiResult<Template> {
        let template = service
            .save(html, author_id, author_name, change_description)
            .await?;
        self.confirm(&template);
        Ok(template)
    }

    /// Take over a template this process just wrote through the service.
    ///
    /// Unlike [`store`](TemplateCache::store), a pending local edit that
    /// differs from the written content is kept.
    pub fn confirm(&self, template: &Template) {
        let mut state = self.write();
        if !state.pending_local || state.html == template.html_content {
            state.html = template.html_content.clone();
            state.pending_local = false;
        }
        state.meta = Some(TemplateMeta::from(template));
        state.loaded = true;
    }
}
