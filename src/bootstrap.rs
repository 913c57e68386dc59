use crate::application::services::{TemplateCache, TemplateService};
use crate::config::Config;
use crate::domain::ports::template_repository::TemplateRepository;
use crate::infrastructure::http::middleware::AppState;
use std::sync::Arc;

/// Wire the template store, service and cache.
///
/// The cache is warmed here; if the store cannot be read the service
/// still starts and serves the default template until the next write.
pub async fn build_app_state(
    template_repo: Arc<dyn TemplateRepository>,
    config: &Config,
) -> AppState {
    let template_service = TemplateService::new(template_repo, config.max_template_versions);
    tracing::info!(
        "Template service initialized (history bound: {} versions)",
        config.max_template_versions
    );

    let template_cache = Arc::new(TemplateCache::new());
    if template_cache.load(&template_service).await {
        match template_cache.meta() {
            Some(meta) => tracing::info!("Template cache loaded at version {}", meta.version),
            None => tracing::info!("No saved template yet, serving the default"),
        }
    } else {
        tracing::warn!("Template cache not loaded, serving the default template");
    }

    AppState {
        template_service,
        template_cache,
    }
}
