pub mod error;

pub use error::*;

use crate::application::services::{TemplateCache, TemplateService};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub template_service: TemplateService,
    pub template_cache: Arc<TemplateCache>,
}
