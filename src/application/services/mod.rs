pub mod template_cache;
pub mod template_service;

pub use template_cache::*;
pub use template_service::*;
