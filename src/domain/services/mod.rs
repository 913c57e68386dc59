pub mod change_summary;
pub mod diff;
pub mod sanitizer;
pub mod template_renderer;
pub mod text;

pub use change_summary::*;
pub use diff::*;
pub use sanitizer::*;
pub use template_renderer::*;
pub use text::*;
