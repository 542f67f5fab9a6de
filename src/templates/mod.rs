//! Error page templates.
//!
//! # Data Flow
//! ```text
//! startup:  templates dir → store.rs (load once) → Arc<dyn TemplateRenderer>
//! request:  responder → renderer.render(name, PageContext)
//!               └─ failure / no renderer → renderer::fallback_page
//! ```

pub mod renderer;
pub mod store;

pub use renderer::{fallback_page, PageContext, RenderError, TemplateRenderer};
pub use store::{TemplateLoadError, TemplateStore};
