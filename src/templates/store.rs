//! File-backed error page templates.
//!
//! # Responsibilities
//! - Load `<name>.<ext>` files from a directory at startup
//! - Render a template by substituting `{{ placeholder }}` tags
//!
//! # Design Decisions
//! - Templates are read once; a changed file needs a restart
//! - Only four placeholders exist: `title`, `status`, `message`,
//!   `request_id`. Anything else is a render error, not silent output
//! - Substituted values are HTML-escaped

use std::collections::HashMap;
use std::fmt::Write;
use std::fs;
use std::path::{Path, PathBuf};

use crate::templates::renderer::{escape_html, PageContext, RenderError, TemplateRenderer};

/// Error type for template loading.
#[derive(Debug, thiserror::Error)]
pub enum TemplateLoadError {
    #[error("template directory `{0}` does not exist or is not a directory")]
    NotADirectory(PathBuf),

    #[error("failed to read template `{path}`: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// In-memory set of named templates.
#[derive(Debug, Clone, Default)]
pub struct TemplateStore {
    templates: HashMap<String, String>,
}

impl TemplateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every file in `dir` whose extension is `extension`.
    ///
    /// The template name is the file stem (`forbidden.html` → `forbidden`).
    pub fn load_dir(dir: &Path, extension: &str) -> Result<Self, TemplateLoadError> {
        if !dir.is_dir() {
            return Err(TemplateLoadError::NotADirectory(dir.to_path_buf()));
        }

        let io_err = |path: &Path| {
            let path = path.to_path_buf();
            move |source| TemplateLoadError::Io { path, source }
        };

        let mut store = Self::new();
        for entry in fs::read_dir(dir).map_err(io_err(dir))? {
            let path = entry.map_err(io_err(dir))?.path();
            if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some(extension) {
                continue;
            }
            let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let source = fs::read_to_string(&path).map_err(io_err(&path))?;
            store.insert(name, source);
        }

        tracing::info!(
            directory = %dir.display(),
            count = store.len(),
            "Loaded error page templates"
        );
        Ok(store)
    }

    pub fn insert(&mut self, name: impl Into<String>, source: impl Into<String>) {
        self.templates.insert(name.into(), source.into());
    }

    pub fn with_template(mut self, name: impl Into<String>, source: impl Into<String>) -> Self {
        self.insert(name, source);
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.templates.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

impl TemplateRenderer for TemplateStore {
    fn render(&self, out: &mut String, template: &str, page: &PageContext) -> Result<(), RenderError> {
        let source = self
            .templates
            .get(template)
            .ok_or_else(|| RenderError::MissingTemplate(template.to_string()))?;
        substitute(out, template, source, page)
    }
}

fn substitute(out: &mut String, template: &str, source: &str, page: &PageContext) -> Result<(), RenderError> {
    let mut rest = source;
    let mut offset = 0;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after_open = &rest[start + 2..];
        let end = after_open.find("}}").ok_or(RenderError::UnterminatedTag {
            template: template.to_string(),
            offset: offset + start,
        })?;

        match after_open[..end].trim() {
            "title" => out.push_str(&escape_html(&page.title)),
            "status" => write!(out, "{}", page.status)?,
            "message" => out.push_str(&escape_html(page.message.as_deref().unwrap_or_default())),
            "request_id" => out.push_str(&escape_html(page.request_id.as_deref().unwrap_or_default())),
            other => {
                return Err(RenderError::UnknownPlaceholder {
                    template: template.to_string(),
                    placeholder: other.to_string(),
                })
            }
        }

        let consumed = start + 2 + end + 2;
        offset += consumed;
        rest = &rest[consumed..];
    }

    out.push_str(rest);
    Ok(())
}
