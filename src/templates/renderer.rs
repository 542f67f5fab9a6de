//! Template renderer capability and the static fallback page.

use std::fmt::Write;

use serde::Serialize;

/// Values an error page template can reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageContext {
    pub title: String,
    pub status: u16,
    pub message: Option<String>,
    pub request_id: Option<String>,
}

/// Error produced while rendering a template.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("template `{0}` not found")]
    MissingTemplate(String),

    #[error("template `{template}` references unknown placeholder `{placeholder}`")]
    UnknownPlaceholder { template: String, placeholder: String },

    #[error("template `{template}` has an unterminated tag at byte {offset}")]
    UnterminatedTag { template: String, offset: usize },

    #[error("failed to write rendered output")]
    Write(#[from] std::fmt::Error),
}

/// Renders a named template into `out`.
///
/// On error, `out` may hold partial output; callers discard it.
pub trait TemplateRenderer: Send + Sync {
    fn render(&self, out: &mut String, template: &str, page: &PageContext) -> Result<(), RenderError>;
}

/// Minimal page written when no template could be rendered.
pub fn fallback_page(page: &PageContext) -> String {
    let heading = format!("{} {}", page.status, escape_html(&page.title));
    let mut body = String::with_capacity(256);
    body.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head><meta charset=\"utf-8\"><title>");
    body.push_str(&heading);
    body.push_str("</title></head>\n<body>\n<h1>");
    body.push_str(&heading);
    body.push_str("</h1>\n");
    if let Some(message) = &page.message {
        let _ = writeln!(body, "<p>{}</p>", escape_html(message));
    }
    if let Some(id) = &page.request_id {
        let _ = writeln!(body, "<p><small>Request ID: {}</small></p>", escape_html(id));
    }
    body.push_str("</body>\n</html>\n");
    body
}

/// Escape text for inclusion in HTML element content or attribute values.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page() -> PageContext {
        PageContext {
            title: "Forbidden".into(),
            status: 403,
            message: Some("No <access> here".into()),
            request_id: None,
        }
    }

    #[test]
    fn test_fallback_page() {
        let body = fallback_page(&page());
        assert!(body.starts_with("<!DOCTYPE html>"));
        assert!(body.contains("<h1>403 Forbidden</h1>"));
        assert!(body.contains("No &lt;access&gt; here"));
        assert!(!body.contains("Request ID"));
    }

    #[test]
    fn test_fallback_includes_request_id() {
        let mut page = page();
        page.request_id = Some("req-1".into());
        assert!(fallback_page(&page).contains("Request ID: req-1"));
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html(r#"<a href="x">'&'</a>"#), "&lt;a href=&quot;x&quot;&gt;&#39;&amp;&#39;&lt;/a&gt;");
        assert_eq!(escape_html("plain"), "plain");
    }
}
