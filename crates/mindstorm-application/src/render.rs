//! Renders a mindmap outline into a standalone HTML document.
//!
//! The page embeds the markdown outline in a `text/template` block and lets
//! markmap (loaded from a CDN) draw the interactive map in the browser. No
//! server is needed to view the file.

use minijinja::{Environment, context};
use once_cell::sync::Lazy;

use mindstorm_core::error::{MindstormError, Result};

const TEMPLATE_NAME: &str = "mindmap.html";

static TEMPLATES: Lazy<Environment<'static>> = Lazy::new(|| {
    let mut env = Environment::new();
    env.add_template(TEMPLATE_NAME, include_str!("../templates/mindmap.html"))
        .expect("embedded mindmap template is valid");
    env
});

/// Everything the HTML page shows besides the map itself.
pub struct RenderContext<'a> {
    pub topic: &'a str,
    pub summary: Option<&'a str>,
    /// Markdown outline, inserted verbatim into the markmap block.
    pub markdown: &'a str,
    pub idea_count: usize,
    pub category_count: usize,
    pub model: &'a str,
    /// Preformatted timestamp for the generation stamp.
    pub generated_at: &'a str,
}

/// Stateless renderer around the embedded template.
///
/// Header fields (topic, summary) are HTML-escaped; the markdown outline is
/// passed through unescaped so markmap sees the text as written.
#[derive(Debug, Default)]
pub struct HtmlRenderer;

impl HtmlRenderer {
    pub fn new() -> Self {
        Self
    }

    pub fn render(&self, ctx: &RenderContext<'_>) -> Result<String> {
        let template = TEMPLATES
            .get_template(TEMPLATE_NAME)
            .map_err(|err| MindstormError::render_failed(format!("template missing: {err}")))?;
        template
            .render(context! {
                topic => ctx.topic,
                summary => ctx.summary,
                markdown => ctx.markdown,
                idea_count => ctx.idea_count,
                category_count => ctx.category_count,
                model => ctx.model,
                generated_at => ctx.generated_at,
            })
            .map_err(|err| MindstormError::render_failed(format!("template render failed: {err}")))
    }
}
