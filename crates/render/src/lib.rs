//! Renderer abstractions for proposal documents: markdown to HTML with
//! diagrams and math handed to pluggable renderers.

use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

pub mod document;
pub mod fragments;
pub mod passthrough;

pub use document::{DocumentRenderer, RenderFailure, RenderedDocument};
pub use fragments::{Fragment, FragmentKind};
pub use passthrough::PassthroughRenderer;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    #[error("empty {0} source")]
    Empty(&'static str),
    #[error("syntax error: {0}")]
    Syntax(String),
    #[error("renderer failed: {0}")]
    Failed(String),
    #[error("unknown renderer: {0}")]
    UnknownRenderer(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MathDisplay {
    Inline,
    Block,
}

#[async_trait::async_trait]
pub trait DiagramRenderer: Send + Sync {
    /// Renders one mermaid diagram to an HTML fragment.
    async fn render_diagram(&self, source: &str) -> Result<String, RenderError>;
}

#[async_trait::async_trait]
pub trait MathRenderer: Send + Sync {
    /// Renders one TeX expression (without `$` delimiters) to HTML.
    async fn render_math(&self, source: &str, display: MathDisplay) -> Result<String, RenderError>;
}

#[derive(Default, Clone)]
pub struct RendererRegistry {
    diagrams: HashMap<String, Arc<dyn DiagramRenderer>>,
    math: HashMap<String, Arc<dyn MathRenderer>>,
}

impl RendererRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in passthrough renderers under `"passthrough"`.
    pub fn with_defaults() -> Self {
        let passthrough = Arc::new(PassthroughRenderer);
        Self::new()
            .with_diagram("passthrough", passthrough.clone())
            .with_math("passthrough", passthrough)
    }

    pub fn with_diagram(mut self, name: &str, renderer: Arc<dyn DiagramRenderer>) -> Self {
        self.diagrams.insert(name.to_string(), renderer);
        self
    }

    pub fn with_math(mut self, name: &str, renderer: Arc<dyn MathRenderer>) -> Self {
        self.math.insert(name.to_string(), renderer);
        self
    }

    pub fn diagram(&self, name: &str) -> Result<Arc<dyn DiagramRenderer>, RenderError> {
        self.diagrams
            .get(name)
            .cloned()
            .ok_or_else(|| RenderError::UnknownRenderer(name.to_string()))
    }

    pub fn math(&self, name: &str) -> Result<Arc<dyn MathRenderer>, RenderError> {
        self.math
            .get(name)
            .cloned()
            .ok_or_else(|| RenderError::UnknownRenderer(name.to_string()))
    }
}

/// Escapes text for inclusion in HTML element content or attributes.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
