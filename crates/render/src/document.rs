use crate::fragments::{self, Fragment, FragmentKind};
use crate::{
    escape_html, DiagramRenderer, MathDisplay, MathRenderer, PassthroughRenderer, RenderError,
    RendererRegistry,
};
use pulldown_cmark::{html, CodeBlockKind, Event, Options, Parser, Tag, TagEnd};
use serde::Serialize;
use std::ops::Range;
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderFailure {
    pub kind: FragmentKind,
    pub source: String,
    pub error: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RenderedDocument {
    pub html: String,
    pub failures: Vec<RenderFailure>,
}

impl RenderedDocument {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Markdown to HTML. Diagram and math fragments go through their renderers
/// one at a time; a failing fragment is replaced by an error indicator and
/// the rest of the document still renders.
#[derive(Clone)]
pub struct DocumentRenderer {
    diagrams: Arc<dyn DiagramRenderer>,
    math: Arc<dyn MathRenderer>,
}

impl Default for DocumentRenderer {
    fn default() -> Self {
        Self::passthrough()
    }
}

impl DocumentRenderer {
    pub fn new(diagrams: Arc<dyn DiagramRenderer>, math: Arc<dyn MathRenderer>) -> Self {
        Self { diagrams, math }
    }

    pub fn passthrough() -> Self {
        let renderer = Arc::new(PassthroughRenderer);
        Self::new(renderer.clone(), renderer)
    }

    pub fn from_registry(
        registry: &RendererRegistry,
        diagram: &str,
        math: &str,
    ) -> Result<Self, RenderError> {
        Ok(Self::new(registry.diagram(diagram)?, registry.math(math)?))
    }

    pub async fn render(&self, markdown: &str) -> RenderedDocument {
        let events: Vec<(Event<'_>, Range<usize>)> = Parser::new_ext(markdown, markdown_options())
            .into_offset_iter()
            .collect();
        let mut out: Vec<Event<'_>> = Vec::with_capacity(events.len());
        let mut failures = Vec::new();
        let mut rendered = 0usize;

        let mut i = 0;
        while i < events.len() {
            let (event, range) = &events[i];
            match event {
                Event::Start(Tag::CodeBlock(CodeBlockKind::Fenced(info)))
                    if fragments::is_mermaid(info) =>
                {
                    let end = closing(&events, i, |e| matches!(e, Event::End(TagEnd::CodeBlock)));
                    let source: String = events[i + 1..end]
                        .iter()
                        .filter_map(|(e, _)| match e {
                            Event::Text(text) => Some(&**text),
                            _ => None,
                        })
                        .collect();
                    let fragment = Fragment::new(FragmentKind::Diagram, source.trim_end());
                    let html = self.fragment_html(&fragment, &mut failures).await;
                    out.push(Event::Html(html.into()));
                    rendered += 1;
                    i = end;
                }
                Event::Start(Tag::Paragraph) => {
                    let end = closing(&events, i, |e| matches!(e, Event::End(TagEnd::Paragraph)));
                    // A paragraph that is nothing but display math becomes a
                    // block of its own rather than a div inside <p>.
                    let lone_display = match &events[i + 1..end] {
                        [(Event::DisplayMath(tex), _)] => Some(&**tex),
                        _ => None,
                    };
                    match fragments::math_environment(&markdown[range.clone()]).or(lone_display) {
                        Some(tex) => {
                            let fragment = Fragment::new(FragmentKind::BlockMath, tex);
                            let html = self.fragment_html(&fragment, &mut failures).await;
                            out.push(Event::Html(html.into()));
                            rendered += 1;
                            i = end;
                        }
                        None => out.push(event.clone()),
                    }
                }
                Event::InlineMath(tex) => {
                    let fragment = Fragment::new(FragmentKind::InlineMath, &**tex);
                    let html = self.fragment_html(&fragment, &mut failures).await;
                    out.push(Event::InlineHtml(html.into()));
                    rendered += 1;
                }
                Event::DisplayMath(tex) => {
                    let fragment = Fragment::new(FragmentKind::BlockMath, &**tex);
                    let html = self.fragment_html(&fragment, &mut failures).await;
                    out.push(Event::InlineHtml(html.into()));
                    rendered += 1;
                }
                other => out.push(other.clone()),
            }
            i += 1;
        }

        let mut body = String::with_capacity(markdown.len() * 3 / 2);
        html::push_html(&mut body, out.into_iter());
        debug!(fragments = rendered, failures = failures.len(), "rendered document");
        RenderedDocument {
            html: body,
            failures,
        }
    }

    async fn fragment_html(&self, fragment: &Fragment, failures: &mut Vec<RenderFailure>) -> String {
        match self.render_fragment(fragment).await {
            Ok(html) => html,
            Err(err) => {
                warn!(kind = ?fragment.kind, error = %err, "fragment failed to render");
                let placeholder = error_placeholder(fragment, &err);
                failures.push(RenderFailure {
                    kind: fragment.kind,
                    source: fragment.source.clone(),
                    error: err.to_string(),
                });
                placeholder
            }
        }
    }

    async fn render_fragment(&self, fragment: &Fragment) -> Result<String, RenderError> {
        match fragment.kind {
            FragmentKind::Diagram => self.diagrams.render_diagram(&fragment.source).await,
            FragmentKind::BlockMath => {
                self.math
                    .render_math(&fragment.source, MathDisplay::Block)
                    .await
            }
            FragmentKind::InlineMath => {
                self.math
                    .render_math(&fragment.source, MathDisplay::Inline)
                    .await
            }
        }
    }
}

fn markdown_options() -> Options {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);
    options.insert(Options::ENABLE_MATH);
    options
}

/// Index of the first event after `start` matching `is_end`, or the end of
/// the stream.
fn closing(
    events: &[(Event<'_>, Range<usize>)],
    start: usize,
    is_end: impl Fn(&Event<'_>) -> bool,
) -> usize {
    events[start + 1..]
        .iter()
        .position(|(e, _)| is_end(e))
        .map(|offset| start + 1 + offset)
        .unwrap_or(events.len())
}

fn error_placeholder(fragment: &Fragment, err: &RenderError) -> String {
    let tag = if fragment.kind.is_block() { "div" } else { "span" };
    format!(
        "<{tag} class=\"render-error\" title=\"{}\"><code>{}</code></{tag}>",
        escape_html(&err.to_string()),
        escape_html(&fragment.source)
    )
}
