use crate::{escape_html, DiagramRenderer, MathDisplay, MathRenderer, RenderError};

/// Emits markup for client-side mermaid/KaTeX after a structural check of
/// the source.
#[derive(Debug, Default, Clone, Copy)]
pub struct PassthroughRenderer;

#[async_trait::async_trait]
impl DiagramRenderer for PassthroughRenderer {
    async fn render_diagram(&self, source: &str) -> Result<String, RenderError> {
        let source = source.trim();
        if source.is_empty() {
            return Err(RenderError::Empty("diagram"));
        }
        Ok(format!("<pre class=\"mermaid\">{}</pre>", escape_html(source)))
    }
}

#[async_trait::async_trait]
impl MathRenderer for PassthroughRenderer {
    async fn render_math(&self, source: &str, display: MathDisplay) -> Result<String, RenderError> {
        let source = source.trim();
        if source.is_empty() {
            return Err(RenderError::Empty("math"));
        }
        check_tex(source)?;
        let escaped = escape_html(source);
        Ok(match display {
            MathDisplay::Inline => format!("<span class=\"math math-inline\">\\({escaped}\\)</span>"),
            MathDisplay::Block => format!("<div class=\"math math-display\">\\[{escaped}\\]</div>"),
        })
    }
}

/// Brace balance and `\begin`/`\end` pairing.
fn check_tex(source: &str) -> Result<(), RenderError> {
    let mut depth: i64 = 0;
    let mut escaped = false;
    for c in source.chars() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth < 0 {
                    return Err(RenderError::Syntax("unexpected '}'".to_string()));
                }
            }
            _ => {}
        }
    }
    if depth != 0 {
        return Err(RenderError::Syntax("unclosed '{'".to_string()));
    }

    let mut envs: Vec<&str> = Vec::new();
    let mut rest = source;
    while let Some(pos) = rest.find('\\') {
        rest = &rest[pos + 1..];
        let (is_begin, tail) = if let Some(t) = rest.strip_prefix("begin{") {
            (true, t)
        } else if let Some(t) = rest.strip_prefix("end{") {
            (false, t)
        } else {
            continue;
        };
        let close = tail
            .find('}')
            .ok_or_else(|| RenderError::Syntax("unterminated environment name".to_string()))?;
        let name = &tail[..close];
        if is_begin {
            envs.push(name);
        } else if envs.pop() != Some(name) {
            return Err(RenderError::Syntax(format!("mismatched \\end{{{name}}}")));
        }
        rest = &tail[close..];
    }
    match envs.last() {
        Some(open) => Err(RenderError::Syntax(format!("unclosed \\begin{{{open}}}"))),
        None => Ok(()),
    }
}
