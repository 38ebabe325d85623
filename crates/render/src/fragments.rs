//! Pieces of a document handed to the diagram and math renderers.

use serde::Serialize;

const MATH_ENVIRONMENTS: &[&str] = &["align", "equation", "eqnarray", "gather", "multline"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FragmentKind {
    Diagram,
    BlockMath,
    InlineMath,
}

impl FragmentKind {
    pub fn is_block(self) -> bool {
        !matches!(self, FragmentKind::InlineMath)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    pub kind: FragmentKind,
    pub source: String,
}

impl Fragment {
    pub fn new(kind: FragmentKind, source: impl Into<String>) -> Self {
        Self {
            kind,
            source: source.into(),
        }
    }
}

/// Fenced code info strings such as `mermaid` or `mermaid title="x"`.
pub fn is_mermaid(info: &str) -> bool {
    info.split_whitespace().next() == Some("mermaid")
}

/// Returns the TeX when a paragraph's raw source is exactly one
/// `\begin{env}..\end{env}` block of a display-math environment (starred
/// forms included).
pub fn math_environment(raw: &str) -> Option<&str> {
    let tex = raw.trim();
    let rest = tex.strip_prefix("\\begin{")?;
    let name = &rest[..rest.find('}')?];
    let base = name.strip_suffix('*').unwrap_or(name);
    if !MATH_ENVIRONMENTS.contains(&base) {
        return None;
    }
    tex.ends_with(&format!("\\end{{{name}}}")).then_some(tex)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mermaid_info_strings() {
        assert!(is_mermaid("mermaid"));
        assert!(is_mermaid("mermaid title=flow"));
        assert!(!is_mermaid("rust"));
        assert!(!is_mermaid("mermaidish"));
        assert!(!is_mermaid(""));
    }

    #[test]
    fn environments() {
        let tex = "\\begin{align*}\nx &= 1 \\\\\ny &= 2\n\\end{align*}";
        assert_eq!(math_environment(&format!("{tex}\n")), Some(tex));
        assert_eq!(
            math_environment("\\begin{equation} E = mc^2 \\end{equation}"),
            Some("\\begin{equation} E = mc^2 \\end{equation}")
        );
        assert_eq!(math_environment("\\begin{itemize}\n\\end{itemize}"), None);
        assert_eq!(math_environment("\\begin{align}\nx\n\\end{gather}"), None);
        assert_eq!(math_environment("see \\begin{align} x \\end{align}"), None);
    }
}
