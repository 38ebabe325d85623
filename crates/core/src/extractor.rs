//! Turns raw proposal text into [`ProposalRecord`]s.

use crate::classifier::{self, ClassificationInput};
use crate::config::AppConfig;
use crate::error::ExtractError;
use crate::metadata::{self, Field};
use crate::models::{ProposalRecord, RawDocument};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

pub const PROPOSAL_FILE: &str = "README.md";
const ELLIPSIS: &str = "...";

static ID_SEGMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:^|/)(\d+)-[^/]+/README\.md$").expect("valid id segment pattern")
});
static ABSTRACT_HEADING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^#{1,6}\s*abstract\s*#*\s*$").expect("valid heading pattern"));

/// Extraction with a fixed configuration.
#[derive(Debug, Clone)]
pub struct Extractor {
    config: AppConfig,
}

impl Default for Extractor {
    fn default() -> Self {
        Self::new(AppConfig::default())
    }
}

impl Extractor {
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    /// Extracts one record. Rejections are logged and turn into `None`.
    pub fn extract(&self, doc: &RawDocument) -> Option<ProposalRecord> {
        match self.try_extract(doc) {
            Ok(record) => Some(record),
            Err(err) => {
                warn!(path = %doc.path, reason = %err, "skipping proposal");
                None
            }
        }
    }

    pub fn try_extract(&self, doc: &RawDocument) -> Result<ProposalRecord, ExtractError> {
        let id = extract_id(&doc.path).ok_or_else(|| ExtractError::MissingId(doc.path.clone()))?;
        let table = metadata::scan_table(&doc.text).ok_or(ExtractError::MissingTable)?;
        let title = table
            .title
            .ok_or(ExtractError::MissingField(Field::Title.label()))?;
        let status = table
            .status
            .ok_or(ExtractError::MissingField(Field::Status.label()))?;
        let track = table
            .track
            .ok_or(ExtractError::MissingField(Field::Track.label()))?;

        let limit = self.config.extraction.abstract_max_chars;
        let summary = abstract_section(&doc.text, limit)
            .or_else(|| first_paragraph_after(&doc.text, table.track_line, limit));

        let input = ClassificationInput::new(&doc.text);
        let classification = &self.config.classification;
        let complexity = classifier::classify_complexity(&input, classification);
        let tags = classifier::derive_tags(
            &doc.text,
            &title,
            &classification.tags,
            classification.max_tags,
        );
        let reading_time_minutes = classifier::reading_time_minutes(
            input.word_count,
            self.config.extraction.words_per_minute,
        );
        debug!(%id, %complexity, words = input.word_count, "extracted proposal");

        Ok(ProposalRecord {
            id,
            title,
            status,
            track,
            authors: table.authors,
            content: doc.text.clone(),
            discussion_link: table.discussion_link,
            summary,
            complexity: Some(complexity),
            tags,
            word_count: input.word_count,
            reading_time_minutes,
            depends_on: table.depends_on,
            replaces: table.replaces,
            superseded_by: table.superseded_by,
        })
    }

    /// Extracts a batch, returning the records and the number rejected.
    pub fn extract_all(&self, docs: &[RawDocument]) -> (Vec<ProposalRecord>, usize) {
        let records: Vec<ProposalRecord> = docs.iter().filter_map(|d| self.extract(d)).collect();
        let rejected = docs.len() - records.len();
        (records, rejected)
    }
}

/// Numeric id from a path such as `ACPs/118-warp-signature-request/README.md`.
pub fn extract_id(path: &str) -> Option<String> {
    let normalized = path.replace('\\', "/");
    ID_SEGMENT
        .captures(&normalized)
        .map(|caps| caps[1].to_string())
}

fn abstract_section(text: &str, limit: usize) -> Option<String> {
    let mut lines = text.lines().skip_while(|l| !ABSTRACT_HEADING.is_match(l.trim()));
    lines.next()?;
    let paragraph: Vec<&str> = lines
        .map(str::trim)
        .skip_while(|l| l.is_empty())
        .take_while(|l| !l.is_empty() && !l.starts_with('#'))
        .collect();
    let joined = paragraph.join(" ");
    let joined = joined.trim();
    if joined.is_empty() {
        None
    } else {
        Some(truncate_at_word(joined, limit))
    }
}

fn first_paragraph_after(text: &str, track_line: Option<usize>, limit: usize) -> Option<String> {
    let start = track_line? + 1;
    text.lines()
        .skip(start)
        .map(str::trim)
        .find(|l| !l.is_empty() && !l.starts_with('|') && !l.starts_with('#'))
        .map(|l| truncate_at_word(l, limit))
}

/// Cuts `text` to at most `limit` characters at a whitespace boundary and
/// appends an ellipsis when anything was dropped.
pub fn truncate_at_word(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    let head: String = text.chars().take(limit + 1).collect();
    let cut = head
        .char_indices()
        .filter(|(_, c)| c.is_whitespace())
        .map(|(i, _)| i)
        .last()
        .unwrap_or_else(|| head.char_indices().nth(limit).map(|(i, _)| i).unwrap_or(head.len()));
    format!("{}{}", head[..cut].trim_end(), ELLIPSIS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Author, Complexity};

    fn proposal(body: &str) -> String {
        format!(
            "\
# ACP-42: Example

| ACP | 42 |
| :--- | :--- |
| **Title** | Example Proposal |
| **Author(s)** | Jane Doe (@janedoe), John Smith |
| **Status** | [Proposed](https://x/status) ([Discussion](https://x/d/42)) |
| **Track** | Standards |
| **Superseded-By** | ACP-500 |

{body}"
        )
    }

    fn doc(body: &str) -> RawDocument {
        RawDocument::new("ACPs/42-example-thing/README.md", proposal(body))
    }

    #[test]
    fn id_from_path() {
        assert_eq!(
            extract_id("/repo/ACPs/42-example-thing/README.md").as_deref(),
            Some("42")
        );
        assert_eq!(
            extract_id("ACPs\\118-warp-signature-request\\README.md").as_deref(),
            Some("118")
        );
        assert_eq!(extract_id("ACPs/example-thing/README.md"), None);
        assert_eq!(extract_id("ACPs/42-example-thing/notes.md"), None);
    }

    #[test]
    fn full_record() {
        let record = Extractor::default()
            .extract(&doc("## Abstract\n\nShort summary of\nthe change.\n\n## Motivation\n"))
            .unwrap();
        assert_eq!(record.id, "42");
        assert_eq!(record.title, "Example Proposal");
        assert_eq!(record.status, "Proposed");
        assert_eq!(record.track, "Standards");
        assert_eq!(
            record.authors,
            vec![
                Author {
                    name: "Jane Doe".into(),
                    handle: "janedoe".into()
                },
                Author {
                    name: "John Smith".into(),
                    handle: "johnsmith".into()
                },
            ]
        );
        assert_eq!(record.discussion_link.as_deref(), Some("https://x/d/42"));
        assert_eq!(record.summary.as_deref(), Some("Short summary of the change."));
        assert_eq!(record.superseded_by, vec!["500"]);
        assert_eq!(record.content, proposal("## Abstract\n\nShort summary of\nthe change.\n\n## Motivation\n"));
        assert_eq!(
            record.reading_time_minutes,
            record.word_count.div_ceil(200)
        );
        assert!(record.tags.len() <= 5);
    }

    #[test]
    fn missing_required_rows_reject() {
        let text = "| ACP | 1 |\n| **Title** | Only title |\n| **Status** | Draft |\n";
        let raw = RawDocument::new("ACPs/1-x/README.md", text);
        assert_eq!(
            Extractor::default().try_extract(&raw),
            Err(ExtractError::MissingField("Track"))
        );
        assert!(Extractor::default().extract(&raw).is_none());
    }

    #[test]
    fn empty_title_cell_rejects() {
        let text = "| ACP | 1 |\n| **Title** |   |\n| **Status** | Draft |\n| **Track** | Meta |\n";
        let raw = RawDocument::new("ACPs/1-x/README.md", text);
        assert_eq!(
            Extractor::default().try_extract(&raw),
            Err(ExtractError::MissingField("Title"))
        );
    }

    #[test]
    fn missing_table_or_id_rejects() {
        let no_table = RawDocument::new("ACPs/7-x/README.md", "# Just prose\n\nNothing else.");
        assert_eq!(
            Extractor::default().try_extract(&no_table),
            Err(ExtractError::MissingTable)
        );
        let no_id = RawDocument::new("drafts/README.md", proposal(""));
        assert!(matches!(
            Extractor::default().try_extract(&no_id),
            Err(ExtractError::MissingId(_))
        ));
    }

    #[test]
    fn abstract_falls_back_to_first_prose_line() {
        let record = Extractor::default()
            .extract(&doc("\nThis proposal changes fees.\n\n## Motivation\n"))
            .unwrap();
        assert_eq!(record.summary.as_deref(), Some("This proposal changes fees."));
    }

    #[test]
    fn abstract_absent_when_nothing_follows() {
        let record = Extractor::default().extract(&doc("## Motivation\n")).unwrap();
        assert_eq!(record.summary, None);
    }

    #[test]
    fn long_abstract_is_cut_on_whitespace() {
        let sentence = "word ".repeat(60);
        let record = Extractor::default()
            .extract(&doc(&format!("## Abstract\n\n{sentence}\n")))
            .unwrap();
        let summary = record.summary.unwrap();
        assert!(summary.ends_with("..."));
        assert!(summary.chars().count() <= 203);
        assert!(!summary.contains("wo..."));
    }

    #[test]
    fn truncate_without_whitespace_is_hard_cut() {
        let text = "x".repeat(250);
        let cut = truncate_at_word(&text, 200);
        assert_eq!(cut.chars().count(), 203);
        assert_eq!(truncate_at_word("short", 200), "short");
    }

    #[test]
    fn word_count_threshold_beats_keywords() {
        let body = "lorem ".repeat(4500);
        let record = Extractor::default().extract(&doc(&body)).unwrap();
        assert!(record.word_count > 4000);
        assert_eq!(record.complexity, Some(Complexity::High));
    }

    #[test]
    fn extract_all_counts_rejections() {
        let docs = vec![
            doc("body"),
            RawDocument::new("ACPs/3-y/README.md", "no table here"),
        ];
        let (records, rejected) = Extractor::default().extract_all(&docs);
        assert_eq!(records.len(), 1);
        assert_eq!(rejected, 1);
    }
}
