//! Metadata table scanning.
//!
//! A proposal carries a pipe table near the top:
//!
//! ```text
//! | ACP | 118 |
//! | :--- | :--- |
//! | **Title** | Warp Signature Request |
//! | **Author(s)** | Jane Doe (@janedoe) |
//! | **Status** | Proposed ([Discussion](https://example.org/d/1)) |
//! | **Track** | Standards |
//! ```
//!
//! [`TableScanner`] walks the lines with three states. It skips everything up
//! to the header row, reads labelled rows until the next `##` heading and then
//! stops looking.

use crate::models::Author;
use once_cell::sync::Lazy;
use regex::Regex;

const AUTHOR_LABEL: &str = "**Author(s)**";
const UNKNOWN_STATUS: &str = "Unknown";

static LABEL_CELL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\|\s*\*\*([A-Za-z()\-]+)\*\*\s*\|").expect("valid label cell pattern")
});
static AUTHOR_SPLIT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*,\s*|\s+and\s+").expect("valid author split pattern"));
static LINK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[([^\]]*)\]\(([^)]*)\)").expect("valid link pattern"));
static BARE_HANDLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"@([A-Za-z0-9_\-]+)").expect("valid handle pattern"));
static WORD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[A-Za-z0-9][A-Za-z0-9_\-]*").expect("valid word pattern"));
static DISCUSSION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\[Discussion\]\(\s*([^)\s]+)\s*\)").expect("valid discussion pattern")
});
static CROSS_REF: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"ACP-(\d+)").expect("valid cross reference pattern"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    Outside,
    Inside,
    Done,
}

/// Labelled rows the scanner understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Title,
    Authors,
    Status,
    Track,
    DependsOn,
    Replaces,
    SupersededBy,
}

impl Field {
    pub fn from_label(label: &str) -> Option<Self> {
        match label.to_ascii_lowercase().as_str() {
            "title" => Some(Field::Title),
            "author(s)" | "authors" | "author" => Some(Field::Authors),
            "status" => Some(Field::Status),
            "track" => Some(Field::Track),
            "depends-on" => Some(Field::DependsOn),
            "replaces" => Some(Field::Replaces),
            "superseded-by" => Some(Field::SupersededBy),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Field::Title => "Title",
            Field::Authors => "Author(s)",
            Field::Status => "Status",
            Field::Track => "Track",
            Field::DependsOn => "Depends-On",
            Field::Replaces => "Replaces",
            Field::SupersededBy => "Superseded-By",
        }
    }
}

/// Raw field values pulled out of one metadata table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetadataTable {
    pub title: Option<String>,
    pub authors: Vec<Author>,
    pub status: Option<String>,
    pub discussion_link: Option<String>,
    pub track: Option<String>,
    pub depends_on: Vec<String>,
    pub replaces: Vec<String>,
    pub superseded_by: Vec<String>,
    /// Line index of the `Track` row, where the table is considered over.
    pub track_line: Option<usize>,
}

#[derive(Debug)]
pub struct TableScanner {
    state: ScanState,
    table: MetadataTable,
}

impl Default for TableScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl TableScanner {
    pub fn new() -> Self {
        Self {
            state: ScanState::Outside,
            table: MetadataTable::default(),
        }
    }

    pub fn state(&self) -> ScanState {
        self.state
    }

    /// Advances the machine by one line and returns the new state.
    pub fn feed(&mut self, index: usize, line: &str) -> ScanState {
        let trimmed = line.trim();
        match self.state {
            ScanState::Outside => {
                if is_header_row(trimmed) {
                    self.state = ScanState::Inside;
                }
            }
            ScanState::Inside => {
                if trimmed.is_empty() {
                    return self.state;
                }
                if trimmed.starts_with("##") {
                    self.state = ScanState::Done;
                    return self.state;
                }
                if let Some((field, cell)) = labelled_row(trimmed) {
                    self.apply(field, cell, index);
                }
            }
            ScanState::Done => {}
        }
        self.state
    }

    /// The collected table, or `None` when no header row was ever seen.
    pub fn finish(self) -> Option<MetadataTable> {
        match self.state {
            ScanState::Outside => None,
            ScanState::Inside | ScanState::Done => Some(self.table),
        }
    }

    fn apply(&mut self, field: Field, cell: &str, index: usize) {
        let table = &mut self.table;
        match field {
            Field::Title => table.title = non_empty(cell),
            Field::Authors => table.authors = parse_authors(cell),
            Field::Status => {
                table.status = Some(parse_status(cell));
                table.discussion_link = parse_discussion_link(cell);
            }
            Field::Track => {
                table.track = non_empty(cell);
                table.track_line = Some(index);
            }
            Field::DependsOn => table.depends_on = parse_references(cell),
            Field::Replaces => table.replaces = parse_references(cell),
            Field::SupersededBy => table.superseded_by = parse_references(cell),
        }
    }
}

/// Runs the scanner over every line of `text`.
pub fn scan_table(text: &str) -> Option<MetadataTable> {
    let mut scanner = TableScanner::new();
    for (index, line) in text.lines().enumerate() {
        if scanner.feed(index, line) == ScanState::Done {
            break;
        }
    }
    scanner.finish()
}

fn is_header_row(line: &str) -> bool {
    line.starts_with("| ACP |") || line.contains("| **ACP** |")
}

fn labelled_row(line: &str) -> Option<(Field, &str)> {
    let caps = LABEL_CELL.captures(line)?;
    let field = Field::from_label(caps.get(1)?.as_str())?;
    let cell = line.split('|').nth(2)?.trim();
    Some((field, cell))
}

fn non_empty(cell: &str) -> Option<String> {
    let cell = cell.trim();
    if cell.is_empty() {
        None
    } else {
        Some(cell.to_string())
    }
}

pub fn parse_authors(cell: &str) -> Vec<Author> {
    AUTHOR_SPLIT
        .split(cell)
        .filter_map(parse_author)
        .collect()
}

fn parse_author(fragment: &str) -> Option<Author> {
    // A stray label cell contributes nothing; text after it is still a name.
    let fragment = fragment.trim();
    let fragment = fragment
        .strip_prefix(AUTHOR_LABEL)
        .map(str::trim)
        .unwrap_or(fragment);
    if fragment.is_empty() {
        return None;
    }
    let cut = fragment
        .find(|c: char| c == '(' || c == '@')
        .unwrap_or(fragment.len());
    let name = fragment[..cut].trim();
    let explicit = parenthesised(fragment)
        .and_then(handle_from_parens)
        .or_else(|| {
            BARE_HANDLE
                .captures(&fragment[cut..])
                .map(|c| c[1].to_string())
        });
    match (name.is_empty(), explicit) {
        (true, None) => None,
        (true, Some(handle)) => Some(Author {
            name: handle.clone(),
            handle,
        }),
        (false, Some(handle)) => Some(Author {
            name: name.to_string(),
            handle,
        }),
        (false, None) => Some(Author {
            name: name.to_string(),
            handle: derive_handle(name),
        }),
    }
}

fn parenthesised(fragment: &str) -> Option<&str> {
    let open = fragment.find('(')?;
    let close = fragment.rfind(')')?;
    (close > open).then(|| fragment[open + 1..close].trim())
}

fn handle_from_parens(inner: &str) -> Option<String> {
    let raw = match LINK.captures(inner) {
        Some(caps) => caps.get(1).map(|m| m.as_str()).unwrap_or_default().to_string(),
        None => inner.to_string(),
    };
    let raw = if raw.contains("://") {
        raw.trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or_default()
            .to_string()
    } else {
        raw
    };
    let handle = raw.trim().trim_start_matches('@').trim();
    if handle.is_empty() {
        None
    } else {
        Some(handle.to_string())
    }
}

fn derive_handle(name: &str) -> String {
    name.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

pub fn parse_status(cell: &str) -> String {
    let linked = LINK
        .captures_iter(cell)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str().trim())
        .find(|label| !label.is_empty() && *label != "Discussion");
    if let Some(label) = linked {
        return label.to_string();
    }
    let without_links = LINK.replace_all(cell, "");
    WORD.find(&without_links)
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| UNKNOWN_STATUS.to_string())
}

pub fn parse_discussion_link(cell: &str) -> Option<String> {
    DISCUSSION.captures(cell).map(|c| c[1].to_string())
}

pub fn parse_references(cell: &str) -> Vec<String> {
    CROSS_REF
        .captures_iter(cell)
        .map(|c| c[1].to_string())
        .collect()
}
