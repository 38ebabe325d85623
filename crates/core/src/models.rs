use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// A document as handed over by a source: where it came from and its text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawDocument {
    pub path: String,
    pub text: String,
}

impl RawDocument {
    pub fn new(path: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub name: String,
    pub handle: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Complexity {
    Low,
    Medium,
    High,
}

impl Complexity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Complexity::Low => "Low",
            Complexity::Medium => "Medium",
            Complexity::High => "High",
        }
    }
}

impl fmt::Display for Complexity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Complexity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "low" => Ok(Complexity::Low),
            "medium" => Ok(Complexity::Medium),
            "high" => Ok(Complexity::High),
            other => Err(format!("unknown complexity: {other}")),
        }
    }
}

/// One extracted proposal. Every derived field is computed once from
/// `content` at extraction time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProposalRecord {
    pub id: String,
    pub title: String,
    pub status: String,
    pub track: String,
    pub authors: Vec<Author>,
    pub content: String,
    pub discussion_link: Option<String>,
    #[serde(rename = "abstract")]
    pub summary: Option<String>,
    pub complexity: Option<Complexity>,
    pub tags: Vec<String>,
    pub word_count: usize,
    pub reading_time_minutes: usize,
    pub depends_on: Vec<String>,
    pub replaces: Vec<String>,
    pub superseded_by: Vec<String>,
}

impl ProposalRecord {
    /// Numeric value of the id, used for ordering.
    pub fn numeric_id(&self) -> Option<u64> {
        self.id.parse().ok()
    }

    /// All outgoing cross-references, labelled by relation.
    pub fn references(&self) -> impl Iterator<Item = (ReferenceKind, &str)> {
        self.depends_on
            .iter()
            .map(|id| (ReferenceKind::DependsOn, id.as_str()))
            .chain(
                self.replaces
                    .iter()
                    .map(|id| (ReferenceKind::Replaces, id.as_str())),
            )
            .chain(
                self.superseded_by
                    .iter()
                    .map(|id| (ReferenceKind::SupersededBy, id.as_str())),
            )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceKind {
    DependsOn,
    Replaces,
    SupersededBy,
}

/// A cross-reference whose target is not part of the collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DanglingReference {
    pub from: String,
    pub kind: ReferenceKind,
    pub to: String,
}

/// Aggregate counts over one snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CollectionStats {
    pub total: usize,
    pub rejected: usize,
    pub total_words: usize,
    pub by_status: BTreeMap<String, usize>,
    pub by_track: BTreeMap<String, usize>,
    pub by_complexity: BTreeMap<String, usize>,
    pub by_tag: BTreeMap<String, usize>,
    pub dangling_references: usize,
}
