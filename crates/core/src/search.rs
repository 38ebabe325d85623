//! Search, filter and sort over an in-memory collection. Every function takes
//! a slice and returns a new vector; inputs are never modified.

use crate::models::{Complexity, ProposalRecord};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::str::FromStr;

/// Optional constraints; only the supplied ones are checked.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterCriteria {
    pub status: Option<String>,
    pub track: Option<String>,
    pub complexity: Option<Complexity>,
    pub author: Option<String>,
    pub has_discussion: Option<bool>,
}

impl FilterCriteria {
    pub fn is_empty(&self) -> bool {
        self == &FilterCriteria::default()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    #[default]
    Id,
    Title,
    Status,
    Complexity,
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "id" => Ok(SortKey::Id),
            "title" => Ok(SortKey::Title),
            "status" => Ok(SortKey::Status),
            "complexity" => Ok(SortKey::Complexity),
            other => Err(format!("unknown sort key: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

/// Search text, then filters, then ordering.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Query {
    pub text: String,
    pub criteria: FilterCriteria,
    pub sort: Option<(SortKey, SortDirection)>,
}

pub fn search(records: &[ProposalRecord], query: &str) -> Vec<ProposalRecord> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return records.to_vec();
    }
    records
        .iter()
        .filter(|r| matches_text(r, &needle))
        .cloned()
        .collect()
}

fn matches_text(record: &ProposalRecord, needle: &str) -> bool {
    let hit = |s: &str| s.to_lowercase().contains(needle);
    hit(record.id.as_str())
        || hit(record.title.as_str())
        || record.authors.iter().any(|a| hit(a.name.as_str()))
        || hit(record.status.as_str())
        || hit(record.track.as_str())
        || record.summary.as_deref().is_some_and(hit)
        || record.tags.iter().any(|t| hit(t.as_str()))
}

pub fn filter(records: &[ProposalRecord], criteria: &FilterCriteria) -> Vec<ProposalRecord> {
    records
        .iter()
        .filter(|r| passes(r, criteria))
        .cloned()
        .collect()
}

fn passes(record: &ProposalRecord, criteria: &FilterCriteria) -> bool {
    if let Some(status) = &criteria.status {
        if &record.status != status {
            return false;
        }
    }
    if let Some(track) = &criteria.track {
        if &record.track != track {
            return false;
        }
    }
    if let Some(complexity) = criteria.complexity {
        if record.complexity != Some(complexity) {
            return false;
        }
    }
    if let Some(author) = &criteria.author {
        let needle = author.to_lowercase();
        if !record
            .authors
            .iter()
            .any(|a| a.name.to_lowercase().contains(&needle))
        {
            return false;
        }
    }
    if let Some(wanted) = criteria.has_discussion {
        if record.discussion_link.is_some() != wanted {
            return false;
        }
    }
    true
}

/// Stable ascending sort into a new vector; descending is the exact reverse
/// of ascending, so sorting an ascending result descending reverses it even
/// when keys tie.
pub fn sort(
    records: &[ProposalRecord],
    key: SortKey,
    direction: SortDirection,
) -> Vec<ProposalRecord> {
    let mut sorted = records.to_vec();
    sorted.sort_by(|a, b| compare(a, b, key));
    if direction == SortDirection::Descending {
        sorted.reverse();
    }
    sorted
}

fn compare(a: &ProposalRecord, b: &ProposalRecord, key: SortKey) -> Ordering {
    match key {
        SortKey::Id => match (a.numeric_id(), b.numeric_id()) {
            (Some(x), Some(y)) => x.cmp(&y),
            _ => a.id.cmp(&b.id),
        },
        SortKey::Title => compare_titles(&a.title, &b.title),
        SortKey::Status => a.status.cmp(&b.status),
        SortKey::Complexity => complexity_rank(a).cmp(&complexity_rank(b)),
    }
}

/// Case-folded comparison first; case only breaks ties, lower case first.
fn compare_titles(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| b.cmp(a))
}

fn complexity_rank(record: &ProposalRecord) -> Complexity {
    record.complexity.unwrap_or(Complexity::Low)
}

/// Runs search, filter and sort in that order.
pub fn run(records: &[ProposalRecord], query: &Query) -> Vec<ProposalRecord> {
    let found = search(records, &query.text);
    let kept = if query.criteria.is_empty() {
        found
    } else {
        filter(&found, &query.criteria)
    };
    match query.sort {
        Some((key, direction)) => sort(&kept, key, direction),
        None => kept,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Author;

    fn record(id: &str, title: &str, status: &str, complexity: Option<Complexity>) -> ProposalRecord {
        ProposalRecord {
            id: id.to_string(),
            title: title.to_string(),
            status: status.to_string(),
            track: "Standards".to_string(),
            authors: vec![Author {
                name: format!("Author {id}"),
                handle: format!("author{id}"),
            }],
            content: String::new(),
            discussion_link: None,
            summary: None,
            complexity,
            tags: Vec::new(),
            word_count: 0,
            reading_time_minutes: 0,
            depends_on: Vec::new(),
            replaces: Vec::new(),
            superseded_by: Vec::new(),
        }
    }

    fn sample() -> Vec<ProposalRecord> {
        let mut fees = record("103", "Dynamic fees", "Activated", Some(Complexity::High));
        fees.tags = vec!["Fees".to_string()];
        fees.discussion_link = Some("https://x/d/103".to_string());
        let mut warp = record("30", "avalanche warp", "Proposed", Some(Complexity::Medium));
        warp.summary = Some("Cross-chain messaging for subnets".to_string());
        warp.track = "Best Practices".to_string();
        let stale = record("7", "Bandwidth", "Stale", None);
        let low = record("13", "Bandwidth", "Activated", Some(Complexity::Low));
        vec![fees, warp, stale, low]
    }

    fn ids(records: &[ProposalRecord]) -> Vec<&str> {
        records.iter().map(|r| r.id.as_str()).collect()
    }

    #[test]
    fn empty_query_returns_input() {
        let all = sample();
        assert_eq!(search(&all, ""), all);
        assert_eq!(search(&all, "   "), all);
    }

    #[test]
    fn search_matches_any_field() {
        let all = sample();
        assert_eq!(ids(&search(&all, "WARP")), vec!["30"]);
        assert_eq!(ids(&search(&all, "fees")), vec!["103"]);
        assert_eq!(ids(&search(&all, "subnets")), vec!["30"]);
        assert_eq!(ids(&search(&all, "author 7")), vec!["7"]);
        assert_eq!(ids(&search(&all, "stale")), vec!["7"]);
        assert_eq!(ids(&search(&all, "best practices")), vec!["30"]);
        assert!(search(&all, "nothing like this").is_empty());
    }

    #[test]
    fn empty_criteria_returns_input() {
        let all = sample();
        assert_eq!(filter(&all, &FilterCriteria::default()), all);
    }

    #[test]
    fn criteria_combine_with_and() {
        let all = sample();
        let activated = FilterCriteria {
            status: Some("Activated".to_string()),
            ..Default::default()
        };
        assert_eq!(ids(&filter(&all, &activated)), vec!["103", "13"]);

        let activated_high = FilterCriteria {
            complexity: Some(Complexity::High),
            ..activated.clone()
        };
        assert_eq!(ids(&filter(&all, &activated_high)), vec!["103"]);

        let track = FilterCriteria {
            track: Some("Best Practices".to_string()),
            ..Default::default()
        };
        assert_eq!(ids(&filter(&all, &track)), vec!["30"]);
    }

    #[test]
    fn discussion_and_author_criteria() {
        let all = sample();
        let without = FilterCriteria {
            has_discussion: Some(false),
            ..Default::default()
        };
        assert_eq!(ids(&filter(&all, &without)), vec!["30", "7", "13"]);
        let with = FilterCriteria {
            has_discussion: Some(true),
            ..Default::default()
        };
        assert_eq!(ids(&filter(&all, &with)), vec!["103"]);
        let author = FilterCriteria {
            author: Some("AUTHOR 1".to_string()),
            ..Default::default()
        };
        assert_eq!(ids(&filter(&all, &author)), vec!["103", "13"]);
    }

    #[test]
    fn id_sort_is_numeric() {
        let all = sample();
        assert_eq!(
            ids(&sort(&all, SortKey::Id, SortDirection::Ascending)),
            vec!["7", "13", "30", "103"]
        );
    }

    #[test]
    fn descending_reverses_ascending() {
        let all = sample();
        let asc = sort(&all, SortKey::Id, SortDirection::Ascending);
        let desc = sort(&asc, SortKey::Id, SortDirection::Descending);
        let mut reversed = asc.clone();
        reversed.reverse();
        assert_eq!(desc, reversed);
    }

    #[test]
    fn ties_reverse_with_direction() {
        let all = sample();
        let by_title = sort(&all, SortKey::Title, SortDirection::Ascending);
        assert_eq!(ids(&by_title), vec!["30", "7", "13", "103"]);
        let by_title_desc = sort(&by_title, SortKey::Title, SortDirection::Descending);
        assert_eq!(ids(&by_title_desc), vec!["103", "13", "7", "30"]);
    }

    #[test]
    fn round_trip_reverses_with_tied_status_and_complexity() {
        let mut all = sample();
        all.push(record("44", "Extra", "Activated", Some(Complexity::Medium)));
        for key in [SortKey::Status, SortKey::Complexity] {
            let asc = sort(&all, key, SortDirection::Ascending);
            let desc = sort(&asc, key, SortDirection::Descending);
            let mut reversed = asc.clone();
            reversed.reverse();
            assert_eq!(desc, reversed, "{key:?}");
        }
        let by_status = sort(&all, SortKey::Status, SortDirection::Ascending);
        assert_eq!(ids(&by_status), vec!["103", "13", "44", "30", "7"]);
        let by_complexity = sort(&all, SortKey::Complexity, SortDirection::Ascending);
        assert_eq!(ids(&by_complexity), vec!["7", "13", "30", "44", "103"]);
    }

    #[test]
    fn missing_complexity_sorts_as_low() {
        let all = sample();
        assert_eq!(
            ids(&sort(&all, SortKey::Complexity, SortDirection::Ascending)),
            vec!["7", "13", "30", "103"]
        );
        assert_eq!(
            ids(&sort(&all, SortKey::Status, SortDirection::Ascending)),
            vec!["103", "13", "30", "7"]
        );
    }

    #[test]
    fn sort_leaves_input_untouched() {
        let all = sample();
        let before = all.clone();
        let _ = sort(&all, SortKey::Title, SortDirection::Descending);
        assert_eq!(all, before);
    }

    #[test]
    fn run_composes_stages() {
        let all = sample();
        let query = Query {
            text: "bandwidth".to_string(),
            criteria: FilterCriteria {
                status: Some("Activated".to_string()),
                ..Default::default()
            },
            sort: Some((SortKey::Id, SortDirection::Descending)),
        };
        assert_eq!(ids(&run(&all, &query)), vec!["13"]);
        assert_eq!(ids(&run(&all, &Query::default())), ids(&all));
    }
}
