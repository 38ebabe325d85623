//! Text and JSON rendering of query results for the terminal.

use proposals_core::models::{CollectionStats, ProposalRecord};
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};
use std::fmt::Write;

/// Keeps only the requested keys (case-insensitive) in each JSON object.
pub fn filter_fields(mut results: Vec<Value>, fields: &[String]) -> Vec<Value> {
    if fields.is_empty() {
        return results;
    }
    let want: HashSet<String> = fields.iter().map(|s| s.to_lowercase()).collect();
    for r in results.iter_mut() {
        if let Some(obj) = r.as_object_mut() {
            let mut keep = serde_json::Map::new();
            for (k, v) in obj.iter() {
                if want.contains(&k.to_lowercase()) {
                    keep.insert(k.clone(), v.clone());
                }
            }
            *obj = keep;
        }
    }
    results
}

/// List-view JSON: every field except the full document body.
pub fn summary_json(records: &[ProposalRecord]) -> serde_json::Result<Vec<Value>> {
    records
        .iter()
        .map(|r| {
            let mut value = serde_json::to_value(r)?;
            if let Some(obj) = value.as_object_mut() {
                obj.remove("content");
            }
            Ok(value)
        })
        .collect()
}

pub fn format_list(records: &[ProposalRecord]) -> String {
    let mut out = String::new();
    for r in records {
        let complexity = r.complexity.map(|c| c.as_str()).unwrap_or("-");
        let _ = writeln!(
            out,
            "ACP-{:<5} {:<12} {:<7} {} ({} min)",
            r.id, r.status, complexity, r.title, r.reading_time_minutes
        );
    }
    let _ = write!(out, "{} proposal(s)", records.len());
    out
}

/// Metadata block printed above the document body in `show`.
pub fn format_header(record: &ProposalRecord) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "ACP-{}: {}", record.id, record.title);
    let _ = writeln!(out, "Status:     {}", record.status);
    let _ = writeln!(out, "Track:      {}", record.track);
    if !record.authors.is_empty() {
        let names: Vec<String> = record
            .authors
            .iter()
            .map(|a| format!("{} (@{})", a.name, a.handle))
            .collect();
        let _ = writeln!(out, "Authors:    {}", names.join(", "));
    }
    if let Some(link) = &record.discussion_link {
        let _ = writeln!(out, "Discussion: {link}");
    }
    if let Some(c) = record.complexity {
        let _ = writeln!(out, "Complexity: {c}");
    }
    if !record.tags.is_empty() {
        let _ = writeln!(out, "Tags:       {}", record.tags.join(", "));
    }
    let refs = [
        ("Depends on", &record.depends_on),
        ("Replaces", &record.replaces),
        ("Superseded by", &record.superseded_by),
    ];
    for (label, ids) in refs {
        if !ids.is_empty() {
            let list: Vec<String> = ids.iter().map(|id| format!("ACP-{id}")).collect();
            let _ = writeln!(out, "{label}: {}", list.join(", "));
        }
    }
    let _ = write!(
        out,
        "Length:     {} words, {} min read",
        record.word_count, record.reading_time_minutes
    );
    out
}

pub fn format_stats(stats: &CollectionStats) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} proposals ({} rejected), {} words",
        stats.total, stats.rejected, stats.total_words
    );
    push_counts(&mut out, "status", &stats.by_status);
    push_counts(&mut out, "track", &stats.by_track);
    push_counts(&mut out, "complexity", &stats.by_complexity);
    push_counts(&mut out, "tags", &stats.by_tag);
    let _ = write!(out, "dangling references: {}", stats.dangling_references);
    out
}

fn push_counts(out: &mut String, label: &str, counts: &BTreeMap<String, usize>) {
    let _ = writeln!(out, "{label}:");
    for (name, n) in counts {
        let _ = writeln!(out, "  {name:<24} {n}");
    }
}
