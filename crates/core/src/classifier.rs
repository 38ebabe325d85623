use crate::config::{ClassificationConfig, TagRule};
use crate::models::Complexity;

/// Text prepared once for all keyword heuristics.
#[derive(Debug, Clone)]
pub struct ClassificationInput {
    pub lowered: String,
    pub word_count: usize,
}

impl ClassificationInput {
    pub fn new(text: &str) -> Self {
        Self {
            lowered: text.to_lowercase(),
            word_count: word_count(text),
        }
    }
}

pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

pub fn reading_time_minutes(word_count: usize, words_per_minute: usize) -> usize {
    word_count.div_ceil(words_per_minute.max(1))
}

fn distinct_hits(lowered: &str, keywords: &[String]) -> usize {
    let mut seen: Vec<&str> = Vec::new();
    for kw in keywords {
        let kw = kw.as_str();
        if !seen.contains(&kw) && lowered.contains(&kw.to_lowercase()) {
            seen.push(kw);
        }
    }
    seen.len()
}

pub fn classify_complexity(input: &ClassificationInput, config: &ClassificationConfig) -> Complexity {
    let t = &config.thresholds;
    let high_hits = distinct_hits(&input.lowered, &config.high_signal);
    if input.word_count > t.high_word_count || high_hits >= t.high_keyword_hits {
        return Complexity::High;
    }
    let medium_hits = distinct_hits(&input.lowered, &config.medium_signal);
    if input.word_count > t.medium_word_count
        || high_hits >= t.medium_high_keyword_hits
        || medium_hits >= t.medium_keyword_hits
    {
        return Complexity::Medium;
    }
    Complexity::Low
}

/// Tags whose keywords occur in the text or title, in rule order, capped.
pub fn derive_tags(content: &str, title: &str, rules: &[TagRule], max_tags: usize) -> Vec<String> {
    let haystack = format!("{content} {title}").to_lowercase();
    let mut tags: Vec<String> = Vec::new();
    for rule in rules {
        if tags.len() >= max_tags {
            break;
        }
        if tags.contains(&rule.name) {
            continue;
        }
        if rule
            .keywords
            .iter()
            .any(|kw| haystack.contains(&kw.to_lowercase()))
        {
            tags.push(rule.name.clone());
        }
    }
    tags
}
