use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub corpus: CorpusConfig,
    pub extraction: ExtractionConfig,
    pub classification: ClassificationConfig,
    pub render: RenderConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CorpusConfig {
    pub root: String,
    pub include: Vec<String>,
    pub exclude: Vec<String>,
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            root: "ACPs".to_string(),
            include: vec!["**/README.md".to_string()],
            exclude: vec!["**/node_modules/**".to_string(), "**/.git/**".to_string()],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    pub abstract_max_chars: usize,
    pub words_per_minute: usize,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            abstract_max_chars: 200,
            words_per_minute: 200,
        }
    }
}

/// Keyword sets and thresholds for the complexity and tag heuristics.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassificationConfig {
    pub high_signal: Vec<String>,
    pub medium_signal: Vec<String>,
    pub thresholds: Thresholds,
    pub max_tags: usize,
    pub tags: Vec<TagRule>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    /// Word count above which a proposal is High regardless of keywords.
    pub high_word_count: usize,
    pub high_keyword_hits: usize,
    pub medium_word_count: usize,
    pub medium_high_keyword_hits: usize,
    pub medium_keyword_hits: usize,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            high_word_count: 4000,
            high_keyword_hits: 3,
            medium_word_count: 2000,
            medium_high_keyword_hits: 1,
            medium_keyword_hits: 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagRule {
    pub name: String,
    pub keywords: Vec<String>,
}

impl TagRule {
    fn new(name: &str, keywords: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            keywords: words(keywords),
        }
    }
}

fn words(list: &[&str]) -> Vec<String> {
    list.iter().map(|w| w.to_string()).collect()
}

pub const HIGH_SIGNAL_KEYWORDS: &[&str] = &[
    "consensus",
    "protocol",
    "cryptographic",
    "algorithm",
    "byzantine",
    "merkle",
    "signature",
    "verification",
    "validator",
    "staking",
];

pub const MEDIUM_SIGNAL_KEYWORDS: &[&str] = &[
    "implementation",
    "specification",
    "interface",
    "architecture",
    "network",
    "node",
    "transaction",
    "block",
];

impl Default for ClassificationConfig {
    fn default() -> Self {
        Self {
            high_signal: words(HIGH_SIGNAL_KEYWORDS),
            medium_signal: words(MEDIUM_SIGNAL_KEYWORDS),
            thresholds: Thresholds::default(),
            max_tags: 5,
            tags: default_tag_rules(),
        }
    }
}

/// Tag map in declaration order; the order decides which tags survive the cap.
pub fn default_tag_rules() -> Vec<TagRule> {
    vec![
        TagRule::new("Consensus", &["consensus", "snowman", "finality", "byzantine"]),
        TagRule::new(
            "Cryptography",
            &["cryptograph", "signature", "bls", "merkle", "hash"],
        ),
        TagRule::new("Validators", &["validator", "staking", "delegat", "stake"]),
        TagRule::new("Networking", &["p2p", "peer", "gossip", "network"]),
        TagRule::new(
            "Interoperability",
            &["warp", "cross-chain", "interoperab", "teleporter"],
        ),
        TagRule::new("Subnets", &["subnet", "sovereign", "permissionless l1"]),
        TagRule::new("Fees", &["fee", "gas price", "base fee"]),
        TagRule::new("Virtual Machines", &["virtual machine", "evm", "precompile"]),
        TagRule::new("Governance", &["governance", "voting", "vote"]),
        TagRule::new("Performance", &["performance", "throughput", "latency"]),
        TagRule::new("APIs", &["api", "rpc", "endpoint"]),
    ]
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub diagram_renderer: String,
    pub math_renderer: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            diagram_renderer: "passthrough".to_string(),
            math_renderer: "passthrough".to_string(),
        }
    }
}

pub fn load(path: Option<&str>) -> anyhow::Result<AppConfig> {
    let mut settings = config::Config::builder();
    if let Some(p) = path {
        settings = settings.add_source(config::File::with_name(p));
    } else {
        settings = settings.add_source(config::File::with_name("config/default").required(false));
    }
    settings = settings.add_source(
        config::Environment::with_prefix("ACP_BROWSER")
            .separator("__")
            .try_parsing(true),
    );
    let cfg = settings.build()?;
    Ok(cfg.try_deserialize()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_carry_keyword_sets() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.classification.high_signal.len(), 10);
        assert_eq!(cfg.classification.medium_signal.len(), 8);
        assert_eq!(cfg.classification.max_tags, 5);
        assert_eq!(cfg.extraction.abstract_max_chars, 200);
        assert_eq!(cfg.corpus.include, vec!["**/README.md".to_string()]);
    }

    #[test]
    fn file_overrides_only_named_fields() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[corpus]
root = "/srv/acps"

[classification.thresholds]
high_word_count = 5000
"#
        )
        .unwrap();
        let cfg = load(Some(file.path().to_str().unwrap())).unwrap();
        assert_eq!(cfg.corpus.root, "/srv/acps");
        assert_eq!(cfg.corpus.include, vec!["**/README.md".to_string()]);
        assert_eq!(cfg.classification.thresholds.high_word_count, 5000);
        assert_eq!(cfg.classification.thresholds.medium_word_count, 2000);
        assert!(!cfg.classification.tags.is_empty());
    }
}
