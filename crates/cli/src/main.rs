use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use cli::{output, watch};
use proposals_core::config::{self, AppConfig};
use proposals_core::models::Complexity;
use proposals_core::pipeline;
use proposals_core::search::{FilterCriteria, Query, SortDirection, SortKey};
use render::{DocumentRenderer, RendererRegistry};
use std::path::PathBuf;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(level)
        .init();

    let mut cfg = config::load(cli.config.as_deref())?;
    if let Some(root) = cli.root {
        cfg.corpus.root = root;
    }

    match cli.command {
        Commands::List {
            query,
            status,
            track,
            complexity,
            author,
            has_discussion,
            sort,
            desc,
            json,
            fields,
        } => {
            let direction = if desc {
                SortDirection::Descending
            } else {
                SortDirection::Ascending
            };
            let query = Query {
                text: query.unwrap_or_default(),
                criteria: FilterCriteria {
                    status,
                    track,
                    complexity,
                    author,
                    has_discussion,
                },
                sort: Some((sort, direction)),
            };
            run_list(cfg, query, json, fields).await
        }
        Commands::Show { id, format } => run_show(cfg, &id, format).await,
        Commands::Stats { json } => run_stats(cfg, json).await,
        Commands::Watch => {
            let root = PathBuf::from(&cfg.corpus.root);
            let catalog = Arc::new(pipeline::build_catalog(&cfg));
            watch::watch_corpus(catalog, &root).await
        }
        Commands::Config => {
            print!("{}", toml::to_string_pretty(&cfg)?);
            Ok(())
        }
    }
}

#[derive(Parser)]
#[command(name = "acp-browser")]
#[command(about = "Browse, search and render Avalanche Community Proposals", long_about = None)]
struct Cli {
    /// Path to config TOML
    #[arg(short, long)]
    config: Option<String>,

    /// Proposal directory (overrides corpus.root)
    #[arg(long)]
    root: Option<String>,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search, filter and sort proposals
    List {
        /// Case-insensitive text to look for
        #[arg(short, long)]
        query: Option<String>,
        #[arg(long)]
        status: Option<String>,
        #[arg(long)]
        track: Option<String>,
        /// low, medium or high
        #[arg(long)]
        complexity: Option<Complexity>,
        /// Substring of an author name
        #[arg(long)]
        author: Option<String>,
        #[arg(long)]
        has_discussion: Option<bool>,
        /// id, title, status or complexity
        #[arg(long, default_value = "id")]
        sort: SortKey,
        /// Sort descending
        #[arg(long)]
        desc: bool,
        /// Output JSON
        #[arg(long)]
        json: bool,
        /// Comma-separated fields to keep in JSON output
        #[arg(long, value_delimiter = ',')]
        fields: Vec<String>,
    },
    /// Print one proposal
    Show {
        /// Proposal number, e.g. 77
        id: String,
        #[arg(long, value_enum, default_value_t = ShowFormat::Markdown)]
        format: ShowFormat,
    },
    /// Collection statistics
    Stats {
        /// Output JSON
        #[arg(long)]
        json: bool,
    },
    /// Reload the collection whenever proposal files change
    Watch,
    /// Print the effective configuration
    Config,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ShowFormat {
    Markdown,
    Html,
    Json,
}

async fn run_list(cfg: AppConfig, query: Query, json: bool, fields: Vec<String>) -> Result<()> {
    let catalog = pipeline::build_catalog(&cfg);
    let results = pipeline::run_query(&catalog, &query).await?;
    if json {
        let rows = output::filter_fields(output::summary_json(&results)?, &fields);
        println!("{}", serde_json::to_string_pretty(&rows)?);
    } else {
        println!("{}", output::format_list(&results));
    }
    Ok(())
}

async fn run_show(cfg: AppConfig, id: &str, format: ShowFormat) -> Result<()> {
    let catalog = pipeline::build_catalog(&cfg);
    let id = id.trim_start_matches("ACP-").trim_start_matches("acp-");
    let record = catalog
        .get_by_id(id)
        .await
        .with_context(|| format!("looking up ACP-{id}"))?;
    match format {
        ShowFormat::Markdown => {
            println!("{}\n", output::format_header(&record));
            println!("{}", record.content);
        }
        ShowFormat::Json => println!("{}", serde_json::to_string_pretty(&record)?),
        ShowFormat::Html => {
            let renderer = DocumentRenderer::from_registry(
                &RendererRegistry::with_defaults(),
                &cfg.render.diagram_renderer,
                &cfg.render.math_renderer,
            )?;
            let doc = renderer.render(&record.content).await;
            for failure in &doc.failures {
                eprintln!("render error ({:?}): {}", failure.kind, failure.error);
            }
            println!("{}", doc.html);
        }
    }
    Ok(())
}

async fn run_stats(cfg: AppConfig, json: bool) -> Result<()> {
    let catalog = pipeline::build_catalog(&cfg);
    let stats = catalog.stats().await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        println!("{}", output::format_stats(&stats));
    }
    Ok(())
}
