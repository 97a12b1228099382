use std::path::PathBuf;

use clap::{Parser, Subcommand};
use library::{ArtistOutcome, Library, ReconciliationService};
use scrape::{MetadataAggregator, SourceKind};
use server::config::{config_path_from_env, load_or_create_config, resolve_path};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Reports and fills missing video titles without running the server.
#[derive(Parser, Debug)]
#[command(name = "title_sync")]
struct Cli {
    /// Config file; defaults to VIDEOSHELF_CONFIG or config.yaml next to the binary.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Artists directory, overriding `media_root` from the config.
    #[arg(long)]
    media_root: Option<PathBuf>,

    /// Comma-separated source order (e.g. `javlibrary,javdb`), overriding
    /// the configured sources.
    #[arg(long, value_delimiter = ',')]
    sources: Vec<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Lists codes without a title, for one artist or all of them.
    Check {
        #[arg(long)]
        artist: Option<String>,
    },

    /// Scrapes and/or applies a placeholder to every missing code.
    Update {
        #[arg(long)]
        artist: Option<String>,

        /// Title stored for codes no source could resolve.
        #[arg(long)]
        placeholder: Option<String>,

        /// Only apply the placeholder, never hit the network.
        #[arg(long)]
        no_scrape: bool,
    },

    /// Scrapes the given codes (default: the artist's missing ones) and
    /// stores every hit.
    Scrape {
        artist: String,
        codes: Vec<String>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();
    let config_path = cli.config.unwrap_or_else(config_path_from_env);
    let (config, created) = load_or_create_config(&config_path)?;
    if created {
        info!("Created default config at {:?}", config_path);
    }
    let root = match cli.media_root {
        Some(root) => root,
        None => resolve_path(&config_path, &config.media_root),
    };
    let library = Library::with_catalog_file(root, &config.catalog_file_name);
    let sources = if cli.sources.is_empty() {
        config.scrape.source_order()
    } else {
        parse_sources(&cli.sources)?
    };

    match cli.command {
        Command::Check { artist: Some(artist) } => {
            let missing = library.missing(&artist)?;
            println!("{}", serde_json::to_string_pretty(&missing)?);
        }
        Command::Check { artist: None } => {
            let summary = library.summary()?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
            let total: usize = summary.values().map(|entry| entry.missing_count).sum();
            println!("{} codes missing across {} artists", total, summary.len());
        }
        Command::Update {
            artist,
            placeholder,
            no_scrape,
        } => {
            let service = reconciliation(library, &config.scrape, &sources)?;
            let scrape_real = !no_scrape;
            match artist {
                Some(artist) => {
                    let outcome =
                        service.update_artist(&artist, placeholder.as_deref(), scrape_real)?;
                    println!("{}", serde_json::to_string_pretty(&outcome)?);
                    println!("{}: {} titles stored", artist, outcome.updated_count());
                }
                None => {
                    let outcomes = service.update_all(placeholder.as_deref(), scrape_real)?;
                    println!("{}", serde_json::to_string_pretty(&outcomes)?);
                    let failed = outcomes
                        .values()
                        .filter(|outcome| matches!(outcome, ArtistOutcome::Failed { .. }))
                        .count();
                    println!("{} artists processed, {} failed", outcomes.len(), failed);
                }
            }
        }
        Command::Scrape { artist, codes } => {
            let service = reconciliation(library, &config.scrape, &sources)?;
            let codes = if codes.is_empty() { None } else { Some(codes) };
            let titles = service.scrape_artist(&artist, codes)?;
            println!("{}", serde_json::to_string_pretty(&titles)?);
        }
    }
    Ok(())
}

fn parse_sources(values: &[String]) -> Result<Vec<SourceKind>, String> {
    values
        .iter()
        .map(|value| SourceKind::parse(value).ok_or_else(|| format!("unknown source: {}", value)))
        .collect()
}

fn reconciliation(
    library: Library,
    scrape: &server::config::ScrapeConfig,
    sources: &[SourceKind],
) -> Result<ReconciliationService<MetadataAggregator>, scrape::ScrapeError> {
    let aggregator =
        MetadataAggregator::from_settings(&scrape.client_settings(), sources, scrape.policy())?;
    info!("Sources: {}", aggregator.source_names().join(", "));
    Ok(ReconciliationService::new(library, aggregator))
}
