//! KGQ CLI - Command-line interface
//!
//! Usage:
//!   kgq extract <document>
//!   kgq query <question>
//!   kgq draw <question> [--document <path>]
//!   kgq save <document>
//!   kgq show [--topic <topic>]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{debug, info};

use kgq_core::{AppConfig, KgError, LoggingConfig, QueryContext};
use kgq_extractor::{AnnotationPipeline, HttpAnnotator, QueryParser, TripleExtractor};
use kgq_graph::{JsonFileStore, SessionContext, SessionManager, TripleRepository};

#[derive(Parser)]
#[command(name = "kgq")]
#[command(about = "Extract subject-relation-object triples and match them against questions")]
#[command(version)]
struct Cli {
    /// TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Topic to read and write (defaults to store.default_topic)
    #[arg(long, global = true)]
    topic: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract triples from a document
    Extract {
        /// Path to a UTF-8 text file
        document: PathBuf,
    },
    /// Parse a question into entities and relations
    Query {
        /// Question to parse
        question: String,
    },
    /// Match a question against a document and the database
    Draw {
        /// Question to match
        question: String,
        /// Document whose triples are matched alongside the database
        #[arg(long)]
        document: Option<PathBuf>,
    },
    /// Extract triples from a document and merge them into the database
    Save {
        /// Path to a UTF-8 text file
        document: PathBuf,
    },
    /// Print stored triples
    Show,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;
    init_tracing(&config.logging);

    let topic = cli
        .topic
        .clone()
        .unwrap_or_else(|| config.store.default_topic.clone());
    debug!(topic = %topic, database = %config.store.database_path.display(), "Configuration loaded");

    match cli.command {
        Commands::Extract { document } => {
            let app = App::new(&config)?;
            let triples = app.extractor.extract_triples(&read_document(&document)?)?;
            print_json(&triples)?;
        }
        Commands::Query { question } => {
            let app = App::new(&config)?;
            let context = app.parser.parse_query(&question)?;
            print_json(&context)?;
        }
        Commands::Draw { question, document } => {
            let app = App::new(&config)?;
            let triples = match document {
                Some(path) => app.extractor.extract_triples(&read_document(&path)?)?,
                None => Vec::new(),
            };
            let query: QueryContext = app.parser.parse_query(&question)?;
            let session = SessionContext::new(topic)
                .with_triples(triples)
                .with_query(query);
            let report = session_manager(&config).draw(&session)?;
            print_json(&report)?;
        }
        Commands::Save { document } => {
            let app = App::new(&config)?;
            let triples = app.extractor.extract_triples(&read_document(&document)?)?;
            let session = SessionContext::new(topic).with_triples(triples);
            let summary = session_manager(&config).save(&session)?;
            print_json(&summary)?;
        }
        Commands::Show => {
            let store = JsonFileStore::new(&config.store.database_path).load()?;
            match cli.topic {
                Some(topic) => print_json(&store.topic(&topic))?,
                None => print_json(&store)?,
            }
        }
    }

    Ok(())
}

/// Extraction and query parsing sharing one annotation pipeline
struct App {
    extractor: TripleExtractor,
    parser: QueryParser,
}

impl App {
    fn new(config: &AppConfig) -> anyhow::Result<Self> {
        let annotator = HttpAnnotator::new(&config.annotator)?;
        info!(url = annotator.url(), "Using HTTP annotator");
        let pipeline = Arc::new(AnnotationPipeline::from_config(
            Box::new(annotator),
            &config.extraction,
        )?);

        Ok(Self {
            extractor: TripleExtractor::new(Arc::clone(&pipeline)),
            parser: QueryParser::new(pipeline),
        })
    }
}

fn session_manager(config: &AppConfig) -> SessionManager {
    SessionManager::new(
        Arc::new(JsonFileStore::new(&config.store.database_path)),
        &config.store.session_dir,
        config.display.clone(),
    )
}

fn load_config(path: Option<&Path>) -> anyhow::Result<AppConfig> {
    let config = match path {
        Some(path) => AppConfig::from_file(path)
            .and_then(AppConfig::with_env_override)
            .with_context(|| format!("loading {}", path.display()))?,
        None => AppConfig::from_env()?,
    };
    Ok(config)
}

fn init_tracing(config: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| config.level.as_str().into());

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_file(config.include_location)
        .with_line_number(config.include_location);

    if config.json_format {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Read a document that must be UTF-8 text
fn read_document(path: &Path) -> Result<String, KgError> {
    let bytes = std::fs::read(path).map_err(|e| KgError::io(path, e))?;
    String::from_utf8(bytes).map_err(|e| {
        KgError::AnnotationFailure(format!("{} is not UTF-8 text: {e}", path.display()))
    })
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
