//! `readlog`: keep a reading log in a JSON file stored in a GitHub repository.
//!
//! ```bash
//! export READLOG_GITHUB_TOKEN=...
//! readlog add https://example.com/essay --rating 4 --thoughts "worth a reread"
//! readlog list
//! readlog delete https://example.com/essay
//! readlog meta https://arxiv.org/abs/1706.03762
//! ```

mod config;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use readlog_core::EntryDraft;
use readlog_engine::{
    GitHubBlobClient, HttpMetadataFetcher, MetadataFetcher, ReadingLog, RemoteDocumentStore,
    StoreSettings,
};
use readlog_logging::{readlog_info, readlog_warn};

use crate::config::{load_config, token_from_env, AppConfig, DEFAULT_CONFIG_FILE, TOKEN_ENV};

#[derive(Parser)]
#[command(name = "readlog", version, about = "Log what you read to a file in a GitHub repository")]
struct Cli {
    /// RON configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Add an entry, filling missing fields from the page itself.
    Add {
        url: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        author: Option<String>,
        /// Publication date, any common format.
        #[arg(long)]
        published: Option<String>,
        #[arg(long)]
        thoughts: Option<String>,
        #[arg(long)]
        rating: Option<u8>,
        /// Do not download the page for metadata.
        #[arg(long)]
        no_fetch: bool,
        /// Commit message.
        #[arg(long)]
        message: Option<String>,
    },
    /// Remove every entry with this URL.
    Delete {
        url: String,
        #[arg(long)]
        message: Option<String>,
    },
    /// Print the log, most recent first.
    List,
    /// Print the metadata extracted from a page as JSON.
    Meta { url: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let (path, explicit) = match cli.config {
        Some(path) => (path, true),
        None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
    };
    let config = load_config(&path, explicit)?;
    readlog_logging::initialize(config.logging.destination(), config.logging.level_filter()?);

    let fetcher = Arc::new(HttpMetadataFetcher::new(config.fetch_settings()));
    match cli.command {
        Command::Meta { url } => {
            let metadata = fetcher
                .fetch(&url)
                .await
                .with_context(|| format!("failed to extract metadata from {url}"))?;
            println!("{}", serde_json::to_string_pretty(&metadata)?);
        }
        Command::Add {
            url,
            title,
            author,
            published,
            thoughts,
            rating,
            no_fetch,
            message,
        } => {
            let draft = EntryDraft {
                title,
                author,
                published_date: published,
                thoughts,
                rating,
                fetch_metadata: !no_fetch,
                ..EntryDraft::new(url)
            };
            let log = reading_log(&config, fetcher)?;
            let logged = log
                .log_entry(&config.locator()?, draft, message.as_deref())
                .await?;
            println!("{} {}", logged.outcome.status.as_str(), logged.entry.url);
            println!("{}", serde_json::to_string_pretty(&logged.entry)?);
        }
        Command::Delete { url, message } => {
            let log = reading_log(&config, fetcher)?;
            let outcome = log
                .remove_entry(&config.locator()?, &url, message.as_deref())
                .await?;
            println!("{} {} (removed {})", outcome.status.as_str(), url, outcome.removed);
        }
        Command::List => {
            let log = reading_log(&config, fetcher)?;
            for entry in log.history(&config.locator()?).await? {
                let author = entry.author.as_deref().unwrap_or("unknown author");
                println!("{}  {}  {} ({})", entry.added_date, entry.url, entry.title, author);
            }
        }
    }
    Ok(())
}

fn reading_log(config: &AppConfig, fetcher: Arc<HttpMetadataFetcher>) -> Result<ReadingLog> {
    let token = token_from_env();
    if token.is_none() {
        readlog_warn!("{} is not set; requests to GitHub are unauthenticated", TOKEN_ENV);
    }
    let client = GitHubBlobClient::new(config.github_settings(token))
        .context("failed to build GitHub client")?;
    let store = RemoteDocumentStore::new(
        Arc::new(client),
        StoreSettings {
            retry: config.retry_policy(),
            ..StoreSettings::default()
        },
    );
    readlog_info!("Using {}", config.locator()?);
    Ok(ReadingLog::new(store, fetcher))
}
