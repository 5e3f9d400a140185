//! AniList CLI application.

use anilist_client::query::{MediaFilter, MediaListStatus, MediaType, PageFilter};
use anilist_client::{AnilistClient, Catalog, ListEntryChanges};
use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use serde::Serialize;
use shared::{Config, LogConfig};
use std::path::PathBuf;
use tracing::{info, warn};

/// Environment variable holding an access token
const TOKEN_VAR: &str = "ANILIST_TOKEN";

#[derive(Parser, Debug)]
#[command(name = "anilist-cli")]
#[command(author, version, about = "Query AniList and manage your media lists", long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Access token (falls back to ANILIST_TOKEN)
    #[arg(long)]
    token: Option<String>,

    /// Bypass the request cache
    #[arg(long)]
    no_cache: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Currently trending media
    Trending {
        #[arg(short = 't', long = "type", default_value = "ANIME")]
        media_type: MediaType,
    },

    /// Most popular media of all time
    Popular {
        #[arg(short = 't', long = "type", default_value = "ANIME")]
        media_type: MediaType,
    },

    /// Trending media that are currently releasing
    Seasonal {
        #[arg(short = 't', long = "type", default_value = "ANIME")]
        media_type: MediaType,
    },

    /// Popular media that have not been released yet
    Upcoming {
        #[arg(short = 't', long = "type", default_value = "ANIME")]
        media_type: MediaType,
    },

    /// Search media by title
    Search {
        query: String,

        #[arg(short = 't', long = "type")]
        media_type: Option<MediaType>,

        /// Genre to include, may be repeated
        #[arg(short, long)]
        genre: Vec<String>,

        #[arg(long)]
        year: Option<i32>,

        #[arg(short, long, default_value = "1")]
        page: u32,
    },

    /// Full details of one media
    Info { media_id: i32 },

    /// A user's media lists
    List {
        user: String,

        #[arg(short = 't', long = "type", default_value = "ANIME")]
        media_type: MediaType,

        /// List status to include, may be repeated
        #[arg(short, long)]
        status: Vec<MediaListStatus>,
    },

    /// Update your list entry for a media
    Update {
        media_id: i32,

        #[arg(long)]
        status: Option<MediaListStatus>,

        /// Score on the 100 point scale
        #[arg(long)]
        score: Option<u32>,

        #[arg(long)]
        progress: Option<u32>,

        #[arg(long)]
        progress_volumes: Option<u32>,

        #[arg(long)]
        repeat: Option<u32>,

        #[arg(long)]
        notes: Option<String>,

        /// Start date (YYYY-MM-DD)
        #[arg(long)]
        started: Option<NaiveDate>,

        /// Completion date (YYYY-MM-DD)
        #[arg(long)]
        completed: Option<NaiveDate>,
    },

    /// Show request cache statistics
    CacheStats,

    /// Remove every cached response
    CacheClear,
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value).context("Failed to format output")?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration
    let mut config = Config::from_file(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;
    if args.no_cache {
        config.cache.enabled = false;
    }

    // Initialize logging
    let mut log_config = LogConfig::from_settings(&config.logging, &config.log_dir(), "anilist-cli");
    if args.verbose {
        log_config.default_level = tracing::Level::DEBUG;
        log_config.console = true;
    }
    shared::logging::init(log_config)?;

    info!(config_file = %args.config.display(), "Loaded configuration");

    let client = AnilistClient::from_config(&config).context("Failed to create AniList client")?;
    let per_page = config.api.per_page;

    match args.command {
        Command::CacheStats => {
            let Some(cache) = client.cache() else {
                bail!("Request cache is disabled");
            };
            let stats = cache.stats().context("Failed to get cache stats")?;
            println!("Entries: {}", stats.total_entries);
            println!("Size: {} bytes", stats.total_size_bytes);
            return Ok(());
        }
        Command::CacheClear => {
            let Some(cache) = client.cache() else {
                bail!("Request cache is disabled");
            };
            let removed = cache.clear().context("Failed to clear cache")?;
            println!("Removed {} cached responses", removed);
            return Ok(());
        }
        _ => {}
    }

    let mut catalog = Catalog::new(client, per_page);

    if let Some(token) = args.token.or_else(|| std::env::var(TOKEN_VAR).ok()) {
        match catalog.login(token).await? {
            Some(viewer) => info!(user = %viewer.name, "Authenticated"),
            None => warn!("Access token was rejected, continuing anonymously"),
        }
    }

    match args.command {
        Command::Trending { media_type } => print_json(&catalog.trending(media_type).await?)?,
        Command::Popular { media_type } => print_json(&catalog.all_time_popular(media_type).await?)?,
        Command::Seasonal { media_type } => print_json(&catalog.seasonal(media_type).await?)?,
        Command::Upcoming { media_type } => print_json(&catalog.upcoming(media_type).await?)?,
        Command::Search {
            query,
            media_type,
            genre,
            year,
            page,
        } => {
            let filter = MediaFilter {
                search_string: Some(query),
                media_type,
                genre_in: (!genre.is_empty()).then_some(genre),
                season_year: year,
                ..Default::default()
            };
            let results = catalog
                .search(&filter, &PageFilter::new(page, per_page))
                .await?;
            print_json(&results)?;
        }
        Command::Info { media_id } => print_json(&catalog.media_details(media_id).await?)?,
        Command::List {
            user,
            media_type,
            status,
        } => print_json(&catalog.media_list(&user, media_type, &status).await?)?,
        Command::Update {
            media_id,
            status,
            score,
            progress,
            progress_volumes,
            repeat,
            notes,
            started,
            completed,
        } => {
            let mut builder = ListEntryChanges::builder();
            if let Some(status) = status {
                builder = builder.status(status);
            }
            if let Some(score) = score {
                builder = builder.score_raw(score);
            }
            if let Some(progress) = progress {
                builder = builder.progress(progress);
            }
            if let Some(volumes) = progress_volumes {
                builder = builder.progress_volumes(volumes);
            }
            if let Some(repeat) = repeat {
                builder = builder.repeat(repeat);
            }
            if let Some(notes) = notes {
                builder = builder.notes(notes);
            }
            if let Some(date) = started {
                builder = builder.started_at(date);
            }
            if let Some(date) = completed {
                builder = builder.completed_at(date);
            }

            let changes = builder.build()?;
            print_json(&catalog.update_list_entry(media_id, &changes).await?)?;
        }
        Command::CacheStats | Command::CacheClear => {}
    }

    Ok(())
}
