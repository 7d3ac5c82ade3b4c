//! Command-line maintenance tool for a Paster store.

use anyhow::{bail, Context};
use chrono::{DateTime, Utc};
use clap::{ArgAction, Parser, Subcommand};
use paster_core::models::paste::format_time_left;
use paster_core::{
    Config, Lifetime, NewPaste, Paste, SearchFilter, Store, Sweeper, DEFAULT_LIST_LIMIT,
};
use serde::Serialize;
use std::io::{self, Read};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "paster", about = "Paster store CLI", version)]
struct Cli {
    /// Database file (defaults to PASTERD_DATABASE_PATH or ~/.cache/paster/paster.redb)
    #[arg(short, long, global = true)]
    database: Option<String>,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    json: bool,

    /// More logging (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Store a new paste read from a file or stdin
    New {
        /// File to read; stdin when omitted
        file: Option<PathBuf>,
        #[arg(short, long, default_value = "Untitled")]
        title: String,
        #[arg(short, long, default_value = "Anonymous")]
        author: String,
        #[arg(short, long, default_value = "nohighlight")]
        language: String,
        /// hour, day, week or month
        #[arg(long, default_value = "month")]
        lifetime: String,
        /// Keep the paste out of listings and search
        #[arg(long)]
        hidden: bool,
    },
    /// Show one paste by id
    Get { id: String },
    /// List the newest visible pastes
    Recent {
        #[arg(short, long, default_value_t = DEFAULT_LIST_LIMIT)]
        limit: usize,
    },
    /// Search visible pastes by title, author and language
    Search {
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        author: Option<String>,
        #[arg(long)]
        language: Option<String>,
        #[arg(short, long, default_value_t = DEFAULT_LIST_LIMIT)]
        limit: usize,
    },
    /// Delete expired pastes
    Clean {
        /// Keep sweeping every PASTERD_SWEEP_INTERVAL_SECS seconds
        #[arg(short, long)]
        watch: bool,
        /// Keep sweeping every SECS seconds
        #[arg(long, value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..))]
        every: Option<u64>,
    },
}

/// Paste as printed in JSON output, with its expiry resolved.
#[derive(Serialize)]
struct PasteView<'a> {
    #[serde(flatten)]
    paste: &'a Paste,
    expires_at: DateTime<Utc>,
    expired: bool,
}

impl<'a> PasteView<'a> {
    fn new(paste: &'a Paste, now: DateTime<Utc>) -> Self {
        Self {
            paste,
            expires_at: paste.expires_at(),
            expired: paste.is_expired_at(now),
        }
    }
}

fn effective_verbosity(configured: u8, verbose: u8, quiet: bool) -> u8 {
    if quiet {
        0
    } else if verbose > 0 {
        verbose.min(2)
    } else {
        configured
    }
}

fn init_tracing(default_filter: &str) {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .unwrap_or_else(|_| EnvFilter::new("paster=info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn read_code(file: Option<&PathBuf>, stdin: &mut dyn Read) -> anyhow::Result<String> {
    let code = match file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?,
        None => {
            let mut buffer = String::new();
            stdin.read_to_string(&mut buffer).context("reading stdin")?;
            buffer
        }
    };
    if code.is_empty() {
        bail!("refusing to store an empty paste");
    }
    Ok(code)
}

fn expiry_label(paste: &Paste, now: DateTime<Utc>) -> String {
    if paste.is_expired_at(now) {
        "expired".to_string()
    } else {
        format!("expires in {}", format_time_left(paste.time_left(now)))
    }
}

fn format_created(id: &str, json: bool) -> anyhow::Result<String> {
    if json {
        return Ok(serde_json::to_string_pretty(&serde_json::json!({ "id": id }))?);
    }
    Ok(id.to_string())
}

fn format_paste(paste: &Paste, now: DateTime<Utc>, json: bool) -> anyhow::Result<String> {
    if json {
        return Ok(serde_json::to_string_pretty(&PasteView::new(paste, now))?);
    }

    let mut out = format!(
        "{} by {} [{}]\nid: {}  created: {}  {}{}\n\n",
        paste.title,
        paste.author,
        paste.language,
        paste.id,
        paste.created_at.format("%Y-%m-%d %H:%M:%S UTC"),
        expiry_label(paste, now),
        if paste.visible { "" } else { "  (hidden)" },
    );
    out.push_str(&paste.code);
    Ok(out)
}

fn format_listing(pastes: &[Paste], now: DateTime<Utc>, json: bool) -> anyhow::Result<String> {
    if json {
        let views: Vec<_> = pastes.iter().map(|p| PasteView::new(p, now)).collect();
        return Ok(serde_json::to_string_pretty(&views)?);
    }

    let rows: Vec<String> = pastes
        .iter()
        .map(|p| {
            format!(
                "{:<12} {:<30} {:<16} {:<12} {}",
                p.id,
                p.title,
                p.author,
                p.language,
                expiry_label(p, now)
            )
        })
        .collect();
    Ok(rows.join("\n"))
}

fn format_sweep(deleted: usize, json: bool) -> anyhow::Result<String> {
    if json {
        return Ok(serde_json::to_string_pretty(&serde_json::json!({ "deleted": deleted }))?);
    }
    Ok(format!("Removed {} expired paste(s)", deleted))
}

/// Run every command that completes on its own and render its output.
fn execute(
    store: &Store,
    command: &Commands,
    json: bool,
    now: DateTime<Utc>,
    stdin: &mut dyn Read,
) -> anyhow::Result<String> {
    match command {
        Commands::New {
            file,
            title,
            author,
            language,
            lifetime,
            hidden,
        } => {
            let code = read_code(file.as_ref(), stdin)?;
            let mut paste = NewPaste::new(
                title.as_str(),
                author.as_str(),
                language.as_str(),
                code,
                Lifetime::parse_or_default(lifetime),
            );
            if *hidden {
                paste = paste.hidden();
            }
            let id = store.insert(paste)?;
            format_created(&id, json)
        }
        Commands::Get { id } => match store.get(id)? {
            Some(paste) => format_paste(&paste, now, json),
            None => bail!("paste '{}' not found", id),
        },
        Commands::Recent { limit } => format_listing(&store.recent(*limit)?, now, json),
        Commands::Search {
            title,
            author,
            language,
            limit,
        } => {
            let filter = SearchFilter::new(title.as_deref(), author.as_deref(), language.as_deref());
            format_listing(&store.search(*limit, &filter)?, now, json)
        }
        Commands::Clean { .. } => format_sweep(store.sweep()?.deleted, json),
    }
}

/// Interval for `clean` runs that keep going, or `None` for a single sweep.
fn watch_interval(command: &Commands, config: &Config) -> Option<Duration> {
    match command {
        Commands::Clean {
            every: Some(secs), ..
        } => Some(Duration::from_secs(*secs)),
        Commands::Clean { watch: true, .. } => Some(config.sweep_interval),
        _ => None,
    }
}

fn main() -> anyhow::Result<()> {
    let Cli {
        database,
        json,
        verbose,
        quiet,
        command,
    } = Cli::parse();

    let mut config = Config::from_env();
    if let Some(path) = database {
        config.db_path = path;
    }
    config.verbosity = effective_verbosity(config.verbosity, verbose, quiet);
    init_tracing(config.log_filter());

    if let Some(interval) = watch_interval(&command, &config) {
        // Open per sweep so other processes can use the file between ticks.
        let sweeper = Sweeper::spawn_detached(&config.db_path, config.store_options(), interval)
            .context("starting sweeper")?;
        tracing::info!(
            path = %config.db_path,
            interval_secs = interval.as_secs(),
            "sweeping until interrupted"
        );
        sweeper.join();
        return Ok(());
    }

    let store = Store::open_with(&config.db_path, config.store_options())
        .with_context(|| format!("opening paste store at {}", config.db_path))?;

    let output = execute(&store, &command, json, Utc::now(), &mut io::stdin())?;
    if !output.is_empty() {
        println!("{}", output);
    }
    store.close()?;
    Ok(())
}
