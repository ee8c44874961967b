use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use dossier_client::{ChromeSession, OpenAiIndustryClassifier};
use dossier_core::traits::{CookieJar, IndustryClassifier, NullStore, ProfileStore};
use dossier_core::{
    AppError, Credentials, MemoryProfileStore, PipelineConfig, ProfileCache, ProfileRecord,
    ProfileService,
};
use dossier_db::{Database, DatabaseConfig};

#[derive(Parser)]
#[command(name = "dossier", version, about = "Professional profile acquisition with a freshness-bounded cache")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch a profile, from the cache when fresh, otherwise by scraping it
    Profile(ProfileArgs),

    /// Show the cached snapshot for an identity or profile URL, at any age
    Show {
        /// Account identity or canonical profile URL
        key: String,
    },

    /// Drop the cached snapshot for an identity or profile URL
    Evict {
        /// Account identity or canonical profile URL
        key: String,
    },
}

#[derive(Args)]
struct ProfileArgs {
    /// Account identity used to sign in (and cache key for the own profile)
    #[arg(short, long, env = "DOSSIER_IDENTITY")]
    identity: String,

    /// Account secret
    #[arg(short, long, env = "DOSSIER_SECRET", hide_env_values = true)]
    secret: String,

    /// Someone else's profile URL; omit to fetch the signed-in account's own profile
    #[arg(short, long)]
    url: Option<String>,

    /// Show the browser window instead of running headless
    #[arg(long, default_value_t = false)]
    headed: bool,

    /// Navigation timeout in seconds
    #[arg(long, default_value_t = 30)]
    nav_timeout: u64,

    /// Print the one-line summary instead of JSON
    #[arg(long, default_value_t = false)]
    summary: bool,

    /// LLM model for industry classification (enables enrichment together with --api-key)
    #[arg(short, long, env = "DOSSIER_MODEL")]
    model: Option<String>,

    /// OpenAI-compatible API base URL
    #[arg(
        short,
        long,
        env = "DOSSIER_BASE_URL",
        default_value = "https://api.openai.com/v1"
    )]
    base_url: String,

    /// API key for the industry classifier
    #[arg(short, long, env = "DOSSIER_OPENAI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("dossier=info".parse()?))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Profile(args) => {
            let cancel = CancellationToken::new();
            let on_signal = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    tracing::warn!("Interrupted, stopping after the current step");
                    on_signal.cancel();
                }
            });

            let record = match connect_db().await? {
                Some(db) => cmd_profile(db.profile_repo(), db.cookie_repo(), &args, &cancel).await?,
                None => {
                    tracing::warn!("DATABASE_URL not set, caching in memory for this run only");
                    cmd_profile(MemoryProfileStore::default(), NullStore, &args, &cancel).await?
                }
            };

            if args.summary {
                println!("{}", record.summary());
            } else {
                println!("{}", serde_json::to_string_pretty(&record)?);
            }
        }
        Commands::Show { key } => {
            let db = require_db().await?;
            cmd_show(db.profile_repo(), &key).await?;
        }
        Commands::Evict { key } => {
            let db = require_db().await?;
            let config = PipelineConfig::from_env()?;
            let removed = ProfileCache::new(db.profile_repo(), config.freshness)
                .evict(&key)
                .await?;
            println!("Removed {removed} cached snapshot(s) for {key}");
        }
    }

    Ok(())
}

/// Connect and migrate when `DATABASE_URL` is set.
async fn connect_db() -> Result<Option<Database>> {
    if std::env::var("DATABASE_URL").is_err() {
        return Ok(None);
    }
    require_db().await.map(Some)
}

async fn require_db() -> Result<Database> {
    let config = DatabaseConfig::from_env()?;
    let db = Database::connect(&config)
        .await
        .context("Failed to connect to database")?;
    db.health_check().await.context("Database is not answering queries")?;
    db.migrate().await?;
    Ok(db)
}

async fn cmd_profile<P, J>(
    store: P,
    jar: J,
    args: &ProfileArgs,
    cancel: &CancellationToken,
) -> Result<ProfileRecord>
where
    P: ProfileStore,
    J: CookieJar,
{
    let config = PipelineConfig::from_env()?;
    let key = args.url.as_deref().unwrap_or(&args.identity);

    // Answer fresh hits without starting a browser at all.
    if let Some(hit) = ProfileCache::new(store.clone(), config.freshness)
        .lookup(key)
        .await?
    {
        return Ok(hit);
    }

    let session = ChromeSession::launch_with(!args.headed, Duration::from_secs(args.nav_timeout))
        .await
        .context("Failed to launch browser")?;
    let credentials = Credentials::new(&args.identity, &args.secret);
    let service = ProfileService::new(session, store, jar, config);

    let (result, session) = match (&args.model, &args.api_key) {
        (Some(model), Some(api_key)) => {
            let classifier = OpenAiIndustryClassifier::with_base_url(api_key, model, &args.base_url)?;
            let service = service.with_classifier(classifier);
            let result = acquire(&service, args, &credentials, cancel).await;
            (result, service.into_session())
        }
        _ => {
            let result = acquire(&service, args, &credentials, cancel).await;
            (result, service.into_session())
        }
    };

    if let Err(e) = session.close().await {
        tracing::warn!(error = %e, "Browser did not shut down cleanly");
    }
    result.with_context(|| format!("Failed to acquire profile for {key}"))
}

async fn acquire<P, J, C>(
    service: &ProfileService<ChromeSession, P, J, C>,
    args: &ProfileArgs,
    credentials: &Credentials,
    cancel: &CancellationToken,
) -> Result<ProfileRecord, AppError>
where
    P: ProfileStore,
    J: CookieJar,
    C: IndustryClassifier,
{
    match &args.url {
        Some(url) => service.get_profile_by_url(url, credentials, cancel).await,
        None => service.get_profile(&args.identity, credentials, cancel).await,
    }
}

async fn cmd_show<P: ProfileStore>(store: P, key: &str) -> Result<()> {
    let config = PipelineConfig::from_env()?;
    let cache = ProfileCache::new(store, config.freshness);

    let Some(cached) = cache.inspect(key).await? else {
        println!("No cached snapshot for {key}");
        return Ok(());
    };

    let age = Utc::now() - cached.updated_at;
    let status = if age < cache.window() { "fresh" } else { "STALE" };
    println!(
        "[{status}] {key} updated {} ({}h ago, hash: {}...)\n",
        cached.updated_at.format("%Y-%m-%d %H:%M:%S UTC"),
        age.num_hours(),
        &cached.data_hash[..cached.data_hash.len().min(8)],
    );
    println!("{}", serde_json::to_string_pretty(&cached.profile)?);

    Ok(())
}
