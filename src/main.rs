use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::{error, info};

use artist_finder::apis::sociavault::SoundSort;
use artist_finder::apis::{ApifyClient, SociaVaultClient};
use artist_finder::app::ports::{ProfilePort, SongDetailPort};
use artist_finder::app::resolve_use_case::provider_http;
use artist_finder::app::ResolveArtistsUseCase;
use artist_finder::config::{Config, Credentials, Provider, DEFAULT_CONFIG_PATH};
use artist_finder::observability::{init_logging, init_metrics};
use artist_finder::pipeline::processing::identity::SocialIdentityExtractor;
use artist_finder::report;
use artist_finder::server::{start_server, AppState, FinderState};
use artist_finder::types::SocialProfile;

#[derive(Parser)]
#[command(name = "artist_finder")]
#[command(about = "Find the TikTok and Instagram accounts of the artists behind a song")]
#[command(version)]
struct Cli {
    /// Path to the TOML config file
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve a song query into ranked artist profiles
    Search {
        /// Artist and/or song title
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,
        /// Maximum number of artists
        #[arg(long)]
        limit: Option<usize>,
        /// Print JSON instead of a text summary
        #[arg(long)]
        json: bool,
    },
    /// Show details of a song by clip id
    Song { clip_id: String },
    /// Show a TikTok profile and the Instagram handle found in its bio
    Profile { username: String },
    /// List sounds matching a keyword (first page only)
    Sounds {
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,
        /// Maximum number of sounds to print (1-10)
        #[arg(long, default_value_t = 5, value_parser = clap::value_parser!(u8).range(1..=10))]
        max: u8,
        /// Alpha-2 country code, e.g. US, ES, MX
        #[arg(long)]
        region: Option<String>,
        /// 0=relevance 1=most used 2=most recent 3=shortest 4=longest
        #[arg(long, value_parser = clap::value_parser!(u8).range(0..=4))]
        sort: Option<u8>,
    },
    /// Serve the HTTP search API
    Serve {
        /// Listen address, overrides server.addr
        #[arg(long)]
        addr: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    let cli = Cli::parse();
    let config = Config::load_or_default(&cli.config)
        .with_context(|| format!("loading {}", cli.config))?;
    let _log_guard = init_logging(&config.logging);
    let credentials = Credentials::from_env();

    match cli.command {
        Commands::Search { query, limit, json } => {
            let query = query.join(" ");
            let finder = ResolveArtistsUseCase::from_config(&config, &credentials)?;
            let limit = config.search.clamp_max_results(limit);

            info!("Searching for \"{}\" (limit {})", query, limit);
            let results = finder.resolve_artists(&query, limit).await;

            if json {
                println!("{}", serde_json::to_string_pretty(&results)?);
            } else {
                println!("{}", report::render_artist_results(&query, &results));
            }
        }
        Commands::Song { clip_id } => {
            let sociavault = SociaVaultClient::new(
                provider_http(&config)?,
                credentials.sociavault_key()?,
            );
            match sociavault.song_details(&clip_id).await? {
                Some(details) => println!("{}", report::render_song_details(&clip_id, &details)),
                None => println!("No song found for clip id {clip_id}."),
            }
        }
        Commands::Profile { username } => {
            let handle = username.trim().trim_start_matches('@').to_string();
            if handle.is_empty() {
                bail!("username must not be empty");
            }
            let profiles = profile_port(&config, &credentials)?;
            match profiles.profile(&handle).await? {
                Some(profile) => print_profile(&profile),
                None => println!("Profile @{handle} not found on TikTok."),
            }
        }
        Commands::Sounds {
            query,
            max,
            region,
            sort,
        } => {
            let query = query.join(" ");
            let sociavault = SociaVaultClient::new(
                provider_http(&config)?,
                credentials.sociavault_key()?,
            );
            let listing = sociavault
                .search_music(&query, region.as_deref(), sort.and_then(SoundSort::from_code))
                .await?;
            println!("{}", report::render_sound_listing(&query, &listing, max as usize));
        }
        Commands::Serve { addr } => {
            init_metrics();
            let addr_str = addr.unwrap_or_else(|| config.server.addr.clone());
            let addr: SocketAddr = addr_str
                .parse()
                .with_context(|| format!("invalid listen address '{addr_str}'"))?;

            // Start even when misconfigured; /api/search reports the problem
            let finder = match ResolveArtistsUseCase::from_config(&config, &credentials) {
                Ok(finder) => FinderState::Ready(Arc::new(finder)),
                Err(e) => {
                    error!("Finder unavailable: {}", e);
                    FinderState::Misconfigured(e.to_string())
                }
            };
            let state = Arc::new(AppState {
                finder,
                search: config.search.clone(),
            });
            start_server(state, addr).await?;
        }
    }

    Ok(())
}

fn profile_port(config: &Config, credentials: &Credentials) -> Result<Arc<dyn ProfilePort>> {
    let http = provider_http(config)?;
    let port: Arc<dyn ProfilePort> = match config.search.profile_source {
        Provider::Apify => Arc::new(ApifyClient::new(http, credentials.apify_token()?)),
        Provider::Sociavault => {
            Arc::new(SociaVaultClient::new(http, credentials.sociavault_key()?))
        }
    };
    Ok(port)
}

fn print_profile(profile: &SocialProfile) {
    let identity = SocialIdentityExtractor::new().extract(&profile.bio, profile.bio_link.as_deref());
    println!("{}", report::render_profile(profile, &identity));
}
