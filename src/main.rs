/// Main entry point for the Plexling CLI
use anyhow::{anyhow, Result};
use clap::Parser;
use plexling::{
    manual_server, stream_url, Catalog, Config, MediaServerApi, PlexApi, ProbeDiscovery, Server,
    ServerDiscovery,
};
use std::sync::Arc;
use tracing::info;

#[derive(Parser, Debug)]
#[command(
    name = "plexling",
    version,
    about = "Browse and stream from Plex-style home media servers",
    long_about = None
)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Server base URL (falls back to the configured server)
    #[arg(short, long)]
    server: Option<String>,

    /// Access token (falls back to the stored token)
    #[arg(short, long)]
    token: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "warn")]
    log_level: String,
}

#[derive(Parser, Debug)]
enum Command {
    /// Probe the local network for servers
    Discover,

    /// Show the selected server's identity
    Info,

    /// List the server's libraries
    Libraries,

    /// List recently added media
    Recent {
        /// Maximum number of items
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },

    /// List the contents of one library
    Browse {
        /// Library ID
        library_id: String,
    },

    /// Show details for one media item
    Detail {
        /// Media ID
        media_id: String,
    },

    /// Print the direct-play URL for one media item
    Url {
        /// Media ID
        media_id: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args.log_level)?;

    let config = Config::load()?;
    let api = Arc::new(PlexApi::new());

    match args.command {
        Command::Discover => {
            let discovery = ProbeDiscovery::new(api.clone());
            let servers = discovery.discover().await;
            if servers.is_empty() {
                println!("No servers found.");
            }
            for server in servers {
                println!(
                    "{}  {}  v{}  ({})",
                    server.id,
                    server.name,
                    server.version,
                    server.base_url()
                );
            }
        }
        Command::Info => {
            let server = resolve_server(&args, &config)?;
            let server = api.server_details(&server).await;
            println!("Name:    {}", server.name);
            println!("Version: {}", server.version);
            println!("Address: {}", server.base_url());
        }
        Command::Libraries => {
            let server = resolve_server(&args, &config)?;
            let catalog = Catalog::new(api.clone());
            for library in catalog.refresh_libraries(&server).await {
                println!(
                    "{:>4}  {:<30}  {:?}  ({} items)",
                    library.id, library.title, library.kind, library.count
                );
            }
            save_snapshot(&catalog).await;
        }
        Command::Recent { limit } => {
            let server = resolve_server(&args, &config)?;
            let catalog = Catalog::new(api.clone());
            for item in catalog.refresh_recent(&server, limit).await {
                print_item_line(&item);
            }
            save_snapshot(&catalog).await;
        }
        Command::Browse { ref library_id } => {
            let server = resolve_server(&args, &config)?;
            let catalog = Catalog::new(api.clone());
            for item in catalog.fetch_library_content(&server, &library_id).await {
                print_item_line(&item);
            }
        }
        Command::Detail { ref media_id } => {
            let server = resolve_server(&args, &config)?;
            let item = api
                .media_details(&server, &media_id)
                .await
                .map_err(|e| anyhow!("failed to fetch media {media_id}: {e}"))?;
            println!("Title:    {}", item.title);
            if let Some(show) = &item.grandparent_title {
                println!("Show:     {show}");
            }
            if let Some(year) = item.year {
                println!("Year:     {year}");
            }
            println!("Kind:     {:?}", item.kind);
            println!("Duration: {} min", item.duration_ms / 60_000);
            if let Some(summary) = &item.summary {
                println!("\n{summary}");
            }
            for format in &item.media {
                println!(
                    "\nFormat {}: {} / {} in {}",
                    format.id,
                    format.video_codec.as_deref().unwrap_or("?"),
                    format.audio_codec.as_deref().unwrap_or("?"),
                    format.container.as_deref().unwrap_or("?")
                );
                for part in &format.parts {
                    println!("  part {}  {}", part.id, part.key);
                }
            }
        }
        Command::Url { ref media_id } => {
            let server = resolve_server(&args, &config)?;
            let item = api
                .media_details(&server, &media_id)
                .await
                .map_err(|e| anyhow!("failed to fetch media {media_id}: {e}"))?;
            match stream_url(&server, &item) {
                Some(url) => println!("{url}"),
                None => return Err(anyhow!("media {media_id} has no playable part")),
            }
        }
    }

    Ok(())
}

fn init_logging(level: &str) -> Result<()> {
    let level_filter: tracing_subscriber::filter::LevelFilter = level
        .parse()
        .map_err(|e| anyhow!("invalid log level {level}: {e}"))?;
    tracing_subscriber::fmt()
        .with_max_level(level_filter)
        .init();
    Ok(())
}

/// Build the target server from --server/--token, falling back to the
/// configured server and stored token.
fn resolve_server(args: &Args, config: &Config) -> Result<Server> {
    let url = args
        .server
        .clone()
        .or_else(|| config.server.as_ref().map(|s| s.url.clone()))
        .ok_or_else(|| anyhow!("no server given; pass --server or configure one"))?;

    let mut server = manual_server(&url)?;
    if let Some(name) = config.server.as_ref().and_then(|s| s.name.clone()) {
        server.name = name;
    }

    server.access_token = match &args.token {
        Some(token) => Some(token.clone()),
        None => Config::load_token()?.access_token,
    };

    info!("using server at {}", server.base_url());
    Ok(server)
}

/// Refresh the offline snapshot; failures are logged, not fatal
async fn save_snapshot(catalog: &Catalog) {
    if let Err(e) = plexling::cache::write_snapshot(&catalog.snapshot().await) {
        tracing::debug!("failed to write catalog snapshot: {e}");
    }
}

fn print_item_line(item: &plexling::MediaItem) {
    match (&item.grandparent_title, item.parent_index, item.index) {
        (Some(show), Some(season), Some(episode)) => println!(
            "{:>8}  {show} S{season:02}E{episode:02} - {}",
            item.id, item.title
        ),
        _ => match item.year {
            Some(year) => println!("{:>8}  {} ({year})", item.id, item.title),
            None => println!("{:>8}  {}", item.id, item.title),
        },
    }
}
