mod config;

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use console::style;
use tracing_subscriber::{fmt, EnvFilter};

use share_core::{
    render_html, DisplayData, GeneratedPage, OnDemandPolicy, PageConfig, PlaybackId, PlaybackPage,
    StartTimeOffset, StaticPaths,
};

fn version_string() -> &'static str {
    const VERSION: &str = env!("CARGO_PKG_VERSION");
    const GIT_HASH: &str = env!("GIT_HASH");

    if GIT_HASH.is_empty() {
        VERSION
    } else {
        // Called once by clap; the string lives for the whole process.
        Box::leak(format!("{VERSION} ({GIT_HASH})").into_boxed_str())
    }
}

/// Shareable video pages with on-demand generation.
#[derive(Parser)]
#[command(name = "share-player", version = version_string(), about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server.
    Serve {
        /// Listen address (e.g. 0.0.0.0:8080). Overrides config file.
        #[arg(short, long)]
        listen: Option<SocketAddr>,

        /// Path to TOML config file.
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Render the page for one playback id and print it (no server).
    Render {
        /// Playback id of the hosted video.
        id: String,

        /// Start offset in seconds, parsed like the `time` query parameter.
        #[arg(short, long)]
        time: Option<String>,

        /// Public origin used for the share link.
        #[arg(long)]
        host_url: Option<String>,

        /// Print the page view as JSON instead of HTML.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Print the static-generation contract.
    Paths,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { listen, config } => {
            run_serve(listen, config).await;
        }
        Commands::Render {
            id,
            time,
            host_url,
            json,
        } => {
            fmt()
                .with_env_filter(
                    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
                )
                .with_writer(std::io::stderr)
                .init();
            if let Err(e) = run_render(id, time, host_url, json) {
                eprintln!("{} {}", style("error:").red().bold(), e);
                std::process::exit(1);
            }
        }
        Commands::Paths => run_paths(),
    }
}

async fn run_serve(listen_override: Option<SocketAddr>, config_path: Option<PathBuf>) {
    let app_config = if let Some(ref path) = config_path {
        match config::AppConfig::load(path) {
            Ok(c) => {
                init_tracing(&c.server.log_format);
                tracing::info!(path = %path.display(), "Loaded config file");
                c
            }
            Err(e) => {
                init_tracing("pretty");
                tracing::error!("{}", e);
                std::process::exit(1);
            }
        }
    } else {
        init_tracing("pretty");
        config::AppConfig::default()
    };

    let listen = listen_override.unwrap_or(app_config.server.listen);
    let page_config = app_config.page.to_page_config();

    let state = share_api::state::AppState::new().with_config(page_config.clone());
    let prebuilt = state.pages.prebuild(|id| state.generate(id));

    tracing::info!(
        %listen,
        host_url = %page_config.host_url,
        prebuilt,
        "Starting share player server"
    );
    if let Err(e) = share_api::serve_with_state(listen, state, share_api::shutdown_signal()).await
    {
        tracing::error!(error = %e, "Server failed");
        std::process::exit(1);
    }

    tracing::info!("Shutdown complete");
}

fn run_render(
    id: String,
    time: Option<String>,
    host_url: Option<String>,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut page_config = PageConfig::default();
    if let Some(host) = host_url {
        config::validate_host_url(&host)?;
        page_config = page_config.with_host_url(host);
    }

    let id = PlaybackId::parse(id)?;
    let start_time = StartTimeOffset::from_query(time.as_deref());
    let generated = GeneratedPage::new(DisplayData::resolve(id, &page_config));
    tracing::debug!(etag = %generated.etag, "Generated page");

    let page = PlaybackPage::resolved(
        generated.display.clone(),
        start_time,
        page_config,
        std::sync::Arc::new(share_core::TracingSink),
    );
    let view = page.view();

    if json {
        println!("{}", serde_json::to_string_pretty(&view)?);
    } else {
        print!("{}", render_html(&view));
    }
    Ok(())
}

fn run_paths() {
    let paths = StaticPaths::from_policy(&OnDemandPolicy);

    println!(
        "{} {}",
        style("share-player").bold(),
        style(env!("CARGO_PKG_VERSION")).dim()
    );
    println!(
        "  {} {}",
        style("prebuilt:").dim(),
        if paths.paths.is_empty() {
            style("none".to_string()).yellow()
        } else {
            style(paths.paths.len().to_string()).green()
        }
    );
    println!(
        "  {} {}",
        style("fallback:").dim(),
        if paths.fallback {
            style("on-demand").green()
        } else {
            style("blocking").red()
        }
    );
    println!();
    match serde_json::to_string(&paths) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("{} {}", style("error:").red().bold(), e),
    }
}

fn init_tracing(log_format: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    match log_format {
        "json" => {
            fmt().with_env_filter(filter).json().init();
        }
        _ => {
            fmt().with_env_filter(filter).init();
        }
    }
}
