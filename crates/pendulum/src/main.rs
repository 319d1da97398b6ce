use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pendulum::{AppState, Config, routes};

#[derive(Parser, Debug)]
#[command(name = "pendulum")]
#[command(about = "Browse and edit a folder from the browser")]
#[command(version)]
struct Cli {
    /// Port to listen on
    #[arg(short, long, env = "PENDULUM_PORT", default_value = "8080")]
    port: u16,

    /// Address to bind to
    #[arg(short, long, env = "PENDULUM_BIND", default_value = "0.0.0.0")]
    bind: String,

    /// Folder for display
    #[arg(long, env = "PENDULUM_CONTENTS", default_value = ".")]
    contents: PathBuf,

    /// Folder for display, takes precedence over --contents
    folder: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, env = "PENDULUM_VERBOSE")]
    verbose: bool,

    /// Config file path (optional)
    #[arg(short, long, env = "PENDULUM_CONFIG")]
    config: Option<PathBuf>,
}

/// Resolve the contents folder against the working directory and make sure
/// it is a directory.
fn resolve_root(cwd: &Path, contents: &Path) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let joined = cwd.join(contents);
    let root_dir = joined
        .canonicalize()
        .map_err(|e| format!("Root directory {} is not accessible: {}", joined.display(), e))?;

    if !root_dir.is_dir() {
        return Err(format!("Root path is not a directory: {}", root_dir.display()).into());
    }

    Ok(root_dir)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose {
        "pendulum=debug,tower_http=debug"
    } else {
        "pendulum=info,tower_http=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load config from file if provided, otherwise use defaults
    let config = if let Some(config_path) = &cli.config {
        Config::from_file(config_path)?
    } else {
        Config::default()
    };

    let contents = cli.folder.as_ref().unwrap_or(&cli.contents);
    let root_dir = resolve_root(&std::env::current_dir()?, contents)?;

    info!("Serving files from: {}", root_dir.display());

    let app = routes::app(AppState::with_config(root_dir, config));

    let addr: SocketAddr = format!("{}:{}", cli.bind, cli.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Started listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
