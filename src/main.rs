use anyhow::Context;
use clap::{Parser, Subcommand};
use needle_storage::{config::Config, create_router, utils, AppState};
use std::io::Write;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::info;

#[derive(Parser)]
#[command(name = "needle-storage", version, about = "Upload files to S3 over HTTP")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server (default)
    Serve,
    /// Fetch an object and print its contents
    Download {
        /// Object key, e.g. uploads/1700000000000-report.txt
        key: String,
    },
    /// Delete an object
    Delete {
        key: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    utils::init_tracing();

    let cli = Cli::parse();

    // Load configuration
    let config = Config::from_env()?;
    info!("Configuration loaded: {:?}", config.server);

    let state = AppState::from_config(config.clone()).context("Failed to build AWS clients")?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(state, &config).await,
        Command::Download { key } => {
            let object = state.uploads.download_file(&key).await?;
            let mut stdout = std::io::stdout().lock();
            writeln!(
                stdout,
                "Content-Type: {}",
                object.content_type.as_deref().unwrap_or("unknown")
            )?;
            utils::display_text(&object.body, &mut stdout)?;
            Ok(())
        }
        Command::Delete { key } => {
            let message = state.uploads.delete_file(&key).await?;
            info!(key = %key, "{}", message);
            Ok(())
        }
    }
}

async fn serve(state: AppState, config: &Config) -> anyhow::Result<()> {
    info!(
        profile = %config.aws.profile,
        bucket = %config.storage.bucket,
        "Starting upload service"
    );

    let app = create_router(state);

    let ip = config
        .server
        .host
        .parse::<std::net::IpAddr>()
        .with_context(|| format!("HOST is not an IP address: {}", config.server.host))?;
    let addr = SocketAddr::new(ip, config.server.port);
    info!("Server listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

    Ok(())
}
