use clap::Parser;
use diskimg_server::Catalog;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "diskimg-server", about = "Reference server for the disk image API")]
struct Cli {
    /// Port to listen on.
    #[arg(long, default_value_t = 8322)]
    port: u16,

    /// JSON array of stock disk images to serve instead of the built-in set.
    #[arg(long)]
    seed: Option<PathBuf>,

    /// Require this bearer token on API requests.
    #[arg(long, env = "DISKIMG_SERVER_API_KEY")]
    api_key: Option<String>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let catalog = match cli.seed {
        Some(ref path) => {
            let loaded = std::fs::read(path)
                .map_err(|e| e.to_string())
                .and_then(|data| Catalog::from_seed_json(&data).map_err(|e| e.to_string()));
            match loaded {
                Ok(catalog) => catalog,
                Err(e) => {
                    error!("failed to load seed {}: {e}", path.display());
                    return ExitCode::FAILURE;
                }
            }
        }
        None => Catalog::new(diskimg_server::stock_images()),
    };
    let catalog = match cli.api_key {
        Some(ref key) => catalog.with_api_key(key),
        None => catalog,
    };

    let addr = format!("0.0.0.0:{}", cli.port);
    info!("starting diskimg-server on {addr}");

    if let Err(e) = diskimg_server::run_server(&Arc::new(catalog), &addr) {
        error!("server failed: {e}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
