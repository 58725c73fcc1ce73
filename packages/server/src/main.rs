#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Pricing dashboard server binary.

use std::path::PathBuf;

use clap::Parser;
use pricing_map_server::{ServerConfig, interactive, run_server};

#[derive(Parser)]
#[command(name = "pricing_map_server", about = "Land-surveying pricing dashboard")]
struct Cli {
    /// Pricing `GeoJSON` file (overrides `PRICING_DATASET_PATH`)
    #[arg(long)]
    dataset: Option<PathBuf>,
    /// Directory served under `/assets` (overrides `PRICING_ASSETS_DIR`)
    #[arg(long)]
    assets: Option<PathBuf>,
    /// Prompt for bind address, port and dataset before starting
    #[arg(long)]
    interactive: bool,
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let cli = Cli::parse();

    let mut config = ServerConfig::from_env();
    if let Some(dataset) = cli.dataset {
        config.dataset_path = dataset;
    }
    if let Some(assets) = cli.assets {
        config.assets_dir = assets;
    }

    if cli.interactive {
        interactive::run(config).await
    } else {
        run_server(config).await
    }
}
