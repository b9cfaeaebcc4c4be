//! tileprint-cli - render a map report page from a JSON request
//!
//! Usage:
//!   tileprint-cli request.json
//!   tileprint-cli request.json --config options.json --output-dir ./reports
//!   tileprint-cli request.json --page-size tabloid --profile high-throughput

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use tileprint::rendering::PageSize;
use tileprint::{RenderOptions, RenderProfile, RenderRequest, ReportRenderer};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Profile {
    Balanced,
    LowResource,
    HighThroughput,
}

#[derive(Debug, Parser)]
#[command(name = "tileprint-cli", version, about = "Render map tiles and overlays to a print-ready page")]
struct Args {
    /// Render request JSON: center, dimensions, zoom, overlays, page_size
    request: PathBuf,

    /// Options JSON file; fields not given keep their defaults
    #[arg(long)]
    config: Option<PathBuf>,

    /// Preset used when no config file is given
    #[arg(long, value_enum, default_value_t = Profile::Balanced)]
    profile: Profile,

    /// Directory receiving the PDF and PNG
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Directory for cached tiles
    #[arg(long)]
    cache_dir: Option<PathBuf>,

    /// Overrides the page size named in the request (letter or tabloid)
    #[arg(long)]
    page_size: Option<PageSize>,

    /// Scale the map down to fit within the page margins
    #[arg(long)]
    fit_to_page: bool,
}

fn load_options(args: &Args) -> Result<RenderOptions> {
    let mut options = match &args.config {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config: {}", path.display()))?;
            RenderOptions::from_json(&json)
                .with_context(|| format!("Invalid config: {}", path.display()))?
        }
        None => match args.profile {
            Profile::Balanced => RenderProfile::Balanced,
            Profile::LowResource => RenderProfile::LowResource,
            Profile::HighThroughput => RenderProfile::HighThroughput,
        }
        .resolve(),
    };

    if let Some(dir) = &args.output_dir {
        options.output.output_dir = dir.clone();
    }
    if let Some(dir) = &args.cache_dir {
        options.tile_loader.cache_dir = dir.clone();
    }
    if args.fit_to_page {
        options.output.fit_to_page = true;
    }
    Ok(options)
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let options = load_options(&args)?;

    let json = std::fs::read_to_string(&args.request)
        .with_context(|| format!("Failed to read request: {}", args.request.display()))?;
    let mut request = RenderRequest::from_json(&json)
        .with_context(|| format!("Invalid request: {}", args.request.display()))?;
    if let Some(page_size) = args.page_size {
        request.page_size = page_size;
    }

    let renderer = ReportRenderer::new(options).context("Failed to set up renderer")?;
    let output = renderer.render(&request).await.context("Render failed")?;

    if output.missing_tiles > 0 {
        log::warn!("{} tiles could not be loaded and were left blank", output.missing_tiles);
    }
    for entry in output.context.legend() {
        log::info!(
            "overlay {} {}: {} drawn, {} outside the map",
            entry.color,
            entry.name.as_deref().unwrap_or(""),
            entry.drawn,
            entry.skipped
        );
    }

    println!(
        "{}",
        serde_json::to_string_pretty(&output.artifact).context("Failed to encode artifact")?
    );
    Ok(())
}
