//! # tileprint
//!
//! Renders print-ready map pages from slippy-map raster tiles.
//!
//! A render plans the grid of tiles covering a page, resolves each tile
//! through an in-memory and on-disk cache before going to the network,
//! stitches the tiles into one mosaic, draws colored point overlays at their
//! geo-referenced pixel positions, and writes the result as a PNG plus a
//! single-page PDF.

pub mod core;
pub mod data;
pub mod prelude;
pub mod rendering;
pub mod tiles;
pub use crate::core::constants;

// Re-export public API
pub use crate::core::{
    config::{RenderOptions, RenderProfile},
    geo::{LatLng, LatLngBounds, Point, TileCoord},
};

pub use data::{Overlay, RenderRequest, Rgb};

pub use rendering::{
    Artifact, GeoReferencer, GridPlan, Mosaic, PageExporter, PageSize, RenderContext,
    RenderOutput, ReportRenderer,
};

pub use tiles::{DiskTileCache, MemoryTileCache, TileFetcher, TileLoader};

/// Result type used throughout the library
pub type Result<T> = std::result::Result<T, MapError>;

/// Common error types
#[derive(Debug, thiserror::Error)]
pub enum MapError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("PDF error: {0}")]
    Pdf(String),

    #[error("Tile unavailable: {0}")]
    TileUnavailable(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid coordinates: {0}")]
    InvalidCoordinates(String),

    #[error("Parse error: {0}")]
    ParseError(String),
}

/// Error type alias for convenience
pub type Error = MapError;
