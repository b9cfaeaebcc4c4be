//! Prelude module for common tileprint types and traits
//!
//! This module re-exports the most commonly used types, traits, and functions
//! for easy importing with `use tileprint::prelude::*;`

pub use crate::core::{
    config::{MarkerStyle, OutputConfig, RenderOptions, RenderProfile, TileLoaderConfig},
    geo::{LatLng, LatLngBounds, Point, TileCoord},
    projection::{lat_lng_to_raster, raster_to_lat_lng},
};

pub use crate::data::{Overlay, RenderRequest, Rgb};

pub use crate::tiles::{
    DiskTileCache, HttpTileFetcher, LoadedTiles, MemoryTileCache, TileFetcher, TileLoader,
    TileSource, UrlTemplateSource,
};

pub use crate::rendering::{
    Artifact, GeoReferencer, Grid, GridPlan, Mosaic, OverlayRenderer, PageExporter, PageSize,
    PageSpec, RenderContext, RenderOutput, ReportRenderer,
};

pub use crate::{Error as MapError, Result};

pub use std::sync::Arc;
