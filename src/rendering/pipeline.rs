//! The end-to-end render: plan, fetch, compose, annotate, export.

use super::context::RenderContext;
use super::export::{Artifact, PageExporter};
use super::georef::GeoReferencer;
use super::mosaic::Mosaic;
use super::overlay::OverlayRenderer;
use super::planner::GridPlan;
use crate::core::config::{RenderOptions, RenderProfile};
use crate::data::RenderRequest;
use crate::tiles::{TileFetcher, TileLoader};
use crate::{MapError, Result};
use std::sync::Arc;

/// Everything one render produced besides the files on disk.
#[derive(Debug, Clone)]
pub struct RenderOutput {
    pub artifact: Artifact,
    pub plan: GridPlan,
    pub context: RenderContext,
    pub missing_tiles: usize,
}

/// Turns render requests into page artifacts.
///
/// Stages run strictly in sequence; only the tile stage does concurrent
/// I/O, and it completes before composition starts. Each call to
/// [`ReportRenderer::render`] owns its canvas, grid and anchor, so one
/// renderer can serve concurrent requests.
#[derive(Clone)]
pub struct ReportRenderer {
    loader: TileLoader,
    overlays: OverlayRenderer,
    exporter: PageExporter,
}

impl ReportRenderer {
    /// Renderer fetching tiles over HTTP as configured.
    pub fn new(options: RenderOptions) -> Result<Self> {
        options.validate()?;
        Ok(Self::assemble(TileLoader::from_config(&options.tile_loader), &options))
    }

    pub fn with_profile(profile: RenderProfile) -> Result<Self> {
        Self::new(profile.resolve())
    }

    /// Renderer using a caller-supplied tile fetcher.
    pub fn with_fetcher(fetcher: Arc<dyn TileFetcher>, options: RenderOptions) -> Result<Self> {
        options.validate()?;
        Ok(Self::assemble(TileLoader::new(fetcher, &options.tile_loader), &options))
    }

    fn assemble(loader: TileLoader, options: &RenderOptions) -> Self {
        Self {
            loader,
            overlays: OverlayRenderer::new(options.marker.clone()),
            exporter: PageExporter::from_config(&options.output),
        }
    }

    pub fn loader(&self) -> &TileLoader {
        &self.loader
    }

    pub fn exporter(&self) -> &PageExporter {
        &self.exporter
    }

    /// Plans the grid and composes the tile mosaic, without overlays.
    pub async fn compose(&self, request: &RenderRequest) -> Result<(GridPlan, Mosaic, usize)> {
        let plan = GridPlan::new(
            request.center,
            request.zoom,
            request.dimensions,
            request.page_size,
        )?;
        log::info!(
            "rendering {} tiles at zoom {} around ({}, {})",
            plan.range.len(),
            request.zoom,
            request.center.lng,
            request.center.lat
        );

        let tiles = self.loader.load_range(&plan.range).await;
        let missing = tiles.missing.len();
        let mosaic = Mosaic::compose(plan.range, &tiles);
        Ok((plan, mosaic, missing))
    }

    /// Runs every stage and writes the PDF and PNG artifacts.
    pub async fn render(&self, request: &RenderRequest) -> Result<RenderOutput> {
        let (plan, mosaic, missing_tiles) = self.compose(request).await?;

        let georef = GeoReferencer::from_grid(&mosaic.grid);
        let mut context = RenderContext::new(mosaic.width(), mosaic.height());
        let canvas = self
            .overlays
            .draw(mosaic.canvas, &georef, &request.overlays, &mut context);

        if !request.shape_overlays.is_empty() {
            log::debug!(
                "{} shape overlays carried through without drawing",
                request.shape_overlays.len()
            );
        }

        let exporter = self.exporter.clone();
        let page = plan.page;
        let artifact = tokio::task::spawn_blocking(move || exporter.export(&canvas, &page))
            .await
            .map_err(|e| MapError::Io(std::io::Error::new(std::io::ErrorKind::Other, e)))?
            .map_err(|e| {
                log::error!("failed to write render artifact: {}", e);
                e
            })?;

        Ok(RenderOutput {
            artifact,
            plan,
            context,
            missing_tiles,
        })
    }
}
