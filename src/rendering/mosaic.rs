//! Mosaic composition: one canvas built from a rectangular grid of tiles.

use super::planner::TileRange;
use crate::core::constants::TILE_SIZE;
use crate::core::geo::{LatLngBounds, TileCoord};
use crate::tiles::LoadedTiles;
use image::{Rgba, RgbaImage};
use std::collections::BTreeMap;

/// Placement of one tile within the mosaic.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridCell {
    pub bounds: LatLngBounds,
    /// Pixel offset of the cell's top-left corner on the canvas
    pub offset: (u32, u32),
}

/// Index of every tile in the mosaic, ordered row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    range: TileRange,
    cells: BTreeMap<TileCoord, GridCell>,
}

impl Grid {
    /// Lays out every tile of `range` at `(col * 256, row * 256)`.
    pub fn new(range: TileRange) -> Self {
        let cells = range
            .iter()
            .map(|coord| {
                let col = (coord.x - range.min_x) as u32;
                let row = (coord.y - range.min_y) as u32;
                let cell = GridCell {
                    bounds: coord.bounds(),
                    offset: (col * TILE_SIZE, row * TILE_SIZE),
                };
                (coord, cell)
            })
            .collect();
        Self { range, cells }
    }

    pub fn range(&self) -> &TileRange {
        &self.range
    }

    pub fn zoom(&self) -> u8 {
        self.range.zoom
    }

    pub fn get(&self, coord: &TileCoord) -> Option<&GridCell> {
        self.cells.get(coord)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&TileCoord, &GridCell)> {
        self.cells.iter()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Smallest x, smallest y tile.
    pub fn min_tile(&self) -> TileCoord {
        self.range.min_tile()
    }

    /// Largest x, largest y tile.
    pub fn max_tile(&self) -> TileCoord {
        self.range.max_tile()
    }

    /// Union of every cell's geographic bounds.
    pub fn bounds(&self) -> LatLngBounds {
        let min = self.range.min_tile().bounds();
        self.cells
            .values()
            .fold(min, |acc, cell| acc.union(&cell.bounds))
    }

    /// Canvas size needed to hold every cell.
    pub fn pixel_size(&self) -> (u32, u32) {
        (
            self.range.columns() * TILE_SIZE,
            self.range.rows() * TILE_SIZE,
        )
    }
}

/// The composited tile canvas and the index describing it.
#[derive(Debug, Clone)]
pub struct Mosaic {
    pub canvas: RgbaImage,
    pub grid: Grid,
}

impl Mosaic {
    /// Pastes every available tile at its grid offset. Missing tiles leave
    /// their cell transparent.
    pub fn compose(range: TileRange, tiles: &LoadedTiles) -> Self {
        let grid = Grid::new(range);
        let (width, height) = grid.pixel_size();
        let mut canvas = RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, 0]));

        let mut pasted = 0;
        for (coord, cell) in grid.iter() {
            let Some(tile) = tiles.get(coord) else {
                log::debug!("no image for tile {}, leaving cell blank", coord);
                continue;
            };
            image::imageops::replace(&mut canvas, tile, cell.offset.0 as i64, cell.offset.1 as i64);
            pasted += 1;
        }

        log::info!(
            "composed {}x{} mosaic from {}/{} tiles",
            width,
            height,
            pasted,
            grid.len()
        );
        Self { canvas, grid }
    }

    pub fn width(&self) -> u32 {
        self.canvas.width()
    }

    pub fn height(&self) -> u32 {
        self.canvas.height()
    }
}
