//! Tile grid planning: which tiles cover a page, and which page they cover.

use crate::core::constants::MAX_ZOOM;
use crate::core::geo::{LatLng, TileCoord};
use crate::{MapError, Result};
use serde::{Deserialize, Serialize};

/// Named output page sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageSize {
    #[default]
    Letter,
    Tabloid,
}

impl PageSize {
    /// Portrait `(width_px, height_px, tiles_across, tiles_up)`.
    const fn portrait_table(self) -> (u32, u32, u32, u32) {
        match self {
            Self::Letter => (1275, 1650, 5, 7),
            Self::Tabloid => (2550, 3300, 10, 14),
        }
    }

    /// Resolves the page for an orientation; landscape swaps both axes.
    pub fn spec(self, orientation: Orientation) -> PageSpec {
        let (width_px, height_px, tiles_across, tiles_up) = self.portrait_table();
        match orientation {
            Orientation::Portrait => PageSpec {
                size: self,
                width_px,
                height_px,
                tiles_across,
                tiles_up,
                orientation,
            },
            Orientation::Landscape => PageSpec {
                size: self,
                width_px: height_px,
                height_px: width_px,
                tiles_across: tiles_up,
                tiles_up: tiles_across,
                orientation,
            },
        }
    }
}

impl std::str::FromStr for PageSize {
    type Err = MapError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "letter" => Ok(Self::Letter),
            "tabloid" => Ok(Self::Tabloid),
            other => Err(MapError::InvalidConfig(format!(
                "unknown page size '{other}' (expected letter or tabloid)"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Portrait,
    Landscape,
}

impl Orientation {
    /// Landscape when the requested view is wider than it is tall.
    pub fn from_dimensions(width: f64, height: f64) -> Self {
        if width > height {
            Self::Landscape
        } else {
            Self::Portrait
        }
    }
}

/// A resolved output page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageSpec {
    pub size: PageSize,
    pub width_px: u32,
    pub height_px: u32,
    pub tiles_across: u32,
    pub tiles_up: u32,
    pub orientation: Orientation,
}

/// Inclusive rectangular range of tiles at one zoom level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileRange {
    pub zoom: u8,
    pub min_x: i32,
    pub min_y: i32,
    pub max_x: i32,
    pub max_y: i32,
}

impl TileRange {
    pub fn columns(&self) -> u32 {
        (self.max_x - self.min_x + 1) as u32
    }

    pub fn rows(&self) -> u32 {
        (self.max_y - self.min_y + 1) as u32
    }

    pub fn len(&self) -> usize {
        self.columns() as usize * self.rows() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn min_tile(&self) -> TileCoord {
        TileCoord::new(self.min_x, self.min_y, self.zoom)
    }

    pub fn max_tile(&self) -> TileCoord {
        TileCoord::new(self.max_x, self.max_y, self.zoom)
    }

    pub fn contains(&self, coord: &TileCoord) -> bool {
        coord.z == self.zoom
            && (self.min_x..=self.max_x).contains(&coord.x)
            && (self.min_y..=self.max_y).contains(&coord.y)
    }

    /// Yields every tile row-major: rows outer, columns inner, both ascending.
    pub fn iter(&self) -> impl Iterator<Item = TileCoord> + '_ {
        (self.min_y..=self.max_y).flat_map(move |y| {
            (self.min_x..=self.max_x).map(move |x| TileCoord::new(x, y, self.zoom))
        })
    }
}

/// Output of planning: the tiles to fetch and the page they are printed on.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridPlan {
    pub center: LatLng,
    pub center_tile: TileCoord,
    pub range: TileRange,
    pub page: PageSpec,
}

impl GridPlan {
    /// Plans the tile grid around `center`.
    ///
    /// `dimensions` is the requested view `(width, height)`; it only decides
    /// orientation. The grid spans `tiles_across + 1` columns and
    /// `tiles_up + 1` rows so an off-center view still fills the page.
    pub fn new(center: LatLng, zoom: u8, dimensions: (f64, f64), page_size: PageSize) -> Result<Self> {
        if zoom > MAX_ZOOM {
            return Err(MapError::InvalidConfig(format!(
                "zoom {zoom} exceeds the maximum of {MAX_ZOOM}"
            )));
        }
        if !center.is_finite() {
            return Err(MapError::InvalidCoordinates(format!(
                "center ({}, {}) is not a finite coordinate",
                center.lng, center.lat
            )));
        }
        // Latitude is clamped to the Mercator range; longitude has no such fallback.
        if !LatLng::new(LatLng::clamp_lat(center.lat), center.lng).is_valid() {
            return Err(MapError::InvalidCoordinates(format!(
                "center longitude {} lies outside -180..=180",
                center.lng
            )));
        }
        let (width, height) = dimensions;
        if !(width.is_finite() && height.is_finite()) || width <= 0.0 || height <= 0.0 {
            return Err(MapError::InvalidConfig(format!(
                "dimensions [{width}, {height}] must be positive numbers"
            )));
        }

        let orientation = Orientation::from_dimensions(width, height);
        let page = page_size.spec(orientation);
        let center_tile = TileCoord::from_lat_lng(&center, zoom);

        let min_x = center_tile.x - (page.tiles_across / 2) as i32;
        let min_y = center_tile.y - (page.tiles_up / 2) as i32;
        let range = TileRange {
            zoom,
            min_x,
            min_y,
            max_x: min_x + page.tiles_across as i32,
            max_y: min_y + page.tiles_up as i32,
        };

        log::debug!(
            "planned {}x{} tiles around {} ({:?} {:?})",
            range.columns(),
            range.rows(),
            center_tile,
            page.size,
            page.orientation
        );

        Ok(Self {
            center,
            center_tile,
            range,
            page,
        })
    }
}
