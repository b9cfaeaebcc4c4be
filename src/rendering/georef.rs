//! Geo-referencing between geographic coordinates and mosaic pixels.
//!
//! The mosaic origin is the north-west corner of the grid's minimum tile.
//! The anchor is taken from that tile's *south-west* corner, so every
//! projected point is shifted up by one tile height (`anchor_y - 256`) to
//! land in canvas space.

use super::mosaic::Grid;
use crate::core::constants::TILE_SIZE;
use crate::core::geo::{LatLng, Point};
use crate::core::projection::{lat_lng_to_raster, raster_to_lat_lng};
use geo::Contains;

#[derive(Debug, Clone)]
pub struct GeoReferencer {
    zoom: u8,
    /// Raster pixel of the minimum tile's south-west corner
    anchor: Point,
    /// Canvas pixel of the maximum tile's south-east corner
    extent: Point,
    bounds: geo::Rect<f64>,
}

impl GeoReferencer {
    pub fn from_grid(grid: &Grid) -> Self {
        let zoom = grid.zoom();
        let min_bounds = grid.min_tile().bounds();
        let max_bounds = grid.max_tile().bounds();

        let anchor = lat_lng_to_raster(&min_bounds.south_west, zoom);
        let mut georef = Self {
            zoom,
            anchor,
            extent: Point::default(),
            bounds: grid.bounds().to_rect(),
        };
        georef.extent = georef.project(&max_bounds.south_east());

        log::debug!(
            "anchored mosaic at raster ({:.1}, {:.1}), extent ({:.1}, {:.1})",
            anchor.x,
            anchor.y,
            georef.extent.x,
            georef.extent.y
        );
        georef
    }

    pub fn zoom(&self) -> u8 {
        self.zoom
    }

    pub fn anchor(&self) -> Point {
        self.anchor
    }

    /// Width and height of the area covered by the grid, in canvas pixels.
    pub fn extent(&self) -> Point {
        self.extent
    }

    /// Whether a point lies strictly inside the rectangle spanned by the grid's tiles.
    pub fn contains(&self, lat_lng: &LatLng) -> bool {
        self.bounds.contains(&geo::Point::from(geo::Coord::from(*lat_lng)))
    }

    /// Geographic coordinate to canvas pixel. Does not check bounds.
    pub fn project(&self, lat_lng: &LatLng) -> Point {
        let raster = lat_lng_to_raster(lat_lng, self.zoom);
        Point::new(
            raster.x - self.anchor.x,
            raster.y - (self.anchor.y - TILE_SIZE as f64),
        )
    }

    /// Canvas pixel back to a geographic coordinate.
    pub fn unproject(&self, point: &Point) -> LatLng {
        let raster = Point::new(
            point.x + self.anchor.x,
            point.y + self.anchor.y - TILE_SIZE as f64,
        );
        raster_to_lat_lng(&raster, self.zoom)
    }

    /// Projects a point only if it lies within the grid.
    pub fn project_within(&self, lat_lng: &LatLng) -> Option<Point> {
        self.contains(lat_lng).then(|| self.project(lat_lng))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geo::TileCoord;
    use crate::rendering::planner::{GridPlan, PageSize};

    fn grid_for(center: LatLng, zoom: u8) -> Grid {
        let plan = GridPlan::new(center, zoom, (890.0, 600.0), PageSize::Tabloid).unwrap();
        Grid::new(plan.range)
    }

    fn chicago() -> LatLng {
        LatLng::from_lon_lat(-87.65, 41.87)
    }

    #[test]
    fn test_anchor_correction_places_min_tile_at_origin() {
        let grid = grid_for(chicago(), 15);
        let georef = GeoReferencer::from_grid(&grid);
        let min = grid.min_tile();

        assert!((georef.anchor().x - min.x as f64 * 256.0).abs() < 1e-3);
        assert!((georef.anchor().y - (min.y + 1) as f64 * 256.0).abs() < 1e-3);

        let origin = georef.project(&min.to_lat_lng());
        assert!(origin.x.abs() < 1e-3);
        assert!(origin.y.abs() < 1e-3);
    }

    #[test]
    fn test_north_west_corners_round_trip_to_offsets() {
        let grid = grid_for(chicago(), 15);
        let georef = GeoReferencer::from_grid(&grid);

        for (coord, cell) in grid.iter() {
            let p = georef.project(&cell.bounds.north_west());
            assert!((p.x - cell.offset.0 as f64).abs() <= 1.0, "{coord}: {p:?}");
            assert!((p.y - cell.offset.1 as f64).abs() <= 1.0, "{coord}: {p:?}");
        }
    }

    #[test]
    fn test_extent_matches_canvas_size() {
        let grid = grid_for(chicago(), 12);
        let georef = GeoReferencer::from_grid(&grid);
        let (width, height) = grid.pixel_size();

        assert!((georef.extent().x - width as f64).abs() < 1e-3);
        assert!((georef.extent().y - height as f64).abs() < 1e-3);
    }

    #[test]
    fn test_center_projects_into_interior_at_every_zoom() {
        for zoom in 1..=19 {
            let grid = grid_for(chicago(), zoom);
            let georef = GeoReferencer::from_grid(&grid);
            let (width, height) = grid.pixel_size();

            assert!(georef.contains(&chicago()), "zoom {zoom}");
            let p = georef.project(&chicago());
            assert!(p.x > 0.0 && p.x < width as f64, "zoom {zoom}: {p:?}");
            assert!(p.y > 0.0 && p.y < height as f64, "zoom {zoom}: {p:?}");
        }
    }

    #[test]
    fn test_unproject_inverts_project() {
        let grid = grid_for(chicago(), 15);
        let georef = GeoReferencer::from_grid(&grid);
        let point = LatLng::from_lon_lat(-87.6427, 41.8781);

        let back = georef.unproject(&georef.project(&point));
        assert!((back.lat - point.lat).abs() < 1e-9);
        assert!((back.lng - point.lng).abs() < 1e-9);
    }

    #[test]
    fn test_points_outside_grid_are_excluded() {
        let grid = grid_for(chicago(), 15);
        let georef = GeoReferencer::from_grid(&grid);

        assert!(georef.project_within(&chicago()).is_some());
        assert!(georef.project_within(&LatLng::from_lon_lat(2.35, 48.85)).is_none());

        let corner = grid.min_tile().to_lat_lng();
        assert!(!georef.contains(&corner), "boundary points are outside");
    }

    #[test]
    fn test_grid_past_world_edge() {
        let grid = Grid::new(
            GridPlan::new(LatLng::new(0.0, -179.0), 1, (600.0, 800.0), PageSize::Letter)
                .unwrap()
                .range,
        );
        assert_eq!(grid.min_tile(), TileCoord::new(-2, -2, 1));
        let georef = GeoReferencer::from_grid(&grid);
        let p = georef.project(&LatLng::new(0.0, -179.0));
        assert!(p.x > 0.0 && p.y > 0.0);
    }
}
