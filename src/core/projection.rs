//! Spherical Web-Mercator transforms (EPSG:3857).
//!
//! A geographic coordinate reaches mosaic pixel space through three
//! composed stages, each available on its own together with its inverse:
//!
//! 1. [`lat_lng_to_meters`]: geographic degrees to projected meters.
//! 2. [`meters_to_pixels`]: meters to global pixels at a zoom level,
//!    origin at the south-west corner of the world, y growing north.
//! 3. [`pixels_to_raster`]: global pixels to raster pixels, origin at the
//!    north-west corner, y growing south (the tile image convention).

use crate::core::constants::{INITIAL_RESOLUTION, ORIGIN_SHIFT, TILE_SIZE};
use crate::core::geo::{LatLng, Point};
use std::f64::consts::PI;

/// Meters per pixel at the given zoom level.
pub fn resolution(zoom: u8) -> f64 {
    INITIAL_RESOLUTION / 2_f64.powi(zoom as i32)
}

/// Side length of the whole world in pixels at the given zoom level.
pub fn map_size(zoom: u8) -> f64 {
    TILE_SIZE as f64 * 2_f64.powi(zoom as i32)
}

/// Converts a geographic coordinate to spherical Mercator meters.
pub fn lat_lng_to_meters(lat_lng: &LatLng) -> Point {
    let mx = lat_lng.lng * ORIGIN_SHIFT / 180.0;
    let my = ((90.0 + lat_lng.lat) * PI / 360.0).tan().ln() / (PI / 180.0);
    let my = my * ORIGIN_SHIFT / 180.0;
    Point::new(mx, my)
}

/// Converts spherical Mercator meters back to a geographic coordinate.
pub fn meters_to_lat_lng(meters: &Point) -> LatLng {
    let lng = meters.x / ORIGIN_SHIFT * 180.0;
    let lat = meters.y / ORIGIN_SHIFT * 180.0;
    let lat = 180.0 / PI * (2.0 * (lat * PI / 180.0).exp().atan() - PI / 2.0);
    LatLng::new(lat, lng)
}

/// Converts meters to global pixel coordinates at a zoom level.
pub fn meters_to_pixels(meters: &Point, zoom: u8) -> Point {
    let res = resolution(zoom);
    Point::new(
        (meters.x + ORIGIN_SHIFT) / res,
        (meters.y + ORIGIN_SHIFT) / res,
    )
}

/// Converts global pixel coordinates back to meters.
pub fn pixels_to_meters(pixels: &Point, zoom: u8) -> Point {
    let res = resolution(zoom);
    Point::new(
        pixels.x * res - ORIGIN_SHIFT,
        pixels.y * res - ORIGIN_SHIFT,
    )
}

/// Flips the y axis so the origin sits at the north-west corner.
pub fn pixels_to_raster(pixels: &Point, zoom: u8) -> Point {
    Point::new(pixels.x, map_size(zoom) - pixels.y)
}

/// Inverse of [`pixels_to_raster`]; the flip is its own inverse.
pub fn raster_to_pixels(raster: &Point, zoom: u8) -> Point {
    Point::new(raster.x, map_size(zoom) - raster.y)
}

/// All three stages composed: geographic coordinate to raster pixel.
pub fn lat_lng_to_raster(lat_lng: &LatLng, zoom: u8) -> Point {
    let meters = lat_lng_to_meters(lat_lng);
    let pixels = meters_to_pixels(&meters, zoom);
    pixels_to_raster(&pixels, zoom)
}

/// Raster pixel back to a geographic coordinate.
pub fn raster_to_lat_lng(raster: &Point, zoom: u8) -> LatLng {
    let pixels = raster_to_pixels(raster, zoom);
    let meters = pixels_to_meters(&pixels, zoom);
    meters_to_lat_lng(&meters)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geo::TileCoord;

    const EPS: f64 = 1e-6;

    #[test]
    fn test_origin_maps_to_world_center() {
        let meters = lat_lng_to_meters(&LatLng::new(0.0, 0.0));
        assert!(meters.x.abs() < EPS);
        assert!(meters.y.abs() < EPS);

        let pixels = meters_to_pixels(&meters, 1);
        assert!((pixels.x - 256.0).abs() < EPS);
        assert!((pixels.y - 256.0).abs() < EPS);
    }

    #[test]
    fn test_antimeridian_maps_to_origin_shift() {
        let meters = lat_lng_to_meters(&LatLng::new(0.0, 180.0));
        assert!((meters.x - ORIGIN_SHIFT).abs() < 1e-3);
    }

    #[test]
    fn test_meters_round_trip() {
        let original = LatLng::new(41.8781, -87.6298);
        let back = meters_to_lat_lng(&lat_lng_to_meters(&original));
        assert!((back.lat - original.lat).abs() < 1e-9);
        assert!((back.lng - original.lng).abs() < 1e-9);
    }

    #[test]
    fn test_pixels_round_trip() {
        let meters = Point::new(-9_757_000.0, 5_142_000.0);
        let back = pixels_to_meters(&meters_to_pixels(&meters, 15), 15);
        assert!((back.x - meters.x).abs() < 1e-6);
        assert!((back.y - meters.y).abs() < 1e-6);
    }

    #[test]
    fn test_raster_flip_is_involution() {
        let p = Point::new(123.0, 456.0);
        let flipped = pixels_to_raster(&p, 3);
        assert_eq!(flipped, Point::new(123.0, 2048.0 - 456.0));
        assert_eq!(raster_to_pixels(&flipped, 3), p);
    }

    #[test]
    fn test_tile_corner_lands_on_tile_grid() {
        let tile = TileCoord::new(8405, 12179, 15);
        let raster = lat_lng_to_raster(&tile.to_lat_lng(), 15);
        assert!((raster.x - 8405.0 * 256.0).abs() < 1e-3);
        assert!((raster.y - 12179.0 * 256.0).abs() < 1e-3);

        let south_west = lat_lng_to_raster(&tile.bounds().south_west, 15);
        assert!((south_west.y - 12180.0 * 256.0).abs() < 1e-3);
    }

    #[test]
    fn test_raster_round_trip() {
        let original = LatLng::new(-33.8688, 151.2093);
        let back = raster_to_lat_lng(&lat_lng_to_raster(&original, 12), 12);
        assert!((back.lat - original.lat).abs() < 1e-9);
        assert!((back.lng - original.lng).abs() < 1e-9);
    }
}
