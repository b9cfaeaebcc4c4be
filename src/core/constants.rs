//! Core constants shared by the tiling, projection and drawing stages.
//! Keeping them in a single place makes it easier to tweak pipeline-wide magic numbers.

/// Default square tile size in pixels.
pub const TILE_SIZE: u32 = 256;

/// Highest zoom level a render may request.
pub const MAX_ZOOM: u8 = 22;

/// Equatorial radius of the spherical Mercator earth model, in meters.
pub const EARTH_RADIUS: f64 = 6_378_137.0;

/// Latitude bound of the square Web-Mercator world.
pub const MAX_LATITUDE: f64 = 85.0511287798;

/// Half the circumference of the Mercator world (meters from origin to edge).
pub const ORIGIN_SHIFT: f64 = std::f64::consts::PI * EARTH_RADIUS;

/// Meters per pixel at zoom 0.
pub const INITIAL_RESOLUTION: f64 = 2.0 * ORIGIN_SHIFT / TILE_SIZE as f64;

/// Marker disc radius in pixels.
pub const MARKER_RADIUS: u32 = 10;

/// Marker fill opacity.
pub const MARKER_FILL_ALPHA: f32 = 0.7;

/// Marker outline opacity.
pub const MARKER_STROKE_ALPHA: f32 = 0.9;

/// Marker outline width in pixels.
pub const MARKER_STROKE_WIDTH: u32 = 2;

/// Margin kept around the image when fitting it onto the page.
pub const PAGE_MARGIN: u32 = 20;
