//! Render request parsing and validation.
//!
//! The web layer posts form fields, so numbers may arrive as JSON numbers or
//! as numeric strings, and overlays may arrive as objects or as JSON-encoded
//! strings. Everything is normalized here, before any I/O happens.

use crate::core::geo::LatLng;
use crate::rendering::planner::PageSize;
use crate::{MapError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// An RGB color written as `#RRGGBB` (or shorthand `#RGB`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn from_hex(hex: &str) -> Result<Self> {
        let digits = hex.trim().trim_start_matches('#');
        let invalid = || MapError::ParseError(format!("invalid hex color '{hex}'"));
        if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(invalid());
        }
        let channel = |s: &str| u8::from_str_radix(s, 16).map_err(|_| invalid());

        match digits.len() {
            6 => Ok(Self::new(
                channel(&digits[0..2])?,
                channel(&digits[2..4])?,
                channel(&digits[4..6])?,
            )),
            3 => {
                let expand = |i: usize| channel(&digits[i..i + 1]).map(|v| v * 17);
                Ok(Self::new(expand(0)?, expand(1)?, expand(2)?))
            }
            _ => Err(invalid()),
        }
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl TryFrom<String> for Rgb {
    type Error = MapError;

    fn try_from(value: String) -> Result<Self> {
        Self::from_hex(&value)
    }
}

impl From<Rgb> for String {
    fn from(value: Rgb) -> Self {
        value.to_string()
    }
}

/// A colored set of points drawn on top of the mosaic.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Overlay {
    pub color: Rgb,
    pub points: Vec<LatLng>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Overlay {
    pub fn new(color: Rgb, points: Vec<LatLng>) -> Self {
        Self {
            color,
            points,
            name: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// A validated render request.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderRequest {
    pub center: LatLng,
    /// Requested view `(width, height)`; decides page orientation
    pub dimensions: (f64, f64),
    pub zoom: u8,
    pub overlays: Vec<Overlay>,
    pub page_size: PageSize,
    /// Pre-fetched GeoJSON documents, carried through unparsed
    pub shape_overlays: Vec<String>,
}

impl RenderRequest {
    pub fn new(center: LatLng, dimensions: (f64, f64), zoom: u8) -> Self {
        Self {
            center,
            dimensions,
            zoom,
            overlays: Vec::new(),
            page_size: PageSize::default(),
            shape_overlays: Vec::new(),
        }
    }

    pub fn with_overlay(mut self, overlay: Overlay) -> Self {
        self.overlays.push(overlay);
        self
    }

    pub fn with_page_size(mut self, page_size: PageSize) -> Self {
        self.page_size = page_size;
        self
    }

    /// Parses and validates a JSON render request.
    pub fn from_json(json: &str) -> Result<Self> {
        let raw: RawRequest = serde_json::from_str(json)
            .map_err(|e| MapError::InvalidConfig(format!("malformed render request: {e}")))?;
        raw.validate()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum Numeric {
    Number(f64),
    Text(String),
}

impl Numeric {
    fn to_f64(&self, field: &str) -> Result<f64> {
        let value = match self {
            Self::Number(n) => *n,
            Self::Text(s) => s.trim().parse::<f64>().map_err(|_| {
                MapError::InvalidConfig(format!("{field} must be numeric, got '{s}'"))
            })?,
        };
        if !value.is_finite() {
            return Err(MapError::InvalidConfig(format!("{field} must be finite")));
        }
        Ok(value)
    }
}

#[derive(Debug, Deserialize)]
struct RawRequest {
    center: Option<Vec<Numeric>>,
    dimensions: Option<Vec<Numeric>>,
    zoom: Option<Numeric>,
    #[serde(default, alias = "point_overlays")]
    overlays: Vec<RawOverlayEntry>,
    #[serde(default)]
    page_size: Option<String>,
    #[serde(default)]
    shape_overlays: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawOverlayEntry {
    Object(RawOverlay),
    Encoded(String),
}

#[derive(Debug, Deserialize)]
struct RawOverlay {
    color: String,
    #[serde(default)]
    points: Vec<Vec<Numeric>>,
    #[serde(default)]
    name: Option<String>,
}

fn pair(values: &[Numeric], field: &str) -> Result<(f64, f64)> {
    match values {
        [a, b] => Ok((a.to_f64(field)?, b.to_f64(field)?)),
        _ => Err(MapError::InvalidConfig(format!(
            "{field} must hold exactly two numbers, got {}",
            values.len()
        ))),
    }
}

impl RawRequest {
    fn validate(self) -> Result<RenderRequest> {
        let center = self
            .center
            .ok_or_else(|| MapError::InvalidConfig("center is required".to_string()))?;
        let (lon, lat) = pair(&center, "center")?;

        let dimensions = self
            .dimensions
            .ok_or_else(|| MapError::InvalidConfig("dimensions are required".to_string()))?;
        let dimensions = pair(&dimensions, "dimensions")?;

        let zoom = self
            .zoom
            .ok_or_else(|| MapError::InvalidConfig("zoom is required".to_string()))?
            .to_f64("zoom")?;
        if zoom.fract() != 0.0 || !(0.0..=u8::MAX as f64).contains(&zoom) {
            return Err(MapError::InvalidConfig(format!(
                "zoom must be a non-negative integer, got {zoom}"
            )));
        }

        let page_size = match self.page_size {
            Some(name) => name.parse()?,
            None => PageSize::default(),
        };

        let overlays = self
            .overlays
            .into_iter()
            .enumerate()
            .map(|(i, entry)| entry.into_overlay(i))
            .collect::<Result<Vec<_>>>()?;

        Ok(RenderRequest {
            center: LatLng::from_lon_lat(lon, lat),
            dimensions,
            zoom: zoom as u8,
            overlays,
            page_size,
            shape_overlays: self.shape_overlays,
        })
    }
}

impl RawOverlayEntry {
    fn into_overlay(self, index: usize) -> Result<Overlay> {
        let raw = match self {
            Self::Object(raw) => raw,
            Self::Encoded(json) => serde_json::from_str::<RawOverlay>(&json).map_err(|e| {
                MapError::InvalidConfig(format!("overlay {index} is not valid JSON: {e}"))
            })?,
        };

        let color = Rgb::from_hex(&raw.color)
            .map_err(|e| MapError::InvalidConfig(format!("overlay {index}: {e}")))?;
        let field = format!("overlays[{index}].points");
        let points = raw
            .points
            .iter()
            .map(|p| pair(p, &field).map(|(lon, lat)| LatLng::from_lon_lat(lon, lat)))
            .collect::<Result<Vec<_>>>()?;

        Ok(Overlay {
            color,
            points,
            name: raw.name,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_colors() {
        assert_eq!(Rgb::from_hex("#ff0000").unwrap(), Rgb::new(255, 0, 0));
        assert_eq!(Rgb::from_hex("984ea3").unwrap(), Rgb::new(0x98, 0x4e, 0xa3));
        assert_eq!(Rgb::from_hex("#4af").unwrap(), Rgb::new(0x44, 0xaa, 0xff));
        assert_eq!(Rgb::new(55, 126, 184).to_string(), "#377eb8");
        assert!(Rgb::from_hex("#12345").is_err());
        assert!(Rgb::from_hex("#gg0000").is_err());
    }

    #[test]
    fn test_parse_full_request() {
        let request = RenderRequest::from_json(
            r##"{
                "center": [-87.65, 41.87],
                "dimensions": [890, 600],
                "zoom": 15,
                "page_size": "tabloid",
                "overlays": [
                    {"color": "#ff0000", "points": [[-87.6427, 41.8781], [-87.6394, 41.8670]]}
                ]
            }"##,
        )
        .unwrap();

        assert_eq!(request.center, LatLng::new(41.87, -87.65));
        assert_eq!(request.dimensions, (890.0, 600.0));
        assert_eq!(request.zoom, 15);
        assert_eq!(request.page_size, PageSize::Tabloid);
        assert_eq!(request.overlays.len(), 1);
        assert_eq!(request.overlays[0].color, Rgb::new(255, 0, 0));
        assert_eq!(request.overlays[0].points[0], LatLng::new(41.8781, -87.6427));
    }

    #[test]
    fn test_builder_matches_parsed_request() {
        let parsed = RenderRequest::from_json(
            r##"{
                "center": [-87.65, 41.87],
                "dimensions": [890, 600],
                "zoom": 15,
                "page_size": "tabloid",
                "overlays": [
                    {"color": "#377eb8", "points": [[-87.6427, 41.8781]], "name": "sites"}
                ]
            }"##,
        )
        .unwrap();

        let built = RenderRequest::new(LatLng::from_lon_lat(-87.65, 41.87), (890.0, 600.0), 15)
            .with_page_size(PageSize::Tabloid)
            .with_overlay(
                Overlay::new(Rgb::new(55, 126, 184), vec![LatLng::from_lon_lat(-87.6427, 41.8781)])
                    .with_name("sites"),
            );

        assert_eq!(built, parsed);
    }

    #[test]
    fn test_form_encoded_fields() {
        let request = RenderRequest::from_json(
            r##"{
                "center": ["-87.65", "41.87"],
                "dimensions": ["890", "600"],
                "zoom": "15",
                "point_overlays": ["{\"color\": \"#4daf4a\", \"points\": [[-87.64, 41.87]]}"]
            }"##,
        )
        .unwrap();

        assert_eq!(request.zoom, 15);
        assert_eq!(request.page_size, PageSize::Letter);
        assert_eq!(request.overlays[0].color, Rgb::new(0x4d, 0xaf, 0x4a));
    }

    #[test]
    fn test_missing_or_non_numeric_fields() {
        let missing_zoom = RenderRequest::from_json(r#"{"center": [0, 0], "dimensions": [1, 1]}"#);
        assert!(matches!(missing_zoom, Err(MapError::InvalidConfig(_))));

        let missing_dims = RenderRequest::from_json(r#"{"center": [0, 0], "zoom": 3}"#);
        assert!(matches!(missing_dims, Err(MapError::InvalidConfig(_))));

        let text_zoom =
            RenderRequest::from_json(r#"{"center": [0, 0], "dimensions": [1, 1], "zoom": "abc"}"#);
        assert!(matches!(text_zoom, Err(MapError::InvalidConfig(_))));

        let fractional =
            RenderRequest::from_json(r#"{"center": [0, 0], "dimensions": [1, 1], "zoom": 2.5}"#);
        assert!(matches!(fractional, Err(MapError::InvalidConfig(_))));

        let short_center =
            RenderRequest::from_json(r#"{"center": [0], "dimensions": [1, 1], "zoom": 2}"#);
        assert!(matches!(short_center, Err(MapError::InvalidConfig(_))));
    }

    #[test]
    fn test_bad_overlay_color() {
        let result = RenderRequest::from_json(
            r#"{"center": [0, 0], "dimensions": [1, 1], "zoom": 2,
                "overlays": [{"color": "red", "points": []}]}"#,
        );
        assert!(matches!(result, Err(MapError::InvalidConfig(_))));
    }

    #[test]
    fn test_shape_overlays_pass_through() {
        let request = RenderRequest::from_json(
            r#"{"center": [0, 0], "dimensions": [1, 1], "zoom": 2,
                "shape_overlays": ["{\"type\": \"FeatureCollection\", \"features\": []}"]}"#,
        )
        .unwrap();
        assert_eq!(request.shape_overlays.len(), 1);
        assert!(request.shape_overlays[0].contains("FeatureCollection"));
    }
}
