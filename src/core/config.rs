//! Configuration system for tile loading, marker styling and artifact output
//!
//! Options are grouped per pipeline stage and can be obtained from a preset
//! profile or deserialized from JSON. Every field has a default, so a config
//! file only needs to name what it overrides.

use crate::core::constants::{
    MARKER_FILL_ALPHA, MARKER_RADIUS, MARKER_STROKE_ALPHA, MARKER_STROKE_WIDTH,
};
use crate::{MapError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_TILE_URL: &str = "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png";

#[derive(Debug, Clone, PartialEq)]
pub enum RenderProfile {
    Balanced,
    LowResource,
    HighThroughput,
    Custom(RenderOptions),
}

impl RenderProfile {
    pub fn resolve(&self) -> RenderOptions {
        match self {
            Self::Balanced => RenderOptions::default(),
            Self::LowResource => RenderOptions {
                tile_loader: TileLoaderConfig {
                    max_concurrent: 2,
                    max_retries: 1,
                    retry_delay_ms: 250,
                    memory_cache_size: 64,
                    ..TileLoaderConfig::default()
                },
                ..RenderOptions::default()
            },
            Self::HighThroughput => RenderOptions {
                tile_loader: TileLoaderConfig {
                    max_concurrent: 32,
                    max_retries: 3,
                    retry_delay_ms: 100,
                    request_timeout_ms: 20_000,
                    memory_cache_size: 4096,
                    ..TileLoaderConfig::default()
                },
                ..RenderOptions::default()
            },
            Self::Custom(options) => options.clone(),
        }
    }
}

impl Default for RenderProfile {
    fn default() -> Self {
        Self::Balanced
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderOptions {
    pub tile_loader: TileLoaderConfig,
    pub marker: MarkerStyle,
    pub output: OutputConfig,
}

impl RenderOptions {
    pub fn from_json(json: &str) -> Result<Self> {
        let options: Self = serde_json::from_str(json)?;
        options.validate()?;
        Ok(options)
    }

    /// Rejects option combinations the pipeline cannot honor.
    pub fn validate(&self) -> Result<()> {
        self.tile_loader.validate()?;
        self.marker.validate()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TileLoaderConfig {
    /// URL template with `{z}`, `{x}`, `{y}` and optional `{s}` placeholders
    pub tile_url: String,
    pub subdomains: Vec<String>,
    pub user_agent: String,
    /// Directory holding previously fetched tiles
    pub cache_dir: PathBuf,
    /// Maximum concurrent tile lookups within one render
    pub max_concurrent: usize,
    /// Attempts after the first failed request
    pub max_retries: u32,
    pub retry_delay_ms: u64,
    pub request_timeout_ms: u64,
    /// In-process tile bytes kept across renders; 0 disables the memory layer
    pub memory_cache_size: usize,
}

impl TileLoaderConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    fn validate(&self) -> Result<()> {
        if self.max_concurrent == 0 {
            return Err(MapError::InvalidConfig(
                "tile_loader.max_concurrent must be at least 1".to_string(),
            ));
        }
        for placeholder in ["{z}", "{x}", "{y}"] {
            if !self.tile_url.contains(placeholder) {
                return Err(MapError::InvalidConfig(format!(
                    "tile_loader.tile_url is missing {placeholder}"
                )));
            }
        }
        if self.tile_url.contains("{s}") && self.subdomains.is_empty() {
            return Err(MapError::InvalidConfig(
                "tile_loader.tile_url uses {s} but no subdomains are configured".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for TileLoaderConfig {
    fn default() -> Self {
        Self {
            tile_url: DEFAULT_TILE_URL.to_string(),
            subdomains: vec!["a".to_string(), "b".to_string(), "c".to_string()],
            user_agent: concat!("tileprint/", env!("CARGO_PKG_VERSION")).to_string(),
            cache_dir: std::env::temp_dir().join("tileprint").join("tiles"),
            max_concurrent: 8,
            max_retries: 2,
            retry_delay_ms: 500,
            request_timeout_ms: 10_000,
            memory_cache_size: 1024,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkerStyle {
    pub radius: u32,
    pub fill_alpha: f32,
    pub stroke_alpha: f32,
    pub stroke_width: u32,
}

impl MarkerStyle {
    fn validate(&self) -> Result<()> {
        if self.radius == 0 {
            return Err(MapError::InvalidConfig(
                "marker.radius must be positive".to_string(),
            ));
        }
        let in_unit = |alpha: f32| (0.0..=1.0).contains(&alpha);
        if !in_unit(self.fill_alpha) || !in_unit(self.stroke_alpha) {
            return Err(MapError::InvalidConfig(
                "marker opacities must lie within 0.0..=1.0".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for MarkerStyle {
    fn default() -> Self {
        Self {
            radius: MARKER_RADIUS,
            fill_alpha: MARKER_FILL_ALPHA,
            stroke_alpha: MARKER_STROKE_ALPHA,
            stroke_width: MARKER_STROKE_WIDTH,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory receiving the PNG and PDF artifacts
    pub output_dir: PathBuf,
    /// Shrink the raster to fit inside the page margins instead of clipping it
    pub fit_to_page: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            output_dir: std::env::temp_dir().join("tileprint"),
            fit_to_page: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_presets() {
        let balanced = RenderProfile::Balanced.resolve();
        let low = RenderProfile::LowResource.resolve();
        let high = RenderProfile::HighThroughput.resolve();

        assert_eq!(balanced, RenderOptions::default());
        assert!(low.tile_loader.max_concurrent < balanced.tile_loader.max_concurrent);
        assert!(high.tile_loader.max_concurrent > balanced.tile_loader.max_concurrent);
        assert!(high.tile_loader.memory_cache_size > low.tile_loader.memory_cache_size);
        assert!(balanced.validate().is_ok());
        assert!(low.validate().is_ok());
        assert!(high.validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let options = RenderOptions::from_json(
            r#"{"tile_loader": {"max_concurrent": 3}, "output": {"fit_to_page": true}}"#,
        )
        .unwrap();

        assert_eq!(options.tile_loader.max_concurrent, 3);
        assert_eq!(options.tile_loader.tile_url, DEFAULT_TILE_URL);
        assert!(options.output.fit_to_page);
        assert_eq!(options.marker, MarkerStyle::default());
    }

    #[test]
    fn test_invalid_options_rejected() {
        let zero = RenderOptions::from_json(r#"{"tile_loader": {"max_concurrent": 0}}"#);
        assert!(matches!(zero, Err(MapError::InvalidConfig(_))));

        let url = RenderOptions::from_json(r#"{"tile_loader": {"tile_url": "http://x/{z}.png"}}"#);
        assert!(matches!(url, Err(MapError::InvalidConfig(_))));

        let alpha = RenderOptions::from_json(r#"{"marker": {"fill_alpha": 1.5}}"#);
        assert!(matches!(alpha, Err(MapError::InvalidConfig(_))));
    }

    #[test]
    fn test_durations() {
        let config = TileLoaderConfig {
            retry_delay_ms: 250,
            request_timeout_ms: 3000,
            ..TileLoaderConfig::default()
        };
        assert_eq!(config.retry_delay(), Duration::from_millis(250));
        assert_eq!(config.request_timeout(), Duration::from_secs(3));
    }
}
