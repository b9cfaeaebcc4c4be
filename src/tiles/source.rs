use crate::core::config::TileLoaderConfig;
use crate::core::geo::TileCoord;

/// Trait representing anything that can produce tile URLs for a given coordinate.
pub trait TileSource: Send + Sync {
    /// Build a URL for the requested `coord`.
    fn url(&self, coord: TileCoord) -> String;
}

/// Expands a `{z}/{x}/{y}` URL template, rotating `{s}` over subdomains.
#[derive(Debug, Clone)]
pub struct UrlTemplateSource {
    template: String,
    subdomains: Vec<String>,
}

impl UrlTemplateSource {
    pub fn new(template: impl Into<String>, subdomains: Vec<String>) -> Self {
        Self {
            template: template.into(),
            subdomains,
        }
    }

    pub fn openstreetmap() -> Self {
        Self::from_config(&TileLoaderConfig::default())
    }

    pub fn from_config(config: &TileLoaderConfig) -> Self {
        Self::new(config.tile_url.clone(), config.subdomains.clone())
    }
}

impl TileSource for UrlTemplateSource {
    fn url(&self, coord: TileCoord) -> String {
        let url = self
            .template
            .replace("{z}", &coord.z.to_string())
            .replace("{x}", &coord.x.to_string())
            .replace("{y}", &coord.y.to_string());

        if self.subdomains.is_empty() {
            return url;
        }
        let idx = (coord.x + coord.y).rem_euclid(self.subdomains.len() as i32) as usize;
        url.replace("{s}", &self.subdomains[idx])
    }
}
