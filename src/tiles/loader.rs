use super::cache::MemoryTileCache;
use super::disk::DiskTileCache;
use super::fetcher::{HttpTileFetcher, TileFetcher};
use crate::core::config::TileLoaderConfig;
use crate::core::constants::TILE_SIZE;
use crate::core::geo::TileCoord;
use crate::rendering::planner::TileRange;
use crate::Result;
use futures::stream::{self, StreamExt};
use fxhash::FxHashMap;
use image::imageops::FilterType;
use image::RgbaImage;
use std::sync::Arc;

/// Where a resolved tile came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileOrigin {
    Memory,
    Disk,
    Network,
}

/// Every tile of a range, decoded, plus the coordinates that could not be resolved.
#[derive(Debug, Default)]
pub struct LoadedTiles {
    pub tiles: FxHashMap<TileCoord, RgbaImage>,
    pub missing: Vec<TileCoord>,
    pub from_memory: usize,
    pub from_disk: usize,
    pub from_network: usize,
}

impl LoadedTiles {
    pub fn get(&self, coord: &TileCoord) -> Option<&RgbaImage> {
        self.tiles.get(coord)
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    fn record(&mut self, coord: TileCoord, outcome: Option<(RgbaImage, TileOrigin)>) {
        match outcome {
            Some((image, origin)) => {
                match origin {
                    TileOrigin::Memory => self.from_memory += 1,
                    TileOrigin::Disk => self.from_disk += 1,
                    TileOrigin::Network => self.from_network += 1,
                }
                self.tiles.insert(coord, image);
            }
            None => self.missing.push(coord),
        }
    }
}

/// Resolves tile coordinates to decoded images: memory, then disk, then network.
///
/// A tile that cannot be fetched or decoded is reported missing rather than
/// failing the whole range; the mosaic leaves its cell blank.
#[derive(Clone)]
pub struct TileLoader {
    fetcher: Arc<dyn TileFetcher>,
    disk: DiskTileCache,
    memory: Option<MemoryTileCache>,
    max_concurrent: usize,
}

impl TileLoader {
    pub fn new(fetcher: Arc<dyn TileFetcher>, config: &TileLoaderConfig) -> Self {
        Self {
            fetcher,
            disk: DiskTileCache::new(config.cache_dir.clone()),
            memory: MemoryTileCache::new(config.memory_cache_size),
            max_concurrent: config.max_concurrent.max(1),
        }
    }

    /// Loader fetching over HTTP from the configured URL template.
    pub fn from_config(config: &TileLoaderConfig) -> Self {
        Self::new(Arc::new(HttpTileFetcher::from_config(config)), config)
    }

    pub fn disk_cache(&self) -> &DiskTileCache {
        &self.disk
    }

    pub fn memory_cache(&self) -> Option<&MemoryTileCache> {
        self.memory.as_ref()
    }

    /// Resolves every tile in `range`. Completes only once all lookups have finished.
    pub async fn load_range(&self, range: &TileRange) -> LoadedTiles {
        let outcomes: Vec<_> = stream::iter(range.iter())
            .map(|coord| async move { (coord, self.resolve(coord).await) })
            .buffer_unordered(self.max_concurrent)
            .collect()
            .await;

        let mut loaded = LoadedTiles::default();
        for (coord, outcome) in outcomes {
            loaded.record(coord, outcome);
        }
        loaded.missing.sort();

        log::info!(
            "resolved {}/{} tiles (memory {}, disk {}, network {}, missing {})",
            loaded.len(),
            range.len(),
            loaded.from_memory,
            loaded.from_disk,
            loaded.from_network,
            loaded.missing.len()
        );
        loaded
    }

    /// Resolves one tile, absorbing every failure into `None`.
    pub async fn resolve(&self, coord: TileCoord) -> Option<(RgbaImage, TileOrigin)> {
        if !coord.is_valid() {
            log::debug!("tile {} lies outside the world, leaving it blank", coord);
            return None;
        }

        if let Some(bytes) = self.memory.as_ref().and_then(|m| m.get(&coord)) {
            match decode_tile(&bytes) {
                Ok(image) => return Some((image, TileOrigin::Memory)),
                Err(e) => {
                    log::warn!("dropping undecodable in-memory tile {}: {}", coord, e);
                    if let Some(memory) = &self.memory {
                        memory.remove(&coord);
                    }
                }
            }
        }

        match self.disk.load(&coord).await {
            Ok(Some(bytes)) => match decode_tile(&bytes) {
                Ok(image) => {
                    self.remember(coord, bytes);
                    return Some((image, TileOrigin::Disk));
                }
                // Possibly caught mid-write by another render; go to the source.
                Err(e) => log::warn!("cached tile {} failed to decode, refetching: {}", coord, e),
            },
            Ok(None) => {}
            Err(e) => log::warn!("tile cache read failed for {}: {}", coord, e),
        }

        let bytes = match self.fetcher.fetch(coord).await {
            Ok(bytes) => bytes,
            Err(e) => {
                log::warn!("tile {} unavailable: {}", coord, e);
                return None;
            }
        };
        let image = match decode_tile(&bytes) {
            Ok(image) => image,
            Err(e) => {
                log::warn!("tile {} fetched but failed to decode: {}", coord, e);
                return None;
            }
        };

        if let Err(e) = self.disk.store(&coord, &bytes).await {
            log::warn!("could not persist tile {}: {}", coord, e);
        }
        self.remember(coord, bytes);
        Some((image, TileOrigin::Network))
    }

    fn remember(&self, coord: TileCoord, bytes: Vec<u8>) {
        if let Some(memory) = &self.memory {
            memory.put(coord, Arc::new(bytes));
        }
    }
}

/// Decodes tile bytes to RGBA, normalizing the size to one tile cell.
pub fn decode_tile(bytes: &[u8]) -> Result<RgbaImage> {
    let image = image::load_from_memory(bytes)?.to_rgba8();
    if image.dimensions() == (TILE_SIZE, TILE_SIZE) {
        Ok(image)
    } else {
        Ok(image::imageops::resize(
            &image,
            TILE_SIZE,
            TILE_SIZE,
            FilterType::Triangle,
        ))
    }
}
