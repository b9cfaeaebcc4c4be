pub mod cache;
pub mod disk;
pub mod fetcher;
pub mod loader;
pub mod source;

// Re-exports for convenience
pub use cache::{CacheStats, MemoryTileCache};
pub use disk::DiskTileCache;
pub use fetcher::{HttpTileFetcher, TileFetcher};
pub use loader::{decode_tile, LoadedTiles, TileLoader, TileOrigin};
pub use source::{TileSource, UrlTemplateSource};
