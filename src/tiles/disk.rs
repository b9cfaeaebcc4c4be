use crate::core::geo::TileCoord;
use crate::Result;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

/// On-disk store of raw tile bytes, one file per `(z, x, y)`.
///
/// Entries are written to a temporary file in the same directory and then
/// renamed over the key, so readers never observe partial bytes. Two
/// renders storing the same tile concurrently is harmless: last writer wins.
#[derive(Debug, Clone)]
pub struct DiskTileCache {
    root: PathBuf,
}

impl DiskTileCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Filesystem-safe key for a tile.
    pub fn key(coord: &TileCoord) -> String {
        format!("{}-{}-{}.png", coord.z, coord.x, coord.y)
    }

    pub fn path_for(&self, coord: &TileCoord) -> PathBuf {
        self.root.join(Self::key(coord))
    }

    /// Reads a stored tile; `Ok(None)` when the tile was never stored.
    pub async fn load(&self, coord: &TileCoord) -> Result<Option<Vec<u8>>> {
        match tokio::fs::read(self.path_for(coord)).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Atomically stores the raw bytes of a tile.
    pub async fn store(&self, coord: &TileCoord, bytes: &[u8]) -> Result<()> {
        let root = self.root.clone();
        let target = self.path_for(coord);
        let bytes = bytes.to_vec();

        tokio::task::spawn_blocking(move || -> Result<()> {
            std::fs::create_dir_all(&root)?;
            let mut tmp = tempfile::NamedTempFile::new_in(&root)?;
            tmp.write_all(&bytes)?;
            tmp.persist(&target).map_err(|e| e.error)?;
            Ok(())
        })
        .await
        .map_err(|e| std::io::Error::new(ErrorKind::Other, e))??;

        log::debug!("cached tile {} at {}", coord, self.root.display());
        Ok(())
    }

    pub fn contains(&self, coord: &TileCoord) -> bool {
        self.path_for(coord).is_file()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_is_filesystem_safe() {
        assert_eq!(DiskTileCache::key(&TileCoord::new(8405, 12181, 15)), "15-8405-12181.png");
        assert_eq!(DiskTileCache::key(&TileCoord::new(-1, 0, 1)), "1--1-0.png");
        assert!(!DiskTileCache::key(&TileCoord::new(3, 4, 5)).contains('/'));
    }

    #[tokio::test]
    async fn test_missing_tile_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DiskTileCache::new(dir.path());
        assert!(cache.load(&TileCoord::new(0, 0, 0)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_store_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DiskTileCache::new(dir.path().join("nested"));
        let coord = TileCoord::new(4, 5, 6);

        cache.store(&coord, b"tile-bytes").await.unwrap();
        assert!(cache.contains(&coord));
        assert_eq!(cache.load(&coord).await.unwrap().unwrap(), b"tile-bytes");

        cache.store(&coord, b"newer").await.unwrap();
        assert_eq!(cache.load(&coord).await.unwrap().unwrap(), b"newer");

        let leftovers = std::fs::read_dir(cache.root()).unwrap().count();
        assert_eq!(leftovers, 1);
    }
}
