//! On-disk copy of the last merged station set.
//!
//! Lets the server start when both provider feeds are down. A snapshot
//! older than its TTL is ignored.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::Station;

/// Snapshots older than a day are ignored.
const DEFAULT_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Errors writing a snapshot.
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("snapshot I/O failed for {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("snapshot could not be encoded: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Debug, Serialize, Deserialize)]
struct SnapshotFile {
    saved_at: DateTime<Utc>,
    stations: Vec<Station>,
}

/// Where the snapshot lives and how long it stays usable.
#[derive(Debug, Clone)]
pub struct SnapshotConfig {
    pub path: PathBuf,
    pub ttl: Duration,
}

impl SnapshotConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ttl: DEFAULT_TTL,
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }
}

/// Reads and writes the station snapshot file.
#[derive(Debug, Clone)]
pub struct SnapshotCache {
    config: SnapshotConfig,
}

impl SnapshotCache {
    pub fn new(config: SnapshotConfig) -> Self {
        Self { config }
    }

    /// Load the snapshot, or `None` if it is missing, unreadable or stale.
    pub fn load(&self) -> Option<Vec<Station>> {
        let path = &self.config.path;
        let file: SnapshotFile = match std::fs::read_to_string(path)
            .map_err(|e| e.to_string())
            .and_then(|raw| serde_json::from_str(&raw).map_err(|e| e.to_string()))
        {
            Ok(file) => file,
            Err(reason) => {
                debug!(path = %path.display(), %reason, "no usable station snapshot");
                return None;
            }
        };

        let ttl = TimeDelta::from_std(self.config.ttl).unwrap_or(TimeDelta::MAX);
        let age = Utc::now().signed_duration_since(file.saved_at);
        if age >= ttl {
            debug!(path = %path.display(), saved_at = %file.saved_at, "station snapshot is stale");
            return None;
        }

        Some(file.stations)
    }

    /// Write `stations` to the snapshot file.
    ///
    /// Parent directories are created as needed. The file is written next to
    /// its final path and renamed into place, so a reader never sees a
    /// partial snapshot.
    pub fn save(&self, stations: &[Station]) -> Result<(), SnapshotError> {
        let path = &self.config.path;
        let io_err = |source| SnapshotError::Io {
            path: path.clone(),
            source,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }

        let json = serde_json::to_vec(&SnapshotFile {
            saved_at: Utc::now(),
            stations: stations.to_vec(),
        })?;

        let staging = path.with_extension("json.tmp");
        std::fs::write(&staging, json).map_err(io_err)?;
        std::fs::rename(&staging, path).map_err(io_err)?;

        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.config.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BikeCounts, Point, Source, StationId};
    use tempfile::tempdir;

    fn stations() -> Vec<Station> {
        vec![
            Station {
                id: StationId::provider_a(1),
                location: Point::new(47.3769, 8.5417),
                name: "Hauptbahnhof".to_string(),
                address: "Bahnhofplatz".to_string(),
                status: "Active".to_string(),
                bikes: BikeCounts::new(1, 3),
                source: Source::Both,
            },
            Station {
                id: StationId::provider_b("v9"),
                location: Point::new(47.39, 8.51),
                name: "Wipkingen".to_string(),
                address: String::new(),
                status: "Active".to_string(),
                bikes: BikeCounts::new(0, 2),
                source: Source::ProviderB,
            },
        ]
    }

    #[test]
    fn save_and_load_snapshot() {
        let dir = tempdir().unwrap();
        let cache = SnapshotCache::new(SnapshotConfig::new(dir.path().join("stations.json")));

        cache.save(&stations()).unwrap();

        let loaded = cache.load().unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].id, StationId::provider_a(1));
        assert_eq!(loaded[0].source, Source::Both);
        assert_eq!(loaded[0].bikes, BikeCounts::new(1, 3));
        assert!((loaded[0].location.latitude - 47.3769).abs() < 1e-9);
        assert_eq!(loaded[1].id, StationId::provider_b("v9"));
    }

    #[test]
    fn expired_snapshot_returns_none() {
        let dir = tempdir().unwrap();
        let config =
            SnapshotConfig::new(dir.path().join("stations.json")).with_ttl(Duration::from_secs(0));
        let cache = SnapshotCache::new(config);

        cache.save(&stations()).unwrap();
        assert!(cache.load().is_none());
    }

    #[test]
    fn missing_snapshot_returns_none() {
        let cache = SnapshotCache::new(SnapshotConfig::new("/nonexistent/path/stations.json"));
        assert!(cache.load().is_none());
    }

    #[test]
    fn corrupt_snapshot_returns_none() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("stations.json");
        std::fs::write(&path, "{not json").unwrap();

        let cache = SnapshotCache::new(SnapshotConfig::new(&path));
        assert!(cache.load().is_none());
    }

    #[test]
    fn save_replaces_previous_snapshot() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("stations.json");
        let cache = SnapshotCache::new(SnapshotConfig::new(&path));

        cache.save(&stations()).unwrap();
        cache.save(&stations()[..1]).unwrap();

        assert_eq!(cache.load().unwrap().len(), 1);
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn creates_parent_directories() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("dir").join("stations.json");
        let cache = SnapshotCache::new(SnapshotConfig::new(&path));

        cache.save(&stations()).unwrap();
        assert!(path.exists());
        assert_eq!(cache.path(), path);
    }
}
