use std::path::PathBuf;

use thiserror::Error;

/// Fatal map-asset failure. Raised while constructing a battlefield; the
/// owning room must abort creation, there is no partial-recovery policy.
#[derive(Debug, Error)]
#[error("error loading map asset {path:?}: {kind}")]
pub struct MapAssetError {
    pub path: PathBuf,
    #[source]
    pub kind: MapAssetErrorKind,
}

#[derive(Debug, Error)]
pub enum MapAssetErrorKind {
    #[error("failed to read map file: {0}")]
    Io(#[source] std::io::Error),

    #[error("map has {found} rows, grid expects {expected}")]
    Truncated { expected: usize, found: usize },

    #[error("map row {row} has {found} cells, grid expects {expected}")]
    RowTooShort {
        row: usize,
        expected: usize,
        found: usize,
    },
}

/// Recoverable rejection from footprint placement. The grid is left
/// untouched; the caller keeps the object at its last valid position and
/// tells it to re-broadcast.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum PlacementError {
    #[error("footprint extends outside the grid bounds")]
    OutOfBounds,

    #[error("candidate cells are statically blocked or occupied")]
    Blocked,

    #[error("object has no footprint on this grid (stale room association)")]
    StaleObject,
}

/// Failure loading a battlefield configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {0:?}: {1}")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("failed to parse config file {0:?}: {1}")]
    Parse(PathBuf, #[source] ron::error::SpannedError),
}
