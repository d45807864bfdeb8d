use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// World-space extents of one battlefield. The fine grid spans these bounds
/// at 4 cells per unit; everything outside is unreachable.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct WorldBounds {
    pub min_x: f32,
    pub min_z: f32,
    pub max_x: f32,
    pub max_z: f32,
}

impl WorldBounds {
    pub fn width(&self) -> f32 {
        self.max_x - self.min_x
    }

    pub fn depth(&self) -> f32 {
        self.max_z - self.min_z
    }
}

/// Center and size (world units) of the player-configurable fenced
/// enclosure. Resizing it forces a full re-partition of the battlefield's
/// routing regions.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct EnclosureBounds {
    pub center_x: f32,
    pub center_z: f32,
    pub size_x: f32,
    pub size_z: f32,
}

/// Static configuration for one battlefield. Loaded once at room creation;
/// none of these values change during play except the enclosure bounds,
/// which go through `Battlefield::resize_enclosure`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BattlefieldConfig {
    /// Base directory map assets are resolved from.
    pub map_dir: PathBuf,
    pub bounds: WorldBounds,
    pub enclosure: EnclosureBounds,
    /// Fixed y handed to path points of air units. Ground paths carry y = 0.
    pub air_height: f32,
    /// Quadrant axes are halved until no side exceeds this many cells.
    pub region_side_limit: i32,
}

impl Default for BattlefieldConfig {
    fn default() -> Self {
        Self {
            map_dir: PathBuf::from("assets/maps"),
            bounds: WorldBounds {
                min_x: -32.0,
                min_z: -32.0,
                max_x: 32.0,
                max_z: 32.0,
            },
            enclosure: EnclosureBounds {
                center_x: 0.0,
                center_z: 0.0,
                size_x: 8.0,
                size_z: 8.0,
            },
            air_height: 6.0,
            region_side_limit: 32,
        }
    }
}

impl BattlefieldConfig {
    /// Load a RON configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        ron::from_str(&text).map_err(|e| ConfigError::Parse(path.to_path_buf(), e))
    }
}
