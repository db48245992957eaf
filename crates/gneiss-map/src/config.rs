use crate::weld::WelderConfig;
use crate::ProjectiveLayerType;

use gneiss_core::MemoryType;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
pub struct MapConfig {
    /// Residency of every mesh buffer in the layer.
    pub memory_type: MemoryType,
    /// Size of the compute stream's thread pool. Zero lets the pool pick.
    pub stream_threads: usize,
    pub welder: WelderConfig,
    pub tracker: TrackerConfig,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            memory_type: MemoryType::default(),
            stream_threads: 0,
            welder: WelderConfig::default(),
            tracker: TrackerConfig::default(),
        }
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct TrackerConfig {
    pub projective_layer_type: ProjectiveLayerType,
    /// A pending set that grows beyond this many blocks is cleared.
    pub max_pending_blocks: usize,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            projective_layer_type: ProjectiveLayerType::default(),
            max_pending_blocks: 100_000,
        }
    }
}
