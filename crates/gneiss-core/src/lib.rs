pub mod index;
pub mod memory;
pub mod stream;

pub use index::{block_index_from_position, spatial_hash, BlockIndex};
pub use memory::{MemoryType, UnifiedVec};
pub use stream::{ComputeStream, DeviceScalar, WorkerError};

use ahash::{AHashMap, AHashSet};
pub type SmallKeyHashMap<K, V> = AHashMap<K, V>;
pub type SmallKeyHashSet<K> = AHashSet<K>;

// Re-exports.
pub use glam;
pub use rayon;
pub use static_assertions;
