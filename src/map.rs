use gneiss_core::{BlockIndex, ComputeStream, WorkerError};
use gneiss_map::{BlocksToUpdateTracker, BlocksToUpdateType, MapConfig, MeshLayer, VertexWelder};

/// Owns the mesh layer together with the machinery that keeps it current: the pending-update tracker, the vertex welder and the
/// compute stream they run on.
pub struct BlockMap {
    pub layer: MeshLayer,
    pub tracker: BlocksToUpdateTracker,
    welder: VertexWelder,
    stream: ComputeStream,
}

impl BlockMap {
    pub fn from_config(config: MapConfig) -> Result<Self, WorkerError> {
        Ok(Self {
            layer: MeshLayer::new(config.memory_type),
            tracker: BlocksToUpdateTracker::new(config.tracker)?,
            welder: VertexWelder::new(config.welder),
            stream: ComputeStream::new(config.stream_threads)?,
        })
    }

    pub fn stream(&self) -> &ComputeStream {
        &self.stream
    }

    pub fn welder(&self) -> &VertexWelder {
        &self.welder
    }

    /// Records that integration changed `blocks`.
    pub fn mark_blocks_touched(&self, blocks: &[BlockIndex]) {
        self.tracker.add_blocks_to_update(blocks);
    }

    /// Welds every block waiting for remeshing, then clears the mesh set. Returns the blocks that were processed.
    ///
    /// The caller is expected to have refreshed the raw geometry of those blocks in `layer` beforehand.
    pub fn remesh_pending(&mut self) -> Vec<BlockIndex> {
        let blocks = self.tracker.get_blocks_to_update(BlocksToUpdateType::Mesh);
        if blocks.is_empty() {
            return blocks;
        }

        log::debug!("Remeshing {} blocks", blocks.len());
        self.welder.weld_blocks(&blocks, &mut self.layer, &self.stream);
        self.tracker.mark_blocks_as_updated(BlocksToUpdateType::Mesh);

        blocks
    }
}
