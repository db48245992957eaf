use gneiss_core::{BlockIndex, MemoryType, SmallKeyHashMap};
use crate::mesh_block::MeshBlock;

/// The block dictionary: one [`MeshBlock`] per allocated [`BlockIndex`].
///
/// Blocks are allocated on first use and then reused; [`MeshLayer::clear_all_blocks`] drops the geometry of every block but keeps
/// their allocations for the next frame.
pub struct MeshLayer {
    blocks: SmallKeyHashMap<BlockIndex, MeshBlock>,
    memory_type: MemoryType,
}

impl MeshLayer {
    pub fn new(memory_type: MemoryType) -> Self {
        Self {
            blocks: SmallKeyHashMap::default(),
            memory_type,
        }
    }

    pub fn memory_type(&self) -> MemoryType {
        self.memory_type
    }

    pub fn num_blocks(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_block_allocated(&self, index: BlockIndex) -> bool {
        self.blocks.contains_key(&index)
    }

    /// Returns the block at `index`, allocating an empty one if necessary.
    pub fn allocate_block(&mut self, index: BlockIndex) -> &mut MeshBlock {
        let memory_type = self.memory_type;
        self.blocks
            .entry(index)
            .or_insert_with(|| MeshBlock::new(memory_type))
    }

    pub fn get_block(&self, index: BlockIndex) -> Option<&MeshBlock> {
        self.blocks.get(&index)
    }

    pub fn get_block_mut(&mut self, index: BlockIndex) -> Option<&mut MeshBlock> {
        self.blocks.get_mut(&index)
    }

    pub fn remove_block(&mut self, index: BlockIndex) -> Option<MeshBlock> {
        self.blocks.remove(&index)
    }

    pub fn block_indices(&self) -> impl Iterator<Item = BlockIndex> + '_ {
        self.blocks.keys().copied()
    }

    pub fn clear_all_blocks(&mut self) {
        for block in self.blocks.values_mut() {
            block.clear();
        }
    }

    pub fn size_in_bytes(&self) -> usize {
        self.blocks.values().map(MeshBlock::size_in_bytes).sum()
    }
}

impl Default for MeshLayer {
    fn default() -> Self {
        Self::new(MemoryType::default())
    }
}

// ████████╗███████╗███████╗████████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝
//    ██║   █████╗  ███████╗   ██║
//    ██║   ██╔══╝  ╚════██║   ██║
//    ██║   ███████╗███████║   ██║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝
