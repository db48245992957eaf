//! Vertex welding: merging duplicate vertices of a block's mesh and remapping its triangles onto the survivors.
//!
//! Two equality policies coexist and are chosen by the caller through [`WeldMethod`]:
//!
//! - [`WeldMethod::Exact`] merges only bitwise-identical positions and handles meshes of any size.
//! - [`WeldMethod::Quantized`] merges positions that fall in the same cell of a lattice with edge length
//!   [`SpatialMergeTolerance`] (or whose cells share a spatial hash). It runs as one fixed-capacity [`CooperativeGroup`].

mod exact;
mod group;
mod kernels;

pub use exact::{exact_key, weld_vertices_exact, ExactVertexKey};
pub use group::{block_flag_heads, block_inclusive_sum, block_radix_sort_pairs, CooperativeGroup};
pub use kernels::{
    sort_vertices_by_key, unique_sorted_vertices, weld_vertices_by_key, SpatialMergeTolerance,
};

use crate::layer::MeshLayer;
use crate::mesh_block::MeshBlock;

use gneiss_core::{BlockIndex, ComputeStream};
use serde::{Deserialize, Serialize};

/// Blocks with this many vertices or fewer are not worth welding.
pub const MIN_VERTICES_TO_WELD: usize = 3;

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub enum WeldMethod {
    /// Bitwise equality, unbounded size.
    #[default]
    Exact,
    /// Quantized-key equality, bounded by the cooperative group's capacity.
    Quantized,
}

#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct WelderConfig {
    pub method: WeldMethod,
    /// Shape of the group used by [`WeldMethod::Quantized`].
    pub group: CooperativeGroup,
    pub merge_tolerance: SpatialMergeTolerance,
}

pub struct VertexWelder {
    config: WelderConfig,
}

impl VertexWelder {
    pub fn new(config: WelderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &WelderConfig {
        &self.config
    }

    /// Welds every block of `blocks` found in `layer`, in place. Missing and tiny blocks are skipped.
    pub fn weld_blocks(&self, blocks: &[BlockIndex], layer: &mut MeshLayer, stream: &ComputeStream) {
        let mut num_welded = 0;
        let mut vertices_before = 0;
        let mut vertices_after = 0;
        for &index in blocks {
            let block = match layer.get_block_mut(index) {
                Some(block) => block,
                None => continue,
            };
            let num_vertices = block.num_vertices();
            if self.weld_block(block, stream) {
                log::trace!(
                    "Welded block {:?}: {} -> {} vertices",
                    index,
                    num_vertices,
                    block.num_vertices()
                );
                num_welded += 1;
                vertices_before += num_vertices;
                vertices_after += block.num_vertices();
            }
        }
        log::debug!(
            "Welded {} of {} blocks with {:?}: {} -> {} vertices",
            num_welded,
            blocks.len(),
            self.config.method,
            vertices_before,
            vertices_after
        );
    }

    /// Welds a single block in place. Returns false if the block was left untouched.
    pub fn weld_block(&self, block: &mut MeshBlock, stream: &ComputeStream) -> bool {
        if block.num_vertices() <= MIN_VERTICES_TO_WELD {
            return false;
        }
        match self.config.method {
            WeldMethod::Exact => {
                let MeshBlock {
                    vertices,
                    normals,
                    triangles,
                    ..
                } = block;
                stream.run(|| {
                    weld_vertices_exact(vertices.as_mut_vec(), normals.as_mut_vec(), triangles)
                });
                true
            }
            WeldMethod::Quantized => self.weld_block_quantized(block, stream),
        }
    }

    fn weld_block_quantized(&self, block: &mut MeshBlock, stream: &ComputeStream) -> bool {
        let WelderConfig {
            group,
            merge_tolerance,
            ..
        } = self.config;

        // Truncating a block would leave triangles pointing at dropped vertices.
        if block.num_vertices() > group.capacity() {
            log::error!(
                "Cannot weld a block of {} vertices with a group of capacity {}; leaving it unwelded",
                block.num_vertices(),
                group.capacity()
            );
            return false;
        }

        let mut welded = Vec::with_capacity(block.num_vertices());
        let mut remap = Vec::with_capacity(block.num_vertices());
        let num_unique = weld_vertices_by_key(
            &group,
            merge_tolerance,
            stream,
            &block.vertices,
            &mut welded,
            &mut remap,
        );

        if !block.normals.is_empty() {
            let normal_snapshot = block.normals.to_vec();
            block.normals.truncate(num_unique);
            // Reverse order so each slot ends up with the normal of its representative (lowest original index).
            for (&slot, &normal) in remap.iter().zip(&normal_snapshot).rev() {
                block.normals[slot as usize] = normal;
            }
        }

        block.vertices.clear();
        block.vertices.extend_from_slice(&welded);

        for t in block.triangles.iter_mut() {
            *t = remap[*t as usize];
        }

        true
    }
}

// ████████╗███████╗███████╗████████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝
//    ██║   █████╗  ███████╗   ██║
//    ██║   ██╔══╝  ╚════██║   ██║
//    ██║   ███████╗███████║   ██║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝
