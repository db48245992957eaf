//! Fixed-capacity welding kernels.
//!
//! Each kernel runs as a single [`CooperativeGroup`] on a [`ComputeStream`]. Inputs longer than the group's capacity are
//! reported through the log and truncated; nothing is chunked across groups.
//!
//! These kernels compare vertices by a quantized key (see [`SpatialMergeTolerance`]), so they can merge vertices that are close
//! but not identical. [`weld_vertices_exact`](super::weld_vertices_exact) never does.

use super::group::{block_flag_heads, block_inclusive_sum, block_radix_sort_pairs, CooperativeGroup};

use gneiss_core::glam::Vec3;
use gneiss_core::{spatial_hash, ComputeStream, DeviceScalar};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU32, Ordering};

/// Key given to the unused slots of a group so they sort behind every real item.
const SENTINEL_KEY: u32 = u32::MAX;

/// The edge length of the lattice cells used to quantize vertex positions. Vertices in the same cell are welded together by
/// the fixed-capacity kernels.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
pub struct SpatialMergeTolerance(pub f32);

impl Default for SpatialMergeTolerance {
    fn default() -> Self {
        Self(1e-4)
    }
}

impl SpatialMergeTolerance {
    /// The spatial hash of the lattice cell containing `v`. Distinct cells can collide.
    #[inline]
    pub fn key(self, v: Vec3) -> u32 {
        spatial_hash((v / self.0).floor().as_ivec3())
    }
}

fn load_keys(group: &CooperativeGroup, tolerance: SpatialMergeTolerance, vertices: &[Vec3]) -> Vec<u32> {
    group
        .phase(|rank| {
            group
                .thread_items(rank)
                .map(|i| vertices.get(i).map_or(SENTINEL_KEY, |&v| tolerance.key(v)))
                .collect::<Vec<_>>()
        })
        .concat()
}

/// Sorts `vertices` by quantized key. At most `group.capacity()` vertices survive; the rest are dropped.
pub fn sort_vertices_by_key(
    group: &CooperativeGroup,
    tolerance: SpatialMergeTolerance,
    stream: &ComputeStream,
    vertices: &mut Vec<Vec3>,
) {
    let num_valid = group.clamp_to_capacity("sort_vertices_by_key", vertices.len());
    vertices.truncate(num_valid);

    stream.run(|| {
        let mut keys = load_keys(group, tolerance, vertices);
        let mut values = vertices.clone();
        values.resize(group.capacity(), Vec3::ZERO);

        block_radix_sort_pairs(group, &mut keys, &mut values);

        vertices.copy_from_slice(&values[..num_valid]);
    });
}

/// Writes one vertex per run of equal keys in `sorted` to `output`.
///
/// `sorted` must already be ordered by quantized key (see [`sort_vertices_by_key`]); otherwise the result is meaningless. The
/// order of the unique vertices in `output` is unspecified. The unique count is read back from the device before `output` is
/// resized, which blocks until `stream` is idle.
pub fn unique_sorted_vertices(
    group: &CooperativeGroup,
    tolerance: SpatialMergeTolerance,
    stream: &ComputeStream,
    sorted: &[Vec3],
    output: &mut Vec<Vec3>,
) {
    let num_valid = group.clamp_to_capacity("unique_sorted_vertices", sorted.len());
    let sorted = &sorted[..num_valid];
    let unique_count = DeviceScalar::new();

    stream.run(|| {
        let keys = load_keys(group, tolerance, sorted);
        let heads = block_flag_heads(group, &keys, num_valid);

        let next_slot = AtomicU32::new(0);
        let claimed: Vec<Vec<(u32, Vec3)>> = group.phase(|rank| {
            group
                .thread_items(rank)
                .filter(|&i| heads[i] != 0)
                .map(|i| (next_slot.fetch_add(1, Ordering::Relaxed), sorted[i]))
                .collect()
        });

        group.phase(|rank| {
            if rank == 0 {
                unique_count.store(next_slot.load(Ordering::Relaxed));
            }
        });

        output.clear();
        output.resize(num_valid, Vec3::ZERO);
        for (slot, v) in claimed.into_iter().flatten() {
            output[slot as usize] = v;
        }
    });

    let num_unique = unique_count.copy_to_host(stream);
    output.truncate(num_unique as usize);
}

/// Sorts, deduplicates and compacts `input` in one kernel. Returns the number of unique vertices.
///
/// `output` receives one representative per quantized key: the vertex at the lowest original index among those sharing the key.
/// `remap[i]` receives the position in `output` of the representative of `input[i]`, for every processed input (duplicates
/// included), so any per-vertex index array can be rewritten with a single gather.
pub fn weld_vertices_by_key(
    group: &CooperativeGroup,
    tolerance: SpatialMergeTolerance,
    stream: &ComputeStream,
    input: &[Vec3],
    output: &mut Vec<Vec3>,
    remap: &mut Vec<u32>,
) -> usize {
    let num_valid = group.clamp_to_capacity("weld_vertices_by_key", input.len());
    let input = &input[..num_valid];

    stream.run(|| {
        let mut keys = load_keys(group, tolerance, input);
        let mut original_indices: Vec<u32> = (0..group.capacity() as u32).collect();
        block_radix_sort_pairs(group, &mut keys, &mut original_indices);

        let heads = block_flag_heads(group, &keys, num_valid);
        let head_counts = block_inclusive_sum(group, &heads);
        let num_unique = num_valid.checked_sub(1).map_or(0, |last| head_counts[last] as usize);

        let writes: Vec<(Vec<(u32, u32)>, Vec<(u32, Vec3)>)> = group.phase(|rank| {
            let mut remap_writes = Vec::new();
            let mut vertex_writes = Vec::new();
            for i in group.thread_items(rank).filter(|&i| i < num_valid) {
                let compacted = head_counts[i] - 1;
                let original = original_indices[i];
                remap_writes.push((original, compacted));
                if heads[i] != 0 {
                    vertex_writes.push((compacted, input[original as usize]));
                }
            }
            (remap_writes, vertex_writes)
        });

        output.clear();
        output.resize(num_unique, Vec3::ZERO);
        remap.clear();
        remap.resize(num_valid, 0);
        for (remap_writes, vertex_writes) in writes {
            for (original, compacted) in remap_writes {
                remap[original as usize] = compacted;
            }
            for (compacted, v) in vertex_writes {
                output[compacted as usize] = v;
            }
        }

        num_unique
    })
}

// ████████╗███████╗███████╗████████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝
//    ██║   █████╗  ███████╗   ██║
//    ██║   ██╔══╝  ╚════██║   ██║
//    ██║   ███████╗███████║   ██║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝
