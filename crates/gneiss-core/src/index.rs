use glam::{IVec3, Vec3};

/// Identifies one fixed-size cube ("block") of the map grid.
pub type BlockIndex = IVec3;

const HASH_STRIDE_Y: u32 = 17191;
const HASH_STRIDE_Z: u32 = HASH_STRIDE_Y.wrapping_mul(HASH_STRIDE_Y);

/// The spatial hash of a [`BlockIndex`]: `x + y * 17191 + z * 17191^2` in wrapping 32-bit arithmetic.
///
/// Any other integer lattice coordinate can be hashed the same way. The quantized vertex keys used for approximate welding are
/// produced with this function, so distinct lattice cells can share a hash.
#[inline]
pub const fn spatial_hash(index: IVec3) -> u32 {
    (index.x as u32)
        .wrapping_add((index.y as u32).wrapping_mul(HASH_STRIDE_Y))
        .wrapping_add((index.z as u32).wrapping_mul(HASH_STRIDE_Z))
}

/// Returns the index of the block containing `position`, for blocks with edge length `block_size`.
#[inline]
pub fn block_index_from_position(position: Vec3, block_size: f32) -> BlockIndex {
    (position / block_size).floor().as_ivec3()
}

// ████████╗███████╗███████╗████████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝
//    ██║   █████╗  ███████╗   ██║
//    ██║   ██╔══╝  ╚════██║   ██║
//    ██║   ███████╗███████║   ██║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝
