use gneiss_core::glam::Vec3;
use gneiss_core::static_assertions::const_assert_eq;
use gneiss_core::{MemoryType, UnifiedVec};

use bytemuck::{Pod, Zeroable};

/// An 8-bit RGBA vertex color.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

const_assert_eq!(std::mem::size_of::<Color>(), 4);

impl Color {
    pub const GRAY: Self = Self::new(128, 128, 128, 255);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::GRAY
    }
}

/// The mesh geometry owned by a single block.
///
/// `vertices`, `normals` and `colors` are index-aligned. Normals always match the vertex count once they are populated. Colors
/// are only brought in line with the vertices on request, see [`MeshBlock::expand_colors_to_match_vertices`]. Every entry of
/// `triangles` indexes into `vertices`.
#[derive(Clone, Debug, PartialEq)]
pub struct MeshBlock {
    pub vertices: UnifiedVec<Vec3>,
    pub normals: UnifiedVec<Vec3>,
    pub colors: UnifiedVec<Color>,
    pub triangles: UnifiedVec<u32>,
}

impl MeshBlock {
    pub fn new(memory_type: MemoryType) -> Self {
        Self {
            vertices: UnifiedVec::new(memory_type),
            normals: UnifiedVec::new(memory_type),
            colors: UnifiedVec::new(memory_type),
            triangles: UnifiedVec::new(memory_type),
        }
    }

    /// Builds a block the way mesh extraction leaves it: one vertex per triangle corner and identity triangle indices.
    pub fn from_triangle_soup(vertices: &[Vec3], normals: &[Vec3], memory_type: MemoryType) -> Self {
        debug_assert!(normals.is_empty() || normals.len() == vertices.len());
        let mut block = Self::new(memory_type);
        block.vertices.extend_from_slice(vertices);
        block.normals.extend_from_slice(normals);
        block
            .triangles
            .as_mut_vec()
            .extend(0..vertices.len() as u32);
        block
    }

    pub fn memory_type(&self) -> MemoryType {
        self.vertices.memory_type()
    }

    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Empties every sequence without releasing the backing allocations.
    pub fn clear(&mut self) {
        self.vertices.clear();
        self.normals.clear();
        self.colors.clear();
        self.triangles.clear();
    }

    /// Deep copy of all four sequences of `other`.
    pub fn copy_from(&mut self, other: &Self) {
        self.vertices.copy_from(&other.vertices);
        self.normals.copy_from(&other.normals);
        self.colors.copy_from(&other.colors);
        self.triangles.copy_from(&other.triangles);
    }

    pub fn expand_colors_to_match_vertices(&mut self) {
        let num_vertices = self.vertices.len();
        self.colors.reserve(num_vertices.saturating_sub(self.colors.len()));
        self.colors.resize(num_vertices, Color::default());
    }

    /// Memory used by the live elements of all four sequences.
    pub fn size_in_bytes(&self) -> usize {
        self.vertices.size_in_bytes()
            + self.normals.size_in_bytes()
            + self.colors.size_in_bytes()
            + self.triangles.size_in_bytes()
    }

    /// A read-only snapshot for handing to kernels. The borrow ends before the block can be resized again.
    pub fn view(&self) -> MeshBlockView<'_> {
        MeshBlockView {
            vertices: &self.vertices,
            normals: &self.normals,
            colors: &self.colors,
            triangles: &self.triangles,
        }
    }
}

impl Default for MeshBlock {
    fn default() -> Self {
        Self::new(MemoryType::default())
    }
}

#[derive(Clone, Copy, Debug)]
pub struct MeshBlockView<'a> {
    pub vertices: &'a [Vec3],
    pub normals: &'a [Vec3],
    pub colors: &'a [Color],
    pub triangles: &'a [u32],
}

impl<'a> MeshBlockView<'a> {
    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    pub fn num_triangle_indices(&self) -> usize {
        self.triangles.len()
    }

    /// True if every triangle index refers to an existing vertex.
    pub fn triangles_in_bounds(&self) -> bool {
        let n = self.vertices.len();
        self.triangles.iter().all(|&t| (t as usize) < n)
    }
}

// ████████╗███████╗███████╗████████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝
//    ██║   █████╗  ███████╗   ██║
//    ██║   ██╔══╝  ╚════██║   ██║
//    ██║   ███████╗███████║   ██║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝

#[cfg(test)]
mod test {
    use super::*;

    use std::mem;

    fn quad_soup() -> MeshBlock {
        let v = [
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        ];
        MeshBlock::from_triangle_soup(&v, &[Vec3::Z; 6], MemoryType::Device)
    }

    #[test]
    fn soup_has_identity_triangles() {
        let block = quad_soup();
        assert_eq!(&*block.triangles, &[0, 1, 2, 3, 4, 5]);
        assert!(block.view().triangles_in_bounds());
    }

    #[test]
    fn clear_keeps_allocations() {
        let mut block = quad_soup();
        let vertex_capacity = block.vertices.capacity();
        block.clear();
        assert!(block.is_empty());
        assert!(block.triangles.is_empty());
        assert_eq!(block.vertices.capacity(), vertex_capacity);
        assert_eq!(block.memory_type(), MemoryType::Device);
    }

    #[test]
    fn copy_from_is_deep() {
        let src = quad_soup();
        let mut dst = MeshBlock::new(MemoryType::Host);
        dst.copy_from(&src);
        assert_eq!(&*dst.vertices, &*src.vertices);
        assert_eq!(&*dst.triangles, &*src.triangles);
        assert_eq!(dst.memory_type(), MemoryType::Host);

        dst.vertices[0] = Vec3::ONE;
        assert_eq!(src.vertices[0], Vec3::ZERO);
    }

    #[test]
    fn colors_expand_on_demand() {
        let mut block = quad_soup();
        assert!(block.colors.is_empty());
        block.colors.push(Color::new(255, 0, 0, 255));
        block.expand_colors_to_match_vertices();
        assert_eq!(block.colors.len(), 6);
        assert_eq!(block.colors[0], Color::new(255, 0, 0, 255));
        assert_eq!(block.colors[5], Color::GRAY);
    }

    #[test]
    fn size_in_bytes_sums_all_sequences() {
        let mut block = quad_soup();
        block.expand_colors_to_match_vertices();
        let expected = 6 * mem::size_of::<Vec3>() * 2 + 6 * mem::size_of::<Color>() + 6 * 4;
        assert_eq!(block.size_in_bytes(), expected);
    }
}
