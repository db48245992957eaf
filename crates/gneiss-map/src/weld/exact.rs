use gneiss_core::glam::Vec3;

use float_ord::FloatOrd;
use rayon::prelude::*;

/// Total lexicographic order on vertex bit patterns. Two vertices compare equal only if all three components are bitwise equal.
pub type ExactVertexKey = [FloatOrd<f32>; 3];

#[inline]
pub fn exact_key(v: Vec3) -> ExactVertexKey {
    [FloatOrd(v.x), FloatOrd(v.y), FloatOrd(v.z)]
}

/// Removes bitwise-duplicate vertices of any number of vertices and remaps `triangles` onto the survivors.
///
/// On return `vertices` is sorted by [`exact_key`] and unique, `normals` (if it was populated) has the same length, and each
/// triangle index `t` has been replaced by the position of the old `vertices[t]` in the new array. Mesh extraction leaves
/// `triangles` as the identity `0..N`, in which case it becomes the forward remap from original vertex order. Welding an
/// already welded mesh leaves it unchanged.
///
/// `normals[i]` is taken from the first sorted occurrence of `vertices[i]`, which is its lowest original index because the
/// sort is stable.
pub fn weld_vertices_exact(vertices: &mut Vec<Vec3>, normals: &mut Vec<Vec3>, triangles: &mut [u32]) {
    let has_normals = !normals.is_empty();
    debug_assert!(!has_normals || normals.len() == vertices.len());

    let vertex_snapshot = vertices.clone();
    let normal_snapshot = if has_normals {
        normals.clone()
    } else {
        Vec::new()
    };

    vertices.par_sort_by_key(|v| exact_key(*v));
    vertices.dedup_by_key(|v| exact_key(*v));

    let unique: &[Vec3] = vertices;
    let remap: Vec<u32> = vertex_snapshot
        .par_iter()
        .map(|v| {
            let key = exact_key(*v);
            unique.partition_point(|u| exact_key(*u) < key) as u32
        })
        .collect();

    if has_normals {
        normals.truncate(unique.len());
        // Reverse order so the lowest original index of each group is written last.
        for (&slot, &normal) in remap.iter().zip(&normal_snapshot).rev() {
            normals[slot as usize] = normal;
        }
    }

    triangles.par_iter_mut().for_each(|t| {
        debug_assert!((*t as usize) < remap.len());
        *t = remap[*t as usize];
    });
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

    #[test]
    fn key_orders_lexicographically() {
        assert!(exact_key(Vec3::new(0.0, 5.0, 5.0)) < exact_key(Vec3::new(1.0, 0.0, 0.0)));
        assert!(exact_key(Vec3::new(1.0, 0.0, 5.0)) < exact_key(Vec3::new(1.0, 1.0, 0.0)));
        assert!(exact_key(Vec3::new(-1.0, 0.0, 0.0)) < exact_key(Vec3::ZERO));
    }

    #[test]
    fn key_distinguishes_signed_zero() {
        assert_ne!(exact_key(Vec3::new(-0.0, 0.0, 0.0)), exact_key(Vec3::ZERO));
    }

    #[test]
    fn dedup_and_remap() {
        let a = Vec3::new(1.0, 2.0, 3.0);
        let b = Vec3::new(-1.0, 0.5, 0.0);
        let c = Vec3::new(1.0, 2.0, 3.5);
        let mut vertices = vec![a, b, c, b, a, c, a];
        let mut normals = vec![Vec3::X, Vec3::Y, Vec3::Z, -Vec3::Y, -Vec3::X, -Vec3::Z, Vec3::ONE];
        let mut triangles: Vec<u32> = (0..7).collect();

        weld_vertices_exact(&mut vertices, &mut normals, &mut triangles);

        assert_eq!(vertices, vec![b, a, c]);
        assert_eq!(normals, vec![Vec3::Y, Vec3::X, Vec3::Z]);
        assert_eq!(triangles, vec![1, 0, 2, 0, 1, 2, 1]);
    }

    #[test]
    fn welding_without_normals() {
        let mut vertices = vec![Vec3::ONE, Vec3::ZERO, Vec3::ONE, Vec3::ZERO];
        let mut normals = Vec::new();
        let mut triangles = vec![0, 1, 2, 3];
        weld_vertices_exact(&mut vertices, &mut normals, &mut triangles);
        assert_eq!(vertices, vec![Vec3::ZERO, Vec3::ONE]);
        assert!(normals.is_empty());
        assert_eq!(triangles, vec![1, 0, 1, 0]);
    }

    #[test]
    fn rewelding_is_a_no_op() {
        let mut vertices = vec![Vec3::X, Vec3::Y, Vec3::X, Vec3::Z, Vec3::Y, Vec3::Z];
        let mut normals = vec![Vec3::ONE; 6];
        let mut triangles: Vec<u32> = (0..6).collect();
        weld_vertices_exact(&mut vertices, &mut normals, &mut triangles);

        let (v, n, t) = (vertices.clone(), normals.clone(), triangles.clone());
        weld_vertices_exact(&mut vertices, &mut normals, &mut triangles);
        assert_eq!(vertices, v);
        assert_eq!(normals, n);
        assert_eq!(triangles, t);
    }
}
