use gneiss::gneiss_core::glam::{IVec3, Vec3};
use gneiss::gneiss_core::{block_index_from_position, MemoryType};
use gneiss::gneiss_map::{BlocksToUpdateType, MapConfig, MeshBlock, WeldMethod};
use gneiss::BlockMap;

const BLOCK_SIZE: f32 = 2.0;

/// A unit quad emitted as two triangles, the way extraction leaves it.
fn quad_soup(origin: Vec3) -> (Vec<Vec3>, Vec<Vec3>) {
    let corners = [Vec3::ZERO, Vec3::X, Vec3::Y, Vec3::X, Vec3::new(1.0, 1.0, 0.0), Vec3::Y];
    let vertices = corners.iter().map(|&c| origin + c).collect();
    (vertices, vec![Vec3::Z; 6])
}

fn remesh_cycle(method: WeldMethod) {
    let _ = env_logger::builder().is_test(true).try_init();

    let mut config = MapConfig::default();
    config.stream_threads = 2;
    config.welder.method = method;
    let mut map = BlockMap::from_config(config).unwrap();

    let origins = [Vec3::new(0.5, 0.5, 0.5), Vec3::new(-1.5, 4.5, 0.5)];
    let mut touched = Vec::new();
    for origin in origins {
        let index = block_index_from_position(origin, BLOCK_SIZE);
        let (vertices, normals) = quad_soup(origin);
        map.layer
            .allocate_block(index)
            .copy_from(&MeshBlock::from_triangle_soup(&vertices, &normals, MemoryType::Unified));
        touched.push(index);
    }
    assert_eq!(touched, vec![IVec3::ZERO, IVec3::new(-1, 2, 0)]);

    map.mark_blocks_touched(&touched);
    let mut remeshed = map.remesh_pending();
    remeshed.sort_by_key(|i| i.to_array());
    touched.sort_by_key(|i| i.to_array());
    assert_eq!(remeshed, touched);

    for index in &touched {
        let block = map.layer.get_block(*index).unwrap();
        assert_eq!(block.num_vertices(), 4);
        assert_eq!(block.normals.len(), 4);
        assert_eq!(block.triangles.len(), 6);
        assert!(block.view().triangles_in_bounds());
    }

    // The mesh set is drained but the other consumers still see the blocks.
    assert!(map.tracker.get_blocks_to_update(BlocksToUpdateType::Mesh).is_empty());
    assert_eq!(map.tracker.get_blocks_to_update(BlocksToUpdateType::Esdf).len(), 2);
    assert!(map.remesh_pending().is_empty());
}

#[test]
fn exact_remesh_cycle() {
    remesh_cycle(WeldMethod::Exact);
}

#[test]
fn quantized_remesh_cycle() {
    remesh_cycle(WeldMethod::Quantized);
}
