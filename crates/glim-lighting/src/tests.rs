use super::*;
use glim_blocks::config::{BlockDef, BlocksConfig};
use glim_blocks::material::MaterialCatalog;
use glim_blocks::types::Block;

fn make_test_registry() -> BlockRegistry {
    let blocks = vec![
        BlockDef {
            name: "air".into(),
            id: Some(0),
            solid: Some(false),
            propagates_light: Some(true),
            emission: Some(0),
            materials: None,
        },
        BlockDef {
            name: "stone".into(),
            id: Some(1),
            solid: Some(true),
            propagates_light: Some(false),
            emission: Some(0),
            materials: None,
        },
        BlockDef {
            name: "lamp".into(),
            id: Some(2),
            solid: Some(true),
            propagates_light: Some(false),
            emission: Some(15),
            materials: None,
        },
    ];
    BlockRegistry::from_configs(
        MaterialCatalog::new(),
        BlocksConfig {
            blocks,
            unknown_block: None,
        },
    )
    .unwrap()
}

fn air_chunk(coord: ChunkCoord) -> ChunkBuf {
    ChunkBuf::new_empty(coord)
}

const STONE: Block = Block { id: 1 };
const LAMP: Block = Block { id: 2 };

#[test]
fn open_sky_fills_empty_chunk() {
    let reg = make_test_registry();
    let store = LightingStore::new();
    let buf = air_chunk(ChunkCoord::new(0, 0, 0));
    let lg = compute_light_with_borders(&buf, &store, &reg);
    for y in 0..S {
        for z in 0..S {
            for x in 0..S {
                assert_eq!(lg.sky_at(x, y, z), MAX_LIGHT);
                assert_eq!(lg.blk_at(x, y, z), 0);
            }
        }
    }
}

#[test]
fn sky_decays_horizontally_under_a_roof() {
    let reg = make_test_registry();
    let store = LightingStore::new();
    let mut buf = air_chunk(ChunkCoord::new(0, 0, 0));
    // Roof covering x in 0..8 at y=10; columns under it are occluded and must
    // be fed sideways from the open half, one decay step per voxel.
    for z in 0..S {
        for x in 0..8 {
            buf.set_local(x, 10, z, STONE);
        }
    }
    let lg = compute_light_with_borders(&buf, &store, &reg);
    // Open column keeps full skylight below the roof line.
    assert_eq!(lg.sky_at(8, 5, 8), MAX_LIGHT);
    // One step under the roof: 14; two steps: 13.
    assert_eq!(lg.sky_at(7, 5, 8), MAX_LIGHT - 1);
    assert_eq!(lg.sky_at(6, 5, 8), MAX_LIGHT - 2);
    // The roof voxel itself carries no light.
    assert_eq!(lg.sky_at(7, 10, 8), 0);
}

#[test]
fn emitter_over_floor_matches_vertical_distance() {
    let reg = make_test_registry();
    let store = LightingStore::new();
    let mut buf = air_chunk(ChunkCoord::new(0, 0, 0));
    for z in 0..S {
        for x in 0..S {
            buf.set_local(x, 0, z, STONE);
        }
    }
    buf.set_local(8, 15, 8, LAMP);
    let lg = compute_light_with_borders(&buf, &store, &reg);
    // Directly below the emitter the level drops by one per voxel of
    // vertical distance: level(y) = 15 - (15 - y).
    for y in 1..=15usize {
        assert_eq!(lg.blk_at(8, y, 8), y as u8, "y={y}");
    }
    // The solid floor transmits nothing.
    assert_eq!(lg.blk_at(8, 0, 8), 0);
}

#[test]
fn shadowed_voxel_gets_strictly_less_light() {
    let reg = make_test_registry();
    let store = LightingStore::new();
    let mut buf = air_chunk(ChunkCoord::new(0, 0, 0));
    buf.set_local(8, 12, 8, LAMP);
    // A 3x3 plate two voxels below the emitter shadows the column beneath it.
    for dz in -1i32..=1 {
        for dx in -1i32..=1 {
            buf.set_local((8 + dx) as usize, 10, (8 + dz) as usize, STONE);
        }
    }
    let lg = compute_light_with_borders(&buf, &store, &reg);
    // (8,9,8) sits under the plate at Manhattan distance 3 from the emitter;
    // (8,12,11) is unshadowed at the same distance.
    let shadowed = lg.blk_at(8, 9, 8);
    let open = lg.blk_at(8, 12, 11);
    assert_eq!(open, 12);
    assert!(
        shadowed < open,
        "shadowed {shadowed} must be darker than open {open}"
    );
}

#[test]
fn seam_planes_seed_with_one_step_decay() {
    let reg = make_test_registry();
    let store = LightingStore::new();
    // Publish a -X neighbor whose +X layer carries block light 9.
    let mut nb = LightBorders::new();
    nb.bl_xp = vec![9; PLANE];
    // Keep its skylight planes dark so only the block channel seeds.
    store.update_borders(ChunkCoord::new(-1, 0, 0), nb);

    let mut buf = air_chunk(ChunkCoord::new(0, 0, 0));
    // Solid ceiling so the sky channel stays out of the picture.
    for z in 0..S {
        for x in 0..S {
            buf.set_local(x, 15, z, STONE);
        }
    }
    let lg = compute_light_with_borders(&buf, &store, &reg);
    for y in 0..15 {
        for z in 0..S {
            assert_eq!(lg.blk_at(0, y, z), 8, "x=0 seeds at 9-1");
            assert_eq!(lg.blk_at(1, y, z), 7, "interior decays one more step");
        }
    }
}

#[test]
fn vertical_sky_crosses_seams_unattenuated_only_at_max() {
    let reg = make_test_registry();
    let store = LightingStore::new();
    let coord = ChunkCoord::new(0, 0, 0);

    // Chunk above publishes a full-sky bottom plane: our columns stay at 15.
    let mut above = LightBorders::new();
    above.sk_yn = vec![MAX_LIGHT; PLANE];
    store.update_borders(ChunkCoord::new(0, 1, 0), above);
    let buf = air_chunk(coord);
    let lg = compute_light_with_borders(&buf, &store, &reg);
    assert_eq!(lg.sky_at(4, 15, 4), MAX_LIGHT);
    assert_eq!(lg.sky_at(4, 0, 4), MAX_LIGHT);

    // An occluded column above (value 7) decays crossing the seam and below.
    let mut above = LightBorders::new();
    above.sk_yn = vec![7; PLANE];
    store.update_borders(ChunkCoord::new(0, 1, 0), above);
    let lg = compute_light_with_borders(&buf, &store, &reg);
    assert_eq!(lg.sky_at(4, 15, 4), 6);
    assert_eq!(lg.sky_at(4, 14, 4), 5);
}

#[test]
fn recompute_of_stable_chunk_is_identical() {
    let reg = make_test_registry();
    let store = LightingStore::new();
    let mut buf = air_chunk(ChunkCoord::new(0, 0, 0));
    buf.set_local(3, 3, 3, LAMP);
    for x in 0..S {
        buf.set_local(x, 7, 7, STONE);
    }
    let first = compute_light_with_borders(&buf, &store, &reg);
    store.update_borders(buf.coord, LightBorders::from_grid(&first));
    let second = compute_light_with_borders(&buf, &store, &reg);
    assert_eq!(first, second);
    // Republishing unchanged planes reports no change.
    let (changed, mask) = store.update_borders(buf.coord, LightBorders::from_grid(&second));
    assert!(!changed);
    assert!(!mask.any());
}

#[test]
fn border_mask_flags_only_changed_faces() {
    let store = LightingStore::new();
    let coord = ChunkCoord::new(0, 0, 0);
    let b = LightBorders::new();
    let (changed, _) = store.update_borders(coord, b.clone());
    assert!(changed);
    let mut b2 = b.clone();
    b2.sk_zp[5] = 9;
    let (changed, mask) = store.update_borders(coord, b2);
    assert!(changed);
    assert!(mask.zp);
    assert!(!(mask.xn || mask.xp || mask.yn || mask.yp || mask.zn));
    let neighbors: Vec<ChunkCoord> = mask.changed_neighbors(coord).collect();
    assert_eq!(neighbors, vec![ChunkCoord::new(0, 0, 1)]);
}
