use std::collections::HashSet;

use isochunk::camera::Camera;
use isochunk::chunk::TileFlags;
use isochunk::coords::{project, unproject, IsoProjection};
use isochunk::visibility::{ChunkBounds, VisibilitySet};
use isochunk::{AssetTable, ChunkStore, EngineConfig, TileMap};
use nalgebra_glm as glm;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn config(side: i32, radius: i32) -> EngineConfig {
    EngineConfig {
        tile_size: 8,
        tile_raise_pixels: 4,
        chunk_side_length: side,
        view_radius_x: radius,
        view_radius_y: radius,
        screen_width: 64,
        screen_height: 64,
        ..Default::default()
    }
}

fn store(config: &EngineConfig, map: TileMap) -> (ChunkStore, AssetTable) {
    let assets = AssetTable::flat_shaded(&map.distinct_ids(), config.tile_size);
    (ChunkStore::new(config, map).unwrap(), assets)
}

/// Camera offset that puts `chunk` under the screen centre.
fn camera_on_chunk(config: &EngineConfig, chunk: &glm::IVec2) -> glm::Vec2 {
    Camera::centered_on(config, &(chunk * config.chunk_side_length)).offset()
}

fn resident_set(store: &ChunkStore) -> HashSet<glm::IVec2> {
    store.resident_positions().copied().collect()
}

fn expected_set(store: &ChunkStore, center: &glm::IVec2, radius: i32) -> HashSet<glm::IVec2> {
    let mut expected = HashSet::new();
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            let pos = center + glm::vec2(dx, dy);
            if store.bounds().contains(&pos) {
                expected.insert(pos);
            }
        }
    }
    expected
}

#[test]
fn small_map_loads_only_in_bounds_chunks() {
    let config = config(5, 2);
    let map = TileMap::generate(10, 10, &[0, 1, 2], 1).unwrap();
    let (mut store, assets) = store(&config, map);

    let report = store
        .sync(&camera_on_chunk(&config, &glm::vec2(0, 0)), &assets)
        .unwrap();

    assert_eq!(report.center, glm::vec2(0, 0));
    assert_eq!(store.resident_len(), 4);
    assert_eq!(report.loaded.len(), 4);
    assert_eq!(report.out_of_bounds, 21);
    let expected: HashSet<glm::IVec2> = [(0, 0), (1, 0), (0, 1), (1, 1)]
        .into_iter()
        .map(|(x, y)| glm::vec2(x, y))
        .collect();
    assert_eq!(resident_set(&store), expected);
}

#[test]
fn small_map_at_camera_origin_loads_four_chunks() {
    let config = config(5, 2);
    let map = TileMap::generate(10, 10, &[0, 1, 2], 1).unwrap();
    let (mut store, assets) = store(&config, map);

    let report = store.sync(&glm::vec2(0.0, 0.0), &assets).unwrap();

    assert_eq!(report.center, glm::vec2(0, 0));
    assert_eq!(store.resident_len(), 4);
    assert_eq!(report.out_of_bounds, 21);
}

#[test]
fn visibility_set_matches_store_residency() {
    let config = config(4, 1);
    let map = TileMap::generate(40, 40, &[0, 1], 4).unwrap();
    let (mut store, assets) = store(&config, map);
    let visibility = VisibilitySet::new(&config);
    assert_eq!(visibility.window().len(), store.window_len());

    let camera = camera_on_chunk(&config, &glm::vec2(3, 8));
    let center = visibility.center_chunk(&camera);
    assert_eq!(center, glm::vec2(3, 8));
    store.sync(&camera, &assets).unwrap();

    let bounds = ChunkBounds {
        extent: glm::vec2(10, 10),
    };
    assert_eq!(store.bounds(), bounds);
    let visible: HashSet<glm::IVec2> = visibility
        .visible_chunks(&center)
        .into_iter()
        .filter(|pos| bounds.contains(pos))
        .collect();
    assert_eq!(resident_set(&store), visible);
}

#[test]
fn one_chunk_step_swaps_one_column() {
    let config = config(4, 1);
    let map = TileMap::generate(40, 40, &[0, 1], 2).unwrap();
    let (mut store, assets) = store(&config, map);

    store
        .sync(&camera_on_chunk(&config, &glm::vec2(5, 5)), &assets)
        .unwrap();
    assert_eq!(store.resident_len(), 9);

    let report = store
        .sync(&camera_on_chunk(&config, &glm::vec2(6, 5)), &assets)
        .unwrap();

    assert_eq!(report.center, glm::vec2(6, 5));
    let unloaded: HashSet<glm::IVec2> = report.unloaded.iter().copied().collect();
    let loaded: HashSet<glm::IVec2> = report.loaded.iter().copied().collect();
    assert_eq!(
        unloaded,
        (4..=6).map(|y| glm::vec2(4, y)).collect::<HashSet<_>>()
    );
    assert_eq!(
        loaded,
        (4..=6).map(|y| glm::vec2(7, y)).collect::<HashSet<_>>()
    );
    assert_eq!(store.resident_len(), 9);
    // only the newly loaded chunks needed a canvas
    assert_eq!(report.rebuilt, 3);
}

#[test]
fn random_walk_keeps_pool_and_residency_consistent() {
    let config = config(4, 2);
    let map = TileMap::generate(30, 22, &[0, 1, 2, 3], 7).unwrap();
    let (mut store, assets) = store(&config, map);
    let capacity = store.pool().capacity();
    let mut rng = StdRng::seed_from_u64(42);

    for _ in 0..60 {
        let target = glm::vec2(rng.gen_range(-4..12), rng.gen_range(-4..10));
        let report = store
            .sync(&camera_on_chunk(&config, &target), &assets)
            .unwrap();

        assert_eq!(report.center, target);
        assert_eq!(store.pool().in_use(), store.resident_len());
        assert_eq!(store.pool().in_use() + store.pool().free_len(), capacity);
        assert!(store.resident_len() <= store.window_len());
        assert_eq!(resident_set(&store), expected_set(&store, &target, 2));
        for (pos, chunk) in store.resident() {
            assert_eq!(chunk.pos, *pos);
            assert!(!chunk.dirty);
            assert!(chunk.surface.is_some());
        }
    }
}

#[test]
fn empty_cells_produce_no_tiles() {
    let config = config(4, 1);
    let map = TileMap::parse(
        "0 -1 0 0\n\
         0 0 0 0\n\
         -1 0 0 0\n\
         0 0 0 -1\n",
    )
    .unwrap();
    let (mut store, assets) = store(&config, map);
    store
        .sync(&camera_on_chunk(&config, &glm::vec2(0, 0)), &assets)
        .unwrap();

    let chunk = store.chunk_at(&glm::vec2(0, 0)).unwrap();
    assert_eq!(chunk.tiles.len(), 13);
    assert!(store.tile_at(&glm::vec2(1, 0)).is_none());
    assert!(store.tile_at(&glm::vec2(0, 2)).is_none());
    assert!(store.tile_at(&glm::vec2(0, 0)).is_some());
    assert!(!store.flag_tile(&glm::vec2(3, 3), TileFlags::RAISED));
}

#[test]
fn raised_tile_is_cleared_and_rebuilt_once() {
    let config = config(4, 1);
    let map = TileMap::generate(12, 12, &[0, 1], 5).unwrap();
    let (mut store, assets) = store(&config, map);
    store
        .sync(&camera_on_chunk(&config, &glm::vec2(1, 1)), &assets)
        .unwrap();

    let tile = glm::vec2(5, 6);
    let chunk_pos = glm::vec2(1, 1);
    let before = store.chunk_at(&chunk_pos).unwrap().revision;

    assert!(store.flag_tile(&tile, TileFlags::RAISED));
    assert!(store.chunk_at(&chunk_pos).unwrap().dirty);
    assert_eq!(store.rebuild_dirty(&assets), 1);
    assert_eq!(store.chunk_at(&chunk_pos).unwrap().revision, before + 1);

    assert_eq!(store.clear_frame(&assets), 1);
    let chunk = store.chunk_at(&chunk_pos).unwrap();
    assert!(chunk.tiles.values().all(|tile| tile.flags.is_empty()));
    assert!(chunk.flags.is_empty());
    assert!(!chunk.dirty);
    assert_eq!(chunk.revision, before + 2);
    assert!(store.tracker().is_empty());
}

#[test]
fn untouched_chunks_are_not_rebuilt() {
    let config = config(4, 1);
    let map = TileMap::generate(12, 12, &[0, 1], 6).unwrap();
    let (mut store, assets) = store(&config, map);
    store
        .sync(&camera_on_chunk(&config, &glm::vec2(1, 1)), &assets)
        .unwrap();

    let revisions: Vec<(glm::IVec2, u64)> = store
        .resident()
        .map(|(pos, chunk)| (*pos, chunk.revision))
        .collect();

    store.flag_tile(&glm::vec2(1, 1), TileFlags::MOUSE_OVER);
    assert_eq!(store.rebuild_dirty(&assets), 1);
    store.clear_frame(&assets);

    for (pos, revision) in revisions {
        let now = store.chunk_at(&pos).unwrap().revision;
        if pos == glm::vec2(0, 0) {
            assert_eq!(now, revision + 2);
        } else {
            assert_eq!(now, revision, "chunk {:?} was rebuilt", pos);
        }
    }

    // a stationary camera changes nothing
    let report = store
        .sync(&camera_on_chunk(&config, &glm::vec2(1, 1)), &assets)
        .unwrap();
    assert!(report.loaded.is_empty());
    assert!(report.unloaded.is_empty());
    assert_eq!(report.rebuilt, 0);
}

#[test]
fn grid_iso_round_trip() {
    let config = EngineConfig::default();
    let projections = [
        IsoProjection::tiles(&config),
        IsoProjection::chunks(&config),
        IsoProjection::chunk_canvas(&config),
    ];
    for y in -20..20 {
        for x in -20..20 {
            let pos = glm::vec2(x, y);
            assert_eq!(unproject(&project(&pos, config.tile_size), config.tile_size), pos);
            for projection in &projections {
                assert_eq!(projection.iso_to_grid(&projection.grid_to_iso(&pos)), pos);
            }
        }
    }
}
