use super::*;
use crate::nav::error::NavError;

fn unit_radius() -> FixedNum {
    FixedNum::from_num(0.5)
}

#[test]
fn test_neighbor_counts() {
    let grid = NavGrid::new(3, 3, unit_radius(), FixedVec2::ZERO).unwrap();

    let corner = grid.node_at(0, 0).unwrap();
    let edge = grid.node_at(1, 0).unwrap();
    let center = grid.node_at(1, 1).unwrap();

    assert_eq!(grid.neighbors(corner).len(), 3);
    assert_eq!(grid.neighbors(edge).len(), 5);
    assert_eq!(grid.neighbors(center).len(), 8);
}

#[test]
fn test_diagonal_directions_are_flagged() {
    let grid = NavGrid::new(3, 3, unit_radius(), FixedVec2::ZERO).unwrap();
    let center = grid.node_at(1, 1).unwrap();

    let diagonals = grid
        .neighbors(center)
        .iter()
        .filter(|(dir, _)| dir.is_diagonal())
        .count();
    assert_eq!(diagonals, 4);

    for &(dir, id) in grid.neighbors(center) {
        let (dx, dy) = dir.offset();
        let node = grid.node(id);
        assert_eq!(node.x as i32, 1 + dx);
        assert_eq!(node.y as i32, 1 + dy);
    }
}

#[test]
fn test_from_rows_top_row_is_north() {
    let grid = NavGrid::from_rows(&["#..", "...", "..E"], unit_radius(), FixedVec2::ZERO).unwrap();

    assert_eq!(grid.node(grid.node_at(0, 2).unwrap()).base_type, NodeType::Obstacle);
    assert_eq!(grid.node(grid.node_at(2, 0).unwrap()).base_type, NodeType::End);
    assert_eq!(grid.node(grid.node_at(1, 1).unwrap()).base_type, NodeType::Walkable);
}

#[test]
fn test_from_rows_rejects_bad_layouts() {
    assert!(matches!(
        NavGrid::from_rows(&[], unit_radius(), FixedVec2::ZERO),
        Err(NavError::EmptyLayout)
    ));
    assert!(matches!(
        NavGrid::from_rows(&["...", ".."], unit_radius(), FixedVec2::ZERO),
        Err(NavError::RaggedLayout { row: 1, expected: 3, found: 2 })
    ));
    assert!(matches!(
        NavGrid::from_rows(&["..x"], unit_radius(), FixedVec2::ZERO),
        Err(NavError::UnknownCell { glyph: 'x', .. })
    ));
    assert!(matches!(
        NavGrid::new(0, 4, unit_radius(), FixedVec2::ZERO),
        Err(NavError::InvalidDimensions { .. })
    ));
}

#[test]
fn test_world_grid_conversion() {
    let origin = FixedVec2::from_f32(-5.0, -5.0);
    let grid = NavGrid::new(10, 10, unit_radius(), origin).unwrap();

    let center = grid.grid_to_world(3, 7);
    assert_eq!(center, FixedVec2::from_f32(-1.5, 2.5));
    assert_eq!(grid.world_to_grid(center), Some((3, 7)));
    assert_eq!(grid.world_to_grid(FixedVec2::from_f32(-6.0, 0.0)), None);
}

#[test]
fn test_node_from_world_point_clamps_to_border() {
    let grid = NavGrid::new(4, 4, unit_radius(), FixedVec2::ZERO).unwrap();

    let below = grid.node_from_world_point(FixedVec2::from_f32(-3.0, -3.0)).unwrap();
    assert_eq!((grid.node(below).x, grid.node(below).y), (0, 0));

    let beyond = grid.node_from_world_point(FixedVec2::from_f32(100.0, 1.5)).unwrap();
    assert_eq!((grid.node(beyond).x, grid.node(beyond).y), (3, 1));

    assert!(NavGrid::default().node_from_world_point(FixedVec2::ZERO).is_none());
}

#[test]
fn test_random_grid_is_reproducible() {
    let a = random_grid(32, 32, unit_radius(), 0.25, 7).unwrap();
    let b = random_grid(32, 32, unit_radius(), 0.25, 7).unwrap();

    let types_a: Vec<_> = a.nodes().iter().map(|n| n.base_type).collect();
    let types_b: Vec<_> = b.nodes().iter().map(|n| n.base_type).collect();
    assert_eq!(types_a, types_b);
    assert!(types_a.contains(&NodeType::Obstacle));
}

#[test]
fn test_saved_map_loads_back() {
    let grid = NavGrid::from_rows(&["..#", ".#.", "..."], unit_radius(), FixedVec2::ZERO).unwrap();
    let spawn = grid.grid_to_world(0, 0);
    let path = std::env::temp_dir().join(format!("gridwalk_map_{}.bin", std::process::id()));

    save_map(&path, &NavMapData::new(grid.clone(), vec![spawn])).unwrap();
    let loaded = load_map(&path).unwrap();
    let _ = std::fs::remove_file(&path);

    assert_eq!(loaded.version, MAP_VERSION);
    assert_eq!(loaded.spawn_points, vec![spawn]);
    assert_eq!(loaded.grid.max_size(), grid.max_size());
    for (a, b) in loaded.grid.nodes().iter().zip(grid.nodes()) {
        assert_eq!(a.base_type, b.base_type);
        assert_eq!(a.neighbors, b.neighbors);
    }
}

#[test]
fn test_non_positive_radius_is_rejected() {
    assert!(matches!(
        NavGrid::new(3, 3, FixedNum::ZERO, FixedVec2::ZERO),
        Err(NavError::InvalidNodeRadius { .. })
    ));
    assert!(matches!(
        NavGrid::from_rows(&["..."], FixedNum::from_num(-0.5), FixedVec2::ZERO),
        Err(NavError::InvalidNodeRadius { .. })
    ));
}

fn save_and_reload(name: &str, grid: NavGrid) -> NavResult<NavMapData> {
    let path = std::env::temp_dir().join(format!("gridwalk_{}_{}.bin", name, std::process::id()));
    save_map(&path, &NavMapData::new(grid, Vec::new())).unwrap();
    let loaded = load_map(&path);
    let _ = std::fs::remove_file(&path);
    loaded
}

#[test]
fn test_corrupt_map_is_rejected_on_load() {
    let mut missing_nodes = NavGrid::new(3, 3, unit_radius(), FixedVec2::ZERO).unwrap();
    missing_nodes.nodes.truncate(4);
    assert!(matches!(
        save_and_reload("missing_nodes", missing_nodes),
        Err(NavError::CorruptGrid(_))
    ));

    let mut dangling = NavGrid::new(3, 3, unit_radius(), FixedVec2::ZERO).unwrap();
    dangling.nodes[4].neighbors[0].1 = NodeId(99);
    assert!(matches!(
        save_and_reload("dangling", dangling),
        Err(NavError::CorruptGrid(_))
    ));

    let mut flat = NavGrid::new(3, 3, unit_radius(), FixedVec2::ZERO).unwrap();
    flat.node_radius = FixedNum::ZERO;
    assert!(matches!(
        save_and_reload("flat", flat),
        Err(NavError::InvalidNodeRadius { .. })
    ));

    let intact = NavGrid::new(3, 3, unit_radius(), FixedVec2::ZERO).unwrap();
    let loaded = save_and_reload("intact", intact).unwrap();
    assert_eq!(loaded.grid.node_from_world_point(FixedVec2::from_f32(1.5, 1.5)), loaded.grid.node_at(1, 1));
}
