use super::*;
use crate::math::FixedNum;

fn hash_with(nodes: &[(u32, i32, i32)]) -> NodeSpatialHash {
    let mut hash = NodeSpatialHash::new(GridPos::new(-150, -150), GridPos::new(150, 150), 32);
    for &(id, x, z) in nodes {
        hash.insert(NodeId(id), GridPos::new(x, z));
    }
    hash
}

#[test]
fn empty_index_returns_none() {
    let hash = hash_with(&[]);
    assert_eq!(hash.find_nearest(GridPos::ZERO), None);
}

#[test]
fn single_node_always_found() {
    // One node far from the query: must be found even though it is outside
    // the 3x3 and 5x5 neighborhoods.
    let hash = hash_with(&[(7, 140, 140)]);
    assert_eq!(hash.find_nearest(GridPos::new(-140, -140)), Some(NodeId(7)));
    assert_eq!(hash.find_nearest(GridPos::new(140, 140)), Some(NodeId(7)));
}

#[test]
fn returns_true_nearest_among_neighbors() {
    let hash = hash_with(&[(0, 10, 10), (1, 40, 10), (2, -20, -30)]);
    assert_eq!(hash.find_nearest(GridPos::new(12, 12)), Some(NodeId(0)));
    assert_eq!(hash.find_nearest(GridPos::new(38, 8)), Some(NodeId(1)));
    assert_eq!(hash.find_nearest(GridPos::new(-25, -25)), Some(NodeId(2)));
}

#[test]
fn max_radius_rejects_distant_nodes() {
    let hash = hash_with(&[(0, 50, 0)]);
    assert_eq!(
        hash.find_nearest_within(GridPos::ZERO, FixedNum::from_num(10)),
        None
    );
    assert_eq!(
        hash.find_nearest_within(GridPos::ZERO, FixedNum::from_num(60)),
        Some(NodeId(0))
    );
}

#[test]
fn queries_outside_bounds_clamp_to_border() {
    let hash = hash_with(&[(0, 149, 0)]);
    // Query well outside the indexed region still resolves.
    assert_eq!(hash.find_nearest(GridPos::new(500, 0)), Some(NodeId(0)));
}

#[test]
fn equidistant_candidates_break_ties_by_id() {
    let hash = hash_with(&[(3, 10, 0), (1, -10, 0)]);
    assert_eq!(hash.find_nearest(GridPos::ZERO), Some(NodeId(1)));
}

#[test]
fn insert_outside_bounds_is_dropped() {
    let mut hash = NodeSpatialHash::new(GridPos::new(0, 0), GridPos::new(64, 64), 32);
    hash.insert(NodeId(0), GridPos::new(1000, 1000));
    assert_eq!(hash.total_entries(), 0);
}
