use super::*;

#[test]
fn test_cube_corners_at_plus_minus_size() {
    let corners = cube_corners(2.5);
    assert_eq!(corners.len(), 8);
    for corner in &corners {
        for axis in corner {
            assert_eq!(axis.abs(), 2.5);
        }
    }
    // All 8 sign combinations present
    let mut seen = std::collections::HashSet::new();
    for corner in &corners {
        seen.insert([corner[0] > 0.0, corner[1] > 0.0, corner[2] > 0.0]);
    }
    assert_eq!(seen.len(), 8);
}

#[test]
fn test_cube_indices_describe_twelve_edges() {
    assert_eq!(CUBE_INDICES.len(), 24);

    // Each vertex participates in exactly 3 edges.
    let mut degree = [0u32; 8];
    for &index in &CUBE_INDICES {
        degree[index as usize] += 1;
    }
    assert!(degree.iter().all(|&d| d == 3));

    // Every edge connects corners differing in exactly one axis.
    let corners = cube_corners(1.0);
    for pair in CUBE_INDICES.chunks(2) {
        let a = corners[pair[0] as usize];
        let b = corners[pair[1] as usize];
        let differing = (0..3).filter(|&axis| a[axis] != b[axis]).count();
        assert_eq!(differing, 1, "edge {:?} is not axis-aligned", pair);
    }
}
