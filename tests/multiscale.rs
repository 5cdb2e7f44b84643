//! Multi-scale radius finder tests.

mod support;

use point_neighbours::{
    MultiScaleRadiusFinder, NeighbourError, NeighbourFinder, PointSet, RadiusFinder,
};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use support::points::{interleaved_batches, random_cube_points};

#[test]
fn test_scale_zero_matches_single_radius_finder() {
    let _ = env_logger::builder().is_test(true).try_init();
    // Cube of side 4, so radius 1.0 neither catches everything nor nothing.
    let stretch = |p: PointSet| PointSet::new(p.as_flat().iter().map(|c| c * 4.0).collect(), 3).unwrap();
    let x = stretch(random_cube_points(400, 3, 1));
    let y = stretch(random_cube_points(30, 3, 2));

    let multi = MultiScaleRadiusFinder::new(vec![1.0, 2.0], 64).unwrap();
    let single = RadiusFinder::new(1.0, 64).unwrap();

    let a = multi
        .find_neighbours(&x, &y, &[0; 400], &[0; 30], 0)
        .unwrap();
    let b = single.find_neighbours(&x, &y, &[0; 400], &[0; 30]).unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_scale_index_out_of_range() {
    let x = random_cube_points(20, 3, 1);
    let multi = MultiScaleRadiusFinder::new(vec![1.0, 2.0], 64).unwrap();
    let err = multi
        .find_neighbours(&x, &x, &[0; 20], &[0; 20], 2)
        .unwrap_err();
    assert_eq!(
        err,
        NeighbourError::ScaleOutOfRange {
            index: 2,
            num_scales: 2
        }
    );
    assert_eq!(err.to_string(), "scale 2 is out of bounds 2");
}

#[test]
fn test_mismatched_scale_lists() {
    let err = MultiScaleRadiusFinder::new(vec![1.0, 2.0, 3.0], vec![10, 20]).unwrap_err();
    assert!(matches!(err, NeighbourError::Configuration(_)));
    assert!(NeighbourFinder::multiscale_radius(vec![1.0, 2.0, 3.0], vec![10, 20]).is_err());
}

#[test]
fn test_per_scale_caps_apply() {
    let x = random_cube_points(1000, 3, 3);
    let y = random_cube_points(10, 3, 4);
    let multi = MultiScaleRadiusFinder::new(0.4, vec![4, 32]).unwrap();

    let small = multi
        .find_neighbours(&x, &y, &[0; 1000], &[0; 10], 0)
        .unwrap();
    let large = multi
        .find_neighbours(&x, &y, &[0; 1000], &[0; 10], 1)
        .unwrap();
    assert!(small.count_per_query().iter().all(|&c| c <= 4));
    assert!(large.count_per_query().iter().all(|&c| c <= 32));
    // Same radius, lowest indices first: the small cap is a prefix of the large one.
    for q in 0..10 {
        let s = small.neighbours_of(q);
        assert_eq!(s, &large.neighbours_of(q)[..s.len()]);
    }
}

#[test]
fn test_larger_radius_is_superset() {
    let (x, batch_x) = interleaved_batches(200, 2, 3, 5);
    let (y, batch_y) = interleaved_batches(10, 2, 3, 6);
    let multi = MultiScaleRadiusFinder::new([0.1, 0.2, 0.3], 10_000).unwrap();
    let all = multi.find_all_scales(&x, &y, &batch_x, &batch_y).unwrap();

    assert_eq!(all.len(), 3);
    for pair in all.windows(2) {
        for q in 0..y.len() {
            let inner = pair[0].neighbours_of(q);
            let outer = pair[1].neighbours_of(q);
            assert!(inner.iter().all(|r| outer.contains(r)), "query {}", q);
        }
    }
    for (scale, pairs) in all.iter().enumerate() {
        assert_eq!(
            pairs,
            &multi
                .find_neighbours(&x, &y, &batch_x, &batch_y, scale)
                .unwrap()
        );
    }
}

#[test]
fn test_enum_dispatch_by_scale() {
    let x = random_cube_points(100, 3, 8);
    let finder = NeighbourFinder::multiscale_radius(vec![0.1, 0.5], 64).unwrap();
    assert_eq!(finder.num_scales(), 2);
    let mut rng = ChaCha8Rng::seed_from_u64(0);

    let near = finder
        .find_neighbours_at(&x, &x, &[0; 100], &[0; 100], 0, &mut rng)
        .unwrap();
    let far = finder
        .find_neighbours_at(&x, &x, &[0; 100], &[0; 100], 1, &mut rng)
        .unwrap();
    assert!(far.len() > near.len());
    // Every point finds itself.
    assert!(near.count_per_query().iter().all(|&c| c >= 1));
    assert!(finder
        .find_neighbours_at(&x, &x, &[0; 100], &[0; 100], 2, &mut rng)
        .is_err());
}
