//! Public API integration tests for point-neighbours.

mod support;

use point_neighbours::{
    NeighbourError, NeighbourFinder, Point3, PointSet, SampleSize, Sampler,
};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use support::points::{contiguous_batch, random_cube_points};

#[test]
fn test_point_set_constructors_agree() {
    let rows = [[0.0f32, 1.0, 2.0], [3.0, 4.0, 5.0]];
    let from_rows = PointSet::from_rows(&rows).unwrap();
    let from_p3 = PointSet::from_point3s(&[Point3::new(0.0, 1.0, 2.0), Point3::new(3.0, 4.0, 5.0)])
        .unwrap();
    let from_tuples = PointSet::from_points(&[(0.0f32, 1.0f32, 2.0f32), (3.0, 4.0, 5.0)]).unwrap();
    let from_flat = PointSet::new(vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0], 3).unwrap();

    assert_eq!(from_rows, from_flat);
    assert_eq!(from_p3, from_flat);
    assert_eq!(from_tuples, from_flat);
    assert_eq!(from_flat.len(), 2);
    assert_eq!(from_flat.point(1), &[3.0, 4.0, 5.0]);
}

#[test]
fn test_point_set_rejects_bad_input() {
    assert!(matches!(
        PointSet::new(vec![0.0; 5], 2),
        Err(NeighbourError::InvalidPoints(_))
    ));
    assert!(matches!(
        PointSet::new(vec![0.0, f32::NAN], 1),
        Err(NeighbourError::InvalidPoints(_))
    ));
    assert!(matches!(
        PointSet::new(vec![], 0),
        Err(NeighbourError::InvalidPoints(_))
    ));
}

#[cfg(feature = "glam")]
#[test]
fn test_point_set_from_glam() {
    let v = [glam::Vec3::new(1.0, 2.0, 3.0)];
    let points = PointSet::try_from(&v[..]).unwrap();
    assert_eq!(points.point(0), &[1.0, 2.0, 3.0]);
}

/// Two downsampling stages of a point-cloud backbone over a batch of two clouds.
#[test]
fn test_two_stage_pipeline() {
    let _ = env_logger::builder().is_test(true).try_init();
    let points = random_cube_points(2000, 3, 12345);
    let batch = contiguous_batch(&[1200, 800]);
    let mut rng = ChaCha8Rng::seed_from_u64(99);

    let sampler = Sampler::farthest_point(SampleSize::Ratio(0.25)).unwrap();
    let finder = NeighbourFinder::multiscale_radius(vec![0.1, 0.2], vec![16, 32]).unwrap();

    // Stage 1
    let idx1 = sampler.sample(&points, &batch, &mut rng).unwrap();
    assert_eq!(idx1.len(), 500);
    let centres1 = points.select(&idx1).unwrap();
    let batch1: Vec<usize> = idx1.iter().map(|&i| batch[i]).collect();
    for scale in 0..finder.num_scales() {
        let pairs = finder
            .find_neighbours_at(&points, &centres1, &batch, &batch1, scale, &mut rng)
            .unwrap();
        assert_eq!(pairs.num_queries(), 500);
        // Each centre is one of the reference points, so finds at least itself.
        assert!(pairs.count_per_query().iter().all(|&c| c >= 1));
        for (r, q) in pairs.iter() {
            assert_eq!(batch[r], batch1[q]);
        }
    }

    // Stage 2 on the output of stage 1.
    let idx2 = sampler.sample(&centres1, &batch1, &mut rng).unwrap();
    assert_eq!(idx2.len(), 125);
    let centres2 = centres1.select(&idx2).unwrap();
    let batch2: Vec<usize> = idx2.iter().map(|&i| batch1[i]).collect();
    let knn = NeighbourFinder::knn(8).unwrap();
    let pairs = knn
        .find_neighbours(&centres1, &centres2, &batch1, &batch2, &mut rng)
        .unwrap();
    assert_eq!(pairs.len(), 125 * 8);
    let (reference, query) = pairs.into_parts();
    assert!(reference.iter().all(|&r| r < centres1.len()));
    assert!(query.windows(2).all(|w| w[0] <= w[1]));
}

#[test]
fn test_error_display() {
    let err = NeighbourError::BatchLengthMismatch {
        points: 4,
        batch: 3,
    };
    assert_eq!(err.to_string(), "batch vector has 3 entries for 4 points");
    let boxed: Box<dyn std::error::Error> = Box::new(NeighbourError::EmptyInput);
    assert!(boxed.to_string().contains("empty"));
}
