//! Property checks for observation discretization.

use flappy::{Discretizer, RawObservation, types::MAX_LEVEL};
use rand::{Rng, SeedableRng, rngs::StdRng};

#[test]
fn random_observations_land_on_the_lattice() {
    let discretizer = Discretizer::default();
    let mut rng = StdRng::seed_from_u64(11);

    for _ in 0..10_000 {
        let obs = RawObservation::new(
            rng.random_range(-200.0..800.0),
            rng.random_range(-200.0..800.0),
            rng.random_range(-100.0..500.0),
            rng.random_range(-20..20),
        );
        let key = discretizer.discretize(&obs);
        assert!(key.position <= MAX_LEVEL);
        assert!(key.gap_top <= MAX_LEVEL);
        assert!(key.distance <= MAX_LEVEL);
        assert_eq!(key.velocity, obs.player_vel);
    }
}

#[test]
fn discretization_is_monotone_in_each_field() {
    let discretizer = Discretizer::default();
    let mut last = 0;
    for y in 0..=512 {
        let key = discretizer.discretize(&RawObservation::new(f64::from(y), 0.0, 0.0, 0));
        assert!(key.position >= last, "level dropped at y={y}");
        last = key.position;
    }
    assert_eq!(last, MAX_LEVEL);
}

#[test]
fn reference_points() {
    let discretizer = Discretizer::default();
    let key = discretizer.discretize(&RawObservation::new(0.0, 256.0, 288.0, -7));
    assert_eq!(
        (key.position, key.gap_top, key.distance, key.velocity),
        (0, 7, 15, -7)
    );

    let key = discretizer.discretize(&RawObservation::new(-40.0, 600.0, 1000.0, 3));
    assert_eq!((key.position, key.gap_top, key.distance), (0, 15, 15));
}

#[test]
fn same_observation_same_key() {
    let discretizer = Discretizer::default();
    let obs = RawObservation::new(123.4, 210.9, 97.5, -4);
    assert_eq!(discretizer.discretize(&obs), discretizer.discretize(&obs));
}
