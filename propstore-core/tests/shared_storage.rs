use std::sync::Arc;
use std::thread;

use propstore_core::{
    containers::{make_mutable, PropertyContainer, PropertyView},
    layout::{FloatType, ParticleProperty, Particles},
    nalgebra::Vector3,
};
use rand::{thread_rng, Rng};

fn particles_with_positions(count: usize) -> PropertyContainer<Particles> {
    let mut rng = thread_rng();
    let mut particles = PropertyContainer::new();
    particles.set_element_count(count);
    for position in particles
        .create_property(ParticleProperty::Position, false)
        .unwrap()
        .view_mut::<Vector3<FloatType>>()
        .iter_mut()
    {
        *position = Vector3::new(rng.gen(), rng.gen(), rng.gen());
    }
    particles
}

#[test]
fn concurrent_readers_see_the_same_snapshot() {
    let particles = particles_with_positions(1000);
    let shared = Arc::clone(
        particles
            .get_property(ParticleProperty::Position)
            .unwrap()
            .shared_storage(),
    );
    let expected_sum: FloatType = PropertyView::<Vector3<FloatType>, _>::new(&*shared)
        .iter()
        .map(|position| position.x + position.y + position.z)
        .sum();

    let readers = (0..4)
        .map(|_| {
            let storage = Arc::clone(&shared);
            thread::spawn(move || {
                PropertyView::<Vector3<FloatType>, _>::new(storage)
                    .iter()
                    .map(|position| position.x + position.y + position.z)
                    .sum::<FloatType>()
            })
        })
        .collect::<Vec<_>>();

    // Mutating a clone of the container while readers are running must not affect them
    let mut writer = particles.clone();
    writer
        .get_mutable_property(ParticleProperty::Position)
        .unwrap()
        .view_mut::<Vector3<FloatType>>()
        .fill(Vector3::zeros());

    for reader in readers {
        assert_eq!(reader.join().unwrap(), expected_sum);
    }
    assert_eq!(
        PropertyView::<Vector3<FloatType>, _>::new(&*shared)
            .iter()
            .map(|position| position.x + position.y + position.z)
            .sum::<FloatType>(),
        expected_sum
    );
}

#[test]
fn make_mutable_in_threads_never_affects_the_original() {
    let particles = particles_with_positions(64);
    let original = Arc::clone(
        particles
            .get_property(ParticleProperty::Position)
            .unwrap()
            .shared_storage(),
    );
    let workers = (0..4)
        .map(|worker| {
            let mut storage = Arc::clone(&original);
            thread::spawn(move || {
                make_mutable(&mut storage).fill(Vector3::repeat(worker as FloatType));
                storage
            })
        })
        .collect::<Vec<_>>();
    for (worker, handle) in workers.into_iter().enumerate() {
        let storage = handle.join().unwrap();
        assert!(!Arc::ptr_eq(&storage, &original));
        assert!(PropertyView::<Vector3<FloatType>, _>::new(storage)
            .iter()
            .all(|position| *position == Vector3::repeat(worker as FloatType)));
    }
    assert_eq!(
        original.as_ref(),
        particles
            .get_property(ParticleProperty::Position)
            .unwrap()
            .storage()
    );
}
