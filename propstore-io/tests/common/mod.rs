use propstore_core::{
    containers::PropertyContainer,
    layout::{DataType, FloatType, ParticleProperty, Particles},
    nalgebra::Vector3,
};
use rand::{thread_rng, Rng};

/// Generates a particle container with positions, identifiers, a typed property and a padded user property, all
/// filled with random values
pub fn random_particles(count: usize) -> PropertyContainer<Particles> {
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
    for (index, identifier) in particles
        .create_property(ParticleProperty::Identifier, false)
        .unwrap()
        .view_mut::<i64>()
        .iter_mut()
        .enumerate()
    {
        *identifier = index as i64 * 3 + 1;
    }
    for particle_type in particles
        .create_property(ParticleProperty::Type, false)
        .unwrap()
        .view_mut::<i32>()
        .iter_mut()
    {
        *particle_type = rng.gen_range(1..4);
    }
    {
        let padded = particles
            .create_user_property("Orbital", DataType::Int32, 3, 16, true, &["S", "P", "D"])
            .unwrap();
        let mut table = padded.table_view_mut::<i32>();
        for index in 0..count {
            for component in 0..3 {
                table.set(index, component, rng.gen_range(-50..50));
            }
        }
    }
    particles
}
