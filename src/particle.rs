use glam::DVec3;
use crate::error::{Error, Result};

/// Spherical particle. Radius and mass are fixed at creation.
#[derive(Clone, Copy, Debug)]
pub struct Particle {
    id: usize,
    pub position: DVec3,
    pub velocity: DVec3,
    pub acceleration: DVec3,
    radius: f64,
    mass: f64,
}

impl Particle {
    fn new(id: usize, position: DVec3, radius: f64, mass: f64) -> Self {
        Self {
            id,
            position,
            velocity: DVec3::ZERO,
            acceleration: DVec3::ZERO,
            radius,
            mass,
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    pub fn mass(&self) -> f64 {
        self.mass
    }

    pub fn momentum(&self) -> DVec3 {
        self.mass * self.velocity
    }

    pub fn kinetic_energy(&self) -> f64 {
        0.5 * self.mass * self.velocity.length_squared()
    }

    pub fn is_finite(&self) -> bool {
        self.position.is_finite() && self.velocity.is_finite()
    }
}

/// Growable particle population in creation order.
///
/// Particles are never removed, so a particle's id is also its index.
#[derive(Clone, Debug, Default)]
pub struct ParticleStore {
    particles: Vec<Particle>,
    max_radius: f64,
}

impl ParticleStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            particles: Vec::with_capacity(capacity),
            max_radius: 0.0,
        }
    }

    /// Appends a particle with the next id and zero velocity/acceleration.
    ///
    /// The particle is not visible to neighbour queries until the
    /// [`SpatialIndex`](crate::grid::SpatialIndex) is rebuilt or the particle
    /// is inserted into it.
    pub fn create(&mut self, position: DVec3, radius: f64, mass: f64) -> Result<&mut Particle> {
        if !(radius > 0.0) || !radius.is_finite() {
            return Err(Error::Configuration(format!("particle radius must be positive, got {radius}")));
        }
        if !(mass > 0.0) || !mass.is_finite() {
            return Err(Error::Configuration(format!("particle mass must be positive, got {mass}")));
        }
        if !position.is_finite() {
            return Err(Error::Configuration(format!("particle position must be finite, got {position}")));
        }

        let id = self.particles.len();
        self.max_radius = self.max_radius.max(radius);
        self.particles.push(Particle::new(id, position, radius, mass));
        Ok(&mut self.particles[id])
    }

    pub fn count(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    /// Largest radius in the store, 0 when empty.
    pub fn max_radius(&self) -> f64 {
        self.max_radius
    }

    pub fn get(&self, id: usize) -> Option<&Particle> {
        self.particles.get(id)
    }

    pub fn get_mut(&mut self, id: usize) -> Option<&mut Particle> {
        self.particles.get_mut(id)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Particle> {
        self.particles.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Particle> {
        self.particles.iter_mut()
    }

    pub fn as_slice(&self) -> &[Particle] {
        &self.particles
    }

    pub fn as_mut_slice(&mut self) -> &mut [Particle] {
        &mut self.particles
    }
}

impl std::ops::Index<usize> for ParticleStore {
    type Output = Particle;

    fn index(&self, id: usize) -> &Particle {
        &self.particles[id]
    }
}

impl<'a> IntoIterator for &'a ParticleStore {
    type Item = &'a Particle;
    type IntoIter = std::slice::Iter<'a, Particle>;

    fn into_iter(self) -> Self::IntoIter {
        self.particles.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_assigns_sequential_ids() {
        let mut store = ParticleStore::new();
        for i in 0..5 {
            let p = store.create(DVec3::splat(i as f64), 0.1 + i as f64 * 0.01, 1.0).unwrap();
            assert_eq!(p.id(), i);
            assert_eq!(p.velocity, DVec3::ZERO);
            assert_eq!(p.acceleration, DVec3::ZERO);
        }
        assert_eq!(store.count(), 5);
        let ids: Vec<usize> = store.iter().map(|p| p.id()).collect();
        assert_eq!(ids, vec![0, 1, 2, 3, 4]);
        assert!((store.max_radius() - 0.14).abs() < 1e-12);
    }

    #[test]
    fn test_create_rejects_bad_radius_and_mass() {
        let mut store = ParticleStore::new();
        assert!(matches!(store.create(DVec3::ZERO, 0.0, 1.0), Err(Error::Configuration(_))));
        assert!(matches!(store.create(DVec3::ZERO, -1.0, 1.0), Err(Error::Configuration(_))));
        assert!(matches!(store.create(DVec3::ZERO, 1.0, 0.0), Err(Error::Configuration(_))));
        assert!(matches!(store.create(DVec3::ZERO, f64::NAN, 1.0), Err(Error::Configuration(_))));
        assert!(store.is_empty());
    }

    #[test]
    fn test_handle_fills_dynamic_fields() {
        let mut store = ParticleStore::new();
        let p = store.create(DVec3::ZERO, 0.5, 2.0).unwrap();
        p.velocity = DVec3::new(1.0, 0.0, 0.0);
        assert_eq!(store[0].velocity.x, 1.0);
        assert!((store[0].kinetic_energy() - 1.0).abs() < 1e-12);
        assert_eq!(store[0].momentum(), DVec3::new(2.0, 0.0, 0.0));
    }
}
