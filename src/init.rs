use glam::DVec3;
use tracing::{debug, warn};
use crate::error::{Error, Result};
use crate::grid::SpatialIndex;
use crate::material::Material;
use crate::particle::ParticleStore;

/// Axis-aligned box that new particle centres are drawn from.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlacementRegion {
    pub min: DVec3,
    pub max: DVec3,
}

impl PlacementRegion {
    pub fn new(min: DVec3, max: DVec3) -> Result<Self> {
        if !min.is_finite() || !max.is_finite() || min.cmpgt(max).any() {
            return Err(Error::Configuration(format!(
                "placement region must satisfy min <= max, got {min} .. {max}"
            )));
        }
        Ok(Self { min, max })
    }

    pub fn sample(&self, rng: &mut fastrand::Rng) -> DVec3 {
        let u = DVec3::new(rng.f64(), rng.f64(), rng.f64());
        self.min + u * (self.max - self.min)
    }
}

/// Rejection sampler for non-overlapping particles.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Initializer {
    pub count: usize,
    pub radius_min: f64,
    pub radius_max: f64,
    pub region: PlacementRegion,
    /// Candidates drawn per particle before giving up.
    pub max_attempts: usize,
}

impl Initializer {
    pub const DEFAULT_MAX_ATTEMPTS: usize = 10_000;

    pub fn new(count: usize, radius_min: f64, radius_max: f64, region: PlacementRegion) -> Result<Self> {
        if !(radius_min > 0.0) || !radius_max.is_finite() || radius_max < radius_min {
            return Err(Error::Configuration(format!(
                "radius range must satisfy 0 < min <= max, got [{radius_min}, {radius_max}]"
            )));
        }
        Ok(Self {
            count,
            radius_min,
            radius_max,
            region,
            max_attempts: Self::DEFAULT_MAX_ATTEMPTS,
        })
    }

    pub fn with_max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    fn draw_radius(&self, rng: &mut fastrand::Rng) -> f64 {
        self.radius_min + rng.f64() * (self.radius_max - self.radius_min)
    }

    /// Adds `count` particles to `particles`, none overlapping each other or
    /// anything already stored.
    ///
    /// `grid` must already index the existing particles. Each accepted
    /// particle is inserted before the next one is drawn. Returns the ids
    /// of the new particles.
    pub fn place(
        &self,
        particles: &mut ParticleStore,
        grid: &mut SpatialIndex,
        material: &Material,
        rng: &mut fastrand::Rng,
    ) -> Result<Vec<usize>> {
        let mut placed = Vec::with_capacity(self.count);
        let mut total_attempts = 0;

        for _ in 0..self.count {
            let radius = self.draw_radius(rng);
            let reach = radius + self.radius_max.max(particles.max_radius());

            let mut attempts = 0;
            let position = loop {
                if attempts == self.max_attempts {
                    return Err(Error::PlacementInfeasible {
                        placed: placed.len(),
                        requested: self.count,
                        attempts,
                    });
                }
                attempts += 1;

                let candidate = grid.domain().wrap(self.region.sample(rng));
                let free = grid
                    .query_neighbors(candidate, reach, particles)
                    .iter()
                    .all(|n| n.distance() >= radius + particles[n.id].radius());
                if free {
                    break candidate;
                }
            };
            total_attempts += attempts;
            if attempts > self.max_attempts / 2 {
                warn!(attempts, placed = placed.len(), "particle placement is close to the retry ceiling");
            }

            let mass = material.mass_for_radius(radius);
            let particle = particles.create(position, radius, mass)?;
            grid.insert(particle);
            placed.push(particle.id());
        }

        debug!(placed = placed.len(), total_attempts, "initializer finished");
        Ok(placed)
    }
}
