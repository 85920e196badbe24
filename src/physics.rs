use glam::DVec3;
use crate::grid::Neighbor;
use crate::particle::{Particle, ParticleStore};

/// Planar wall at `position` on a non-periodic `axis`, pushing particles
/// towards increasing coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Wall {
    pub axis: usize,
    pub position: f64,
}

impl Wall {
    pub fn new(axis: usize, position: f64) -> Self {
        Self { axis, position }
    }

    pub fn normal(&self) -> DVec3 {
        let mut n = DVec3::ZERO;
        n[self.axis] = 1.0;
        n
    }

    pub fn distance(&self, point: DVec3) -> f64 {
        point[self.axis] - self.position
    }
}

/// Linear spring-dashpot contact model with a floor wall and uniform gravity.
///
/// Contributions are summed in a fixed order: particle contacts by ascending
/// neighbour id, then the wall, then gravity.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ForceModel {
    pub stiffness: f64,
    pub damping: f64,
    pub gravity: DVec3,
    pub wall: Option<Wall>,
}

impl ForceModel {
    pub fn new(stiffness: f64, damping: f64, gravity: DVec3, wall: Option<Wall>) -> Self {
        Self { stiffness, damping, gravity, wall }
    }

    /// Radius that catches every particle able to touch `particle`.
    pub fn search_radius(particle: &Particle, particles: &ParticleStore) -> f64 {
        particle.radius() + particles.max_radius()
    }

    /// Spring-damper force on `particle` from one overlapping neighbour.
    ///
    /// `dx` points from `particle` to `other`. Returns zero when the spheres
    /// do not overlap.
    pub fn contact_force(&self, particle: &Particle, other: &Particle, dx: DVec3) -> DVec3 {
        let r_sum = particle.radius() + other.radius();
        let dist = dx.length();
        if dist >= r_sum {
            return DVec3::ZERO;
        }

        // Coincident centres have no contact normal, only the damper acts
        let spring = if dist > 0.0 {
            -self.stiffness * (r_sum / dist - 1.0) * dx
        } else {
            DVec3::ZERO
        };
        spring + self.damping * (other.velocity - particle.velocity)
    }

    pub fn wall_force(&self, particle: &Particle) -> DVec3 {
        match self.wall {
            Some(wall) => {
                let overlap = particle.radius() - wall.distance(particle.position);
                if overlap > 0.0 {
                    self.stiffness * overlap * wall.normal()
                } else {
                    DVec3::ZERO
                }
            }
            None => DVec3::ZERO,
        }
    }

    pub fn body_force(&self, particle: &Particle) -> DVec3 {
        self.gravity * particle.mass()
    }

    /// Net acceleration of `particle` given its neighbour set.
    ///
    /// `neighbors` is expected sorted by id; the particle itself is skipped
    /// if present.
    pub fn acceleration(&self, particle: &Particle, neighbors: &[Neighbor], particles: &ParticleStore) -> DVec3 {
        let mut f_total = DVec3::ZERO;
        for n in neighbors {
            if n.id == particle.id() {
                continue;
            }
            f_total += self.contact_force(particle, &particles[n.id], n.displacement);
        }
        f_total += self.wall_force(particle);
        f_total += self.body_force(particle);
        f_total / particle.mass()
    }
}
