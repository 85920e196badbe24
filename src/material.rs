use std::f64::consts::PI;
use crate::error::{Error, Result};

/// Contact and bulk properties shared by every particle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Material {
    pub stiffness: f64, // k
    pub damping: f64,   // gamma
    pub density: f64,   // rho
}

impl Material {
    pub fn new(stiffness: f64, damping: f64, density: f64) -> Result<Self> {
        if !(stiffness > 0.0) || !stiffness.is_finite() {
            return Err(Error::Configuration(format!("stiffness must be positive, got {stiffness}")));
        }
        if !(damping >= 0.0) || !damping.is_finite() {
            return Err(Error::Configuration(format!("damping must be non-negative, got {damping}")));
        }
        if !(density > 0.0) || !density.is_finite() {
            return Err(Error::Configuration(format!("density must be positive, got {density}")));
        }
        Ok(Self { stiffness, damping, density })
    }

    /// Mass of a sphere of radius `radius`: (1/6)·π·(2r)³·ρ.
    pub fn mass_for_radius(&self, radius: f64) -> f64 {
        (1.0 / 6.0) * PI * 8.0 * radius * radius * radius * self.density
    }

    /// Timestep resolving one fiftieth of the damped contact period between
    /// the lightest and the heaviest particle.
    pub fn timestep(&self, radius_min: f64, radius_max: f64) -> Result<f64> {
        if !(radius_min > 0.0) || radius_max < radius_min {
            return Err(Error::Configuration(format!(
                "radius range must satisfy 0 < min <= max, got [{radius_min}, {radius_max}]"
            )));
        }
        let m_min = self.mass_for_radius(radius_min);
        let m_max = self.mass_for_radius(radius_max);
        let m_star = effective_mass(m_min, m_max);

        let omega_sq = self.stiffness / m_star - (0.5 * self.damping / m_star).powi(2);
        if !(omega_sq > 0.0) {
            return Err(Error::Configuration(format!(
                "contact is over-damped (k = {}, gamma = {}), no oscillation period to resolve",
                self.stiffness, self.damping
            )));
        }
        Ok((1.0 / 50.0) * PI / omega_sq.sqrt())
    }
}

pub fn effective_mass(m1: f64, m2: f64) -> f64 {
    (m1 * m2) / (m1 + m2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_mass_scales_with_cube_of_radius() {
        let material = Material::new(10.0, 0.0004, 1160.0).unwrap();
        let m1 = material.mass_for_radius(0.001);
        let m2 = material.mass_for_radius(0.002);
        assert_relative_eq!(m2 / m1, 8.0, epsilon = 1e-12);
        assert_relative_eq!(m1, 4.0 / 3.0 * PI * 1e-9 * 1160.0, max_relative = 1e-12);
    }

    #[test]
    fn test_timestep_matches_reference_constants() {
        let diameter = 0.0022;
        let material = Material::new(10.0, 0.0004, 1160.0).unwrap();
        let dt = material.timestep(0.25 * diameter, 0.5 * diameter).unwrap();

        let mass_min = (1.0 / 6.0) * PI * (0.5 * diameter).powi(3) * 1160.0;
        let mass_max = (1.0 / 6.0) * PI * diameter.powi(3) * 1160.0;
        let reduced = mass_min * mass_max / (mass_min + mass_max);
        let expected = (1.0 / 50.0) * PI / (10.0 / reduced - (0.5 * 0.0004 / reduced).powi(2)).sqrt();
        assert_relative_eq!(dt, expected, max_relative = 1e-12);
    }

    #[test]
    fn test_overdamped_material_is_rejected() {
        let material = Material::new(1.0, 10.0, 1000.0).unwrap();
        assert!(matches!(material.timestep(0.001, 0.001), Err(Error::Configuration(_))));
    }

    #[test]
    fn test_invalid_constants_are_rejected() {
        assert!(Material::new(0.0, 0.0, 1.0).is_err());
        assert!(Material::new(1.0, -0.1, 1.0).is_err());
        assert!(Material::new(1.0, 0.0, 0.0).is_err());
    }

    #[test]
    fn test_effective_mass() {
        assert_relative_eq!(effective_mass(2.0, 2.0), 1.0);
        assert_relative_eq!(effective_mass(1.0, 3.0), 0.75);
    }
}
