//! Configuration surface for a simulation run.
//!
//! Every field has a default that reproduces the reference settling run: 30
//! particles dropped into a tall box that is periodic in x and y, with a
//! floor wall at z = 0.
//!
//! ```toml
//! timesteps = 30000
//! outputs = 200
//! seed = 7
//!
//! [domain]
//! min = [0.0, 0.0, -0.0022]
//! max = [0.01033, 0.01033, 0.0332]
//! periodic = [true, true, false]
//!
//! [particles]
//! count = 30
//! radius_min = 0.00055
//! radius_max = 0.0011
//! ```
//!
//! Any key can also be set through `DEM_*` environment variables, with `__`
//! separating nested keys (`DEM_PARTICLES__COUNT=50`).

use std::path::Path;
use glam::DVec3;
use serde::Deserialize;
use crate::domain::Domain;
use crate::error::{Error, Result};
use crate::init::{Initializer, PlacementRegion};
use crate::material::Material;
use crate::physics::{ForceModel, Wall};

const BOX_LENGTH: f64 = 31.0 / 1000.0;
const DIAMETER: f64 = 0.0022;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DomainConfig {
    pub min: [f64; 3],
    pub max: [f64; 3],
    pub periodic: [bool; 3],
}

impl Default for DomainConfig {
    fn default() -> Self {
        Self {
            min: [0.0, 0.0, -DIAMETER],
            max: [BOX_LENGTH / 3.0, BOX_LENGTH / 3.0, BOX_LENGTH + DIAMETER],
            periodic: [true, true, false],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PlacementConfig {
    pub count: usize,
    pub radius_min: f64,
    pub radius_max: f64,
    pub region_min: [f64; 3],
    pub region_max: [f64; 3],
    /// Candidates drawn per particle before placement is declared infeasible.
    pub max_attempts: usize,
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            count: 30,
            radius_min: 0.25 * DIAMETER,
            radius_max: 0.5 * DIAMETER,
            region_min: [0.0, 0.0, DIAMETER / 2.0],
            region_max: [BOX_LENGTH / 3.0, BOX_LENGTH / 3.0, BOX_LENGTH - DIAMETER / 2.0],
            max_attempts: Initializer::DEFAULT_MAX_ATTEMPTS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct MaterialConfig {
    pub stiffness: f64,
    pub damping: f64,
    pub density: f64,
}

impl Default for MaterialConfig {
    fn default() -> Self {
        Self {
            stiffness: 1.0e1,
            damping: 0.0004,
            density: 1160.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct WallConfig {
    pub axis: usize,
    pub position: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub domain: DomainConfig,
    /// Neighbour search radius and grid cell size.
    pub search_radius: f64,
    pub particles: PlacementConfig,
    pub material: MaterialConfig,
    pub gravity: [f64; 3],
    pub wall: Option<WallConfig>,
    /// Derived from the material and radius range when absent.
    pub dt: Option<f64>,
    pub timesteps: usize,
    /// Output boundaries. The run takes `outputs * (timesteps / outputs)`
    /// steps, so a remainder of `timesteps` is not run.
    pub outputs: usize,
    pub seed: u64,
    pub check_finite: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            domain: DomainConfig::default(),
            search_radius: DIAMETER,
            particles: PlacementConfig::default(),
            material: MaterialConfig::default(),
            gravity: [0.0, 0.0, -9.81],
            wall: Some(WallConfig { axis: 2, position: 0.0 }),
            dt: None,
            timesteps: 30000,
            outputs: 200,
            seed: 0,
            check_finite: false,
        }
    }
}

impl SimulationConfig {
    /// Layers an optional config file and `DEM_*` environment variables over the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path));
        }
        let settings = builder
            .add_source(
                config::Environment::with_prefix("DEM")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;
        let config: SimulationConfig = settings.try_deserialize()?;
        Ok(config)
    }

    pub fn domain(&self) -> Result<Domain> {
        Domain::new(
            DVec3::from_array(self.domain.min),
            DVec3::from_array(self.domain.max),
            self.domain.periodic,
            self.search_radius,
        )
    }

    pub fn material(&self) -> Result<Material> {
        Material::new(self.material.stiffness, self.material.damping, self.material.density)
    }

    pub fn force_model(&self) -> ForceModel {
        ForceModel::new(
            self.material.stiffness,
            self.material.damping,
            DVec3::from_array(self.gravity),
            self.wall.map(|w| Wall::new(w.axis, w.position)),
        )
    }

    pub fn initializer(&self) -> Result<Initializer> {
        let p = &self.particles;
        if p.max_attempts == 0 {
            return Err(Error::Configuration("max_attempts must be at least 1".into()));
        }
        if 2.0 * p.radius_max > self.search_radius {
            return Err(Error::Configuration(format!(
                "search radius {} is smaller than the largest particle diameter {}",
                self.search_radius,
                2.0 * p.radius_max
            )));
        }
        let region = PlacementRegion::new(DVec3::from_array(p.region_min), DVec3::from_array(p.region_max))?;
        Ok(Initializer::new(p.count, p.radius_min, p.radius_max, region)?.with_max_attempts(p.max_attempts))
    }
}
