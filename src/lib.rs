//! Discrete element simulation of spherical particles.
//!
//! Particles live in a cuboid [`Domain`](domain::Domain) that can be periodic
//! along any axis. Each micro-step drifts every particle with its previous
//! velocity, rebuilds the bucket grid in [`grid`], evaluates the linear
//! spring-dashpot [`ForceModel`](physics::ForceModel) against the particles in
//! contact, and then kicks the velocities.
//!
//! ```no_run
//! use rusty_dem::config::SimulationConfig;
//! use rusty_dem::output::NullSink;
//! use rusty_dem::simulation::Simulation;
//!
//! # fn main() -> rusty_dem::Result<()> {
//! let config = SimulationConfig::default();
//! let mut sim = Simulation::from_config(&config)?;
//! let mut rng = fastrand::Rng::with_seed(config.seed);
//! sim.seed(&config.initializer()?, &mut rng)?;
//! sim.run(&mut NullSink, &mut ())?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod domain;
pub mod error;
pub mod grid;
pub mod init;
pub mod material;
pub mod output;
pub mod particle;
pub mod physics;
pub mod simulation;
pub mod vtk;

pub use error::{Error, Result};
