use glam::DVec3;
use rayon::prelude::*;
use tracing::{debug, info};
use crate::config::SimulationConfig;
use crate::domain::Domain;
use crate::error::{Error, Result};
use crate::grid::{Neighbor, SpatialIndex};
use crate::init::Initializer;
use crate::material::Material;
use crate::output::{ProgressSink, Snapshot, SnapshotSink};
use crate::particle::ParticleStore;
use crate::physics::ForceModel;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SimulationState {
    Uninitialized,
    Stepping,
    Finished,
}

/// How many micro-steps to run and how often to emit snapshots.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Schedule {
    pub total_steps: usize,
    pub steps_per_output: usize,
}

impl Schedule {
    pub fn new(total_steps: usize, steps_per_output: usize) -> Result<Self> {
        if steps_per_output == 0 {
            return Err(Error::Configuration("steps per output must be at least 1".into()));
        }
        Ok(Self { total_steps, steps_per_output })
    }

    /// Splits `total_steps` into `outputs` equal blocks of
    /// `total_steps / outputs` steps. A remainder that does not fill a whole
    /// block is not run.
    pub fn with_outputs(total_steps: usize, outputs: usize) -> Result<Self> {
        if outputs == 0 || outputs > total_steps {
            return Err(Error::Configuration(format!(
                "output count must be between 1 and the step count {total_steps}, got {outputs}"
            )));
        }
        let steps_per_output = total_steps / outputs;
        Self::new(outputs * steps_per_output, steps_per_output)
    }

    /// Number of output boundaries after step 0.
    pub fn output_count(&self) -> usize {
        (self.total_steps + self.steps_per_output - 1) / self.steps_per_output
    }

    fn is_output_step(&self, step: usize) -> bool {
        step % self.steps_per_output == 0 || step == self.total_steps
    }
}

/// Owns one particle population and advances it with semi-implicit Euler.
pub struct Simulation {
    particles: ParticleStore,
    grid: SpatialIndex,
    material: Material,
    forces: ForceModel,
    dt: f64,
    schedule: Schedule,
    step: usize,
    state: SimulationState,
    check_finite: bool,
}

impl Simulation {
    pub fn new(
        domain: Domain,
        search_radius: f64,
        material: Material,
        forces: ForceModel,
        dt: f64,
        schedule: Schedule,
    ) -> Result<Self> {
        if !(dt > 0.0) || !dt.is_finite() {
            return Err(Error::Configuration(format!("timestep must be positive, got {dt}")));
        }
        if let Some(wall) = forces.wall {
            if wall.axis > 2 {
                return Err(Error::Configuration(format!("wall axis must be 0, 1 or 2, got {}", wall.axis)));
            }
            if domain.is_periodic(wall.axis) {
                return Err(Error::Configuration(format!("wall axis {} is periodic", wall.axis)));
            }
        }
        let grid = SpatialIndex::new(domain, search_radius)?;

        Ok(Self {
            particles: ParticleStore::new(),
            grid,
            material,
            forces,
            dt,
            schedule,
            step: 0,
            state: SimulationState::Uninitialized,
            check_finite: false,
        })
    }

    pub fn from_config(config: &SimulationConfig) -> Result<Self> {
        let domain = config.domain()?;
        let material = config.material()?;
        let dt = match config.dt {
            Some(dt) => dt,
            None => material.timestep(config.particles.radius_min, config.particles.radius_max)?,
        };
        let schedule = Schedule::with_outputs(config.timesteps, config.outputs)?;
        let mut sim = Self::new(domain, config.search_radius, material, config.force_model(), dt, schedule)?;
        sim.check_finite = config.check_finite;
        Ok(sim)
    }

    /// Enables a finite position/velocity check after every micro-step.
    pub fn with_finite_check(mut self, enabled: bool) -> Self {
        self.check_finite = enabled;
        self
    }

    pub fn state(&self) -> SimulationState {
        self.state
    }

    pub fn particles(&self) -> &ParticleStore {
        &self.particles
    }

    pub fn grid(&self) -> &SpatialIndex {
        &self.grid
    }

    pub fn domain(&self) -> &Domain {
        self.grid.domain()
    }

    pub fn material(&self) -> &Material {
        &self.material
    }

    pub fn forces(&self) -> &ForceModel {
        &self.forces
    }

    pub fn schedule(&self) -> Schedule {
        self.schedule
    }

    pub fn dt(&self) -> f64 {
        self.dt
    }

    pub fn step_count(&self) -> usize {
        self.step
    }

    pub fn time(&self) -> f64 {
        self.step as f64 * self.dt
    }

    fn require(&self, state: SimulationState, action: &str) -> Result<()> {
        if self.state == state {
            Ok(())
        } else {
            Err(Error::InvalidState(format!("cannot {action} while {:?}", self.state)))
        }
    }

    /// Adds a particle with mass derived from the material density.
    pub fn add_particle(&mut self, position: DVec3, radius: f64) -> Result<usize> {
        self.require(SimulationState::Uninitialized, "add particles")?;
        if 2.0 * radius > self.grid.cell_size() {
            return Err(Error::Configuration(format!(
                "particle diameter {} exceeds the search radius {}",
                2.0 * radius,
                self.grid.cell_size()
            )));
        }
        let mass = self.material.mass_for_radius(radius);
        let position = self.grid.domain().wrap(position);
        let particle = self.particles.create(position, radius, mass)?;
        let id = particle.id();
        self.grid.insert(&self.particles[id]);
        Ok(id)
    }

    /// Overrides the initial velocity of a particle before stepping starts.
    pub fn set_velocity(&mut self, id: usize, velocity: DVec3) -> Result<()> {
        self.require(SimulationState::Uninitialized, "set velocities")?;
        let particle = self
            .particles
            .get_mut(id)
            .ok_or_else(|| Error::Configuration(format!("no particle with id {id}")))?;
        particle.velocity = velocity;
        Ok(())
    }

    /// Seeds non-overlapping particles with the given initializer.
    pub fn seed(&mut self, initializer: &Initializer, rng: &mut fastrand::Rng) -> Result<Vec<usize>> {
        self.require(SimulationState::Uninitialized, "seed particles")?;
        let ids = initializer.place(&mut self.particles, &mut self.grid, &self.material, rng)?;
        info!(seeded = ids.len(), total = self.particles.count(), "particles seeded");
        Ok(ids)
    }

    /// Moves from Uninitialized to Stepping.
    pub fn start(&mut self) -> Result<()> {
        self.require(SimulationState::Uninitialized, "start")?;
        if self.particles.is_empty() {
            return Err(Error::InvalidState("cannot start without particles".into()));
        }
        self.grid.rebuild(&self.particles);
        self.state = if self.schedule.total_steps == 0 {
            SimulationState::Finished
        } else {
            SimulationState::Stepping
        };
        info!(
            particles = self.particles.count(),
            dt = self.dt,
            steps = self.schedule.total_steps,
            "simulation started"
        );
        Ok(())
    }

    /// Neighbours that can be in contact with particle `id`, by ascending id.
    pub fn neighbors_of(&self, id: usize) -> Vec<Neighbor> {
        match self.particles.get(id) {
            Some(p) => self.grid.query_neighbors_of(id, ForceModel::search_radius(p, &self.particles), &self.particles),
            None => Vec::new(),
        }
    }

    /// Advances one micro-step.
    pub fn step(&mut self) -> Result<()> {
        self.require(SimulationState::Stepping, "step")?;
        let dt = self.dt;

        // 1. Drift with the previous velocity, wrapping periodic axes
        let domain = *self.grid.domain();
        for p in self.particles.iter_mut() {
            p.position = domain.wrap(p.position + p.velocity * dt);
        }

        // 2. Broad-phase on the new positions
        self.grid.rebuild(&self.particles);

        // 3. Force evaluation, read-only over the store and grid
        let particles = &self.particles;
        let grid = &self.grid;
        let forces = &self.forces;
        let accelerations: Vec<DVec3> = particles
            .as_slice()
            .par_iter()
            .map(|p| {
                let neighbors = grid.query_neighbors_of(p.id(), ForceModel::search_radius(p, particles), particles);
                forces.acceleration(p, &neighbors, particles)
            })
            .collect();

        // 4. Kick with the new accelerations
        for (p, a) in self.particles.iter_mut().zip(accelerations) {
            p.acceleration = a;
            p.velocity += a * dt;
        }

        self.step += 1;
        if self.check_finite {
            if let Some(p) = self.particles.iter().find(|p| !p.is_finite()) {
                return Err(Error::NumericalDivergence { step: self.step, id: p.id() });
            }
        }
        if self.step >= self.schedule.total_steps {
            self.state = SimulationState::Finished;
            info!(steps = self.step, time = self.time(), "simulation finished");
        }
        Ok(())
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot::capture(self.step, self.time(), &self.particles)
    }

    /// Runs to completion, writing a snapshot at step 0 and at every output boundary.
    pub fn run(&mut self, sink: &mut dyn SnapshotSink, progress: &mut dyn ProgressSink) -> Result<()> {
        if self.state == SimulationState::Uninitialized {
            self.start()?;
        }
        if self.state == SimulationState::Finished {
            return Err(Error::InvalidState("simulation already finished".into()));
        }

        let total_outputs = self.schedule.output_count();
        let mut output = 0;
        sink.write(&self.snapshot())?;
        progress.on_output(output, total_outputs);

        while self.state == SimulationState::Stepping {
            self.step()?;
            if self.schedule.is_output_step(self.step) {
                output += 1;
                debug!(output, step = self.step, time = self.time(), "output boundary");
                sink.write(&self.snapshot())?;
                progress.on_output(output, total_outputs);
            }
        }
        Ok(())
    }

    pub fn total_momentum(&self) -> DVec3 {
        self.particles.iter().map(|p| p.momentum()).sum()
    }

    pub fn kinetic_energy(&self) -> f64 {
        self.particles.iter().map(|p| p.kinetic_energy()).sum()
    }
}
