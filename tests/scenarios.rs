use glam::DVec3;
use rusty_dem::config::SimulationConfig;
use rusty_dem::domain::Domain;
use rusty_dem::material::Material;
use rusty_dem::output::Snapshot;
use rusty_dem::physics::{ForceModel, Wall};
use rusty_dem::simulation::{Schedule, Simulation, SimulationState};
use rusty_dem::Error;

const K: f64 = 10.0;
const GAMMA: f64 = 0.0004;
const DENSITY: f64 = 1160.0;

fn separation(sim: &Simulation) -> f64 {
    let p = sim.particles();
    sim.domain().displacement(p[0].position, p[1].position).length()
}

/// Two overlapping particles, no gravity, no wall: they push each other
/// apart and leave the contact with no more energy than the spring held.
#[test]
fn overlapping_pair_separates_without_gaining_energy() -> rusty_dem::Result<()> {
    let radius = 0.001;
    let domain = Domain::new(DVec3::splat(-0.01), DVec3::splat(0.01), [false; 3], 0.002)?;
    let material = Material::new(K, GAMMA, DENSITY)?;
    let dt = material.timestep(radius, radius)?;
    let forces = ForceModel::new(K, GAMMA, DVec3::ZERO, None);
    let mut sim = Simulation::new(domain, 0.002, material, forces, dt, Schedule::new(400, 100)?)?;

    sim.add_particle(DVec3::new(-0.00095, 0.0, 0.0), radius)?;
    sim.add_particle(DVec3::new(0.00095, 0.0, 0.0), radius)?;
    sim.start()?;

    sim.step()?;
    let p = sim.particles();
    assert!(p[0].acceleration.x < 0.0, "left particle pushed left: {}", p[0].acceleration);
    assert!(p[1].acceleration.x > 0.0, "right particle pushed right: {}", p[1].acceleration);
    assert_eq!(p[0].acceleration.y, 0.0);
    assert_eq!(p[0].acceleration.z, 0.0);

    let overlap = 2.0 * radius - 0.0019;
    let stored = 0.5 * K * overlap * overlap;

    let mut separated_at = None;
    while sim.state() == SimulationState::Stepping {
        sim.step()?;
        if separated_at.is_none() && separation(&sim) > 2.0 * radius {
            separated_at = Some(sim.step_count());
        }
    }
    let separated_at = separated_at.expect("pair never separated");
    // Half a contact period is ~50 steps at this timestep
    assert!(separated_at < 200, "separated only after {separated_at} steps");

    let ke = sim.kinetic_energy();
    assert!(ke > 0.5 * stored, "kinetic energy {ke} vs stored {stored}");
    assert!(ke < 1.1 * stored, "kinetic energy {ke} vs stored {stored}");

    // Free flight after the contact ends
    for p in sim.particles().iter() {
        assert_eq!(p.acceleration, DVec3::ZERO);
    }
    assert!(sim.total_momentum().length() < 1e-18);
    Ok(())
}

/// A particle resting on the floor wall at the height where the wall spring
/// carries its weight stays put.
#[test]
fn particle_on_wall_is_in_equilibrium() -> rusty_dem::Result<()> {
    let radius = 0.001;
    let g = 9.81;
    let domain = Domain::new(DVec3::splat(-0.01), DVec3::splat(0.01), [true, true, false], 0.002)?;
    let material = Material::new(K, GAMMA, DENSITY)?;
    let forces = ForceModel::new(K, GAMMA, DVec3::new(0.0, 0.0, -g), Some(Wall::new(2, 0.0)));
    let dt = material.timestep(radius, radius)?;
    let mut sim = Simulation::new(domain, 0.002, material, forces, dt, Schedule::new(100, 100)?)?;

    let mass = material.mass_for_radius(radius);
    let rest_height = radius - mass * g / K;
    sim.add_particle(DVec3::new(0.0, 0.0, rest_height), radius)?;
    sim.start()?;

    for _ in 0..100 {
        sim.step()?;
        let p = &sim.particles()[0];
        assert!(p.acceleration.length() < 1e-9 * g, "residual acceleration {}", p.acceleration);
    }
    let p = &sim.particles()[0];
    assert!((p.position.z - rest_height).abs() < 1e-12);
    Ok(())
}

/// With the wall spring unloaded (centre exactly one radius above the wall)
/// only gravity acts.
#[test]
fn particle_touching_wall_falls() -> rusty_dem::Result<()> {
    let radius = 0.001;
    let domain = Domain::new(DVec3::splat(-0.01), DVec3::splat(0.01), [false; 3], 0.002)?;
    let material = Material::new(K, GAMMA, DENSITY)?;
    let forces = ForceModel::new(K, GAMMA, DVec3::new(0.0, 0.0, -9.81), Some(Wall::new(2, 0.0)));
    let mut sim = Simulation::new(domain, 0.002, material, forces, 1e-5, Schedule::new(1, 1)?)?;
    sim.add_particle(DVec3::new(0.0, 0.0, radius), radius)?;
    sim.start()?;
    sim.step()?;
    assert!((sim.particles()[0].acceleration.z + 9.81).abs() < 1e-12);
    Ok(())
}

/// Closed periodic box without damping, gravity or wall conserves momentum.
#[test]
fn periodic_box_conserves_momentum() -> rusty_dem::Result<()> {
    let domain = Domain::new(DVec3::ZERO, DVec3::splat(0.008), [true; 3], 0.002)?;
    let material = Material::new(K, 0.0, DENSITY)?;
    let forces = ForceModel::new(K, 0.0, DVec3::ZERO, None);
    let dt = material.timestep(0.0005, 0.001)?;
    let mut sim = Simulation::new(domain, 0.002, material, forces, dt, Schedule::new(10, 10)?)?;

    let mut rng = fastrand::Rng::with_seed(2024);
    for _ in 0..120 {
        let position = DVec3::new(rng.f64(), rng.f64(), rng.f64()) * 0.008;
        let id = sim.add_particle(position, 0.0005 + rng.f64() * 0.0005)?;
        let velocity = DVec3::new(rng.f64() - 0.5, rng.f64() - 0.5, rng.f64() - 0.5) * 0.02;
        sim.set_velocity(id, velocity)?;
    }
    sim.start()?;

    let in_contact = (0..sim.particles().count())
        .filter(|&id| {
            let p = &sim.particles()[id];
            sim.neighbors_of(id)
                .iter()
                .any(|n| n.distance() < p.radius() + sim.particles()[n.id].radius())
        })
        .count();
    assert!(in_contact > 10, "only {in_contact} particles in contact");

    let before = sim.total_momentum();
    sim.step()?;
    let after_one = sim.total_momentum();
    assert!((after_one - before).length() < 1e-15, "{before} -> {after_one}");

    while sim.state() == SimulationState::Stepping {
        sim.step()?;
    }
    assert!((sim.total_momentum() - before).length() < 1e-14);
    Ok(())
}

#[test]
fn impossible_density_reports_placement_infeasible() {
    let mut config = SimulationConfig::default();
    config.particles.count = 10_000;
    config.particles.max_attempts = 100;

    let mut sim = Simulation::from_config(&config).unwrap();
    let init = config.initializer().unwrap();
    let result = sim.seed(&init, &mut fastrand::Rng::with_seed(0));
    match result {
        Err(Error::PlacementInfeasible { placed, requested, .. }) => {
            assert!(placed > 0 && placed < requested);
            assert_eq!(sim.particles().count(), placed);
        }
        other => panic!("expected PlacementInfeasible, got {other:?}"),
    }
}

/// Short run of the reference settling setup.
#[test]
fn reference_setup_settles_under_gravity() -> rusty_dem::Result<()> {
    let mut config = SimulationConfig::default();
    config.timesteps = 600;
    config.outputs = 3;
    config.check_finite = true;

    let mut sim = Simulation::from_config(&config)?;
    let mut rng = fastrand::Rng::with_seed(config.seed);
    sim.seed(&config.initializer()?, &mut rng)?;

    let mut snapshots: Vec<Snapshot> = Vec::new();
    sim.run(&mut snapshots, &mut ())?;

    assert_eq!(snapshots.iter().map(|s| s.step).collect::<Vec<_>>(), vec![0, 200, 400, 600]);
    assert!(snapshots.iter().all(|s| s.len() == 30));

    let mean_z = |s: &Snapshot| s.particles.iter().map(|p| p.position.z).sum::<f64>() / s.len() as f64;
    let first = &snapshots[0];
    let last = &snapshots[3];
    assert!(mean_z(last) < mean_z(first));

    let domain = sim.domain();
    for p in &last.particles {
        assert!(p.position.x >= domain.min().x && p.position.x < domain.max().x);
        assert!(p.position.y >= domain.min().y && p.position.y < domain.max().y);
        assert!(p.velocity.length() < 1.0, "particle {} at {}", p.id, p.velocity);
    }
    Ok(())
}
