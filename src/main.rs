use std::path::PathBuf;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use rusty_dem::config::SimulationConfig;
use rusty_dem::output::{NullSink, SnapshotSink};
use rusty_dem::simulation::Simulation;
use rusty_dem::vtk::VtkWriter;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to a configuration file (TOML, YAML or JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of particles
    #[arg(short = 'n', long)]
    count: Option<usize>,

    /// Seed for particle placement
    #[arg(short, long)]
    seed: Option<u64>,

    /// Total number of micro-steps
    #[arg(short, long)]
    timesteps: Option<usize>,

    /// Directory for VTK snapshots, nothing is written when omitted
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn run(args: Args) -> rusty_dem::Result<()> {
    let mut config = SimulationConfig::load(args.config.as_deref())?;
    if let Some(count) = args.count {
        config.particles.count = count;
    }
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    if let Some(timesteps) = args.timesteps {
        config.timesteps = timesteps;
    }

    info!(particles = config.particles.count, seed = config.seed, "initializing simulation");
    let mut sim = Simulation::from_config(&config)?;
    let mut rng = fastrand::Rng::with_seed(config.seed);
    sim.seed(&config.initializer()?, &mut rng)?;

    let mut sink: Box<dyn SnapshotSink> = match &args.output {
        Some(dir) => Box::new(VtkWriter::new(dir, "dem")?),
        None => Box::new(NullSink),
    };

    info!(steps = config.timesteps, dt = sim.dt(), "starting simulation");
    let mut bar = ProgressBar::new(sim.schedule().output_count() as u64);
    bar.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );

    sim.run(sink.as_mut(), &mut bar)?;
    bar.finish_with_message("Simulation complete");

    info!(
        time = sim.time(),
        kinetic_energy = sim.kinetic_energy(),
        "simulation complete"
    );
    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    if let Err(e) = run(Args::parse()) {
        error!("{e}");
        std::process::exit(1);
    }
}
