use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, LevelFilter};

use rainpool::logging::init_logging;
use rainpool::{BoundaryPolicy, RunnerBuilder, SimConfig, SolverKind};

/// Rain falling on a shallow-water height field, simulated headless.
#[derive(Parser)]
#[command(name = "rainpool", version, long_about = None)]
struct Cli {
    /// Cells per side of the water grid
    dimension: usize,

    /// Most rain drops in the air at once
    max_drops: usize,

    #[arg(long, value_enum, default_value_t = SolverKind::VelocityCoupled)]
    solver: SolverKind,

    /// Which nodes get their height integrated; defaults to the solver's own
    #[arg(long, value_enum)]
    boundary_policy: Option<BoundaryPolicy>,

    #[arg(long, default_value_t = 100)]
    frames: u32,

    #[arg(long, default_value_t = 30)]
    ticks_per_frame: u32,

    /// Directory to write PNG frames into; nothing is written without it
    #[arg(long)]
    render_dir: Option<PathBuf>,

    /// Pixels per grid node in written frames
    #[arg(long, default_value_t = 4)]
    scale: usize,

    #[arg(long)]
    seed: Option<u64>,

    /// JSON file with simulation settings; positional arguments override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// off, error, warn, info, debug or trace
    #[arg(short, long)]
    log_level: Option<LevelFilter>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_level);

    let mut config = match &cli.config {
        Some(path) => SimConfig::from_json_file(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => SimConfig::default(),
    };
    config = config.with_dimension(cli.dimension).with_max_drops(cli.max_drops);
    if let Some(seed) = cli.seed {
        config = config.with_seed(seed);
    }
    if cli.boundary_policy.is_some() {
        config.boundary_policy = cli.boundary_policy;
    }

    let mut builder = RunnerBuilder::new();
    builder
        .config(config)
        .solver(cli.solver)
        .frame_count(cli.frames)
        .ticks_per_frame(cli.ticks_per_frame)
        .scale(cli.scale);
    if let Some(dir) = &cli.render_dir {
        builder.render_path(dir);
    }

    let summary = builder
        .build()
        .context("invalid run settings")?
        .run()
        .context("simulation failed")?;

    info!(
        "done: {} ticks, {} impacts ({} discarded), {} frames written, max |h| {:.5}",
        summary.ticks, summary.impacts, summary.discarded, summary.frames_written, summary.max_abs_height,
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_level_must_name_a_level() {
        let cli = Cli::try_parse_from(["rainpool", "8", "2", "--log-level", "debug"]).unwrap();
        assert_eq!(cli.log_level, Some(LevelFilter::Debug));
        assert!(Cli::try_parse_from(["rainpool", "8", "2", "--log-level", "loud"]).is_err());
    }

    #[test]
    fn boundary_policy_flag_parses() {
        let cli = Cli::try_parse_from(["rainpool", "8", "2", "--boundary-policy", "one-sided"]).unwrap();
        assert_eq!(cli.boundary_policy, Some(BoundaryPolicy::OneSided));
        let cli = Cli::try_parse_from(["rainpool", "8", "2"]).unwrap();
        assert_eq!(cli.boundary_policy, None);
    }
}
