use log::trace;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::config::SimConfig;
use crate::error::{SimError, SimResult};
use crate::grid::{Grid, Snapshot};
use crate::rain::{Impact, RainSystem};
use crate::wave::WaveSolver;

/// Elapsed simulated time. Advanced by the fixed timestep, never by wall clock.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SimulationClock {
    ticks: u64,
    elapsed: f64,
}

impl SimulationClock {
    pub fn advance(&mut self, dt: f32) {
        self.ticks += 1;
        self.elapsed += f64::from(dt);
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct TickReport {
    pub landed: Vec<Impact>,
    pub discarded: usize,
    pub spawned: bool,
    pub active: usize,
}

/// Owns all simulation state and advances it one tick at a time.
pub struct Simulation<S: WaveSolver> {
    grid: Grid,
    rain: RainSystem,
    solver: S,
    rng: StdRng,
    clock: SimulationClock,
    timestep: f32,
}

impl<S: WaveSolver> Simulation<S> {
    pub fn new(config: &SimConfig, solver: S) -> SimResult<Simulation<S>> {
        config.validate()?;
        let grid = Grid::new(config.dimension, config.water_len, config.water_height)?;
        Ok(Simulation {
            grid,
            rain: RainSystem::new(config.rain_params()),
            solver,
            rng: StdRng::seed_from_u64(config.seed),
            clock: SimulationClock::default(),
            timestep: config.timestep,
        })
    }

    /// One tick with the configured fixed timestep.
    pub fn step(&mut self) -> TickReport {
        self.tick(self.timestep)
    }

    pub fn run(&mut self, ticks: usize) {
        for _ in 0..ticks {
            self.step();
        }
    }

    /// Rain, spawn, rotate, solve, relax forcing, in that order.
    pub fn tick(&mut self, dt: f32) -> TickReport {
        let outcome = self.rain.tick(dt, &mut self.grid);
        let spawned = self.rain.maybe_spawn(&mut self.rng);

        self.grid.swap_buffers();
        self.solver.step(&mut self.grid, dt);
        self.solver.forcing_policy().apply(&mut self.grid);
        self.clock.advance(dt);

        let report = TickReport {
            landed: outcome.landed,
            discarded: outcome.discarded,
            spawned,
            active: self.rain.active_count(),
        };
        trace!(
            "tick {}: {} landed, {} discarded, {} active",
            self.clock.ticks(),
            report.landed.len(),
            report.discarded,
            report.active
        );
        report
    }

    /// Fails on the first non-finite value or magnitude above `bound`.
    pub fn check_divergence(&self, bound: f32) -> SimResult<()> {
        let heights = self.grid.heights().iter().copied().enumerate();
        let components = self
            .grid
            .velocities()
            .iter()
            .enumerate()
            .flat_map(|(index, v)| [(index, v[0]), (index, v[1])]);
        for (index, value) in heights.chain(components) {
            if !value.is_finite() || value.abs() > bound {
                return Err(SimError::NumericDivergence { index, value, bound });
            }
        }
        Ok(())
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Mutable access for seeding initial conditions between ticks.
    pub fn grid_mut(&mut self) -> &mut Grid {
        &mut self.grid
    }

    pub fn rain(&self) -> &RainSystem {
        &self.rain
    }

    pub fn rain_mut(&mut self) -> &mut RainSystem {
        &mut self.rain
    }

    pub fn solver(&self) -> &S {
        &self.solver
    }

    pub fn clock(&self) -> SimulationClock {
        self.clock
    }

    pub fn timestep(&self) -> f32 {
        self.timestep
    }

    pub fn heights(&self) -> &[f32] {
        self.grid.heights()
    }

    pub fn snapshot(&self) -> Snapshot {
        self.grid.snapshot()
    }
}
