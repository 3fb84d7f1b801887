use std::fs;
use std::path::{Path, PathBuf};

use crossbeam::channel;
use log::{info, warn};

use crate::config::SimConfig;
use crate::default_shader::DefaultShader;
use crate::error::{SimError, SimResult};
use crate::forced_height::ForcedHeight;
use crate::grid::Snapshot;
use crate::render::Renderer;
use crate::simulation::Simulation;
use crate::velocity_coupled::VelocityCoupled;
use crate::wave::WaveSolver;

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum SolverKind {
    VelocityCoupled,
    ForcedHeight,
}

pub struct Runner {
    config: SimConfig,
    solver: SolverKind,
    ticks_per_frame: u32,
    frame_count: u32,
    render_path: Option<PathBuf>,
    scale: usize,
    divergence_bound: f32,
}

pub struct RunnerBuilder {
    config: Option<SimConfig>,
    solver: Option<SolverKind>,
    ticks_per_frame: Option<u32>,
    frame_count: Option<u32>,
    render_path: Option<PathBuf>,
    scale: Option<usize>,
    divergence_bound: Option<f32>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct RunSummary {
    pub frames: u32,
    pub ticks: u64,
    pub impacts: usize,
    pub discarded: usize,
    pub frames_written: u32,
    pub max_abs_height: f32,
    pub diverged: bool,
}

impl Runner {
    pub fn run(&self) -> SimResult<RunSummary> {
        match self.solver {
            SolverKind::VelocityCoupled => self.run_with(self.velocity_coupled()),
            SolverKind::ForcedHeight => self.run_with(self.forced_height()),
        }
    }

    fn velocity_coupled(&self) -> VelocityCoupled {
        let mut solver = VelocityCoupled::new(self.config.constants);
        if let Some(boundary) = self.config.boundary_policy {
            solver = solver.with_boundary_policy(boundary);
        }
        if let Some(forcing) = self.config.forcing_policy {
            solver = solver.with_forcing_policy(forcing);
        }
        solver
    }

    fn forced_height(&self) -> ForcedHeight {
        let mut solver = ForcedHeight::new(self.config.constants);
        if let Some(boundary) = self.config.boundary_policy {
            solver = solver.with_boundary_policy(boundary);
        }
        if let Some(forcing) = self.config.forcing_policy {
            solver = solver.with_forcing_policy(forcing);
        }
        solver
    }

    fn run_with<S: WaveSolver>(&self, solver: S) -> SimResult<RunSummary> {
        info!(
            "configuring {} solver on a {}x{} node grid, up to {} drops",
            solver.name(),
            self.config.dimension + 1,
            self.config.dimension + 1,
            self.config.max_drops,
        );
        let mut sim = Simulation::new(&self.config, solver)?;

        match &self.render_path {
            None => {
                info!("simulating {} frames without output", self.frame_count);
                self.drive(&mut sim, |_, _| Ok(()))
            }
            Some(path) => self.run_rendered(&mut sim, path),
        }
    }

    fn run_rendered<S: WaveSolver>(&self, sim: &mut Simulation<S>, path: &Path) -> SimResult<RunSummary> {
        fs::create_dir_all(path)?;
        let renderer = Renderer::new(self.scale, DefaultShader, path);
        let worker_count = num_cpus::get().max(1);
        info!("rendering {} frames into {} with {} writers", self.frame_count, path.display(), worker_count);

        let (tx_frame, rx_frame) = channel::bounded::<(u32, Snapshot)>(worker_count);

        crossbeam::scope(|s| {
            // encode frames off the simulation thread
            let workers: Vec<_> = (0..worker_count)
                .map(|_| {
                    let (rx, renderer) = (rx_frame.clone(), &renderer);
                    s.spawn(move |_| -> SimResult<u32> {
                        let mut written = 0;
                        for (frame_num, snapshot) in rx.iter() {
                            renderer.render(&snapshot, frame_num)?;
                            written += 1;
                        }
                        Ok(written)
                    })
                })
                .collect();
            drop(rx_frame);

            let driven = self.drive(sim, |frame_num, snapshot| {
                tx_frame
                    .send((frame_num, snapshot))
                    .map_err(|_| SimError::WorkerPanic)
            });
            drop(tx_frame);

            let mut frames_written = 0;
            let mut worker_error = None;
            for worker in workers {
                match worker.join() {
                    Ok(Ok(written)) => frames_written += written,
                    Ok(Err(err)) => worker_error = worker_error.or(Some(err)),
                    Err(_) => worker_error = worker_error.or(Some(SimError::WorkerPanic)),
                }
            }
            if let Some(err) = worker_error {
                return Err(err);
            }

            let mut summary = driven?;
            summary.frames_written = frames_written;
            Ok(summary)
        })
        .map_err(|_| SimError::WorkerPanic)?
    }

    /// Emits a snapshot, then advances `ticks_per_frame` ticks, once per frame.
    fn drive<S, F>(&self, sim: &mut Simulation<S>, mut emit: F) -> SimResult<RunSummary>
    where
        S: WaveSolver,
        F: FnMut(u32, Snapshot) -> SimResult<()>,
    {
        let mut summary = RunSummary::default();

        for frame_num in 0..self.frame_count {
            emit(frame_num, sim.snapshot())?;

            for _ in 0..self.ticks_per_frame {
                let report = sim.step();
                summary.impacts += report.landed.len();
                summary.discarded += report.discarded;
            }

            if let Err(err) = sim.check_divergence(self.divergence_bound) {
                if !summary.diverged {
                    warn!("frame {}: {}", frame_num + 1, err);
                }
                summary.diverged = true;
            }

            let max_abs_height = sim.snapshot().max_abs_height();
            summary.max_abs_height = summary.max_abs_height.max(max_abs_height);
            info!(
                "frame {} of {}: {} active drops, {} impacts so far, max |h| {:.5}",
                frame_num + 1,
                self.frame_count,
                sim.rain().active_count(),
                summary.impacts,
                max_abs_height,
            );
            summary.frames += 1;
        }

        summary.ticks = sim.clock().ticks();
        Ok(summary)
    }
}

impl Default for RunnerBuilder {
    fn default() -> Self {
        RunnerBuilder::new()
    }
}

impl RunnerBuilder {
    pub fn new() -> RunnerBuilder {
        RunnerBuilder {
            config: None,
            solver: None,
            ticks_per_frame: None,
            frame_count: None,
            render_path: None,
            scale: None,
            divergence_bound: None,
        }
    }

    pub fn config(&mut self, config: SimConfig) -> &mut RunnerBuilder {
        self.config = Some(config);
        self
    }

    pub fn solver(&mut self, solver: SolverKind) -> &mut RunnerBuilder {
        self.solver = Some(solver);
        self
    }

    pub fn ticks_per_frame(&mut self, ticks_per_frame: u32) -> &mut RunnerBuilder {
        self.ticks_per_frame = Some(ticks_per_frame);
        self
    }

    pub fn frame_count(&mut self, frame_count: u32) -> &mut RunnerBuilder {
        self.frame_count = Some(frame_count);
        self
    }

    pub fn render_path(&mut self, render_path: impl Into<PathBuf>) -> &mut RunnerBuilder {
        self.render_path = Some(render_path.into());
        self
    }

    pub fn scale(&mut self, scale: usize) -> &mut RunnerBuilder {
        self.scale = Some(scale);
        self
    }

    pub fn divergence_bound(&mut self, divergence_bound: f32) -> &mut RunnerBuilder {
        self.divergence_bound = Some(divergence_bound);
        self
    }

    pub fn build(&self) -> SimResult<Runner> {
        let config = self.config.clone().unwrap_or_default();
        config.validate()?;

        let ticks_per_frame = self.ticks_per_frame.unwrap_or(30);
        if ticks_per_frame == 0 {
            return Err(SimError::config("ticks_per_frame must be positive"));
        }
        let frame_count = self.frame_count.unwrap_or(100);
        if frame_count == 0 {
            return Err(SimError::config("frame_count must be positive"));
        }
        let scale = self.scale.unwrap_or(4);
        if scale == 0 {
            return Err(SimError::config("scale must be positive"));
        }
        let divergence_bound = self.divergence_bound.unwrap_or(100.0);
        if !(divergence_bound.is_finite() && divergence_bound > 0.0) {
            return Err(SimError::config("divergence_bound must be positive"));
        }
        if let Some(path) = &self.render_path {
            if path.exists() && !path.is_dir() {
                return Err(SimError::config(format!("{} is not a directory", path.display())));
            }
        }

        Ok(Runner {
            config,
            solver: self.solver.unwrap_or(SolverKind::VelocityCoupled),
            ticks_per_frame,
            frame_count,
            render_path: self.render_path.clone(),
            scale,
            divergence_bound,
        })
    }
}
