//! Shallow-water height field driven by falling rain.
//!
//! A [`Simulation`] owns a [`Grid`] of heights and velocities, a
//! [`RainSystem`] of falling drops, and a [`WaveSolver`] strategy. Each tick
//! lands drops as forcing, rotates the field buffers, and takes one explicit
//! finite-difference step.

pub mod config;
pub mod default_shader;
pub mod error;
pub mod forced_height;
pub mod grid;
pub mod logging;
pub mod rain;
pub mod render;
pub mod run;
pub mod simulation;
pub mod stencil;
pub mod velocity_coupled;
pub mod wave;

pub use crate::config::{PhysicalConstants, SimConfig};
pub use crate::error::{SimError, SimResult};
pub use crate::forced_height::ForcedHeight;
pub use crate::grid::{Grid, Snapshot};
pub use crate::rain::{Impact, ImpactPolicy, RainDrop, RainSystem};
pub use crate::run::{RunSummary, Runner, RunnerBuilder, SolverKind};
pub use crate::simulation::{Simulation, SimulationClock, TickReport};
pub use crate::velocity_coupled::VelocityCoupled;
pub use crate::wave::{BoundaryPolicy, ForcingPolicy, WaveSolver};
