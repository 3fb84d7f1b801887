use crate::config::PhysicalConstants;
use crate::grid::Grid;
use crate::wave::{continuity_pass, momentum_pass, BoundaryPolicy, Continuity, ForcingPolicy, Momentum, WaveSolver};

/// Shallow-water step where rain forcing acts through the momentum equation.
///
/// Forcing raises the local pressure coefficient to `g + f` and pushes the
/// flow down its own gradient with weight `damping`. Heights are updated only
/// in the interior by default. Impulses are cleared after the step they land
/// in; [`ForcingPolicy::Persistent`] keeps them forever, which eventually
/// drives the edge velocities unstable.
pub struct VelocityCoupled {
    gravity: f32,
    reference_depth: f32,
    damping: f32,
    boundary: BoundaryPolicy,
    forcing: ForcingPolicy,
}

impl VelocityCoupled {
    pub fn new(constants: PhysicalConstants) -> VelocityCoupled {
        VelocityCoupled {
            gravity: constants.gravity,
            reference_depth: constants.reference_depth,
            damping: constants.damping,
            boundary: BoundaryPolicy::ClampEdges,
            forcing: ForcingPolicy::Reset,
        }
    }

    pub fn with_boundary_policy(mut self, boundary: BoundaryPolicy) -> Self {
        self.boundary = boundary;
        self
    }

    pub fn with_forcing_policy(mut self, forcing: ForcingPolicy) -> Self {
        self.forcing = forcing;
        self
    }

    pub fn boundary_policy(&self) -> BoundaryPolicy {
        self.boundary
    }
}

impl WaveSolver for VelocityCoupled {
    fn step(&self, grid: &mut Grid, dt: f32) {
        momentum_pass(grid, dt, Momentum {
            gravity: self.gravity,
            forcing_pressure: true,
            damping: self.damping,
        });
        continuity_pass(grid, dt, Continuity {
            reference_depth: self.reference_depth,
            boundary: self.boundary,
            forcing_source: 0.0,
        });
    }

    fn forcing_policy(&self) -> ForcingPolicy {
        self.forcing
    }

    fn name(&self) -> &'static str {
        "velocity-coupled"
    }
}
