use serde::{Deserialize, Serialize};

use crate::grid::Grid;
use crate::stencil::Axis;

/// One explicit shallow-water step over a grid whose buffers were just rotated.
///
/// Implementations read the `prev` fields and the forcing, and overwrite the
/// `curr` fields. The orchestrator applies [`WaveSolver::forcing_policy`]
/// once the step has returned.
pub trait WaveSolver {
    fn step(&self, grid: &mut Grid, dt: f32);

    fn forcing_policy(&self) -> ForcingPolicy;

    fn name(&self) -> &'static str;
}

/// Which nodes the continuity pass writes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum BoundaryPolicy {
    /// Interior only. Boundary heights keep whatever `curr` already held.
    ClampEdges,
    /// Every node, with one-sided differences on the edges.
    OneSided,
}

/// What happens to deposited forcing after a step.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForcingPolicy {
    Persistent,
    Reset,
    Decay(f32),
}

impl ForcingPolicy {
    pub fn apply(self, grid: &mut Grid) {
        match self {
            ForcingPolicy::Persistent => {}
            ForcingPolicy::Reset => grid.clear_forcing(),
            ForcingPolicy::Decay(factor) => grid.scale_forcing(factor),
        }
    }
}

/// Coefficients of the momentum pass.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Momentum {
    pub gravity: f32,
    /// Adds the node's forcing to gravity in the pressure term.
    pub forcing_pressure: bool,
    /// Coefficient on the forcing gradient, zero to skip it.
    pub damping: f32,
}

/// Coefficients of the continuity pass.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Continuity {
    pub reference_depth: f32,
    pub boundary: BoundaryPolicy,
    /// Coefficient on forcing as a direct height source, zero to skip it.
    pub forcing_source: f32,
}

/// `v_curr = v_prev + dt * (-p * grad h - u * dv/dx - v * dv/dz - damping * grad f)`
/// over every node, `p` being gravity plus (optionally) the node's forcing.
pub(crate) fn momentum_pass(grid: &mut Grid, dt: f32, m: Momentum) {
    let stencil = grid.stencil();
    let side = grid.side();
    let fields = grid.fields();

    for i in 0..side {
        for j in 0..side {
            let n = i * side + j;
            let prev = fields.velocity_prev[n];
            let force = fields.forcing[n];

            let grad_h = stencil.gradient(fields.height_prev, i, j);
            let grad_f = if m.damping != 0.0 {
                stencil.gradient(fields.forcing, i, j)
            } else {
                [0.0, 0.0]
            };
            let dvel_dx = stencil.vector(fields.velocity_prev, i, j, Axis::I);
            let dvel_dz = stencil.vector(fields.velocity_prev, i, j, Axis::J);

            let pressure = if m.forcing_pressure { m.gravity + force } else { m.gravity };

            let mut next = [0.0_f32; 2];
            for c in 0..2 {
                let advection = prev[0] * dvel_dx[c] + prev[1] * dvel_dz[c];
                let accel = -pressure * grad_h[c] - advection - m.damping * grad_f[c];
                next[c] = prev[c] + dt * accel;
            }
            fields.velocity_curr[n] = next;
        }
    }
}

/// `h_curr = h_prev + dt * (-(h_prev + H) * div v - u * dh/dx - v * dh/dz + s * f)`
/// using the velocity the momentum pass just wrote.
pub(crate) fn continuity_pass(grid: &mut Grid, dt: f32, c: Continuity) {
    let stencil = grid.stencil();
    let side = grid.side();
    let dimension = grid.dimension();
    let fields = grid.fields();

    let range = match c.boundary {
        BoundaryPolicy::ClampEdges => 1..dimension,
        BoundaryPolicy::OneSided => 0..side,
    };

    for i in range.clone() {
        for j in range.clone() {
            let n = i * side + j;
            let h = fields.height_prev[n];
            let [u, v] = fields.velocity_curr[n];

            let divergence = stencil.divergence(fields.velocity_curr, i, j);
            let [dh_dx, dh_dz] = stencil.gradient(fields.height_prev, i, j);

            let rate = -(h + c.reference_depth) * divergence - u * dh_dx - v * dh_dz
                + c.forcing_source * fields.forcing[n];
            fields.height_curr[n] = h + dt * rate;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const COUPLED: Momentum = Momentum { gravity: 10.0, forcing_pressure: true, damping: 1.7 };

    fn continuity(boundary: BoundaryPolicy) -> Continuity {
        Continuity { reference_depth: 1.7, boundary, forcing_source: 0.0 }
    }

    #[test]
    fn flat_field_without_forcing_stays_flat() {
        let mut grid = Grid::new(6, 3.6, -0.3).unwrap();
        for _ in 0..50 {
            grid.swap_buffers();
            momentum_pass(&mut grid, 0.001, COUPLED);
            continuity_pass(&mut grid, 0.001, continuity(BoundaryPolicy::OneSided));
        }
        assert!(grid.heights().iter().all(|&h| h == 0.0));
        assert!(grid.velocities().iter().all(|&v| v == [0.0, 0.0]));
    }

    #[test]
    fn height_slope_drives_flow_downhill() {
        let mut grid = Grid::new(4, 4.0, 0.0).unwrap();
        let center = grid.node_at(2, 2);
        grid.set_height(center, 0.1).unwrap();
        grid.swap_buffers();
        momentum_pass(&mut grid, 0.01, COUPLED);
        // water leaves the bump in both directions along x
        assert!(grid.velocity(3, 2)[0] > 0.0);
        assert!(grid.velocity(1, 2)[0] < 0.0);
        assert!(grid.velocity(2, 3)[1] > 0.0);
        assert!(grid.velocity(2, 1)[1] < 0.0);
    }

    #[test]
    fn clamp_edges_leaves_boundary_heights_alone() {
        let mut grid = Grid::new(4, 4.0, 0.0).unwrap();
        let edge = grid.node_at(0, 2);
        grid.set_height(edge, 0.2).unwrap();
        grid.swap_buffers();
        momentum_pass(&mut grid, 0.01, COUPLED);
        continuity_pass(&mut grid, 0.01, continuity(BoundaryPolicy::ClampEdges));
        assert_eq!(grid.heights()[edge], 0.2);

        grid.swap_buffers();
        momentum_pass(&mut grid, 0.01, COUPLED);
        continuity_pass(&mut grid, 0.01, continuity(BoundaryPolicy::OneSided));
        assert_ne!(grid.heights()[edge], 0.2);
    }

    #[test]
    fn forcing_policies() {
        let mut grid = Grid::new(2, 1.0, 0.0).unwrap();
        grid.apply_forcing(4, 2.0).unwrap();
        ForcingPolicy::Persistent.apply(&mut grid);
        assert_eq!(grid.forcing()[4], 2.0);
        ForcingPolicy::Decay(0.5).apply(&mut grid);
        assert_eq!(grid.forcing()[4], 1.0);
        ForcingPolicy::Reset.apply(&mut grid);
        assert_eq!(grid.forcing()[4], 0.0);
    }
}
