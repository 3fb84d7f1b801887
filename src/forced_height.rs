use crate::config::PhysicalConstants;
use crate::grid::Grid;
use crate::wave::{continuity_pass, momentum_pass, BoundaryPolicy, Continuity, ForcingPolicy, Momentum, WaveSolver};

/// Simpler forced-height model: forcing pushes the surface down directly.
///
/// The momentum pass sees gravity only, and the continuity pass subtracts
/// `dt * f` at each node. Heights are integrated over the whole grid with
/// one-sided edges, and each impulse is cleared after the step it lands in.
pub struct ForcedHeight {
    gravity: f32,
    reference_depth: f32,
    boundary: BoundaryPolicy,
    forcing: ForcingPolicy,
}

impl ForcedHeight {
    pub fn new(constants: PhysicalConstants) -> ForcedHeight {
        ForcedHeight {
            gravity: constants.gravity,
            reference_depth: constants.reference_depth,
            boundary: BoundaryPolicy::OneSided,
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

impl WaveSolver for ForcedHeight {
    fn step(&self, grid: &mut Grid, dt: f32) {
        momentum_pass(grid, dt, Momentum {
            gravity: self.gravity,
            forcing_pressure: false,
            damping: 0.0,
        });
        continuity_pass(grid, dt, Continuity {
            reference_depth: self.reference_depth,
            boundary: self.boundary,
            forcing_source: -1.0,
        });
    }

    fn forcing_policy(&self) -> ForcingPolicy {
        self.forcing
    }

    fn name(&self) -> &'static str {
        "forced-height"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 0.001_666_7;

    #[test]
    fn impulse_lowers_only_its_node_on_first_step() {
        let mut grid = Grid::new(10, 3.6, -0.3).unwrap();
        let center = grid.node_at(5, 5);
        grid.apply_forcing(center, 2.0).unwrap();
        let solver = ForcedHeight::new(PhysicalConstants::default());
        grid.swap_buffers();
        solver.step(&mut grid, DT);

        assert_eq!(grid.heights()[center], -2.0 * DT);
        for (n, &h) in grid.heights().iter().enumerate() {
            if n != center {
                assert_eq!(h, 0.0);
            }
        }
    }

    #[test]
    fn dip_spreads_to_neighbors_next_step() {
        let mut grid = Grid::new(10, 3.6, -0.3).unwrap();
        let center = grid.node_at(5, 5);
        grid.apply_forcing(center, 2.0).unwrap();
        let solver = ForcedHeight::new(PhysicalConstants::default());
        for _ in 0..3 {
            grid.swap_buffers();
            solver.step(&mut grid, DT);
            solver.forcing_policy().apply(&mut grid);
        }
        assert!(grid.forcing().iter().all(|&f| f == 0.0));
        // flow converges on the dip
        assert!(grid.velocity(6, 5)[0] < 0.0);
        assert!(grid.velocity(4, 5)[0] > 0.0);
        assert!(grid.height(6, 5) != 0.0);
    }

    #[test]
    fn edges_are_integrated() {
        let mut grid = Grid::new(6, 3.6, -0.3).unwrap();
        let corner = grid.node_at(0, 0);
        grid.apply_forcing(corner, 2.0).unwrap();
        let solver = ForcedHeight::new(PhysicalConstants::default());
        grid.swap_buffers();
        solver.step(&mut grid, DT);
        assert!(grid.heights()[corner] < 0.0);
    }

    #[test]
    fn clamped_edges_keep_their_height() {
        let mut grid = Grid::new(6, 3.6, -0.3).unwrap();
        let near_edge = grid.node_at(1, 3);
        grid.apply_forcing(near_edge, 2.0).unwrap();
        let solver = ForcedHeight::new(PhysicalConstants::default()).with_boundary_policy(BoundaryPolicy::ClampEdges);
        assert_eq!(solver.boundary_policy(), BoundaryPolicy::ClampEdges);
        for _ in 0..20 {
            grid.swap_buffers();
            solver.step(&mut grid, DT);
        }

        assert!(grid.height(1, 3) < 0.0);
        for k in 0..=6 {
            for (i, j) in [(0, k), (6, k), (k, 0), (k, 6)] {
                assert_eq!(grid.height(i, j), 0.0, "edge moved at ({}, {})", i, j);
            }
        }
        assert!(grid.velocity(0, 3)[0] != 0.0);
    }
}
