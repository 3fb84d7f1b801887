use crate::error::{SimError, SimResult};
use crate::stencil::Stencil;

/// Height and velocity fields over a `(dimension + 1)^2` node mesh.
///
/// Every field is a row-major buffer indexed by [`Grid::node_at`]. Heights are
/// displacements from `rest_height`, velocities are horizontal `(u, v)` pairs
/// along `(x, z)`.
pub struct Grid {
    dimension: usize,
    side: usize,
    extent: f32,
    spacing: f32,
    corner: f32,
    rest_height: f32,
    height_prev: Vec<f32>,
    height_curr: Vec<f32>,
    velocity_prev: Vec<[f32; 2]>,
    velocity_curr: Vec<[f32; 2]>,
    forcing: Vec<f32>,
}

/// Disjoint borrows of every field, handed to the solver passes.
pub(crate) struct Fields<'a> {
    pub height_prev: &'a [f32],
    pub height_curr: &'a mut [f32],
    pub velocity_prev: &'a [[f32; 2]],
    pub velocity_curr: &'a mut [[f32; 2]],
    pub forcing: &'a [f32],
}

/// Owned copy of the field state after a tick.
#[derive(Clone, Debug, PartialEq)]
pub struct Snapshot {
    pub dimension: usize,
    pub spacing: f32,
    pub rest_height: f32,
    pub heights: Vec<f32>,
    pub velocities: Vec<[f32; 2]>,
}

impl Grid {
    pub fn new(dimension: usize, extent: f32, rest_height: f32) -> SimResult<Grid> {
        if dimension < 1 {
            return Err(SimError::InvalidDimension { dimension });
        }
        if !(extent.is_finite() && extent > 0.0) {
            return Err(SimError::config(format!("grid extent must be positive, got {}", extent)));
        }

        let side = dimension + 1;
        let len = side * side;
        Ok(Grid {
            dimension,
            side,
            extent,
            spacing: extent / dimension as f32,
            corner: -extent / 2.0,
            rest_height,
            height_prev: vec![0.0; len],
            height_curr: vec![0.0; len],
            velocity_prev: vec![[0.0; 2]; len],
            velocity_curr: vec![[0.0; 2]; len],
            forcing: vec![0.0; len],
        })
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Nodes per axis.
    pub fn side(&self) -> usize {
        self.side
    }

    pub fn len(&self) -> usize {
        self.side * self.side
    }

    pub fn extent(&self) -> f32 {
        self.extent
    }

    /// Distance between neighbouring nodes (`dwater`).
    pub fn spacing(&self) -> f32 {
        self.spacing
    }

    pub fn corner(&self) -> f32 {
        self.corner
    }

    pub fn rest_height(&self) -> f32 {
        self.rest_height
    }

    pub fn node_at(&self, i: usize, j: usize) -> usize {
        debug_assert!(i <= self.dimension && j <= self.dimension);
        i * self.side + j
    }

    pub fn checked_node(&self, i: i64, j: i64) -> SimResult<usize> {
        let max = self.dimension as i64;
        if (0..=max).contains(&i) && (0..=max).contains(&j) {
            Ok(self.node_at(i as usize, j as usize))
        } else {
            Err(SimError::IndexOutOfBounds { i, j, dimension: self.dimension })
        }
    }

    pub fn coords_of(&self, index: usize) -> (usize, usize) {
        (index / self.side, index % self.side)
    }

    /// World `(x, z)` of node `(i, j)`.
    pub fn node_position(&self, i: usize, j: usize) -> (f32, f32) {
        (self.corner + self.spacing * i as f32, self.corner + self.spacing * j as f32)
    }

    /// Rotates `curr` into `prev` for height and velocity. Called once per tick.
    pub fn swap_buffers(&mut self) {
        self.height_prev.copy_from_slice(&self.height_curr);
        self.velocity_prev.copy_from_slice(&self.velocity_curr);
    }

    /// Sets the forcing at `index`, replacing whatever was there.
    pub fn apply_forcing(&mut self, index: usize, value: f32) -> SimResult<()> {
        let slot = self.forcing_slot(index)?;
        *slot = value;
        Ok(())
    }

    pub fn add_forcing(&mut self, index: usize, value: f32) -> SimResult<()> {
        let slot = self.forcing_slot(index)?;
        *slot += value;
        Ok(())
    }

    pub fn scale_forcing(&mut self, factor: f32) {
        for f in self.forcing.iter_mut() {
            *f *= factor;
        }
    }

    pub fn clear_forcing(&mut self) {
        self.forcing.iter_mut().for_each(|f| *f = 0.0);
    }

    /// Overwrites the current height at `index`, for seeding initial conditions.
    pub fn set_height(&mut self, index: usize, value: f32) -> SimResult<()> {
        self.check_index(index)?;
        self.height_curr[index] = value;
        Ok(())
    }

    pub fn set_velocity(&mut self, index: usize, value: [f32; 2]) -> SimResult<()> {
        self.check_index(index)?;
        self.velocity_curr[index] = value;
        Ok(())
    }

    pub fn heights(&self) -> &[f32] {
        &self.height_curr
    }

    pub fn previous_heights(&self) -> &[f32] {
        &self.height_prev
    }

    pub fn velocities(&self) -> &[[f32; 2]] {
        &self.velocity_curr
    }

    pub fn previous_velocities(&self) -> &[[f32; 2]] {
        &self.velocity_prev
    }

    pub fn forcing(&self) -> &[f32] {
        &self.forcing
    }

    pub fn height(&self, i: usize, j: usize) -> f32 {
        self.height_curr[self.node_at(i, j)]
    }

    pub fn velocity(&self, i: usize, j: usize) -> [f32; 2] {
        self.velocity_curr[self.node_at(i, j)]
    }

    pub fn stencil(&self) -> Stencil {
        Stencil::new(self.dimension, self.spacing)
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            dimension: self.dimension,
            spacing: self.spacing,
            rest_height: self.rest_height,
            heights: self.height_curr.clone(),
            velocities: self.velocity_curr.clone(),
        }
    }

    pub(crate) fn fields(&mut self) -> Fields<'_> {
        Fields {
            height_prev: &self.height_prev,
            height_curr: &mut self.height_curr,
            velocity_prev: &self.velocity_prev,
            velocity_curr: &mut self.velocity_curr,
            forcing: &self.forcing,
        }
    }

    fn check_index(&self, index: usize) -> SimResult<()> {
        if index < self.len() {
            Ok(())
        } else {
            let (i, j) = self.coords_of(index);
            Err(SimError::IndexOutOfBounds { i: i as i64, j: j as i64, dimension: self.dimension })
        }
    }

    fn forcing_slot(&mut self, index: usize) -> SimResult<&mut f32> {
        self.check_index(index)?;
        Ok(&mut self.forcing[index])
    }
}

impl Snapshot {
    pub fn side(&self) -> usize {
        self.dimension + 1
    }

    pub fn height(&self, i: usize, j: usize) -> f32 {
        self.heights[i * self.side() + j]
    }

    pub fn max_abs_height(&self) -> f32 {
        self.heights.iter().fold(0.0_f32, |acc, h| acc.max(h.abs()))
    }

    pub fn stencil(&self) -> Stencil {
        Stencil::new(self.dimension, self.spacing)
    }
}
