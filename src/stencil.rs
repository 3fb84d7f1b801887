//! Finite-difference gradients on the node mesh.
//!
//! Interior nodes take a centered difference over both neighbours. Boundary
//! nodes fall back to a one-sided difference over the single neighbour they
//! have. Both forms divide by `2 * spacing`, so no lookup ever leaves
//! `[0, dimension]`.

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Axis {
    /// Along `i`, the x direction.
    I,
    /// Along `j`, the z direction.
    J,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Difference {
    Forward,
    Backward,
    Centered,
}

#[derive(Clone, Copy, Debug)]
pub struct Stencil {
    dimension: usize,
    side: usize,
    inv_span: f32,
}

impl Stencil {
    pub fn new(dimension: usize, spacing: f32) -> Stencil {
        Stencil {
            dimension,
            side: dimension + 1,
            inv_span: (2.0 * spacing).recip(),
        }
    }

    pub fn difference_at(&self, coord: usize) -> Difference {
        if coord == 0 {
            Difference::Forward
        } else if coord == self.dimension {
            Difference::Backward
        } else {
            Difference::Centered
        }
    }

    /// Flat indices of the `(low, high)` pair the difference at `(i, j)` reads.
    pub fn neighbors(&self, i: usize, j: usize, axis: Axis) -> (usize, usize) {
        let here = i * self.side + j;
        let (coord, step) = match axis {
            Axis::I => (i, self.side),
            Axis::J => (j, 1),
        };
        match self.difference_at(coord) {
            Difference::Forward => (here, here + step),
            Difference::Backward => (here - step, here),
            Difference::Centered => (here - step, here + step),
        }
    }

    pub fn scalar(&self, field: &[f32], i: usize, j: usize, axis: Axis) -> f32 {
        let (low, high) = self.neighbors(i, j, axis);
        (field[high] - field[low]) * self.inv_span
    }

    pub fn vector(&self, field: &[[f32; 2]], i: usize, j: usize, axis: Axis) -> [f32; 2] {
        let (low, high) = self.neighbors(i, j, axis);
        [
            (field[high][0] - field[low][0]) * self.inv_span,
            (field[high][1] - field[low][1]) * self.inv_span,
        ]
    }

    /// `(d/dx, d/dz)` of a scalar field.
    pub fn gradient(&self, field: &[f32], i: usize, j: usize) -> [f32; 2] {
        [self.scalar(field, i, j, Axis::I), self.scalar(field, i, j, Axis::J)]
    }

    /// `du/dx + dv/dz` of a velocity field.
    pub fn divergence(&self, field: &[[f32; 2]], i: usize, j: usize) -> f32 {
        let (low_i, high_i) = self.neighbors(i, j, Axis::I);
        let (low_j, high_j) = self.neighbors(i, j, Axis::J);
        (field[high_i][0] - field[low_i][0]) * self.inv_span + (field[high_j][1] - field[low_j][1]) * self.inv_span
    }
}
