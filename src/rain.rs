use log::debug;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};
use crate::grid::Grid;

/// What to do with a drop that lands outside the grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImpactPolicy {
    /// Deposit on the nearest edge node.
    Clamp,
    /// Drop the impact; the drop is still removed.
    Discard,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RainDrop {
    pub position: [f32; 3],
    pub fall_speed: f32,
}

impl RainDrop {
    pub fn new(x: f32, y: f32, z: f32, fall_speed: f32) -> RainDrop {
        RainDrop { position: [x, y, z], fall_speed }
    }

    pub fn height(&self) -> f32 {
        self.position[1]
    }

    fn fall(&mut self, gravity: f32, dt: f32) {
        self.fall_speed += gravity * dt;
        self.position[1] -= self.fall_speed * dt;
    }
}

/// A drop that reached the water plane and the node it deposited into.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Impact {
    pub node: usize,
    pub clamped: bool,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct RainOutcome {
    pub landed: Vec<Impact>,
    pub discarded: usize,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RainParams {
    pub max_drops: usize,
    pub gravity: f32,
    pub water_plane: f32,
    pub impulse: f32,
    pub spawn_probability: f64,
    pub spawn_min: f32,
    pub spawn_extent: f32,
    pub spawn_height: f32,
    pub initial_fall_speed: f32,
    pub impact_policy: ImpactPolicy,
}

/// Falling drops and their conversion into grid forcing.
pub struct RainSystem {
    drops: Vec<RainDrop>,
    params: RainParams,
}

impl RainSystem {
    pub fn new(params: RainParams) -> RainSystem {
        RainSystem {
            drops: Vec::with_capacity(params.max_drops),
            params,
        }
    }

    pub fn params(&self) -> &RainParams {
        &self.params
    }

    pub fn drops(&self) -> &[RainDrop] {
        &self.drops
    }

    pub fn active_count(&self) -> usize {
        self.drops.len()
    }

    /// Adds a drop unless the system is already at `max_drops`.
    pub fn push_drop(&mut self, drop: RainDrop) -> bool {
        if self.drops.len() < self.params.max_drops {
            self.drops.push(drop);
            true
        } else {
            false
        }
    }

    /// Advances every drop by `dt` and resolves those now below the water plane.
    pub fn tick(&mut self, dt: f32, grid: &mut Grid) -> RainOutcome {
        let params = &self.params;
        let mut outcome = RainOutcome::default();

        self.drops.retain_mut(|drop| {
            drop.fall(params.gravity, dt);
            if drop.height() >= params.water_plane {
                return true;
            }
            match deposit(grid, drop, params) {
                Ok(impact) => outcome.landed.push(impact),
                Err(err) => {
                    debug!("discarding rain impact: {}", err);
                    outcome.discarded += 1;
                }
            }
            false
        });

        outcome
    }

    /// Rolls the per-tick spawn chance and adds one drop on success.
    pub fn maybe_spawn<R: Rng + ?Sized>(&mut self, rng: &mut R) -> bool {
        if self.drops.len() >= self.params.max_drops {
            return false;
        }
        if rng.gen::<f64>() >= self.params.spawn_probability {
            return false;
        }
        let p = &self.params;
        let x = p.spawn_min + rng.gen::<f32>() * p.spawn_extent;
        let z = p.spawn_min + rng.gen::<f32>() * p.spawn_extent;
        self.drops.push(RainDrop::new(x, p.spawn_height, z, p.initial_fall_speed));
        true
    }
}

fn deposit(grid: &mut Grid, drop: &RainDrop, params: &RainParams) -> SimResult<Impact> {
    let impact = locate_impact(grid, drop, params.impact_policy)?;
    grid.apply_forcing(impact.node, params.impulse)?;
    Ok(impact)
}

/// Maps a landed drop's `(x, z)` onto a node, applying `policy` when it falls off the grid.
pub fn locate_impact(grid: &Grid, drop: &RainDrop, policy: ImpactPolicy) -> SimResult<Impact> {
    let spacing = grid.spacing();
    let i = ((drop.position[0] - grid.corner()) / spacing).floor();
    let j = ((drop.position[2] - grid.corner()) / spacing).floor();
    if !(i.is_finite() && j.is_finite()) {
        return Err(SimError::config(format!("rain drop at non-finite position {:?}", drop.position)));
    }
    let (i, j) = (i as i64, j as i64);

    match grid.checked_node(i, j) {
        Ok(node) => Ok(Impact { node, clamped: false }),
        Err(err) => match policy {
            ImpactPolicy::Discard => Err(err),
            ImpactPolicy::Clamp => {
                let max = grid.dimension() as i64;
                let node = grid.checked_node(i.clamp(0, max), j.clamp(0, max))?;
                debug!("clamped rain impact ({}, {}) onto node {}", i, j, node);
                Ok(Impact { node, clamped: true })
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;
    use crate::config::SimConfig;

    fn params() -> RainParams {
        SimConfig::default().rain_params()
    }

    #[test]
    fn drop_falls_with_explicit_euler() {
        let mut grid = Grid::new(10, 3.6, -0.3).unwrap();
        let mut rain = RainSystem::new(params());
        rain.push_drop(RainDrop::new(0.0, 5.0, 0.0, 0.0));
        rain.tick(0.1, &mut grid);
        let drop = &rain.drops()[0];
        assert!((drop.fall_speed - 1.0).abs() < 1e-6);
        assert!((drop.height() - 4.9).abs() < 1e-6);
    }

    #[test]
    fn landing_drop_sets_forcing_and_is_removed() {
        let mut grid = Grid::new(10, 3.6, -0.3).unwrap();
        let mut rain = RainSystem::new(params());
        rain.push_drop(RainDrop::new(0.05, -0.29, -0.05, 1.0));
        rain.push_drop(RainDrop::new(0.0, 3.0, 0.0, 0.0));
        let outcome = rain.tick(0.1, &mut grid);

        assert_eq!(rain.active_count(), 1);
        assert_eq!(outcome.landed.len(), 1);
        // (0.05 + 1.8) / 0.36 -> 5, (-0.05 + 1.8) / 0.36 -> 4
        let node = grid.node_at(5, 4);
        assert_eq!(outcome.landed[0], Impact { node, clamped: false });
        assert_eq!(grid.forcing()[node], 2.0);
        assert_eq!(grid.forcing().iter().filter(|&&f| f != 0.0).count(), 1);
    }

    #[test]
    fn out_of_grid_impacts_follow_policy() {
        let grid = Grid::new(10, 3.6, -0.3).unwrap();
        let far = RainDrop::new(4.0, -1.0, -4.0, 0.0);

        let clamped = locate_impact(&grid, &far, ImpactPolicy::Clamp).unwrap();
        assert_eq!(clamped, Impact { node: grid.node_at(10, 0), clamped: true });

        let err = locate_impact(&grid, &far, ImpactPolicy::Discard).unwrap_err();
        assert!(matches!(err, SimError::IndexOutOfBounds { i: 16, j: -7, dimension: 10 }));
    }

    #[test]
    fn discarded_impact_still_removes_drop() {
        let mut grid = Grid::new(10, 3.6, -0.3).unwrap();
        let mut p = params();
        p.impact_policy = ImpactPolicy::Discard;
        let mut rain = RainSystem::new(p);
        rain.push_drop(RainDrop::new(9.0, -0.2, 0.0, 5.0));
        let outcome = rain.tick(0.1, &mut grid);
        assert_eq!(outcome.discarded, 1);
        assert!(outcome.landed.is_empty());
        assert_eq!(rain.active_count(), 0);
        assert!(grid.forcing().iter().all(|&f| f == 0.0));
    }

    #[test]
    fn spawns_inside_rectangle_at_spawn_height() {
        let mut p = params();
        p.spawn_probability = 1.0;
        let mut rain = RainSystem::new(p);
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..10 {
            assert!(rain.maybe_spawn(&mut rng));
        }
        assert!(!rain.maybe_spawn(&mut rng));
        for drop in rain.drops() {
            assert_eq!(drop.height(), 5.0);
            assert_eq!(drop.fall_speed, 2.0);
            assert!(drop.position[0] >= -1.5 && drop.position[0] < 1.5);
            assert!(drop.position[2] >= -1.5 && drop.position[2] < 1.5);
        }
    }

    #[test]
    fn zero_probability_never_spawns() {
        let mut p = params();
        p.spawn_probability = 0.0;
        let mut rain = RainSystem::new(p);
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..1000 {
            assert!(!rain.maybe_spawn(&mut rng));
        }
    }

    #[test]
    fn push_respects_cap() {
        let mut p = params();
        p.max_drops = 2;
        let mut rain = RainSystem::new(p);
        assert!(rain.push_drop(RainDrop::new(0.0, 1.0, 0.0, 0.0)));
        assert!(rain.push_drop(RainDrop::new(0.0, 1.0, 0.0, 0.0)));
        assert!(!rain.push_drop(RainDrop::new(0.0, 1.0, 0.0, 0.0)));
    }
}
