use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};
use crate::rain::{ImpactPolicy, RainParams};
use crate::wave::{BoundaryPolicy, ForcingPolicy};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicalConstants {
    pub gravity: f32,
    /// Reference depth `H` in the continuity equation.
    pub reference_depth: f32,
    /// Coefficient on the forcing gradient in the momentum equation.
    pub damping: f32,
}

impl Default for PhysicalConstants {
    fn default() -> Self {
        PhysicalConstants {
            gravity: 10.0,
            reference_depth: 1.7,
            damping: 1.7,
        }
    }
}

/// Construction-time settings for a whole simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub dimension: usize,
    pub max_drops: usize,
    pub water_len: f32,
    /// Rest height of the surface, which is also the plane drops land on.
    pub water_height: f32,
    pub timestep: f32,
    pub impulse: f32,
    pub spawn_probability: f64,
    pub spawn_min: f32,
    pub spawn_extent: f32,
    pub spawn_height: f32,
    pub initial_fall_speed: f32,
    pub impact_policy: ImpactPolicy,
    /// Overrides the solver's own boundary policy when set.
    pub boundary_policy: Option<BoundaryPolicy>,
    /// Overrides the solver's own forcing policy when set.
    pub forcing_policy: Option<ForcingPolicy>,
    pub seed: u64,
    pub constants: PhysicalConstants,
}

impl Default for SimConfig {
    fn default() -> Self {
        SimConfig {
            dimension: 50,
            max_drops: 10,
            water_len: 3.6,
            water_height: -0.3,
            timestep: 0.003_333 / 2.0,
            impulse: 2.0,
            spawn_probability: 0.049,
            spawn_min: -1.5,
            spawn_extent: 3.0,
            spawn_height: 5.0,
            initial_fall_speed: 2.0,
            impact_policy: ImpactPolicy::Clamp,
            boundary_policy: None,
            forcing_policy: None,
            seed: 0,
            constants: PhysicalConstants::default(),
        }
    }
}

impl SimConfig {
    pub fn from_json_file(path: impl AsRef<Path>) -> SimResult<SimConfig> {
        let reader = BufReader::new(File::open(path)?);
        let config: SimConfig = serde_json::from_reader(reader)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_dimension(mut self, dimension: usize) -> Self {
        self.dimension = dimension;
        self
    }

    pub fn with_max_drops(mut self, max_drops: usize) -> Self {
        self.max_drops = max_drops;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn water_corner(&self) -> f32 {
        -self.water_len / 2.0
    }

    pub fn validate(&self) -> SimResult<()> {
        if self.dimension < 1 {
            return Err(SimError::InvalidDimension { dimension: self.dimension });
        }
        if self.max_drops < 1 {
            return Err(SimError::config("max_drops must be positive"));
        }
        if let Some(ForcingPolicy::Decay(factor)) = self.forcing_policy {
            if !(0.0..=1.0).contains(&factor) {
                return Err(SimError::config(format!("forcing decay must lie in [0, 1], got {}", factor)));
            }
        }
        if !(self.water_len.is_finite() && self.water_len > 0.0) {
            return Err(SimError::config(format!("water_len must be positive, got {}", self.water_len)));
        }
        if !self.water_height.is_finite() {
            return Err(SimError::config("water_height must be finite"));
        }
        if !(self.timestep.is_normal() && self.timestep.is_sign_positive()) {
            return Err(SimError::config(format!("timestep must be positive, got {}", self.timestep)));
        }
        if !(self.impulse.is_finite() && self.impulse >= 0.0) {
            return Err(SimError::config(format!("impulse cannot be negative, got {}", self.impulse)));
        }
        if !(0.0..=1.0).contains(&self.spawn_probability) {
            return Err(SimError::config(format!(
                "spawn_probability must lie in [0, 1], got {}",
                self.spawn_probability
            )));
        }
        if !(self.spawn_extent.is_finite() && self.spawn_extent > 0.0) || !self.spawn_min.is_finite() {
            return Err(SimError::config("spawn rectangle must be finite with a positive extent"));
        }
        if !(self.spawn_height.is_finite() && self.initial_fall_speed.is_finite()) {
            return Err(SimError::config("spawn height and fall speed must be finite"));
        }
        let c = &self.constants;
        if !(c.gravity.is_finite() && c.reference_depth.is_finite() && c.damping.is_finite()) {
            return Err(SimError::config("physical constants must be finite"));
        }
        Ok(())
    }

    pub fn rain_params(&self) -> RainParams {
        RainParams {
            max_drops: self.max_drops,
            gravity: self.constants.gravity,
            water_plane: self.water_height,
            impulse: self.impulse,
            spawn_probability: self.spawn_probability,
            spawn_min: self.spawn_min,
            spawn_extent: self.spawn_extent,
            spawn_height: self.spawn_height,
            initial_fall_speed: self.initial_fall_speed,
            impact_policy: self.impact_policy,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid_and_centered() {
        let config = SimConfig::default();
        assert_eq!(config.water_corner(), -1.8);
        assert_eq!(config.constants.gravity, 10.0);
        assert_eq!(config.constants.reference_depth, 1.7);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_dimension_is_rejected() {
        let err = SimConfig::default().with_dimension(0).validate().unwrap_err();
        assert!(matches!(err, SimError::InvalidDimension { dimension: 0 }));
    }

    #[test]
    fn bad_probability_is_rejected() {
        let mut config = SimConfig::default();
        config.spawn_probability = 1.5;
        assert!(matches!(config.validate(), Err(SimError::InvalidConfig { .. })));
    }

    #[test]
    fn zero_drops_is_rejected() {
        let err = SimConfig::default().with_max_drops(0).validate().unwrap_err();
        assert!(matches!(err, SimError::InvalidConfig { .. }));
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let config: SimConfig = serde_json::from_str(r#"{ "dimension": 8, "impact_policy": "discard" }"#).unwrap();
        assert_eq!(config.dimension, 8);
        assert_eq!(config.impact_policy, ImpactPolicy::Discard);
        assert_eq!(config.max_drops, 10);
        assert_eq!(config.boundary_policy, None);
        assert_eq!(config.forcing_policy, None);
        assert_eq!(config.constants, PhysicalConstants::default());
    }

    #[test]
    fn json_selects_solver_policies() {
        let config: SimConfig = serde_json::from_str(
            r#"{ "boundary_policy": "one_sided", "forcing_policy": { "decay": 0.5 } }"#,
        )
        .unwrap();
        assert_eq!(config.boundary_policy, Some(BoundaryPolicy::OneSided));
        assert_eq!(config.forcing_policy, Some(ForcingPolicy::Decay(0.5)));
        assert!(config.validate().is_ok());

        let config: SimConfig = serde_json::from_str(r#"{ "forcing_policy": "persistent" }"#).unwrap();
        assert_eq!(config.forcing_policy, Some(ForcingPolicy::Persistent));
    }

    #[test]
    fn growing_decay_is_rejected() {
        let mut config = SimConfig::default();
        config.forcing_policy = Some(ForcingPolicy::Decay(1.5));
        assert!(matches!(config.validate(), Err(SimError::InvalidConfig { .. })));
    }
}
