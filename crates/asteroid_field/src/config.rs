//! Field configuration

use collision_engine::config::{Config, ConfigError};
use collision_engine::foundation::math::Vec2;
use collision_engine::physics::CollisionConfig;
use collision_engine::spatial::{BoundingBox, QuadtreeConfig};
use collision_engine::EngineConfig;
use serde::{Deserialize, Serialize};

/// Top-level settings, loadable from `.toml` or `.ron`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldConfig {
    /// World layout
    pub world: WorldConfig,

    /// Ship behaviour
    pub ships: ShipConfig,

    /// Simulation run settings
    pub simulation: SimulationConfig,

    /// Static index tuning
    pub quadtree: QuadtreeConfig,
}

/// World layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Side length of the square field
    pub size: f32,

    /// Number of rocks scattered at startup
    pub rock_count: usize,

    /// Smallest rock radius
    pub rock_min_radius: f32,

    /// Largest rock radius
    pub rock_max_radius: f32,
}

/// Ship behaviour
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShipConfig {
    /// Ships kept in flight
    pub count: usize,

    /// Half of a ship's side length
    pub half_size: f32,

    /// Cruise speed in units per second
    pub speed: f32,

    /// Rock impacts a ship survives
    pub hull: u32,
}

/// Simulation run settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Frames to simulate before exiting
    pub frames: u64,

    /// Fixed timestep in seconds
    pub timestep: f32,

    /// Log a summary every this many frames
    pub report_interval: u64,

    /// Seed for rock and ship placement
    pub seed: u64,
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            world: WorldConfig::default(),
            ships: ShipConfig::default(),
            simulation: SimulationConfig::default(),
            quadtree: QuadtreeConfig::default(),
        }
    }
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            size: 1000.0,
            rock_count: 2000,
            rock_min_radius: 2.0,
            rock_max_radius: 8.0,
        }
    }
}

impl Default for ShipConfig {
    fn default() -> Self {
        Self {
            count: 64,
            half_size: 1.5,
            speed: 120.0,
            hull: 5,
        }
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            frames: 600,
            timestep: 1.0 / 60.0,
            report_interval: 60,
            seed: 0x00c0_ffee,
        }
    }
}

impl Config for FieldConfig {}

impl FieldConfig {
    /// Field bounds, also used as the quadtree root
    pub fn world_bounds(&self) -> BoundingBox {
        BoundingBox::from_2d(Vec2::zeros(), Vec2::new(self.world.size, self.world.size))
    }

    /// Reject values the simulation cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.world.size.is_finite() || self.world.size <= 0.0 {
            return Err(ConfigError::Invalid(format!("world.size must be positive (got {})", self.world.size)));
        }
        if !(self.world.rock_min_radius > 0.0 && self.world.rock_min_radius <= self.world.rock_max_radius) {
            return Err(ConfigError::Invalid(
                "world.rock_min_radius must be positive and no larger than rock_max_radius".to_string(),
            ));
        }
        if self.world.rock_max_radius * 2.0 >= self.world.size {
            return Err(ConfigError::Invalid("rocks do not fit in the world".to_string()));
        }
        if !(self.ships.half_size > 0.0 && self.ships.half_size * 2.0 < self.world.size) {
            return Err(ConfigError::Invalid("ships.half_size does not fit in the world".to_string()));
        }
        if self.simulation.report_interval == 0 {
            return Err(ConfigError::Invalid("simulation.report_interval must be at least 1".to_string()));
        }
        self.engine_config().validate()
    }

    /// Frame loop settings derived from this configuration
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            max_frames: Some(self.simulation.frames),
            fixed_timestep: Some(self.simulation.timestep),
            collision: CollisionConfig {
                world_bounds: self.world_bounds(),
                quadtree: self.quadtree.clone(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = FieldConfig::default();
        config.validate().unwrap();

        let engine = config.engine_config();
        assert_eq!(engine.max_frames, Some(600));
        assert_eq!(engine.collision.world_bounds, config.world_bounds());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let path = std::env::temp_dir().join(format!("asteroid_field_{}.toml", std::process::id()));
        std::fs::write(&path, "[world]\nrock_count = 10\n\n[ships]\nhull = 1\n").unwrap();

        let config = FieldConfig::load_from_file(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(config.world.rock_count, 10);
        assert_eq!(config.ships.hull, 1);
        assert_eq!(config.world.size, WorldConfig::default().size);
        assert_eq!(config.simulation, SimulationConfig::default());
    }

    #[test]
    fn test_oversized_rocks_rejected() {
        let mut config = FieldConfig::default();
        config.world.rock_max_radius = config.world.size;

        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }
}
