use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("{field} must be a positive finite number, got {value}")]
    NotPositive { field: &'static str, value: f32 },
    #[error("{field} must be a non-negative finite number, got {value}")]
    Negative { field: &'static str, value: f32 },
}

pub fn require_positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NotPositive { field, value })
    }
}

pub fn require_non_negative(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Negative { field, value })
    }
}

/// Per-entity movement tuning. Units are pixels and pixels per tick.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PhysicsConfig {
    pub gravity: f32,
    pub walk_speed: f32,
    pub jump_height: f32,
    pub jump_degrade: f32,
    pub terminal_velocity: f32,
    pub momentum_increase: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: 0.5,
            walk_speed: 2.3,
            jump_height: 14.5,
            jump_degrade: 0.5,
            terminal_velocity: 6.0,
            momentum_increase: 0.5,
        }
    }
}

impl PhysicsConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_positive("gravity", self.gravity)?;
        require_positive("walk_speed", self.walk_speed)?;
        require_non_negative("jump_height", self.jump_height)?;
        require_non_negative("jump_degrade", self.jump_degrade)?;
        require_non_negative("terminal_velocity", self.terminal_velocity)?;
        require_non_negative("momentum_increase", self.momentum_increase)?;
        Ok(())
    }
}

/// Vertical motion carried between ticks.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Kinematics {
    pub momentum_y: f32,
    pub jump_force: f32,
}

impl Kinematics {
    /// Tentative downward delta for this tick, before jump impulse.
    pub fn gravity_delta(&self, config: &PhysicsConfig) -> f32 {
        config.gravity + self.momentum_y
    }

    /// Only meaningful while airborne and descending.
    pub fn increase_momentum(&mut self, config: &PhysicsConfig) {
        self.momentum_y = (self.momentum_y + config.momentum_increase).min(config.terminal_velocity);
    }

    pub fn start_jump(&mut self, config: &PhysicsConfig) {
        self.jump_force = config.jump_height;
    }

    pub fn is_rising(&self) -> bool {
        self.jump_force > 0.0
    }

    pub fn apply_jump_impulse(&mut self, config: &PhysicsConfig, dy: &mut f32) {
        if self.jump_force > 0.0 {
            *dy -= self.jump_force;
            self.jump_force = (self.jump_force - config.jump_degrade).max(0.0);
        }
    }

    pub fn land(&mut self) {
        self.momentum_y = 0.0;
        self.jump_force = 0.0;
    }

    pub fn bump_ceiling(&mut self) {
        self.jump_force = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resting_gravity_delta_is_plain_gravity() {
        let config = PhysicsConfig::default();
        let kinematics = Kinematics::default();

        assert_eq!(kinematics.gravity_delta(&config), 0.5);
    }

    #[test]
    fn momentum_is_capped_at_terminal_velocity() {
        let config = PhysicsConfig::default();
        let mut kinematics = Kinematics::default();

        for _ in 0..40 {
            kinematics.increase_momentum(&config);
        }

        assert_eq!(kinematics.momentum_y, config.terminal_velocity);
        assert_eq!(kinematics.gravity_delta(&config), 6.5);
    }

    #[test]
    fn jump_impulse_decays_to_zero() {
        let config = PhysicsConfig::default();
        let mut kinematics = Kinematics::default();
        kinematics.start_jump(&config);

        let mut first = kinematics.gravity_delta(&config);
        kinematics.apply_jump_impulse(&config, &mut first);
        assert_eq!(first, 0.5 - 14.5);
        assert_eq!(kinematics.jump_force, 14.0);

        let mut ticks = 1;
        while kinematics.is_rising() {
            let mut dy = kinematics.gravity_delta(&config);
            kinematics.apply_jump_impulse(&config, &mut dy);
            ticks += 1;
        }
        assert_eq!(ticks, 29);
        assert_eq!(kinematics.jump_force, 0.0);
    }

    #[test]
    fn landing_and_ceiling_clear_state() {
        let config = PhysicsConfig::default();
        let mut kinematics = Kinematics {
            momentum_y: 3.0,
            jump_force: 4.0,
        };

        kinematics.bump_ceiling();
        assert_eq!(kinematics.jump_force, 0.0);
        assert_eq!(kinematics.momentum_y, 3.0);

        kinematics.start_jump(&config);
        kinematics.land();
        assert_eq!(kinematics, Kinematics::default());
    }

    #[test]
    fn validation_rejects_bad_constants() {
        let zero_gravity = PhysicsConfig {
            gravity: 0.0,
            ..PhysicsConfig::default()
        };
        assert_eq!(
            zero_gravity.validate(),
            Err(ConfigError::NotPositive {
                field: "gravity",
                value: 0.0
            })
        );

        let negative_jump = PhysicsConfig {
            jump_height: -1.0,
            ..PhysicsConfig::default()
        };
        assert!(matches!(
            negative_jump.validate(),
            Err(ConfigError::Negative {
                field: "jump_height",
                ..
            })
        ));

        let nan_walk = PhysicsConfig {
            walk_speed: f32::NAN,
            ..PhysicsConfig::default()
        };
        assert!(nan_walk.validate().is_err());
        assert!(PhysicsConfig::default().validate().is_ok());
    }

    #[test]
    fn partial_document_keeps_defaults() {
        let config: PhysicsConfig =
            serde_json::from_value(serde_json::json!({ "gravity": 0.75 })).expect("config");

        assert_eq!(config.gravity, 0.75);
        assert_eq!(config.walk_speed, 2.3);
    }
}
