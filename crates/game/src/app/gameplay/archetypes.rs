use std::env;
use std::path::{Path, PathBuf};

use engine::physics::{require_non_negative, require_positive, ConfigError, PhysicsConfig, Rect};
use engine::{read_optional_json_document, AppPaths, ContentError};
use serde::Deserialize;
use thiserror::Error;
use tracing::info;

pub(crate) const ARCHETYPES_ENV_VAR: &str = "PLATFORMER_ARCHETYPES";
pub(crate) const ARCHETYPES_FILE_NAME: &str = "archetypes.json";

#[derive(Debug, Error)]
pub(crate) enum ArchetypeError {
    #[error(transparent)]
    Content(#[from] ContentError),
    #[error("invalid '{archetype}' archetype: {source}")]
    Invalid {
        archetype: &'static str,
        #[source]
        source: ConfigError,
    },
}

/// Hitbox offset and size relative to an entity's position.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct HitboxSpec {
    pub(crate) x: f32,
    pub(crate) y: f32,
    pub(crate) width: f32,
    pub(crate) height: f32,
}

impl HitboxSpec {
    pub(crate) const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub(crate) fn to_rect(self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        require_positive("hitbox.width", self.width)?;
        require_positive("hitbox.height", self.height)?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct PlayerArchetype {
    pub(crate) physics: PhysicsConfig,
    pub(crate) hitbox: HitboxSpec,
    pub(crate) crouch_hitbox: HitboxSpec,
    pub(crate) max_hit_points: u32,
    pub(crate) hurt_invulnerability_ticks: u32,
    pub(crate) insta_kill_ticks: u32,
    pub(crate) level_complete_walk_ticks: u32,
    pub(crate) death_hold_ticks: u32,
    pub(crate) shot_speed: f32,
    pub(crate) shot_lifetime_ticks: u32,
}

impl Default for PlayerArchetype {
    fn default() -> Self {
        Self {
            physics: PhysicsConfig::default(),
            hitbox: HitboxSpec::new(12.0, 6.0, 24.0, 42.0),
            crouch_hitbox: HitboxSpec::new(12.0, 24.0, 24.0, 24.0),
            max_hit_points: 3,
            hurt_invulnerability_ticks: 60,
            insta_kill_ticks: 600,
            level_complete_walk_ticks: 120,
            death_hold_ticks: 40,
            shot_speed: 7.0,
            shot_lifetime_ticks: 120,
        }
    }
}

impl PlayerArchetype {
    fn validate(&self) -> Result<(), ConfigError> {
        self.physics.validate()?;
        self.hitbox.validate()?;
        self.crouch_hitbox.validate()?;
        if self.max_hit_points == 0 {
            return Err(ConfigError::NotPositive {
                field: "max_hit_points",
                value: 0.0,
            });
        }
        require_positive("shot_speed", self.shot_speed)?;
        Ok(())
    }
}

/// Ranged attack timings, in ticks. Only the human archetype shoots.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct RangedAttack {
    pub(crate) first_shot_wait_ticks: u32,
    pub(crate) aim_ticks: u32,
    pub(crate) post_fire_wait_ticks: u32,
    pub(crate) shot_speed: f32,
    pub(crate) shot_lifetime_ticks: u32,
    pub(crate) shot_damage: u32,
}

impl Default for RangedAttack {
    fn default() -> Self {
        Self {
            first_shot_wait_ticks: 65,
            aim_ticks: 65,
            post_fire_wait_ticks: 130,
            shot_speed: 3.0,
            shot_lifetime_ticks: 300,
            shot_damage: 1,
        }
    }
}

/// Enemy blocks are complete records; only `attack` may be omitted.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct EnemyArchetype {
    pub(crate) gravity: f32,
    pub(crate) move_speed: f32,
    pub(crate) hit_points: u32,
    pub(crate) hitbox: HitboxSpec,
    pub(crate) chase_range: f32,
    pub(crate) chase_delay_ticks: u32,
    pub(crate) contact_damage: u32,
    pub(crate) attack: Option<RangedAttack>,
}

impl EnemyArchetype {
    pub(crate) fn human() -> Self {
        Self {
            gravity: 0.5,
            move_speed: 1.25,
            hit_points: 3,
            hitbox: HitboxSpec::new(10.0, 4.0, 28.0, 44.0),
            chase_range: 500.0,
            chase_delay_ticks: 60,
            contact_damage: 1,
            attack: Some(RangedAttack::default()),
        }
    }

    pub(crate) fn zombie() -> Self {
        Self {
            gravity: 0.5,
            move_speed: 1.0,
            hit_points: 2,
            hitbox: HitboxSpec::new(10.0, 4.0, 28.0, 44.0),
            chase_range: 300.0,
            chase_delay_ticks: 60,
            contact_damage: 1,
            attack: None,
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        require_positive("gravity", self.gravity)?;
        require_positive("move_speed", self.move_speed)?;
        require_non_negative("chase_range", self.chase_range)?;
        self.hitbox.validate()?;
        if self.hit_points == 0 {
            return Err(ConfigError::NotPositive {
                field: "hit_points",
                value: 0.0,
            });
        }
        if let Some(attack) = &self.attack {
            require_positive("attack.shot_speed", attack.shot_speed)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct WeaponSpec {
    pub(crate) max_ammo: u32,
    /// Ticks between shots; zero means one shot per trigger press.
    pub(crate) cooldown_ticks: u32,
    pub(crate) damage: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct WeaponTuning {
    pub(crate) pistol: WeaponSpec,
    pub(crate) assault_rifle: WeaponSpec,
    pub(crate) shotgun: WeaponSpec,
    pub(crate) reload_ticks: u32,
}

impl Default for WeaponTuning {
    fn default() -> Self {
        Self {
            pistol: WeaponSpec {
                max_ammo: 12,
                cooldown_ticks: 0,
                damage: 1,
            },
            assault_rifle: WeaponSpec {
                max_ammo: 30,
                cooldown_ticks: 10,
                damage: 1,
            },
            shotgun: WeaponSpec {
                max_ammo: 8,
                cooldown_ticks: 60,
                damage: 3,
            },
            reload_ticks: 60,
        }
    }
}

impl WeaponTuning {
    fn validate(&self) -> Result<(), ConfigError> {
        for (field, spec) in [
            ("pistol.max_ammo", self.pistol),
            ("assault_rifle.max_ammo", self.assault_rifle),
            ("shotgun.max_ammo", self.shotgun),
        ] {
            if spec.max_ammo == 0 {
                return Err(ConfigError::NotPositive { field, value: 0.0 });
            }
        }
        Ok(())
    }
}

/// Every tunable constant of the level, loaded once at startup.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct Archetypes {
    pub(crate) player: PlayerArchetype,
    pub(crate) human: EnemyArchetype,
    pub(crate) zombie: EnemyArchetype,
    pub(crate) weapons: WeaponTuning,
}

impl Default for Archetypes {
    fn default() -> Self {
        Self {
            player: PlayerArchetype::default(),
            human: EnemyArchetype::human(),
            zombie: EnemyArchetype::zombie(),
            weapons: WeaponTuning::default(),
        }
    }
}

impl Archetypes {
    pub(crate) fn validate(&self) -> Result<(), ArchetypeError> {
        self.player.validate().map_err(invalid("player"))?;
        self.human.validate().map_err(invalid("human"))?;
        self.zombie.validate().map_err(invalid("zombie"))?;
        self.weapons.validate().map_err(invalid("weapons"))?;
        Ok(())
    }
}

fn invalid(archetype: &'static str) -> impl FnOnce(ConfigError) -> ArchetypeError {
    move |source| ArchetypeError::Invalid { archetype, source }
}

/// `PLATFORMER_ARCHETYPES` when set, else `assets/base/archetypes.json`.
pub(crate) fn archetypes_path(paths: &AppPaths) -> PathBuf {
    match env::var_os(ARCHETYPES_ENV_VAR) {
        Some(path) if !path.is_empty() => PathBuf::from(path),
        _ => paths.base_content_dir.join(ARCHETYPES_FILE_NAME),
    }
}

/// Missing document means built-in defaults; a present document must parse
/// and validate.
pub(crate) fn load_archetypes(path: &Path) -> Result<Archetypes, ArchetypeError> {
    let archetypes = match read_optional_json_document::<Archetypes>(path)? {
        Some(archetypes) => {
            info!(path = %path.display(), "archetypes_loaded");
            archetypes
        }
        None => {
            info!(path = %path.display(), "archetypes_defaulted");
            Archetypes::default()
        }
    };
    archetypes.validate()?;
    Ok(archetypes)
}
