use engine::{
    Banner, Hud, InputAction, InputSnapshot, KeyLocker, Scene, SceneCommand, SceneKey, SceneWorld,
    Sprite, SpriteKind,
};
use tracing::info;

use super::archetypes::Archetypes;
use super::enemy::MovementState;
use super::level::{LevelLayout, LevelWorld};
use super::projectile::ShotOwner;

/// Ticks the "level cleared" banner stays up before the menu returns.
pub(crate) const LEVEL_CLEARED_BANNER_TICKS: u32 = 130;

/// Title screen. Fire or jump starts a fresh level.
#[derive(Debug, Default)]
pub(crate) struct MenuScene {
    key_locker: KeyLocker,
}

impl MenuScene {
    pub(crate) fn new() -> Self {
        Self::default()
    }
}

impl Scene for MenuScene {
    fn load(&mut self, world: &mut SceneWorld) {
        self.key_locker = KeyLocker::default();
        self.key_locker.lock(InputAction::Fire);
        self.key_locker.lock(InputAction::Jump);
        world.set_banner(Some(Banner::Title));
        info!(scene = "menu", "scene_loaded");
    }

    fn update(
        &mut self,
        _fixed_dt_seconds: f32,
        input: &InputSnapshot,
        _world: &mut SceneWorld,
    ) -> SceneCommand {
        let fire = self.key_locker.take_press(input, InputAction::Fire);
        let jump = self.key_locker.take_press(input, InputAction::Jump);
        self.key_locker.refresh(input);
        if fire || jump {
            info!(scene = "menu", "level_requested");
            return SceneCommand::HardResetTo(SceneKey::Level);
        }
        SceneCommand::None
    }

    fn unload(&mut self, _world: &mut SceneWorld) {
        info!(scene = "menu", "scene_unloaded");
    }

    fn debug_title(&self, _world: &SceneWorld) -> Option<String> {
        Some("Platformer | menu".to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LevelPhase {
    Running,
    Paused,
    Cleared { remaining_ticks: u32 },
    Lost,
}

impl LevelPhase {
    fn banner(self) -> Option<Banner> {
        match self {
            LevelPhase::Running => None,
            LevelPhase::Paused => Some(Banner::Paused),
            LevelPhase::Cleared { .. } => Some(Banner::LevelCleared),
            LevelPhase::Lost => Some(Banner::LevelLost),
        }
    }

    fn label(self) -> &'static str {
        match self {
            LevelPhase::Running => "running",
            LevelPhase::Paused => "paused",
            LevelPhase::Cleared { .. } => "cleared",
            LevelPhase::Lost => "lost",
        }
    }
}

/// Hosts one [`LevelWorld`] and the pause / cleared / lost flow around it.
pub(crate) struct LevelScene {
    layout: LevelLayout,
    archetypes: Archetypes,
    level: Option<LevelWorld>,
    phase: LevelPhase,
    key_locker: KeyLocker,
}

impl LevelScene {
    pub(crate) fn new(layout: LevelLayout, archetypes: Archetypes) -> Self {
        Self {
            layout,
            archetypes,
            level: None,
            phase: LevelPhase::Running,
            key_locker: KeyLocker::default(),
        }
    }
}

impl Scene for LevelScene {
    fn load(&mut self, world: &mut SceneWorld) {
        let level = LevelWorld::new(self.layout.clone(), &self.archetypes);
        self.phase = LevelPhase::Running;
        self.key_locker = KeyLocker::default();
        world.set_tilemap(level.tilemap().clone());
        publish(&level, self.phase, world);
        info!(
            scene = "level",
            enemies = level.active_enemies().len(),
            waves = level.wave_count(),
            pickups = level.pickups().len(),
            "scene_loaded"
        );
        self.level = Some(level);
    }

    fn update(
        &mut self,
        _fixed_dt_seconds: f32,
        input: &InputSnapshot,
        world: &mut SceneWorld,
    ) -> SceneCommand {
        let Some(level) = self.level.as_mut() else {
            return SceneCommand::None;
        };
        let pause_pressed = self.key_locker.take_press(input, InputAction::Pause);
        let retry_pressed = self.key_locker.take_press(input, InputAction::Fire);
        self.key_locker.refresh(input);

        let mut command = SceneCommand::None;
        match self.phase {
            LevelPhase::Running if pause_pressed => {
                self.phase = LevelPhase::Paused;
                info!(tick = world.tick(), "level_paused");
            }
            LevelPhase::Running => {
                let result = level.tick(input);
                if result.died {
                    level.weapons_mut().reset();
                    self.key_locker.lock(InputAction::Fire);
                    self.phase = LevelPhase::Lost;
                    let position = level.player().position();
                    info!(tick = world.tick(), x = position.x, y = position.y, "level_lost");
                } else if result.level_completed {
                    self.phase = LevelPhase::Cleared {
                        remaining_ticks: LEVEL_CLEARED_BANNER_TICKS,
                    };
                    info!(
                        tick = world.tick(),
                        coins = level.player().coins(),
                        "level_cleared"
                    );
                }
            }
            LevelPhase::Paused => {
                if pause_pressed {
                    self.phase = LevelPhase::Running;
                    info!(tick = world.tick(), "level_resumed");
                }
            }
            LevelPhase::Cleared { remaining_ticks } if remaining_ticks <= 1 => {
                command = SceneCommand::HardResetTo(SceneKey::Menu);
            }
            LevelPhase::Cleared { remaining_ticks } => {
                self.phase = LevelPhase::Cleared {
                    remaining_ticks: remaining_ticks - 1,
                };
            }
            LevelPhase::Lost => {
                if retry_pressed {
                    command = SceneCommand::HardResetTo(SceneKey::Level);
                }
            }
        }

        publish(level, self.phase, world);
        command
    }

    fn unload(&mut self, _world: &mut SceneWorld) {
        self.level = None;
        info!(scene = "level", "scene_unloaded");
    }

    fn debug_title(&self, _world: &SceneWorld) -> Option<String> {
        let level = self.level.as_ref()?;
        let player = level.player();
        let ammo = level
            .weapons()
            .hud()
            .map(|hud| format!("{} {}/{}", hud.weapon.label(), hud.current, hud.max))
            .unwrap_or_else(|| "unarmed".to_string());
        let chasing = level
            .active_enemies()
            .iter()
            .filter(|enemy| enemy.movement_state() == MovementState::Chase)
            .count();
        let fall = player.last_move().map_or(0.0, |report| report.y.allowed_delta);
        Some(format!(
            "Platformer | {} | wave {}/{} | hp {}/{} | coins {} | {} | enemies {} ({} chasing) | {:?} dy {:.1}",
            self.phase.label(),
            level.waves_spawned(),
            level.wave_count(),
            player.hit_points(),
            player.max_hit_points(),
            player.coins(),
            ammo,
            level.active_enemies().len(),
            chasing,
            player.state(),
            fall
        ))
    }
}

/// Copies the simulation into the scene world: sprites, camera, HUD, banner.
fn publish(level: &LevelWorld, phase: LevelPhase, world: &mut SceneWorld) {
    world.clear_sprites();
    world.push_sprite(Sprite {
        kind: SpriteKind::Goal,
        bounds: level.goal(),
        animation: "GOAL".to_string(),
        flashing: false,
    });
    for pickup in level.pickups() {
        world.push_sprite(Sprite {
            kind: pickup.kind().sprite_kind(),
            bounds: pickup.bounds(),
            animation: pickup.kind().animation().to_string(),
            flashing: false,
        });
    }
    for enemy in level.active_enemies() {
        world.push_sprite(Sprite {
            kind: SpriteKind::Enemy,
            bounds: enemy.bounds(),
            animation: enemy.animation(),
            flashing: false,
        });
    }
    for projectile in level.projectiles() {
        let kind = match projectile.owner() {
            ShotOwner::Player => SpriteKind::PlayerShot,
            ShotOwner::Enemy => SpriteKind::EnemyShot,
        };
        world.push_sprite(Sprite {
            kind,
            bounds: projectile.bounds(),
            animation: projectile.animation(),
            flashing: false,
        });
    }

    let player = level.player();
    world.push_sprite(Sprite {
        kind: SpriteKind::Player,
        bounds: player.bounds(),
        animation: player.animation(),
        flashing: player.is_flashing(),
    });

    let view = world.view_size();
    let map = level.tilemap();
    let extent = (map.pixel_width(), map.pixel_height());
    world
        .camera_mut()
        .center_on(player.bounds().center(), view, extent);

    let ammo = level.weapons().hud();
    world.set_hud(Some(Hud {
        hit_points: player.hit_points(),
        max_hit_points: player.max_hit_points(),
        coins: player.coins(),
        ammo: ammo.map(|hud| hud.gauge()),
        reloading: ammo.is_some_and(|hud| hud.reloading),
        insta_kill: player.has_insta_kill(),
    }));
    world.set_banner(phase.banner());
}
