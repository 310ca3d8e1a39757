use super::input::InputSnapshot;
use crate::physics::{Rect, Tilemap, Vec2};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SceneKey {
    Menu,
    Level,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneCommand {
    None,
    SwitchTo(SceneKey),
    HardResetTo(SceneKey),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub u64);

#[derive(Debug, Default)]
pub struct EntityIdAllocator {
    next: u64,
}

impl EntityIdAllocator {
    pub fn allocate(&mut self) -> EntityId {
        let id = EntityId(self.next);
        self.next = self.next.saturating_add(1);
        id
    }
}

/// View window in world pixels. `position` is the top-left corner.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Camera2D {
    pub position: Vec2,
}

impl Camera2D {
    /// Centers on `focus`, clamped so the view never leaves `[0, world]`.
    pub fn center_on(&mut self, focus: Vec2, view: (f32, f32), world: (f32, f32)) {
        self.position = Vec2 {
            x: clamp_axis(focus.x - view.0 * 0.5, view.0, world.0),
            y: clamp_axis(focus.y - view.1 * 0.5, view.1, world.1),
        };
    }
}

fn clamp_axis(start: f32, view: f32, world: f32) -> f32 {
    let max_start = (world - view).max(0.0);
    start.clamp(0.0, max_start)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpriteKind {
    Player,
    Enemy,
    PlayerShot,
    EnemyShot,
    WeaponPickup,
    Coin,
    PowerUp,
    Goal,
}

/// One drawable thing, copied out of the simulation every tick.
#[derive(Debug, Clone, PartialEq)]
pub struct Sprite {
    pub kind: SpriteKind,
    pub bounds: Rect,
    pub animation: String,
    /// Drawn every other tick when set (hurt invulnerability).
    pub flashing: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AmmoGauge {
    pub current: u32,
    pub max: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Hud {
    pub hit_points: u32,
    pub max_hit_points: u32,
    pub coins: u32,
    pub ammo: Option<AmmoGauge>,
    pub reloading: bool,
    pub insta_kill: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Banner {
    Title,
    Paused,
    LevelCleared,
    LevelLost,
}

#[derive(Debug, Default)]
pub struct SceneWorld {
    tilemap: Option<Tilemap>,
    sprites: Vec<Sprite>,
    camera: Camera2D,
    hud: Option<Hud>,
    banner: Option<Banner>,
    tick: u64,
    view_size: (f32, f32),
}

impl SceneWorld {
    pub fn set_tilemap(&mut self, tilemap: Tilemap) {
        self.tilemap = Some(tilemap);
    }

    pub fn tilemap(&self) -> Option<&Tilemap> {
        self.tilemap.as_ref()
    }

    pub fn clear_sprites(&mut self) {
        self.sprites.clear();
    }

    pub fn push_sprite(&mut self, sprite: Sprite) {
        self.sprites.push(sprite);
    }

    pub fn sprites(&self) -> &[Sprite] {
        &self.sprites
    }

    pub fn sprite_count(&self) -> usize {
        self.sprites.len()
    }

    pub fn camera(&self) -> &Camera2D {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera2D {
        &mut self.camera
    }

    pub fn set_hud(&mut self, hud: Option<Hud>) {
        self.hud = hud;
    }

    pub fn hud(&self) -> Option<&Hud> {
        self.hud.as_ref()
    }

    pub fn set_banner(&mut self, banner: Option<Banner>) {
        self.banner = banner;
    }

    pub fn banner(&self) -> Option<Banner> {
        self.banner
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub(crate) fn advance_tick(&mut self) {
        self.tick = self.tick.saturating_add(1);
    }

    /// Size of the visible area in world pixels, set by the window loop.
    pub fn view_size(&self) -> (f32, f32) {
        self.view_size
    }

    pub fn set_view_size(&mut self, view_size: (f32, f32)) {
        self.view_size = view_size;
    }

    /// Drops everything the scene published, the tilemap included. The view
    /// size is a loop resource and survives.
    pub fn clear(&mut self) {
        let view_size = self.view_size;
        *self = Self::default();
        self.view_size = view_size;
    }
}

pub trait Scene {
    fn load(&mut self, world: &mut SceneWorld);
    fn update(
        &mut self,
        fixed_dt_seconds: f32,
        input: &InputSnapshot,
        world: &mut SceneWorld,
    ) -> SceneCommand;
    fn unload(&mut self, world: &mut SceneWorld);
    fn debug_title(&self, _world: &SceneWorld) -> Option<String> {
        None
    }
}

/// A scene plus the world it publishes into.
struct SceneSlot {
    scene: Box<dyn Scene>,
    world: SceneWorld,
    loaded: bool,
}

impl SceneSlot {
    fn new(scene: Box<dyn Scene>) -> Self {
        Self {
            scene,
            world: SceneWorld::default(),
            loaded: false,
        }
    }

    fn ensure_loaded(&mut self) {
        if !self.loaded {
            self.scene.load(&mut self.world);
            self.loaded = true;
        }
    }

    fn unload(&mut self) {
        if self.loaded {
            self.scene.unload(&mut self.world);
            self.loaded = false;
        }
        self.world.clear();
    }
}

/// Owns the menu and level scenes; only the active one is updated.
pub(crate) struct SceneMachine {
    slots: [SceneSlot; 2],
    active: SceneKey,
}

impl SceneMachine {
    pub(crate) fn new(menu: Box<dyn Scene>, level: Box<dyn Scene>, active: SceneKey) -> Self {
        Self {
            slots: [SceneSlot::new(menu), SceneSlot::new(level)],
            active,
        }
    }

    fn slot(&self, key: SceneKey) -> &SceneSlot {
        &self.slots[slot_index(key)]
    }

    fn slot_mut(&mut self, key: SceneKey) -> &mut SceneSlot {
        &mut self.slots[slot_index(key)]
    }

    pub(crate) fn active_scene(&self) -> SceneKey {
        self.active
    }

    pub(crate) fn set_view_size_for_all(&mut self, view_size: (f32, f32)) {
        for slot in &mut self.slots {
            slot.world.set_view_size(view_size);
        }
    }

    pub(crate) fn load_active(&mut self) {
        self.slot_mut(self.active).ensure_loaded();
    }

    pub(crate) fn update_active(
        &mut self,
        fixed_dt_seconds: f32,
        input: &InputSnapshot,
    ) -> SceneCommand {
        let slot = self.slot_mut(self.active);
        let command = slot.scene.update(fixed_dt_seconds, input, &mut slot.world);
        slot.world.advance_tick();
        command
    }

    pub(crate) fn active_world(&self) -> &SceneWorld {
        &self.slot(self.active).world
    }

    pub(crate) fn debug_title_active(&self) -> Option<String> {
        let slot = self.slot(self.active);
        slot.scene.debug_title(&slot.world)
    }

    /// Returns whether the active scene changed or was rebuilt.
    pub(crate) fn apply_command(&mut self, command: SceneCommand) -> bool {
        match command {
            SceneCommand::None => false,
            SceneCommand::SwitchTo(key) => self.switch_to(key),
            SceneCommand::HardResetTo(key) => {
                self.hard_reset_to(key);
                true
            }
        }
    }

    /// Activates `key`, loading it on first use. The previous scene stays
    /// loaded.
    pub(crate) fn switch_to(&mut self, key: SceneKey) -> bool {
        if self.active == key {
            return false;
        }
        self.slot_mut(key).ensure_loaded();
        self.active = key;
        true
    }

    /// Tears `key` down and loads it from scratch.
    pub(crate) fn hard_reset_to(&mut self, key: SceneKey) {
        let slot = self.slot_mut(key);
        slot.unload();
        slot.ensure_loaded();
        self.active = key;
    }

    pub(crate) fn shutdown_all(&mut self) {
        for slot in &mut self.slots {
            slot.unload();
        }
    }
}

fn slot_index(key: SceneKey) -> usize {
    match key {
        SceneKey::Menu => 0,
        SceneKey::Level => 1,
    }
}
