use engine::physics::{Rect, Tilemap, Vec2};
use engine::{EntityId, EntityIdAllocator, InputAction, InputSnapshot, KeyLocker};
use tracing::{debug, info};

use super::archetypes::Archetypes;
use super::enemy::{Enemy, EnemyKind, EnemySpawn};
use super::pickups::{Pickup, PickupKind};
use super::player::{Player, PlayerEvent};
use super::projectile::{Projectile, ProjectileSpawn, ShotOwner};
use super::weapons::{ShotRequest, WeaponController};

/// Player shots leave at this fraction of the player's height.
const PLAYER_SHOT_HEIGHT_RATIO: f32 = 0.4;

/// Outward events of one level tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct TickResult {
    pub(crate) level_completed: bool,
    pub(crate) died: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct PickupSpawn {
    pub(crate) kind: PickupKind,
    /// Bottom-center point the pickup rests on.
    pub(crate) anchor: Vec2,
}

/// Static description of a level. Built once at startup, cloned on every
/// (re)load.
#[derive(Debug, Clone)]
pub(crate) struct LevelLayout {
    pub(crate) tilemap: Tilemap,
    pub(crate) player_spawn: Vec2,
    pub(crate) pickups: Vec<PickupSpawn>,
    pub(crate) goal: Rect,
    pub(crate) waves: Vec<Vec<EnemySpawn>>,
}

#[derive(Debug)]
enum PendingSpawn {
    Enemy(Enemy),
    Projectile(Projectile),
}

impl PendingSpawn {
    fn id(&self) -> EntityId {
        match self {
            PendingSpawn::Enemy(enemy) => enemy.id(),
            PendingSpawn::Projectile(projectile) => projectile.id(),
        }
    }
}

/// Everything alive in one level. Entity lists change only in
/// [`LevelWorld::apply_pending`], at the end of a tick.
#[derive(Debug)]
pub(crate) struct LevelWorld {
    tilemap: Tilemap,
    archetypes: Archetypes,
    ids: EntityIdAllocator,
    player: Player,
    weapons: WeaponController,
    key_locker: KeyLocker,
    enemies: Vec<Enemy>,
    projectiles: Vec<Projectile>,
    pickups: Vec<Pickup>,
    goal: Rect,
    waves: Vec<Vec<EnemySpawn>>,
    waves_spawned: usize,
    pending_spawns: Vec<PendingSpawn>,
    pending_despawns: Vec<EntityId>,
}

impl LevelWorld {
    pub(crate) fn new(layout: LevelLayout, archetypes: &Archetypes) -> Self {
        let mut ids = EntityIdAllocator::default();
        let pickups = layout
            .pickups
            .iter()
            .map(|spawn| Pickup::resting_on(ids.allocate(), spawn.kind, spawn.anchor))
            .collect();
        let mut world = Self {
            player: Player::new(&archetypes.player, layout.player_spawn),
            weapons: WeaponController::new(&archetypes.weapons),
            tilemap: layout.tilemap,
            archetypes: archetypes.clone(),
            ids,
            key_locker: KeyLocker::default(),
            enemies: Vec::new(),
            projectiles: Vec::new(),
            pickups,
            goal: layout.goal,
            waves: layout.waves,
            waves_spawned: 0,
            pending_spawns: Vec::new(),
            pending_despawns: Vec::new(),
        };
        world.advance_waves();
        world
    }

    pub(crate) fn tilemap(&self) -> &Tilemap {
        &self.tilemap
    }

    pub(crate) fn player(&self) -> &Player {
        &self.player
    }

    #[cfg(test)]
    pub(crate) fn player_mut(&mut self) -> &mut Player {
        &mut self.player
    }

    pub(crate) fn weapons(&self) -> &WeaponController {
        &self.weapons
    }

    pub(crate) fn weapons_mut(&mut self) -> &mut WeaponController {
        &mut self.weapons
    }

    pub(crate) fn active_enemies(&self) -> &[Enemy] {
        &self.enemies
    }

    pub(crate) fn projectiles(&self) -> &[Projectile] {
        &self.projectiles
    }

    pub(crate) fn pickups(&self) -> &[Pickup] {
        &self.pickups
    }

    pub(crate) fn goal(&self) -> Rect {
        self.goal
    }

    /// Number of waves spawned so far.
    pub(crate) fn waves_spawned(&self) -> usize {
        self.waves_spawned
    }

    pub(crate) fn wave_count(&self) -> usize {
        self.waves.len()
    }

    /// Queues an enemy; it joins the active list at the next tick boundary.
    pub(crate) fn spawn_enemy(&mut self, spawn: EnemySpawn) -> EntityId {
        let id = self.ids.allocate();
        let archetype = match spawn.kind {
            EnemyKind::Human => &self.archetypes.human,
            EnemyKind::Zombie => &self.archetypes.zombie,
        };
        self.pending_spawns
            .push(PendingSpawn::Enemy(Enemy::new(id, spawn, archetype)));
        id
    }

    pub(crate) fn spawn_projectile(&mut self, spawn: ProjectileSpawn) -> EntityId {
        let id = self.ids.allocate();
        self.pending_spawns
            .push(PendingSpawn::Projectile(Projectile::new(id, spawn)));
        id
    }

    /// Queues removal. Returns false for ids that are neither live nor
    /// pending.
    pub(crate) fn despawn(&mut self, id: EntityId) -> bool {
        let exists_now = self.enemies.iter().any(|enemy| enemy.id() == id)
            || self.projectiles.iter().any(|shot| shot.id() == id)
            || self.pickups.iter().any(|pickup| pickup.id() == id);
        let pending_spawn = self.pending_spawns.iter().any(|spawn| spawn.id() == id);
        if !exists_now && !pending_spawn {
            return false;
        }
        self.pending_despawns.push(id);
        true
    }

    pub(crate) fn apply_pending(&mut self) {
        for spawn in self.pending_spawns.drain(..) {
            match spawn {
                PendingSpawn::Enemy(enemy) => self.enemies.push(enemy),
                PendingSpawn::Projectile(projectile) => self.projectiles.push(projectile),
            }
        }

        if !self.pending_despawns.is_empty() {
            self.pending_despawns.sort();
            self.pending_despawns.dedup();
            let pending = &self.pending_despawns;
            let keep = |id: EntityId| pending.binary_search(&id).is_err();
            self.enemies.retain(|enemy| keep(enemy.id()));
            self.projectiles.retain(|shot| keep(shot.id()));
            self.pickups.retain(|pickup| keep(pickup.id()));
            self.pending_despawns.clear();
        }
    }

    /// One fixed step of the whole level.
    pub(crate) fn tick(&mut self, input: &InputSnapshot) -> TickResult {
        let mut result = TickResult::default();
        match self.player.update(input, &self.tilemap) {
            Some(PlayerEvent::LevelCompleted) => result.level_completed = true,
            Some(PlayerEvent::Died) => result.died = true,
            None => {}
        }

        if self.player.is_running() {
            self.collect_pickups();
            self.update_weapons(input);
            if self.player.bounds().intersects(&self.goal) {
                self.player.complete_level();
            }
        }

        self.update_enemies();
        self.update_projectiles();
        self.apply_pending();
        self.advance_waves();
        result
    }

    fn collect_pickups(&mut self) {
        let reach = self.player.bounds();
        let touched: Vec<Pickup> = self
            .pickups
            .iter()
            .filter(|pickup| pickup.touches(&reach))
            .filter(|pickup| !self.pending_despawns.contains(&pickup.id()))
            .copied()
            .collect();
        for pickup in touched {
            match pickup.kind() {
                PickupKind::Weapon(weapon) => self.weapons.pick_up(weapon),
                PickupKind::Coin => self.player.add_coin(),
                PickupKind::InstaKill => self.player.activate_insta_kill(),
            }
            debug!(pickup = pickup.kind().animation(), "pickup_collected");
            self.despawn(pickup.id());
        }
    }

    fn update_weapons(&mut self, input: &InputSnapshot) {
        let reload_pressed = self.key_locker.take_press(input, InputAction::Reload);
        self.key_locker.refresh(input);
        if let Some(shot) = self.weapons.update(input.is_down(InputAction::Fire), reload_pressed) {
            self.fire_player_shot(shot);
        }
    }

    fn fire_player_shot(&mut self, shot: ShotRequest) {
        let archetype = &self.archetypes.player;
        let spawn = ProjectileSpawn::from_edge(
            ShotOwner::Player,
            self.player.bounds(),
            self.player.facing(),
            PLAYER_SHOT_HEIGHT_RATIO,
            archetype.shot_speed,
            archetype.shot_lifetime_ticks,
            shot.damage,
        );
        let id = self.spawn_projectile(spawn);
        debug!(shot = id.0, weapon = shot.weapon.label(), "player_shot_spawned");
    }

    fn update_enemies(&mut self) {
        let player_bounds = self.player.bounds();
        let target_x = player_bounds.center().x;
        let mut fired = Vec::new();
        let mut contact_damage = 0;

        for enemy in self.enemies.iter_mut().filter(|enemy| !enemy.is_dead()) {
            if let Some(shot) = enemy.update(target_x, &self.tilemap) {
                fired.push(shot);
            }
            if enemy.bounds().intersects(&player_bounds) {
                contact_damage = enemy.contact_damage().max(contact_damage);
            }
        }

        for shot in fired {
            self.spawn_projectile(shot);
        }
        if contact_damage > 0 {
            self.player.hurt(contact_damage);
        }
    }

    fn update_projectiles(&mut self) {
        let insta_kill = self.player.has_insta_kill();
        let mut spent = Vec::new();

        for projectile in &mut self.projectiles {
            if !projectile.update(&self.tilemap) {
                spent.push(projectile.id());
                continue;
            }
            let bounds = projectile.bounds();
            match projectile.owner() {
                ShotOwner::Player => {
                    let Some(enemy) = self
                        .enemies
                        .iter_mut()
                        .find(|enemy| !enemy.is_dead() && enemy.bounds().intersects(&bounds))
                    else {
                        continue;
                    };
                    let damage = if insta_kill {
                        enemy.hit_points()
                    } else {
                        projectile.damage()
                    };
                    if enemy.take_damage(damage) {
                        info!(
                            enemy = enemy.id().0,
                            kind = enemy.kind().label(),
                            insta_kill,
                            "enemy_killed"
                        );
                        spent.push(enemy.id());
                    }
                }
                ShotOwner::Enemy => {
                    if !self.player.is_running() || !bounds.intersects(&self.player.bounds()) {
                        continue;
                    }
                    self.player.hurt(projectile.damage());
                }
            }
            projectile.expire();
            spent.push(projectile.id());
        }

        for id in spent {
            self.despawn(id);
        }
    }

    /// Spawns the next wave once the current one is gone. Clearing the last
    /// wave completes the level.
    fn advance_waves(&mut self) {
        if !self.enemies.is_empty() || self.waves.is_empty() {
            return;
        }
        let Some(wave) = self.waves.get(self.waves_spawned).cloned() else {
            if self.player.is_running() {
                info!(waves = self.waves.len(), "waves_cleared");
                self.player.complete_level();
            }
            return;
        };

        self.waves_spawned += 1;
        for spawn in &wave {
            self.spawn_enemy(*spawn);
        }
        self.apply_pending();
        info!(
            wave = self.waves_spawned,
            of = self.waves.len(),
            enemies = wave.len(),
            "wave_spawned"
        );
    }
}

#[cfg(test)]
mod tests {
    use engine::physics::Direction;

    use super::*;
    use crate::app::gameplay::archetypes::{HitboxSpec, PlayerArchetype};
    use crate::app::gameplay::player::LevelState;
    use crate::app::gameplay::weapons::WeaponKind;

    const TILE: f32 = 16.0;
    const FLOOR_TOP: f32 = 7.0 * TILE;

    fn arena() -> Tilemap {
        let open = ".".repeat(60);
        let floor = "#".repeat(60);
        let mut rows = vec![open.as_str(); 7];
        rows.push(floor.as_str());
        Tilemap::from_rows(TILE, &rows).expect("map")
    }

    fn feet(hitbox: HitboxSpec) -> f32 {
        hitbox.y + hitbox.height
    }

    fn zombie_at(x: f32, facing: Direction) -> EnemySpawn {
        let archetypes = Archetypes::default();
        EnemySpawn {
            kind: EnemyKind::Zombie,
            position: Vec2::new(x, FLOOR_TOP - feet(archetypes.zombie.hitbox)),
            facing,
            patrol: None,
        }
    }

    fn layout(waves: Vec<Vec<EnemySpawn>>, pickups: Vec<PickupSpawn>) -> LevelLayout {
        let player = PlayerArchetype::default();
        LevelLayout {
            tilemap: arena(),
            player_spawn: Vec2::new(40.0, FLOOR_TOP - feet(player.hitbox)),
            pickups,
            goal: Rect::new(900.0, 0.0, 16.0, FLOOR_TOP),
            waves,
        }
    }

    fn pistol_at_spawn() -> PickupSpawn {
        PickupSpawn {
            kind: PickupKind::Weapon(WeaponKind::Pistol),
            anchor: Vec2::new(64.0, FLOOR_TOP),
        }
    }

    fn fire(down: bool) -> InputSnapshot {
        InputSnapshot::empty().with_action_down(InputAction::Fire, down)
    }

    #[test]
    fn first_wave_is_live_after_construction() {
        let world = LevelWorld::new(
            layout(vec![vec![zombie_at(300.0, Direction::Left)]], Vec::new()),
            &Archetypes::default(),
        );

        assert_eq!(world.active_enemies().len(), 1);
        assert_eq!(world.waves_spawned(), 1);
        assert_eq!(world.wave_count(), 1);
    }

    #[test]
    fn spawns_and_despawns_wait_for_the_tick_boundary() {
        let mut world = LevelWorld::new(layout(Vec::new(), Vec::new()), &Archetypes::default());

        let enemy = world.spawn_enemy(zombie_at(300.0, Direction::Left));
        assert!(world.active_enemies().is_empty());
        world.apply_pending();
        assert_eq!(world.active_enemies().len(), 1);

        assert!(world.despawn(enemy));
        assert!(world.despawn(enemy));
        assert_eq!(world.active_enemies().len(), 1);
        world.apply_pending();
        assert!(world.active_enemies().is_empty());
        assert!(!world.despawn(enemy));
        assert!(!world.despawn(EntityId(999)));
    }

    #[test]
    fn despawning_a_pending_spawn_drops_it() {
        let mut world = LevelWorld::new(layout(Vec::new(), Vec::new()), &Archetypes::default());

        let shot = world.spawn_projectile(ProjectileSpawn {
            owner: ShotOwner::Enemy,
            position: Vec2::new(200.0, 50.0),
            speed_x: -3.0,
            lifetime_ticks: 10,
            damage: 1,
        });
        assert!(world.despawn(shot));
        world.apply_pending();

        assert!(world.projectiles().is_empty());
    }

    #[test]
    fn pickup_is_consumed_once() {
        let coin = PickupSpawn {
            kind: PickupKind::Coin,
            anchor: Vec2::new(64.0, FLOOR_TOP),
        };
        let mut world = LevelWorld::new(layout(Vec::new(), vec![coin]), &Archetypes::default());

        world.tick(&InputSnapshot::empty());
        world.tick(&InputSnapshot::empty());

        assert_eq!(world.player().coins(), 1);
        assert!(world.pickups().is_empty());
    }

    #[test]
    fn two_pistol_hits_kill_a_zombie_and_clear_the_level() {
        let mut world = LevelWorld::new(
            layout(vec![vec![zombie_at(300.0, Direction::Left)]], vec![pistol_at_spawn()]),
            &Archetypes::default(),
        );

        world.tick(&fire(true));
        world.tick(&fire(false));
        world.tick(&fire(true));
        assert_eq!(world.weapons().ammo(WeaponKind::Pistol), 10);

        for _ in 0..80 {
            world.tick(&InputSnapshot::empty());
            if world.active_enemies().is_empty() {
                break;
            }
        }

        assert!(world.active_enemies().is_empty());
        assert!(world.projectiles().is_empty());
        assert_eq!(world.player().level_state(), LevelState::LevelCompleted);
    }

    #[test]
    fn cleared_wave_brings_the_next_one() {
        let human = EnemySpawn {
            kind: EnemyKind::Human,
            position: Vec2::new(700.0, FLOOR_TOP - feet(Archetypes::default().human.hitbox)),
            facing: Direction::Left,
            patrol: None,
        };
        let mut world = LevelWorld::new(
            layout(
                vec![vec![zombie_at(300.0, Direction::Left)], vec![human]],
                vec![pistol_at_spawn()],
            ),
            &Archetypes::default(),
        );
        world.player_mut().activate_insta_kill();

        world.tick(&fire(true));
        for _ in 0..60 {
            world.tick(&InputSnapshot::empty());
            if world.waves_spawned() == 2 {
                break;
            }
        }

        assert_eq!(world.waves_spawned(), 2);
        assert_eq!(world.active_enemies().len(), 1);
        assert_eq!(world.active_enemies()[0].kind(), EnemyKind::Human);
        assert!(world.player().is_running());
    }

    #[test]
    fn enemy_contact_hurts_once_per_invulnerability_window() {
        let mut world = LevelWorld::new(
            layout(vec![vec![zombie_at(40.0, Direction::Left)]], Vec::new()),
            &Archetypes::default(),
        );

        world.tick(&InputSnapshot::empty());
        assert_eq!(world.player().hit_points(), 2);
        world.tick(&InputSnapshot::empty());
        assert_eq!(world.player().hit_points(), 2);
        assert!(world.player().is_flashing());
    }

    #[test]
    fn enemy_shot_hurts_the_player_and_is_consumed() {
        let mut world = LevelWorld::new(layout(Vec::new(), Vec::new()), &Archetypes::default());
        let target = world.player().bounds();
        world.spawn_projectile(ProjectileSpawn {
            owner: ShotOwner::Enemy,
            position: Vec2::new(target.right() + 2.0, target.center().y),
            speed_x: -3.0,
            lifetime_ticks: 30,
            damage: 1,
        });
        world.apply_pending();

        world.tick(&InputSnapshot::empty());

        assert_eq!(world.player().hit_points(), 2);
        assert!(world.projectiles().is_empty());
    }

    #[test]
    fn goal_contact_reports_completion_once() {
        let mut layout = layout(Vec::new(), Vec::new());
        layout.goal = Rect::new(60.0, 0.0, 16.0, FLOOR_TOP);
        let mut world = LevelWorld::new(layout, &Archetypes::default());

        let mut reports = 0;
        for _ in 0..300 {
            if world.tick(&InputSnapshot::empty()).level_completed {
                reports += 1;
            }
        }

        assert_eq!(reports, 1);
    }

    #[test]
    fn death_reports_once_and_stops_pickups() {
        let coin = PickupSpawn {
            kind: PickupKind::Coin,
            anchor: Vec2::new(64.0, FLOOR_TOP),
        };
        let mut world = LevelWorld::new(layout(Vec::new(), vec![coin]), &Archetypes::default());
        world.player_mut().kill();

        let mut deaths = 0;
        for _ in 0..300 {
            if world.tick(&InputSnapshot::empty()).died {
                deaths += 1;
            }
        }

        assert_eq!(deaths, 1);
        assert_eq!(world.player().coins(), 0);
    }
}
