use engine::physics::{
    move_and_collide, AirGroundState, Axis, AxisMove, Body, Collidable, Direction, Rect,
    StateMachine, StateStep, TileQuery, Vec2,
};
use engine::EntityId;
use tracing::warn;

use super::archetypes::{EnemyArchetype, RangedAttack};
use super::projectile::{ProjectileSpawn, ShotOwner};

/// Shots leave at this fraction of the shooter's height.
const SHOT_HEIGHT_RATIO: f32 = 0.25;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum EnemyKind {
    Human,
    Zombie,
}

impl EnemyKind {
    pub(crate) fn label(self) -> &'static str {
        match self {
            EnemyKind::Human => "human",
            EnemyKind::Zombie => "zombie",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum MovementState {
    Walk,
    Chase,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ShootingState {
    Walk,
    ShootWait,
    Shoot,
}

/// Where and how an enemy enters the level.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct EnemySpawn {
    pub(crate) kind: EnemyKind,
    pub(crate) position: Vec2,
    pub(crate) facing: Direction,
    /// Patrol span in world x. Only zombies patrol.
    pub(crate) patrol: Option<(f32, f32)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ChaseDelay {
    remaining: u32,
    full: u32,
}

fn chase_step(state: MovementState, in_range: bool, delay: &mut ChaseDelay) -> MovementState {
    match state {
        MovementState::Walk if !in_range => {
            delay.remaining = delay.full;
            MovementState::Walk
        }
        MovementState::Walk if delay.remaining == 0 => MovementState::Chase,
        MovementState::Walk => {
            delay.remaining -= 1;
            MovementState::Walk
        }
        MovementState::Chase if in_range => MovementState::Chase,
        MovementState::Chase => MovementState::Walk,
    }
}

/// Shooting counters of the human archetype. They run independently of the
/// walk/chase machine.
#[derive(Debug, Clone)]
pub(crate) struct HumanBrain {
    attack: RangedAttack,
    shooting: StateMachine<ShootingState>,
    shoot_wait_timer: u32,
    shoot_timer: u32,
}

struct ShootTick<'a> {
    attack: &'a RangedAttack,
    shoot_wait_timer: &'a mut u32,
    shoot_timer: &'a mut u32,
    shooter: Rect,
    facing: Direction,
    fired: Option<ProjectileSpawn>,
}

impl ShootTick<'_> {
    fn handle(&mut self, step: StateStep<ShootingState>) -> ShootingState {
        match step.state {
            ShootingState::Walk if step.entered_from(ShootingState::Shoot) => ShootingState::Walk,
            ShootingState::Walk if *self.shoot_wait_timer == 0 => ShootingState::ShootWait,
            ShootingState::Walk => {
                *self.shoot_wait_timer -= 1;
                ShootingState::Walk
            }
            ShootingState::ShootWait if step.entered_from(ShootingState::Walk) => {
                *self.shoot_timer = self.attack.aim_ticks;
                ShootingState::ShootWait
            }
            ShootingState::ShootWait if *self.shoot_timer == 0 => ShootingState::Shoot,
            ShootingState::ShootWait => {
                *self.shoot_timer -= 1;
                ShootingState::ShootWait
            }
            ShootingState::Shoot => {
                self.fired = Some(ProjectileSpawn::from_edge(
                    ShotOwner::Enemy,
                    self.shooter,
                    self.facing,
                    SHOT_HEIGHT_RATIO,
                    self.attack.shot_speed,
                    self.attack.shot_lifetime_ticks,
                    self.attack.shot_damage,
                ));
                *self.shoot_wait_timer = self.attack.post_fire_wait_ticks;
                ShootingState::Walk
            }
        }
    }
}

impl HumanBrain {
    fn new(attack: RangedAttack) -> Self {
        Self {
            attack,
            shooting: StateMachine::new(ShootingState::Walk),
            shoot_wait_timer: attack.first_shot_wait_ticks,
            shoot_timer: 0,
        }
    }

    fn update(&mut self, shooter: Rect, facing: Direction) -> Option<ProjectileSpawn> {
        let Self {
            attack,
            shooting,
            shoot_wait_timer,
            shoot_timer,
        } = self;
        let mut tick = ShootTick {
            attack,
            shoot_wait_timer,
            shoot_timer,
            shooter,
            facing,
            fired: None,
        };
        if let Err(err) = shooting.run(&mut tick, |step, tick| tick.handle(step)) {
            warn!(error = %err, "enemy_shooting_state_kept");
        }
        tick.fired
    }
}

#[derive(Debug, Clone)]
pub(crate) struct ZombieBrain {
    patrol: Option<(f32, f32)>,
}

impl ZombieBrain {
    /// Turns around at the patrol bounds while walking.
    fn steer(&self, body: &mut Body) {
        let Some((min_x, max_x)) = self.patrol else {
            return;
        };
        if body.position.x <= min_x {
            body.facing = Direction::Right;
        } else if body.position.x >= max_x {
            body.facing = Direction::Left;
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) enum EnemyBehavior {
    Human(HumanBrain),
    Zombie(ZombieBrain),
}

/// One enemy: shared body, gravity and walk/chase machine, plus the
/// archetype-specific behavior.
#[derive(Debug, Clone)]
pub(crate) struct Enemy {
    id: EntityId,
    kind: EnemyKind,
    body: Body,
    gravity: f32,
    move_speed: f32,
    hit_points: u32,
    contact_damage: u32,
    chase_range: f32,
    chase_delay: ChaseDelay,
    movement: StateMachine<MovementState>,
    behavior: EnemyBehavior,
}

impl Enemy {
    pub(crate) fn new(id: EntityId, spawn: EnemySpawn, archetype: &EnemyArchetype) -> Self {
        let behavior = match spawn.kind {
            EnemyKind::Human => {
                EnemyBehavior::Human(HumanBrain::new(archetype.attack.unwrap_or_default()))
            }
            EnemyKind::Zombie => EnemyBehavior::Zombie(ZombieBrain {
                patrol: spawn.patrol,
            }),
        };
        Self {
            id,
            kind: spawn.kind,
            body: Body::new(spawn.position, archetype.hitbox.to_rect(), spawn.facing)
                .with_air_ground(AirGroundState::Ground),
            gravity: archetype.gravity,
            move_speed: archetype.move_speed,
            hit_points: archetype.hit_points,
            contact_damage: archetype.contact_damage,
            chase_range: archetype.chase_range,
            chase_delay: ChaseDelay {
                remaining: archetype.chase_delay_ticks,
                full: archetype.chase_delay_ticks,
            },
            movement: StateMachine::new(MovementState::Walk),
            behavior,
        }
    }

    pub(crate) fn id(&self) -> EntityId {
        self.id
    }

    pub(crate) fn kind(&self) -> EnemyKind {
        self.kind
    }

    pub(crate) fn bounds(&self) -> Rect {
        self.body.bounds()
    }

    #[cfg(test)]
    pub(crate) fn facing(&self) -> Direction {
        self.body.facing
    }

    pub(crate) fn hit_points(&self) -> u32 {
        self.hit_points
    }

    pub(crate) fn is_dead(&self) -> bool {
        self.hit_points == 0
    }

    pub(crate) fn contact_damage(&self) -> u32 {
        self.contact_damage
    }

    pub(crate) fn movement_state(&self) -> MovementState {
        self.movement.current()
    }

    #[cfg(test)]
    pub(crate) fn chase_delay_remaining(&self) -> u32 {
        self.chase_delay.remaining
    }

    pub(crate) fn shooting_state(&self) -> Option<ShootingState> {
        match &self.behavior {
            EnemyBehavior::Human(brain) => Some(brain.shooting.current()),
            EnemyBehavior::Zombie(_) => None,
        }
    }

    pub(crate) fn animation(&self) -> String {
        let clip = match self.shooting_state() {
            Some(ShootingState::ShootWait) => "SHOOT",
            _ => "WALK",
        };
        format!("{clip}_{}", self.body.facing.as_token())
    }

    /// Returns whether this hit killed the enemy.
    pub(crate) fn take_damage(&mut self, damage: u32) -> bool {
        if self.is_dead() {
            return false;
        }
        self.hit_points = self.hit_points.saturating_sub(damage);
        self.is_dead()
    }

    /// One AI tick: chase decision, walking, shooting, then axis-separated
    /// movement. Returns the projectile fired this tick, if any.
    pub(crate) fn update<M: TileQuery + ?Sized>(
        &mut self,
        player_center_x: f32,
        map: &M,
    ) -> Option<ProjectileSpawn> {
        let distance_x = player_center_x - self.body.bounds().center().x;
        let in_range = distance_x.abs() < self.chase_range;

        let Self {
            movement,
            chase_delay,
            ..
        } = self;
        if let Err(err) = movement.run(chase_delay, |step, delay| {
            chase_step(step.state, in_range, delay)
        }) {
            warn!(enemy = self.id.0, error = %err, "enemy_movement_state_kept");
        }

        match (&self.behavior, self.movement.current()) {
            (_, MovementState::Chase) => {
                self.body.facing = if distance_x > 0.0 {
                    Direction::Right
                } else {
                    Direction::Left
                };
            }
            (EnemyBehavior::Zombie(brain), MovementState::Walk) => brain.steer(&mut self.body),
            (EnemyBehavior::Human(_), MovementState::Walk) => {}
        }

        let move_x = if self.body.is_grounded() {
            self.body.facing.sign() * self.move_speed
        } else {
            0.0
        };

        let shooter = self.body.bounds();
        let facing = self.body.facing;
        let fired = match &mut self.behavior {
            EnemyBehavior::Human(brain) => brain.update(shooter, facing),
            EnemyBehavior::Zombie(_) => None,
        };

        let gravity = self.gravity;
        move_and_collide(self, move_x, gravity, map);
        fired
    }
}

impl Collidable for Enemy {
    fn collision_bounds(&self) -> Rect {
        self.body.bounds()
    }

    fn apply_movement(&mut self, axis: Axis, amount: f32) {
        self.body.shift(axis, amount);
    }

    fn on_axis_resolved(&mut self, outcome: &AxisMove) {
        match outcome.axis {
            Axis::X if outcome.collided => self.body.facing = outcome.direction.opposite(),
            Axis::Y if outcome.direction == Direction::Down => {
                self.body.air_ground = if outcome.collided {
                    AirGroundState::Ground
                } else {
                    AirGroundState::Air
                };
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use engine::physics::Tilemap;

    use super::*;

    const TILE: f32 = 16.0;

    fn flat_map(columns: usize, walls: bool) -> Tilemap {
        let open = if walls {
            format!("#{}#", ".".repeat(columns - 2))
        } else {
            ".".repeat(columns)
        };
        let floor = "#".repeat(columns);
        let rows = [open.as_str(), open.as_str(), open.as_str(), open.as_str(), floor.as_str()];
        Tilemap::from_rows(TILE, &rows).expect("map")
    }

    fn spawn_on_floor(kind: EnemyKind, x: f32, facing: Direction, archetype: &EnemyArchetype) -> Enemy {
        let feet = archetype.hitbox.y + archetype.hitbox.height;
        let spawn = EnemySpawn {
            kind,
            position: Vec2::new(x, 4.0 * TILE - feet),
            facing,
            patrol: None,
        };
        Enemy::new(EntityId(7), spawn, archetype)
    }

    #[test]
    fn chase_starts_on_the_tick_after_the_delay_runs_out() {
        let map = flat_map(60, false);
        let archetype = EnemyArchetype::human();
        let mut enemy = spawn_on_floor(EnemyKind::Human, 400.0, Direction::Left, &archetype);
        let player_x = enemy.bounds().center().x + 100.0;

        for tick in 1..=60 {
            enemy.update(player_x, &map);
            assert_eq!(enemy.movement_state(), MovementState::Walk, "tick {tick}");
        }
        assert_eq!(enemy.chase_delay_remaining(), 0);

        enemy.update(player_x, &map);
        assert_eq!(enemy.movement_state(), MovementState::Chase);
        assert_eq!(enemy.facing(), Direction::Right);
    }

    #[test]
    fn leaving_range_resets_delay_and_walks() {
        let map = flat_map(60, false);
        let archetype = EnemyArchetype::human();
        let mut enemy = spawn_on_floor(EnemyKind::Human, 400.0, Direction::Right, &archetype);
        let near = enemy.bounds().center().x - 50.0;

        for _ in 0..30 {
            enemy.update(near, &map);
        }
        assert_eq!(enemy.chase_delay_remaining(), 30);

        enemy.update(near + 5_000.0, &map);
        assert_eq!(enemy.movement_state(), MovementState::Walk);
        assert_eq!(enemy.chase_delay_remaining(), 60);

        for _ in 0..61 {
            enemy.update(enemy.bounds().center().x - 50.0, &map);
        }
        assert_eq!(enemy.movement_state(), MovementState::Chase);
        assert_eq!(enemy.facing(), Direction::Left);

        enemy.update(near + 5_000.0, &map);
        assert_eq!(enemy.movement_state(), MovementState::Walk);
        assert_eq!(enemy.chase_delay_remaining(), 60);
    }

    #[test]
    fn human_fires_exactly_one_shot_per_cycle() {
        let map = flat_map(200, false);
        let archetype = EnemyArchetype::human();
        let mut enemy = spawn_on_floor(EnemyKind::Human, 1_000.0, Direction::Right, &archetype);
        let far_away = -10_000.0;

        let mut shots = Vec::new();
        for tick in 1..=300 {
            if let Some(shot) = enemy.update(far_away, &map) {
                shots.push((tick, shot));
            }
            if tick == 66 {
                assert_eq!(enemy.shooting_state(), Some(ShootingState::ShootWait));
                assert_eq!(enemy.animation(), "SHOOT_RIGHT");
            }
        }

        assert_eq!(shots.len(), 1);
        let (tick, shot) = shots[0];
        assert_eq!(tick, 132);
        assert_eq!(shot.owner, ShotOwner::Enemy);
        assert_eq!(shot.speed_x, 3.0);
        assert_eq!(enemy.shooting_state(), Some(ShootingState::Walk));
        assert_eq!(enemy.animation(), "WALK_RIGHT");
    }

    #[test]
    fn wall_bump_reverses_facing() {
        let map = flat_map(12, true);
        let archetype = EnemyArchetype::zombie();
        let mut enemy = spawn_on_floor(EnemyKind::Zombie, 100.0, Direction::Right, &archetype);

        let mut turned = false;
        for _ in 0..200 {
            enemy.update(-10_000.0, &map);
            if enemy.facing() == Direction::Left {
                turned = true;
                break;
            }
        }

        assert!(turned);
        assert!(enemy.bounds().right() <= 11.0 * TILE + 1e-3);
    }

    #[test]
    fn zombie_patrols_between_bounds() {
        let map = flat_map(60, false);
        let archetype = EnemyArchetype::zombie();
        let feet = archetype.hitbox.y + archetype.hitbox.height;
        let spawn = EnemySpawn {
            kind: EnemyKind::Zombie,
            position: Vec2::new(200.0, 4.0 * TILE - feet),
            facing: Direction::Right,
            patrol: Some((180.0, 240.0)),
        };
        let mut enemy = Enemy::new(EntityId(1), spawn, &archetype);

        let mut min_x = f32::MAX;
        let mut max_x = f32::MIN;
        for _ in 0..400 {
            enemy.update(-10_000.0, &map);
            min_x = min_x.min(enemy.bounds().x);
            max_x = max_x.max(enemy.bounds().x);
        }

        let offset = archetype.hitbox.x;
        assert!(min_x >= 180.0 + offset - 1.0 - 1e-3);
        assert!(max_x <= 240.0 + offset + 1.0 + 1e-3);
        assert!(max_x - min_x > 50.0);
        assert_eq!(enemy.shooting_state(), None);
    }

    #[test]
    fn damage_kills_at_zero() {
        let archetype = EnemyArchetype::zombie();
        let mut enemy = spawn_on_floor(EnemyKind::Zombie, 0.0, Direction::Left, &archetype);

        assert!(!enemy.take_damage(1));
        assert!(enemy.take_damage(1));
        assert!(enemy.is_dead());
        assert!(!enemy.take_damage(1));
    }
}
