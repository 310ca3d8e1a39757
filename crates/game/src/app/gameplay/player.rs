use engine::physics::{
    move_and_collide, move_axis, AirGroundState, Axis, AxisMove, Body, Collidable, Direction,
    Kinematics, MoveReport, PhysicsConfig, Rect, StateMachine, StateStep, Tilemap, Vec2,
};
use engine::{InputAction, InputSnapshot, KeyLocker};
use tracing::{debug, info, warn};

use super::archetypes::PlayerArchetype;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PlayerState {
    Standing,
    Walking,
    Crouching,
    Jumping,
}

/// Outer state; only `Running` drives the movement machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LevelState {
    Running,
    LevelCompleted,
    PlayerDead,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PlayerEvent {
    LevelCompleted,
    Died,
}

/// Scratch state one movement tick hands to the state handlers.
struct MovementTick<'a> {
    body: &'a mut Body,
    kinematics: &'a mut Kinematics,
    physics: &'a PhysicsConfig,
    key_locker: &'a mut KeyLocker,
    input: &'a InputSnapshot,
    rising: bool,
    clip: &'static str,
    move_x: f32,
    move_y: f32,
}

impl MovementTick<'_> {
    fn handle(&mut self, step: StateStep<PlayerState>) -> PlayerState {
        match step.state {
            PlayerState::Standing => self.standing(),
            PlayerState::Walking => self.walking(),
            PlayerState::Crouching => self.crouching(),
            PlayerState::Jumping => self.jumping(step),
        }
    }

    fn is_down(&self, action: InputAction) -> bool {
        self.input.is_down(action)
    }

    fn jump_pressed(&mut self) -> bool {
        self.key_locker.take_press(self.input, InputAction::Jump)
    }

    fn standing(&mut self) -> PlayerState {
        self.clip = "STAND";
        if self.is_down(InputAction::MoveLeft) || self.is_down(InputAction::MoveRight) {
            PlayerState::Walking
        } else if self.jump_pressed() {
            PlayerState::Jumping
        } else if self.is_down(InputAction::Crouch) {
            PlayerState::Crouching
        } else {
            PlayerState::Standing
        }
    }

    fn walking(&mut self) -> PlayerState {
        self.clip = "WALK";
        let mut next = PlayerState::Walking;
        if self.is_down(InputAction::MoveLeft) {
            self.move_x -= self.physics.walk_speed;
            self.body.facing = Direction::Left;
        } else if self.is_down(InputAction::MoveRight) {
            self.move_x += self.physics.walk_speed;
            self.body.facing = Direction::Right;
        } else {
            next = PlayerState::Standing;
        }

        if self.jump_pressed() {
            PlayerState::Jumping
        } else if self.is_down(InputAction::Crouch) {
            PlayerState::Crouching
        } else {
            next
        }
    }

    fn crouching(&mut self) -> PlayerState {
        self.clip = "CROUCH";
        let next = if self.input.is_up(InputAction::Crouch) {
            PlayerState::Standing
        } else {
            PlayerState::Crouching
        };
        if self.jump_pressed() {
            PlayerState::Jumping
        } else {
            next
        }
    }

    /// Entered this tick while grounded: take off. Airborne: decaying impulse
    /// plus air control. Grounded again on a later tick: landed.
    fn jumping(&mut self, step: StateStep<PlayerState>) -> PlayerState {
        let grounded = self.body.air_ground == AirGroundState::Ground;
        if grounded && step.entered_from.is_some() {
            self.clip = "JUMP";
            self.body.air_ground = AirGroundState::Air;
            self.kinematics.start_jump(self.physics);
            self.kinematics.apply_jump_impulse(self.physics, &mut self.move_y);
            PlayerState::Jumping
        } else if !grounded {
            self.kinematics.apply_jump_impulse(self.physics, &mut self.move_y);
            self.clip = if self.rising { "JUMP" } else { "FALL" };
            if self.is_down(InputAction::MoveLeft) {
                self.move_x -= self.physics.walk_speed;
            } else if self.is_down(InputAction::MoveRight) {
                self.move_x += self.physics.walk_speed;
            }
            if self.move_y > 0.0 {
                self.kinematics.increase_momentum(self.physics);
            }
            PlayerState::Jumping
        } else {
            PlayerState::Standing
        }
    }
}

/// The avatar: movement state machine plus the level-complete and death
/// sequences that replace it once the level is decided.
#[derive(Debug, Clone)]
pub(crate) struct Player {
    body: Body,
    kinematics: Kinematics,
    physics: PhysicsConfig,
    standing_hitbox: Rect,
    crouch_hitbox: Rect,
    machine: StateMachine<PlayerState>,
    level_state: LevelState,
    previous_y: f32,
    key_locker: KeyLocker,
    clip: &'static str,
    last_move: Option<MoveReport>,
    hit_points: u32,
    max_hit_points: u32,
    hurt_invulnerability_ticks: u32,
    invulnerable_ticks: u32,
    insta_kill_duration: u32,
    insta_kill_ticks: u32,
    coins: u32,
    walk_out_ticks: u32,
    death_hold_ticks: u32,
    sequence_elapsed: u32,
    event_reported: bool,
}

impl Player {
    pub(crate) fn new(archetype: &PlayerArchetype, position: Vec2) -> Self {
        let standing_hitbox = archetype.hitbox.to_rect();
        Self {
            body: Body::new(position, standing_hitbox, Direction::Right),
            kinematics: Kinematics::default(),
            physics: archetype.physics,
            standing_hitbox,
            crouch_hitbox: archetype.crouch_hitbox.to_rect(),
            machine: StateMachine::new(PlayerState::Standing),
            level_state: LevelState::Running,
            previous_y: position.y,
            key_locker: KeyLocker::default(),
            clip: "STAND",
            last_move: None,
            hit_points: archetype.max_hit_points,
            max_hit_points: archetype.max_hit_points,
            hurt_invulnerability_ticks: archetype.hurt_invulnerability_ticks,
            invulnerable_ticks: 0,
            insta_kill_duration: archetype.insta_kill_ticks,
            insta_kill_ticks: 0,
            coins: 0,
            walk_out_ticks: archetype.level_complete_walk_ticks,
            death_hold_ticks: archetype.death_hold_ticks,
            sequence_elapsed: 0,
            event_reported: false,
        }
    }

    pub(crate) fn position(&self) -> Vec2 {
        self.body.position
    }

    pub(crate) fn bounds(&self) -> Rect {
        self.body.bounds()
    }

    pub(crate) fn facing(&self) -> Direction {
        self.body.facing
    }

    #[cfg(test)]
    pub(crate) fn air_ground(&self) -> AirGroundState {
        self.body.air_ground
    }

    pub(crate) fn is_grounded(&self) -> bool {
        self.body.is_grounded()
    }

    pub(crate) fn state(&self) -> PlayerState {
        self.machine.current()
    }

    #[cfg(test)]
    pub(crate) fn level_state(&self) -> LevelState {
        self.level_state
    }

    pub(crate) fn is_running(&self) -> bool {
        self.level_state == LevelState::Running
    }

    #[cfg(test)]
    pub(crate) fn kinematics(&self) -> Kinematics {
        self.kinematics
    }

    /// Collision outcome of the most recent movement tick.
    pub(crate) fn last_move(&self) -> Option<MoveReport> {
        self.last_move
    }

    pub(crate) fn hit_points(&self) -> u32 {
        self.hit_points
    }

    pub(crate) fn max_hit_points(&self) -> u32 {
        self.max_hit_points
    }

    pub(crate) fn coins(&self) -> u32 {
        self.coins
    }

    pub(crate) fn add_coin(&mut self) {
        self.coins = self.coins.saturating_add(1);
    }

    pub(crate) fn activate_insta_kill(&mut self) {
        self.insta_kill_ticks = self.insta_kill_duration;
        info!(ticks = self.insta_kill_ticks, "insta_kill_activated");
    }

    pub(crate) fn has_insta_kill(&self) -> bool {
        self.insta_kill_ticks > 0
    }

    pub(crate) fn is_flashing(&self) -> bool {
        self.invulnerable_ticks > 0
    }

    pub(crate) fn animation(&self) -> String {
        format!("{}_{}", self.clip, self.body.facing.as_token())
    }

    /// Applies `damage` unless the player is invulnerable or no longer
    /// running. Returns whether the hit landed.
    pub(crate) fn hurt(&mut self, damage: u32) -> bool {
        if !self.is_running() || self.invulnerable_ticks > 0 || damage == 0 {
            return false;
        }
        self.hit_points = self.hit_points.saturating_sub(damage);
        if self.hit_points == 0 {
            self.kill();
        } else {
            self.invulnerable_ticks = self.hurt_invulnerability_ticks;
            info!(hit_points = self.hit_points, "player_hurt");
        }
        true
    }

    pub(crate) fn kill(&mut self) {
        if self.level_state == LevelState::PlayerDead {
            return;
        }
        self.hit_points = 0;
        self.level_state = LevelState::PlayerDead;
        self.kinematics = Kinematics::default();
        self.sequence_elapsed = 0;
        info!(x = self.body.position.x, y = self.body.position.y, "player_died");
    }

    /// Starts the walk-out sequence. Ignored once the level is decided.
    pub(crate) fn complete_level(&mut self) {
        if !self.is_running() {
            return;
        }
        self.level_state = LevelState::LevelCompleted;
        self.invulnerable_ticks = 0;
        self.sequence_elapsed = 0;
        info!(x = self.body.position.x, coins = self.coins, "level_completed");
    }

    /// Runs one tick. Each terminal sequence reports its event exactly once.
    pub(crate) fn update(&mut self, input: &InputSnapshot, map: &Tilemap) -> Option<PlayerEvent> {
        match self.level_state {
            LevelState::Running => {
                self.update_running(input, map);
                None
            }
            LevelState::LevelCompleted => self.update_level_completed(map),
            LevelState::PlayerDead => self.update_dead(map),
        }
    }

    fn update_running(&mut self, input: &InputSnapshot, map: &Tilemap) {
        let rising = self.previous_y > self.body.position.y;
        self.previous_y = self.body.position.y;

        let gravity_y = self.kinematics.gravity_delta(&self.physics);

        let Self {
            body,
            kinematics,
            physics,
            key_locker,
            machine,
            clip,
            ..
        } = self;
        let mut tick = MovementTick {
            body,
            kinematics,
            physics,
            key_locker,
            input,
            rising,
            clip: *clip,
            move_x: 0.0,
            move_y: gravity_y,
        };
        if let Err(err) = machine.run(&mut tick, |step, tick| tick.handle(step)) {
            warn!(error = %err, "player_state_kept");
        }
        let (move_x, move_y, clip) = (tick.move_x, tick.move_y, tick.clip);

        self.clip = clip;
        let hitbox = if self.machine.is(PlayerState::Crouching) {
            self.crouch_hitbox
        } else {
            self.standing_hitbox
        };
        self.body.set_hitbox(hitbox);

        self.last_move = Some(move_and_collide(self, move_x, move_y, map));

        self.key_locker.refresh(input);
        self.invulnerable_ticks = self.invulnerable_ticks.saturating_sub(1);
        self.insta_kill_ticks = self.insta_kill_ticks.saturating_sub(1);
    }

    fn update_level_completed(&mut self, map: &Tilemap) -> Option<PlayerEvent> {
        self.body.facing = Direction::Right;
        self.body.set_hitbox(self.standing_hitbox);
        if !self.body.is_grounded() {
            self.clip = "FALL";
            let dy = self.kinematics.gravity_delta(&self.physics);
            self.kinematics.increase_momentum(&self.physics);
            move_axis(self, Axis::Y, dy, map);
            None
        } else if self.sequence_elapsed < self.walk_out_ticks {
            self.clip = "WALK";
            self.sequence_elapsed += 1;
            let walk_speed = self.physics.walk_speed;
            move_axis(self, Axis::X, walk_speed, map);
            None
        } else {
            self.clip = "STAND";
            self.report(PlayerEvent::LevelCompleted)
        }
    }

    fn update_dead(&mut self, map: &Tilemap) -> Option<PlayerEvent> {
        self.clip = "DEATH";
        if self.sequence_elapsed < self.death_hold_ticks {
            self.sequence_elapsed += 1;
            return None;
        }
        let map_bottom = map.origin().y + map.pixel_height();
        if self.body.bounds().top() <= map_bottom {
            let dy = self.kinematics.gravity_delta(&self.physics);
            self.kinematics.increase_momentum(&self.physics);
            self.body.shift(Axis::Y, dy);
            None
        } else {
            self.report(PlayerEvent::Died)
        }
    }

    fn report(&mut self, event: PlayerEvent) -> Option<PlayerEvent> {
        if self.event_reported {
            return None;
        }
        self.event_reported = true;
        debug!(event = ?event, "player_event_reported");
        Some(event)
    }
}

impl Collidable for Player {
    fn collision_bounds(&self) -> Rect {
        self.body.bounds()
    }

    fn apply_movement(&mut self, axis: Axis, amount: f32) {
        self.body.shift(axis, amount);
    }

    fn on_axis_resolved(&mut self, outcome: &AxisMove) {
        if outcome.axis != Axis::Y {
            return;
        }
        match outcome.direction {
            Direction::Down if outcome.collided => {
                self.kinematics.land();
                self.body.air_ground = AirGroundState::Ground;
            }
            Direction::Down => {
                self.body.air_ground = AirGroundState::Air;
                if self.is_running() {
                    self.machine.force(PlayerState::Jumping);
                }
            }
            Direction::Up if outcome.collided => self.kinematics.bump_ceiling(),
            _ => {}
        }
    }
}
