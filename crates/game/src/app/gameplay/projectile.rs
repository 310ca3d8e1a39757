use engine::physics::{move_axis, Axis, AxisMove, Body, Collidable, Direction, Rect, TileQuery, Vec2};
use engine::EntityId;

pub(crate) const PLAYER_SHOT_SIZE: (f32, f32) = (12.0, 6.0);
pub(crate) const ENEMY_SHOT_SIZE: (f32, f32) = (16.0, 8.0);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum ShotOwner {
    Player,
    Enemy,
}

/// Everything needed to place a projectile; the level assigns the id.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct ProjectileSpawn {
    pub(crate) owner: ShotOwner,
    pub(crate) position: Vec2,
    pub(crate) speed_x: f32,
    pub(crate) lifetime_ticks: u32,
    pub(crate) damage: u32,
}

impl ProjectileSpawn {
    /// Spawn point just outside `shooter` on its facing side, at `height_ratio`
    /// of its height.
    pub(crate) fn from_edge(
        owner: ShotOwner,
        shooter: Rect,
        facing: Direction,
        height_ratio: f32,
        speed: f32,
        lifetime_ticks: u32,
        damage: u32,
    ) -> Self {
        let (width, height) = shot_size(owner);
        let x = match facing {
            Direction::Left => shooter.left() - width,
            _ => shooter.right(),
        };
        let y = shooter.top() + shooter.height * height_ratio - height * 0.5;
        let speed_x = match facing {
            Direction::Left => -speed.abs(),
            _ => speed.abs(),
        };
        Self {
            owner,
            position: Vec2::new(x, y),
            speed_x,
            lifetime_ticks,
            damage,
        }
    }
}

fn shot_size(owner: ShotOwner) -> (f32, f32) {
    match owner {
        ShotOwner::Player => PLAYER_SHOT_SIZE,
        ShotOwner::Enemy => ENEMY_SHOT_SIZE,
    }
}

/// Straight horizontal shot. Stops at the first wall or when its lifetime
/// runs out.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Projectile {
    id: EntityId,
    owner: ShotOwner,
    body: Body,
    speed_x: f32,
    remaining_ticks: u32,
    damage: u32,
    spent: bool,
}

impl Projectile {
    pub(crate) fn new(id: EntityId, spawn: ProjectileSpawn) -> Self {
        let (width, height) = shot_size(spawn.owner);
        let facing = Direction::from_delta(Axis::X, spawn.speed_x);
        Self {
            id,
            owner: spawn.owner,
            body: Body::new(spawn.position, Rect::new(0.0, 0.0, width, height), facing),
            speed_x: spawn.speed_x,
            remaining_ticks: spawn.lifetime_ticks,
            damage: spawn.damage,
            spent: false,
        }
    }

    pub(crate) fn id(&self) -> EntityId {
        self.id
    }

    pub(crate) fn owner(&self) -> ShotOwner {
        self.owner
    }

    pub(crate) fn bounds(&self) -> Rect {
        self.body.bounds()
    }

    pub(crate) fn damage(&self) -> u32 {
        self.damage
    }

    #[cfg(test)]
    pub(crate) fn is_spent(&self) -> bool {
        self.spent
    }

    /// Marks the shot as used up after it hit something.
    pub(crate) fn expire(&mut self) {
        self.spent = true;
    }

    pub(crate) fn animation(&self) -> String {
        format!("FLY_{}", self.body.facing.as_token())
    }

    /// Advances one tick. Returns whether the shot is still live.
    pub(crate) fn update<M: TileQuery + ?Sized>(&mut self, map: &M) -> bool {
        if self.spent {
            return false;
        }
        if self.remaining_ticks == 0 {
            self.spent = true;
            return false;
        }
        self.remaining_ticks -= 1;
        let speed_x = self.speed_x;
        move_axis(self, Axis::X, speed_x, map);
        !self.spent
    }
}

impl Collidable for Projectile {
    fn collision_bounds(&self) -> Rect {
        self.body.bounds()
    }

    fn apply_movement(&mut self, axis: Axis, amount: f32) {
        self.body.shift(axis, amount);
    }

    fn on_axis_resolved(&mut self, outcome: &AxisMove) {
        if outcome.collided {
            self.spent = true;
        }
    }
}
