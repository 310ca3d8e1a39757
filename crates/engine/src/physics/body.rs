use super::geometry::{Rect, Vec2};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    X,
    Y,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
}

impl Direction {
    /// Direction of travel for a signed delta. A zero delta reports the
    /// positive direction (RIGHT on X, DOWN on Y).
    pub fn from_delta(axis: Axis, delta: f32) -> Self {
        match (axis, delta < 0.0) {
            (Axis::X, true) => Self::Left,
            (Axis::X, false) => Self::Right,
            (Axis::Y, true) => Self::Up,
            (Axis::Y, false) => Self::Down,
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Self::Left => Self::Right,
            Self::Right => Self::Left,
            Self::Up => Self::Down,
            Self::Down => Self::Up,
        }
    }

    /// +1 for RIGHT/DOWN, -1 for LEFT/UP.
    pub fn sign(self) -> f32 {
        match self {
            Self::Right | Self::Down => 1.0,
            Self::Left | Self::Up => -1.0,
        }
    }

    pub fn as_token(self) -> &'static str {
        match self {
            Self::Left => "LEFT",
            Self::Right => "RIGHT",
            Self::Up => "UP",
            Self::Down => "DOWN",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AirGroundState {
    Air,
    Ground,
}

/// Position, hitbox and orientation shared by every moving thing in a level.
///
/// The world-space bounds are always recomputed from `position + hitbox`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Body {
    pub position: Vec2,
    hitbox: Rect,
    pub facing: Direction,
    pub air_ground: AirGroundState,
}

impl Body {
    pub fn new(position: Vec2, hitbox: Rect, facing: Direction) -> Self {
        Self {
            position,
            hitbox,
            facing,
            air_ground: AirGroundState::Air,
        }
    }

    pub fn with_air_ground(mut self, air_ground: AirGroundState) -> Self {
        self.air_ground = air_ground;
        self
    }

    pub fn hitbox(&self) -> Rect {
        self.hitbox
    }

    /// Swaps the per-frame hitbox; position stays put.
    pub fn set_hitbox(&mut self, hitbox: Rect) {
        self.hitbox = hitbox;
    }

    pub fn bounds(&self) -> Rect {
        self.hitbox.translated(self.position.x, self.position.y)
    }

    pub fn shift(&mut self, axis: Axis, amount: f32) {
        match axis {
            Axis::X => self.position.x += amount,
            Axis::Y => self.position.y += amount,
        }
    }

    pub fn is_grounded(&self) -> bool {
        self.air_ground == AirGroundState::Ground
    }
}
