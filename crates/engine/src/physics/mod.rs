mod body;
mod collision;
mod geometry;
mod integrator;
mod state_machine;
mod tilemap;

pub use body::{AirGroundState, Axis, Body, Direction};
pub use collision::{
    move_and_collide, move_axis, resolve_axis_move, AxisMove, Collidable, MoveReport,
    CONTACT_TOLERANCE,
};
pub use geometry::{Rect, Vec2};
pub use integrator::{
    require_non_negative, require_positive, ConfigError, Kinematics, PhysicsConfig,
};
pub use state_machine::{StateMachine, StateMachineError, StateStep, MAX_STATE_ITERATIONS};
pub use tilemap::{Tile, TileQuery, TileType, Tilemap, TilemapError};
