use super::body::{Axis, Direction};
use super::geometry::Rect;
use super::tilemap::{Tile, TileQuery, TileType};

/// Overlap below this many world units is treated as edge contact, which
/// absorbs float residue left behind after snapping flush to a tile.
pub const CONTACT_TOLERANCE: f32 = 1.0e-3;

/// Outcome of resolving one axis of movement against the map.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisMove {
    pub axis: Axis,
    pub requested_delta: f32,
    pub allowed_delta: f32,
    pub collided: bool,
    pub direction: Direction,
    pub tile: Option<Tile>,
}

/// Something that moves through the map and reacts to contact.
pub trait Collidable {
    fn collision_bounds(&self) -> Rect;
    fn apply_movement(&mut self, axis: Axis, amount: f32);
    /// Called exactly once per resolved axis, after the movement was applied.
    fn on_axis_resolved(&mut self, outcome: &AxisMove);
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoveReport {
    pub x: AxisMove,
    pub y: AxisMove,
}

/// Clamps `delta` along `axis` so `bounds` stops flush against the first
/// blocking tile in the way.
///
/// The query area is the swept box from the current bounds to the projected
/// bounds, so a delta larger than a tile cannot skip over a solid tile.
/// Tiles the entity is already embedded in are ignored so it can move out.
pub fn resolve_axis_move<M>(bounds: Rect, delta: f32, axis: Axis, map: &M) -> AxisMove
where
    M: TileQuery + ?Sized,
{
    debug_assert!(delta.is_finite(), "movement delta must be finite");
    let direction = Direction::from_delta(axis, delta);
    let mut outcome = AxisMove {
        axis,
        requested_delta: delta,
        allowed_delta: delta,
        collided: false,
        direction,
        tile: None,
    };
    if delta == 0.0 {
        outcome.allowed_delta = 0.0;
        return outcome;
    }

    let projected = match axis {
        Axis::X => bounds.translated(delta, 0.0),
        Axis::Y => bounds.translated(0.0, delta),
    };
    let swept = bounds.union(&projected);

    for tile in map.tiles_overlapping(&swept) {
        if !tile.tile_type.blocks_movement() {
            continue;
        }
        if !tile.bounds.overlaps_by_more_than(&swept, CONTACT_TOLERANCE) {
            continue;
        }
        let Some(limit) = flush_delta(&bounds, &tile, direction) else {
            continue;
        };
        if limit.abs() < outcome.allowed_delta.abs() {
            outcome.allowed_delta = limit;
            outcome.collided = true;
            outcome.tile = Some(tile);
        }
    }

    outcome
}

/// Signed delta that brings the moving edge flush with the tile's facing
/// edge, or `None` when the tile cannot block travel in `direction`.
fn flush_delta(bounds: &Rect, tile: &Tile, direction: Direction) -> Option<f32> {
    if tile.tile_type == TileType::JumpThroughPlatform && direction != Direction::Down {
        return None;
    }
    let gap = match direction {
        Direction::Right => tile.bounds.left() - bounds.right(),
        Direction::Left => bounds.left() - tile.bounds.right(),
        Direction::Down => tile.bounds.top() - bounds.bottom(),
        Direction::Up => bounds.top() - tile.bounds.bottom(),
    };
    // Negative gap: the tile is behind the moving edge (or the entity already
    // overlaps it). For platforms this is the "came from below" case.
    if gap < -CONTACT_TOLERANCE {
        return None;
    }
    Some(direction.sign() * gap.max(0.0))
}

/// Resolves, applies and reports a single axis.
pub fn move_axis<E, M>(entity: &mut E, axis: Axis, delta: f32, map: &M) -> AxisMove
where
    E: Collidable + ?Sized,
    M: TileQuery + ?Sized,
{
    let outcome = resolve_axis_move(entity.collision_bounds(), delta, axis, map);
    if outcome.allowed_delta != 0.0 {
        entity.apply_movement(axis, outcome.allowed_delta);
    }
    entity.on_axis_resolved(&outcome);
    outcome
}

/// Axis-separated move: X first against the pre-move Y, then Y from the
/// post-X position. Each axis reports to the entity exactly once.
pub fn move_and_collide<E, M>(entity: &mut E, dx: f32, dy: f32, map: &M) -> MoveReport
where
    E: Collidable + ?Sized,
    M: TileQuery + ?Sized,
{
    let x = move_axis(entity, Axis::X, dx, map);
    let y = move_axis(entity, Axis::Y, dy, map);
    MoveReport { x, y }
}
