use engine::physics::{Direction, Rect, Tilemap, TilemapError, Vec2};

use super::enemy::{EnemyKind, EnemySpawn};
use super::level::{LevelLayout, PickupSpawn};
use super::pickups::PickupKind;
use super::weapons::WeaponKind;

pub(crate) const TILE_SIZE: f32 = 48.0;

const ROWS: [&str; 12] = [
    "#......................................#",
    "#......................................#",
    "#......................................#",
    "#......................................#",
    "#...................====...............#",
    "#......................................#",
    "#.............####..........====.......#",
    "#......................................#",
    "#.......====...........................#",
    "#..........................#...........#",
    "#................###.......#...........#",
    "########################################",
];

/// Row whose tiles stand directly on the ground.
const STANDING_ROW: u32 = 10;

/// Top edge of the tile at `row`, used as a resting height.
fn surface(row: u32) -> f32 {
    row as f32 * TILE_SIZE
}

fn column_center(col: f32) -> f32 {
    col * TILE_SIZE + TILE_SIZE * 0.5
}

fn pickup(kind: PickupKind, col: f32, row: u32) -> PickupSpawn {
    PickupSpawn {
        kind,
        anchor: Vec2::new(column_center(col), surface(row)),
    }
}

fn zombie(map: &Tilemap, col: u32, facing: Direction, patrol: (u32, u32)) -> EnemySpawn {
    EnemySpawn {
        kind: EnemyKind::Zombie,
        position: map.tile_location(col, STANDING_ROW),
        facing,
        patrol: Some((
            map.tile_location(patrol.0, STANDING_ROW).x,
            map.tile_location(patrol.1, STANDING_ROW).x,
        )),
    }
}

fn human(map: &Tilemap, col: u32, facing: Direction) -> EnemySpawn {
    EnemySpawn {
        kind: EnemyKind::Human,
        position: map.tile_location(col, STANDING_ROW),
        facing,
        patrol: None,
    }
}

/// The first level: three enemy waves across a walled 40x12 field.
pub(crate) fn layout() -> Result<LevelLayout, TilemapError> {
    let tilemap = Tilemap::from_rows(TILE_SIZE, &ROWS)?;

    let pickups = vec![
        pickup(PickupKind::Weapon(WeaponKind::Pistol), 6.0, 11),
        pickup(PickupKind::Coin, 9.5, 8),
        pickup(PickupKind::Coin, 12.0, 11),
        pickup(PickupKind::Weapon(WeaponKind::AssaultRifle), 16.0, 6),
        pickup(PickupKind::InstaKill, 21.5, 4),
        pickup(PickupKind::Coin, 24.0, 11),
        pickup(PickupKind::Weapon(WeaponKind::Shotgun), 33.0, 11),
    ];

    let waves = vec![
        vec![
            zombie(&tilemap, 12, Direction::Left, (10, 16)),
            zombie(&tilemap, 22, Direction::Right, (20, 26)),
        ],
        vec![
            zombie(&tilemap, 30, Direction::Left, (28, 34)),
            human(&tilemap, 35, Direction::Left),
        ],
        vec![
            zombie(&tilemap, 8, Direction::Right, (4, 12)),
            human(&tilemap, 24, Direction::Left),
            zombie(&tilemap, 34, Direction::Left, (32, 36)),
        ],
    ];

    Ok(LevelLayout {
        player_spawn: tilemap.tile_location(2, STANDING_ROW),
        goal: Rect::new(38.0 * TILE_SIZE, surface(9), TILE_SIZE, 2.0 * TILE_SIZE),
        tilemap,
        pickups,
        waves,
    })
}

#[cfg(test)]
mod tests {
    use engine::physics::{TileQuery, TileType};

    use super::*;
    use crate::app::gameplay::archetypes::Archetypes;
    use crate::app::gameplay::level::LevelWorld;

    fn open_at(map: &Tilemap, bounds: Rect) -> bool {
        map.tiles_overlapping(&bounds)
            .iter()
            .filter(|tile| tile.bounds.intersects(&bounds))
            .all(|tile| tile.tile_type == TileType::Passable)
    }

    #[test]
    fn layout_builds_with_expected_extent() {
        let layout = layout().expect("layout");

        assert_eq!(layout.tilemap.width(), 40);
        assert_eq!(layout.tilemap.height(), 12);
        assert_eq!(layout.waves.len(), 3);
        assert_eq!(layout.pickups.len(), 7);
        assert!(layout.goal.right() <= layout.tilemap.pixel_width());
    }

    #[test]
    fn spawns_start_in_open_space() {
        let layout = layout().expect("layout");
        let archetypes = Archetypes::default();
        let map = &layout.tilemap;

        let player = archetypes.player.hitbox.to_rect();
        assert!(open_at(
            map,
            player.translated(layout.player_spawn.x, layout.player_spawn.y)
        ));
        for spawn in layout.waves.iter().flatten() {
            let hitbox = match spawn.kind {
                EnemyKind::Human => archetypes.human.hitbox,
                EnemyKind::Zombie => archetypes.zombie.hitbox,
            };
            let bounds = hitbox.to_rect().translated(spawn.position.x, spawn.position.y);
            assert!(open_at(map, bounds), "{spawn:?}");
        }
    }

    #[test]
    fn pickups_rest_on_solid_ground() {
        let layout = layout().expect("layout");
        let map = &layout.tilemap;

        for spawn in &layout.pickups {
            let col = (spawn.anchor.x / TILE_SIZE).floor() as i32;
            let row = (spawn.anchor.y / TILE_SIZE).floor() as i32;
            let below = map.tile_at(col, row).map(|tile| tile.tile_type);
            assert!(
                matches!(below, Some(TileType::Solid | TileType::JumpThroughPlatform)),
                "{spawn:?}"
            );
        }
    }

    #[test]
    fn player_spawns_resting_on_the_ground() {
        let layout = layout().expect("layout");
        let spawn = layout.player_spawn;
        let mut world = LevelWorld::new(layout, &Archetypes::default());

        world.tick(&engine::InputSnapshot::empty());

        assert!(world.player().is_grounded());
        assert_eq!(world.player().position(), spawn);
        assert_eq!(world.active_enemies().len(), 2);
    }
}
