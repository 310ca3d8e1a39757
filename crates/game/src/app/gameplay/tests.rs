use engine::physics::{AirGroundState, Direction, Rect, Tilemap, Vec2};
use engine::{InputAction, InputSnapshot};

use super::archetypes::Archetypes;
use super::enemy::{EnemyKind, EnemySpawn, MovementState};
use super::level::{LevelLayout, LevelWorld, PickupSpawn};
use super::map1;
use super::pickups::PickupKind;
use super::player::PlayerState;
use super::weapons::WeaponKind;

const TILE: f32 = 16.0;
const FLOOR_TOP: f32 = 7.0 * TILE;

fn snapshot_from_actions(actions: &[InputAction]) -> InputSnapshot {
    let mut snapshot = InputSnapshot::empty();
    for action in actions {
        snapshot = snapshot.with_action_down(*action, true);
    }
    snapshot
}

fn arena_layout(archetypes: &Archetypes, waves: Vec<Vec<EnemySpawn>>) -> LevelLayout {
    let open = ".".repeat(80);
    let floor = "#".repeat(80);
    let mut rows = vec![open.as_str(); 7];
    rows.push(floor.as_str());
    let player_feet = archetypes.player.hitbox.y + archetypes.player.hitbox.height;
    LevelLayout {
        tilemap: Tilemap::from_rows(TILE, &rows).expect("map"),
        player_spawn: Vec2::new(40.0, FLOOR_TOP - player_feet),
        pickups: vec![PickupSpawn {
            kind: PickupKind::Weapon(WeaponKind::Pistol),
            anchor: Vec2::new(64.0, FLOOR_TOP),
        }],
        goal: Rect::new(1_200.0, 0.0, 16.0, FLOOR_TOP),
        waves,
    }
}

fn settled_world(archetypes: &Archetypes, waves: Vec<Vec<EnemySpawn>>) -> LevelWorld {
    let mut world = LevelWorld::new(arena_layout(archetypes, waves), archetypes);
    world.tick(&InputSnapshot::empty());
    world
}

#[test]
fn resting_player_resolves_gravity_to_zero_and_stays_grounded() {
    let archetypes = Archetypes::default();
    let mut world = settled_world(&archetypes, Vec::new());

    world.tick(&InputSnapshot::empty());

    let player = world.player();
    let report = player.last_move().expect("moved");
    assert_eq!(report.y.requested_delta, 0.5);
    assert_eq!(report.y.allowed_delta, 0.0);
    assert!(report.y.collided);
    assert_eq!(player.kinematics().momentum_y, 0.0);
    assert_eq!(player.air_ground(), AirGroundState::Ground);
}

#[test]
fn jump_cycle_starts_and_ends_with_zero_jump_force() {
    let archetypes = Archetypes::default();
    let mut world = settled_world(&archetypes, Vec::new());
    let ground_y = world.player().position().y;
    assert_eq!(world.player().kinematics().jump_force, 0.0);

    let jump = snapshot_from_actions(&[InputAction::Jump]);
    world.tick(&jump);
    assert_eq!(world.player().air_ground(), AirGroundState::Air);
    assert_eq!(world.player().state(), PlayerState::Jumping);

    let mut ticks = 0;
    while !world.player().is_grounded() {
        world.tick(&jump);
        ticks += 1;
        assert!(ticks < 200, "never landed");
    }

    assert_eq!(world.player().position().y, ground_y);
    assert_eq!(world.player().kinematics().jump_force, 0.0);
    assert_eq!(world.player().kinematics().momentum_y, 0.0);
}

#[test]
fn pistol_with_one_round_fires_exactly_once() {
    let mut archetypes = Archetypes::default();
    archetypes.weapons.pistol.max_ammo = 1;
    let mut world = settled_world(&archetypes, Vec::new());
    assert_eq!(world.weapons().active(), Some(WeaponKind::Pistol));

    let fire = snapshot_from_actions(&[InputAction::Fire]);
    world.tick(&fire);
    assert_eq!(world.weapons().ammo(WeaponKind::Pistol), 0);
    assert_eq!(world.projectiles().len(), 1);

    world.tick(&InputSnapshot::empty());
    world.tick(&fire);
    assert_eq!(world.weapons().ammo(WeaponKind::Pistol), 0);
    assert_eq!(world.projectiles().len(), 1);
}

#[test]
fn reload_blocks_firing_then_refills_the_pistol() {
    let mut archetypes = Archetypes::default();
    archetypes.weapons.pistol.max_ammo = 1;
    let mut world = settled_world(&archetypes, Vec::new());
    let fire = snapshot_from_actions(&[InputAction::Fire]);
    let reload = snapshot_from_actions(&[InputAction::Reload]);
    let idle = InputSnapshot::empty();

    world.tick(&fire);
    world.tick(&InputSnapshot::empty());
    world.tick(&reload);
    assert!(world.weapons().is_reloading());

    for tick in 0..58 {
        let input = if tick % 2 == 0 { &fire } else { &idle };
        world.tick(input);
        assert_eq!(world.projectiles().len(), 1, "reload tick {tick}");
        assert_eq!(world.weapons().ammo(WeaponKind::Pistol), 0);
    }
    assert!(world.weapons().is_reloading());

    world.tick(&InputSnapshot::empty());
    assert!(!world.weapons().is_reloading());
    assert_eq!(world.weapons().ammo(WeaponKind::Pistol), 1);

    world.tick(&fire);
    assert_eq!(world.weapons().ammo(WeaponKind::Pistol), 0);
    assert_eq!(world.projectiles().len(), 2);
}

#[test]
fn human_in_range_chases_on_tick_sixty_one() {
    let archetypes = Archetypes::default();
    let feet = archetypes.human.hitbox.y + archetypes.human.hitbox.height;
    let human = EnemySpawn {
        kind: EnemyKind::Human,
        position: Vec2::new(250.0, FLOOR_TOP - feet),
        facing: Direction::Left,
        patrol: None,
    };
    let mut world = LevelWorld::new(arena_layout(&archetypes, vec![vec![human]]), &archetypes);

    for tick in 1..=60 {
        world.tick(&InputSnapshot::empty());
        let enemy = &world.active_enemies()[0];
        assert_eq!(enemy.movement_state(), MovementState::Walk, "tick {tick}");
    }
    world.tick(&InputSnapshot::empty());

    let enemy = &world.active_enemies()[0];
    assert_eq!(enemy.movement_state(), MovementState::Chase);
    assert_eq!(enemy.facing(), Direction::Left);
    assert_eq!(world.player().hit_points(), 3);
}

#[derive(Debug, Clone, PartialEq)]
struct SimDigest {
    player_position: Vec2,
    player_state: PlayerState,
    hit_points: u32,
    coins: u32,
    pistol_ammo: u32,
    enemies: Vec<(u64, Rect)>,
    projectiles: usize,
    waves_spawned: usize,
}

fn capture_sim_digest(world: &LevelWorld) -> SimDigest {
    SimDigest {
        player_position: world.player().position(),
        player_state: world.player().state(),
        hit_points: world.player().hit_points(),
        coins: world.player().coins(),
        pistol_ammo: world.weapons().ammo(WeaponKind::Pistol),
        enemies: world
            .active_enemies()
            .iter()
            .map(|enemy| (enemy.id().0, enemy.bounds()))
            .collect(),
        projectiles: world.projectiles().len(),
        waves_spawned: world.waves_spawned(),
    }
}

fn scripted_input(tick: usize) -> InputSnapshot {
    let mut actions = Vec::new();
    if tick % 200 < 120 {
        actions.push(InputAction::MoveRight);
    }
    if tick % 45 == 0 {
        actions.push(InputAction::Jump);
    }
    if tick % 6 < 3 {
        actions.push(InputAction::Fire);
    }
    snapshot_from_actions(&actions)
}

fn run_script_and_capture(ticks: usize) -> Vec<SimDigest> {
    let layout = map1::layout().expect("layout");
    let mut world = LevelWorld::new(layout, &Archetypes::default());
    (0..ticks)
        .map(|tick| {
            world.tick(&scripted_input(tick));
            capture_sim_digest(&world)
        })
        .collect()
}

#[test]
fn same_script_produces_identical_simulation() {
    let first = run_script_and_capture(600);
    let second = run_script_and_capture(600);

    assert_eq!(first, second);
    let last = first.last().expect("ticks");
    assert!(last.player_position.x > map1::TILE_SIZE * 2.0);
}
