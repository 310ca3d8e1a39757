pub(crate) mod archetypes;
pub(crate) mod enemy;
pub(crate) mod level;
pub(crate) mod map1;
pub(crate) mod pickups;
pub(crate) mod player;
pub(crate) mod projectile;
pub(crate) mod scene_impl;
pub(crate) mod weapons;

#[cfg(test)]
mod tests;

use engine::Scene;

use self::archetypes::Archetypes;
use self::level::LevelLayout;
use self::scene_impl::{LevelScene, MenuScene};

/// Menu and level scenes, in the order the loop expects them.
pub(crate) fn build_scenes(
    layout: LevelLayout,
    archetypes: Archetypes,
) -> (Box<dyn Scene>, Box<dyn Scene>) {
    (
        Box::new(MenuScene::new()),
        Box::new(LevelScene::new(layout, archetypes)),
    )
}
