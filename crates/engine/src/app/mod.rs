mod input;
mod loop_runner;
mod metrics;
mod rendering;
mod scene;

pub use input::{InputAction, InputSnapshot, KeyLocker};
pub use loop_runner::{run_app, AppError, LoopConfig, SLOW_FRAME_ENV_VAR};
pub use metrics::LoopMetricsSnapshot;
pub use rendering::{
    world_rect_to_screen, world_to_screen_px, Renderer, ScreenRectPx, Viewport,
};
pub use scene::{
    AmmoGauge, Banner, Camera2D, EntityId, EntityIdAllocator, Hud, Scene, SceneCommand, SceneKey,
    SceneWorld, Sprite, SpriteKind,
};
