mod renderer;
mod transform;

pub use renderer::Renderer;
pub use transform::{world_rect_to_screen, world_to_screen_px, ScreenRectPx, Viewport};
