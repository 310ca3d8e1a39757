use crate::app::Camera2D;
use crate::physics::{Rect, Vec2};

/// Logical frame size in pixels. One world unit maps to one logical pixel;
/// `pixels` scales the frame up to the window surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn size_world(&self) -> (f32, f32) {
        (self.width as f32, self.height as f32)
    }

    pub fn world_rect(&self, camera: &Camera2D) -> Rect {
        Rect::new(
            camera.position.x,
            camera.position.y,
            self.width as f32,
            self.height as f32,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenRectPx {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl ScreenRectPx {
    pub fn new(left: i32, top: i32, width: i32, height: i32) -> Self {
        Self {
            left,
            top,
            right: left + width,
            bottom: top + height,
        }
    }

    pub fn width(&self) -> i32 {
        self.right - self.left
    }

    pub fn height(&self) -> i32 {
        self.bottom - self.top
    }
}

pub fn world_to_screen_px(world: Vec2, camera: &Camera2D) -> (i32, i32) {
    (
        (world.x - camera.position.x).round() as i32,
        (world.y - camera.position.y).round() as i32,
    )
}

/// Screen rectangle covered by a world box. Right/bottom are exclusive.
pub fn world_rect_to_screen(rect: &Rect, camera: &Camera2D) -> ScreenRectPx {
    let (left, top) = world_to_screen_px(Vec2::new(rect.left(), rect.top()), camera);
    let (right, bottom) = world_to_screen_px(Vec2::new(rect.right(), rect.bottom()), camera);
    ScreenRectPx {
        left,
        top,
        right,
        bottom,
    }
}
