use std::sync::Arc;

use pixels::{Error, Pixels, SurfaceTexture, TextureError};
use winit::window::Window;

use crate::app::{Banner, Camera2D, Hud, SceneWorld, Sprite, SpriteKind};
use crate::physics::{TileQuery, TileType};

use super::transform::{world_rect_to_screen, ScreenRectPx, Viewport};

const SKY_COLOR: [u8; 4] = [28, 32, 48, 255];
const SOLID_TILE_COLOR: [u8; 4] = [96, 72, 52, 255];
const SOLID_TILE_EDGE_COLOR: [u8; 4] = [122, 94, 66, 255];
const PLATFORM_TILE_COLOR: [u8; 4] = [150, 150, 168, 255];
const PLATFORM_THICKNESS_DIVISOR: i32 = 4;
const FACING_MARK_COLOR: [u8; 4] = [250, 250, 250, 255];
const FACING_MARK_SIZE_PX: i32 = 4;
const DEATH_TINT_COLOR: [u8; 4] = [90, 90, 90, 255];
const FLASH_PERIOD_TICKS: u64 = 4;
const HUD_MARGIN_PX: i32 = 12;
const HUD_HEART_SIZE_PX: i32 = 14;
const HUD_HEART_COLOR: [u8; 4] = [220, 40, 60, 255];
const HUD_EMPTY_HEART_COLOR: [u8; 4] = [70, 30, 36, 255];
const HUD_COIN_SIZE_PX: i32 = 6;
const HUD_COIN_COLOR: [u8; 4] = [250, 210, 60, 255];
const HUD_COINS_PER_ROW: u32 = 20;
const HUD_AMMO_BAR_WIDTH_PX: i32 = 120;
const HUD_AMMO_BAR_HEIGHT_PX: i32 = 8;
const HUD_AMMO_COLOR: [u8; 4] = [230, 230, 230, 255];
const HUD_RELOAD_COLOR: [u8; 4] = [240, 150, 40, 255];
const HUD_AMMO_BACK_COLOR: [u8; 4] = [50, 50, 60, 255];
const HUD_INSTA_KILL_COLOR: [u8; 4] = [180, 80, 240, 255];
const BANNER_SHADE_PERCENT: u16 = 45;
const BANNER_WIDTH_PX: i32 = 320;
const BANNER_HEIGHT_PX: i32 = 64;

pub struct Renderer {
    window: Arc<Window>,
    pixels: Pixels<'static>,
    viewport: Viewport,
}

impl Renderer {
    /// `viewport` is the logical frame size; the surface follows the window.
    pub fn new(window: Arc<Window>, viewport: Viewport) -> Result<Self, Error> {
        let size = window.inner_size();
        let surface = SurfaceTexture::new(size.width, size.height, Arc::clone(&window));
        let pixels = Pixels::new(viewport.width, viewport.height, surface)?;
        Ok(Self {
            window,
            pixels,
            viewport,
        })
    }

    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), TextureError> {
        if width == 0 || height == 0 {
            return Ok(());
        }
        self.pixels.resize_surface(width, height)
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    pub(crate) fn render_world(&mut self, world: &SceneWorld) -> Result<(), Error> {
        let viewport = self.viewport;
        let frame = self.pixels.frame_mut();
        compose_frame(frame, viewport, world);
        self.pixels.render()
    }
}

fn compose_frame(frame: &mut [u8], viewport: Viewport, world: &SceneWorld) {
    for chunk in frame.chunks_exact_mut(4) {
        chunk.copy_from_slice(&SKY_COLOR);
    }
    let camera = world.camera();

    draw_tiles(frame, viewport, world, camera);
    for sprite in world.sprites() {
        if !sprite_visible_on_tick(sprite, world.tick()) {
            continue;
        }
        draw_sprite(frame, viewport, sprite, camera);
    }
    if let Some(hud) = world.hud() {
        draw_hud(frame, viewport, hud);
    }
    if let Some(banner) = world.banner() {
        draw_banner(frame, viewport, banner);
    }
}

fn draw_tiles(frame: &mut [u8], viewport: Viewport, world: &SceneWorld, camera: &Camera2D) {
    let Some(tilemap) = world.tilemap() else {
        return;
    };
    for tile in tilemap.tiles_overlapping(&viewport.world_rect(camera)) {
        let rect = world_rect_to_screen(&tile.bounds, camera);
        match tile.tile_type {
            TileType::Passable => {}
            TileType::Solid => {
                fill_rect(frame, viewport, rect, SOLID_TILE_COLOR);
                let edge = ScreenRectPx::new(rect.left, rect.top, rect.width(), 2);
                fill_rect(frame, viewport, edge, SOLID_TILE_EDGE_COLOR);
            }
            TileType::JumpThroughPlatform => {
                let thickness = (rect.height() / PLATFORM_THICKNESS_DIVISOR).max(1);
                let slab = ScreenRectPx::new(rect.left, rect.top, rect.width(), thickness);
                fill_rect(frame, viewport, slab, PLATFORM_TILE_COLOR);
            }
        }
    }
}

fn sprite_visible_on_tick(sprite: &Sprite, tick: u64) -> bool {
    !sprite.flashing || tick % FLASH_PERIOD_TICKS < FLASH_PERIOD_TICKS / 2
}

fn sprite_color(kind: SpriteKind) -> [u8; 4] {
    match kind {
        SpriteKind::Player => [70, 160, 240, 255],
        SpriteKind::Enemy => [200, 70, 60, 255],
        SpriteKind::PlayerShot => [120, 230, 255, 255],
        SpriteKind::EnemyShot => [255, 120, 80, 255],
        SpriteKind::WeaponPickup => [120, 200, 110, 255],
        SpriteKind::Coin => HUD_COIN_COLOR,
        SpriteKind::PowerUp => HUD_INSTA_KILL_COLOR,
        SpriteKind::Goal => [240, 240, 240, 255],
    }
}

/// Splits `WALK_RIGHT` into the clip and an optional facing token.
fn split_animation(animation: &str) -> (&str, Option<&str>) {
    match animation.rsplit_once('_') {
        Some((clip, facing @ ("LEFT" | "RIGHT"))) => (clip, Some(facing)),
        _ => (animation, None),
    }
}

fn draw_sprite(frame: &mut [u8], viewport: Viewport, sprite: &Sprite, camera: &Camera2D) {
    let rect = world_rect_to_screen(&sprite.bounds, camera);
    let (clip, facing) = split_animation(&sprite.animation);
    let color = if clip == "DEATH" {
        DEATH_TINT_COLOR
    } else {
        sprite_color(sprite.kind)
    };
    fill_rect(frame, viewport, rect, color);

    let mark_left = match facing {
        Some("LEFT") => rect.left + 2,
        Some(_) => rect.right - 2 - FACING_MARK_SIZE_PX,
        None => return,
    };
    let mark_top = if clip == "CROUCH" {
        rect.top + rect.height() / 2
    } else {
        rect.top + 4
    };
    let mark = ScreenRectPx::new(mark_left, mark_top, FACING_MARK_SIZE_PX, FACING_MARK_SIZE_PX);
    fill_rect(frame, viewport, mark, FACING_MARK_COLOR);
}

fn draw_hud(frame: &mut [u8], viewport: Viewport, hud: &Hud) {
    let hearts_right = viewport.width as i32 - HUD_MARGIN_PX;
    for index in 0..hud.max_hit_points {
        let offset = (hud.max_hit_points - index) as i32 * (HUD_HEART_SIZE_PX + 4);
        let color = if index < hud.hit_points {
            HUD_HEART_COLOR
        } else {
            HUD_EMPTY_HEART_COLOR
        };
        let heart = ScreenRectPx::new(
            hearts_right - offset,
            HUD_MARGIN_PX,
            HUD_HEART_SIZE_PX,
            HUD_HEART_SIZE_PX,
        );
        fill_rect(frame, viewport, heart, color);
    }

    let coins_top = HUD_MARGIN_PX + HUD_HEART_SIZE_PX + 6;
    for index in 0..hud.coins {
        let col = (index % HUD_COINS_PER_ROW) as i32;
        let row = (index / HUD_COINS_PER_ROW) as i32;
        let coin = ScreenRectPx::new(
            hearts_right - (col + 1) * (HUD_COIN_SIZE_PX + 2),
            coins_top + row * (HUD_COIN_SIZE_PX + 2),
            HUD_COIN_SIZE_PX,
            HUD_COIN_SIZE_PX,
        );
        fill_rect(frame, viewport, coin, HUD_COIN_COLOR);
    }

    if let Some(ammo) = hud.ammo {
        let back = ScreenRectPx::new(
            HUD_MARGIN_PX,
            HUD_MARGIN_PX,
            HUD_AMMO_BAR_WIDTH_PX,
            HUD_AMMO_BAR_HEIGHT_PX,
        );
        fill_rect(frame, viewport, back, HUD_AMMO_BACK_COLOR);
        let (filled, color) = if hud.reloading {
            (HUD_AMMO_BAR_WIDTH_PX, HUD_RELOAD_COLOR)
        } else {
            (ammo_fill_px(ammo.current, ammo.max), HUD_AMMO_COLOR)
        };
        let bar = ScreenRectPx::new(
            HUD_MARGIN_PX,
            HUD_MARGIN_PX,
            filled,
            HUD_AMMO_BAR_HEIGHT_PX,
        );
        fill_rect(frame, viewport, bar, color);
    }

    if hud.insta_kill {
        let badge = ScreenRectPx::new(
            HUD_MARGIN_PX,
            HUD_MARGIN_PX + HUD_AMMO_BAR_HEIGHT_PX + 6,
            HUD_HEART_SIZE_PX,
            HUD_HEART_SIZE_PX,
        );
        fill_rect(frame, viewport, badge, HUD_INSTA_KILL_COLOR);
    }
}

fn ammo_fill_px(current: u32, max: u32) -> i32 {
    if max == 0 {
        return 0;
    }
    let ratio = current.min(max) as f32 / max as f32;
    (HUD_AMMO_BAR_WIDTH_PX as f32 * ratio).round() as i32
}

fn banner_color(banner: Banner) -> [u8; 4] {
    match banner {
        Banner::Title => [49, 207, 240, 255],
        Banner::Paused => [200, 200, 200, 255],
        Banner::LevelCleared => [255, 215, 0, 255],
        Banner::LevelLost => [180, 30, 30, 255],
    }
}

fn draw_banner(frame: &mut [u8], viewport: Viewport, banner: Banner) {
    for chunk in frame.chunks_exact_mut(4) {
        for channel in &mut chunk[..3] {
            *channel = (*channel as u16 * BANNER_SHADE_PERCENT / 100) as u8;
        }
    }
    let panel = ScreenRectPx::new(
        (viewport.width as i32 - BANNER_WIDTH_PX) / 2,
        (viewport.height as i32 - BANNER_HEIGHT_PX) / 2,
        BANNER_WIDTH_PX,
        BANNER_HEIGHT_PX,
    );
    fill_rect(frame, viewport, panel, banner_color(banner));
}

fn fill_rect(frame: &mut [u8], viewport: Viewport, rect: ScreenRectPx, color: [u8; 4]) {
    let left = rect.left.max(0);
    let top = rect.top.max(0);
    let right = rect.right.min(viewport.width as i32);
    let bottom = rect.bottom.min(viewport.height as i32);
    for y in top..bottom {
        for x in left..right {
            write_pixel_rgba_clipped(frame, viewport.width as usize, x, y, color);
        }
    }
}

fn write_pixel_rgba_clipped(frame: &mut [u8], width: usize, x: i32, y: i32, color: [u8; 4]) {
    if x < 0 || y < 0 {
        return;
    }
    let Some(pixel_offset) = (y as usize)
        .checked_mul(width)
        .and_then(|row| row.checked_add(x as usize))
    else {
        return;
    };
    let Some(byte_offset) = pixel_offset.checked_mul(4) else {
        return;
    };
    let Some(pixel) = frame.get_mut(byte_offset..byte_offset + 4) else {
        return;
    };
    pixel.copy_from_slice(&color);
}
