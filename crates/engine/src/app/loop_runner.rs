use std::env;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use pixels::Error as PixelsError;
use thiserror::Error;
use tracing::{info, warn};
use winit::dpi::LogicalSize;
use winit::error::{EventLoopError, OsError};
use winit::event::{ElementState, Event, KeyEvent, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop, EventLoopWindowTarget};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowBuilder};

use super::input::ActionStates;
use super::metrics::MetricsAccumulator;
use super::scene::SceneMachine;
use super::{InputAction, InputSnapshot, Renderer, Scene, SceneKey, Viewport};

/// Milliseconds of artificial delay added before every frame, for exercising
/// the catch-up clamp by hand.
pub const SLOW_FRAME_ENV_VAR: &str = "PLATFORMER_SLOW_FRAME_MS";

const FALLBACK_FRAME_DELTA: Duration = Duration::from_millis(250);
const FALLBACK_METRICS_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone)]
pub struct LoopConfig {
    pub window_title: String,
    pub window_width: u32,
    pub window_height: u32,
    /// Logical frame size in world pixels; scaled to the window.
    pub view_width: u32,
    pub view_height: u32,
    pub target_tps: u32,
    pub max_frame_delta: Duration,
    pub max_ticks_per_frame: u32,
    pub metrics_log_interval: Duration,
    pub simulated_slow_frame_ms: u64,
    pub max_render_fps: Option<u32>,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            window_title: "Platformer".to_string(),
            window_width: 1280,
            window_height: 768,
            view_width: 960,
            view_height: 576,
            target_tps: 60,
            max_frame_delta: FALLBACK_FRAME_DELTA,
            max_ticks_per_frame: 5,
            metrics_log_interval: FALLBACK_METRICS_INTERVAL,
            simulated_slow_frame_ms: 0,
            max_render_fps: None,
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("failed to create event loop: {0}")]
    CreateEventLoop(#[source] EventLoopError),
    #[error("failed to create application window: {0}")]
    CreateWindow(#[source] OsError),
    #[error("failed to initialize renderer: {0}")]
    CreateRenderer(#[source] PixelsError),
    #[error("event loop failed: {0}")]
    EventLoopRun(#[source] EventLoopError),
}

/// Opens the window and drives `menu`/`level` on a fixed timestep until quit.
pub fn run_app(
    config: LoopConfig,
    menu: Box<dyn Scene>,
    level: Box<dyn Scene>,
) -> Result<(), AppError> {
    let event_loop = EventLoop::new().map_err(AppError::CreateEventLoop)?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title(config.window_title.clone())
            .with_inner_size(LogicalSize::new(
                f64::from(config.window_width),
                f64::from(config.window_height),
            ))
            .build(&event_loop)
            .map_err(AppError::CreateWindow)?,
    );
    let viewport = Viewport {
        width: config.view_width.max(1),
        height: config.view_height.max(1),
    };
    let renderer =
        Renderer::new(Arc::clone(&window), viewport).map_err(AppError::CreateRenderer)?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut scenes = SceneMachine::new(menu, level, SceneKey::Menu);
    scenes.set_view_size_for_all(viewport.size_world());
    scenes.load_active();
    info!(
        scene = ?scenes.active_scene(),
        sprite_count = scenes.active_world().sprite_count(),
        "scene_loaded"
    );

    let mut driver = LoopDriver::new(&config, scenes, renderer);
    info!(
        target_tps = config.target_tps.max(1),
        max_frame_delta_ms = driver.clock.max_frame_delta.as_millis() as u64,
        max_ticks_per_frame = driver.clock.max_ticks_per_frame,
        metrics_log_interval_ms = driver.metrics_interval.as_millis() as u64,
        slow_frame_delay_ms = driver.slow_frame_delay.as_millis() as u64,
        render_fps_cap = %driver.pacer.describe(),
        view_width = viewport.width,
        view_height = viewport.height,
        "loop_config"
    );

    event_loop
        .run(move |event, target| match event {
            Event::WindowEvent { window_id, event } if window_id == window.id() => {
                driver.on_window_event(event, &window, target);
            }
            Event::AboutToWait => window.request_redraw(),
            Event::LoopExiting => {
                driver.scenes.shutdown_all();
                info!("shutdown");
            }
            _ => {}
        })
        .map_err(AppError::EventLoopRun)
}

/// Everything the window callback mutates between frames.
struct LoopDriver {
    scenes: SceneMachine,
    renderer: Renderer,
    input: InputCollector,
    clock: FrameClock,
    pacer: RenderPacer,
    metrics: MetricsAccumulator,
    metrics_interval: Duration,
    slow_frame_delay: Duration,
    default_title: String,
    shown_title: Option<String>,
}

impl LoopDriver {
    fn new(config: &LoopConfig, scenes: SceneMachine, renderer: Renderer) -> Self {
        let metrics_interval = non_zero_or(config.metrics_log_interval, FALLBACK_METRICS_INTERVAL);
        Self {
            scenes,
            renderer,
            input: InputCollector::default(),
            clock: FrameClock::new(
                config.target_tps,
                config.max_frame_delta,
                config.max_ticks_per_frame,
                Instant::now(),
            ),
            pacer: RenderPacer::new(config.max_render_fps, Instant::now()),
            metrics: MetricsAccumulator::new(metrics_interval),
            metrics_interval,
            slow_frame_delay: slow_frame_delay_from_env(config.simulated_slow_frame_ms),
            default_title: config.window_title.clone(),
            shown_title: None,
        }
    }

    fn on_window_event(
        &mut self,
        event: WindowEvent,
        window: &Window,
        target: &EventLoopWindowTarget<()>,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                info!(reason = "window_close", "shutdown_requested");
                target.exit();
            }
            WindowEvent::Resized(size) => self.resize_or_exit(size.width, size.height, target),
            WindowEvent::ScaleFactorChanged { .. } => {
                let size = window.inner_size();
                self.resize_or_exit(size.width, size.height, target);
            }
            WindowEvent::KeyboardInput { event, .. } => {
                self.input.handle_keyboard_input(&event);
                if self.input.quit_requested {
                    info!(reason = "escape_key", "shutdown_requested");
                    target.exit();
                }
            }
            WindowEvent::Focused(false) => self.input.release_all(),
            WindowEvent::RedrawRequested => {
                if let Err(error) = self.frame() {
                    warn!(error = %error, "renderer_draw_failed");
                    target.exit();
                }
            }
            _ => {}
        }
    }

    fn resize_or_exit(&mut self, width: u32, height: u32, target: &EventLoopWindowTarget<()>) {
        if let Err(error) = self.renderer.resize(width, height) {
            warn!(error = %error, "renderer_resize_failed");
            target.exit();
        }
    }

    fn frame(&mut self) -> Result<(), PixelsError> {
        if !self.slow_frame_delay.is_zero() {
            thread::sleep(self.slow_frame_delay);
        }

        let now = Instant::now();
        let advance = self.clock.advance(now);
        for _ in 0..advance.ticks {
            self.step();
        }
        if !advance.dropped_backlog.is_zero() {
            self.metrics.record_clamp();
            warn!(
                dropped_backlog_ms = advance.dropped_backlog.as_millis() as u64,
                max_ticks_per_frame = self.clock.max_ticks_per_frame,
                "sim_clamp_triggered"
            );
        }

        self.pacer.wait_for_slot(Instant::now());
        self.renderer.render_world(self.scenes.active_world())?;
        self.pacer.presented(Instant::now());

        self.sync_title();
        self.metrics.record_frame(advance.raw_frame_dt);
        if let Some(snapshot) = self.metrics.maybe_snapshot(now) {
            info!(
                fps = snapshot.fps,
                tps = snapshot.tps,
                frame_time_ms = snapshot.frame_time_ms,
                worst_frame_ms = snapshot.worst_frame_ms,
                clamped_frames = snapshot.clamped_frames,
                sprite_count = self.scenes.active_world().sprite_count(),
                scene = ?self.scenes.active_scene(),
                "loop_metrics"
            );
        }
        Ok(())
    }

    fn step(&mut self) {
        let snapshot = self.input.snapshot_for_tick();
        let command = self
            .scenes
            .update_active(self.clock.fixed_dt.as_secs_f32(), &snapshot);
        if self.scenes.apply_command(command) {
            info!(
                scene = ?self.scenes.active_scene(),
                sprite_count = self.scenes.active_world().sprite_count(),
                "scene_switched"
            );
        }
        self.metrics.record_tick();
    }

    fn sync_title(&mut self) {
        let wanted = self.scenes.debug_title_active();
        if wanted == self.shown_title {
            return;
        }
        let title = wanted.as_deref().unwrap_or(&self.default_title);
        self.renderer.window().set_title(title);
        self.shown_title = wanted;
    }
}

/// Fixed-timestep accumulator. Wall time is clamped per frame and any
/// backlog past the tick budget is dropped instead of carried forward.
#[derive(Debug)]
struct FrameClock {
    fixed_dt: Duration,
    max_frame_delta: Duration,
    max_ticks_per_frame: u32,
    accumulator: Duration,
    last_frame: Instant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FrameAdvance {
    raw_frame_dt: Duration,
    ticks: u32,
    dropped_backlog: Duration,
}

impl FrameClock {
    fn new(target_tps: u32, max_frame_delta: Duration, max_ticks_per_frame: u32, now: Instant) -> Self {
        Self {
            fixed_dt: Duration::from_secs_f64(1.0 / f64::from(target_tps.max(1))),
            max_frame_delta: non_zero_or(max_frame_delta, FALLBACK_FRAME_DELTA),
            max_ticks_per_frame: max_ticks_per_frame.max(1),
            accumulator: Duration::ZERO,
            last_frame: now,
        }
    }

    fn advance(&mut self, now: Instant) -> FrameAdvance {
        let raw_frame_dt = now.saturating_duration_since(self.last_frame);
        self.last_frame = now;
        self.accumulator = self
            .accumulator
            .saturating_add(raw_frame_dt.min(self.max_frame_delta));

        let mut ticks = 0;
        while self.accumulator >= self.fixed_dt && ticks < self.max_ticks_per_frame {
            self.accumulator -= self.fixed_dt;
            ticks += 1;
        }
        let dropped_backlog = if self.accumulator >= self.fixed_dt {
            std::mem::take(&mut self.accumulator)
        } else {
            Duration::ZERO
        };

        FrameAdvance {
            raw_frame_dt,
            ticks,
            dropped_backlog,
        }
    }
}

/// Optional presentation cap. A cap of zero means uncapped.
#[derive(Debug)]
struct RenderPacer {
    frame_budget: Option<Duration>,
    last_present: Instant,
}

impl RenderPacer {
    fn new(max_render_fps: Option<u32>, now: Instant) -> Self {
        Self {
            frame_budget: max_render_fps
                .filter(|fps| *fps > 0)
                .map(|fps| Duration::from_secs_f64(1.0 / f64::from(fps))),
            last_present: now,
        }
    }

    fn sleep_needed(&self, now: Instant) -> Duration {
        let Some(budget) = self.frame_budget else {
            return Duration::ZERO;
        };
        budget.saturating_sub(now.saturating_duration_since(self.last_present))
    }

    fn wait_for_slot(&self, now: Instant) {
        let sleep = self.sleep_needed(now);
        if !sleep.is_zero() {
            thread::sleep(sleep);
        }
    }

    fn presented(&mut self, now: Instant) {
        self.last_present = now;
    }

    fn describe(&self) -> String {
        match self.frame_budget {
            Some(budget) => format!("{:.0}", 1.0 / budget.as_secs_f64()),
            None => "off".to_string(),
        }
    }
}

#[derive(Debug, Default)]
struct InputCollector {
    quit_requested: bool,
    action_states: ActionStates,
}

impl InputCollector {
    fn handle_keyboard_input(&mut self, key_event: &KeyEvent) {
        // Held-state polling ignores auto-repeat.
        if key_event.repeat {
            return;
        }
        self.apply_key(key_event.physical_key, key_event.state == ElementState::Pressed);
    }

    fn apply_key(&mut self, key: PhysicalKey, is_pressed: bool) {
        let Some(action) = action_for_key(key) else {
            return;
        };
        self.action_states.set(action, is_pressed);
        if action == InputAction::Quit && is_pressed {
            self.quit_requested = true;
        }
    }

    /// Focus loss swallows key-up events, so forget everything held.
    fn release_all(&mut self) {
        self.action_states = ActionStates::default();
    }

    fn snapshot_for_tick(&self) -> InputSnapshot {
        InputSnapshot::new(self.quit_requested, self.action_states)
    }
}

fn action_for_key(key: PhysicalKey) -> Option<InputAction> {
    let PhysicalKey::Code(code) = key else {
        return None;
    };
    let action = match code {
        KeyCode::ArrowLeft | KeyCode::KeyA => InputAction::MoveLeft,
        KeyCode::ArrowRight | KeyCode::KeyD => InputAction::MoveRight,
        KeyCode::ArrowUp | KeyCode::KeyW => InputAction::Jump,
        KeyCode::ArrowDown | KeyCode::KeyS => InputAction::Crouch,
        KeyCode::Space => InputAction::Fire,
        KeyCode::KeyR => InputAction::Reload,
        KeyCode::KeyP => InputAction::Pause,
        KeyCode::Escape => InputAction::Quit,
        _ => return None,
    };
    Some(action)
}

fn non_zero_or(value: Duration, fallback: Duration) -> Duration {
    if value.is_zero() {
        fallback
    } else {
        value
    }
}

fn slow_frame_delay_from_env(fallback_ms: u64) -> Duration {
    let fallback = Duration::from_millis(fallback_ms);
    match env::var(SLOW_FRAME_ENV_VAR) {
        Ok(raw) => raw.trim().parse::<u64>().map(Duration::from_millis).unwrap_or_else(|_| {
            warn!(env_var = SLOW_FRAME_ENV_VAR, value = raw.as_str(), "invalid_slow_frame_env_value");
            fallback
        }),
        Err(env::VarError::NotPresent) => fallback,
        Err(error) => {
            warn!(env_var = SLOW_FRAME_ENV_VAR, error = %error, "unreadable_slow_frame_env_value");
            fallback
        }
    }
}
