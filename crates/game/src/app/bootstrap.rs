use engine::physics::TilemapError;
use engine::{resolve_app_paths, LoopConfig, Scene, StartupError};
use thiserror::Error;
use tracing::info;
use tracing_subscriber::EnvFilter;

use super::gameplay;
use super::gameplay::archetypes::{archetypes_path, load_archetypes, ArchetypeError};

#[derive(Debug, Error)]
pub(crate) enum BootstrapError {
    #[error(transparent)]
    Startup(#[from] StartupError),
    #[error(transparent)]
    Archetypes(#[from] ArchetypeError),
    #[error("level layout is invalid: {0}")]
    Layout(#[from] TilemapError),
}

pub(crate) struct AppWiring {
    pub(crate) config: LoopConfig,
    pub(crate) menu: Box<dyn Scene>,
    pub(crate) level: Box<dyn Scene>,
}

pub(crate) fn build_app() -> Result<AppWiring, BootstrapError> {
    init_tracing();
    info!("=== Platformer Startup ===");

    let paths = resolve_app_paths()?;
    info!(root = %paths.root.display(), "app_paths_resolved");

    let archetypes = load_archetypes(&archetypes_path(&paths))?;
    let layout = gameplay::map1::layout()?;
    info!(
        columns = layout.tilemap.width(),
        rows = layout.tilemap.height(),
        waves = layout.waves.len(),
        "level_layout_built"
    );

    let (menu, level) = gameplay::build_scenes(layout, archetypes);
    Ok(AppWiring {
        config: LoopConfig {
            window_title: format!("Platformer {}", env!("CARGO_PKG_VERSION")),
            ..LoopConfig::default()
        },
        menu,
        level,
    })
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}
