use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub mod app;
pub mod content;
pub mod physics;

pub use app::{
    run_app, AppError, Banner, Camera2D, EntityId, EntityIdAllocator, Hud, InputAction,
    InputSnapshot, KeyLocker, LoopConfig, Renderer, Scene, SceneCommand, SceneKey, SceneWorld,
    Sprite, SpriteKind, Viewport,
};
pub use content::{read_json_document, read_optional_json_document, ContentError};

/// Overrides project root discovery.
pub const ROOT_ENV_VAR: &str = "PLATFORMER_ROOT";

/// Directories the game reads content from, anchored at the project root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppPaths {
    pub root: PathBuf,
    pub base_content_dir: PathBuf,
}

impl AppPaths {
    fn under(root: PathBuf) -> Self {
        let base_content_dir = root.join("assets").join("base");
        Self {
            root,
            base_content_dir,
        }
    }
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("cannot locate the running executable: {0}")]
    CurrentExe(#[source] std::io::Error),
    #[error("{var} points at {path}, which is not a project root (needs Cargo.toml plus assets/ or crates/)")]
    InvalidEnvRoot { var: &'static str, path: PathBuf },
    #[error("no project root above {start_dir}; set {var} to the directory holding Cargo.toml and assets/")]
    RootNotFound {
        start_dir: PathBuf,
        var: &'static str,
    },
}

/// `PLATFORMER_ROOT` when set, else the nearest ancestor of the executable
/// that looks like the project checkout.
pub fn resolve_app_paths() -> Result<AppPaths, StartupError> {
    let root = match env::var_os(ROOT_ENV_VAR) {
        Some(raw) if !raw.is_empty() => {
            let path = canonical_or_raw(Path::new(&raw));
            if !looks_like_root(&path) {
                return Err(StartupError::InvalidEnvRoot {
                    var: ROOT_ENV_VAR,
                    path,
                });
            }
            path
        }
        Some(_) | None => {
            let exe = env::current_exe().map_err(StartupError::CurrentExe)?;
            let start_dir = exe.parent().unwrap_or(exe.as_path());
            find_root_upward(start_dir).ok_or_else(|| StartupError::RootNotFound {
                start_dir: canonical_or_raw(start_dir),
                var: ROOT_ENV_VAR,
            })?
        }
    };
    Ok(AppPaths::under(root))
}

fn find_root_upward(start_dir: &Path) -> Option<PathBuf> {
    start_dir
        .ancestors()
        .find(|candidate| looks_like_root(candidate))
        .map(canonical_or_raw)
}

fn looks_like_root(path: &Path) -> bool {
    path.join("Cargo.toml").is_file()
        && (path.join("assets").is_dir() || path.join("crates").is_dir())
}

fn canonical_or_raw(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
