//! Local file browser and editor.
//!
//! Serves an embedded single-page app, the raw contents of a root directory,
//! and a small list/read/store API over that directory. The crate is used by
//! the `pendulum` binary and can be embedded in another application through
//! [`routes::app`].

pub mod assets;
pub mod config;
pub mod contents;
pub mod error;
pub mod handlers;
pub mod paths;
pub mod routes;

use std::path::PathBuf;
use std::sync::Arc;

pub use assets::{AssetBundle, EmbeddedBundle};
pub use config::Config;
pub use error::PendulumError;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Root directory all contents and API operations are scoped to
    pub root_dir: PathBuf,
    /// Configuration
    pub config: Arc<Config>,
    /// Bundle backing the single-page app
    pub assets: Arc<dyn AssetBundle>,
}

impl AppState {
    /// Create a new AppState with the given root directory, default config
    /// and the embedded front end.
    pub fn new(root_dir: PathBuf) -> Self {
        Self::with_config(root_dir, Config::default())
    }

    /// Create a new AppState with the given root directory and config.
    pub fn with_config(root_dir: PathBuf, config: Config) -> Self {
        Self {
            root_dir,
            config: Arc::new(config),
            assets: Arc::new(EmbeddedBundle),
        }
    }

    /// Replace the asset bundle, e.g. with an in-memory one.
    pub fn with_assets(mut self, assets: Arc<dyn AssetBundle>) -> Self {
        self.assets = assets;
        self
    }
}
