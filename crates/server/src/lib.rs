pub mod api;
pub mod config;
pub mod state;
pub mod utils;

use std::path::Path;

use library::Library;

use crate::config::{resolve_path, ServerConfig};

/// Library rooted at the configured media directory; a relative root is
/// taken relative to the config file.
pub fn library_from_config(config_path: &Path, config: &ServerConfig) -> Library {
    let root = resolve_path(config_path, &config.media_root);
    Library::with_catalog_file(root, &config.catalog_file_name)
}
