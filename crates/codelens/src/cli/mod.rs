//! CLI command implementations.

mod display;

pub mod blame;
pub mod lenses;

use std::path::Path;

use codelens::{LensConfig, SourceFile};

/// Load `explicit` if given, otherwise the configuration nearest to `file`.
async fn load_config(file: &SourceFile, explicit: Option<&Path>) -> codelens::Result<LensConfig> {
    match explicit {
        Some(path) => LensConfig::load(path).await,
        None => LensConfig::discover(file.directory()).await,
    }
}
