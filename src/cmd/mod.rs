//! Command module structure for lintrun CLI

use anyhow::Result;
use std::path::PathBuf;

use lintrun::config::Config;
use lintrun::paths::PROJECT_CONFIG;

use crate::GlobalArgs;

pub mod config;
pub mod run;

/// Resolve the configuration for this invocation.
///
/// An explicit `--config` file must exist. Otherwise the project config is
/// looked up under `--dir` (or the current directory) and may be absent.
pub fn load_config(global: &GlobalArgs) -> Result<Config> {
    let config = match &global.config {
        Some(path) => Config::load_with_project(path)?,
        None => {
            let project_path = match &global.dir {
                Some(dir) => dir.join(PROJECT_CONFIG),
                None => PathBuf::from(PROJECT_CONFIG),
            };
            Config::load_merged_from(
                lintrun::config::global_config_path().as_deref(),
                &project_path,
            )?
        }
    };

    config.apply_overrides(&global.overrides())
}
