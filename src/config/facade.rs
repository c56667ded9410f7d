//! Loader facade: assembles the layered sources into a `BaycutConfig`.

use super::merge::merge_policy::builder_with_defaults;
use super::sources::{global_file, workspace_file};
use super::BaycutConfig;
use config::{Environment, File};
use std::path::Path;

/// Loads configuration from the standard source stack.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Defaults, global file, workspace files, then `BAYCUT__` variables
    /// (`BAYCUT__STORE__PAGE_SIZE=100` sets `store.page_size`).
    pub fn load(workspace_root: &Path) -> Result<BaycutConfig, config::ConfigError> {
        let builder = builder_with_defaults()?;
        let builder = global_file::add_to_builder(builder)?;
        let builder = workspace_file::add_to_builder(builder, workspace_root)?;
        builder
            .add_source(
                Environment::with_prefix("BAYCUT")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    /// Defaults overlaid with a single file.
    pub fn load_from_file(path: &Path) -> Result<BaycutConfig, config::ConfigError> {
        builder_with_defaults()?
            .add_source(File::from(path))
            .build()?
            .try_deserialize()
    }

    /// Built-in defaults only.
    pub fn default() -> BaycutConfig {
        BaycutConfig::default()
    }
}
