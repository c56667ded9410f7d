//! Merge rules: the built-in defaults form the bottom layer.

use crate::config::BaycutConfig;
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError};

/// Builder seeded with `BaycutConfig::default()` serialized as a source.
///
/// Later sources override it key by key; tables are merged, not replaced,
/// so a file that sets only `generation.tolerance` keeps every other default.
pub fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    let defaults = Config::try_from(&BaycutConfig::default())?;
    Ok(Config::builder().add_source(defaults))
}
