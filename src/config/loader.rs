//! Config loading facade.

use std::path::Path;

use config::File;
use tracing::debug;

use crate::config::merge::merge_policy;
use crate::config::sources::{env, global_file};
use crate::config::StatusBarConfig;
use crate::error::ApiError;

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load with full precedence: defaults, global file, `explicit`, environment.
    pub fn load(explicit: Option<&Path>) -> Result<StatusBarConfig, ApiError> {
        let mut builder = global_file::add_to_builder(merge_policy::builder_with_defaults()?)?;
        if let Some(path) = explicit {
            builder = builder.add_source(File::from(path).required(true));
        }
        let builder = env::add_to_builder(builder);

        let config: StatusBarConfig = builder.build()?.try_deserialize()?;
        Self::validated(config)
    }

    /// Load defaults plus a single file, ignoring the global file and environment.
    pub fn load_from_file(path: &Path) -> Result<StatusBarConfig, ApiError> {
        let config: StatusBarConfig = merge_policy::builder_with_defaults()?
            .add_source(File::from(path).required(true))
            .build()?
            .try_deserialize()?;
        Self::validated(config)
    }

    pub fn default() -> StatusBarConfig {
        StatusBarConfig::default()
    }

    fn validated(config: StatusBarConfig) -> Result<StatusBarConfig, ApiError> {
        config.validate().map_err(|errors| {
            let error_msgs: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            ApiError::ConfigError(format!(
                "Configuration validation failed:\n{}",
                error_msgs.join("\n")
            ))
        })?;
        debug!(
            contexts = config.contexts.focus.len(),
            overrides = config.items.len(),
            "Configuration loaded"
        );
        Ok(config)
    }
}
