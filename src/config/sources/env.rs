//! Environment source: STATUSBAR__CONTEXTS__GLOBAL=false, STATUSBAR__LOGGING__LEVEL=debug

use config::builder::DefaultState;
use config::ConfigBuilder;
use config::Environment;

pub const ENV_PREFIX: &str = "STATUSBAR";

pub fn add_to_builder(builder: ConfigBuilder<DefaultState>) -> ConfigBuilder<DefaultState> {
    builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .separator("__")
            .try_parsing(true),
    )
}
