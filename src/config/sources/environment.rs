//! Environment variable source: CENTIPEDE__ prefix with __ separator

use config::builder::DefaultState;
use config::ConfigBuilder;
use config::ConfigError;
use config::Environment;

/// Add environment variable overlay to builder.
///
/// `CENTIPEDE__LISTING__SORT_ENTRIES=false` sets `listing.sort_entries`. The
/// double underscore after the prefix keeps the `CENTIPEDE_LOG*` logging
/// overrides out of the config tree.
pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    let builder = builder.add_source(
        Environment::with_prefix("CENTIPEDE")
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true),
    );
    Ok(builder)
}
