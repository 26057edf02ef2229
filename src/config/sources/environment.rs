//! Environment sources: `MESHFORGE__SECTION__KEY` overrides plus the well-known
//! `<PROVIDER>_API_KEY` variables.

use crate::provider::ProviderId;
use config::builder::DefaultState;
use config::ConfigBuilder;
use config::ConfigError;
use config::Environment;
use std::collections::HashMap;

pub const ENV_PREFIX: &str = "MESHFORGE";
pub const ENV_SEPARATOR: &str = "__";

/// Layer `vars` on top of the builder. Provider key variables win over everything else.
pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
    vars: &HashMap<String, String>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    let mut builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .prefix_separator(ENV_SEPARATOR)
            .separator(ENV_SEPARATOR)
            .try_parsing(true)
            .source(Some(vars.clone())),
    );

    for provider in ProviderId::ALL {
        if let Some(key) = vars
            .get(provider.api_key_env_var())
            .map(|key| key.trim())
            .filter(|key| !key.is_empty())
        {
            builder = builder.set_override(format!("providers.{}.api_key", provider), key)?;
        }
    }
    Ok(builder)
}
