//! CLI output: error mapping from domain errors to stable CLI surface.

use crate::error::ForgeError;

/// Map domain errors to a string for CLI output, with a next step where one exists.
pub fn map_error(e: &ForgeError) -> String {
    match e {
        ForgeError::NoCredentials | ForgeError::ProviderNotConfigured { .. } => format!(
            "{}\nSet a key with `meshforge configure --provider <name>` or the provider's *_API_KEY variable.",
            e
        ),
        ForgeError::Auth { provider, .. } => format!(
            "{}\nCheck the key with `meshforge configure --provider {}`.",
            e, provider
        ),
        _ => e.to_string(),
    }
}
