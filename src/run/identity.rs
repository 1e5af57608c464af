//! Resolution of the acting character.

use thiserror::Error;
use tracing::{info, instrument};

use crate::api::{PrimaryCharacter, paths};
use crate::gateway::{ApiClient, ApiError};

/// Errors that abort a whole run.
#[derive(Debug, Error)]
pub enum RunError {
    /// The primary character could not be resolved; no export can succeed.
    #[error("cannot resolve the primary character: {reason}")]
    IdentityUnavailable {
        /// What went wrong.
        reason: String,
        /// The gateway error, when the request itself failed.
        #[source]
        source: Option<ApiError>,
    },
}

/// The character exports are rendered on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Character {
    /// Character identifier.
    pub id: String,
    /// Display name; the id when the server sends none.
    pub name: String,
}

/// Fetches the user's primary character.
///
/// # Errors
///
/// Returns [`RunError::IdentityUnavailable`] on transport failure, non-success
/// status, malformed body, or a response without an id.
#[instrument(skip(client))]
pub async fn resolve_primary_character(client: &ApiClient) -> Result<Character, RunError> {
    let response: PrimaryCharacter = client
        .get_json(paths::PRIMARY_CHARACTER, &[])
        .await
        .map_err(|source| RunError::IdentityUnavailable {
            reason: source.to_string(),
            source: Some(source),
        })?;

    let id = response
        .primary_character_id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| RunError::IdentityUnavailable {
            reason: "response has no primary_character_id".to_string(),
            source: None,
        })?;
    let name = response
        .primary_character_name
        .filter(|name| !name.trim().is_empty())
        .unwrap_or_else(|| id.clone());

    info!(character_id = %id, character_name = %name, "resolved primary character");
    Ok(Character { id, name })
}
