//! Character and product detail payloads.

use serde::Deserialize;
use serde_json::Value;

/// Response of the primary-character endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PrimaryCharacter {
    /// Identifier of the character exports are rendered on.
    #[serde(default)]
    pub primary_character_id: Option<String>,
    /// Display name of that character.
    #[serde(default)]
    pub primary_character_name: Option<String>,
}

/// Product detail for one motion, rendered on a given character.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductDetails {
    /// Product type as the export endpoint expects it.
    #[serde(default, rename = "type")]
    pub product_type: Option<String>,
    /// Detail block holding the processing hash.
    #[serde(default)]
    pub details: Option<Value>,
}

impl ProductDetails {
    /// Returns the raw `details.gms_hash` block, if present.
    #[must_use]
    pub fn hash_block(&self) -> Option<&Value> {
        self.details.as_ref().and_then(|details| details.get("gms_hash"))
    }
}
