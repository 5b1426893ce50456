use std::fmt;

use serde::{Deserialize, Serialize};

/// Caller identity sent with every API call.
///
/// The client never interprets these values; they are copied verbatim into
/// each request body.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    /// Entity identifier, usually an email address.
    pub entity: String,
    /// Entity password.
    pub entity_password: String,
    /// Entity type code (0 = email address).
    #[serde(default)]
    pub entity_type: i32,
}

impl Credential {
    pub fn new(entity: impl Into<String>, entity_password: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            entity_password: entity_password.into(),
            entity_type: 0,
        }
    }

    pub fn with_entity_type(mut self, entity_type: i32) -> Self {
        self.entity_type = entity_type;
        self
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("entity", &self.entity)
            .field("entity_password", &"<redacted>")
            .field("entity_type", &self.entity_type)
            .finish()
    }
}
