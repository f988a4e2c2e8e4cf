//! Client directory entries.

use serde::{Deserialize, Serialize};

/// One entry of the client directory: display name plus the key the portal
/// uses to address the customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientKey {
    /// Client display name; statements are keyed by it.
    pub name: String,

    /// Opaque customer identifier on the portal.
    pub portal_key: String,
}

impl ClientKey {
    pub fn new(name: impl Into<String>, portal_key: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            portal_key: portal_key.into(),
        }
    }
}
