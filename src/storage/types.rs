use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A raw stored key-value pair with its last write time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredEntry {
    /// Storage key, e.g. `bella_user_preferences`
    pub key: String,
    /// JSON-encoded value
    pub value: String,
    /// When the value was last written
    pub updated_at: DateTime<Utc>,
}
