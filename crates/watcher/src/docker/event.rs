//! Event domain — one record from the daemon's `/events` feed.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// A single decoded engine event.
///
/// Only `status` is understood here; it is the field whose emptiness marks
/// a clean end of stream. Everything else the daemon sends is carried
/// through untouched in `fields`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Event {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub status: String,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Event {
    pub fn new(status: impl Into<String>) -> Self {
        Self {
            status: status.into(),
            fields: Map::new(),
        }
    }

    /// An event with no status is the daemon's way of saying the stream is done.
    pub fn is_end_of_stream(&self) -> bool {
        self.status.is_empty()
    }

    /// Look up a daemon-defined member by name.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}
