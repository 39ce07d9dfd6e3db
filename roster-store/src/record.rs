//! Student record model
//!
//! A record is a store-assigned id plus a schema-less field map. Nothing is
//! validated: whatever object the client submitted is what gets stored.

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::{Map, Value};

/// Schema-less document payload
pub type Fields = Map<String, Value>;

/// Field name reserved for the store-assigned identifier on the wire
pub const ID_FIELD: &str = "id";

/// A stored document with its identifier
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub id: String,
    pub fields: Fields,
}

impl Record {
    pub fn new(id: impl Into<String>, fields: Fields) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }
}

/// Serializes as `{ "id": ..., ...fields }`.
///
/// The store id always wins: a payload key named `id` is not emitted.
impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let shadowed = usize::from(self.fields.contains_key(ID_FIELD));
        let mut map = serializer.serialize_map(Some(self.fields.len() + 1 - shadowed))?;
        map.serialize_entry(ID_FIELD, &self.id)?;
        for (key, value) in &self.fields {
            if key != ID_FIELD {
                map.serialize_entry(key, value)?;
            }
        }
        map.end()
    }
}
