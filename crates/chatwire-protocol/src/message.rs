use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::{Map, Value};

use crate::index::{build_index, ReplaceIndex};

/// Key under which the replaceable-item index is attached.
pub const INDEX_FIELD: &str = "_index";

/// A fully hydrated chat message.
///
/// Owns its decoded fields and the offset index derived from them; nothing
/// points back into the manifest it was decoded with.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    fields: Map<String, Value>,
    index: ReplaceIndex,
}

impl Message {
    /// Wrap decoded fields, building a fresh replaceable-item index.
    pub fn from_fields(fields: Map<String, Value>) -> Self {
        let index = build_index(&fields);
        Self { fields, index }
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn index(&self) -> &ReplaceIndex {
        &self.index
    }

    pub fn into_parts(self) -> (Map<String, Value>, ReplaceIndex) {
        (self.fields, self.index)
    }

    /// The message as one JSON object with the index under `_index`.
    ///
    /// A decoded field that happens to be named `_index` is replaced.
    pub fn into_value(self) -> Value {
        let index = self
            .index
            .iter()
            .map(|(offset, entry)| (offset.to_string(), entry.to_value()))
            .collect();

        let mut fields = self.fields;
        fields.insert(INDEX_FIELD.to_owned(), Value::Object(index));
        Value::Object(fields)
    }
}

impl Serialize for Message {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let shadowed = usize::from(self.fields.contains_key(INDEX_FIELD));
        let mut map = serializer.serialize_map(Some(self.fields.len() - shadowed + 1))?;
        for (name, value) in self.fields.iter().filter(|(name, _)| *name != INDEX_FIELD) {
            map.serialize_entry(name, value)?;
        }
        map.serialize_entry(INDEX_FIELD, &self.index)?;
        map.end()
    }
}
