use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{json, Map, Value};

/// Decorative item categories that occupy character ranges of the message
/// text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Mentions,
    Emoticons,
    Links,
    Tags,
}

/// Indexing order. On an offset collision the later category wins.
pub const REPLACEABLE_CATEGORIES: [Category; 4] = [
    Category::Mentions,
    Category::Emoticons,
    Category::Links,
    Category::Tags,
];

impl Category {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Mentions => "mentions",
            Self::Emoticons => "emoticons",
            Self::Links => "links",
            Self::Tags => "tags",
        }
    }
}

/// The replaceable item that starts at a given text offset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexedItem {
    pub item: Value,
    #[serde(rename = "type")]
    pub category: Category,
}

impl IndexedItem {
    pub fn to_value(&self) -> Value {
        json!({ "item": self.item, "type": self.category.as_str() })
    }
}

/// Character offset to the item starting there.
pub type ReplaceIndex = BTreeMap<u64, IndexedItem>;

/// Index every positioned mention, emoticon, link and tag of a decoded
/// message by the character offsets it occupies.
///
/// Items without `positions` and offsets that are not non-negative integers
/// are skipped. Later items overwrite earlier ones at the same offset.
pub fn build_index(fields: &Map<String, Value>) -> ReplaceIndex {
    let mut index = ReplaceIndex::new();

    for category in REPLACEABLE_CATEGORIES {
        let Some(items) = fields.get(category.as_str()).and_then(Value::as_array) else {
            continue;
        };
        for item in items {
            let Some(positions) = item.get("positions").and_then(Value::as_array) else {
                continue;
            };
            for offset in positions.iter().filter_map(Value::as_u64) {
                index.insert(
                    offset,
                    IndexedItem {
                        item: item.clone(),
                        category,
                    },
                );
            }
        }
    }

    index
}
