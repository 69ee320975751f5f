use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::ManifestError;
use crate::template::{TemplateTable, Templates};

/// Manifest version selected when the caller does not ask for one.
pub const DEFAULT_MANIFEST_VERSION: &str = "v2";

/// Server-supplied parser manifests for one chat room.
///
/// Obtained once per room and shared read-only by every decode in that room.
#[derive(Debug, Clone, Deserialize)]
#[serde(try_from = "RawDocument")]
pub struct ManifestDocument {
    manifests: BTreeMap<String, Arc<Manifest>>,
    url_templates: TemplateTable,
    url_template_types: BTreeMap<String, TemplateTable>,
}

/// Wire shape of the manifest document, before entry validation.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawDocument {
    manifests: BTreeMap<String, Map<String, Value>>,
    #[serde(default)]
    url_templates: TemplateTable,
    #[serde(default)]
    url_template_types: BTreeMap<String, TemplateTable>,
}

impl TryFrom<RawDocument> for ManifestDocument {
    type Error = ManifestError;

    fn try_from(raw: RawDocument) -> Result<Self, Self::Error> {
        let manifests = raw
            .manifests
            .iter()
            .map(|(version, entries)| {
                let manifest = Manifest::from_map(entries)?;
                Ok((version.clone(), Arc::new(manifest)))
            })
            .collect::<Result<_, ManifestError>>()?;

        Ok(Self {
            manifests,
            url_templates: raw.url_templates,
            url_template_types: raw.url_template_types,
        })
    }
}

impl ManifestDocument {
    pub fn from_value(value: Value) -> Result<Self, ManifestError> {
        serde_json::from_value::<RawDocument>(value)?.try_into()
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, ManifestError> {
        serde_json::from_slice::<RawDocument>(bytes)?.try_into()
    }

    /// The top-level manifest for a schema version, if the server sent one.
    pub fn manifest(&self, version: &str) -> Option<&Arc<Manifest>> {
        self.manifests.get(version)
    }

    pub fn versions(&self) -> impl Iterator<Item = &str> {
        self.manifests.keys().map(String::as_str)
    }

    pub fn url_templates(&self) -> &TemplateTable {
        &self.url_templates
    }

    pub fn url_template_types(&self) -> &BTreeMap<String, TemplateTable> {
        &self.url_template_types
    }

    pub fn templates(&self) -> Templates<'_> {
        Templates::new(&self.url_templates, &self.url_template_types)
    }
}

impl FromStr for ManifestDocument {
    type Err = ManifestError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        serde_json::from_str::<RawDocument>(text)?.try_into()
    }
}

/// One level of a parser manifest: field name to entry, in wire order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Manifest {
    entries: Vec<(String, ManifestEntry)>,
}

impl Manifest {
    /// Build a manifest level from its JSON object form, validating every
    /// entry (and every nested level) along the way.
    pub fn from_map(map: &Map<String, Value>) -> Result<Self, ManifestError> {
        let entries = map
            .iter()
            .map(|(name, raw)| Ok((name.clone(), ManifestEntry::from_value(name, raw)?)))
            .collect::<Result<_, ManifestError>>()?;
        Ok(Self { entries })
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ManifestEntry)> {
        self.entries.iter().map(|(name, entry)| (name.as_str(), entry))
    }

    pub fn get(&self, name: &str) -> Option<&ManifestEntry> {
        self.entries
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, entry)| entry)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// How a single field is laid out in the raw message.
#[derive(Debug, Clone, PartialEq)]
pub struct ManifestEntry {
    /// Position of the field's raw value in the enclosing part.
    /// Always present for known kinds; unknown kinds may omit it.
    pub index: Option<usize>,
    pub kind: FieldKind,
}

/// Semantic type of a manifest field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    /// Copied verbatim from the raw part.
    Scalar(ScalarKind),
    /// Sub-indices into the raw slot for the template key, the template
    /// variables and the multiple-representations flag.
    UrlTemplate {
        key: usize,
        vars: usize,
        has_multiple_types: usize,
    },
    /// Sub-index of the template key inside each raw item.
    UrlTemplates { key: usize },
    NestedObject(Manifest),
    NestedArray(Manifest),
    /// A type this decoder does not know; the field is skipped.
    Unknown(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarKind {
    Int,
    String,
    StringArray,
    IntArray,
    Url,
}

impl ScalarKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Int => "int",
            Self::String => "string",
            Self::StringArray => "stringArray",
            Self::IntArray => "intArray",
            Self::Url => "url",
        }
    }
}

impl FieldKind {
    /// The manifest `type` string this kind was parsed from.
    pub fn type_name(&self) -> &str {
        match self {
            Self::Scalar(scalar) => scalar.as_str(),
            Self::UrlTemplate { .. } => "urlTemplate",
            Self::UrlTemplates { .. } => "urlTemplates",
            Self::NestedObject(_) => "nestedObject",
            Self::NestedArray(_) => "nestedArray",
            Self::Unknown(name) => name,
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawEntry {
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    index: Option<usize>,
    #[serde(default)]
    nested_items: Option<Value>,
}

impl ManifestEntry {
    fn from_value(name: &str, value: &Value) -> Result<Self, ManifestError> {
        let invalid = |reason: String| ManifestError::InvalidEntry {
            field: name.to_owned(),
            reason,
        };

        let raw = RawEntry::deserialize(value).map_err(|e| invalid(e.to_string()))?;
        let type_name = raw.kind.unwrap_or_default();

        let scalar = match type_name.as_str() {
            "int" => Some(ScalarKind::Int),
            "string" => Some(ScalarKind::String),
            "stringArray" => Some(ScalarKind::StringArray),
            "intArray" => Some(ScalarKind::IntArray),
            "url" => Some(ScalarKind::Url),
            _ => None,
        };
        let known = scalar.is_some()
            || matches!(
                type_name.as_str(),
                "urlTemplate" | "urlTemplates" | "nestedObject" | "nestedArray"
            );
        if !known {
            return Ok(Self {
                index: raw.index,
                kind: FieldKind::Unknown(type_name),
            });
        }

        let index = raw
            .index
            .ok_or_else(|| invalid(format!("{type_name} entry has no index")))?;
        let nested = || {
            raw.nested_items
                .as_ref()
                .and_then(Value::as_object)
                .ok_or_else(|| invalid(format!("{type_name} entry has no nestedItems object")))
        };
        let sub_index = |items: &Map<String, Value>, sub: &str| {
            items
                .get(sub)
                .and_then(|item| item.get("index"))
                .and_then(Value::as_u64)
                .and_then(|i| usize::try_from(i).ok())
                .ok_or_else(|| invalid(format!("nestedItems.{sub}.index is missing")))
        };

        let kind = match (scalar, type_name.as_str()) {
            (Some(scalar), _) => FieldKind::Scalar(scalar),
            (None, "urlTemplate") => {
                let items = nested()?;
                FieldKind::UrlTemplate {
                    key: sub_index(items, "key")?,
                    vars: sub_index(items, "vars")?,
                    has_multiple_types: sub_index(items, "hasMultipleTypes")?,
                }
            }
            (None, "urlTemplates") => FieldKind::UrlTemplates {
                key: sub_index(nested()?, "key")?,
            },
            (None, "nestedObject") => {
                FieldKind::NestedObject(nested_manifest(name, nested()?)?)
            }
            _ => FieldKind::NestedArray(nested_manifest(name, nested()?)?),
        };

        Ok(Self {
            index: Some(index),
            kind,
        })
    }
}

/// Parse a nested level, qualifying error paths with the parent field name.
fn nested_manifest(parent: &str, items: &Map<String, Value>) -> Result<Manifest, ManifestError> {
    Manifest::from_map(items).map_err(|e| match e {
        ManifestError::InvalidEntry { field, reason } => ManifestError::InvalidEntry {
            field: format!("{parent}.{field}"),
            reason,
        },
        other => other,
    })
}
