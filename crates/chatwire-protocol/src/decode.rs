//! Schema-interpreting tree walk over positional message parts.
//!
//! Each manifest level is decoded into a freshly built JSON object. Nothing
//! here fails: a field that cannot be produced is either left out or set to
//! `null`, so a manifest that has moved ahead of the decoder still yields the
//! fields it understands.

use serde_json::{json, Map, Value};

use crate::manifest::{FieldKind, Manifest, ManifestEntry};
use crate::template::{template_key, Templates};

/// Decode one manifest level against its raw part.
///
/// Every declared field whose value can be produced is written, in manifest
/// order. Fields are independent of each other.
pub fn decode_level(
    part: &[Value],
    manifest: &Manifest,
    templates: &Templates<'_>,
) -> Map<String, Value> {
    let mut target = Map::with_capacity(manifest.len());
    for (name, entry) in manifest.iter() {
        if let Some(value) = decode_field(entry, part, templates) {
            target.insert(name.to_owned(), value);
        } else {
            tracing::trace!(field = name, kind = entry.kind.type_name(), "field absent");
        }
    }
    target
}

/// Produce the value of a single field, or `None` when the field should be
/// left out of the decoded object.
pub fn decode_field(
    entry: &ManifestEntry,
    part: &[Value],
    templates: &Templates<'_>,
) -> Option<Value> {
    let raw = entry.index.and_then(|index| part.get(index));

    match &entry.kind {
        FieldKind::Scalar(_) => raw.cloned(),
        FieldKind::UrlTemplate {
            key,
            vars,
            has_multiple_types,
        } => raw.map(|raw| match raw.as_array() {
            Some(slot) => decode_url_template(slot, *key, *vars, *has_multiple_types, templates),
            None => Value::Null,
        }),
        FieldKind::UrlTemplates { key } => raw.map(|raw| {
            let items = raw.as_array().map_or(&[][..], Vec::as_slice);
            decode_url_templates(items, *key, templates)
        }),
        FieldKind::NestedObject(nested) => Some(decode_nested_object(raw, nested, templates)),
        FieldKind::NestedArray(nested) => {
            raw.map(|raw| decode_nested_array(raw, nested, templates))
        }
        FieldKind::Unknown(_) => None,
    }
}

fn decode_url_template(
    slot: &[Value],
    key_at: usize,
    vars_at: usize,
    multi_at: usize,
    templates: &Templates<'_>,
) -> Value {
    let Some(key) = slot.get(key_at).and_then(template_key) else {
        return Value::Null;
    };
    let vars = slot
        .get(vars_at)
        .and_then(Value::as_array)
        .map_or(&[][..], Vec::as_slice);

    if slot.get(multi_at).is_some_and(is_truthy) {
        templates
            .resolve_typed(&key, vars)
            .map_or(Value::Null, Value::Object)
    } else {
        templates.resolve(&key, vars).map_or(Value::Null, Value::String)
    }
}

fn decode_url_templates(items: &[Value], key_at: usize, templates: &Templates<'_>) -> Value {
    let mut produced: Vec<Value> = Vec::with_capacity(items.len());

    for (position, item) in items.iter().enumerate() {
        let Some(raw_key) = item.as_array().and_then(|item| item.get(key_at)) else {
            continue;
        };
        let Some(key) = template_key(raw_key) else {
            continue;
        };

        // Known quirk: variables are read from the output slot at the same
        // position, which has not been written yet, so these templates always
        // resolve without variables.
        let vars = produced
            .get(position)
            .and_then(Value::as_array)
            .map_or(&[][..], Vec::as_slice);

        if let Some(url) = templates.resolve(&key, vars) {
            produced.push(json!({ "key": raw_key, "urlTemplate": url }));
        }
    }

    Value::Array(produced)
}

fn decode_nested_object(
    raw: Option<&Value>,
    nested: &Manifest,
    templates: &Templates<'_>,
) -> Value {
    match raw {
        Some(Value::Array(sub_part)) => Value::Object(decode_level(sub_part, nested, templates)),
        Some(other) if is_truthy(other) => {
            tracing::trace!(found = value_kind(other), "nested object is not a sequence");
            Value::Object(decode_level(&[], nested, templates))
        }
        _ => Value::Null,
    }
}

fn decode_nested_array(raw: &Value, nested: &Manifest, templates: &Templates<'_>) -> Value {
    let Some(items) = raw.as_array() else {
        return Value::Array(Vec::new());
    };

    items
        .iter()
        .map(|item| {
            let sub_part = item.as_array().map_or(&[][..], Vec::as_slice);
            Value::Object(decode_level(sub_part, nested, templates))
        })
        .collect()
}

/// Wire truthiness: `null`, `false`, `0` and `""` are false.
pub(crate) fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n.abs() > 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

pub(crate) fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::template::TemplateTable;

    fn manifest(value: Value) -> Manifest {
        Manifest::from_map(value.as_object().unwrap()).unwrap()
    }

    fn decode(m: &Manifest, part: &Value, primary: &TemplateTable) -> Map<String, Value> {
        let typed = BTreeMap::new();
        decode_level(part.as_array().unwrap(), m, &Templates::new(primary, &typed))
    }

    #[test]
    fn writes_exactly_the_declared_keys() {
        let m = manifest(json!({
            "text": { "type": "string", "index": 0 },
            "count": { "type": "int", "index": 1 },
            "tags": { "type": "stringArray", "index": 2 },
            "link": { "type": "url", "index": 3 },
            "positions": { "type": "intArray", "index": 4 }
        }));
        let part = json!(["hi", 3, ["a"], "http://l", [1, 2], "extra"]);

        let out = decode(&m, &part, &TemplateTable::new());
        let keys: Vec<_> = out.keys().map(String::as_str).collect();
        assert_eq!(keys, ["text", "count", "tags", "link", "positions"]);
        assert_eq!(out["positions"], json!([1, 2]));
    }

    #[test]
    fn out_of_range_scalar_is_absent() {
        let m = manifest(json!({
            "text": { "type": "string", "index": 0 },
            "late": { "type": "int", "index": 9 }
        }));
        let out = decode(&m, &json!(["hello"]), &TemplateTable::new());
        assert_eq!(Value::Object(out), json!({ "text": "hello" }));
    }

    #[test]
    fn null_in_range_is_kept() {
        let m = manifest(json!({ "text": { "type": "string", "index": 0 } }));
        let out = decode(&m, &json!([null]), &TemplateTable::new());
        assert_eq!(out["text"], Value::Null);
    }

    #[test]
    fn unknown_type_is_skipped() {
        let m = manifest(json!({
            "text": { "type": "string", "index": 0 },
            "hologram": { "type": "hologram", "index": 1 }
        }));
        let out = decode(&m, &json!(["hi", "ignored"]), &TemplateTable::new());
        assert!(!out.contains_key("hologram"));
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn nested_object_null_slot() {
        let m = manifest(json!({
            "actor": {
                "type": "nestedObject",
                "index": 0,
                "nestedItems": { "slug": { "type": "string", "index": 0 } }
            }
        }));
        assert_eq!(decode(&m, &json!([null]), &TemplateTable::new())["actor"], Value::Null);
        assert_eq!(decode(&m, &json!([0]), &TemplateTable::new())["actor"], Value::Null);
        assert_eq!(decode(&m, &json!([]), &TemplateTable::new())["actor"], Value::Null);
        assert_eq!(
            decode(&m, &json!([["bob"]]), &TemplateTable::new())["actor"],
            json!({ "slug": "bob" })
        );
    }

    #[test]
    fn nested_object_truthy_non_sequence_is_empty_object() {
        let m = manifest(json!({
            "actor": {
                "type": "nestedObject",
                "index": 0,
                "nestedItems": { "slug": { "type": "string", "index": 0 } }
            }
        }));
        for raw in [json!(5), json!("bob"), json!({ "x": 1 }), json!(true)] {
            let out = decode(&m, &json!([raw.clone()]), &TemplateTable::new());
            assert_eq!(out["actor"], json!({}), "actor from {raw}");
        }
    }

    #[test]
    fn nested_object_inner_fields_follow_sequence_rules() {
        let m = manifest(json!({
            "actor": {
                "type": "nestedObject",
                "index": 0,
                "nestedItems": {
                    "slug": { "type": "string", "index": 0 },
                    "badges": {
                        "type": "nestedArray",
                        "index": 1,
                        "nestedItems": { "name": { "type": "string", "index": 0 } }
                    }
                }
            }
        }));
        assert_eq!(
            decode(&m, &json!([["bob", null]]), &TemplateTable::new())["actor"],
            json!({ "slug": "bob", "badges": [] })
        );
    }

    #[test]
    fn nested_array_decodes_each_item_independently() {
        let m = manifest(json!({
            "emoticons": {
                "type": "nestedArray",
                "index": 0,
                "nestedItems": {
                    "code": { "type": "string", "index": 0 },
                    "positions": { "type": "intArray", "index": 1 }
                }
            }
        }));
        let out = decode(&m, &json!([[[":)", [0]], [":(", [4, 9]]]]), &TemplateTable::new());
        assert_eq!(
            out["emoticons"],
            json!([
                { "code": ":)", "positions": [0] },
                { "code": ":(", "positions": [4, 9] }
            ])
        );
    }

    #[test]
    fn nested_array_tolerates_null_and_odd_items() {
        let m = manifest(json!({
            "links": {
                "type": "nestedArray",
                "index": 0,
                "nestedItems": { "url": { "type": "url", "index": 0 } }
            }
        }));
        assert_eq!(decode(&m, &json!([null]), &TemplateTable::new())["links"], json!([]));
        assert_eq!(
            decode(&m, &json!([["oops", ["http://a"]]]), &TemplateTable::new())["links"],
            json!([{}, { "url": "http://a" }])
        );
        assert!(!decode(&m, &json!([]), &TemplateTable::new()).contains_key("links"));
    }

    #[test]
    fn url_template_single_and_multiple() {
        let m = manifest(json!({
            "avatar": {
                "type": "urlTemplate",
                "index": 0,
                "nestedItems": {
                    "key": { "type": "string", "index": 0 },
                    "vars": { "type": "stringArray", "index": 1 },
                    "hasMultipleTypes": { "type": "int", "index": 2 }
                }
            }
        }));
        let mut primary = TemplateTable::new();
        primary.insert("av".into(), "https://img/{{n}}/{{n}}.png".into());
        let mut typed = BTreeMap::new();
        let mut sizes = TemplateTable::new();
        sizes.insert("small".into(), "https://img/{{n}}/s/{{n}}".into());
        sizes.insert("large".into(), "https://img/{{n}}/l/{{n}}".into());
        typed.insert("av".to_string(), sizes);
        let templates = Templates::new(&primary, &typed);

        let single = json!([["av", ["u", "1"], 0]]);
        let out = decode_level(single.as_array().unwrap(), &m, &templates);
        assert_eq!(out["avatar"], json!("https://img/u/1.png"));

        let multiple = json!([["av", ["u", "1"], 1]]);
        let out = decode_level(multiple.as_array().unwrap(), &m, &templates);
        assert_eq!(
            out["avatar"],
            json!({ "large": "https://img/u/l/1", "small": "https://img/u/s/1" })
        );

        let unknown = json!([["nope", [], 0]]);
        let out = decode_level(unknown.as_array().unwrap(), &m, &templates);
        assert_eq!(out["avatar"], Value::Null);

        let missing_slot = json!([]);
        let out = decode_level(missing_slot.as_array().unwrap(), &m, &templates);
        assert!(!out.contains_key("avatar"));

        let null_slot = json!([null]);
        let out = decode_level(null_slot.as_array().unwrap(), &m, &templates);
        assert_eq!(out.get("avatar"), Some(&Value::Null));
    }

    #[test]
    fn url_templates_slot_in_range_is_always_written() {
        let m = manifest(json!({
            "badges": {
                "type": "urlTemplates",
                "index": 0,
                "nestedItems": { "key": { "type": "string", "index": 0 } }
            }
        }));
        let primary = TemplateTable::new();

        assert_eq!(decode(&m, &json!([null]), &primary)["badges"], json!([]));
        assert_eq!(decode(&m, &json!(["mod"]), &primary)["badges"], json!([]));
        assert!(!decode(&m, &json!([]), &primary).contains_key("badges"));
    }

    #[test]
    fn url_templates_resolve_without_variables() {
        let m = manifest(json!({
            "badges": {
                "type": "urlTemplates",
                "index": 0,
                "nestedItems": { "key": { "type": "string", "index": 0 } }
            }
        }));
        let mut primary = TemplateTable::new();
        primary.insert("mod".into(), "https://badge/mod.png".into());
        primary.insert("sub".into(), "https://badge/sub/{{n}}.png".into());

        let part = json!([[["mod", ["ignored"]], ["unknown"], ["sub", ["12"]]]]);
        let out = decode(&m, &part, &primary);
        assert_eq!(
            out["badges"],
            json!([
                { "key": "mod", "urlTemplate": "https://badge/mod.png" },
                { "key": "sub", "urlTemplate": "https://badge/sub/{{n}}.png" }
            ])
        );
    }

    #[test]
    fn truthiness() {
        for falsy in [json!(null), json!(false), json!(0), json!(0.0), json!("")] {
            assert!(!is_truthy(&falsy), "{falsy} should be falsy");
        }
        for truthy in [json!(true), json!(1), json!("0"), json!([]), json!({})] {
            assert!(is_truthy(&truthy), "{truthy} should be truthy");
        }
    }
}
