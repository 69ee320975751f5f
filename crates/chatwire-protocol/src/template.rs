use std::borrow::Cow;
use std::collections::BTreeMap;

use indexmap::IndexMap;
use serde_json::{Map, Value};

/// Template key to URL template string, in wire order.
pub type TemplateTable = IndexMap<String, String>;

/// Positional placeholder, matched case-insensitively.
const PLACEHOLDER: &str = "{{n}}";

/// Expand the template stored under `key`, substituting `vars` into its
/// placeholders in encounter order.
///
/// Returns `None` only when `key` has no template. Placeholders beyond the
/// supplied variables are left in the output untouched.
pub fn resolve_template(table: &TemplateTable, key: &str, vars: &[Value]) -> Option<String> {
    table.get(key).map(|template| substitute(template, vars))
}

/// Number of placeholders in a template string.
pub fn count_placeholders(template: &str) -> usize {
    let mut count = 0;
    let mut rest = template;
    while let Some(at) = find_placeholder(rest) {
        count += 1;
        rest = &rest[at + PLACEHOLDER.len()..];
    }
    count
}

fn substitute(template: &str, vars: &[Value]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut vars = vars.iter();
    let mut rest = template;

    while let Some(at) = find_placeholder(rest) {
        out.push_str(&rest[..at]);
        let end = at + PLACEHOLDER.len();
        match vars.next() {
            Some(Value::String(s)) => out.push_str(s),
            Some(other) => out.push_str(&other.to_string()),
            None => out.push_str(&rest[at..end]),
        }
        rest = &rest[end..];
    }

    out.push_str(rest);
    out
}

fn find_placeholder(haystack: &str) -> Option<usize> {
    haystack.char_indices().map(|(at, _)| at).find(|&at| {
        haystack[at..]
            .get(..PLACEHOLDER.len())
            .is_some_and(|candidate| candidate.eq_ignore_ascii_case(PLACEHOLDER))
    })
}

/// The two template tables of a manifest document, borrowed for one decode.
#[derive(Debug, Clone, Copy)]
pub struct Templates<'a> {
    primary: &'a TemplateTable,
    typed: &'a BTreeMap<String, TemplateTable>,
}

impl<'a> Templates<'a> {
    pub fn new(primary: &'a TemplateTable, typed: &'a BTreeMap<String, TemplateTable>) -> Self {
        Self { primary, typed }
    }

    /// Resolve against the primary `urlTemplates` table.
    pub fn resolve(&self, key: &str, vars: &[Value]) -> Option<String> {
        resolve_template(self.primary, key, vars)
    }

    /// Resolve every representation declared for `key` in `urlTemplateTypes`.
    ///
    /// Returns `None` if `key` has no typed representations at all.
    pub fn resolve_typed(&self, key: &str, vars: &[Value]) -> Option<Map<String, Value>> {
        let table = self.typed.get(key)?;
        Some(
            table
                .keys()
                .map(|sub_type| {
                    let url = resolve_template(table, sub_type, vars);
                    (sub_type.clone(), url.map_or(Value::Null, Value::String))
                })
                .collect(),
        )
    }
}

/// Templates are keyed by string, but the wire sometimes carries numeric keys.
pub(crate) fn template_key(raw: &Value) -> Option<Cow<'_, str>> {
    match raw {
        Value::String(s) => Some(Cow::Borrowed(s.as_str())),
        Value::Number(n) => Some(Cow::Owned(n.to_string())),
        _ => None,
    }
}
