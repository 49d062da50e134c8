//! Report templates and template structure inference.
//!
//! The rendering engine owns the authoritative template; what this service
//! keeps is a typed *schema tree* ([`DataType`]) inferred from the template's
//! raw sample-data JSON. The schema tree is what the frontend uses to let a
//! user wire resolvers onto each leaf.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const VALUE_TYPE_OBJECT: &str = "object";
pub const VALUE_TYPE_ARRAY: &str = "array";

/// A node of the typed schema tree describing a template's data document.
///
/// Composite nodes carry either `fields` (objects) or `children` (arrays,
/// keyed by the decimal index as a string); scalar nodes carry neither.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataType {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub value_type: String,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub length: usize,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub fields: BTreeMap<String, DataType>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub children: BTreeMap<String, DataType>,
}

fn is_zero(n: &usize) -> bool {
    *n == 0
}

/// A template as exposed to clients: identity plus its schema tree.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    /// Rendering format, e.g. `PDF` or `Excel`.
    #[serde(default, skip_serializing_if = "String::is_empty", rename = "type")]
    pub template_type: String,
    #[serde(default, skip_serializing_if = "TemplateData::is_empty")]
    pub data: TemplateData,
}

/// The template's sample-data document and its inferred structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateData {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub data_json_string: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub data_structured: BTreeMap<String, DataType>,
}

impl TemplateData {
    fn is_empty(&self) -> bool {
        self.id.is_empty()
            && self.name.is_empty()
            && self.data_json_string.is_empty()
            && self.data_structured.is_empty()
    }
}

/// Infer the schema tree of a decoded JSON document.
///
/// Objects recurse into `fields`, arrays into index-keyed `children`;
/// anything else becomes a scalar node tagged with its runtime type. Every
/// produced node's `name` equals the key it sits under.
pub fn infer_structure(document: &Map<String, Value>) -> BTreeMap<String, DataType> {
    let mut result = BTreeMap::new();
    for (key, value) in document {
        result.insert(key.clone(), infer_node(key, value));
    }
    result
}

fn infer_node(name: &str, value: &Value) -> DataType {
    match value {
        Value::Object(fields) => DataType {
            name: name.to_string(),
            value_type: VALUE_TYPE_OBJECT.to_string(),
            fields: infer_structure(fields),
            ..DataType::default()
        },
        Value::Array(items) => {
            let mut children = BTreeMap::new();
            for (index, item) in items.iter().enumerate() {
                let child_name = index.to_string();
                children.insert(child_name.clone(), infer_node(&child_name, item));
            }
            DataType {
                name: name.to_string(),
                value_type: VALUE_TYPE_ARRAY.to_string(),
                length: items.len(),
                children,
                ..DataType::default()
            }
        }
        scalar => DataType {
            name: name.to_string(),
            value_type: runtime_type_tag(scalar).to_string(),
            ..DataType::default()
        },
    }
}

/// Runtime type tag of a scalar JSON value. JSON numbers decode as doubles,
/// so every number infers as `float64`.
fn runtime_type_tag(value: &Value) -> &'static str {
    match value {
        Value::String(_) => "string",
        Value::Number(_) => "float64",
        Value::Bool(_) => "bool",
        _ => "null",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn infer(value: Value) -> BTreeMap<String, DataType> {
        infer_structure(value.as_object().expect("test document is an object"))
    }

    #[test]
    fn scalars_get_runtime_type_tags() {
        let result = infer(json!({"s": "text", "n": 1.5, "i": 3, "b": true, "x": null}));
        assert_eq!(result["s"].value_type, "string");
        assert_eq!(result["n"].value_type, "float64");
        // JSON numbers are doubles regardless of their literal form.
        assert_eq!(result["i"].value_type, "float64");
        assert_eq!(result["b"].value_type, "bool");
        assert_eq!(result["x"].value_type, "null");
    }

    #[test]
    fn node_name_equals_its_key() {
        let result = infer(json!({"outer": {"inner": 1}}));
        assert_eq!(result["outer"].name, "outer");
        assert_eq!(result["outer"].fields["inner"].name, "inner");
    }

    #[test]
    fn objects_recurse_into_fields() {
        let result = infer(json!({"a": {"b": {"c": "deep"}}}));
        let a = &result["a"];
        assert_eq!(a.value_type, "object");
        let b = &a.fields["b"];
        assert_eq!(b.value_type, "object");
        assert_eq!(b.fields["c"].value_type, "string");
        assert!(b.fields["c"].fields.is_empty());
        assert!(b.fields["c"].children.is_empty());
    }

    #[test]
    fn arrays_index_their_children() {
        let result = infer(json!({"arr": ["x", {"k": 1}, 2]}));
        let arr = &result["arr"];
        assert_eq!(arr.value_type, "array");
        assert_eq!(arr.length, 3);
        assert_eq!(
            arr.children.keys().cloned().collect::<Vec<_>>(),
            vec!["0", "1", "2"]
        );
        assert_eq!(arr.children["0"].value_type, "string");
        assert_eq!(arr.children["1"].value_type, "object");
        assert_eq!(arr.children["1"].fields["k"].value_type, "float64");
        assert_eq!(arr.children["2"].value_type, "float64");
    }

    #[test]
    fn empty_array_has_no_children() {
        let result = infer(json!({"arr": []}));
        assert_eq!(result["arr"].value_type, "array");
        assert_eq!(result["arr"].length, 0);
        assert!(result["arr"].children.is_empty());
    }

    #[test]
    fn inference_is_idempotent_over_serialization() {
        let document = json!({
            "title": "Monthly",
            "totals": {"sum": 12.5, "ok": true},
            "rows": [[1, 2], [3, 4]],
        });
        let first = infer(document.clone());

        // Round-trip the original document through its serialized form and
        // re-infer; the schema tree must be equivalent.
        let serialized = serde_json::to_string(&document).expect("serialize");
        let reparsed: Value = serde_json::from_str(&serialized).expect("reparse");
        let second = infer(reparsed);
        assert_eq!(first, second);
    }
}
