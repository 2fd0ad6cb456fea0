use super::types::{DataConstraints, SchemaType};
use anyhow::Context;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;

/// Cap on `$ref` / nesting depth while normalizing schema nodes.
/// Prevents runaway recursion on self-referential schemas.
const MAX_SCHEMA_DEPTH: usize = 10;

/// Load an API document from disk into a raw JSON value.
///
/// YAML and JSON front-ends share the same downstream model; the document
/// is consumed read-only after this point.
pub fn load_document(path: &Path) -> anyhow::Result<Value> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read API document {:?}", path))?;
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default();
    let value: Value = if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") {
        serde_yaml::from_str(&content)
            .with_context(|| format!("failed to parse YAML document {:?}", path))?
    } else {
        serde_json::from_str(&content)
            .with_context(|| format!("failed to parse JSON document {:?}", path))?
    };
    Ok(value)
}

/// Document title slug, used for output file headers.
pub fn document_slug(doc: &Value) -> String {
    let title = doc
        .pointer("/info/title")
        .and_then(|v| v.as_str())
        .unwrap_or("api");
    let slug: String = title
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    let slug = slug.trim_matches('_').to_string();
    if slug.is_empty() {
        "api".to_string()
    } else {
        slug
    }
}

/// Resolve a `#/components/schemas/<name>` reference within the document.
pub fn resolve_schema_ref<'a>(doc: &'a Value, ref_path: &str) -> Option<&'a Value> {
    let name = ref_path.strip_prefix("#/components/schemas/")?;
    doc.pointer("/components/schemas")?.get(name)
}

/// Build the read-only constraint cache from `components.schemas`.
///
/// Keyed by schema name; constructed once during analysis and shared as
/// an immutable reference afterwards.
pub fn constraint_cache(doc: &Value) -> BTreeMap<String, DataConstraints> {
    let mut cache = BTreeMap::new();
    if let Some(Value::Object(schemas)) = doc.pointer("/components/schemas") {
        for (name, schema) in schemas {
            cache.insert(name.clone(), constraints_from_schema(doc, schema));
        }
    }
    cache
}

/// Normalize a raw schema node into `DataConstraints`, resolving `$ref`
/// against the document's component schemas.
pub fn constraints_from_schema(doc: &Value, schema: &Value) -> DataConstraints {
    constraints_at_depth(doc, schema, 0)
}

fn constraints_at_depth(doc: &Value, schema: &Value, depth: usize) -> DataConstraints {
    if depth > MAX_SCHEMA_DEPTH {
        return DataConstraints::default();
    }

    let obj = match schema.as_object() {
        Some(o) => o,
        None => return DataConstraints::default(),
    };

    if let Some(ref_path) = obj.get("$ref").and_then(|v| v.as_str()) {
        if let Some(resolved) = resolve_schema_ref(doc, ref_path) {
            return constraints_at_depth(doc, resolved, depth + 1);
        }
        return DataConstraints::default();
    }

    let mut c = DataConstraints {
        schema_type: obj
            .get("type")
            .and_then(|v| v.as_str())
            .and_then(SchemaType::parse),
        format: obj
            .get("format")
            .and_then(|v| v.as_str())
            .map(str::to_string),
        pattern: obj
            .get("pattern")
            .and_then(|v| v.as_str())
            .map(str::to_string),
        min_length: obj
            .get("minLength")
            .and_then(|v| v.as_u64())
            .map(|n| n as usize),
        max_length: obj
            .get("maxLength")
            .and_then(|v| v.as_u64())
            .map(|n| n as usize),
        minimum: obj.get("minimum").and_then(|v| v.as_f64()),
        maximum: obj.get("maximum").and_then(|v| v.as_f64()),
        multiple_of: obj.get("multipleOf").and_then(|v| v.as_f64()),
        min_items: obj
            .get("minItems")
            .and_then(|v| v.as_u64())
            .map(|n| n as usize),
        max_items: obj
            .get("maxItems")
            .and_then(|v| v.as_u64())
            .map(|n| n as usize),
        unique_items: obj
            .get("uniqueItems")
            .and_then(|v| v.as_bool())
            .unwrap_or(false),
        example: obj.get("example").cloned(),
        ..DataConstraints::default()
    };

    // Exclusive bounds appear either as booleans next to minimum/maximum
    // (draft-4 style) or as standalone numbers (2020-12 style).
    match obj.get("exclusiveMinimum") {
        Some(Value::Bool(b)) => c.exclusive_minimum = *b,
        Some(v) if v.is_number() => {
            c.minimum = v.as_f64();
            c.exclusive_minimum = true;
        }
        _ => {}
    }
    match obj.get("exclusiveMaximum") {
        Some(Value::Bool(b)) => c.exclusive_maximum = *b,
        Some(v) if v.is_number() => {
            c.maximum = v.as_f64();
            c.exclusive_maximum = true;
        }
        _ => {}
    }

    if let Some(Value::Array(values)) = obj.get("enum") {
        c.enum_values = values.clone();
    }
    if let Some(Value::Array(required)) = obj.get("required") {
        c.required_fields = required
            .iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect();
    }
    if let Some(Value::Object(props)) = obj.get("properties") {
        c.properties = props
            .iter()
            .map(|(name, prop)| (name.clone(), constraints_at_depth(doc, prop, depth + 1)))
            .collect();
    }
    if let Some(items) = obj.get("items") {
        c.items = Some(Box::new(constraints_at_depth(doc, items, depth + 1)));
    }

    c
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_constraints_resolve_ref() {
        let doc = json!({
            "components": { "schemas": {
                "Widget": {
                    "type": "object",
                    "required": ["name"],
                    "properties": {
                        "name": { "type": "string", "minLength": 3 }
                    }
                }
            }}
        });
        let schema = json!({ "$ref": "#/components/schemas/Widget" });
        let c = constraints_from_schema(&doc, &schema);
        assert_eq!(c.effective_type(), SchemaType::Object);
        assert_eq!(c.required_fields, vec!["name".to_string()]);
        assert_eq!(c.properties[0].0, "name");
        assert_eq!(c.properties[0].1.min_length, Some(3));
    }

    #[test]
    fn test_constraints_numeric_exclusive_forms() {
        let doc = json!({});
        let draft4 = json!({ "type": "integer", "maximum": 10, "exclusiveMaximum": true });
        let c = constraints_from_schema(&doc, &draft4);
        assert_eq!(c.maximum, Some(10.0));
        assert!(c.exclusive_maximum);

        let modern = json!({ "type": "integer", "exclusiveMaximum": 10 });
        let c = constraints_from_schema(&doc, &modern);
        assert_eq!(c.maximum, Some(10.0));
        assert!(c.exclusive_maximum);
    }

    #[test]
    fn test_constraint_cache_keys() {
        let doc = json!({
            "components": { "schemas": {
                "A": { "type": "string" },
                "B": { "type": "integer" }
            }}
        });
        let cache = constraint_cache(&doc);
        assert_eq!(cache.len(), 2);
        assert_eq!(cache["A"].schema_type, Some(SchemaType::String));
        assert_eq!(cache["B"].schema_type, Some(SchemaType::Integer));
    }

    #[test]
    fn test_self_referential_schema_terminates() {
        let doc = json!({
            "components": { "schemas": {
                "Node": {
                    "type": "object",
                    "properties": {
                        "next": { "$ref": "#/components/schemas/Node" }
                    }
                }
            }}
        });
        let schema = json!({ "$ref": "#/components/schemas/Node" });
        let c = constraints_from_schema(&doc, &schema);
        assert_eq!(c.effective_type(), SchemaType::Object);
    }

    #[test]
    fn test_document_slug() {
        let doc = json!({ "info": { "title": "Widget Store API!" } });
        assert_eq!(document_slug(&doc), "widget_store_api");
        assert_eq!(document_slug(&json!({})), "api");
    }
}
