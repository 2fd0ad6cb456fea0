#![allow(clippy::unwrap_used, clippy::expect_used)]

use apitestgen::spec::{DataConstraints, SchemaType};
use apitestgen::synth::{FixedUniqueSource, ValueSynthesizer};
use serde_json::{json, Value};

fn synth() -> ValueSynthesizer {
    ValueSynthesizer::new(Box::new(FixedUniqueSource {
        timestamp: 1_700_000_000_000,
        id: "01hf5k3q9z0000000000000000".to_string(),
    }))
}

fn constraints(schema_type: SchemaType) -> DataConstraints {
    DataConstraints {
        schema_type: Some(schema_type),
        ..DataConstraints::default()
    }
}

#[test]
fn test_fixed_source_is_idempotent() {
    let c = constraints(SchemaType::String);
    let a = synth().synthesize("name", &c);
    let b = synth().synthesize("name", &c);
    assert_eq!(a, b);
    assert_eq!(a, json!("name_1700000000000"));
}

#[test]
fn test_integer_respects_exclusive_maximum() {
    let c = DataConstraints {
        schema_type: Some(SchemaType::Integer),
        minimum: Some(5.0),
        maximum: Some(10.0),
        exclusive_maximum: true,
        ..DataConstraints::default()
    };
    let v = synth().synthesize("count", &c).as_i64().unwrap();
    // default 42 clamps to the exclusive upper bound
    assert_eq!(v, 9);
    assert!((5..=9).contains(&v));
}

#[test]
fn test_integer_multiple_of_stays_in_range() {
    let c = DataConstraints {
        schema_type: Some(SchemaType::Integer),
        minimum: Some(0.0),
        maximum: Some(50.0),
        multiple_of: Some(7.0),
        ..DataConstraints::default()
    };
    let v = synth().synthesize("count", &c).as_i64().unwrap();
    assert_eq!(v % 7, 0);
    assert!((0..=50).contains(&v));
}

#[test]
fn test_number_exclusive_bounds_nudge() {
    let c = DataConstraints {
        schema_type: Some(SchemaType::Number),
        minimum: Some(42.5),
        exclusive_minimum: true,
        ..DataConstraints::default()
    };
    let v = synth().synthesize("ratio", &c).as_f64().unwrap();
    assert!(v > 42.5);
}

#[test]
fn test_example_takes_precedence() {
    let c = DataConstraints {
        schema_type: Some(SchemaType::String),
        example: Some(json!("from-the-spec")),
        enum_values: vec![json!("enum-first")],
        format: Some("email".to_string()),
        ..DataConstraints::default()
    };
    assert_eq!(synth().synthesize("name", &c), json!("from-the-spec"));
}

#[test]
fn test_enum_first_beats_format() {
    let c = DataConstraints {
        schema_type: Some(SchemaType::String),
        enum_values: vec![json!("pending"), json!("done")],
        format: Some("email".to_string()),
        ..DataConstraints::default()
    };
    assert_eq!(synth().synthesize("status", &c), json!("pending"));
}

#[test]
fn test_format_canonicals() {
    let s = synth();
    let mut c = constraints(SchemaType::String);

    c.format = Some("date".to_string());
    assert_eq!(s.synthesize("when", &c), json!("2024-01-15"));

    c.format = Some("date-time".to_string());
    assert_eq!(s.synthesize("when", &c), json!("2024-01-15T10:30:00Z"));

    c.format = Some("email".to_string());
    assert_eq!(s.synthesize("contact", &c), json!("user1700000000000@example.com"));

    c.format = Some("uuid".to_string());
    assert_eq!(
        s.synthesize("id", &c),
        json!("01hf5k3q9z0000000000000000")
    );

    c.format = Some("uri".to_string());
    assert_eq!(s.synthesize("avatar", &c), json!("https://example.com/avatar"));
}

#[test]
fn test_min_length_padding() {
    let c = DataConstraints {
        schema_type: Some(SchemaType::String),
        format: Some("date".to_string()),
        min_length: Some(20),
        ..DataConstraints::default()
    };
    let v = synth().synthesize("when", &c);
    assert!(v.as_str().unwrap().chars().count() >= 20);
}

#[test]
fn test_boolean_name_heuristics() {
    let s = synth();
    let c = constraints(SchemaType::Boolean);
    assert_eq!(s.synthesize("is_enabled", &c), json!(true));
    assert_eq!(s.synthesize("deleted_at_flag", &c), json!(false));
    assert_eq!(s.synthesize("flag", &c), json!(true));
}

#[test]
fn test_array_item_count_honors_bounds() {
    let c = DataConstraints {
        schema_type: Some(SchemaType::Array),
        min_items: Some(3),
        items: Some(Box::new(constraints(SchemaType::Integer))),
        ..DataConstraints::default()
    };
    let v = synth().synthesize("scores", &c);
    let items = v.as_array().unwrap();
    assert_eq!(items.len(), 3);
    assert!(items.iter().all(|i| i.as_i64() == Some(42)));

    let capped = DataConstraints {
        schema_type: Some(SchemaType::Array),
        max_items: Some(1),
        items: Some(Box::new(constraints(SchemaType::Integer))),
        ..DataConstraints::default()
    };
    assert_eq!(synth().synthesize("scores", &capped).as_array().unwrap().len(), 1);
}

#[test]
fn test_object_synthesis_covers_all_properties() {
    let c = DataConstraints {
        schema_type: Some(SchemaType::Object),
        required_fields: vec!["name".to_string()],
        properties: vec![
            ("name".to_string(), constraints(SchemaType::String)),
            ("age".to_string(), constraints(SchemaType::Integer)),
            ("active".to_string(), constraints(SchemaType::Boolean)),
        ],
        ..DataConstraints::default()
    };
    let v = synth().synthesize("user", &c);
    let obj = v.as_object().unwrap();
    assert_eq!(obj.len(), 3);
    assert_eq!(obj["name"], json!("name_1700000000000"));
    assert_eq!(obj["age"], json!(42));
    assert_eq!(obj["active"], json!(true));
}

#[test]
fn test_empty_object_schema() {
    let c = constraints(SchemaType::Object);
    assert_eq!(synth().synthesize("meta", &c), Value::Object(Default::default()));
}

#[test]
fn test_self_referential_schema_terminates() {
    // A node whose items point back at an equally shaped node; depth
    // capping must bottom out instead of recursing forever.
    fn nested(depth: usize) -> DataConstraints {
        let mut c = constraints(SchemaType::Array);
        if depth > 0 {
            c.items = Some(Box::new(nested(depth - 1)));
        }
        c
    }
    let v = synth().synthesize("tree", &nested(20));
    assert!(v.is_array());
}
