use dospanes_model::{
    resolve_attributes, resolve_descriptor, AttributeDescriptor, AttributeKind, ModelSchema,
};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

// ── Attribute catalog ────────────────────────────────────────────

#[test]
fn text_defaults_to_empty_string() {
    let a = AttributeDescriptor::text();
    assert_eq!(a.kind(), AttributeKind::Stored);
    assert_eq!(a.default_value(), Some(&json!("")));
}

#[test]
fn number_defaults_to_zero() {
    assert_eq!(AttributeDescriptor::number().default_value(), Some(&json!(0)));
}

#[test]
fn boolean_defaults_to_false() {
    assert_eq!(AttributeDescriptor::boolean().default_value(), Some(&json!(false)));
}

#[test]
fn stored_accepts_any_default() {
    let a = AttributeDescriptor::stored(json!({"nested": [1, 2]}));
    assert_eq!(a.default_value(), Some(&json!({"nested": [1, 2]})));
}

#[test]
fn default_descriptor_is_stored_null() {
    let a = AttributeDescriptor::default();
    assert!(!a.is_computed());
    assert_eq!(a.default_value(), Some(&Value::Null));
}

#[test]
fn computed_has_no_default() {
    let a = AttributeDescriptor::computed(|_| json!(1));
    assert!(a.is_computed());
    assert_eq!(a.kind(), AttributeKind::Computed);
    assert!(a.default_value().is_none());
}

// ── Raw descriptor resolution ────────────────────────────────────

#[test]
fn resolves_default_value() {
    let a = resolve_descriptor(&json!({"defaultValue": "Winterfell"}));
    assert_eq!(a.default_value(), Some(&json!("Winterfell")));
}

#[test]
fn missing_default_value_resolves_to_null() {
    let a = resolve_descriptor(&json!({"label": "no default"}));
    assert_eq!(a.default_value(), Some(&Value::Null));
}

#[test]
fn non_object_entry_resolves_to_null() {
    let a = resolve_descriptor(&json!(17));
    assert_eq!(a.default_value(), Some(&Value::Null));
}

#[test]
fn explicit_null_default_is_kept() {
    let a = resolve_descriptor(&json!({"defaultValue": null}));
    assert_eq!(a.default_value(), Some(&Value::Null));
}

#[test]
fn resolves_every_entry() {
    let raw = json!({
        "firstName": {"defaultValue": ""},
        "coins": {"defaultValue": 0},
        "motto": {}
    });
    let table = resolve_attributes(raw.as_object().unwrap());

    assert_eq!(table.len(), 3);
    assert_eq!(table["firstName"].default_value(), Some(&json!("")));
    assert_eq!(table["coins"].default_value(), Some(&json!(0)));
    assert_eq!(table["motto"].default_value(), Some(&Value::Null));
}

// ── ModelSchema ──────────────────────────────────────────────────

#[test]
fn builder_collects_attributes() {
    let schema = ModelSchema::new()
        .attribute("firstName", AttributeDescriptor::text())
        .attribute("coins", AttributeDescriptor::number())
        .resource_path("/users");

    let names: Vec<&str> = schema.attributes().keys().map(String::as_str).collect();
    assert_eq!(names, vec!["coins", "firstName"]);
}

#[test]
fn later_attribute_declaration_wins() {
    let schema = ModelSchema::new()
        .attribute("coins", AttributeDescriptor::number())
        .attribute("coins", AttributeDescriptor::stored(100));

    assert_eq!(schema.attributes()["coins"].default_value(), Some(&json!(100)));
}

#[test]
fn from_json_reads_attributes_and_resource_path() {
    let schema = ModelSchema::from_json(
        r#"{"attributes": {"name": {"defaultValue": "Stark"}}, "resourcePath": "/houses"}"#,
    )
    .unwrap();

    assert_eq!(schema.attributes()["name"].default_value(), Some(&json!("Stark")));
}

#[test]
fn from_value_tolerates_missing_sections() {
    let schema = ModelSchema::from_value(&json!({"somethingElse": true}));
    assert!(schema.attributes().is_empty());

    let schema = ModelSchema::from_value(&json!("not an object"));
    assert!(schema.attributes().is_empty());
}

#[test]
fn from_json_rejects_invalid_json() {
    assert!(ModelSchema::from_json("{attributes").is_err());
}
