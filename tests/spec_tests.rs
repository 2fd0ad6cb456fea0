#![allow(clippy::unwrap_used, clippy::expect_used)]

use apitestgen::spec::{
    build_endpoints, document_slug, load_document, ComplexityLevel, HttpMethod,
    ParameterLocation,
};
use std::io::Write;

const YAML_SPEC: &str = r#"openapi: 3.1.0
info:
  title: Widget Service
  version: "1.0.0"
components:
  schemas:
    Widget:
      type: object
      required: [name]
      properties:
        id: { type: string, format: uuid }
        name: { type: string, minLength: 1 }
  parameters:
    IdParam:
      name: id
      in: path
      required: true
      schema: { type: string }
paths:
  /widgets:
    summary: Widget collection
    post:
      operationId: create_widget
      tags: [widgets]
      requestBody:
        required: true
        content:
          application/json:
            schema:
              $ref: '#/components/schemas/Widget'
      responses:
        "201":
          description: Created
      security:
        - bearerAuth: []
  /widgets/{id}:
    parameters:
      - $ref: '#/components/parameters/IdParam'
    get:
      operationId: get_widget
      parameters:
        - name: verbose
          in: query
          required: false
          schema: { type: boolean }
      responses:
        "200":
          description: OK
        "404":
          description: Not found
    x-internal: true
"#;

fn write_spec(contents: &str, suffix: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(suffix)
        .tempfile()
        .expect("temp spec file");
    file.write_all(contents.as_bytes()).expect("write spec");
    file
}

#[test]
fn test_loads_yaml_and_derives_slug() {
    let file = write_spec(YAML_SPEC, ".yaml");
    let doc = load_document(file.path()).unwrap();
    assert_eq!(document_slug(&doc), "widget_service");
}

#[test]
fn test_loads_json_by_extension() {
    let json =
        r#"{ "openapi": "3.1.0", "info": { "title": "J API", "version": "1" }, "paths": {} }"#;
    let file = write_spec(json, ".json");
    let doc = load_document(file.path()).unwrap();
    assert!(build_endpoints(&doc).is_empty());
}

#[test]
fn test_missing_paths_yields_no_endpoints() {
    let doc = serde_json::json!({ "openapi": "3.1.0", "info": { "title": "x" } });
    assert!(build_endpoints(&doc).is_empty());
}

#[test]
fn test_extracts_endpoints_and_skips_non_method_keys() {
    let file = write_spec(YAML_SPEC, ".yaml");
    let doc = load_document(file.path()).unwrap();
    let endpoints = build_endpoints(&doc);
    // summary, parameters and x-internal siblings are not operations
    assert_eq!(endpoints.len(), 2);
    let methods: Vec<HttpMethod> = endpoints.iter().map(|e| e.method).collect();
    assert!(methods.contains(&HttpMethod::Post));
    assert!(methods.contains(&HttpMethod::Get));
}

#[test]
fn test_path_level_parameters_merge_into_operation() {
    let file = write_spec(YAML_SPEC, ".yaml");
    let doc = load_document(file.path()).unwrap();
    let endpoints = build_endpoints(&doc);
    let get = endpoints
        .iter()
        .find(|e| e.method == HttpMethod::Get)
        .unwrap();
    assert_eq!(get.parameters.len(), 2);
    let id = get.parameters.iter().find(|p| p.name == "id").unwrap();
    assert_eq!(id.location, ParameterLocation::Path);
    assert!(id.required);
    assert!(get.required_parameters.contains("id"));
    assert!(!get.required_parameters.contains("verbose"));
}

#[test]
fn test_request_body_schema_ref_resolution() {
    let file = write_spec(YAML_SPEC, ".yaml");
    let doc = load_document(file.path()).unwrap();
    let endpoints = build_endpoints(&doc);
    let post = endpoints
        .iter()
        .find(|e| e.method == HttpMethod::Post)
        .unwrap();
    let body = post.request_body.as_ref().unwrap();
    assert!(body.required);
    let constraints = body.constraints.as_ref().unwrap();
    assert_eq!(constraints.required_fields, vec!["name".to_string()]);
    let (_, name_c) = constraints
        .properties
        .iter()
        .find(|(n, _)| n == "name")
        .unwrap();
    assert_eq!(name_c.min_length, Some(1));
}

#[test]
fn test_security_and_complexity_scoring() {
    let file = write_spec(YAML_SPEC, ".yaml");
    let doc = load_document(file.path()).unwrap();
    let endpoints = build_endpoints(&doc);
    let post = endpoints
        .iter()
        .find(|e| e.method == HttpMethod::Post)
        .unwrap();
    assert!(post.requires_auth);
    assert_eq!(post.security_scheme_count, 1);
    // body(5+3) + 2*1 responses + auth 4 + 2*1 schemes + POST 6 = 22
    assert_eq!(post.complexity_score, 22);
    assert_eq!(post.complexity, ComplexityLevel::Medium);

    let get = endpoints
        .iter()
        .find(|e| e.method == HttpMethod::Get)
        .unwrap();
    assert!(!get.requires_auth);
    // 2*2 params + 3*1 required + 2*2 responses + GET 2 = 13
    assert_eq!(get.complexity_score, 13);
    assert_eq!(get.complexity, ComplexityLevel::Medium);
}

#[test]
fn test_resource_type_from_tag_and_path() {
    let file = write_spec(YAML_SPEC, ".yaml");
    let doc = load_document(file.path()).unwrap();
    let endpoints = build_endpoints(&doc);
    for endpoint in &endpoints {
        assert_eq!(endpoint.resource_type.as_deref(), Some("widgets"));
    }
}
