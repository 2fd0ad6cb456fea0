#![allow(clippy::unwrap_used, clippy::expect_used)]

use apitestgen::scheduler::{method_priority, schedule};
use apitestgen::spec::{
    build_endpoints, ComplexityLevel, Endpoint, EndpointKey, HttpMethod,
};
use std::collections::BTreeSet;

fn endpoint(method: HttpMethod, path: &str, resource: &str, score: i64) -> Endpoint {
    Endpoint {
        path: path.to_string(),
        method,
        operation_id: None,
        summary: None,
        resource_type: Some(resource.to_string()),
        requires_auth: false,
        security_scheme_count: 0,
        parameters: Vec::new(),
        required_parameters: BTreeSet::new(),
        request_body: None,
        responses: Vec::new(),
        complexity_score: score,
        complexity: ComplexityLevel::from_score(score),
    }
}

#[test]
fn test_priority_classes_are_contiguous() {
    let endpoints = vec![
        endpoint(HttpMethod::Delete, "/widgets/{id}", "widgets", 10),
        endpoint(HttpMethod::Get, "/widgets", "widgets", 5),
        endpoint(HttpMethod::Post, "/widgets", "widgets", 20),
        endpoint(HttpMethod::Put, "/widgets/{id}", "widgets", 15),
        endpoint(HttpMethod::Get, "/parts", "parts", 3),
        endpoint(HttpMethod::Post, "/parts", "parts", 8),
    ];
    let plan = schedule(endpoints);
    let priorities: Vec<u8> = plan
        .ordered
        .iter()
        .map(|e| method_priority(e.method))
        .collect();
    let mut sorted = priorities.clone();
    sorted.sort_unstable();
    assert_eq!(priorities, sorted);
}

#[test]
fn test_complexity_orders_within_priority_class() {
    let endpoints = vec![
        endpoint(HttpMethod::Post, "/widgets", "widgets", 20),
        endpoint(HttpMethod::Post, "/parts", "parts", 8),
    ];
    let plan = schedule(endpoints);
    assert_eq!(plan.ordered[0].path, "/parts");
    assert_eq!(plan.ordered[1].path, "/widgets");
}

#[test]
fn test_equal_keys_keep_insertion_order() {
    let endpoints = vec![
        endpoint(HttpMethod::Get, "/alpha", "alpha", 5),
        endpoint(HttpMethod::Get, "/beta", "beta", 5),
        endpoint(HttpMethod::Get, "/gamma", "gamma", 5),
    ];
    let plan = schedule(endpoints);
    let paths: Vec<&str> = plan.ordered.iter().map(|e| e.path.as_str()).collect();
    assert_eq!(paths, vec!["/alpha", "/beta", "/gamma"]);
}

#[test]
fn test_update_and_delete_follow_the_create() {
    let endpoints = vec![
        endpoint(HttpMethod::Delete, "/widgets/{id}", "widgets", 10),
        endpoint(HttpMethod::Post, "/widgets", "widgets", 20),
        endpoint(HttpMethod::Put, "/widgets/{id}", "widgets", 15),
    ];
    let plan = schedule(endpoints);
    let create = EndpointKey::new(HttpMethod::Post, "/widgets");
    for key in [
        EndpointKey::new(HttpMethod::Put, "/widgets/{id}"),
        EndpointKey::new(HttpMethod::Delete, "/widgets/{id}"),
    ] {
        let record = plan.dependencies.get(&key).unwrap();
        assert!(record.dependencies.contains(&create), "{} should follow the create", key);
    }
}

#[test]
fn test_templated_read_prefers_list_get() {
    let endpoints = vec![
        endpoint(HttpMethod::Get, "/widgets", "widgets", 5),
        endpoint(HttpMethod::Post, "/widgets", "widgets", 20),
        endpoint(HttpMethod::Get, "/widgets/{id}", "widgets", 8),
    ];
    let plan = schedule(endpoints);
    let record = plan
        .dependencies
        .get(&EndpointKey::new(HttpMethod::Get, "/widgets/{id}"))
        .unwrap();
    assert!(record
        .dependencies
        .contains(&EndpointKey::new(HttpMethod::Get, "/widgets")));
    assert!(!record
        .dependencies
        .contains(&EndpointKey::new(HttpMethod::Post, "/widgets")));
}

/// Full document-driven scenario: no list read exists, so templated
/// operations fall back to following the create.
#[test]
fn test_widgets_scenario_from_document() {
    let doc = serde_json::json!({
        "openapi": "3.1.0",
        "info": { "title": "Widgets", "version": "1" },
        "paths": {
            "/widgets/{id}": {
                "get": {
                    "operationId": "get_widget",
                    "tags": ["widgets"],
                    "responses": { "200": { "description": "OK" } }
                },
                "delete": {
                    "operationId": "delete_widget",
                    "tags": ["widgets"],
                    "responses": { "204": { "description": "Deleted" } }
                }
            },
            "/widgets": {
                "post": {
                    "operationId": "create_widget",
                    "tags": ["widgets"],
                    "responses": { "201": { "description": "Created" } }
                }
            }
        }
    });
    let plan = schedule(build_endpoints(&doc));

    let methods: Vec<HttpMethod> = plan.ordered.iter().map(|e| e.method).collect();
    assert_eq!(
        methods,
        vec![HttpMethod::Post, HttpMethod::Get, HttpMethod::Delete]
    );

    let create = EndpointKey::new(HttpMethod::Post, "/widgets");
    let get = plan
        .dependencies
        .get(&EndpointKey::new(HttpMethod::Get, "/widgets/{id}"))
        .unwrap();
    assert_eq!(get.dependencies.iter().collect::<Vec<_>>(), vec![&create]);
    let delete = plan
        .dependencies
        .get(&EndpointKey::new(HttpMethod::Delete, "/widgets/{id}"))
        .unwrap();
    assert!(delete.dependencies.contains(&create));
}

/// Dependencies are advisory: every endpoint appears in the order
/// exactly once even when its dependency is missing from the document.
#[test]
fn test_missing_dependency_never_blocks() {
    let endpoints = vec![
        endpoint(HttpMethod::Delete, "/widgets/{id}", "widgets", 10),
        endpoint(HttpMethod::Put, "/orphans/{id}", "orphans", 5),
    ];
    let plan = schedule(endpoints);
    assert_eq!(plan.ordered.len(), 2);
    let put = plan
        .dependencies
        .get(&EndpointKey::new(HttpMethod::Put, "/orphans/{id}"))
        .unwrap();
    assert!(put.dependencies.is_empty());
}
