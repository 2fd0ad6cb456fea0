use super::load::constraints_from_schema;
use super::types::{
    ComplexityLevel, DataConstraints, Endpoint, HttpMethod, Parameter, ParameterLocation,
    RequestBodyInfo, ResponseInfo,
};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::collections::BTreeSet;
use tracing::{debug, warn};

static VERSION_SEGMENT_RE: Lazy<Regex> = Lazy::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"^[vV]\d+$").expect("version segment regex is valid")
});

/// Extract one `Endpoint` record per (path, method) operation.
///
/// A document without a usable top-level `paths` object produces an empty
/// list with a warning; the run then proceeds with zero jobs.
pub fn build_endpoints(doc: &Value) -> Vec<Endpoint> {
    let paths = match doc.get("paths").and_then(|p| p.as_object()) {
        Some(p) => p,
        None => {
            warn!("document has no usable 'paths' object; producing zero endpoints");
            return Vec::new();
        }
    };

    let mut endpoints = Vec::new();
    for (path, item) in paths {
        let item_obj = match item.as_object() {
            Some(o) => o,
            None => continue,
        };
        // Path-level parameters apply to every operation under the path.
        let shared_params = item_obj
            .get("parameters")
            .map(|list| extract_parameters(doc, list))
            .unwrap_or_default();

        for (key, operation) in item_obj {
            let method = match HttpMethod::parse(key) {
                Some(m) => m,
                // Non-operation siblings (summary, parameters, x-*) and
                // unknown verbs are skipped, not errors.
                None => continue,
            };
            let op = match operation.as_object() {
                Some(o) => o,
                None => continue,
            };

            let mut parameters = shared_params.clone();
            if let Some(list) = op.get("parameters") {
                parameters.extend(extract_parameters(doc, list));
            }
            let required_parameters: BTreeSet<String> = parameters
                .iter()
                .filter(|p| p.required)
                .map(|p| p.name.clone())
                .collect();

            let request_body = extract_request_body(doc, operation);
            let responses = extract_responses(operation);
            let (requires_auth, security_scheme_count) = security_info(operation);
            let resource_type = derive_resource_type(operation, path);

            let score = complexity_score(
                parameters.len(),
                required_parameters.len(),
                request_body.as_ref(),
                responses.len(),
                requires_auth,
                security_scheme_count,
                method,
            );

            debug!(
                path = %path,
                method = %method,
                score,
                resource = resource_type.as_deref().unwrap_or("-"),
                "analyzed endpoint"
            );

            endpoints.push(Endpoint {
                path: path.clone(),
                method,
                operation_id: op
                    .get("operationId")
                    .and_then(|v| v.as_str())
                    .map(str::to_string),
                summary: op
                    .get("summary")
                    .and_then(|v| v.as_str())
                    .map(str::to_string),
                resource_type,
                requires_auth,
                security_scheme_count,
                parameters,
                required_parameters,
                request_body,
                responses,
                complexity_score: score,
                complexity: ComplexityLevel::from_score(score),
            });
        }
    }
    endpoints
}

/// Heuristic score combining parameter, body, response and security
/// signals. Used only as a secondary sort key during scheduling.
pub fn complexity_score(
    parameter_count: usize,
    required_parameter_count: usize,
    request_body: Option<&RequestBodyInfo>,
    response_count: usize,
    requires_auth: bool,
    security_scheme_count: usize,
    method: HttpMethod,
) -> i64 {
    let mut score = 2 * parameter_count as i64 + 3 * required_parameter_count as i64;
    if let Some(body) = request_body {
        score += 5;
        if body.required {
            score += 3;
        }
    }
    score += 2 * response_count as i64;
    if requires_auth {
        score += 4;
    }
    score += 2 * security_scheme_count as i64;
    score += method_weight(method);
    score
}

fn method_weight(method: HttpMethod) -> i64 {
    match method {
        HttpMethod::Post => 6,
        HttpMethod::Put => 6,
        HttpMethod::Patch => 5,
        HttpMethod::Delete => 4,
        HttpMethod::Get => 2,
        _ => 0,
    }
}

/// Resource type derivation: first declared tag, else the first path
/// segment that is non-empty, non-templated and not version-looking.
fn derive_resource_type(operation: &Value, path: &str) -> Option<String> {
    if let Some(tag) = operation
        .get("tags")
        .and_then(|t| t.as_array())
        .and_then(|t| t.first())
        .and_then(|t| t.as_str())
    {
        if !tag.is_empty() {
            return Some(tag.to_string());
        }
    }
    path.split('/').find_map(|segment| {
        if segment.is_empty()
            || segment.contains('{')
            || segment.eq_ignore_ascii_case("api")
            || VERSION_SEGMENT_RE.is_match(segment)
        {
            None
        } else {
            Some(segment.to_string())
        }
    })
}

/// An operation requires authentication iff it declares at least one
/// non-empty security requirement.
fn security_info(operation: &Value) -> (bool, usize) {
    let requirements = match operation.get("security").and_then(|s| s.as_array()) {
        Some(list) => list,
        None => return (false, 0),
    };
    let mut scheme_count = 0usize;
    let mut requires_auth = false;
    for requirement in requirements {
        if let Some(obj) = requirement.as_object() {
            if !obj.is_empty() {
                requires_auth = true;
                scheme_count += obj.len();
            }
        }
    }
    (requires_auth, scheme_count)
}

fn extract_parameters(doc: &Value, list: &Value) -> Vec<Parameter> {
    let list = match list.as_array() {
        Some(l) => l,
        None => return Vec::new(),
    };
    let mut out = Vec::new();
    for raw in list {
        let resolved = raw
            .get("$ref")
            .and_then(|r| r.as_str())
            .and_then(|ref_path| resolve_parameter_ref(doc, ref_path))
            .unwrap_or(raw);
        let obj = match resolved.as_object() {
            Some(o) => o,
            None => continue,
        };
        let name = match obj.get("name").and_then(|n| n.as_str()) {
            Some(n) => n.to_string(),
            None => continue,
        };
        let location = obj
            .get("in")
            .and_then(|l| l.as_str())
            .and_then(ParameterLocation::parse)
            .unwrap_or(ParameterLocation::Query);
        let constraints: Option<DataConstraints> = obj
            .get("schema")
            .map(|schema| constraints_from_schema(doc, schema));
        out.push(Parameter {
            name,
            location,
            required: obj
                .get("required")
                .and_then(|r| r.as_bool())
                .unwrap_or(false),
            constraints,
        });
    }
    out
}

fn resolve_parameter_ref<'a>(doc: &'a Value, ref_path: &str) -> Option<&'a Value> {
    let name = ref_path.strip_prefix("#/components/parameters/")?;
    doc.pointer("/components/parameters")?.get(name)
}

fn extract_request_body(doc: &Value, operation: &Value) -> Option<RequestBodyInfo> {
    let body = operation.get("requestBody")?;
    let body = body
        .get("$ref")
        .and_then(|r| r.as_str())
        .and_then(|ref_path| {
            let name = ref_path.strip_prefix("#/components/requestBodies/")?;
            doc.pointer("/components/requestBodies")?.get(name)
        })
        .unwrap_or(body);
    let required = body
        .get("required")
        .and_then(|r| r.as_bool())
        .unwrap_or(false);
    let constraints = body
        .pointer("/content/application~1json/schema")
        .map(|schema| constraints_from_schema(doc, schema));
    Some(RequestBodyInfo {
        required,
        constraints,
    })
}

fn extract_responses(operation: &Value) -> Vec<ResponseInfo> {
    operation
        .get("responses")
        .and_then(|r| r.as_object())
        .map(|responses| {
            responses
                .iter()
                .map(|(status, body)| ResponseInfo {
                    status: status.clone(),
                    description: body
                        .get("description")
                        .and_then(|d| d.as_str())
                        .map(str::to_string),
                })
                .collect()
        })
        .unwrap_or_default()
}
