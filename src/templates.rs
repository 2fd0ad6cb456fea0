//! Rendering of generated test blocks and the deterministic fallback.
//!
//! The fallback engine never calls the generation service and never
//! fails: it is the guaranteed terminal resolution when the retry budget
//! is exhausted and fallback is enabled.

use crate::spec::{Endpoint, HttpMethod};
use askama::Template;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::collections::HashSet;

static PATH_PARAM_RE: Lazy<Regex> = Lazy::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"\{[^}]+\}").expect("path parameter regex is valid")
});

/// Wrapper around one generated or fallback body: documentation header
/// plus a uniquely named `#[test]` function.
#[derive(Template)]
#[template(path = "test_block.rs.txt", escape = "none")]
struct TestBlockTemplate {
    method: String,
    path: String,
    test_name: String,
    body: String,
}

/// Minimal functional test body for one endpoint, used when generation
/// is exhausted or disabled.
#[derive(Template)]
#[template(path = "fallback_test.rs.txt", escape = "none")]
struct FallbackTestTemplate {
    method: String,
    happy_path: String,
    happy_statuses: String,
    has_payload: bool,
    payload_json: String,
    has_not_found: bool,
    not_found_path: String,
    has_auth: bool,
}

/// Plausible success statuses asserted by the fallback happy-path call.
pub fn expected_statuses(method: HttpMethod) -> &'static [u16] {
    match method {
        HttpMethod::Get => &[200],
        HttpMethod::Post => &[200, 201, 204],
        HttpMethod::Put | HttpMethod::Patch => &[200, 204],
        HttpMethod::Delete => &[200, 202, 204],
        _ => &[200],
    }
}

/// Sanitize a logical operation id into a Rust test identifier:
/// non-alphanumerics collapse to single underscores, a leading digit is
/// prefixed, and an identifier that sanitizes away entirely falls back
/// to a canonical name.
pub fn sanitize_test_identifier(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut last_was_sep = false;
    for c in raw.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c);
            last_was_sep = false;
        } else if !last_was_sep && !out.is_empty() {
            out.push('_');
            last_was_sep = true;
        }
    }
    let trimmed = out.trim_matches('_');
    if trimmed.is_empty() {
        return "unknown_operation".to_string();
    }
    let mut name = trimmed.to_string();
    if name
        .chars()
        .next()
        .map(|c| c.is_ascii_digit())
        .unwrap_or(false)
    {
        name.insert(0, '_');
    }
    name
}

/// De-duplicate a sanitized name across the run with an `_N` suffix.
pub fn unique_test_name(seen: &mut HashSet<String>, base: &str) -> String {
    if seen.insert(base.to_string()) {
        return base.to_string();
    }
    let mut counter = 1;
    loop {
        let candidate = format!("{}_{}", base, counter);
        if seen.insert(candidate.clone()) {
            return candidate;
        }
        counter += 1;
    }
}

/// Indent every non-empty line of a body by four spaces for embedding
/// into the block wrapper.
pub fn indent_body(body: &str) -> String {
    body.trim_end()
        .lines()
        .map(|line| {
            if line.trim().is_empty() {
                String::new()
            } else {
                format!("    {}", line)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Render one finished test block from a (generated or fallback) body.
pub fn render_test_block(endpoint: &Endpoint, test_name: &str, body: &str) -> anyhow::Result<String> {
    let rendered = TestBlockTemplate {
        method: endpoint.method.to_string(),
        path: endpoint.path.clone(),
        test_name: test_name.to_string(),
        body: indent_body(body),
    }
    .render()?;
    Ok(rendered)
}

/// Substitute every identifier placeholder in the path.
fn fill_path_params(path: &str, id: &str) -> String {
    PATH_PARAM_RE.replace_all(path, id).into_owned()
}

/// Render the deterministic fallback body for an endpoint.
pub fn render_fallback_body(endpoint: &Endpoint, payload: Option<&Value>) -> anyhow::Result<String> {
    let statuses = expected_statuses(endpoint.method)
        .iter()
        .map(|s| s.to_string())
        .collect::<Vec<_>>()
        .join(", ");
    let has_not_found = endpoint.has_templated_path()
        && matches!(
            endpoint.method,
            HttpMethod::Get | HttpMethod::Put | HttpMethod::Patch | HttpMethod::Delete
        );
    let rendered = FallbackTestTemplate {
        method: endpoint.method.to_string(),
        happy_path: fill_path_params(&endpoint.path, "1"),
        happy_statuses: statuses,
        has_payload: payload.is_some(),
        payload_json: payload
            .map(|v| serde_json::to_string(v).unwrap_or_else(|_| "{}".to_string()))
            .unwrap_or_default(),
        has_not_found,
        not_found_path: fill_path_params(&endpoint.path, "999999999"),
        has_auth: endpoint.requires_auth,
    }
    .render()?;
    Ok(rendered)
}
