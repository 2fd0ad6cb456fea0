//! Dependency-aware dispatch ordering.
//!
//! Endpoints are classified into coarse priority classes
//! (create < read < update < delete < unclassified) and sorted stably by
//! (priority, complexity score); remaining ties keep document traversal
//! order so a schedule is reproducible across runs on the same input.
//!
//! Dependencies recorded here are advisory metadata for reporting and
//! tie-break intent. They are never execution barriers: every job is
//! dispatched to the pool immediately after sorting. Generated tests are
//! static code, so execution-time causality between jobs is not required.

use crate::spec::{Endpoint, EndpointKey, HttpMethod};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Advisory ordering metadata for one endpoint.
#[derive(Debug, Clone)]
pub struct EndpointDependency {
    pub key: EndpointKey,
    /// 1=create, 2=read, 3=update, 4=delete, 5=unclassified.
    pub priority: u8,
    /// Endpoints this one logically follows (advisory only).
    pub dependencies: BTreeSet<EndpointKey>,
}

/// Total dispatch order plus the advisory dependency records.
#[derive(Debug)]
pub struct Schedule {
    pub ordered: Vec<Endpoint>,
    pub dependencies: BTreeMap<EndpointKey, EndpointDependency>,
}

/// Coarse scheduling class for a method.
pub fn method_priority(method: HttpMethod) -> u8 {
    match method {
        HttpMethod::Post => 1,
        HttpMethod::Get => 2,
        HttpMethod::Put | HttpMethod::Patch => 3,
        HttpMethod::Delete => 4,
        _ => 5,
    }
}

/// Compute the dispatch order for the full endpoint set.
pub fn schedule(endpoints: Vec<Endpoint>) -> Schedule {
    let mut dependencies = BTreeMap::new();
    for endpoint in &endpoints {
        let mut deps = BTreeSet::new();

        // Update/delete operations logically follow the create for the
        // same resource, when an untemplated create exists.
        if matches!(
            endpoint.method,
            HttpMethod::Put | HttpMethod::Patch | HttpMethod::Delete
        ) {
            if let Some(post) = find_same_resource(&endpoints, endpoint, HttpMethod::Post) {
                deps.insert(post.key());
            }
        }

        // Operations addressing a specific identifier follow the
        // list-style read for the same resource; when no list read
        // exists, the create stands in for it.
        if endpoint.has_templated_path() && endpoint.method != HttpMethod::Post {
            if let Some(list_get) = find_same_resource(&endpoints, endpoint, HttpMethod::Get) {
                deps.insert(list_get.key());
            } else if let Some(post) = find_same_resource(&endpoints, endpoint, HttpMethod::Post) {
                deps.insert(post.key());
            }
        }

        let record = EndpointDependency {
            key: endpoint.key(),
            priority: method_priority(endpoint.method),
            dependencies: deps,
        };
        debug!(
            endpoint = %record.key,
            priority = record.priority,
            deps = record.dependencies.len(),
            "recorded scheduling metadata"
        );
        dependencies.insert(record.key.clone(), record);
    }

    // Stable sort: equal (priority, score) pairs keep insertion order.
    let mut ordered = endpoints;
    ordered.sort_by_key(|e| (method_priority(e.method), e.complexity_score));

    Schedule {
        ordered,
        dependencies,
    }
}

/// First endpoint (in document order) sharing the resource type, with
/// the wanted method and an untemplated path. Requires both resource
/// types to be known.
fn find_same_resource<'a>(
    endpoints: &'a [Endpoint],
    reference: &Endpoint,
    method: HttpMethod,
) -> Option<&'a Endpoint> {
    let resource = reference.resource_type.as_ref()?;
    endpoints.iter().find(|candidate| {
        candidate.method == method
            && !candidate.has_templated_path()
            && candidate.resource_type.as_ref() == Some(resource)
            && candidate.key() != reference.key()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_priority_classes() {
        assert_eq!(method_priority(HttpMethod::Post), 1);
        assert_eq!(method_priority(HttpMethod::Get), 2);
        assert_eq!(method_priority(HttpMethod::Put), 3);
        assert_eq!(method_priority(HttpMethod::Patch), 3);
        assert_eq!(method_priority(HttpMethod::Delete), 4);
        assert_eq!(method_priority(HttpMethod::Head), 5);
        assert_eq!(method_priority(HttpMethod::Options), 5);
    }
}
