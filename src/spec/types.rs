use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;
use std::fmt;

/// The fixed set of HTTP methods treated as operations during analysis.
///
/// Any other key found under a path item (shared `parameters`, `summary`,
/// vendor extensions, exotic verbs) is skipped, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
}

impl HttpMethod {
    /// Parse a method key case-insensitively. Returns `None` for keys
    /// outside the fixed operation set.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "get" => Some(Self::Get),
            "post" => Some(Self::Post),
            "put" => Some(Self::Put),
            "patch" => Some(Self::Patch),
            "delete" => Some(Self::Delete),
            "head" => Some(Self::Head),
            "options" => Some(Self::Options),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
            Self::Head => "HEAD",
            Self::Options => "OPTIONS",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterLocation {
    Query,
    Path,
    Header,
    Cookie,
}

impl ParameterLocation {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "query" => Some(Self::Query),
            "path" => Some(Self::Path),
            "header" => Some(Self::Header),
            "cookie" => Some(Self::Cookie),
            _ => None,
        }
    }
}

impl fmt::Display for ParameterLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ParameterLocation::Query => "query",
            ParameterLocation::Path => "path",
            ParameterLocation::Header => "header",
            ParameterLocation::Cookie => "cookie",
        };
        write!(f, "{}", s)
    }
}

/// Declared JSON Schema primitive type of a constraint node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaType {
    String,
    Integer,
    Number,
    Boolean,
    Array,
    Object,
}

impl SchemaType {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "string" => Some(Self::String),
            "integer" => Some(Self::Integer),
            "number" => Some(Self::Number),
            "boolean" => Some(Self::Boolean),
            "array" => Some(Self::Array),
            "object" => Some(Self::Object),
            _ => None,
        }
    }
}

/// Normalized bounds extracted from a schema node.
///
/// Every bound is optional; absence means "unconstrained, use a sensible
/// default". `properties` preserves the declared property order so the
/// synthesized object layout matches the document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataConstraints {
    pub schema_type: Option<SchemaType>,
    pub format: Option<String>,
    pub pattern: Option<String>,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
    pub exclusive_minimum: bool,
    pub exclusive_maximum: bool,
    pub multiple_of: Option<f64>,
    pub min_items: Option<usize>,
    pub max_items: Option<usize>,
    pub unique_items: bool,
    pub required_fields: Vec<String>,
    /// Declared `enum` values; the first entry is the canonical choice.
    pub enum_values: Vec<Value>,
    pub example: Option<Value>,
    pub properties: Vec<(String, DataConstraints)>,
    pub items: Option<Box<DataConstraints>>,
}

impl DataConstraints {
    /// Effective type, inferring object/array from structure when the
    /// document omits an explicit `type`.
    pub fn effective_type(&self) -> SchemaType {
        if let Some(ty) = self.schema_type {
            return ty;
        }
        if !self.properties.is_empty() {
            SchemaType::Object
        } else if self.items.is_some() {
            SchemaType::Array
        } else {
            SchemaType::String
        }
    }
}

#[derive(Debug, Clone)]
pub struct Parameter {
    pub name: String,
    pub location: ParameterLocation,
    pub required: bool,
    pub constraints: Option<DataConstraints>,
}

#[derive(Debug, Clone)]
pub struct RequestBodyInfo {
    pub required: bool,
    pub constraints: Option<DataConstraints>,
}

#[derive(Debug, Clone)]
pub struct ResponseInfo {
    pub status: String,
    pub description: Option<String>,
}

/// Complexity bucket derived from the heuristic score. Used only for
/// secondary ordering and reporting, never for correctness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ComplexityLevel {
    Low,
    Medium,
    High,
    VeryHigh,
}

impl ComplexityLevel {
    pub fn from_score(score: i64) -> Self {
        match score {
            s if s <= 10 => Self::Low,
            s if s <= 25 => Self::Medium,
            s if s <= 40 => Self::High,
            _ => Self::VeryHigh,
        }
    }
}

impl fmt::Display for ComplexityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ComplexityLevel::Low => "LOW",
            ComplexityLevel::Medium => "MEDIUM",
            ComplexityLevel::High => "HIGH",
            ComplexityLevel::VeryHigh => "VERY_HIGH",
        };
        write!(f, "{}", s)
    }
}

/// Identity of one operation: (method, path).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EndpointKey {
    pub method: HttpMethod,
    pub path: String,
}

impl EndpointKey {
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
        }
    }
}

impl fmt::Display for EndpointKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.path)
    }
}

/// One (path, method) operation extracted from the API document.
///
/// Built once during the single-threaded analysis pass and never mutated
/// afterwards; workers receive owned clones.
#[derive(Debug, Clone)]
pub struct Endpoint {
    pub path: String,
    pub method: HttpMethod,
    pub operation_id: Option<String>,
    pub summary: Option<String>,
    /// Logical entity group, from the first tag or a path segment.
    pub resource_type: Option<String>,
    pub requires_auth: bool,
    pub security_scheme_count: usize,
    pub parameters: Vec<Parameter>,
    pub required_parameters: BTreeSet<String>,
    pub request_body: Option<RequestBodyInfo>,
    pub responses: Vec<ResponseInfo>,
    pub complexity_score: i64,
    pub complexity: ComplexityLevel,
}

impl Endpoint {
    pub fn key(&self) -> EndpointKey {
        EndpointKey::new(self.method, self.path.clone())
    }

    /// True when the path contains an identifier placeholder like `{id}`.
    pub fn has_templated_path(&self) -> bool {
        self.path.contains('{')
    }
}
