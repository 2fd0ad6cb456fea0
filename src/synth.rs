//! Constraint-aware example value synthesis.
//!
//! Given a `DataConstraints`, deterministically produce one example value
//! honoring declared bounds, formats and enums. Used both to give the
//! generation provider a realistic request-body example and to build
//! fallback test payloads.
//!
//! Synthesis is pure modulo the injected [`UniqueSource`]; tests supply a
//! fixed source to assert byte-identical output.

use crate::spec::{DataConstraints, SchemaType};
use serde_json::{Map, Number, Value};
use std::time::{SystemTime, UNIX_EPOCH};

/// Recursion cap for nested schema synthesis.
const MAX_SYNTH_DEPTH: usize = 10;

/// Item count for arrays without minItems/maxItems.
const DEFAULT_ARRAY_ITEMS: usize = 2;

/// Seam for the time/identity-based uniqueifier used by string synthesis.
pub trait UniqueSource: Send + Sync {
    fn timestamp_millis(&self) -> u64;
    fn unique_id(&self) -> String;
}

/// Wall-clock timestamps and ULID identifiers.
#[derive(Debug, Default)]
pub struct SystemUniqueSource;

impl UniqueSource for SystemUniqueSource {
    fn timestamp_millis(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }

    fn unique_id(&self) -> String {
        ulid::Ulid::new().to_string().to_lowercase()
    }
}

/// Fixed source for deterministic synthesis in tests.
#[derive(Debug, Clone)]
pub struct FixedUniqueSource {
    pub timestamp: u64,
    pub id: String,
}

impl UniqueSource for FixedUniqueSource {
    fn timestamp_millis(&self) -> u64 {
        self.timestamp
    }

    fn unique_id(&self) -> String {
        self.id.clone()
    }
}

pub struct ValueSynthesizer {
    source: Box<dyn UniqueSource>,
}

impl ValueSynthesizer {
    pub fn new(source: Box<dyn UniqueSource>) -> Self {
        Self { source }
    }

    /// Synthesizer backed by the system clock and ULIDs.
    pub fn system() -> Self {
        Self::new(Box::new(SystemUniqueSource))
    }

    /// Synthesize one example value of the declared type.
    pub fn synthesize(&self, field: &str, constraints: &DataConstraints) -> Value {
        self.synthesize_at_depth(field, constraints, 0)
    }

    fn synthesize_at_depth(&self, field: &str, c: &DataConstraints, depth: usize) -> Value {
        if depth > MAX_SYNTH_DEPTH {
            return Value::Null;
        }
        match c.effective_type() {
            SchemaType::String => Value::String(self.string_value(field, c)),
            SchemaType::Integer => Value::Number(Number::from(self.integer_value(c))),
            SchemaType::Number => Number::from_f64(self.number_value(c))
                .map(Value::Number)
                .unwrap_or(Value::Null),
            SchemaType::Boolean => Value::Bool(self.boolean_value(field, c)),
            SchemaType::Array => self.array_value(field, c, depth),
            SchemaType::Object => self.object_value(c, depth),
        }
    }

    /// String synthesis: example, first enum value, format canonical,
    /// then a field-derived unique name; padded/clamped to the declared
    /// length bounds.
    pub fn string_value(&self, field: &str, c: &DataConstraints) -> String {
        let base = if let Some(example) = c.example.as_ref().and_then(|v| v.as_str()) {
            example.to_string()
        } else if let Some(first) = c.enum_values.first().and_then(|v| v.as_str()) {
            first.to_string()
        } else if let Some(value) = self.format_value(field, c.format.as_deref()) {
            value
        } else {
            format!("{}_{}", field, self.source.timestamp_millis())
        };
        clamp_string(base, c.min_length, c.max_length)
    }

    fn format_value(&self, field: &str, format: Option<&str>) -> Option<String> {
        match format? {
            "date" => Some("2024-01-15".to_string()),
            "date-time" => Some("2024-01-15T10:30:00Z".to_string()),
            "email" => Some(format!("user{}@example.com", self.source.timestamp_millis())),
            "uuid" => Some(self.source.unique_id()),
            "uri" | "url" => Some(format!("https://example.com/{}", field)),
            "password" => Some("Str0ng!Passw0rd#2024".to_string()),
            _ => None,
        }
    }

    /// Integer synthesis: explicit example, else 42 clamped into the
    /// declared range; exclusive bounds nudge by one unit; `multipleOf`
    /// rounds to the nearest satisfying value without exceeding the
    /// maximum.
    pub fn integer_value(&self, c: &DataConstraints) -> i64 {
        if let Some(example) = c.example.as_ref().and_then(|v| v.as_i64()) {
            return example;
        }
        let lo = c.minimum.map(|m| {
            let m = m as i64;
            if c.exclusive_minimum {
                m + 1
            } else {
                m
            }
        });
        let hi = c.maximum.map(|m| {
            let m = m as i64;
            if c.exclusive_maximum {
                m - 1
            } else {
                m
            }
        });
        let mut v: i64 = 42;
        if let Some(lo) = lo {
            v = v.max(lo);
        }
        if let Some(hi) = hi {
            v = v.min(hi);
        }
        if let Some(step) = c.multiple_of.filter(|s| *s >= 1.0 && s.fract() == 0.0) {
            let step = step as i64;
            let mut candidate = ((v as f64 / step as f64).round() as i64) * step;
            if let Some(hi) = hi {
                while candidate > hi {
                    candidate -= step;
                }
            }
            if let Some(lo) = lo {
                if candidate < lo {
                    candidate += step;
                }
            }
            v = candidate;
        }
        v
    }

    /// Number synthesis mirrors integers with a 42.5 default and a 0.1
    /// nudge for exclusive bounds.
    pub fn number_value(&self, c: &DataConstraints) -> f64 {
        if let Some(example) = c.example.as_ref().and_then(|v| v.as_f64()) {
            return example;
        }
        let lo = c.minimum.map(|m| if c.exclusive_minimum { m + 0.1 } else { m });
        let hi = c.maximum.map(|m| if c.exclusive_maximum { m - 0.1 } else { m });
        let mut v: f64 = 42.5;
        if let Some(lo) = lo {
            v = v.max(lo);
        }
        if let Some(hi) = hi {
            v = v.min(hi);
        }
        if let Some(step) = c.multiple_of.filter(|s| *s > 0.0) {
            let mut candidate = (v / step).round() * step;
            if let Some(hi) = hi {
                while candidate > hi {
                    candidate -= step;
                }
            }
            if let Some(lo) = lo {
                if candidate < lo {
                    candidate += step;
                }
            }
            v = candidate;
        }
        v
    }

    /// Boolean synthesis: explicit example, else field-name semantics,
    /// else true.
    pub fn boolean_value(&self, field: &str, c: &DataConstraints) -> bool {
        if let Some(example) = c.example.as_ref().and_then(|v| v.as_bool()) {
            return example;
        }
        let name = field.to_ascii_lowercase();
        const TRUTHY: [&str; 4] = ["active", "enabled", "visible", "public"];
        const FALSY: [&str; 4] = ["deleted", "disabled", "hidden", "private"];
        if TRUTHY.iter().any(|hint| name.contains(hint)) {
            return true;
        }
        if FALSY.iter().any(|hint| name.contains(hint)) {
            return false;
        }
        true
    }

    fn array_value(&self, field: &str, c: &DataConstraints, depth: usize) -> Value {
        let mut count = DEFAULT_ARRAY_ITEMS;
        if let Some(min) = c.min_items {
            count = count.max(min);
        }
        if let Some(max) = c.max_items {
            count = count.min(max);
        }
        let item_constraints = c
            .items
            .as_deref()
            .cloned()
            .unwrap_or_default();
        let items = (0..count)
            .map(|i| {
                self.synthesize_at_depth(
                    &format!("{}_{}", field, i + 1),
                    &item_constraints,
                    depth + 1,
                )
            })
            .collect();
        Value::Array(items)
    }

    fn object_value(&self, c: &DataConstraints, depth: usize) -> Value {
        let mut map = Map::new();
        for (name, prop) in &c.properties {
            map.insert(name.clone(), self.synthesize_at_depth(name, prop, depth + 1));
        }
        Value::Object(map)
    }
}

fn clamp_string(base: String, min_length: Option<usize>, max_length: Option<usize>) -> String {
    let mut s = base;
    if s.is_empty() {
        s.push('x');
    }
    if let Some(min) = min_length {
        let seed = s.clone();
        while s.chars().count() < min {
            s.push_str(&seed);
        }
    }
    if let Some(max) = max_length {
        if s.chars().count() > max {
            s = s.chars().take(max).collect();
        }
    }
    s
}
