//! Structural differ for immutability policies
//!
//! Objects are diffed in their serialized form. The walker knows nothing
//! about any particular kind: it resolves each [`FieldRule`] path against the
//! existing and desired trees, compares what it finds and renders violations.
//!
//! Absent and zero values are equal: `null`, `""`, `false`, `0`, `[]` and
//! `{}` all normalize to nothing, and objects drop such entries before being
//! compared. Presence rules are the exception: they look at the raw value, so
//! a block whose fields are all zero is still present.

use serde_json::{Map, Value};

use crate::policy::{Comparison, FieldRule, ObjectPolicy, Render};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Segment<'p> {
    Field(&'p str),
    Each,
}

fn parse_path(path: &str) -> Vec<Segment<'_>> {
    let mut segments = Vec::new();
    for part in path.split('.') {
        match part.strip_suffix("[*]") {
            Some(field) => {
                segments.push(Segment::Field(field));
                segments.push(Segment::Each);
            }
            None => segments.push(Segment::Field(part)),
        }
    }
    segments
}

/// One resolved location of a rule path
struct Visit<'a> {
    indices: Vec<usize>,
    existing: Option<&'a Value>,
    desired: Option<&'a Value>,
}

fn walk<'a>(
    segments: &[Segment<'_>],
    existing: Option<&'a Value>,
    desired: Option<&'a Value>,
    indices: &mut Vec<usize>,
    out: &mut Vec<Visit<'a>>,
) {
    let Some((head, rest)) = segments.split_first() else {
        out.push(Visit {
            indices: indices.clone(),
            existing,
            desired,
        });
        return;
    };

    match head {
        Segment::Field(name) => walk(
            rest,
            existing.and_then(|v| v.get(*name)),
            desired.and_then(|v| v.get(*name)),
            indices,
            out,
        ),
        Segment::Each => {
            let e = existing.and_then(Value::as_array);
            let d = desired.and_then(Value::as_array);
            let len = e.map_or(0, Vec::len).max(d.map_or(0, Vec::len));
            for i in 0..len {
                indices.push(i);
                walk(
                    rest,
                    e.and_then(|a| a.get(i)),
                    d.and_then(|a| a.get(i)),
                    indices,
                    out,
                );
                indices.pop();
            }
        }
    }
}

/// Collapse absent and zero values to `Null`
pub fn normalize(value: Option<&Value>) -> Value {
    match value {
        None | Some(Value::Null) => Value::Null,
        Some(Value::Bool(false)) => Value::Null,
        Some(Value::String(s)) if s.is_empty() => Value::Null,
        Some(Value::Number(n)) if n.as_f64() == Some(0.0) => Value::Null,
        Some(Value::Array(items)) => {
            if items.is_empty() {
                Value::Null
            } else {
                Value::Array(items.iter().map(|v| normalize(Some(v))).collect())
            }
        }
        Some(Value::Object(fields)) => {
            let kept: Map<String, Value> = fields
                .iter()
                .map(|(k, v)| (k.clone(), normalize(Some(v))))
                .filter(|(_, v)| !v.is_null())
                .collect();
            if kept.is_empty() {
                Value::Null
            } else {
                Value::Object(kept)
            }
        }
        Some(other) => other.clone(),
    }
}

fn is_present(value: Option<&Value>) -> bool {
    value.is_some_and(|v| !v.is_null())
}

fn sorted_members(value: &Value) -> Vec<String> {
    let mut members: Vec<String> = match value {
        Value::Array(items) => items.iter().map(Value::to_string).collect(),
        Value::Null => Vec::new(),
        other => vec![other.to_string()],
    };
    members.sort_unstable();
    members
}

/// Whether a value changed under the given comparison
pub fn differs(comparison: Comparison, existing: Option<&Value>, desired: Option<&Value>) -> bool {
    if comparison == Comparison::Presence {
        return is_present(existing) != is_present(desired);
    }
    let e = normalize(existing);
    let d = normalize(desired);
    match comparison {
        Comparison::Exact | Comparison::OrderedSlice => e != d,
        Comparison::UnorderedSet => sorted_members(&e) != sorted_members(&d),
        Comparison::Mutable | Comparison::Presence => false,
    }
}

/// Render a value the way operators read it in upgrade diagnostics
///
/// Strings are bare, sequences are `[a b]` and maps are `map[k:v]` with
/// sorted keys.
pub fn format_value(value: &Value) -> String {
    match value {
        Value::Null => "<nil>".to_string(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(items) => {
            let inner: Vec<String> = items.iter().map(format_value).collect();
            format!("[{}]", inner.join(" "))
        }
        Value::Object(fields) => {
            let mut keys: Vec<&String> = fields.keys().collect();
            keys.sort_unstable();
            let inner: Vec<String> = keys
                .into_iter()
                .map(|k| format!("{}:{}", k, format_value(&fields[k])))
                .collect();
            format!("map[{}]", inner.join(" "))
        }
    }
}

fn format_side(value: Option<&Value>) -> String {
    format_value(value.unwrap_or(&Value::Null))
}

fn render_label(label: &str, indices: &[usize]) -> String {
    let mut out = String::with_capacity(label.len());
    let mut parts = label.split("{}");
    if let Some(first) = parts.next() {
        out.push_str(first);
    }
    for (i, part) in parts.enumerate() {
        if let Some(index) = indices.get(i) {
            out.push_str(&index.to_string());
        }
        out.push_str(part);
    }
    out
}

fn render(rule: &FieldRule, visit: &Visit<'_>) -> String {
    let label = render_label(rule.label, &visit.indices);
    let previous = || format_side(visit.existing);
    let new = || format_side(visit.desired);
    match rule.render {
        Render::Immutable => format!("{label} is immutable"),
        Render::PreviousNew => format!(
            "{label} is immutable. Previous value {}, New value {}",
            previous(),
            new()
        ),
        Render::InlinePreviousNew => {
            format!("{label} is immutable; previous = {}, new = {}", previous(), new())
        }
        Render::SentencePreviousNew => {
            format!("{label} is immutable. previous = {}, new = {}", previous(), new())
        }
        Render::Message(message) => message.to_string(),
    }
}

fn lookup<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(value, |v, field| v.get(field))
}

fn suppressed(
    policy: &ObjectPolicy,
    rule: &FieldRule,
    existing: &Value,
    desired: &Value,
) -> bool {
    let Some(path) = rule.suppressed_by else {
        return false;
    };
    let comparison = policy
        .rule(path)
        .map_or(Comparison::Exact, |r| r.comparison);
    differs(comparison, lookup(existing, path), lookup(desired, path))
}

/// Check one rule, returning a message per violating location
pub fn check_rule(
    policy: &ObjectPolicy,
    rule: &FieldRule,
    existing: &Value,
    desired: &Value,
) -> Vec<String> {
    if !rule.is_enforced() || suppressed(policy, rule, existing, desired) {
        return Vec::new();
    }

    let mut visits = Vec::new();
    walk(
        &parse_path(rule.path),
        Some(existing),
        Some(desired),
        &mut Vec::new(),
        &mut visits,
    );

    visits
        .iter()
        .filter(|v| differs(rule.comparison, v.existing, v.desired))
        .map(|v| render(rule, v))
        .collect()
}

/// Diff two serialized objects under a policy
///
/// Messages follow the rule order of the table. A collapsing table reports
/// at most its single category message.
pub fn diff_objects(policy: &ObjectPolicy, existing: &Value, desired: &Value) -> Vec<String> {
    let violations: Vec<String> = policy
        .enforced_rules()
        .flat_map(|rule| check_rule(policy, rule, existing, desired))
        .collect();

    match policy.collapse {
        Some(message) if !violations.is_empty() => vec![message.to_string()],
        _ => violations,
    }
}
