use std::collections::BTreeMap;
use std::fmt::{self, Write as _};

use serde::{Deserialize, Serialize};

use crate::entity::EntityId;

/// A dynamically typed value held by a root attribute or entity property.
///
/// Serialized externally tagged (`{"int": 4}`, `{"ref": "…"}`) so a
/// reference can never be mistaken for text when a snapshot is read back.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Value {
    /// The absence of a value.
    #[default]
    Nil,
    /// A boolean value.
    Bool(bool),
    /// A 64-bit signed integer value.
    Int(i64),
    /// A 64-bit floating-point value.
    Float(f64),
    /// A text value.
    Text(String),
    /// An ordered list of values.
    List(Vec<Value>),
    /// A string-keyed map of values.
    Map(BTreeMap<String, Value>),
    /// A reference to another entity in the same world.
    Ref(EntityId),
}

impl Value {
    /// Name of the value's type, as used in diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Nil => "nil",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Text(_) => "text",
            Self::List(_) => "list",
            Self::Map(_) => "map",
            Self::Ref(_) => "entity",
        }
    }

    /// Truthiness used by `and`, `or`, `not`, and conditionals.
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Nil => false,
            Self::Bool(b) => *b,
            Self::Int(n) => *n != 0,
            Self::Float(n) => *n != 0.0,
            Self::Text(s) => !s.is_empty(),
            Self::List(items) => !items.is_empty(),
            Self::Map(map) => !map.is_empty(),
            Self::Ref(_) => true,
        }
    }

    /// Borrow the text if this is a `Text` value.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Every entity referenced by this value, including refs nested in
    /// lists and maps.
    pub fn references(&self) -> Vec<EntityId> {
        let mut out = Vec::new();
        self.collect_references(&mut out);
        out
    }

    fn collect_references(&self, out: &mut Vec<EntityId>) {
        match self {
            Self::Ref(id) => out.push(*id),
            Self::List(items) => items.iter().for_each(|v| v.collect_references(out)),
            Self::Map(map) => map.values().for_each(|v| v.collect_references(out)),
            _ => {}
        }
    }

    /// Returns false if the value (or anything nested in it) cannot be
    /// written to a textual snapshot, i.e. a NaN or infinite float.
    pub fn is_serializable(&self) -> bool {
        match self {
            Self::Float(n) => n.is_finite(),
            Self::List(items) => items.iter().all(Value::is_serializable),
            Self::Map(map) => map.values().all(Value::is_serializable),
            _ => true,
        }
    }

    /// Render the value as narrative text, resolving entity references
    /// through `name_of`.
    ///
    /// Text renders raw at the top level and quoted inside collections.
    /// `Nil` renders as empty text.
    pub fn render_with(&self, name_of: &dyn Fn(EntityId) -> String) -> String {
        self.render_within(name_of, usize::MAX).unwrap_or_default()
    }

    /// Like [`Value::render_with`], but gives up with `None` as soon as the
    /// output grows past `max_bytes`.
    pub fn render_within(&self, name_of: &dyn Fn(EntityId) -> String, max_bytes: usize) -> Option<String> {
        let mut out = String::new();
        self.write_rendered(&mut out, name_of, false, max_bytes)
            .then_some(out)
    }

    /// Returns false once `out` is longer than `max_bytes`.
    fn write_rendered(
        &self,
        out: &mut String,
        name_of: &dyn Fn(EntityId) -> String,
        nested: bool,
        max_bytes: usize,
    ) -> bool {
        match self {
            Self::Nil if nested => out.push_str("nil"),
            Self::Nil => {}
            Self::Bool(b) => {
                let _ = write!(out, "{b}");
            }
            Self::Int(n) => {
                let _ = write!(out, "{n}");
            }
            Self::Float(n) => {
                let _ = write!(out, "{n}");
            }
            Self::Text(s) if nested => {
                let _ = write!(out, "{s:?}");
            }
            Self::Text(s) => out.push_str(s),
            Self::List(items) => {
                out.push('[');
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    if !item.write_rendered(out, name_of, true, max_bytes) {
                        return false;
                    }
                }
                out.push(']');
            }
            Self::Map(map) => {
                out.push('{');
                for (i, (key, value)) in map.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    out.push_str(key);
                    out.push_str(": ");
                    if !value.write_rendered(out, name_of, true, max_bytes) {
                        return false;
                    }
                }
                out.push('}');
            }
            Self::Ref(id) => out.push_str(&name_of(*id)),
        }
        out.len() <= max_bytes
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.render_with(&|id| format!("#{id}")))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Self::Int(i64::from(n))
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Self::Float(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<EntityId> for Value {
    fn from(id: EntityId) -> Self {
        Self::Ref(id)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Self::List(items)
    }
}
