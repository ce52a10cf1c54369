//! Dynamic values interpolated into messages.
//!
//! A [`Values`] map carries the named arguments of one formatting call.
//! Primitives are stored inline; objects and lists are shared handles with
//! identity, so the owner of a value graph may link them into cycles.
//! Nothing in this crate creates such cycles, but every consumer must
//! tolerate them (see [`crate::cycle`]).
//!
//! # Invariants
//!
//! 1. **Identity, not structure**: equality on [`ObjectRef`], [`ListRef`]
//!    and [`Embedded`] compares handles, never contents. Structural equality
//!    would recurse forever on a cyclic graph.
//!
//! 2. **Snapshots**: readers copy child handles out of a lock before
//!    descending, so no lock is held across recursion.
//!
//! 3. **JSON is cycle-safe**: [`values_to_json`] refuses cyclic input
//!    instead of overflowing the stack.

use core::fmt;
use std::any::Any;
use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};

use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};

use crate::cycle::values_cyclic;

/// Named arguments for one formatting call, ordered by name.
pub type Values = BTreeMap<String, Value>;

/// Largest integer an `f64` represents exactly (2^53).
pub(crate) const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_992.0;

/// A single dynamic value.
#[derive(Debug, Clone)]
pub enum Value {
    /// Explicit null.
    Null,
    /// Boolean flag.
    Bool(bool),
    /// Any number; integral values render without a fraction.
    Number(f64),
    /// Plain text. The only variant the HTML entry point escapes.
    String(String),
    /// Shared, mutable list.
    List(ListRef),
    /// Shared, mutable string-keyed object.
    Object(ObjectRef),
    /// Opaque rich content produced by the caller (e.g. an embedded widget).
    Embedded(Embedded),
}

impl Value {
    /// Borrow the text of a [`Value::String`].
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Numeric payload of a [`Value::Number`].
    #[must_use]
    pub const fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Whether this value is plain text.
    #[inline]
    #[must_use]
    pub const fn is_string(&self) -> bool {
        matches!(self, Self::String(_))
    }

    /// Short type label used in diagnostics.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Number(_) => "number",
            Self::String(_) => "string",
            Self::List(_) => "list",
            Self::Object(_) => "object",
            Self::Embedded(_) => "embedded",
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Number(a), Self::Number(b)) => a == b,
            (Self::String(a), Self::String(b)) => a == b,
            (Self::List(a), Self::List(b)) => a.ptr_eq(b),
            (Self::Object(a), Self::Object(b)) => a.ptr_eq(b),
            (Self::Embedded(a), Self::Embedded(b)) => a == b,
            _ => false,
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<i64> for Value {
    #[allow(clippy::cast_precision_loss)]
    fn from(value: i64) -> Self {
        Self::Number(value as f64)
    }
}

impl From<ObjectRef> for Value {
    fn from(value: ObjectRef) -> Self {
        Self::Object(value)
    }
}

impl From<ListRef> for Value {
    fn from(value: ListRef) -> Self {
        Self::List(value)
    }
}

impl From<Embedded> for Value {
    fn from(value: Embedded) -> Self {
        Self::Embedded(value)
    }
}

// ---------------------------------------------------------------------------
// Shared handles
// ---------------------------------------------------------------------------

/// Shared string-keyed object with identity.
///
/// Cloning the handle shares the underlying map. An object that (directly
/// or transitively) contains itself is never freed; breaking the cycle is
/// the owner's job.
#[derive(Clone, Default)]
pub struct ObjectRef(Arc<RwLock<BTreeMap<String, Value>>>);

impl ObjectRef {
    /// Create an empty object.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a member, returning the previous value.
    pub fn insert(&self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.into(), value.into())
    }

    /// Clone out a member.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<Value> {
        self.0
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    /// Number of members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Whether the object has no members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of all members in key order.
    #[must_use]
    pub fn entries(&self) -> Vec<(String, Value)> {
        self.0
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Snapshot of member values only.
    #[must_use]
    pub fn values(&self) -> Vec<Value> {
        self.0
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect()
    }

    /// Whether both handles point at the same object.
    #[inline]
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Address-based identity token.
    #[inline]
    pub(crate) fn identity(&self) -> usize {
        Arc::as_ptr(&self.0).cast::<()>() as usize
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for ObjectRef {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let map = iter
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self(Arc::new(RwLock::new(map)))
    }
}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Never print members: they may lead back to this object.
        write!(f, "ObjectRef({:#x}, len={})", self.identity(), self.len())
    }
}

/// Shared list with identity.
#[derive(Clone, Default)]
pub struct ListRef(Arc<RwLock<Vec<Value>>>);

impl ListRef {
    /// Create an empty list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an item.
    pub fn push(&self, value: impl Into<Value>) {
        self.0
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(value.into());
    }

    /// Clone out an item.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<Value> {
        self.0
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(index)
            .cloned()
    }

    /// Number of items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Whether the list is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of all items.
    #[must_use]
    pub fn items(&self) -> Vec<Value> {
        self.0.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Whether both handles point at the same list.
    #[inline]
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    #[inline]
    pub(crate) fn identity(&self) -> usize {
        Arc::as_ptr(&self.0).cast::<()>() as usize
    }
}

impl<V: Into<Value>> FromIterator<V> for ListRef {
    fn from_iter<I: IntoIterator<Item = V>>(iter: I) -> Self {
        Self(Arc::new(RwLock::new(
            iter.into_iter().map(Into::into).collect(),
        )))
    }
}

impl fmt::Debug for ListRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ListRef({:#x}, len={})", self.identity(), self.len())
    }
}

// ---------------------------------------------------------------------------
// Embedded content
// ---------------------------------------------------------------------------

/// Opaque rich content carried through formatting untouched.
///
/// The payload is never inspected, escaped or traversed. Two `Embedded`
/// values are equal only if they share the same payload allocation.
#[derive(Clone)]
pub struct Embedded {
    label: Arc<str>,
    payload: Arc<dyn Any + Send + Sync>,
}

impl Embedded {
    /// Wrap a payload under a human-readable label.
    ///
    /// The label stands in for the payload in JSON fallbacks and debug
    /// output.
    pub fn new(label: impl Into<Arc<str>>, payload: impl Any + Send + Sync) -> Self {
        Self {
            label: label.into(),
            payload: Arc::new(payload),
        }
    }

    /// Human-readable label.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Downcast the payload.
    #[must_use]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.payload.downcast_ref()
    }

    /// Whether both markers share the same payload.
    #[inline]
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.payload, &other.payload)
    }
}

impl PartialEq for Embedded {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for Embedded {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Embedded({})", self.label)
    }
}

// ---------------------------------------------------------------------------
// JSON rendering
// ---------------------------------------------------------------------------

/// Render a values map as compact JSON, as used by the `"<id> <json>"`
/// fallback.
///
/// Returns `None` when the graph is cyclic or cannot be serialized.
#[must_use]
pub fn values_to_json(values: &Values) -> Option<String> {
    if values_cyclic(values) {
        return None;
    }
    serde_json::to_string(&JsonValues(values)).ok()
}

/// Serialization views. Only constructed after a cycle check.
struct JsonValues<'a>(&'a Values);
struct JsonValue<'a>(&'a Value);

impl Serialize for JsonValues<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, value) in self.0 {
            map.serialize_entry(key, &JsonValue(value))?;
        }
        map.end()
    }
}

impl Serialize for JsonValue<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.0 {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Number(n) => serialize_number(*n, serializer),
            Value::String(s) => serializer.serialize_str(s),
            Value::Embedded(e) => serializer.serialize_str(e.label()),
            Value::List(list) => {
                let items = list.items();
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in &items {
                    seq.serialize_element(&JsonValue(item))?;
                }
                seq.end()
            }
            Value::Object(obj) => {
                let entries = obj.entries();
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (key, value) in &entries {
                    map.serialize_entry(key, &JsonValue(value))?;
                }
                map.end()
            }
        }
    }
}

#[allow(clippy::cast_possible_truncation)]
fn serialize_number<S: Serializer>(n: f64, serializer: S) -> Result<S::Ok, S::Error> {
    if !n.is_finite() {
        serializer.serialize_unit()
    } else if n.fract() == 0.0 && n.abs() < MAX_SAFE_INTEGER {
        serializer.serialize_i64(n as i64)
    } else {
        serializer.serialize_f64(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(entries: &[(&str, Value)]) -> Values {
        entries
            .iter()
            .map(|(k, v)| ((*k).to_owned(), v.clone()))
            .collect()
    }

    #[test]
    fn json_integral_numbers_have_no_fraction() {
        let v = values(&[("a", Value::from(1)), ("b", Value::from(2.5))]);
        assert_eq!(values_to_json(&v).as_deref(), Some(r#"{"a":1,"b":2.5}"#));
    }

    #[test]
    fn json_non_finite_is_null() {
        let v = values(&[("x", Value::Number(f64::NAN))]);
        assert_eq!(values_to_json(&v).as_deref(), Some(r#"{"x":null}"#));
    }

    #[test]
    fn json_nested_structures() {
        let obj: ObjectRef = [("k", "v")].into_iter().collect();
        let list: ListRef = [1, 2].into_iter().collect();
        let v = values(&[
            ("list", list.into()),
            ("obj", obj.into()),
            ("flag", true.into()),
            ("none", Value::Null),
        ]);
        assert_eq!(
            values_to_json(&v).as_deref(),
            Some(r#"{"flag":true,"list":[1,2],"none":null,"obj":{"k":"v"}}"#)
        );
    }

    #[test]
    fn json_embedded_uses_label() {
        let v = values(&[("link", Embedded::new("<Link>", ()).into())]);
        assert_eq!(values_to_json(&v).as_deref(), Some(r#"{"link":"<Link>"}"#));
    }

    #[test]
    fn json_refuses_cycles() {
        let obj = ObjectRef::new();
        obj.insert("me", obj.clone());
        let v = values(&[("o", obj.into())]);
        assert_eq!(values_to_json(&v), None);
    }

    #[test]
    fn handles_compare_by_identity() {
        let a: ObjectRef = [("k", 1)].into_iter().collect();
        let b: ObjectRef = [("k", 1)].into_iter().collect();
        assert_eq!(Value::from(a.clone()), Value::from(a.clone()));
        assert_ne!(Value::from(a), Value::from(b));
    }

    #[test]
    fn cyclic_debug_terminates() {
        let obj = ObjectRef::new();
        obj.insert("self", obj.clone());
        let rendered = format!("{:?}", Value::Object(obj));
        assert!(rendered.contains("len=1"));
    }

    #[test]
    fn embedded_downcast() {
        let e = Embedded::new("badge", 42_u8);
        assert_eq!(e.downcast_ref::<u8>(), Some(&42));
        assert_eq!(e.downcast_ref::<u16>(), None);
        assert_eq!(e.label(), "badge");
    }
}
