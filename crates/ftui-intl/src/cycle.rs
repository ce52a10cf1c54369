//! Identity-based cycle detection over caller-owned value graphs.
//!
//! The walk is an explicit depth-first search that keeps the identities of
//! the objects on the current path. Reaching an object already on the path
//! means the graph loops back on itself. Only objects and lists have
//! identity; primitives and [`Embedded`](crate::value::Embedded) markers are
//! leaves.
//!
//! Shared but acyclic references (two members pointing at the same object)
//! are not cycles: the object is popped from the path before its sibling is
//! visited.
//!
//! # Invariants
//!
//! | Set    | Holds                                   | Answer on revisit |
//! |--------|-----------------------------------------|-------------------|
//! | `path` | objects between the root and the cursor | cycle             |
//! | `done` | objects whose subgraph is fully walked  | skip              |
//!
//! Every object is expanded at most once, so the walk is linear in the
//! number of distinct objects and edges even for heavily shared graphs.

use rustc_hash::FxHashSet;
use smallvec::SmallVec;

use crate::value::{Value, Values};

#[derive(Default)]
struct Walk {
    /// Identities of the objects on the current DFS path.
    path: SmallVec<[usize; 8]>,
    /// Identities proven not to reach a cycle.
    done: FxHashSet<usize>,
}

/// Whether `value` reaches itself through object or list members.
#[must_use]
pub fn is_cyclic(value: &Value) -> bool {
    Walk::default().detect(value)
}

/// Whether any value in the map is part of, or leads into, a cycle.
#[must_use]
pub fn values_cyclic(values: &Values) -> bool {
    let mut walk = Walk::default();
    values.values().any(|value| walk.detect(value))
}

impl Walk {
    fn detect(&mut self, value: &Value) -> bool {
        let (identity, children) = match value {
            Value::Object(obj) => (obj.identity(), obj.values()),
            Value::List(list) => (list.identity(), list.items()),
            _ => return false,
        };

        if self.path.contains(&identity) {
            return true;
        }
        if self.done.contains(&identity) {
            return false;
        }

        self.path.push(identity);
        let found = children.iter().any(|child| self.detect(child));
        self.path.pop();
        if !found {
            self.done.insert(identity);
        }
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{Embedded, ListRef, ObjectRef};

    #[test]
    fn primitives_are_acyclic() {
        for v in [
            Value::Null,
            Value::Bool(true),
            Value::Number(1.0),
            Value::from("x"),
            Value::from(Embedded::new("e", ())),
        ] {
            assert!(!is_cyclic(&v));
        }
    }

    #[test]
    fn self_reference_at_root() {
        let obj = ObjectRef::new();
        obj.insert("self", obj.clone());
        assert!(is_cyclic(&Value::Object(obj)));
    }

    #[test]
    fn indirect_cycle_through_list() {
        let obj = ObjectRef::new();
        let list = ListRef::new();
        list.push(1);
        list.push(obj.clone());
        obj.insert("items", list.clone());
        assert!(is_cyclic(&Value::List(list)));
        assert!(is_cyclic(&Value::Object(obj)));
    }

    #[test]
    fn deep_cycle_is_found() {
        let root = ObjectRef::new();
        let mut cursor = root.clone();
        for _ in 0..32 {
            let next = ObjectRef::new();
            cursor.insert("next", next.clone());
            cursor = next;
        }
        cursor.insert("back", root.clone());
        assert!(is_cyclic(&Value::Object(root)));
    }

    #[test]
    fn shared_reference_is_not_a_cycle() {
        let shared: ObjectRef = [("leaf", 1)].into_iter().collect();
        let root = ObjectRef::new();
        root.insert("a", shared.clone());
        root.insert("b", shared);
        assert!(!is_cyclic(&Value::Object(root)));
    }

    #[test]
    fn same_object_under_two_names_in_values() {
        let shared: ObjectRef = [("leaf", 1)].into_iter().collect();
        let mut values = Values::new();
        values.insert("a".into(), shared.clone().into());
        values.insert("b".into(), shared.into());
        assert!(!values_cyclic(&values));
    }

    #[test]
    fn values_with_cycle() {
        let obj = ObjectRef::new();
        obj.insert("self", obj.clone());
        let mut values = Values::new();
        values.insert("name".into(), "Ann".into());
        values.insert("obj".into(), obj.into());
        assert!(values_cyclic(&values));
    }

    /// Every rung holds two references to the next one: 2^depth paths but
    /// only `depth` objects.
    fn ladder(depth: usize) -> ObjectRef {
        let root = ObjectRef::new();
        let mut rung = root.clone();
        for _ in 0..depth {
            let next = ObjectRef::new();
            rung.insert("left", next.clone());
            rung.insert("right", next.clone());
            rung = next;
        }
        root
    }

    #[test]
    fn shared_ladder_is_walked_once_per_rung() {
        let root = ladder(40);
        assert!(!is_cyclic(&Value::Object(root.clone())));

        let mut values = Values::new();
        values.insert("a".into(), root.clone().into());
        values.insert("b".into(), root.into());
        assert!(!values_cyclic(&values));
    }

    #[test]
    fn cycle_below_shared_ladder_is_found() {
        let root = ladder(40);
        let mut bottom = root.clone();
        while let Some(Value::Object(next)) = bottom.get("left") {
            bottom = next;
        }
        bottom.insert("back", root.clone());
        assert!(is_cyclic(&Value::Object(root)));
    }

    #[test]
    fn empty_values_are_acyclic() {
        assert!(!values_cyclic(&Values::new()));
    }
}
