use value::{Datum, Id, Value};

use crate::{
    bound::{Bound, Edge},
    ordered_index::{IndexKind, OrderedIndex},
};

/// Asserts `(e, a, v_new, t)` for a cardinality-one attribute (I2). Range-scans
/// EAV for the extant `(e, a)` datum; if none, inserts. If the extant value
/// already equals `v_new`, the index is left unchanged. Otherwise the extant
/// datum is deleted and the new one inserted.
///
/// Returns the previous datum, if any was replaced (the transactor does not
/// surface it as history, but index-level callers may want it).
pub fn assert_cardinality_one(
    index: &mut OrderedIndex,
    e: Id,
    a: Id,
    v_new: Value,
    t: Id,
) -> Option<Datum> {
    let lo = Bound::entity_attr(e, a, Edge::Low);
    let hi = Bound::entity_attr(e, a, Edge::High);
    let extant: Option<Datum> = index.range_scan(IndexKind::Eav, &lo, &hi, true).next();

    match extant {
        None => {
            index.insert(Datum::new(e, a, v_new, t));
            None
        },
        Some(prev) if prev.v == v_new => None,
        Some(prev) => {
            index.delete(&prev);
            index.insert(Datum::new(e, a, v_new, t));
            Some(prev)
        },
    }
}

/// Asserts `(e, a, v, t)` for a cardinality-many attribute (I3). A no-op if
/// the exact value is already present; otherwise inserts it alongside any
/// other values already held for `(e, a)`.
pub fn assert_cardinality_many(index: &mut OrderedIndex, e: Id, a: Id, v: Value, t: Id) -> bool {
    let lo = Bound {
        e,
        a,
        v: v.clone(),
        t: Id::MIN,
    };
    let hi = Bound {
        e,
        a,
        v: v.clone(),
        t: Id::MAX,
    };
    let exists = index.range_scan(IndexKind::Eav, &lo, &hi, true).next().is_some();
    if exists {
        return false;
    }
    index.insert(Datum::new(e, a, v, t));
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(s: &str) -> Value {
        Value::String(s.to_string())
    }

    #[test]
    fn cardinality_one_replaces_extant_value() {
        let mut idx = OrderedIndex::new();
        assert_cardinality_one(&mut idx, Id(1), Id(2), Value::Int(48), Id(100));
        let prev = assert_cardinality_one(&mut idx, Id(1), Id(2), Value::Int(49), Id(101));
        assert_eq!(prev.unwrap().v, Value::Int(48));
        let lo = Bound::entity_attr(Id(1), Id(2), Edge::Low);
        let hi = Bound::entity_attr(Id(1), Id(2), Edge::High);
        let remaining: Vec<_> = idx.range_scan(IndexKind::Eav, &lo, &hi, true).collect();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].v, Value::Int(49));
    }

    #[test]
    fn cardinality_one_reasserting_same_value_is_unchanged() {
        let mut idx = OrderedIndex::new();
        assert_cardinality_one(&mut idx, Id(1), Id(2), Value::Int(48), Id(100));
        let prev = assert_cardinality_one(&mut idx, Id(1), Id(2), Value::Int(48), Id(101));
        assert!(prev.is_none());
        let lo = Bound::entity_attr(Id(1), Id(2), Edge::Low);
        let hi = Bound::entity_attr(Id(1), Id(2), Edge::High);
        let remaining: Vec<_> = idx.range_scan(IndexKind::Eav, &lo, &hi, true).collect();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].t, Id(100));
    }

    #[test]
    fn cardinality_many_accumulates_distinct_values() {
        let mut idx = OrderedIndex::new();
        assert!(assert_cardinality_many(&mut idx, Id(1), Id(2), Value::Int(23), Id(100)));
        assert!(assert_cardinality_many(&mut idx, Id(1), Id(2), Value::Int(109), Id(101)));
        assert!(assert_cardinality_many(&mut idx, Id(1), Id(2), Value::Int(99), Id(102)));
        let lo = Bound::entity_attr(Id(1), Id(2), Edge::Low);
        let hi = Bound::entity_attr(Id(1), Id(2), Edge::High);
        let got: Vec<_> = idx
            .range_scan(IndexKind::Eav, &lo, &hi, true)
            .map(|d| d.v)
            .collect();
        assert_eq!(got, vec![Value::Int(23), Value::Int(99), Value::Int(109)]);
    }

    #[test]
    fn cardinality_many_reasserting_same_value_is_noop() {
        let mut idx = OrderedIndex::new();
        assert!(assert_cardinality_many(&mut idx, Id(1), Id(2), s("a"), Id(100)));
        assert!(!assert_cardinality_many(&mut idx, Id(1), Id(2), s("a"), Id(101)));
        assert_eq!(idx.len(), 1);
    }
}
