use std::cmp::Ordering;

use crate::id::Id;

/// An instant in time at nanosecond precision (UTC). Wraps `chrono` rather
/// than re-deriving a calendar, matching how the rest of the ecosystem
/// treats timestamps as a thin newtype over a vetted crate.
pub type Inst = chrono::DateTime<chrono::Utc>;

/// A tagged scalar value. Every stored datum's `V` is one of these (§3).
///
/// `Value` has a total order across and within types. The tag order is
/// `Ref < Bool < Int < String < Inst < Float`; within a tag, values compare
/// by their native ordering (`Float` uses IEEE total order, treating `NaN`
/// as greater than everything including positive infinity, since a partial
/// order is unusable as an index key).
#[cfg_attr(any(test, feature = "testing"), derive(proptest_derive::Arbitrary))]
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Ref(Id),
    Bool(bool),
    Int(i64),
    String(String),
    #[cfg_attr(any(test, feature = "testing"), proptest(strategy = "inst_strategy()"))]
    Inst(Inst),
    Float(f64),
}

/// `chrono::DateTime<Utc>` has no `proptest::Arbitrary` impl of its own, so
/// the `Inst` variant above needs an explicit strategy: any second between
/// the Unix epoch and the end of 9999 (`DateTime`'s documented range), at
/// nanosecond-zero since the store never needs sub-second precision.
#[cfg(any(test, feature = "testing"))]
fn inst_strategy() -> impl proptest::strategy::Strategy<Value = Inst> {
    use proptest::prelude::*;
    (0i64..=253_402_300_799i64)
        .prop_map(|secs| chrono::DateTime::<chrono::Utc>::from_timestamp(secs, 0).expect("in-range unix seconds"))
}

/// The ordinal of each tag, matching the order required by §3. Kept as a
/// free function (rather than a `Value -> u8` match inlined at every call
/// site) so the total order lives in one place, mirroring
/// `internal/compare/compare.go`'s standalone comparator in the original
/// implementation.
fn tag_rank(v: &Value) -> u8 {
    match v {
        Value::Ref(_) => 0,
        Value::Bool(_) => 1,
        Value::Int(_) => 2,
        Value::String(_) => 3,
        Value::Inst(_) => 4,
        Value::Float(_) => 5,
    }
}

impl Eq for Value {}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Value::Ref(a), Value::Ref(b)) => a.cmp(b),
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            (Value::Int(a), Value::Int(b)) => a.cmp(b),
            (Value::String(a), Value::String(b)) => a.cmp(b),
            (Value::Inst(a), Value::Inst(b)) => a.cmp(b),
            (Value::Float(a), Value::Float(b)) => total_cmp_f64(*a, *b),
            _ => tag_rank(self).cmp(&tag_rank(other)),
        }
    }
}

/// Total order over `f64` treating `NaN` as the largest value. `f64::total_cmp`
/// would also work but orders negative and positive `NaN` differently, which
/// we have no use for and would make the comparator harder to reason about.
fn total_cmp_f64(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => a.partial_cmp(&b).expect("non-NaN floats are totally ordered"),
    }
}

impl Value {
    /// The smallest possible `Value` under the total order: used as the low
    /// bound of an `[E, A, min]..[E, A, max]` range scan (§4.1).
    pub fn min_sentinel() -> Value {
        Value::Ref(Id::MIN)
    }

    /// The largest possible `Value` under the total order: used as the high
    /// bound of an `[E, A, min]..[E, A, max]` range scan (§4.1).
    pub fn max_sentinel() -> Value {
        Value::Float(f64::NAN)
    }

    /// The declared type tag this value would satisfy, used to check I4
    /// against an attribute's declared `type`.
    pub fn type_tag(&self) -> ValueType {
        match self {
            Value::Ref(_) => ValueType::Ref,
            Value::Bool(_) => ValueType::Bool,
            Value::Int(_) => ValueType::Int,
            Value::String(_) => ValueType::String,
            Value::Inst(_) => ValueType::Inst,
            Value::Float(_) => ValueType::Float,
        }
    }

    pub fn as_ref_id(&self) -> Option<Id> {
        match self {
            Value::Ref(id) => Some(*id),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }
}

/// The closed set of types an attribute may declare (§3 Attribute.type).
#[cfg_attr(any(test, feature = "testing"), derive(proptest_derive::Arbitrary))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    Ref,
    String,
    Int,
    Bool,
    Inst,
    Float,
}

impl ValueType {
    pub fn name(self) -> &'static str {
        match self {
            ValueType::Ref => "ref",
            ValueType::String => "string",
            ValueType::Int => "int",
            ValueType::Bool => "bool",
            ValueType::Inst => "inst",
            ValueType::Float => "float",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_order_matches_spec() {
        let mut vals = vec![
            Value::Float(1.0),
            Value::Inst(chrono::Utc::now()),
            Value::String("x".into()),
            Value::Int(1),
            Value::Bool(true),
            Value::Ref(Id(1)),
        ];
        vals.sort();
        let ranks: Vec<u8> = vals.iter().map(tag_rank).collect();
        assert_eq!(ranks, vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn sentinels_bound_every_value_of_every_type() {
        let lo = Value::min_sentinel();
        let hi = Value::max_sentinel();
        let samples = vec![
            Value::Ref(Id(u64::MAX)),
            Value::Bool(true),
            Value::Int(i64::MAX),
            Value::String("zzzzzzzzzzzzzzzzzzzzzzzz".into()),
            Value::Inst(chrono::Utc::now()),
            Value::Float(f64::MAX),
        ];
        for v in samples {
            assert!(lo <= v, "{v:?} should be >= min sentinel");
            assert!(v <= hi, "{v:?} should be <= max sentinel");
        }
    }

    #[cfg(feature = "testing")]
    mod proptests {
        use proptest::prelude::*;

        use super::super::*;

        proptest! {
            #[test]
            fn ord_is_total_and_antisymmetric(a: Value, b: Value) {
                let ab = a.cmp(&b);
                let ba = b.cmp(&a);
                prop_assert_eq!(ab, ba.reverse());
            }
        }
    }
}
