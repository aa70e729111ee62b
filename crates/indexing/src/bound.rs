use value::{Id, Value};

/// A point in the shared `(E, A, V, T)` key space, used as the low or high
/// edge of a [`crate::OrderedIndex::range_scan`]. Every scan is
/// inclusive-inclusive (§4.1), so callers construct `lo`/`hi` with
/// [`Value::min_sentinel`]/[`Value::max_sentinel`] (and `Id::MIN`/`Id::MAX`)
/// in whichever fields are unconstrained for that scan.
#[derive(Debug, Clone, PartialEq)]
pub struct Bound {
    pub e: Id,
    pub a: Id,
    pub v: Value,
    pub t: Id,
}

impl Bound {
    pub fn min() -> Self {
        Bound {
            e: Id::MIN,
            a: Id::MIN,
            v: Value::min_sentinel(),
            t: Id::MIN,
        }
    }

    pub fn max() -> Self {
        Bound {
            e: Id::MAX,
            a: Id::MAX,
            v: Value::max_sentinel(),
            t: Id::MAX,
        }
    }

    /// Bounds restricted to a single entity, any attribute/value/tx.
    pub fn entity(e: Id, edge: Edge) -> Self {
        match edge {
            Edge::Low => Bound { e, ..Bound::min() },
            Edge::High => Bound { e, ..Bound::max() },
        }
    }

    /// Bounds restricted to a single `(E, A)`, any value/tx.
    pub fn entity_attr(e: Id, a: Id, edge: Edge) -> Self {
        match edge {
            Edge::Low => Bound {
                e,
                a,
                ..Bound::min()
            },
            Edge::High => Bound {
                e,
                a,
                ..Bound::max()
            },
        }
    }

    /// Bounds restricted to a single attribute, any entity/value/tx.
    pub fn attr(a: Id, edge: Edge) -> Self {
        match edge {
            Edge::Low => Bound { a, ..Bound::min() },
            Edge::High => Bound { a, ..Bound::max() },
        }
    }

    /// Bounds restricted to a single `(A, V)`, any entity/tx — the shape
    /// used for the uniqueness probe and lookup-ref resolution (§4.1).
    pub fn attr_value(a: Id, v: Value, edge: Edge) -> Self {
        match edge {
            Edge::Low => Bound {
                a,
                v,
                ..Bound::min()
            },
            Edge::High => Bound {
                a,
                v,
                ..Bound::max()
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Low,
    High,
}
