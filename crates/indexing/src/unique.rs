use value::{Id, Value};

use crate::{
    bound::{Bound, Edge},
    ordered_index::{IndexKind, OrderedIndex},
};

/// AVE range-scans `[a, v, 0]..[a, v, max-id]` for any entity already
/// holding `v` for the unique attribute `a`, other than `claimant` (§4.1
/// Uniqueness probe). Returns the id of the conflicting entity, if any.
pub fn uniqueness_probe(index: &OrderedIndex, a: Id, v: &Value, claimant: Id) -> Option<Id> {
    let lo = Bound::attr_value(a, v.clone(), Edge::Low);
    let hi = Bound::attr_value(a, v.clone(), Edge::High);
    index
        .range_scan(IndexKind::Ave, &lo, &hi, true)
        .map(|d| d.e)
        .find(|&e| e != claimant)
}
