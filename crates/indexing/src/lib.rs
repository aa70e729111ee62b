//! Three concurrent sorted projections over one logical datum set, with
//! range scans and structural-sharing clones (§4.1).

mod bound;
mod cardinality;
mod ordered_index;
mod unique;

pub use crate::{
    bound::{Bound, Edge},
    cardinality::{assert_cardinality_many, assert_cardinality_one},
    ordered_index::{IndexKind, OrderedIndex},
    unique::uniqueness_probe,
};

#[cfg(test)]
mod tests;
