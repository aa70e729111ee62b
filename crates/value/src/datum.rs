use crate::{id::Id, value::Value};

/// An indivisible fact: `(E, A, V, T)` (§3 Datum). `T` is the id of the
/// transaction entity in which the datum became visible.
///
/// Every stored datum has non-zero `E` and `A` (I8); `Datum` does not
/// enforce that itself (it is a plain record), callers that insert into the
/// index do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Datum {
    pub e: Id,
    pub a: Id,
    pub v: Value,
    pub t: Id,
}

impl Datum {
    pub fn new(e: Id, a: Id, v: Value, t: Id) -> Self {
        Datum { e, a, v, t }
    }
}
