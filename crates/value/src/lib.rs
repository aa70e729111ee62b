//! The scalar value domain, entity ids, and the datum record (§3).
//!
//! Everything here is a plain, `Clone`-cheap data type with no knowledge of
//! the index or the transactor; `indexing` and `database` build on top of
//! it.

mod claim;
mod datum;
mod id;
mod ident;
pub mod ordering;
mod value;

pub use crate::{
    claim::{AttrRef, Claim, EntityRef, LookupRef, TempId, ValueRef},
    datum::Datum,
    id::{Id, IdAllocator, ABSENT, FIRST_USER_ID},
    ident::{Ident, RESERVED_PREFIX},
    value::{Inst, Value, ValueType},
};
