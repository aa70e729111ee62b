use crate::{id::Id, ident::Ident, value::Value};

/// An opaque placeholder string standing in for an as-yet-unallocated id,
/// scoped to a single write request (§3 TempID).
#[cfg_attr(any(test, feature = "testing"), derive(proptest_derive::Arbitrary))]
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TempId(pub String);

impl TempId {
    pub fn new(s: impl Into<String>) -> Self {
        TempId(s.into())
    }
}

/// `(attr-ref, value)`, resolving to the unique entity id whose datum for
/// that attribute holds that value (§3 LookupRef). The attribute must be
/// declared unique; that is checked at resolution time, not by this type.
#[derive(Debug, Clone, PartialEq)]
pub struct LookupRef {
    pub attribute: AttrRef,
    pub value: Value,
}

/// How a claim names an attribute: either already resolved to an id, or
/// symbolically by ident. Attributes are never tempids or lookup refs.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrRef {
    Id(Id),
    Ident(Ident),
}

impl From<Id> for AttrRef {
    fn from(id: Id) -> Self {
        AttrRef::Id(id)
    }
}

impl From<Ident> for AttrRef {
    fn from(ident: Ident) -> Self {
        AttrRef::Ident(ident)
    }
}

/// How a claim names an entity in `E` position: a concrete id, a tempid
/// awaiting resolution, a lookup ref, or the placeholder referring to the
/// transaction entity being created by this very batch (§4.4 Pass A).
#[derive(Debug, Clone, PartialEq)]
pub enum EntityRef {
    Id(Id),
    TempId(TempId),
    LookupRef(LookupRef),
    /// Resolves to the id of the transaction entity stamped by this batch.
    TxnId,
}

impl From<Id> for EntityRef {
    fn from(id: Id) -> Self {
        EntityRef::Id(id)
    }
}

impl From<TempId> for EntityRef {
    fn from(tempid: TempId) -> Self {
        EntityRef::TempId(tempid)
    }
}

impl From<LookupRef> for EntityRef {
    fn from(lookup: LookupRef) -> Self {
        EntityRef::LookupRef(lookup)
    }
}

/// How a claim names a value in `V` position: a concrete literal, a
/// reference expressed the same way an entity may be (tempid, lookup ref,
/// or resolved id), or absent (only legal on a retract claim, meaning
/// "retract every value of this attribute on this entity", §4.4 Pass E).
#[derive(Debug, Clone, PartialEq)]
pub enum ValueRef {
    Value(Value),
    TempId(TempId),
    LookupRef(LookupRef),
}

impl From<Value> for ValueRef {
    fn from(value: Value) -> Self {
        ValueRef::Value(value)
    }
}

impl From<TempId> for ValueRef {
    fn from(tempid: TempId) -> Self {
        ValueRef::TempId(tempid)
    }
}

impl From<LookupRef> for ValueRef {
    fn from(lookup: LookupRef) -> Self {
        ValueRef::LookupRef(lookup)
    }
}

impl From<Id> for ValueRef {
    fn from(id: Id) -> Self {
        ValueRef::Value(Value::Ref(id))
    }
}

/// An intended change to the store: `(E, A, V, retract)` (§3 Claim). `v`
/// is `None` only on a retract claim, meaning "retract whatever is there".
#[derive(Debug, Clone, PartialEq)]
pub struct Claim {
    pub e: EntityRef,
    pub a: AttrRef,
    pub v: Option<ValueRef>,
    pub retract: bool,
}

impl Claim {
    pub fn assert(e: impl Into<EntityRef>, a: impl Into<AttrRef>, v: impl Into<ValueRef>) -> Self {
        Claim {
            e: e.into(),
            a: a.into(),
            v: Some(v.into()),
            retract: false,
        }
    }

    pub fn retract(e: impl Into<EntityRef>, a: impl Into<AttrRef>, v: impl Into<ValueRef>) -> Self {
        Claim {
            e: e.into(),
            a: a.into(),
            v: Some(v.into()),
            retract: true,
        }
    }

    /// Retract every extant value of `(e, a)`, expanded against the current
    /// index at apply time (§4.4 Pass E).
    pub fn retract_all(e: impl Into<EntityRef>, a: impl Into<AttrRef>) -> Self {
        Claim {
            e: e.into(),
            a: a.into(),
            v: None,
            retract: true,
        }
    }
}
