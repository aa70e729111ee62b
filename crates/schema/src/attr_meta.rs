use value::{Id, Ident, ValueType};

/// How many distinct values an attribute permits per entity (§3 Attribute.
/// cardinality). Absent is treated as `One`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    One,
    Many,
}

impl Default for Cardinality {
    fn default() -> Self {
        Cardinality::One
    }
}

/// Whether an attribute's value must be unique across entities, and if so,
/// whether asserting a shared value merges two tempids into one id (§3
/// Attribute.unique, GLOSSARY). Absent is treated as `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Uniqueness {
    None,
    Value,
    Identity,
}

impl Default for Uniqueness {
    fn default() -> Self {
        Uniqueness::None
    }
}

impl Uniqueness {
    pub fn is_unique(self) -> bool {
        !matches!(self, Uniqueness::None)
    }
}

/// Denormalized metadata for one attribute entity (§4.2). Immutable once
/// its `type`/`cardinality`/`unique` fields are first set (I5); `upsert`
/// only ever fills in previously-unset fields or rejects a conflicting
/// change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttrMeta {
    pub id: Id,
    pub ident: Ident,
    pub value_type: Option<ValueType>,
    pub cardinality: Cardinality,
    pub unique: Uniqueness,
    /// Whether `cardinality` was ever explicitly asserted, as opposed to
    /// defaulted. Needed to tell "unset" apart from "set to `One`" when
    /// enforcing I5.
    pub(crate) cardinality_set: bool,
    /// Whether `unique` was ever explicitly asserted; see `cardinality_set`.
    pub(crate) unique_set: bool,
}

impl AttrMeta {
    pub fn new(id: Id, ident: Ident) -> Self {
        AttrMeta {
            id,
            ident,
            value_type: None,
            cardinality: Cardinality::One,
            unique: Uniqueness::None,
            cardinality_set: false,
            unique_set: false,
        }
    }
}
