//! Reserved ids for the system bootstrap (§6). Ids 1..=16 are fixed by the
//! spec's reserved attribute table; `GENESIS_TX` is this crate's choice of
//! id for the transaction entity that the bootstrap batch is stamped under,
//! picked from the remaining reserved range `(16, FIRST_USER_ID)`.

use value::{Id, ValueType};

use crate::attr_meta::{Cardinality, Uniqueness};

pub const DB_IDENT: Id = Id(1);
pub const ATTR_TYPE: Id = Id(2);
pub const ATTR_UNIQUE: Id = Id(3);
pub const ATTR_CARDINALITY: Id = Id(4);
pub const SYS_TX: Id = Id(5);
pub const TX_AT: Id = Id(6);

pub const ATTR_UNIQUE_IDENTITY: Id = Id(7);
pub const ATTR_UNIQUE_VALUE: Id = Id(8);
pub const ATTR_CARDINALITY_ONE: Id = Id(9);
pub const ATTR_CARDINALITY_MANY: Id = Id(10);
pub const ATTR_TYPE_REF: Id = Id(11);
pub const ATTR_TYPE_STRING: Id = Id(12);
pub const ATTR_TYPE_INT: Id = Id(13);
pub const ATTR_TYPE_BOOL: Id = Id(14);
pub const ATTR_TYPE_INST: Id = Id(15);
pub const ATTR_TYPE_FLOAT: Id = Id(16);

/// The id of the transaction entity that asserted the bootstrap datums.
pub const GENESIS_TX: Id = Id(17);

pub fn ref_to_value_type(id: Id) -> Option<ValueType> {
    match id {
        ATTR_TYPE_REF => Some(ValueType::Ref),
        ATTR_TYPE_STRING => Some(ValueType::String),
        ATTR_TYPE_INT => Some(ValueType::Int),
        ATTR_TYPE_BOOL => Some(ValueType::Bool),
        ATTR_TYPE_INST => Some(ValueType::Inst),
        ATTR_TYPE_FLOAT => Some(ValueType::Float),
        _ => None,
    }
}

pub fn value_type_to_ref(vt: ValueType) -> Id {
    match vt {
        ValueType::Ref => ATTR_TYPE_REF,
        ValueType::String => ATTR_TYPE_STRING,
        ValueType::Int => ATTR_TYPE_INT,
        ValueType::Bool => ATTR_TYPE_BOOL,
        ValueType::Inst => ATTR_TYPE_INST,
        ValueType::Float => ATTR_TYPE_FLOAT,
    }
}

pub fn ref_to_cardinality(id: Id) -> Option<Cardinality> {
    match id {
        ATTR_CARDINALITY_ONE => Some(Cardinality::One),
        ATTR_CARDINALITY_MANY => Some(Cardinality::Many),
        _ => None,
    }
}

pub fn cardinality_to_ref(c: Cardinality) -> Id {
    match c {
        Cardinality::One => ATTR_CARDINALITY_ONE,
        Cardinality::Many => ATTR_CARDINALITY_MANY,
    }
}

pub fn ref_to_uniqueness(id: Id) -> Option<Uniqueness> {
    match id {
        ATTR_UNIQUE_IDENTITY => Some(Uniqueness::Identity),
        ATTR_UNIQUE_VALUE => Some(Uniqueness::Value),
        _ => None,
    }
}

pub fn uniqueness_to_ref(u: Uniqueness) -> Option<Id> {
    match u {
        Uniqueness::Identity => Some(ATTR_UNIQUE_IDENTITY),
        Uniqueness::Value => Some(ATTR_UNIQUE_VALUE),
        Uniqueness::None => None,
    }
}

/// Is `id` one of the four metadata attributes the schema cache denormalizes?
pub fn is_metadata_attribute(id: Id) -> bool {
    matches!(id, DB_IDENT | ATTR_TYPE | ATTR_UNIQUE | ATTR_CARDINALITY)
}
