//! The bootstrap datum vector: a fixed list of system datums describing the
//! metadata attributes themselves, plus the enum-value entities they refer
//! to (§4.2 Bootstrap). Cyclic by construction — `sys/attr/type` describes
//! its own type — so the whole vector is built in one step from
//! pre-assigned ids and then replayed through a fresh [`SchemaCache`] rather
//! than being derived incrementally (§9 "Cyclic references").

use value::{Datum, Value};

use crate::{
    cache::SchemaCache,
    ids::{self, GENESIS_TX},
};

struct AttrSpec {
    id: value::Id,
    ident: &'static str,
    value_type: value::ValueType,
    unique: Option<value::Id>,
}

fn attribute_specs() -> Vec<AttrSpec> {
    vec![
        AttrSpec {
            id: ids::DB_IDENT,
            ident: "sys/db/ident",
            value_type: value::ValueType::String,
            unique: Some(ids::ATTR_UNIQUE_IDENTITY),
        },
        AttrSpec {
            id: ids::ATTR_TYPE,
            ident: "sys/attr/type",
            value_type: value::ValueType::Ref,
            unique: None,
        },
        AttrSpec {
            id: ids::ATTR_UNIQUE,
            ident: "sys/attr/unique",
            value_type: value::ValueType::Ref,
            unique: None,
        },
        AttrSpec {
            id: ids::ATTR_CARDINALITY,
            ident: "sys/attr/cardinality",
            value_type: value::ValueType::Ref,
            unique: None,
        },
        AttrSpec {
            id: ids::SYS_TX,
            ident: "sys/tx",
            value_type: value::ValueType::Ref,
            unique: None,
        },
        AttrSpec {
            id: ids::TX_AT,
            ident: "sys/tx/at",
            value_type: value::ValueType::Inst,
            unique: None,
        },
    ]
}

/// The enum-value entities ids 7..=16 (§6): no metadata of their own beyond
/// an ident.
fn enum_idents() -> Vec<(value::Id, &'static str)> {
    vec![
        (ids::ATTR_UNIQUE_IDENTITY, "attr/unique/identity"),
        (ids::ATTR_UNIQUE_VALUE, "attr/unique/value"),
        (ids::ATTR_CARDINALITY_ONE, "attr/cardinality/one"),
        (ids::ATTR_CARDINALITY_MANY, "attr/cardinality/many"),
        (ids::ATTR_TYPE_REF, "attr/type/ref"),
        (ids::ATTR_TYPE_STRING, "attr/type/string"),
        (ids::ATTR_TYPE_INT, "attr/type/int"),
        (ids::ATTR_TYPE_BOOL, "attr/type/bool"),
        (ids::ATTR_TYPE_INST, "attr/type/inst"),
        (ids::ATTR_TYPE_FLOAT, "attr/type/float"),
    ]
}

/// Builds the fixed bootstrap datum vector described by §6's reserved
/// attribute table, stamped under [`GENESIS_TX`].
pub fn bootstrap_datums() -> Vec<Datum> {
    let mut datums = Vec::new();
    for spec in attribute_specs() {
        datums.push(Datum::new(
            spec.id,
            ids::DB_IDENT,
            Value::String(spec.ident.to_string()),
            GENESIS_TX,
        ));
        datums.push(Datum::new(
            spec.id,
            ids::ATTR_TYPE,
            Value::Ref(ids::value_type_to_ref(spec.value_type)),
            GENESIS_TX,
        ));
        if let Some(unique_ref) = spec.unique {
            datums.push(Datum::new(
                spec.id,
                ids::ATTR_UNIQUE,
                Value::Ref(unique_ref),
                GENESIS_TX,
            ));
        }
    }
    for (id, ident) in enum_idents() {
        datums.push(Datum::new(
            id,
            ids::DB_IDENT,
            Value::String(ident.to_string()),
            GENESIS_TX,
        ));
    }
    datums
}

/// Builds a fresh [`SchemaCache`] by replaying [`bootstrap_datums`] through
/// it. Returns the cache and the datums, since both are needed to seed the
/// index (§4.5 `open`).
pub fn bootstrap() -> (SchemaCache, Vec<Datum>) {
    let datums = bootstrap_datums();
    let mut cache = SchemaCache::empty();
    for d in &datums {
        cache
            .upsert_from_datum(d)
            .expect("bootstrap datums are internally consistent by construction");
    }
    (cache, datums)
}
