use std::{collections::BTreeMap, sync::Arc};

use errors::DbError;
use indexing::{Bound, IndexKind, OrderedIndex};
use schema::{AttrMeta, Cardinality, SchemaCache};
use value::{Datum, Id, Ident, LookupRef, Value};

use crate::selection::{self, Selection};

/// A cardinality-one attribute dumps as a bare value; cardinality-many
/// dumps as an ordered list, in ascending value order (§6 Snapshot.dump,
/// and the `original_source/` supplement pinning that ordering).
#[derive(Debug, Clone, PartialEq)]
pub enum DumpValue {
    One(Value),
    Many(Vec<Value>),
}

pub type EntityDump = BTreeMap<String, DumpValue>;

/// A read-only, point-in-time view over the store (§4.6). Cheap to
/// `Clone` — it only clones two `Arc`s — so holding one alive keeps that
/// point in time observable regardless of later writes (§5 "Reads at
/// snapshot N are linearizable w.r.t. writes up to and including Ttx=N").
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub(crate) index: Arc<OrderedIndex>,
    pub(crate) schema: Arc<SchemaCache>,
}

impl Snapshot {
    pub(crate) fn new(index: Arc<OrderedIndex>, schema: Arc<SchemaCache>) -> Self {
        Snapshot { index, schema }
    }

    /// Runs `selection` against this snapshot (§4.3). The returned
    /// iterator borrows this snapshot and may be dropped mid-iteration
    /// without leaking (§5).
    pub fn select(&self, selection: &Selection) -> Result<Box<dyn DoubleEndedIterator<Item = Datum> + '_>, DbError> {
        selection::select(selection, &self.index, &self.schema)
    }

    pub fn attr_by_id(&self, id: Id) -> Option<AttrMeta> {
        self.schema.get_by_id(id).cloned()
    }

    pub fn attr_by_ident(&self, ident: &Ident) -> Option<AttrMeta> {
        self.schema.get_by_ident(ident).and_then(|id| self.schema.get_by_id(id)).cloned()
    }

    pub fn resolve_ident(&self, ident: &Ident) -> Option<Id> {
        self.schema.get_by_ident(ident)
    }

    /// A pure function of this snapshot (not of any live connection state):
    /// resolving the same `LookupRef` against an older, retained snapshot
    /// gives that snapshot's answer even after later writes (§4.6,
    /// `original_source/` supplement 2).
    pub fn resolve_lookup_ref(&self, lookup_ref: &LookupRef) -> Result<Id, DbError> {
        selection::resolve_lookup_ref(lookup_ref, &self.index, &self.schema)
    }

    /// Whether any datum has `id` as its `E` (`original_source/` supplement
    /// 3 — distinguishes "no datums for this id" from "id unknown").
    pub fn entity_exists(&self, id: Id) -> bool {
        let lo = Bound::entity(id, indexing::Edge::Low);
        let hi = Bound::entity(id, indexing::Edge::High);
        self.index.range_scan(IndexKind::Eav, &lo, &hi, true).next().is_some()
    }

    /// A debug view of one entity: `ident → value|values`, or `None` if
    /// [`Self::entity_exists`] is false for `id`.
    pub fn dump_entity(&self, id: Id) -> Option<EntityDump> {
        if !self.entity_exists(id) {
            return None;
        }
        let lo = Bound::entity(id, indexing::Edge::Low);
        let hi = Bound::entity(id, indexing::Edge::High);
        let mut out = EntityDump::new();
        for d in self.index.range_scan(IndexKind::Eav, &lo, &hi, true) {
            self.accumulate(&mut out, &d);
        }
        Some(out)
    }

    /// A debug view of the whole store: `id → {ident → value|values}`
    /// (§6 Snapshot.dump). Aggregates cardinality-many attributes in the
    /// ascending value order a fixed-`(E, A)` EAV scan already yields,
    /// matching the original's AVE-derived dump order.
    pub fn dump(&self) -> BTreeMap<Id, EntityDump> {
        let mut out: BTreeMap<Id, EntityDump> = BTreeMap::new();
        for d in self.index.range_scan(IndexKind::Eav, &Bound::min(), &Bound::max(), true) {
            let entity = out.entry(d.e).or_default();
            self.accumulate(entity, &d);
        }
        out
    }

    fn accumulate(&self, entity: &mut EntityDump, d: &Datum) {
        let ident = self.schema.ident_of(d.a).map(|i| i.to_string()).unwrap_or_else(|| d.a.to_string());
        let many = self
            .schema
            .get_by_id(d.a)
            .map(|m| m.cardinality == Cardinality::Many)
            .unwrap_or(false);
        match entity.get_mut(&ident) {
            Some(DumpValue::Many(values)) => values.push(d.v.clone()),
            Some(DumpValue::One(_)) => {},
            None => {
                entity.insert(
                    ident,
                    if many { DumpValue::Many(vec![d.v.clone()]) } else { DumpValue::One(d.v.clone()) },
                );
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use schema::ids;

    use super::*;

    fn bootstrapped_snapshot() -> Snapshot {
        let (schema, datums) = schema::bootstrap();
        let mut index = OrderedIndex::new();
        for d in datums {
            index.insert(d);
        }
        Snapshot::new(Arc::new(index), Arc::new(schema))
    }

    /// S1: selecting by the bootstrap ident yields exactly three datums.
    #[test]
    fn select_by_ident_returns_bootstrap_triple() {
        let snapshot = bootstrapped_snapshot();
        let selection = Selection { e: crate::selection::Sel::id(ids::DB_IDENT), ..Default::default() };
        let got: Vec<_> = snapshot.select(&selection).unwrap().collect();
        assert_eq!(got.len(), 3);
    }

    #[test]
    fn entity_exists_is_false_for_unwritten_ids() {
        let snapshot = bootstrapped_snapshot();
        assert!(snapshot.entity_exists(ids::DB_IDENT));
        assert!(!snapshot.entity_exists(Id(0x9999)));
        assert!(snapshot.dump_entity(Id(0x9999)).is_none());
    }

    #[test]
    fn dump_describes_entity_one_completely() {
        let snapshot = bootstrapped_snapshot();
        let dump = snapshot.dump_entity(ids::DB_IDENT).unwrap();
        assert_eq!(dump.len(), 3);
        assert_eq!(dump.get("sys/db/ident"), Some(&DumpValue::One(Value::String("sys/db/ident".into()))));
    }
}
