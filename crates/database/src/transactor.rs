//! The nine-pass batch pipeline (§4.4). Each pass is a private method on
//! [`TransactorState`] so tests can drive them individually; the public
//! entry point is [`TransactorState::apply_batch`].

use std::collections::HashMap;

use errors::DbError;
use indexing::{assert_cardinality_many, assert_cardinality_one, uniqueness_probe, Bound, Edge, IndexKind, OrderedIndex};
use schema::{ids, Cardinality, SchemaCache};
use value::{AttrRef, Claim, Datum, EntityRef, Id, IdAllocator, Ident, Inst, TempId, Value, ValueRef};

use crate::selection::resolve_lookup_ref;

/// The outcome of a successful batch: the new transaction id, the
/// tempid→id bindings minted for it, and the new index/schema pair ready
/// to be published by the connection (§4.4 step 10).
pub struct TransactorOutcome {
    pub ttx: Id,
    pub tempids: HashMap<TempId, Id>,
    pub index: OrderedIndex,
    pub schema: SchemaCache,
}

/// An `E`/`V` position after Pass A: either already concrete, or still a
/// symbolic tempid awaiting Pass B/C (entity) or Pass B/C/D (value).
#[derive(Debug, Clone)]
enum Pending<T> {
    Resolved(T),
    TempId(TempId),
}

#[derive(Debug, Clone)]
struct ResolvedClaim {
    e: Pending<Id>,
    a: Id,
    /// `None` only for a nil-V retract-all claim (expanded in Pass E).
    v: Option<Pending<Value>>,
    retract: bool,
}

/// A claim with every position concrete, but a retract's nil `V` not yet
/// expanded against the index (Pass E's input).
struct FinalClaim {
    e: Id,
    a: Id,
    v: Option<Value>,
    retract: bool,
}

/// One committed or retracted datum, ready for Pass F.
struct Op {
    e: Id,
    a: Id,
    v: Value,
    retract: bool,
}

pub struct TransactorState {
    index: OrderedIndex,
    schema: SchemaCache,
    ttx: Id,
    tempids: HashMap<TempId, Id>,
}

impl TransactorState {
    /// Runs the full pipeline against `claims`. On success, returns the new
    /// index/schema pair and tempid bindings for the connection to
    /// publish; on failure, the allocator is rolled back to its pre-batch
    /// watermark and the caller's index/schema are untouched (§4.4 step 10).
    pub fn apply_batch(
        claims: &[Claim],
        index: &OrderedIndex,
        schema: &SchemaCache,
        allocator: &mut IdAllocator,
        now: Inst,
    ) -> Result<TransactorOutcome, DbError> {
        let watermark = allocator.watermark();
        match Self::run(claims, index, schema, allocator, now) {
            Ok(outcome) => {
                tracing::debug!(claims = claims.len(), ttx = %outcome.ttx, "batch applied");
                Ok(outcome)
            },
            Err(err) => {
                allocator.rollback_to(watermark);
                tracing::warn!(error = %errors::ShortTag(&err), "batch rejected");
                Err(err)
            },
        }
    }

    fn run(
        claims: &[Claim],
        index: &OrderedIndex,
        schema: &SchemaCache,
        allocator: &mut IdAllocator,
        now: Inst,
    ) -> Result<TransactorOutcome, DbError> {
        let ttx = allocator.allocate()?;
        let mut state = TransactorState {
            index: index.clone(),
            schema: schema.clone(),
            ttx,
            tempids: HashMap::new(),
        };

        let resolved = state.pass_a(claims)?;
        state.pass_b(&resolved)?;
        state.pass_c(&resolved, allocator)?;
        let finalized = state.pass_d(resolved)?;
        let ops = state.pass_e(finalized)?;
        state.pass_f(ops)?;
        state.stamp_transaction(now);

        Ok(TransactorOutcome {
            ttx: state.ttx,
            tempids: state.tempids,
            index: state.index,
            schema: state.schema,
        })
    }

    /// Pass A — reference resolution (§4.4 step 3).
    fn pass_a(&self, claims: &[Claim]) -> Result<Vec<ResolvedClaim>, DbError> {
        claims.iter().map(|c| self.resolve_claim(c)).collect()
    }

    fn resolve_claim(&self, c: &Claim) -> Result<ResolvedClaim, DbError> {
        let e = match &c.e {
            EntityRef::Id(id) => {
                if id.is_absent() {
                    return Err(DbError::InvalidClaim("entity id 0 is reserved and cannot be claimed against".into()));
                }
                Pending::Resolved(*id)
            },
            EntityRef::TempId(t) => Pending::TempId(t.clone()),
            EntityRef::LookupRef(lr) => Pending::Resolved(resolve_lookup_ref(lr, &self.index, &self.schema)?),
            EntityRef::TxnId => Pending::Resolved(self.ttx),
        };

        let a = self.resolve_attr(&c.a)?;
        if self.schema.get_by_id(a).is_none() {
            return Err(DbError::UnknownAttribute(
                self.schema.ident_of(a).map(|i| i.to_string()).unwrap_or_else(|| a.to_string()),
            ));
        }

        let v = match &c.v {
            None => {
                if !c.retract {
                    return Err(DbError::InvalidClaim("non-retract claim requires a value".into()));
                }
                None
            },
            Some(ValueRef::Value(v)) => Some(Pending::Resolved(v.clone())),
            Some(ValueRef::TempId(t)) => Some(Pending::TempId(t.clone())),
            Some(ValueRef::LookupRef(lr)) => {
                Some(Pending::Resolved(Value::Ref(resolve_lookup_ref(lr, &self.index, &self.schema)?)))
            },
        };

        Ok(ResolvedClaim { e, a, v, retract: c.retract })
    }

    fn resolve_attr(&self, a: &AttrRef) -> Result<Id, DbError> {
        match a {
            AttrRef::Id(id) => Ok(*id),
            AttrRef::Ident(ident) => self
                .schema
                .get_by_ident(ident)
                .ok_or_else(|| DbError::Unresolvable(format!("unknown ident {ident}"))),
        }
    }

    /// Pass B — tempid resolution for identity-unique attributes (§4.4
    /// step 4).
    fn pass_b(&mut self, claims: &[ResolvedClaim]) -> Result<(), DbError> {
        for claim in claims {
            let Pending::TempId(tempid) = &claim.e else { continue };
            let Some(meta) = self.schema.get_by_id(claim.a) else { continue };
            if meta.unique != schema::Uniqueness::Identity {
                continue;
            }
            let Some(Pending::Resolved(v)) = &claim.v else { continue };

            let lo = Bound::attr_value(claim.a, v.clone(), Edge::Low);
            let hi = Bound::attr_value(claim.a, v.clone(), Edge::High);
            let Some(found) = self.index.range_scan(IndexKind::Ave, &lo, &hi, true).map(|d| d.e).next() else {
                continue;
            };

            match self.tempids.get(tempid) {
                Some(&existing) if existing != found => {
                    return Err(DbError::InvalidClaim(format!(
                        "tempid {tempid:?} resolves to both entity {existing} and entity {found}"
                    )));
                },
                _ => {
                    self.tempids.insert(tempid.clone(), found);
                },
            }
        }
        Ok(())
    }

    /// Pass C — allocate remaining entity tempids (§4.4 step 5).
    fn pass_c(&mut self, claims: &[ResolvedClaim], allocator: &mut IdAllocator) -> Result<(), DbError> {
        for claim in claims {
            if let Pending::TempId(tempid) = &claim.e {
                if !self.tempids.contains_key(tempid) {
                    let id = allocator.allocate()?;
                    self.tempids.insert(tempid.clone(), id);
                }
            }
        }
        Ok(())
    }

    /// Pass D — value tempid substitution (§4.4 step 6), plus the
    /// corresponding entity-position lookup (every E-position tempid is
    /// bound by now, by Pass B or C).
    fn pass_d(&self, claims: Vec<ResolvedClaim>) -> Result<Vec<FinalClaim>, DbError> {
        claims
            .into_iter()
            .map(|c| {
                let e = match c.e {
                    Pending::Resolved(id) => id,
                    Pending::TempId(t) => *self
                        .tempids
                        .get(&t)
                        .ok_or_else(|| DbError::InvalidClaim(format!("unbound tempid {t:?}")))?,
                };
                let v = match c.v {
                    None => None,
                    Some(Pending::Resolved(v)) => Some(v),
                    Some(Pending::TempId(t)) => Some(Value::Ref(*self.tempids.get(&t).ok_or_else(|| {
                        DbError::InvalidClaim(format!("value tempid {t:?} was never bound to an entity"))
                    })?)),
                };
                Ok(FinalClaim { e, a: c.a, v, retract: c.retract })
            })
            .collect()
    }

    /// Pass E — expansion of nil-V retractions (§4.4 step 7).
    fn pass_e(&self, claims: Vec<FinalClaim>) -> Result<Vec<Op>, DbError> {
        let mut ops = Vec::with_capacity(claims.len());
        for claim in claims {
            match claim.v {
                Some(v) => ops.push(Op { e: claim.e, a: claim.a, v, retract: claim.retract }),
                None => {
                    let lo = Bound::entity_attr(claim.e, claim.a, Edge::Low);
                    let hi = Bound::entity_attr(claim.e, claim.a, Edge::High);
                    for d in self.index.range_scan(IndexKind::Eav, &lo, &hi, true) {
                        ops.push(Op { e: d.e, a: d.a, v: d.v, retract: true });
                    }
                },
            }
        }
        Ok(ops)
    }

    /// Pass F — application, in original claim order (§4.4 step 8).
    fn pass_f(&mut self, ops: Vec<Op>) -> Result<(), DbError> {
        for op in ops {
            self.apply_one(op)?;
        }
        Ok(())
    }

    fn apply_one(&mut self, op: Op) -> Result<(), DbError> {
        let Op { e, a, v, retract } = op;
        let meta = self.schema.get_by_id(a).cloned();

        if let Some(meta) = &meta {
            if let Some(expected) = meta.value_type {
                if v.type_tag() != expected {
                    return Err(DbError::InvalidValue(format!(
                        "{} expects {} but got {:?}",
                        meta.ident,
                        expected.name(),
                        v
                    )));
                }
            }
        }

        if a == ids::DB_IDENT && !retract {
            if let Value::String(s) = &v {
                if Ident::new(s.clone()).is_reserved() && !e.is_system() {
                    return Err(DbError::InvalidUserIdent(s.clone()));
                }
            }
        }

        if retract {
            if ids::is_metadata_attribute(a) && e.is_system() {
                return Err(DbError::InvalidClaim(format!("cannot retract built-in metadata on entity {e}")));
            }
            let lo = Bound { e, a, v: v.clone(), t: Id::MIN };
            let hi = Bound { e, a, v: v.clone(), t: Id::MAX };
            if let Some(found) = self.index.range_scan(IndexKind::Eav, &lo, &hi, true).next() {
                self.index.delete(&found);
                if ids::is_metadata_attribute(a) {
                    self.schema.evict(&found);
                }
            }
            return Ok(());
        }

        if let Some(meta) = &meta {
            if meta.unique.is_unique() {
                if let Some(other) = uniqueness_probe(&self.index, a, &v, e) {
                    return Err(DbError::UniqueConflict {
                        attribute: meta.ident.to_string(),
                        value: format!("{v:?}"),
                        held_by: other.0,
                    });
                }
            }
        }

        let cardinality = meta.as_ref().map(|m| m.cardinality).unwrap_or_default();
        match cardinality {
            Cardinality::Many => {
                assert_cardinality_many(&mut self.index, e, a, v.clone(), self.ttx);
            },
            Cardinality::One => {
                assert_cardinality_one(&mut self.index, e, a, v.clone(), self.ttx);
            },
        }

        if ids::is_metadata_attribute(a) {
            self.schema.upsert_from_datum(&Datum::new(e, a, v, self.ttx))?;
        }
        Ok(())
    }

    /// Stamps the transaction datum `(Ttx, sys/tx/at, now, Ttx)` (§4.4 step
    /// 9).
    fn stamp_transaction(&mut self, now: Inst) {
        self.index.insert(Datum::new(self.ttx, ids::TX_AT, Value::Inst(now), self.ttx));
    }
}
