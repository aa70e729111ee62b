use errors::DbError;
use indexing::{Bound, Edge, IndexKind, OrderedIndex};
use schema::SchemaCache;
use value::{Datum, Id, Ident, LookupRef, Value};

/// One term of a [`Selection`]: `E`, `A`, or `V` may each be unconstrained,
/// a single scalar, a finite set of scalars, or an inclusive range (§4.3).
#[derive(Debug, Clone, PartialEq)]
pub enum Sel {
    Any,
    Scalar(Scalar),
    Set(Vec<Scalar>),
    Range { min: Scalar, max: Scalar },
}

impl Default for Sel {
    fn default() -> Self {
        Sel::Any
    }
}

impl Sel {
    pub fn id(id: Id) -> Self {
        Sel::Scalar(Scalar::Id(id))
    }

    pub fn ident(ident: impl Into<Ident>) -> Self {
        Sel::Scalar(Scalar::Ident(ident.into()))
    }

    pub fn value(v: Value) -> Self {
        Sel::Scalar(Scalar::Value(v))
    }
}

/// A scalar term: an already-resolved id, a symbolic ident, a lookup ref, or
/// a value literal (§4.3).
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Id(Id),
    Ident(Ident),
    LookupRef(LookupRef),
    Value(Value),
}

impl From<Id> for Scalar {
    fn from(id: Id) -> Self {
        Scalar::Id(id)
    }
}

impl From<Value> for Scalar {
    fn from(v: Value) -> Self {
        Scalar::Value(v)
    }
}

/// `{E, A, V}`, each a [`Sel`] (§4.3).
#[derive(Debug, Clone, Default)]
pub struct Selection {
    pub e: Sel,
    pub a: Sel,
    pub v: Sel,
}

/// Resolves a [`Scalar`] that names an entity or attribute to a concrete
/// id — `Ident` via the schema cache, `LookupRef` via an AVE probe on a
/// unique attribute, `Value::Ref` unwrapped, anything else an error (§4.3
/// step 1).
pub fn resolve_scalar_to_id(
    scalar: &Scalar,
    index: &OrderedIndex,
    schema: &SchemaCache,
) -> Result<Id, DbError> {
    match scalar {
        Scalar::Id(id) => Ok(*id),
        Scalar::Ident(ident) => schema
            .get_by_ident(ident)
            .ok_or_else(|| DbError::Unresolvable(format!("unknown ident {ident}"))),
        Scalar::Value(Value::Ref(id)) => Ok(*id),
        Scalar::Value(other) => Err(DbError::Unresolvable(format!(
            "{other:?} cannot name an entity or attribute"
        ))),
        Scalar::LookupRef(lookup_ref) => resolve_lookup_ref(lookup_ref, index, schema),
    }
}

/// Resolves a [`Scalar`] in `V` position to a concrete [`Value`] — entity
/// references resolve the same way `resolve_scalar_to_id` does, then are
/// wrapped as `Value::Ref`.
pub fn resolve_scalar_to_value(
    scalar: &Scalar,
    index: &OrderedIndex,
    schema: &SchemaCache,
) -> Result<Value, DbError> {
    match scalar {
        Scalar::Value(v) => Ok(v.clone()),
        _ => resolve_scalar_to_id(scalar, index, schema).map(Value::Ref),
    }
}

/// Resolves a `LookupRef` against `index`: an AVE probe on its (necessarily
/// unique) attribute for its value (§3 LookupRef, §4.1 Uniqueness probe).
/// A pure function of the snapshot it is given — it does not depend on any
/// live connection state, so it works identically against any retained
/// snapshot, not only the newest one.
pub fn resolve_lookup_ref(
    lookup_ref: &LookupRef,
    index: &OrderedIndex,
    schema: &SchemaCache,
) -> Result<Id, DbError> {
    let attr_id = match &lookup_ref.attribute {
        value::AttrRef::Id(id) => *id,
        value::AttrRef::Ident(ident) => schema
            .get_by_ident(ident)
            .ok_or_else(|| DbError::Unresolvable(format!("unknown ident {ident}")))?,
    };
    let meta = schema
        .get_by_id(attr_id)
        .ok_or_else(|| DbError::Unresolvable(format!("unknown attribute {attr_id}")))?;
    if !meta.unique.is_unique() {
        return Err(DbError::Unresolvable(format!(
            "lookup ref attribute {} is not unique",
            meta.ident
        )));
    }
    let lo = Bound::attr_value(attr_id, lookup_ref.value.clone(), Edge::Low);
    let hi = Bound::attr_value(attr_id, lookup_ref.value.clone(), Edge::High);
    index
        .range_scan(IndexKind::Ave, &lo, &hi, true)
        .map(|d| d.e)
        .next()
        .ok_or_else(|| DbError::Unresolvable(format!("no entity with {}={:?}", meta.ident, lookup_ref.value)))
}

/// A selection term after ident/lookup-ref resolution (§4.3 step 1).
#[derive(Debug, Clone)]
enum Resolved<T> {
    Any,
    One(T),
    Set(Vec<T>),
    Range(T, T),
}

impl<T: PartialOrd + Clone> Resolved<T> {
    fn matches(&self, x: &T) -> bool {
        match self {
            Resolved::Any => true,
            Resolved::One(v) => v == x,
            Resolved::Set(vs) => vs.iter().any(|v| v == x),
            Resolved::Range(lo, hi) => lo <= x && x <= hi,
        }
    }

    /// The single value pinning this term, if it names exactly one.
    fn as_scalar(&self) -> Option<T> {
        match self {
            Resolved::One(v) => Some(v.clone()),
            _ => None,
        }
    }
}

fn resolve_id_term(sel: &Sel, index: &OrderedIndex, schema: &SchemaCache) -> Result<Resolved<Id>, DbError> {
    match sel {
        Sel::Any => Ok(Resolved::Any),
        Sel::Scalar(s) => Ok(Resolved::One(resolve_scalar_to_id(s, index, schema)?)),
        Sel::Set(scalars) => {
            let ids = scalars
                .iter()
                .map(|s| resolve_scalar_to_id(s, index, schema))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Resolved::Set(ids))
        },
        Sel::Range { min, max } => Ok(Resolved::Range(
            resolve_scalar_to_id(min, index, schema)?,
            resolve_scalar_to_id(max, index, schema)?,
        )),
    }
}

fn resolve_value_term(sel: &Sel, index: &OrderedIndex, schema: &SchemaCache) -> Result<Resolved<Value>, DbError> {
    match sel {
        Sel::Any => Ok(Resolved::Any),
        Sel::Scalar(s) => Ok(Resolved::One(resolve_scalar_to_value(s, index, schema)?)),
        Sel::Set(scalars) => {
            let values = scalars
                .iter()
                .map(|s| resolve_scalar_to_value(s, index, schema))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Resolved::Set(values))
        },
        Sel::Range { min, max } => Ok(Resolved::Range(
            resolve_scalar_to_value(min, index, schema)?,
            resolve_scalar_to_value(max, index, schema)?,
        )),
    }
}

/// Runs a [`Selection`] against `index` (§4.3 Planning). Returns a boxed,
/// lazy iterator: callers may stop consuming it early (§5 "Lazy query
/// sequences must be safe to drop mid-iteration") and the underlying
/// `OrderedIndex` range scans are not eagerly materialized.
pub fn select<'a>(
    selection: &Selection,
    index: &'a OrderedIndex,
    schema: &SchemaCache,
) -> Result<Box<dyn DoubleEndedIterator<Item = Datum> + 'a>, DbError> {
    let e_term = resolve_id_term(&selection.e, index, schema)?;
    let a_term = resolve_id_term(&selection.a, index, schema)?;
    let v_term = resolve_value_term(&selection.v, index, schema)?;

    let a_scalar = a_term.as_scalar();
    let v_scalar = v_term.as_scalar();

    let iter: Box<dyn DoubleEndedIterator<Item = Datum> + 'a> = match &e_term {
        Resolved::One(e) => {
            let (lo, hi) = entity_bounds(*e, a_scalar);
            index.range_scan(IndexKind::Eav, &lo, &hi, true)
        },
        Resolved::Set(es) => {
            let scans: Vec<_> = es
                .iter()
                .map(|e| {
                    let (lo, hi) = entity_bounds(*e, a_scalar);
                    index.range_scan(IndexKind::Eav, &lo, &hi, true)
                })
                .collect();
            Box::new(scans.into_iter().flatten())
        },
        Resolved::Range(lo_e, hi_e) => {
            let lo = Bound::entity(*lo_e, Edge::Low);
            let hi = Bound::entity(*hi_e, Edge::High);
            index.range_scan(IndexKind::Eav, &lo, &hi, true)
        },
        Resolved::Any => match (&a_term, a_scalar, v_scalar.clone()) {
            (_, Some(a), Some(v)) if schema.get_by_id(a).map(|m| m.unique.is_unique()).unwrap_or(false) => {
                // A and V both pinned, A unique: AVE, start at (a, v, 0)
                // (§4.3 step 2, second case).
                let lo = Bound::attr_value(a, v.clone(), Edge::Low);
                let hi = Bound::attr_value(a, v, Edge::High);
                index.range_scan(IndexKind::Ave, &lo, &hi, true)
            },
            (Resolved::Any, _, _) => {
                // Fully unconstrained: full EAV scan (§4.3 step 2, fallback).
                index.range_scan(IndexKind::Eav, &Bound::min(), &Bound::max(), true)
            },
            _ => aev_scan_for(&a_term, index),
        },
    };

    // Apply a residual filter for whatever the chosen range does not
    // exactly express (§4.3 step 3) — e.g. V as a set/range while scanning
    // EAV or AEV, or E/A as a set when the range above only pinned one.
    let filtered = iter.filter(move |d| e_term.matches(&d.e) && a_term.matches(&d.a) && v_term.matches(&d.v));
    Ok(Box::new(filtered))
}

fn entity_bounds(e: Id, a_scalar: Option<Id>) -> (Bound, Bound) {
    match a_scalar {
        Some(a) => (Bound::entity_attr(e, a, Edge::Low), Bound::entity_attr(e, a, Edge::High)),
        None => (Bound::entity(e, Edge::Low), Bound::entity(e, Edge::High)),
    }
}

/// A constrained-but-not-pinned-to-a-single-unique-value `A` term: AEV, one
/// scan per concrete attribute (§4.3 step 2, third case), or a full EAV
/// fallback scan if `A` turned out unconstrained after all.
fn aev_scan_for<'a>(a_term: &Resolved<Id>, index: &'a OrderedIndex) -> Box<dyn DoubleEndedIterator<Item = Datum> + 'a> {
    let attrs: Vec<Id> = match a_term {
        Resolved::Any => return index.range_scan(IndexKind::Eav, &Bound::min(), &Bound::max(), true),
        Resolved::One(a) => vec![*a],
        Resolved::Set(attrs) => attrs.clone(),
        Resolved::Range(lo, hi) => {
            let lo = Bound::attr(*lo, Edge::Low);
            let hi = Bound::attr(*hi, Edge::High);
            return index.range_scan(IndexKind::Aev, &lo, &hi, true);
        },
    };
    let scans: Vec<_> = attrs
        .into_iter()
        .map(|a| {
            let lo = Bound::attr(a, Edge::Low);
            let hi = Bound::attr(a, Edge::High);
            index.range_scan(IndexKind::Aev, &lo, &hi, true)
        })
        .collect();
    Box::new(scans.into_iter().flatten())
}
