use errors::DbError;
use value::{Datum, Id, Ident};

use crate::{
    attr_meta::{AttrMeta, Cardinality, Uniqueness},
    ids::{self, ATTR_CARDINALITY, ATTR_TYPE, ATTR_UNIQUE, DB_IDENT},
};

/// Denormalized attribute metadata, kept in sync with every datum on a
/// metadata attribute (§4.2). Cheap to clone (`imbl::HashMap`), so a
/// `Connection` can publish a new cache alongside each new index snapshot
/// without the two ever observably diverging (I7).
#[derive(Debug, Clone, Default)]
pub struct SchemaCache {
    by_id: imbl::HashMap<Id, AttrMeta>,
    by_ident: imbl::HashMap<Ident, Id>,
}

impl SchemaCache {
    pub fn empty() -> Self {
        SchemaCache {
            by_id: imbl::HashMap::new(),
            by_ident: imbl::HashMap::new(),
        }
    }

    pub fn get_by_id(&self, id: Id) -> Option<&AttrMeta> {
        self.by_id.get(&id)
    }

    pub fn get_by_ident(&self, ident: &Ident) -> Option<Id> {
        self.by_ident.get(ident).copied()
    }

    pub fn ident_of(&self, id: Id) -> Option<&Ident> {
        self.by_id.get(&id).map(|m| &m.ident)
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// Reflects one datum asserted on a metadata attribute into the cache.
    /// A no-op if `d.a` is not one of the four metadata attributes (§4.2
    /// Operations). Enforces I5: a second, conflicting assertion of
    /// `type`/`cardinality`/`unique` is rejected rather than silently
    /// applied.
    pub fn upsert_from_datum(&mut self, d: &Datum) -> Result<(), DbError> {
        if d.a == DB_IDENT {
            let ident = d
                .v
                .as_str()
                .ok_or_else(|| DbError::InvalidValue("sys/db/ident must be a string".into()))?;
            let ident = Ident::new(ident);
            let is_new = !self.by_id.contains_key(&d.e);
            let entry = self
                .by_id
                .entry(d.e)
                .or_insert_with(|| AttrMeta::new(d.e, ident.clone()));
            entry.ident = ident.clone();
            self.by_ident.insert(ident.clone(), d.e);
            if is_new {
                tracing::debug!(attribute = %d.e, ident = %ident, "attribute registered");
            }
            return Ok(());
        }

        if d.a == ATTR_TYPE {
            let type_ref = d
                .v
                .as_ref_id()
                .ok_or_else(|| DbError::InvalidAttrType("sys/attr/type must be a ref".into()))?;
            let value_type = ids::ref_to_value_type(type_ref)
                .ok_or_else(|| DbError::InvalidAttrType(format!("unknown type ref {type_ref}")))?;
            let entry = self.entry_mut(d.e);
            match entry.value_type {
                Some(existing) if existing != value_type => {
                    return Err(DbError::AttrTypeChange(
                        self.ident_of(d.e)
                            .map(|i| i.to_string())
                            .unwrap_or_else(|| d.e.to_string()),
                    ));
                },
                _ => entry.value_type = Some(value_type),
            }
            return Ok(());
        }

        if d.a == ATTR_UNIQUE {
            let unique_ref = d
                .v
                .as_ref_id()
                .ok_or_else(|| DbError::InvalidAttrUnique("sys/attr/unique must be a ref".into()))?;
            let unique = ids::ref_to_uniqueness(unique_ref).ok_or_else(|| {
                DbError::InvalidAttrUnique(format!("unknown unique ref {unique_ref}"))
            })?;
            let entry = self.entry_mut(d.e);
            if entry.unique_set && entry.unique != unique {
                return Err(DbError::AttrUniqueChange(
                    self.ident_of(d.e)
                        .map(|i| i.to_string())
                        .unwrap_or_else(|| d.e.to_string()),
                ));
            }
            entry.unique = unique;
            entry.unique_set = true;
            return Ok(());
        }

        if d.a == ATTR_CARDINALITY {
            let card_ref = d.v.as_ref_id().ok_or_else(|| {
                DbError::InvalidAttrCardinality("sys/attr/cardinality must be a ref".into())
            })?;
            let cardinality = ids::ref_to_cardinality(card_ref).ok_or_else(|| {
                DbError::InvalidAttrCardinality(format!("unknown cardinality ref {card_ref}"))
            })?;
            let entry = self.entry_mut(d.e);
            if entry.cardinality_set && entry.cardinality != cardinality {
                return Err(DbError::AttrCardinalityChange(
                    self.ident_of(d.e)
                        .map(|i| i.to_string())
                        .unwrap_or_else(|| d.e.to_string()),
                ));
            }
            entry.cardinality = cardinality;
            entry.cardinality_set = true;
            return Ok(());
        }

        Ok(())
    }

    /// Reflects the retraction of one metadata datum: undoes the matching
    /// `upsert_from_datum` by clearing that field back to "unset" (§4.2). A
    /// no-op if `d.a` is not one of the four metadata attributes, or if the
    /// entity has no cached entry. Without this, a retracted `type`/
    /// `unique`/`cardinality` would still be remembered forever, and a
    /// later assertion of a *different* value for it would be wrongly
    /// rejected as I5 conflicting-reassignment rather than accepted as a
    /// fresh declaration.
    pub fn evict(&mut self, d: &Datum) {
        if d.a == DB_IDENT {
            if let Some(meta) = self.by_id.get_mut(&d.e) {
                self.by_ident.remove(&meta.ident);
                meta.ident = Ident::new(format!("<unnamed:{}>", d.e));
            }
            return;
        }

        if d.a == ATTR_TYPE {
            if let Some(meta) = self.by_id.get_mut(&d.e) {
                meta.value_type = None;
            }
            return;
        }

        if d.a == ATTR_UNIQUE {
            if let Some(meta) = self.by_id.get_mut(&d.e) {
                meta.unique = Uniqueness::None;
                meta.unique_set = false;
            }
            return;
        }

        if d.a == ATTR_CARDINALITY {
            if let Some(meta) = self.by_id.get_mut(&d.e) {
                meta.cardinality = Cardinality::One;
                meta.cardinality_set = false;
            }
        }
    }

    fn entry_mut(&mut self, id: Id) -> &mut AttrMeta {
        self.by_id
            .entry(id)
            .or_insert_with(|| AttrMeta::new(id, Ident::new(format!("<unnamed:{id}>"))))
    }
}

#[cfg(test)]
mod tests {
    use value::Value;

    use super::*;
    use crate::{attr_meta::Uniqueness, ids::*};

    #[test]
    fn type_change_is_rejected() {
        let mut cache = SchemaCache::empty();
        let attr = Id(0x100000);
        cache
            .upsert_from_datum(&Datum::new(attr, DB_IDENT, Value::String("person/name".into()), Id(1)))
            .unwrap();
        cache
            .upsert_from_datum(&Datum::new(attr, ATTR_TYPE, Value::Ref(ATTR_TYPE_STRING), Id(1)))
            .unwrap();
        let err = cache
            .upsert_from_datum(&Datum::new(attr, ATTR_TYPE, Value::Ref(ATTR_TYPE_INT), Id(1)))
            .unwrap_err();
        assert!(matches!(err, DbError::AttrTypeChange(_)));
    }

    #[test]
    fn reasserting_the_same_type_is_fine() {
        let mut cache = SchemaCache::empty();
        let attr = Id(0x100000);
        cache
            .upsert_from_datum(&Datum::new(attr, ATTR_TYPE, Value::Ref(ATTR_TYPE_STRING), Id(1)))
            .unwrap();
        cache
            .upsert_from_datum(&Datum::new(attr, ATTR_TYPE, Value::Ref(ATTR_TYPE_STRING), Id(1)))
            .unwrap();
    }

    #[test]
    fn retracting_a_type_allows_reasserting_a_different_one() {
        let mut cache = SchemaCache::empty();
        let attr = Id(0x100000);
        let old = Datum::new(attr, ATTR_TYPE, Value::Ref(ATTR_TYPE_STRING), Id(1));
        cache.upsert_from_datum(&old).unwrap();
        cache.evict(&old);
        cache
            .upsert_from_datum(&Datum::new(attr, ATTR_TYPE, Value::Ref(ATTR_TYPE_INT), Id(1)))
            .unwrap();
        assert_eq!(cache.get_by_id(attr).unwrap().value_type, Some(value::ValueType::Int));
    }

    #[test]
    fn retracting_uniqueness_allows_reasserting_a_different_one() {
        let mut cache = SchemaCache::empty();
        let attr = Id(0x100000);
        let old = Datum::new(attr, ATTR_UNIQUE, Value::Ref(ATTR_UNIQUE_IDENTITY), Id(1));
        cache.upsert_from_datum(&old).unwrap();
        cache.evict(&old);
        cache
            .upsert_from_datum(&Datum::new(attr, ATTR_UNIQUE, Value::Ref(ATTR_UNIQUE_VALUE), Id(1)))
            .unwrap();
        assert_eq!(cache.get_by_id(attr).unwrap().unique, Uniqueness::Value);
    }

    #[test]
    fn cardinality_cannot_downgrade_from_many_to_one() {
        let mut cache = SchemaCache::empty();
        let attr = Id(0x100000);
        cache
            .upsert_from_datum(&Datum::new(
                attr,
                ATTR_CARDINALITY,
                Value::Ref(ATTR_CARDINALITY_MANY),
                Id(1),
            ))
            .unwrap();
        let err = cache
            .upsert_from_datum(&Datum::new(
                attr,
                ATTR_CARDINALITY,
                Value::Ref(ATTR_CARDINALITY_ONE),
                Id(1),
            ))
            .unwrap_err();
        assert!(matches!(err, DbError::AttrCardinalityChange(_)));
    }

    #[test]
    fn retracting_cardinality_allows_reasserting_a_different_one() {
        let mut cache = SchemaCache::empty();
        let attr = Id(0x100000);
        let old = Datum::new(attr, ATTR_CARDINALITY, Value::Ref(ATTR_CARDINALITY_MANY), Id(1));
        cache.upsert_from_datum(&old).unwrap();
        cache.evict(&old);
        cache
            .upsert_from_datum(&Datum::new(attr, ATTR_CARDINALITY, Value::Ref(ATTR_CARDINALITY_ONE), Id(1)))
            .unwrap();
        assert_eq!(cache.get_by_id(attr).unwrap().cardinality, Cardinality::One);
    }

    #[test]
    fn retracting_an_ident_drops_its_reverse_lookup() {
        let mut cache = SchemaCache::empty();
        let attr = Id(0x100000);
        let old = Datum::new(attr, DB_IDENT, Value::String("person/name".into()), Id(1));
        cache.upsert_from_datum(&old).unwrap();
        cache.evict(&old);
        assert_eq!(cache.get_by_ident(&Ident::new("person/name")), None);
    }

    #[test]
    fn ident_lookup_round_trips() {
        let mut cache = SchemaCache::empty();
        let attr = Id(0x100000);
        cache
            .upsert_from_datum(&Datum::new(attr, DB_IDENT, Value::String("person/name".into()), Id(1)))
            .unwrap();
        assert_eq!(cache.get_by_ident(&Ident::new("person/name")), Some(attr));
        assert_eq!(cache.ident_of(attr), Some(&Ident::new("person/name")));
        assert_eq!(cache.get_by_id(attr).unwrap().unique, Uniqueness::None);
    }
}
