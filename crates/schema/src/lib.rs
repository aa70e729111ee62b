//! Denormalized attribute metadata and the system bootstrap (§4.2).

mod attr_meta;
mod bootstrap;
mod cache;
pub mod ids;

pub use crate::{
    attr_meta::{AttrMeta, Cardinality, Uniqueness},
    bootstrap::{bootstrap, bootstrap_datums},
    cache::SchemaCache,
};
