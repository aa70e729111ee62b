//! The write path and read-only query surface over the indexed fact store:
//! query planning (§4.3), the transactor (§4.4), and the connection/
//! snapshot pair that owns and publishes committed state (§4.5/§4.6).

mod clock;
mod connection;
mod selection;
mod snapshot;
mod transactor;

#[cfg(any(test, feature = "testing"))]
pub use crate::clock::TestClock;
pub use crate::{
    clock::{Clock, SystemClock},
    connection::{Connection, Transaction},
    selection::{resolve_lookup_ref, Scalar, Sel, Selection},
    snapshot::{DumpValue, EntityDump, Snapshot},
    transactor::TransactorOutcome,
};
