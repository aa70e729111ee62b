use std::{collections::HashMap, sync::Arc};

use errors::DbError;
use indexing::OrderedIndex;
use value::{Claim, FIRST_USER_ID, Id, IdAllocator, TempId};

use crate::{
    clock::{Clock, SystemClock},
    snapshot::Snapshot,
    transactor::TransactorState,
};

/// The result of a successful [`Connection::write`] (§6 Transaction).
#[derive(Debug, Clone)]
pub struct Transaction {
    pub id: Id,
    pub new_ids: HashMap<TempId, Id>,
    pub snapshot: Snapshot,
}

/// Everything mutated only under the write lock: the id allocator and the
/// clock source (§4.5 state, §5 "Clock: ... writes via set_clock must take
/// the lock").
struct WriteState {
    allocator: IdAllocator,
    clock: Box<dyn Clock>,
}

/// Owns the current committed index and the id allocator; serializes
/// writes; publishes immutable snapshots (§4.5). The published state lives
/// behind its own short-held lock so reads never contend with an
/// in-progress write beyond the instant it takes to clone two `Arc`s.
pub struct Connection {
    published: parking_lot::Mutex<Snapshot>,
    write: parking_lot::Mutex<WriteState>,
}

impl Connection {
    /// Creates a bootstrapped index (system datums applied, cache
    /// populated) and sets `next_id = FirstUserID` (§4.5 `open`).
    pub fn open() -> Self {
        let (schema, datums) = schema::bootstrap();
        let mut index = OrderedIndex::new();
        for d in datums {
            index.insert(d);
        }
        tracing::info!(attrs = schema.len(), "connection bootstrapped");
        Connection {
            published: parking_lot::Mutex::new(Snapshot::new(Arc::new(index), Arc::new(schema))),
            write: parking_lot::Mutex::new(WriteState {
                allocator: IdAllocator::starting_at(FIRST_USER_ID),
                clock: Box::new(SystemClock),
            }),
        }
    }

    /// Returns a handle to the current index (§4.5 `read`). The clone is
    /// just two `Arc::clone`s.
    pub fn read(&self) -> Snapshot {
        self.published.lock().clone()
    }

    /// Runs the transactor (§4.4) under the write lock, then publishes the
    /// resulting index/schema as the new current state.
    pub fn write(&self, claims: &[Claim]) -> Result<Transaction, DbError> {
        let mut write = self.write.lock();
        let before = self.read();
        let now = write.clock.now();
        let outcome = TransactorState::apply_batch(claims, &before.index, &before.schema, &mut write.allocator, now)?;

        let snapshot = Snapshot::new(Arc::new(outcome.index), Arc::new(outcome.schema));
        *self.published.lock() = snapshot.clone();

        Ok(Transaction { id: outcome.ttx, new_ids: outcome.tempids, snapshot })
    }

    /// Replaces the wall-clock source (§4.5 `set_clock`); takes the write
    /// lock so it can never race a concurrent batch reading `clock.now()`.
    pub fn set_clock(&self, clock: impl Clock + 'static) {
        self.write.lock().clock = Box::new(clock);
    }
}

impl Default for Connection {
    fn default() -> Self {
        Self::open()
    }
}

#[cfg(test)]
mod tests {
    use schema::ids;
    use value::{Ident, Value};

    use super::*;
    use crate::clock::TestClock;

    /// S1: after `open()`, selecting by the bootstrap ident returns
    /// exactly three datums.
    #[test]
    fn open_bootstraps_the_schema() {
        let conn = Connection::open();
        let snapshot = conn.read();
        assert_eq!(snapshot.resolve_ident(&Ident::new("sys/db/ident")), Some(ids::DB_IDENT));
    }

    /// P1: a successful write's snapshot differs from the prior read by
    /// exactly the applied datums plus the transaction datum.
    #[test]
    fn write_publishes_a_strictly_larger_snapshot_and_stamps_a_tx_datum() {
        let conn = Connection::open();
        let before = conn.read();
        let before_count = before.select(&Default::default()).unwrap().count();

        let tx = conn
            .write(&[
                value::Claim::assert(value::TempId::new("tmp-name"), ids::DB_IDENT, Value::String("person/name".into())),
                value::Claim::assert(value::TempId::new("tmp-name"), ids::ATTR_TYPE, Value::Ref(ids::ATTR_TYPE_STRING)),
            ])
            .unwrap();

        let after_count = tx.snapshot.select(&Default::default()).unwrap().count();
        // Two asserted datums plus the `(Ttx, sys/tx/at, now, Ttx)` stamp.
        assert_eq!(after_count, before_count + 3);
        assert!(before.select(&Default::default()).unwrap().count() == before_count, "prior read is unaffected (P2)");
    }

    /// `set_clock` is observed by the very next write.
    #[test]
    fn set_clock_is_observed_by_the_next_write() {
        let conn = Connection::open();
        let pinned: value::Inst = "2030-01-01T00:00:00Z".parse().unwrap();
        conn.set_clock(TestClock::at(pinned));

        let tx = conn.write(&[]).unwrap();
        let selection = crate::selection::Selection { e: crate::selection::Sel::id(tx.id), ..Default::default() };
        let stamped: Vec<_> = tx.snapshot.select(&selection).unwrap().collect();
        assert_eq!(stamped.len(), 1);
        assert_eq!(stamped[0].v, Value::Inst(pinned));
    }
}
