use std::fmt;

/// The id of an entity. Issued monotonically by the connection's allocator.
///
/// Zero is reserved and means "unspecified/absent" (I8); it is never the id
/// of a stored datum's `E` or `A`. Ids in `[1, FIRST_USER_ID)` are reserved
/// for the schema bootstrap (§6); user entities start at `FIRST_USER_ID`.
#[cfg_attr(any(test, feature = "testing"), derive(proptest_derive::Arbitrary))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Id(pub u64);

/// First id available for user-created entities and attributes. Ids below
/// this are reserved for the system bootstrap (§6).
pub const FIRST_USER_ID: u64 = 0x100000;

/// Sentinel meaning "unspecified/absent" (I8). Never appears as the `E` or
/// `A` of a stored datum.
pub const ABSENT: Id = Id(0);

impl Id {
    pub fn is_absent(self) -> bool {
        self.0 == 0
    }

    pub fn is_system(self) -> bool {
        self.0 != 0 && self.0 < FIRST_USER_ID
    }

    pub const MIN: Id = Id(0);
    pub const MAX: Id = Id(u64::MAX);
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for Id {
    fn from(value: u64) -> Self {
        Id(value)
    }
}

/// Monotonic id allocator. The connection owns one; the transactor draws a
/// transaction id from it at the start of every batch and rolls the counter
/// back on failure (§4.5).
#[derive(Debug, Clone)]
pub struct IdAllocator {
    next: u64,
}

impl IdAllocator {
    pub fn starting_at(first: u64) -> Self {
        Self { next: first }
    }

    /// Allocates the next id. Exhausting the id space is a hard fatal per
    /// §4.5; implemented as a checked increment rather than a silent wrap,
    /// matching `internal/ids/ids.go`'s defensive allocation.
    pub fn allocate(&mut self) -> Result<Id, errors::DbError> {
        let id = self.next;
        self.next = self
            .next
            .checked_add(1)
            .ok_or_else(|| errors::DbError::Fatal("id space exhausted".to_string()))?;
        Ok(Id(id))
    }

    /// Rolls the allocator back to a previously observed watermark. Used by
    /// the transactor to undo allocation on batch failure.
    pub fn rollback_to(&mut self, watermark: u64) {
        self.next = watermark;
    }

    pub fn watermark(&self) -> u64 {
        self.next
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocator_is_monotonic_and_rolls_back() {
        let mut alloc = IdAllocator::starting_at(FIRST_USER_ID);
        let mark = alloc.watermark();
        let a = alloc.allocate().unwrap();
        let b = alloc.allocate().unwrap();
        assert!(a.0 < b.0);
        alloc.rollback_to(mark);
        let c = alloc.allocate().unwrap();
        assert_eq!(a, c);
    }

    #[test]
    fn allocator_exhaustion_is_fatal() {
        let mut alloc = IdAllocator::starting_at(u64::MAX);
        assert!(alloc.allocate().is_ok());
        assert!(matches!(
            alloc.allocate(),
            Err(errors::DbError::Fatal(_))
        ));
    }
}
