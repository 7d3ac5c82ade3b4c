//! Test-only fault injection for the insert transaction.

use crate::error::StorageFault;
use std::cell::Cell;

/// Point inside `write_rows` where an injected failure fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum InsertFailpoint {
    /// After the sequence counter is bumped, before any paste row exists.
    AfterSequenceBump,
    /// After the primary row is staged, before the indexes are written.
    AfterRowInsert,
}

thread_local! {
    static INSERT_FAILPOINT: Cell<Option<InsertFailpoint>> = const { Cell::new(None) };
}

/// Arm (or clear) the failpoint for inserts issued from the current thread.
pub(crate) fn set_insert_failpoint(point: Option<InsertFailpoint>) {
    INSERT_FAILPOINT.with(|slot| slot.set(point));
}

pub(super) fn hit(point: InsertFailpoint) -> Result<(), StorageFault> {
    if INSERT_FAILPOINT.with(Cell::get) == Some(point) {
        return Err(StorageFault::Io(std::io::Error::other(format!(
            "Injected insert failpoint: {:?}",
            point
        ))));
    }
    Ok(())
}
