//! Global sort-position sequencer.
//!
//! # Responsibility
//! - Hand out the next creation-order position across the whole forest.
//!
//! # Invariants
//! - Must run inside the caller's write transaction: the read-max and the
//!   insert that consumes the value commit or roll back together, so a failed
//!   insert never burns a position and two writers never read the same max.
//! - Positions are unique and strictly increasing, not contiguous.

use rusqlite::Connection;

/// Base position handed out on an empty store.
pub(crate) const BASE_POSITION: i64 = 0;

/// Returns the next global sort position.
///
/// One greater than the current maximum `sort_position`, or `BASE_POSITION`
/// when no items exist yet.
pub(crate) fn next_sort_position(conn: &Connection) -> rusqlite::Result<i64> {
    conn.query_row(
        "SELECT COALESCE(MAX(sort_position) + 1, ?1) FROM items;",
        [BASE_POSITION],
        |row| row.get(0),
    )
}
