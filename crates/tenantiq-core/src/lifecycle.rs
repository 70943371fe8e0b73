//! The tenant lifecycle transition table.
//!
//! [`TRANSITIONS`] is the only place that says which events are legal
//! from which states. [`TransitionTable`] indexes a row set by
//! `(event, src)` and refuses row sets that would make a lookup
//! ambiguous.

use std::collections::HashMap;
use std::sync::LazyLock;

use thiserror::Error;

use crate::models::tenant::{Event, Status};

/// One legal state change: `event` moves a tenant from `src` to `dst`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Transition {
    pub event: Event,
    pub src: Status,
    pub dst: Status,
}

impl Transition {
    pub const fn new(event: Event, src: Status, dst: Status) -> Self {
        Self { event, src, dst }
    }
}

/// Every legal lifecycle transition.
pub const TRANSITIONS: &[Transition] = &[
    Transition::new(Event::ProvisionComplete, Status::Creating, Status::Active),
    Transition::new(Event::Suspend, Status::Active, Status::Suspended),
    Transition::new(Event::Reactivate, Status::Suspended, Status::Active),
    Transition::new(Event::Delete, Status::Active, Status::Deleting),
    Transition::new(Event::Delete, Status::Suspended, Status::Deleting),
    Transition::new(Event::DeletionComplete, Status::Deleting, Status::Deleted),
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TableError {
    #[error("event \"{event}\" from \"{src}\" maps to both \"{first}\" and \"{second}\"")]
    Conflict {
        event: Event,
        src: Status,
        first: Status,
        second: Status,
    },
}

/// Positions of the first two rows that share `(event, src)` but not
/// `dst`.
pub const fn find_conflict(rows: &[Transition]) -> Option<(usize, usize)> {
    let mut i = 0;
    while i < rows.len() {
        let mut j = i + 1;
        while j < rows.len() {
            let (a, b) = (rows[i], rows[j]);
            if a.event as u8 == b.event as u8
                && a.src as u8 == b.src as u8
                && a.dst as u8 != b.dst as u8
            {
                return Some((i, j));
            }
            j += 1;
        }
        i += 1;
    }
    None
}

// An ambiguous edit to TRANSITIONS fails the build.
const _: () = assert!(
    find_conflict(TRANSITIONS).is_none(),
    "TRANSITIONS maps one (event, src) to two destinations"
);

static LIFECYCLE: LazyLock<TransitionTable> =
    LazyLock::new(|| TransitionTable::index(TRANSITIONS.iter().copied()));

/// A deterministic `(event, src) → dst` lookup.
#[derive(Debug, Clone)]
pub struct TransitionTable {
    rows: Vec<Transition>,
    index: HashMap<(Event, Status), Status>,
}

impl TransitionTable {
    /// Build a table, rejecting rows that give one `(event, src)` two
    /// different destinations. Exact duplicates are collapsed.
    pub fn new(rows: &[Transition]) -> Result<Self, TableError> {
        if let Some((first, second)) = find_conflict(rows) {
            return Err(TableError::Conflict {
                event: rows[first].event,
                src: rows[first].src,
                first: rows[first].dst,
                second: rows[second].dst,
            });
        }
        Ok(Self::index(rows.iter().copied()))
    }

    /// The built-in lifecycle table, shared process-wide and never
    /// mutated.
    pub fn lifecycle() -> &'static TransitionTable {
        &LIFECYCLE
    }

    // Callers must have run `find_conflict` already.
    fn index(rows: impl Iterator<Item = Transition>) -> Self {
        let mut deduped: Vec<Transition> = Vec::new();
        let mut index = HashMap::new();
        for row in rows {
            if index.insert((row.event, row.src), row.dst).is_none() {
                deduped.push(row);
            }
        }
        Self {
            rows: deduped,
            index,
        }
    }

    /// The destination for `event` from `src`, if the table allows it.
    pub fn lookup(&self, src: Status, event: Event) -> Option<Status> {
        self.index.get(&(event, src)).copied()
    }

    /// Events accepted from `src`, in table order.
    pub fn events_from(&self, src: Status) -> Vec<Event> {
        self.rows
            .iter()
            .filter(|row| row.src == src)
            .map(|row| row.event)
            .collect()
    }

    pub fn rows(&self) -> &[Transition] {
        &self.rows
    }
}
