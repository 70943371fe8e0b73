//! Transition validators.
//!
//! A validator answers one question: given a tenant's current status
//! and an event, what is the next status? Two implementations are
//! provided and they agree on every `(status, event)` pair:
//!
//! - [`TableValidator`] looks the pair up directly.
//! - [`MachineValidator`] compiles the table into event descriptors
//!   (one per `(event, dst)`, listing every accepted source) and fires
//!   the event on a fresh [`Machine`] for each call.

use std::collections::HashMap;

use crate::error::TransitionError;
use crate::lifecycle::{TableError, Transition, TransitionTable};
use crate::models::tenant::{Event, Status};

pub trait TransitionValidator: Send + Sync {
    /// The next status for `event` from `current`, or a
    /// [`TransitionError`] naming both.
    fn apply(&self, current: Status, event: Event) -> Result<Status, TransitionError>;
}

/// Direct lookup over a shared, immutable [`TransitionTable`].
#[derive(Debug, Clone, Copy)]
pub struct TableValidator {
    table: &'static TransitionTable,
}

impl TableValidator {
    pub fn new(table: &'static TransitionTable) -> Self {
        Self { table }
    }
}

impl Default for TableValidator {
    fn default() -> Self {
        Self::new(TransitionTable::lifecycle())
    }
}

impl TransitionValidator for TableValidator {
    fn apply(&self, current: Status, event: Event) -> Result<Status, TransitionError> {
        self.table
            .lookup(current, event)
            .ok_or(TransitionError { event, current })
    }
}

/// An event as a state machine sees it: a name, the states it may fire
/// from, and where it lands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventDesc {
    pub name: Event,
    pub src: Vec<Status>,
    pub dst: Status,
}

/// Group rows sharing `(event, dst)` into one descriptor, preserving
/// first-seen order.
fn compile(rows: &[Transition]) -> Vec<EventDesc> {
    let mut positions: HashMap<(Event, Status), usize> = HashMap::new();
    let mut descs: Vec<EventDesc> = Vec::new();
    for row in rows {
        match positions.get(&(row.event, row.dst)) {
            Some(&pos) => {
                if let Some(desc) = descs.get_mut(pos)
                    && !desc.src.contains(&row.src)
                {
                    desc.src.push(row.src);
                }
            }
            None => {
                positions.insert((row.event, row.dst), descs.len());
                descs.push(EventDesc {
                    name: row.event,
                    src: vec![row.src],
                    dst: row.dst,
                });
            }
        }
    }
    descs
}

/// A single-use state machine. It holds its own current state, so a new
/// one is built for every validation and never shared.
#[derive(Debug)]
pub struct Machine<'a> {
    current: Status,
    events: &'a [EventDesc],
}

impl<'a> Machine<'a> {
    pub fn new(initial: Status, events: &'a [EventDesc]) -> Self {
        Self {
            current: initial,
            events,
        }
    }

    pub fn current(&self) -> Status {
        self.current
    }

    /// Fire `event`; on success the machine moves to the descriptor's
    /// destination.
    pub fn fire(&mut self, event: Event) -> Result<Status, TransitionError> {
        let desc = self
            .events
            .iter()
            .find(|desc| desc.name == event && desc.src.contains(&self.current))
            .ok_or(TransitionError {
                event,
                current: self.current,
            })?;
        self.current = desc.dst;
        Ok(self.current)
    }
}

/// State-machine backed validator.
#[derive(Debug, Clone)]
pub struct MachineValidator {
    events: Vec<EventDesc>,
}

impl MachineValidator {
    /// Compile `table`. The table is checked for conflicting rows
    /// first, so grouping cannot hide an ambiguity.
    pub fn new(rows: &[Transition]) -> Result<Self, TableError> {
        let table = TransitionTable::new(rows)?;
        Ok(Self {
            events: compile(table.rows()),
        })
    }

    pub fn lifecycle() -> Self {
        Self {
            events: compile(TransitionTable::lifecycle().rows()),
        }
    }

    pub fn events(&self) -> &[EventDesc] {
        &self.events
    }
}

impl TransitionValidator for MachineValidator {
    fn apply(&self, current: Status, event: Event) -> Result<Status, TransitionError> {
        Machine::new(current, &self.events).fire(event)
    }
}
