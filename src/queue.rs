//! Command queues between the USB transport and the main loop.
//!
//! ```text
//!   SET_REPORT (USB ISR) ──▶ inbound  ──▶ main loop
//!   main loop            ──▶ outbound ──▶ GET_REPORT (USB ISR)
//! ```
//!
//! Each direction is a fixed ring of [`CommandRecord`]s.  One slot always
//! stays free so that `head == tail` means empty, which leaves `N - 1`
//! usable entries.  A full ring refuses the write and keeps its contents.
//!
//! Producer and consumer run in different interrupt contexts, so the shared
//! wrapper takes a critical section around every access.

use core::cell::RefCell;

use critical_section::Mutex;

use crate::protocol::record::{CommandKind, CommandRecord};

/// Ring size used by the bridge.  Power of 2 for cheap index wrap.
pub const QUEUE_CAP: usize = 16;

const EMPTY_SLOT: CommandRecord = CommandRecord::new(CommandKind::Switch, 0, 0);

/// Single-producer / single-consumer ring of records.
#[derive(Debug)]
pub struct RecordRing<const N: usize> {
    slots: [CommandRecord; N],
    head: usize,
    tail: usize,
}

impl<const N: usize> RecordRing<N> {
    pub const fn new() -> Self {
        const { assert!(N.is_power_of_two() && N >= 2, "ring size must be a power of two") };
        Self {
            slots: [EMPTY_SLOT; N],
            head: 0,
            tail: 0,
        }
    }

    /// Store `record`.  Returns `false` (record dropped) when full.
    pub fn write(&mut self, record: CommandRecord) -> bool {
        let next = (self.head + 1) & (N - 1);
        if next == self.tail {
            return false;
        }
        self.slots[self.head] = record;
        self.head = next;
        true
    }

    /// Oldest record, if any.
    pub fn read(&mut self) -> Option<CommandRecord> {
        if self.head == self.tail {
            return None;
        }
        let rec = self.slots[self.tail];
        self.tail = (self.tail + 1) & (N - 1);
        Some(rec)
    }

    pub fn len(&self) -> usize {
        (N + self.head - self.tail) & (N - 1)
    }

    pub fn is_empty(&self) -> bool {
        self.head == self.tail
    }

    /// Free slots left for the producer.
    pub fn remaining(&self) -> usize {
        N - 1 - self.len()
    }
}

impl<const N: usize> Default for RecordRing<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// A [`RecordRing`] reachable from both interrupt and thread context.
pub struct SharedRing<const N: usize> {
    inner: Mutex<RefCell<RecordRing<N>>>,
}

impl<const N: usize> SharedRing<N> {
    pub const fn new() -> Self {
        Self { inner: Mutex::new(RefCell::new(RecordRing::new())) }
    }

    pub fn write(&self, record: CommandRecord) -> bool {
        critical_section::with(|cs| self.inner.borrow_ref_mut(cs).write(record))
    }

    pub fn read(&self) -> Option<CommandRecord> {
        critical_section::with(|cs| self.inner.borrow_ref_mut(cs).read())
    }

    pub fn len(&self) -> usize {
        critical_section::with(|cs| self.inner.borrow_ref(cs).len())
    }

    pub fn is_empty(&self) -> bool {
        critical_section::with(|cs| self.inner.borrow_ref(cs).is_empty())
    }

    pub fn remaining(&self) -> usize {
        critical_section::with(|cs| self.inner.borrow_ref(cs).remaining())
    }
}

impl<const N: usize> Default for SharedRing<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Both directions of the device's command traffic.
pub struct CommandQueues {
    /// Host → device commands awaiting the main loop.
    pub inbound: SharedRing<QUEUE_CAP>,
    /// Device → host replies awaiting a GET_REPORT.
    pub outbound: SharedRing<QUEUE_CAP>,
}

impl CommandQueues {
    pub const fn new() -> Self {
        Self {
            inbound: SharedRing::new(),
            outbound: SharedRing::new(),
        }
    }
}

impl Default for CommandQueues {
    fn default() -> Self {
        Self::new()
    }
}
