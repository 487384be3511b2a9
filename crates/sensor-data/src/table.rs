//! Shared accumulator tables.
//!
//! Aggregation workers call [`AccumulatorTable::find_or_create`] for the key
//! of every reading and then [`AccumulatorTable::fold`] the reading into the
//! returned handle. Two implementations are provided:
//!
//! * [`GlobalLockTable`] serializes lookups and folds behind one mutex.
//! * [`PerEntryLockTable`] holds the table-wide mutex only while looking up
//!   or inserting a key; every accumulator has its own mutex for folds, so
//!   workers touching different keys never wait on each other.
//!
//! Both keep accumulators in creation order and produce identical results.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use sensor_core::models::{Accumulator, KeyRef, Reading};
use sensor_core::period::YearMonth;

// ── Trait ─────────────────────────────────────────────────────────────────────

/// A growable set of accumulators, one per distinct key, safe to share
/// between aggregation workers.
pub trait AccumulatorTable: Sync {
    /// Reference to one accumulator, valid for the lifetime of the table.
    type Handle;

    /// Return the accumulator for `key`, inserting a fresh one if absent.
    ///
    /// Atomic with respect to other callers: concurrent calls with the same
    /// unseen key create exactly one entry and all of them receive it. Only
    /// the insert path copies the device id.
    fn find_or_create(&self, key: KeyRef<'_>) -> Self::Handle;

    /// Fold `reading` into the accumulator behind `handle`.
    fn fold(&self, handle: &Self::Handle, reading: &Reading);

    /// Copy of every accumulator, in creation order.
    fn snapshot(&self) -> Vec<Accumulator>;

    /// Number of distinct keys seen so far.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Lock `mutex`, recovering the data if another worker panicked while
/// holding it. A panicking worker already fails the run when it is joined.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Key to creation-order slot, nested so a borrowed device id can be
/// looked up without building an owned key.
#[derive(Default)]
struct SlotIndex {
    by_device: HashMap<String, HashMap<YearMonth, usize>>,
}

impl SlotIndex {
    fn get(&self, key: KeyRef<'_>) -> Option<usize> {
        self.by_device.get(key.device)?.get(&key.period).copied()
    }

    fn insert(&mut self, key: KeyRef<'_>, slot: usize) {
        match self.by_device.get_mut(key.device) {
            Some(months) => {
                months.insert(key.period, slot);
            }
            None => {
                self.by_device
                    .insert(key.device.to_string(), HashMap::from([(key.period, slot)]));
            }
        }
    }
}

// ── GlobalLockTable ───────────────────────────────────────────────────────────

#[derive(Default)]
struct GlobalState {
    slots: SlotIndex,
    entries: Vec<Accumulator>,
}

/// Accumulator table guarded by a single mutex for every operation.
#[derive(Default)]
pub struct GlobalLockTable {
    state: Mutex<GlobalState>,
}

impl GlobalLockTable {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AccumulatorTable for GlobalLockTable {
    /// Index into the creation-ordered entry list.
    type Handle = usize;

    fn find_or_create(&self, key: KeyRef<'_>) -> usize {
        let mut state = lock(&self.state);
        if let Some(slot) = state.slots.get(key) {
            return slot;
        }
        let slot = state.entries.len();
        state.entries.push(Accumulator::new(key.into_owned()));
        state.slots.insert(key, slot);
        slot
    }

    fn fold(&self, handle: &usize, reading: &Reading) {
        lock(&self.state).entries[*handle].fold(reading);
    }

    fn snapshot(&self) -> Vec<Accumulator> {
        lock(&self.state).entries.clone()
    }

    fn len(&self) -> usize {
        lock(&self.state).entries.len()
    }
}

// ── PerEntryLockTable ─────────────────────────────────────────────────────────

/// Shared handle to one accumulator of a [`PerEntryLockTable`].
pub type EntryHandle = Arc<Mutex<Accumulator>>;

#[derive(Default)]
struct EntryIndex {
    slots: SlotIndex,
    entries: Vec<EntryHandle>,
}

/// Two-tier accumulator table: a table-wide lock for find-or-create and a
/// per-accumulator lock for folds.
#[derive(Default)]
pub struct PerEntryLockTable {
    index: Mutex<EntryIndex>,
}

impl PerEntryLockTable {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AccumulatorTable for PerEntryLockTable {
    type Handle = EntryHandle;

    fn find_or_create(&self, key: KeyRef<'_>) -> EntryHandle {
        let mut index = lock(&self.index);
        if let Some(slot) = index.slots.get(key) {
            return Arc::clone(&index.entries[slot]);
        }
        let entry = Arc::new(Mutex::new(Accumulator::new(key.into_owned())));
        let slot = index.entries.len();
        index.entries.push(Arc::clone(&entry));
        index.slots.insert(key, slot);
        entry
    }

    fn fold(&self, handle: &EntryHandle, reading: &Reading) {
        lock(handle).fold(reading);
    }

    fn snapshot(&self) -> Vec<Accumulator> {
        let index = lock(&self.index);
        index.entries.iter().map(|entry| lock(entry).clone()).collect()
    }

    fn len(&self) -> usize {
        lock(&self.index).entries.len()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
