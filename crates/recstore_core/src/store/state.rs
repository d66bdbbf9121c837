//! Manifest, active set and index bookkeeping.
//!
//! `StoreState` is the lock-free core of a store. It owns:
//! - the manifest: one slot per position, `None` for tombstones
//! - the OID to position map
//! - the active set: ascending positions that are live and pass every
//!   enabled filter
//! - the field indexes and registered filters
//!
//! ## Invariants
//!
//! - `positions` holds exactly the live slots
//! - every live record appears in every index under its current value
//! - `active` is sorted and contains only live positions
//! - only `compact`, `reset` and `load` renumber positions

use crate::filter::FilterSet;
use crate::index::{remap_positions, remove_position, FieldIndex, IndexKind, Position};
use crate::record::{Oid, Record};
use crate::value::Value;
use std::collections::hash_map::Entry;
use std::collections::HashMap;

/// Direction of a traversal step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Direction {
    Forward,
    Backward,
}

/// Result of a compaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompactionResult {
    /// Manifest length before compaction.
    pub slots_before: usize,
    /// Manifest length after compaction.
    pub slots_after: usize,
    /// Number of tombstones reclaimed.
    pub tombstones_removed: usize,
}

pub(crate) struct IndexedField {
    /// Model slot of the indexed field.
    pub(crate) slot: usize,
    pub(crate) index: FieldIndex,
}

#[derive(Default)]
pub(crate) struct StoreState {
    slots: Vec<Option<Record>>,
    positions: HashMap<Oid, Position>,
    active: Vec<Position>,
    indexes: Vec<IndexedField>,
    pub(crate) filters: FilterSet,
}

impl StoreState {
    /// Manifest slot count, tombstones included.
    pub(crate) fn length(&self) -> usize {
        self.slots.len()
    }

    /// Active set cardinality.
    pub(crate) fn size(&self) -> usize {
        self.active.len()
    }

    /// Number of live (non-tombstoned) slots.
    pub(crate) fn live(&self) -> usize {
        self.positions.len()
    }

    pub(crate) fn position_of(&self, record: &Record) -> Option<Position> {
        self.positions.get(&record.oid()).copied()
    }

    pub(crate) fn record_at(&self, position: Position) -> Option<&Record> {
        self.slots.get(position).and_then(Option::as_ref)
    }

    pub(crate) fn is_active(&self, position: Position) -> bool {
        self.active.binary_search(&position).is_ok()
    }

    pub(crate) fn active(&self) -> &[Position] {
        &self.active
    }

    pub(crate) fn active_records(&self) -> Vec<Record> {
        self.active
            .iter()
            .filter_map(|p| self.record_at(*p).cloned())
            .collect()
    }

    /// Appends a record to the manifest and returns its position.
    pub(crate) fn append(&mut self, record: Record) -> Position {
        let position = self.slots.len();
        for field in &mut self.indexes {
            field
                .index
                .as_index_mut()
                .insert(record.value_at(field.slot), position);
        }
        // New positions are always the largest, so the active set stays sorted
        if self.filters.accepts(&record) {
            self.active.push(position);
        }
        self.positions.insert(record.oid(), position);
        self.slots.push(Some(record));
        position
    }

    /// Tombstones a slot without touching the active set.
    fn tombstone(&mut self, position: Position) -> Option<Record> {
        let record = self.slots.get_mut(position)?.take()?;
        self.positions.remove(&record.oid());
        for field in &mut self.indexes {
            field
                .index
                .as_index_mut()
                .remove(&record.value_at(field.slot), position);
        }
        Some(record)
    }

    /// Tombstones one slot.
    pub(crate) fn remove_at(&mut self, position: Position) -> Option<Record> {
        let record = self.tombstone(position)?;
        remove_position(&mut self.active, position);
        Some(record)
    }

    /// Tombstones several slots, rebuilding the active set once.
    ///
    /// The result is aligned with `positions`; repeated or invalid positions
    /// yield `None`.
    pub(crate) fn remove_batch(&mut self, positions: &[Option<Position>]) -> Vec<Option<Record>> {
        let removed: Vec<Option<Record>> = positions
            .iter()
            .map(|p| p.and_then(|p| self.tombstone(p)))
            .collect();
        if removed.iter().any(Option::is_some) {
            let slots = &self.slots;
            self.active.retain(|p| slots[*p].is_some());
        }
        removed
    }

    /// Drops every slot. Returns the records that were live.
    pub(crate) fn reset(&mut self) -> Vec<Record> {
        let live = std::mem::take(&mut self.slots).into_iter().flatten().collect();
        self.positions.clear();
        self.active.clear();
        for field in &mut self.indexes {
            field.index.as_index_mut().clear();
        }
        live
    }

    /// Replaces the manifest with `records` and rebuilds every index in one
    /// pass per index. Returns the records that were live before.
    ///
    /// A record listed twice keeps its first position.
    pub(crate) fn load(&mut self, records: Vec<Record>) -> Vec<Record> {
        let previous = self.reset();

        self.slots.reserve(records.len());
        self.positions.reserve(records.len());
        for record in records {
            let position = self.slots.len();
            if let Entry::Vacant(entry) = self.positions.entry(record.oid()) {
                entry.insert(position);
                self.slots.push(Some(record));
            }
        }

        for field in &mut self.indexes {
            let slot = field.slot;
            field.index.rebuild(
                self.slots
                    .iter()
                    .enumerate()
                    .filter_map(|(p, r)| r.as_ref().map(|r| (r.value_at(slot), p))),
            );
        }

        self.refresh_active();
        previous
    }

    /// Drops tombstones and renumbers the manifest contiguously.
    pub(crate) fn compact(&mut self) -> CompactionResult {
        let slots_before = self.slots.len();
        let mut remap = Vec::with_capacity(slots_before);
        let mut next = 0;
        for slot in &self.slots {
            if slot.is_some() {
                remap.push(Some(next));
                next += 1;
            } else {
                remap.push(None);
            }
        }

        let result = CompactionResult {
            slots_before,
            slots_after: next,
            tombstones_removed: slots_before - next,
        };
        if result.tombstones_removed == 0 {
            return result;
        }

        self.slots.retain(Option::is_some);
        for position in self.positions.values_mut() {
            if let Some(new) = remap[*position] {
                *position = new;
            }
        }
        remap_positions(&mut self.active, &remap);
        for field in &mut self.indexes {
            field.index.as_index_mut().remap(&remap);
        }
        result
    }

    /// Recomputes the active set with one pass over the manifest.
    pub(crate) fn refresh_active(&mut self) {
        if self.filters.has_enabled() {
            let filters = &self.filters;
            self.active = self
                .slots
                .iter()
                .enumerate()
                .filter_map(|(p, r)| r.as_ref().filter(|r| filters.accepts(r)).map(|_| p))
                .collect();
        } else {
            self.active = self
                .slots
                .iter()
                .enumerate()
                .filter_map(|(p, r)| r.as_ref().map(|_| p))
                .collect();
        }
    }

    /// Re-evaluates one live position against the enabled filters.
    pub(crate) fn refresh_position(&mut self, position: Position) {
        let Some(record) = self.record_at(position) else {
            return;
        };
        let accepted = self.filters.accepts(record);
        match (self.active.binary_search(&position), accepted) {
            (Ok(at), false) => {
                self.active.remove(at);
            }
            (Err(at), true) => self.active.insert(at, position),
            _ => {}
        }
    }

    /// Moves a position from `old` to `new` in the index on `slot`.
    pub(crate) fn rekey(&mut self, position: Position, slot: usize, old: &Value, new: &Value) {
        if let Some(field) = self.indexes.iter_mut().find(|f| f.slot == slot) {
            let index = field.index.as_index_mut();
            index.remove(old, position);
            index.insert(new.clone(), position);
        }
    }

    /// Walks the active set from `position`.
    ///
    /// A position outside the active set (filtered out) counts as sitting
    /// between its active neighbours, so the first step lands on one of
    /// them.
    pub(crate) fn navigate(
        &self,
        position: Position,
        direction: Direction,
        steps: usize,
        cycle: bool,
    ) -> Option<Position> {
        let size = self.active.len() as i128;
        let (index, found) = match self.active.binary_search(&position) {
            Ok(at) => (at as i128, true),
            Err(at) => (at as i128, false),
        };
        if size == 0 || (!found && steps == 0) {
            return None;
        }

        let steps = steps as i128;
        let target = match (direction, found) {
            (Direction::Forward, true) => index + steps,
            (Direction::Forward, false) => index + steps - 1,
            (Direction::Backward, _) => index - steps,
        };
        let target = if cycle {
            target.rem_euclid(size)
        } else if (0..size).contains(&target) {
            target
        } else {
            return None;
        };
        Some(self.active[target as usize])
    }

    pub(crate) fn index(&self, field: &str) -> Option<&FieldIndex> {
        self.indexes
            .iter()
            .find(|f| f.index.field() == field)
            .map(|f| &f.index)
    }

    pub(crate) fn indexed_field_names(&self) -> Vec<String> {
        self.indexes
            .iter()
            .map(|f| f.index.field().to_string())
            .collect()
    }

    /// Creates (or rebuilds with a new kind) the index on a field.
    ///
    /// Returns false if an index of the same kind already existed.
    pub(crate) fn create_index(&mut self, field: &str, slot: usize, kind: IndexKind) -> bool {
        let existing = self.indexes.iter().position(|f| f.slot == slot);
        if let Some(at) = existing {
            if self.indexes[at].index.kind() == kind {
                return false;
            }
        }

        let mut index = FieldIndex::new(field, kind);
        index.rebuild(
            self.slots
                .iter()
                .enumerate()
                .filter_map(|(p, r)| r.as_ref().map(|r| (r.value_at(slot), p))),
        );
        let indexed = IndexedField { slot, index };
        match existing {
            Some(at) => self.indexes[at] = indexed,
            None => self.indexes.push(indexed),
        }
        true
    }

    /// Drops the index on `field`, or every index for `None`.
    ///
    /// Returns the number of indexes dropped.
    pub(crate) fn remove_index(&mut self, field: Option<&str>) -> usize {
        let before = self.indexes.len();
        match field {
            Some(name) => self.indexes.retain(|f| f.index.field() != name),
            None => self.indexes.clear(),
        }
        before - self.indexes.len()
    }
}
