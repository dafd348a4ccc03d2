use std::{iter, mem};

use log::debug;

use super::Entry;
use crate::error::{FfmErr, Result};

const DEFAULT_CAPACITY: usize = 65536;
const MIN_CAPACITY: usize = 11;
const LOAD_FACTOR: f32 = 0.75;
const GROW_FACTOR: usize = 2;

/// The state of a single slot of a `ParamTable`.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotState {
    /// Never used.
    Free = 0,
    /// Holds a key and its entry.
    Full = 1,
    /// Held a key that was removed, probe chains continue through it.
    Removed = 2,
}

impl SlotState {
    /// Decodes a state from its byte representation.
    ///
    /// # Returns
    /// `None` if `byte` isn't a valid state.
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(Self::Free),
            1 => Some(Self::Full),
            2 => Some(Self::Removed),
            _ => None,
        }
    }
}

/// Outcome of walking the probe sequence of a key.
enum Probe {
    Found(usize),
    Vacant(usize),
    Exhausted,
}

/// An open addressing hash table from `i32` keys to `Entry`s.
///
/// The table is laid out as three parallel arrays of the same length: keys, entries and slot
/// states. A slot's entry is present if and only if its state is `Full`, this is checked
/// whenever a table is rebuilt from external arrays.
///
/// Collisions are resolved by double hashing over a prime amount of slots, so every probe
/// sequence visits every slot.
#[derive(Debug, Clone)]
pub struct ParamTable {
    keys: Vec<i32>,
    entries: Vec<Option<Entry>>,
    states: Vec<SlotState>,
    used: usize,
    occupied: usize,
    threshold: usize,
}

impl Default for ParamTable {
    fn default() -> Self {
        Self::new()
    }
}

impl ParamTable {
    /// Creates a new `ParamTable` with the default capacity.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Creates a new `ParamTable` with room for at least `slots` slots.
    ///
    /// # Arguments
    /// * `slots` - The minimum amount of slots, rounded up to a prime.
    ///
    /// # Returns
    /// A new empty `ParamTable` instance.
    pub fn with_capacity(slots: usize) -> Self {
        let capacity = next_prime(slots.max(MIN_CAPACITY));

        Self {
            keys: vec![0; capacity],
            entries: iter::repeat_with(|| None).take(capacity).collect(),
            states: vec![SlotState::Free; capacity],
            used: 0,
            occupied: 0,
            threshold: threshold_for(capacity),
        }
    }

    /// Reconstructs a table from previously captured parallel arrays without rehashing.
    ///
    /// The arrays must come from `bulk_view` of a table (or its serialized form), since the
    /// position of every key depends on the length of the arrays.
    ///
    /// # Arguments
    /// * `keys` - The key of each slot.
    /// * `entries` - The entry of each slot.
    /// * `states` - The state of each slot.
    /// * `used` - The amount of `Full` slots.
    ///
    /// # Returns
    /// The rebuilt table or `MalformedLayout` if the lengths disagree, the amount of `Full`
    /// slots isn't `used`, a slot's entry doesn't match its state or a full key can't be
    /// found by probing (duplicated or misplaced).
    pub fn rebuild(
        keys: Vec<i32>,
        entries: Vec<Option<Entry>>,
        states: Vec<SlotState>,
        used: usize,
    ) -> Result<Self> {
        if keys.len() != entries.len() || keys.len() != states.len() {
            return Err(FfmErr::malformed(format!(
                "parallel arrays differ in length: {} keys, {} entries, {} states",
                keys.len(),
                entries.len(),
                states.len()
            )));
        }

        let mut full = 0;
        let mut removed = 0;

        for (i, (state, entry)) in states.iter().zip(&entries).enumerate() {
            match (state, entry) {
                (SlotState::Full, Some(_)) => full += 1,
                (SlotState::Full, None) => {
                    return Err(FfmErr::malformed(format!("full slot {i} has no entry")));
                }
                (_, Some(_)) => {
                    return Err(FfmErr::malformed(format!(
                        "slot {i} is {state:?} but holds an entry"
                    )));
                }
                (SlotState::Removed, None) => removed += 1,
                (SlotState::Free, None) => {}
            }
        }

        if full != used {
            return Err(FfmErr::malformed(format!(
                "expected {used} full slots, found {full}"
            )));
        }

        let capacity = keys.len();
        let table = Self {
            keys,
            entries,
            states,
            used,
            occupied: full + removed,
            threshold: threshold_for(capacity),
        };

        // Every full key must be the first match of its own probe sequence.
        for (i, (&key, state)) in table.keys.iter().zip(&table.states).enumerate() {
            if *state != SlotState::Full {
                continue;
            }

            match table.find_slot(key) {
                Probe::Found(idx) if idx == i => {}
                Probe::Found(idx) => {
                    return Err(FfmErr::malformed(format!(
                        "key {key} is stored in slots {idx} and {i}"
                    )));
                }
                _ => {
                    return Err(FfmErr::malformed(format!(
                        "key {key} in slot {i} is unreachable from its probe sequence"
                    )));
                }
            }
        }

        debug!(capacity = capacity, used = used; "rebuilt parameter table");
        Ok(table)
    }

    /// The amount of keys stored.
    pub fn len(&self) -> usize {
        self.used
    }

    pub fn is_empty(&self) -> bool {
        self.used == 0
    }

    /// The amount of slots, that is the length of each of the parallel arrays.
    pub fn capacity(&self) -> usize {
        self.keys.len()
    }

    /// Looks up the entry of `key`.
    pub fn get(&self, key: i32) -> Option<&Entry> {
        match self.find_slot(key) {
            Probe::Found(idx) => self.entries[idx].as_ref(),
            _ => None,
        }
    }

    /// Looks up the entry of `key` mutably.
    pub fn get_mut(&mut self, key: i32) -> Option<&mut Entry> {
        match self.find_slot(key) {
            Probe::Found(idx) => self.entries[idx].as_mut(),
            _ => None,
        }
    }

    pub fn contains_key(&self, key: i32) -> bool {
        matches!(self.find_slot(key), Probe::Found(_))
    }

    /// Inserts `entry` under `key`, overwriting the previous entry if there was one.
    ///
    /// May grow the table, which keeps every other mapping intact.
    pub fn put(&mut self, key: i32, entry: Entry) {
        match self.find_slot(key) {
            Probe::Found(idx) => self.entries[idx] = Some(entry),
            _ => {
                self.insert_new(key, entry);
            }
        }
    }

    /// Returns the entry of `key`, inserting the one built by `init` if it was absent.
    ///
    /// # Arguments
    /// * `key` - The key to look up.
    /// * `init` - Builds the entry for a key seen for the first time, only called then.
    pub fn get_or_insert_with<F>(&mut self, key: i32, init: F) -> &mut Entry
    where
        F: FnOnce() -> Entry,
    {
        match self.find_slot(key) {
            Probe::Found(idx) => self.entries[idx].get_or_insert_with(init),
            _ => self.insert_new(key, init()),
        }
    }

    /// Removes `key` from the table leaving a tombstone in its slot.
    ///
    /// # Returns
    /// The removed entry, if the key was present.
    pub fn remove(&mut self, key: i32) -> Option<Entry> {
        let Probe::Found(idx) = self.find_slot(key) else {
            return None;
        };

        self.states[idx] = SlotState::Removed;
        self.used -= 1;
        self.entries[idx].take()
    }

    /// Exposes the internal layout as three positional arrays of the same length.
    ///
    /// Index `i` of each array refers to the same slot. The order of the slots isn't stable
    /// across insertions since those may grow the table.
    pub fn bulk_view(&self) -> (&[i32], &[Option<Entry>], &[SlotState]) {
        (&self.keys, &self.entries, &self.states)
    }

    /// Iterates over every stored key and entry in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (i32, &Entry)> {
        self.keys
            .iter()
            .zip(&self.entries)
            .filter_map(|(&key, entry)| entry.as_ref().map(|entry| (key, entry)))
    }

    /// Walks the probe sequence of `key`.
    ///
    /// Visits at most `capacity` slots, so it finishes even for a rebuilt table whose
    /// length isn't prime.
    fn find_slot(&self, key: i32) -> Probe {
        let capacity = self.keys.len();
        if capacity == 0 {
            return Probe::Exhausted;
        }

        let hash = hash(key);
        let step = if capacity > 2 {
            1 + hash % (capacity - 2)
        } else {
            1
        };

        let mut idx = hash % capacity;
        let mut tombstone = None;

        for _ in 0..capacity {
            match self.states[idx] {
                SlotState::Free => return Probe::Vacant(tombstone.unwrap_or(idx)),
                SlotState::Full if self.keys[idx] == key => return Probe::Found(idx),
                SlotState::Removed if tombstone.is_none() => tombstone = Some(idx),
                _ => {}
            }

            idx = (idx + step) % capacity;
        }

        tombstone.map_or(Probe::Exhausted, Probe::Vacant)
    }

    /// Stores a key known to be absent, growing the table first if needed.
    fn insert_new(&mut self, key: i32, entry: Entry) -> &mut Entry {
        let idx = loop {
            if self.occupied < self.threshold {
                match self.find_slot(key) {
                    Probe::Vacant(idx) | Probe::Found(idx) => break idx,
                    Probe::Exhausted => {}
                }
            }

            self.grow();
        };

        match self.states[idx] {
            SlotState::Free => {
                self.occupied += 1;
                self.used += 1;
            }
            SlotState::Removed => self.used += 1,
            SlotState::Full => {}
        }

        self.keys[idx] = key;
        self.states[idx] = SlotState::Full;
        self.entries[idx].insert(entry)
    }

    /// Makes room for at least `additional` more keys without growing on insertion.
    pub fn reserve(&mut self, additional: usize) {
        if self.occupied + additional < self.threshold {
            return;
        }

        let wanted = ((self.used + additional) as f32 / LOAD_FACTOR) as usize + 1;
        self.rehash(wanted);
    }

    fn grow(&mut self) {
        let wanted = ((self.used + 1) as f32 / LOAD_FACTOR) as usize * GROW_FACTOR;
        self.rehash(wanted);
    }

    /// Reallocates the table with at least `slots` slots and rehashes every stored key,
    /// dropping tombstones.
    ///
    /// The new arrays are fully built before replacing the current ones.
    fn rehash(&mut self, slots: usize) {
        let mut table = Self::with_capacity(slots);

        let keys = mem::take(&mut self.keys);
        let entries = mem::take(&mut self.entries);

        for (key, entry) in keys.into_iter().zip(entries) {
            if let Some(entry) = entry {
                table.insert_new(key, entry);
            }
        }

        debug!(
            from = self.states.len(),
            to = table.capacity(),
            used = table.used;
            "resized parameter table"
        );

        *self = table;
    }
}

fn hash(key: i32) -> usize {
    (key as u32 & 0x7fff_ffff) as usize
}

fn threshold_for(capacity: usize) -> usize {
    let threshold = (capacity as f32 * LOAD_FACTOR) as usize;
    threshold.min(capacity.saturating_sub(1))
}

fn next_prime(n: usize) -> usize {
    (n.max(2)..).find(|&c| is_prime(c)).unwrap_or(n)
}

fn is_prime(n: usize) -> bool {
    if n < 4 {
        return n >= 2;
    }

    if n % 2 == 0 {
        return false;
    }

    (3..)
        .step_by(2)
        .take_while(|d| d * d <= n)
        .all(|d| n % d != 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(w: f32) -> Entry {
        Entry::new(w, vec![w; 2])
    }

    #[test]
    fn test_absent_key_is_not_found() {
        let table = ParamTable::with_capacity(16);
        assert!(table.get(42).is_none());
        assert!(table.is_empty());
    }

    #[test]
    fn test_put_overwrites_existing() {
        let mut table = ParamTable::with_capacity(16);

        table.put(3, entry(1.));
        table.put(3, entry(2.));

        assert_eq!(table.len(), 1);
        assert_eq!(table.get(3).unwrap().w, 2.);
    }

    #[test]
    fn test_growth_preserves_mappings() {
        let mut table = ParamTable::with_capacity(1);
        let initial = table.capacity();

        for key in -500..500 {
            table.put(key, entry(key as f32));
        }

        assert!(table.capacity() > initial);
        assert_eq!(table.len(), 1000);

        for key in -500..500 {
            assert_eq!(table.get(key).unwrap().w, key as f32, "key {key}");
        }
    }

    #[test]
    fn test_get_or_insert_only_initializes_once() {
        let mut table = ParamTable::with_capacity(16);
        let mut calls = 0;

        for _ in 0..3 {
            table.get_or_insert_with(9, || {
                calls += 1;
                entry(0.)
            });
        }

        assert_eq!(calls, 1);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_remove_leaves_probe_chains_intact() {
        let mut table = ParamTable::with_capacity(11);
        let capacity = table.capacity() as i32;

        // Same home slot for every key.
        let keys = [1, 1 + capacity, 1 + 2 * capacity];
        for key in keys {
            table.put(key, entry(key as f32));
        }

        assert_eq!(table.remove(keys[0]).unwrap().w, keys[0] as f32);
        assert!(table.remove(keys[0]).is_none());
        assert_eq!(table.get(keys[2]).unwrap().w, keys[2] as f32);
        assert_eq!(table.len(), 2);

        table.put(keys[0], entry(-1.));
        assert_eq!(table.get(keys[0]).unwrap().w, -1.);
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn test_churn_with_tombstones_never_loses_keys() {
        let mut table = ParamTable::with_capacity(11);

        for round in 0..50 {
            for key in 0..8 {
                table.put(round * 8 + key, entry(key as f32));
            }
            for key in 0..8 {
                table.remove(round * 8 + key);
            }
        }

        table.put(7, entry(7.));
        assert_eq!(table.len(), 1);
        assert_eq!(table.get(7).unwrap().w, 7.);
    }

    #[test]
    fn test_bulk_view_is_positional() {
        let mut table = ParamTable::with_capacity(16);
        for key in 0..5 {
            table.put(key * 31, entry(key as f32));
        }

        let (keys, entries, states) = table.bulk_view();
        assert_eq!(keys.len(), entries.len());
        assert_eq!(keys.len(), states.len());

        for ((key, entry), state) in keys.iter().zip(entries).zip(states) {
            match state {
                SlotState::Full => assert_eq!(table.get(*key), entry.as_ref()),
                _ => assert!(entry.is_none()),
            }
        }
    }

    #[test]
    fn test_rebuild_keeps_lookups() {
        let mut table = ParamTable::with_capacity(16);
        for key in 0..10 {
            table.put(key, entry(key as f32));
        }
        table.remove(4);

        let (keys, entries, states) = table.bulk_view();
        let rebuilt =
            ParamTable::rebuild(keys.to_vec(), entries.to_vec(), states.to_vec(), table.len())
                .unwrap();

        assert_eq!(rebuilt.len(), 9);
        assert!(rebuilt.get(4).is_none());
        for key in (0..10).filter(|&k| k != 4) {
            assert_eq!(rebuilt.get(key).unwrap().w, key as f32);
        }
    }

    #[test]
    fn test_rebuild_rejects_length_mismatch() {
        let res = ParamTable::rebuild(vec![0; 3], vec![None, None], vec![SlotState::Free; 3], 0);
        assert!(matches!(res, Err(FfmErr::MalformedLayout { .. })));
    }

    #[test]
    fn test_rebuild_rejects_used_mismatch() {
        let res = ParamTable::rebuild(
            vec![5, 0],
            vec![Some(entry(1.)), None],
            vec![SlotState::Full, SlotState::Free],
            2,
        );
        assert!(matches!(res, Err(FfmErr::MalformedLayout { .. })));
    }

    #[test]
    fn test_rebuild_rejects_full_slot_without_entry() {
        let res = ParamTable::rebuild(vec![5], vec![None], vec![SlotState::Full], 1);
        assert!(matches!(res, Err(FfmErr::MalformedLayout { .. })));
    }

    #[test]
    fn test_rebuild_rejects_duplicated_key() {
        let mut keys = vec![0; 11];
        let mut entries = vec![None; 11];
        let mut states = vec![SlotState::Free; 11];

        // Key 5 probes slot 5 and then slot 0.
        for (slot, w) in [(5, 1.), (0, 2.)] {
            keys[slot] = 5;
            entries[slot] = Some(entry(w));
            states[slot] = SlotState::Full;
        }

        let res = ParamTable::rebuild(keys, entries, states, 2);
        assert!(matches!(res, Err(FfmErr::MalformedLayout { .. })));

        let res = ParamTable::rebuild(
            vec![5, 5, 0],
            vec![Some(entry(1.)), Some(entry(2.)), None],
            vec![SlotState::Full, SlotState::Full, SlotState::Free],
            2,
        );
        assert!(matches!(res, Err(FfmErr::MalformedLayout { .. })));
    }

    #[test]
    fn test_rebuild_rejects_misplaced_key() {
        let mut keys = vec![0; 11];
        let mut entries = vec![None; 11];
        let mut states = vec![SlotState::Free; 11];

        // Key 3 starts probing at slot 3, which is free.
        keys[0] = 3;
        entries[0] = Some(entry(3.));
        states[0] = SlotState::Full;

        let res = ParamTable::rebuild(keys, entries, states, 1);
        assert!(matches!(res, Err(FfmErr::MalformedLayout { .. })));
    }

    #[test]
    fn test_rebuild_accepts_keys_behind_tombstones() {
        let mut table = ParamTable::with_capacity(11);
        table.put(3, entry(3.));
        table.put(14, entry(14.));
        table.remove(3);

        let (keys, entries, states) = table.bulk_view();
        let rebuilt =
            ParamTable::rebuild(keys.to_vec(), entries.to_vec(), states.to_vec(), table.len())
                .unwrap();

        assert_eq!(rebuilt.get(14).unwrap().w, 14.);
        assert!(rebuilt.get(3).is_none());
    }

    #[test]
    fn test_rebuilt_odd_sized_table_accepts_inserts() {
        let mut table = ParamTable::rebuild(vec![0; 4], vec![None; 4], vec![SlotState::Free; 4], 0)
            .unwrap();

        for key in 0..20 {
            table.put(key, entry(key as f32));
        }

        assert_eq!(table.len(), 20);
        assert_eq!(table.get(19).unwrap().w, 19.);
    }

    #[test]
    fn test_empty_rebuilt_table() {
        let mut table = ParamTable::rebuild(vec![], vec![], vec![], 0).unwrap();
        assert!(table.get(1).is_none());

        table.put(1, entry(1.));
        assert_eq!(table.get(1).unwrap().w, 1.);
    }

    #[test]
    fn test_reserve_avoids_later_growth() {
        let mut table = ParamTable::with_capacity(11);
        table.put(-3, entry(-3.));

        table.reserve(1000);
        let capacity = table.capacity();

        for key in 0..1000 {
            table.put(key, entry(key as f32));
        }

        assert_eq!(table.capacity(), capacity);
        assert_eq!(table.get(-3).unwrap().w, -3.);
        assert_eq!(table.len(), 1001);
    }

    #[test]
    fn test_slot_state_bytes() {
        for state in [SlotState::Free, SlotState::Full, SlotState::Removed] {
            assert_eq!(SlotState::from_byte(state as u8), Some(state));
        }
        assert_eq!(SlotState::from_byte(3), None);
    }

    #[test]
    fn test_primes() {
        assert_eq!(next_prime(11), 11);
        assert_eq!(next_prime(12), 13);
        assert_eq!(next_prime(65536), 65537);
        assert!(!is_prime(9));
    }
}
