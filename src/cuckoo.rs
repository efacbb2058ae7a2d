//! Generic cuckoo hash map (C4 support).
//!
//! Re-architects the template-heavy `cuckoo_hash<node_handler>` from
//! `CuckooHash.hpp`: the original parameterizes the table on a "node
//! handler" struct that extracts a `u64` key from a stored index. Here that
//! becomes the [`KeyOf`] trait, and any value type implementing it can be
//! stored directly (the compacted trie's child map keys on a node's first
//! 8-byte block; the micro-trie keys on its own stored key-blocks).
//!
//! `NUM_CUCKOO_HASH_FUNCTIONS = 2`, eviction bounded by `MAX_TRIES`, matching
//! the original's constants; on repeated eviction failure the table doubles
//! capacity and rehashes, rather than growing unboundedly.

use log::trace;

const MAX_TRIES: usize = 32;
const MAX_LOAD_FACTOR: f64 = 0.8;

/// Extracts the lookup key from a stored value.
pub trait KeyOf {
    fn key_of(&self) -> u64;
}

#[derive(Clone)]
enum Slot<V> {
    Empty,
    Occupied(V),
}

/// Two-function cuckoo hash table keyed by `V::key_of()`.
pub struct CuckooMap<V: KeyOf + Clone> {
    tables: [Vec<Slot<V>>; 2],
    seeds: [u64; 2],
    len: usize,
}

impl<V: KeyOf + Clone> CuckooMap<V> {
    pub fn new() -> Self {
        Self::with_capacity(4)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let cap = capacity.next_power_of_two().max(2);
        Self {
            tables: [vec_empty(cap), vec_empty(cap)],
            seeds: [0x9e3779b97f4a7c15, 0xbf58476d1ce4e5b9],
            len: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn hash(&self, table: usize, key: u64) -> usize {
        let cap = self.tables[table].len() as u64;
        let h = (key ^ self.seeds[table]).wrapping_mul(0x100000001b3);
        let h = h ^ (h >> 33);
        (h % cap) as usize
    }

    pub fn get(&self, key: u64) -> Option<&V> {
        for t in 0..2 {
            let idx = self.hash(t, key);
            if let Slot::Occupied(v) = &self.tables[t][idx] {
                if v.key_of() == key {
                    return Some(v);
                }
            }
        }
        None
    }

    pub fn contains(&self, key: u64) -> bool {
        self.get(key).is_some()
    }

    pub fn remove(&mut self, key: u64) -> Option<V> {
        for t in 0..2 {
            let idx = self.hash(t, key);
            if matches!(&self.tables[t][idx], Slot::Occupied(v) if v.key_of() == key) {
                let slot = std::mem::replace(&mut self.tables[t][idx], Slot::Empty);
                self.len -= 1;
                if let Slot::Occupied(v) = slot {
                    return Some(v);
                }
            }
        }
        None
    }

    /// Insert `value`, keyed by `value.key_of()`. Replaces an existing entry
    /// with the same key.
    pub fn insert(&mut self, value: V) {
        let key = value.key_of();
        if self.get(key).is_some() {
            self.remove(key);
        }

        let total_cap = self.tables[0].len() + self.tables[1].len();
        if (self.len + 1) as f64 > MAX_LOAD_FACTOR * total_cap as f64 {
            self.grow();
        }

        self.insert_inner(value, 0);
    }

    fn insert_inner(&mut self, mut value: V, start_table: usize) {
        let mut table = start_table;
        for _ in 0..MAX_TRIES {
            let key = value.key_of();
            let idx = self.hash(table, key);
            match std::mem::replace(&mut self.tables[table][idx], Slot::Occupied(value.clone())) {
                Slot::Empty => {
                    self.len += 1;
                    return;
                }
                Slot::Occupied(evicted) => {
                    trace!("cuckoo eviction at table {table} idx {idx}");
                    value = evicted;
                    table = 1 - table;
                }
            }
        }
        // ran out of tries: grow and retry from scratch.
        trace!("cuckoo insert exceeded MAX_TRIES, growing table");
        self.grow();
        self.insert_inner(value, 0);
    }

    fn grow(&mut self) {
        let new_cap = (self.tables[0].len() + self.tables[1].len()).next_power_of_two() * 2;
        let old = std::mem::replace(
            &mut self.tables,
            [vec_empty(new_cap), vec_empty(new_cap)],
        );
        self.len = 0;
        for table in old {
            for slot in table {
                if let Slot::Occupied(v) = slot {
                    self.insert_inner(v, 0);
                }
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &V> {
        self.tables.iter().flat_map(|t| {
            t.iter().filter_map(|s| match s {
                Slot::Occupied(v) => Some(v),
                Slot::Empty => None,
            })
        })
    }
}

impl<V: KeyOf + Clone> Default for CuckooMap<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: KeyOf + Clone> Clone for CuckooMap<V> {
    fn clone(&self) -> Self {
        let mut m = Self::with_capacity(self.tables[0].len() + self.tables[1].len());
        for v in self.iter() {
            m.insert(v.clone());
        }
        m
    }
}

fn vec_empty<V: Clone>(cap: usize) -> Vec<Slot<V>> {
    vec![Slot::Empty; cap]
}

impl<V> Clone for Slot<V>
where
    V: Clone,
{
    fn clone(&self) -> Self {
        match self {
            Slot::Empty => Slot::Empty,
            Slot::Occupied(v) => Slot::Occupied(v.clone()),
        }
    }
}
