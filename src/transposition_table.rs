use crate::chess::{HashKey, Move};
use crate::defs::Value;
use log::warn;

/// What the stored score says about the true value of the node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    /// Score fell inside the window
    Exact,
    /// Failed high, the true score is at least this
    Lower,
    /// Failed low, the true score is at most this
    Upper,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TEntry {
    pub key: HashKey,
    pub depth: i32,
    pub score: Value,
    pub bound: Bound,
    pub best_move: Option<Move>,
    generation: u8,
}

impl TEntry {
    pub fn new(
        key: HashKey,
        depth: i32,
        score: Value,
        bound: Bound,
        best_move: Option<Move>,
    ) -> Self {
        TEntry {
            key,
            depth,
            score,
            bound,
            best_move,
            generation: 0,
        }
    }

    /// Whether the stored score settles a node searched to `depth` with
    /// the window (`alpha`, `beta`)
    pub fn cutoff(&self, depth: i32, alpha: Value, beta: Value) -> Option<Value> {
        if self.depth < depth {
            return None;
        }
        match self.bound {
            Bound::Exact => Some(self.score),
            Bound::Lower if self.score >= beta => Some(self.score),
            Bound::Upper if self.score <= alpha => Some(self.score),
            _ => None,
        }
    }
}

/// Fixed-size, always-addressable cache of searched positions.
///
/// Slots are addressed by the low bits of the key. A zero-capacity table
/// is valid and simply never hits.
pub struct TranspositionTable {
    entries: Vec<Option<TEntry>>,
    mask: usize,
    generation: u8,
}

impl TranspositionTable {
    /// Largest power-of-two table fitting in `size_mb`, halved until the
    /// allocation succeeds
    pub fn new(size_mb: usize) -> Self {
        let entry_size = std::mem::size_of::<Option<TEntry>>();
        let budget = size_mb.saturating_mul(1024 * 1024) / entry_size;
        let mut capacity = if budget == 0 {
            0
        } else {
            1usize << (usize::BITS - 1 - budget.leading_zeros())
        };

        let mut entries = Vec::new();
        while capacity > 0 {
            match entries.try_reserve_exact(capacity) {
                Ok(()) => break,
                Err(err) => {
                    warn!("could not allocate {capacity} table entries ({err}), halving");
                    capacity /= 2;
                }
            }
        }
        entries.resize(capacity, None);

        TranspositionTable {
            entries,
            mask: capacity.saturating_sub(1),
            generation: 0,
        }
    }

    /// Number of slots
    pub fn capacity(&self) -> usize {
        self.entries.len()
    }

    pub fn is_enabled(&self) -> bool {
        !self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.iter_mut().for_each(|e| *e = None);
        self.generation = 0;
    }

    /// Marks existing entries as belonging to a previous search
    pub fn new_search(&mut self) {
        self.generation = self.generation.wrapping_add(1);
    }

    #[inline]
    fn index(&self, key: HashKey) -> usize {
        key as usize & self.mask
    }

    pub fn probe(&self, key: HashKey) -> Option<TEntry> {
        if self.entries.is_empty() {
            return None;
        }
        self.entries[self.index(key)].filter(|e| e.key == key)
    }

    /// Overwrites the slot unless it holds a deeper result from this search
    pub fn store(&mut self, key: HashKey, mut entry: TEntry) {
        if self.entries.is_empty() {
            return;
        }
        entry.key = key;
        entry.generation = self.generation;
        let index = self.index(key);
        let slot = &mut self.entries[index];
        let replace = match slot {
            None => true,
            Some(old) => old.generation != entry.generation || entry.depth >= old.depth,
        };
        if replace {
            *slot = Some(entry);
        }
    }

    /// Permille of sampled slots in use by the current search
    pub fn hashfull(&self) -> u32 {
        let sample = self.entries.len().min(1000);
        if sample == 0 {
            return 0;
        }
        let used = self.entries[..sample]
            .iter()
            .flatten()
            .filter(|e| e.generation == self.generation)
            .count();
        (used * 1000 / sample) as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(depth: i32, score: Value, bound: Bound) -> TEntry {
        TEntry::new(0, depth, score, bound, None)
    }

    #[test]
    fn capacity_is_power_of_two() {
        let tt = TranspositionTable::new(1);
        assert!(tt.capacity().is_power_of_two());
        assert!(tt.capacity() * std::mem::size_of::<Option<TEntry>>() <= 1024 * 1024);
        assert!(!TranspositionTable::new(0).is_enabled());
    }

    #[test]
    fn disabled_table_never_hits() {
        let mut tt = TranspositionTable::new(0);
        tt.store(42, entry(3, 10, Bound::Exact));
        assert_eq!(tt.probe(42), None);
    }

    #[test]
    fn probe_checks_full_key() {
        let mut tt = TranspositionTable::new(1);
        let key = 0xdead_beef;
        tt.store(key, entry(3, 10, Bound::Exact));
        assert_eq!(tt.probe(key).map(|e| e.score), Some(10));
        let aliased = key + tt.capacity() as HashKey;
        assert_eq!(tt.probe(aliased), None);
    }

    #[test]
    fn deeper_entries_survive() {
        let mut tt = TranspositionTable::new(1);
        tt.store(7, entry(5, 1, Bound::Exact));
        tt.store(7, entry(3, 2, Bound::Exact));
        assert_eq!(tt.probe(7).map(|e| e.score), Some(1));
        // equal depth, most recent wins
        tt.store(7, entry(5, 3, Bound::Exact));
        assert_eq!(tt.probe(7).map(|e| e.score), Some(3));
        // anything replaces a previous search's entry
        tt.new_search();
        tt.store(7, entry(1, 4, Bound::Exact));
        assert_eq!(tt.probe(7).map(|e| e.score), Some(4));
    }

    #[test]
    fn cutoff_respects_bounds() {
        assert_eq!(entry(4, 50, Bound::Exact).cutoff(4, -10, 10), Some(50));
        assert_eq!(entry(3, 50, Bound::Exact).cutoff(4, -10, 10), None);
        assert_eq!(entry(4, 50, Bound::Lower).cutoff(4, -10, 10), Some(50));
        assert_eq!(entry(4, 5, Bound::Lower).cutoff(4, -10, 10), None);
        assert_eq!(entry(4, -50, Bound::Upper).cutoff(4, -10, 10), Some(-50));
        assert_eq!(entry(4, 0, Bound::Upper).cutoff(4, -10, 10), None);
    }

    #[test]
    fn clear_empties() {
        let mut tt = TranspositionTable::new(1);
        tt.store(9, entry(2, 0, Bound::Upper));
        tt.clear();
        assert_eq!(tt.probe(9), None);
        assert_eq!(tt.hashfull(), 0);
    }
}
