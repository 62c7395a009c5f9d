//! Two-tier transposition table.
//!
//! Every position is probed in a "deep" table first and, on a miss or
//! a shallower hit, a "big" table. A store always lands in the deep
//! table unless that slot already holds an equal-or-deeper entry, in
//! which case the new entry is displaced into the big table instead.
//! This mirrors the original engine's `hashcheck`/`hashstore` exactly,
//! including its default table sizes.
//!
//! The original packs an entry's eval/flag/depth/color/occupied flag
//! into C bitfields totalling less than a machine word. Rust has no
//! native bitfields, so only flag/depth/color/occupied (which fit
//! comfortably in a handful of bits each) are hand-packed into a
//! `u32`; `key`, `lock`, and `eval` keep their full width rather than
//! being truncated to the original's 13-bit eval field, which would
//! silently clip scores near the mate bound.

use crate::pieces::Color;

/// Matches the original engine's iterative-deepening depth ceiling.
/// Exposed here because the mate-distance adjustment below needs it.
pub const MAXDEPTH: u8 = 55;

pub const DEFAULT_DEEP_CAPACITY: u64 = 199_999;
pub const DEFAULT_BIG_CAPACITY: u64 = 799_996;

/// Size of a single table entry, used by the `hashsize` protocol
/// command to convert between a megabyte budget and an entry count,
/// mirroring the original's `sizeof(struct TEntry)`.
pub const ENTRY_SIZE_BYTES: usize = std::mem::size_of::<TTEntry>();

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum TTFlag {
    LowerBound = 0,
    UpperBound = 1,
    Exact = 2,
}

const OCCUPIED_BIT: u32 = 1;
const COLOR_BIT: u32 = 1 << 1;
const DEPTH_SHIFT: u32 = 2;
const DEPTH_MASK: u32 = 0x3F;
const FLAG_SHIFT: u32 = 8;
const FLAG_MASK: u32 = 0x3;

fn pack(depth: u8, color: Color, flag: TTFlag) -> u32 {
    let mut packed = OCCUPIED_BIT;
    if color == Color::Black {
        packed |= COLOR_BIT;
    }
    packed |= ((depth as u32) & DEPTH_MASK) << DEPTH_SHIFT;
    packed |= (flag as u32 & FLAG_MASK) << FLAG_SHIFT;
    packed
}

#[derive(Debug, Clone, Copy)]
struct TTEntry {
    key: u64,
    lock: u32,
    eval: i32,
    move_from: u8,
    move_to: u8,
    packed: u32,
}

impl TTEntry {
    const EMPTY: TTEntry = TTEntry { key: 0, lock: 0, eval: 0, move_from: 0, move_to: 0, packed: 0 };

    fn occupied(&self) -> bool {
        self.packed & OCCUPIED_BIT != 0
    }

    fn color(&self) -> Color {
        if self.packed & COLOR_BIT != 0 { Color::Black } else { Color::White }
    }

    fn depth(&self) -> u8 {
        ((self.packed >> DEPTH_SHIFT) & DEPTH_MASK) as u8
    }

    fn flag(&self) -> TTFlag {
        match (self.packed >> FLAG_SHIFT) & FLAG_MASK {
            0 => TTFlag::LowerBound,
            1 => TTFlag::UpperBound,
            _ => TTFlag::Exact,
        }
    }

    fn best_move(&self) -> (u8, u8) {
        (self.move_from, self.move_to)
    }
}

/// Result of probing the table for a position.
pub struct ProbeOutcome {
    /// A usable score, already mate-distance adjusted. If present the
    /// caller can return it directly (a beta cutoff or exact hit).
    pub value: Option<i32>,
    /// Possibly narrowed alpha/beta, for the caller to keep searching with.
    pub alpha: i32,
    pub beta: i32,
    /// Best move recorded at this position in either tier, usable as a
    /// move-ordering hint regardless of whether `value` is set.
    pub hint_move: Option<(u8, u8)>,
}

enum EntryProbe {
    Cutoff(i32, (u8, u8)),
    Narrowed(i32, i32, (u8, u8)),
    NoMatch,
}

fn probe_entry(entry: &TTEntry, key: u64, lock: u32, depth: u8, color: Color, alpha: i32, beta: i32) -> EntryProbe {
    if !(entry.occupied() && entry.lock == lock && entry.color() == color && entry.key == key && entry.depth() >= depth) {
        return EntryProbe::NoMatch;
    }

    let mut v = entry.eval;
    if v.abs() >= crate::evaluate::MATE - MAXDEPTH as i32 {
        v += if v > 0 { -1 } else { 1 };
    }

    match entry.flag() {
        TTFlag::Exact => EntryProbe::Cutoff(v, entry.best_move()),
        TTFlag::LowerBound => {
            if v >= beta {
                EntryProbe::Cutoff(v, entry.best_move())
            } else if v > alpha {
                EntryProbe::Narrowed(v, beta, entry.best_move())
            } else {
                EntryProbe::NoMatch
            }
        }
        TTFlag::UpperBound => {
            if v <= alpha {
                EntryProbe::Cutoff(v, entry.best_move())
            } else if v < beta {
                EntryProbe::Narrowed(alpha, v, entry.best_move())
            } else {
                EntryProbe::NoMatch
            }
        }
    }
}

pub struct TranspositionTable {
    deep: Vec<TTEntry>,
    big: Vec<TTEntry>,
}

impl TranspositionTable {
    pub fn new(deep_capacity: u64, big_capacity: u64) -> TranspositionTable {
        TranspositionTable {
            deep: vec![TTEntry::EMPTY; deep_capacity as usize],
            big: vec![TTEntry::EMPTY; big_capacity as usize],
        }
    }

    pub fn clear(&mut self) {
        self.deep.fill(TTEntry::EMPTY);
        self.big.fill(TTEntry::EMPTY);
    }

    pub fn deep_capacity(&self) -> u64 {
        self.deep.len() as u64
    }

    pub fn big_capacity(&self) -> u64 {
        self.big.len() as u64
    }

    /// Probe both tiers for `key`. Mirrors `hashcheck`: when the
    /// remaining depth exceeds both tiers' stored depth, no score is
    /// usable but a move-ordering hint may still be returned.
    pub fn probe(&self, key: u64, mut alpha: i32, mut beta: i32, depth: u8, color: Color) -> ProbeOutcome {
        let lock = (key >> 32) as u32;
        let deep = &self.deep[(key % self.deep.len() as u64) as usize];
        let big = &self.big[(key % self.big.len() as u64) as usize];

        if !(deep.occupied() || big.occupied()) {
            return ProbeOutcome { value: None, alpha, beta, hint_move: None };
        }

        let mut hint = if !deep.occupied() {
            Some(big.best_move())
        } else if !big.occupied() {
            Some(deep.best_move())
        } else {
            None
        };

        if depth > big.depth() && depth > deep.depth() {
            hint = Some(if big.depth() > deep.depth() { big.best_move() } else { deep.best_move() });
            return ProbeOutcome { value: None, alpha, beta, hint_move: hint };
        }

        for entry in [deep, big] {
            match probe_entry(entry, key, lock, depth, color, alpha, beta) {
                EntryProbe::Cutoff(v, mv) => {
                    return ProbeOutcome { value: Some(v), alpha, beta, hint_move: Some(mv) };
                }
                EntryProbe::Narrowed(a, b, mv) => {
                    alpha = a;
                    beta = b;
                    hint = Some(mv);
                }
                EntryProbe::NoMatch => {}
            }
        }

        ProbeOutcome { value: None, alpha, beta, hint_move: hint }
    }

    /// Store a search result. Mirrors `hashstore`: entries shallower
    /// than one ply are never stored, since they're cheap enough to
    /// just re-search.
    pub fn store(&mut self, key: u64, depth: u8, flag: TTFlag, eval: i32, color: Color, best_move: (u8, u8)) {
        if depth <= 1 {
            return;
        }

        let lock = (key >> 32) as u32;
        let entry = TTEntry {
            key,
            lock,
            eval,
            move_from: best_move.0,
            move_to: best_move.1,
            packed: pack(depth, color, flag),
        };

        let deep_idx = (key % self.deep.len() as u64) as usize;
        if !self.deep[deep_idx].occupied() || depth >= self.deep[deep_idx].depth() {
            self.deep[deep_idx] = entry;
        } else {
            let big_idx = (key % self.big.len() as u64) as usize;
            self.big[big_idx] = entry;
        }
    }
}

/// Ported verbatim from the original's `is_prime`/`make_prime`, used
/// when `set hashsize` picks a new table capacity. Preserves the
/// original's quirk of treating 2 as non-prime (it fails the oddness
/// check before any divisor test runs) since `make_prime` never
/// reaches that low in practice.
pub fn is_prime(n: u64) -> bool {
    if n % 2 == 0 {
        return false;
    }
    let mut i = 3;
    while i < n {
        if n % i == 0 {
            return false;
        }
        i += 2;
    }
    true
}

pub fn make_prime(n: u64) -> u64 {
    let mut n = if n % 2 == 0 { n - 1 } else { n };
    while !is_prime(n) {
        n -= 2;
    }
    n
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_then_probe_returns_exact_score() {
        let mut tt = TranspositionTable::new(101, 103);
        tt.store(42, 5, TTFlag::Exact, 123, Color::White, (1, 2));
        let outcome = tt.probe(42, -1000, 1000, 5, Color::White);
        assert_eq!(outcome.value, Some(123));
        assert_eq!(outcome.hint_move, Some((1, 2)));
    }

    #[test]
    fn shallow_store_is_not_recorded() {
        let mut tt = TranspositionTable::new(101, 103);
        tt.store(42, 1, TTFlag::Exact, 123, Color::White, (1, 2));
        let outcome = tt.probe(42, -1000, 1000, 1, Color::White);
        assert!(outcome.value.is_none());
    }

    #[test]
    fn displaced_entry_lands_in_big_table() {
        let mut tt = TranspositionTable::new(101, 103);
        tt.store(42, 10, TTFlag::Exact, 1, Color::White, (1, 2));
        tt.store(42, 2, TTFlag::Exact, 2, Color::White, (3, 4));
        let outcome = tt.probe(42, -1000, 1000, 2, Color::White);
        assert_eq!(outcome.value, Some(2));
    }

    #[test]
    fn make_prime_rounds_down_to_a_prime() {
        assert_eq!(make_prime(100), 97);
        assert_eq!(make_prime(200_000), 199_999);
    }
}
