//! The engine's external interface: the three entry points a host
//! application drives it through, translated from the original
//! engine's `getmove`/`islegal`/`enginecommand` DLL exports
//! (`examples/original_source/src/main.c`) into plain Rust functions.
//!
//! Each call is stateless and self-contained, exactly like the
//! original: `get_move` allocates a fresh transposition table for the
//! search and discards it afterward rather than keeping a
//! long-lived engine object around between moves. The one piece of
//! state that *does* persist across calls is the configured hash
//! table size, set via `engine_command("set hashsize <mb>")` — the
//! original keeps this in global variables, which this module mirrors
//! with a pair of atomics.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use crate::board::{Board, Move};
use crate::movegen;
use crate::pieces;
use crate::search::{GameResult, SearchEngine};
use crate::tt::{self, ENTRY_SIZE_BYTES};
use crate::zobrist;

pub use crate::pieces::Color as Side;

const ENGINE_NAME: &str = "Draughts Engine v1.0";
const ENGINE_ABOUT: &str =
    "Draughts Engine (Russian Draughts)\n\nA negamax search engine for Russian draughts.";

static DEEP_CAPACITY: AtomicU64 = AtomicU64::new(tt::DEFAULT_DEEP_CAPACITY);
static BIG_CAPACITY: AtomicU64 = AtomicU64::new(tt::DEFAULT_BIG_CAPACITY);

/// A completed move, in the shape a host application reports to its
/// own UI: the overall from/to squares, the full path of squares
/// visited (more than two entries only for a capture chain), the
/// squares any captured pieces sat on, and the notation string the
/// original's `to_movenotation` would have produced.
#[derive(Debug, Clone)]
pub struct MoveRecord {
    pub from: u8,
    pub to: u8,
    pub path: Vec<u8>,
    pub captured: Vec<u8>,
    pub is_capture: bool,
    pub promoted: bool,
    pub notation: String,
}

fn build_move_record(board: &Board, mv: &Move) -> MoveRecord {
    let from = mv.from_square();
    let to = mv.to_square();
    let mut path = vec![from];
    let mut captured = Vec::new();

    if let Move::Capture { .. } = mv {
        for jump in mv.jumps() {
            path.push(jump.to);
            captured.push(jump.captured_square);
        }
    } else {
        path.push(to);
    }

    let moving_piece = board.squares[from as usize];
    let promoted = pieces::is_man(moving_piece) && pieces::promotes_on(board.turn, to);

    MoveRecord {
        from,
        to,
        path,
        captured,
        is_capture: mv.is_capture(),
        promoted,
        notation: mv.to_notation(),
    }
}

fn board_for(arr: &[[i32; 8]; 8], side: Side) -> Board {
    zobrist::init();
    let mut board = Board::from_cb_array(arr);
    board.turn = side;
    board.zobrist_key = zobrist::full_hash(&board);
    board
}

/// Search `board` for `side`'s best move under `time_budget`, or until
/// `cancel` is set. Returns the move (`None` only if `side` has no
/// legal moves, i.e. has already lost), the resulting game outcome as
/// far as the search can tell, and a human-readable progress line
/// mirroring the original's `"... [move] [depth d] [eval e] ..."`
/// search summary.
pub fn get_move(
    board: &[[i32; 8]; 8],
    side: Side,
    time_budget: Duration,
    cancel: &AtomicBool,
) -> (Option<MoveRecord>, GameResult, String) {
    let b = board_for(board, side);

    let mut engine = SearchEngine::with_hash_capacities(
        DEEP_CAPACITY.load(Ordering::Acquire),
        BIG_CAPACITY.load(Ordering::Acquire),
    );
    let info = engine.find_best_move(&b, time_budget, cancel);

    let record = info.best_move.as_ref().map(|mv| build_move_record(&b, mv));
    (record, info.result, info.progress)
}

/// Check whether moving from `from` to `to` (0-based square indices)
/// is legal for `side` in `board`, returning the full move record if
/// so. Mirrors `islegal`'s "check captures, then check quiet moves"
/// order, which `generate_all_moves`'s mandatory-capture rule already
/// encodes.
pub fn is_legal(board: &[[i32; 8]; 8], side: Side, from: u8, to: u8) -> Option<MoveRecord> {
    let b = board_for(board, side);
    let moves = movegen::generate_all_moves(&b);
    let mv = moves.into_iter().find(|m| m.from_square() == from && m.to_square() == to)?;
    Some(build_move_record(&b, &mv))
}

/// Dispatch a text protocol command, returning the reply line if the
/// command was recognized. Mirrors `enginecommand`'s `name`/`about`/
/// `get`/`set` command set.
pub fn engine_command(command: &str) -> Option<String> {
    let tokens: Vec<&str> = command.split_whitespace().collect();
    match tokens.as_slice() {
        ["name"] => Some(ENGINE_NAME.to_string()),
        ["about"] => Some(ENGINE_ABOUT.to_string()),
        ["get", "protocolversion"] => Some("2".to_string()),
        ["get", "gametype"] => Some("25".to_string()),
        ["get", "hashsize"] => {
            let deep_mb = DEEP_CAPACITY.load(Ordering::Acquire) * ENTRY_SIZE_BYTES as u64 / (1024 * 1024);
            let big_mb = BIG_CAPACITY.load(Ordering::Acquire) * ENTRY_SIZE_BYTES as u64 / (1024 * 1024);
            Some(format!("Deep TT size => {}mb\n\nBig TT size => {}mb", deep_mb, big_mb))
        }
        ["set", "hashsize", mb_str] => {
            let mb: i64 = mb_str.parse().ok()?;
            let mb = mb - 2;
            if mb < 1 {
                return None;
            }
            let mb = mb.min(128) as u64;
            let entries_per_mb = (1024 * 1024) / ENTRY_SIZE_BYTES as u64;
            let total = mb * entries_per_mb;
            let deep = tt::make_prime((total * 4) / 10);
            let big = tt::make_prime((total * 6) / 10);
            DEEP_CAPACITY.store(deep, Ordering::Release);
            BIG_CAPACITY.store(big, Ordering::Release);
            Some(format!("deep={} big={}", deep, big))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_command_is_recognized() {
        assert_eq!(engine_command("name"), Some(ENGINE_NAME.to_string()));
    }

    #[test]
    fn unknown_command_returns_none() {
        assert_eq!(engine_command("frobnicate"), None);
    }

    #[test]
    fn set_hashsize_changes_capacities_used_by_get_hashsize() {
        assert!(engine_command("set hashsize 16").is_some());
        let reply = engine_command("get hashsize").unwrap();
        assert!(reply.contains("Deep TT size"));
    }

    #[test]
    fn set_hashsize_too_small_is_rejected_without_reconfiguring() {
        engine_command("set hashsize 16").unwrap();
        let before = engine_command("get hashsize").unwrap();

        assert_eq!(engine_command("set hashsize 2"), None);

        assert_eq!(engine_command("get hashsize").unwrap(), before);
    }

    #[test]
    fn is_legal_rejects_a_move_to_an_occupied_square() {
        let board = Board::new();
        let arr = board.to_cb_array();
        assert!(is_legal(&arr, Side::White, 0, 4).is_none());
    }

    #[test]
    fn is_legal_accepts_a_starting_move() {
        let board = Board::new();
        let arr = board.to_cb_array();
        assert!(is_legal(&arr, Side::White, 9, 13).is_some());
    }
}
