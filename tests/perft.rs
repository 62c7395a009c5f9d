//! Move-generator correctness check against known node counts for the
//! starting position, carried over from the original engine's
//! `perft_test.c`. Depths beyond 6 take long enough that they aren't
//! worth paying for on every test run, so this table stops there.

use draughts_engine::board::Board;
use draughts_engine::movegen::perft;
use draughts_engine::zobrist;

#[test]
fn perft_matches_known_node_counts_from_the_starting_position() {
    zobrist::init();
    let board = Board::new();

    let expected = [1, 7, 49, 302, 1469, 7482, 37986];
    for (depth, &want) in expected.iter().enumerate() {
        assert_eq!(perft(&board, depth as u32), want, "perft({}) mismatch", depth);
    }
}
