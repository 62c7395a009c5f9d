//! Legality scenarios carried over from the original engine's
//! `unit_test.c` sample positions, with every `WHITE`/`BLACK` token
//! swapped to match this port's color convention (the original's
//! BLACK starts on squares 0..11 and is this engine's White; the
//! original's WHITE starts on squares 20..31 and is this engine's
//! Black). Square numbers are unchanged, just shifted to 0-based.

use draughts_engine::board::{Board, Move};
use draughts_engine::movegen::{self, find_move, parse_square_sequence};
use draughts_engine::pieces::{self, Color};
use draughts_engine::zobrist;

fn has_move(board: &Board, from: u8, to: u8) -> bool {
    movegen::generate_all_moves(board)
        .iter()
        .any(|m| m.from_square() == from && m.to_square() == to)
}

#[test]
fn starting_position_quiet_move_legality() {
    zobrist::init();
    let board = Board::new();

    assert!(has_move(&board, 10, 14), "White 11-15 should be legal");
    assert!(!has_move(&board, 23, 24), "Black 24-25 should not be legal");
    assert!(!has_move(&board, 26, 30), "Black 27-31 should not be legal");
}

/// The original's `game1` sample position, translated to this port's
/// colors: a White man at square 14 (1-based 15) has a mandatory
/// four-jump capture chain ending in promotion on square 28.
fn game1() -> Board {
    let mut board = Board::new();
    for sq in board.squares.iter_mut() {
        *sq = pieces::FREE;
    }
    let w = pieces::WHITE_MAN;
    let b = pieces::BLACK_MAN;
    let layout: [u8; 32] = [
        w, pieces::FREE, w, w, // 0-3
        w, w, w, w, // 4-7
        w, w, pieces::FREE, pieces::FREE, // 8-11
        pieces::FREE, pieces::FREE, w, w, // 12-15
        pieces::FREE, pieces::FREE, b, b, // 16-19
        b, pieces::FREE, b, pieces::FREE, // 20-23
        b, b, b, b, // 24-27
        pieces::FREE, b, pieces::FREE, b, // 28-31
    ];
    board.squares = layout;
    board.turn = Color::White;
    board.zobrist_key = zobrist::full_hash(&board);
    board
}

#[test]
fn multi_jump_capture_chain_promotes_mid_board() {
    zobrist::init();
    let mut board = game1();

    let squares = parse_square_sequence("15x24x31x22x29").unwrap();
    let mv = find_move(&board, &squares).expect("the four-jump chain should be found");
    assert!(matches!(mv, Move::Capture { len: 4, .. }));

    board.do_move(&mv);
    assert_eq!(board.piece_on(28), pieces::WHITE_KING);
}

#[test]
fn single_jump_captures_are_also_found() {
    zobrist::init();
    let mut board = game1();
    board.turn = Color::Black;

    let squares = parse_square_sequence("20x11x18").unwrap();
    assert!(find_move(&board, &squares).is_some());
}

#[test]
fn a_too_short_capture_sequence_is_not_a_legal_move() {
    zobrist::init();
    let board = game1();

    // The full chain from square 15 must continue through all four
    // jumps; stopping early at square 31 isn't an available move.
    let squares = parse_square_sequence("15x31").unwrap();
    assert!(find_move(&board, &squares).is_none());
}
