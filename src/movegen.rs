//! This module contains the move generator: legal non-capturing moves,
//! legal capture chains under the mandatory-maximal-capture rule, and
//! the combined "captures if any exist, else quiet moves" entry point
//! a draughts position actually calls for.
//!
//! Grounded in the original engine's `generate_moves`/`generate_captures`/
//! `get_capture`/`can_capture`, restructured around the geometric ray
//! tables in `board.rs` instead of the original's literal per-square
//! arrays. The subtle king-capture look-ahead rule is preserved: a
//! landing square is only offered if *no* landing square on that ray
//! for that captured piece permits a further capture, or, when at
//! least one ray-landing does, only the continuation-yielding landings
//! are offered.

use crate::board::{color_index, Board, Jump, Move, KING_RAYS, MAN_CAPTURES, MAN_MOVES, MAX_JUMPS};
use crate::pieces::{self, Color, FREE};

/// Mandatory-capture rule: if any capture exists for the side to move,
/// only captures are legal; otherwise all quiet moves are legal.
pub fn generate_all_moves(board: &Board) -> Vec<Move> {
    let captures = generate_captures(board);
    if !captures.is_empty() {
        captures
    } else {
        generate_moves(board)
    }
}

pub fn generate_moves(board: &Board) -> Vec<Move> {
    let mut moves = Vec::new();
    let color = board.turn;
    let ci = color_index(color);
    for s in 0u8..32 {
        let piece = board.piece_on(s);
        if piece == FREE || pieces::color_of(piece) != Some(color) {
            continue;
        }
        if pieces::is_man(piece) {
            for target in MAN_MOVES[s as usize][ci].iter().flatten() {
                if board.piece_on(*target) == FREE {
                    moves.push(Move::Quiet { from: s, to: *target });
                }
            }
        } else {
            for ray in KING_RAYS[s as usize].iter() {
                for slot in ray.iter() {
                    match slot {
                        Some(sq) => {
                            if board.piece_on(*sq) == FREE {
                                moves.push(Move::Quiet { from: s, to: *sq });
                            } else {
                                break;
                            }
                        }
                        None => break,
                    }
                }
            }
        }
    }
    moves
}

fn can_man_capture(board: &Board, color: Color, over: u8, to: u8) -> bool {
    pieces::color_of(board.piece_on(over)) == Some(color.opposite()) && board.piece_on(to) == FREE
}

fn empty_jumps() -> [Jump; MAX_JUMPS] {
    [Jump { from: 0, captured_square: 0, to: 0 }; MAX_JUMPS]
}

pub fn generate_captures(board: &Board) -> Vec<Move> {
    let mut out = Vec::new();
    let color = board.turn;
    let mut work = board.clone();
    for s in 0u8..32 {
        let piece = board.piece_on(s);
        if piece == FREE || pieces::color_of(piece) != Some(color) {
            continue;
        }
        if pieces::is_man(piece) {
            for d in 0..4 {
                if let Some((over, to)) = MAN_CAPTURES[s as usize][d] {
                    if can_man_capture(&work, color, over, to) {
                        let mut jumps = empty_jumps();
                        jumps[0] = Jump { from: s, captured_square: over, to };
                        extend_man_capture(&mut work, color, jumps, 1, &mut out);
                    }
                }
            }
        } else {
            generate_king_captures_from(&mut work, color, s, None, &mut out);
        }
    }
    out
}

/// Build the squares visible along one king ray from the square the
/// ray originates at, applying the original engine's truncation rules:
/// stop (discarding the whole ray) on reaching `excluded` — the square
/// the king just vacated earlier in the current capture chain, which
/// would otherwise look like a free landing to walk back through; stop
/// if the very first square is occupied by an own piece (no capture
/// possible in this direction at all); and stop (dropping the last two
/// entries) once two consecutive squares are both occupied (no landing
/// square can exist past a two-piece wall).
fn visible_diagonal(board: &Board, ray: &[Option<u8>; 7], color: Color, excluded: Option<u8>) -> Vec<u8> {
    let mut diag = Vec::with_capacity(7);
    for (j, slot) in ray.iter().enumerate() {
        let sq = match slot {
            Some(s) => *s,
            None => break,
        };
        diag.push(sq);
        if Some(sq) == excluded {
            diag.clear();
            break;
        }
        if j == 0 {
            if pieces::color_of(board.piece_on(sq)) == Some(color) {
                diag.clear();
                break;
            }
        } else {
            let a = diag[diag.len() - 2];
            let b = diag[diag.len() - 1];
            if board.piece_on(a) != FREE && board.piece_on(b) != FREE {
                diag.truncate(diag.len() - 2);
                break;
            }
        }
    }
    diag
}

/// Would landing a capturing king on `landing` (having just captured
/// `excluded_piece`) allow it to capture again from there?
fn has_capture_along_any_ray(board: &Board, landing: u8, color: Color, excluded_piece: u8) -> bool {
    for ray in KING_RAYS[landing as usize].iter() {
        let diag = visible_diagonal(board, ray, color, None);
        let mut j = 0;
        while j < diag.len() {
            let sq = diag[j];
            match pieces::color_of(board.piece_on(sq)) {
                Some(c) if c == color.opposite() => {
                    if sq == excluded_piece {
                        break;
                    }
                    if j + 1 < diag.len() && board.piece_on(diag[j + 1]) == FREE {
                        return true;
                    }
                    break;
                }
                Some(_) => break,
                None => {}
            }
            j += 1;
        }
    }
    false
}

/// Generate captures for a king sitting on `from`. `excluded`, when
/// set, is a square earlier in the current chain that the king has
/// already vacated — rays must not walk back onto it, matching the
/// original's `diagonal[c-1] == from` re-capture guard.
fn generate_king_captures_from(board: &mut Board, color: Color, from: u8, excluded: Option<u8>, out: &mut Vec<Move>) {
    for ray in KING_RAYS[from as usize].iter() {
        let diag = visible_diagonal(board, ray, color, excluded);
        let mut j = 0;
        while j < diag.len() {
            let sq = diag[j];
            match pieces::color_of(board.piece_on(sq)) {
                Some(c) if c == color.opposite() => {
                    offer_king_capture_landings(board, color, from, sq, &diag, j + 1, out);
                    break;
                }
                Some(_) => break,
                None => {}
            }
            j += 1;
        }
    }
}

/// Shared by the first capture of a chain and every continuation:
/// given a capturable piece at `piece_sq` and the free squares beyond
/// it along the ray (`diag[from_idx..]`), emit a capture for each
/// landing that permits a further capture, or — if none do — for
/// every landing.
fn offer_king_capture_landings(
    board: &mut Board,
    color: Color,
    from: u8,
    piece_sq: u8,
    diag: &[u8],
    from_idx: usize,
    out: &mut Vec<Move>,
) {
    let mut non_capturable = Vec::new();
    let mut capturables = 0u32;
    let mut k = from_idx;
    while k < diag.len() {
        let landing = diag[k];
        if board.piece_on(landing) != FREE {
            break;
        }
        non_capturable.push(landing);
        if has_capture_along_any_ray(board, landing, color, piece_sq) {
            capturables += 1;
            let mut jumps = empty_jumps();
            jumps[0] = Jump { from, captured_square: piece_sq, to: landing };
            extend_king_capture(board, color, jumps, 1, out);
        }
        k += 1;
    }
    if capturables == 0 {
        for landing in non_capturable {
            let mut jumps = empty_jumps();
            jumps[0] = Jump { from, captured_square: piece_sq, to: landing };
            extend_king_capture(board, color, jumps, 1, out);
        }
    }
}

fn extend_man_capture(
    board: &mut Board,
    color: Color,
    jumps: [Jump; MAX_JUMPS],
    len: u8,
    out: &mut Vec<Move>,
) {
    let jump = jumps[(len - 1) as usize];
    let moving_piece = board.piece_on(jump.from);
    let captured_piece = board.piece_on(jump.captured_square);
    board.squares[jump.to as usize] = moving_piece;
    board.squares[jump.captured_square as usize] = FREE;
    board.squares[jump.from as usize] = FREE;

    let mut effective_piece = moving_piece;
    if pieces::promotes_on(color, jump.to) {
        effective_piece = pieces::king_of(color);
        board.squares[jump.to as usize] = effective_piece;
    }

    let mut available = 0u32;
    if pieces::is_man(effective_piece) {
        for d in 0..4 {
            if let Some((over, to)) = MAN_CAPTURES[jump.to as usize][d] {
                if to != jump.from && can_man_capture(board, color, over, to) {
                    available += 1;
                    let mut next = jumps;
                    next[len as usize] = Jump { from: jump.to, captured_square: over, to };
                    extend_man_capture(board, color, next, len + 1, out);
                }
            }
        }
    } else {
        let before = out.len();
        generate_king_captures_from(board, color, jump.to, Some(jump.from), out);
        available = (out.len() - before) as u32;
        if available > 0 {
            // generate_king_captures_from pushed complete chains whose
            // first jump starts at jump.to; splice our prefix in front
            // of each so the whole chain is returned as one move.
            for mv in out[before..].iter_mut() {
                if let Move::Capture { jumps: tail, len: tail_len } = mv {
                    let mut combined = jumps;
                    for i in 0..*tail_len {
                        combined[(len + i) as usize] = tail[i as usize];
                    }
                    *tail = combined;
                    *tail_len += len;
                }
            }
        }
    }

    if available == 0 {
        out.push(Move::Capture { jumps, len });
    }

    board.squares[jump.from as usize] = moving_piece;
    board.squares[jump.captured_square as usize] = captured_piece;
    board.squares[jump.to as usize] = FREE;
}

fn extend_king_capture(
    board: &mut Board,
    color: Color,
    jumps: [Jump; MAX_JUMPS],
    len: u8,
    out: &mut Vec<Move>,
) {
    let jump = jumps[(len - 1) as usize];
    let moving_piece = board.piece_on(jump.from);
    let captured_piece = board.piece_on(jump.captured_square);
    board.squares[jump.to as usize] = moving_piece;
    board.squares[jump.captured_square as usize] = FREE;
    board.squares[jump.from as usize] = FREE;

    let before = out.len();
    generate_king_captures_from(board, color, jump.to, Some(jump.from), out);
    let available = out.len() - before;
    if available > 0 {
        for mv in out[before..].iter_mut() {
            if let Move::Capture { jumps: tail, len: tail_len } = mv {
                let mut combined = jumps;
                for i in 0..*tail_len {
                    combined[(len + i) as usize] = tail[i as usize];
                }
                *tail = combined;
                *tail_len += len;
            }
        }
    } else {
        out.push(Move::Capture { jumps, len });
    }

    board.squares[jump.from as usize] = moving_piece;
    board.squares[jump.captured_square as usize] = captured_piece;
    board.squares[jump.to as usize] = FREE;
}

/// Count leaf positions reached after `depth` plies, the standard
/// move-generator correctness check.
pub fn perft(board: &Board, depth: u32) -> u64 {
    if depth == 0 {
        return 1;
    }
    let moves = generate_all_moves(board);
    if depth == 1 {
        return moves.len() as u64;
    }
    let mut nodes = 0;
    let mut board = board.clone();
    for mv in &moves {
        let record = board.do_move(mv);
        nodes += perft(&board, depth - 1);
        board.undo_move(mv, &record);
    }
    nodes
}

/// Parse a sequence of 1-based squares out of notation like
/// `"12 - 16"` or `"12x19x28"`, returning 0-based squares. Mirrors
/// `parse_movenotation`; returns `None` on malformed input rather than
/// panicking, since this parses untrusted caller input.
pub fn parse_square_sequence(notation: &str) -> Option<Vec<u8>> {
    let mut squares = Vec::new();
    let mut current = String::new();
    for ch in notation.chars() {
        if ch.is_ascii_digit() {
            current.push(ch);
        } else if ch == '-' || ch == 'x' || ch.is_whitespace() {
            if !current.is_empty() {
                let v: u32 = current.parse().ok()?;
                if v == 0 || v > 32 {
                    return None;
                }
                squares.push((v - 1) as u8);
                current.clear();
            }
        } else {
            return None;
        }
    }
    if !current.is_empty() {
        let v: u32 = current.parse().ok()?;
        if v == 0 || v > 32 {
            return None;
        }
        squares.push((v - 1) as u8);
    }
    if squares.len() < 2 {
        return None;
    }
    Some(squares)
}

/// Match a parsed square sequence against the legal moves available on
/// `board`, returning the one it identifies (if any).
pub fn find_move(board: &Board, squares: &[u8]) -> Option<Move> {
    generate_all_moves(board).into_iter().find(|mv| match mv {
        Move::Quiet { from, to } => squares == [*from, *to],
        Move::Capture { jumps, len } => {
            if squares.len() != *len as usize + 1 {
                return false;
            }
            squares[0] == jumps[0].from
                && squares[1..].iter().enumerate().all(|(i, &sq)| sq == jumps[i].to)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::zobrist;

    #[test]
    fn starting_position_has_seven_quiet_moves() {
        zobrist::init();
        let board = Board::new();
        let moves = generate_all_moves(&board);
        assert_eq!(moves.len(), 7);
        assert!(moves.iter().all(|m| !m.is_capture()));
    }

    #[test]
    fn mandatory_capture_excludes_quiet_moves() {
        zobrist::init();
        let mut board = Board::new();
        for s in 0..32u8 {
            board.squares[s as usize] = FREE;
        }
        board.squares[9] = pieces::WHITE_MAN;
        board.squares[13] = pieces::BLACK_MAN;
        board.turn = Color::White;
        let moves = generate_all_moves(&board);
        assert_eq!(moves.len(), 1);
        assert!(moves[0].is_capture());
    }

    #[test]
    fn multi_jump_chain_is_generated_as_one_move() {
        zobrist::init();
        let mut board = Board::new();
        for s in 0..32u8 {
            board.squares[s as usize] = FREE;
        }
        board.squares[9] = pieces::WHITE_MAN;
        board.squares[13] = pieces::BLACK_MAN;
        board.squares[22] = pieces::BLACK_MAN;
        board.turn = Color::White;
        let moves = generate_all_moves(&board);
        assert_eq!(moves.len(), 1);
        match &moves[0] {
            Move::Capture { len, .. } => assert_eq!(*len, 2),
            _ => panic!("expected a capture"),
        }
    }

    #[test]
    fn perft_depth_one_matches_move_count() {
        zobrist::init();
        let board = Board::new();
        assert_eq!(perft(&board, 1), generate_all_moves(&board).len() as u64);
    }

    #[test]
    fn notation_round_trips_for_a_quiet_move() {
        let squares = parse_square_sequence("10 - 15").unwrap();
        assert_eq!(squares, vec![9, 14]);
    }
}
