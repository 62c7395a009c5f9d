//! Negamax search driver with a transposition table, iterative
//! deepening, and PVS/LMR/IID/aspiration-window move ordering.
//!
//! Grounded directly in the original engine's `getbestmove`/`negamax`
//! pair; the constants below (priority bonuses, history decay,
//! aspiration phases) are carried over verbatim rather than re-tuned,
//! since they are exactly the kind of hand-tuned knowledge this
//! exercise is meant to preserve rather than second-guess.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crate::board::{Board, Move};
use crate::evaluate::{self, MATE};
use crate::movegen;
use crate::pieces::{self, Color};
use crate::tt::{self, TTFlag, TranspositionTable, MAXDEPTH};

// Move-ordering bonuses, highest priority first.
const TT_MOVE_BONUS: i64 = 888_888;
const PROMOTION_BONUS: i64 = 888_880;
const COUNTER_MOVE_BONUS: i64 = 777_777;
const KILLER1_BONUS: i64 = 77_777;
const KILLER2_BONUS: i64 = 66_666;

// History table decay, applied once a (from, to) pair's score exceeds
// this threshold, to keep the table from overflowing across a long
// game.
const HISTORY_LIMIT: i64 = 86_475;
const HISTORY_DECAY: f64 = 16.4;

/// Per-search move-ordering state: history heuristic, killer moves,
/// and counter moves. Reset at the start of every `find_best_move`
/// call, mirroring the original's `_info` being rebuilt per `getmove`.
struct SearchInfo {
    history: Vec<Vec<i64>>,
    killer1: Vec<Option<(u8, u8)>>,
    killer2: Vec<Option<(u8, u8)>>,
    counter_moves: [[[Option<(u8, u8)>; 32]; 32]; 2],
}

impl SearchInfo {
    fn new() -> SearchInfo {
        SearchInfo {
            history: vec![vec![0i64; 32]; 32],
            killer1: vec![None; MAXDEPTH as usize + 1],
            killer2: vec![None; MAXDEPTH as usize + 1],
            counter_moves: [[[None; 32]; 32]; 2],
        }
    }

    fn add_killer(&mut self, depth: u8, from: u8, to: u8) {
        if self.killer1[depth as usize] != Some((from, to)) {
            self.killer2[depth as usize] = self.killer1[depth as usize];
            self.killer1[depth as usize] = Some((from, to));
        }
    }

    fn add_history(&mut self, depth: u8, from: u8, to: u8, limit: bool) {
        let mut v = self.history[from as usize][to as usize] + (depth as i64) * (depth as i64);
        if limit && v > HISTORY_LIMIT {
            for row in self.history.iter_mut() {
                for cell in row.iter_mut() {
                    *cell = (*cell as f64 / HISTORY_DECAY) as i64;
                }
            }
            v = (v as f64 / HISTORY_DECAY) as i64;
        }
        self.history[from as usize][to as usize] = v;
    }

    fn add_counter(&mut self, color: Color, prev_from: Option<u8>, prev_to: Option<u8>, from: u8, to: u8) {
        if let (Some(pf), Some(pt)) = (prev_from, prev_to) {
            self.counter_moves[color_slot(color)][pf as usize][pt as usize] = Some((from, to));
        }
    }

    fn counter_move(&self, color: Color, prev_from: Option<u8>, prev_to: Option<u8>) -> Option<(u8, u8)> {
        let (pf, pt) = (prev_from?, prev_to?);
        self.counter_moves[color_slot(color)][pf as usize][pt as usize]
    }
}

fn color_slot(color: Color) -> usize {
    match color {
        Color::White => 0,
        Color::Black => 1,
    }
}

/// Whichever side a `+1`/`-1` negamax sign currently represents. `+1`
/// always means "White to move" here, matching `static_evaluation`'s
/// White-relative score: at a leaf, `sign * static_evaluation(..)`
/// reorients the White-relative score into the current mover's
/// perspective, which is what negamax expects to receive back.
fn side_for_sign(sign: i32) -> Color {
    if sign == 1 { Color::White } else { Color::Black }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameResult {
    Win,
    Loss,
    Unknown,
}

/// Information about the best move found, returned once per iterative
/// deepening depth (the caller decides whether to keep searching).
#[derive(Debug)]
pub struct BestMoveInfo {
    pub best_move: Option<Move>,
    pub eval: i32,
    pub depth_searched: u8,
    pub nodes: u64,
    pub duration: Duration,
    pub result: GameResult,
    pub progress: String,
}

pub struct SearchEngine {
    tt: TranspositionTable,
    info: SearchInfo,
    nodes: u64,
}

impl SearchEngine {
    pub fn new() -> SearchEngine {
        SearchEngine {
            tt: TranspositionTable::new(tt::DEFAULT_DEEP_CAPACITY, tt::DEFAULT_BIG_CAPACITY),
            info: SearchInfo::new(),
            nodes: 0,
        }
    }

    pub fn with_hash_capacities(deep_capacity: u64, big_capacity: u64) -> SearchEngine {
        SearchEngine {
            tt: TranspositionTable::new(deep_capacity, big_capacity),
            info: SearchInfo::new(),
            nodes: 0,
        }
    }

    pub fn resize_tt(&mut self, deep_capacity: u64, big_capacity: u64) {
        self.tt = TranspositionTable::new(deep_capacity, big_capacity);
    }

    pub fn tt_capacities(&self) -> (u64, u64) {
        (self.tt.deep_capacity(), self.tt.big_capacity())
    }

    /// Negamax search with a transposition table, PVS, LMR, and IID.
    /// `d` is the root search depth (used to tell whether this frame
    /// is the root, to record the best move found there); `depth` is
    /// the depth remaining. `sign` is `+1` when White is to move at
    /// this node and `-1` when Black is, flipping on every ply. `iid`
    /// is false only for the IID pre-search's own recursive call, so
    /// that shallow pre-search can't trigger a further nested IID dive.
    #[allow(clippy::too_many_arguments)]
    fn negamax(
        &mut self,
        board: &mut Board,
        d: u8,
        depth: u8,
        sign: i32,
        alpha: i32,
        beta: i32,
        cancel: &AtomicBool,
        root_best: &mut Option<Move>,
        iid: bool,
    ) -> i32 {
        self.nodes += 1;

        let side_to_move = side_for_sign(sign);
        let mut moves = movegen::generate_all_moves(board);
        let mut depth = depth;

        if cancel.load(Ordering::Acquire) || moves.is_empty() || depth == 0 {
            if moves.is_empty() {
                return -MATE + depth as i32;
            }
            if depth == 0 && moves[0].is_capture() {
                depth = 1;
            } else {
                return sign * evaluate::static_evaluation(board, depth as i32);
            }
        }

        let key = board.zobrist_key;
        let mut alpha = alpha;
        let mut beta = beta;
        let mut best_from = 0u8;
        let mut best_to = 0u8;

        if depth > 1 {
            let outcome = self.tt.probe(key, alpha, beta, depth, side_to_move);
            if let Some(v) = outcome.value {
                return v;
            }
            alpha = outcome.alpha;
            beta = outcome.beta;
            if let Some((f, t)) = outcome.hint_move {
                best_from = f;
                best_to = t;
            }
        }

        // IID: if no hash move is known and there's more than one
        // candidate, do a shallow search first to seed move ordering.
        if iid && best_from == 0 && best_to == 0 && moves.len() > 1 && depth > 3 {
            self.negamax(board, d, depth - 3, sign, alpha, beta, cancel, root_best, false);
            let outcome = self.tt.probe(key, i32::MIN, i32::MAX, MAXDEPTH + 1, side_to_move);
            if let Some((f, t)) = outcome.hint_move {
                best_from = f;
                best_to = t;
            }
        }

        if moves.len() > 1 && depth > 1 {
            let counter = self.info.counter_move(side_to_move, board.prev_from, board.prev_to);
            let mut scored: Vec<(i64, Move)> = moves
                .into_iter()
                .map(|m| {
                    let from = m.from_square();
                    let to = m.to_square();
                    let mut score = 0i64;

                    if from == best_from && to == best_to {
                        score += TT_MOVE_BONUS;
                    }
                    if !m.is_capture() && pieces::is_man(board.squares[from as usize]) && pieces::promotes_on(side_to_move, to) {
                        score += PROMOTION_BONUS;
                    }
                    if Some((from, to)) == counter {
                        score += COUNTER_MOVE_BONUS;
                    }
                    if self.info.killer1[depth as usize] == Some((from, to)) {
                        score += KILLER1_BONUS;
                    }
                    if self.info.killer2[depth as usize] == Some((from, to)) {
                        score += KILLER2_BONUS;
                    }
                    score += self.info.history[from as usize][to as usize];
                    (score, m)
                })
                .collect();
            scored.sort_unstable_by(|a, b| b.0.cmp(&a.0));
            moves = scored.into_iter().map(|(_, m)| m).collect();
        }

        let mut max = i32::MIN;
        let mut a = alpha;
        let b = beta;
        let mut best_idx = 0usize;

        for (i, m) in moves.iter().enumerate() {
            let from = m.from_square();
            let to = m.to_square();

            let record = board.do_move(m);

            let score = if i == 0 {
                -self.negamax(board, d, depth - 1, -sign, -beta, -a, cancel, root_best, true)
            } else {
                let mut x = if i > 1 && depth > 3 && beta - alpha <= 1 {
                    -self.negamax(board, d, depth - 2, -sign, -a - 1, -a, cancel, root_best, true)
                } else {
                    alpha + 1
                };
                if x > alpha {
                    x = -self.negamax(board, d, depth - 1, -sign, -a - 1, -a, cancel, root_best, true);
                    if a < x && x < b {
                        x = -self.negamax(board, d, depth - 1, -sign, -beta, -a, cancel, root_best, true);
                    }
                }
                x
            };

            board.undo_move(m, &record);

            if score > max {
                max = score;
                best_idx = i;
            }

            if max >= b {
                best_idx = i;
                self.info.add_killer(depth, from, to);
                break;
            }
            if max > a {
                a = max;
                best_idx = i;
                self.info.add_killer(depth, from, to);
                self.info.add_history(depth, from, to, false);
            }
        }

        let best_move = moves[best_idx].clone();
        let from = best_move.from_square();
        let to = best_move.to_square();

        self.info.add_history(depth, from, to, true);
        self.info.add_counter(side_to_move, board.prev_from, board.prev_to, from, to);

        let flag = if max <= alpha {
            TTFlag::UpperBound
        } else if max >= beta {
            TTFlag::LowerBound
        } else {
            TTFlag::Exact
        };
        self.tt.store(key, depth, flag, max, side_to_move, (from, to));

        if d == depth {
            *root_best = Some(best_move);
        }

        max
    }

    /// Iterative deepening search up to `MAXDEPTH` or until
    /// `time_budget` elapses or `cancel` is set. Mirrors `getbestmove`.
    pub fn find_best_move(&mut self, board: &Board, time_budget: Duration, cancel: &AtomicBool) -> BestMoveInfo {
        self.info = SearchInfo::new();
        self.nodes = 0;

        let start = Instant::now();
        let sign = if board.turn == Color::White { 1 } else { -1 };

        let root_moves = movegen::generate_all_moves(board);

        let saved_alpha = -MATE * 10;
        let saved_beta = MATE * 10;
        let mut alpha = saved_alpha;
        let mut beta = saved_beta;

        let mut best: Option<Move> = None;
        let mut prev_best: Option<Move>;
        let mut eval = 0;
        let mut depth: u8 = 1;

        while depth < MAXDEPTH && start.elapsed() < time_budget {
            prev_best = best.clone();

            let mut phase = 0;
            let mut search_board = board.clone();
            loop {
                eval = self.negamax(&mut search_board, depth, depth, sign, alpha, beta, cancel, &mut best, true);

                if eval <= alpha || eval >= beta {
                    phase += 1;
                    match phase {
                        1 => {
                            alpha = -2100;
                            beta = 2100;
                        }
                        _ => {
                            alpha = saved_alpha;
                            beta = saved_beta;
                        }
                    }
                    continue;
                }
                break;
            }
            alpha = eval - 100;
            beta = eval + 100;

            let near_mate = eval.abs() >= MATE - MAXDEPTH as i32
                && ((sign == 1 && eval > 4000) || (sign == -1 && eval < -4000));
            if (near_mate || cancel.load(Ordering::Acquire)) && depth > 1 {
                best = prev_best;
            }

            let stop = cancel.load(Ordering::Acquire)
                || eval.abs() >= MATE - MAXDEPTH as i32
                || root_moves.len() == 1
                || start.elapsed() >= time_budget;
            if stop {
                break;
            }
            depth += 1;
        }

        // `sign == 1` means White was to move at the root: a large
        // positive eval is good for White, a large negative one means
        // White is losing.
        let result = if eval > 4000 {
            if sign == 1 { GameResult::Win } else { GameResult::Loss }
        } else if eval < -4000 {
            if sign == 1 { GameResult::Loss } else { GameResult::Win }
        } else {
            GameResult::Unknown
        };

        self.tt.clear();

        let progress = format!(
            "[{}] [depth {}] [eval {}] [{:.2}s] [{} nodes]",
            best.as_ref().map(|m| m.to_notation()).unwrap_or_default(),
            depth,
            eval,
            start.elapsed().as_secs_f64(),
            self.nodes
        );

        BestMoveInfo {
            best_move: best,
            eval,
            depth_searched: depth,
            nodes: self.nodes,
            duration: start.elapsed(),
            result,
            progress,
        }
    }
}

impl Default for SearchEngine {
    fn default() -> Self {
        SearchEngine::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicBool;

    #[test]
    fn finds_a_legal_move_from_the_starting_position() {
        crate::zobrist::init();
        let board = Board::new();
        let mut engine = SearchEngine::new();
        let cancel = AtomicBool::new(false);
        let info = engine.find_best_move(&board, Duration::from_millis(200), &cancel);
        assert!(info.best_move.is_some());
    }

    #[test]
    fn cancelling_immediately_still_returns_a_move() {
        crate::zobrist::init();
        let board = Board::new();
        let mut engine = SearchEngine::new();
        let cancel = AtomicBool::new(true);
        let info = engine.find_best_move(&board, Duration::from_millis(200), &cancel);
        assert!(info.best_move.is_some());
    }
}
