//! A minimal console front-end for the engine, mirroring the original
//! engine's `getmove`/`islegal`/`enginecommand` trio and the teacher's
//! stdin-token-dispatch loop shape (see the former `uci.rs`). This is
//! not a protocol implementation — the engine has no UCI-equivalent
//! wire format of its own — just a thin REPL for driving a game from
//! the console.

use std::io::{self, Write};
use std::sync::atomic::AtomicBool;
use std::time::Duration;

use draughts_engine::board::Board;
use draughts_engine::engine::{self, Side};
use draughts_engine::movegen;
use draughts_engine::zobrist;

pub struct Repl {
    board: Board,
    side: Side,
}

impl Repl {
    pub fn new() -> Repl {
        Repl { board: Board::new(), side: Side::White }
    }

    pub fn main_loop(&mut self) {
        zobrist::init();
        loop {
            print!("> ");
            io::stdout().flush().ok();

            let mut line = String::new();
            if io::stdin().read_line(&mut line).unwrap_or(0) == 0 {
                break;
            }
            let tokens: Vec<&str> = line.split_whitespace().collect();
            if tokens.is_empty() {
                continue;
            }

            match tokens[0] {
                "quit" | "exit" => break,
                "newgame" => self.newgame_command(),
                "print" => println!("{}", self.board),
                "go" => self.go_command(),
                "move" => self.move_command(&tokens),
                "command" => self.command_command(&line),
                _ => println!("unknown command"),
            }
        }
    }

    fn newgame_command(&mut self) {
        self.board = Board::new();
        self.side = Side::White;
    }

    fn go_command(&mut self) {
        let arr = self.board.to_cb_array();
        let cancel = AtomicBool::new(false);
        let (mv, result, progress) =
            engine::get_move(&arr, self.side, Duration::from_secs(2), &cancel);
        println!("{}", progress);
        match mv {
            Some(record) => {
                self.apply_move(record.from, record.to);
                println!("played {}", record.notation);
            }
            None => println!("no legal move ({:?})", result),
        }
    }

    fn move_command(&mut self, tokens: &[&str]) {
        if tokens.len() != 3 {
            println!("usage: move <from> <to>");
            return;
        }
        let (Ok(from), Ok(to)) = (tokens[1].parse::<u8>(), tokens[2].parse::<u8>()) else {
            println!("bad square");
            return;
        };
        if from == 0 || to == 0 {
            println!("squares are 1-based");
            return;
        }
        if !self.apply_move(from - 1, to - 1) {
            println!("illegal move");
        }
    }

    /// Look up the actual generated `Move` from `from` to `to` (which
    /// may be a capture chain, not just a single step) and apply it.
    /// Returns `false` if no such legal move exists.
    fn apply_move(&mut self, from: u8, to: u8) -> bool {
        self.board.turn = self.side;
        let moves = movegen::generate_all_moves(&self.board);
        let Some(mv) = moves.into_iter().find(|m| m.from_square() == from && m.to_square() == to)
        else {
            return false;
        };
        self.board.do_move(&mv);
        self.side = self.side.opposite();
        true
    }

    fn command_command(&self, line: &str) {
        let rest = line.trim_start_matches("command").trim();
        match engine::engine_command(rest) {
            Some(reply) => println!("{}", reply),
            None => println!("unrecognized command"),
        }
    }
}

impl Default for Repl {
    fn default() -> Self {
        Repl::new()
    }
}
