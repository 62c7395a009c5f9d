//! Entry point for the draughts engine's console front-end. Control is
//! immediately passed to the REPL loop.

mod repl;

fn main() {
    println!("{}", draughts_engine::engine::engine_command("name").unwrap());
    let mut repl = repl::Repl::new();
    repl.main_loop();
}
