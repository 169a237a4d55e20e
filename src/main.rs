mod error;
mod expr;
mod symbol;
mod parse;
#[macro_use]
mod interpreter;
mod builtins;
mod repl;

use std::env;
use std::process;

use interpreter::Interpreter;
use repl::repl;

fn main() {
    let mut interp = Interpreter::init();
    if let Some(path) = env::args().nth(1) {
        if let Err(error) = interp.exec_file(&path) {
            eprintln!("error: {}", error);
            process::exit(1);
        }
    } else {
        repl(&mut interp);
    }
}
