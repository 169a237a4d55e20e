use std::path::PathBuf;

use rustyline::error::ReadlineError;
use rustyline::Editor;

use crate::interpreter::Interpreter;
use crate::parse::parse_program;

fn history_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".skink_history"))
}

/// Read, evaluate, print, repeat. Fatal errors print a diagnostic and
/// reset to the top of the loop without terminating the process.
pub fn repl(interp: &mut Interpreter) {
    let mut rl = Editor::<()>::new();
    let history = history_path();
    if let Some(path) = &history {
        let _ = rl.load_history(path);
    }
    loop {
        match rl.readline("> ") {
            Ok(line) => {
                if line.trim().is_empty() {
                    continue;
                }
                rl.add_history_entry(line.as_str());
                let exprs = match parse_program(&line, &mut interp.symbols) {
                    Ok(exprs) => exprs,
                    Err(error) => {
                        println!("{}", error);
                        continue;
                    }
                };
                for expr in exprs.iter() {
                    match interp.eval_global(expr) {
                        Ok(value) => println!("{}", value.render(&interp.symbols)),
                        Err(signal) => {
                            println!("error: {}", signal.into_error());
                            interp.recover();
                            break;
                        }
                    }
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(error) => {
                println!("error: {}", error);
                break;
            }
        }
    }
    if let Some(path) = &history {
        let _ = rl.save_history(path);
    }
}
