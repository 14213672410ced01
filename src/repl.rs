use std::path::PathBuf;

use rustyline::{
    error::ReadlineError, validate::MatchingBracketValidator, Completer, Editor, Helper,
    Highlighter, Hinter, Validator,
};

use zylisp::{disassemble, Environment, Error};

#[derive(Completer, Helper, Highlighter, Hinter, Validator)]
struct InputValidator {
    #[rustyline(Validator)]
    brackets: MatchingBracketValidator,
}

fn get_history_path() -> Option<PathBuf> {
    let home_env = std::env::var("HOME").ok()?;
    let path = format!("{home_env}/.zylisp.history");
    Some(PathBuf::from(path))
}

/// Reads, compiles and runs a single line, printing the bytecode first when `dump` is set.
fn eval_line(env: &mut Environment, line: &str, dump: bool) -> Result<Option<String>, Error> {
    let mut last = None;
    for expr in env.read(line, None)? {
        let proto = env.compile(&expr)?;
        if dump {
            print!("{}", disassemble(&proto));
        }
        last = Some(env.run(&proto)?.to_string());
    }
    Ok(last)
}

pub fn run(env: &mut Environment, dump: bool) -> rustyline::Result<()> {
    let mut rl = Editor::new()?;
    let path = get_history_path();
    let h = InputValidator {
        brackets: MatchingBracketValidator::new(),
    };

    rl.set_helper(Some(h));

    if let Some(path) = path.clone() {
        if rl.load_history(&path).is_err() {
            println!("No previous history.");
        }
    }

    loop {
        match rl.readline("zylisp> ") {
            Ok(line) => {
                rl.add_history_entry(line.as_str())?;

                match eval_line(env, &line, dump) {
                    Ok(Some(value)) => println!("{value}"),
                    Ok(None) => {}
                    Err(err) => println!("error: {err}"),
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("Bye bye...");
                break;
            }
            Err(ReadlineError::Eof) => {
                break;
            }
            Err(err) => {
                println!("Error: {err:?}");
                break;
            }
        }
    }

    if let Some(path) = path {
        let _ = rl.append_history(&path);
    }

    Ok(())
}
