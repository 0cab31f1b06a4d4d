//! The interactive prompt and the line-by-line script runner.

use crate::{Session, SessionError};
use anyhow::{Context, Result};
use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};

const PROMPT: &str = "#>";

/// Reads lines from stdin until EOF, running each against one [`Session`].
pub fn start() -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut session = Session::new();

    loop {
        print!("{}", PROMPT);
        stdout.flush()?;

        let mut line = String::new();
        if stdin.read_line(&mut line)? == 0 {
            return Ok(()); // EOF
        }
        run_and_report(&mut session, &line);
    }
}

/// Runs a script file line by line with the same cross-line persistence as
/// the repl, printing each line's result.
pub fn run_file(path: &str) -> Result<()> {
    let file = File::open(path).with_context(|| format!("could not open {}", path))?;
    let mut session = Session::new();

    for line in BufReader::new(file).lines() {
        run_and_report(&mut session, &line?);
    }
    Ok(())
}

/// Errors are printed and the session continues at the next line.
fn run_and_report(session: &mut Session, line: &str) {
    match session.run_line(line) {
        Ok(Some(value)) => println!("{}", value),
        Ok(None) => {}
        Err(SessionError::Parse(errors)) => {
            println!("parser errors:");
            for error in errors {
                println!("\t{}", error);
            }
        }
        Err(SessionError::Compile(err)) => println!("Woops! Compilation failed: \n {}", err),
        Err(SessionError::Runtime(err)) => println!("Woops! Bytecode failed: \n {}", err),
    }
}
