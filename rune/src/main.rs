use anyhow::Result;
use std::env;
use std::process;

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();
    match args.as_slice() {
        [_] => {
            println!("This is the Rune programming language!");
            println!("Feel free to type in commands");
            rune::repl::start()
        }
        [_, path] => rune::repl::run_file(path),
        _ => {
            eprintln!("usage: rune [script]");
            process::exit(64);
        }
    }
}
