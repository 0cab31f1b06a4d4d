pub mod builtin_functions;
pub mod repl;

use rune_parser::parser::Parser;
use rune_source::Source;
use rune_value::{Value, ValueArray};
use rune_vm::codegen::{Codegen, CompileError};
use rune_vm::symbol::SymbolTable;
use rune_vm::vm::{RuntimeError, Vm, GLOBAL_SIZE};
use std::fmt;
use std::mem;

/// An error from one of the three pipeline phases. Parse errors carry the
/// whole accumulated diagnostic list; compile and runtime errors are
/// fail-fast.
#[derive(Debug)]
pub enum SessionError {
    Parse(Vec<String>),
    Compile(CompileError),
    Runtime(RuntimeError),
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::Parse(errors) => {
                writeln!(f, "parser errors:")?;
                for error in errors {
                    writeln!(f, "\t{}", error)?;
                }
                Ok(())
            }
            SessionError::Compile(err) => write!(f, "{}", err),
            SessionError::Runtime(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for SessionError {}

/// Everything that survives from one line to the next: the constant pool,
/// the global slots and the symbol table. Both the repl and the file runner
/// feed lines through one of these.
pub struct Session {
    constants: ValueArray,
    globals: Vec<Value>,
    symbol_table: SymbolTable,
}

impl Session {
    /// A fresh session with the built-in functions already installed in the
    /// first global slots.
    pub fn new() -> Self {
        let mut session = Self {
            constants: Vec::new(),
            globals: vec![Value::Null; GLOBAL_SIZE],
            symbol_table: SymbolTable::new(),
        };
        for (ident, value) in builtin_functions::default_builtin_vars().values {
            let symbol = session.symbol_table.define(&ident);
            session.globals[symbol.index as usize] = value;
        }
        session
    }

    /// Parses, compiles and runs a single line against the session state.
    /// Returns the value of the last expression statement, or `None` when the
    /// line holds no statements at all (blank or comment-only input).
    pub fn run_line(&mut self, line: &str) -> Result<Option<Value>, SessionError> {
        let source = Source::new(line);
        let mut parser = Parser::new(&source);
        let program = parser.parse_program();
        if source.has_errors() {
            return Err(SessionError::Parse(source.errors.to_vec()));
        }
        if program.is_empty() {
            return Ok(None);
        }

        let symbol_table = mem::take(&mut self.symbol_table);
        let constants = mem::take(&mut self.constants);
        let mut codegen = Codegen::with_state("<global>", symbol_table, constants);
        let compiled = codegen.codegen_program(&program);
        // reclaim the state even when compilation fails, so the session
        // carries on at the next line
        let (bytecode, symbol_table) = codegen.finish();
        self.symbol_table = symbol_table;
        self.constants = bytecode.constants.clone();
        compiled.map_err(SessionError::Compile)?;

        let mut vm = Vm::with_globals(bytecode, mem::take(&mut self.globals));
        let ran = vm.run();
        let result = vm.last_popped();
        self.globals = vm.into_globals();
        ran.map_err(SessionError::Runtime)?;
        Ok(Some(result))
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

/// Runs `source` in a fresh [`Session`]. For testing purposes only.
pub fn interpret(source: &str) -> Result<Value, SessionError> {
    Ok(Session::new().run_line(source)?.unwrap_or(Value::Null))
}
