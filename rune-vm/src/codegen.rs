//! Lowers AST into a `Chunk` (bytecode).

use rune_parser::ast::{Expr, Stmt};
use rune_parser::lexer::Token;
use rune_value::chunk::{Chunk, OpCode};
use rune_value::object::{Function, Obj, ObjKind};
use rune_value::{Value, ValueArray};
use std::fmt;
use std::mem;
use std::rc::Rc;

use crate::symbol::{Symbol, SymbolScope, SymbolTable};

/// Dump the top-level chunk to stderr after every compilation.
const DUMP_CHUNK: bool = false;

/// A compile-time error. The first error aborts the compilation.
#[derive(Debug, Clone, PartialEq)]
pub enum CompileError {
    UndefinedVariable(String),
    UnknownOperator(Token),
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompileError::UndefinedVariable(name) => write!(f, "undefined variable {}", name),
            CompileError::UnknownOperator(op) => write!(f, "unknown operator {}", op),
        }
    }
}

impl std::error::Error for CompileError {}

/// The instructions of the top-level program together with the constant pool
/// shared by every function in it.
#[derive(Debug, Clone)]
pub struct Bytecode {
    pub chunk: Chunk,
    pub constants: ValueArray,
}

#[derive(Debug, Clone, Copy)]
struct EmittedInstruction {
    opcode: OpCode,
    position: usize,
}

/// Instruction buffer of the function currently being compiled. The last two
/// emitted instructions are tracked so a trailing `pop` can be elided or
/// rewritten into a `ret`.
struct CompilationScope {
    chunk: Chunk,
    last: Option<EmittedInstruction>,
    previous: Option<EmittedInstruction>,
}

impl CompilationScope {
    fn new(name: String) -> Self {
        Self {
            chunk: Chunk::new(name),
            last: None,
            previous: None,
        }
    }
}

/// Generate bytecode from an abstract syntax tree.
pub struct Codegen {
    constants: ValueArray,
    symbol_table: SymbolTable,
    /// Scope 0 is the top-level program; entering a function body pushes.
    scopes: Vec<CompilationScope>,
}

impl Codegen {
    pub fn new(name: impl ToString) -> Self {
        Self::with_state(name, SymbolTable::new(), Vec::new())
    }

    /// Continues from the symbol table and constant pool of an earlier
    /// compilation. This is what keeps bindings alive across repl lines.
    pub fn with_state(name: impl ToString, symbol_table: SymbolTable, constants: ValueArray) -> Self {
        Self {
            constants,
            symbol_table,
            scopes: vec![CompilationScope::new(name.to_string())],
        }
    }

    pub fn codegen_program(&mut self, program: &[Stmt]) -> Result<(), CompileError> {
        for stmt in program {
            self.codegen_stmt(stmt)?;
        }

        if DUMP_CHUNK {
            eprintln!("{}", self.scopes[0].chunk.disassemble(&self.constants));
        }
        Ok(())
    }

    /// Consumes `self` and returns the generated [`Bytecode`] plus the global
    /// symbol table, ready to be threaded into the next compilation.
    #[must_use]
    pub fn finish(self) -> (Bytecode, SymbolTable) {
        let mut scopes = self.scopes;
        let main = scopes.swap_remove(0);
        (
            Bytecode {
                chunk: main.chunk,
                constants: self.constants,
            },
            self.symbol_table.unwind(),
        )
    }

    fn codegen_stmt(&mut self, stmt: &Stmt) -> Result<(), CompileError> {
        match stmt {
            Stmt::LetDeclaration { ident, initializer } => {
                self.codegen_expr(initializer)?;
                let symbol = self.symbol_table.define(ident);
                match symbol.scope {
                    SymbolScope::Global => self.emit_u16(OpCode::StGlobal, symbol.index),
                    _ => self.emit_u8(OpCode::StLoc, symbol.index as u8),
                };
            }
            Stmt::ReturnStmt(expr) => {
                self.codegen_expr(expr)?;
                self.emit(OpCode::Ret);
            }
            Stmt::ExprStmt(expr) => {
                self.codegen_expr(expr)?;
                self.emit(OpCode::Pop);
            }
            Stmt::Error => unreachable!("parse errors are checked before codegen"),
        }
        Ok(())
    }

    fn codegen_expr(&mut self, expr: &Expr) -> Result<(), CompileError> {
        match expr {
            Expr::IntLit(val) => {
                let constant = self.add_constant(Value::Int(*val));
                self.emit_u16(OpCode::Ldc, constant);
            }
            Expr::BoolLit(val) => {
                match val {
                    true => self.emit(OpCode::LdTrue),
                    false => self.emit(OpCode::LdFalse),
                };
            }
            Expr::StringLit(val) => {
                let obj = Rc::new(Obj::new_string(val.clone()));
                let constant = self.add_constant(Value::Object(obj));
                self.emit_u16(OpCode::Ldc, constant);
            }
            Expr::Identifier(ident) => {
                let symbol = self
                    .symbol_table
                    .resolve(ident)
                    .ok_or_else(|| CompileError::UndefinedVariable(ident.clone()))?;
                self.load_symbol(&symbol);
            }
            Expr::ArrayLit(elements) => {
                for element in elements {
                    self.codegen_expr(element)?;
                }
                self.emit_u16(OpCode::NewArray, elements.len() as u16);
            }
            Expr::HashLit(pairs) => {
                // evaluation order is lexicographic on the key's canonical
                // text, making compilation deterministic
                let mut pairs = pairs.iter().collect::<Vec<_>>();
                pairs.sort_by_key(|(key, _)| key.to_string());
                for (key, value) in &pairs {
                    self.codegen_expr(key)?;
                    self.codegen_expr(value)?;
                }
                self.emit_u16(OpCode::NewHash, (pairs.len() * 2) as u16);
            }
            Expr::Binary { lhs, op, rhs } => {
                if *op == Token::LessThan {
                    // a < b is compiled as b > a
                    self.codegen_expr(rhs)?;
                    self.codegen_expr(lhs)?;
                    self.emit(OpCode::Greater);
                    return Ok(());
                }

                self.codegen_expr(lhs)?;
                self.codegen_expr(rhs)?;
                let opcode = match op {
                    Token::Plus => OpCode::Add,
                    Token::Minus => OpCode::Sub,
                    Token::Asterisk => OpCode::Mul,
                    Token::Slash => OpCode::Div,
                    Token::GreaterThan => OpCode::Greater,
                    Token::EqualsEquals => OpCode::Eq,
                    Token::NotEquals => OpCode::NotEq,
                    _ => return Err(CompileError::UnknownOperator(op.clone())),
                };
                self.emit(opcode);
            }
            Expr::Unary { op, arg } => {
                self.codegen_expr(arg)?;
                match op {
                    Token::Bang => self.emit(OpCode::Not),
                    Token::Minus => self.emit(OpCode::Neg),
                    _ => return Err(CompileError::UnknownOperator(op.clone())),
                };
            }
            Expr::Index { lhs, index } => {
                self.codegen_expr(lhs)?;
                self.codegen_expr(index)?;
                self.emit(OpCode::Index);
            }
            Expr::If {
                cond,
                then_branch,
                else_branch,
            } => {
                self.codegen_expr(cond)?;
                let jmp_not_truthy = self.emit_u16(OpCode::JmpNotTruthy, 9999);

                for stmt in then_branch {
                    self.codegen_stmt(stmt)?;
                }
                // an `if` is an expression, its branches must leave a value
                if self.last_instruction_is(OpCode::Pop) {
                    self.remove_last_pop();
                }

                let jmp = self.emit_u16(OpCode::Jmp, 9999);
                self.patch_jump(jmp_not_truthy);

                match else_branch {
                    Some(else_branch) => {
                        for stmt in else_branch {
                            self.codegen_stmt(stmt)?;
                        }
                        if self.last_instruction_is(OpCode::Pop) {
                            self.remove_last_pop();
                        }
                    }
                    None => {
                        self.emit(OpCode::LdNull);
                    }
                }
                self.patch_jump(jmp);
            }
            Expr::FunctionLit { params, body } => {
                self.enter_scope();
                for param in params {
                    self.symbol_table.define(param);
                }
                for stmt in body {
                    self.codegen_stmt(stmt)?;
                }

                // an implicit return: the value of the last expression
                // statement becomes the return value, an empty body returns null
                if self.last_instruction_is(OpCode::Pop) {
                    self.replace_last_pop_with_ret();
                }
                if !self.last_instruction_is(OpCode::Ret) {
                    self.emit(OpCode::RetNull);
                }

                let num_locals = self.symbol_table.num_definitions;
                let free_symbols = self.symbol_table.free_symbols.clone();
                let chunk = self.leave_scope();

                // load the captured values in the enclosing scope, then wrap
                // the function constant together with them into a closure
                for free in &free_symbols {
                    self.load_symbol(free);
                }
                let func = Rc::new(Function {
                    chunk,
                    arity: params.len(),
                    num_locals: num_locals as usize,
                });
                let constant = self.add_constant(Value::Object(Rc::new(Obj {
                    kind: ObjKind::Fn(func),
                })));
                self.emit_closure(constant, free_symbols.len() as u8);
            }
            Expr::FnCall { callee, args } => {
                self.codegen_expr(callee)?;
                for arg in args {
                    self.codegen_expr(arg)?;
                }
                self.emit_u8(OpCode::Calli, args.len() as u8);
            }
            Expr::Error => unreachable!("parse errors are checked before codegen"),
        }
        Ok(())
    }

    fn enter_scope(&mut self) {
        self.scopes.push(CompilationScope::new("<fn>".to_string()));
        let outer = mem::take(&mut self.symbol_table);
        self.symbol_table = SymbolTable::new_enclosed(outer);
    }

    /// Pops the current compilation scope, restores the enclosing symbol
    /// table and returns the scope's instructions.
    fn leave_scope(&mut self) -> Chunk {
        let scope = self.scopes.pop().unwrap();
        let table = mem::take(&mut self.symbol_table);
        self.symbol_table = table.into_outer().unwrap();
        scope.chunk
    }

    /// Appends to the constant pool, returns the new index.
    fn add_constant(&mut self, value: Value) -> u16 {
        self.constants.push(value);
        let loc = self.constants.len() - 1;
        if loc > u16::MAX as usize {
            panic!("constant pool overflow");
        }
        loc as u16
    }

    /* Emission */
    fn emit(&mut self, op: OpCode) -> usize {
        let scope = self.scopes.last_mut().unwrap();
        let pos = scope.chunk.write_chunk(op);
        scope.previous = scope.last;
        scope.last = Some(EmittedInstruction {
            opcode: op,
            position: pos,
        });
        pos
    }

    fn emit_u16(&mut self, op: OpCode, operand: u16) -> usize {
        let pos = self.emit(op);
        self.scopes.last_mut().unwrap().chunk.write_u16(operand);
        pos
    }

    fn emit_u8(&mut self, op: OpCode, operand: u8) -> usize {
        let pos = self.emit(op);
        self.scopes.last_mut().unwrap().chunk.write_chunk(operand);
        pos
    }

    fn emit_closure(&mut self, constant: u16, num_free: u8) -> usize {
        let pos = self.emit(OpCode::Closure);
        let chunk = &mut self.scopes.last_mut().unwrap().chunk;
        chunk.write_u16(constant);
        chunk.write_chunk(num_free);
        pos
    }

    fn load_symbol(&mut self, symbol: &Symbol) {
        match symbol.scope {
            SymbolScope::Global => self.emit_u16(OpCode::LdGlobal, symbol.index),
            SymbolScope::Local => self.emit_u8(OpCode::LdLoc, symbol.index as u8),
            SymbolScope::Free => self.emit_u8(OpCode::LdFree, symbol.index as u8),
        };
    }

    fn patch_jump(&mut self, op_pos: usize) {
        self.scopes.last_mut().unwrap().chunk.patch_jump(op_pos);
    }

    fn last_instruction_is(&self, op: OpCode) -> bool {
        match self.scopes.last().unwrap().last {
            Some(last) => last.opcode == op,
            None => false,
        }
    }

    /// Drops the trailing `pop`, e.g. so an `if` branch leaves its value.
    fn remove_last_pop(&mut self) {
        let scope = self.scopes.last_mut().unwrap();
        let last = scope.last.unwrap();
        scope.chunk.code.truncate(last.position);
        scope.last = scope.previous.take();
    }

    /// Rewrites a trailing `pop` in place into a `ret` (both are 1 byte), so
    /// the value of a function body's last expression statement is returned.
    fn replace_last_pop_with_ret(&mut self) {
        let scope = self.scopes.last_mut().unwrap();
        let last = scope.last.as_mut().unwrap();
        scope.chunk.code[last.position] = OpCode::Ret as u8;
        last.opcode = OpCode::Ret;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rune_parser::parser::Parser;

    fn compile(source: &str) -> Bytecode {
        let source = source.into();
        let mut parser = Parser::new(&source);
        let program = parser.parse_program();
        assert!(!source.has_errors());

        let mut codegen = Codegen::new("<test>");
        codegen.codegen_program(&program).unwrap();
        codegen.finish().0
    }

    fn compile_err(source: &str) -> CompileError {
        let source = source.into();
        let mut parser = Parser::new(&source);
        let program = parser.parse_program();
        assert!(!source.has_errors());

        let mut codegen = Codegen::new("<test>");
        codegen.codegen_program(&program).unwrap_err()
    }

    /// Builds the expected instruction bytes with the same chunk API.
    fn chunk(build: impl FnOnce(&mut Chunk)) -> Vec<u8> {
        let mut chunk = Chunk::new("<expected>".to_string());
        build(&mut chunk);
        chunk.code
    }

    /// Pulls the chunk of the compiled function at `index` in the pool.
    fn fn_chunk(bytecode: &Bytecode, index: usize) -> &Chunk {
        match &bytecode.constants[index] {
            Value::Object(obj) => match &obj.kind {
                ObjKind::Fn(func) => &func.chunk,
                _ => panic!("constant {} is not a function", index),
            },
            _ => panic!("constant {} is not a function", index),
        }
    }

    #[test]
    fn test_integer_arithmetic() {
        let bytecode = compile("1 + 2");
        assert_eq!(bytecode.constants, vec![Value::Int(1), Value::Int(2)]);
        assert_eq!(
            bytecode.chunk.code,
            chunk(|c| {
                c.write_chunk(OpCode::Ldc);
                c.write_u16(0);
                c.write_chunk(OpCode::Ldc);
                c.write_u16(1);
                c.write_chunk(OpCode::Add);
                c.write_chunk(OpCode::Pop);
            })
        );
    }

    #[test]
    fn test_less_than_swaps_operands() {
        let bytecode = compile("1 < 2");
        // the right operand is compiled first
        assert_eq!(bytecode.constants, vec![Value::Int(2), Value::Int(1)]);
        assert_eq!(
            bytecode.chunk.code,
            chunk(|c| {
                c.write_chunk(OpCode::Ldc);
                c.write_u16(0);
                c.write_chunk(OpCode::Ldc);
                c.write_u16(1);
                c.write_chunk(OpCode::Greater);
                c.write_chunk(OpCode::Pop);
            })
        );
    }

    #[test]
    fn test_boolean_and_prefix() {
        let bytecode = compile("!true");
        assert_eq!(
            bytecode.chunk.code,
            chunk(|c| {
                c.write_chunk(OpCode::LdTrue);
                c.write_chunk(OpCode::Not);
                c.write_chunk(OpCode::Pop);
            })
        );

        let bytecode = compile("-1");
        assert_eq!(
            bytecode.chunk.code,
            chunk(|c| {
                c.write_chunk(OpCode::Ldc);
                c.write_u16(0);
                c.write_chunk(OpCode::Neg);
                c.write_chunk(OpCode::Pop);
            })
        );
    }

    #[test]
    fn test_conditional_without_else() {
        let bytecode = compile("if (true) { 10 }; 3333;");
        assert_eq!(
            bytecode.chunk.code,
            chunk(|c| {
                c.write_chunk(OpCode::LdTrue); // 0000
                c.write_chunk(OpCode::JmpNotTruthy); // 0001
                c.write_u16(10);
                c.write_chunk(OpCode::Ldc); // 0004
                c.write_u16(0);
                c.write_chunk(OpCode::Jmp); // 0007
                c.write_u16(11);
                c.write_chunk(OpCode::LdNull); // 0010
                c.write_chunk(OpCode::Pop); // 0011
                c.write_chunk(OpCode::Ldc); // 0012
                c.write_u16(1);
                c.write_chunk(OpCode::Pop); // 0015
            })
        );
    }

    #[test]
    fn test_conditional_with_else() {
        let bytecode = compile("if (true) { 10 } else { 20 }; 3333;");
        assert_eq!(
            bytecode.chunk.code,
            chunk(|c| {
                c.write_chunk(OpCode::LdTrue); // 0000
                c.write_chunk(OpCode::JmpNotTruthy); // 0001
                c.write_u16(10);
                c.write_chunk(OpCode::Ldc); // 0004
                c.write_u16(0);
                c.write_chunk(OpCode::Jmp); // 0007
                c.write_u16(13);
                c.write_chunk(OpCode::Ldc); // 0010
                c.write_u16(1);
                c.write_chunk(OpCode::Pop); // 0013
                c.write_chunk(OpCode::Ldc); // 0014
                c.write_u16(2);
                c.write_chunk(OpCode::Pop); // 0017
            })
        );
    }

    #[test]
    fn test_global_let() {
        let bytecode = compile("let one = 1; let two = 2; one;");
        assert_eq!(
            bytecode.chunk.code,
            chunk(|c| {
                c.write_chunk(OpCode::Ldc);
                c.write_u16(0);
                c.write_chunk(OpCode::StGlobal);
                c.write_u16(0);
                c.write_chunk(OpCode::Ldc);
                c.write_u16(1);
                c.write_chunk(OpCode::StGlobal);
                c.write_u16(1);
                c.write_chunk(OpCode::LdGlobal);
                c.write_u16(0);
                c.write_chunk(OpCode::Pop);
            })
        );
    }

    #[test]
    fn test_array_and_hash_literals() {
        let bytecode = compile("[1, 2, 3]");
        assert_eq!(
            bytecode.chunk.code,
            chunk(|c| {
                c.write_chunk(OpCode::Ldc);
                c.write_u16(0);
                c.write_chunk(OpCode::Ldc);
                c.write_u16(1);
                c.write_chunk(OpCode::Ldc);
                c.write_u16(2);
                c.write_chunk(OpCode::NewArray);
                c.write_u16(3);
                c.write_chunk(OpCode::Pop);
            })
        );

        // keys are emitted sorted by their text, not in source order
        let bytecode = compile("{3: 4, 1: 2}");
        assert_eq!(
            bytecode.constants,
            vec![Value::Int(1), Value::Int(2), Value::Int(3), Value::Int(4)]
        );
        assert_eq!(
            bytecode.chunk.code,
            chunk(|c| {
                for constant in 0..4 {
                    c.write_chunk(OpCode::Ldc);
                    c.write_u16(constant);
                }
                c.write_chunk(OpCode::NewHash);
                c.write_u16(4);
                c.write_chunk(OpCode::Pop);
            })
        );
    }

    #[test]
    fn test_compilation_is_deterministic() {
        let source = r#"let h = {"b": 1, "a": 2, "c": 3}; h["a"]"#;
        let first = compile(source);
        let second = compile(source);
        assert_eq!(first.chunk.code, second.chunk.code);
    }

    #[test]
    fn test_index_expr() {
        let bytecode = compile("[1][0]");
        assert_eq!(
            bytecode.chunk.code,
            chunk(|c| {
                c.write_chunk(OpCode::Ldc);
                c.write_u16(0);
                c.write_chunk(OpCode::NewArray);
                c.write_u16(1);
                c.write_chunk(OpCode::Ldc);
                c.write_u16(1);
                c.write_chunk(OpCode::Index);
                c.write_chunk(OpCode::Pop);
            })
        );
    }

    #[test]
    fn test_functions() {
        let bytecode = compile("fn() { return 5 + 10 }");
        assert_eq!(
            fn_chunk(&bytecode, 2).code,
            chunk(|c| {
                c.write_chunk(OpCode::Ldc);
                c.write_u16(0);
                c.write_chunk(OpCode::Ldc);
                c.write_u16(1);
                c.write_chunk(OpCode::Add);
                c.write_chunk(OpCode::Ret);
            })
        );
        assert_eq!(
            bytecode.chunk.code,
            chunk(|c| {
                c.write_chunk(OpCode::Closure);
                c.write_u16(2);
                c.write_chunk(0u8);
                c.write_chunk(OpCode::Pop);
            })
        );
    }

    #[test]
    fn test_function_implicit_return() {
        // the trailing pop is rewritten into a ret
        let bytecode = compile("fn() { 5 + 10 }");
        assert_eq!(
            fn_chunk(&bytecode, 2).code,
            chunk(|c| {
                c.write_chunk(OpCode::Ldc);
                c.write_u16(0);
                c.write_chunk(OpCode::Ldc);
                c.write_u16(1);
                c.write_chunk(OpCode::Add);
                c.write_chunk(OpCode::Ret);
            })
        );
    }

    #[test]
    fn test_empty_function_returns_null() {
        let bytecode = compile("fn() { }");
        assert_eq!(
            fn_chunk(&bytecode, 0).code,
            chunk(|c| {
                c.write_chunk(OpCode::RetNull);
            })
        );
    }

    #[test]
    fn test_function_locals() {
        let bytecode = compile("fn() { let num = 55; num }");
        assert_eq!(
            fn_chunk(&bytecode, 1).code,
            chunk(|c| {
                c.write_chunk(OpCode::Ldc);
                c.write_u16(0);
                c.write_chunk(OpCode::StLoc);
                c.write_chunk(0u8);
                c.write_chunk(OpCode::LdLoc);
                c.write_chunk(0u8);
                c.write_chunk(OpCode::Ret);
            })
        );
    }

    #[test]
    fn test_calls() {
        let bytecode = compile("fn() { 24 }();");
        assert_eq!(
            bytecode.chunk.code,
            chunk(|c| {
                c.write_chunk(OpCode::Closure);
                c.write_u16(1);
                c.write_chunk(0u8);
                c.write_chunk(OpCode::Calli);
                c.write_chunk(0u8);
                c.write_chunk(OpCode::Pop);
            })
        );

        let bytecode = compile("let oneArg = fn(a) { a }; oneArg(24);");
        assert_eq!(
            fn_chunk(&bytecode, 0).code,
            chunk(|c| {
                c.write_chunk(OpCode::LdLoc);
                c.write_chunk(0u8);
                c.write_chunk(OpCode::Ret);
            })
        );
        assert_eq!(
            bytecode.chunk.code,
            chunk(|c| {
                c.write_chunk(OpCode::Closure);
                c.write_u16(0);
                c.write_chunk(0u8);
                c.write_chunk(OpCode::StGlobal);
                c.write_u16(0);
                c.write_chunk(OpCode::LdGlobal);
                c.write_u16(0);
                c.write_chunk(OpCode::Ldc);
                c.write_u16(1);
                c.write_chunk(OpCode::Calli);
                c.write_chunk(1u8);
                c.write_chunk(OpCode::Pop);
            })
        );
    }

    #[test]
    fn test_closures_capture_free_variables() {
        let bytecode = compile("fn(a) { fn(b) { a + b } }");

        // the inner function reads `a` from its free-variable slots
        assert_eq!(
            fn_chunk(&bytecode, 0).code,
            chunk(|c| {
                c.write_chunk(OpCode::LdFree);
                c.write_chunk(0u8);
                c.write_chunk(OpCode::LdLoc);
                c.write_chunk(0u8);
                c.write_chunk(OpCode::Add);
                c.write_chunk(OpCode::Ret);
            })
        );
        // the outer function loads `a` and wraps the inner constant with it
        assert_eq!(
            fn_chunk(&bytecode, 1).code,
            chunk(|c| {
                c.write_chunk(OpCode::LdLoc);
                c.write_chunk(0u8);
                c.write_chunk(OpCode::Closure);
                c.write_u16(0);
                c.write_chunk(1u8);
                c.write_chunk(OpCode::Ret);
            })
        );
    }

    #[test]
    fn test_function_metadata() {
        let bytecode = compile("fn(a, b) { let c = 1; a + b + c }");
        match &bytecode.constants[1] {
            Value::Object(obj) => match &obj.kind {
                ObjKind::Fn(func) => {
                    assert_eq!(func.arity, 2);
                    assert_eq!(func.num_locals, 3);
                }
                _ => panic!("expected a function constant"),
            },
            _ => panic!("expected a function constant"),
        }
    }

    #[test]
    fn test_undefined_variable() {
        assert_eq!(
            compile_err("undefinedVariable"),
            CompileError::UndefinedVariable("undefinedVariable".to_string())
        );
        assert_eq!(
            compile_err("undefinedVariable").to_string(),
            "undefined variable undefinedVariable"
        );
    }

    #[test]
    fn test_repl_state_is_threaded() {
        let first = "let one = 1;".into();
        let program = Parser::new(&first).parse_program();
        let mut codegen = Codegen::new("<global>");
        codegen.codegen_program(&program).unwrap();
        let (bytecode, symbol_table) = codegen.finish();

        // the second line sees `one` and keeps appending to the pool
        let second = "let two = one + 1;".into();
        let program = Parser::new(&second).parse_program();
        let mut codegen = Codegen::with_state("<global>", symbol_table, bytecode.constants);
        codegen.codegen_program(&program).unwrap();
        let (bytecode, _) = codegen.finish();

        assert_eq!(bytecode.constants, vec![Value::Int(1), Value::Int(1)]);
        assert_eq!(
            bytecode.chunk.code,
            chunk(|c| {
                c.write_chunk(OpCode::LdGlobal);
                c.write_u16(0);
                c.write_chunk(OpCode::Ldc);
                c.write_u16(1);
                c.write_chunk(OpCode::Add);
                c.write_chunk(OpCode::StGlobal);
                c.write_u16(1);
            })
        );
    }
}
