//! Stack-based virtual machine executing compiled bytecode.

use crate::codegen::Bytecode;
use num_traits::FromPrimitive;
use rune_value::chunk::OpCode;
use rune_value::object::{Closure, Function, HashPair, Obj, ObjKind};
use rune_value::{Value, ValueArray};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// Size of the value stack. Pushing past it is a runtime error, not a
/// reallocation.
pub const STACK_SIZE: usize = 2048;
/// Number of global slots. Fixed for the lifetime of the machine.
pub const GLOBAL_SIZE: usize = 65536;

/// A runtime error. The first one short-circuits execution.
#[derive(Debug, Clone, PartialEq)]
pub enum RuntimeError {
    StackOverflow,
    StackUnderflow,
    DivisionByZero,
    UnsupportedBinaryTypes(&'static str, &'static str),
    UnknownOperator(OpCode),
    UnsupportedNegation(&'static str),
    IndexNotSupported(&'static str),
    UnusableHashKey(&'static str),
    WrongArity { want: usize, got: usize },
    NotCallable(&'static str),
    UnknownOpcode(u8),
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuntimeError::StackOverflow => write!(f, "stack overflow"),
            RuntimeError::StackUnderflow => write!(f, "stack underflow"),
            RuntimeError::DivisionByZero => write!(f, "division by zero"),
            RuntimeError::UnsupportedBinaryTypes(lhs, rhs) => {
                write!(f, "unsupported types for binary operation: {} {}", lhs, rhs)
            }
            RuntimeError::UnknownOperator(op) => write!(f, "unknown operator: {:?}", op),
            RuntimeError::UnsupportedNegation(operand) => {
                write!(f, "unsupported type for negation: {}", operand)
            }
            RuntimeError::IndexNotSupported(operand) => {
                write!(f, "index operator not supported: {}", operand)
            }
            RuntimeError::UnusableHashKey(key) => write!(f, "unusable as hash key: {}", key),
            RuntimeError::WrongArity { want, got } => {
                write!(f, "wrong number of arguments: want={}, got={}", want, got)
            }
            RuntimeError::NotCallable(callee) => write!(f, "calling non-function: {}", callee),
            RuntimeError::UnknownOpcode(byte) => write!(f, "unknown opcode: {}", byte),
        }
    }
}

impl std::error::Error for RuntimeError {}

/// Per-call activation record. The base pointer anchors both the argument
/// slots and the local slots of the frame.
struct Frame {
    /// Always holds an [`ObjKind::Closure`].
    cl: Rc<Obj>,
    ip: usize,
    base_pointer: usize,
}

impl Frame {
    fn new(cl: Rc<Obj>, base_pointer: usize) -> Self {
        Self {
            cl,
            ip: 0,
            base_pointer,
        }
    }

    fn closure(&self) -> &Closure {
        match &self.cl.kind {
            ObjKind::Closure(cl) => cl,
            _ => unreachable!("frame without closure"),
        }
    }
}

pub struct Vm {
    constants: ValueArray,
    /// VM stack. `sp` always points at the next free slot; `pop` decrements
    /// without erasing, which keeps the last popped value observable.
    stack: Vec<Value>,
    sp: usize,
    globals: Vec<Value>,
    frames: Vec<Frame>,
}

impl Vm {
    pub fn new(bytecode: Bytecode) -> Self {
        Self::with_globals(bytecode, vec![Value::Null; GLOBAL_SIZE])
    }

    /// Creates a machine that reads and writes an externally owned global
    /// array, so bindings survive across repl lines. Reclaim the array with
    /// [`Vm::into_globals`] after the run.
    pub fn with_globals(bytecode: Bytecode, globals: Vec<Value>) -> Self {
        // the top-level program runs inside a synthetic frame
        let main_fn = Rc::new(Function {
            chunk: bytecode.chunk,
            arity: 0,
            num_locals: 0,
        });
        let main_cl = Rc::new(Obj {
            kind: ObjKind::Closure(Closure {
                func: main_fn,
                free: Vec::new(),
            }),
        });

        Self {
            constants: bytecode.constants,
            stack: vec![Value::Null; STACK_SIZE],
            sp: 0,
            globals,
            frames: vec![Frame::new(main_cl, 0)],
        }
    }

    pub fn into_globals(self) -> Vec<Value> {
        self.globals
    }

    /// The value most recently popped off the stack. Since `pop` does not
    /// erase the slot, this is the observable result of the last expression
    /// statement; the repl prints it after every line.
    pub fn last_popped(&self) -> Value {
        self.stack[self.sp].clone()
    }

    pub fn run(&mut self) -> Result<(), RuntimeError> {
        loop {
            let frame = self.frames.last().expect("no active frame");
            if frame.ip >= frame.closure().func.chunk.code.len() {
                // only the top-level frame runs off the end; functions
                // always return explicitly
                return Ok(());
            }

            let byte = self.read_byte();
            let op = match OpCode::from_u8(byte) {
                Some(op) => op,
                None => return Err(RuntimeError::UnknownOpcode(byte)),
            };

            match op {
                OpCode::Ldc => {
                    let constant = self.read_u16() as usize;
                    self.push(self.constants[constant].clone())?;
                }
                OpCode::Pop => {
                    self.pop()?;
                }
                OpCode::Add | OpCode::Sub | OpCode::Mul | OpCode::Div => {
                    self.execute_binary_op(op)?;
                }
                OpCode::LdTrue => self.push(Value::Bool(true))?,
                OpCode::LdFalse => self.push(Value::Bool(false))?,
                OpCode::LdNull => self.push(Value::Null)?,
                OpCode::Eq | OpCode::NotEq | OpCode::Greater => {
                    self.execute_comparison(op)?;
                }
                OpCode::Not => {
                    let operand = self.pop()?;
                    self.push(Value::Bool(!operand.is_truthy()))?;
                }
                OpCode::Neg => {
                    let operand = self.pop()?;
                    match operand {
                        Value::Int(val) => self.push(Value::Int(val.wrapping_neg()))?,
                        _ => {
                            return Err(RuntimeError::UnsupportedNegation(operand.type_name()));
                        }
                    }
                }
                OpCode::Jmp => {
                    let target = self.read_u16() as usize;
                    self.frame_mut().ip = target;
                }
                OpCode::JmpNotTruthy => {
                    let target = self.read_u16() as usize;
                    let condition = self.pop()?;
                    if !condition.is_truthy() {
                        self.frame_mut().ip = target;
                    }
                }
                OpCode::StGlobal => {
                    let slot = self.read_u16() as usize;
                    self.globals[slot] = self.pop()?;
                }
                OpCode::LdGlobal => {
                    let slot = self.read_u16() as usize;
                    self.push(self.globals[slot].clone())?;
                }
                OpCode::StLoc => {
                    let slot = self.read_byte() as usize;
                    let base = self.frame().base_pointer;
                    self.stack[base + slot] = self.pop()?;
                }
                OpCode::LdLoc => {
                    let slot = self.read_byte() as usize;
                    let base = self.frame().base_pointer;
                    self.push(self.stack[base + slot].clone())?;
                }
                OpCode::LdFree => {
                    let slot = self.read_byte() as usize;
                    let value = self.frame().closure().free[slot].clone();
                    self.push(value)?;
                }
                OpCode::NewArray => {
                    let count = self.read_u16() as usize;
                    let elements = self.stack[self.sp - count..self.sp].to_vec();
                    self.sp -= count;
                    self.push(Value::Object(Rc::new(Obj::new_array(elements))))?;
                }
                OpCode::NewHash => {
                    let count = self.read_u16() as usize;
                    let hash = self.build_hash(self.sp - count, self.sp)?;
                    self.sp -= count;
                    self.push(hash)?;
                }
                OpCode::Index => {
                    let index = self.pop()?;
                    let lhs = self.pop()?;
                    self.execute_index(lhs, index)?;
                }
                OpCode::Closure => {
                    let constant = self.read_u16() as usize;
                    let free_count = self.read_byte() as usize;
                    self.push_closure(constant, free_count)?;
                }
                OpCode::Calli => {
                    let argc = self.read_byte() as usize;
                    self.call(argc)?;
                }
                OpCode::Ret => {
                    let value = self.pop()?;
                    if self.return_from_frame(value)? {
                        return Ok(());
                    }
                }
                OpCode::RetNull => {
                    if self.return_from_frame(Value::Null)? {
                        return Ok(());
                    }
                }
            }
        }
    }

    fn frame(&self) -> &Frame {
        self.frames.last().expect("no active frame")
    }

    fn frame_mut(&mut self) -> &mut Frame {
        self.frames.last_mut().expect("no active frame")
    }

    fn read_byte(&mut self) -> u8 {
        let frame = self.frames.last_mut().expect("no active frame");
        let byte = frame.closure().func.chunk.code[frame.ip];
        frame.ip += 1;
        byte
    }

    fn read_u16(&mut self) -> u16 {
        let hi = self.read_byte();
        let lo = self.read_byte();
        u16::from_be_bytes([hi, lo])
    }

    fn push(&mut self, value: Value) -> Result<(), RuntimeError> {
        if self.sp >= STACK_SIZE {
            return Err(RuntimeError::StackOverflow);
        }
        self.stack[self.sp] = value;
        self.sp += 1;
        Ok(())
    }

    fn pop(&mut self) -> Result<Value, RuntimeError> {
        if self.sp == 0 {
            return Err(RuntimeError::StackUnderflow);
        }
        self.sp -= 1;
        Ok(self.stack[self.sp].clone())
    }

    fn execute_binary_op(&mut self, op: OpCode) -> Result<(), RuntimeError> {
        let rhs = self.pop()?;
        let lhs = self.pop()?;

        match (&lhs, &rhs) {
            (Value::Int(lhs), Value::Int(rhs)) => {
                // integer arithmetic wraps (two's complement)
                let result = match op {
                    OpCode::Add => lhs.wrapping_add(*rhs),
                    OpCode::Sub => lhs.wrapping_sub(*rhs),
                    OpCode::Mul => lhs.wrapping_mul(*rhs),
                    OpCode::Div => {
                        if *rhs == 0 {
                            return Err(RuntimeError::DivisionByZero);
                        }
                        lhs.wrapping_div(*rhs)
                    }
                    _ => return Err(RuntimeError::UnknownOperator(op)),
                };
                self.push(Value::Int(result))
            }
            (Value::Object(lhs_obj), Value::Object(rhs_obj)) => {
                match (&lhs_obj.kind, &rhs_obj.kind) {
                    (ObjKind::Str(lhs), ObjKind::Str(rhs)) => {
                        // `+` concatenates; every other string operator is an error
                        if op != OpCode::Add {
                            return Err(RuntimeError::UnknownOperator(op));
                        }
                        let result = format!("{}{}", lhs, rhs);
                        self.push(Value::Object(Rc::new(Obj::new_string(result))))
                    }
                    _ => Err(RuntimeError::UnsupportedBinaryTypes(
                        lhs.type_name(),
                        rhs.type_name(),
                    )),
                }
            }
            _ => Err(RuntimeError::UnsupportedBinaryTypes(
                lhs.type_name(),
                rhs.type_name(),
            )),
        }
    }

    fn execute_comparison(&mut self, op: OpCode) -> Result<(), RuntimeError> {
        let rhs = self.pop()?;
        let lhs = self.pop()?;

        if let (Value::Int(lhs), Value::Int(rhs)) = (&lhs, &rhs) {
            let result = match op {
                OpCode::Eq => lhs == rhs,
                OpCode::NotEq => lhs != rhs,
                OpCode::Greater => lhs > rhs,
                _ => return Err(RuntimeError::UnknownOperator(op)),
            };
            return self.push(Value::Bool(result));
        }

        match op {
            OpCode::Eq => {
                let result = lhs == rhs;
                self.push(Value::Bool(result))
            }
            OpCode::NotEq => {
                let result = lhs != rhs;
                self.push(Value::Bool(result))
            }
            // `>` requires integers on both sides
            _ => Err(RuntimeError::UnsupportedBinaryTypes(
                lhs.type_name(),
                rhs.type_name(),
            )),
        }
    }

    /// Consumes the stack slots `[start, end)` as alternating keys and values.
    fn build_hash(&self, start: usize, end: usize) -> Result<Value, RuntimeError> {
        let mut pairs = HashMap::new();
        let mut i = start;
        while i < end {
            let key = self.stack[i].clone();
            let value = self.stack[i + 1].clone();
            let hash_key = key
                .hash_key()
                .ok_or(RuntimeError::UnusableHashKey(key.type_name()))?;
            pairs.insert(hash_key, HashPair { key, value });
            i += 2;
        }
        Ok(Value::Object(Rc::new(Obj {
            kind: ObjKind::Hash(pairs),
        })))
    }

    fn execute_index(&mut self, lhs: Value, index: Value) -> Result<(), RuntimeError> {
        match &lhs {
            Value::Object(obj) => match &obj.kind {
                ObjKind::Array(elements) => match index {
                    Value::Int(i) => {
                        // out of range or negative is null, not an error
                        if i < 0 || i as usize >= elements.len() {
                            self.push(Value::Null)
                        } else {
                            self.push(elements[i as usize].clone())
                        }
                    }
                    _ => Err(RuntimeError::IndexNotSupported(lhs.type_name())),
                },
                ObjKind::Hash(pairs) => {
                    let key = index
                        .hash_key()
                        .ok_or(RuntimeError::UnusableHashKey(index.type_name()))?;
                    match pairs.get(&key) {
                        Some(pair) => self.push(pair.value.clone()),
                        None => self.push(Value::Null), // missing key is null
                    }
                }
                _ => Err(RuntimeError::IndexNotSupported(lhs.type_name())),
            },
            _ => Err(RuntimeError::IndexNotSupported(lhs.type_name())),
        }
    }

    /// Wraps the function constant at `constant` together with `free_count`
    /// captured values popped off the stack.
    fn push_closure(&mut self, constant: usize, free_count: usize) -> Result<(), RuntimeError> {
        let func = match &self.constants[constant] {
            Value::Object(obj) => match &obj.kind {
                ObjKind::Fn(func) => func.clone(),
                _ => unreachable!("closure constant is not a function"),
            },
            _ => unreachable!("closure constant is not a function"),
        };

        let free = self.stack[self.sp - free_count..self.sp].to_vec();
        self.sp -= free_count;

        self.push(Value::Object(Rc::new(Obj {
            kind: ObjKind::Closure(Closure { func, free }),
        })))
    }

    fn call(&mut self, argc: usize) -> Result<(), RuntimeError> {
        // the callee sits below its arguments
        let callee = self.stack[self.sp - 1 - argc].clone();
        let obj = match &callee {
            Value::Object(obj) => obj,
            _ => return Err(RuntimeError::NotCallable(callee.type_name())),
        };

        match &obj.kind {
            ObjKind::Closure(cl) => {
                if argc != cl.func.arity {
                    return Err(RuntimeError::WrongArity {
                        want: cl.func.arity,
                        got: argc,
                    });
                }

                let base_pointer = self.sp - argc;
                let num_locals = cl.func.num_locals;
                if base_pointer + num_locals > STACK_SIZE {
                    return Err(RuntimeError::StackOverflow);
                }
                self.frames.push(Frame::new(obj.clone(), base_pointer));
                // reserve the local slots that are not parameters
                self.sp = base_pointer + num_locals;
                Ok(())
            }
            ObjKind::NativeFn(native) => {
                let mut args = self.stack[self.sp - argc..self.sp].to_vec();
                let result = (native.func)(&mut args);
                // drop the arguments and the callee
                self.sp -= argc + 1;
                self.push(result)
            }
            _ => Err(RuntimeError::NotCallable(callee.type_name())),
        }
    }

    /// Pops the current frame, releasing its argument and local slots
    /// (and the callee below them), and pushes the return value. Returns
    /// `true` when the frame was the top-level one: a `return` in the main
    /// program ends execution, with the value left in the last-popped slot so
    /// it stays observable.
    fn return_from_frame(&mut self, value: Value) -> Result<bool, RuntimeError> {
        if self.frames.len() == 1 {
            self.sp = self.frame().base_pointer;
            self.stack[self.sp] = value;
            return Ok(true);
        }
        let frame = self.frames.pop().expect("no active frame");
        self.sp = frame.base_pointer - 1;
        self.push(value)?;
        Ok(false)
    }
}
