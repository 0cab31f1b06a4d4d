pub mod chunk;
pub mod disassemble;
pub mod object;

use object::{NativeFn, Obj, ObjKind};
use std::fmt;
use std::rc::Rc;

#[derive(Clone)]
pub enum Value {
    Int(i64),
    Bool(bool),
    Null,
    Object(Rc<Obj>),
}

impl Value {
    /// `null` and `false` are falsy, everything else is truthy
    /// (including `0` and `""`).
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Null | Value::Bool(false))
    }

    /// The name of the value's kind, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "integer",
            Value::Bool(_) => "boolean",
            Value::Null => "null",
            Value::Object(obj) => match &obj.kind {
                ObjKind::Str(_) => "string",
                ObjKind::Array(_) => "array",
                ObjKind::Hash(_) => "hash",
                ObjKind::Fn(_) | ObjKind::Closure(_) => "function",
                ObjKind::NativeFn(_) => "native function",
                ObjKind::Error(_) => "error",
            },
        }
    }

    fn print_obj(f: &mut fmt::Formatter<'_>, obj: &Obj) -> fmt::Result {
        match &obj.kind {
            ObjKind::Str(str) => write!(f, "{}", str),
            ObjKind::Array(elements) => {
                let elements = elements
                    .iter()
                    .map(|element| element.to_string())
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "[{}]", elements)
            }
            ObjKind::Hash(pairs) => {
                // sorted by key text so output is reproducible across runs
                let mut pairs = pairs
                    .values()
                    .map(|pair| format!("{}: {}", pair.key, pair.value))
                    .collect::<Vec<_>>();
                pairs.sort();
                write!(f, "{{{}}}", pairs.join(", "))
            }
            ObjKind::Fn(_) | ObjKind::Closure(_) => write!(f, "<fn>"),
            ObjKind::NativeFn(NativeFn { ident, .. }) => write!(f, "<native fn {}>", ident),
            ObjKind::Error(message) => write!(f, "ERROR: {}", message),
        }
    }
}

/// Integers, booleans and null compare by value, strings by content.
/// Arrays, hashes and functions compare by reference identity.
impl PartialEq for Value {
    fn eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Int(lhs), Value::Int(rhs)) => lhs == rhs,
            (Value::Bool(lhs), Value::Bool(rhs)) => lhs == rhs,
            (Value::Null, Value::Null) => true,
            (Value::Object(lhs), Value::Object(rhs)) => match (&lhs.kind, &rhs.kind) {
                (ObjKind::Str(lhs), ObjKind::Str(rhs)) => lhs == rhs,
                _ => Rc::ptr_eq(lhs, rhs),
            },
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(val) => write!(f, "{}", val),
            Value::Bool(val) => write!(f, "{}", val),
            Value::Null => write!(f, "null"),
            Value::Object(val) => Self::print_obj(f, val),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

pub type ValueArray = Vec<Value>;

/// Built-in values that should be defined in the global scope before any user
/// code runs. The driver assigns each entry a global slot in insertion order.
pub struct BuiltinVars {
    pub values: Vec<(String, Value)>,
}

impl BuiltinVars {
    pub fn new() -> Self {
        Self { values: Vec::new() }
    }

    pub fn add_native_fn(
        &mut self,
        ident: &str,
        func: &'static (dyn Fn(&mut [Value]) -> Value),
    ) {
        let obj = Rc::new(Obj {
            kind: ObjKind::NativeFn(NativeFn {
                ident: ident.to_string(),
                func,
            }),
        });
        self.values.push((ident.to_string(), Value::Object(obj)));
    }
}

impl Default for BuiltinVars {
    fn default() -> Self {
        Self::new()
    }
}
