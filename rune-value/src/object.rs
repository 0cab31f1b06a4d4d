use crate::chunk::Chunk;
use std::collections::HashMap;
use std::rc::Rc;

use super::Value;

#[derive(Clone)]
pub struct NativeFn {
    pub ident: String,
    pub func: &'static dyn Fn(&mut [Value]) -> Value,
}

/// A function lowered to bytecode. Stored in the constant pool; at runtime it
/// is always wrapped in a [`Closure`] before being called.
#[derive(Clone)]
pub struct Function {
    pub chunk: Chunk,
    /// Number of parameters that the function accepts.
    pub arity: usize,
    /// Number of local slots to reserve, parameters included.
    pub num_locals: usize,
}

/// A function plus the free variables captured where it was created.
#[derive(Clone)]
pub struct Closure {
    pub func: Rc<Function>,
    pub free: Vec<Value>,
}

#[derive(Clone)]
pub enum ObjKind {
    Str(String),
    Array(Vec<Value>),
    Hash(HashMap<HashKey, HashPair>),
    Fn(Rc<Function>),
    Closure(Closure),
    NativeFn(NativeFn),
    /// An error produced by a built-in function. Travels through the value
    /// stack like any other value rather than aborting the VM.
    Error(String),
}

#[derive(Clone)]
pub struct Obj {
    pub kind: ObjKind,
}

impl Obj {
    pub fn new_string(str: String) -> Self {
        Self {
            kind: ObjKind::Str(str),
        }
    }

    pub fn new_array(elements: Vec<Value>) -> Self {
        Self {
            kind: ObjKind::Array(elements),
        }
    }

    pub fn new_error(message: impl ToString) -> Self {
        Self {
            kind: ObjKind::Error(message.to_string()),
        }
    }
}

/// A hash entry. The original key value is kept so that hashes can be
/// displayed; lookups go through the derived [`HashKey`].
#[derive(Clone)]
pub struct HashPair {
    pub key: Value,
    pub value: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HashKeyKind {
    Int,
    Bool,
    Str,
}

/// A stable 64-bit key derived from a hashable value. Only integers, booleans
/// and strings are hashable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HashKey {
    pub kind: HashKeyKind,
    pub value: u64,
}

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// FNV-1a over the UTF-8 bytes of a string.
fn fnv1a(bytes: &[u8]) -> u64 {
    let mut hash = FNV_OFFSET_BASIS;
    for byte in bytes {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

impl Value {
    /// Derives the hash key for this value, or `None` if the kind is not
    /// hashable. Integers use their two's-complement bit pattern, booleans
    /// hash to 0/1 and strings to the FNV-1a of their bytes.
    pub fn hash_key(&self) -> Option<HashKey> {
        match self {
            Value::Int(val) => Some(HashKey {
                kind: HashKeyKind::Int,
                value: *val as u64,
            }),
            Value::Bool(val) => Some(HashKey {
                kind: HashKeyKind::Bool,
                value: u64::from(*val),
            }),
            Value::Object(obj) => match &obj.kind {
                ObjKind::Str(str) => Some(HashKey {
                    kind: HashKeyKind::Str,
                    value: fnv1a(str.as_bytes()),
                }),
                _ => None,
            },
            Value::Null => None,
        }
    }
}
