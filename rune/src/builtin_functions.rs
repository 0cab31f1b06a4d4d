use rune_value::object::{Obj, ObjKind};
use rune_value::{BuiltinVars, Value};
use std::rc::Rc;

/// Returns the default [`BuiltinVars`] that should be used.
pub fn default_builtin_vars() -> BuiltinVars {
    let mut builtin_vars = BuiltinVars::new();
    builtin_vars.add_native_fn("len", &len);
    builtin_vars.add_native_fn("first", &first);
    builtin_vars.add_native_fn("last", &last);
    builtin_vars.add_native_fn("rest", &rest);
    builtin_vars.add_native_fn("push", &push);
    builtin_vars.add_native_fn("puts", &puts);
    builtin_vars
}

/// A misused built-in returns an error *value* through the stack; it never
/// aborts the machine.
fn error(message: String) -> Value {
    Value::Object(Rc::new(Obj::new_error(message)))
}

fn wrong_arity(got: usize, want: usize) -> Value {
    error(format!(
        "wrong number of arguments. got={}, want={}",
        got, want
    ))
}

/// Casts the argument to its array elements, if it is an array.
fn as_array(arg: &Value) -> Option<&Vec<Value>> {
    match arg {
        Value::Object(obj) => match &obj.kind {
            ObjKind::Array(elements) => Some(elements),
            _ => None,
        },
        _ => None,
    }
}

pub fn len(args: &mut [Value]) -> Value {
    if args.len() != 1 {
        return wrong_arity(args.len(), 1);
    }
    match &args[0] {
        Value::Object(obj) => match &obj.kind {
            ObjKind::Str(str) => Value::Int(str.len() as i64),
            ObjKind::Array(elements) => Value::Int(elements.len() as i64),
            _ => error(format!(
                "argument to len not supported, got {}",
                args[0].type_name()
            )),
        },
        _ => error(format!(
            "argument to len not supported, got {}",
            args[0].type_name()
        )),
    }
}

pub fn first(args: &mut [Value]) -> Value {
    if args.len() != 1 {
        return wrong_arity(args.len(), 1);
    }
    match as_array(&args[0]) {
        Some(elements) => elements.first().cloned().unwrap_or(Value::Null),
        None => error(format!(
            "argument to first must be an array, got {}",
            args[0].type_name()
        )),
    }
}

pub fn last(args: &mut [Value]) -> Value {
    if args.len() != 1 {
        return wrong_arity(args.len(), 1);
    }
    match as_array(&args[0]) {
        Some(elements) => elements.last().cloned().unwrap_or(Value::Null),
        None => error(format!(
            "argument to last must be an array, got {}",
            args[0].type_name()
        )),
    }
}

/// Returns a new array of all but the first element, or null for `[]`.
pub fn rest(args: &mut [Value]) -> Value {
    if args.len() != 1 {
        return wrong_arity(args.len(), 1);
    }
    match as_array(&args[0]) {
        Some(elements) => {
            if elements.is_empty() {
                Value::Null
            } else {
                Value::Object(Rc::new(Obj::new_array(elements[1..].to_vec())))
            }
        }
        None => error(format!(
            "argument to rest must be an array, got {}",
            args[0].type_name()
        )),
    }
}

/// Returns a new array with the element appended; the source array is shared,
/// never mutated.
pub fn push(args: &mut [Value]) -> Value {
    if args.len() != 2 {
        return wrong_arity(args.len(), 2);
    }
    match as_array(&args[0]) {
        Some(elements) => {
            let mut elements = elements.clone();
            elements.push(args[1].clone());
            Value::Object(Rc::new(Obj::new_array(elements)))
        }
        None => error(format!(
            "argument to push must be an array, got {}",
            args[0].type_name()
        )),
    }
}

/// Prints each argument's display form on its own line. Returns null.
pub fn puts(args: &mut [Value]) -> Value {
    for arg in args.iter() {
        println!("{}", arg);
    }
    Value::Null
}
