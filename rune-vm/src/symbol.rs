//! Compile-time name resolution for globals, locals and free variables.

use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolScope {
    Global,
    Local,
    /// A local of an enclosing function, captured by the current one.
    Free,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Symbol {
    pub name: String,
    pub scope: SymbolScope,
    pub index: u16,
}

/// One lexical scope of name bindings. `outer` links towards the global
/// table; slot indexes are assigned densely per scope in definition order.
#[derive(Debug, Default)]
pub struct SymbolTable {
    outer: Option<Box<SymbolTable>>,
    store: HashMap<String, Symbol>,
    /// Symbols of enclosing functions that the current function captures,
    /// in capture order. Their indexes are the closure's free-variable slots.
    pub free_symbols: Vec<Symbol>,
    pub num_definitions: u16,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps `outer`, starting a fresh scope for a function body.
    pub fn new_enclosed(outer: SymbolTable) -> Self {
        Self {
            outer: Some(Box::new(outer)),
            ..Self::default()
        }
    }

    /// Hands back the enclosing table when a scope is left.
    pub fn into_outer(mut self) -> Option<SymbolTable> {
        self.outer.take().map(|outer| *outer)
    }

    /// Walks back to the outermost (global) table, discarding any scopes that
    /// were left open, e.g. after a failed compilation.
    pub fn unwind(mut self) -> SymbolTable {
        while let Some(outer) = self.outer.take() {
            self = *outer;
        }
        self
    }

    /// Defines `name` in this scope, assigning the next slot index.
    /// Redefining a name shadows the previous binding with a fresh slot.
    pub fn define(&mut self, name: &str) -> Symbol {
        let scope = if self.outer.is_none() {
            SymbolScope::Global
        } else {
            SymbolScope::Local
        };
        let symbol = Symbol {
            name: name.to_string(),
            scope,
            index: self.num_definitions,
        };
        self.num_definitions += 1;
        self.store.insert(name.to_string(), symbol.clone());
        symbol
    }

    fn define_free(&mut self, original: Symbol) -> Symbol {
        let symbol = Symbol {
            name: original.name.clone(),
            scope: SymbolScope::Free,
            index: self.free_symbols.len() as u16,
        };
        self.free_symbols.push(original);
        self.store.insert(symbol.name.clone(), symbol.clone());
        symbol
    }

    /// Resolves `name`, walking outwards through the enclosing scopes.
    /// A hit on an enclosing function's local (or free) slot is registered as
    /// a free variable of the current function and rewritten to `Free` scope.
    pub fn resolve(&mut self, name: &str) -> Option<Symbol> {
        if let Some(symbol) = self.store.get(name) {
            return Some(symbol.clone());
        }

        let outer = self.outer.as_mut()?;
        let symbol = outer.resolve(name)?;
        if symbol.scope == SymbolScope::Global {
            return Some(symbol);
        }
        Some(self.define_free(symbol))
    }
}
