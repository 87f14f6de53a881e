use super::types::Type;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    Variable,
    Function,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    pub name: String,
    pub kind: SymbolKind,
    /// Declared type for variables, return type for functions.
    pub ty: Type,
    pub line: u32,
}

/// Stack of lexical scopes. The outermost (global) scope is always present.
#[derive(Debug, Clone)]
pub struct SymbolTable {
    /// Innermost scope last.
    scopes: Vec<HashMap<String, Symbol>>,
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolTable {
    pub fn new() -> Self {
        Self {
            scopes: vec![HashMap::new()],
        }
    }

    /// Number of open scopes, global included.
    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    /// Enter a nested scope
    pub fn push_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    /// Leave the innermost scope, discarding its symbols.
    pub fn pop_scope(&mut self) {
        debug_assert!(self.scopes.len() > 1, "global scope cannot be popped");
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
    }

    /// Declare a symbol in the innermost scope.
    ///
    /// Fails with the existing symbol if the name is already bound in that
    /// same scope. Bindings in outer scopes are shadowed, not reported.
    pub fn declare(&mut self, symbol: Symbol) -> Result<(), Symbol> {
        if let Some(existing) = self.lookup_innermost(&symbol.name) {
            return Err(existing.clone());
        }
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(symbol.name.clone(), symbol);
        }
        Ok(())
    }

    /// Lookup through the scope chain, innermost first.
    pub fn lookup(&self, name: &str) -> Option<&Symbol> {
        self.scopes.iter().rev().find_map(|scope| scope.get(name))
    }

    /// Lookup only in the innermost scope
    pub fn lookup_innermost(&self, name: &str) -> Option<&Symbol> {
        self.scopes.last().and_then(|scope| scope.get(name))
    }
}
