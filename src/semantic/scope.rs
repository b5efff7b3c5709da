//! Scope frames stored in an arena with parent links.
//!
//! Frames are never freed: after `exit` the frame stays in the arena so the
//! full symbol list can still be reported. Frame ids are handed out in
//! entering order, which lets a later pass replay the same `enter`/`exit`
//! sequence and land on identical ids.

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;

use super::types::Type;
use crate::parser::ast::TypeName;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ScopeId(pub usize);

impl ScopeId {
    pub const GLOBAL: ScopeId = ScopeId(0);
}

impl fmt::Display for ScopeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SymbolType {
    Int,
    Float,
    Bool,
    String,
    Function,
}

impl From<TypeName> for SymbolType {
    fn from(name: TypeName) -> Self {
        match name {
            TypeName::Int => SymbolType::Int,
            TypeName::Float => SymbolType::Float,
            TypeName::Bool => SymbolType::Bool,
            TypeName::String => SymbolType::String,
        }
    }
}

impl fmt::Display for SymbolType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SymbolType::Int => "int",
            SymbolType::Float => "float",
            SymbolType::Bool => "bool",
            SymbolType::String => "string",
            SymbolType::Function => "function",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Signature {
    pub params: Vec<Type>,
    pub return_type: Type,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Symbol {
    pub name: String,
    pub ty: SymbolType,
    pub scope: ScopeId,
    pub scope_label: String,
    pub line: usize,
    pub column: usize,
    /// Literal initializer for variables, return type for functions.
    pub value: Option<String>,
    /// Unique storage cell name. Shadowing declarations get `name.N`.
    pub storage: String,
    /// Function whose frame owns this variable; `None` for top-level ones.
    pub function: Option<String>,
    pub signature: Option<Signature>,
}

impl Symbol {
    pub fn new(name: impl Into<String>, ty: SymbolType, line: usize, column: usize) -> Self {
        Self {
            name: name.into(),
            ty,
            scope: ScopeId::GLOBAL,
            scope_label: String::new(),
            line,
            column,
            value: None,
            storage: String::new(),
            function: None,
            signature: None,
        }
    }

    /// Type of the symbol when used as a value.
    pub fn value_type(&self) -> Type {
        match self.ty {
            SymbolType::Int => Type::Int,
            SymbolType::Float => Type::Float,
            SymbolType::Bool => Type::Bool,
            SymbolType::String => Type::String,
            SymbolType::Function => Type::Unknown,
        }
    }
}

#[derive(Debug, Clone)]
struct Frame {
    parent: Option<ScopeId>,
    depth: usize,
    names: HashMap<String, usize>,
}

#[derive(Debug, Clone)]
pub struct ScopeArena {
    frames: Vec<Frame>,
    current: ScopeId,
    symbols: Vec<Symbol>,
    declarations: HashMap<String, usize>,
}

impl Default for ScopeArena {
    fn default() -> Self {
        Self::new()
    }
}

impl ScopeArena {
    pub fn new() -> Self {
        Self {
            frames: vec![Frame {
                parent: None,
                depth: 0,
                names: HashMap::new(),
            }],
            current: ScopeId::GLOBAL,
            symbols: Vec::new(),
            declarations: HashMap::new(),
        }
    }

    pub fn enter(&mut self) -> ScopeId {
        let id = ScopeId(self.frames.len());
        let depth = self.depth() + 1;
        self.frames.push(Frame {
            parent: Some(self.current),
            depth,
            names: HashMap::new(),
        });
        self.current = id;
        id
    }

    /// Returns to the parent frame. Exiting the global frame does nothing.
    pub fn exit(&mut self) {
        if let Some(parent) = self.frames[self.current.0].parent {
            self.current = parent;
        }
    }

    pub fn current(&self) -> ScopeId {
        self.current
    }

    pub fn depth(&self) -> usize {
        self.frames[self.current.0].depth
    }

    pub fn label(&self, scope: ScopeId) -> String {
        match self.frames.get(scope.0).map(|frame| frame.depth) {
            Some(0) | None => "global".to_string(),
            Some(depth) => format!("level_{}", depth),
        }
    }

    /// Declares `symbol` in the current frame (or the global frame when
    /// `global` is set). Scope fields are overwritten; an empty `storage`
    /// is filled with a unique storage name. On a clash the symbol already
    /// in that frame is returned.
    pub fn insert(&mut self, symbol: Symbol) -> Result<&Symbol, &Symbol> {
        self.insert_into(self.current, symbol)
    }

    pub fn insert_global(&mut self, symbol: Symbol) -> Result<&Symbol, &Symbol> {
        self.insert_into(ScopeId::GLOBAL, symbol)
    }

    fn insert_into(&mut self, scope: ScopeId, mut symbol: Symbol) -> Result<&Symbol, &Symbol> {
        if let Some(&existing) = self.frames[scope.0].names.get(&symbol.name) {
            return Err(&self.symbols[existing]);
        }

        symbol.scope = scope;
        symbol.scope_label = self.label(scope);
        if symbol.storage.is_empty() {
            let seen = self.declarations.entry(symbol.name.clone()).or_insert(0);
            symbol.storage = if *seen == 0 {
                symbol.name.clone()
            } else {
                format!("{}.{}", symbol.name, seen)
            };
            *seen += 1;
        }

        let index = self.symbols.len();
        self.frames[scope.0].names.insert(symbol.name.clone(), index);
        self.symbols.push(symbol);
        Ok(&self.symbols[index])
    }

    /// Innermost visible declaration of `name`.
    pub fn lookup(&self, name: &str) -> Option<&Symbol> {
        let mut scope = Some(self.current);
        while let Some(id) = scope {
            let frame = &self.frames[id.0];
            if let Some(&index) = frame.names.get(name) {
                return Some(&self.symbols[index]);
            }
            scope = frame.parent;
        }
        None
    }

    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    pub fn into_symbols(self) -> Vec<Symbol> {
        self.symbols
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exiting_the_global_frame_is_a_no_op() {
        let mut arena = ScopeArena::new();
        arena.exit();
        arena.exit();
        assert_eq!(arena.current(), ScopeId::GLOBAL);
        assert_eq!(arena.depth(), 0);
    }

    #[test]
    fn shadowing_gets_distinct_storage() {
        let mut arena = ScopeArena::new();
        arena
            .insert(Symbol::new("a", SymbolType::Int, 1, 1))
            .expect("outer a");
        arena.enter();
        let inner = arena
            .insert(Symbol::new("a", SymbolType::Float, 2, 1))
            .expect("inner a");
        assert_eq!(inner.storage, "a.1");
        assert_eq!(inner.scope_label, "level_1");
        assert_eq!(arena.lookup("a").map(|s| s.ty), Some(SymbolType::Float));
        arena.exit();
        assert_eq!(arena.lookup("a").map(|s| s.ty), Some(SymbolType::Int));
    }

    #[test]
    fn redeclaration_in_same_frame_returns_existing() {
        let mut arena = ScopeArena::new();
        arena
            .insert(Symbol::new("a", SymbolType::Int, 1, 1))
            .expect("first a");
        let existing = arena
            .insert(Symbol::new("a", SymbolType::Int, 2, 1))
            .expect_err("duplicate");
        assert_eq!(existing.line, 1);
        assert_eq!(arena.symbols().len(), 1);
    }
}
