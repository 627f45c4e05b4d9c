//! Symbol Table
//!
//! Handles scoping and symbol lookups. Scopes live in an arena and link to
//! their parent, so the full chain stays available to the code generator
//! after checking finishes.

use rustc_hash::FxHashMap as HashMap;

use super::types::Type;
use crate::ast::Span;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    Type,
    Func,
    Global,
    /// Compile-time constant
    Def,
    Local,
    Param,
    /// Named return slot
    Return,
}

#[derive(Debug, Clone)]
pub struct SymbolInfo {
    pub name: String,
    pub kind: SymbolKind,
    pub ty: Type,
    pub mutable: bool,
    /// Where the symbol was declared
    pub span: Span,
}

/// Index of a scope in the table's arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(usize);

impl ScopeId {
    pub const ROOT: ScopeId = ScopeId(0);
}

#[derive(Debug, Clone, Default)]
pub struct Scope {
    pub parent: Option<ScopeId>,
    /// Function owning this scope, `None` at module level
    pub owner: Option<String>,
    symbols: HashMap<String, SymbolInfo>,
}

impl Scope {
    pub fn get(&self, name: &str) -> Option<&SymbolInfo> {
        self.symbols.get(name)
    }
}

#[derive(Debug, Clone)]
pub struct SymbolTable {
    scopes: Vec<Scope>,
    current: ScopeId,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self {
            scopes: vec![Scope::default()],
            current: ScopeId::ROOT,
        }
    }

    pub fn current(&self) -> ScopeId {
        self.current
    }

    pub fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.0]
    }

    /// Open a child of the current scope and make it current
    pub fn enter_scope(&mut self, owner: Option<String>) -> ScopeId {
        let owner = owner.or_else(|| self.scope(self.current).owner.clone());
        let id = ScopeId(self.scopes.len());
        self.scopes.push(Scope {
            parent: Some(self.current),
            owner,
            symbols: HashMap::default(),
        });
        self.current = id;
        id
    }

    pub fn exit_scope(&mut self) {
        if let Some(parent) = self.scope(self.current).parent {
            self.current = parent;
        }
    }

    /// Insert into the current scope. Returns the previous symbol if the
    /// name was already bound there.
    pub fn insert(&mut self, info: SymbolInfo) -> Option<SymbolInfo> {
        let scope = &mut self.scopes[self.current.0];
        scope.symbols.insert(info.name.clone(), info)
    }

    pub fn lookup(&self, name: &str) -> Option<&SymbolInfo> {
        self.lookup_from(self.current, name)
    }

    /// Resolve `name` starting at `scope` and walking parent links
    pub fn lookup_from(&self, scope: ScopeId, name: &str) -> Option<&SymbolInfo> {
        let mut id = Some(scope);
        while let Some(current) = id {
            let scope = self.scope(current);
            if let Some(info) = scope.get(name) {
                return Some(info);
            }
            id = scope.parent;
        }
        None
    }

    /// Check if a symbol exists in the current (innermost) scope
    pub fn defined_in_current_scope(&self, name: &str) -> bool {
        self.scope(self.current).symbols.contains_key(name)
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}
