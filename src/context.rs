//! Compilation context: owns the tree under construction, the scope-id counter
//! and the symbol tables. One context per compilation.

use crate::ast::{Loc, NodeId, NodeKind, ScopeId, Tree};
use crate::symbols::{Binding, SymbolTables};

/// A fully built syntax tree together with the symbol tables filled while it was
/// built.
#[derive(Debug, Clone)]
pub struct Program {
    pub tree: Tree,
    pub symbols: SymbolTables,
    pub root: NodeId,
}

#[derive(Debug)]
pub struct Context {
    tree: Tree,
    symbols: SymbolTables,
    next_scope: u32,
    open_scopes: Vec<ScopeId>,
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

impl Context {
    pub fn new() -> Self {
        Self {
            tree: Tree::new(),
            symbols: SymbolTables::new(),
            next_scope: ScopeId::GLOBAL.0 + 1,
            open_scopes: vec![ScopeId::GLOBAL],
        }
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    pub fn symbols(&self) -> &SymbolTables {
        &self.symbols
    }

    /// Innermost open scope.
    pub fn current_scope(&self) -> ScopeId {
        self.open_scopes
            .last()
            .copied()
            .unwrap_or(ScopeId::GLOBAL)
    }

    /// Open a scope at `{`. Declarations allocated from now on land in it until the
    /// matching scope node is allocated.
    pub fn open_scope(&mut self) -> ScopeId {
        let id = ScopeId(self.next_scope);
        self.next_scope += 1;
        self.symbols.ensure_scope(id);
        self.open_scopes.push(id);
        id
    }

    fn close_scope(&mut self) -> ScopeId {
        if self.open_scopes.len() <= 1 {
            // Scope node without a preceding open_scope: give it a fresh id.
            self.open_scope();
        }
        self.open_scopes.pop().unwrap_or(ScopeId::GLOBAL)
    }

    /// Allocate a node, wire the parent link of each child and do the per-kind
    /// bookkeeping: scope nodes take and close the innermost open scope,
    /// declarations enter their binding into it.
    pub fn alloc(&mut self, kind: NodeKind, loc: Loc) -> NodeId {
        let mut kind = kind;
        if let NodeKind::Scope { id, .. } = &mut kind {
            *id = self.close_scope();
        }

        let declared = match &kind {
            NodeKind::Declaration {
                constant,
                ty,
                ident,
                ..
            } => self
                .tree
                .name(*ident)
                .map(|name| (name.to_string(), Binding::variable(self.tree.ty(*ty), *constant))),
            _ => None,
        };

        let children = kind.children();
        let id = self.tree.push(kind, loc);
        for child in children {
            self.tree.set_parent(child, id);
        }

        if let Some((name, binding)) = declared {
            let scope = self.current_scope();
            if !self.symbols.declare(scope, &name, binding) {
                if let NodeKind::Declaration { redeclared, .. } = self.tree.kind_mut(id) {
                    *redeclared = true;
                }
            }
        }

        id
    }

    pub fn finish(self, root: NodeId) -> Program {
        tracing::debug!(
            nodes = self.tree.len(),
            scopes = self.symbols.scope_count(),
            "built syntax tree"
        );
        Program {
            tree: self.tree,
            symbols: self.symbols,
            root,
        }
    }
}
