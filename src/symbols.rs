use std::collections::{HashMap, HashSet};

use crate::ast::ScopeId;
use crate::typechecker::types::Type;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    ReadWrite,
    ReadOnly,
    WriteOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Binding {
    pub ty: Type,
    pub constant: bool,
    pub access: Access,
}

impl Binding {
    pub fn variable(ty: Type, constant: bool) -> Self {
        Self {
            ty,
            constant,
            access: Access::ReadWrite,
        }
    }

    /// Placeholder for a name no open scope declares.
    pub fn unresolved() -> Self {
        Self::variable(Type::Unknown, false)
    }

    pub fn is_unresolved(&self) -> bool {
        self.ty.is_unknown()
    }
}

/// A name the fragment pipeline provides in the global scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineVariable {
    pub name: &'static str,
    pub ty: Type,
    pub access: Access,
    pub constant: bool,
}

const fn pipeline(name: &'static str, ty: Type, access: Access, constant: bool) -> PipelineVariable {
    PipelineVariable {
        name,
        ty,
        access,
        constant,
    }
}

pub const PIPELINE_VARIABLES: [PipelineVariable; 13] = [
    pipeline("gl_FragColor", Type::Vec4, Access::WriteOnly, false),
    pipeline("gl_FragDepth", Type::Bool, Access::WriteOnly, false),
    // `fragment.position` is an input binding in ARB, so the shader reads it.
    pipeline("gl_FragCoord", Type::Vec4, Access::ReadOnly, false),
    pipeline("gl_TexCoord", Type::Vec4, Access::ReadOnly, false),
    pipeline("gl_Color", Type::Vec4, Access::ReadOnly, false),
    pipeline("gl_Secondary", Type::Vec4, Access::ReadOnly, false),
    pipeline("gl_FogFragCoord", Type::Vec4, Access::ReadOnly, false),
    pipeline("gl_Light_Half", Type::Vec4, Access::ReadOnly, true),
    pipeline("gl_Light_Ambient", Type::Vec4, Access::ReadOnly, true),
    pipeline("gl_Material_Shininess", Type::Vec4, Access::ReadOnly, true),
    pipeline("env1", Type::Vec4, Access::ReadOnly, true),
    pipeline("env2", Type::Vec4, Access::ReadOnly, true),
    pipeline("env3", Type::Vec4, Access::ReadOnly, true),
];

pub fn is_pipeline_variable(name: &str) -> bool {
    PIPELINE_VARIABLES.iter().any(|var| var.name == name)
}

/// One table per scope id. Tables are only ever appended; scope 0 holds the
/// pipeline variables.
#[derive(Debug, Clone)]
pub struct SymbolTables {
    scopes: Vec<HashMap<String, Binding>>,
}

impl Default for SymbolTables {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolTables {
    pub fn new() -> Self {
        let global = PIPELINE_VARIABLES
            .iter()
            .map(|var| {
                (
                    var.name.to_string(),
                    Binding {
                        ty: var.ty,
                        constant: var.constant,
                        access: var.access,
                    },
                )
            })
            .collect();
        Self {
            scopes: vec![global],
        }
    }

    pub fn scope_count(&self) -> usize {
        self.scopes.len()
    }

    pub(crate) fn ensure_scope(&mut self, scope: ScopeId) {
        while self.scopes.len() <= scope.index() {
            self.scopes.push(HashMap::new());
        }
    }

    /// Insert a binding unless `scope` already declares `name`. Returns whether the
    /// binding was inserted.
    pub fn declare(&mut self, scope: ScopeId, name: &str, binding: Binding) -> bool {
        self.ensure_scope(scope);
        let table = &mut self.scopes[scope.index()];
        if table.contains_key(name) {
            return false;
        }
        table.insert(name.to_string(), binding);
        true
    }

    /// The binding `scope` itself holds for `name`.
    pub fn get(&self, scope: ScopeId, name: &str) -> Option<&Binding> {
        self.scopes.get(scope.index())?.get(name)
    }

    /// Search `stack` innermost first without materialising missing names.
    pub fn lookup(&self, stack: &[ScopeId], name: &str) -> Option<(ScopeId, Binding)> {
        stack
            .iter()
            .rev()
            .find_map(|scope| self.get(*scope, name).map(|binding| (*scope, *binding)))
    }

    /// Search `stack` innermost first. A name nobody declares is recorded as
    /// `unknown` in the innermost scope so later uses resolve to the same binding.
    pub fn resolve(&mut self, stack: &[ScopeId], name: &str) -> Binding {
        if let Some((_, binding)) = self.lookup(stack, name) {
            return binding;
        }

        let innermost = stack.last().copied().unwrap_or(ScopeId::GLOBAL);
        let binding = Binding::unresolved();
        self.declare(innermost, name, binding);
        tracing::trace!(name, scope = %innermost, "materialised unresolved name");
        binding
    }
}

/// The scopes open at one point of a walk over a built tree. The tables already
/// hold every declaration of a scope; a local name only becomes visible here once
/// the walk has passed its declaration. Pipeline variables are always visible.
#[derive(Debug, Clone)]
pub struct ScopeStack {
    frames: Vec<(ScopeId, HashSet<String>)>,
}

impl Default for ScopeStack {
    fn default() -> Self {
        Self::new()
    }
}

impl ScopeStack {
    pub fn new() -> Self {
        Self {
            frames: vec![(ScopeId::GLOBAL, HashSet::new())],
        }
    }

    pub fn push(&mut self, scope: ScopeId) {
        self.frames.push((scope, HashSet::new()));
    }

    pub fn pop(&mut self) {
        if self.frames.len() > 1 {
            self.frames.pop();
        }
    }

    pub fn innermost(&self) -> ScopeId {
        self.frames
            .last()
            .map(|(scope, _)| *scope)
            .unwrap_or(ScopeId::GLOBAL)
    }

    /// Make `name` visible in the innermost scope from here on.
    pub fn declare(&mut self, name: &str) {
        if let Some((_, seen)) = self.frames.last_mut() {
            seen.insert(name.to_string());
        }
    }

    /// Innermost visible binding of `name`.
    pub fn lookup(&self, tables: &SymbolTables, name: &str) -> Option<(ScopeId, Binding)> {
        self.frames.iter().rev().find_map(|(scope, seen)| {
            if *scope != ScopeId::GLOBAL && !seen.contains(name) {
                return None;
            }
            tables.get(*scope, name).map(|binding| (*scope, *binding))
        })
    }

    /// Like [`SymbolTables::resolve`], restricted to visible names. A name with no
    /// visible binding resolves to `unknown`, also when its declaration comes later.
    pub fn resolve(&mut self, tables: &mut SymbolTables, name: &str) -> Binding {
        if let Some((_, binding)) = self.lookup(tables, name) {
            return binding;
        }

        let innermost = self.innermost();
        let binding = Binding::unresolved();
        if tables.declare(innermost, name, binding) {
            tracing::trace!(name, scope = %innermost, "materialised unresolved name");
            self.declare(name);
        }
        binding
    }
}
