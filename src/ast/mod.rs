//! Arena-backed syntax tree.
//!
//! Nodes are stored in a [`Tree`] and addressed by [`NodeId`]. A node owns its
//! children through the handles in its [`NodeKind`]; the `parent` handle is a
//! back-reference for upward queries only. Nodes are only created through
//! [`crate::context::Context::alloc`], which wires parents and keeps scopes and
//! symbol tables consistent.

mod visit;

use std::cell::Cell;
use std::fmt;

use crate::typechecker::types::Type;

pub use visit::{visit, Visitor};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Identifier of a lexical scope. Scope 0 is the global scope holding the
/// pipeline built-ins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId(pub u32);

impl ScopeId {
    pub const GLOBAL: ScopeId = ScopeId(0);
    /// Placeholder carried by a scope node until the factory stamps the real id.
    pub const PENDING: ScopeId = ScopeId(u32::MAX);

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ScopeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Loc {
    pub line: usize,
    pub column: usize,
}

impl Loc {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Negate,
    Not,
}

impl UnaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            UnaryOp::Negate => "-",
            UnaryOp::Not => "!",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    And,
    Or,
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    Add,
    Subtract,
    Multiply,
    Divide,
    Power,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
            BinaryOp::Equal => "==",
            BinaryOp::NotEqual => "!=",
            BinaryOp::Less => "<",
            BinaryOp::LessEqual => "<=",
            BinaryOp::Greater => ">",
            BinaryOp::GreaterEqual => ">=",
            BinaryOp::Add => "+",
            BinaryOp::Subtract => "-",
            BinaryOp::Multiply => "*",
            BinaryOp::Divide => "/",
            BinaryOp::Power => "^",
        }
    }
}

/// The three built-in functions of the language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Builtin {
    /// Dot product of two 3- or 4-component float/int vectors.
    Dp3,
    /// Reciprocal square root of a scalar.
    Rsq,
    /// Lighting coefficients from a `vec4`.
    Lit,
}

impl Builtin {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "dp3" => Some(Builtin::Dp3),
            "rsq" => Some(Builtin::Rsq),
            "lit" => Some(Builtin::Lit),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Builtin::Dp3 => "dp3",
            Builtin::Rsq => "rsq",
            Builtin::Lit => "lit",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Scope {
        id: ScopeId,
        declarations: NodeId,
        statements: NodeId,
    },
    DeclarationList(Vec<NodeId>),
    Declaration {
        constant: bool,
        ty: NodeId,
        ident: NodeId,
        init: Option<NodeId>,
        /// Set by the factory when the scope already declared this name.
        redeclared: bool,
    },
    StatementList(Vec<NodeId>),
    If {
        condition: NodeId,
        then_branch: NodeId,
        else_branch: Option<NodeId>,
    },
    Assignment {
        target: NodeId,
        value: NodeId,
    },
    Unary {
        op: UnaryOp,
        operand: NodeId,
    },
    Binary {
        op: BinaryOp,
        lhs: NodeId,
        rhs: NodeId,
    },
    IntLiteral(i32),
    FloatLiteral(f32),
    BoolLiteral(bool),
    Identifier(String),
    Variable {
        ident: NodeId,
        /// An `IntLiteral` node selecting one component.
        index: Option<NodeId>,
    },
    FunctionCall {
        func: Builtin,
        args: Vec<NodeId>,
    },
    Constructor {
        ty: NodeId,
        args: Vec<NodeId>,
    },
    TypeSpecifier(Type),
    Argument(NodeId),
}

impl NodeKind {
    pub fn scope(declarations: NodeId, statements: NodeId) -> Self {
        NodeKind::Scope {
            id: ScopeId::PENDING,
            declarations,
            statements,
        }
    }

    pub fn declaration(constant: bool, ty: NodeId, ident: NodeId, init: Option<NodeId>) -> Self {
        NodeKind::Declaration {
            constant,
            ty,
            ident,
            init,
            redeclared: false,
        }
    }

    /// Children in traversal order.
    pub fn children(&self) -> Vec<NodeId> {
        match self {
            NodeKind::Scope {
                declarations,
                statements,
                ..
            } => vec![*declarations, *statements],
            NodeKind::DeclarationList(items) | NodeKind::StatementList(items) => items.clone(),
            NodeKind::Declaration {
                ty, ident, init, ..
            } => {
                let mut out = vec![*ident, *ty];
                out.extend(init.iter().copied());
                out
            }
            NodeKind::If {
                condition,
                then_branch,
                else_branch,
            } => {
                let mut out = vec![*condition, *then_branch];
                out.extend(else_branch.iter().copied());
                out
            }
            NodeKind::Assignment { target, value } => vec![*target, *value],
            NodeKind::Unary { operand, .. } => vec![*operand],
            NodeKind::Binary { lhs, rhs, .. } => vec![*lhs, *rhs],
            NodeKind::Variable { ident, index } => {
                let mut out = vec![*ident];
                out.extend(index.iter().copied());
                out
            }
            NodeKind::FunctionCall { args, .. } => args.clone(),
            NodeKind::Constructor { ty, args } => {
                let mut out = vec![*ty];
                out.extend(args.iter().copied());
                out
            }
            NodeKind::Argument(expr) => vec![*expr],
            NodeKind::IntLiteral(_)
            | NodeKind::FloatLiteral(_)
            | NodeKind::BoolLiteral(_)
            | NodeKind::Identifier(_)
            | NodeKind::TypeSpecifier(_) => Vec::new(),
        }
    }

    pub fn is_literal(&self) -> bool {
        matches!(
            self,
            NodeKind::IntLiteral(_) | NodeKind::FloatLiteral(_) | NodeKind::BoolLiteral(_)
        )
    }

    /// Expressions computed by an instruction sequence into their own register.
    pub fn is_compound(&self) -> bool {
        matches!(
            self,
            NodeKind::Unary { .. }
                | NodeKind::Binary { .. }
                | NodeKind::FunctionCall { .. }
                | NodeKind::Constructor { .. }
        )
    }
}

#[derive(Debug, Clone)]
pub struct Node {
    pub kind: NodeKind,
    pub loc: Loc,
    parent: Option<NodeId>,
    ty: Cell<Type>,
}

/// Which part of an `if` statement a node sits in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arm {
    Condition,
    Then,
    Else,
}

#[derive(Debug, Clone, Default)]
pub struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.index()].kind
    }

    pub fn loc(&self, id: NodeId) -> Loc {
        self.nodes[id.index()].loc
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.index()].parent
    }

    /// The type written by the checker, `Unknown` before checking.
    pub fn ty(&self, id: NodeId) -> Type {
        self.nodes[id.index()].ty.get()
    }

    pub fn set_ty(&self, id: NodeId, ty: Type) {
        self.nodes[id.index()].ty.set(ty);
    }

    pub fn ids(&self) -> impl Iterator<Item = NodeId> {
        (0..self.nodes.len() as u32).map(NodeId)
    }

    pub(crate) fn push(&mut self, kind: NodeKind, loc: Loc) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        let ty = match kind {
            NodeKind::IntLiteral(_) => Type::Int,
            NodeKind::FloatLiteral(_) => Type::Float,
            NodeKind::BoolLiteral(_) => Type::Bool,
            NodeKind::TypeSpecifier(ty) => ty,
            _ => Type::Unknown,
        };
        self.nodes.push(Node {
            kind,
            loc,
            parent: None,
            ty: Cell::new(ty),
        });
        id
    }

    pub(crate) fn kind_mut(&mut self, id: NodeId) -> &mut NodeKind {
        &mut self.nodes[id.index()].kind
    }

    pub(crate) fn set_parent(&mut self, child: NodeId, parent: NodeId) {
        self.nodes[child.index()].parent = Some(parent);
    }

    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        self.kind(id).children()
    }

    /// Name carried by an `Identifier` node, or by the identifier of a `Variable`
    /// or `Declaration` node.
    pub fn name(&self, id: NodeId) -> Option<&str> {
        match self.kind(id) {
            NodeKind::Identifier(name) => Some(name),
            NodeKind::Variable { ident, .. } | NodeKind::Declaration { ident, .. } => {
                self.name(*ident)
            }
            _ => None,
        }
    }

    /// Component selected by an indexed `Variable`, if any.
    pub fn index_of(&self, variable: NodeId) -> Option<i32> {
        match self.kind(variable) {
            NodeKind::Variable {
                index: Some(index), ..
            } => match self.kind(*index) {
                NodeKind::IntLiteral(value) => Some(*value),
                _ => None,
            },
            _ => None,
        }
    }

    /// Nearest `if` statement above `id`, with the part of it that contains `id`.
    pub fn enclosing_if(&self, id: NodeId) -> Option<(NodeId, Arm)> {
        let mut child = id;
        let mut current = self.parent(id);
        while let Some(parent) = current {
            if let NodeKind::If {
                condition,
                then_branch,
                ..
            } = self.kind(parent)
            {
                let arm = if child == *condition {
                    Arm::Condition
                } else if child == *then_branch {
                    Arm::Then
                } else {
                    Arm::Else
                };
                return Some((parent, arm));
            }
            child = parent;
            current = self.parent(parent);
        }
        None
    }

    /// Whether `id` is the target of an assignment.
    pub fn is_assignment_target(&self, id: NodeId) -> bool {
        match self.parent(id).map(|parent| self.kind(parent)) {
            Some(NodeKind::Assignment { target, .. }) => *target == id,
            _ => false,
        }
    }

    pub fn walk<V: Visitor + ?Sized>(&self, root: NodeId, visitor: &mut V) {
        visitor.pre(self, root);
        for child in self.children(root) {
            self.walk(child, visitor);
        }
        visitor.post(self, root);
    }
}
