//! Typing rules as pure functions of operand types.
//!
//! Every rule returns the result type together with the violations it found; an
//! `unknown` operand never produces a violation of its own.

use crate::ast::{BinaryOp, Builtin, UnaryOp};

use super::types::Type;

#[derive(Debug, Clone, PartialEq)]
pub struct Typing {
    pub ty: Type,
    pub violations: Vec<String>,
}

impl Typing {
    fn ok(ty: Type) -> Self {
        Self {
            ty,
            violations: Vec::new(),
        }
    }

    fn rejected(message: String) -> Self {
        Self {
            ty: Type::Unknown,
            violations: vec![message],
        }
    }

    pub fn is_ok(&self) -> bool {
        self.violations.is_empty()
    }
}

pub fn base_type(ty: Type) -> Type {
    ty.base()
}

pub fn unary_type(op: UnaryOp, operand: Type) -> Typing {
    if operand.is_unknown() {
        return Typing::ok(Type::Unknown);
    }

    match op {
        UnaryOp::Negate if operand.is_numeric() => Typing::ok(operand),
        UnaryOp::Not if operand.base() == Type::Bool => Typing::ok(operand),
        UnaryOp::Negate => Typing::rejected(format!(
            "operator '-' requires an int or float operand, found {}",
            operand
        )),
        UnaryOp::Not => Typing::rejected(format!(
            "operator '!' requires a bool operand, found {}",
            operand
        )),
    }
}

pub fn binary_type(op: BinaryOp, lhs: Type, rhs: Type) -> Typing {
    if lhs.is_unknown() || rhs.is_unknown() {
        return Typing::ok(Type::Unknown);
    }

    let symbol = op.symbol();
    if lhs.base() != rhs.base() {
        return Typing::rejected(format!(
            "operands of '{}' have mismatched base types {} and {}",
            symbol, lhs, rhs
        ));
    }

    let base = lhs.base();
    match op {
        BinaryOp::And | BinaryOp::Or => {
            if let Some(message) = require_identical(symbol, lhs, rhs) {
                Typing::rejected(message)
            } else if base != Type::Bool {
                Typing::rejected(format!(
                    "operator '{}' requires bool operands, found {}",
                    symbol, lhs
                ))
            } else {
                Typing::ok(lhs)
            }
        }
        BinaryOp::Add | BinaryOp::Subtract => {
            if let Some(message) = require_identical(symbol, lhs, rhs) {
                Typing::rejected(message)
            } else if let Some(message) = require_numeric(symbol, lhs) {
                Typing::rejected(message)
            } else {
                Typing::ok(lhs)
            }
        }
        BinaryOp::Divide | BinaryOp::Power => {
            if let Some(message) = require_identical(symbol, lhs, rhs) {
                Typing::rejected(message)
            } else if let Some(message) = require_scalar(symbol, lhs) {
                Typing::rejected(message)
            } else if let Some(message) = require_numeric(symbol, lhs) {
                Typing::rejected(message)
            } else {
                Typing::ok(lhs)
            }
        }
        BinaryOp::Multiply => {
            if let Some(message) = require_numeric(symbol, lhs) {
                return Typing::rejected(message);
            }
            match (lhs.is_vector(), rhs.is_vector()) {
                (true, true) if lhs != rhs => Typing::rejected(format!(
                    "operands of '*' must be vectors of the same size, found {} and {}",
                    lhs, rhs
                )),
                // Component-wise product of two vectors is typed as their base scalar.
                (true, true) => Typing::ok(base),
                (true, false) => Typing::ok(lhs),
                (false, true) => Typing::ok(rhs),
                (false, false) => Typing::ok(lhs),
            }
        }
        BinaryOp::Less | BinaryOp::LessEqual | BinaryOp::Greater | BinaryOp::GreaterEqual => {
            if let Some(message) = require_identical(symbol, lhs, rhs) {
                Typing::rejected(message)
            } else if let Some(message) = require_scalar(symbol, lhs) {
                Typing::rejected(message)
            } else if let Some(message) = require_numeric(symbol, lhs) {
                Typing::rejected(message)
            } else {
                Typing::ok(Type::Bool)
            }
        }
        BinaryOp::Equal | BinaryOp::NotEqual => {
            if let Some(message) = require_identical(symbol, lhs, rhs) {
                Typing::rejected(message)
            } else if let Some(message) = require_numeric(symbol, lhs) {
                Typing::rejected(message)
            } else {
                Typing::ok(Type::Bool)
            }
        }
    }
}

fn require_identical(symbol: &str, lhs: Type, rhs: Type) -> Option<String> {
    (lhs != rhs).then(|| {
        format!(
            "operands of '{}' must have identical types, found {} and {}",
            symbol, lhs, rhs
        )
    })
}

fn require_numeric(symbol: &str, operand: Type) -> Option<String> {
    (!operand.is_numeric()).then(|| {
        format!(
            "operator '{}' does not accept {} operands",
            symbol, operand
        )
    })
}

fn require_scalar(symbol: &str, operand: Type) -> Option<String> {
    operand.is_vector().then(|| {
        format!(
            "operator '{}' does not accept vector operands, found {}",
            symbol, operand
        )
    })
}

/// Result type of a built-in call. The return type is fixed by the function so
/// the enclosing expression keeps typing even when the arguments are wrong.
pub fn function_return_type(func: Builtin, args: &[Type]) -> Typing {
    let name = func.name();
    let (arity, ty) = match func {
        Builtin::Dp3 => {
            let ty = match args.first() {
                Some(first) if first.base() == Type::Int => Type::Int,
                _ => Type::Float,
            };
            (2, ty)
        }
        Builtin::Rsq => (1, Type::Float),
        Builtin::Lit => (1, Type::Vec4),
    };

    let mut violations = Vec::new();
    if args.len() != arity {
        violations.push(format!(
            "function '{}' expects {} argument{}, found {}",
            name,
            arity,
            if arity == 1 { "" } else { "s" },
            args.len()
        ));
    }

    for (position, arg) in args.iter().enumerate() {
        if arg.is_unknown() || accepts_argument(func, *arg) {
            continue;
        }
        violations.push(format!(
            "argument {} of '{}' must be {}, found {}",
            position + 1,
            name,
            expected_argument(func),
            arg
        ));
    }

    if let [lhs, rhs] = args {
        if func == Builtin::Dp3
            && accepts_argument(func, *lhs)
            && accepts_argument(func, *rhs)
            && lhs.base() != rhs.base()
        {
            violations.push(format!(
                "arguments of 'dp3' must come from one vector family, found {} and {}",
                lhs, rhs
            ));
        }
    }

    Typing { ty, violations }
}

fn accepts_argument(func: Builtin, arg: Type) -> bool {
    match func {
        Builtin::Dp3 => matches!(arg, Type::Vec3 | Type::Vec4 | Type::IVec3 | Type::IVec4),
        Builtin::Rsq => matches!(arg, Type::Int | Type::Float),
        Builtin::Lit => arg == Type::Vec4,
    }
}

fn expected_argument(func: Builtin) -> &'static str {
    match func {
        Builtin::Dp3 => "vec3, vec4, ivec3 or ivec4",
        Builtin::Rsq => "int or float",
        Builtin::Lit => "vec4",
    }
}

/// A constructor takes one argument of the base type per component. Its result is
/// always the requested type.
pub fn constructor_type(target: Type, args: &[Type]) -> Typing {
    let mut violations = Vec::new();
    let expected = target.dimension();
    if args.len() != expected {
        violations.push(format!(
            "constructor '{}' expects {} argument{}, found {}",
            target,
            expected,
            if expected == 1 { "" } else { "s" },
            args.len()
        ));
    }

    let base = target.base();
    for (position, arg) in args.iter().enumerate() {
        if !arg.is_unknown() && *arg != base {
            violations.push(format!(
                "argument {} of constructor '{}' must be {}, found {}",
                position + 1,
                target,
                base,
                arg
            ));
        }
    }

    Typing {
        ty: target,
        violations,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_operands_are_silent() {
        let typing = binary_type(BinaryOp::Add, Type::Unknown, Type::Bool);
        assert_eq!(typing, Typing::ok(Type::Unknown));
    }

    #[test]
    fn scalar_broadcast_keeps_the_vector_type() {
        assert_eq!(
            binary_type(BinaryOp::Multiply, Type::Float, Type::Vec3).ty,
            Type::Vec3
        );
        assert_eq!(
            binary_type(BinaryOp::Multiply, Type::IVec2, Type::Int).ty,
            Type::IVec2
        );
    }

    #[test]
    fn dp3_return_type_follows_the_argument_family() {
        let typing = function_return_type(Builtin::Dp3, &[Type::IVec4, Type::IVec4]);
        assert!(typing.is_ok());
        assert_eq!(typing.ty, Type::Int);
    }

    #[test]
    fn arity_and_argument_violations_are_independent() {
        let typing = function_return_type(Builtin::Lit, &[Type::Vec3, Type::Vec4]);
        assert_eq!(typing.ty, Type::Vec4);
        assert_eq!(typing.violations.len(), 2);
    }

    const BINARY_OPS: [BinaryOp; 13] = [
        BinaryOp::And,
        BinaryOp::Or,
        BinaryOp::Equal,
        BinaryOp::NotEqual,
        BinaryOp::Less,
        BinaryOp::LessEqual,
        BinaryOp::Greater,
        BinaryOp::GreaterEqual,
        BinaryOp::Add,
        BinaryOp::Subtract,
        BinaryOp::Multiply,
        BinaryOp::Divide,
        BinaryOp::Power,
    ];

    #[test]
    fn binary_types_by_operator_family() {
        use BinaryOp::*;
        use Type::*;

        // `None` marks a rejected combination.
        let table: &[(BinaryOp, Type, Type, Option<Type>)] = &[
            (And, Bool, Bool, Some(Bool)),
            (Or, BVec3, BVec3, Some(BVec3)),
            (And, Int, Int, None),
            (Or, Float, Float, None),
            (And, Bool, BVec2, None),
            (Add, Vec3, Vec3, Some(Vec3)),
            (Subtract, Int, Int, Some(Int)),
            (Add, Bool, Bool, None),
            (Add, Vec2, Vec3, None),
            (Add, Int, Float, None),
            (Multiply, Vec4, Vec4, Some(Float)),
            (Multiply, IVec3, IVec3, Some(Int)),
            (Multiply, Vec2, Vec3, None),
            (Multiply, BVec2, BVec2, None),
            (Divide, Float, Float, Some(Float)),
            (Divide, Vec2, Vec2, None),
            (Power, Int, Int, Some(Int)),
            (Power, Vec4, Vec4, None),
            (Power, Bool, Bool, None),
            (Less, Float, Float, Some(Bool)),
            (LessEqual, Int, Int, Some(Bool)),
            (Greater, Vec3, Vec3, None),
            (GreaterEqual, Bool, Bool, None),
            (Less, Int, Float, None),
            (Equal, Vec2, Vec2, Some(Bool)),
            (NotEqual, IVec4, IVec4, Some(Bool)),
            (Equal, Bool, Bool, None),
            (NotEqual, BVec2, BVec2, None),
            (Equal, Vec2, Vec3, None),
        ];

        for &(op, lhs, rhs, expected) in table {
            let typing = binary_type(op, lhs, rhs);
            let case = format!("{} {} {}", lhs, op.symbol(), rhs);
            match expected {
                Some(ty) => assert_eq!(typing, Typing::ok(ty), "{}", case),
                None => {
                    assert_eq!(typing.ty, Unknown, "{}", case);
                    assert_eq!(typing.violations.len(), 1, "{}", case);
                }
            }
        }
    }

    #[test]
    fn binary_type_depends_only_on_operands_and_operator() {
        for op in BINARY_OPS {
            for lhs in Type::ALL {
                for rhs in Type::ALL {
                    assert_eq!(binary_type(op, lhs, rhs), binary_type(op, lhs, rhs));
                }
            }
        }
    }

    #[test]
    fn unary_operators_check_their_operand_family() {
        assert_eq!(unary_type(UnaryOp::Not, Type::BVec2), Typing::ok(Type::BVec2));
        assert!(!unary_type(UnaryOp::Not, Type::Int).is_ok());
        assert!(!unary_type(UnaryOp::Not, Type::Vec3).is_ok());
        assert_eq!(unary_type(UnaryOp::Negate, Type::IVec3), Typing::ok(Type::IVec3));
        assert!(!unary_type(UnaryOp::Negate, Type::Bool).is_ok());
    }

    #[test]
    fn dp3_rejects_mixed_vector_families() {
        let typing = function_return_type(Builtin::Dp3, &[Type::Vec3, Type::IVec3]);
        assert_eq!(typing.ty, Type::Float);
        assert_eq!(
            typing.violations,
            vec!["arguments of 'dp3' must come from one vector family, found vec3 and ivec3"]
        );
    }

    #[test]
    fn constructor_reports_each_mistyped_argument() {
        let typing = constructor_type(Type::Vec3, &[Type::Float, Type::Int, Type::Bool]);
        assert_eq!(typing.ty, Type::Vec3);
        assert_eq!(
            typing.violations,
            vec![
                "argument 2 of constructor 'vec3' must be float, found int",
                "argument 3 of constructor 'vec3' must be float, found bool",
            ]
        );
    }
}
