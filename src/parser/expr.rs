use crate::ast::{BinaryOp, Loc, NodeId, NodeKind, UnaryOp};
use crate::lexer::token::TokenKind;

use super::{ParseError, Parser};

impl Parser {
    pub(crate) fn expression(&mut self) -> Result<NodeId, ParseError> {
        self.logical_or()
    }

    fn logical_or(&mut self) -> Result<NodeId, ParseError> {
        let mut expr = self.logical_and()?;

        loop {
            let loc = self.loc();
            if !self.matches_symbol(TokenKind::OrOr) {
                break;
            }
            let rhs = self.logical_and()?;
            expr = self.binary(BinaryOp::Or, expr, rhs, loc);
        }

        Ok(expr)
    }

    fn logical_and(&mut self) -> Result<NodeId, ParseError> {
        let mut expr = self.comparison()?;

        loop {
            let loc = self.loc();
            if !self.matches_symbol(TokenKind::AndAnd) {
                break;
            }
            let rhs = self.comparison()?;
            expr = self.binary(BinaryOp::And, expr, rhs, loc);
        }

        Ok(expr)
    }

    fn comparison(&mut self) -> Result<NodeId, ParseError> {
        let lhs = self.term()?;

        let loc = self.loc();
        let Some(op) = self.comparison_operator() else {
            return Ok(lhs);
        };
        let rhs = self.term()?;
        if self.comparison_operator().is_some() {
            return Err(ParseError::new(
                "comparison operators cannot be chained",
                self.previous(),
            ));
        }

        Ok(self.binary(op, lhs, rhs, loc))
    }

    fn comparison_operator(&mut self) -> Option<BinaryOp> {
        let op = match self.peek_kind() {
            TokenKind::EqualEqual => BinaryOp::Equal,
            TokenKind::BangEqual => BinaryOp::NotEqual,
            TokenKind::Less => BinaryOp::Less,
            TokenKind::LessEqual => BinaryOp::LessEqual,
            TokenKind::Greater => BinaryOp::Greater,
            TokenKind::GreaterEqual => BinaryOp::GreaterEqual,
            _ => return None,
        };
        self.advance();
        Some(op)
    }

    fn term(&mut self) -> Result<NodeId, ParseError> {
        let mut expr = self.factor()?;

        loop {
            let loc = self.loc();
            let op = if self.matches_symbol(TokenKind::Plus) {
                BinaryOp::Add
            } else if self.matches_symbol(TokenKind::Minus) {
                BinaryOp::Subtract
            } else {
                break;
            };
            let rhs = self.factor()?;
            expr = self.binary(op, expr, rhs, loc);
        }

        Ok(expr)
    }

    fn factor(&mut self) -> Result<NodeId, ParseError> {
        let mut expr = self.unary()?;

        loop {
            let loc = self.loc();
            let op = if self.matches_symbol(TokenKind::Star) {
                BinaryOp::Multiply
            } else if self.matches_symbol(TokenKind::Slash) {
                BinaryOp::Divide
            } else {
                break;
            };
            let rhs = self.unary()?;
            expr = self.binary(op, expr, rhs, loc);
        }

        Ok(expr)
    }

    fn unary(&mut self) -> Result<NodeId, ParseError> {
        let loc = self.loc();
        let op = if self.matches_symbol(TokenKind::Bang) {
            UnaryOp::Not
        } else if self.matches_symbol(TokenKind::Minus) {
            UnaryOp::Negate
        } else {
            return self.power();
        };

        let operand = self.unary()?;
        Ok(self.alloc(NodeKind::Unary { op, operand }, loc))
    }

    /// `^` binds tighter than unary operators and associates to the right.
    fn power(&mut self) -> Result<NodeId, ParseError> {
        let base = self.primary()?;

        let loc = self.loc();
        if !self.matches_symbol(TokenKind::Caret) {
            return Ok(base);
        }
        let exponent = self.unary()?;
        Ok(self.binary(BinaryOp::Power, base, exponent, loc))
    }

    fn primary(&mut self) -> Result<NodeId, ParseError> {
        let loc = self.loc();
        match self.peek_kind().clone() {
            TokenKind::Int(value) => {
                self.advance();
                Ok(self.alloc(NodeKind::IntLiteral(value), loc))
            }
            TokenKind::Float(value) => {
                self.advance();
                Ok(self.alloc(NodeKind::FloatLiteral(value), loc))
            }
            TokenKind::True => {
                self.advance();
                Ok(self.alloc(NodeKind::BoolLiteral(true), loc))
            }
            TokenKind::False => {
                self.advance();
                Ok(self.alloc(NodeKind::BoolLiteral(false), loc))
            }
            TokenKind::Identifier(_) => self.variable(),
            TokenKind::TypeName(ty) => {
                self.advance();
                let ty = self.alloc(NodeKind::TypeSpecifier(ty), loc);
                let args = self.arguments("constructor")?;
                Ok(self.alloc(NodeKind::Constructor { ty, args }, loc))
            }
            TokenKind::Function(func) => {
                self.advance();
                let args = self.arguments(func.name())?;
                Ok(self.alloc(NodeKind::FunctionCall { func, args }, loc))
            }
            TokenKind::LeftParen => {
                self.advance();
                let expr = self.expression()?;
                self.consume_symbol(TokenKind::RightParen, "expected ')' after expression")?;
                Ok(expr)
            }
            _ => Err(ParseError::new("expected expression", self.peek())),
        }
    }

    /// Parenthesised, comma-separated arguments, each wrapped in an `Argument` node.
    fn arguments(&mut self, callee: &str) -> Result<Vec<NodeId>, ParseError> {
        self.consume_symbol(
            TokenKind::LeftParen,
            &format!("expected '(' after {}", callee),
        )?;

        let mut args = Vec::new();
        if !self.check_kind(&TokenKind::RightParen) {
            loop {
                let loc = self.loc();
                let expr = self.expression()?;
                args.push(self.alloc(NodeKind::Argument(expr), loc));
                if !self.matches_symbol(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.consume_symbol(TokenKind::RightParen, "expected ')' after arguments")?;

        Ok(args)
    }

    fn binary(&mut self, op: BinaryOp, lhs: NodeId, rhs: NodeId, loc: Loc) -> NodeId {
        self.alloc(NodeKind::Binary { op, lhs, rhs }, loc)
    }
}
