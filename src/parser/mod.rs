mod expr;

use std::mem;

use thiserror::Error;

use crate::ast::{Loc, NodeId, NodeKind};
use crate::context::{Context, Program};
use crate::errors::FrontendError;
use crate::lexer::token::{Token, TokenKind};

#[derive(Debug, Clone, PartialEq, Error)]
#[error("parse error at line {line}, column {column}: {message}")]
pub struct ParseError {
    pub message: String,
    pub line: usize,
    pub column: usize,
}

impl ParseError {
    fn new(message: impl Into<String>, token: &Token) -> Self {
        Self {
            message: message.into(),
            line: token.line,
            column: token.column,
        }
    }
}

/// Lex and parse a whole shader into a [`Program`].
pub fn parse(source: &str) -> Result<Program, FrontendError> {
    let tokens = crate::lexer::lex(source)?;
    let program = Parser::new(tokens).parse_program()?;
    Ok(program)
}

/// Recursive-descent parser. Every node goes through the context's factory so the
/// scope ids and symbol tables are consistent when parsing finishes.
pub struct Parser {
    tokens: Vec<Token>,
    current: usize,
    ctx: Context,
}

impl Parser {
    pub fn new(mut tokens: Vec<Token>) -> Self {
        if !matches!(tokens.last(), Some(token) if token.kind == TokenKind::Eof) {
            let (line, column) = tokens
                .last()
                .map_or((1, 1), |token| (token.line, token.column));
            tokens.push(Token::new(TokenKind::Eof, String::new(), line, column));
        }
        Self {
            tokens,
            current: 0,
            ctx: Context::new(),
        }
    }

    pub fn parse_program(&mut self) -> Result<Program, ParseError> {
        let root = self.scope()?;
        if !self.is_at_end() {
            return Err(ParseError::new(
                "unexpected input after the shader's closing '}'",
                self.peek(),
            ));
        }

        let ctx = mem::take(&mut self.ctx);
        Ok(ctx.finish(root))
    }

    fn scope(&mut self) -> Result<NodeId, ParseError> {
        let loc = self.loc();
        self.consume_symbol(TokenKind::LeftBrace, "expected '{' to open a scope")?;
        self.ctx.open_scope();

        let mut declarations = Vec::new();
        while self.check_kind(&TokenKind::Const) || self.check_type_name() {
            declarations.push(self.declaration()?);
        }

        let mut statements = Vec::new();
        while !self.check_kind(&TokenKind::RightBrace) && !self.is_at_end() {
            if let Some(statement) = self.statement()? {
                statements.push(statement);
            }
        }
        self.consume_symbol(TokenKind::RightBrace, "expected '}' to close scope")?;

        let declarations = self.alloc(NodeKind::DeclarationList(declarations), loc);
        let statements = self.alloc(NodeKind::StatementList(statements), loc);
        Ok(self.alloc(NodeKind::scope(declarations, statements), loc))
    }

    fn declaration(&mut self) -> Result<NodeId, ParseError> {
        let loc = self.loc();
        let constant = self.matches_symbol(TokenKind::Const);

        let ty_loc = self.loc();
        let ty = match self.peek_kind() {
            TokenKind::TypeName(ty) => *ty,
            _ => return Err(ParseError::new("expected type name", self.peek())),
        };
        self.advance();
        let ty = self.alloc(NodeKind::TypeSpecifier(ty), ty_loc);

        let ident_loc = self.loc();
        let name = self.consume_identifier("expected variable name in declaration")?;
        let ident = self.alloc(NodeKind::Identifier(name), ident_loc);

        let init = if self.matches_symbol(TokenKind::Equal) {
            Some(self.expression()?)
        } else {
            None
        };
        self.consume_symbol(TokenKind::Semicolon, "expected ';' after declaration")?;

        Ok(self.alloc(NodeKind::declaration(constant, ty, ident, init), loc))
    }

    /// `None` for an empty statement.
    fn statement(&mut self) -> Result<Option<NodeId>, ParseError> {
        let loc = self.loc();
        match self.peek_kind() {
            TokenKind::Semicolon => {
                self.advance();
                Ok(None)
            }
            TokenKind::LeftBrace => self.scope().map(Some),
            TokenKind::If => {
                self.advance();
                self.if_statement(loc).map(Some)
            }
            TokenKind::Identifier(_) => {
                let target = self.variable()?;
                self.consume_symbol(TokenKind::Equal, "expected '=' in assignment")?;
                let value = self.expression()?;
                self.consume_symbol(TokenKind::Semicolon, "expected ';' after assignment")?;
                Ok(Some(self.alloc(NodeKind::Assignment { target, value }, loc)))
            }
            TokenKind::While => Err(ParseError::new("loops are not supported", self.peek())),
            TokenKind::Const | TokenKind::TypeName(_) => Err(ParseError::new(
                "declarations must come before statements in a scope",
                self.peek(),
            )),
            _ => Err(ParseError::new("expected statement", self.peek())),
        }
    }

    fn if_statement(&mut self, loc: Loc) -> Result<NodeId, ParseError> {
        self.consume_symbol(TokenKind::LeftParen, "expected '(' after 'if'")?;
        let condition = self.expression()?;
        self.consume_symbol(TokenKind::RightParen, "expected ')' after if condition")?;

        let then_branch = self.branch()?;
        let else_branch = if self.matches_symbol(TokenKind::Else) {
            Some(self.branch()?)
        } else {
            None
        };

        Ok(self.alloc(
            NodeKind::If {
                condition,
                then_branch,
                else_branch,
            },
            loc,
        ))
    }

    fn branch(&mut self) -> Result<NodeId, ParseError> {
        match self.statement()? {
            Some(statement) => Ok(statement),
            None => {
                let loc = self.previous_loc();
                Ok(self.alloc(NodeKind::StatementList(Vec::new()), loc))
            }
        }
    }

    pub(crate) fn variable(&mut self) -> Result<NodeId, ParseError> {
        let loc = self.loc();
        let name = self.consume_identifier("expected variable name")?;
        let ident = self.alloc(NodeKind::Identifier(name), loc);

        let index = if self.matches_symbol(TokenKind::LeftBracket) {
            let index_loc = self.loc();
            let value = match self.peek_kind() {
                TokenKind::Int(value) => *value,
                _ => {
                    return Err(ParseError::new(
                        "expected integer literal as index",
                        self.peek(),
                    ))
                }
            };
            self.advance();
            self.consume_symbol(TokenKind::RightBracket, "expected ']' after index")?;
            Some(self.alloc(NodeKind::IntLiteral(value), index_loc))
        } else {
            None
        };

        Ok(self.alloc(NodeKind::Variable { ident, index }, loc))
    }

    pub(crate) fn alloc(&mut self, kind: NodeKind, loc: Loc) -> NodeId {
        self.ctx.alloc(kind, loc)
    }

    pub(crate) fn loc(&self) -> Loc {
        let token = self.peek();
        Loc::new(token.line, token.column)
    }

    fn previous_loc(&self) -> Loc {
        let token = self.previous();
        Loc::new(token.line, token.column)
    }

    pub(crate) fn matches_symbol(&mut self, kind: TokenKind) -> bool {
        if self.check_kind(&kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub(crate) fn consume_symbol(&mut self, kind: TokenKind, message: &str) -> Result<(), ParseError> {
        if self.check_kind(&kind) {
            self.advance();
            Ok(())
        } else {
            Err(ParseError::new(message, self.peek()))
        }
    }

    pub(crate) fn consume_identifier(&mut self, message: &str) -> Result<String, ParseError> {
        match self.peek_kind() {
            TokenKind::Identifier(name) => {
                let value = name.clone();
                self.advance();
                Ok(value)
            }
            _ => Err(ParseError::new(message, self.peek())),
        }
    }

    fn check_type_name(&self) -> bool {
        matches!(self.peek_kind(), TokenKind::TypeName(_))
    }

    /// Compares token kinds ignoring payloads.
    pub(crate) fn check_kind(&self, kind: &TokenKind) -> bool {
        mem::discriminant(self.peek_kind()) == mem::discriminant(kind)
    }

    pub(crate) fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.current += 1;
        }
        self.previous()
    }

    pub(crate) fn is_at_end(&self) -> bool {
        matches!(self.peek_kind(), TokenKind::Eof)
    }

    pub(crate) fn peek(&self) -> &Token {
        let last = self.tokens.len().saturating_sub(1);
        &self.tokens[self.current.min(last)]
    }

    pub(crate) fn peek_kind(&self) -> &TokenKind {
        &self.peek().kind
    }

    pub(crate) fn previous(&self) -> &Token {
        &self.tokens[self.current.saturating_sub(1)]
    }
}
