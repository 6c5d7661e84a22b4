//! Parser for the brine source language.
//!
//! Recursive descent over the token stream, following Python's expression
//! precedence. The statement grammar is flat: assignments, imports, and
//! bare expressions separated by newlines or semicolons.

use brine_foundation::{Error, ErrorKind, Result};

use crate::ast::{Alias, BinOpKind, BoolOpKind, CmpOp, Constant, Expr, Program, Stmt, UnaryOpKind};
use crate::lexer::Lexer;
use crate::span::Span;
use crate::token::{Token, TokenKind};

/// Parses source text into a program.
pub fn parse(source: &str) -> Result<Program> {
    Parser::new(source).parse_program()
}

/// Parser for brine source code.
pub struct Parser<'src> {
    /// Source text, kept for error snippets.
    source: &'src str,
    /// Tokens from the lexer.
    tokens: Vec<Token>,
    /// Index of the next token to consume.
    position: usize,
}

impl<'src> Parser<'src> {
    /// Creates a parser for the given source.
    #[must_use]
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            tokens: Lexer::tokenize_all(source),
            position: 0,
        }
    }

    /// Parses the whole token stream into a program.
    pub fn parse_program(&mut self) -> Result<Program> {
        let mut statements = Vec::new();
        self.skip_separators();
        while !self.check(&TokenKind::Eof) {
            statements.push(self.parse_statement()?);
            if !self.check(&TokenKind::Eof) {
                self.expect_separator()?;
            }
            self.skip_separators();
        }
        Ok(Program { statements })
    }

    // ------------------------------------------------------------------
    // Statements
    // ------------------------------------------------------------------

    /// Parses one statement.
    fn parse_statement(&mut self) -> Result<Stmt> {
        match self.peek_kind() {
            TokenKind::Import => self.parse_import(),
            TokenKind::From => self.parse_import_from(),
            _ => self.parse_assign_or_expr(),
        }
    }

    /// Parses `import a.b as c, d`.
    fn parse_import(&mut self) -> Result<Stmt> {
        let start = self.advance().span;
        let names = self.parse_aliases(true)?;
        let span = start.to(self.previous_span());
        Ok(Stmt::Import { names, span })
    }

    /// Parses `from mod import a as b, c`.
    fn parse_import_from(&mut self) -> Result<Stmt> {
        let start = self.advance().span;
        let module = self.parse_dotted_name()?;
        self.expect(&TokenKind::Import)?;
        if self.check(&TokenKind::Star) {
            let span = self.peek().span;
            return Err(self.error_at("wildcard imports are not supported", span));
        }
        let parenthesized = self.eat(&TokenKind::LParen);
        let names = self.parse_aliases(false)?;
        if parenthesized {
            self.eat(&TokenKind::Comma);
            self.expect(&TokenKind::RParen)?;
        }
        let span = start.to(self.previous_span());
        Ok(Stmt::ImportFrom {
            module,
            names,
            span,
        })
    }

    /// Parses a comma-separated alias list.
    fn parse_aliases(&mut self, dotted: bool) -> Result<Vec<Alias>> {
        let mut names = Vec::new();
        loop {
            let start = self.peek().span;
            let name = if dotted {
                self.parse_dotted_name()?
            } else {
                self.expect_ident()?
            };
            let asname = if self.eat(&TokenKind::As) {
                Some(self.expect_ident()?)
            } else {
                None
            };
            names.push(Alias {
                name,
                asname,
                span: start.to(self.previous_span()),
            });
            if !self.eat(&TokenKind::Comma) {
                break;
            }
            if self.check(&TokenKind::RParen) {
                break;
            }
        }
        Ok(names)
    }

    /// Parses a possibly dotted module path like `os.path`.
    fn parse_dotted_name(&mut self) -> Result<String> {
        let mut name = self.expect_ident()?;
        while self.eat(&TokenKind::Dot) {
            name.push('.');
            name.push_str(&self.expect_ident()?);
        }
        Ok(name)
    }

    /// Parses an assignment chain or a bare expression statement.
    fn parse_assign_or_expr(&mut self) -> Result<Stmt> {
        let start = self.peek().span;
        let first = self.parse_expr_list()?;

        if !self.check(&TokenKind::Assign) {
            let span = start.to(self.previous_span());
            return Ok(Stmt::Expr { value: first, span });
        }

        let mut parts = vec![first];
        while self.eat(&TokenKind::Assign) {
            parts.push(self.parse_expr_list()?);
        }
        let value = parts.pop().ok_or_else(|| Error::internal("empty assignment chain"))?;
        let span = start.to(self.previous_span());
        Ok(Stmt::Assign {
            targets: parts,
            value,
            span,
        })
    }

    // ------------------------------------------------------------------
    // Expressions
    // ------------------------------------------------------------------

    /// Parses an expression list, folding `a, b, c` into a tuple display.
    fn parse_expr_list(&mut self) -> Result<Expr> {
        let start = self.peek().span;
        let first = self.parse_expr()?;
        if !self.check(&TokenKind::Comma) {
            return Ok(first);
        }
        let mut elts = vec![first];
        while self.eat(&TokenKind::Comma) {
            if self.at_expression_end() {
                break;
            }
            elts.push(self.parse_expr()?);
        }
        let span = start.to(self.previous_span());
        Ok(Expr::Tuple { elts, span })
    }

    /// Parses a single expression (lambda and walrus included).
    fn parse_expr(&mut self) -> Result<Expr> {
        if self.check(&TokenKind::Lambda) {
            return self.parse_lambda();
        }
        let start = self.peek().span;
        let expr = self.parse_or()?;
        if self.check(&TokenKind::Walrus) {
            let Expr::Name { id, .. } = expr else {
                let span = self.peek().span;
                return Err(self.error_at("walrus target must be a plain name", span));
            };
            self.advance();
            let value = self.parse_expr()?;
            let span = start.to(self.previous_span());
            return Ok(Expr::NamedExpr {
                target: id,
                value: Box::new(value),
                span,
            });
        }
        Ok(expr)
    }

    /// Parses `lambda a, b: body`.
    fn parse_lambda(&mut self) -> Result<Expr> {
        let start = self.advance().span;
        let mut params = Vec::new();
        if !self.check(&TokenKind::Colon) {
            loop {
                params.push(self.expect_ident()?);
                if !self.eat(&TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(&TokenKind::Colon)?;
        let body = self.parse_expr()?;
        let span = start.to(self.previous_span());
        Ok(Expr::Lambda {
            params,
            body: Box::new(body),
            span,
        })
    }

    /// Parses `a or b or c`.
    fn parse_or(&mut self) -> Result<Expr> {
        let start = self.peek().span;
        let first = self.parse_and()?;
        if !self.check(&TokenKind::Or) {
            return Ok(first);
        }
        let mut values = vec![first];
        while self.eat(&TokenKind::Or) {
            values.push(self.parse_and()?);
        }
        let span = start.to(self.previous_span());
        Ok(Expr::BoolOp {
            op: BoolOpKind::Or,
            values,
            span,
        })
    }

    /// Parses `a and b and c`.
    fn parse_and(&mut self) -> Result<Expr> {
        let start = self.peek().span;
        let first = self.parse_not()?;
        if !self.check(&TokenKind::And) {
            return Ok(first);
        }
        let mut values = vec![first];
        while self.eat(&TokenKind::And) {
            values.push(self.parse_not()?);
        }
        let span = start.to(self.previous_span());
        Ok(Expr::BoolOp {
            op: BoolOpKind::And,
            values,
            span,
        })
    }

    /// Parses `not a`.
    fn parse_not(&mut self) -> Result<Expr> {
        if self.check(&TokenKind::Not) {
            let start = self.advance().span;
            let operand = self.parse_not()?;
            let span = start.to(self.previous_span());
            return Ok(Expr::UnaryOp {
                op: UnaryOpKind::Not,
                operand: Box::new(operand),
                span,
            });
        }
        self.parse_comparison()
    }

    /// Parses a comparison chain like `a < b <= c`.
    fn parse_comparison(&mut self) -> Result<Expr> {
        let start = self.peek().span;
        let left = self.parse_bitor()?;
        let mut ops = Vec::new();
        let mut comparators = Vec::new();
        while let Some(op) = self.try_cmp_op() {
            ops.push(op);
            comparators.push(self.parse_bitor()?);
        }
        if ops.is_empty() {
            return Ok(left);
        }
        let span = start.to(self.previous_span());
        Ok(Expr::Compare {
            left: Box::new(left),
            ops,
            comparators,
            span,
        })
    }

    /// Consumes a comparison operator if one is next.
    fn try_cmp_op(&mut self) -> Option<CmpOp> {
        let op = match self.peek_kind() {
            TokenKind::EqEq => CmpOp::Eq,
            TokenKind::NotEq => CmpOp::NotEq,
            TokenKind::Lt => CmpOp::Lt,
            TokenKind::Le => CmpOp::Le,
            TokenKind::Gt => CmpOp::Gt,
            TokenKind::Ge => CmpOp::Ge,
            TokenKind::In => CmpOp::In,
            TokenKind::Is => {
                self.advance();
                return Some(if self.eat(&TokenKind::Not) {
                    CmpOp::IsNot
                } else {
                    CmpOp::Is
                });
            }
            TokenKind::Not => {
                if self.peek_kind_n(1) == Some(&TokenKind::In) {
                    self.advance();
                    self.advance();
                    return Some(CmpOp::NotIn);
                }
                return None;
            }
            _ => return None,
        };
        self.advance();
        Some(op)
    }

    /// Parses `a | b`.
    fn parse_bitor(&mut self) -> Result<Expr> {
        self.parse_left_assoc(Self::parse_bitxor, &[(TokenKind::Pipe, BinOpKind::BitOr)])
    }

    /// Parses `a ^ b`.
    fn parse_bitxor(&mut self) -> Result<Expr> {
        self.parse_left_assoc(Self::parse_bitand, &[(TokenKind::Caret, BinOpKind::BitXor)])
    }

    /// Parses `a & b`.
    fn parse_bitand(&mut self) -> Result<Expr> {
        self.parse_left_assoc(Self::parse_shift, &[(TokenKind::Amp, BinOpKind::BitAnd)])
    }

    /// Parses `a << b` and `a >> b`.
    fn parse_shift(&mut self) -> Result<Expr> {
        self.parse_left_assoc(
            Self::parse_additive,
            &[
                (TokenKind::LShift, BinOpKind::LShift),
                (TokenKind::RShift, BinOpKind::RShift),
            ],
        )
    }

    /// Parses `a + b` and `a - b`.
    fn parse_additive(&mut self) -> Result<Expr> {
        self.parse_left_assoc(
            Self::parse_multiplicative,
            &[
                (TokenKind::Plus, BinOpKind::Add),
                (TokenKind::Minus, BinOpKind::Sub),
            ],
        )
    }

    /// Parses `* / // % @`.
    fn parse_multiplicative(&mut self) -> Result<Expr> {
        self.parse_left_assoc(
            Self::parse_unary,
            &[
                (TokenKind::Star, BinOpKind::Mul),
                (TokenKind::Slash, BinOpKind::Div),
                (TokenKind::DoubleSlash, BinOpKind::FloorDiv),
                (TokenKind::Percent, BinOpKind::Mod),
                (TokenKind::At, BinOpKind::MatMul),
            ],
        )
    }

    /// Parses a left-associative binary operator tier.
    fn parse_left_assoc(
        &mut self,
        next: fn(&mut Self) -> Result<Expr>,
        ops: &[(TokenKind, BinOpKind)],
    ) -> Result<Expr> {
        let start = self.peek().span;
        let mut left = next(self)?;
        'outer: loop {
            for (token, op) in ops {
                if self.check(token) {
                    self.advance();
                    let right = next(self)?;
                    let span = start.to(self.previous_span());
                    left = Expr::BinOp {
                        left: Box::new(left),
                        op: *op,
                        right: Box::new(right),
                        span,
                    };
                    continue 'outer;
                }
            }
            break;
        }
        Ok(left)
    }

    /// Parses prefix `- + ~`.
    fn parse_unary(&mut self) -> Result<Expr> {
        let op = match self.peek_kind() {
            TokenKind::Minus => Some(UnaryOpKind::Neg),
            TokenKind::Plus => Some(UnaryOpKind::Pos),
            TokenKind::Tilde => Some(UnaryOpKind::Invert),
            _ => None,
        };
        let Some(op) = op else {
            return self.parse_power();
        };
        let start = self.advance().span;

        // Fold a sign directly into a numeric literal, as Python's
        // constant folding does for `-1`.
        if op == UnaryOpKind::Neg {
            if let TokenKind::Int(n) = self.peek_kind() {
                let n = *n;
                let end = self.advance().span;
                return Ok(Expr::Constant {
                    value: Constant::Int(-n),
                    span: start.to(end),
                });
            }
            if let TokenKind::Float(n) = self.peek_kind() {
                let n = *n;
                let end = self.advance().span;
                return Ok(Expr::Constant {
                    value: Constant::Float(-n),
                    span: start.to(end),
                });
            }
        }

        let operand = self.parse_unary()?;
        let span = start.to(self.previous_span());
        Ok(Expr::UnaryOp {
            op,
            operand: Box::new(operand),
            span,
        })
    }

    /// Parses `a ** b` (right associative).
    fn parse_power(&mut self) -> Result<Expr> {
        let start = self.peek().span;
        let base = self.parse_postfix()?;
        if !self.eat(&TokenKind::DoubleStar) {
            return Ok(base);
        }
        let exponent = self.parse_unary()?;
        let span = start.to(self.previous_span());
        Ok(Expr::BinOp {
            left: Box::new(base),
            op: BinOpKind::Pow,
            right: Box::new(exponent),
            span,
        })
    }

    /// Parses call, attribute, and subscript trailers.
    fn parse_postfix(&mut self) -> Result<Expr> {
        let start = self.peek().span;
        let mut expr = self.parse_atom()?;
        loop {
            match self.peek_kind() {
                TokenKind::LParen => {
                    self.advance();
                    let args = self.parse_call_args()?;
                    self.expect(&TokenKind::RParen)?;
                    let span = start.to(self.previous_span());
                    expr = Expr::Call {
                        func: Box::new(expr),
                        args,
                        span,
                    };
                }
                TokenKind::Dot => {
                    self.advance();
                    let attr = self.expect_ident()?;
                    let span = start.to(self.previous_span());
                    expr = Expr::Attribute {
                        value: Box::new(expr),
                        attr,
                        span,
                    };
                }
                TokenKind::LBracket => {
                    self.advance();
                    let index = self.parse_subscript_index()?;
                    self.expect(&TokenKind::RBracket)?;
                    let span = start.to(self.previous_span());
                    expr = Expr::Subscript {
                        value: Box::new(expr),
                        index: Box::new(index),
                        span,
                    };
                }
                _ => break,
            }
        }
        Ok(expr)
    }

    /// Parses the comma-separated arguments of a call.
    fn parse_call_args(&mut self) -> Result<Vec<Expr>> {
        let mut args = Vec::new();
        if self.check(&TokenKind::RParen) {
            return Ok(args);
        }
        loop {
            if matches!(self.peek_kind(), TokenKind::Star | TokenKind::DoubleStar) {
                let span = self.peek().span;
                return Err(self.error_at("starred call arguments are not supported", span));
            }
            args.push(self.parse_expr()?);
            if let TokenKind::Assign = self.peek_kind() {
                let span = self.peek().span;
                return Err(self.error_at("keyword arguments are not supported", span));
            }
            if !self.eat(&TokenKind::Comma) {
                break;
            }
            if self.check(&TokenKind::RParen) {
                break;
            }
        }
        Ok(args)
    }

    /// Parses the index of a subscript, which may be a slice or a tuple.
    fn parse_subscript_index(&mut self) -> Result<Expr> {
        let start = self.peek().span;

        // Slice with an absent lower bound
        if self.check(&TokenKind::Colon) {
            return self.parse_slice_tail(None, start);
        }

        let first = self.parse_expr()?;
        if self.check(&TokenKind::Colon) {
            return self.parse_slice_tail(Some(first), start);
        }
        if !self.check(&TokenKind::Comma) {
            return Ok(first);
        }
        let mut elts = vec![first];
        while self.eat(&TokenKind::Comma) {
            if self.check(&TokenKind::RBracket) {
                break;
            }
            elts.push(self.parse_expr()?);
        }
        let span = start.to(self.previous_span());
        Ok(Expr::Tuple { elts, span })
    }

    /// Parses the remainder of a slice after the lower bound.
    fn parse_slice_tail(&mut self, lower: Option<Expr>, start: Span) -> Result<Expr> {
        self.expect(&TokenKind::Colon)?;
        let upper = if self.check(&TokenKind::Colon) || self.check(&TokenKind::RBracket) {
            None
        } else {
            Some(self.parse_expr()?)
        };
        let step = if self.eat(&TokenKind::Colon) {
            if self.check(&TokenKind::RBracket) {
                None
            } else {
                Some(self.parse_expr()?)
            }
        } else {
            None
        };
        let span = start.to(self.previous_span());
        Ok(Expr::Slice {
            lower: lower.map(Box::new),
            upper: upper.map(Box::new),
            step: step.map(Box::new),
            span,
        })
    }

    /// Parses an atom: literal, name, or bracketed display.
    fn parse_atom(&mut self) -> Result<Expr> {
        let token = self.peek().clone();
        let span = token.span;
        match token.kind {
            TokenKind::Int(n) => {
                self.advance();
                Ok(Expr::Constant {
                    value: Constant::Int(n),
                    span,
                })
            }
            TokenKind::Float(n) => {
                self.advance();
                Ok(Expr::Constant {
                    value: Constant::Float(n),
                    span,
                })
            }
            TokenKind::Str(s) => {
                self.advance();
                // Adjacent string literals concatenate
                let mut s = s;
                let mut end = span;
                while let TokenKind::Str(next) = self.peek_kind() {
                    let next = next.clone();
                    end = self.advance().span;
                    s.append(&next);
                }
                Ok(Expr::Constant {
                    value: Constant::Str(s),
                    span: span.to(end),
                })
            }
            TokenKind::Bytes(b) => {
                self.advance();
                let mut b = b;
                let mut end = span;
                while let TokenKind::Bytes(next) = self.peek_kind() {
                    let next = next.clone();
                    end = self.advance().span;
                    b.extend_from_slice(&next);
                }
                Ok(Expr::Constant {
                    value: Constant::Bytes(b),
                    span: span.to(end),
                })
            }
            TokenKind::None => {
                self.advance();
                Ok(Expr::Constant {
                    value: Constant::None,
                    span,
                })
            }
            TokenKind::True => {
                self.advance();
                Ok(Expr::Constant {
                    value: Constant::Bool(true),
                    span,
                })
            }
            TokenKind::False => {
                self.advance();
                Ok(Expr::Constant {
                    value: Constant::Bool(false),
                    span,
                })
            }
            TokenKind::Ellipsis => {
                self.advance();
                Ok(Expr::Constant {
                    value: Constant::Ellipsis,
                    span,
                })
            }
            TokenKind::Ident(id) => {
                self.advance();
                Ok(Expr::Name { id, span })
            }
            TokenKind::LParen => self.parse_paren(),
            TokenKind::LBracket => self.parse_list(),
            TokenKind::LBrace => self.parse_dict_or_set(),
            TokenKind::Lambda => self.parse_lambda(),
            TokenKind::Error(message) => Err(self.error_at(&message, span)),
            other => Err(self.error_at(&format!("unexpected {}", other.name()), span)),
        }
    }

    /// Parses `(...)`: a parenthesized expression or tuple display.
    fn parse_paren(&mut self) -> Result<Expr> {
        let start = self.advance().span;
        if self.check(&TokenKind::RParen) {
            let end = self.advance().span;
            return Ok(Expr::Tuple {
                elts: Vec::new(),
                span: start.to(end),
            });
        }
        let first = self.parse_expr()?;
        if !self.check(&TokenKind::Comma) {
            self.expect(&TokenKind::RParen)?;
            return Ok(first);
        }
        let mut elts = vec![first];
        while self.eat(&TokenKind::Comma) {
            if self.check(&TokenKind::RParen) {
                break;
            }
            elts.push(self.parse_expr()?);
        }
        self.expect(&TokenKind::RParen)?;
        let span = start.to(self.previous_span());
        Ok(Expr::Tuple { elts, span })
    }

    /// Parses `[...]`: a list display.
    fn parse_list(&mut self) -> Result<Expr> {
        let start = self.advance().span;
        let mut elts = Vec::new();
        while !self.check(&TokenKind::RBracket) {
            elts.push(self.parse_expr()?);
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::RBracket)?;
        let span = start.to(self.previous_span());
        Ok(Expr::List { elts, span })
    }

    /// Parses `{...}`: a dict or set display.
    fn parse_dict_or_set(&mut self) -> Result<Expr> {
        let start = self.advance().span;
        if self.check(&TokenKind::RBrace) {
            let end = self.advance().span;
            return Ok(Expr::Dict {
                keys: Vec::new(),
                values: Vec::new(),
                span: start.to(end),
            });
        }
        let first = self.parse_expr()?;
        if self.check(&TokenKind::Colon) {
            // Dict display
            self.advance();
            let mut keys = vec![first];
            let mut values = vec![self.parse_expr()?];
            while self.eat(&TokenKind::Comma) {
                if self.check(&TokenKind::RBrace) {
                    break;
                }
                keys.push(self.parse_expr()?);
                self.expect(&TokenKind::Colon)?;
                values.push(self.parse_expr()?);
            }
            self.expect(&TokenKind::RBrace)?;
            let span = start.to(self.previous_span());
            return Ok(Expr::Dict { keys, values, span });
        }
        // Set display
        let mut elts = vec![first];
        while self.eat(&TokenKind::Comma) {
            if self.check(&TokenKind::RBrace) {
                break;
            }
            elts.push(self.parse_expr()?);
        }
        self.expect(&TokenKind::RBrace)?;
        let span = start.to(self.previous_span());
        Ok(Expr::Set { elts, span })
    }

    // ------------------------------------------------------------------
    // Token helpers
    // ------------------------------------------------------------------

    /// Peeks at the next token.
    fn peek(&self) -> &Token {
        &self.tokens[self.position.min(self.tokens.len() - 1)]
    }

    /// Peeks at the kind of the next token.
    fn peek_kind(&self) -> &TokenKind {
        &self.peek().kind
    }

    /// Peeks at the kind of the token `n` positions ahead.
    fn peek_kind_n(&self, n: usize) -> Option<&TokenKind> {
        self.tokens.get(self.position + n).map(|t| &t.kind)
    }

    /// Consumes and returns the next token.
    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if self.position < self.tokens.len() - 1 {
            self.position += 1;
        }
        token
    }

    /// Returns the span of the most recently consumed token.
    fn previous_span(&self) -> Span {
        if self.position == 0 {
            return Span::at_start();
        }
        self.tokens[self.position - 1].span
    }

    /// Returns true if the next token has the given kind.
    fn check(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(self.peek_kind()) == std::mem::discriminant(kind)
    }

    /// Consumes the next token if it has the given kind.
    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Consumes a token of the given kind or reports an error.
    fn expect(&mut self, kind: &TokenKind) -> Result<Token> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            let span = self.peek().span;
            let found = self.peek_kind().name();
            Err(self.error_at(&format!("expected {}, found {found}", kind.name()), span))
        }
    }

    /// Consumes an identifier or reports an error.
    fn expect_ident(&mut self) -> Result<String> {
        if let TokenKind::Ident(id) = self.peek_kind() {
            let id = id.clone();
            self.advance();
            Ok(id)
        } else {
            let span = self.peek().span;
            let found = self.peek_kind().name();
            Err(self.error_at(&format!("expected identifier, found {found}"), span))
        }
    }

    /// Requires a statement separator next.
    fn expect_separator(&mut self) -> Result<()> {
        if matches!(self.peek_kind(), TokenKind::Newline | TokenKind::Semicolon) {
            self.advance();
            Ok(())
        } else {
            let span = self.peek().span;
            let found = self.peek_kind().name();
            Err(self.error_at(&format!("expected end of statement, found {found}"), span))
        }
    }

    /// Skips newlines and semicolons between statements.
    fn skip_separators(&mut self) {
        while matches!(self.peek_kind(), TokenKind::Newline | TokenKind::Semicolon) {
            self.advance();
        }
    }

    /// Returns true if the next token cannot start an expression.
    fn at_expression_end(&self) -> bool {
        matches!(
            self.peek_kind(),
            TokenKind::Newline
                | TokenKind::Semicolon
                | TokenKind::Eof
                | TokenKind::Assign
                | TokenKind::RParen
                | TokenKind::RBracket
                | TokenKind::RBrace
        )
    }

    /// Builds a parse error at the given span.
    fn error_at(&self, message: &str, span: Span) -> Error {
        Error::new(ErrorKind::ParseError {
            message: message.to_string(),
            line: span.line,
            column: span.column,
            context: span.source_line(self.source).to_string(),
        })
    }
}
