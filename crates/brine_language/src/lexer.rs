//! Lexer for the brine source language.
//!
//! The lexer converts source text into a stream of tokens. Newlines are
//! significant (they separate statements) except inside brackets, where
//! they are treated as whitespace. There is no indentation handling: the
//! grammar has no compound statements.

use brine_foundation::PyString;

use crate::span::Span;
use crate::token::{Token, TokenKind};

/// Lexer for brine source code.
pub struct Lexer<'src> {
    /// Source text being tokenized.
    source: &'src str,
    /// Remaining source text.
    rest: &'src str,
    /// Current byte offset in source.
    position: usize,
    /// Current line number (1-based).
    line: u32,
    /// Current column number (1-based).
    column: u32,
    /// Bracket nesting depth; newlines are whitespace when > 0.
    depth: u32,
}

impl<'src> Lexer<'src> {
    /// Creates a new lexer for the given source.
    #[must_use]
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            rest: source,
            position: 0,
            line: 1,
            column: 1,
            depth: 0,
        }
    }

    /// Returns the next token from the source.
    pub fn next_token(&mut self) -> Token {
        self.skip_whitespace();

        let start = self.position;
        let start_line = self.line;
        let start_column = self.column;

        let Some(c) = self.peek_char() else {
            return Token::new(
                TokenKind::Eof,
                Span::new(start, start, start_line, start_column),
            );
        };

        let kind = match c {
            '\n' => {
                self.advance();
                TokenKind::Newline
            }
            ';' => {
                self.advance();
                TokenKind::Semicolon
            }
            '(' => self.open_bracket(TokenKind::LParen),
            ')' => self.close_bracket(TokenKind::RParen),
            '[' => self.open_bracket(TokenKind::LBracket),
            ']' => self.close_bracket(TokenKind::RBracket),
            '{' => self.open_bracket(TokenKind::LBrace),
            '}' => self.close_bracket(TokenKind::RBrace),
            ',' => {
                self.advance();
                TokenKind::Comma
            }
            '+' => {
                self.advance();
                TokenKind::Plus
            }
            '-' => {
                self.advance();
                TokenKind::Minus
            }
            '*' => {
                self.advance();
                if self.peek_char() == Some('*') {
                    self.advance();
                    TokenKind::DoubleStar
                } else {
                    TokenKind::Star
                }
            }
            '/' => {
                self.advance();
                if self.peek_char() == Some('/') {
                    self.advance();
                    TokenKind::DoubleSlash
                } else {
                    TokenKind::Slash
                }
            }
            '%' => {
                self.advance();
                TokenKind::Percent
            }
            '@' => {
                self.advance();
                TokenKind::At
            }
            '&' => {
                self.advance();
                TokenKind::Amp
            }
            '|' => {
                self.advance();
                TokenKind::Pipe
            }
            '^' => {
                self.advance();
                TokenKind::Caret
            }
            '~' => {
                self.advance();
                TokenKind::Tilde
            }
            '<' => {
                self.advance();
                match self.peek_char() {
                    Some('=') => {
                        self.advance();
                        TokenKind::Le
                    }
                    Some('<') => {
                        self.advance();
                        TokenKind::LShift
                    }
                    _ => TokenKind::Lt,
                }
            }
            '>' => {
                self.advance();
                match self.peek_char() {
                    Some('=') => {
                        self.advance();
                        TokenKind::Ge
                    }
                    Some('>') => {
                        self.advance();
                        TokenKind::RShift
                    }
                    _ => TokenKind::Gt,
                }
            }
            '=' => {
                self.advance();
                if self.peek_char() == Some('=') {
                    self.advance();
                    TokenKind::EqEq
                } else {
                    TokenKind::Assign
                }
            }
            '!' => {
                self.advance();
                if self.peek_char() == Some('=') {
                    self.advance();
                    TokenKind::NotEq
                } else {
                    TokenKind::Error("unexpected character: '!'".into())
                }
            }
            ':' => {
                self.advance();
                if self.peek_char() == Some('=') {
                    self.advance();
                    TokenKind::Walrus
                } else {
                    TokenKind::Colon
                }
            }
            '.' => {
                if self.peek_char_n(1).is_some_and(|c| c.is_ascii_digit()) {
                    self.scan_number()
                } else if self.peek_char_n(1) == Some('.') && self.peek_char_n(2) == Some('.') {
                    self.advance();
                    self.advance();
                    self.advance();
                    TokenKind::Ellipsis
                } else {
                    self.advance();
                    TokenKind::Dot
                }
            }
            '"' | '\'' => self.scan_string(false, false),
            c if c.is_ascii_digit() => self.scan_number(),
            c if is_ident_start(c) => self.scan_ident(),
            c => {
                self.advance();
                TokenKind::Error(format!("unexpected character: {c:?}"))
            }
        };

        Token::new(
            kind,
            Span::new(start, self.position, start_line, start_column),
        )
    }

    /// Tokenizes all source and returns a vector of tokens.
    #[must_use]
    pub fn tokenize_all(source: &str) -> Vec<Token> {
        let mut lexer = Lexer::new(source);
        let mut tokens = Vec::new();
        loop {
            let token = lexer.next_token();
            let is_eof = token.kind == TokenKind::Eof;
            tokens.push(token);
            if is_eof {
                break;
            }
        }
        tokens
    }

    /// Peeks at the next character without consuming it.
    fn peek_char(&self) -> Option<char> {
        self.rest.chars().next()
    }

    /// Peeks at the character `n` positions ahead.
    fn peek_char_n(&self, n: usize) -> Option<char> {
        self.rest.chars().nth(n)
    }

    /// Advances past the next character.
    fn advance(&mut self) {
        if let Some(c) = self.peek_char() {
            let len = c.len_utf8();
            self.rest = &self.rest[len..];
            self.position += len;
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
    }

    /// Consumes an opening bracket and tracks nesting depth.
    fn open_bracket(&mut self, kind: TokenKind) -> TokenKind {
        self.advance();
        self.depth += 1;
        kind
    }

    /// Consumes a closing bracket and tracks nesting depth.
    fn close_bracket(&mut self, kind: TokenKind) -> TokenKind {
        self.advance();
        self.depth = self.depth.saturating_sub(1);
        kind
    }

    /// Skips spaces, tabs, comments, continuation backslashes, and (inside
    /// brackets) newlines.
    fn skip_whitespace(&mut self) {
        loop {
            match self.peek_char() {
                Some(' ' | '\t' | '\r') => self.advance(),
                Some('\n') if self.depth > 0 => self.advance(),
                Some('#') => {
                    while let Some(c) = self.peek_char() {
                        if c == '\n' {
                            break;
                        }
                        self.advance();
                    }
                }
                Some('\\') if self.peek_char_n(1) == Some('\n') => {
                    self.advance();
                    self.advance();
                }
                _ => break,
            }
        }
    }

    /// Scans an identifier, keyword, or prefixed string literal.
    fn scan_ident(&mut self) -> TokenKind {
        let start = self.position;
        while let Some(c) = self.peek_char() {
            if is_ident_char(c) {
                self.advance();
            } else {
                break;
            }
        }
        let text = &self.source[start..self.position];

        // String prefixes: b"", r"", br"", rb"" (any case)
        if matches!(self.peek_char(), Some('"' | '\'')) && text.len() <= 2 {
            let lower = text.to_ascii_lowercase();
            let (bytes, raw) = match lower.as_str() {
                "b" => (true, false),
                "r" => (false, true),
                "br" | "rb" => (true, true),
                "f" | "u" => {
                    return if lower == "f" {
                        TokenKind::Error("f-strings are not supported".into())
                    } else {
                        self.scan_string(false, false)
                    };
                }
                _ => return ident_or_keyword(text),
            };
            return self.scan_string(bytes, raw);
        }

        ident_or_keyword(text)
    }

    /// Scans a number (integer or float).
    fn scan_number(&mut self) -> TokenKind {
        let start = self.position;

        // Radix-prefixed integers
        if self.peek_char() == Some('0') {
            if let Some(radix_char) = self.peek_char_n(1) {
                let radix = match radix_char {
                    'x' | 'X' => Some(16),
                    'o' | 'O' => Some(8),
                    'b' | 'B' => Some(2),
                    _ => None,
                };
                if let Some(radix) = radix {
                    self.advance();
                    self.advance();
                    return self.scan_radix_int(radix);
                }
            }
        }

        let mut is_float = false;
        self.scan_digits();
        if self.peek_char() == Some('.') && self.peek_char_n(1) != Some('.') {
            is_float = true;
            self.advance();
            self.scan_digits();
        }
        if matches!(self.peek_char(), Some('e' | 'E')) {
            let after_sign = match self.peek_char_n(1) {
                Some('+' | '-') => self.peek_char_n(2),
                c => c,
            };
            if after_sign.is_some_and(|c| c.is_ascii_digit()) {
                is_float = true;
                self.advance();
                if matches!(self.peek_char(), Some('+' | '-')) {
                    self.advance();
                }
                self.scan_digits();
            }
        }
        if matches!(self.peek_char(), Some('j' | 'J')) {
            self.advance();
            return TokenKind::Error("complex literals are not supported".into());
        }

        let text: String = self.source[start..self.position]
            .chars()
            .filter(|&c| c != '_')
            .collect();

        if is_float {
            match text.parse::<f64>() {
                Ok(n) => TokenKind::Float(n),
                Err(e) => TokenKind::Error(format!("invalid float literal: {e}")),
            }
        } else {
            match text.parse::<i128>() {
                Ok(n) => TokenKind::Int(n),
                Err(_) => TokenKind::Error("integer literal out of supported range".into()),
            }
        }
    }

    /// Scans decimal digits, permitting `_` separators.
    fn scan_digits(&mut self) {
        while let Some(c) = self.peek_char() {
            if c.is_ascii_digit() || c == '_' {
                self.advance();
            } else {
                break;
            }
        }
    }

    /// Scans the digits of a radix-prefixed integer.
    fn scan_radix_int(&mut self, radix: u32) -> TokenKind {
        let start = self.position;
        while let Some(c) = self.peek_char() {
            if c.is_digit(radix) || c == '_' {
                self.advance();
            } else {
                break;
            }
        }
        let text: String = self.source[start..self.position]
            .chars()
            .filter(|&c| c != '_')
            .collect();
        if text.is_empty() {
            return TokenKind::Error("missing digits in integer literal".into());
        }
        match i128::from_str_radix(&text, radix) {
            Ok(n) => TokenKind::Int(n),
            Err(_) => TokenKind::Error("integer literal out of supported range".into()),
        }
    }

    /// Scans a string or bytes literal, including triple-quoted forms.
    fn scan_string(&mut self, bytes: bool, raw: bool) -> TokenKind {
        let Some(quote) = self.peek_char() else {
            return TokenKind::Error("expected string quote".into());
        };
        self.advance();

        let triple = self.peek_char() == Some(quote) && self.peek_char_n(1) == Some(quote);
        if triple {
            self.advance();
            self.advance();
        } else if self.peek_char() == Some(quote) {
            // Empty string
            self.advance();
            return if bytes {
                TokenKind::Bytes(Vec::new())
            } else {
                TokenKind::Str(PyString::new())
            };
        }

        let mut text = PyString::new();
        let mut raw_bytes = Vec::new();

        loop {
            let Some(c) = self.peek_char() else {
                return TokenKind::Error("unterminated string literal".into());
            };
            if c == quote {
                if triple {
                    if self.peek_char_n(1) == Some(quote) && self.peek_char_n(2) == Some(quote) {
                        self.advance();
                        self.advance();
                        self.advance();
                        break;
                    }
                    self.advance();
                    push_char(bytes, &mut text, &mut raw_bytes, c);
                    continue;
                }
                self.advance();
                break;
            }
            if c == '\n' && !triple {
                return TokenKind::Error("unterminated string literal".into());
            }
            if c == '\\' && !raw {
                self.advance();
                match self.scan_escape(bytes, &mut text, &mut raw_bytes) {
                    Ok(()) => {}
                    Err(msg) => return TokenKind::Error(msg),
                }
                continue;
            }
            if c == '\\' {
                // Raw mode: a backslash never escapes, but still protects a quote
                self.advance();
                push_char(bytes, &mut text, &mut raw_bytes, '\\');
                if let Some(next) = self.peek_char() {
                    self.advance();
                    if bytes && !next.is_ascii() {
                        return TokenKind::Error(
                            "bytes literal may only contain ASCII characters".into(),
                        );
                    }
                    push_char(bytes, &mut text, &mut raw_bytes, next);
                }
                continue;
            }
            if bytes && !c.is_ascii() {
                return TokenKind::Error("bytes literal may only contain ASCII characters".into());
            }
            self.advance();
            push_char(bytes, &mut text, &mut raw_bytes, c);
        }

        if bytes {
            TokenKind::Bytes(raw_bytes)
        } else {
            TokenKind::Str(text)
        }
    }

    /// Scans one escape sequence after the backslash has been consumed.
    fn scan_escape(
        &mut self,
        bytes: bool,
        text: &mut PyString,
        raw_bytes: &mut Vec<u8>,
    ) -> Result<(), String> {
        let Some(c) = self.peek_char() else {
            return Err("unexpected end of input in string escape".into());
        };
        self.advance();
        let simple = match c {
            'n' => Some('\n'),
            'r' => Some('\r'),
            't' => Some('\t'),
            '\\' => Some('\\'),
            '\'' => Some('\''),
            '"' => Some('"'),
            'a' => Some('\x07'),
            'b' => Some('\x08'),
            'f' => Some('\x0C'),
            'v' => Some('\x0B'),
            '0' => Some('\0'),
            '\n' => {
                // Escaped newline: line continuation inside the literal
                return Ok(());
            }
            _ => None,
        };
        if let Some(c) = simple {
            push_char(bytes, text, raw_bytes, c);
            return Ok(());
        }
        match c {
            'x' => {
                let value = self.scan_hex_digits(2)?;
                if bytes {
                    raw_bytes.push(value as u8);
                } else {
                    push_char(
                        false,
                        text,
                        raw_bytes,
                        char::from_u32(value).ok_or("invalid \\x escape")?,
                    );
                }
                Ok(())
            }
            'u' if !bytes => {
                let value = self.scan_hex_digits(4)?;
                if (0xD800..=0xDFFF).contains(&value) {
                    text.push_surrogate(value as u16);
                } else {
                    text.push(char::from_u32(value).ok_or("invalid \\u escape")?);
                }
                Ok(())
            }
            'U' if !bytes => {
                let value = self.scan_hex_digits(8)?;
                text.push(char::from_u32(value).ok_or("invalid \\U escape")?);
                Ok(())
            }
            // Unknown escape: Python keeps the backslash
            other => {
                push_char(bytes, text, raw_bytes, '\\');
                if bytes && !other.is_ascii() {
                    return Err("bytes literal may only contain ASCII characters".into());
                }
                push_char(bytes, text, raw_bytes, other);
                Ok(())
            }
        }
    }

    /// Scans exactly `n` hex digits and returns their value.
    fn scan_hex_digits(&mut self, n: usize) -> Result<u32, String> {
        let mut value: u32 = 0;
        for _ in 0..n {
            let Some(d) = self.peek_char().and_then(|c| c.to_digit(16)) else {
                return Err(format!("expected {n} hex digits in escape sequence"));
            };
            self.advance();
            value = value * 16 + d;
        }
        Ok(value)
    }
}

/// Appends a character to whichever buffer the literal kind uses.
fn push_char(bytes: bool, text: &mut PyString, raw_bytes: &mut Vec<u8>, c: char) {
    if bytes {
        debug_assert!(c.is_ascii() || c == '\\');
        raw_bytes.push(c as u8);
    } else {
        text.push(c);
    }
}

/// Maps identifier text to a keyword token or an identifier.
fn ident_or_keyword(text: &str) -> TokenKind {
    TokenKind::keyword(text).unwrap_or_else(|| TokenKind::Ident(text.to_string()))
}

/// Returns true if `c` can start an identifier.
fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

/// Returns true if `c` can appear in an identifier (not at start).
fn is_ident_char(c: char) -> bool {
    is_ident_start(c) || c.is_ascii_digit()
}
