//! Token types for the brine source language.
//!
//! Tokens are the output of the lexer and input to the parser.

use brine_foundation::PyString;

use crate::span::Span;

/// A token from lexical analysis.
#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    /// The type and value of this token.
    pub kind: TokenKind,
    /// Source location of this token.
    pub span: Span,
}

impl Token {
    /// Creates a new token.
    #[must_use]
    pub const fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }
}

/// Token types for the brine source language.
#[derive(Clone, Debug, PartialEq)]
pub enum TokenKind {
    // Statement separators
    /// Logical end of line (suppressed inside brackets).
    Newline,
    /// `;`
    Semicolon,

    // Literals and names
    /// Identifier like `foo`
    Ident(String),
    /// Integer literal like `42` or `0xff`
    Int(i128),
    /// Float literal like `3.14` or `1e10`
    Float(f64),
    /// String literal like `"hello"`
    Str(PyString),
    /// Bytes literal like `b"raw"`
    Bytes(Vec<u8>),

    // Keywords
    /// `None`
    None,
    /// `True`
    True,
    /// `False`
    False,
    /// `and`
    And,
    /// `or`
    Or,
    /// `not`
    Not,
    /// `in`
    In,
    /// `is`
    Is,
    /// `import`
    Import,
    /// `from`
    From,
    /// `as`
    As,
    /// `lambda`
    Lambda,

    // Operators and punctuation
    /// `+`
    Plus,
    /// `-`
    Minus,
    /// `*`
    Star,
    /// `**`
    DoubleStar,
    /// `/`
    Slash,
    /// `//`
    DoubleSlash,
    /// `%`
    Percent,
    /// `@`
    At,
    /// `<<`
    LShift,
    /// `>>`
    RShift,
    /// `&`
    Amp,
    /// `|`
    Pipe,
    /// `^`
    Caret,
    /// `~`
    Tilde,
    /// `<`
    Lt,
    /// `>`
    Gt,
    /// `<=`
    Le,
    /// `>=`
    Ge,
    /// `==`
    EqEq,
    /// `!=`
    NotEq,
    /// `=`
    Assign,
    /// `:=`
    Walrus,
    /// `.`
    Dot,
    /// `...`
    Ellipsis,
    /// `,`
    Comma,
    /// `:`
    Colon,
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `[`
    LBracket,
    /// `]`
    RBracket,
    /// `{`
    LBrace,
    /// `}`
    RBrace,

    // Meta
    /// End of input
    Eof,
    /// Lexer error
    Error(String),
}

impl TokenKind {
    /// Returns a human-readable name for this token kind.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Newline => "newline",
            Self::Semicolon => "';'",
            Self::Ident(_) => "identifier",
            Self::Int(_) => "integer",
            Self::Float(_) => "float",
            Self::Str(_) => "string",
            Self::Bytes(_) => "bytes",
            Self::None => "None",
            Self::True => "True",
            Self::False => "False",
            Self::And => "'and'",
            Self::Or => "'or'",
            Self::Not => "'not'",
            Self::In => "'in'",
            Self::Is => "'is'",
            Self::Import => "'import'",
            Self::From => "'from'",
            Self::As => "'as'",
            Self::Lambda => "'lambda'",
            Self::Plus => "'+'",
            Self::Minus => "'-'",
            Self::Star => "'*'",
            Self::DoubleStar => "'**'",
            Self::Slash => "'/'",
            Self::DoubleSlash => "'//'",
            Self::Percent => "'%'",
            Self::At => "'@'",
            Self::LShift => "'<<'",
            Self::RShift => "'>>'",
            Self::Amp => "'&'",
            Self::Pipe => "'|'",
            Self::Caret => "'^'",
            Self::Tilde => "'~'",
            Self::Lt => "'<'",
            Self::Gt => "'>'",
            Self::Le => "'<='",
            Self::Ge => "'>='",
            Self::EqEq => "'=='",
            Self::NotEq => "'!='",
            Self::Assign => "'='",
            Self::Walrus => "':='",
            Self::Dot => "'.'",
            Self::Ellipsis => "'...'",
            Self::Comma => "','",
            Self::Colon => "':'",
            Self::LParen => "'('",
            Self::RParen => "')'",
            Self::LBracket => "'['",
            Self::RBracket => "']'",
            Self::LBrace => "'{'",
            Self::RBrace => "'}'",
            Self::Eof => "end of input",
            Self::Error(_) => "error",
        }
    }

    /// Returns the keyword token for an identifier, if it is one.
    #[must_use]
    pub fn keyword(ident: &str) -> Option<Self> {
        match ident {
            "None" => Some(Self::None),
            "True" => Some(Self::True),
            "False" => Some(Self::False),
            "and" => Some(Self::And),
            "or" => Some(Self::Or),
            "not" => Some(Self::Not),
            "in" => Some(Self::In),
            "is" => Some(Self::Is),
            "import" => Some(Self::Import),
            "from" => Some(Self::From),
            "as" => Some(Self::As),
            "lambda" => Some(Self::Lambda),
            _ => None,
        }
    }
}
