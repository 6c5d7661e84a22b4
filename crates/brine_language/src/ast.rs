//! Abstract syntax tree for the brine source language.
//!
//! The parser produces a `Program`, a flat list of statements. There are
//! no compound statements: the grammar is a sequence of assignments,
//! imports, and expressions.

use brine_foundation::PyString;

use crate::span::Span;

/// A parsed program: a sequence of statements.
#[derive(Clone, Debug, PartialEq)]
pub struct Program {
    /// Top-level statements in source order.
    pub statements: Vec<Stmt>,
}

/// A statement.
#[derive(Clone, Debug, PartialEq)]
pub enum Stmt {
    /// Assignment: `a = b = value`. Targets are evaluated left to right.
    Assign {
        /// Assignment targets (names, subscripts, or attributes).
        targets: Vec<Expr>,
        /// The value being assigned.
        value: Expr,
        /// Source location.
        span: Span,
    },
    /// Import: `import a.b, c as d`
    Import {
        /// Imported modules with optional aliases.
        names: Vec<Alias>,
        /// Source location.
        span: Span,
    },
    /// From-import: `from mod import a, b as c`
    ImportFrom {
        /// The module to import from.
        module: String,
        /// Imported symbols with optional aliases.
        names: Vec<Alias>,
        /// Source location.
        span: Span,
    },
    /// A bare expression evaluated for its effect on the memo.
    Expr {
        /// The expression.
        value: Expr,
        /// Source location.
        span: Span,
    },
}

impl Stmt {
    /// Returns the source location of this statement.
    #[must_use]
    pub const fn span(&self) -> Span {
        match self {
            Self::Assign { span, .. }
            | Self::Import { span, .. }
            | Self::ImportFrom { span, .. }
            | Self::Expr { span, .. } => *span,
        }
    }
}

/// An import alias: `name` or `name as asname`.
#[derive(Clone, Debug, PartialEq)]
pub struct Alias {
    /// The imported name (possibly dotted for `import a.b`).
    pub name: String,
    /// The local binding name, if aliased.
    pub asname: Option<String>,
    /// Source location.
    pub span: Span,
}

impl Alias {
    /// Returns the name this alias binds locally.
    ///
    /// For `import a.b` without an alias the binding is the root package
    /// name `a`.
    #[must_use]
    pub fn binding(&self) -> &str {
        match &self.asname {
            Some(asname) => asname,
            None => self.name.split('.').next().unwrap_or(&self.name),
        }
    }
}

/// An expression.
#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    /// A literal constant.
    Constant {
        /// The constant value.
        value: Constant,
        /// Source location.
        span: Span,
    },
    /// A name reference.
    Name {
        /// The identifier.
        id: String,
        /// Source location.
        span: Span,
    },
    /// A tuple display: `(a, b, c)`
    Tuple {
        /// Element expressions.
        elts: Vec<Expr>,
        /// Source location.
        span: Span,
    },
    /// A list display: `[a, b, c]`
    List {
        /// Element expressions.
        elts: Vec<Expr>,
        /// Source location.
        span: Span,
    },
    /// A dict display: `{k: v}`
    Dict {
        /// Key expressions, parallel to `values`.
        keys: Vec<Expr>,
        /// Value expressions, parallel to `keys`.
        values: Vec<Expr>,
        /// Source location.
        span: Span,
    },
    /// A set display: `{a, b}`
    Set {
        /// Element expressions.
        elts: Vec<Expr>,
        /// Source location.
        span: Span,
    },
    /// A call: `f(a, b)`
    Call {
        /// The callee expression.
        func: Box<Expr>,
        /// Positional arguments.
        args: Vec<Expr>,
        /// Source location.
        span: Span,
    },
    /// Attribute access: `obj.attr`
    Attribute {
        /// The object expression.
        value: Box<Expr>,
        /// The attribute name.
        attr: String,
        /// Source location.
        span: Span,
    },
    /// Subscript access: `obj[index]`
    Subscript {
        /// The object expression.
        value: Box<Expr>,
        /// The index expression.
        index: Box<Expr>,
        /// Source location.
        span: Span,
    },
    /// Slice inside a subscript: `a[lo:hi:step]`
    Slice {
        /// Lower bound, if present.
        lower: Option<Box<Expr>>,
        /// Upper bound, if present.
        upper: Option<Box<Expr>>,
        /// Step, if present.
        step: Option<Box<Expr>>,
        /// Source location.
        span: Span,
    },
    /// Binary operation: `a + b`
    BinOp {
        /// Left operand.
        left: Box<Expr>,
        /// The operator.
        op: BinOpKind,
        /// Right operand.
        right: Box<Expr>,
        /// Source location.
        span: Span,
    },
    /// Unary operation: `-a`, `not a`, `~a`
    UnaryOp {
        /// The operator.
        op: UnaryOpKind,
        /// The operand.
        operand: Box<Expr>,
        /// Source location.
        span: Span,
    },
    /// Boolean operation: `a or b or c`, `a and b`
    BoolOp {
        /// The operator.
        op: BoolOpKind,
        /// Operands (at least two).
        values: Vec<Expr>,
        /// Source location.
        span: Span,
    },
    /// Comparison chain: `a < b < c`
    Compare {
        /// Leftmost operand.
        left: Box<Expr>,
        /// Operators, parallel to `comparators`.
        ops: Vec<CmpOp>,
        /// Remaining operands, parallel to `ops`.
        comparators: Vec<Expr>,
        /// Source location.
        span: Span,
    },
    /// Named expression (walrus): `(x := value)`
    NamedExpr {
        /// The name being bound.
        target: String,
        /// The value expression.
        value: Box<Expr>,
        /// Source location.
        span: Span,
    },
    /// Lambda expression: `lambda a, b: body`
    Lambda {
        /// Parameter names.
        params: Vec<String>,
        /// Body expression.
        body: Box<Expr>,
        /// Source location.
        span: Span,
    },
    /// A direct reference to a symbol in an external namespace.
    ///
    /// Never produced by the parser; the compiler synthesizes these when
    /// lowering operators and comparisons to library calls.
    ExternalRef {
        /// The module holding the symbol.
        module: &'static str,
        /// The symbol name.
        name: &'static str,
        /// Source location of the construct that required it.
        span: Span,
    },
}

impl Expr {
    /// Returns the source location of this expression.
    #[must_use]
    pub const fn span(&self) -> Span {
        match self {
            Self::Constant { span, .. }
            | Self::Name { span, .. }
            | Self::Tuple { span, .. }
            | Self::List { span, .. }
            | Self::Dict { span, .. }
            | Self::Set { span, .. }
            | Self::Call { span, .. }
            | Self::Attribute { span, .. }
            | Self::Subscript { span, .. }
            | Self::Slice { span, .. }
            | Self::BinOp { span, .. }
            | Self::UnaryOp { span, .. }
            | Self::BoolOp { span, .. }
            | Self::Compare { span, .. }
            | Self::NamedExpr { span, .. }
            | Self::Lambda { span, .. }
            | Self::ExternalRef { span, .. } => *span,
        }
    }
}

/// A literal constant value.
#[derive(Clone, Debug, PartialEq)]
pub enum Constant {
    /// `None`
    None,
    /// `...`
    Ellipsis,
    /// `True` or `False`
    Bool(bool),
    /// Integer literal.
    Int(i128),
    /// Float literal.
    Float(f64),
    /// String literal (may contain lone surrogates).
    Str(PyString),
    /// Bytes literal.
    Bytes(Vec<u8>),
}

/// Binary operator kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinOpKind {
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/`
    Div,
    /// `//`
    FloorDiv,
    /// `%`
    Mod,
    /// `**`
    Pow,
    /// `<<`
    LShift,
    /// `>>`
    RShift,
    /// `|`
    BitOr,
    /// `^`
    BitXor,
    /// `&`
    BitAnd,
    /// `@`
    MatMul,
}

impl BinOpKind {
    /// Returns the `operator` module function implementing this operator.
    #[must_use]
    pub const fn method_name(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Sub => "sub",
            Self::Mul => "mul",
            Self::Div => "truediv",
            Self::FloorDiv => "floordiv",
            Self::Mod => "mod",
            Self::Pow => "pow",
            Self::LShift => "lshift",
            Self::RShift => "rshift",
            Self::BitOr => "or_",
            Self::BitXor => "xor",
            Self::BitAnd => "and_",
            Self::MatMul => "matmul",
        }
    }
}

/// Unary operator kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnaryOpKind {
    /// `~`
    Invert,
    /// `not`
    Not,
    /// `+`
    Pos,
    /// `-`
    Neg,
}

impl UnaryOpKind {
    /// Returns the `operator` module function implementing this operator.
    #[must_use]
    pub const fn method_name(self) -> &'static str {
        match self {
            Self::Invert => "inv",
            Self::Not => "not_",
            Self::Pos => "pos",
            Self::Neg => "neg",
        }
    }
}

/// Boolean operator kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BoolOpKind {
    /// `and`
    And,
    /// `or`
    Or,
}

/// Comparison operator kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CmpOp {
    /// `==`
    Eq,
    /// `!=`
    NotEq,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
    /// `is`
    Is,
    /// `is not`
    IsNot,
    /// `in`
    In,
    /// `not in`
    NotIn,
}

impl CmpOp {
    /// Returns the `operator` module function implementing this comparison.
    ///
    /// `not in` has no single-call equivalent and returns `None`.
    #[must_use]
    pub const fn method_name(self) -> Option<&'static str> {
        match self {
            Self::Eq => Some("eq"),
            Self::NotEq => Some("ne"),
            Self::Lt => Some("lt"),
            Self::Le => Some("le"),
            Self::Gt => Some("gt"),
            Self::Ge => Some("ge"),
            Self::Is => Some("is_"),
            Self::IsNot => Some("is_not"),
            Self::In => Some("contains"),
            Self::NotIn => None,
        }
    }

    /// Returns the source text of this operator, for error messages.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Eq => "==",
            Self::NotEq => "!=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::Is => "is",
            Self::IsNot => "is not",
            Self::In => "in",
            Self::NotIn => "not in",
        }
    }
}
