//! Error types for the brine compiler.
//!
//! Uses `thiserror` for ergonomic error definition with rich context.

use std::fmt;

use thiserror::Error as ThisError;

/// Convenient result alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for brine operations.
#[derive(Debug, ThisError)]
#[error("{kind}")]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,
    /// Optional context about where the error occurred.
    pub context: Option<ErrorContext>,
}

impl Error {
    /// Creates a new error with the given kind.
    #[must_use]
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            context: None,
        }
    }

    /// Adds context to this error.
    #[must_use]
    pub fn with_context(mut self, context: ErrorContext) -> Self {
        self.context = Some(context);
        self
    }

    /// Creates an undefined-name error.
    #[must_use]
    pub fn undefined_name(name: impl Into<String>) -> Self {
        Self::new(ErrorKind::UndefinedName(name.into()))
    }

    /// Creates a reserved-name misuse error.
    #[must_use]
    pub fn reserved_name(name: impl Into<String>) -> Self {
        Self::new(ErrorKind::ReservedName(name.into()))
    }

    /// Creates an unsupported-construct error.
    #[must_use]
    pub fn unsupported(what: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unsupported(what.into()))
    }

    /// Creates a macro arity error.
    #[must_use]
    pub fn macro_arity(name: impl Into<String>, expected: usize, actual: usize) -> Self {
        Self::new(ErrorKind::MacroArity {
            name: name.into(),
            expected,
            actual,
        })
    }

    /// Creates a macro argument error.
    #[must_use]
    pub fn macro_argument(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::MacroArgument {
            name: name.into(),
            message: message.into(),
        })
    }

    /// Creates a feature-disabled error.
    #[must_use]
    pub fn feature_disabled(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::FeatureDisabled(message.into()))
    }

    /// Creates an internal error (a broken compiler invariant, not user input).
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal(message.into()))
    }
}

/// Categorized error kinds for pattern matching.
#[derive(Debug, ThisError)]
pub enum ErrorKind {
    /// A plain identifier that is neither a bound name nor a builtin.
    #[error("name '{0}' is not defined")]
    UndefinedName(String),

    /// The reserved result name used outside the final-statement return form.
    #[error(
        "name '{0}' is reserved for the program result; \
         it may only be the sole target of the final statement"
    )]
    ReservedName(String),

    /// An AST node kind, assignment target, or literal with no compilation rule.
    #[error("unsupported: {0}")]
    Unsupported(String),

    /// Wrong number of arguments to a macro intrinsic.
    #[error("macro {name} expected {expected} arguments, got {actual}")]
    MacroArity {
        /// The macro name.
        name: String,
        /// Number of arguments the macro requires.
        expected: usize,
        /// Number of arguments provided.
        actual: usize,
    },

    /// A macro argument that is not the literal form the macro requires.
    #[error("macro {name}: {message}")]
    MacroArgument {
        /// The macro name.
        name: String,
        /// Description of the argument problem.
        message: String,
    },

    /// A compilation feature that is disabled or not available.
    #[error("{0}")]
    FeatureDisabled(String),

    /// Parse error in source text.
    #[error("parse error at {line}:{column}: {message}")]
    ParseError {
        /// Description of the parse error.
        message: String,
        /// Line number (1-indexed).
        line: u32,
        /// Column number (1-indexed).
        column: u32,
        /// The source line where the error occurred.
        context: String,
    },

    /// Internal error (should not happen).
    #[error("internal error: {0}")]
    Internal(String),
}

/// Context about where an error occurred.
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    /// Source file name.
    pub source: Option<String>,
    /// Line number in source (1-indexed).
    pub line: Option<u32>,
    /// Column number in source (1-indexed).
    pub column: Option<u32>,
    /// The offending source line, when available.
    pub snippet: Option<String>,
}

impl ErrorContext {
    /// Creates a new empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the source file name.
    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Sets the line and column.
    #[must_use]
    pub fn with_position(mut self, line: u32, column: u32) -> Self {
        self.line = Some(line);
        self.column = Some(column);
        self
    }

    /// Sets the offending source line.
    #[must_use]
    pub fn with_snippet(mut self, snippet: impl Into<String>) -> Self {
        self.snippet = Some(snippet.into());
        self
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(source) = &self.source {
            write!(f, "at {source}")?;
            if let (Some(line), Some(col)) = (self.line, self.column) {
                write!(f, ":{line}:{col}")?;
            }
        } else if let (Some(line), Some(col)) = (self.line, self.column) {
            write!(f, "at {line}:{col}")?;
        }
        if let Some(snippet) = &self.snippet {
            writeln!(f)?;
            write!(f, "    {snippet}")?;
        }
        Ok(())
    }
}
