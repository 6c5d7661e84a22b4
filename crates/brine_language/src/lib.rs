//! Lexer, parser, and compiler for the brine source language.
//!
//! This crate provides:
//! - `Lexer` - Tokenization of the restricted Python-like surface grammar
//! - `Parser` - Parsing tokens into AST
//! - `Compiler` - Compiling AST to a pickle protocol 4 byte stream
//! - `optimize` - Dead-store elimination over a finished byte stream

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod ast;
pub mod compiler;
pub mod gensym;
pub mod lexer;
pub mod memo;
pub mod opcode;
pub mod optimizer;
pub mod parser;
pub mod span;
pub mod token;

pub use ast::{Constant, Expr, Program, Stmt};
pub use compiler::{CompileOptions, Compiler, LambdaMode, RESERVED_RESULT_NAME, compile_source};
pub use lexer::Lexer;
pub use memo::{MemoKey, MemoManager, TEMP_SLOT};
pub use opcode::PickleStream;
pub use optimizer::optimize;
pub use parser::{Parser, parse};
pub use span::Span;
pub use token::{Token, TokenKind};
