//! Core types shared by every layer of the brine compiler.
//!
//! This crate provides:
//! - [`Error`] - Rich error types with source-location context
//! - [`PyString`] - Text values encoded as UTF-8 with surrogate passthrough
//!
//! # Architecture
//!
//! ```text
//! Layer 2: brine_cli        — Command-line front end
//! Layer 1: brine_language   — Lexer, parser, compiler, optimizer
//! Layer 0: brine_foundation — Core types (Error, PyString)
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod value;

pub use error::{Error, ErrorContext, ErrorKind, Result};
pub use value::PyString;
