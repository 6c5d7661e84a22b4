//! Brine - a compiler from a restricted Python-like language to pickle bytecode
//!
//! This crate re-exports all layers of the brine system for convenient access.
//! For detailed documentation, see the individual layer crates.
//!
//! # Architecture
//!
//! ```text
//! Layer 1: brine_language   — Lexer, parser, pickle compiler, optimizer
//! Layer 0: brine_foundation — Core types (Error, PyString)
//! ```

pub use brine_foundation as foundation;
pub use brine_language as language;

pub use brine_language::{CompileOptions, LambdaMode, compile_source};
