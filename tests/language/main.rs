//! Integration tests for the brine compiler pipeline.
//!
//! Tests for lexer, parser, compiler, and optimizer, plus a reference
//! unpickler used to verify decoded values.

mod optimizer;
mod unpickle;
