//! Integration tests for the peephole optimizer.
//!
//! The optimizer contract: semantics-preserving, idempotent, removes
//! exactly the memo stores whose slot is never fetched.

use proptest::prelude::*;

use brine_language::{CompileOptions, compile_source, optimize};

use crate::unpickle::unpickle;

fn compile_unoptimized(source: &str) -> Vec<u8> {
    let options = CompileOptions {
        optimize: false,
        ..CompileOptions::default()
    };
    compile_source(source, &options).unwrap()
}

#[test]
fn removes_stores_for_unread_bindings() {
    // y is never read, so its store can go
    let raw = compile_unoptimized("x = 1\ny = 2\nRETURN = x");
    let optimized = optimize(&raw).unwrap();
    assert!(optimized.len() < raw.len());
    assert_eq!(unpickle(&optimized).unwrap(), unpickle(&raw).unwrap());
}

#[test]
fn preserves_stores_for_read_bindings() {
    let raw = compile_unoptimized("x = 1\nRETURN = x");
    let optimized = optimize(&raw).unwrap();
    assert_eq!(unpickle(&optimized).unwrap(), unpickle(&raw).unwrap());
}

#[test]
fn idempotent_on_compiled_programs() {
    for source in [
        "",
        "RETURN = 1",
        "x = 1\ny = x\nRETURN = (y, y)",
        "import os\nRETURN = os",
        "RETURN = (1 < 2 < 3)",
        "RETURN = (0 or 3)",
    ] {
        let raw = compile_unoptimized(source);
        let once = optimize(&raw).unwrap();
        let twice = optimize(&once).unwrap();
        assert_eq!(once, twice, "not idempotent for {source:?}");
    }
}

#[test]
fn decoded_value_unchanged_by_optimization() {
    for source in [
        "RETURN = \"hello\"",
        "x = {\"k\": 1}\nx[\"k\"] = 2\nRETURN = x",
        "x = dict()\nx.a = 5\nRETURN = x.a",
        "RETURN = (2 and 0)",
        "RETURN = 1 in (1, 2)",
    ] {
        let raw = compile_unoptimized(source);
        let optimized = optimize(&raw).unwrap();
        assert_eq!(
            unpickle(&optimized).unwrap(),
            unpickle(&raw).unwrap(),
            "semantics changed for {source:?}"
        );
    }
}

#[test]
fn default_pipeline_applies_optimizer() {
    let raw = compile_unoptimized("y = 2\nRETURN = 1");
    let piped = compile_source("y = 2\nRETURN = 1", &CompileOptions::default()).unwrap();
    assert_eq!(piped, optimize(&raw).unwrap());
}

proptest! {
    #[test]
    fn optimizer_never_grows_streams(n in any::<u8>(), reads in 0usize..3) {
        let mut source = format!("a = {n}\nb = a\n");
        let result = match reads {
            0 => "RETURN = None",
            1 => "RETURN = a",
            _ => "RETURN = (a, b)",
        };
        source.push_str(result);
        let raw = compile_unoptimized(&source);
        let optimized = optimize(&raw).unwrap();
        prop_assert!(optimized.len() <= raw.len());
        prop_assert_eq!(unpickle(&optimized).unwrap(), unpickle(&raw).unwrap());
    }
}
