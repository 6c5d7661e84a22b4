//! Gensym generator for lowering hygiene.
//!
//! Lowering comparison chains and boolean operators binds intermediate
//! values to synthetic names. Those names share the memo namespace with
//! user bindings, so they must be impossible to write in source.

/// Generator for unique synthetic names.
///
/// The counter is per-instance rather than global so that compiling the
/// same program twice produces identical output.
#[derive(Clone, Debug, Default)]
pub struct GensymGenerator {
    counter: u64,
}

impl GensymGenerator {
    /// Creates a new generator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Generates a unique name based on the given base.
    ///
    /// The `#` separator cannot appear in an identifier, so generated
    /// names never collide with user bindings.
    pub fn gensym(&mut self, base: &str) -> String {
        let id = self.counter;
        self.counter += 1;
        format!("{base}#{id}")
    }
}
