//! Memo slot allocation.
//!
//! The pickle machine's memo is the compiler's variable store. Every
//! bound name and every memoized external symbol is assigned a slot, in
//! first-use order, and later references fetch the slot instead of
//! re-emitting the value.

use std::collections::HashMap;

/// The slot reserved for assignment temporaries.
///
/// Multi-target assignments park the value here so each target can fetch
/// it. The allocator never hands this slot to a named binding, which
/// keeps the temporary encodable with the one-byte memo forms.
pub const TEMP_SLOT: u32 = 255;

/// What a memo slot holds.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum MemoKey {
    /// A program-level binding (assignment target or import alias).
    Local(String),
    /// A resolved external symbol, keyed by module and name.
    External {
        /// The module holding the symbol.
        module: String,
        /// The symbol name.
        name: String,
    },
}

impl MemoKey {
    /// Creates a key for a local binding.
    #[must_use]
    pub fn local(name: impl Into<String>) -> Self {
        Self::Local(name.into())
    }

    /// Creates a key for an external symbol.
    #[must_use]
    pub fn external(module: impl Into<String>, name: impl Into<String>) -> Self {
        Self::External {
            module: module.into(),
            name: name.into(),
        }
    }
}

/// Allocates memo slots in first-use order.
#[derive(Debug, Default)]
pub struct MemoManager {
    slots: HashMap<MemoKey, u32>,
    next: u32,
}

impl MemoManager {
    /// Creates an empty memo manager.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the slot for a key, if it has been bound.
    #[must_use]
    pub fn get(&self, key: &MemoKey) -> Option<u32> {
        self.slots.get(key).copied()
    }

    /// Returns true if the key has a slot.
    #[must_use]
    pub fn contains(&self, key: &MemoKey) -> bool {
        self.slots.contains_key(key)
    }

    /// Returns the slot for a key, allocating the next one on first use.
    ///
    /// Rebinding an existing key reuses its slot.
    pub fn bind(&mut self, key: MemoKey) -> u32 {
        if let Some(slot) = self.slots.get(&key) {
            return *slot;
        }
        let slot = self.next;
        self.next += 1;
        if self.next == TEMP_SLOT {
            self.next += 1;
        }
        self.slots.insert(key, slot);
        slot
    }

    /// Returns the number of bound slots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns true if no slots are bound.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
