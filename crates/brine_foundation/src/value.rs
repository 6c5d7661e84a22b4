//! Text values with surrogate passthrough.
//!
//! Pickle's unicode opcodes carry UTF-8 that may include encoded surrogate
//! code points (CPython's `surrogatepass` error handler). Rust's `String`
//! cannot hold lone surrogates, so string constants are kept as the exact
//! byte sequence that will be written to the output stream.

use std::fmt;

/// A text value encoded as UTF-8, permitting unpaired surrogates.
///
/// For ordinary text this is plain UTF-8. Surrogate code points
/// (U+D800..=U+DFFF) are stored in the three-byte form CPython's
/// `surrogatepass` handler produces.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct PyString {
    bytes: Vec<u8>,
}

impl PyString {
    /// Creates an empty string.
    #[must_use]
    pub const fn new() -> Self {
        Self { bytes: Vec::new() }
    }

    /// Returns the encoded bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Returns the encoded length in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Returns true if the string is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Appends a character.
    pub fn push(&mut self, c: char) {
        let mut buf = [0u8; 4];
        self.bytes.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
    }

    /// Appends a string slice.
    pub fn push_str(&mut self, s: &str) {
        self.bytes.extend_from_slice(s.as_bytes());
    }

    /// Appends the contents of another string.
    pub fn append(&mut self, other: &Self) {
        self.bytes.extend_from_slice(&other.bytes);
    }

    /// Appends a surrogate code point (U+D800..=U+DFFF).
    ///
    /// Encoded as the three-byte sequence `surrogatepass` would produce.
    ///
    /// # Panics
    /// Panics if `code` is not in the surrogate range.
    pub fn push_surrogate(&mut self, code: u16) {
        assert!(
            (0xD800..=0xDFFF).contains(&code),
            "not a surrogate code point: {code:#x}"
        );
        let cp = u32::from(code);
        self.bytes.push(0xE0 | (cp >> 12) as u8);
        self.bytes.push(0x80 | ((cp >> 6) & 0x3F) as u8);
        self.bytes.push(0x80 | (cp & 0x3F) as u8);
    }

    /// Returns the string as valid UTF-8, if it contains no surrogates.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.bytes).ok()
    }

    /// Returns true if the string contains an encoded surrogate.
    #[must_use]
    pub fn has_surrogates(&self) -> bool {
        std::str::from_utf8(&self.bytes).is_err()
    }
}

impl From<&str> for PyString {
    fn from(s: &str) -> Self {
        Self {
            bytes: s.as_bytes().to_vec(),
        }
    }
}

impl From<String> for PyString {
    fn from(s: String) -> Self {
        Self {
            bytes: s.into_bytes(),
        }
    }
}

impl fmt::Display for PyString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.bytes))
    }
}
