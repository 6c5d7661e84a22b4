//! Pickle protocol 4 opcodes and the output byte stream.
//!
//! `PickleStream` is an append-only buffer with one emit method per
//! construct the compiler produces. Width selection (one-byte versus
//! four-byte argument forms, integer encoding tiers) lives here so the
//! compiler deals only in values.

use brine_foundation::PyString;

/// Raw opcode bytes, named as in CPython's `pickletools`.
pub mod op {
    /// Protocol version header.
    pub const PROTO: u8 = 0x80;
    /// End of stream; topmost value is the result.
    pub const STOP: u8 = b'.';
    /// Push a mark onto the stack.
    pub const MARK: u8 = b'(';
    /// Pop everything down to and including the topmost mark.
    pub const POP_MARK: u8 = b'1';
    /// Push `None`.
    pub const NONE: u8 = b'N';
    /// Push `True`.
    pub const NEWTRUE: u8 = 0x88;
    /// Push `False`.
    pub const NEWFALSE: u8 = 0x89;
    /// Push a one-byte unsigned integer.
    pub const BININT1: u8 = b'K';
    /// Push a two-byte little-endian unsigned integer.
    pub const BININT2: u8 = b'M';
    /// Push a four-byte little-endian signed integer.
    pub const BININT: u8 = b'J';
    /// Push an integer from decimal text.
    pub const INT: u8 = b'I';
    /// Push a float from decimal text.
    pub const FLOAT: u8 = b'F';
    /// Push UTF-8 text with a one-byte length.
    pub const SHORT_BINUNICODE: u8 = 0x8C;
    /// Push UTF-8 text with a four-byte length.
    pub const BINUNICODE: u8 = b'X';
    /// Push bytes with a one-byte length.
    pub const SHORT_BINBYTES: u8 = b'C';
    /// Push bytes with a four-byte length.
    pub const BINBYTES: u8 = b'B';
    /// Push an empty tuple.
    pub const EMPTY_TUPLE: u8 = b')';
    /// Build a one-element tuple from the top of stack.
    pub const TUPLE1: u8 = 0x85;
    /// Build a two-element tuple.
    pub const TUPLE2: u8 = 0x86;
    /// Build a three-element tuple.
    pub const TUPLE3: u8 = 0x87;
    /// Build a tuple from everything above the topmost mark.
    pub const TUPLE: u8 = b't';
    /// Build a list from everything above the topmost mark.
    pub const LIST: u8 = b'l';
    /// Build a dict from key/value pairs above the topmost mark.
    pub const DICT: u8 = b'd';
    /// Push an empty dict.
    pub const EMPTY_DICT: u8 = b'}';
    /// Push an empty set.
    pub const EMPTY_SET: u8 = 0x8F;
    /// Add items above the topmost mark to the set below it.
    pub const ADDITEMS: u8 = 0x90;
    /// Store key/value into the dict below them.
    pub const SETITEM: u8 = b's';
    /// Call: apply a callable to an argument tuple.
    pub const REDUCE: u8 = b'R';
    /// Apply state (attributes) to the object below.
    pub const BUILD: u8 = b'b';
    /// Resolve module/name strings from the stack to an object.
    pub const STACK_GLOBAL: u8 = 0x93;
    /// Resolve a module/name pair given as two text lines.
    pub const GLOBAL: u8 = b'c';
    /// Instantiate a class from two text lines and marked arguments.
    pub const INST: u8 = b'i';
    /// Fetch a memo slot (one-byte index).
    pub const BINGET: u8 = b'h';
    /// Fetch a memo slot (four-byte index).
    pub const LONG_BINGET: u8 = b'j';
    /// Store the top of stack in a memo slot (one-byte index).
    pub const BINPUT: u8 = b'q';
    /// Store the top of stack in a memo slot (four-byte index).
    pub const LONG_BINPUT: u8 = b'r';
    /// Store the top of stack in the next sequential memo slot.
    pub const MEMOIZE: u8 = 0x94;
    /// Push a long from decimal text.
    pub const LONG: u8 = b'L';
    /// Build a frozenset from items above the topmost mark.
    pub const FROZENSET: u8 = 0x91;
}

/// The highest integer that fits the one-byte `BININT1` form.
const BININT1_MAX: i128 = 0xFF;
/// The highest integer that fits the two-byte `BININT2` form.
const BININT2_MAX: i128 = 0xFFFF;
/// Strings and bytes up to this length use the one-byte-length forms.
const SHORT_LEN_MAX: usize = 0xFF;

/// An append-only pickle byte stream.
#[derive(Clone, Debug, Default)]
pub struct PickleStream {
    buf: Vec<u8>,
}

impl PickleStream {
    /// Creates an empty stream.
    #[must_use]
    pub const fn new() -> Self {
        Self { buf: Vec::new() }
    }

    /// Returns the bytes emitted so far.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Returns the number of bytes emitted so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Returns true if nothing has been emitted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Consumes the stream and returns the bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    /// Emits a single raw opcode.
    pub fn emit(&mut self, opcode: u8) {
        self.buf.push(opcode);
    }

    /// Emits the protocol header.
    pub fn proto(&mut self, version: u8) {
        self.buf.push(op::PROTO);
        self.buf.push(version);
    }

    /// Emits `STOP`.
    pub fn stop(&mut self) {
        self.buf.push(op::STOP);
    }

    /// Emits `MARK`.
    pub fn mark(&mut self) {
        self.buf.push(op::MARK);
    }

    /// Emits `POP_MARK`.
    pub fn pop_mark(&mut self) {
        self.buf.push(op::POP_MARK);
    }

    /// Pushes `None`.
    pub fn none(&mut self) {
        self.buf.push(op::NONE);
    }

    /// Pushes a boolean.
    pub fn bool(&mut self, value: bool) {
        self.buf.push(if value { op::NEWTRUE } else { op::NEWFALSE });
    }

    /// Pushes an integer in its narrowest encoding.
    ///
    /// Unsigned one- and two-byte forms, then the signed four-byte form,
    /// then decimal text for anything wider.
    pub fn int(&mut self, value: i128) {
        if (0..=BININT1_MAX).contains(&value) {
            self.buf.push(op::BININT1);
            self.buf.push(value as u8);
        } else if (0..=BININT2_MAX).contains(&value) {
            self.buf.push(op::BININT2);
            self.buf.extend_from_slice(&(value as u16).to_le_bytes());
        } else if i128::from(i32::MIN) <= value && value <= i128::from(i32::MAX) {
            self.buf.push(op::BININT);
            self.buf.extend_from_slice(&(value as i32).to_le_bytes());
        } else {
            self.buf.push(op::INT);
            self.buf.extend_from_slice(value.to_string().as_bytes());
            self.buf.push(b'\n');
        }
    }

    /// Pushes a float as decimal text.
    pub fn float(&mut self, value: f64) {
        self.buf.push(op::FLOAT);
        self.buf.extend_from_slice(format_float(value).as_bytes());
        self.buf.push(b'\n');
    }

    /// Pushes a unicode string, choosing the short form when it fits.
    pub fn string(&mut self, value: &PyString) {
        let bytes = value.as_bytes();
        if bytes.len() <= SHORT_LEN_MAX {
            self.buf.push(op::SHORT_BINUNICODE);
            self.buf.push(bytes.len() as u8);
        } else {
            self.buf.push(op::BINUNICODE);
            self.buf.extend_from_slice(&(bytes.len() as u32).to_le_bytes());
        }
        self.buf.extend_from_slice(bytes);
    }

    /// Pushes a bytes object, choosing the short form when it fits.
    pub fn bytes(&mut self, value: &[u8]) {
        if value.len() <= SHORT_LEN_MAX {
            self.buf.push(op::SHORT_BINBYTES);
            self.buf.push(value.len() as u8);
        } else {
            self.buf.push(op::BINBYTES);
            self.buf.extend_from_slice(&(value.len() as u32).to_le_bytes());
        }
        self.buf.extend_from_slice(value);
    }

    /// Builds a fixed-arity tuple from the values already on the stack.
    pub fn tuple(&mut self, arity: usize) {
        match arity {
            0 => self.buf.push(op::EMPTY_TUPLE),
            1 => self.buf.push(op::TUPLE1),
            2 => self.buf.push(op::TUPLE2),
            3 => self.buf.push(op::TUPLE3),
            // Caller emitted MARK before the elements
            _ => self.buf.push(op::TUPLE),
        }
    }

    /// Fetches a memo slot.
    pub fn get(&mut self, slot: u32) {
        if let Ok(slot) = u8::try_from(slot) {
            self.buf.push(op::BINGET);
            self.buf.push(slot);
        } else {
            self.buf.push(op::LONG_BINGET);
            self.buf.extend_from_slice(&slot.to_le_bytes());
        }
    }

    /// Stores the top of stack in a memo slot.
    pub fn put(&mut self, slot: u32) {
        if let Ok(slot) = u8::try_from(slot) {
            self.buf.push(op::BINPUT);
            self.buf.push(slot);
        } else {
            self.buf.push(op::LONG_BINPUT);
            self.buf.extend_from_slice(&slot.to_le_bytes());
        }
    }

    /// Resolves a module/name pair with the text `GLOBAL` form.
    pub fn global(&mut self, module: &str, name: &str) {
        self.buf.push(op::GLOBAL);
        self.text_line(module);
        self.text_line(name);
    }

    /// Instantiates a class with the text `INST` form.
    ///
    /// The caller has already pushed `MARK` and the constructor arguments.
    pub fn inst(&mut self, module: &str, name: &str) {
        self.buf.push(op::INST);
        self.text_line(module);
        self.text_line(name);
    }

    /// Writes one newline-terminated text argument.
    fn text_line(&mut self, text: &str) {
        self.buf.extend_from_slice(text.as_bytes());
        self.buf.push(b'\n');
    }
}

/// Formats a float the way Python's `repr` does.
fn format_float(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    let text = format!("{value}");
    // Python repr always shows a fractional part for integral floats
    if text.contains('.') || text.contains('e') || text.contains('E') {
        text
    } else {
        format!("{text}.0")
    }
}
