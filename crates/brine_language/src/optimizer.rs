//! Peephole optimization of finished pickle streams.
//!
//! Memo store instructions whose slot is never fetched are dead and can
//! be removed without changing what the stream decodes to.
//! The rewrite is idempotent, and a stream with no dead stores passes
//! through unchanged.

use std::collections::HashSet;

use brine_foundation::{Error, Result};

use crate::opcode::op;

/// Removes memo stores for slots that are never fetched.
///
/// # Errors
/// Fails with an internal error if the stream contains an opcode this
/// compiler never emits; the optimizer refuses to guess at operand widths.
pub fn optimize(stream: &[u8]) -> Result<Vec<u8>> {
    let mut fetched: HashSet<u32> = HashSet::new();
    let mut cursor = Cursor::new(stream);
    while let Some(instruction) = cursor.next_instruction()? {
        if let Kind::Get(slot) = instruction.kind {
            fetched.insert(slot);
        }
    }

    let mut out = Vec::with_capacity(stream.len());
    let mut cursor = Cursor::new(stream);
    while let Some(instruction) = cursor.next_instruction()? {
        if let Kind::Put(slot) = instruction.kind {
            if !fetched.contains(&slot) {
                continue;
            }
        }
        out.extend_from_slice(&stream[instruction.start..instruction.end]);
    }
    Ok(out)
}

/// What an instruction does with the memo, if anything.
enum Kind {
    Put(u32),
    Get(u32),
    Other,
}

/// One decoded instruction's extent in the stream.
struct Instruction {
    start: usize,
    end: usize,
    kind: Kind,
}

/// Instruction-granular walker over a pickle stream.
struct Cursor<'a> {
    stream: &'a [u8],
    position: usize,
}

impl<'a> Cursor<'a> {
    fn new(stream: &'a [u8]) -> Self {
        Self {
            stream,
            position: 0,
        }
    }

    /// Decodes the next instruction, or `None` at end of stream.
    fn next_instruction(&mut self) -> Result<Option<Instruction>> {
        let start = self.position;
        let Some(&opcode) = self.stream.get(self.position) else {
            return Ok(None);
        };
        self.position += 1;

        let kind = match opcode {
            op::BINPUT => Kind::Put(u32::from(self.take_u8()?)),
            op::LONG_BINPUT => Kind::Put(self.take_u32()?),
            op::BINGET => Kind::Get(u32::from(self.take_u8()?)),
            op::LONG_BINGET => Kind::Get(self.take_u32()?),

            op::PROTO => {
                self.take_u8()?;
                Kind::Other
            }
            op::STOP
            | op::MARK
            | op::POP_MARK
            | op::NONE
            | op::NEWTRUE
            | op::NEWFALSE
            | op::EMPTY_TUPLE
            | op::TUPLE1
            | op::TUPLE2
            | op::TUPLE3
            | op::TUPLE
            | op::LIST
            | op::DICT
            | op::EMPTY_DICT
            | op::EMPTY_SET
            | op::ADDITEMS
            | op::FROZENSET
            | op::SETITEM
            | op::REDUCE
            | op::BUILD
            | op::STACK_GLOBAL
            | op::MEMOIZE => Kind::Other,

            op::BININT1 => {
                self.take_u8()?;
                Kind::Other
            }
            op::BININT2 => {
                self.take_bytes(2)?;
                Kind::Other
            }
            op::BININT => {
                self.take_bytes(4)?;
                Kind::Other
            }
            op::INT | op::FLOAT | op::LONG => {
                self.take_line()?;
                Kind::Other
            }
            op::GLOBAL | op::INST => {
                self.take_line()?;
                self.take_line()?;
                Kind::Other
            }
            op::SHORT_BINUNICODE | op::SHORT_BINBYTES => {
                let len = usize::from(self.take_u8()?);
                self.take_bytes(len)?;
                Kind::Other
            }
            op::BINUNICODE | op::BINBYTES => {
                let len = self.take_u32()? as usize;
                self.take_bytes(len)?;
                Kind::Other
            }

            other => {
                return Err(Error::internal(format!(
                    "optimizer: unrecognized opcode {other:#04x} at offset {start}"
                )));
            }
        };

        Ok(Some(Instruction {
            start,
            end: self.position,
            kind,
        }))
    }

    fn take_u8(&mut self) -> Result<u8> {
        let byte = *self
            .stream
            .get(self.position)
            .ok_or_else(|| Error::internal("optimizer: truncated instruction operand"))?;
        self.position += 1;
        Ok(byte)
    }

    fn take_u32(&mut self) -> Result<u32> {
        let bytes = self.take_bytes(4)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    fn take_bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        let end = self
            .position
            .checked_add(len)
            .filter(|&end| end <= self.stream.len())
            .ok_or_else(|| Error::internal("optimizer: truncated instruction operand"))?;
        let bytes = &self.stream[self.position..end];
        self.position = end;
        Ok(bytes)
    }

    /// Consumes a newline-terminated text operand.
    fn take_line(&mut self) -> Result<()> {
        while self.take_u8()? != b'\n' {}
        Ok(())
    }
}
