//! Fixed bit-field helper shared by every packed layout.

use crate::types::CodecError;

/// A field at a fixed offset and width inside a 64-bit word.
///
/// Fields of one layout never overlap, so packing one field can never disturb
/// a neighbour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct BitField {
    name: &'static str,
    offset: u32,
    width: u32,
}

impl BitField {
    pub(crate) const fn new(name: &'static str, offset: u32, width: u32) -> Self {
        Self {
            name,
            offset,
            width,
        }
    }

    /// Largest value the field can hold.
    #[inline]
    pub(crate) const fn max(&self) -> u64 {
        if self.width >= 64 {
            u64::MAX
        } else {
            (1u64 << self.width) - 1
        }
    }

    /// Places `value` at the field offset, rejecting values wider than the field.
    #[inline]
    pub(crate) fn pack(&self, value: u64) -> Result<u64, CodecError> {
        if value > self.max() {
            return Err(CodecError::FieldOutOfRange {
                field: self.name,
                value,
                max: self.max(),
            });
        }
        Ok(value << self.offset)
    }

    #[inline]
    pub(crate) fn unpack(&self, word: u64) -> u64 {
        (word >> self.offset) & self.max()
    }
}
