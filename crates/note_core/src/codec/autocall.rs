//! Autocall feature and its packed form.
//!
//! Layout: bit 32 is the reverse flag, bits 31..0 carry the barrier id.

use super::barrier::decode_barrier;
use super::bits::BitField;
use crate::types::{AutocallId, BarrierId, CodecError};

const REVERSE: BitField = BitField::new("is_reverse", 32, 1);
const BARRIER: BitField = BitField::new("barrier_id", 0, 32);

/// Early-termination feature.
///
/// A normal autocall terminates the instrument at the first observation whose
/// barrier is breached. A reverse autocall terminates at the first observation
/// whose barrier is *not* breached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Autocall {
    /// Inverts the trigger condition.
    pub is_reverse: bool,
    /// Packed barrier id.
    pub barrier_id: BarrierId,
}

impl Autocall {
    /// Packs this autocall into its identifier.
    pub fn encode(&self) -> Result<AutocallId, CodecError> {
        encode_autocall(self.is_reverse, self.barrier_id)
    }
}

/// Packs autocall fields into an autocall id.
///
/// # Errors
/// `ZeroThreshold` when `barrier_id` is 0 (an autocall without a barrier can
/// never trigger); any barrier decode error for a malformed id.
pub fn encode_autocall(is_reverse: bool, barrier_id: BarrierId) -> Result<AutocallId, CodecError> {
    decode_barrier(barrier_id)?;
    Ok(REVERSE.pack(u64::from(is_reverse))? | BARRIER.pack(u64::from(barrier_id))?)
}

/// Unpacks an autocall id.
pub fn decode_autocall(id: AutocallId) -> Result<Autocall, CodecError> {
    let unused = id >> 33;
    if unused != 0 {
        return Err(CodecError::FieldOutOfRange {
            field: "autocall_reserved",
            value: unused,
            max: 0,
        });
    }
    Ok(Autocall {
        is_reverse: REVERSE.unpack(id) == 1,
        barrier_id: BARRIER.unpack(id) as BarrierId,
    })
}

/// Unpacks an autocall id where 0 means "no autocall".
pub fn decode_optional_autocall(id: AutocallId) -> Result<Option<Autocall>, CodecError> {
    if id == 0 {
        return Ok(None);
    }
    decode_autocall(id).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::barrier::encode_barrier;
    use crate::types::{ObservationFrequency, TriggerType};

    fn call_barrier() -> BarrierId {
        encode_barrier(10_500, ObservationFrequency::ThreeMonths, TriggerType::Autocall).unwrap()
    }

    #[test]
    fn test_round_trip() {
        for is_reverse in [false, true] {
            let autocall = Autocall {
                is_reverse,
                barrier_id: call_barrier(),
            };
            let id = autocall.encode().unwrap();
            assert_eq!(decode_autocall(id).unwrap(), autocall);
        }
    }

    #[test]
    fn test_reverse_bit() {
        let id = encode_autocall(true, call_barrier()).unwrap();
        assert_eq!(id >> 32, 1);
        assert_eq!(id as u32, call_barrier());
    }

    #[test]
    fn test_requires_barrier() {
        assert_eq!(encode_autocall(false, 0), Err(CodecError::ZeroThreshold));
    }

    #[test]
    fn test_optional() {
        assert_eq!(decode_optional_autocall(0).unwrap(), None);
        let id = encode_autocall(false, call_barrier()).unwrap();
        assert!(decode_optional_autocall(id).unwrap().is_some());
    }

    #[test]
    fn test_reserved_bits_rejected() {
        let id = encode_autocall(false, call_barrier()).unwrap() | (1 << 40);
        assert!(matches!(
            decode_autocall(id),
            Err(CodecError::FieldOutOfRange { field: "autocall_reserved", .. })
        ));
    }
}
