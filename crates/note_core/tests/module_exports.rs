//! Integration tests for module exports.
//!
//! Verify that public modules and types are reachable via absolute paths and
//! through the crate-root re-exports.

/// Codec functions are reachable via `note_core::codec`.
#[test]
fn test_codec_module_exports() {
    use note_core::codec::barrier::encode_barrier;
    use note_core::codec::coupon::{get_coupons, parse_coupon_at};
    use note_core::types::{ObservationFrequency, TriggerType};

    let id = encode_barrier(9_000, ObservationFrequency::OneWeek, TriggerType::KnockOut).unwrap();
    let packed = get_coupons(&[u64::from(id)]).unwrap();
    assert_eq!(parse_coupon_at(&packed, 0).unwrap(), u64::from(id));
}

/// Crate-root re-exports resolve to the same types.
#[test]
fn test_root_reexports() {
    let token: note_core::TokenRef = note_core::types::TokenRef::ZERO;
    assert!(token.is_zero());

    let err: note_core::CodecError = note_core::types::CodecError::ZeroThreshold;
    assert_eq!(format!("{}", err), "Barrier threshold must be non-zero");

    let packed = note_core::PackedCoupons::EMPTY;
    assert!(packed.is_empty());
}

/// Unit constants are exported from `note_core::types`.
#[test]
fn test_unit_exports() {
    use note_core::types::{MAX_COUPONS, MAX_OPTIONS, PERCENT_SCALE, UNIT};

    assert_eq!(PERCENT_SCALE, 10_000);
    assert_eq!(UNIT, 1_000_000);
    assert_eq!(MAX_COUPONS, 4);
    assert_eq!(MAX_OPTIONS, 4);
}
