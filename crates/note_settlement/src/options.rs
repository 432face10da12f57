//! Option payoff primitive.
//!
//! Option legs refer to their option through an opaque [`TokenRef`]. The
//! [`OptionPayoff`] trait resolves a token's terms and its per-unit payout;
//! [`VanillaOptionPayoff`] understands the [`OptionToken`] layout.

use note_core::codec::OptionToken;
use note_core::types::TokenRef;

use crate::error::Result;
use crate::oracle::PriceSnapshot;

/// Settlement-relevant terms of an option token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OptionTerms {
    /// Option expiry timestamp.
    pub expiry: u64,
    /// Asset the option pays out in.
    pub collateral_id: u8,
}

/// Option payoff collaborator.
pub trait OptionPayoff: Send + Sync {
    /// Expiry and collateral of `token`.
    fn terms(&self, token: &TokenRef) -> Result<OptionTerms>;

    /// Payout per unit of `token` at `UNIT_DECIMALS`, reading prices through
    /// `snapshot`.
    fn payout_per_unit(&self, token: &TokenRef, snapshot: &PriceSnapshot<'_>) -> Result<u128>;
}

/// European vanilla call/put payoff settled on the price at option expiry.
///
/// # Examples
/// ```
/// use note_core::codec::{OptionKind, OptionToken};
/// use note_settlement::oracle::{InMemoryOracle, PriceFeed, PriceSnapshot};
/// use note_settlement::options::{OptionPayoff, VanillaOptionPayoff};
///
/// let token = OptionToken {
///     kind: OptionKind::Put,
///     underlying_id: 1,
///     strike_id: 2,
///     collateral_id: 2,
///     expiry: 500,
///     strike: 1_000_000,
/// }
/// .encode();
///
/// let oracle = InMemoryOracle::new(0);
/// oracle.set_time(500);
/// oracle.report_price(PriceFeed { oracle_id: 0, base: 1, quote: 2 }, 500, 600_000).unwrap();
/// let snapshot = PriceSnapshot::new(&oracle, &oracle, 0, true);
///
/// assert_eq!(VanillaOptionPayoff.payout_per_unit(&token, &snapshot).unwrap(), 400_000);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct VanillaOptionPayoff;

impl OptionPayoff for VanillaOptionPayoff {
    fn terms(&self, token: &TokenRef) -> Result<OptionTerms> {
        let option = OptionToken::decode(token)?;
        Ok(OptionTerms {
            expiry: option.expiry,
            collateral_id: option.collateral_id,
        })
    }

    fn payout_per_unit(&self, token: &TokenRef, snapshot: &PriceSnapshot<'_>) -> Result<u128> {
        let option = OptionToken::decode(token)?;
        let spot = snapshot.price(option.underlying_id, option.strike_id, option.expiry)?;
        Ok(option.kind.intrinsic(spot, u128::from(option.strike)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use note_core::codec::OptionKind;
    use note_core::types::CodecError;

    use crate::error::SettlementError;
    use crate::oracle::{InMemoryOracle, PriceFeed};

    fn token(kind: OptionKind) -> TokenRef {
        OptionToken {
            kind,
            underlying_id: 1,
            strike_id: 2,
            collateral_id: 3,
            expiry: 1_000,
            strike: 2_000_000,
        }
        .encode()
    }

    fn oracle(price: u128) -> InMemoryOracle {
        let oracle = InMemoryOracle::new(0);
        oracle.set_time(1_000);
        oracle
            .report_price(
                PriceFeed {
                    oracle_id: 0,
                    base: 1,
                    quote: 2,
                },
                1_000,
                price,
            )
            .unwrap();
        oracle
    }

    #[test]
    fn test_terms() {
        let terms = VanillaOptionPayoff.terms(&token(OptionKind::Call)).unwrap();
        assert_eq!(
            terms,
            OptionTerms {
                expiry: 1_000,
                collateral_id: 3
            }
        );
    }

    #[test]
    fn test_call_and_put() {
        let oracle = oracle(2_500_000);
        let snapshot = PriceSnapshot::new(&oracle, &oracle, 0, true);
        assert_eq!(
            VanillaOptionPayoff
                .payout_per_unit(&token(OptionKind::Call), &snapshot)
                .unwrap(),
            500_000
        );
        assert_eq!(
            VanillaOptionPayoff
                .payout_per_unit(&token(OptionKind::Put), &snapshot)
                .unwrap(),
            0
        );
    }

    #[test]
    fn test_malformed_token() {
        let mut bytes = [0u8; 32];
        bytes[0] = 0xff;
        assert!(matches!(
            VanillaOptionPayoff.terms(&TokenRef::from_bytes(bytes)),
            Err(SettlementError::Codec(CodecError::InvalidOptionKind(0xff)))
        ));
        assert!(matches!(
            VanillaOptionPayoff.terms(&TokenRef::from_bytes([0xffu8; 32])),
            Err(SettlementError::Codec(CodecError::MalformedToken(_)))
        ));
    }
}
