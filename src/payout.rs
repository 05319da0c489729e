// DLC Core Library: lifecycle management & settlement of discreet log contracts
// Written in 2020 by
//     DLC Core Library contributors
//
// To the extent possible under law, the author(s) have dedicated all
// copyright and related and neighboring rights to this software to
// the public domain worldwide. This software is distributed without
// any warranty.
//
// You should have received a copy of the MIT License
// along with this software.
// If not, see <https://opensource.org/licenses/MIT>.

//! Two-point linear payout curve with saturation.
//!
//! All the math is done on integers: both parties must derive exactly the
//! same split from the same attestation, so no floating point is involved.

use crate::error::ConfigurationIssue;
use crate::OracleValue;

/// Amount in the smallest currency unit
pub type Sats = u64;

/// Calibration points of the payout curve. At or beyond `high` the offering
/// party receives the whole pot; at or beyond `low` it receives nothing.
/// `high` may be numerically smaller than `low`, which gives the offering
/// party the short side of the curve.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Display)]
#[display("{high}..{low}")]
pub struct Division {
    high: OracleValue,
    low: OracleValue,
}

impl Division {
    pub fn new(high: OracleValue, low: OracleValue) -> Result<Self, ConfigurationIssue> {
        if high == low {
            return Err(ConfigurationIssue::DivisionCollapse);
        }
        Ok(Division { high, low })
    }

    #[inline]
    pub fn high(&self) -> OracleValue {
        self.high
    }

    #[inline]
    pub fn low(&self) -> OracleValue {
        self.low
    }
}

/// Funding contributed by both parties; their sum is guaranteed to fit into
/// [`Sats`].
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct Funding {
    own: Sats,
    counterparty: Sats,
    pot: Sats,
}

impl Funding {
    pub fn new(own: Sats, counterparty: Sats) -> Result<Self, ConfigurationIssue> {
        let pot = own
            .checked_add(counterparty)
            .ok_or(ConfigurationIssue::FundingOverflow)?;
        Ok(Funding {
            own,
            counterparty,
            pot,
        })
    }

    #[inline]
    pub fn own(&self) -> Sats {
        self.own
    }

    #[inline]
    pub fn counterparty(&self) -> Sats {
        self.counterparty
    }

    /// Total amount distributed at settlement
    #[inline]
    pub fn pot(&self) -> Sats {
        self.pot
    }
}

/// Split of the pot between the two parties. Shares always sum up to the pot.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default, Display)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate", rename_all = "camelCase")
)]
#[display("{own}:{counterparty}")]
pub struct Payout {
    pub own: Sats,
    pub counterparty: Sats,
}

impl Payout {
    /// Same split seen from the other party
    #[inline]
    pub fn mirrored(self) -> Payout {
        Payout {
            own: self.counterparty,
            counterparty: self.own,
        }
    }

    #[inline]
    pub fn total(&self) -> Sats {
        self.own + self.counterparty
    }
}

/// Computes split of the pot for a reported `value`, where `own` is the share
/// of the offering party, i.e. the one receiving everything at
/// `division.high()`.
///
/// The offering party share is `round(t · pot)` with
/// `t = clamp((value − low) / (high − low), 0, 1)`; exact halves are rounded
/// up. The counterparty receives the rest.
pub fn compute_payout(value: OracleValue, division: &Division, funding: &Funding) -> Payout {
    let pot = funding.pot();
    // Orient the interval so that `num / den` is `t` with a positive `den`
    let (num, den) = if division.high > division.low {
        (value as i128 - division.low as i128, division.high as i128 - division.low as i128)
    } else {
        (division.low as i128 - value as i128, division.low as i128 - division.high as i128)
    };

    let own = if num <= 0 {
        0
    } else if num >= den {
        pot
    } else {
        // 0 < num < den < 2^64 and pot < 2^64, so the product fits
        let (num, den) = (num as u128, den as u128);
        let product = num * pot as u128;
        let quotient = product / den;
        let remainder = product % den;
        let rounded = if remainder >= den - remainder {
            quotient + 1
        } else {
            quotient
        };
        rounded as Sats
    };

    Payout {
        own,
        counterparty: pot - own,
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use proptest::prelude::*;

    fn funding(own: Sats, counterparty: Sats) -> Funding {
        Funding::new(own, counterparty).unwrap()
    }

    #[test]
    fn test_tutorial_contract() {
        let division = Division::new(20000, 10000).unwrap();
        let funding = funding(100_000_000, 100_000_000);

        let payout = compute_payout(15000, &division, &funding);
        assert_eq!(payout, Payout {
            own: 100_000_000,
            counterparty: 100_000_000
        });
        let payout = compute_payout(25000, &division, &funding);
        assert_eq!(payout, Payout {
            own: 200_000_000,
            counterparty: 0
        });
        let payout = compute_payout(15161, &division, &funding);
        assert_eq!(payout, Payout {
            own: 103_220_000,
            counterparty: 96_780_000
        });
    }

    #[test]
    fn test_saturation_at_calibration_points() {
        let division = Division::new(20000, 10000).unwrap();
        let funding = funding(70, 30);
        assert_eq!(compute_payout(20000, &division, &funding), Payout { own: 100, counterparty: 0 });
        assert_eq!(compute_payout(10000, &division, &funding), Payout { own: 0, counterparty: 100 });
        assert_eq!(compute_payout(i64::MAX, &division, &funding).own, 100);
        assert_eq!(compute_payout(i64::MIN, &division, &funding).own, 0);
    }

    #[test]
    fn test_inverted_division() {
        let division = Division::new(10000, 20000).unwrap();
        let funding = funding(1000, 1000);
        assert_eq!(compute_payout(10000, &division, &funding).own, 2000);
        assert_eq!(compute_payout(5000, &division, &funding).own, 2000);
        assert_eq!(compute_payout(20000, &division, &funding).own, 0);
        assert_eq!(compute_payout(17500, &division, &funding).own, 500);
    }

    #[test]
    fn test_rounding() {
        let division = Division::new(2, 0).unwrap();
        // t = 1/2 of 3 = 1.5 rounds up
        assert_eq!(compute_payout(1, &division, &funding(2, 1)).own, 2);
        let division = Division::new(3, 0).unwrap();
        // 1/3 of 100 = 33.33 and 2/3 of 100 = 66.67
        assert_eq!(compute_payout(1, &division, &funding(50, 50)).own, 33);
        assert_eq!(compute_payout(2, &division, &funding(50, 50)).own, 67);
    }

    #[test]
    fn test_extreme_ranges() {
        let division = Division::new(i64::MAX, i64::MIN).unwrap();
        let funding = funding(u64::MAX - 1, 1);
        let payout = compute_payout(0, &division, &funding);
        assert_eq!(payout.total(), u64::MAX);
        assert!(payout.own > u64::MAX / 2 - 2 && payout.own < u64::MAX / 2 + 2);
    }

    #[test]
    fn test_invalid_configuration() {
        assert_eq!(Division::new(5, 5), Err(ConfigurationIssue::DivisionCollapse));
        assert_eq!(Funding::new(u64::MAX, 1), Err(ConfigurationIssue::FundingOverflow));
    }

    proptest! {
        #[test]
        fn prop_shares_sum_to_pot(
            value in any::<i64>(),
            high in any::<i64>(),
            low in any::<i64>(),
            own in 0..=u64::MAX / 2,
            counterparty in 0..=u64::MAX / 2,
        ) {
            prop_assume!(high != low);
            let division = Division::new(high, low).unwrap();
            let funding = funding(own, counterparty);
            let payout = compute_payout(value, &division, &funding);
            prop_assert_eq!(payout.own + payout.counterparty, own + counterparty);
            prop_assert_eq!(compute_payout(high, &division, &funding).own, own + counterparty);
            prop_assert_eq!(compute_payout(low, &division, &funding).own, 0);
        }

        #[test]
        fn prop_monotonic_towards_high(
            a in -100_000i64..100_000,
            b in -100_000i64..100_000,
            pot in 1u64..=21_000_000_0000_0000,
        ) {
            let division = Division::new(50_000, -50_000).unwrap();
            let funding = funding(pot, 0);
            let (lo, hi) = if a < b { (a, b) } else { (b, a) };
            prop_assert!(
                compute_payout(lo, &division, &funding).own <= compute_payout(hi, &division, &funding).own
            );
        }
    }
}
