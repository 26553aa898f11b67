//! # Pricing Engine
//!
//! Computes the price of a single article from its physical inputs and the
//! day's rate. Pure: no lookup, no persistence, no clock.
//!
//! ## Computation Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      price_item(input, rate)                            │
//! │                                                                         │
//! │  validate ──► net = gross − less                                        │
//! │                    │                                                    │
//! │                    ▼                                                    │
//! │               metal_value = net × rate        (one rounding point)      │
//! │                    │                                                    │
//! │                    ▼                                                    │
//! │               making charge by policy         (FIX / % / per-gram)     │
//! │               − making discount, floored at 0                          │
//! │                    │                                                    │
//! │                    ▼                                                    │
//! │               + other charges                                           │
//! │                    │                                                    │
//! │                    ▼                                                    │
//! │               exchange? − 3% of the whole     (once, never compounded) │
//! │                    │                                                    │
//! │                    ▼                                                    │
//! │                 PricedItem                                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Rate lookup is the **caller's** job: the billing service fetches the Rate
//! for (metal type, purity) and turns a missing row into
//! [`CoreError::RateNotFound`] before this module ever runs.

use serde::{Deserialize, Serialize};

use crate::error::CoreResult;
use crate::money::Money;
use crate::types::{ItemInput, MakingCharge};
use crate::validation::{
    validate_making_charge, validate_non_negative_paise, validate_product_name, validate_purity,
    validate_quantity, validate_rate, validate_weights,
};
use crate::weight::Weight;
use crate::EXCHANGE_DEDUCTION_BPS;

// =============================================================================
// Priced Item
// =============================================================================

/// The derived money components of one priced article.
///
/// The billing service combines this with the original [`ItemInput`] to
/// build the persisted line item; nothing here is ever recomputed after
/// the bill is saved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricedItem {
    pub net_weight_mg: i64,
    pub metal_value_paise: i64,
    pub making_charge_paise: i64,
    pub exchange_deduction_paise: i64,
    pub total_paise: i64,
}

impl PricedItem {
    /// Returns the net weight as a Weight.
    #[inline]
    pub fn net_weight(&self) -> Weight {
        Weight::from_milligrams(self.net_weight_mg)
    }

    /// Returns the metal value as Money.
    #[inline]
    pub fn metal_value(&self) -> Money {
        Money::from_paise(self.metal_value_paise)
    }

    /// Returns the effective making charge as Money.
    #[inline]
    pub fn making_charge(&self) -> Money {
        Money::from_paise(self.making_charge_paise)
    }

    /// Returns the exchange deduction as Money (zero for sale items).
    #[inline]
    pub fn exchange_deduction(&self) -> Money {
        Money::from_paise(self.exchange_deduction_paise)
    }

    /// Returns the line total as Money.
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_paise(self.total_paise)
    }
}

// =============================================================================
// price_item
// =============================================================================

/// Prices one article.
///
/// ## Arguments
/// * `input` - the raw article as entered at the counter
/// * `rate` - the current rate per gram (per carat for diamond) for the
///   article's (metal type, purity); the caller resolves the lookup
///
/// ## Computation Order
/// 1. `net = gross − less` - a negative result is a `ValidationError`
///    before any money math runs
/// 2. `metal_value = net × rate`, half-up rounded
/// 3. Making charge by policy: fixed verbatim; percent of metal value;
///    per-gram on net weight
/// 4. Making discount subtracted, floored at zero
/// 5. `pre_deduction = metal_value + making + other charges`
/// 6. Exchange items lose [`EXCHANGE_DEDUCTION_BPS`] (3%) of the whole
///    pre-deduction total - applied exactly once, never to metal value
///    in isolation
///
/// ## Example
/// ```rust
/// use sona_core::money::Money;
/// use sona_core::pricing::price_item;
/// use sona_core::types::{ItemInput, MakingCharge, MetalType, Unit};
///
/// let input = ItemInput {
///     product_name: "Gold Chain".to_string(),
///     metal_type: MetalType::Gold,
///     purity: "22K".to_string(),
///     unit: Unit::Gram,
///     quantity: 1,
///     gross_weight_mg: 10_000,
///     less_weight_mg: 0,
///     making_charge: MakingCharge::Percent { rate_bps: 1000 },
///     making_discount_paise: 0,
///     other_charges_paise: 0,
///     is_exchange: false,
/// };
///
/// let priced = price_item(&input, Money::from_rupees(6_000)).unwrap();
/// assert_eq!(priced.metal_value(), Money::from_rupees(60_000));
/// assert_eq!(priced.making_charge(), Money::from_rupees(6_000));
/// assert_eq!(priced.total(), Money::from_rupees(66_000));
/// ```
pub fn price_item(input: &ItemInput, rate: Money) -> CoreResult<PricedItem> {
    // All validation up front; nothing monetary happens on bad input
    validate_product_name(&input.product_name)?;
    validate_purity(&input.purity)?;
    validate_weights(input.gross_weight_mg, input.less_weight_mg)?;
    validate_quantity(input.quantity)?;
    validate_rate(rate)?;
    validate_making_charge(&input.making_charge)?;
    validate_non_negative_paise("making_discount", input.making_discount_paise)?;
    validate_non_negative_paise("other_charges", input.other_charges_paise)?;

    let net = input.gross_weight() - input.less_weight();
    let metal_value = net.times_rate(rate);

    let raw_making = match input.making_charge {
        MakingCharge::Fixed { amount_paise } => Money::from_paise(amount_paise),
        MakingCharge::Percent { rate_bps } => metal_value.calculate_percentage(rate_bps),
        MakingCharge::PerGram { rate_paise } => net.times_rate(Money::from_paise(rate_paise)),
    };
    let making = (raw_making - Money::from_paise(input.making_discount_paise)).clamp_at_zero();

    let pre_deduction = metal_value + making + Money::from_paise(input.other_charges_paise);

    let exchange_deduction = if input.is_exchange {
        pre_deduction.calculate_percentage(EXCHANGE_DEDUCTION_BPS)
    } else {
        Money::zero()
    };
    let total = pre_deduction - exchange_deduction;

    Ok(PricedItem {
        net_weight_mg: net.milligrams(),
        metal_value_paise: metal_value.paise(),
        making_charge_paise: making.paise(),
        exchange_deduction_paise: exchange_deduction.paise(),
        total_paise: total.paise(),
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{CoreError, ValidationError};
    use crate::types::{MetalType, Unit};

    fn gold_chain_10g() -> ItemInput {
        ItemInput {
            product_name: "Gold Chain".to_string(),
            metal_type: MetalType::Gold,
            purity: "22K".to_string(),
            unit: Unit::Gram,
            quantity: 1,
            gross_weight_mg: 10_000,
            less_weight_mg: 0,
            making_charge: MakingCharge::Percent { rate_bps: 1000 },
            making_discount_paise: 0,
            other_charges_paise: 0,
            is_exchange: false,
        }
    }

    #[test]
    fn test_sale_item_ten_grams_at_six_thousand() {
        // 10 g × Rs 6,000 = 60,000; making 10% = 6,000; total 66,000
        let priced = price_item(&gold_chain_10g(), Money::from_rupees(6_000)).unwrap();

        assert_eq!(priced.net_weight(), Weight::from_grams(10));
        assert_eq!(priced.metal_value(), Money::from_rupees(60_000));
        assert_eq!(priced.making_charge(), Money::from_rupees(6_000));
        assert_eq!(priced.exchange_deduction(), Money::zero());
        assert_eq!(priced.total(), Money::from_rupees(66_000));
    }

    #[test]
    fn test_exchange_item_deducts_three_percent_of_whole() {
        // Same article as exchange: pre-deduction 66,000;
        // deduction = 3% of 66,000 = 1,980; total 64,020
        let mut input = gold_chain_10g();
        input.is_exchange = true;

        let priced = price_item(&input, Money::from_rupees(6_000)).unwrap();

        assert_eq!(priced.exchange_deduction(), Money::from_rupees(1_980));
        assert_eq!(priced.total(), Money::from_rupees(64_020));
    }

    #[test]
    fn test_net_weight_subtracts_less() {
        let mut input = gold_chain_10g();
        input.gross_weight_mg = 12_500;
        input.less_weight_mg = 2_500;

        let priced = price_item(&input, Money::from_rupees(6_000)).unwrap();
        assert_eq!(priced.net_weight(), Weight::from_grams(10));
        assert_eq!(priced.metal_value(), Money::from_rupees(60_000));
    }

    #[test]
    fn test_less_exceeding_gross_rejected_before_money_math() {
        let mut input = gold_chain_10g();
        input.gross_weight_mg = 2_500;
        input.less_weight_mg = 10_000;

        let err = price_item(&input, Money::from_rupees(6_000)).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::Inconsistent { .. })
        ));
    }

    #[test]
    fn test_fixed_making_charge_ignores_weight() {
        let mut input = gold_chain_10g();
        input.making_charge = MakingCharge::Fixed {
            amount_paise: 350_000, // Rs 3,500 flat
        };

        let priced = price_item(&input, Money::from_rupees(6_000)).unwrap();
        assert_eq!(priced.making_charge(), Money::from_rupees(3_500));
        assert_eq!(priced.total(), Money::from_rupees(63_500));
    }

    #[test]
    fn test_per_gram_making_charge() {
        let mut input = gold_chain_10g();
        input.making_charge = MakingCharge::PerGram {
            rate_paise: 45_000, // Rs 450/g
        };

        let priced = price_item(&input, Money::from_rupees(6_000)).unwrap();
        // 10 g × Rs 450 = Rs 4,500
        assert_eq!(priced.making_charge(), Money::from_rupees(4_500));
        assert_eq!(priced.total(), Money::from_rupees(64_500));
    }

    #[test]
    fn test_making_discount_floors_at_zero() {
        let mut input = gold_chain_10g();
        // Raw making = Rs 6,000; discount Rs 10,000 exceeds it
        input.making_discount_paise = 1_000_000;

        let priced = price_item(&input, Money::from_rupees(6_000)).unwrap();
        assert_eq!(priced.making_charge(), Money::zero());
        assert_eq!(priced.total(), Money::from_rupees(60_000));
    }

    #[test]
    fn test_other_charges_included_in_deduction_base() {
        // Deduction is 3% of metal + making + other, never metal alone
        let mut input = gold_chain_10g();
        input.other_charges_paise = 400_000; // Rs 4,000 stone setting
        input.is_exchange = true;

        let priced = price_item(&input, Money::from_rupees(6_000)).unwrap();
        // pre = 60,000 + 6,000 + 4,000 = 70,000; 3% = 2,100
        assert_eq!(priced.exchange_deduction(), Money::from_rupees(2_100));
        assert_eq!(priced.total(), Money::from_rupees(67_900));
    }

    #[test]
    fn test_zero_rate_rejected() {
        let err = price_item(&gold_chain_10g(), Money::zero()).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::MustBePositive { .. })
        ));
    }

    #[test]
    fn test_negative_discount_rejected() {
        let mut input = gold_chain_10g();
        input.making_discount_paise = -1;
        assert!(price_item(&input, Money::from_rupees(6_000)).is_err());
    }

    #[test]
    fn test_empty_product_name_rejected() {
        let mut input = gold_chain_10g();
        input.product_name = "  ".to_string();
        assert!(price_item(&input, Money::from_rupees(6_000)).is_err());
    }

    #[test]
    fn test_zero_quantity_weight_only_line_prices() {
        // Loose stones / sweepings: no piece count, still priced by weight
        let mut input = gold_chain_10g();
        input.quantity = 0;
        assert!(price_item(&input, Money::from_rupees(6_000)).is_ok());
    }

    #[test]
    fn test_fractional_weight_rounds_half_up_once() {
        let mut input = gold_chain_10g();
        input.gross_weight_mg = 10_575; // 10.575 g
        input.making_charge = MakingCharge::Fixed { amount_paise: 0 };

        let priced = price_item(&input, Money::from_rupees(6_245)).unwrap();
        // 10575 × 624500 / 1000 = 6,604,087.5 → 6,604,088 paise
        assert_eq!(priced.metal_value_paise, 6_604_088);
        assert_eq!(priced.total_paise, 6_604_088);
    }
}

// =============================================================================
// Property Tests
// =============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;
    use crate::types::{MetalType, Unit};
    use proptest::prelude::*;

    /// Strategy for a valid (gross, less) milligram pair.
    fn weights_strategy() -> impl Strategy<Value = (i64, i64)> {
        (0i64..=50_000_000).prop_flat_map(|gross| (Just(gross), 0..=gross))
    }

    /// Strategy for a valid making-charge policy.
    fn making_charge_strategy() -> impl Strategy<Value = MakingCharge> {
        prop_oneof![
            (0i64..=10_000_000).prop_map(|amount_paise| MakingCharge::Fixed { amount_paise }),
            (0i64..=5_000).prop_map(|rate_bps| MakingCharge::Percent { rate_bps }),
            (0i64..=100_000).prop_map(|rate_paise| MakingCharge::PerGram { rate_paise }),
        ]
    }

    fn input_strategy() -> impl Strategy<Value = ItemInput> {
        (
            weights_strategy(),
            making_charge_strategy(),
            0i64..=2_000_000,
            0i64..=2_000_000,
            any::<bool>(),
            0i64..=50,
        )
            .prop_map(
                |((gross, less), making_charge, discount, other, is_exchange, quantity)| {
                    ItemInput {
                        product_name: "Gold Ring".to_string(),
                        metal_type: MetalType::Gold,
                        purity: "22K".to_string(),
                        unit: Unit::Gram,
                        quantity,
                        gross_weight_mg: gross,
                        less_weight_mg: less,
                        making_charge,
                        making_discount_paise: discount,
                        other_charges_paise: other,
                        is_exchange,
                    }
                },
            )
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        /// Net weight is always gross − less and never negative.
        #[test]
        fn prop_net_weight_law(input in input_strategy(), rate in 1i64..=100_000_000) {
            let priced = price_item(&input, Money::from_paise(rate)).unwrap();
            prop_assert_eq!(
                priced.net_weight_mg,
                input.gross_weight_mg - input.less_weight_mg
            );
            prop_assert!(priced.net_weight_mg >= 0);
        }

        /// Making charge never goes negative, however large the discount.
        #[test]
        fn prop_making_charge_floored(input in input_strategy(), rate in 1i64..=100_000_000) {
            let priced = price_item(&input, Money::from_paise(rate)).unwrap();
            prop_assert!(priced.making_charge_paise >= 0);
        }

        /// The deduction is exactly 3% of the pre-deduction total, once,
        /// and only for exchange items.
        #[test]
        fn prop_exchange_deduction_base(input in input_strategy(), rate in 1i64..=100_000_000) {
            let priced = price_item(&input, Money::from_paise(rate)).unwrap();
            let pre = priced.metal_value()
                + priced.making_charge()
                + Money::from_paise(input.other_charges_paise);

            if input.is_exchange {
                prop_assert_eq!(
                    priced.exchange_deduction(),
                    pre.calculate_percentage(EXCHANGE_DEDUCTION_BPS)
                );
            } else {
                prop_assert_eq!(priced.exchange_deduction(), Money::zero());
            }
            prop_assert_eq!(priced.total(), pre - priced.exchange_deduction());
        }
    }
}
