//! Shared arithmetic helpers for slab calculations.

use rust_decimal::{Decimal, RoundingStrategy};

/// Rounds to two decimal places, with midpoints rounded away from zero.
///
/// ```
/// use rust_decimal_macros::dec;
/// use tax_core::calculations::common::round_half_up;
///
/// assert_eq!(round_half_up(dec!(470.004)), dec!(470.00));
/// assert_eq!(round_half_up(dec!(470.005)), dec!(470.01));
/// assert_eq!(round_half_up(dec!(-12.345)), dec!(-12.35));
/// ```
pub fn round_half_up(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Clamps `value` to `[lower, upper]`; an absent `upper` means no ceiling.
///
/// ```
/// use rust_decimal_macros::dec;
/// use tax_core::calculations::common::clamp_to_slab;
///
/// assert_eq!(clamp_to_slab(dec!(485000), dec!(250000), Some(dec!(500000))), dec!(485000));
/// assert_eq!(clamp_to_slab(dec!(700000), dec!(250000), Some(dec!(500000))), dec!(500000));
/// assert_eq!(clamp_to_slab(dec!(100000), dec!(250000), Some(dec!(500000))), dec!(250000));
/// assert_eq!(clamp_to_slab(dec!(9000000), dec!(1000000), None), dec!(9000000));
/// ```
pub fn clamp_to_slab(
    value: Decimal,
    lower: Decimal,
    upper: Option<Decimal>,
) -> Decimal {
    let floored = value.max(lower);
    match upper {
        Some(upper) => floored.min(upper),
        None => floored,
    }
}
