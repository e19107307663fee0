//! Progressive slab tax.
//!
//! Two formulations are provided and must agree for every [`RegimeVariant`]:
//!
//! | function | method |
//! |----------|--------|
//! | [`compute_marginal_tax`] | walk the slabs, tax the portion of income inside each, stop at the containing slab |
//! | [`compute_from_base_tax`] | find the containing slab, return `base_tax + (income - min_income) * rate` |
//!
//! `RegimeVariant` construction guarantees each `base_tax` equals the
//! cumulative tax at its lower bound, which is what makes the two agree.
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use tax_core::{DeductionRule, RegimeVariant};
//! use tax_core::calculations::{compute_from_base_tax, compute_marginal_tax};
//!
//! let variant = RegimeVariant::from_slabs(
//!     "nri_old",
//!     &[
//!         (dec!(0), dec!(0)),
//!         (dec!(250000), dec!(0.05)),
//!         (dec!(500000), dec!(0.20)),
//!         (dec!(1000000), dec!(0.30)),
//!     ],
//!     DeductionRule::Allowed,
//! )
//! .unwrap();
//!
//! assert_eq!(compute_marginal_tax(dec!(700000), &variant), dec!(52500));
//! assert_eq!(compute_from_base_tax(dec!(700000), &variant), dec!(52500));
//! ```

use rust_decimal::Decimal;

use crate::RegimeVariant;
use crate::calculations::common::clamp_to_slab;

/// Sums `rate * portion` over every slab the income reaches.
///
/// Negative income is treated as zero, so the result is never negative.
pub fn compute_marginal_tax(
    taxable_income: Decimal,
    variant: &RegimeVariant,
) -> Decimal {
    let income = taxable_income.max(Decimal::ZERO);
    let mut tax = Decimal::ZERO;

    for bracket in variant.brackets() {
        let portion =
            clamp_to_slab(income, bracket.min_income, bracket.max_income) - bracket.min_income;
        tax += portion * bracket.tax_rate;

        if bracket.max_income.is_none_or(|max| income <= max) {
            break;
        }
    }

    tax
}

/// Uses the precomputed `base_tax` of the slab containing the income.
///
/// Income exactly on a boundary is taken from the upper slab, whose remainder
/// is then zero.
pub fn compute_from_base_tax(
    taxable_income: Decimal,
    variant: &RegimeVariant,
) -> Decimal {
    let income = taxable_income.max(Decimal::ZERO);

    variant
        .brackets()
        .iter()
        .rev()
        .find(|bracket| income >= bracket.min_income)
        .map_or(Decimal::ZERO, |bracket| {
            bracket.base_tax + (income - bracket.min_income) * bracket.tax_rate
        })
}
