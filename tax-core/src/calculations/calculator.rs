//! Tax computation orchestrator.
//!
//! Turns a profile plus raw income and deduction figures into a
//! [`TaxResult`]:
//!
//! | step | value |
//! |------|-------|
//! | 1 | validate every input is non-negative |
//! | 2 | resolve the slab schedule for the profile |
//! | 3 | total income = sum of income heads |
//! | 4 | total deductions = capped deductions, if the schedule allows them |
//! | 5 | taxable income = step 3 - step 4, never clamped |
//! | 6 | gross tax from the slab schedule |
//! | 7 | cess = 4% of gross tax |
//! | 8 | net payable = gross tax + cess - TDS - advance tax |
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use tax_core::calculations::TaxCalculator;
//! use tax_core::registry::statutory_registry;
//! use tax_core::{
//!     DeductionSet, EntityCategory, IncomeBreakdown, RegimeChoice, ResidencyStatus,
//!     TaxpayerProfile,
//! };
//!
//! let calculator = TaxCalculator::new(statutory_registry().unwrap());
//! let profile = TaxpayerProfile::new(
//!     45,
//!     ResidencyStatus::Resident,
//!     EntityCategory::IndividualSalaried,
//!     RegimeChoice::OldRegime,
//! );
//! let income = IncomeBreakdown {
//!     primary_income: dec!(485000),
//!     ..IncomeBreakdown::default()
//! };
//!
//! let result = calculator
//!     .calculate(&profile, &income, &DeductionSet::default(), dec!(0), dec!(0))
//!     .unwrap();
//!
//! assert_eq!(result.gross_tax, dec!(11750.00));
//! assert_eq!(result.tax_with_cess, dec!(12220.00));
//! ```

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::calculations::brackets::{compute_from_base_tax, compute_marginal_tax};
use crate::calculations::common::round_half_up;
use crate::registry::RegimeRegistry;
use crate::resolver::EligibilityResolver;
use crate::{DeductionSet, IncomeBreakdown, RegimeVariant, TaxError, TaxResult, TaxpayerProfile};

/// Health and education cess, applied to gross tax.
pub const CESS_RATE: Decimal = Decimal::from_parts(4, 0, 0, false, 2);

/// Every input of a single computation, usable as a cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaxComputationInput {
    pub profile: TaxpayerProfile,
    pub income: IncomeBreakdown,
    pub deductions: DeductionSet,
    pub tds: Decimal,
    pub advance_tax: Decimal,
}

impl TaxComputationInput {
    /// Copy with every amount stripped of trailing zeros, so equal inputs
    /// yield identical results whatever scale they were written with.
    pub fn normalized(&self) -> Self {
        let income = &self.income;
        let deductions = &self.deductions;
        Self {
            profile: self.profile,
            income: IncomeBreakdown {
                primary_income: income.primary_income.normalize(),
                house_property_income: income.house_property_income.normalize(),
                capital_gains: income.capital_gains.normalize(),
                other_income: income.other_income.normalize(),
            },
            deductions: DeductionSet {
                section_80c: deductions.section_80c.normalize(),
                section_80d: deductions.section_80d.normalize(),
                section_80g: deductions.section_80g.normalize(),
            },
            tds: self.tds.normalize(),
            advance_tax: self.advance_tax.normalize(),
        }
    }
}

/// Stateless calculator over a borrowed [`RegimeRegistry`].
///
/// Holds no mutable state, so one instance may be shared freely across
/// threads.
#[derive(Debug, Clone, Copy)]
pub struct TaxCalculator<'a> {
    resolver: EligibilityResolver<'a>,
}

impl<'a> TaxCalculator<'a> {
    pub fn new(registry: &'a RegimeRegistry) -> Self {
        Self {
            resolver: EligibilityResolver::new(registry),
        }
    }

    /// Computes the tax for one profile and set of figures.
    ///
    /// # Errors
    ///
    /// - [`TaxError::NegativeInput`] if the age or any amount is negative
    /// - [`TaxError::UnsupportedCombination`] if no schedule applies to the profile
    /// - [`TaxError::DeductionsExceedIncome`] if deductions push taxable income below zero
    /// - [`TaxError::AmountOutOfRange`] if a total does not fit in a `Decimal`
    /// - [`TaxError::Internal`] if the resolved schedule is inconsistent
    pub fn calculate(
        &self,
        profile: &TaxpayerProfile,
        income: &IncomeBreakdown,
        deductions: &DeductionSet,
        tds: Decimal,
        advance_tax: Decimal,
    ) -> Result<TaxResult, TaxError> {
        validate_inputs(profile, income, deductions, tds, advance_tax)?;

        let variant = self.resolver.resolve(profile)?;

        let total_income = income.total().ok_or(TaxError::AmountOutOfRange {
            field: "total_income",
        })?;
        let deductions_applied = variant.deductions().applies();
        let total_deductions = if deductions_applied {
            deductions.capped_total().ok_or(TaxError::AmountOutOfRange {
                field: "total_deductions",
            })?
        } else {
            if !deductions.is_empty() {
                warn!(
                    variant = variant.name(),
                    regime = profile.regime.as_str(),
                    claimed = ?deductions.capped_total(),
                    "deductions are not allowed under this schedule; ignoring them"
                );
            }
            Decimal::ZERO
        };

        let taxable_income = total_income - total_deductions;
        if taxable_income < Decimal::ZERO {
            return Err(TaxError::DeductionsExceedIncome {
                total_income,
                total_deductions,
            });
        }

        let gross_tax = round_half_up(slab_tax(taxable_income, variant)?);
        let cess = round_half_up(gross_tax * CESS_RATE);
        let tax_with_cess = gross_tax
            .checked_add(cess)
            .ok_or(TaxError::AmountOutOfRange {
                field: "tax_with_cess",
            })?;
        let net_tax_payable = tax_with_cess
            .checked_sub(tds)
            .and_then(|net| net.checked_sub(advance_tax))
            .ok_or(TaxError::AmountOutOfRange {
                field: "net_tax_payable",
            })?;

        debug!(
            variant = variant.name(),
            %total_income,
            %total_deductions,
            %taxable_income,
            %gross_tax,
            %cess,
            %net_tax_payable,
            "computed tax"
        );

        Ok(TaxResult {
            total_income,
            total_deductions,
            taxable_income,
            gross_tax,
            cess,
            tax_with_cess,
            tds,
            advance_tax,
            net_tax_payable,
            regime_variant: variant.name().to_string(),
            deductions_applied,
        })
    }

    /// [`calculate`](Self::calculate) over a bundled input.
    pub fn calculate_input(
        &self,
        input: &TaxComputationInput,
    ) -> Result<TaxResult, TaxError> {
        self.calculate(
            &input.profile,
            &input.income,
            &input.deductions,
            input.tds,
            input.advance_tax,
        )
    }
}

/// Rejects a negative age or amount, naming the first offending field.
fn validate_inputs(
    profile: &TaxpayerProfile,
    income: &IncomeBreakdown,
    deductions: &DeductionSet,
    tds: Decimal,
    advance_tax: Decimal,
) -> Result<(), TaxError> {
    if profile.age < 0 {
        return Err(TaxError::NegativeInput {
            field: "age",
            value: Decimal::from(profile.age),
        });
    }

    let amounts = income
        .components()
        .into_iter()
        .chain(
            deductions
                .components()
                .into_iter()
                .map(|(field, claimed, _)| (field, claimed)),
        )
        .chain([("tds", tds), ("advance_tax", advance_tax)]);

    for (field, value) in amounts {
        if value < Decimal::ZERO {
            return Err(TaxError::NegativeInput { field, value });
        }
    }

    Ok(())
}

/// Slab tax, cross-checked against the base-tax formulation.
fn slab_tax(
    taxable_income: Decimal,
    variant: &RegimeVariant,
) -> Result<Decimal, TaxError> {
    let marginal = compute_marginal_tax(taxable_income, variant);
    let from_base = compute_from_base_tax(taxable_income, variant);

    if marginal != from_base {
        error!(
            variant = variant.name(),
            %taxable_income,
            %marginal,
            %from_base,
            "slab formulations disagree"
        );
        return Err(TaxError::Internal(format!(
            "schedule '{}' gives {marginal} by slab and {from_base} by base tax at {taxable_income}",
            variant.name()
        )));
    }

    Ok(marginal)
}
