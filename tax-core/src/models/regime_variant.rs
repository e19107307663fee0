//! Validated slab schedules.
//!
//! A [`RegimeVariant`] is the single representation every category's slab
//! table is expressed in. Construction checks the shape of the schedule and
//! that each bracket's `base_tax` is the cumulative tax at its lower bound, so
//! the sequential and base-tax formulations of the bracket engine always agree.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::TaxBracket;

/// Errors raised when a slab schedule is malformed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RegimeTableError {
    #[error("regime table '{0}' has no brackets")]
    Empty(String),

    #[error("regime table '{name}' must start at 0, starts at {min_income}")]
    FirstBracketNotZero { name: String, min_income: Decimal },

    #[error("regime table '{name}' bracket {index} has rate {rate} outside [0, 1]")]
    RateOutOfRange {
        name: String,
        index: usize,
        rate: Decimal,
    },

    #[error("regime table '{name}' bracket {index} upper bound {max_income} is not above its lower bound {min_income}")]
    NonIncreasingBounds {
        name: String,
        index: usize,
        min_income: Decimal,
        max_income: Decimal,
    },

    #[error("regime table '{name}' bracket {index} starts at {min_income} but the previous bracket ends at {previous_max}")]
    NotContiguous {
        name: String,
        index: usize,
        min_income: Decimal,
        previous_max: Decimal,
    },

    #[error("regime table '{name}' bracket {index} is unbounded but is not the last bracket")]
    UnboundedBeforeLast { name: String, index: usize },

    #[error("regime table '{0}' last bracket must be unbounded")]
    BoundedLastBracket(String),

    #[error("regime table '{name}' bracket {index} base tax {base_tax} does not match cumulative tax {expected} at {min_income}")]
    BaseTaxMismatch {
        name: String,
        index: usize,
        min_income: Decimal,
        base_tax: Decimal,
        expected: Decimal,
    },
}

/// Whether claimed deductions reduce taxable income under a variant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeductionRule {
    #[default]
    Allowed,
    NotAllowed,
}

impl DeductionRule {
    pub fn applies(&self) -> bool {
        matches!(self, Self::Allowed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Allowed => "allowed",
            Self::NotAllowed => "not_allowed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "allowed" | "yes" | "true" => Some(Self::Allowed),
            "not_allowed" | "no" | "false" => Some(Self::NotAllowed),
            _ => None,
        }
    }
}

/// An ordered, contiguous slab schedule plus its deduction rule.
///
/// Only constructible through [`RegimeVariant::new`] or
/// [`RegimeVariant::from_slabs`], so every instance is well formed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegimeVariant {
    name: String,
    brackets: Vec<TaxBracket>,
    deductions: DeductionRule,
}

impl RegimeVariant {
    /// Builds a variant from explicit brackets, validating every invariant
    /// including the precomputed `base_tax` of each bracket.
    ///
    /// # Errors
    ///
    /// Returns [`RegimeTableError`] if the brackets are empty, do not start at
    /// zero, overlap or leave gaps, have a rate outside `[0, 1]`, are not
    /// terminated by a single unbounded bracket, or carry a `base_tax` that is
    /// not the cumulative tax at the bracket's lower bound.
    pub fn new(
        name: impl Into<String>,
        brackets: Vec<TaxBracket>,
        deductions: DeductionRule,
    ) -> Result<Self, RegimeTableError> {
        let name = name.into();
        validate_shape(&name, &brackets)?;

        let mut expected = Decimal::ZERO;
        for (index, bracket) in brackets.iter().enumerate() {
            if bracket.base_tax != expected {
                return Err(RegimeTableError::BaseTaxMismatch {
                    name,
                    index,
                    min_income: bracket.min_income,
                    base_tax: bracket.base_tax,
                    expected,
                });
            }
            if let Some(width) = bracket.width() {
                expected += width * bracket.tax_rate;
            }
        }

        Ok(Self {
            name,
            brackets,
            deductions,
        })
    }

    /// Builds a variant from `(lower bound, rate)` pairs, deriving each upper
    /// bound from the next lower bound and each `base_tax` cumulatively.
    ///
    /// ```
    /// use rust_decimal_macros::dec;
    /// use tax_core::{DeductionRule, RegimeVariant};
    ///
    /// let variant = RegimeVariant::from_slabs(
    ///     "old_below_60",
    ///     &[(dec!(0), dec!(0)), (dec!(250000), dec!(0.05)), (dec!(500000), dec!(0.20))],
    ///     DeductionRule::Allowed,
    /// )
    /// .unwrap();
    ///
    /// assert_eq!(variant.brackets()[2].base_tax, dec!(12500));
    /// assert_eq!(variant.brackets()[2].max_income, None);
    /// ```
    pub fn from_slabs(
        name: impl Into<String>,
        slabs: &[(Decimal, Decimal)],
        deductions: DeductionRule,
    ) -> Result<Self, RegimeTableError> {
        let mut brackets = Vec::with_capacity(slabs.len());
        let mut base_tax = Decimal::ZERO;

        for (index, (min_income, tax_rate)) in slabs.iter().enumerate() {
            let max_income = slabs.get(index + 1).map(|(next, _)| *next);
            brackets.push(TaxBracket {
                min_income: *min_income,
                max_income,
                tax_rate: *tax_rate,
                base_tax,
            });
            if let Some(max_income) = max_income {
                base_tax += (max_income - *min_income) * *tax_rate;
            }
        }

        Self::new(name, brackets, deductions)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn brackets(&self) -> &[TaxBracket] {
        &self.brackets
    }

    pub fn deductions(&self) -> DeductionRule {
        self.deductions
    }

    /// Returns a copy of this schedule under a different name and rule.
    pub fn with_rule(
        &self,
        name: impl Into<String>,
        deductions: DeductionRule,
    ) -> Self {
        Self {
            name: name.into(),
            brackets: self.brackets.clone(),
            deductions,
        }
    }
}

fn validate_shape(
    name: &str,
    brackets: &[TaxBracket],
) -> Result<(), RegimeTableError> {
    let first = brackets
        .first()
        .ok_or_else(|| RegimeTableError::Empty(name.to_string()))?;
    if !first.min_income.is_zero() {
        return Err(RegimeTableError::FirstBracketNotZero {
            name: name.to_string(),
            min_income: first.min_income,
        });
    }

    let last_index = brackets.len() - 1;
    let mut previous_max: Option<Decimal> = None;

    for (index, bracket) in brackets.iter().enumerate() {
        if bracket.tax_rate < Decimal::ZERO || bracket.tax_rate > Decimal::ONE {
            return Err(RegimeTableError::RateOutOfRange {
                name: name.to_string(),
                index,
                rate: bracket.tax_rate,
            });
        }

        if let Some(previous_max) = previous_max {
            if bracket.min_income != previous_max {
                return Err(RegimeTableError::NotContiguous {
                    name: name.to_string(),
                    index,
                    min_income: bracket.min_income,
                    previous_max,
                });
            }
        }

        match bracket.max_income {
            Some(max_income) if max_income <= bracket.min_income => {
                return Err(RegimeTableError::NonIncreasingBounds {
                    name: name.to_string(),
                    index,
                    min_income: bracket.min_income,
                    max_income,
                });
            }
            Some(_) if index == last_index => {
                return Err(RegimeTableError::BoundedLastBracket(name.to_string()));
            }
            None if index != last_index => {
                return Err(RegimeTableError::UnboundedBeforeLast {
                    name: name.to_string(),
                    index,
                });
            }
            _ => {}
        }

        previous_max = bracket.max_income;
    }

    Ok(())
}
