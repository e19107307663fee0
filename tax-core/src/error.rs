use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

use crate::models::{AgeBand, EntityCategory, RegimeChoice, RegimeTableError, ResidencyStatus};

/// Errors surfaced by a tax computation.
///
/// Every variant maps to a distinct user-facing message via
/// [`TaxError::user_message`]; callers must not collapse them.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TaxError {
    /// A raw numeric input was below zero.
    #[error("{field} must be non-negative, got {value}")]
    NegativeInput { field: &'static str, value: Decimal },

    /// Deductions reduce income below zero.
    #[error("deductions of {total_deductions} exceed total income of {total_income}")]
    DeductionsExceedIncome {
        total_income: Decimal,
        total_deductions: Decimal,
    },

    /// A total derived from the inputs does not fit in a `Decimal`.
    #[error("{field} is too large to compute")]
    AmountOutOfRange { field: &'static str },

    /// No slab schedule is defined for the profile.
    #[error("no tax table for {category}, age {age_band}, {residency}, under the {regime}")]
    UnsupportedCombination {
        category: EntityCategory,
        age_band: AgeBand,
        residency: ResidencyStatus,
        regime: RegimeChoice,
    },

    /// Anything unanticipated. The detail is for logs only.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Coarse classification of a [`TaxError`], stable for callers and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TaxErrorKind {
    NegativeInput,
    DeductionsExceedIncome,
    AmountOutOfRange,
    UnsupportedCombination,
    Internal,
}

impl TaxError {
    pub fn kind(&self) -> TaxErrorKind {
        match self {
            Self::NegativeInput { .. } => TaxErrorKind::NegativeInput,
            Self::DeductionsExceedIncome { .. } => TaxErrorKind::DeductionsExceedIncome,
            Self::AmountOutOfRange { .. } => TaxErrorKind::AmountOutOfRange,
            Self::UnsupportedCombination { .. } => TaxErrorKind::UnsupportedCombination,
            Self::Internal(_) => TaxErrorKind::Internal,
        }
    }

    /// Whether the user can fix the problem by changing their inputs.
    pub fn is_user_correctable(&self) -> bool {
        !matches!(self, Self::Internal(_))
    }

    /// Message suitable for showing to the person who entered the figures.
    ///
    /// Internal errors never leak their detail here.
    pub fn user_message(&self) -> String {
        match self {
            Self::NegativeInput { field, value } => {
                format!(
                    "All values must be non-negative: {} was {value}.",
                    field.replace('_', " ")
                )
            }
            Self::DeductionsExceedIncome {
                total_income,
                total_deductions,
            } => format!(
                "Taxable income is negative after deductions: deductions of {total_deductions} \
                 exceed total income of {total_income}."
            ),
            Self::AmountOutOfRange { field } => format!(
                "The amounts entered are too large: {} cannot be computed.",
                field.replace('_', " ")
            ),
            Self::UnsupportedCombination {
                category,
                age_band,
                residency,
                regime,
            } => format!(
                "The {regime} has no tax slabs for a {residency} {category} aged {age_band}.",
                category = category.label().to_lowercase(),
                residency = residency.label().to_lowercase(),
            ),
            Self::Internal(_) => {
                "An unexpected error occurred. Please try again or contact support.".to_string()
            }
        }
    }
}

/// A malformed table that reaches a computation is a defect, not bad input.
impl From<RegimeTableError> for TaxError {
    fn from(err: RegimeTableError) -> Self {
        Self::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn negative_input_message_names_field_and_value() {
        let err = TaxError::NegativeInput {
            field: "house_property_income",
            value: dec!(-500),
        };

        assert_eq!(
            err.user_message(),
            "All values must be non-negative: house property income was -500."
        );
        assert_eq!(err.kind(), TaxErrorKind::NegativeInput);
        assert!(err.is_user_correctable());
    }

    #[test]
    fn deductions_exceed_income_message() {
        let err = TaxError::DeductionsExceedIncome {
            total_income: dec!(100000),
            total_deductions: dec!(175000),
        };

        assert_eq!(
            err.user_message(),
            "Taxable income is negative after deductions: deductions of 175000 exceed total income of 100000."
        );
    }

    #[test]
    fn amount_out_of_range_message_names_total() {
        let err = TaxError::AmountOutOfRange {
            field: "total_deductions",
        };

        assert_eq!(
            err.user_message(),
            "The amounts entered are too large: total deductions cannot be computed."
        );
        assert_eq!(err.kind(), TaxErrorKind::AmountOutOfRange);
        assert!(err.is_user_correctable());
    }

    #[test]
    fn unsupported_combination_message() {
        let err = TaxError::UnsupportedCombination {
            category: EntityCategory::SuperSeniorCitizen,
            age_band: AgeBand::From80,
            residency: ResidencyStatus::NonResident,
            regime: RegimeChoice::OldRegime,
        };

        assert_eq!(
            err.user_message(),
            "The Old Tax Regime has no tax slabs for a non-resident super senior citizen aged 80 or more."
        );
    }

    #[test]
    fn internal_message_hides_detail() {
        let err = TaxError::Internal("bracket table corrupted at index 3".to_string());

        assert!(!err.user_message().contains("bracket"));
        assert!(!err.is_user_correctable());
        assert_eq!(err.kind(), TaxErrorKind::Internal);
    }

    #[test]
    fn table_error_becomes_internal() {
        let err = TaxError::from(RegimeTableError::Empty("old_below_60".to_string()));

        assert_eq!(
            err,
            TaxError::Internal("regime table 'old_below_60' has no brackets".to_string())
        );
    }

    #[test]
    fn every_kind_has_a_distinct_message() {
        let errors = [
            TaxError::NegativeInput {
                field: "tds",
                value: dec!(-1),
            },
            TaxError::DeductionsExceedIncome {
                total_income: dec!(0),
                total_deductions: dec!(1),
            },
            TaxError::AmountOutOfRange {
                field: "total_income",
            },
            TaxError::UnsupportedCombination {
                category: EntityCategory::SeniorCitizen,
                age_band: AgeBand::Below60,
                residency: ResidencyStatus::Resident,
                regime: RegimeChoice::NewRegime,
            },
            TaxError::Internal("x".to_string()),
        ];

        let messages: std::collections::HashSet<_> =
            errors.iter().map(TaxError::user_message).collect();

        assert_eq!(messages.len(), errors.len());
    }
}
