//! Batch computation over a CSV file of taxpayers.
//!
//! ## CSV Format
//!
//! Headers are matched by name, so column order does not matter.
//!
//! | Column           | Required | Notes                                   |
//! |------------------|----------|-----------------------------------------|
//! | `category`       | yes      | e.g. `individual_salaried`, `huf`       |
//! | `residency`      | yes      | `resident`, `nri`, `nor`, ...           |
//! | `regime`         | yes      | `old_regime`/`old` or `new_regime`/`new`|
//! | `age`            | yes      | integer                                 |
//! | `primary_income` | no       | empty cell or missing column means 0    |
//! | `house_property` | no       |                                         |
//! | `capital_gains`  | no       |                                         |
//! | `other_income`   | no       |                                         |
//! | `section_80c`    | no       |                                         |
//! | `section_80d`    | no       |                                         |
//! | `section_80g`    | no       |                                         |
//! | `tds`            | no       |                                         |
//! | `advance_tax`    | no       |                                         |
//!
//! Amounts may carry grouping commas when the cell is quoted
//! (`"1,50,000"`).
//!
//! ```csv
//! category,residency,regime,age,primary_income,section_80c,tds
//! individual_salaried,resident,old,45,"4,85,000",20000,
//! huf,resident,old,50,400000,,
//! ```

use std::io::Read;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, de};
use tax_core::calculations::{MemoizedCalculator, TaxComputationInput};
use tax_core::{
    DeductionSet, EntityCategory, IncomeBreakdown, RegimeChoice, ResidencyStatus, TaxError,
    TaxResult, TaxpayerProfile,
};
use thiserror::Error;
use tracing::{debug, info};

use crate::amount::parse_amount;

/// Why a single batch row produced no result.
#[derive(Debug, Error)]
pub enum BatchRowError {
    /// The row could not be read (bad structure, missing column, bad number).
    #[error("{0}")]
    Parse(String),

    #[error("unrecognised {column} '{value}'")]
    UnknownCode { column: &'static str, value: String },

    #[error(transparent)]
    Tax(#[from] TaxError),
}

impl BatchRowError {
    pub fn is_user_correctable(&self) -> bool {
        match self {
            Self::Tax(err) => err.is_user_correctable(),
            _ => true,
        }
    }
}

/// The result of one row. `row` is 1-based, not counting the header.
#[derive(Debug)]
pub struct BatchOutcome {
    pub row: usize,
    /// Present once the profile columns were understood.
    pub profile: Option<TaxpayerProfile>,
    pub result: Result<TaxResult, BatchRowError>,
}

#[derive(Debug, Deserialize)]
struct BatchRow {
    category: String,
    residency: String,
    regime: String,
    age: i32,
    #[serde(default, deserialize_with = "deserialize_amount")]
    primary_income: Decimal,
    #[serde(default, deserialize_with = "deserialize_amount")]
    house_property: Decimal,
    #[serde(default, deserialize_with = "deserialize_amount")]
    capital_gains: Decimal,
    #[serde(default, deserialize_with = "deserialize_amount")]
    other_income: Decimal,
    #[serde(default, deserialize_with = "deserialize_amount")]
    section_80c: Decimal,
    #[serde(default, deserialize_with = "deserialize_amount")]
    section_80d: Decimal,
    #[serde(default, deserialize_with = "deserialize_amount")]
    section_80g: Decimal,
    #[serde(default, deserialize_with = "deserialize_amount")]
    tds: Decimal,
    #[serde(default, deserialize_with = "deserialize_amount")]
    advance_tax: Decimal,
}

fn deserialize_amount<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    parse_amount(&s).map_err(de::Error::custom)
}

fn parse_code<T>(
    column: &'static str,
    value: &str,
    parse: fn(&str) -> Option<T>,
) -> Result<T, BatchRowError> {
    parse(value).ok_or_else(|| BatchRowError::UnknownCode {
        column,
        value: value.to_string(),
    })
}

impl TryFrom<BatchRow> for TaxComputationInput {
    type Error = BatchRowError;

    fn try_from(row: BatchRow) -> Result<Self, Self::Error> {
        let category = parse_code("category", &row.category, EntityCategory::parse)?;
        let residency = parse_code("residency", &row.residency, ResidencyStatus::parse)?;
        let regime = parse_code("regime", &row.regime, RegimeChoice::parse)?;

        Ok(Self {
            profile: TaxpayerProfile::new(row.age, residency, category, regime),
            income: IncomeBreakdown {
                primary_income: row.primary_income,
                house_property_income: row.house_property,
                capital_gains: row.capital_gains,
                other_income: row.other_income,
            },
            deductions: DeductionSet {
                section_80c: row.section_80c,
                section_80d: row.section_80d,
                section_80g: row.section_80g,
            },
            tds: row.tds,
            advance_tax: row.advance_tax,
        })
    }
}

/// Reads every row of a batch file. A bad row does not stop the rest.
pub fn read_rows<R: Read>(reader: R) -> Vec<(usize, Result<TaxComputationInput, BatchRowError>)> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    reader
        .deserialize::<BatchRow>()
        .enumerate()
        .map(|(idx, record)| {
            let row = idx + 1;
            let input = record
                .map_err(|e| BatchRowError::Parse(e.to_string()))
                .and_then(TaxComputationInput::try_from);
            (row, input)
        })
        .collect()
}

/// Computes every readable row through `calculator`, in file order.
pub fn run_batch<R: Read>(
    calculator: &MemoizedCalculator<'_>,
    reader: R,
) -> Vec<BatchOutcome> {
    let outcomes: Vec<BatchOutcome> = read_rows(reader)
        .into_iter()
        .map(|(row, input)| match input {
            Ok(input) => BatchOutcome {
                row,
                profile: Some(input.profile),
                result: calculator.calculate(&input).map_err(BatchRowError::from),
            },
            Err(err) => {
                debug!(row, error = %err, "skipping unreadable batch row");
                BatchOutcome {
                    row,
                    profile: None,
                    result: Err(err),
                }
            }
        })
        .collect();

    let stats = calculator.stats();
    info!(
        rows = outcomes.len(),
        failed = outcomes.iter().filter(|o| o.result.is_err()).count(),
        cache_hits = stats.hits,
        cache_misses = stats.misses,
        "batch complete"
    );

    outcomes
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;
    use tax_core::registry::statutory_registry;
    use tax_core::{RegimeRegistry, TaxErrorKind};

    use super::*;

    fn registry() -> &'static RegimeRegistry {
        statutory_registry().unwrap()
    }

    // =========================================================================
    // read_rows tests
    // =========================================================================

    #[test]
    fn minimal_columns_default_amounts_to_zero() {
        let csv = "category,residency,regime,age\nindividual,resident,old,45\n";

        let rows = read_rows(csv.as_bytes());

        assert_eq!(rows.len(), 1);
        let (row, input) = &rows[0];
        let input = input.as_ref().unwrap();
        assert_eq!(*row, 1);
        assert_eq!(input.profile.category, EntityCategory::IndividualSalaried);
        assert_eq!(input.income.total(), Some(Decimal::ZERO));
        assert_eq!(input.tds, Decimal::ZERO);
    }

    #[test]
    fn empty_cells_and_grouped_amounts() {
        let csv = "\
category,residency,regime,age,primary_income,house_property,section_80c,tds
individual_salaried , resident , old_regime , 45 ,\"4,00,000\",,20000,
";

        let rows = read_rows(csv.as_bytes());
        let input = rows[0].1.as_ref().unwrap();

        assert_eq!(input.income.primary_income, dec!(400000));
        assert_eq!(input.income.house_property_income, Decimal::ZERO);
        assert_eq!(input.deductions.section_80c, dec!(20000));
        assert_eq!(input.tds, Decimal::ZERO);
    }

    #[test]
    fn bad_rows_keep_their_row_numbers() {
        let csv = "\
category,residency,regime,age,primary_income
company,resident,old,45,100
individual,resident,old,forty,100
individual,resident,old,45,lots
individual,resident,new,45,100
";

        let rows = read_rows(csv.as_bytes());

        assert_eq!(rows.len(), 4);
        assert!(matches!(
            &rows[0],
            (1, Err(BatchRowError::UnknownCode { column: "category", .. }))
        ));
        assert!(matches!(&rows[1], (2, Err(BatchRowError::Parse(_)))));
        assert!(matches!(&rows[2], (3, Err(BatchRowError::Parse(_)))));
        assert!(matches!(&rows[3], (4, Ok(_))));
    }

    // =========================================================================
    // run_batch tests
    // =========================================================================

    #[test]
    fn repeated_rows_are_computed_once() {
        let csv = "\
category,residency,regime,age,primary_income
individual,resident,old,45,485000
individual,resident,old,45,485000
individual,resident,old,45,\"4,85,000\"
";
        let calculator = MemoizedCalculator::new(registry());

        let outcomes = run_batch(&calculator, csv.as_bytes());

        assert_eq!(outcomes.len(), 3);
        for outcome in &outcomes {
            assert_eq!(outcome.result.as_ref().unwrap().tax_with_cess, dec!(12220.00));
        }
        assert_eq!(calculator.len(), 1);
        assert_eq!(calculator.stats().hits, 2);
    }

    #[test]
    fn failing_row_does_not_stop_the_rest() {
        let csv = "\
category,residency,regime,age,primary_income,section_80g
individual,resident,old,45,-100,
super_senior_citizen,non_resident,new,85,500000,
individual,resident,old,45,100000,200000
individual,non_resident,old,40,700000,
";
        let calculator = MemoizedCalculator::new(registry());

        let outcomes = run_batch(&calculator, csv.as_bytes());

        let kinds: Vec<Option<TaxErrorKind>> = outcomes
            .iter()
            .map(|o| match &o.result {
                Err(BatchRowError::Tax(err)) => Some(err.kind()),
                _ => None,
            })
            .collect();
        assert_eq!(
            kinds,
            vec![
                Some(TaxErrorKind::NegativeInput),
                Some(TaxErrorKind::UnsupportedCombination),
                Some(TaxErrorKind::DeductionsExceedIncome),
                None,
            ]
        );
        assert_eq!(outcomes[3].result.as_ref().unwrap().gross_tax, dec!(52500));
        assert!(outcomes.iter().all(|o| o.profile.is_some()));
    }

    #[test]
    fn oversized_row_fails_alone() {
        let csv = "\
category,residency,regime,age,primary_income,house_property
individual,resident,old,45,485000,
individual,resident,old,45,79228162514264337593543950335,79228162514264337593543950335
individual,resident,old,45,485000,
";
        let calculator = MemoizedCalculator::new(registry());

        let outcomes = run_batch(&calculator, csv.as_bytes());

        assert_eq!(outcomes.len(), 3);
        assert!(matches!(
            &outcomes[1].result,
            Err(BatchRowError::Tax(TaxError::AmountOutOfRange {
                field: "total_income"
            }))
        ));
        assert!(outcomes[1].result.as_ref().unwrap_err().is_user_correctable());
        assert_eq!(outcomes[0].result.as_ref().unwrap().tax_with_cess, dec!(12220.00));
        assert_eq!(outcomes[2].result.as_ref().unwrap().tax_with_cess, dec!(12220.00));
    }

    #[test]
    fn row_errors_are_user_correctable_unless_internal() {
        assert!(BatchRowError::Parse("bad".to_string()).is_user_correctable());
        assert!(!BatchRowError::Tax(TaxError::Internal("x".to_string())).is_user_correctable());
    }
}
