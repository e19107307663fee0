use std::collections::{BTreeMap, HashMap};
use std::io::Read;
use std::sync::Arc;

use rust_decimal::Decimal;
use serde::Deserialize;
use tax_core::{
    AgeBand, DeductionRule, EntityCategory, RegimeChoice, RegimeKey, RegimeRegistry,
    RegimeTableError, RegimeVariant, ResidencyStatus, TaxBracket,
};
use thiserror::Error;
use tracing::debug;

/// Wildcard accepted in the `age_band` and `residency` columns.
pub const ANY: &str = "any";

/// Errors that can occur when loading slab tables.
#[derive(Debug, Error)]
pub enum RegimeTableLoaderError {
    #[error("CSV parse error: {0}")]
    CsvParse(String),

    #[error("Unknown {column} '{value}'")]
    UnknownCode { column: &'static str, value: String },

    #[error("Table {table} mixes deduction rules '{first}' and '{second}'")]
    ConflictingDeductionRule {
        table: String,
        first: String,
        second: String,
    },

    #[error("Combination {0} is defined by more than one table")]
    DuplicateCombination(RegimeKey),

    #[error("Invalid table: {0}")]
    InvalidTable(#[from] RegimeTableError),
}

impl From<csv::Error> for RegimeTableLoaderError {
    fn from(err: csv::Error) -> Self {
        RegimeTableLoaderError::CsvParse(err.to_string())
    }
}

/// A single row of a slab-table CSV file.
///
/// - `category`: entity category code (e.g. `individual_salaried`, `huf`)
/// - `age_band`: `below_60`, `60_to_79`, `80_plus` or `any`
/// - `residency`: `resident`, `non_resident`, `not_ordinarily_resident` or `any`
/// - `regime`: `old_regime` or `new_regime`
/// - `deductions`: `allowed` or `not_allowed`
/// - `min_income`: lower bound of the slab
/// - `max_income`: upper bound of the slab (empty for unbounded)
/// - `base_tax`: tax owed on income exactly at `min_income`
/// - `rate`: marginal rate as a decimal (e.g. 0.05 for 5%)
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct RegimeTableRecord {
    pub category: String,
    pub age_band: String,
    pub residency: String,
    pub regime: String,
    pub deductions: String,
    pub min_income: Decimal,
    #[serde(deserialize_with = "deserialize_optional_decimal")]
    pub max_income: Option<Decimal>,
    pub base_tax: Decimal,
    pub rate: Decimal,
}

fn deserialize_optional_decimal<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    match s {
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => s
            .trim()
            .parse::<Decimal>()
            .map(Some)
            .map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}

/// The columns that identify which table a row belongs to, as written.
type TableId = (String, String, String, String);

fn parse_code<T>(
    column: &'static str,
    value: &str,
    parse: impl Fn(&str) -> Option<T>,
) -> Result<T, RegimeTableLoaderError> {
    parse(value).ok_or_else(|| RegimeTableLoaderError::UnknownCode {
        column,
        value: value.to_string(),
    })
}

/// Expands an `any` cell to every value, or parses a single code.
fn expand<T: Copy>(
    column: &'static str,
    value: &str,
    all: &[T],
    parse: impl Fn(&str) -> Option<T>,
) -> Result<Vec<T>, RegimeTableLoaderError> {
    if value.trim().eq_ignore_ascii_case(ANY) {
        Ok(all.to_vec())
    } else {
        parse_code(column, value, parse).map(|code| vec![code])
    }
}

/// Loader for slab tables from CSV files.
///
/// Rows are grouped by `(category, age_band, residency, regime)` as written;
/// each group becomes one validated [`RegimeVariant`], registered under every
/// combination its `any` cells expand to.
pub struct RegimeTableLoader;

impl RegimeTableLoader {
    /// Parse slab-table records from a CSV reader.
    ///
    /// The reader can be any type that implements `Read`, such as a file or a
    /// string slice.
    pub fn parse<R: Read>(reader: R) -> Result<Vec<RegimeTableRecord>, RegimeTableLoaderError> {
        let mut csv_reader = csv::Reader::from_reader(reader);
        let mut records = Vec::new();

        for result in csv_reader.deserialize() {
            let record: RegimeTableRecord = result?;
            records.push(record);
        }

        Ok(records)
    }

    /// Build a registry from parsed records.
    ///
    /// # Errors
    ///
    /// - [`RegimeTableLoaderError::UnknownCode`] for an unrecognised code
    /// - [`RegimeTableLoaderError::ConflictingDeductionRule`] if a table's rows disagree
    /// - [`RegimeTableLoaderError::InvalidTable`] if a table is not a well-formed schedule,
    ///   including a `base_tax` that is not the cumulative tax at its lower bound
    /// - [`RegimeTableLoaderError::DuplicateCombination`] if two tables cover the same combination
    pub fn load(records: &[RegimeTableRecord]) -> Result<RegimeRegistry, RegimeTableLoaderError> {
        // BTreeMap keeps error reporting and naming deterministic.
        let mut groups: BTreeMap<TableId, Vec<&RegimeTableRecord>> = BTreeMap::new();
        for record in records {
            groups
                .entry((
                    record.category.trim().to_string(),
                    record.age_band.trim().to_string(),
                    record.residency.trim().to_string(),
                    record.regime.trim().to_string(),
                ))
                .or_default()
                .push(record);
        }

        let mut registry = RegimeRegistry::new();
        let mut owners: HashMap<RegimeKey, String> = HashMap::new();

        for (table, rows) in groups {
            let name = table_name(&table);
            let variant = Arc::new(Self::build_variant(&name, &rows)?);

            let (category, age_band, residency, regime) = &table;
            let category = parse_code("category", category, EntityCategory::parse)?;
            let regime = parse_code("regime", regime, RegimeChoice::parse)?;
            let bands = expand("age_band", age_band, &AgeBand::ALL, AgeBand::parse)?;
            let residencies =
                expand("residency", residency, &ResidencyStatus::ALL, ResidencyStatus::parse)?;

            for &band in &bands {
                for &residency in &residencies {
                    let key = RegimeKey::new(category, band, residency, regime);
                    if owners.insert(key, name.clone()).is_some() {
                        return Err(RegimeTableLoaderError::DuplicateCombination(key));
                    }
                    registry.register(key, Arc::clone(&variant));
                }
            }

            debug!(
                table = %name,
                brackets = variant.brackets().len(),
                combinations = bands.len() * residencies.len(),
                "loaded regime table"
            );
        }

        Ok(registry)
    }

    /// Parse and load in one step.
    pub fn load_from_reader<R: Read>(reader: R) -> Result<RegimeRegistry, RegimeTableLoaderError> {
        let records = Self::parse(reader)?;
        Self::load(&records)
    }

    fn build_variant(
        name: &str,
        rows: &[&RegimeTableRecord],
    ) -> Result<RegimeVariant, RegimeTableLoaderError> {
        let mut rule: Option<(DeductionRule, &str)> = None;
        for row in rows {
            let parsed = parse_code("deductions", &row.deductions, DeductionRule::parse)?;
            match rule {
                None => rule = Some((parsed, row.deductions.as_str())),
                Some((existing, first)) if existing != parsed => {
                    return Err(RegimeTableLoaderError::ConflictingDeductionRule {
                        table: name.to_string(),
                        first: first.to_string(),
                        second: row.deductions.clone(),
                    });
                }
                Some(_) => {}
            }
        }

        let mut brackets: Vec<TaxBracket> = rows
            .iter()
            .map(|row| TaxBracket {
                min_income: row.min_income,
                max_income: row.max_income,
                tax_rate: row.rate,
                base_tax: row.base_tax,
            })
            .collect();
        brackets.sort_by(|a, b| a.min_income.cmp(&b.min_income));

        let deductions = rule.map(|(rule, _)| rule).unwrap_or_default();
        Ok(RegimeVariant::new(name, brackets, deductions)?)
    }
}

fn table_name((category, age_band, residency, regime): &TableId) -> String {
    format!(
        "{}/{}/{}/{}",
        category.to_ascii_lowercase(),
        age_band.to_ascii_lowercase(),
        residency.to_ascii_lowercase(),
        regime.to_ascii_lowercase()
    )
}
