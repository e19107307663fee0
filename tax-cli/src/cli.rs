use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use rust_decimal::Decimal;
use tax_core::calculations::TaxComputationInput;
use tax_core::{
    DeductionSet, EntityCategory, IncomeBreakdown, RegimeChoice, ResidencyStatus, TaxpayerProfile,
};

use crate::amount::parse_amount;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Indian income-tax calculator.
///
/// Computes slab tax, 4% health and education cess and the net amount still
/// payable (or refundable) for one taxpayer, or for every row of a CSV file
/// with `--batch`.
///
/// Amounts accept grouping commas in either style (`1,50,000` or `150,000`)
/// and an optional leading `₹`.
#[derive(Debug, Parser)]
#[command(name = "taxinsight", version, about, long_about = None)]
pub struct Cli {
    /// Entity category: individual_salaried, business_or_profession, huf,
    /// senior_citizen or super_senior_citizen
    #[arg(long, value_parser = parse_category, required_unless_present = "batch")]
    pub category: Option<EntityCategory>,

    /// Residency: resident, non_resident (nri) or not_ordinarily_resident (nor)
    #[arg(long, value_parser = parse_residency, required_unless_present = "batch")]
    pub residency: Option<ResidencyStatus>,

    /// Regime: old_regime (old) or new_regime (new)
    #[arg(long, value_parser = parse_regime, required_unless_present = "batch")]
    pub regime: Option<RegimeChoice>,

    /// Age in completed years
    #[arg(long, allow_hyphen_values = true, required_unless_present = "batch")]
    pub age: Option<i32>,

    /// Salary, business income or pension, depending on the category
    #[arg(long, default_value = "0", value_parser = parse_amount_arg, allow_hyphen_values = true)]
    pub primary_income: Decimal,

    #[arg(long, default_value = "0", value_parser = parse_amount_arg, allow_hyphen_values = true)]
    pub house_property: Decimal,

    #[arg(long, default_value = "0", value_parser = parse_amount_arg, allow_hyphen_values = true)]
    pub capital_gains: Decimal,

    #[arg(long, default_value = "0", value_parser = parse_amount_arg, allow_hyphen_values = true)]
    pub other_income: Decimal,

    /// Section 80C investments (capped at ₹1,50,000)
    #[arg(long = "section-80c", default_value = "0", value_parser = parse_amount_arg, allow_hyphen_values = true)]
    pub section_80c: Decimal,

    /// Section 80D health insurance (capped at ₹25,000)
    #[arg(long = "section-80d", default_value = "0", value_parser = parse_amount_arg, allow_hyphen_values = true)]
    pub section_80d: Decimal,

    /// Section 80G donations
    #[arg(long = "section-80g", default_value = "0", value_parser = parse_amount_arg, allow_hyphen_values = true)]
    pub section_80g: Decimal,

    /// Tax deducted at source
    #[arg(long, default_value = "0", value_parser = parse_amount_arg, allow_hyphen_values = true)]
    pub tds: Decimal,

    #[arg(long, default_value = "0", value_parser = parse_amount_arg, allow_hyphen_values = true)]
    pub advance_tax: Decimal,

    /// Compute every row of a CSV file instead of a single profile
    #[arg(long, conflicts_with_all = ["category", "residency", "regime", "age"])]
    pub batch: Option<PathBuf>,

    /// Slab-table CSV replacing the built-in tables
    #[arg(long)]
    pub tables: Option<PathBuf>,

    /// TOML configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Log filter (e.g. debug or tax_core=trace); RUST_LOG takes precedence
    #[arg(long)]
    pub log_level: Option<String>,

    /// Append log records to this file
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

impl Cli {
    /// The single computation described by the flags, or `None` in batch
    /// mode.
    pub fn computation_input(&self) -> Option<TaxComputationInput> {
        if self.batch.is_some() {
            return None;
        }

        let profile = TaxpayerProfile::new(self.age?, self.residency?, self.category?, self.regime?);

        Some(TaxComputationInput {
            profile,
            income: IncomeBreakdown {
                primary_income: self.primary_income,
                house_property_income: self.house_property,
                capital_gains: self.capital_gains,
                other_income: self.other_income,
            },
            deductions: DeductionSet {
                section_80c: self.section_80c,
                section_80d: self.section_80d,
                section_80g: self.section_80g,
            },
            tds: self.tds,
            advance_tax: self.advance_tax,
        })
    }
}

fn parse_amount_arg(s: &str) -> Result<Decimal, String> {
    parse_amount(s).map_err(|e| e.to_string())
}

fn parse_category(s: &str) -> Result<EntityCategory, String> {
    EntityCategory::parse(s).ok_or_else(|| format!("unknown entity category '{s}'"))
}

fn parse_residency(s: &str) -> Result<ResidencyStatus, String> {
    ResidencyStatus::parse(s).ok_or_else(|| format!("unknown residency status '{s}'"))
}

fn parse_regime(s: &str) -> Result<RegimeChoice, String> {
    RegimeChoice::parse(s).ok_or_else(|| format!("unknown regime '{s}'"))
}
