//! Text and JSON rendering of results and errors.

use std::fmt::Write as _;

use serde::Serialize;
use tax_core::{TaxError, TaxErrorKind, TaxResult, TaxpayerProfile};

use crate::amount::format_inr;
use crate::batch::{BatchOutcome, BatchRowError};

const LABEL_WIDTH: usize = 18;

#[derive(Serialize)]
struct Report<'a> {
    profile: &'a TaxpayerProfile,
    result: &'a TaxResult,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    kind: &'static str,
    message: String,
}

#[derive(Serialize)]
struct ErrorReport {
    error: ErrorBody,
}

#[derive(Serialize)]
struct BatchEntry<'a> {
    row: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<&'a TaxResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<ErrorBody>,
}

fn kind_code(kind: TaxErrorKind) -> &'static str {
    match kind {
        TaxErrorKind::NegativeInput => "negative_input",
        TaxErrorKind::DeductionsExceedIncome => "deductions_exceed_income",
        TaxErrorKind::AmountOutOfRange => "amount_out_of_range",
        TaxErrorKind::UnsupportedCombination => "unsupported_combination",
        TaxErrorKind::Internal => "internal",
    }
}

fn tax_error_body(err: &TaxError) -> ErrorBody {
    ErrorBody {
        kind: kind_code(err.kind()),
        message: err.user_message(),
    }
}

fn row_error_body(err: &BatchRowError) -> ErrorBody {
    match err {
        BatchRowError::Tax(err) => tax_error_body(err),
        other => ErrorBody {
            kind: "invalid_row",
            message: other.to_string(),
        },
    }
}

fn line(
    out: &mut String,
    label: &str,
    value: &str,
) {
    let _ = writeln!(out, "{:<LABEL_WIDTH$}{value}", format!("{label}:"));
}

pub fn render_text(
    profile: &TaxpayerProfile,
    result: &TaxResult,
) -> String {
    let mut out = String::new();

    line(
        &mut out,
        "Taxpayer",
        &format!("{}, {}, age {}", profile.category, profile.residency, profile.age),
    );
    line(
        &mut out,
        "Regime",
        &format!("{} ({})", profile.regime, result.regime_variant),
    );
    line(&mut out, "Total income", &format_inr(result.total_income));
    if result.deductions_applied {
        line(&mut out, "Deductions", &format_inr(result.total_deductions));
    } else {
        line(&mut out, "Deductions", "not allowed under this regime");
    }
    line(&mut out, "Taxable income", &format_inr(result.taxable_income));
    line(&mut out, "Slab tax", &format_inr(result.gross_tax));
    line(&mut out, "Cess (4%)", &format_inr(result.cess));
    line(&mut out, "Tax with cess", &format_inr(result.tax_with_cess));
    line(&mut out, "TDS", &format_inr(result.tds));
    line(&mut out, "Advance tax", &format_inr(result.advance_tax));

    if result.is_refund() {
        line(&mut out, "Refund due", &format_inr(-result.net_tax_payable));
    } else {
        line(&mut out, "Net tax payable", &format_inr(result.net_tax_payable));
    }

    out
}

pub fn render_json(
    profile: &TaxpayerProfile,
    result: &TaxResult,
) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&Report { profile, result })
}

pub fn render_error_text(err: &TaxError) -> String {
    format!("error: {}\n", err.user_message())
}

pub fn render_error_json(err: &TaxError) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&ErrorReport {
        error: tax_error_body(err),
    })
}

/// One line per row: the profile codes and the net amount, or the error.
pub fn render_batch_text(outcomes: &[BatchOutcome]) -> String {
    let mut out = String::new();
    for outcome in outcomes {
        let _ = write!(out, "row {}: ", outcome.row);
        if let Some(profile) = &outcome.profile {
            let _ = write!(
                out,
                "{}/{}/{} age {}: ",
                profile.category.as_str(),
                profile.residency.as_str(),
                profile.regime.as_str(),
                profile.age
            );
        }
        let _ = match &outcome.result {
            Ok(result) if result.is_refund() => {
                writeln!(out, "refund due {}", format_inr(-result.net_tax_payable))
            }
            Ok(result) => writeln!(out, "net tax payable {}", format_inr(result.net_tax_payable)),
            Err(err) => writeln!(out, "error: {}", row_error_body(err).message),
        };
    }
    out
}

pub fn render_batch_json(outcomes: &[BatchOutcome]) -> Result<String, serde_json::Error> {
    let entries: Vec<BatchEntry<'_>> = outcomes
        .iter()
        .map(|outcome| match &outcome.result {
            Ok(result) => BatchEntry {
                row: outcome.row,
                result: Some(result),
                error: None,
            },
            Err(err) => BatchEntry {
                row: outcome.row,
                result: None,
                error: Some(row_error_body(err)),
            },
        })
        .collect();

    serde_json::to_string_pretty(&entries)
}
