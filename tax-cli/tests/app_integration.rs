//! End-to-end runs of the command line against fixture files.

use std::path::{Path, PathBuf};

use clap::Parser;
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tax_cli::app::{self, RunOutput, Status};
use tax_cli::cli::Cli;
use tax_cli::config::AppConfig;

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(name)
}

fn run_with(
    args: &[&str],
    config: &AppConfig,
) -> RunOutput {
    let cli = Cli::try_parse_from(std::iter::once("taxinsight").chain(args.iter().copied()))
        .expect("Failed to parse arguments");
    app::run(&cli, config)
}

fn run(args: &[&str]) -> RunOutput {
    run_with(args, &AppConfig::default())
}

fn amount(value: &serde_json::Value) -> Decimal {
    value
        .as_str()
        .expect("Failed to read amount")
        .parse()
        .expect("Failed to parse amount")
}

fn load_config(name: &str) -> AppConfig {
    AppConfig::load(&fixture(name)).expect("Failed to load config fixture")
}

const TUTORIAL: &[&str] = &[
    "--category",
    "individual_salaried",
    "--residency",
    "resident",
    "--regime",
    "old_regime",
    "--age",
    "45",
    "--primary-income",
    "4,00,000",
    "--house-property",
    "50,000",
    "--capital-gains",
    "30,000",
    "--other-income",
    "5,000",
    "--section-80c",
    "20,000",
    "--section-80d",
    "5,000",
];

// =========================================================================
// single computation
// =========================================================================

#[test]
fn test_text_output_for_tutorial_profile() {
    let output = run(TUTORIAL);

    assert_eq!(output.status, Status::Success);
    assert_eq!(output.stderr, "");
    assert_eq!(
        output.stdout,
        "\
Taxpayer:         Individual (salaried), Resident, age 45
Regime:           Old Tax Regime (old_below_60)
Total income:     ₹4,85,000.00
Deductions:       ₹25,000.00
Taxable income:   ₹4,60,000.00
Slab tax:         ₹10,500.00
Cess (4%):        ₹420.00
Tax with cess:    ₹10,920.00
TDS:              ₹0.00
Advance tax:      ₹0.00
Net tax payable:  ₹10,920.00
"
    );
}

#[test]
fn test_json_output_for_refund() {
    let output = run(&[
        "--category",
        "individual",
        "--residency",
        "resident",
        "--regime",
        "old",
        "--age",
        "30",
        "--tds",
        "1,000",
        "--advance-tax",
        "500",
        "--format",
        "json",
    ]);

    assert_eq!(output.status, Status::Success);
    let json: serde_json::Value =
        serde_json::from_str(&output.stdout).expect("Failed to parse JSON output");
    assert_eq!(json["profile"]["age"], 30);
    assert_eq!(amount(&json["result"]["taxable_income"]), Decimal::ZERO);
    assert_eq!(amount(&json["result"]["net_tax_payable"]), dec!(-1500));
}

#[test]
fn test_negative_input_exits_with_user_error() {
    let output = run(&[
        "--category",
        "individual",
        "--residency",
        "resident",
        "--regime",
        "old",
        "--age",
        "45",
        "--capital-gains",
        "-500",
    ]);

    assert_eq!(output.status, Status::UserError);
    assert_eq!(output.stdout, "");
    assert_eq!(
        output.stderr,
        "error: All values must be non-negative: capital gains was -500.\n"
    );
}

#[test]
fn test_unsupported_combination_as_json() {
    let output = run(&[
        "--category",
        "super_senior_citizen",
        "--residency",
        "nri",
        "--regime",
        "new",
        "--age",
        "85",
        "--format",
        "json",
    ]);

    assert_eq!(output.status, Status::UserError);
    let json: serde_json::Value =
        serde_json::from_str(&output.stdout).expect("Failed to parse JSON output");
    assert_eq!(json["error"]["kind"], "unsupported_combination");
}

// =========================================================================
// configuration and tables
// =========================================================================

#[test]
fn test_legacy_huf_schedule_from_config() {
    let args = &[
        "--category",
        "huf",
        "--residency",
        "resident",
        "--regime",
        "old",
        "--age",
        "50",
        "--primary-income",
        "400000",
    ];

    let statutory = run(args);
    let legacy = run_with(args, &load_config("legacy.toml"));

    assert!(statutory.stdout.contains("Slab tax:         ₹7,500.00\n"));
    assert!(legacy.stdout.contains("Slab tax:         ₹42,500.00\n"));
}

#[test]
fn test_tables_path_from_config_is_relative_to_config_file() {
    let config = load_config("shipped_tables.toml");

    let output = run_with(
        &[
            "--category",
            "individual",
            "--residency",
            "nri",
            "--regime",
            "new",
            "--age",
            "40",
            "--primary-income",
            "700000",
        ],
        &config,
    );

    assert_eq!(output.status, Status::Success, "{}", output.stderr);
    assert!(output.stdout.contains("Slab tax:         ₹32,500.00\n"));
}

#[test]
fn test_missing_tables_file_is_user_error() {
    let mut args = TUTORIAL.to_vec();
    args.extend(["--tables", "/nonexistent/regime_tables.csv"]);

    let output = run(&args);

    assert_eq!(output.status, Status::UserError);
    assert!(output.stderr.starts_with("error: cannot read slab tables"));
}

#[test]
fn test_invalid_tables_file_is_user_error() {
    let tables = fixture("batch.csv");
    let mut args = TUTORIAL.to_vec();
    args.extend(["--tables", tables.to_str().expect("Failed to convert path")]);

    let output = run(&args);

    assert_eq!(output.status, Status::UserError);
    assert!(output.stderr.starts_with("error: invalid slab tables"));
}

// =========================================================================
// batch mode
// =========================================================================

#[test]
fn test_batch_text_output() {
    let batch = fixture("batch.csv");

    let output = run(&["--batch", batch.to_str().expect("Failed to convert path")]);

    assert_eq!(output.status, Status::Success);
    assert_eq!(
        output.stdout,
        "\
row 1: individual_salaried/resident/old_regime age 45: net tax payable ₹10,920.00
row 2: individual_salaried/resident/old_regime age 45: net tax payable ₹10,920.00
row 3: senior_citizen/resident/new_regime age 65: net tax payable ₹6,63,000.00
row 4: super_senior_citizen/resident/old_regime age 82: net tax payable ₹7,28,000.00
row 5: individual_salaried/non_resident/old_regime age 40: net tax payable ₹54,600.00
row 6: hindu_undivided_family/resident/old_regime age 50: net tax payable ₹7,800.00
row 7: individual_salaried/resident/old_regime age 45: refund due ₹1,500.00
"
    );
}

#[test]
fn test_batch_reports_worst_status_and_keeps_going() {
    let batch = fixture("batch_with_errors.csv");

    let output = run(&[
        "--batch",
        batch.to_str().expect("Failed to convert path"),
        "--format",
        "json",
    ]);

    assert_eq!(output.status, Status::UserError);
    let json: serde_json::Value =
        serde_json::from_str(&output.stdout).expect("Failed to parse JSON output");
    let rows = json.as_array().expect("Failed to read JSON array");
    assert_eq!(rows.len(), 3);
    assert_eq!(amount(&rows[0]["result"]["tax_with_cess"]), dec!(12220));
    assert_eq!(rows[1]["row"], 2);
    assert_eq!(rows[1]["error"]["kind"], "invalid_row");
    assert_eq!(rows[2]["error"]["kind"], "unsupported_combination");
}

#[test]
fn test_missing_batch_file_is_user_error() {
    let output = run(&["--batch", "/nonexistent/rows.csv"]);

    assert_eq!(output.status, Status::UserError);
    assert!(output.stderr.starts_with("error: cannot read batch file"));
}
