//! Differences between two registries, for checking a slab-table file
//! against the built-in tables.

use std::fmt;

use tax_core::{DeductionRule, RegimeKey, RegimeRegistry};

/// One way a loaded registry departs from a reference registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableDifference {
    /// In the reference but not the loaded registry.
    Missing(RegimeKey),
    /// In the loaded registry only.
    Unexpected(RegimeKey),
    /// Same combination, different slab boundaries, rates or base tax.
    Brackets(RegimeKey),
    DeductionRule {
        key: RegimeKey,
        expected: DeductionRule,
        actual: DeductionRule,
    },
}

impl fmt::Display for TableDifference {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            Self::Missing(key) => write!(f, "{key}: missing"),
            Self::Unexpected(key) => write!(f, "{key}: not in the built-in tables"),
            Self::Brackets(key) => write!(f, "{key}: brackets differ"),
            Self::DeductionRule {
                key,
                expected,
                actual,
            } => write!(
                f,
                "{key}: deductions {} but built-in tables say {}",
                actual.as_str(),
                expected.as_str()
            ),
        }
    }
}

/// Lists every difference between `expected` and `actual`, ordered by key.
///
/// Variant names are not compared.
pub fn compare_registries(
    expected: &RegimeRegistry,
    actual: &RegimeRegistry,
) -> Vec<TableDifference> {
    let mut differences = Vec::new();

    for key in expected.keys() {
        let Some(reference) = expected.get(&key) else {
            continue;
        };
        match actual.get(&key) {
            None => differences.push(TableDifference::Missing(key)),
            Some(loaded) => {
                if loaded.brackets() != reference.brackets() {
                    differences.push(TableDifference::Brackets(key));
                }
                if loaded.deductions() != reference.deductions() {
                    differences.push(TableDifference::DeductionRule {
                        key,
                        expected: reference.deductions(),
                        actual: loaded.deductions(),
                    });
                }
            }
        }
    }

    for key in actual.keys() {
        if expected.get(&key).is_none() {
            differences.push(TableDifference::Unexpected(key));
        }
    }

    differences
}
