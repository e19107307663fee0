use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Income heads for a single computation.
///
/// `primary_income` holds whichever head the entity category earns from:
/// salary for individuals, business income for businesses and HUFs, pension
/// for senior citizens.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IncomeBreakdown {
    pub primary_income: Decimal,
    pub house_property_income: Decimal,
    pub capital_gains: Decimal,
    pub other_income: Decimal,
}

impl IncomeBreakdown {
    /// Field names and values, in display order.
    pub fn components(&self) -> [(&'static str, Decimal); 4] {
        [
            ("primary_income", self.primary_income),
            ("house_property_income", self.house_property_income),
            ("capital_gains", self.capital_gains),
            ("other_income", self.other_income),
        ]
    }

    /// Sum of every head, or `None` if it does not fit in a `Decimal`.
    pub fn total(&self) -> Option<Decimal> {
        self.components()
            .iter()
            .try_fold(Decimal::ZERO, |acc, (_, amount)| acc.checked_add(*amount))
    }
}
