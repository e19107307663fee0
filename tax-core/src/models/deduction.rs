use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Statutory ceiling on Section 80C investments (EPF, PPF, ...).
pub const SECTION_80C_CAP: Decimal = Decimal::from_parts(150_000, 0, 0, false, 0);

/// Statutory ceiling on Section 80D health-insurance premiums.
pub const SECTION_80D_CAP: Decimal = Decimal::from_parts(25_000, 0, 0, false, 0);

/// Claimed deductions before capping.
///
/// Section 80G donations have no ceiling.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeductionSet {
    pub section_80c: Decimal,
    pub section_80d: Decimal,
    pub section_80g: Decimal,
}

impl DeductionSet {
    /// Field names, claimed values and caps (`None` for uncapped).
    pub fn components(&self) -> [(&'static str, Decimal, Option<Decimal>); 3] {
        [
            ("section_80c", self.section_80c, Some(SECTION_80C_CAP)),
            ("section_80d", self.section_80d, Some(SECTION_80D_CAP)),
            ("section_80g", self.section_80g, None),
        ]
    }

    /// Sum of every component after applying its cap, or `None` if it does
    /// not fit in a `Decimal`.
    pub fn capped_total(&self) -> Option<Decimal> {
        self.components()
            .iter()
            .map(|(_, claimed, cap)| match cap {
                Some(cap) => (*claimed).min(*cap),
                None => *claimed,
            })
            .try_fold(Decimal::ZERO, Decimal::checked_add)
    }

    pub fn is_empty(&self) -> bool {
        self.components().iter().all(|(_, claimed, _)| claimed.is_zero())
    }
}
