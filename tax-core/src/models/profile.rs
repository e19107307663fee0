use std::fmt;

use serde::{Deserialize, Serialize};

/// Normalizes an enumerated input code: lowercase, `-` and spaces folded to `_`.
fn normalize_code(s: &str) -> String {
    s.trim().to_ascii_lowercase().replace(['-', ' '], "_")
}

/// The kind of taxpayer a computation is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityCategory {
    IndividualSalaried,
    BusinessOrProfession,
    HinduUndividedFamily,
    SeniorCitizen,
    SuperSeniorCitizen,
}

impl EntityCategory {
    pub const ALL: [EntityCategory; 5] = [
        Self::IndividualSalaried,
        Self::BusinessOrProfession,
        Self::HinduUndividedFamily,
        Self::SeniorCitizen,
        Self::SuperSeniorCitizen,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::IndividualSalaried => "individual_salaried",
            Self::BusinessOrProfession => "business_or_profession",
            Self::HinduUndividedFamily => "hindu_undivided_family",
            Self::SeniorCitizen => "senior_citizen",
            Self::SuperSeniorCitizen => "super_senior_citizen",
        }
    }

    /// Parses a category code. Accepts the snake_case code, the PascalCase
    /// name and the short forms `individual`, `business` and `huf`.
    pub fn parse(s: &str) -> Option<Self> {
        match normalize_code(s).as_str() {
            "individual_salaried" | "individualsalaried" | "individual" | "salaried" => {
                Some(Self::IndividualSalaried)
            }
            "business_or_profession" | "businessorprofession" | "business" | "profession" => {
                Some(Self::BusinessOrProfession)
            }
            "hindu_undivided_family" | "hinduundividedfamily" | "huf" => {
                Some(Self::HinduUndividedFamily)
            }
            "senior_citizen" | "seniorcitizen" | "senior" => Some(Self::SeniorCitizen),
            "super_senior_citizen" | "superseniorcitizen" | "super_senior" => {
                Some(Self::SuperSeniorCitizen)
            }
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::IndividualSalaried => "Individual (salaried)",
            Self::BusinessOrProfession => "Business or profession",
            Self::HinduUndividedFamily => "Hindu Undivided Family",
            Self::SeniorCitizen => "Senior citizen",
            Self::SuperSeniorCitizen => "Super senior citizen",
        }
    }
}

impl fmt::Display for EntityCategory {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResidencyStatus {
    Resident,
    NonResident,
    NotOrdinarilyResident,
}

impl ResidencyStatus {
    pub const ALL: [ResidencyStatus; 3] = [
        Self::Resident,
        Self::NonResident,
        Self::NotOrdinarilyResident,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Resident => "resident",
            Self::NonResident => "non_resident",
            Self::NotOrdinarilyResident => "not_ordinarily_resident",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match normalize_code(s).as_str() {
            "resident" => Some(Self::Resident),
            "non_resident" | "nonresident" | "nri" => Some(Self::NonResident),
            "not_ordinarily_resident" | "notordinarilyresident" | "nor" | "rnor" => {
                Some(Self::NotOrdinarilyResident)
            }
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Resident => "Resident",
            Self::NonResident => "Non-resident",
            Self::NotOrdinarilyResident => "Not ordinarily resident",
        }
    }
}

impl fmt::Display for ResidencyStatus {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One of the two mutually exclusive rate-and-deduction schemes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegimeChoice {
    OldRegime,
    NewRegime,
}

impl RegimeChoice {
    pub const ALL: [RegimeChoice; 2] = [Self::OldRegime, Self::NewRegime];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OldRegime => "old_regime",
            Self::NewRegime => "new_regime",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match normalize_code(s).as_str() {
            "old_regime" | "oldregime" | "old" | "old_tax_regime" => Some(Self::OldRegime),
            "new_regime" | "newregime" | "new" | "new_tax_regime" => Some(Self::NewRegime),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::OldRegime => "Old Tax Regime",
            Self::NewRegime => "New Tax Regime",
        }
    }
}

impl fmt::Display for RegimeChoice {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Age tier used for slab selection.
///
/// | band          | ages            |
/// |---------------|-----------------|
/// | `Below60`     | `age < 60`      |
/// | `From60To79`  | `60 <= age < 80`|
/// | `From80`      | `age >= 80`     |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgeBand {
    #[serde(rename = "below_60")]
    Below60,
    #[serde(rename = "60_to_79")]
    From60To79,
    #[serde(rename = "80_plus")]
    From80,
}

impl AgeBand {
    pub const ALL: [AgeBand; 3] = [Self::Below60, Self::From60To79, Self::From80];

    /// Returns the band for `age`, or `None` when the age is negative.
    pub fn from_age(age: i32) -> Option<Self> {
        match age {
            i32::MIN..0 => None,
            0..60 => Some(Self::Below60),
            60..80 => Some(Self::From60To79),
            _ => Some(Self::From80),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Below60 => "below_60",
            Self::From60To79 => "60_to_79",
            Self::From80 => "80_plus",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match normalize_code(s).as_str() {
            "below_60" | "below60" | "under_60" => Some(Self::Below60),
            "60_to_79" | "from60to79" | "60_79" => Some(Self::From60To79),
            "80_plus" | "from80" | "80_or_more" | "80" => Some(Self::From80),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Below60 => "below 60",
            Self::From60To79 => "60 to 79",
            Self::From80 => "80 or more",
        }
    }
}

impl fmt::Display for AgeBand {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Who the tax is computed for. Immutable for the duration of a computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaxpayerProfile {
    /// Age in completed years. Negative values are rejected by validation.
    pub age: i32,
    pub residency: ResidencyStatus,
    pub category: EntityCategory,
    pub regime: RegimeChoice,
}

impl TaxpayerProfile {
    pub fn new(
        age: i32,
        residency: ResidencyStatus,
        category: EntityCategory,
        regime: RegimeChoice,
    ) -> Self {
        Self {
            age,
            residency,
            category,
            regime,
        }
    }

    pub fn age_band(&self) -> Option<AgeBand> {
        AgeBand::from_age(self.age)
    }
}
