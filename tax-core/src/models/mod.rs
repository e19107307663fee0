mod deduction;
mod income;
mod profile;
mod regime_variant;
mod tax_bracket;
mod tax_result;

pub use deduction::{DeductionSet, SECTION_80C_CAP, SECTION_80D_CAP};
pub use income::IncomeBreakdown;
pub use profile::{AgeBand, EntityCategory, RegimeChoice, ResidencyStatus, TaxpayerProfile};
pub use regime_variant::{DeductionRule, RegimeTableError, RegimeVariant};
pub use tax_bracket::TaxBracket;
pub use tax_result::TaxResult;
