use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Breakdown returned by a successful computation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxResult {
    pub total_income: Decimal,

    /// Capped deductions actually subtracted; zero when the variant's
    /// deduction rule does not allow them.
    pub total_deductions: Decimal,

    pub taxable_income: Decimal,

    /// Slab tax before cess.
    pub gross_tax: Decimal,

    /// Health and education cess on `gross_tax`.
    pub cess: Decimal,

    /// `gross_tax + cess`.
    pub tax_with_cess: Decimal,

    pub tds: Decimal,
    pub advance_tax: Decimal,

    /// `tax_with_cess - tds - advance_tax`. Negative means a refund.
    pub net_tax_payable: Decimal,

    /// Name of the slab schedule that was applied.
    pub regime_variant: String,

    /// Whether the variant allowed deductions.
    pub deductions_applied: bool,
}

impl TaxResult {
    pub fn is_refund(&self) -> bool {
        self.net_tax_payable < Decimal::ZERO
    }
}
