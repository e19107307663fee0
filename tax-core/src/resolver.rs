use rust_decimal::Decimal;
use tracing::debug;

use crate::registry::RegimeRegistry;
use crate::{RegimeVariant, TaxError, TaxpayerProfile};

/// Maps a [`TaxpayerProfile`] to the slab schedule that applies to it.
///
/// Pure: the same profile and registry always give the same variant.
#[derive(Debug, Clone, Copy)]
pub struct EligibilityResolver<'a> {
    registry: &'a RegimeRegistry,
}

impl<'a> EligibilityResolver<'a> {
    pub fn new(registry: &'a RegimeRegistry) -> Self {
        Self { registry }
    }

    /// Resolves the variant for `profile`.
    ///
    /// # Errors
    ///
    /// - [`TaxError::NegativeInput`] for a negative age
    /// - [`TaxError::UnsupportedCombination`] when no schedule is registered
    pub fn resolve(
        &self,
        profile: &TaxpayerProfile,
    ) -> Result<&'a RegimeVariant, TaxError> {
        let age_band = profile.age_band().ok_or(TaxError::NegativeInput {
            field: "age",
            value: Decimal::from(profile.age),
        })?;

        let variant = self.registry.lookup(
            profile.category,
            age_band,
            profile.residency,
            profile.regime,
        )?;

        debug!(
            category = profile.category.as_str(),
            age_band = age_band.as_str(),
            residency = profile.residency.as_str(),
            regime = profile.regime.as_str(),
            variant = variant.name(),
            "resolved regime variant"
        );

        Ok(variant)
    }
}
