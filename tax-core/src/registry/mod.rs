//! Slab schedules keyed by the profile attributes that select them.
//!
//! A [`RegimeRegistry`] maps every supported
//! `(category, age band, residency, regime)` combination to a
//! [`RegimeVariant`]. Combinations that are not registered, such as a
//! non-resident super senior citizen, fail lookup with
//! [`TaxError::UnsupportedCombination`].
//!
//! | source | constructor |
//! |--------|-------------|
//! | built-in statutory tables | [`RegimeRegistry::with_statutory_tables`], [`statutory_registry`] |
//! | CSV slab-table file | `tax_data::RegimeTableLoader::load` |
//!
//! Registries are immutable once built and are shared across threads by
//! reference.

mod statutory;

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

use serde::{Deserialize, Serialize};
use tracing::error;

use crate::{AgeBand, EntityCategory, RegimeChoice, RegimeTableError, RegimeVariant, ResidencyStatus, TaxError};

/// The four attributes a slab schedule is selected by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RegimeKey {
    pub category: EntityCategory,
    pub age_band: AgeBand,
    pub residency: ResidencyStatus,
    pub regime: RegimeChoice,
}

impl RegimeKey {
    pub fn new(
        category: EntityCategory,
        age_band: AgeBand,
        residency: ResidencyStatus,
        regime: RegimeChoice,
    ) -> Self {
        Self {
            category,
            age_band,
            residency,
            regime,
        }
    }
}

impl fmt::Display for RegimeKey {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}/{}",
            self.category.as_str(),
            self.age_band.as_str(),
            self.residency.as_str(),
            self.regime.as_str()
        )
    }
}

/// Which HUF slab schedule the built-in registry uses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HufSchedule {
    /// Same slabs as a resident individual below 60.
    #[default]
    Statutory,
    /// Rates applied from zero with no exempt slab, as the older HUF
    /// calculator did.
    Legacy,
}

impl HufSchedule {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Statutory => "statutory",
            Self::Legacy => "legacy",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "statutory" => Some(Self::Statutory),
            "legacy" => Some(Self::Legacy),
            _ => None,
        }
    }
}

/// Options for building the built-in registry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    pub huf_schedule: HufSchedule,
}

/// Registry of [`RegimeVariant`]s keyed by [`RegimeKey`].
///
/// Typical lifetime:
/// 1. Build with [`RegimeRegistry::with_statutory_tables`] or from a CSV file.
/// 2. Hand a reference to an `EligibilityResolver` or `TaxCalculator`.
#[derive(Debug, Clone, Default)]
pub struct RegimeRegistry {
    variants: HashMap<RegimeKey, Arc<RegimeVariant>>,
}

impl RegimeRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            variants: HashMap::new(),
        }
    }

    /// Registry holding the statutory slab tables.
    ///
    /// # Errors
    ///
    /// Returns [`RegimeTableError`] if a built-in table is malformed, which
    /// indicates a defect in the tables themselves.
    pub fn with_statutory_tables(config: &RegistryConfig) -> Result<Self, RegimeTableError> {
        let mut registry = Self::new();
        statutory::register(&mut registry, config)?;
        Ok(registry)
    }

    /// Register `variant` under `key`, returning any variant it replaced.
    pub fn register(
        &mut self,
        key: RegimeKey,
        variant: Arc<RegimeVariant>,
    ) -> Option<Arc<RegimeVariant>> {
        self.variants.insert(key, variant)
    }

    /// Look up the schedule for a combination.
    ///
    /// # Errors
    ///
    /// [`TaxError::UnsupportedCombination`] when nothing is registered for it.
    pub fn lookup(
        &self,
        category: EntityCategory,
        age_band: AgeBand,
        residency: ResidencyStatus,
        regime: RegimeChoice,
    ) -> Result<&RegimeVariant, TaxError> {
        self.get(&RegimeKey::new(category, age_band, residency, regime))
            .ok_or(TaxError::UnsupportedCombination {
                category,
                age_band,
                residency,
                regime,
            })
    }

    pub fn get(
        &self,
        key: &RegimeKey,
    ) -> Option<&RegimeVariant> {
        self.variants.get(key).map(Arc::as_ref)
    }

    pub fn len(&self) -> usize {
        self.variants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variants.is_empty()
    }

    /// Every registered key, sorted.
    pub fn keys(&self) -> Vec<RegimeKey> {
        let mut keys: Vec<_> = self.variants.keys().copied().collect();
        keys.sort_unstable();
        keys
    }

    pub fn iter(&self) -> impl Iterator<Item = (&RegimeKey, &RegimeVariant)> {
        self.variants
            .iter()
            .map(|(key, variant)| (key, variant.as_ref()))
    }
}

/// Process-wide registry built from the default [`RegistryConfig`].
///
/// Built on first use and never rebuilt.
///
/// # Errors
///
/// [`TaxError::Internal`] if the built-in tables fail validation.
pub fn statutory_registry() -> Result<&'static RegimeRegistry, TaxError> {
    static STATUTORY: OnceLock<Result<RegimeRegistry, RegimeTableError>> = OnceLock::new();

    STATUTORY
        .get_or_init(|| RegimeRegistry::with_statutory_tables(&RegistryConfig::default()))
        .as_ref()
        .map_err(|err| {
            error!(%err, "built-in regime tables are malformed");
            TaxError::Internal(err.to_string())
        })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::DeductionRule;

    fn registry() -> RegimeRegistry {
        RegimeRegistry::with_statutory_tables(&RegistryConfig::default()).unwrap()
    }

    fn lookup_name(
        registry: &RegimeRegistry,
        category: EntityCategory,
        age_band: AgeBand,
        residency: ResidencyStatus,
        regime: RegimeChoice,
    ) -> Result<String, TaxError> {
        registry
            .lookup(category, age_band, residency, regime)
            .map(|variant| variant.name().to_string())
    }

    // =========================================================================
    // lookup tests
    // =========================================================================

    #[test]
    fn resident_individual_old_regime_is_age_banded() {
        let registry = registry();

        for (band, expected) in [
            (AgeBand::Below60, "old_below_60"),
            (AgeBand::From60To79, "old_60_to_79"),
            (AgeBand::From80, "old_80_plus"),
        ] {
            assert_eq!(
                lookup_name(
                    &registry,
                    EntityCategory::IndividualSalaried,
                    band,
                    ResidencyStatus::Resident,
                    RegimeChoice::OldRegime,
                ),
                Ok(expected.to_string())
            );
        }
    }

    #[test]
    fn non_resident_individual_ignores_age() {
        let registry = registry();

        for band in AgeBand::ALL {
            assert_eq!(
                lookup_name(
                    &registry,
                    EntityCategory::IndividualSalaried,
                    band,
                    ResidencyStatus::NonResident,
                    RegimeChoice::OldRegime,
                ),
                Ok("old_below_60".to_string())
            );
            assert_eq!(
                lookup_name(
                    &registry,
                    EntityCategory::IndividualSalaried,
                    band,
                    ResidencyStatus::NonResident,
                    RegimeChoice::NewRegime,
                ),
                Ok("new_non_resident".to_string())
            );
        }
    }

    #[test]
    fn non_resident_super_senior_is_unsupported() {
        let registry = registry();

        let result = registry.lookup(
            EntityCategory::SuperSeniorCitizen,
            AgeBand::From80,
            ResidencyStatus::NonResident,
            RegimeChoice::OldRegime,
        );

        assert_eq!(
            result,
            Err(TaxError::UnsupportedCombination {
                category: EntityCategory::SuperSeniorCitizen,
                age_band: AgeBand::From80,
                residency: ResidencyStatus::NonResident,
                regime: RegimeChoice::OldRegime,
            })
        );
    }

    #[test]
    fn senior_category_only_registered_for_its_band() {
        let registry = registry();

        assert!(
            registry
                .lookup(
                    EntityCategory::SeniorCitizen,
                    AgeBand::From80,
                    ResidencyStatus::Resident,
                    RegimeChoice::OldRegime,
                )
                .is_err()
        );
        assert!(
            registry
                .lookup(
                    EntityCategory::SuperSeniorCitizen,
                    AgeBand::From60To79,
                    ResidencyStatus::Resident,
                    RegimeChoice::OldRegime,
                )
                .is_err()
        );
    }

    #[test]
    fn gated_categories_disallow_deductions_under_new_regime_only() {
        let registry = registry();

        for (category, band) in [
            (EntityCategory::HinduUndividedFamily, AgeBand::Below60),
            (EntityCategory::SeniorCitizen, AgeBand::From60To79),
            (EntityCategory::SuperSeniorCitizen, AgeBand::From80),
        ] {
            let old = registry
                .lookup(category, band, ResidencyStatus::Resident, RegimeChoice::OldRegime)
                .unwrap();
            let new = registry
                .lookup(category, band, ResidencyStatus::Resident, RegimeChoice::NewRegime)
                .unwrap();

            assert_eq!(old.deductions(), DeductionRule::Allowed, "{category}");
            assert_eq!(new.deductions(), DeductionRule::NotAllowed, "{category}");
        }
    }

    #[test]
    fn individual_and_business_allow_deductions_under_both_regimes() {
        let registry = registry();

        for category in [
            EntityCategory::IndividualSalaried,
            EntityCategory::BusinessOrProfession,
        ] {
            for regime in RegimeChoice::ALL {
                let variant = registry
                    .lookup(category, AgeBand::Below60, ResidencyStatus::Resident, regime)
                    .unwrap();
                assert!(variant.deductions().applies(), "{category} {regime}");
            }
        }
    }

    #[test]
    fn business_new_regime_splits_at_60() {
        let registry = registry();

        assert_eq!(
            lookup_name(
                &registry,
                EntityCategory::BusinessOrProfession,
                AgeBand::Below60,
                ResidencyStatus::NonResident,
                RegimeChoice::NewRegime,
            ),
            Ok("new_business_below_60".to_string())
        );
        assert_eq!(
            lookup_name(
                &registry,
                EntityCategory::BusinessOrProfession,
                AgeBand::From80,
                ResidencyStatus::Resident,
                RegimeChoice::NewRegime,
            ),
            Ok("new_business_60_plus".to_string())
        );
    }

    #[test]
    fn not_ordinarily_resident_uses_resident_tables() {
        let registry = registry();

        for category in EntityCategory::ALL {
            for band in AgeBand::ALL {
                for regime in RegimeChoice::ALL {
                    let resident = registry
                        .lookup(category, band, ResidencyStatus::Resident, regime)
                        .map(|variant| variant.name().to_string());
                    let nor = registry
                        .lookup(category, band, ResidencyStatus::NotOrdinarilyResident, regime)
                        .map(|variant| variant.name().to_string());
                    assert_eq!(resident.is_ok(), nor.is_ok());
                    if let (Ok(resident), Ok(nor)) = (resident, nor) {
                        assert_eq!(resident, nor);
                    }
                }
            }
        }
    }

    // =========================================================================
    // HUF schedule tests
    // =========================================================================

    #[test]
    fn huf_statutory_has_exempt_first_slab() {
        let variant = registry()
            .lookup(
                EntityCategory::HinduUndividedFamily,
                AgeBand::Below60,
                ResidencyStatus::Resident,
                RegimeChoice::OldRegime,
            )
            .unwrap()
            .clone();

        assert_eq!(variant.brackets()[0].tax_rate, dec!(0));
    }

    #[test]
    fn huf_legacy_taxes_from_zero() {
        let registry = RegimeRegistry::with_statutory_tables(&RegistryConfig {
            huf_schedule: HufSchedule::Legacy,
        })
        .unwrap();

        let variant = registry
            .lookup(
                EntityCategory::HinduUndividedFamily,
                AgeBand::From80,
                ResidencyStatus::NonResident,
                RegimeChoice::OldRegime,
            )
            .unwrap();

        assert_eq!(variant.name(), "huf_legacy_old");
        assert_eq!(variant.brackets()[0].tax_rate, dec!(0.05));
    }

    #[test]
    fn huf_schedule_parse() {
        assert_eq!(HufSchedule::parse("Legacy"), Some(HufSchedule::Legacy));
        assert_eq!(HufSchedule::parse(" statutory "), Some(HufSchedule::Statutory));
        assert_eq!(HufSchedule::parse("modern"), None);
    }

    // =========================================================================
    // registry tests
    // =========================================================================

    #[test]
    fn register_replaces_existing_variant() {
        let mut registry = RegimeRegistry::new();
        let key = RegimeKey::new(
            EntityCategory::IndividualSalaried,
            AgeBand::Below60,
            ResidencyStatus::Resident,
            RegimeChoice::OldRegime,
        );
        let flat = |name: &str| {
            Arc::new(
                RegimeVariant::from_slabs(name, &[(dec!(0), dec!(0.10))], DeductionRule::Allowed)
                    .unwrap(),
            )
        };

        assert!(registry.register(key, flat("first")).is_none());
        let replaced = registry.register(key, flat("second")).unwrap();

        assert_eq!(replaced.name(), "first");
        assert_eq!(registry.get(&key).unwrap().name(), "second");
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn keys_are_sorted() {
        let keys = registry().keys();
        let mut sorted = keys.clone();
        sorted.sort();

        assert_eq!(keys, sorted);
    }

    #[test]
    fn statutory_registry_matches_default_config() {
        let shared = statutory_registry().unwrap();

        assert_eq!(shared.keys(), registry().keys());
    }

    #[test]
    fn registry_config_deserializes_with_defaults() {
        let config: RegistryConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.huf_schedule, HufSchedule::Statutory);

        let config: RegistryConfig = serde_json::from_str(r#"{"huf_schedule":"legacy"}"#).unwrap();
        assert_eq!(config.huf_schedule, HufSchedule::Legacy);
    }

    #[test]
    fn regime_key_display_uses_codes() {
        let key = RegimeKey::new(
            EntityCategory::HinduUndividedFamily,
            AgeBand::From60To79,
            ResidencyStatus::NonResident,
            RegimeChoice::NewRegime,
        );

        assert_eq!(
            key.to_string(),
            "hindu_undivided_family/60_to_79/non_resident/new_regime"
        );
    }
}
