//! Built-in slab tables and their assignment to profile combinations.

use std::sync::Arc;

use rust_decimal::Decimal;

use super::{HufSchedule, RegimeKey, RegimeRegistry, RegistryConfig};
use crate::{
    AgeBand, DeductionRule, EntityCategory, RegimeChoice, RegimeTableError, RegimeVariant,
    ResidencyStatus,
};

/// `(lower bound in rupees, rate in percent)`
type Slabs = &'static [(i64, i64)];

const OLD_BELOW_60: Slabs = &[(0, 0), (250_000, 5), (500_000, 20), (1_000_000, 30)];
const OLD_60_TO_79: Slabs = &[(0, 0), (300_000, 5), (500_000, 20), (1_000_000, 30)];
const OLD_80_PLUS: Slabs = &[(0, 0), (500_000, 20), (1_000_000, 30)];

const NEW_SEVEN_SLAB: Slabs = &[
    (0, 0),
    (250_000, 5),
    (500_000, 10),
    (750_000, 15),
    (1_000_000, 20),
    (1_250_000, 25),
    (1_500_000, 30),
];
const NEW_NON_RESIDENT: Slabs = &[
    (0, 0),
    (250_000, 5),
    (500_000, 10),
    (750_000, 15),
    (1_000_000, 30),
    (1_500_000, 30),
];
const NEW_BUSINESS_BELOW_60: Slabs = &[
    (0, 0),
    (250_000, 5),
    (500_000, 10),
    (750_000, 15),
    (1_000_000, 20),
    (1_500_000, 30),
];

// No exempt slab, and the top bracket carries 0%.
const HUF_LEGACY_OLD: Slabs = &[(0, 5), (250_000, 20), (500_000, 0), (750_000, 30), (1_000_000, 0)];
const HUF_LEGACY_NEW: Slabs = &[
    (0, 5),
    (250_000, 10),
    (500_000, 15),
    (750_000, 20),
    (1_000_000, 25),
    (1_250_000, 30),
    (1_500_000, 0),
];

const RESIDENTS: [ResidencyStatus; 2] = [
    ResidencyStatus::Resident,
    ResidencyStatus::NotOrdinarilyResident,
];

fn variant(
    name: &str,
    slabs: Slabs,
    deductions: DeductionRule,
) -> Result<Arc<RegimeVariant>, RegimeTableError> {
    let slabs: Vec<(Decimal, Decimal)> = slabs
        .iter()
        .map(|&(lower, percent)| (Decimal::from(lower), Decimal::new(percent, 2)))
        .collect();
    RegimeVariant::from_slabs(name, &slabs, deductions).map(Arc::new)
}

struct Tables {
    old_below_60: Arc<RegimeVariant>,
    old_60_to_79: Arc<RegimeVariant>,
    old_80_plus: Arc<RegimeVariant>,
    new_seven_slab: Arc<RegimeVariant>,
    new_seven_slab_gated: Arc<RegimeVariant>,
    new_non_resident: Arc<RegimeVariant>,
    new_business_below_60: Arc<RegimeVariant>,
    new_business_60_plus: Arc<RegimeVariant>,
}

impl Tables {
    fn build() -> Result<Self, RegimeTableError> {
        let new_seven_slab = variant("new_seven_slab", NEW_SEVEN_SLAB, DeductionRule::Allowed)?;
        let new_seven_slab_gated = Arc::new(
            new_seven_slab.with_rule("new_seven_slab_no_deductions", DeductionRule::NotAllowed),
        );

        Ok(Self {
            old_below_60: variant("old_below_60", OLD_BELOW_60, DeductionRule::Allowed)?,
            old_60_to_79: variant("old_60_to_79", OLD_60_TO_79, DeductionRule::Allowed)?,
            old_80_plus: variant("old_80_plus", OLD_80_PLUS, DeductionRule::Allowed)?,
            new_seven_slab,
            new_seven_slab_gated,
            new_non_resident: variant("new_non_resident", NEW_NON_RESIDENT, DeductionRule::Allowed)?,
            new_business_below_60: variant(
                "new_business_below_60",
                NEW_BUSINESS_BELOW_60,
                DeductionRule::Allowed,
            )?,
            // Shares the non-resident schedule.
            new_business_60_plus: variant(
                "new_business_60_plus",
                NEW_NON_RESIDENT,
                DeductionRule::Allowed,
            )?,
        })
    }

    fn old_for(
        &self,
        band: AgeBand,
    ) -> &Arc<RegimeVariant> {
        match band {
            AgeBand::Below60 => &self.old_below_60,
            AgeBand::From60To79 => &self.old_60_to_79,
            AgeBand::From80 => &self.old_80_plus,
        }
    }
}

/// Populates `registry` with every supported combination.
pub(super) fn register(
    registry: &mut RegimeRegistry,
    config: &RegistryConfig,
) -> Result<(), RegimeTableError> {
    use AgeBand::*;
    use EntityCategory::*;
    use RegimeChoice::*;

    let tables = Tables::build()?;
    let mut put = |category, band, residency, regime, variant: &Arc<RegimeVariant>| {
        registry.register(
            RegimeKey::new(category, band, residency, regime),
            Arc::clone(variant),
        );
    };

    for band in AgeBand::ALL {
        // Individual: residents by age band, non-residents on a flat schedule.
        for residency in RESIDENTS {
            put(IndividualSalaried, band, residency, OldRegime, tables.old_for(band));
            put(IndividualSalaried, band, residency, NewRegime, &tables.new_seven_slab);
        }
        put(IndividualSalaried, band, ResidencyStatus::NonResident, OldRegime, &tables.old_below_60);
        put(IndividualSalaried, band, ResidencyStatus::NonResident, NewRegime, &tables.new_non_resident);

        // Business: age-banded for every residency.
        let new_business = match band {
            Below60 => &tables.new_business_below_60,
            From60To79 | From80 => &tables.new_business_60_plus,
        };
        for residency in ResidencyStatus::ALL {
            put(BusinessOrProfession, band, residency, OldRegime, tables.old_for(band));
            put(BusinessOrProfession, band, residency, NewRegime, new_business);
        }
    }

    // Senior categories: resident only, and only within their own band.
    for (category, band) in [(SeniorCitizen, From60To79), (SuperSeniorCitizen, From80)] {
        for residency in RESIDENTS {
            put(category, band, residency, OldRegime, tables.old_for(band));
            put(category, band, residency, NewRegime, &tables.new_seven_slab_gated);
        }
    }

    // HUF: no age or residency dependency.
    let (huf_old, huf_new) = match config.huf_schedule {
        HufSchedule::Statutory => (
            Arc::clone(&tables.old_below_60),
            Arc::clone(&tables.new_seven_slab_gated),
        ),
        HufSchedule::Legacy => (
            variant("huf_legacy_old", HUF_LEGACY_OLD, DeductionRule::Allowed)?,
            variant("huf_legacy_new", HUF_LEGACY_NEW, DeductionRule::NotAllowed)?,
        ),
    };
    for band in AgeBand::ALL {
        for residency in ResidencyStatus::ALL {
            put(HinduUndividedFamily, band, residency, OldRegime, &huf_old);
            put(HinduUndividedFamily, band, residency, NewRegime, &huf_new);
        }
    }

    Ok(())
}
