//! Tax year configuration.
//!
//! Every statutory figure the engine uses (bracket tables, reliefs,
//! retirement caps, the housing levy rate) lives in a [`TaxYearConfig`]
//! handed to each component at construction time.  Configurations are
//! stored as one JSON file per tax year, e.g. `tax_years/kenya_2024.json`,
//! and collected into a [`TaxYearRegistry`].

use crate::error::{PayrollError, Result};
use crate::models::Periodicity;
use crate::tax::{BracketTable, TaxBracket};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, warn};

/// Statutory figures for one tax year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxYearConfig {
    pub tax_year: i32,
    pub monthly_brackets: BracketTable,
    pub annual_brackets: BracketTable,
    pub personal_relief_monthly: Decimal,
    /// Flat annual figure; not derived from the monthly one.
    pub personal_relief_annual: Decimal,
    pub insurance_relief_rate: Decimal,
    pub insurance_relief_cap_monthly: Decimal,
    pub insurance_relief_cap_annual: Decimal,
    /// Share of basic salary allowed as a retirement deduction (E1).
    pub retirement_rate: Decimal,
    /// Fixed retirement deduction cap (E3).
    pub retirement_cap_monthly: Decimal,
    pub retirement_cap_annual: Decimal,
    /// Affordable Housing Levy as a share of gross pay.
    pub ahl_rate: Decimal,
    #[serde(default)]
    pub prmf_cap_monthly: Option<Decimal>,
    #[serde(default)]
    pub owner_occupied_interest_cap_monthly: Option<Decimal>,
}

impl TaxYearConfig {
    /// Kenya 2024/2025 statutory figures.
    pub fn kenya_2024() -> Self {
        let monthly = [
            TaxBracket::bounded(dec!(24000), dec!(0.10)),
            TaxBracket::bounded(dec!(32333), dec!(0.25)),
            TaxBracket::bounded(dec!(500000), dec!(0.30)),
            TaxBracket::bounded(dec!(800000), dec!(0.325)),
            TaxBracket::open(dec!(0.35)),
        ];
        let annual = [
            TaxBracket::bounded(dec!(288000), dec!(0.10)),
            TaxBracket::bounded(dec!(388000), dec!(0.25)),
            TaxBracket::bounded(dec!(6000000), dec!(0.30)),
            TaxBracket::bounded(dec!(9600000), dec!(0.325)),
            TaxBracket::open(dec!(0.35)),
        ];
        TaxYearConfig {
            tax_year: 2024,
            monthly_brackets: BracketTable::build(&monthly),
            annual_brackets: BracketTable::build(&annual),
            personal_relief_monthly: dec!(2400),
            personal_relief_annual: dec!(28800),
            insurance_relief_rate: dec!(0.15),
            insurance_relief_cap_monthly: dec!(5000),
            insurance_relief_cap_annual: dec!(60000),
            retirement_rate: dec!(0.30),
            retirement_cap_monthly: dec!(30000),
            retirement_cap_annual: dec!(360000),
            ahl_rate: dec!(0.015),
            prmf_cap_monthly: None,
            owner_occupied_interest_cap_monthly: None,
        }
    }

    pub fn brackets(&self, periodicity: Periodicity) -> &BracketTable {
        match periodicity {
            Periodicity::Monthly => &self.monthly_brackets,
            Periodicity::Annual => &self.annual_brackets,
        }
    }

    pub fn retirement_cap(&self, periodicity: Periodicity) -> Decimal {
        match periodicity {
            Periodicity::Monthly => self.retirement_cap_monthly,
            Periodicity::Annual => self.retirement_cap_annual,
        }
    }
}

impl Default for TaxYearConfig {
    fn default() -> Self {
        Self::kenya_2024()
    }
}

/// Load all tax year configurations from a directory.
///
/// Every `.json` file is parsed as a [`TaxYearConfig`].  Files that fail
/// to parse are logged and skipped so that one bad file does not take the
/// others down with it.  Duplicate years are not checked here; see
/// [`TaxYearRegistry::from_configs`].
pub fn load_tax_years_from_dir(path: &Path) -> anyhow::Result<Vec<TaxYearConfig>> {
    let mut configs = Vec::new();
    if !path.is_dir() {
        debug!(path = %path.display(), "tax year directory not found");
        return Ok(configs);
    }
    let mut entries = std::fs::read_dir(path)?.collect::<std::io::Result<Vec<_>>>()?;
    entries.sort_by_key(|entry| entry.path());
    for entry in entries {
        let file_path = entry.path();
        if !entry.file_type()?.is_file()
            || file_path.extension().map_or(true, |ext| ext != "json")
        {
            continue;
        }
        let data = std::fs::read_to_string(&file_path)?;
        match serde_json::from_str::<TaxYearConfig>(&data) {
            Ok(config) => {
                debug!(path = %file_path.display(), tax_year = config.tax_year, "loaded tax year");
                configs.push(config);
            }
            Err(err) => {
                warn!(path = %file_path.display(), error = %err, "failed to parse tax year config");
            }
        }
    }
    Ok(configs)
}

/// Tax year configurations keyed by year.
#[derive(Debug, Clone, Default)]
pub struct TaxYearRegistry {
    years: BTreeMap<i32, TaxYearConfig>,
}

impl TaxYearRegistry {
    /// Builds a registry; a later config for the same year replaces an
    /// earlier one.
    pub fn from_configs(configs: impl IntoIterator<Item = TaxYearConfig>) -> Self {
        let mut years = BTreeMap::new();
        for config in configs {
            if years.insert(config.tax_year, config).is_some() {
                warn!("duplicate tax year configuration replaced");
            }
        }
        TaxYearRegistry { years }
    }

    pub fn insert(&mut self, config: TaxYearConfig) {
        self.years.insert(config.tax_year, config);
    }

    pub fn is_empty(&self) -> bool {
        self.years.is_empty()
    }

    /// The config for `tax_year`, or the most recent earlier one when the
    /// rules did not change that year.
    pub fn for_year(&self, tax_year: i32) -> Result<&TaxYearConfig> {
        self.years
            .range(..=tax_year)
            .next_back()
            .map(|(_, config)| config)
            .ok_or(PayrollError::UnknownTaxYear(tax_year))
    }
}
