//! Retirement contribution deduction ("lower of E").
//!
//! The allowable deduction for contributions to a registered retirement
//! scheme is the lowest of three amounts, reported on the P9 card as
//! columns E1, E2 and E3:
//!
//! * E1: a percentage (30%) of basic salary;
//! * E2: the contribution actually made, NSSF plus pension scheme;
//! * E3: a fixed statutory cap.

use crate::config::TaxYearConfig;
use crate::models::{round_money, Periodicity};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// The three candidates and the deduction actually allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetirementBreakdown {
    pub e1: Decimal,
    pub e2: Decimal,
    pub e3: Decimal,
    pub effective: Decimal,
}

impl RetirementBreakdown {
    /// Builds a breakdown from candidates computed elsewhere, e.g. the
    /// annual column sums of a P9 card.
    pub fn from_candidates(e1: Decimal, e2: Decimal, e3: Decimal) -> Self {
        RetirementBreakdown {
            e1,
            e2,
            e3,
            effective: lower_of(e1, e2, e3),
        }
    }
}

/// The lowest of the three candidates.
pub fn lower_of(e1: Decimal, e2: Decimal, e3: Decimal) -> Decimal {
    e1.min(e2).min(e3)
}

/// Resolves the retirement deduction for one period with the tax year's
/// rate and caps.
#[derive(Debug, Clone, Copy)]
pub struct RetirementContributionResolver<'a> {
    config: &'a TaxYearConfig,
}

impl<'a> RetirementContributionResolver<'a> {
    pub fn new(config: &'a TaxYearConfig) -> Self {
        RetirementContributionResolver { config }
    }

    /// Resolves E1, E2, E3 and the effective deduction.
    ///
    /// `actual_contribution` is taken as given; the caller sums NSSF and
    /// pension deductions beforehand.  A zero contribution gives a zero
    /// deduction.
    pub fn resolve(
        &self,
        basic_salary: Decimal,
        actual_contribution: Decimal,
        periodicity: Periodicity,
    ) -> RetirementBreakdown {
        let e1 = round_money(basic_salary * self.config.retirement_rate);
        let e2 = actual_contribution;
        let e3 = self.config.retirement_cap(periodicity);
        RetirementBreakdown::from_candidates(e1, e2, e3)
    }
}
