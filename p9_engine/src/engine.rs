//! Per-period PAYE computation.
//!
//! The `engine` module turns one month of [`PayPeriodFacts`] into a
//! [`PeriodTaxResult`].  It composes the retirement resolver, the
//! statutory deduction set, the bracket table and the relief calculator
//! for a single tax year; all statutory figures come from the
//! [`TaxYearConfig`] the engine was built with.

use crate::config::TaxYearConfig;
use crate::deductions::StatutoryDeductionSet;
use crate::error::Result;
use crate::models::{round_money, PayPeriodFacts, PeriodTaxResult, Periodicity};
use crate::relief::ReliefCalculator;
use crate::retirement::RetirementContributionResolver;
use rust_decimal::Decimal;
use tracing::debug;

/// Computes PAYE for a single pay period under one tax year's figures.
///
/// The engine only borrows its configuration, so it is cheap to build one
/// per call site and to share it across threads.
#[derive(Debug, Clone, Copy)]
pub struct PeriodTaxEngine<'a> {
    config: &'a TaxYearConfig,
}

impl<'a> PeriodTaxEngine<'a> {
    pub fn new(config: &'a TaxYearConfig) -> Self {
        PeriodTaxEngine { config }
    }

    /// Validates `facts` and computes the month's deductions and PAYE.
    ///
    /// Deductions larger than gross pay are not an error: chargeable pay
    /// is reported negative and no tax is charged.
    pub fn compute(&self, facts: &PayPeriodFacts) -> Result<PeriodTaxResult> {
        facts.validate()?;
        Ok(self.compute_validated(facts))
    }

    pub(crate) fn compute_validated(&self, facts: &PayPeriodFacts) -> PeriodTaxResult {
        let retirement = RetirementContributionResolver::new(self.config).resolve(
            facts.basic_salary,
            facts.actual_retirement_contribution,
            Periodicity::Monthly,
        );
        let statutory = StatutoryDeductionSet::new(self.config).compute(facts);

        let total_deductions = retirement.effective + statutory.total();
        let chargeable_pay = facts.gross_pay - total_deductions;
        let tax_charged = round_money(
            self.config
                .brackets(Periodicity::Monthly)
                .compute_tax(chargeable_pay),
        );

        let relief = ReliefCalculator::new(self.config);
        let personal_relief = relief.personal_relief(Periodicity::Monthly);
        let insurance_relief = relief.insurance_relief(facts.insurance_premium, Periodicity::Monthly);
        let paye_tax = net_paye(tax_charged, personal_relief, insurance_relief);

        debug!(
            year = facts.year,
            month = facts.month,
            %chargeable_pay,
            %tax_charged,
            %paye_tax,
            "computed pay period"
        );

        PeriodTaxResult {
            e1_thirty_percent: retirement.e1,
            e2_actual: retirement.e2,
            e3_fixed_cap: retirement.e3,
            effective_retirement_deduction: retirement.effective,
            ahl: statutory.ahl,
            shif: statutory.shif,
            prmf: statutory.prmf,
            owner_occupied_interest: statutory.owner_occupied_interest,
            total_deductions,
            chargeable_pay,
            tax_charged,
            personal_relief,
            insurance_relief,
            paye_tax,
        }
    }
}

/// Tax charged less reliefs, floored at zero.
pub fn net_paye(tax_charged: Decimal, personal_relief: Decimal, insurance_relief: Decimal) -> Decimal {
    (tax_charged - personal_relief - insurance_relief).max(Decimal::ZERO)
}
