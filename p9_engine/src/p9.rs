//! Annual P9 tax card aggregation.
//!
//! The aggregator folds up to twelve month rows for one employee into an
//! [`AnnualTaxCard`].  Additive columns are summed over the months that
//! are present; missing months contribute nothing.  The lower of E, total
//! deductions, chargeable pay and PAYE are then re-derived from the annual
//! sums, so the lower of E on the card is `min(ΣE1, ΣE2, ΣE3)` and not the
//! sum of the monthly minimums.  E3 is summed like any other column, so a
//! partial year only gets the fixed cap for the months actually worked.

use crate::config::TaxYearConfig;
use crate::engine::{net_paye, PeriodTaxEngine};
use crate::error::{PayrollError, Result};
use crate::models::{
    round_money, AnnualTaxCard, EmployeeIdentity, P9MonthRow, PayPeriodFacts, Periodicity,
};
use crate::relief::ReliefCalculator;
use crate::retirement::RetirementBreakdown;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::info;

/// How the annual tax charged column is obtained.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnnualTaxMethod {
    /// Sum of the tax charged in each month.  Monthly brackets do not
    /// scale linearly when pay varies, so this follows what was actually
    /// charged each pay period.
    #[default]
    SumOfMonthly,
    /// Annual bracket table applied to the annual chargeable pay.
    AnnualBrackets,
}

/// Choices the tax authority has not settled, exposed per bulk run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregationOptions {
    /// When set, the annual personal relief is the sum of the monthly
    /// relief for the months present.  When clear, the flat annual
    /// statutory relief applies to any non-empty year.
    #[serde(default)]
    pub pro_rate_partial_year: bool,
    #[serde(default)]
    pub annual_tax_method: AnnualTaxMethod,
}

/// Builds P9 tax cards for one tax year.
#[derive(Debug, Clone, Copy)]
pub struct AnnualAggregator<'a> {
    config: &'a TaxYearConfig,
    options: AggregationOptions,
}

impl<'a> AnnualAggregator<'a> {
    pub fn new(config: &'a TaxYearConfig) -> Self {
        Self::with_options(config, AggregationOptions::default())
    }

    pub fn with_options(config: &'a TaxYearConfig, options: AggregationOptions) -> Self {
        AnnualAggregator { config, options }
    }

    /// Computes every month with the period engine, then aggregates.
    pub fn generate(
        &self,
        tax_year: i32,
        employee: EmployeeIdentity,
        periods: &[PayPeriodFacts],
    ) -> Result<AnnualTaxCard> {
        let engine = PeriodTaxEngine::new(self.config);
        let rows = periods
            .iter()
            .map(|facts| {
                Ok(P9MonthRow {
                    month: facts.month,
                    facts: facts.clone(),
                    result: engine.compute(facts)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        self.aggregate(tax_year, employee, rows)
    }

    /// Folds already computed month rows into a card.
    ///
    /// Rows may arrive in any order; the card lists them by month.  An
    /// empty set of rows yields the all-zero card.
    pub fn aggregate(
        &self,
        tax_year: i32,
        employee: EmployeeIdentity,
        mut rows: Vec<P9MonthRow>,
    ) -> Result<AnnualTaxCard> {
        check_rows(tax_year, &rows)?;
        rows.sort_by_key(|row| row.month);

        let mut card = AnnualTaxCard::empty(tax_year, employee);
        if rows.is_empty() {
            return Ok(card);
        }

        card.basic_salary = total(&rows, |r| r.facts.basic_salary);
        card.benefits_non_cash = total(&rows, |r| r.facts.benefits_non_cash);
        card.value_of_quarters = total(&rows, |r| r.facts.value_of_quarters);
        card.gross_pay = total(&rows, |r| r.facts.gross_pay);
        card.ahl = total(&rows, |r| r.result.ahl);
        card.shif = total(&rows, |r| r.result.shif);
        card.prmf = total(&rows, |r| r.result.prmf);
        card.owner_occupied_interest = total(&rows, |r| r.result.owner_occupied_interest);

        let relief = ReliefCalculator::new(self.config);
        let personal_relief = if self.options.pro_rate_partial_year {
            total(&rows, |r| r.result.personal_relief)
        } else {
            relief.personal_relief(Periodicity::Annual)
        };
        let retirement = RetirementBreakdown::from_candidates(
            total(&rows, |r| r.result.e1_thirty_percent),
            total(&rows, |r| r.result.e2_actual),
            total(&rows, |r| r.result.e3_fixed_cap),
        );
        card.e1_thirty_percent = retirement.e1;
        card.e2_actual = retirement.e2;
        card.e3_fixed_cap = retirement.e3;
        card.effective_retirement_deduction = retirement.effective;

        card.total_deductions = retirement.effective
            + card.ahl
            + card.shif
            + card.prmf
            + card.owner_occupied_interest;
        card.chargeable_pay = card.gross_pay - card.total_deductions;

        card.tax_charged = match self.options.annual_tax_method {
            AnnualTaxMethod::SumOfMonthly => total(&rows, |r| r.result.tax_charged),
            AnnualTaxMethod::AnnualBrackets => {
                round_money(
                    self.config
                        .brackets(Periodicity::Annual)
                        .compute_tax(card.chargeable_pay),
                )
            }
        };
        card.personal_relief = personal_relief;
        card.insurance_relief = total(&rows, |r| r.result.insurance_relief)
            .min(relief.insurance_relief_cap(Periodicity::Annual));
        card.paye_tax = net_paye(card.tax_charged, card.personal_relief, card.insurance_relief);
        card.months = rows;

        info!(
            tax_year,
            employee_id = %card.employee.employee_id,
            months = card.months.len(),
            paye_tax = %card.paye_tax,
            "aggregated P9 card"
        );
        Ok(card)
    }
}

fn total(rows: &[P9MonthRow], column: impl Fn(&P9MonthRow) -> Decimal) -> Decimal {
    rows.iter().map(column).sum()
}

fn check_rows(tax_year: i32, rows: &[P9MonthRow]) -> Result<()> {
    if rows.len() > 12 {
        return Err(PayrollError::TooManyPeriods(rows.len()));
    }
    let mut seen = BTreeSet::new();
    for row in rows {
        if !(1..=12).contains(&row.month) {
            return Err(PayrollError::InvalidMonth(row.month));
        }
        if row.facts.month != row.month {
            return Err(PayrollError::invalid(
                "month",
                format!("row for month {} carries facts for month {}", row.month, row.facts.month),
            ));
        }
        if row.facts.year != tax_year {
            return Err(PayrollError::YearMismatch {
                expected: tax_year,
                found: row.facts.year,
            });
        }
        if !seen.insert(row.month) {
            return Err(PayrollError::DuplicateMonth(row.month));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn employee() -> EmployeeIdentity {
        EmployeeIdentity {
            employee_id: "EMP-001".into(),
            employee_name: "Wanjiku Kamau".into(),
            employee_pin: Some("A012345678Z".into()),
            employer_name: "Acme Kenya Ltd".into(),
            employer_pin: Some("P051234567Q".into()),
        }
    }

    fn scenario_year() -> Vec<PayPeriodFacts> {
        (1..=12)
            .map(|m| PayPeriodFacts::new(2024, m, dec!(50000), dec!(60000), dec!(6000), dec!(1500)))
            .collect()
    }

    #[test]
    fn full_year_totals_are_twelve_times_the_month() {
        let config = TaxYearConfig::kenya_2024();
        let card = AnnualAggregator::new(&config)
            .generate(2024, employee(), &scenario_year())
            .unwrap();
        assert_eq!(card.basic_salary, dec!(600000));
        assert_eq!(card.gross_pay, dec!(720000));
        assert_eq!(card.e1_thirty_percent, dec!(180000));
        assert_eq!(card.e2_actual, dec!(72000));
        assert_eq!(card.e3_fixed_cap, dec!(360000));
        assert_eq!(card.effective_retirement_deduction, dec!(72000));
        assert_eq!(card.ahl, dec!(10800));
        assert_eq!(card.shif, dec!(18000));
        assert_eq!(card.total_deductions, dec!(100800));
        assert_eq!(card.chargeable_pay, dec!(619200));
        assert_eq!(card.tax_charged, dec!(123160.20));
        assert_eq!(card.personal_relief, dec!(28800));
        assert_eq!(card.paye_tax, dec!(94360.20));
        assert_eq!(card.months.len(), 12);
    }

    #[test]
    fn rows_are_sorted_by_month() {
        let config = TaxYearConfig::kenya_2024();
        let mut periods = scenario_year();
        periods.reverse();
        let card = AnnualAggregator::new(&config)
            .generate(2024, employee(), &periods)
            .unwrap();
        let months: Vec<u32> = card.months.iter().map(|r| r.month).collect();
        assert_eq!(months, (1..=12).collect::<Vec<_>>());
    }

    #[test]
    fn duplicate_month_is_rejected() {
        let config = TaxYearConfig::kenya_2024();
        let mut periods = scenario_year();
        periods[3].month = 3;
        let err = AnnualAggregator::new(&config)
            .generate(2024, employee(), &periods)
            .unwrap_err();
        assert_eq!(err, PayrollError::DuplicateMonth(3));
    }

    #[test]
    fn period_from_another_year_is_rejected() {
        let config = TaxYearConfig::kenya_2024();
        let mut periods = scenario_year();
        periods[0].year = 2023;
        let err = AnnualAggregator::new(&config)
            .generate(2024, employee(), &periods)
            .unwrap_err();
        assert_eq!(
            err,
            PayrollError::YearMismatch {
                expected: 2024,
                found: 2023
            }
        );
    }

    #[test]
    fn more_than_twelve_rows_is_rejected() {
        let config = TaxYearConfig::kenya_2024();
        let mut periods = scenario_year();
        periods.push(periods[0].clone());
        let err = AnnualAggregator::new(&config)
            .generate(2024, employee(), &periods)
            .unwrap_err();
        assert_eq!(err, PayrollError::TooManyPeriods(13));
    }

    #[test]
    fn empty_year_is_all_zero() {
        let config = TaxYearConfig::kenya_2024();
        let card = AnnualAggregator::new(&config)
            .aggregate(2024, employee(), Vec::new())
            .unwrap();
        assert_eq!(card, AnnualTaxCard::empty(2024, employee()));
        assert_eq!(card.paye_tax, Decimal::ZERO);
        assert_eq!(card.personal_relief, Decimal::ZERO);
    }

    #[test]
    fn lower_of_e_uses_annual_sums() {
        let config = TaxYearConfig::kenya_2024();
        // E2 is the monthly minimum in the first half, E1 in the second.
        let periods: Vec<PayPeriodFacts> = (1..=12)
            .map(|m| {
                if m <= 6 {
                    PayPeriodFacts::new(2024, m, dec!(50000), dec!(50000), dec!(1000), dec!(0))
                } else {
                    PayPeriodFacts::new(2024, m, dec!(10000), dec!(10000), dec!(20000), dec!(0))
                }
            })
            .collect();
        let card = AnnualAggregator::new(&config)
            .generate(2024, employee(), &periods)
            .unwrap();
        let sum_of_monthly: Decimal = card
            .months
            .iter()
            .map(|r| r.result.effective_retirement_deduction)
            .sum();
        // Monthly minimums: 6 x 1,000 + 6 x 3,000.
        assert_eq!(sum_of_monthly, dec!(24000));
        // Annual: min(ΣE1 = 108,000, ΣE2 = 126,000, ΣE3 = 360,000).
        assert_eq!(card.effective_retirement_deduction, dec!(108000));
        assert_ne!(card.effective_retirement_deduction, sum_of_monthly);
    }

    #[test]
    fn partial_year_sums_e3_and_keeps_flat_relief_by_default() {
        let config = TaxYearConfig::kenya_2024();
        let periods = &scenario_year()[..4];
        let card = AnnualAggregator::new(&config)
            .generate(2024, employee(), periods)
            .unwrap();
        assert_eq!(card.e3_fixed_cap, dec!(120000));
        assert_eq!(card.effective_retirement_deduction, dec!(24000));
        assert_eq!(card.personal_relief, dec!(28800));
        assert_eq!(card.tax_charged, dec!(41053.40));
        assert_eq!(card.paye_tax, dec!(12253.40));
    }

    #[test]
    fn partial_year_retirement_cap_covers_only_months_worked() {
        let config = TaxYearConfig::kenya_2024();
        let periods: Vec<PayPeriodFacts> = (1..=4)
            .map(|m| PayPeriodFacts::new(2024, m, dec!(200000), dec!(200000), dec!(40000), dec!(0)))
            .collect();
        let card = AnnualAggregator::new(&config)
            .generate(2024, employee(), &periods)
            .unwrap();
        assert_eq!(card.e1_thirty_percent, dec!(240000));
        assert_eq!(card.e2_actual, dec!(160000));
        assert_eq!(card.e3_fixed_cap, dec!(120000));
        // A flat 360,000 cap would let the full 160,000 through.
        assert_eq!(card.effective_retirement_deduction, dec!(120000));
        let monthly: Decimal = card
            .months
            .iter()
            .map(|r| r.result.effective_retirement_deduction)
            .sum();
        assert_eq!(card.effective_retirement_deduction, monthly);
        assert_eq!(card.total_deductions, dec!(120000) + card.ahl);
    }

    #[test]
    fn partial_year_pro_rates_when_asked() {
        let config = TaxYearConfig::kenya_2024();
        let options = AggregationOptions {
            pro_rate_partial_year: true,
            ..Default::default()
        };
        let periods = &scenario_year()[..4];
        let card = AnnualAggregator::with_options(&config, options)
            .generate(2024, employee(), periods)
            .unwrap();
        assert_eq!(card.e3_fixed_cap, dec!(120000));
        assert_eq!(card.personal_relief, dec!(9600));
        assert_eq!(card.paye_tax, dec!(31453.40));
    }

    #[test]
    fn annual_bracket_method_recomputes_tax() {
        let config = TaxYearConfig::kenya_2024();
        let options = AggregationOptions {
            annual_tax_method: AnnualTaxMethod::AnnualBrackets,
            ..Default::default()
        };
        let card = AnnualAggregator::with_options(&config, options)
            .generate(2024, employee(), &scenario_year())
            .unwrap();
        // 28,800 + 25,000 + 30% of (619,200 - 388,000).
        assert_eq!(card.tax_charged, dec!(123160));
        assert_eq!(card.paye_tax, dec!(94360));
    }

    #[test]
    fn insurance_relief_is_capped_annually() {
        let mut config = TaxYearConfig::kenya_2024();
        config.insurance_relief_cap_annual = dec!(10000);
        let periods: Vec<PayPeriodFacts> = scenario_year()
            .into_iter()
            .map(|f| f.with_insurance_premium(dec!(10000)))
            .collect();
        let card = AnnualAggregator::new(&config)
            .generate(2024, employee(), &periods)
            .unwrap();
        assert_eq!(card.months[0].result.insurance_relief, dec!(1500));
        assert_eq!(card.insurance_relief, dec!(10000));
    }
}
