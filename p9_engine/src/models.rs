//! Data models for the P9 engine.
//!
//! The `models` module defines the serialisable value types consumed and
//! produced by the engine: one month of pay facts for an employee, the
//! per-period tax result derived from those facts, and the annual P9 tax
//! card that aggregates up to twelve periods.  They derive `Serialize` and
//! `Deserialize` so that the surrounding system can persist them or hand
//! them to a report renderer.

use crate::error::{PayrollError, Result};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Rounds a monetary amount to cents, half away from zero.
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Granularity at which reliefs and caps are looked up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Periodicity {
    /// One pay period.
    Monthly,
    /// A whole tax year.
    Annual,
}

/// One month of pay facts for one employee.
///
/// Built by the caller from a payslip.  `actual_retirement_contribution`
/// must already contain NSSF plus any voluntary pension deductions for the
/// month; see [`crate::deductions::actual_retirement_contribution`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayPeriodFacts {
    /// Column A.
    pub basic_salary: Decimal,
    /// Column D: basic salary plus cash and non-cash benefits.
    pub gross_pay: Decimal,
    /// NSSF plus pension scheme contributions, employee side.
    pub actual_retirement_contribution: Decimal,
    /// Social Health Insurance Fund contribution as withheld; not recomputed.
    pub shif_deduction: Decimal,
    /// Qualifying life/health insurance premiums paid this month.
    #[serde(default)]
    pub insurance_premium: Decimal,
    /// Post retirement medical fund contribution (column H).
    #[serde(default)]
    pub prmf: Decimal,
    /// Owner occupied mortgage interest (column I).
    #[serde(default)]
    pub owner_occupied_interest: Decimal,
    /// Column B.
    #[serde(default)]
    pub benefits_non_cash: Decimal,
    /// Column C.
    #[serde(default)]
    pub value_of_quarters: Decimal,
    /// Calendar month, 1 to 12.
    pub month: u32,
    /// Tax year the month belongs to.
    pub year: i32,
}

impl PayPeriodFacts {
    /// Creates facts with the optional columns set to zero.
    pub fn new(
        year: i32,
        month: u32,
        basic_salary: Decimal,
        gross_pay: Decimal,
        actual_retirement_contribution: Decimal,
        shif_deduction: Decimal,
    ) -> Self {
        PayPeriodFacts {
            basic_salary,
            gross_pay,
            actual_retirement_contribution,
            shif_deduction,
            insurance_premium: Decimal::ZERO,
            prmf: Decimal::ZERO,
            owner_occupied_interest: Decimal::ZERO,
            benefits_non_cash: Decimal::ZERO,
            value_of_quarters: Decimal::ZERO,
            month,
            year,
        }
    }

    /// Sets the qualifying insurance premium paid this month.
    pub fn with_insurance_premium(mut self, premium: Decimal) -> Self {
        self.insurance_premium = premium;
        self
    }

    /// Sets the post retirement medical fund contribution.
    pub fn with_prmf(mut self, prmf: Decimal) -> Self {
        self.prmf = prmf;
        self
    }

    /// Sets the owner occupied mortgage interest paid this month.
    pub fn with_owner_occupied_interest(mut self, interest: Decimal) -> Self {
        self.owner_occupied_interest = interest;
        self
    }

    /// Sets columns B and C.  Both are expected to be included in gross pay
    /// already.
    pub fn with_benefits(mut self, non_cash: Decimal, value_of_quarters: Decimal) -> Self {
        self.benefits_non_cash = non_cash;
        self.value_of_quarters = value_of_quarters;
        self
    }

    /// Rejects facts the engine must not compute on.
    pub fn validate(&self) -> Result<()> {
        if !(1..=12).contains(&self.month) {
            return Err(PayrollError::InvalidMonth(self.month));
        }
        let amounts = [
            ("basic_salary", self.basic_salary),
            ("gross_pay", self.gross_pay),
            ("actual_retirement_contribution", self.actual_retirement_contribution),
            ("shif_deduction", self.shif_deduction),
            ("insurance_premium", self.insurance_premium),
            ("prmf", self.prmf),
            ("owner_occupied_interest", self.owner_occupied_interest),
            ("benefits_non_cash", self.benefits_non_cash),
            ("value_of_quarters", self.value_of_quarters),
        ];
        for (field, amount) in amounts {
            if amount < Decimal::ZERO {
                return Err(PayrollError::invalid(field, format!("{amount} is negative")));
            }
        }
        if self.gross_pay < self.basic_salary {
            return Err(PayrollError::invalid(
                "gross_pay",
                format!(
                    "gross pay {} is below basic salary {}",
                    self.gross_pay, self.basic_salary
                ),
            ));
        }
        Ok(())
    }
}

/// Everything the engine derives for one pay period.
///
/// Never edited by hand; recompute it whenever the facts change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodTaxResult {
    /// E1: percentage of basic salary.
    pub e1_thirty_percent: Decimal,
    /// E2: actual contribution.
    pub e2_actual: Decimal,
    /// E3: fixed statutory cap.
    pub e3_fixed_cap: Decimal,
    /// Lower of E1, E2 and E3.
    pub effective_retirement_deduction: Decimal,
    /// Affordable Housing Levy on gross pay.
    pub ahl: Decimal,
    /// SHIF contribution, passed through from the facts.
    pub shif: Decimal,
    /// Allowable PRMF contribution, capped when the tax year sets a cap.
    pub prmf: Decimal,
    /// Allowable owner occupied interest, capped likewise.
    pub owner_occupied_interest: Decimal,
    /// Effective retirement deduction plus the statutory deductions.
    pub total_deductions: Decimal,
    /// Gross pay less total deductions.  Not clamped; may be negative.
    pub chargeable_pay: Decimal,
    /// Bracket tax on chargeable pay, before reliefs.
    pub tax_charged: Decimal,
    /// Flat monthly personal relief.
    pub personal_relief: Decimal,
    /// Insurance relief on the month's premium, capped per month.
    pub insurance_relief: Decimal,
    /// Tax charged less reliefs, never below zero.
    pub paye_tax: Decimal,
}

/// Identity block printed at the top of a P9 card.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeeIdentity {
    /// Payroll number; also the sort key for bulk output.
    pub employee_id: String,
    pub employee_name: String,
    /// Employee KRA PIN.
    #[serde(default)]
    pub employee_pin: Option<String>,
    #[serde(default)]
    pub employer_name: String,
    /// Employer KRA PIN.
    #[serde(default)]
    pub employer_pin: Option<String>,
}

/// One month line of the P9 card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct P9MonthRow {
    /// Calendar month of the line; must match `facts.month`.
    pub month: u32,
    pub facts: PayPeriodFacts,
    pub result: PeriodTaxResult,
}

/// The annual P9 tax deduction card for one employee and tax year.
///
/// Column totals are summed over the months present.  The effective
/// retirement deduction, total deductions, chargeable pay and PAYE are
/// re-derived from those sums rather than copied from the months.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnualTaxCard {
    pub tax_year: i32,
    pub employee: EmployeeIdentity,
    /// Column A.
    pub basic_salary: Decimal,
    /// Column B.
    pub benefits_non_cash: Decimal,
    /// Column C.
    pub value_of_quarters: Decimal,
    /// Column D.
    pub gross_pay: Decimal,
    /// Column E1: sum of the monthly E1 figures.
    pub e1_thirty_percent: Decimal,
    /// Column E2: sum of the monthly contributions.
    pub e2_actual: Decimal,
    /// Column E3: the monthly cap summed over the months present.
    pub e3_fixed_cap: Decimal,
    /// Lower of the three annual E columns.
    pub effective_retirement_deduction: Decimal,
    pub ahl: Decimal,
    pub shif: Decimal,
    /// Column H.
    pub prmf: Decimal,
    /// Column I.
    pub owner_occupied_interest: Decimal,
    /// Effective retirement deduction plus AHL, SHIF, PRMF and interest.
    pub total_deductions: Decimal,
    /// Gross pay less total deductions; may be negative.
    pub chargeable_pay: Decimal,
    /// See [`crate::p9::AnnualTaxMethod`].
    pub tax_charged: Decimal,
    /// Flat annual relief, or the monthly reliefs summed when pro-rating.
    pub personal_relief: Decimal,
    /// Monthly reliefs summed, capped at the annual limit.
    pub insurance_relief: Decimal,
    /// Tax charged less reliefs, never below zero.
    pub paye_tax: Decimal,
    /// Month lines sorted 1..=12; absent months are simply missing.
    pub months: Vec<P9MonthRow>,
}

impl AnnualTaxCard {
    /// A card with no months and every column at zero.
    pub fn empty(tax_year: i32, employee: EmployeeIdentity) -> Self {
        AnnualTaxCard {
            tax_year,
            employee,
            basic_salary: Decimal::ZERO,
            benefits_non_cash: Decimal::ZERO,
            value_of_quarters: Decimal::ZERO,
            gross_pay: Decimal::ZERO,
            e1_thirty_percent: Decimal::ZERO,
            e2_actual: Decimal::ZERO,
            e3_fixed_cap: Decimal::ZERO,
            effective_retirement_deduction: Decimal::ZERO,
            ahl: Decimal::ZERO,
            shif: Decimal::ZERO,
            prmf: Decimal::ZERO,
            owner_occupied_interest: Decimal::ZERO,
            total_deductions: Decimal::ZERO,
            chargeable_pay: Decimal::ZERO,
            tax_charged: Decimal::ZERO,
            personal_relief: Decimal::ZERO,
            insurance_relief: Decimal::ZERO,
            paye_tax: Decimal::ZERO,
            months: Vec::new(),
        }
    }

    /// Number of month lines on the card.
    pub fn months_present(&self) -> usize {
        self.months.len()
    }

    pub fn is_empty(&self) -> bool {
        self.months.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn facts() -> PayPeriodFacts {
        PayPeriodFacts::new(2024, 3, dec!(50000), dec!(60000), dec!(6000), dec!(1500))
    }

    #[test]
    fn valid_facts_pass() {
        assert!(facts().validate().is_ok());
    }

    #[test]
    fn gross_below_basic_is_rejected() {
        let mut f = facts();
        f.gross_pay = dec!(40000);
        let err = f.validate().unwrap_err();
        assert!(matches!(err, PayrollError::InvalidInput { field: "gross_pay", .. }));
    }

    #[test]
    fn negative_amounts_are_rejected() {
        let f = facts().with_insurance_premium(dec!(-1));
        let err = f.validate().unwrap_err();
        assert!(matches!(err, PayrollError::InvalidInput { field: "insurance_premium", .. }));
    }

    #[test]
    fn month_out_of_range_is_rejected() {
        let mut f = facts();
        f.month = 13;
        assert_eq!(f.validate(), Err(PayrollError::InvalidMonth(13)));
        f.month = 0;
        assert_eq!(f.validate(), Err(PayrollError::InvalidMonth(0)));
    }

    #[test]
    fn optional_columns_default_when_deserialising() {
        let json = r#"{
            "basic_salary": "50000",
            "gross_pay": "60000",
            "actual_retirement_contribution": "6000",
            "shif_deduction": "1500",
            "month": 1,
            "year": 2024
        }"#;
        let f: PayPeriodFacts = serde_json::from_str(json).unwrap();
        assert_eq!(f.prmf, Decimal::ZERO);
        assert_eq!(f.insurance_premium, Decimal::ZERO);
        assert_eq!(f.basic_salary, dec!(50000));
    }

    #[test]
    fn rounding_is_half_away_from_zero() {
        assert_eq!(round_money(dec!(10.005)), dec!(10.01));
        assert_eq!(round_money(dec!(10.004)), dec!(10.00));
    }
}
