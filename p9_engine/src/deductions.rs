//! Statutory deductions other than retirement: the Affordable Housing
//! Levy, SHIF, post retirement medical fund and owner occupied interest.

use crate::config::TaxYearConfig;
use crate::models::{round_money, PayPeriodFacts};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A deduction line as it appears on a payslip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayslipDeduction {
    /// Free text deduction type, e.g. `"Pension - Jubilee"`.
    pub kind: String,
    pub amount: Decimal,
    /// Statutory deductions (NSSF, SHIF, AHL, PAYE) are not voluntary
    /// pension contributions even when their label mentions a pension.
    #[serde(default)]
    pub statutory: bool,
}

/// E2 for one payslip: NSSF plus every voluntary pension deduction.
pub fn actual_retirement_contribution(nssf: Decimal, deductions: &[PayslipDeduction]) -> Decimal {
    deductions
        .iter()
        .filter(|d| !d.statutory && d.kind.to_lowercase().contains("pension"))
        .fold(nssf, |total, d| total + d.amount)
}

/// Non-retirement deductions for one period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatutoryDeductions {
    pub ahl: Decimal,
    pub shif: Decimal,
    pub prmf: Decimal,
    pub owner_occupied_interest: Decimal,
}

impl StatutoryDeductions {
    pub fn total(&self) -> Decimal {
        self.ahl + self.shif + self.prmf + self.owner_occupied_interest
    }
}

/// Computes AHL and applies the configured PRMF and interest caps.  SHIF
/// is taken as withheld.
#[derive(Debug, Clone, Copy)]
pub struct StatutoryDeductionSet<'a> {
    config: &'a TaxYearConfig,
}

impl<'a> StatutoryDeductionSet<'a> {
    pub fn new(config: &'a TaxYearConfig) -> Self {
        StatutoryDeductionSet { config }
    }

    /// Housing levy on gross pay.  Uncapped.
    pub fn ahl(&self, gross_pay: Decimal) -> Decimal {
        round_money(gross_pay * self.config.ahl_rate)
    }

    /// AHL is computed; SHIF is passed through from the payslip; PRMF and
    /// owner occupied interest are passed through, clamped to the monthly
    /// cap when one is configured.
    pub fn compute(&self, facts: &PayPeriodFacts) -> StatutoryDeductions {
        StatutoryDeductions {
            ahl: self.ahl(facts.gross_pay),
            shif: facts.shif_deduction,
            prmf: clamp_to(facts.prmf, self.config.prmf_cap_monthly),
            owner_occupied_interest: clamp_to(
                facts.owner_occupied_interest,
                self.config.owner_occupied_interest_cap_monthly,
            ),
        }
    }
}

fn clamp_to(amount: Decimal, cap: Option<Decimal>) -> Decimal {
    match cap {
        Some(cap) => amount.min(cap),
        None => amount,
    }
}
