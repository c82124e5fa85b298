//! Personal and insurance relief.

use crate::config::TaxYearConfig;
use crate::models::{round_money, Periodicity};
use rust_decimal::Decimal;

/// Looks up reliefs for a tax year.
#[derive(Debug, Clone, Copy)]
pub struct ReliefCalculator<'a> {
    config: &'a TaxYearConfig,
}

impl<'a> ReliefCalculator<'a> {
    pub fn new(config: &'a TaxYearConfig) -> Self {
        ReliefCalculator { config }
    }

    /// The statutory personal relief.  The annual figure is a flat
    /// constant, not the monthly figure times the months worked.
    pub fn personal_relief(&self, periodicity: Periodicity) -> Decimal {
        match periodicity {
            Periodicity::Monthly => self.config.personal_relief_monthly,
            Periodicity::Annual => self.config.personal_relief_annual,
        }
    }

    /// Relief on qualifying insurance premiums, clamped to the period cap.
    pub fn insurance_relief(&self, premium_paid: Decimal, periodicity: Periodicity) -> Decimal {
        let relief = round_money(premium_paid.max(Decimal::ZERO) * self.config.insurance_relief_rate);
        relief.min(self.insurance_relief_cap(periodicity))
    }

    pub fn insurance_relief_cap(&self, periodicity: Periodicity) -> Decimal {
        match periodicity {
            Periodicity::Monthly => self.config.insurance_relief_cap_monthly,
            Periodicity::Annual => self.config.insurance_relief_cap_annual,
        }
    }
}
