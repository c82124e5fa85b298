//! Completeness and consistency checks on a generated P9 card.
//!
//! Errors make a card unfit to issue; warnings flag figures a payroll
//! officer should look at before the card goes out.

use crate::config::TaxYearConfig;
use crate::models::{round_money, AnnualTaxCard};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use thiserror::Error;

const TOLERANCE: Decimal = dec!(0.01);

/// A finding on a P9 card.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum P9Issue {
    /// The employee has no KRA PIN.  An error: KRA rejects the card.
    #[error("employee KRA PIN is required")]
    MissingEmployeePin,

    /// The employer has no KRA PIN.
    #[error("employer KRA PIN is missing")]
    MissingEmployerPin,

    /// Column A totals zero or less on a card with months.
    #[error("basic salary must be greater than zero")]
    NonPositiveBasicSalary,

    /// Column D differs from A + B + C by more than a cent.
    #[error("gross pay mismatch: expected {expected} (A+B+C), got {found}")]
    GrossPayMismatch { expected: Decimal, found: Decimal },

    /// The AHL column is off from the levy rate applied to gross pay.
    #[error("AHL may be incorrect: expected {expected}, got {found}")]
    AhlMismatch { expected: Decimal, found: Decimal },

    /// Personal relief is not the flat annual figure, usually because the
    /// card was pro-rated.
    #[error("personal relief should be {expected} per year, got {found}")]
    PersonalReliefMismatch { expected: Decimal, found: Decimal },

    /// E2 exceeds the lower of E1 and E3, so part of the contribution was
    /// not deductible.
    #[error("actual retirement contribution {actual} exceeds the allowable limit {limit}")]
    RetirementAboveLimit { actual: Decimal, limit: Decimal },
}

/// Result of [`P9Validator::validate`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct P9Validation {
    pub errors: Vec<P9Issue>,
    pub warnings: Vec<P9Issue>,
}

impl P9Validation {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct P9Validator<'a> {
    config: &'a TaxYearConfig,
}

impl<'a> P9Validator<'a> {
    pub fn new(config: &'a TaxYearConfig) -> Self {
        P9Validator { config }
    }

    pub fn validate(&self, card: &AnnualTaxCard) -> P9Validation {
        let mut report = P9Validation::default();

        if is_blank(&card.employee.employee_pin) {
            report.errors.push(P9Issue::MissingEmployeePin);
        }
        if is_blank(&card.employee.employer_pin) {
            report.warnings.push(P9Issue::MissingEmployerPin);
        }
        if card.is_empty() {
            return report;
        }
        if card.basic_salary <= Decimal::ZERO {
            report.errors.push(P9Issue::NonPositiveBasicSalary);
        }

        let expected_gross = card.basic_salary + card.benefits_non_cash + card.value_of_quarters;
        if (card.gross_pay - expected_gross).abs() > TOLERANCE {
            report.warnings.push(P9Issue::GrossPayMismatch {
                expected: expected_gross,
                found: card.gross_pay,
            });
        }

        // Each month's levy is rounded separately.
        let expected_ahl = round_money(card.gross_pay * self.config.ahl_rate);
        let ahl_tolerance = TOLERANCE * Decimal::from(card.months_present());
        if (card.ahl - expected_ahl).abs() > ahl_tolerance {
            report.warnings.push(P9Issue::AhlMismatch {
                expected: expected_ahl,
                found: card.ahl,
            });
        }

        if card.personal_relief != self.config.personal_relief_annual {
            report.warnings.push(P9Issue::PersonalReliefMismatch {
                expected: self.config.personal_relief_annual,
                found: card.personal_relief,
            });
        }

        let limit = card.e1_thirty_percent.min(card.e3_fixed_cap);
        if card.e2_actual > limit {
            report.warnings.push(P9Issue::RetirementAboveLimit {
                actual: card.e2_actual,
                limit,
            });
        }

        report
    }
}

fn is_blank(pin: &Option<String>) -> bool {
    pin.as_deref().map_or(true, |pin| pin.trim().is_empty())
}
