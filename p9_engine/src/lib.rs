//! P9 Engine library crate.
//!
//! This crate implements the Kenyan statutory payroll tax rules and the
//! annual P9 tax deduction card.  External applications may compute a
//! single month with [`engine::PeriodTaxEngine`], build a card with
//! [`p9::AnnualAggregator`], or generate cards for a whole payroll with
//! [`bulk::generate_bulk`].  Persistence, PDF rendering and HTTP handling
//! belong to the caller.

pub mod error;
pub mod models;
pub mod config;
pub mod tax;
pub mod relief;
pub mod retirement;
pub mod deductions;
pub mod engine;
pub mod p9;
pub mod validation;
pub mod bulk;

pub use config::{TaxYearConfig, TaxYearRegistry};
pub use engine::PeriodTaxEngine;
pub use error::{PayrollError, Result};
pub use models::{AnnualTaxCard, EmployeeIdentity, P9MonthRow, PayPeriodFacts, PeriodTaxResult, Periodicity};
pub use p9::{AggregationOptions, AnnualAggregator, AnnualTaxMethod};
