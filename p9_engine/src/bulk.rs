//! Bulk P9 generation.
//!
//! The `bulk` module generates P9 cards for every employee of a payroll
//! for one tax year.  It uses the [`rayon`] crate to spread employees
//! across CPU cores; each card is an independent pure computation.  A
//! failure for one employee is recorded in the summary and does not stop
//! the others.

use crate::config::TaxYearRegistry;
use crate::error::Result;
use crate::models::{AnnualTaxCard, EmployeeIdentity, PayPeriodFacts};
use crate::p9::{AggregationOptions, AnnualAggregator};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

/// One employee's pay facts for the year.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmployeeYear {
    pub employee: EmployeeIdentity,
    #[serde(default)]
    pub periods: Vec<PayPeriodFacts>,
}

/// Input to a bulk run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkP9Request {
    pub tax_year: i32,
    #[serde(default)]
    pub options: AggregationOptions,
    pub employees: Vec<EmployeeYear>,
}

/// An employee whose card could not be generated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkFailure {
    pub employee_id: String,
    pub employee_name: String,
    pub error: String,
}

/// The outcome of a bulk run.  Cards and failures are sorted by
/// employee id so that repeated runs produce identical output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkP9Summary {
    pub tax_year: i32,
    pub total_employees: usize,
    pub successful: usize,
    pub failed: usize,
    pub cards: Vec<AnnualTaxCard>,
    pub errors: Vec<BulkFailure>,
}

/// Generates one card per employee.
///
/// Returns an error only when no configuration covers the tax year;
/// per-employee problems end up in [`BulkP9Summary::errors`].
#[instrument(skip_all, fields(tax_year = request.tax_year, employees = request.employees.len()))]
pub fn generate_bulk(request: BulkP9Request, registry: &TaxYearRegistry) -> Result<BulkP9Summary> {
    let config = registry.for_year(request.tax_year)?;
    let aggregator = AnnualAggregator::with_options(config, request.options);
    let tax_year = request.tax_year;
    let total_employees = request.employees.len();

    let outcomes: Vec<std::result::Result<AnnualTaxCard, BulkFailure>> = request
        .employees
        .into_par_iter()
        .map(|entry| {
            aggregator
                .generate(tax_year, entry.employee.clone(), &entry.periods)
                .map_err(|err| {
                    warn!(employee_id = %entry.employee.employee_id, error = %err, "P9 generation failed");
                    BulkFailure {
                        employee_id: entry.employee.employee_id,
                        employee_name: entry.employee.employee_name,
                        error: err.to_string(),
                    }
                })
        })
        .collect();

    let (mut cards, mut errors): (Vec<_>, Vec<_>) = (Vec::new(), Vec::new());
    for outcome in outcomes {
        match outcome {
            Ok(card) => cards.push(card),
            Err(failure) => errors.push(failure),
        }
    }
    cards.sort_by(|a, b| a.employee.employee_id.cmp(&b.employee.employee_id));
    errors.sort_by(|a, b| a.employee_id.cmp(&b.employee_id));

    info!(successful = cards.len(), failed = errors.len(), "bulk P9 generation finished");
    Ok(BulkP9Summary {
        tax_year,
        total_employees,
        successful: cards.len(),
        failed: errors.len(),
        cards,
        errors,
    })
}
