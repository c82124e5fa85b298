//! Progressive PAYE bracket tables.
//!
//! A [`BracketTable`] is an ordered list of bands, each taxing the slice of
//! chargeable pay between its lower and upper bound at a flat rate.  The
//! cumulative tax at the start of every band is computed once, from exact
//! decimals, when the table is built.  Looking up the tax for an amount is
//! then a single band lookup, which gives the same answer as walking the
//! marginal slices but with no accumulated rounding.
//!
//! Tables are stored on disk as a list of `{ "upper": ..., "rate": ... }`
//! entries, the last of which has `"upper": null`.

use crate::error::{PayrollError, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One bracket as it appears in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxBracket {
    /// Inclusive upper bound of chargeable pay taxed at `rate`.  `None`
    /// marks the open-ended top bracket.
    pub upper: Option<Decimal>,
    pub rate: Decimal,
}

impl TaxBracket {
    pub fn bounded(upper: Decimal, rate: Decimal) -> Self {
        TaxBracket {
            upper: Some(upper),
            rate,
        }
    }

    pub fn open(rate: Decimal) -> Self {
        TaxBracket { upper: None, rate }
    }
}

/// A bracket with its lower bound and precomputed base tax.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaxBand {
    pub lower: Decimal,
    pub upper: Option<Decimal>,
    pub rate: Decimal,
    /// Tax charged on exactly `lower`.
    pub base_tax: Decimal,
}

impl TaxBand {
    fn contains(&self, amount: Decimal) -> bool {
        self.upper.map_or(true, |upper| amount <= upper)
    }
}

/// Validated, ordered set of progressive tax bands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<TaxBracket>", into = "Vec<TaxBracket>")]
pub struct BracketTable {
    bands: Vec<TaxBand>,
}

impl BracketTable {
    /// Builds a table from brackets in ascending order.
    ///
    /// Bounds must be strictly increasing, rates must lie in `0..=1`, and
    /// only the last bracket may (and must) be open-ended.
    pub fn new(brackets: &[TaxBracket]) -> Result<Self> {
        let Some((last, init)) = brackets.split_last() else {
            return Err(PayrollError::InvalidBrackets("no brackets".into()));
        };
        if last.upper.is_some() {
            return Err(PayrollError::InvalidBrackets(
                "the last bracket must have no upper bound".into(),
            ));
        }
        let mut lower = Decimal::ZERO;
        for (index, bracket) in brackets.iter().enumerate() {
            if bracket.rate < Decimal::ZERO || bracket.rate > Decimal::ONE {
                return Err(PayrollError::InvalidBrackets(format!(
                    "bracket {index} has rate {} outside 0..=1",
                    bracket.rate
                )));
            }
            if index == init.len() {
                break;
            }
            let Some(upper) = bracket.upper else {
                return Err(PayrollError::InvalidBrackets(format!(
                    "bracket {index} is open-ended but is not the last"
                )));
            };
            if upper <= lower {
                return Err(PayrollError::InvalidBrackets(format!(
                    "bracket {index} upper bound {upper} does not exceed {lower}"
                )));
            }
            lower = upper;
        }
        Ok(Self::build(brackets))
    }

    /// Builds bands from brackets already known to be well formed.
    pub(crate) fn build(brackets: &[TaxBracket]) -> Self {
        let mut bands = Vec::with_capacity(brackets.len());
        let mut lower = Decimal::ZERO;
        let mut base_tax = Decimal::ZERO;
        for bracket in brackets {
            bands.push(TaxBand {
                lower,
                upper: bracket.upper,
                rate: bracket.rate,
                base_tax,
            });
            if let Some(upper) = bracket.upper {
                base_tax += (upper - lower) * bracket.rate;
                lower = upper;
            }
        }
        BracketTable { bands }
    }

    pub fn bands(&self) -> &[TaxBand] {
        &self.bands
    }

    /// Tax charged on `chargeable_pay`.
    ///
    /// Zero for non-positive amounts; never negative.
    pub fn compute_tax(&self, chargeable_pay: Decimal) -> Decimal {
        if chargeable_pay <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        // The last band is open-ended, so a band always matches.
        match self.bands.iter().find(|band| band.contains(chargeable_pay)) {
            Some(band) => band.base_tax + (chargeable_pay - band.lower) * band.rate,
            None => Decimal::ZERO,
        }
    }
}

impl TryFrom<Vec<TaxBracket>> for BracketTable {
    type Error = PayrollError;

    fn try_from(brackets: Vec<TaxBracket>) -> Result<Self> {
        BracketTable::new(&brackets)
    }
}

impl From<BracketTable> for Vec<TaxBracket> {
    fn from(table: BracketTable) -> Self {
        table
            .bands
            .into_iter()
            .map(|band| TaxBracket {
                upper: band.upper,
                rate: band.rate,
            })
            .collect()
    }
}

/// Tax charged on `chargeable_pay` under `brackets`.
pub fn compute_tax(chargeable_pay: Decimal, brackets: &BracketTable) -> Decimal {
    brackets.compute_tax(chargeable_pay)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TaxYearConfig;
    use rust_decimal_macros::dec;

    fn monthly() -> BracketTable {
        TaxYearConfig::kenya_2024().monthly_brackets
    }

    fn annual() -> BracketTable {
        TaxYearConfig::kenya_2024().annual_brackets
    }

    #[test]
    fn monthly_boundaries_match_published_figures() {
        let table = monthly();
        assert_eq!(table.compute_tax(dec!(24000)), dec!(2400.00));
        assert_eq!(table.compute_tax(dec!(32333)), dec!(4483.25));
        assert_eq!(table.compute_tax(dec!(500000)), dec!(144783.35));
        assert_eq!(table.compute_tax(dec!(800000)), dec!(242283.35));
        assert_eq!(table.compute_tax(dec!(800100)), dec!(242318.35));
    }

    #[test]
    fn annual_base_tax_is_precomputed_per_band() {
        let bases: Vec<Decimal> = annual().bands().iter().map(|b| b.base_tax).collect();
        assert_eq!(
            bases,
            vec![dec!(0), dec!(28800), dec!(53800), dec!(1737400), dec!(2907400)]
        );
    }

    #[test]
    fn zero_and_negative_pay_is_untaxed() {
        let table = monthly();
        assert_eq!(table.compute_tax(Decimal::ZERO), Decimal::ZERO);
        assert_eq!(table.compute_tax(dec!(-100)), Decimal::ZERO);
    }

    #[test]
    fn scenario_chargeable_pay() {
        assert_eq!(compute_tax(dec!(51600), &monthly()), dec!(10263.35));
    }

    #[test]
    fn rejects_bounded_last_bracket() {
        let err = BracketTable::new(&[TaxBracket::bounded(dec!(100), dec!(0.1))]).unwrap_err();
        assert!(matches!(err, PayrollError::InvalidBrackets(_)));
    }

    #[test]
    fn rejects_unordered_bounds() {
        let err = BracketTable::new(&[
            TaxBracket::bounded(dec!(100), dec!(0.1)),
            TaxBracket::bounded(dec!(50), dec!(0.2)),
            TaxBracket::open(dec!(0.3)),
        ])
        .unwrap_err();
        assert!(matches!(err, PayrollError::InvalidBrackets(_)));
    }

    #[test]
    fn rejects_open_bracket_before_the_end() {
        let err = BracketTable::new(&[TaxBracket::open(dec!(0.1)), TaxBracket::open(dec!(0.2))])
            .unwrap_err();
        assert!(matches!(err, PayrollError::InvalidBrackets(_)));
    }

    #[test]
    fn rejects_empty_table_and_bad_rate() {
        assert!(BracketTable::new(&[]).is_err());
        assert!(BracketTable::new(&[TaxBracket::open(dec!(1.5))]).is_err());
    }

    #[test]
    fn table_round_trips_through_json_brackets() {
        let json = r#"[{"upper": "100", "rate": "0.1"}, {"upper": null, "rate": "0.2"}]"#;
        let table: BracketTable = serde_json::from_str(json).unwrap();
        assert_eq!(table.compute_tax(dec!(150)), dec!(20));
        let bad = r#"[{"upper": "100", "rate": "0.1"}]"#;
        assert!(serde_json::from_str::<BracketTable>(bad).is_err());
    }
}
