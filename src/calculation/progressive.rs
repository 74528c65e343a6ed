//! Progressive bracket evaluation.
//!
//! This is the core every bracket-based tax goes through. A bracket taxes
//! the slice of the amount between the previous bracket's upper bound (or
//! the first bracket's `min`) and its own `max`. Tables whose brackets
//! step by one (`0-12570`, `12571-50270`) are therefore charged on
//! exactly `max - min + 1` units per inner bracket, and an amount equal
//! to a bracket's `max` never reaches the next bracket.
//!
//! Measuring from the previous bound means:
//!
//! - a first bracket starting at 0 holds `max` units, not `max + 1`;
//! - a table whose first `min` is above zero leaves everything below that
//!   `min` untaxed, so taxing starts at `min` rather than at zero;
//! - in continuous tables (`min(i+1) == max(i)`) each bracket holds
//!   `max - min` units, with no extra unit at the shared bound.

use rust_decimal::Decimal;

use crate::models::{BracketSlice, BracketTable, RateSchedule};

use super::common::percent_of;

/// Tax due on an amount together with the per-bracket breakdown.
#[derive(Debug, Clone, PartialEq)]
pub struct BracketEvaluation {
    /// Total tax.
    pub tax: Decimal,
    /// The brackets the amount reached, in ascending order.
    pub slices: Vec<BracketSlice>,
}

/// Calculates the tax due on `amount` under a progressive table.
///
/// Zero, negative amounts and empty tables all produce zero tax.
///
/// # Examples
///
/// ```
/// use tax_engine::calculation::calculate_progressive_tax;
/// use tax_engine::models::{BracketTable, TaxBracket};
/// use rust_decimal::Decimal;
///
/// let table = BracketTable::new(vec![
///     TaxBracket::new(Decimal::ZERO, Some(Decimal::from(12570)), Decimal::ZERO, "Personal Allowance"),
///     TaxBracket::new(Decimal::from(12571), Some(Decimal::from(50270)), Decimal::from(20), "Basic Rate"),
///     TaxBracket::new(Decimal::from(50271), Some(Decimal::from(125140)), Decimal::from(40), "Higher Rate"),
///     TaxBracket::new(Decimal::from(125141), None, Decimal::from(45), "Additional Rate"),
/// ])
/// .unwrap();
///
/// assert_eq!(calculate_progressive_tax(Decimal::from(60000), &table), Decimal::from(11432));
/// ```
pub fn calculate_progressive_tax(amount: Decimal, table: &BracketTable) -> Decimal {
    evaluate_brackets(amount, table).tax
}

/// Evaluates `amount` against a table, returning the tax and the slice of
/// the amount that fell in each bracket.
pub fn evaluate_brackets(amount: Decimal, table: &BracketTable) -> BracketEvaluation {
    let mut tax = Decimal::ZERO;
    let mut slices = Vec::new();

    let Some(first) = table.brackets().first() else {
        return BracketEvaluation { tax, slices };
    };

    let mut floor = first.min;
    for bracket in table.brackets() {
        if amount <= floor {
            break;
        }

        let ceiling = match bracket.max {
            Some(max) => amount.min(max),
            None => amount,
        };
        let taxable_amount = ceiling - floor;
        let bracket_tax = percent_of(taxable_amount, bracket.rate);
        tax += bracket_tax;
        slices.push(BracketSlice {
            name: bracket.label(),
            rate: bracket.rate,
            taxable_amount,
            tax: bracket_tax,
        });

        match bracket.max {
            Some(max) => floor = max,
            None => break,
        }
    }

    BracketEvaluation { tax, slices }
}

/// Evaluates a flat or progressive schedule.
///
/// A flat schedule yields a single slice named after its rate. Negative
/// amounts produce zero tax under either kind.
pub fn evaluate_schedule(amount: Decimal, schedule: &RateSchedule) -> BracketEvaluation {
    match schedule {
        RateSchedule::Flat { rate } => {
            if amount <= Decimal::ZERO {
                return BracketEvaluation {
                    tax: Decimal::ZERO,
                    slices: Vec::new(),
                };
            }
            let tax = percent_of(amount, *rate);
            BracketEvaluation {
                tax,
                slices: vec![BracketSlice {
                    name: format!("{}% flat rate", rate.normalize()),
                    rate: *rate,
                    taxable_amount: amount,
                    tax,
                }],
            }
        }
        RateSchedule::Progressive { brackets } => evaluate_brackets(amount, brackets),
    }
}

/// The rate charged on the next unit above `amount`.
///
/// Empty tables have a marginal rate of zero.
pub fn marginal_rate(amount: Decimal, table: &BracketTable) -> Decimal {
    table
        .brackets()
        .iter()
        .find(|bracket| bracket.max.is_none_or(|max| amount < max))
        .map(|bracket| bracket.rate)
        .unwrap_or(Decimal::ZERO)
}
