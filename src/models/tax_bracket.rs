//! Tax bracket models.
//!
//! A [`BracketTable`] is the ordered list of [`TaxBracket`]s a progressive
//! tax is computed over. Tables are validated when they are built (and so
//! when rule files are deserialised): a malformed table can never reach
//! the evaluator.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// One bracket of a progressive tax table.
///
/// `rate` is a whole-number percentage (`20` means 20%). `max` is `None`
/// for the final, unbounded bracket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxBracket {
    /// Lower bound of the bracket.
    pub min: Decimal,
    /// Upper bound of the bracket, `None` if unbounded.
    #[serde(default)]
    pub max: Option<Decimal>,
    /// Percentage rate applied to the slice of the amount in this bracket.
    pub rate: Decimal,
    /// Display name, e.g. "Basic Rate".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Secondary rate some tables carry alongside the main rate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_rate: Option<Decimal>,
}

impl TaxBracket {
    /// Creates a named bracket.
    pub fn new(min: Decimal, max: Option<Decimal>, rate: Decimal, name: &str) -> Self {
        Self {
            min,
            max,
            rate,
            name: Some(name.to_string()),
            additional_rate: None,
        }
    }

    /// Returns the bracket's display label, falling back to its rate.
    pub fn label(&self) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => format!("{}% band", self.rate.normalize()),
        }
    }
}

/// A validated, ordered table of tax brackets.
///
/// Invariants checked on construction:
/// - rates lie in `0..=100` and bounds are non-negative;
/// - every bracket has positive capacity;
/// - brackets are contiguous: each `min` equals the previous `max`, or the
///   previous `max` plus one for integer-denominated tables;
/// - exactly one bracket is unbounded, and it is the last.
///
/// An empty table is valid and means the tax does not apply.
///
/// # Example
///
/// ```
/// use tax_engine::models::{BracketTable, TaxBracket};
/// use rust_decimal::Decimal;
///
/// let table = BracketTable::new(vec![
///     TaxBracket::new(Decimal::ZERO, Some(Decimal::from(1000)), Decimal::ZERO, "Allowance"),
///     TaxBracket::new(Decimal::from(1001), None, Decimal::from(20), "Rate"),
/// ])
/// .unwrap();
/// assert_eq!(table.len(), 2);
///
/// // Overlapping brackets are rejected.
/// let overlapping = BracketTable::new(vec![
///     TaxBracket::new(Decimal::ZERO, Some(Decimal::from(1000)), Decimal::ZERO, "Allowance"),
///     TaxBracket::new(Decimal::from(500), None, Decimal::from(20), "Rate"),
/// ]);
/// assert!(overlapping.is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "Vec<TaxBracket>", into = "Vec<TaxBracket>")]
pub struct BracketTable {
    brackets: Vec<TaxBracket>,
}

impl BracketTable {
    /// Builds a table, validating its structure.
    pub fn new(brackets: Vec<TaxBracket>) -> EngineResult<Self> {
        validate(&brackets)?;
        Ok(Self { brackets })
    }

    /// A table with no brackets: no tax is due on any amount.
    pub fn empty() -> Self {
        Self::default()
    }

    /// A single unbounded bracket charging `rate` from zero.
    pub fn flat(rate: Decimal) -> EngineResult<Self> {
        Self::new(vec![TaxBracket {
            min: Decimal::ZERO,
            max: None,
            rate,
            name: None,
            additional_rate: None,
        }])
    }

    /// Returns the brackets in ascending order.
    pub fn brackets(&self) -> &[TaxBracket] {
        &self.brackets
    }

    /// Returns the number of brackets.
    pub fn len(&self) -> usize {
        self.brackets.len()
    }

    /// Returns true if the table has no brackets.
    pub fn is_empty(&self) -> bool {
        self.brackets.is_empty()
    }
}

impl TryFrom<Vec<TaxBracket>> for BracketTable {
    type Error = EngineError;

    fn try_from(brackets: Vec<TaxBracket>) -> Result<Self, Self::Error> {
        Self::new(brackets)
    }
}

impl From<BracketTable> for Vec<TaxBracket> {
    fn from(table: BracketTable) -> Self {
        table.brackets
    }
}

fn invalid(message: String) -> EngineError {
    EngineError::InvalidBracketTable { message }
}

fn validate(brackets: &[TaxBracket]) -> EngineResult<()> {
    let hundred = Decimal::ONE_HUNDRED;
    let mut previous_max: Option<Decimal> = None;

    for (index, bracket) in brackets.iter().enumerate() {
        let position = index + 1;
        let is_last = position == brackets.len();

        if bracket.rate < Decimal::ZERO || bracket.rate > hundred {
            return Err(invalid(format!(
                "bracket {} has rate {} outside 0..=100",
                position, bracket.rate
            )));
        }
        if bracket
            .additional_rate
            .is_some_and(|rate| rate < Decimal::ZERO || rate > hundred)
        {
            return Err(invalid(format!(
                "bracket {} has an additional rate outside 0..=100",
                position
            )));
        }
        if bracket.min < Decimal::ZERO {
            return Err(invalid(format!("bracket {} starts below zero", position)));
        }

        let lower = match (index, previous_max) {
            (0, _) => bracket.min,
            (_, Some(prev)) => {
                if bracket.min != prev && bracket.min != prev + Decimal::ONE {
                    return Err(invalid(format!(
                        "bracket {} starts at {} but the previous bracket ends at {}",
                        position, bracket.min, prev
                    )));
                }
                prev
            }
            (_, None) => {
                return Err(invalid(format!(
                    "bracket {} follows an unbounded bracket",
                    position
                )));
            }
        };

        match bracket.max {
            Some(max) if max <= lower => {
                return Err(invalid(format!(
                    "bracket {} has no capacity ({} to {})",
                    position, bracket.min, max
                )));
            }
            Some(_) if is_last => {
                return Err(invalid("the last bracket must be unbounded".to_string()));
            }
            None if !is_last => {
                return Err(invalid(format!(
                    "bracket {} is unbounded but is not the last",
                    position
                )));
            }
            _ => {}
        }

        previous_max = bracket.max;
    }

    Ok(())
}

/// How a single tax is charged: one flat percentage, or a progressive table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RateSchedule {
    /// A single percentage of the whole amount.
    Flat {
        /// Percentage rate.
        rate: Decimal,
    },
    /// A progressive bracket table.
    Progressive {
        /// The brackets.
        brackets: BracketTable,
    },
}
