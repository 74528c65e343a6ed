//! Value-band lookup tables.
//!
//! Some taxes are not sliced progressively: the whole value falls into
//! one band and the band's charge applies (council tax bands, vehicle
//! CO2 bands). [`BandTable`] holds these.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// One band of a lookup table. `T` carries the band's charge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Band<T> {
    /// Lower bound of the band.
    pub min: Decimal,
    /// Upper bound of the band, `None` for the last band.
    #[serde(default)]
    pub max: Option<Decimal>,
    /// What the band charges.
    #[serde(flatten)]
    pub value: T,
}

/// A validated lookup table of bands, ascending by `min`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Band<T>>", into = "Vec<Band<T>>")]
#[serde(bound(
    serialize = "T: Serialize + Clone",
    deserialize = "T: Deserialize<'de>"
))]
pub struct BandTable<T> {
    bands: Vec<Band<T>>,
}

impl<T> BandTable<T> {
    /// Builds a table. Bands must be non-empty, strictly ascending by
    /// `min`, and only the last band may be unbounded (it must be).
    pub fn new(bands: Vec<Band<T>>) -> EngineResult<Self> {
        if bands.is_empty() {
            return Err(EngineError::InvalidBracketTable {
                message: "band table has no bands".to_string(),
            });
        }
        for pair in bands.windows(2) {
            if pair[1].min <= pair[0].min {
                return Err(EngineError::InvalidBracketTable {
                    message: format!("band starting at {} is out of order", pair[1].min),
                });
            }
            if pair[0].max.is_none() {
                return Err(EngineError::InvalidBracketTable {
                    message: format!("band starting at {} is unbounded but not last", pair[0].min),
                });
            }
        }
        if bands.last().is_some_and(|band| band.max.is_some()) {
            return Err(EngineError::InvalidBracketTable {
                message: "the last band must be unbounded".to_string(),
            });
        }
        Ok(Self { bands })
    }

    /// Finds the band a value falls in: the last band whose `min` does not
    /// exceed the value. Values below the first band use the first band.
    pub fn lookup(&self, value: Decimal) -> &Band<T> {
        self.bands
            .iter()
            .rev()
            .find(|band| band.min <= value)
            .unwrap_or(&self.bands[0])
    }

    /// Returns the bands in ascending order.
    pub fn bands(&self) -> &[Band<T>] {
        &self.bands
    }
}

impl<T> TryFrom<Vec<Band<T>>> for BandTable<T> {
    type Error = EngineError;

    fn try_from(bands: Vec<Band<T>>) -> Result<Self, Self::Error> {
        Self::new(bands)
    }
}

impl<T> From<BandTable<T>> for Vec<Band<T>> {
    fn from(table: BandTable<T>) -> Self {
        table.bands
    }
}

/// Band charge holding a single amount.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Amount {
    /// The amount charged.
    pub amount: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn table() -> BandTable<Amount> {
        serde_yaml::from_str(
            "- { min: 0, max: 130, amount: 0 }\n\
             - { min: 131, max: 150, amount: 50 }\n\
             - { min: 151, amount: 275 }\n",
        )
        .unwrap()
    }

    #[test]
    fn test_lookup_selects_containing_band() {
        let table = table();
        assert_eq!(table.lookup(dec("0")).value.amount, dec("0"));
        assert_eq!(table.lookup(dec("130")).value.amount, dec("0"));
        assert_eq!(table.lookup(dec("131")).value.amount, dec("50"));
        assert_eq!(table.lookup(dec("9999")).value.amount, dec("275"));
    }

    #[test]
    fn test_lookup_in_gap_uses_lower_band() {
        // 130.5 lies between 130 and 131 and stays in the lower band.
        assert_eq!(table().lookup(dec("130.5")).value.amount, dec("0"));
    }

    #[test]
    fn test_empty_band_table_is_rejected() {
        let result = BandTable::<Amount>::new(vec![]);
        assert!(result.is_err());
    }

    #[test]
    fn test_unordered_bands_are_rejected() {
        let result: Result<BandTable<Amount>, _> = serde_yaml::from_str(
            "- { min: 100, max: 200, amount: 1 }\n- { min: 50, amount: 2 }\n",
        );
        assert!(result.is_err());
    }
}
