//! Jurisdiction models.
//!
//! A calculation is always performed for one [`Jurisdiction`]: the UK, an
//! EU member state, or a US state. Sub-regions are optional; when omitted
//! the rule table for the tax type supplies a default.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Top-level tax region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Region {
    /// United Kingdom.
    Uk,
    /// European Union.
    Eu,
    /// United States.
    Us,
}

impl Region {
    /// All regions, in display order.
    pub const ALL: [Region; 3] = [Region::Uk, Region::Eu, Region::Us];

    /// Returns the currency results in this region are denominated in.
    pub fn currency(self) -> Currency {
        match self {
            Region::Uk => Currency::Gbp,
            Region::Eu => Currency::Eur,
            Region::Us => Currency::Usd,
        }
    }

    /// Returns the currency symbol used when formatting amounts.
    pub fn symbol(self) -> &'static str {
        self.currency().symbol()
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Region::Uk => "UK",
            Region::Eu => "EU",
            Region::Us => "US",
        };
        f.write_str(name)
    }
}

/// ISO currency of a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    /// Pound sterling.
    Gbp,
    /// Euro.
    Eur,
    /// US dollar.
    Usd,
}

impl Currency {
    /// Returns the symbol for the currency.
    pub fn symbol(self) -> &'static str {
        match self {
            Currency::Gbp => "£",
            Currency::Eur => "€",
            Currency::Usd => "$",
        }
    }
}

/// EU member states with rule tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EuCountry {
    /// Germany.
    Germany,
    /// France.
    France,
    /// Italy.
    Italy,
    /// Spain.
    Spain,
    /// Netherlands.
    Netherlands,
    /// Belgium.
    Belgium,
    /// Sweden.
    Sweden,
}

impl EuCountry {
    /// Returns the country's display name.
    pub fn name(self) -> &'static str {
        match self {
            EuCountry::Germany => "Germany",
            EuCountry::France => "France",
            EuCountry::Italy => "Italy",
            EuCountry::Spain => "Spain",
            EuCountry::Netherlands => "Netherlands",
            EuCountry::Belgium => "Belgium",
            EuCountry::Sweden => "Sweden",
        }
    }
}

impl fmt::Display for EuCountry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// US states with rule tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UsState {
    /// California.
    California,
    /// New York.
    NewYork,
    /// Texas.
    Texas,
    /// Florida.
    Florida,
    /// Washington.
    Washington,
    /// Colorado.
    Colorado,
    /// Illinois.
    Illinois,
    /// New Jersey.
    NewJersey,
    /// Hawaii.
    Hawaii,
    /// Alabama.
    Alabama,
    /// Louisiana.
    Louisiana,
    /// Massachusetts.
    Massachusetts,
    /// Oregon.
    Oregon,
    /// Wyoming.
    Wyoming,
    /// Nevada.
    Nevada,
}

impl UsState {
    /// Returns the state's display name.
    pub fn name(self) -> &'static str {
        match self {
            UsState::California => "California",
            UsState::NewYork => "New York",
            UsState::Texas => "Texas",
            UsState::Florida => "Florida",
            UsState::Washington => "Washington",
            UsState::Colorado => "Colorado",
            UsState::Illinois => "Illinois",
            UsState::NewJersey => "New Jersey",
            UsState::Hawaii => "Hawaii",
            UsState::Alabama => "Alabama",
            UsState::Louisiana => "Louisiana",
            UsState::Massachusetts => "Massachusetts",
            UsState::Oregon => "Oregon",
            UsState::Wyoming => "Wyoming",
            UsState::Nevada => "Nevada",
        }
    }
}

impl fmt::Display for UsState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The jurisdiction a calculation is performed for.
///
/// # Example
///
/// ```
/// use tax_engine::models::{EuCountry, Jurisdiction, Region};
///
/// let jurisdiction: Jurisdiction =
///     serde_json::from_str(r#"{"region": "eu", "country": "germany"}"#).unwrap();
/// assert_eq!(jurisdiction.region(), Region::Eu);
/// assert_eq!(
///     jurisdiction,
///     Jurisdiction::Eu { country: Some(EuCountry::Germany) }
/// );
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "region", rename_all = "snake_case")]
pub enum Jurisdiction {
    /// United Kingdom.
    #[default]
    Uk,
    /// An EU member state. `None` uses the table's default country.
    Eu {
        /// The member state.
        #[serde(default)]
        country: Option<EuCountry>,
    },
    /// A US state. `None` uses the table's default state.
    Us {
        /// The state.
        #[serde(default)]
        state: Option<UsState>,
    },
}

impl Jurisdiction {
    /// Returns the top-level region.
    pub fn region(&self) -> Region {
        match self {
            Jurisdiction::Uk => Region::Uk,
            Jurisdiction::Eu { .. } => Region::Eu,
            Jurisdiction::Us { .. } => Region::Us,
        }
    }
}

/// US federal filing status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilingStatus {
    /// Single filer.
    #[default]
    Single,
    /// Married filing jointly.
    MarriedJoint,
    /// Head of household.
    HeadOfHousehold,
    /// Married filing separately.
    MarriedSeparate,
}

impl fmt::Display for FilingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FilingStatus::Single => "Single",
            FilingStatus::MarriedJoint => "Married Filing Jointly",
            FilingStatus::HeadOfHousehold => "Head of Household",
            FilingStatus::MarriedSeparate => "Married Filing Separately",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_currency_symbols() {
        assert_eq!(Region::Uk.symbol(), "£");
        assert_eq!(Region::Eu.symbol(), "€");
        assert_eq!(Region::Us.symbol(), "$");
        assert_eq!(Region::Us.currency(), Currency::Usd);
    }

    #[test]
    fn test_jurisdiction_deserializes_without_sub_region() {
        let jurisdiction: Jurisdiction = serde_json::from_str(r#"{"region": "us"}"#).unwrap();
        assert_eq!(jurisdiction, Jurisdiction::Us { state: None });
    }

    #[test]
    fn test_jurisdiction_rejects_unknown_state() {
        let result: Result<Jurisdiction, _> =
            serde_json::from_str(r#"{"region": "us", "state": "atlantis"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_multi_word_state_uses_snake_case() {
        let state: UsState = serde_json::from_str(r#""new_york""#).unwrap();
        assert_eq!(state, UsState::NewYork);
        assert_eq!(state.to_string(), "New York");
    }

    #[test]
    fn test_filing_status_defaults_to_single() {
        assert_eq!(FilingStatus::default(), FilingStatus::Single);
    }
}
