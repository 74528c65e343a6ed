//! Classification enums shared by rule tables and requests.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Relationship of a beneficiary to the deceased.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Relationship {
    /// Spouse or civil partner.
    Spouse,
    /// Child or other direct descendant.
    #[default]
    Child,
    /// Brother or sister.
    Sibling,
    /// Anyone else.
    Other,
}

impl fmt::Display for Relationship {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Relationship::Spouse => "spouse",
            Relationship::Child => "child",
            Relationship::Sibling => "sibling",
            Relationship::Other => "other beneficiary",
        };
        f.write_str(name)
    }
}

/// Use of a property being bought or taxed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyType {
    /// A dwelling.
    #[default]
    Residential,
    /// Commercial or mixed-use property.
    NonResidential,
}

/// Vehicle fuel type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FuelType {
    /// Petrol.
    #[default]
    Petrol,
    /// Diesel.
    Diesel,
    /// Hybrid or other alternative fuel.
    Hybrid,
    /// Battery electric.
    Electric,
}

impl fmt::Display for FuelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FuelType::Petrol => "petrol",
            FuelType::Diesel => "diesel",
            FuelType::Hybrid => "hybrid",
            FuelType::Electric => "electric",
        };
        f.write_str(name)
    }
}

/// UK council area type, which scales band charges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CouncilArea {
    /// Greater London.
    London,
    /// Metropolitan district.
    #[default]
    Metropolitan,
    /// Shire county.
    Shire,
    /// Scotland.
    Scotland,
    /// Wales.
    Wales,
    /// Northern Ireland.
    NorthernIreland,
}

impl fmt::Display for CouncilArea {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CouncilArea::London => "London",
            CouncilArea::Metropolitan => "Metropolitan",
            CouncilArea::Shire => "Shire",
            CouncilArea::Scotland => "Scotland",
            CouncilArea::Wales => "Wales",
            CouncilArea::NorthernIreland => "Northern Ireland",
        };
        f.write_str(name)
    }
}

/// Kind of insurance policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsuranceType {
    /// General insurance with no special treatment.
    #[default]
    General,
    /// Home and contents.
    Home,
    /// Motor vehicle.
    Auto,
    /// Travel.
    Travel,
    /// Health.
    Health,
    /// Life.
    Life,
    /// Fire.
    Fire,
    /// Marine.
    Marine,
    /// Liability.
    Liability,
}

impl fmt::Display for InsuranceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            InsuranceType::General => "general",
            InsuranceType::Home => "home",
            InsuranceType::Auto => "auto",
            InsuranceType::Travel => "travel",
            InsuranceType::Health => "health",
            InsuranceType::Life => "life",
            InsuranceType::Fire => "fire",
            InsuranceType::Marine => "marine",
            InsuranceType::Liability => "liability",
        };
        f.write_str(name)
    }
}

/// Product subject to excise duty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExciseProduct {
    /// Beer, quantity in litres.
    Beer,
    /// Still wine, quantity in litres.
    Wine,
    /// Spirits, quantity in litres.
    Spirits,
    /// Cigarettes, quantity in sticks.
    Cigarettes,
    /// Cigars, quantity in grams.
    Cigars,
    /// Hand-rolling tobacco, quantity in grams.
    HandRollingTobacco,
    /// Petrol, quantity in litres.
    Petrol,
    /// Diesel, quantity in litres.
    Diesel,
    /// Biodiesel, quantity in litres.
    Biodiesel,
    /// General betting, value is gross profit.
    GeneralBetting,
    /// Remote gaming, value is gross profit.
    RemoteGaming,
}

impl ExciseProduct {
    /// The duty family the product belongs to.
    pub fn category(self) -> &'static str {
        match self {
            ExciseProduct::Beer | ExciseProduct::Wine | ExciseProduct::Spirits => "alcohol",
            ExciseProduct::Cigarettes | ExciseProduct::Cigars | ExciseProduct::HandRollingTobacco => {
                "tobacco"
            }
            ExciseProduct::Petrol | ExciseProduct::Diesel | ExciseProduct::Biodiesel => "fuel",
            ExciseProduct::GeneralBetting | ExciseProduct::RemoteGaming => "gambling",
        }
    }
}

impl fmt::Display for ExciseProduct {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExciseProduct::Beer => "beer",
            ExciseProduct::Wine => "wine",
            ExciseProduct::Spirits => "spirits",
            ExciseProduct::Cigarettes => "cigarettes",
            ExciseProduct::Cigars => "cigars",
            ExciseProduct::HandRollingTobacco => "hand-rolling tobacco",
            ExciseProduct::Petrol => "petrol",
            ExciseProduct::Diesel => "diesel",
            ExciseProduct::Biodiesel => "biodiesel",
            ExciseProduct::GeneralBetting => "general betting",
            ExciseProduct::RemoteGaming => "remote gaming",
        };
        f.write_str(name)
    }
}

/// US income level, which selects the long-term capital gains rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IncomeLevel {
    /// Within the 0% long-term band.
    Low,
    /// Within the 15% long-term band.
    #[default]
    Medium,
    /// Within the 20% long-term band.
    High,
}
