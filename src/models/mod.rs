//! Domain models for the tax engine.
//!
//! This module contains the core data types: jurisdictions, bracket and
//! band tables, and calculation results.

mod band;
mod calculation_result;
mod categories;
mod jurisdiction;
mod tax_bracket;

pub use band::{Amount, Band, BandTable};
pub use calculation_result::{
    AuditStep, BracketSlice, CalculationResult, LineItem, LineUnit, TaxType,
};
pub use categories::{
    CouncilArea, ExciseProduct, FuelType, IncomeLevel, InsuranceType, PropertyType, Relationship,
};
pub use jurisdiction::{Currency, EuCountry, FilingStatus, Jurisdiction, Region, UsState};
pub use tax_bracket::{BracketTable, RateSchedule, TaxBracket};
