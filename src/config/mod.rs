//! Configuration loading for the tax engine.
//!
//! Rule tables (brackets, rates, thresholds and exemptions) live in YAML
//! files, one per tax type, and are loaded into typed structs. Nothing
//! about the rules is hard-coded in the calculation modules.
//!
//! # Example
//!
//! ```
//! use tax_engine::config::ConfigLoader;
//!
//! let loader = ConfigLoader::builtin().unwrap();
//! println!("Loaded tables for {}", loader.metadata().tax_year);
//! ```

mod loader;
mod types;

pub use loader::{BUILTIN_TABLES_DIR, ConfigLoader};
pub use types::{
    BusinessSaleTables, CapitalGainsTables, Contribution, CouncilBand, DividendTables, DutyBasis,
    EuBusinessSale, EuCapitalGains, EuInheritance, EuInsurancePremium, EuPropertyRule,
    EuPropertyTax, EuRelief, EuSoleTrader, EuVatRates, EuVehicleRule, ExciseTables,
    FilingStatusTables, IncomeLevelRates, IncomeTaxTables, InheritanceTables,
    InsurancePremiumTables, NationalInsuranceTables, PropertyTaxTables, PropertyTransferRates,
    RelationshipAmounts, SalesTaxRates, SoleTraderTables, StampDutyTables, SubRegionTable,
    TablesMetadata, TaxTables, UkBusinessSale, UkCapitalGains, UkCouncilTax, UkInheritance,
    UkInsurancePremium, UkNationalInsurance, UkSoleTrader, UkStampDuty, UkVatRates,
    UkVehicleTax, UsBusinessSale, UsCapitalGains, UsEstateTax, UsFica, UsIncomeTaxTables,
    UsInsurancePremium, UsSelfEmployment, UsVehicleRates, VatTables, VedRates,
    VehicleTaxTables,
};
