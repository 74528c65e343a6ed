//! Configuration loading functionality.
//!
//! This module provides the [`ConfigLoader`] type for loading tax rule
//! tables from YAML files.

use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;
use tracing::info;

use crate::error::{EngineError, EngineResult};

use super::types::{TablesMetadata, TaxTables};

/// Directory of the tables compiled into the binary.
pub const BUILTIN_TABLES_DIR: &str = "config/2024-25";

/// Loads and provides access to the tax rule tables.
///
/// # Directory Structure
///
/// The configuration directory should have the following structure:
/// ```text
/// config/2024-25/
/// ├── metadata.yaml              # Tax year, effective date, source
/// ├── income_tax.yaml
/// ├── vat.yaml
/// ├── capital_gains.yaml
/// ├── inheritance_tax.yaml
/// ├── stamp_duty.yaml
/// ├── dividend_tax.yaml
/// ├── national_insurance.yaml
/// ├── vehicle_tax.yaml
/// ├── property_tax.yaml
/// ├── insurance_premium_tax.yaml
/// ├── excise_duty.yaml
/// ├── sole_trader.yaml
/// └── business_sale.yaml
/// ```
///
/// Every table is validated while loading. A malformed bracket table
/// aborts the load instead of surfacing during a calculation.
///
/// # Example
///
/// ```no_run
/// use tax_engine::config::ConfigLoader;
///
/// let loader = ConfigLoader::load("./config/2024-25")?;
/// println!("Tax year: {}", loader.metadata().tax_year);
/// # Ok::<(), tax_engine::error::EngineError>(())
/// ```
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    tables: TaxTables,
}

impl ConfigLoader {
    /// Loads rule tables from the specified directory.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration directory (e.g., "./config/2024-25")
    ///
    /// # Returns
    ///
    /// Returns a `ConfigLoader` instance on success, or an error if:
    /// - Any required file is missing
    /// - Any file contains invalid YAML
    /// - Any bracket, band or sub-region table is malformed
    pub fn load<P: AsRef<Path>>(path: P) -> EngineResult<Self> {
        let path = path.as_ref();

        let tables = TaxTables {
            metadata: Self::load_yaml(&path.join("metadata.yaml"))?,
            income_tax: Self::load_yaml(&path.join("income_tax.yaml"))?,
            vat: Self::load_yaml(&path.join("vat.yaml"))?,
            capital_gains: Self::load_yaml(&path.join("capital_gains.yaml"))?,
            inheritance_tax: Self::load_yaml(&path.join("inheritance_tax.yaml"))?,
            stamp_duty: Self::load_yaml(&path.join("stamp_duty.yaml"))?,
            dividend_tax: Self::load_yaml(&path.join("dividend_tax.yaml"))?,
            national_insurance: Self::load_yaml(&path.join("national_insurance.yaml"))?,
            vehicle_tax: Self::load_yaml(&path.join("vehicle_tax.yaml"))?,
            property_tax: Self::load_yaml(&path.join("property_tax.yaml"))?,
            insurance_premium_tax: Self::load_yaml(&path.join("insurance_premium_tax.yaml"))?,
            excise_duty: Self::load_yaml(&path.join("excise_duty.yaml"))?,
            sole_trader: Self::load_yaml(&path.join("sole_trader.yaml"))?,
            business_sale: Self::load_yaml(&path.join("business_sale.yaml"))?,
        };

        Self::from_tables(tables)
    }

    /// Loads the tables compiled into the crate from [`BUILTIN_TABLES_DIR`].
    ///
    /// # Example
    ///
    /// ```
    /// use tax_engine::config::ConfigLoader;
    ///
    /// let loader = ConfigLoader::builtin().unwrap();
    /// assert_eq!(loader.metadata().tax_year, "2024-25");
    /// ```
    pub fn builtin() -> EngineResult<Self> {
        macro_rules! builtin {
            ($file:literal) => {
                Self::parse_yaml(
                    concat!("config/2024-25/", $file),
                    include_str!(concat!("../../config/2024-25/", $file)),
                )?
            };
        }

        let tables = TaxTables {
            metadata: builtin!("metadata.yaml"),
            income_tax: builtin!("income_tax.yaml"),
            vat: builtin!("vat.yaml"),
            capital_gains: builtin!("capital_gains.yaml"),
            inheritance_tax: builtin!("inheritance_tax.yaml"),
            stamp_duty: builtin!("stamp_duty.yaml"),
            dividend_tax: builtin!("dividend_tax.yaml"),
            national_insurance: builtin!("national_insurance.yaml"),
            vehicle_tax: builtin!("vehicle_tax.yaml"),
            property_tax: builtin!("property_tax.yaml"),
            insurance_premium_tax: builtin!("insurance_premium_tax.yaml"),
            excise_duty: builtin!("excise_duty.yaml"),
            sole_trader: builtin!("sole_trader.yaml"),
            business_sale: builtin!("business_sale.yaml"),
        };

        Self::from_tables(tables)
    }

    /// Wraps an already-built table set, validating it first.
    pub fn from_tables(tables: TaxTables) -> EngineResult<Self> {
        tables.validate()?;
        info!(
            tax_year = %tables.metadata.tax_year,
            effective_from = %tables.metadata.effective_from,
            "Loaded tax tables"
        );
        Ok(Self { tables })
    }

    /// Loads and parses a YAML file.
    fn load_yaml<T: DeserializeOwned>(path: &Path) -> EngineResult<T> {
        let path_str = path.display().to_string();

        let content = fs::read_to_string(path).map_err(|_| EngineError::ConfigNotFound {
            path: path_str.clone(),
        })?;

        Self::parse_yaml(&path_str, &content)
    }

    fn parse_yaml<T: DeserializeOwned>(path: &str, content: &str) -> EngineResult<T> {
        serde_yaml::from_str(content).map_err(|e| EngineError::ConfigParseError {
            path: path.to_string(),
            message: e.to_string(),
        })
    }

    /// Returns all rule tables.
    pub fn tables(&self) -> &TaxTables {
        &self.tables
    }

    /// Returns the table set metadata.
    pub fn metadata(&self) -> &TablesMetadata {
        &self.tables.metadata
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EuCountry, UsState};
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn config_path() -> &'static str {
        "./config/2024-25"
    }

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_load_valid_configuration() {
        let result = ConfigLoader::load(config_path());
        assert!(result.is_ok(), "Failed to load config: {:?}", result.err());

        let loader = result.unwrap();
        assert_eq!(loader.metadata().tax_year, "2024-25");
    }

    #[test]
    fn test_builtin_matches_directory() {
        let builtin = ConfigLoader::builtin().unwrap();
        let loaded = ConfigLoader::load(config_path()).unwrap();
        assert_eq!(
            builtin.tables().income_tax.uk,
            loaded.tables().income_tax.uk
        );
        assert_eq!(builtin.metadata().source, loaded.metadata().source);
    }

    #[test]
    fn test_uk_income_tax_bands_loaded() {
        let loader = ConfigLoader::builtin().unwrap();
        let uk = &loader.tables().income_tax.uk;
        assert_eq!(uk.len(), 4);
        assert_eq!(uk.brackets()[0].max, Some(dec("12570")));
        assert_eq!(uk.brackets()[3].rate, dec("45"));
    }

    #[test]
    fn test_states_without_income_tax_have_empty_tables() {
        let loader = ConfigLoader::builtin().unwrap();
        let states = &loader.tables().income_tax.us.states;
        let (_, texas) = states
            .resolve(Some(UsState::Texas), crate::models::TaxType::IncomeTax)
            .unwrap();
        assert!(texas.is_empty());
    }

    #[test]
    fn test_eu_defaults_loaded() {
        let loader = ConfigLoader::builtin().unwrap();
        assert_eq!(loader.tables().income_tax.eu.default, EuCountry::Germany);
        assert_eq!(loader.tables().stamp_duty.eu.default, EuCountry::France);
    }

    #[test]
    fn test_load_missing_directory_returns_error() {
        let result = ConfigLoader::load("/nonexistent/path");
        assert!(result.is_err());

        match result {
            Err(EngineError::ConfigNotFound { path }) => {
                assert!(path.contains("metadata.yaml"));
            }
            _ => panic!("Expected ConfigNotFound error"),
        }
    }

    #[test]
    fn test_malformed_bracket_table_reports_parse_error() {
        let yaml = "uk: [{ min: 0, max: 100, rate: 0 }, { min: 500, rate: 20 }]";
        let result: EngineResult<crate::config::DividendTables> =
            ConfigLoader::parse_yaml("dividend_tax.yaml", yaml);
        match result {
            Err(EngineError::ConfigParseError { path, message }) => {
                assert_eq!(path, "dividend_tax.yaml");
                assert!(message.contains("Invalid bracket table"), "{}", message);
            }
            other => panic!("Expected ConfigParseError, got {:?}", other),
        }
    }

    #[test]
    fn test_default_without_entry_rejected_at_load() {
        let mut tables = ConfigLoader::builtin().unwrap().tables().clone();
        let default = tables.dividend_tax.eu.default;
        tables.dividend_tax.eu.entries.remove(&default);
        let result = ConfigLoader::from_tables(tables);
        assert!(matches!(
            result,
            Err(EngineError::InvalidBracketTable { .. })
        ));
    }
}
