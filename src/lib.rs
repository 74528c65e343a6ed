//! Tax calculation engine for UK, EU and US tax rules.
//!
//! The core is a progressive bracket evaluator plus one adapter per tax
//! type (income tax, VAT, capital gains, inheritance, stamp duty,
//! dividends, national insurance, vehicle, property, insurance premium,
//! excise, sole trader and business sale). Rule tables are loaded from
//! YAML, every calculation is a pure function of its input and the
//! tables, and results carry line items plus an audit trace.
//!
//! # Example
//!
//! ```
//! use rust_decimal::Decimal;
//! use tax_engine::calculation::{IncomeTaxInput, calculate_income_tax};
//! use tax_engine::config::ConfigLoader;
//! use tax_engine::models::Jurisdiction;
//!
//! let loader = ConfigLoader::builtin().unwrap();
//! let input = IncomeTaxInput {
//!     jurisdiction: Jurisdiction::Uk,
//!     income: Some(Decimal::from(50000)),
//!     filing_status: Default::default(),
//! };
//! let result = calculate_income_tax(&input, loader.tables()).unwrap();
//! assert_eq!(result.tax, Decimal::from(7486));
//! ```

#![warn(missing_docs)]

pub mod api;
pub mod calculation;
pub mod config;
pub mod error;
pub mod format;
pub mod models;
