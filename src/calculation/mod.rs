//! Calculation logic for the tax engine.
//!
//! The `progressive` module holds the shared bracket evaluator. Every other module is
//! an adapter for one tax type: it resolves the jurisdiction's rule table,
//! applies whatever pre and post adjustments the rules need, and returns a
//! [`CalculationResult`]. [`calculate`] dispatches a [`TaxRequest`] to the
//! right adapter.

mod business_sale;
mod capital_gains;
mod common;
mod comparison;
mod dividend_tax;
mod excise_duty;
mod income_tax;
mod inheritance_tax;
mod insurance_premium_tax;
mod national_insurance;
mod progressive;
mod property_tax;
mod sole_trader;
mod stamp_duty;
mod vat;
mod vehicle_tax;

use serde::{Deserialize, Serialize};

use crate::config::TaxTables;
use crate::error::EngineResult;
use crate::models::{CalculationResult, Jurisdiction, TaxType};

pub use business_sale::{BusinessSaleInput, calculate_business_sale_tax};
pub use capital_gains::{CapitalGainsInput, calculate_capital_gains};
pub use common::{effective_rate, percent_of, round_half_up};
pub use comparison::{ComparisonEntry, IncomeTaxComparison, compare_income_tax};
pub use dividend_tax::{DividendInput, calculate_dividend_tax};
pub use excise_duty::{ExciseInput, calculate_excise_duty};
pub use income_tax::{IncomeTaxInput, calculate_income_tax};
pub use inheritance_tax::{InheritanceInput, calculate_inheritance_tax};
pub use insurance_premium_tax::{InsurancePremiumInput, calculate_insurance_premium_tax};
pub use national_insurance::{EmploymentType, NationalInsuranceInput, calculate_national_insurance};
pub use progressive::{
    BracketEvaluation, calculate_progressive_tax, evaluate_brackets, evaluate_schedule,
    marginal_rate,
};
pub use property_tax::{PropertyTaxInput, calculate_property_tax};
pub use sole_trader::{SoleTraderInput, calculate_sole_trader_tax};
pub use stamp_duty::{StampDutyInput, calculate_stamp_duty};
pub use vat::{VatInput, VatRateKind, calculate_vat};
pub use vehicle_tax::{VehicleTaxInput, calculate_vehicle_tax};

/// A calculation request for any supported tax.
///
/// The `tax` field selects the adapter; the remaining fields are that
/// adapter's input.
///
/// # Example
///
/// ```
/// use rust_decimal::Decimal;
/// use tax_engine::calculation::{TaxRequest, calculate};
/// use tax_engine::config::ConfigLoader;
///
/// let request: TaxRequest = serde_json::from_str(
///     r#"{"tax": "vat", "jurisdiction": {"region": "uk"}, "price": "100"}"#,
/// )
/// .unwrap();
/// let loader = ConfigLoader::builtin().unwrap();
/// let result = calculate(&request, loader.tables()).unwrap();
/// assert_eq!(result.tax, Decimal::from(20));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "tax", rename_all = "snake_case")]
pub enum TaxRequest {
    /// Income tax.
    IncomeTax(IncomeTaxInput),
    /// VAT or sales tax.
    Vat(VatInput),
    /// Capital gains tax.
    CapitalGains(CapitalGainsInput),
    /// Inheritance or estate tax.
    InheritanceTax(InheritanceInput),
    /// Stamp duty.
    StampDuty(StampDutyInput),
    /// Dividend tax.
    DividendTax(DividendInput),
    /// National insurance or social security.
    NationalInsurance(NationalInsuranceInput),
    /// Vehicle tax.
    VehicleTax(VehicleTaxInput),
    /// Council or property tax.
    PropertyTax(PropertyTaxInput),
    /// Insurance premium tax.
    InsurancePremiumTax(InsurancePremiumInput),
    /// Excise duty.
    ExciseDuty(ExciseInput),
    /// Sole trader tax.
    SoleTrader(SoleTraderInput),
    /// Tax on the sale of a business.
    BusinessSale(BusinessSaleInput),
}

impl TaxRequest {
    /// The tax this request calculates.
    pub fn tax_type(&self) -> TaxType {
        match self {
            TaxRequest::IncomeTax(_) => TaxType::IncomeTax,
            TaxRequest::Vat(_) => TaxType::Vat,
            TaxRequest::CapitalGains(_) => TaxType::CapitalGains,
            TaxRequest::InheritanceTax(_) => TaxType::InheritanceTax,
            TaxRequest::StampDuty(_) => TaxType::StampDuty,
            TaxRequest::DividendTax(_) => TaxType::DividendTax,
            TaxRequest::NationalInsurance(_) => TaxType::NationalInsurance,
            TaxRequest::VehicleTax(_) => TaxType::VehicleTax,
            TaxRequest::PropertyTax(_) => TaxType::PropertyTax,
            TaxRequest::InsurancePremiumTax(_) => TaxType::InsurancePremiumTax,
            TaxRequest::ExciseDuty(_) => TaxType::ExciseDuty,
            TaxRequest::SoleTrader(_) => TaxType::SoleTrader,
            TaxRequest::BusinessSale(_) => TaxType::BusinessSale,
        }
    }

    /// The jurisdiction whose rules apply.
    pub fn jurisdiction(&self) -> Jurisdiction {
        match self {
            TaxRequest::IncomeTax(input) => input.jurisdiction,
            TaxRequest::Vat(input) => input.jurisdiction,
            TaxRequest::CapitalGains(input) => input.jurisdiction,
            TaxRequest::InheritanceTax(input) => input.jurisdiction,
            TaxRequest::StampDuty(input) => input.jurisdiction,
            TaxRequest::DividendTax(input) => input.jurisdiction,
            TaxRequest::NationalInsurance(input) => input.jurisdiction,
            TaxRequest::VehicleTax(input) => input.jurisdiction,
            TaxRequest::PropertyTax(input) => input.jurisdiction,
            TaxRequest::InsurancePremiumTax(input) => input.jurisdiction,
            TaxRequest::ExciseDuty(input) => input.jurisdiction,
            TaxRequest::SoleTrader(input) => input.jurisdiction,
            TaxRequest::BusinessSale(input) => input.jurisdiction,
        }
    }
}

/// Runs the adapter selected by `request` against `tables`.
pub fn calculate(request: &TaxRequest, tables: &TaxTables) -> EngineResult<CalculationResult> {
    match request {
        TaxRequest::IncomeTax(input) => calculate_income_tax(input, tables),
        TaxRequest::Vat(input) => calculate_vat(input, tables),
        TaxRequest::CapitalGains(input) => calculate_capital_gains(input, tables),
        TaxRequest::InheritanceTax(input) => calculate_inheritance_tax(input, tables),
        TaxRequest::StampDuty(input) => calculate_stamp_duty(input, tables),
        TaxRequest::DividendTax(input) => calculate_dividend_tax(input, tables),
        TaxRequest::NationalInsurance(input) => calculate_national_insurance(input, tables),
        TaxRequest::VehicleTax(input) => calculate_vehicle_tax(input, tables),
        TaxRequest::PropertyTax(input) => calculate_property_tax(input, tables),
        TaxRequest::InsurancePremiumTax(input) => calculate_insurance_premium_tax(input, tables),
        TaxRequest::ExciseDuty(input) => calculate_excise_duty(input, tables),
        TaxRequest::SoleTrader(input) => calculate_sole_trader_tax(input, tables),
        TaxRequest::BusinessSale(input) => calculate_business_sale_tax(input, tables),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigLoader;
    use crate::models::{EuCountry, Region};
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn tables() -> TaxTables {
        ConfigLoader::builtin().unwrap().tables().clone()
    }

    #[test]
    fn test_deserialize_income_tax_request() {
        let request: TaxRequest = serde_json::from_str(
            r#"{
                "tax": "income_tax",
                "jurisdiction": {"region": "eu", "country": "germany"},
                "income": "50000"
            }"#,
        )
        .unwrap();

        assert_eq!(request.tax_type(), TaxType::IncomeTax);
        assert_eq!(
            request.jurisdiction(),
            Jurisdiction::Eu {
                country: Some(EuCountry::Germany)
            }
        );
    }

    #[test]
    fn test_unknown_tax_is_rejected() {
        let result: Result<TaxRequest, _> =
            serde_json::from_str(r#"{"tax": "window_tax", "jurisdiction": {"region": "uk"}}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_jurisdiction_is_rejected() {
        let result: Result<TaxRequest, _> =
            serde_json::from_str(r#"{"tax": "income_tax", "income": "50000"}"#);
        let message = result.unwrap_err().to_string();
        assert!(message.contains("missing field"));
    }

    #[test]
    fn test_dispatch_matches_direct_call() {
        let tables = tables();
        let input = IncomeTaxInput {
            jurisdiction: Jurisdiction::Uk,
            income: Some(dec("50000")),
            filing_status: Default::default(),
        };

        let dispatched = calculate(&TaxRequest::IncomeTax(input.clone()), &tables).unwrap();
        let direct = calculate_income_tax(&input, &tables).unwrap();
        assert_eq!(dispatched, direct);
        assert_eq!(dispatched.tax, dec("7486"));
    }

    #[test]
    fn test_result_tax_type_matches_request() {
        let tables = tables();
        let request: TaxRequest = serde_json::from_str(
            r#"{"tax": "stamp_duty", "jurisdiction": {"region": "uk"}, "property_value": "300000"}"#,
        )
        .unwrap();

        let result = calculate(&request, &tables).unwrap();
        assert_eq!(result.tax_type, request.tax_type());
        assert_eq!(result.region, Region::Uk);
    }
}
