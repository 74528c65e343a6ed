//! Request types for the tax engine API.
//!
//! `POST /calculate` takes a [`TaxRequest`] directly; this module adds the
//! body of the comparison endpoint.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::{EuCountry, FilingStatus, UsState};

pub use crate::calculation::TaxRequest as CalculationRequest;

/// Request body for `POST /compare/income-tax`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonRequest {
    /// Gross annual income, taxed in each region's own currency.
    pub income: Decimal,
    /// EU member state; the table default when omitted.
    #[serde(default)]
    pub eu_country: Option<EuCountry>,
    /// US state; the table default when omitted.
    #[serde(default)]
    pub us_state: Option<UsState>,
    /// US filing status.
    #[serde(default)]
    pub filing_status: FilingStatus,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Jurisdiction, TaxType};

    #[test]
    fn test_deserialize_calculation_request() {
        let json = r#"{
            "tax": "national_insurance",
            "jurisdiction": {"region": "us", "state": "california"},
            "income": "85000",
            "employment": "self_employed"
        }"#;

        let request: CalculationRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.tax_type(), TaxType::NationalInsurance);
        assert_eq!(
            request.jurisdiction(),
            Jurisdiction::Us {
                state: Some(UsState::California)
            }
        );
    }

    #[test]
    fn test_deserialize_comparison_request_defaults() {
        let request: ComparisonRequest = serde_json::from_str(r#"{"income": 45000}"#).unwrap();
        assert_eq!(request.income, Decimal::from(45000));
        assert!(request.eu_country.is_none());
        assert!(request.us_state.is_none());
        assert_eq!(request.filing_status, FilingStatus::Single);
    }

    #[test]
    fn test_comparison_request_requires_income() {
        let result: Result<ComparisonRequest, _> =
            serde_json::from_str(r#"{"eu_country": "france"}"#);
        assert!(result.unwrap_err().to_string().contains("missing field"));
    }
}
