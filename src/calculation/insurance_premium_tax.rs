//! Insurance premium tax.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::TaxTables;
use crate::error::EngineResult;
use crate::models::{CalculationResult, InsuranceType, Jurisdiction, LineItem, TaxType};

use super::common::{checked_input, effective_rate, non_negative, percent_of};

/// Inputs to an insurance premium tax calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsurancePremiumInput {
    /// Where the policy is written.
    pub jurisdiction: Jurisdiction,
    /// Annual premium before tax.
    #[serde(default)]
    pub premium: Option<Decimal>,
    /// Kind of policy.
    #[serde(default)]
    pub insurance_type: InsuranceType,
}

/// The rate that applies to a policy, or why none does.
enum Treatment {
    Taxed { rate: Decimal, basis: String },
    Exempt { reason: String },
}

/// Calculates insurance premium tax.
///
/// Exempt policy types short-circuit to zero tax with the reason recorded
/// in [`CalculationResult::exemption`].
pub fn calculate_insurance_premium_tax(
    input: &InsurancePremiumInput,
    tables: &TaxTables,
) -> EngineResult<CalculationResult> {
    let region = input.jurisdiction.region();
    let Some(premium) = checked_input("premium", input.premium)? else {
        return Ok(CalculationResult::empty(TaxType::InsurancePremiumTax, region));
    };
    let premium = non_negative(premium);
    let kind = input.insurance_type;
    let ipt = &tables.insurance_premium_tax;

    let mut result = CalculationResult::new(TaxType::InsurancePremiumTax, region);

    let (rule_id, treatment) = match input.jurisdiction {
        Jurisdiction::Uk => {
            let treatment = if ipt.uk.exempt_types.contains(&kind) {
                Treatment::Exempt {
                    reason: "This type of insurance is exempt from IPT in the UK".to_string(),
                }
            } else if ipt.uk.higher_rate_types.contains(&kind) {
                Treatment::Taxed {
                    rate: ipt.uk.higher_rate,
                    basis: format!("Higher rate for {} insurance", kind),
                }
            } else {
                Treatment::Taxed {
                    rate: ipt.uk.standard_rate,
                    basis: "Standard rate".to_string(),
                }
            };
            ("uk_insurance_premium_tax", treatment)
        }
        Jurisdiction::Eu { country } => {
            let (country, rules) = ipt.eu.resolve(country, TaxType::InsurancePremiumTax)?;
            result = result.for_sub_region(country.name());
            let treatment = if rules.exempt_types.contains(&kind) {
                Treatment::Exempt {
                    reason: format!("This type of insurance is exempt from IPT in {}", country),
                }
            } else if let Some(rate) = rules.special_rates.get(&kind) {
                Treatment::Taxed {
                    rate: *rate,
                    basis: format!("Special rate for {} insurance in {}", kind, country),
                }
            } else {
                Treatment::Taxed {
                    rate: rules.standard_rate,
                    basis: format!("Standard rate in {}", country),
                }
            };
            ("eu_insurance_premium_tax", treatment)
        }
        Jurisdiction::Us { state } => {
            let (state, rules) = ipt.us.resolve(state, TaxType::InsurancePremiumTax)?;
            result = result.for_sub_region(state.name());
            let treatment = if rules.exempt_all || rules.exempt_types.contains(&kind) {
                Treatment::Exempt {
                    reason: format!(
                        "Insurance of this type is exempt from premium tax in {}",
                        state
                    ),
                }
            } else {
                Treatment::Taxed {
                    rate: rules.rate,
                    basis: format!("{} premium tax rate", state),
                }
            };
            ("us_premium_tax", treatment)
        }
    };

    result.push_line(LineItem::currency("Insurance Premium", premium));
    let tax = match treatment {
        Treatment::Exempt { reason } => {
            result.push_line(
                LineItem::currency("Insurance Premium Tax", Decimal::ZERO).describe(reason.clone()),
            );
            result.push_audit(
                rule_id,
                "Insurance Premium Tax",
                serde_json::json!({
                    "premium": premium.to_string(),
                    "insurance_type": kind,
                }),
                serde_json::json!({ "exempt": true, "tax": "0" }),
                reason.clone(),
            );
            result.exemption = Some(reason);
            Decimal::ZERO
        }
        Treatment::Taxed { rate, basis } => {
            let tax = percent_of(premium, rate);
            result.push_line(LineItem::percent("IPT Rate", rate).describe(basis.clone()));
            result.push_line(LineItem::currency("Insurance Premium Tax", tax));
            result.push_audit(
                rule_id,
                "Insurance Premium Tax",
                serde_json::json!({
                    "premium": premium.to_string(),
                    "insurance_type": kind,
                }),
                serde_json::json!({
                    "rate": rate.to_string(),
                    "tax": tax.to_string(),
                }),
                format!("{} of {}%", basis, rate.normalize()),
            );
            tax
        }
    };
    result.push_line(LineItem::currency("Total Cost", premium + tax).total());
    result.tax = tax;
    result.effective_rate = effective_rate(tax, premium);

    debug!(region = %region, insurance_type = %kind, tax = %tax, "Calculated insurance premium tax");
    Ok(result)
}
