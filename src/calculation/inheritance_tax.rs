//! Inheritance and estate tax.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::{RelationshipAmounts, TaxTables};
use crate::error::EngineResult;
use crate::models::{CalculationResult, Jurisdiction, LineItem, Relationship, TaxType};

use super::common::{checked_amount, checked_input, effective_rate, non_negative, percent_of};
use super::progressive::evaluate_brackets;

/// Inputs to an inheritance tax calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InheritanceInput {
    /// Where the estate is taxed.
    pub jurisdiction: Jurisdiction,
    /// Total value of the estate.
    #[serde(default)]
    pub estate_value: Option<Decimal>,
    /// Who inherits.
    #[serde(default)]
    pub relationship: Relationship,
    /// UK: the estate includes a main residence.
    #[serde(default)]
    pub main_residence: bool,
    /// UK: value of the main residence.
    #[serde(default)]
    pub main_residence_value: Decimal,
}

/// Calculates inheritance tax (UK, EU) or federal estate tax (US).
///
/// # UK rules
///
/// - Transfers to a spouse are exempt: the result is zero tax with an
///   exemption reason, whatever the estate value.
/// - The nil-rate band is always available.
/// - The residence nil-rate band applies when a main residence passes to
///   a child. It is capped at the residence value and tapered by £1 for
///   every £2 the estate exceeds the taper threshold.
/// - The remainder is taxed at a single rate.
pub fn calculate_inheritance_tax(
    input: &InheritanceInput,
    tables: &TaxTables,
) -> EngineResult<CalculationResult> {
    let region = input.jurisdiction.region();
    let Some(estate) = checked_input("estate_value", input.estate_value)? else {
        return Ok(CalculationResult::empty(TaxType::InheritanceTax, region));
    };
    let estate = non_negative(estate);
    let residence_value = non_negative(checked_amount("main_residence_value", input.main_residence_value)?);

    let mut result = CalculationResult::new(TaxType::InheritanceTax, region);
    result.push_line(LineItem::currency("Total Estate Value", estate));

    match input.jurisdiction {
        Jurisdiction::Uk => {
            let uk = &tables.inheritance_tax.uk;

            if input.relationship == Relationship::Spouse {
                result.push_line(
                    LineItem::currency("Spousal Exemption", estate)
                        .describe("Transfers between spouses are exempt from inheritance tax"),
                );
                result.push_line(LineItem::currency("Taxable Estate", Decimal::ZERO));
                result.push_line(LineItem::currency("Inheritance Tax", Decimal::ZERO).total());
                result.exemption =
                    Some("Transfers between spouses are exempt from inheritance tax".to_string());
                result.push_audit(
                    "uk_spouse_exemption",
                    "UK Spouse Exemption",
                    serde_json::json!({ "estate_value": estate.to_string() }),
                    serde_json::json!({ "tax": "0" }),
                    "Estate passes to a spouse: fully exempt",
                );
                debug!(estate = %estate, "UK spouse exemption applied");
                return Ok(result);
            }

            let residence_band = if input.main_residence
                && input.relationship == Relationship::Child
                && residence_value > Decimal::ZERO
            {
                let taper = non_negative(estate - uk.residence_taper_threshold) / Decimal::TWO;
                non_negative(uk.residence_nil_rate_band - taper).min(residence_value)
            } else {
                Decimal::ZERO
            };

            let allowance = uk.nil_rate_band + residence_band;
            let taxable = non_negative(estate - allowance);
            let tax = percent_of(taxable, uk.rate);

            result.push_line(LineItem::currency("Nil Rate Band", uk.nil_rate_band));
            if residence_band > Decimal::ZERO {
                result.push_line(
                    LineItem::currency("Residence Nil Rate Band", residence_band).describe(
                        "Additional allowance for main residence passed to direct descendants",
                    ),
                );
            }
            result.push_line(LineItem::currency("Taxable Estate", taxable));
            result.push_line(
                LineItem::percent("Tax Rate", uk.rate)
                    .describe(format!("{}% on value above allowances", uk.rate.normalize())),
            );
            result.push_line(LineItem::currency("Inheritance Tax", tax).total());
            result.push_audit(
                "uk_inheritance_tax",
                "UK Inheritance Tax",
                serde_json::json!({
                    "estate_value": estate.to_string(),
                    "relationship": input.relationship,
                    "main_residence": input.main_residence,
                    "main_residence_value": residence_value.to_string(),
                }),
                serde_json::json!({
                    "nil_rate_band": uk.nil_rate_band.to_string(),
                    "residence_nil_rate_band": residence_band.to_string(),
                    "taxable_estate": taxable.to_string(),
                    "tax": tax.to_string(),
                }),
                format!("Allowances of {} deducted, {} taxed at {}%", allowance, taxable, uk.rate),
            );
            result.tax = tax;
        }
        Jurisdiction::Eu { country } => {
            let (country, rules) = tables.inheritance_tax.eu.resolve(country, TaxType::InheritanceTax)?;
            let exemption = relationship_amount(&rules.exemptions, input.relationship);
            let taxable = non_negative(estate - exemption);
            let evaluation = evaluate_brackets(taxable, &rules.brackets);

            result = result.for_sub_region(country.name());
            result.push_line(
                LineItem::currency("Personal Exemption", exemption)
                    .describe(format!("Exemption for {}", input.relationship)),
            );
            result.push_line(LineItem::currency("Taxable Estate", taxable));
            result.push_line(LineItem::currency("Inheritance Tax", evaluation.tax).total());
            result.push_audit(
                "eu_inheritance_tax",
                &format!("{} Inheritance Tax", country),
                serde_json::json!({
                    "estate_value": estate.to_string(),
                    "relationship": input.relationship,
                }),
                serde_json::json!({
                    "exemption": exemption.to_string(),
                    "tax": evaluation.tax.to_string(),
                }),
                format!(
                    "{} exemption of {} deducted, {} brackets applied",
                    input.relationship, exemption, country
                ),
            );
            result.tax = evaluation.tax;
            result.brackets = evaluation.slices;
        }
        Jurisdiction::Us { state } => {
            let us = &tables.inheritance_tax.us;
            let taxable = non_negative(estate - us.exemption);
            let evaluation = evaluate_brackets(taxable, &us.brackets);

            let state = match state {
                Some(state) => state,
                None => {
                    warn!(tax = %TaxType::InheritanceTax, default = %us.default_state, "No sub-region given, using default");
                    us.default_state
                }
            };
            result = result.for_sub_region(state.name());

            result.push_line(
                LineItem::currency("Federal Exemption", us.exemption)
                    .describe("Federal estate tax exemption"),
            );
            result.push_line(LineItem::currency("Taxable Estate", taxable));
            result.push_line(LineItem::currency("Federal Estate Tax", evaluation.tax).total());
            if let Some(note) = us.state_notes.get(&state) {
                result.push_note(note.clone());
            }
            result.push_audit(
                "us_estate_tax",
                "US Federal Estate Tax",
                serde_json::json!({ "estate_value": estate.to_string() }),
                serde_json::json!({
                    "taxable_estate": taxable.to_string(),
                    "tax": evaluation.tax.to_string(),
                }),
                format!("Exemption of {} deducted, estate brackets applied", us.exemption),
            );
            result.tax = evaluation.tax;
            result.brackets = evaluation.slices;
        }
    }

    result.effective_rate = effective_rate(result.tax, estate);
    debug!(region = %region, estate = %estate, tax = %result.tax, "Calculated inheritance tax");
    Ok(result)
}

fn relationship_amount(amounts: &RelationshipAmounts, relationship: Relationship) -> Decimal {
    match relationship {
        Relationship::Spouse => amounts.spouse,
        Relationship::Child => amounts.child,
        Relationship::Sibling => amounts.sibling,
        Relationship::Other => amounts.other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigLoader;
    use crate::models::{EuCountry, UsState};
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn tables() -> TaxTables {
        ConfigLoader::builtin().unwrap().tables().clone()
    }

    fn input(jurisdiction: Jurisdiction, estate: &str, relationship: Relationship) -> InheritanceInput {
        InheritanceInput {
            jurisdiction,
            estate_value: Some(dec(estate)),
            relationship,
            main_residence: false,
            main_residence_value: Decimal::ZERO,
        }
    }

    #[test]
    fn test_uk_spouse_is_exempt_whatever_the_value() {
        for estate in ["0", "800000", "50000000"] {
            let result = calculate_inheritance_tax(
                &input(Jurisdiction::Uk, estate, Relationship::Spouse),
                &tables(),
            )
            .unwrap();
            assert_eq!(result.tax, Decimal::ZERO);
            assert!(result.exemption.is_some());
        }
    }

    #[test]
    fn test_uk_nil_rate_band_only() {
        let result = calculate_inheritance_tax(
            &input(Jurisdiction::Uk, "800000", Relationship::Sibling),
            &tables(),
        )
        .unwrap();
        assert_eq!(result.tax, dec("190000"));
        assert!(result.line("Residence Nil Rate Band").is_none());
    }

    #[test]
    fn test_uk_residence_band_for_child() {
        let mut request = input(Jurisdiction::Uk, "800000", Relationship::Child);
        request.main_residence = true;
        request.main_residence_value = dec("400000");
        let result = calculate_inheritance_tax(&request, &tables()).unwrap();

        assert_eq!(result.line("Residence Nil Rate Band").unwrap().value, dec("175000"));
        // (800000 - 500000) * 40%
        assert_eq!(result.tax, dec("120000"));
    }

    #[test]
    fn test_uk_residence_band_capped_at_residence_value() {
        let mut request = input(Jurisdiction::Uk, "800000", Relationship::Child);
        request.main_residence = true;
        request.main_residence_value = dec("100000");
        let result = calculate_inheritance_tax(&request, &tables()).unwrap();
        assert_eq!(result.line("Residence Nil Rate Band").unwrap().value, dec("100000"));
    }

    #[test]
    fn test_uk_residence_band_tapers_above_threshold() {
        let mut request = input(Jurisdiction::Uk, "2100000", Relationship::Child);
        request.main_residence = true;
        request.main_residence_value = dec("1000000");
        let result = calculate_inheritance_tax(&request, &tables()).unwrap();
        assert_eq!(result.line("Residence Nil Rate Band").unwrap().value, dec("125000"));

        request.estate_value = Some(dec("2400000"));
        let result = calculate_inheritance_tax(&request, &tables()).unwrap();
        assert!(result.line("Residence Nil Rate Band").is_none());
    }

    #[test]
    fn test_eu_exemption_by_relationship() {
        let result = calculate_inheritance_tax(
            &input(Jurisdiction::Eu { country: Some(EuCountry::Italy) }, "1500000", Relationship::Child),
            &tables(),
        )
        .unwrap();
        assert_eq!(result.line("Personal Exemption").unwrap().value, dec("1000000"));
        assert_eq!(result.tax, dec("20000"));
    }

    #[test]
    fn test_us_estate_below_exemption() {
        let result = calculate_inheritance_tax(
            &input(Jurisdiction::Us { state: Some(UsState::NewYork) }, "5000000", Relationship::Child),
            &tables(),
        )
        .unwrap();
        assert_eq!(result.tax, Decimal::ZERO);
        assert_eq!(result.notes.len(), 1);
    }

    #[test]
    fn test_us_estate_above_exemption() {
        let result = calculate_inheritance_tax(
            &input(Jurisdiction::Us { state: Some(UsState::Texas) }, "13620000", Relationship::Child),
            &tables(),
        )
        .unwrap();
        assert_eq!(result.tax, dec("1800"));
        assert!(result.notes.is_empty());
    }
}
