//! Council tax (UK) and annual property tax (EU, US).

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{CouncilBand, EuPropertyRule, TaxTables};
use crate::error::{EngineError, EngineResult};
use crate::format::format_currency;
use crate::models::{Band, CalculationResult, CouncilArea, Jurisdiction, LineItem, Region, TaxType};

use super::common::{checked_input, checked_percentage, effective_rate, non_negative, percent_of};

/// Inputs to a council or property tax calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyTaxInput {
    /// Where the property is.
    pub jurisdiction: Jurisdiction,
    /// Assessed value of the property.
    #[serde(default)]
    pub property_value: Option<Decimal>,
    /// UK: council tax band letter, overriding the band found from the value.
    #[serde(default)]
    pub band: Option<String>,
    /// UK: council area type.
    #[serde(default)]
    pub area: Option<CouncilArea>,
    /// Percentage discount or exemption, e.g. 25 for single occupancy.
    #[serde(default)]
    pub discount: Decimal,
    /// EU: the property is the owner's primary residence.
    #[serde(default)]
    pub primary_residence: bool,
}

/// Calculates annual council or property tax.
pub fn calculate_property_tax(
    input: &PropertyTaxInput,
    tables: &TaxTables,
) -> EngineResult<CalculationResult> {
    let region = input.jurisdiction.region();
    let value = checked_input("property_value", input.property_value)?.map(non_negative);
    let discount = checked_percentage("discount", input.discount)?;

    let mut result = CalculationResult::new(TaxType::PropertyTax, region);

    match input.jurisdiction {
        Jurisdiction::Uk => {
            let uk = &tables.property_tax.uk;
            let band = match (&input.band, value) {
                (Some(letter), _) => find_band(uk.bands.bands(), letter)?,
                (None, Some(value)) => uk.bands.lookup(value),
                (None, None) => return Ok(CalculationResult::empty(TaxType::PropertyTax, region)),
            };
            let (area, multiplier) = uk.areas.resolve(input.area, TaxType::PropertyTax)?;
            let base = band.value.annual_charge;
            let adjusted = base * multiplier;
            let discount_amount = percent_of(adjusted, discount);

            result = result.for_sub_region(area.to_string());
            result.push_line(
                LineItem::currency(format!("Band {} Base Rate", band.value.band), base)
                    .describe(band_range(band)),
            );
            if *multiplier != Decimal::ONE {
                result.push_line(
                    LineItem::currency(format!("{} Area Adjustment", area), adjusted - base)
                        .describe(format!("{} multiplier: {}", area, multiplier.normalize())),
                );
            }
            if discount > Decimal::ZERO {
                result.push_line(
                    LineItem::currency("Discount", -discount_amount)
                        .describe(format!("{}% discount applied", discount.normalize())),
                );
            }
            result.tax = adjusted - discount_amount;
            result.push_line(LineItem::currency("Annual Council Tax", result.tax).total());
            result.push_audit(
                "uk_council_tax",
                "UK Council Tax",
                serde_json::json!({
                    "property_value": value.map(|v| v.to_string()),
                    "band": band.value.band,
                    "area": area,
                    "discount": discount.to_string(),
                }),
                serde_json::json!({ "tax": result.tax.to_string() }),
                format!(
                    "Band {} charge of {} scaled by the {} multiplier of {}",
                    band.value.band, base, area, multiplier
                ),
            );
        }
        Jurisdiction::Us { state } => {
            let Some(value) = value else {
                return Ok(CalculationResult::empty(TaxType::PropertyTax, region));
            };
            let (state, rate) = tables.property_tax.us.resolve(state, TaxType::PropertyTax)?;
            let gross = percent_of(value, *rate);
            let discount_amount = percent_of(gross, discount);

            result = result.for_sub_region(state.name());
            result.push_line(
                LineItem::currency("Property Value", value).describe("Assessed value of property"),
            );
            result.push_line(
                LineItem::percent("Tax Rate", *rate)
                    .describe(format!("{} property tax rate: {}%", state, rate.normalize())),
            );
            if discount > Decimal::ZERO {
                result.push_line(LineItem::currency("Exemptions/Discounts", -discount_amount).describe(
                    format!("{}% homestead exemption or other discounts", discount.normalize()),
                ));
            }
            result.tax = gross - discount_amount;
            result.push_line(LineItem::currency("Annual Property Tax", result.tax).total());
            result.push_audit(
                "us_property_tax",
                &format!("{} Property Tax", state),
                serde_json::json!({
                    "property_value": value.to_string(),
                    "discount": discount.to_string(),
                }),
                serde_json::json!({ "tax": result.tax.to_string() }),
                format!("{}% of assessed value", rate.normalize()),
            );
        }
        Jurisdiction::Eu { country } => {
            let Some(value) = value else {
                return Ok(CalculationResult::empty(TaxType::PropertyTax, region));
            };
            let eu = &tables.property_tax.eu;
            let (country, rule) = eu.countries.resolve(country, TaxType::PropertyTax)?;
            result = result.for_sub_region(country.name());
            result.push_line(
                LineItem::currency("Property Value", value).describe("Assessed value of property"),
            );

            let mut tax = match rule {
                EuPropertyRule::Percentage { rate } => {
                    result.push_line(
                        LineItem::percent("Tax Rate", *rate)
                            .describe(format!("{} property tax rate: {}%", country, rate.normalize())),
                    );
                    percent_of(value, *rate)
                }
                EuPropertyRule::ValueBands { bands } => {
                    let amount = bands.lookup(value).value.amount;
                    result.push_line(LineItem::currency("Base Rate", amount).describe(format!(
                        "Based on property value: {}",
                        format_currency(value, Region::Eu)
                    )));
                    amount
                }
                EuPropertyRule::Fixed {
                    amount,
                    description,
                } => {
                    let mut line = LineItem::currency("Fixed Rate", *amount);
                    if let Some(description) = description {
                        line = line.describe(description.clone());
                    }
                    result.push_line(line);
                    *amount
                }
            };

            if input.primary_residence {
                let relief = percent_of(tax, eu.primary_residence_discount);
                result.push_line(
                    LineItem::currency("Primary Residence Discount", -relief).describe(format!(
                        "{}% discount for a primary residence",
                        eu.primary_residence_discount.normalize()
                    )),
                );
                tax -= relief;
            }
            if discount > Decimal::ZERO {
                let discount_amount = percent_of(tax, discount);
                result.push_line(
                    LineItem::currency("Discount", -discount_amount)
                        .describe(format!("{}% discount applied", discount.normalize())),
                );
                tax -= discount_amount;
            }
            result.tax = tax;
            result.push_line(LineItem::currency("Annual Property Tax", tax).total());
            result.push_audit(
                "eu_property_tax",
                &format!("{} Property Tax", country),
                serde_json::json!({
                    "property_value": value.to_string(),
                    "primary_residence": input.primary_residence,
                    "discount": discount.to_string(),
                }),
                serde_json::json!({ "tax": tax.to_string() }),
                format!("{} rule applied", country),
            );
        }
    }

    if let Some(value) = value {
        result.effective_rate = effective_rate(result.tax, value);
    }
    debug!(region = %region, tax = %result.tax, "Calculated property tax");
    Ok(result)
}

fn find_band<'a>(bands: &'a [Band<CouncilBand>], letter: &str) -> EngineResult<&'a Band<CouncilBand>> {
    bands
        .iter()
        .find(|band| band.value.band.eq_ignore_ascii_case(letter.trim()))
        .ok_or_else(|| EngineError::InvalidInput {
            field: "band".to_string(),
            message: format!("unknown council tax band '{}'", letter),
        })
}

fn band_range(band: &Band<CouncilBand>) -> String {
    match band.max {
        Some(max) => format!(
            "Properties valued {} to {}",
            format_currency(band.min, Region::Uk),
            format_currency(max, Region::Uk)
        ),
        None => format!("Properties valued above {}", format_currency(band.min, Region::Uk)),
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

    fn input(jurisdiction: Jurisdiction, value: &str) -> PropertyTaxInput {
        PropertyTaxInput {
            jurisdiction,
            property_value: Some(dec(value)),
            band: None,
            area: None,
            discount: Decimal::ZERO,
            primary_residence: false,
        }
    }

    #[test]
    fn test_uk_band_from_value() {
        let result = calculate_property_tax(&input(Jurisdiction::Uk, "250000"), &tables()).unwrap();
        assert_eq!(result.line("Band G Base Rate").unwrap().value, dec("3125"));
        assert_eq!(result.tax, dec("3125"));
        assert!(result.line("Metropolitan Area Adjustment").is_none());
    }

    #[test]
    fn test_uk_area_and_discount() {
        let mut request = input(Jurisdiction::Uk, "250000");
        request.area = Some(CouncilArea::London);
        request.discount = dec("25");
        let result = calculate_property_tax(&request, &tables()).unwrap();
        assert_eq!(result.line("London Area Adjustment").unwrap().value, dec("156.25"));
        assert_eq!(result.line("Discount").unwrap().value, dec("-820.3125"));
        assert_eq!(result.tax, dec("2460.9375"));
    }

    #[test]
    fn test_uk_explicit_band_without_value() {
        let mut request = input(Jurisdiction::Uk, "0");
        request.property_value = None;
        request.band = Some("d".to_string());
        let result = calculate_property_tax(&request, &tables()).unwrap();
        assert_eq!(result.tax, dec("1875"));
        assert_eq!(result.effective_rate, Decimal::ZERO);
    }

    #[test]
    fn test_uk_unknown_band_is_invalid() {
        let mut request = input(Jurisdiction::Uk, "100000");
        request.band = Some("Z".to_string());
        let result = calculate_property_tax(&request, &tables());
        assert!(matches!(result, Err(EngineError::InvalidInput { .. })));
    }

    #[test]
    fn test_discount_over_100_is_invalid() {
        let mut request = input(Jurisdiction::Uk, "100000");
        request.discount = dec("150");
        assert!(calculate_property_tax(&request, &tables()).is_err());
    }

    #[test]
    fn test_us_rate_with_exemption() {
        let mut request = input(Jurisdiction::Us { state: Some(UsState::Texas) }, "300000");
        request.discount = dec("10");
        let result = calculate_property_tax(&request, &tables()).unwrap();
        assert_eq!(result.line("Exemptions/Discounts").unwrap().value, dec("-543"));
        assert_eq!(result.tax, dec("4887"));
        assert_eq!(result.effective_rate, dec("1.63"));
    }

    #[test]
    fn test_eu_percentage() {
        let result = calculate_property_tax(
            &input(Jurisdiction::Eu { country: Some(EuCountry::Germany) }, "400000"),
            &tables(),
        )
        .unwrap();
        assert_eq!(result.tax, dec("1400"));
    }

    #[test]
    fn test_eu_value_band_with_primary_residence() {
        let mut request = input(Jurisdiction::Eu { country: Some(EuCountry::France) }, "300000");
        request.primary_residence = true;
        let result = calculate_property_tax(&request, &tables()).unwrap();
        assert_eq!(result.line("Base Rate").unwrap().value, dec("2500"));
        assert_eq!(result.tax, dec("1750"));
    }

    #[test]
    fn test_eu_fixed_rule() {
        let mut tables = tables();
        tables.property_tax.eu.countries.entries.insert(
            EuCountry::Belgium,
            EuPropertyRule::Fixed {
                amount: dec("900"),
                description: None,
            },
        );
        let result = calculate_property_tax(
            &input(Jurisdiction::Eu { country: Some(EuCountry::Belgium) }, "1000000"),
            &tables,
        )
        .unwrap();
        assert_eq!(result.tax, dec("900"));
        assert!(result.line("Fixed Rate").is_some());
    }

    #[test]
    fn test_missing_value_is_empty() {
        let mut request = input(Jurisdiction::Us { state: None }, "0");
        request.property_value = None;
        let result = calculate_property_tax(&request, &tables()).unwrap();
        assert!(result.is_empty());
    }
}
