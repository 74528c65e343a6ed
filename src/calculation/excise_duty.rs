//! Excise duty on alcohol, tobacco, fuel and gambling.
//!
//! Each product's rate is expressed in some unit (a litre of pure alcohol,
//! a proof gallon, a pack of 20). The caller gives a quantity in the
//! product's natural unit and the basis converts it:
//!
//! | Product family | Quantity | Converted by |
//! |---|---|---|
//! | Drinks, fuel | litres | ABV, container size, litres per gallon |
//! | Cigarettes, US cigars | sticks or units | per pack or per thousand |
//! | Other tobacco | grams | grams per kg or per pound |
//! | Gambling | none | percentage of `value` (gross profit) |

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{DutyBasis, TaxTables};
use crate::error::{EngineError, EngineResult};
use crate::models::{CalculationResult, ExciseProduct, Jurisdiction, LineItem, TaxType};

use super::common::{checked_input, checked_percentage, effective_rate, non_negative, percent_of};

/// Litres in a US gallon.
const LITRES_PER_GALLON: Decimal = Decimal::from_parts(378_541, 0, 0, false, 5);

/// Grams in a pound.
const GRAMS_PER_POUND: Decimal = Decimal::from_parts(453_592, 0, 0, false, 3);

const ONE_THOUSAND: Decimal = Decimal::from_parts(1000, 0, 0, false, 0);

/// Inputs to an excise duty calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExciseInput {
    /// Where the duty is charged.
    pub jurisdiction: Jurisdiction,
    /// The product.
    pub product: ExciseProduct,
    /// Quantity in the product's natural unit.
    #[serde(default)]
    pub quantity: Option<Decimal>,
    /// Alcohol by volume, as a percentage.
    #[serde(default)]
    pub abv: Decimal,
    /// Retail price (cigarettes) or gross profit (gambling).
    #[serde(default)]
    pub value: Option<Decimal>,
}

/// Calculates excise duty for one product.
///
/// Gambling duties need only `value`; every other product needs
/// `quantity`. The result is empty when the needed amount is missing.
pub fn calculate_excise_duty(
    input: &ExciseInput,
    tables: &TaxTables,
) -> EngineResult<CalculationResult> {
    let region = input.jurisdiction.region();
    let duties = match input.jurisdiction {
        Jurisdiction::Uk => &tables.excise_duty.uk,
        Jurisdiction::Eu { .. } => &tables.excise_duty.eu,
        Jurisdiction::Us { .. } => &tables.excise_duty.us,
    };
    let basis = duties
        .get(&input.product)
        .ok_or_else(|| EngineError::UnsupportedRegion {
            tax: TaxType::ExciseDuty.name().to_string(),
            selector: input.product.to_string(),
        })?;

    let quantity = checked_input("quantity", input.quantity)?.map(non_negative);
    let value = checked_input("value", input.value)?.map(non_negative);
    let abv = checked_percentage("abv", input.abv)?;

    let needed = match basis {
        DutyBasis::PercentOfValue { .. } => value,
        _ => quantity,
    };
    if needed.is_none() {
        return Ok(CalculationResult::empty(TaxType::ExciseDuty, region));
    }
    let quantity = quantity.unwrap_or(Decimal::ZERO);
    let value = value.unwrap_or(Decimal::ZERO);

    let mut result = CalculationResult::new(TaxType::ExciseDuty, region);
    let product = input.product;

    let (tax, description) = match basis {
        DutyBasis::PerLitrePureAlcohol { rate } => {
            let pure_alcohol = percent_of(quantity, abv);
            result.push_line(LineItem::quantity("Quantity (litres)", quantity));
            result.push_line(
                LineItem::quantity("Litres of Pure Alcohol", pure_alcohol)
                    .describe(format!("{} litres at {}% ABV", quantity, abv.normalize())),
            );
            (pure_alcohol * rate, format!("{} per litre of pure alcohol", rate))
        }
        DutyBasis::PerContainer {
            rate,
            litres,
            container,
        } => {
            let containers = quantity / litres;
            result.push_line(LineItem::quantity("Quantity (litres)", quantity));
            result.push_line(
                LineItem::quantity("Containers", containers)
                    .describe(format!("{} litres per {}", litres.normalize(), container)),
            );
            (containers * rate, format!("{} per {}", rate, container))
        }
        DutyBasis::PerProofGallon { rate } => {
            let gallons = quantity / LITRES_PER_GALLON;
            let proof_gallons = gallons * abv * Decimal::TWO / Decimal::ONE_HUNDRED;
            result.push_line(LineItem::quantity("Quantity (litres)", quantity));
            result.push_line(LineItem::quantity("Proof Gallons", proof_gallons).describe(format!(
                "{} gallons at {} proof",
                gallons.round_dp(2),
                abv * Decimal::TWO
            )));
            (proof_gallons * rate, format!("{} per proof gallon", rate))
        }
        DutyBasis::Composite {
            per_thousand,
            ad_valorem_rate,
        } => {
            let specific = quantity / ONE_THOUSAND * per_thousand;
            let ad_valorem = percent_of(value, *ad_valorem_rate);
            result.push_line(LineItem::quantity("Quantity (units)", quantity));
            result.push_line(
                LineItem::currency("Specific Duty", specific)
                    .describe(format!("{} per 1,000", per_thousand)),
            );
            result.push_line(LineItem::currency("Ad Valorem Duty", ad_valorem).describe(format!(
                "{}% of retail price {}",
                ad_valorem_rate.normalize(),
                value
            )));
            (
                specific + ad_valorem,
                format!(
                    "{} per 1,000 plus {}% of retail price",
                    per_thousand,
                    ad_valorem_rate.normalize()
                ),
            )
        }
        DutyBasis::PerPack { rate, pack_size } => {
            let packs = quantity / pack_size;
            result.push_line(LineItem::quantity("Quantity (units)", quantity));
            result.push_line(
                LineItem::quantity("Packs", packs).describe(format!("Packs of {}", pack_size)),
            );
            (packs * rate, format!("{} per pack of {}", rate, pack_size))
        }
        DutyBasis::PerThousand { rate } => {
            result.push_line(LineItem::quantity("Quantity (units)", quantity));
            (quantity / ONE_THOUSAND * rate, format!("{} per 1,000 units", rate))
        }
        DutyBasis::PerKilogram { rate } => {
            let kilograms = quantity / ONE_THOUSAND;
            result.push_line(LineItem::quantity("Quantity (grams)", quantity));
            result.push_line(LineItem::quantity("Kilograms", kilograms));
            (kilograms * rate, format!("{} per kg", rate))
        }
        DutyBasis::PerPound { rate } => {
            let pounds = quantity / GRAMS_PER_POUND;
            result.push_line(LineItem::quantity("Quantity (grams)", quantity));
            result.push_line(LineItem::quantity("Pounds", pounds));
            (pounds * rate, format!("{} per pound", rate))
        }
        DutyBasis::PerLitre { rate } => {
            result.push_line(LineItem::quantity("Quantity (litres)", quantity));
            (quantity * rate, format!("{} per litre", rate))
        }
        DutyBasis::PerGallon { rate } => {
            let gallons = quantity / LITRES_PER_GALLON;
            result.push_line(LineItem::quantity("Quantity (litres)", quantity));
            result.push_line(LineItem::quantity("Gallons", gallons));
            (gallons * rate, format!("{} per gallon", rate))
        }
        DutyBasis::PercentOfValue { rate } => {
            result.push_line(LineItem::currency("Taxable Value", value));
            (percent_of(value, *rate), format!("{}% of gross profit", rate.normalize()))
        }
    };

    result.push_line(
        LineItem::currency("Excise Duty", tax)
            .describe(format!("{} duty at {}", product, description))
            .total(),
    );
    result.push_audit(
        "excise_duty",
        &format!("Excise Duty on {}", product.category()),
        serde_json::json!({
            "product": product,
            "quantity": quantity.to_string(),
            "abv": abv.to_string(),
            "value": value.to_string(),
        }),
        serde_json::json!({ "tax": tax.to_string() }),
        format!("{} charged at {}", product, description),
    );
    result.tax = tax;
    result.effective_rate = effective_rate(tax, value);

    debug!(region = %region, product = %product, tax = %tax, "Calculated excise duty");
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigLoader;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn tables() -> TaxTables {
        ConfigLoader::builtin().unwrap().tables().clone()
    }

    fn input(jurisdiction: Jurisdiction, product: ExciseProduct, quantity: &str) -> ExciseInput {
        ExciseInput {
            jurisdiction,
            product,
            quantity: Some(dec(quantity)),
            abv: Decimal::ZERO,
            value: None,
        }
    }

    fn us() -> Jurisdiction {
        Jurisdiction::Us { state: None }
    }

    #[test]
    fn test_beer_per_litre_of_pure_alcohol() {
        let mut request = input(Jurisdiction::Uk, ExciseProduct::Beer, "10");
        request.abv = dec("5");
        let result = calculate_excise_duty(&request, &tables()).unwrap();
        assert_eq!(result.line("Litres of Pure Alcohol").unwrap().value, dec("0.5"));
        assert_eq!(result.tax, dec("9.54"));
    }

    #[test]
    fn test_wine_per_bottle() {
        let result =
            calculate_excise_duty(&input(Jurisdiction::Uk, ExciseProduct::Wine, "7.5"), &tables()).unwrap();
        assert_eq!(result.tax, dec("26.7"));
    }

    #[test]
    fn test_cigarettes_composite() {
        let mut request = input(Jurisdiction::Uk, ExciseProduct::Cigarettes, "200");
        request.value = Some(dec("100"));
        let result = calculate_excise_duty(&request, &tables()).unwrap();
        assert_eq!(result.line("Specific Duty").unwrap().value, dec("52.58"));
        assert_eq!(result.line("Ad Valorem Duty").unwrap().value, dec("16.5"));
        assert_eq!(result.tax, dec("69.08"));
    }

    #[test]
    fn test_us_cigarettes_per_pack() {
        let result = calculate_excise_duty(&input(us(), ExciseProduct::Cigarettes, "200"), &tables()).unwrap();
        assert_eq!(result.tax, dec("10.1"));
    }

    #[test]
    fn test_us_spirits_per_proof_gallon() {
        let mut request = input(us(), ExciseProduct::Spirits, "10");
        request.abv = dec("40");
        let result = calculate_excise_duty(&request, &tables()).unwrap();
        assert_eq!(result.tax.round_dp(2), dec("28.53"));
    }

    #[test]
    fn test_us_fuel_per_gallon() {
        let result = calculate_excise_duty(&input(us(), ExciseProduct::Petrol, "100"), &tables()).unwrap();
        assert_eq!(result.tax.round_dp(2), dec("4.76"));
    }

    #[test]
    fn test_us_tobacco_per_pound() {
        let result = calculate_excise_duty(
            &input(us(), ExciseProduct::HandRollingTobacco, "453.592"),
            &tables(),
        )
        .unwrap();
        assert_eq!(result.tax, dec("24.78"));
    }

    #[test]
    fn test_eu_cigars_per_kilogram() {
        let result = calculate_excise_duty(
            &input(Jurisdiction::Eu { country: None }, ExciseProduct::Cigars, "500"),
            &tables(),
        )
        .unwrap();
        assert_eq!(result.tax, dec("145"));
    }

    #[test]
    fn test_betting_uses_value_only() {
        let request = ExciseInput {
            jurisdiction: Jurisdiction::Uk,
            product: ExciseProduct::GeneralBetting,
            quantity: None,
            abv: Decimal::ZERO,
            value: Some(dec("1000")),
        };
        let result = calculate_excise_duty(&request, &tables()).unwrap();
        assert_eq!(result.tax, dec("150"));
        assert_eq!(result.effective_rate, dec("15"));
    }

    #[test]
    fn test_missing_quantity_is_empty() {
        let mut request = input(Jurisdiction::Uk, ExciseProduct::Diesel, "1");
        request.quantity = None;
        assert!(calculate_excise_duty(&request, &tables()).unwrap().is_empty());
    }

    #[test]
    fn test_abv_above_100_is_invalid() {
        let mut request = input(Jurisdiction::Uk, ExciseProduct::Spirits, "1");
        request.abv = dec("140");
        let result = calculate_excise_duty(&request, &tables());
        assert!(matches!(result, Err(EngineError::InvalidInput { .. })));
    }
}
