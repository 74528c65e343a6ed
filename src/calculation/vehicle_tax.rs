//! Vehicle tax.
//!
//! Each region charges on a different measure of the vehicle:
//! - UK: CO2 band by fuel type, first-year or standard rate;
//! - US: sales tax on a new purchase plus the state registration fee;
//! - EU: one of several per-country methods, see [`EuVehicleRule`].
//!
//! A result is empty when the measure the rule needs was not entered.

use rust_decimal::{Decimal, MathematicalOps};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{EuVehicleRule, TaxTables, VedRates};
use crate::error::EngineResult;
use crate::models::{Amount, BandTable, CalculationResult, FuelType, Jurisdiction, LineItem, TaxType};

use super::common::{checked_input, effective_rate, non_negative, percent_of};

/// Inputs to a vehicle tax calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleTaxInput {
    /// Where the vehicle is registered.
    pub jurisdiction: Jurisdiction,
    /// Fuel type.
    #[serde(default)]
    pub fuel_type: FuelType,
    /// First year of registration (UK, Sweden) or a new purchase (US).
    #[serde(default)]
    pub new_vehicle: bool,
    /// CO2 emissions in g/km.
    #[serde(default)]
    pub co2_emissions: Option<Decimal>,
    /// Engine displacement in cc.
    #[serde(default)]
    pub engine_size_cc: Option<Decimal>,
    /// Engine power in kW.
    #[serde(default)]
    pub power_kw: Option<Decimal>,
    /// Vehicle weight in kg.
    #[serde(default)]
    pub weight_kg: Option<Decimal>,
    /// Purchase price, for US sales tax.
    #[serde(default)]
    pub vehicle_value: Option<Decimal>,
}

/// Calculates vehicle tax.
pub fn calculate_vehicle_tax(
    input: &VehicleTaxInput,
    tables: &TaxTables,
) -> EngineResult<CalculationResult> {
    let region = input.jurisdiction.region();
    let empty = CalculationResult::empty(TaxType::VehicleTax, region);

    let co2 = measure("co2_emissions", input.co2_emissions)?;
    let engine_size = measure("engine_size_cc", input.engine_size_cc)?;
    let power = measure("power_kw", input.power_kw)?;
    let weight = measure("weight_kg", input.weight_kg)?;
    let value = measure("vehicle_value", input.vehicle_value)?;
    let electric = input.fuel_type == FuelType::Electric;

    let mut result = CalculationResult::new(TaxType::VehicleTax, region);

    match input.jurisdiction {
        Jurisdiction::Uk => {
            let uk = &tables.vehicle_tax.uk;
            let (rates, description) = if electric {
                (uk.electric, "Electric vehicles".to_string())
            } else {
                let Some(co2) = co2 else {
                    return Ok(empty);
                };
                let bands = match input.fuel_type {
                    FuelType::Petrol => &uk.petrol,
                    FuelType::Diesel => &uk.diesel,
                    FuelType::Hybrid | FuelType::Electric => &uk.alternative,
                };
                let band = bands.lookup(co2);
                let range = match band.max {
                    Some(max) => format!("{}-{} g/km", band.min, max),
                    None => format!("{}+ g/km", band.min),
                };
                (band.value, format!("CO2 emissions: {} g/km ({})", co2, range))
            };
            let (label, tax) = ved_rate(rates, input.new_vehicle);
            result.push_line(LineItem::currency(label, tax).describe(description.clone()));
            result.push_audit(
                "uk_vehicle_excise_duty",
                "UK Vehicle Excise Duty",
                serde_json::json!({
                    "fuel_type": input.fuel_type,
                    "co2_emissions": co2.map(|c| c.to_string()),
                    "first_year": input.new_vehicle,
                }),
                serde_json::json!({ "tax": tax.to_string() }),
                format!("{}: {}", label, description),
            );
            result.tax = tax;
        }
        Jurisdiction::Us { state } => {
            let (state, rates) = tables.vehicle_tax.us.resolve(state, TaxType::VehicleTax)?;
            result = result.for_sub_region(state.name());

            let mut sales_tax = Decimal::ZERO;
            if input.new_vehicle {
                let Some(value) = value else {
                    return Ok(empty);
                };
                sales_tax = percent_of(value, rates.sales_tax_rate);
                result.push_line(LineItem::currency("Sales Tax", sales_tax).describe(format!(
                    "{}% of vehicle value ({})",
                    rates.sales_tax_rate.normalize(),
                    value
                )));
                result.effective_rate = effective_rate(sales_tax, value);
            }
            result.push_line(
                LineItem::currency("Registration Fee", rates.registration_fee)
                    .describe(format!("Annual registration fee for {}", state)),
            );
            result.push_audit(
                "us_vehicle_tax",
                "US Vehicle Tax",
                serde_json::json!({
                    "state": state,
                    "new_vehicle": input.new_vehicle,
                    "vehicle_value": value.map(|v| v.to_string()),
                }),
                serde_json::json!({
                    "sales_tax": sales_tax.to_string(),
                    "registration_fee": rates.registration_fee.to_string(),
                }),
                if input.new_vehicle {
                    "New purchase: sales tax plus registration"
                } else {
                    "Used vehicle: registration only"
                },
            );
            result.tax = sales_tax + rates.registration_fee;
        }
        Jurisdiction::Eu { country } => {
            let (country, rule) = tables.vehicle_tax.eu.resolve(country, TaxType::VehicleTax)?;
            result = result.for_sub_region(country.name());
            let measures = Measures {
                co2,
                engine_size,
                power,
                weight,
            };
            let Some(tax) = eu_vehicle_tax(&mut result, rule, &measures, input) else {
                return Ok(empty);
            };
            result.push_audit(
                "eu_vehicle_tax",
                &format!("{} Vehicle Tax", country),
                serde_json::json!({
                    "fuel_type": input.fuel_type,
                    "co2_emissions": co2.map(|v| v.to_string()),
                    "engine_size_cc": engine_size.map(|v| v.to_string()),
                    "power_kw": power.map(|v| v.to_string()),
                    "weight_kg": weight.map(|v| v.to_string()),
                }),
                serde_json::json!({ "tax": tax.to_string() }),
                format!("{} method for {}", rule.method_name(), country),
            );
            result.tax = tax;
        }
    }

    result.push_line(LineItem::currency("Total Vehicle Tax", result.tax).total());
    debug!(region = %region, fuel_type = %input.fuel_type, tax = %result.tax, "Calculated vehicle tax");
    Ok(result)
}

fn measure(field: &str, value: Option<Decimal>) -> EngineResult<Option<Decimal>> {
    Ok(checked_input(field, value)?.map(non_negative))
}

fn ved_rate(rates: VedRates, first_year: bool) -> (&'static str, Decimal) {
    if first_year {
        ("First Year Rate", rates.first_year)
    } else {
        ("Standard Rate", rates.standard)
    }
}

struct Measures {
    co2: Option<Decimal>,
    engine_size: Option<Decimal>,
    power: Option<Decimal>,
    weight: Option<Decimal>,
}

impl EuVehicleRule {
    fn method_name(&self) -> &'static str {
        match self {
            EuVehicleRule::Displacement { .. } => "Engine displacement and CO2",
            EuVehicleRule::Co2Bands { .. } => "CO2 band",
            EuVehicleRule::Horsepower { .. } => "Horsepower band",
            EuVehicleRule::Power { .. } => "Engine power",
            EuVehicleRule::Weight { .. } => "Vehicle weight",
            EuVehicleRule::FiscalHorsepower { .. } => "Fiscal horsepower",
            EuVehicleRule::Co2Base { .. } => "Base and CO2",
        }
    }
}

fn band_amount(bands: &BandTable<Amount>, value: Decimal) -> Decimal {
    bands.lookup(value).value.amount
}

/// Applies a country's rule, pushing its breakdown lines. Returns `None`
/// when a measure the rule needs is missing.
fn eu_vehicle_tax(
    result: &mut CalculationResult,
    rule: &EuVehicleRule,
    m: &Measures,
    input: &VehicleTaxInput,
) -> Option<Decimal> {
    let electric = input.fuel_type == FuelType::Electric;

    let tax = match rule {
        EuVehicleRule::Displacement {
            petrol_rate_per_100cc,
            diesel_rate_per_100cc,
            co2_threshold,
            co2_rate,
        } => {
            if electric {
                result.push_line(
                    LineItem::currency("Electric Vehicle", Decimal::ZERO)
                        .describe("Electric vehicles are exempt from tax"),
                );
                result.exemption = Some("Electric vehicles are exempt".to_string());
                return Some(Decimal::ZERO);
            }
            let (engine_size, co2) = (m.engine_size?, m.co2?);
            let rate = if input.fuel_type == FuelType::Petrol {
                *petrol_rate_per_100cc
            } else {
                *diesel_rate_per_100cc
            };
            let engine = engine_size / Decimal::ONE_HUNDRED * rate;
            let co2_component = non_negative(co2 - co2_threshold) * co2_rate;
            result.push_line(
                LineItem::currency("Engine Size Component", engine)
                    .describe(format!("{}cc at {} per 100cc", engine_size, rate)),
            );
            if co2_component > Decimal::ZERO {
                result.push_line(LineItem::currency("CO2 Component", co2_component).describe(
                    format!("{}g/km ({} per g/km above {}g/km)", co2, co2_rate, co2_threshold),
                ));
            }
            engine + co2_component
        }
        EuVehicleRule::Co2Bands { bands } => {
            let co2 = m.co2?;
            let tax = band_amount(bands, co2);
            result.push_line(
                LineItem::currency("CO2 Tax", tax).describe(format!("CO2 emissions: {} g/km", co2)),
            );
            tax
        }
        EuVehicleRule::Horsepower { hp_per_kw, bands } => {
            let power = m.power?;
            let horsepower = power * hp_per_kw;
            let tax = band_amount(bands, horsepower);
            result.push_line(LineItem::currency("Horsepower Tax", tax).describe(format!(
                "Approx. {} HP ({} kW)",
                horsepower.round_dp(2),
                power
            )));
            tax
        }
        EuVehicleRule::Power {
            rate_per_kw,
            surcharge_threshold_kw,
            surcharge_per_kw,
            electric_discount,
        } => {
            let power = m.power?;
            let mut base = power * rate_per_kw;
            let mut surcharge = non_negative(power - surcharge_threshold_kw) * surcharge_per_kw;
            if electric {
                let keep = Decimal::ONE_HUNDRED - electric_discount;
                base = percent_of(base, keep);
                surcharge = percent_of(surcharge, keep);
                result.push_note(format!(
                    "Electric vehicles receive a {}% discount.",
                    electric_discount.normalize()
                ));
            }
            result.push_line(
                LineItem::currency("Base Power Tax", base)
                    .describe(format!("{} kW at {} per kW", power, rate_per_kw)),
            );
            if surcharge > Decimal::ZERO {
                result.push_line(LineItem::currency("Power Surcharge", surcharge).describe(
                    format!(
                        "{} kW above the {} kW threshold",
                        power - surcharge_threshold_kw,
                        surcharge_threshold_kw
                    ),
                ));
            }
            base + surcharge
        }
        EuVehicleRule::Weight {
            petrol_base,
            diesel_base,
            rate_per_100kg,
        } => {
            let weight = m.weight?;
            let base = if input.fuel_type == FuelType::Diesel {
                *diesel_base
            } else {
                *petrol_base
            };
            let weight_component = weight / Decimal::ONE_HUNDRED * rate_per_100kg;
            result.push_line(
                LineItem::currency("Base Rate", base).describe(format!("{} vehicles", input.fuel_type)),
            );
            result.push_line(
                LineItem::currency("Weight Component", weight_component)
                    .describe(format!("{} kg at {} per 100kg", weight, rate_per_100kg)),
            );
            base + weight_component
        }
        EuVehicleRule::FiscalHorsepower {
            factor,
            rate,
            minimum,
        } => {
            let engine_size = m.engine_size?;
            let fiscal_hp = engine_size.sqrt().unwrap_or(Decimal::ZERO) * factor;
            let tax = (fiscal_hp * rate).max(*minimum);
            result.push_line(LineItem::currency("Fiscal Horsepower Tax", tax).describe(format!(
                "Approx. {} fiscal HP based on {}cc",
                fiscal_hp.round_dp(2),
                engine_size
            )));
            tax
        }
        EuVehicleRule::Co2Base {
            base,
            co2_threshold,
            co2_rate,
            new_vehicle_multiplier,
            electric_amount,
        } => {
            if electric {
                result.push_line(
                    LineItem::currency("Base Rate", *electric_amount).describe("Electric vehicles"),
                );
                return Some(*electric_amount);
            }
            let co2 = m.co2?;
            let multiplier = if input.new_vehicle {
                *new_vehicle_multiplier
            } else {
                Decimal::ONE
            };
            let co2_component = non_negative(co2 - co2_threshold) * co2_rate * multiplier;
            let base_amount = *base * multiplier;
            result.push_line(LineItem::currency("Base Rate", base_amount).describe("Annual base tax"));
            if co2_component > Decimal::ZERO {
                result.push_line(LineItem::currency("CO2 Component", co2_component).describe(
                    if input.new_vehicle {
                        format!("{}g/km ({}x rate for new vehicles)", co2, multiplier.normalize())
                    } else {
                        format!("{}g/km (standard rate)", co2)
                    },
                ));
            }
            base_amount + co2_component
        }
    };
    Some(tax)
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

    fn input(jurisdiction: Jurisdiction, fuel_type: FuelType) -> VehicleTaxInput {
        VehicleTaxInput {
            jurisdiction,
            fuel_type,
            new_vehicle: false,
            co2_emissions: None,
            engine_size_cc: None,
            power_kw: None,
            weight_kg: None,
            vehicle_value: None,
        }
    }

    fn eu(country: EuCountry, fuel_type: FuelType) -> VehicleTaxInput {
        input(Jurisdiction::Eu { country: Some(country) }, fuel_type)
    }

    #[test]
    fn test_uk_first_year_by_co2_band() {
        let mut request = input(Jurisdiction::Uk, FuelType::Diesel);
        request.co2_emissions = Some(dec("120"));
        request.new_vehicle = true;
        let result = calculate_vehicle_tax(&request, &tables()).unwrap();
        assert_eq!(result.tax, dec("240"));
        assert!(result.line("First Year Rate").is_some());
    }

    #[test]
    fn test_uk_standard_rate() {
        let mut request = input(Jurisdiction::Uk, FuelType::Petrol);
        request.co2_emissions = Some(dec("300"));
        let result = calculate_vehicle_tax(&request, &tables()).unwrap();
        assert_eq!(result.tax, dec("195"));
    }

    #[test]
    fn test_uk_electric_needs_no_co2() {
        let mut request = input(Jurisdiction::Uk, FuelType::Electric);
        request.new_vehicle = true;
        let result = calculate_vehicle_tax(&request, &tables()).unwrap();
        assert_eq!(result.tax, Decimal::ZERO);
        assert!(!result.is_empty());
    }

    #[test]
    fn test_uk_missing_co2_is_empty() {
        let result = calculate_vehicle_tax(&input(Jurisdiction::Uk, FuelType::Petrol), &tables()).unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn test_us_new_purchase() {
        let mut request = input(Jurisdiction::Us { state: Some(UsState::Texas) }, FuelType::Petrol);
        request.new_vehicle = true;
        request.vehicle_value = Some(dec("30000"));
        let result = calculate_vehicle_tax(&request, &tables()).unwrap();
        assert_eq!(result.line("Sales Tax").unwrap().value, dec("1875"));
        assert_eq!(result.tax, dec("1926.75"));
    }

    #[test]
    fn test_us_used_vehicle_registration_only() {
        let request = input(Jurisdiction::Us { state: Some(UsState::Illinois) }, FuelType::Petrol);
        let result = calculate_vehicle_tax(&request, &tables()).unwrap();
        assert_eq!(result.tax, dec("151"));
    }

    #[test]
    fn test_germany_displacement_and_co2() {
        let mut request = eu(EuCountry::Germany, FuelType::Diesel);
        request.engine_size_cc = Some(dec("2000"));
        request.co2_emissions = Some(dec("120"));
        let result = calculate_vehicle_tax(&request, &tables()).unwrap();
        // 20 * 9.5 + 25 * 2
        assert_eq!(result.tax, dec("240"));
    }

    #[test]
    fn test_germany_electric_exempt() {
        let result = calculate_vehicle_tax(&eu(EuCountry::Germany, FuelType::Electric), &tables()).unwrap();
        assert_eq!(result.tax, Decimal::ZERO);
        assert!(result.exemption.is_some());
    }

    #[test]
    fn test_france_co2_band() {
        let mut request = eu(EuCountry::France, FuelType::Petrol);
        request.co2_emissions = Some(dec("160"));
        let result = calculate_vehicle_tax(&request, &tables()).unwrap();
        assert_eq!(result.tax, dec("275"));
    }

    #[test]
    fn test_spain_horsepower_band() {
        let mut request = eu(EuCountry::Spain, FuelType::Petrol);
        request.power_kw = Some(dec("100"));
        let result = calculate_vehicle_tax(&request, &tables()).unwrap();
        assert_eq!(result.tax, dec("224"));
    }

    #[test]
    fn test_italy_power_with_surcharge_and_electric_discount() {
        let mut request = eu(EuCountry::Italy, FuelType::Petrol);
        request.power_kw = Some(dec("120"));
        let result = calculate_vehicle_tax(&request, &tables()).unwrap();
        // 120 * 2.58 + 20 * 3.87
        assert_eq!(result.tax, dec("387"));

        request.fuel_type = FuelType::Electric;
        let result = calculate_vehicle_tax(&request, &tables()).unwrap();
        assert_eq!(result.tax, dec("96.75"));
    }

    #[test]
    fn test_netherlands_weight() {
        let mut request = eu(EuCountry::Netherlands, FuelType::Hybrid);
        request.weight_kg = Some(dec("1200"));
        let result = calculate_vehicle_tax(&request, &tables()).unwrap();
        assert_eq!(result.tax, dec("160"));
    }

    #[test]
    fn test_belgium_fiscal_horsepower_minimum() {
        let mut request = eu(EuCountry::Belgium, FuelType::Petrol);
        request.engine_size_cc = Some(dec("1600"));
        let result = calculate_vehicle_tax(&request, &tables()).unwrap();
        // sqrt(1600) * 0.4 * 25 = 400
        assert_eq!(result.tax.round_dp(6), dec("400"));

        request.engine_size_cc = Some(dec("25"));
        let result = calculate_vehicle_tax(&request, &tables()).unwrap();
        assert_eq!(result.tax, dec("61.50"));
    }

    #[test]
    fn test_sweden_new_vehicle_multiplier() {
        let mut request = eu(EuCountry::Sweden, FuelType::Petrol);
        request.co2_emissions = Some(dec("105"));
        let used = calculate_vehicle_tax(&request, &tables()).unwrap();
        assert_eq!(used.tax, dec("580"));

        request.new_vehicle = true;
        let new = calculate_vehicle_tax(&request, &tables()).unwrap();
        assert_eq!(new.tax, dec("1740"));
    }

    #[test]
    fn test_eu_missing_measure_is_empty() {
        let result = calculate_vehicle_tax(&eu(EuCountry::Netherlands, FuelType::Petrol), &tables()).unwrap();
        assert!(result.is_empty());
    }
}
