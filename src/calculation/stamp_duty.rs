//! Stamp duty and property transfer tax.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{PropertyTransferRates, TaxTables};
use crate::error::EngineResult;
use crate::format::format_currency;
use crate::models::{
    BracketTable, CalculationResult, Jurisdiction, LineItem, PropertyType, RateSchedule, Region,
    TaxType,
};

use super::common::{checked_input, effective_rate, non_negative};
use super::progressive::{BracketEvaluation, evaluate_brackets, evaluate_schedule};

/// Inputs to a stamp duty calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StampDutyInput {
    /// Where the property is.
    pub jurisdiction: Jurisdiction,
    /// Purchase price.
    #[serde(default)]
    pub property_value: Option<Decimal>,
    /// Residential or not.
    #[serde(default)]
    pub property_type: PropertyType,
    /// UK: the buyer has never owned a home.
    #[serde(default)]
    pub first_time_buyer: bool,
    /// UK: the buyer already owns a home.
    #[serde(default)]
    pub additional_property: bool,
}

/// Which UK table a purchase is charged under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UkStampDutyTable {
    FirstTimeBuyer,
    AdditionalProperty,
    NonResidential,
    Residential,
}

impl UkStampDutyTable {
    fn name(self) -> &'static str {
        match self {
            UkStampDutyTable::FirstTimeBuyer => "first-time buyer",
            UkStampDutyTable::AdditionalProperty => "additional property",
            UkStampDutyTable::NonResidential => "non-residential",
            UkStampDutyTable::Residential => "residential",
        }
    }
}

/// Calculates stamp duty.
///
/// UK table selection, in order:
/// 1. first-time buyer relief, for residential purchases up to the
///    relief's maximum price;
/// 2. the additional-property surcharge table, for residential purchases;
/// 3. the non-residential table;
/// 4. the standard residential table.
pub fn calculate_stamp_duty(
    input: &StampDutyInput,
    tables: &TaxTables,
) -> EngineResult<CalculationResult> {
    let region = input.jurisdiction.region();
    let Some(value) = checked_input("property_value", input.property_value)? else {
        return Ok(CalculationResult::empty(TaxType::StampDuty, region));
    };
    let value = non_negative(value);
    let residential = input.property_type == PropertyType::Residential;

    let mut result = CalculationResult::new(TaxType::StampDuty, region);
    result.push_line(LineItem::currency("Property Value", value));

    match input.jurisdiction {
        Jurisdiction::Uk => {
            let uk = &tables.stamp_duty.uk;
            let selected = if input.first_time_buyer
                && residential
                && value <= uk.first_time_buyer_max_price
            {
                UkStampDutyTable::FirstTimeBuyer
            } else if input.additional_property && residential {
                UkStampDutyTable::AdditionalProperty
            } else if !residential {
                UkStampDutyTable::NonResidential
            } else {
                UkStampDutyTable::Residential
            };
            if input.first_time_buyer && selected != UkStampDutyTable::FirstTimeBuyer {
                result.push_note(format!(
                    "First-time buyer relief does not apply: it covers residential purchases up to {}.",
                    format_currency(uk.first_time_buyer_max_price, Region::Uk)
                ));
            }
            let table = match selected {
                UkStampDutyTable::FirstTimeBuyer => &uk.first_time_buyer,
                UkStampDutyTable::AdditionalProperty => &uk.additional_property,
                UkStampDutyTable::NonResidential => &uk.non_residential,
                UkStampDutyTable::Residential => &uk.residential,
            };

            let evaluation = evaluate_brackets(value, table);
            push_band_lines(&mut result, table, &evaluation, Region::Uk);
            result.push_audit(
                "uk_stamp_duty",
                "UK Stamp Duty Land Tax",
                serde_json::json!({
                    "property_value": value.to_string(),
                    "property_type": input.property_type,
                    "first_time_buyer": input.first_time_buyer,
                    "additional_property": input.additional_property,
                }),
                serde_json::json!({
                    "table": selected.name(),
                    "tax": evaluation.tax.to_string(),
                }),
                format!("Charged under the {} bands", selected.name()),
            );
            finish(&mut result, evaluation, value, "Total Stamp Duty");
        }
        Jurisdiction::Eu { country } => {
            let (country, rates) = tables.stamp_duty.eu.resolve(country, TaxType::StampDuty)?;
            result = result.for_sub_region(country.name());
            transfer_tax(&mut result, rates, input.property_type, value, country.name());
        }
        Jurisdiction::Us { state } => {
            let (state, rates) = tables.stamp_duty.us.resolve(state, TaxType::StampDuty)?;
            result = result.for_sub_region(state.name());
            transfer_tax(&mut result, rates, input.property_type, value, state.name());
        }
    }

    debug!(region = %region, value = %value, tax = %result.tax, "Calculated stamp duty");
    Ok(result)
}

fn transfer_tax(
    result: &mut CalculationResult,
    rates: &PropertyTransferRates,
    property_type: PropertyType,
    value: Decimal,
    place: &str,
) {
    let schedule = match property_type {
        PropertyType::Residential => &rates.residential,
        PropertyType::NonResidential => &rates.non_residential,
    };
    let evaluation = evaluate_schedule(value, schedule);
    let kind = match property_type {
        PropertyType::Residential => "residential",
        PropertyType::NonResidential => "non-residential",
    };

    match schedule {
        RateSchedule::Flat { rate } => {
            result.push_line(
                LineItem::percent("Tax Rate", *rate).describe(format!("Standard rate for {}", place)),
            );
        }
        RateSchedule::Progressive { brackets } => {
            let region = result.region;
            push_band_lines(result, brackets, &evaluation, region);
        }
    }
    if let Some(note) = &rates.note {
        result.push_note(note.clone());
    }
    result.push_audit(
        "transfer_tax",
        &format!("{} Transfer Tax", place),
        serde_json::json!({
            "property_value": value.to_string(),
            "property_type": property_type,
        }),
        serde_json::json!({ "tax": evaluation.tax.to_string() }),
        format!("{} {} schedule applied", place, kind),
    );
    finish(result, evaluation, value, &format!("Transfer Tax ({})", place));
}

/// One line per band that attracted tax, labelled with the band's bounds.
fn push_band_lines(
    result: &mut CalculationResult,
    table: &BracketTable,
    evaluation: &BracketEvaluation,
    region: Region,
) {
    for (bracket, slice) in table.brackets().iter().zip(&evaluation.slices) {
        if slice.tax <= Decimal::ZERO {
            continue;
        }
        let upper = match bracket.max {
            Some(max) => format_currency(max, region),
            None => "above".to_string(),
        };
        result.push_line(
            LineItem::currency(
                format!("Rate for {} to {}", format_currency(bracket.min, region), upper),
                slice.tax,
            )
            .describe(format!(
                "{}% on {}",
                slice.rate.normalize(),
                format_currency(slice.taxable_amount, region)
            )),
        );
    }
}

fn finish(result: &mut CalculationResult, evaluation: BracketEvaluation, value: Decimal, label: &str) {
    let rate = effective_rate(evaluation.tax, value);
    result.push_line(
        LineItem::currency(label, evaluation.tax)
            .describe(format!("Effective rate: {}%", rate))
            .total(),
    );
    result.tax = evaluation.tax;
    result.effective_rate = rate;
    result.brackets = evaluation.slices;
}
