//! VAT and US sales tax.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::TaxTables;
use crate::error::EngineResult;
use crate::models::{CalculationResult, Jurisdiction, LineItem, Region, TaxType};

use super::common::{checked_input, checked_percentage, non_negative, percent_of};

/// Which VAT rate applies to the goods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VatRateKind {
    /// Standard rate.
    #[default]
    Standard,
    /// Reduced rate.
    Reduced,
    /// Super-reduced rate (some EU countries only).
    SuperReduced,
    /// Zero rate.
    Zero,
}

impl VatRateKind {
    fn name(self) -> &'static str {
        match self {
            VatRateKind::Standard => "standard",
            VatRateKind::Reduced => "reduced",
            VatRateKind::SuperReduced => "super-reduced",
            VatRateKind::Zero => "zero",
        }
    }
}

/// Inputs to a VAT or sales tax calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VatInput {
    /// Where the sale happens.
    pub jurisdiction: Jurisdiction,
    /// Price before tax.
    #[serde(default)]
    pub price: Option<Decimal>,
    /// UK and EU rate kind.
    #[serde(default)]
    pub rate: VatRateKind,
    /// US local rate. When absent the state's average local rate is used.
    #[serde(default)]
    pub local_rate: Option<Decimal>,
}

/// Calculates VAT (UK, EU) or state plus local sales tax (US) on a net price.
///
/// The UK has no super-reduced rate; it and EU countries without one
/// fall back to the standard rate, with a note.
pub fn calculate_vat(input: &VatInput, tables: &TaxTables) -> EngineResult<CalculationResult> {
    let region = input.jurisdiction.region();
    let Some(price) = checked_input("price", input.price)? else {
        return Ok(CalculationResult::empty(TaxType::Vat, region));
    };
    let price = non_negative(price);

    let result = match input.jurisdiction {
        Jurisdiction::Uk => {
            let uk = &tables.vat.uk;
            let mut result = CalculationResult::new(TaxType::Vat, region);
            let rate = match input.rate {
                VatRateKind::Standard => uk.standard,
                VatRateKind::Reduced => uk.reduced,
                VatRateKind::Zero => uk.zero,
                VatRateKind::SuperReduced => {
                    result.push_note("The UK has no super-reduced rate; the standard rate applies.");
                    uk.standard
                }
            };
            vat_lines(result, price, rate, format!("{} rate", input.rate.name()))
        }
        Jurisdiction::Eu { country } => {
            let (country, rates) = tables.vat.eu.resolve(country, TaxType::Vat)?;
            let mut result = CalculationResult::new(TaxType::Vat, region).for_sub_region(country.name());
            let rate = match input.rate {
                VatRateKind::Standard => rates.standard,
                VatRateKind::Reduced => rates.reduced,
                VatRateKind::Zero => Decimal::ZERO,
                VatRateKind::SuperReduced => match rates.super_reduced {
                    Some(rate) => rate,
                    None => {
                        result.push_note(format!(
                            "{} has no super-reduced rate; the standard rate applies.",
                            country
                        ));
                        rates.standard
                    }
                },
            };
            vat_lines(
                result,
                price,
                rate,
                format!("{} rate in {}", input.rate.name(), country),
            )
        }
        Jurisdiction::Us { state } => {
            let (state, rates) = tables.vat.us.resolve(state, TaxType::Vat)?;
            let local_rate = match input.local_rate {
                Some(rate) => checked_percentage("local_rate", rate)?,
                None => non_negative(rates.average_combined_rate - rates.state_rate),
            };
            let combined = rates.state_rate + local_rate;
            let state_tax = percent_of(price, rates.state_rate);
            let local_tax = percent_of(price, local_rate);
            let total_tax = state_tax + local_tax;

            let mut result = CalculationResult::new(TaxType::Vat, Region::Us).for_sub_region(state.name());
            result.push_line(LineItem::currency("Price (before tax)", price));
            result.push_line(
                LineItem::currency("State Sales Tax", state_tax)
                    .describe(format!("{}% state rate", rates.state_rate.normalize())),
            );
            let local_description = if input.local_rate.is_some() {
                format!("{}% custom local rate", local_rate.normalize())
            } else {
                format!("{}% average local rate", local_rate.normalize())
            };
            result.push_line(LineItem::currency("Local Sales Tax", local_tax).describe(local_description));
            result.push_line(
                LineItem::currency("Total Sales Tax", total_tax)
                    .describe(format!("Combined rate: {}%", combined.normalize())),
            );
            result.push_line(LineItem::currency("Total Price (inc tax)", price + total_tax).total());
            result.tax = total_tax;
            result.effective_rate = combined;
            result.push_audit(
                "us_sales_tax",
                "US Sales Tax",
                serde_json::json!({
                    "price": price.to_string(),
                    "state": state,
                    "local_rate": input.local_rate.map(|r| r.to_string()),
                }),
                serde_json::json!({
                    "state_tax": state_tax.to_string(),
                    "local_tax": local_tax.to_string(),
                }),
                format!("State rate {}% plus local rate {}%", rates.state_rate, local_rate),
            );
            result
        }
    };

    debug!(region = %region, price = %price, tax = %result.tax, "Calculated VAT");
    Ok(result)
}

fn vat_lines(
    mut result: CalculationResult,
    price: Decimal,
    rate: Decimal,
    description: String,
) -> CalculationResult {
    let vat = percent_of(price, rate);
    result.push_line(LineItem::currency("Price (ex VAT)", price));
    result.push_line(LineItem::percent("VAT Rate", rate).describe(description.clone()));
    result.push_line(LineItem::currency("VAT Amount", vat));
    result.push_line(LineItem::currency("Total Price (inc VAT)", price + vat).total());
    result.tax = vat;
    result.effective_rate = rate;
    result.push_audit(
        "vat",
        "VAT",
        serde_json::json!({ "price": price.to_string(), "rate": rate.to_string() }),
        serde_json::json!({ "vat": vat.to_string() }),
        format!("Applied the {} of {}%", description, rate.normalize()),
    );
    result
}
