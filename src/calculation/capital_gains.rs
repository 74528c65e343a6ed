//! Capital gains tax.
//!
//! Losses short-circuit to a single line with no tax. Otherwise:
//! - UK: the annual exempt amount is subtracted, then one flat rate
//!   chosen by taxpayer band and asset type.
//! - EU: the country's allowance is subtracted, then its flat rate or
//!   progressive table.
//! - US: long-term gains use the long-term table for the filing status;
//!   short-term gains are taxed as ordinary income with the federal
//!   income tax table.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::TaxTables;
use crate::error::EngineResult;
use crate::models::{CalculationResult, FilingStatus, Jurisdiction, LineItem, Region, TaxType};

use super::common::{checked_input, effective_rate, non_negative, percent_of};
use super::progressive::{evaluate_brackets, evaluate_schedule};

/// Inputs to a capital gains calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapitalGainsInput {
    /// Where the gain is taxed.
    pub jurisdiction: Jurisdiction,
    /// What the asset cost.
    #[serde(default)]
    pub purchase_price: Option<Decimal>,
    /// What the asset sold for.
    #[serde(default)]
    pub sale_price: Option<Decimal>,
    /// UK: the asset is residential property.
    #[serde(default)]
    pub residential_property: bool,
    /// UK: the seller is a higher or additional rate taxpayer.
    #[serde(default)]
    pub higher_rate_taxpayer: bool,
    /// US: the asset was held for more than a year.
    #[serde(default = "default_long_term")]
    pub long_term: bool,
    /// US filing status.
    #[serde(default)]
    pub filing_status: FilingStatus,
}

fn default_long_term() -> bool {
    true
}

/// Calculates capital gains tax on the difference between sale and
/// purchase price. Both prices must be given for a result.
pub fn calculate_capital_gains(
    input: &CapitalGainsInput,
    tables: &TaxTables,
) -> EngineResult<CalculationResult> {
    let region = input.jurisdiction.region();
    let purchase = checked_input("purchase_price", input.purchase_price)?;
    let sale = checked_input("sale_price", input.sale_price)?;
    let (Some(purchase), Some(sale)) = (purchase, sale) else {
        return Ok(CalculationResult::empty(TaxType::CapitalGains, region));
    };

    let gain = sale - purchase;
    let mut result = CalculationResult::new(TaxType::CapitalGains, region);

    if gain <= Decimal::ZERO {
        // Resolve anyway so an unsupported country is still reported.
        if let Jurisdiction::Eu { country } = input.jurisdiction {
            let (country, _) = tables.capital_gains.eu.resolve(country, TaxType::CapitalGains)?;
            result = result.for_sub_region(country.name());
        }
        result.push_line(
            LineItem::currency("Total Gain/Loss", gain)
                .describe("No tax is due on capital losses.")
                .total(),
        );
        result.exemption = Some("No gain was made".to_string());
        return Ok(result);
    }

    match input.jurisdiction {
        Jurisdiction::Uk => {
            let uk = &tables.capital_gains.uk;
            let exemption = uk.annual_exempt_amount.min(gain);
            let taxable_gain = non_negative(gain - uk.annual_exempt_amount);
            let rate = match (input.higher_rate_taxpayer, input.residential_property) {
                (true, true) => uk.residential_higher_rate,
                (true, false) => uk.higher_rate,
                (false, true) => uk.residential_basic_rate,
                (false, false) => uk.basic_rate,
            };
            let tax = percent_of(taxable_gain, rate);

            let band = if input.higher_rate_taxpayer {
                "Higher/Additional"
            } else {
                "Basic"
            };
            let asset = if input.residential_property {
                " (Residential Property)"
            } else {
                ""
            };

            result.push_line(LineItem::currency("Total Gain", gain));
            result.push_line(LineItem::currency("Annual Exemption", exemption));
            result.push_line(LineItem::currency("Taxable Gain", taxable_gain));
            result.push_line(
                LineItem::percent("Tax Rate", rate)
                    .describe(format!("{} rate taxpayer{}", band, asset)),
            );
            result.push_line(LineItem::currency("Capital Gains Tax", tax).total());
            result.push_audit(
                "uk_capital_gains",
                "UK Capital Gains Tax",
                serde_json::json!({
                    "gain": gain.to_string(),
                    "annual_exempt_amount": uk.annual_exempt_amount.to_string(),
                    "higher_rate_taxpayer": input.higher_rate_taxpayer,
                    "residential_property": input.residential_property,
                }),
                serde_json::json!({
                    "taxable_gain": taxable_gain.to_string(),
                    "rate": rate.to_string(),
                    "tax": tax.to_string(),
                }),
                format!("{} exempt, remaining {} taxed at {}%", exemption, taxable_gain, rate),
            );
            result.tax = tax;
        }
        Jurisdiction::Eu { country } => {
            let (country, rules) = tables.capital_gains.eu.resolve(country, TaxType::CapitalGains)?;
            let taxable_gain = non_negative(gain - rules.allowance);
            let evaluation = evaluate_schedule(taxable_gain, &rules.schedule);

            result = result.for_sub_region(country.name());
            result.push_line(LineItem::currency("Total Gain", gain));
            result.push_line(LineItem::currency("Tax-Free Allowance", rules.allowance));
            result.push_line(LineItem::currency("Taxable Gain", taxable_gain));
            result.push_line(LineItem::currency("Capital Gains Tax", evaluation.tax).total());
            result.push_audit(
                "eu_capital_gains",
                &format!("{} Capital Gains Tax", country),
                serde_json::json!({
                    "gain": gain.to_string(),
                    "allowance": rules.allowance.to_string(),
                }),
                serde_json::json!({
                    "taxable_gain": taxable_gain.to_string(),
                    "tax": evaluation.tax.to_string(),
                }),
                format!("{} allowance deducted, {} schedule applied", rules.allowance, country),
            );
            result.tax = evaluation.tax;
            result.brackets = evaluation.slices;
        }
        Jurisdiction::Us { .. } => {
            let (table, holding) = if input.long_term {
                (
                    tables.capital_gains.us.long_term.get(input.filing_status),
                    "Long-term (over 1 year)",
                )
            } else {
                (
                    tables.income_tax.us.federal.get(input.filing_status),
                    "Short-term (1 year or less), taxed as ordinary income",
                )
            };
            let evaluation = evaluate_brackets(gain, table);

            result.push_line(LineItem::currency("Total Gain", gain).describe(holding));
            result.push_line(
                LineItem::currency("Capital Gains Tax", evaluation.tax)
                    .describe(format!("{} filing status", input.filing_status))
                    .total(),
            );
            result.push_audit(
                "us_capital_gains",
                "US Capital Gains Tax",
                serde_json::json!({
                    "gain": gain.to_string(),
                    "long_term": input.long_term,
                    "filing_status": input.filing_status,
                }),
                serde_json::json!({ "tax": evaluation.tax.to_string() }),
                format!("{} gain taxed with the {} table", holding, input.filing_status),
            );
            result.tax = evaluation.tax;
            result.brackets = evaluation.slices;
        }
    }

    result.effective_rate = effective_rate(result.tax, gain);
    if region == Region::Us {
        result.push_note("State capital gains taxes are not included.");
    }

    debug!(region = %region, gain = %gain, tax = %result.tax, "Calculated capital gains tax");
    Ok(result)
}
