//! Dividend tax.
//!
//! The UK dividend allowance and the US 0% qualified band are the first
//! brackets of their tables. EU countries withhold a flat rate.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::TaxTables;
use crate::error::EngineResult;
use crate::models::{CalculationResult, FilingStatus, Jurisdiction, LineItem, RateSchedule, TaxType};

use super::common::{checked_input, effective_rate, non_negative};
use super::progressive::{evaluate_brackets, evaluate_schedule};

/// Inputs to a dividend tax calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DividendInput {
    /// Where the dividends are taxed.
    pub jurisdiction: Jurisdiction,
    /// Dividend income for the year.
    #[serde(default)]
    pub dividends: Option<Decimal>,
    /// US filing status.
    #[serde(default)]
    pub filing_status: FilingStatus,
}

/// Calculates tax on dividend income.
pub fn calculate_dividend_tax(
    input: &DividendInput,
    tables: &TaxTables,
) -> EngineResult<CalculationResult> {
    let region = input.jurisdiction.region();
    let Some(dividends) = checked_input("dividends", input.dividends)? else {
        return Ok(CalculationResult::empty(TaxType::DividendTax, region));
    };
    let dividends = non_negative(dividends);

    let mut result = CalculationResult::new(TaxType::DividendTax, region);
    let (evaluation, rule_id, basis) = match input.jurisdiction {
        Jurisdiction::Uk => (
            evaluate_brackets(dividends, &tables.dividend_tax.uk),
            "uk_dividend_tax",
            "UK dividend bands".to_string(),
        ),
        Jurisdiction::Eu { country } => {
            let (country, rate) = tables.dividend_tax.eu.resolve(country, TaxType::DividendTax)?;
            result = result.for_sub_region(country.name());
            (
                evaluate_schedule(dividends, &RateSchedule::Flat { rate: *rate }),
                "eu_dividend_tax",
                format!("{} flat withholding rate of {}%", country, rate.normalize()),
            )
        }
        Jurisdiction::Us { .. } => {
            result.push_note(
                "Rates are for qualified dividends. Ordinary dividends are taxed as income.",
            );
            (
                evaluate_brackets(dividends, tables.dividend_tax.us.get(input.filing_status)),
                "us_dividend_tax",
                format!("qualified dividend brackets for {}", input.filing_status),
            )
        }
    };

    let tax = evaluation.tax;
    result.push_line(LineItem::currency("Dividend Income", dividends));
    result.push_line(LineItem::currency("Dividend Tax", tax).describe(format!("Using the {}", basis)));
    result.push_line(LineItem::currency("Net Dividends", dividends - tax).total());
    result.push_audit(
        rule_id,
        "Dividend Tax",
        serde_json::json!({ "dividends": dividends.to_string() }),
        serde_json::json!({ "tax": tax.to_string() }),
        format!("Applied the {}", basis),
    );
    result.tax = tax;
    result.effective_rate = effective_rate(tax, dividends);
    result.brackets = evaluation.slices;

    debug!(region = %region, dividends = %dividends, tax = %tax, "Calculated dividend tax");
    Ok(result)
}
