//! Income tax.
//!
//! - UK: the personal allowance is the 0% first band of the table.
//! - EU: one table per country.
//! - US: federal tax by filing status plus state tax. States without an
//!   income tax have an empty table and contribute zero.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::TaxTables;
use crate::error::EngineResult;
use crate::models::{
    BracketSlice, BracketTable, CalculationResult, FilingStatus, Jurisdiction, LineItem, Region,
    TaxType, UsState,
};

use super::common::{checked_input, effective_rate};
use super::progressive::{evaluate_brackets, marginal_rate};

/// Inputs to an income tax calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncomeTaxInput {
    /// Where the income is taxed.
    pub jurisdiction: Jurisdiction,
    /// Gross annual income. `None` means nothing was entered.
    #[serde(default)]
    pub income: Option<Decimal>,
    /// US filing status; ignored elsewhere.
    #[serde(default)]
    pub filing_status: FilingStatus,
}

/// Calculates income tax.
///
/// # Returns
///
/// A result with the income, the tax (split into federal and state tax
/// for the US), the net income and the effective rate. Fails with
/// `UnsupportedRegion` if the requested country or state has no table,
/// or `InvalidInput` if the income is out of range.
///
/// # Example
///
/// ```
/// use tax_engine::calculation::{calculate_income_tax, IncomeTaxInput};
/// use tax_engine::config::ConfigLoader;
/// use tax_engine::models::{FilingStatus, Jurisdiction};
/// use rust_decimal::Decimal;
///
/// let loader = ConfigLoader::builtin().unwrap();
/// let input = IncomeTaxInput {
///     jurisdiction: Jurisdiction::Uk,
///     income: Some(Decimal::from(60000)),
///     filing_status: FilingStatus::Single,
/// };
/// let result = calculate_income_tax(&input, loader.tables()).unwrap();
/// assert_eq!(result.tax, Decimal::from(11432));
/// ```
pub fn calculate_income_tax(
    input: &IncomeTaxInput,
    tables: &TaxTables,
) -> EngineResult<CalculationResult> {
    let region = input.jurisdiction.region();
    let Some(income) = checked_input("income", input.income)? else {
        return Ok(CalculationResult::empty(TaxType::IncomeTax, region));
    };

    let result = match input.jurisdiction {
        Jurisdiction::Uk => single_table_result(
            income,
            &tables.income_tax.uk,
            CalculationResult::new(TaxType::IncomeTax, region),
            "uk_income_tax",
            "UK Income Tax",
        ),
        Jurisdiction::Eu { country } => {
            let (country, table) = tables.income_tax.eu.resolve(country, TaxType::IncomeTax)?;
            single_table_result(
                income,
                table,
                CalculationResult::new(TaxType::IncomeTax, region).for_sub_region(country.name()),
                "eu_income_tax",
                &format!("{} Income Tax", country),
            )
        }
        Jurisdiction::Us { state } => us_income_tax(income, state, input.filing_status, tables)?,
    };

    debug!(
        region = %region,
        sub_region = ?result.sub_region,
        income = %income,
        tax = %result.tax,
        "Calculated income tax"
    );

    Ok(result)
}

fn single_table_result(
    income: Decimal,
    table: &BracketTable,
    mut result: CalculationResult,
    rule_id: &str,
    rule_name: &str,
) -> CalculationResult {
    let evaluation = evaluate_brackets(income, table);
    let tax = evaluation.tax;

    result.push_line(LineItem::currency("Total Income", income));
    result.push_line(LineItem::currency("Income Tax", tax).describe(format!(
        "Marginal rate {}%",
        marginal_rate(income, table).normalize()
    )));
    result.push_line(LineItem::currency("Net Income", income - tax).total());

    result.tax = tax;
    result.effective_rate = effective_rate(tax, income);
    result.push_audit(
        rule_id,
        rule_name,
        serde_json::json!({ "income": income.to_string() }),
        serde_json::json!({
            "tax": tax.to_string(),
            "brackets_reached": evaluation.slices.len()
        }),
        format!("Applied {} bands to {}: tax {}", table.len(), income, tax),
    );
    result.brackets = evaluation.slices;
    result
}

fn us_income_tax(
    income: Decimal,
    state: Option<UsState>,
    filing_status: FilingStatus,
    tables: &TaxTables,
) -> EngineResult<CalculationResult> {
    let us = &tables.income_tax.us;
    let (state, state_table) = us.states.resolve(state, TaxType::IncomeTax)?;
    let federal_table = us.federal.get(filing_status);

    let federal = evaluate_brackets(income, federal_table);
    let state_eval = evaluate_brackets(income, state_table);
    let total = federal.tax + state_eval.tax;

    let mut result =
        CalculationResult::new(TaxType::IncomeTax, Region::Us).for_sub_region(state.name());

    result.push_line(LineItem::currency("Total Income", income));
    result.push_line(
        LineItem::currency("Federal Income Tax", federal.tax)
            .describe(format!("{} filing status", filing_status)),
    );
    let state_line = LineItem::currency("State Income Tax", state_eval.tax);
    if state_table.is_empty() {
        result.push_line(state_line.describe(format!("{} has no state income tax", state)));
        result.push_note(format!("{} does not levy a state income tax.", state));
    } else {
        result.push_line(state_line.describe(format!("{} state tax", state)));
    }
    result.push_line(LineItem::currency("Total Tax", total));
    result.push_line(LineItem::currency("Net Income", income - total).total());

    result.push_audit(
        "us_federal_income_tax",
        "US Federal Income Tax",
        serde_json::json!({
            "income": income.to_string(),
            "filing_status": filing_status,
        }),
        serde_json::json!({ "tax": federal.tax.to_string() }),
        format!("Federal brackets for {} applied to {}", filing_status, income),
    );
    result.push_audit(
        "us_state_income_tax",
        "US State Income Tax",
        serde_json::json!({ "income": income.to_string(), "state": state }),
        serde_json::json!({ "tax": state_eval.tax.to_string() }),
        if state_table.is_empty() {
            format!("{} has an empty table: no state income tax", state)
        } else {
            format!("{} state brackets applied to {}", state, income)
        },
    );

    result.tax = total;
    result.effective_rate = effective_rate(total, income);
    result.brackets = prefixed("Federal", federal.slices)
        .chain(prefixed(state.name(), state_eval.slices))
        .collect();
    Ok(result)
}

fn prefixed(prefix: &str, slices: Vec<BracketSlice>) -> impl Iterator<Item = BracketSlice> + '_ {
    slices.into_iter().map(move |mut slice| {
        slice.name = format!("{} {}", prefix, slice.name);
        slice
    })
}
