//! Income tax and contributions for the self-employed.
//!
//! Profit is turnover less expenses and any further deductions, floored at
//! zero. The tax on it depends on the region:
//! - UK: income tax bands plus class 2 and class 4 national insurance;
//! - US: self-employment tax, half of which is deductible before federal
//!   income tax;
//! - EU: the country's income tax brackets plus a social security
//!   percentage, capped in some countries.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{EuSoleTrader, TaxTables};
use crate::error::EngineResult;
use crate::models::{CalculationResult, FilingStatus, Jurisdiction, LineItem, TaxType};

use super::common::{checked_amount, checked_input, effective_rate, non_negative, percent_of};
use super::national_insurance::class2_and_class4;
use super::progressive::evaluate_brackets;

/// Inputs to a sole trader calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoleTraderInput {
    /// Where the business is taxed.
    pub jurisdiction: Jurisdiction,
    /// Business turnover for the year.
    #[serde(default)]
    pub turnover: Option<Decimal>,
    /// Itemised business expenses.
    #[serde(default)]
    pub expenses: Decimal,
    /// Allowances and reliefs deducted after expenses.
    #[serde(default)]
    pub additional_deductions: Decimal,
    /// UK: claim a flat percentage of turnover instead of itemised expenses.
    #[serde(default)]
    pub simplified_expenses: bool,
    /// US filing status.
    #[serde(default)]
    pub filing_status: FilingStatus,
}

/// Calculates income tax and contributions on self-employed profit.
///
/// The effective rate is the total tax as a percentage of net profit.
pub fn calculate_sole_trader_tax(
    input: &SoleTraderInput,
    tables: &TaxTables,
) -> EngineResult<CalculationResult> {
    let region = input.jurisdiction.region();
    let Some(turnover) = checked_input("turnover", input.turnover)? else {
        return Ok(CalculationResult::empty(TaxType::SoleTrader, region));
    };
    let turnover = non_negative(turnover);
    let deductions = non_negative(checked_amount("additional_deductions", input.additional_deductions)?);

    let simplified = input.simplified_expenses && matches!(input.jurisdiction, Jurisdiction::Uk);
    let expenses = if simplified {
        percent_of(turnover, tables.sole_trader.uk.simplified_expense_rate)
    } else {
        non_negative(checked_amount("expenses", input.expenses)?)
    };
    let profit = non_negative(turnover - expenses - deductions);

    let mut result = CalculationResult::new(TaxType::SoleTrader, region);
    result.push_line(LineItem::currency("Business Income", turnover).describe("Total business turnover"));
    result.push_line(LineItem::currency("Business Expenses", -expenses).describe(if simplified {
        format!(
            "Simplified expenses ({}% of turnover)",
            tables.sole_trader.uk.simplified_expense_rate.normalize()
        )
    } else {
        "Itemised business expenses".to_string()
    }));
    if deductions > Decimal::ZERO {
        result.push_line(
            LineItem::currency("Additional Deductions", -deductions).describe("Tax allowances and reliefs"),
        );
    }
    result.push_line(
        LineItem::currency("Net Profit", profit).describe("Taxable profit after expenses and deductions"),
    );

    match input.jurisdiction {
        Jurisdiction::Uk => uk_sole_trader(&mut result, tables, profit),
        Jurisdiction::Us { .. } => us_sole_trader(&mut result, tables, profit, input.filing_status),
        Jurisdiction::Eu { country } => {
            let (country, rules) = tables.sole_trader.eu.resolve(country, TaxType::SoleTrader)?;
            result = result.for_sub_region(country.name());
            eu_sole_trader(&mut result, rules, profit, country.name());
        }
    }

    result.push_line(LineItem::currency("Total Tax", result.tax));
    result.push_line(LineItem::currency("Take-Home Pay", profit - result.tax).total());
    result.effective_rate = effective_rate(result.tax, profit);

    debug!(region = %region, profit = %profit, tax = %result.tax, "Calculated sole trader tax");
    Ok(result)
}

fn uk_sole_trader(result: &mut CalculationResult, tables: &TaxTables, profit: Decimal) {
    let income_tax = evaluate_brackets(profit, &tables.income_tax.uk);
    let uk_nic = &tables.national_insurance.uk;
    let (class2, class4) = class2_and_class4(uk_nic, profit);

    result.push_line(
        LineItem::currency("Income Tax", income_tax.tax).describe("Personal income tax on profits"),
    );
    if class2 > Decimal::ZERO {
        result.push_line(LineItem::currency("Class 2 NI", class2).describe(format!(
            "Fixed rate of {} per week",
            uk_nic.class2_weekly_rate
        )));
    }
    if class4.tax > Decimal::ZERO {
        result.push_line(LineItem::currency("Class 4 NI", class4.tax).describe("Percentage of profits"));
    }
    result.push_audit(
        "uk_sole_trader",
        "UK Sole Trader Tax",
        serde_json::json!({ "profit": profit.to_string() }),
        serde_json::json!({
            "income_tax": income_tax.tax.to_string(),
            "class2": class2.to_string(),
            "class4": class4.tax.to_string(),
        }),
        "Income tax bands plus class 2 and class 4 contributions on profit",
    );
    result.tax = income_tax.tax + class2 + class4.tax;
    result.brackets = income_tax.slices;
}

fn us_sole_trader(
    result: &mut CalculationResult,
    tables: &TaxTables,
    profit: Decimal,
    filing_status: FilingStatus,
) {
    let se = &tables.sole_trader.us;
    let social_security = percent_of(profit.min(se.wage_base), se.social_security_rate);
    let medicare = percent_of(profit, se.medicare_rate);
    let se_tax = social_security + medicare;
    let deduction = percent_of(se_tax, se.deductible_share);
    let taxable = non_negative(profit - deduction);
    let income_tax = evaluate_brackets(taxable, tables.income_tax.us.federal.get(filing_status));

    result.push_line(LineItem::currency("SE Tax Deduction", -deduction).describe(format!(
        "{}% of self-employment tax is deductible",
        se.deductible_share.normalize()
    )));
    result.push_line(
        LineItem::currency("Federal Income Tax", income_tax.tax)
            .describe(format!("Based on {} filing status", filing_status)),
    );
    result.push_line(LineItem::currency("Social Security Tax", social_security).describe(format!(
        "{}% up to {}",
        se.social_security_rate.normalize(),
        se.wage_base
    )));
    result.push_line(
        LineItem::currency("Medicare Tax", medicare)
            .describe(format!("{}% on all net earnings", se.medicare_rate.normalize())),
    );
    result.push_audit(
        "us_self_employment_tax",
        "US Self-Employment Tax",
        serde_json::json!({ "profit": profit.to_string() }),
        serde_json::json!({
            "social_security": social_security.to_string(),
            "medicare": medicare.to_string(),
            "deduction": deduction.to_string(),
        }),
        "Social security capped at the wage base; Medicare uncapped",
    );
    result.push_audit(
        "us_federal_income_tax",
        "US Federal Income Tax",
        serde_json::json!({
            "taxable_income": taxable.to_string(),
            "filing_status": filing_status,
        }),
        serde_json::json!({ "tax": income_tax.tax.to_string() }),
        format!("Federal brackets for {} after the self-employment tax deduction", filing_status),
    );
    result.tax = income_tax.tax + se_tax;
    result.brackets = income_tax.slices;
}

fn eu_sole_trader(result: &mut CalculationResult, rules: &EuSoleTrader, profit: Decimal, country: &str) {
    let income_tax = evaluate_brackets(profit, &rules.income_tax);
    let uncapped = percent_of(profit, rules.social_security_rate);
    let social_security = match rules.social_security_cap {
        Some(cap) => uncapped.min(cap),
        None => uncapped,
    };

    result.push_line(
        LineItem::currency("Income Tax", income_tax.tax).describe(format!("{} income tax brackets", country)),
    );
    let description = if social_security < uncapped {
        format!("{}% of profit, capped at {}", rules.social_security_rate.normalize(), social_security)
    } else {
        format!("{}% of profit", rules.social_security_rate.normalize())
    };
    result.push_line(LineItem::currency("Social Security", social_security).describe(description));
    if let Some(note) = &rules.note {
        result.push_note(note.clone());
    }
    result.push_audit(
        "eu_sole_trader",
        &format!("{} Sole Trader Tax", country),
        serde_json::json!({ "profit": profit.to_string() }),
        serde_json::json!({
            "income_tax": income_tax.tax.to_string(),
            "social_security": social_security.to_string(),
        }),
        format!("{} brackets plus social security on profit", country),
    );
    result.tax = income_tax.tax + social_security;
    result.brackets = income_tax.slices;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigLoader;
    use crate::models::EuCountry;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn tables() -> TaxTables {
        ConfigLoader::builtin().unwrap().tables().clone()
    }

    fn input(jurisdiction: Jurisdiction, turnover: &str, expenses: &str) -> SoleTraderInput {
        SoleTraderInput {
            jurisdiction,
            turnover: Some(dec(turnover)),
            expenses: dec(expenses),
            additional_deductions: Decimal::ZERO,
            simplified_expenses: false,
            filing_status: FilingStatus::Single,
        }
    }

    #[test]
    fn test_uk_income_tax_and_contributions() {
        let result = calculate_sole_trader_tax(&input(Jurisdiction::Uk, "50000", "10000"), &tables()).unwrap();
        assert_eq!(result.line("Net Profit").unwrap().value, dec("40000"));
        assert_eq!(result.line("Income Tax").unwrap().value, dec("5486"));
        assert_eq!(result.line("Class 2 NI").unwrap().value, dec("179.4"));
        assert_eq!(result.line("Class 4 NI").unwrap().value, dec("2468.7"));
        assert_eq!(result.tax, dec("8134.1"));
        assert_eq!(result.line("Take-Home Pay").unwrap().value, dec("31865.9"));
    }

    #[test]
    fn test_uk_simplified_expenses() {
        let mut request = input(Jurisdiction::Uk, "50000", "30000");
        request.simplified_expenses = true;
        let result = calculate_sole_trader_tax(&request, &tables()).unwrap();
        assert_eq!(result.line("Business Expenses").unwrap().value, dec("-10000"));
        assert_eq!(result.line("Net Profit").unwrap().value, dec("40000"));
    }

    #[test]
    fn test_profit_floored_at_zero() {
        let result = calculate_sole_trader_tax(&input(Jurisdiction::Uk, "5000", "8000"), &tables()).unwrap();
        assert_eq!(result.line("Net Profit").unwrap().value, Decimal::ZERO);
        assert_eq!(result.tax, Decimal::ZERO);
        assert_eq!(result.effective_rate, Decimal::ZERO);
    }

    #[test]
    fn test_us_self_employment_then_federal() {
        let result = calculate_sole_trader_tax(
            &input(Jurisdiction::Us { state: None }, "60000", "10000"),
            &tables(),
        )
        .unwrap();
        assert_eq!(result.line("Social Security Tax").unwrap().value, dec("6200"));
        assert_eq!(result.line("Medicare Tax").unwrap().value, dec("1450"));
        assert_eq!(result.line("SE Tax Deduction").unwrap().value, dec("-3825"));
        assert_eq!(result.line("Federal Income Tax").unwrap().value, dec("5309"));
        assert_eq!(result.tax, dec("12959"));
        assert_eq!(result.audit.len(), 2);
    }

    #[test]
    fn test_eu_social_security_cap_and_note() {
        let result = calculate_sole_trader_tax(
            &input(Jurisdiction::Eu { country: Some(EuCountry::Spain) }, "60000", "10000"),
            &tables(),
        )
        .unwrap();
        assert_eq!(result.line("Income Tax").unwrap().value, dec("14201.5"));
        assert_eq!(result.line("Social Security").unwrap().value, dec("3000"));
        assert_eq!(result.tax, dec("17201.5"));
        assert_eq!(result.notes.len(), 1);
    }

    #[test]
    fn test_missing_turnover_is_empty() {
        let mut request = input(Jurisdiction::Uk, "0", "0");
        request.turnover = None;
        assert!(calculate_sole_trader_tax(&request, &tables()).unwrap().is_empty());
    }
}
