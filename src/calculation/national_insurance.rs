//! National insurance and social security contributions.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{Contribution, TaxTables, UkNationalInsurance, UsFica};
use crate::error::EngineResult;
use crate::models::{CalculationResult, Jurisdiction, LineItem, TaxType};

use super::common::{checked_input, effective_rate, non_negative, percent_of};
use super::progressive::{BracketEvaluation, evaluate_brackets};

/// How the earner works.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmploymentType {
    /// An employee.
    #[default]
    Employed,
    /// Self-employed.
    SelfEmployed,
}

/// Inputs to a national insurance calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NationalInsuranceInput {
    /// Where the contributions are due.
    pub jurisdiction: Jurisdiction,
    /// Annual earnings (or profits, when self-employed).
    #[serde(default)]
    pub income: Option<Decimal>,
    /// UK: employed or self-employed.
    #[serde(default)]
    pub employment: EmploymentType,
}

/// Calculates national insurance (UK), employee social security (EU) or
/// FICA (US).
pub fn calculate_national_insurance(
    input: &NationalInsuranceInput,
    tables: &TaxTables,
) -> EngineResult<CalculationResult> {
    let region = input.jurisdiction.region();
    let Some(income) = checked_input("income", input.income)? else {
        return Ok(CalculationResult::empty(TaxType::NationalInsurance, region));
    };
    let income = non_negative(income);

    let mut result = CalculationResult::new(TaxType::NationalInsurance, region);
    result.push_line(LineItem::currency("Gross Annual Income", income));

    let after_label = match input.jurisdiction {
        Jurisdiction::Uk => {
            let uk = &tables.national_insurance.uk;
            match input.employment {
                EmploymentType::Employed => uk_employed(&mut result, uk, income),
                EmploymentType::SelfEmployed => uk_self_employed(&mut result, uk, income),
            }
            "Income After NICs"
        }
        Jurisdiction::Eu { country } => {
            let (country, contributions) =
                tables.national_insurance.eu.resolve(country, TaxType::NationalInsurance)?;
            result = result.for_sub_region(country.name());
            eu_contributions(&mut result, contributions, income);
            "Income After Social Security"
        }
        Jurisdiction::Us { .. } => {
            us_fica(&mut result, &tables.national_insurance.us, income);
            "Income After FICA Taxes"
        }
    };

    result.push_line(LineItem::currency(after_label, income - result.tax).total());
    result.effective_rate = effective_rate(result.tax, income);

    debug!(
        region = %region,
        employment = ?input.employment,
        income = %income,
        contributions = %result.tax,
        "Calculated national insurance"
    );
    Ok(result)
}

/// Class 1 employee contributions.
fn uk_employed(result: &mut CalculationResult, uk: &UkNationalInsurance, income: Decimal) {
    let evaluation = evaluate_brackets(income, &uk.class1);
    result.push_line(
        LineItem::currency("National Insurance Contributions", evaluation.tax)
            .describe("Class 1 employee contributions"),
    );
    result.push_audit(
        "uk_class1_nic",
        "UK Class 1 National Insurance",
        serde_json::json!({ "earnings": income.to_string() }),
        serde_json::json!({ "contributions": evaluation.tax.to_string() }),
        "Class 1 bands applied to annual earnings",
    );
    result.tax = evaluation.tax;
    result.brackets = evaluation.slices;
}

/// Class 2 (flat weekly above the small profits threshold) and class 4
/// contributions on self-employed profits.
pub(super) fn class2_and_class4(
    uk: &UkNationalInsurance,
    profits: Decimal,
) -> (Decimal, BracketEvaluation) {
    let class2 = if profits > uk.small_profits_threshold {
        uk.class2_weekly_rate * uk.class2_weeks
    } else {
        Decimal::ZERO
    };
    (class2, evaluate_brackets(profits, &uk.class4))
}

fn uk_self_employed(result: &mut CalculationResult, uk: &UkNationalInsurance, profits: Decimal) {
    let (class2, class4) = class2_and_class4(uk, profits);
    let total = class2 + class4.tax;

    result.push_line(LineItem::currency("Class 2 NICs", class2).describe(format!(
        "{} per week for {} weeks",
        uk.class2_weekly_rate, uk.class2_weeks
    )));
    result.push_line(
        LineItem::currency("Class 4 NICs", class4.tax).describe("Percentage of profits"),
    );
    result.push_line(LineItem::currency("Total National Insurance", total));
    result.push_audit(
        "uk_class2_nic",
        "UK Class 2 National Insurance",
        serde_json::json!({
            "profits": profits.to_string(),
            "small_profits_threshold": uk.small_profits_threshold.to_string(),
        }),
        serde_json::json!({ "contributions": class2.to_string() }),
        if class2 > Decimal::ZERO {
            "Profits above the small profits threshold: class 2 due"
        } else {
            "Profits at or below the small profits threshold: no class 2"
        },
    );
    result.push_audit(
        "uk_class4_nic",
        "UK Class 4 National Insurance",
        serde_json::json!({ "profits": profits.to_string() }),
        serde_json::json!({ "contributions": class4.tax.to_string() }),
        "Class 4 bands applied to profits",
    );
    result.tax = total;
    result.brackets = class4.slices;
}

/// One line per contribution, each charged on earnings up to its ceiling.
fn eu_contributions(result: &mut CalculationResult, contributions: &[Contribution], income: Decimal) {
    let mut total = Decimal::ZERO;
    for contribution in contributions {
        let base = match contribution.ceiling {
            Some(ceiling) => income.min(ceiling),
            None => income,
        };
        let amount = percent_of(base, contribution.rate);
        total += amount;

        let description = match contribution.ceiling {
            Some(ceiling) => format!("{}% up to {}", contribution.rate.normalize(), ceiling),
            None => format!("{}% of earnings", contribution.rate.normalize()),
        };
        result.push_line(LineItem::currency(contribution.label.clone(), amount).describe(description));
    }
    result.push_line(LineItem::currency("Total Social Security Contributions", total));
    result.push_audit(
        "eu_social_security",
        "EU Social Security",
        serde_json::json!({ "earnings": income.to_string(), "lines": contributions.len() }),
        serde_json::json!({ "contributions": total.to_string() }),
        format!("{} contribution lines applied with their ceilings", contributions.len()),
    );
    result.tax = total;
}

/// Social security up to the wage base, Medicare on everything, and
/// additional Medicare above its threshold.
fn us_fica(result: &mut CalculationResult, fica: &UsFica, wages: Decimal) {
    let social_security = percent_of(wages.min(fica.wage_base), fica.social_security_rate);
    let medicare = percent_of(wages, fica.medicare_rate);
    let additional_medicare = percent_of(
        non_negative(wages - fica.additional_medicare_threshold),
        fica.additional_medicare_rate,
    );
    let total = social_security + medicare + additional_medicare;

    result.push_line(LineItem::currency("Social Security Tax", social_security).describe(format!(
        "{}% up to {}",
        fica.social_security_rate.normalize(),
        fica.wage_base
    )));
    result.push_line(
        LineItem::currency("Medicare Tax", medicare)
            .describe(format!("{}% of all wages", fica.medicare_rate.normalize())),
    );
    if additional_medicare > Decimal::ZERO {
        result.push_line(
            LineItem::currency("Additional Medicare Tax", additional_medicare).describe(format!(
                "{}% above {}",
                fica.additional_medicare_rate.normalize(),
                fica.additional_medicare_threshold
            )),
        );
    }
    result.push_line(LineItem::currency("Total FICA Taxes", total));
    result.push_audit(
        "us_fica",
        "US FICA",
        serde_json::json!({ "wages": wages.to_string() }),
        serde_json::json!({
            "social_security": social_security.to_string(),
            "medicare": medicare.to_string(),
            "additional_medicare": additional_medicare.to_string(),
        }),
        "Social security capped at the wage base; Medicare uncapped",
    );
    result.tax = total;
}
