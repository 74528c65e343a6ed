//! Capital gains tax on the sale of a business.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{IncomeLevelRates, TaxTables};
use crate::error::EngineResult;
use crate::models::{CalculationResult, IncomeLevel, Jurisdiction, LineItem, TaxType};

use super::common::{checked_amount, checked_input, effective_rate, non_negative, percent_of};

/// Inputs to a business sale calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusinessSaleInput {
    /// Where the gain is taxed.
    pub jurisdiction: Jurisdiction,
    /// Proceeds of the sale.
    #[serde(default)]
    pub sale_proceeds: Option<Decimal>,
    /// What the business cost to acquire.
    #[serde(default)]
    pub acquisition_cost: Decimal,
    /// Fees and other allowable costs of the sale.
    #[serde(default)]
    pub additional_costs: Decimal,
    /// How long the seller owned the business.
    #[serde(default)]
    pub years_owned: Decimal,
    /// UK: claim Business Asset Disposal Relief. EU: claim the country's relief.
    #[serde(default)]
    pub qualifies_for_relief: bool,
    /// UK: the seller pays income tax at the higher rate.
    #[serde(default)]
    pub higher_rate_taxpayer: bool,
    /// UK: the annual exempt amount has already been used this year.
    #[serde(default)]
    pub annual_exemption_used: bool,
    /// UK: gains already taxed at the relief rate in earlier disposals.
    #[serde(default)]
    pub prior_relief_used: Decimal,
    /// US: the shares are qualified small business stock.
    #[serde(default)]
    pub qualified_small_business_stock: bool,
    /// US: the seller's income level, which selects the long-term rate.
    #[serde(default)]
    pub income_level: IncomeLevel,
}

/// Calculates capital gains tax on a business sale.
///
/// # UK rules
///
/// The annual exempt amount comes off the gain unless it has already been
/// used. With Business Asset Disposal Relief, gains up to the remaining
/// lifetime limit are taxed at the relief rate and the excess at the
/// seller's standard rate. The effective rate is blended over the taxable
/// gain:
///
/// ```text
/// gain 1,500,000, limit 1,000,000 at 10%, excess at 20%
/// tax  = 100,000 + 100,000 = 200,000
/// rate = 200,000 / 1,500,000 = 13.33%
/// ```
pub fn calculate_business_sale_tax(
    input: &BusinessSaleInput,
    tables: &TaxTables,
) -> EngineResult<CalculationResult> {
    let region = input.jurisdiction.region();
    let Some(proceeds) = checked_input("sale_proceeds", input.sale_proceeds)? else {
        return Ok(CalculationResult::empty(TaxType::BusinessSale, region));
    };
    let proceeds = non_negative(proceeds);
    let cost = non_negative(checked_amount("acquisition_cost", input.acquisition_cost)?);
    let costs = non_negative(checked_amount("additional_costs", input.additional_costs)?);
    let years = non_negative(checked_amount("years_owned", input.years_owned)?);
    let gain = non_negative(proceeds - cost - costs);

    let mut result = CalculationResult::new(TaxType::BusinessSale, region);
    result.push_line(LineItem::currency("Sale Proceeds", proceeds));
    result.push_line(LineItem::currency("Acquisition Cost", -cost));
    if costs > Decimal::ZERO {
        result.push_line(LineItem::currency("Additional Costs", -costs).describe("Fees and allowable costs"));
    }
    result.push_line(LineItem::currency("Capital Gain", gain));

    match input.jurisdiction {
        Jurisdiction::Uk => uk_business_sale(&mut result, tables, input, gain, years)?,
        Jurisdiction::Us { .. } => us_business_sale(&mut result, tables, input, gain, years),
        Jurisdiction::Eu { country } => {
            let (country, rules) = tables.business_sale.eu.resolve(country, TaxType::BusinessSale)?;
            result = result.for_sub_region(country.name());

            let relief = rules.relief.as_ref().filter(|_| input.qualifies_for_relief);
            let (rate, basis) = match relief {
                Some(relief) => (relief.rate, format!("{} relief", relief.name)),
                None => (rules.basic_rate, format!("{} standard rate", country)),
            };
            let tax = percent_of(gain, rate);
            result.push_line(LineItem::percent("Tax Rate", rate).describe(basis.clone()));
            result.push_line(LineItem::currency("Capital Gains Tax", tax));
            if let Some(relief) = &rules.relief {
                result.push_note(format!("{}: {}", relief.name, relief.requirements));
            }
            if let Some(provisions) = &rules.provisions {
                result.push_note(provisions.clone());
            }
            result.push_audit(
                "eu_business_sale",
                &format!("{} Business Sale", country),
                serde_json::json!({
                    "gain": gain.to_string(),
                    "qualifies_for_relief": input.qualifies_for_relief,
                }),
                serde_json::json!({ "rate": rate.to_string(), "tax": tax.to_string() }),
                format!("{} of {}%", basis, rate.normalize()),
            );
            result.tax = tax;
            result.effective_rate = effective_rate(tax, gain);
        }
    }

    result.push_line(LineItem::currency("Net Proceeds", proceeds - result.tax).total());
    debug!(region = %region, gain = %gain, tax = %result.tax, "Calculated business sale tax");
    Ok(result)
}

fn uk_business_sale(
    result: &mut CalculationResult,
    tables: &TaxTables,
    input: &BusinessSaleInput,
    gain: Decimal,
    years: Decimal,
) -> EngineResult<()> {
    let uk = &tables.business_sale.uk;
    let prior_relief = non_negative(checked_amount("prior_relief_used", input.prior_relief_used)?);

    let exemption = if input.annual_exemption_used {
        Decimal::ZERO
    } else {
        gain.min(uk.annual_exempt_amount)
    };
    let taxable = gain - exemption;
    let standard_rate = if input.higher_rate_taxpayer {
        uk.higher_rate
    } else {
        uk.basic_rate
    };

    let relief_applies = input.qualifies_for_relief && years >= uk.relief_min_years;
    if input.qualifies_for_relief && !relief_applies {
        result.push_note(format!(
            "Business Asset Disposal Relief requires at least {} years of ownership.",
            uk.relief_min_years.normalize()
        ));
    }
    let relieved = if relief_applies {
        taxable.min(non_negative(uk.relief_lifetime_limit - prior_relief))
    } else {
        Decimal::ZERO
    };
    let excess = taxable - relieved;
    let relief_tax = percent_of(relieved, uk.relief_rate);
    let standard_tax = percent_of(excess, standard_rate);
    let tax = relief_tax + standard_tax;

    if exemption > Decimal::ZERO {
        result.push_line(LineItem::currency("Annual Exempt Amount", -exemption));
    } else if input.annual_exemption_used {
        result.push_note("The annual exempt amount has already been used this tax year.");
    }
    result.push_line(LineItem::currency("Taxable Gain", taxable));
    if relief_applies {
        result.push_line(LineItem::currency("Business Asset Disposal Relief", relief_tax).describe(
            format!("{}% on {}", uk.relief_rate.normalize(), relieved),
        ));
    }
    if excess > Decimal::ZERO || !relief_applies {
        result.push_line(
            LineItem::currency("Standard Rate Tax", standard_tax)
                .describe(format!("{}% on {}", standard_rate.normalize(), excess)),
        );
    }
    result.push_line(LineItem::currency("Capital Gains Tax", tax));
    result.push_audit(
        "uk_business_sale",
        "UK Business Sale",
        serde_json::json!({
            "gain": gain.to_string(),
            "years_owned": years.to_string(),
            "qualifies_for_relief": input.qualifies_for_relief,
            "prior_relief_used": prior_relief.to_string(),
        }),
        serde_json::json!({
            "exemption": exemption.to_string(),
            "relieved_gain": relieved.to_string(),
            "tax": tax.to_string(),
        }),
        if relief_applies {
            format!(
                "{} at the relief rate, {} at {}%",
                relieved,
                excess,
                standard_rate.normalize()
            )
        } else {
            format!("Taxable gain at {}%", standard_rate.normalize())
        },
    );
    result.tax = tax;
    result.effective_rate = effective_rate(tax, taxable);
    Ok(())
}

fn us_business_sale(
    result: &mut CalculationResult,
    tables: &TaxTables,
    input: &BusinessSaleInput,
    gain: Decimal,
    years: Decimal,
) {
    let us = &tables.business_sale.us;
    let long_term = years >= us.long_term_min_years;

    let (rate, taxable, basis) = if !long_term {
        (us.short_term_rate, gain, "Short-term gains are taxed as ordinary income".to_string())
    } else {
        let rate = long_term_rate(&us.long_term_rates, input.income_level);
        if input.qualified_small_business_stock && years >= us.qsbs_min_years {
            let excluded = percent_of(gain, us.qsbs_exclusion);
            result.push_line(LineItem::currency("QSBS Exclusion", -excluded).describe(format!(
                "{}% of the gain excluded",
                us.qsbs_exclusion.normalize()
            )));
            (rate, gain - excluded, "Long-term rate after the QSBS exclusion".to_string())
        } else {
            if input.qualified_small_business_stock {
                result.push_note(format!(
                    "The QSBS exclusion requires holding the stock for at least {} years.",
                    us.qsbs_min_years.normalize()
                ));
            }
            (rate, gain, "Long-term capital gains rate".to_string())
        }
    };
    let tax = percent_of(taxable, rate);

    result.push_line(LineItem::percent("Tax Rate", rate).describe(basis.clone()));
    result.push_line(LineItem::currency("Capital Gains Tax", tax));
    result.push_audit(
        "us_business_sale",
        "US Business Sale",
        serde_json::json!({
            "gain": gain.to_string(),
            "years_owned": years.to_string(),
            "income_level": input.income_level,
            "qualified_small_business_stock": input.qualified_small_business_stock,
        }),
        serde_json::json!({ "taxable_gain": taxable.to_string(), "tax": tax.to_string() }),
        basis,
    );
    result.tax = tax;
    result.effective_rate = effective_rate(tax, gain);
}

fn long_term_rate(rates: &IncomeLevelRates, level: IncomeLevel) -> Decimal {
    match level {
        IncomeLevel::Low => rates.low,
        IncomeLevel::Medium => rates.medium,
        IncomeLevel::High => rates.high,
    }
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

    fn input(jurisdiction: Jurisdiction, proceeds: &str, years: &str) -> BusinessSaleInput {
        BusinessSaleInput {
            jurisdiction,
            sale_proceeds: Some(dec(proceeds)),
            acquisition_cost: Decimal::ZERO,
            additional_costs: Decimal::ZERO,
            years_owned: dec(years),
            qualifies_for_relief: false,
            higher_rate_taxpayer: false,
            annual_exemption_used: false,
            prior_relief_used: Decimal::ZERO,
            qualified_small_business_stock: false,
            income_level: IncomeLevel::Medium,
        }
    }

    #[test]
    fn test_uk_relief_capped_at_lifetime_limit_blends_rate() {
        let mut request = input(Jurisdiction::Uk, "1500000", "5");
        request.qualifies_for_relief = true;
        request.higher_rate_taxpayer = true;
        request.annual_exemption_used = true;
        let result = calculate_business_sale_tax(&request, &tables()).unwrap();

        assert_eq!(result.line("Business Asset Disposal Relief").unwrap().value, dec("100000"));
        assert_eq!(result.line("Standard Rate Tax").unwrap().value, dec("100000"));
        assert_eq!(result.tax, dec("200000"));
        assert_eq!(result.effective_rate, dec("13.33"));
    }

    #[test]
    fn test_uk_relief_within_limit_after_exemption() {
        let mut request = input(Jurisdiction::Uk, "150000", "3");
        request.acquisition_cost = dec("50000");
        request.qualifies_for_relief = true;
        let result = calculate_business_sale_tax(&request, &tables()).unwrap();
        assert_eq!(result.line("Taxable Gain").unwrap().value, dec("94000"));
        assert_eq!(result.tax, dec("9400"));
        assert!(result.line("Standard Rate Tax").is_none());
    }

    #[test]
    fn test_uk_prior_relief_reduces_remaining_limit() {
        let mut request = input(Jurisdiction::Uk, "200000", "5");
        request.qualifies_for_relief = true;
        request.higher_rate_taxpayer = true;
        request.annual_exemption_used = true;
        request.prior_relief_used = dec("950000");
        let result = calculate_business_sale_tax(&request, &tables()).unwrap();
        assert_eq!(result.tax, dec("35000"));
    }

    #[test]
    fn test_uk_relief_needs_minimum_ownership() {
        let mut request = input(Jurisdiction::Uk, "106000", "1");
        request.qualifies_for_relief = true;
        request.higher_rate_taxpayer = true;
        let result = calculate_business_sale_tax(&request, &tables()).unwrap();
        assert_eq!(result.tax, dec("20000"));
        assert_eq!(result.notes.len(), 1);
    }

    #[test]
    fn test_loss_gives_zero_tax() {
        let mut request = input(Jurisdiction::Uk, "100000", "5");
        request.acquisition_cost = dec("150000");
        let result = calculate_business_sale_tax(&request, &tables()).unwrap();
        assert_eq!(result.line("Capital Gain").unwrap().value, Decimal::ZERO);
        assert_eq!(result.tax, Decimal::ZERO);
    }

    #[test]
    fn test_us_short_term() {
        let result = calculate_business_sale_tax(
            &input(Jurisdiction::Us { state: None }, "100000", "0.5"),
            &tables(),
        )
        .unwrap();
        assert_eq!(result.tax, dec("37000"));
    }

    #[test]
    fn test_us_long_term_by_income_level() {
        let mut request = input(Jurisdiction::Us { state: None }, "100000", "3");
        let medium = calculate_business_sale_tax(&request, &tables()).unwrap();
        assert_eq!(medium.tax, dec("15000"));

        request.income_level = IncomeLevel::High;
        let high = calculate_business_sale_tax(&request, &tables()).unwrap();
        assert_eq!(high.tax, dec("20000"));
    }

    #[test]
    fn test_us_qsbs_exclusion_after_five_years() {
        let mut request = input(Jurisdiction::Us { state: None }, "100000", "6");
        request.qualified_small_business_stock = true;
        let result = calculate_business_sale_tax(&request, &tables()).unwrap();
        assert_eq!(result.tax, Decimal::ZERO);

        request.years_owned = dec("3");
        let result = calculate_business_sale_tax(&request, &tables()).unwrap();
        assert_eq!(result.tax, dec("15000"));
        assert_eq!(result.notes.len(), 1);
    }

    #[test]
    fn test_eu_relief_or_basic_rate() {
        let mut request = input(Jurisdiction::Eu { country: Some(EuCountry::Germany) }, "100000", "10");
        let basic = calculate_business_sale_tax(&request, &tables()).unwrap();
        assert_eq!(basic.tax, dec("26375"));

        request.qualifies_for_relief = true;
        let relieved = calculate_business_sale_tax(&request, &tables()).unwrap();
        assert_eq!(relieved.tax, Decimal::ZERO);
    }

    #[test]
    fn test_eu_provisions_note() {
        let result = calculate_business_sale_tax(
            &input(Jurisdiction::Eu { country: Some(EuCountry::Italy) }, "100000", "10"),
            &tables(),
        )
        .unwrap();
        assert_eq!(result.tax, dec("26000"));
        assert_eq!(result.notes.len(), 1);
    }
}
