//! Side-by-side income tax comparison across the three regions.
//!
//! Each region's tax is computed by [`calculate_income_tax`] on the same
//! nominal income, in that region's own currency. Nothing is converted,
//! so the comparison is between effective rates rather than amounts.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::TaxTables;
use crate::error::EngineResult;
use crate::models::{Currency, EuCountry, FilingStatus, Jurisdiction, Region, UsState};

use super::common::checked_amount;
use super::income_tax::{IncomeTaxInput, calculate_income_tax};

/// One region's income tax in a comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonEntry {
    /// The region.
    pub region: Region,
    /// The country or state whose table was used.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_region: Option<String>,
    /// Currency of `tax` and `net_income`.
    pub currency: Currency,
    /// Income tax due.
    pub tax: Decimal,
    /// Income after tax.
    pub net_income: Decimal,
    /// Tax as a percentage of income.
    pub effective_rate: Decimal,
}

/// The same income taxed under UK, EU and US rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncomeTaxComparison {
    /// The income compared.
    pub income: Decimal,
    /// One entry per region, lowest effective rate first.
    pub entries: Vec<ComparisonEntry>,
    /// Percentage points between the highest and lowest effective rates.
    pub spread: Decimal,
}

impl IncomeTaxComparison {
    /// The region with the lowest effective rate.
    pub fn lowest(&self) -> Option<&ComparisonEntry> {
        self.entries.first()
    }

    /// The region with the highest effective rate.
    pub fn highest(&self) -> Option<&ComparisonEntry> {
        self.entries.last()
    }
}

/// Compares income tax on `income` in the UK, an EU country and a US
/// state. Missing selectors use each table's default.
pub fn compare_income_tax(
    income: Decimal,
    eu_country: Option<EuCountry>,
    us_state: Option<UsState>,
    filing_status: FilingStatus,
    tables: &TaxTables,
) -> EngineResult<IncomeTaxComparison> {
    let income = checked_amount("income", income)?.max(Decimal::ZERO);
    let jurisdictions = [
        Jurisdiction::Uk,
        Jurisdiction::Eu {
            country: eu_country,
        },
        Jurisdiction::Us { state: us_state },
    ];

    let mut entries = Vec::with_capacity(jurisdictions.len());
    for jurisdiction in jurisdictions {
        let result = calculate_income_tax(
            &IncomeTaxInput {
                jurisdiction,
                income: Some(income),
                filing_status,
            },
            tables,
        )?;
        entries.push(ComparisonEntry {
            region: result.region,
            sub_region: result.sub_region,
            currency: result.currency,
            tax: result.tax,
            net_income: income - result.tax,
            effective_rate: result.effective_rate,
        });
    }
    entries.sort_by(|a, b| a.effective_rate.cmp(&b.effective_rate));

    let spread = match (entries.first(), entries.last()) {
        (Some(low), Some(high)) => high.effective_rate - low.effective_rate,
        _ => Decimal::ZERO,
    };

    debug!(income = %income, spread = %spread, "Compared income tax across regions");
    Ok(IncomeTaxComparison {
        income,
        entries,
        spread,
    })
}
