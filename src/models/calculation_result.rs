//! Calculation result models for the tax engine.
//!
//! This module contains the [`CalculationResult`] type and its associated
//! structures that capture all outputs from a tax calculation: the ordered
//! line items shown to the user, the per-bracket breakdown, and an audit
//! trace of the rules that were applied.
//!
//! Results carry no identifiers or timestamps, so calculating the same
//! input twice yields equal results. The API layer adds those.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{Currency, Region};

/// The tax a result was computed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaxType {
    /// Income tax.
    IncomeTax,
    /// VAT or sales tax.
    Vat,
    /// Capital gains tax.
    CapitalGains,
    /// Inheritance or estate tax.
    InheritanceTax,
    /// Stamp duty or property transfer tax.
    StampDuty,
    /// Dividend tax.
    DividendTax,
    /// National insurance or social security contributions.
    NationalInsurance,
    /// Vehicle tax.
    VehicleTax,
    /// Council or property tax.
    PropertyTax,
    /// Insurance premium tax.
    InsurancePremiumTax,
    /// Excise duty.
    ExciseDuty,
    /// Sole trader income tax and contributions.
    SoleTrader,
    /// Capital gains on the sale of a business.
    BusinessSale,
}

impl TaxType {
    /// Human-readable name of the tax.
    pub fn name(self) -> &'static str {
        match self {
            TaxType::IncomeTax => "income tax",
            TaxType::Vat => "VAT",
            TaxType::CapitalGains => "capital gains tax",
            TaxType::InheritanceTax => "inheritance tax",
            TaxType::StampDuty => "stamp duty",
            TaxType::DividendTax => "dividend tax",
            TaxType::NationalInsurance => "national insurance",
            TaxType::VehicleTax => "vehicle tax",
            TaxType::PropertyTax => "property tax",
            TaxType::InsurancePremiumTax => "insurance premium tax",
            TaxType::ExciseDuty => "excise duty",
            TaxType::SoleTrader => "sole trader tax",
            TaxType::BusinessSale => "business sale tax",
        }
    }
}

impl fmt::Display for TaxType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How a line item's value should be rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineUnit {
    /// A money amount in the result's currency.
    Currency,
    /// A percentage.
    Percent,
    /// A plain quantity (e.g. litres of pure alcohol).
    Quantity,
}

/// A single labelled line of a calculation result.
///
/// # Example
///
/// ```
/// use tax_engine::models::LineItem;
/// use rust_decimal::Decimal;
///
/// let line = LineItem::currency("Total Tax", Decimal::from(11432))
///     .describe("Income tax due")
///     .total();
/// assert!(line.is_total);
/// assert_eq!(line.description.as_deref(), Some("Income tax due"));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    /// The label shown beside the value.
    pub label: String,
    /// The value.
    pub value: Decimal,
    /// How the value is rendered.
    pub unit: LineUnit,
    /// Optional explanatory text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Whether this line is a headline total.
    #[serde(default)]
    pub is_total: bool,
}

impl LineItem {
    fn with_unit(label: impl Into<String>, value: Decimal, unit: LineUnit) -> Self {
        Self {
            label: label.into(),
            value,
            unit,
            description: None,
            is_total: false,
        }
    }

    /// Creates a money line.
    pub fn currency(label: impl Into<String>, value: Decimal) -> Self {
        Self::with_unit(label, value, LineUnit::Currency)
    }

    /// Creates a percentage line.
    pub fn percent(label: impl Into<String>, value: Decimal) -> Self {
        Self::with_unit(label, value, LineUnit::Percent)
    }

    /// Creates a quantity line.
    pub fn quantity(label: impl Into<String>, value: Decimal) -> Self {
        Self::with_unit(label, value, LineUnit::Quantity)
    }

    /// Attaches a description.
    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Marks the line as a headline total.
    pub fn total(mut self) -> Self {
        self.is_total = true;
        self
    }
}

/// The portion of an amount that fell in one bracket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BracketSlice {
    /// Bracket label.
    pub name: String,
    /// Percentage rate of the bracket.
    pub rate: Decimal,
    /// Amount taxed in this bracket.
    pub taxable_amount: Decimal,
    /// Tax due on that amount.
    pub tax: Decimal,
}

/// A single step in the audit trace.
///
/// Records which rule was applied, with what inputs, and what it produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditStep {
    /// Sequence number of the step, starting at 1.
    pub step_number: u32,
    /// Machine-readable rule identifier, e.g. "uk_income_tax".
    pub rule_id: String,
    /// Human-readable rule name.
    pub rule_name: String,
    /// Inputs to the rule.
    pub input: serde_json::Value,
    /// Outputs of the rule.
    pub output: serde_json::Value,
    /// Short explanation of what the rule did.
    pub reasoning: String,
}

/// The complete result of one tax calculation.
///
/// An empty result (no lines) means the caller supplied no primary
/// amount; it is distinct from a computed zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationResult {
    /// The tax calculated.
    pub tax_type: TaxType,
    /// The region whose rules were applied.
    pub region: Region,
    /// Currency of all money values.
    pub currency: Currency,
    /// The country or state whose table was used, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_region: Option<String>,
    /// Ordered line items.
    pub lines: Vec<LineItem>,
    /// Total tax due.
    pub tax: Decimal,
    /// Tax as a percentage of the relevant base, rounded to 2 places.
    pub effective_rate: Decimal,
    /// Per-bracket breakdown, when a progressive table was applied.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub brackets: Vec<BracketSlice>,
    /// Why no tax is due, when an exemption applied.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exemption: Option<String>,
    /// Additional notes about the calculation.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
    /// Rules applied, in order.
    #[serde(default)]
    pub audit: Vec<AuditStep>,
}

impl CalculationResult {
    /// Creates a result with no lines and zero tax.
    pub fn new(tax_type: TaxType, region: Region) -> Self {
        Self {
            tax_type,
            region,
            currency: region.currency(),
            sub_region: None,
            lines: Vec::new(),
            tax: Decimal::ZERO,
            effective_rate: Decimal::ZERO,
            brackets: Vec::new(),
            exemption: None,
            notes: Vec::new(),
            audit: Vec::new(),
        }
    }

    /// The result returned when no primary amount was supplied.
    pub fn empty(tax_type: TaxType, region: Region) -> Self {
        Self::new(tax_type, region)
    }

    /// Returns true if nothing was calculated.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Records the sub-region whose table was used.
    pub fn for_sub_region(mut self, name: impl Into<String>) -> Self {
        self.sub_region = Some(name.into());
        self
    }

    /// Appends a line item.
    pub fn push_line(&mut self, line: LineItem) {
        self.lines.push(line);
    }

    /// Appends a note.
    pub fn push_note(&mut self, note: impl Into<String>) {
        self.notes.push(note.into());
    }

    /// Appends an audit step, numbering it after the existing ones.
    pub fn push_audit(
        &mut self,
        rule_id: &str,
        rule_name: &str,
        input: serde_json::Value,
        output: serde_json::Value,
        reasoning: impl Into<String>,
    ) {
        let step_number = self.audit.len() as u32 + 1;
        self.audit.push(AuditStep {
            step_number,
            rule_id: rule_id.to_string(),
            rule_name: rule_name.to_string(),
            input,
            output,
            reasoning: reasoning.into(),
        });
    }

    /// Returns the first line with the given label.
    pub fn line(&self, label: &str) -> Option<&LineItem> {
        self.lines.iter().find(|line| line.label == label)
    }
}
