//! Display formatting for amounts and line items.

use rust_decimal::Decimal;

use crate::calculation::round_half_up;
use crate::models::{LineItem, LineUnit, Region};

/// Formats a money amount in the region's currency.
///
/// Two decimal places rounded half-up, comma thousands separators, and a
/// leading `-` for negative amounts.
///
/// # Example
///
/// ```
/// use rust_decimal::Decimal;
/// use tax_engine::format::format_currency;
/// use tax_engine::models::Region;
///
/// assert_eq!(format_currency(Decimal::new(-123450, 2), Region::Uk), "-£1,234.50");
/// assert_eq!(format_currency(Decimal::new(5, 3), Region::Us), "$0.01");
/// ```
pub fn format_currency(amount: Decimal, region: Region) -> String {
    let rounded = round_half_up(amount);
    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    format!("{}{}{}", sign, region.symbol(), grouped(rounded.abs(), 2))
}

/// Formats a percentage with two decimal places: `12.5` becomes `12.50%`.
pub fn format_percentage(percentage: Decimal) -> String {
    format!("{:.2}%", round_half_up(percentage))
}

/// Renders a line item's value according to its unit.
pub fn format_line(line: &LineItem, region: Region) -> String {
    match line.unit {
        LineUnit::Currency => format_currency(line.value, region),
        LineUnit::Percent => format_percentage(line.value),
        LineUnit::Quantity => {
            let value = line.value.normalize();
            let sign = if value.is_sign_negative() { "-" } else { "" };
            format!("{}{}", sign, grouped(value.abs(), value.scale()))
        }
    }
}

/// Inserts thousands separators into a non-negative value printed with
/// `places` decimals.
fn grouped(value: Decimal, places: u32) -> String {
    let text = format!("{:.*}", places as usize, value);
    let (whole, fraction) = match text.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (text.as_str(), None),
    };

    let mut out = String::with_capacity(text.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(digit);
    }
    if let Some(fraction) = fraction {
        out.push('.');
        out.push_str(fraction);
    }
    out
}
