//! Property tests for the bracket evaluator and the adapters built on it.

use proptest::prelude::*;
use rust_decimal::Decimal;

use tax_engine::calculation::{
    IncomeTaxInput, TaxRequest, calculate, calculate_progressive_tax, evaluate_brackets,
    percent_of,
};
use tax_engine::config::ConfigLoader;
use tax_engine::models::{BracketTable, EuCountry, Jurisdiction, TaxBracket, UsState};

fn uk_table() -> BracketTable {
    BracketTable::new(vec![
        TaxBracket::new(Decimal::ZERO, Some(Decimal::from(12570)), Decimal::ZERO, "Personal Allowance"),
        TaxBracket::new(Decimal::from(12571), Some(Decimal::from(50270)), Decimal::from(20), "Basic Rate"),
        TaxBracket::new(Decimal::from(50271), Some(Decimal::from(125140)), Decimal::from(40), "Higher Rate"),
        TaxBracket::new(Decimal::from(125141), None, Decimal::from(45), "Additional Rate"),
    ])
    .unwrap()
}

/// Money amounts up to 100 million with two decimal places.
fn amount() -> impl Strategy<Value = Decimal> {
    (0i64..10_000_000_000).prop_map(|cents| Decimal::new(cents, 2))
}

fn jurisdiction() -> impl Strategy<Value = Jurisdiction> {
    prop_oneof![
        Just(Jurisdiction::Uk),
        Just(Jurisdiction::Eu { country: Some(EuCountry::Germany) }),
        Just(Jurisdiction::Eu { country: Some(EuCountry::France) }),
        Just(Jurisdiction::Us { state: Some(UsState::California) }),
        Just(Jurisdiction::Us { state: Some(UsState::Texas) }),
    ]
}

proptest! {
    #[test]
    fn tax_is_monotonic_in_amount(a in amount(), b in amount()) {
        let table = uk_table();
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(calculate_progressive_tax(low, &table) <= calculate_progressive_tax(high, &table));
    }

    #[test]
    fn tax_never_exceeds_amount(a in amount()) {
        prop_assert!(calculate_progressive_tax(a, &uk_table()) <= a);
    }

    #[test]
    fn slices_sum_to_amount_and_tax(a in amount()) {
        let evaluation = evaluate_brackets(a, &uk_table());
        let taxed: Decimal = evaluation.slices.iter().map(|s| s.taxable_amount).sum();
        let tax: Decimal = evaluation.slices.iter().map(|s| s.tax).sum();
        prop_assert_eq!(taxed, a);
        prop_assert_eq!(tax, evaluation.tax);
    }

    #[test]
    fn non_positive_amounts_are_untaxed(cents in -10_000_000_000i64..=0) {
        let amount = Decimal::new(cents, 2);
        prop_assert_eq!(calculate_progressive_tax(amount, &uk_table()), Decimal::ZERO);
    }

    #[test]
    fn empty_table_is_untaxed(a in amount()) {
        prop_assert_eq!(calculate_progressive_tax(a, &BracketTable::empty()), Decimal::ZERO);
    }

    #[test]
    fn flat_table_matches_percentage(a in amount(), rate in 0u32..=100) {
        let rate = Decimal::from(rate);
        let table = BracketTable::flat(rate).unwrap();
        prop_assert_eq!(calculate_progressive_tax(a, &table), percent_of(a, rate));
    }

    #[test]
    fn income_tax_is_idempotent(income in amount(), jurisdiction in jurisdiction()) {
        let loader = ConfigLoader::builtin().unwrap();
        let request = TaxRequest::IncomeTax(IncomeTaxInput {
            jurisdiction,
            income: Some(income),
            filing_status: Default::default(),
        });
        let first = calculate(&request, loader.tables()).unwrap();
        let second = calculate(&request, loader.tables()).unwrap();
        prop_assert_eq!(first, second);
    }
}

#[test]
fn boundaries_are_continuous() {
    let table = uk_table();
    let step = Decimal::new(1, 2);
    for (boundary, next_rate) in [(12570, 20), (50270, 40), (125140, 45)] {
        let at = calculate_progressive_tax(Decimal::from(boundary), &table);
        let above = calculate_progressive_tax(Decimal::from(boundary) + step, &table);
        assert_eq!(above - at, percent_of(step, Decimal::from(next_rate)));
    }
}
