//! Performance benchmarks for the tax engine.
//!
//! Covers the bracket evaluator on its own, a full adapter call, every
//! tax type through the dispatcher, and the HTTP round trip.
//!
//! Run with: `cargo bench`
//! HTML reports are generated in `target/criterion/`

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use rust_decimal::Decimal;

use tax_engine::api::{AppState, create_router};
use tax_engine::calculation::{
    IncomeTaxInput, TaxRequest, calculate, calculate_income_tax, evaluate_brackets,
};
use tax_engine::config::ConfigLoader;
use tax_engine::models::{EuCountry, Jurisdiction};

use axum::{body::Body, http::Request};
use tower::ServiceExt;

fn loader() -> ConfigLoader {
    ConfigLoader::load("./config/2024-25").expect("Failed to load config")
}

/// One representative request per tax type.
fn sample_requests() -> Vec<TaxRequest> {
    [
        r#"{"tax": "income_tax", "jurisdiction": {"region": "uk"}, "income": "85000"}"#,
        r#"{"tax": "vat", "jurisdiction": {"region": "eu", "country": "france"}, "price": "250"}"#,
        r#"{"tax": "capital_gains", "jurisdiction": {"region": "uk"}, "purchase_price": "200000", "sale_price": "320000"}"#,
        r#"{"tax": "inheritance_tax", "jurisdiction": {"region": "uk"}, "estate_value": "900000", "relationship": "child", "main_residence": true, "main_residence_value": "400000"}"#,
        r#"{"tax": "stamp_duty", "jurisdiction": {"region": "us", "state": "new_york"}, "property_value": "1200000"}"#,
        r#"{"tax": "dividend_tax", "jurisdiction": {"region": "uk"}, "dividends": "20000"}"#,
        r#"{"tax": "national_insurance", "jurisdiction": {"region": "us"}, "income": "250000"}"#,
        r#"{"tax": "vehicle_tax", "jurisdiction": {"region": "eu", "country": "germany"}, "fuel_type": "diesel", "engine_size_cc": "2000", "co2_emissions": "120"}"#,
        r#"{"tax": "property_tax", "jurisdiction": {"region": "uk"}, "property_value": "250000", "area": "london"}"#,
        r#"{"tax": "insurance_premium_tax", "jurisdiction": {"region": "uk"}, "premium": "500"}"#,
        r#"{"tax": "excise_duty", "jurisdiction": {"region": "uk"}, "product": "spirits", "quantity": "0.7", "abv": "40"}"#,
        r#"{"tax": "sole_trader", "jurisdiction": {"region": "uk"}, "turnover": "50000", "expenses": "10000"}"#,
        r#"{"tax": "business_sale", "jurisdiction": {"region": "uk"}, "sale_proceeds": "1500000", "years_owned": "5", "qualifies_for_relief": true}"#,
    ]
    .iter()
    .map(|json| serde_json::from_str(json).expect("sample request should parse"))
    .collect()
}

fn bench_bracket_evaluator(c: &mut Criterion) {
    let loader = loader();
    let table = &loader.tables().income_tax.uk;

    let mut group = c.benchmark_group("bracket_evaluator");
    for income in [20_000, 60_000, 250_000] {
        group.bench_with_input(BenchmarkId::from_parameter(income), &income, |b, &income| {
            let amount = Decimal::from(income);
            b.iter(|| evaluate_brackets(black_box(amount), table))
        });
    }
    group.finish();
}

fn bench_income_tax_adapter(c: &mut Criterion) {
    let loader = loader();
    let input = IncomeTaxInput {
        jurisdiction: Jurisdiction::Eu {
            country: Some(EuCountry::Germany),
        },
        income: Some(Decimal::from(75_000)),
        filing_status: Default::default(),
    };

    c.bench_function("income_tax_adapter", |b| {
        b.iter(|| calculate_income_tax(black_box(&input), loader.tables()).unwrap())
    });
}

fn bench_all_tax_types(c: &mut Criterion) {
    let loader = loader();
    let requests = sample_requests();

    let mut group = c.benchmark_group("dispatcher");
    group.throughput(Throughput::Elements(requests.len() as u64));
    group.bench_function("all_tax_types", |b| {
        b.iter(|| {
            for request in &requests {
                black_box(calculate(request, loader.tables()).unwrap());
            }
        })
    });
    group.finish();
}

fn bench_http_round_trip(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let router = create_router(AppState::new(loader()));
    let body = serde_json::to_string(&sample_requests()[0]).unwrap();

    c.bench_function("http_calculate", |b| {
        b.to_async(&rt).iter(|| async {
            let router = router.clone();
            let response = router
                .oneshot(
                    Request::builder()
                        .method("POST")
                        .uri("/calculate")
                        .header("Content-Type", "application/json")
                        .body(Body::from(body.clone()))
                        .unwrap(),
                )
                .await
                .unwrap();
            black_box(response)
        })
    });
}

criterion_group!(
    benches,
    bench_bracket_evaluator,
    bench_income_tax_adapter,
    bench_all_tax_types,
    bench_http_round_trip
);
criterion_main!(benches);
