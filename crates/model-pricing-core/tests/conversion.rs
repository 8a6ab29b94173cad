use model_pricing_core::classify::is_subscription_pricing;
use model_pricing_core::currency::{load_bundled_rates, parse_rates};
use model_pricing_core::model::PricingRecord;
use model_pricing_core::units::to_per_million;
use model_pricing_core::PricingError;

const AMOUNTS: &[f64] = &[0.0, 0.000_001, 0.37, 1.0, 20.0, 1234.5678, -5.0];

#[test]
fn identity_conversion_is_exact() {
    let rates = load_bundled_rates().unwrap();
    for code in rates.codes() {
        for &x in AMOUNTS {
            assert_eq!(rates.convert(x, code, code).unwrap(), x, "{code}");
        }
    }
    // Identity never consults the table, so unknown codes pass too.
    assert_eq!(rates.convert(3.5, "ZZZ", "ZZZ").unwrap(), 3.5);
}

#[test]
fn round_trip_is_stable() {
    let rates = load_bundled_rates().unwrap();
    let codes: Vec<&str> = rates.codes().collect();
    for a in &codes {
        for b in &codes {
            for &x in AMOUNTS {
                let there = rates.convert(x, a, b).unwrap();
                let back = rates.convert(there, b, a).unwrap();
                let tol = 1e-9 * x.abs().max(1.0);
                assert!((back - x).abs() <= tol, "{a}->{b}->{a}: {x} became {back}");
            }
        }
    }
}

#[test]
fn unknown_currency_is_reported_by_code() {
    let rates = load_bundled_rates().unwrap();
    match rates.convert(1.0, "usd", "doge") {
        Err(PricingError::UnknownCurrency(code)) => assert_eq!(code, "DOGE"),
        other => panic!("expected UnknownCurrency, got {other:?}"),
    }
}

#[test]
fn direct_and_cross_rates_agree() {
    let rates = parse_rates(
        r#"
base = "USD"
[rates]
EUR = 0.8
GBP = 0.5
"#,
    )
    .unwrap();
    // 0.5 GBP = 1 USD = 0.8 EUR
    let eur = rates.convert(0.5, "GBP", "EUR").unwrap();
    assert!((eur - 0.8).abs() < 1e-12);
}

#[test]
fn normalizer_examples() {
    assert!((to_per_million(0.002, Some("per 1K tokens")) - 2.0).abs() < 1e-9);
    assert!((to_per_million(3.0, Some("per 1M tokens")) - 3.0).abs() < 1e-9);
    assert_eq!(to_per_million(0.0, Some("per token")), 0.0);
}

#[test]
fn normalizer_is_monotonic_per_unit() {
    for unit in [None, Some("per 1K tokens"), Some("per 1M tokens"), Some("per image")] {
        let mut prev = f64::NEG_INFINITY;
        for i in -50..=50 {
            let v = to_per_million(i as f64 * 0.1, unit);
            assert!(v >= prev, "{unit:?}: not monotonic at {i}");
            prev = v;
        }
    }
}

#[test]
fn classifier_examples() {
    assert!(is_subscription_pricing(&PricingRecord::flat(20.0, Some("per month"))));
    assert!(!is_subscription_pricing(&PricingRecord::flat(0.002, Some("per 1K tokens"))));
    assert!(is_subscription_pricing(&PricingRecord::flat(99.0, None)));
}
