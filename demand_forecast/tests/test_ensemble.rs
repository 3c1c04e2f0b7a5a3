use approx::assert_relative_eq;
use demand_forecast::ensemble::{DATA_QUALITY_FACTOR, ENSEMBLE_WEIGHTS};
use demand_forecast::{ForecastEnsembler, ForecastError, ForecastResult};
use pretty_assertions::assert_eq;
use rstest::rstest;

#[test]
fn test_flat_forecasts_have_zero_growth() {
    let ensembler = ForecastEnsembler::new();
    let flat = vec![500.0; 30];

    let result = ensembler
        .ensemble(30, [&flat, &flat, &flat], [90.0, 90.0, 90.0])
        .unwrap();

    assert_eq!(result.values.len(), 30);
    for value in &result.values {
        assert_relative_eq!(*value, 500.0, epsilon = 1e-9);
    }
    assert_relative_eq!(result.growth_percentage, 0.0, epsilon = 1e-9);
    assert_relative_eq!(result.confidence, 90.0 * DATA_QUALITY_FACTOR, epsilon = 1e-9);
}

#[test]
fn test_primary_model_carries_the_largest_weight() {
    let ensembler = ForecastEnsembler::new();
    let primary = vec![1000.0; 10];
    let other = vec![0.0; 10];

    let result = ensembler
        .ensemble(10, [&primary, &other, &other], [80.0, 80.0, 80.0])
        .unwrap();

    assert_relative_eq!(result.values[0], 1000.0 * ENSEMBLE_WEIGHTS[0]);
}

#[rstest]
#[case(1)]
#[case(3)]
#[case(6)]
fn test_short_horizon_uses_every_point(#[case] horizon: usize) {
    let ensembler = ForecastEnsembler::new();
    let rising: Vec<f64> = (0..horizon).map(|i| 100.0 + i as f64).collect();

    let result = ensembler
        .ensemble(horizon, [&rising, &rising, &rising], [85.0, 85.0, 85.0])
        .unwrap();

    // Both windows cover the whole forecast, so they share one mean
    assert_relative_eq!(result.growth_percentage, 0.0, epsilon = 1e-9);
}

#[test]
fn test_growth_over_a_month() {
    let ensembler = ForecastEnsembler::new();
    let rising: Vec<f64> = (0..30).map(|i| 100.0 + 10.0 * i as f64).collect();

    let result = ensembler
        .ensemble(30, [&rising, &rising, &rising], [85.0, 85.0, 85.0])
        .unwrap();

    // first week mean 130, last week mean 360
    assert_relative_eq!(result.growth_percentage, 230.0 / 130.0 * 100.0, epsilon = 1e-9);
}

#[test]
fn test_zero_early_mean_is_undefined() {
    let ensembler = ForecastEnsembler::new();
    let zeros = vec![0.0; 14];

    let err = ensembler
        .ensemble(14, [&zeros, &zeros, &zeros], [85.0, 85.0, 85.0])
        .unwrap_err();

    assert!(matches!(err, ForecastError::DivisionUndefined(_)));
}

#[rstest]
#[case(0, 0)]
#[case(5, 4)]
fn test_invalid_horizon_is_rejected(#[case] horizon: usize, #[case] provided: usize) {
    let ensembler = ForecastEnsembler::new();
    let values = vec![1.0; provided];

    let err = ensembler
        .ensemble(horizon, [&values, &values, &values], [85.0, 85.0, 85.0])
        .unwrap_err();

    assert!(matches!(err, ForecastError::ValidationError(_)));
}

#[rstest]
#[case([100.0, 100.0, 100.0], 92.0)]
#[case([95.0, 90.0, 85.0], 82.8)]
#[case([-300.0, 10.0, 20.0], 0.0)]
fn test_confidence_is_bounded(#[case] accuracies: [f64; 3], #[case] expected: f64) {
    let ensembler = ForecastEnsembler::new();
    let confidence = ensembler.confidence(accuracies).unwrap();

    assert_relative_eq!(confidence, expected, epsilon = 1e-9);
    assert!((0.0..=100.0).contains(&confidence));
}

#[test]
fn test_result_serializes_with_forecast_key() {
    let result = ForecastResult {
        values: vec![1.0, 2.0],
        growth_percentage: 100.0,
        confidence: 50.0,
    };

    let json = serde_json::to_value(&result).unwrap();

    assert_eq!(
        json,
        serde_json::json!({"forecast": [1.0, 2.0], "growth_percentage": 100.0, "confidence": 50.0})
    );
}
