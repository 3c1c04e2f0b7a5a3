//! Utility functions shared by the scorers
//!
//! Contains parameter validation, JSON object decoding and a seeded generator of
//! synthetic observations used when no observation history is available.

use crate::{Observation, Result, ScoringError};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal, Poisson};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Share of generated observations drawn from the disrupted regime
pub const DISRUPTION_RATE: f64 = 0.15;

/// Validate a value is finite and within a range
pub fn validate_range(value: f64, min: f64, max: f64, name: &str) -> Result<()> {
    if !value.is_finite() || value < min || value > max {
        return Err(ScoringError::InvalidInput(format!(
            "{} must be between {} and {}, got {}",
            name, min, max, value
        )));
    }
    Ok(())
}

/// Decode a struct from a JSON object argument.
///
/// Arrays and scalars are rejected instead of being mapped onto fields by position.
pub fn parse_object<T: DeserializeOwned>(input: &str) -> Result<T> {
    match serde_json::from_str::<Value>(input)? {
        value @ Value::Object(_) => Ok(serde_json::from_value(value)?),
        other => Err(ScoringError::InvalidInput(format!(
            "Expected a JSON object, got {}",
            json_kind(&other)
        ))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn normal(mean: f64, std_dev: f64) -> Result<Normal<f64>> {
    Normal::new(mean, std_dev).map_err(|e| ScoringError::InvalidInput(e.to_string()))
}

fn poisson(lambda: f64) -> Result<Poisson<f64>> {
    Poisson::new(lambda).map_err(|e| ScoringError::InvalidInput(e.to_string()))
}

/// Generate synthetic observations for training
///
/// Most rows follow a calm baseline (demand ~500, quantity ~1000, short delays,
/// temperatures near 24°C, healthy stock). About [`DISRUPTION_RATE`] of rows come
/// from a disrupted regime with longer delays, hotter transport and thin stock, so
/// both risk classes and a tail of outliers are present.
///
/// # Arguments
/// * `count` - Number of observations to generate
/// * `seed` - RNG seed; the same seed always yields the same observations
pub fn generate_observations(count: usize, seed: u64) -> Result<Vec<Observation>> {
    if count == 0 {
        return Err(ScoringError::InvalidInput(
            "Observation count must be positive".to_string(),
        ));
    }

    let mut rng = StdRng::seed_from_u64(seed);

    let demand = normal(500.0, 120.0)?;
    let quantity = normal(1000.0, 200.0)?;
    let calm_delay = poisson(2.0)?;
    let calm_temperature = normal(24.0, 4.5)?;
    let calm_stock = normal(650.0, 250.0)?;
    let disrupted_delay = poisson(5.0)?;
    let disrupted_temperature = normal(31.0, 6.0)?;
    let disrupted_stock = normal(300.0, 150.0)?;

    let observations = (0..count)
        .map(|_| {
            let disrupted = rng.gen_bool(DISRUPTION_RATE);
            let (delay, temperature, stock) = if disrupted {
                (
                    disrupted_delay.sample(&mut rng),
                    disrupted_temperature.sample(&mut rng),
                    disrupted_stock.sample(&mut rng),
                )
            } else {
                (
                    calm_delay.sample(&mut rng),
                    calm_temperature.sample(&mut rng),
                    calm_stock.sample(&mut rng),
                )
            };

            Observation::new(
                demand.sample(&mut rng).max(0.0),
                quantity.sample(&mut rng).max(0.0),
                delay,
                temperature,
                stock.max(0.0),
            )
        })
        .collect();

    Ok(observations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::risk::risk_label;
    use rstest::rstest;

    #[test]
    fn test_generation_is_seeded() {
        let first = generate_observations(50, 7).unwrap();
        let second = generate_observations(50, 7).unwrap();
        let other = generate_observations(50, 8).unwrap();

        assert_eq!(first, second);
        assert_ne!(first, other);
    }

    #[test]
    fn test_generated_values_are_plausible() {
        let observations = generate_observations(500, 42).unwrap();

        assert_eq!(observations.len(), 500);
        for o in &observations {
            assert!(o.demand >= 0.0 && o.quantity >= 0.0 && o.stock_level >= 0.0);
            assert!(o.delay_days >= 0.0 && o.delay_days.fract() == 0.0);
            assert!(o.temperature.is_finite());
        }
    }

    #[test]
    fn test_both_risk_classes_present() {
        let observations = generate_observations(500, 42).unwrap();
        let positives = observations.iter().filter(|o| risk_label(o)).count();

        assert!(positives > 0);
        assert!(positives < observations.len());
    }

    #[test]
    fn test_validate_range() {
        assert!(validate_range(50.0, 0.0, 100.0, "score").is_ok());
        assert!(validate_range(0.0, 0.0, 100.0, "score").is_ok());
        assert!(validate_range(100.1, 0.0, 100.0, "score").is_err());
        assert!(validate_range(f64::NAN, 0.0, 100.0, "score").is_err());
        assert!(generate_observations(0, 1).is_err());
    }

    #[rstest]
    #[case("[500, 5, 35, 200]", "an array")]
    #[case("42", "a number")]
    #[case("null", "null")]
    #[case(r#""demand""#, "a string")]
    fn test_parse_object_rejects_non_objects(#[case] input: &str, #[case] kind: &str) {
        match parse_object::<Observation>(input) {
            Err(ScoringError::InvalidInput(message)) => assert!(message.ends_with(kind), "{}", message),
            other => panic!("expected invalid input, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_object_decodes_objects() {
        let observation: Observation = parse_object(r#"{"delay_days": 4}"#).unwrap();
        assert_eq!(observation.delay_days, 4.0);
        assert!(matches!(
            parse_object::<Observation>("{broken"),
            Err(ScoringError::MalformedInput(_))
        ));
    }
}
