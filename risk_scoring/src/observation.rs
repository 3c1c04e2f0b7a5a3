//! Point-in-time supply chain observation

use crate::utils::parse_object;
use crate::Result;
use serde::{Deserialize, Serialize};

/// Feature order used by the anomaly scorer
pub const ANOMALY_FEATURES: [&str; 5] = [
    "demand",
    "quantity",
    "delay_days",
    "temperature",
    "stock_level",
];

/// Feature order used by the risk classifier
pub const RISK_FEATURES: [&str; 4] = ["demand", "delay_days", "temperature", "stock_level"];

/// One shipment/inventory measurement. Missing JSON keys decode as 0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Observation {
    pub demand: f64,
    pub quantity: f64,
    pub delay_days: f64,
    /// Degrees Celsius; may be negative
    pub temperature: f64,
    pub stock_level: f64,
}

impl Observation {
    pub fn new(demand: f64, quantity: f64, delay_days: f64, temperature: f64, stock_level: f64) -> Self {
        Self {
            demand,
            quantity,
            delay_days,
            temperature,
            stock_level,
        }
    }

    /// Decode an observation from a JSON object; other JSON values are invalid input
    pub fn from_json(input: &str) -> Result<Self> {
        parse_object(input)
    }

    /// Values in [`ANOMALY_FEATURES`] order
    pub fn anomaly_features(&self) -> Vec<f64> {
        vec![
            self.demand,
            self.quantity,
            self.delay_days,
            self.temperature,
            self.stock_level,
        ]
    }

    /// Values in [`RISK_FEATURES`] order
    pub fn risk_features(&self) -> Vec<f64> {
        vec![self.demand, self.delay_days, self.temperature, self.stock_level]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ScoringError;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_missing_keys_default_to_zero() {
        let observation = Observation::from_json(r#"{"temperature": 31.5}"#).unwrap();
        assert_eq!(observation, Observation::new(0.0, 0.0, 0.0, 31.5, 0.0));
    }

    #[test]
    fn test_unknown_keys_are_ignored() {
        let observation =
            Observation::from_json(r#"{"demand": 500, "shipment_id": "S-1"}"#).unwrap();
        assert_eq!(observation.demand, 500.0);
    }

    #[test]
    fn test_malformed_json() {
        let err = Observation::from_json("{demand: 5").unwrap_err();
        assert!(matches!(err, ScoringError::MalformedInput(_)));
    }

    #[test]
    fn test_array_is_not_read_positionally() {
        let err = Observation::from_json("[500, 5, 35, 200]").unwrap_err();
        assert!(matches!(err, ScoringError::InvalidInput(_)));
    }

    #[test]
    fn test_feature_order() {
        let observation = Observation::new(1.0, 2.0, 3.0, 4.0, 5.0);
        assert_eq!(observation.anomaly_features(), vec![1.0, 2.0, 3.0, 4.0, 5.0]);
        assert_eq!(observation.risk_features(), vec![1.0, 3.0, 4.0, 5.0]);
    }
}
