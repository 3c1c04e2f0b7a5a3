//! Daily demand history and calendar features

use crate::error::{ForecastError, Result};
use chrono::{Datelike, Days, NaiveDate};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Names of the calendar features, in matrix column order
pub const CALENDAR_FEATURES: [&str; 3] = ["day_of_year", "month", "day_of_week"];

/// Calendar features for one day: day of year (1-366), month (1-12), weekday (0 = Monday)
pub fn calendar_features(date: NaiveDate) -> Vec<f64> {
    vec![
        date.ordinal() as f64,
        date.month() as f64,
        date.weekday().num_days_from_monday() as f64,
    ]
}

/// Daily quantity series used to train the demand models
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemandHistory {
    dates: Vec<NaiveDate>,
    quantities: Vec<f64>,
}

impl DemandHistory {
    /// Build a history from strictly increasing dates and their quantities
    pub fn new(dates: Vec<NaiveDate>, quantities: Vec<f64>) -> Result<Self> {
        if dates.len() != quantities.len() {
            return Err(ForecastError::ValidationError(format!(
                "Dates length ({}) doesn't match quantities length ({})",
                dates.len(),
                quantities.len()
            )));
        }
        if dates.is_empty() {
            return Err(ForecastError::DataError(
                "Empty demand history".to_string(),
            ));
        }
        if dates.windows(2).any(|w| w[1] <= w[0]) {
            return Err(ForecastError::DataError(
                "Dates must be strictly increasing".to_string(),
            ));
        }
        if quantities.iter().any(|q| !q.is_finite()) {
            return Err(ForecastError::DataError(
                "Quantities must be finite".to_string(),
            ));
        }

        Ok(Self { dates, quantities })
    }

    /// Generate a seeded synthetic year of demand: a random walk around 1000 units
    /// with an annual sine component.
    pub fn synthetic(start: NaiveDate, days: usize, seed: u64) -> Result<Self> {
        if days == 0 {
            return Err(ForecastError::ValidationError(
                "Synthetic history needs at least one day".to_string(),
            ));
        }

        let mut rng = StdRng::seed_from_u64(seed);
        let mut walk = 0.0;
        let mut dates = Vec::with_capacity(days);
        let mut quantities = Vec::with_capacity(days);

        for i in 0..days {
            let step: f64 = rng.sample(StandardNormal);
            walk += step * 10.0;
            let seasonal = (i as f64 * 2.0 * PI / 365.0).sin() * 100.0;

            dates.push(offset_date(start, i)?);
            quantities.push(1000.0 + walk + seasonal);
        }

        Self::new(dates, quantities)
    }

    pub fn len(&self) -> usize {
        self.quantities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quantities.is_empty()
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn quantities(&self) -> &[f64] {
        &self.quantities
    }

    /// Last observed date
    pub fn last_date(&self) -> NaiveDate {
        // `new` guarantees at least one entry
        self.dates[self.dates.len() - 1]
    }

    /// Calendar feature matrix, one row per observed day
    pub fn feature_matrix(&self) -> Vec<Vec<f64>> {
        self.dates.iter().map(|d| calendar_features(*d)).collect()
    }
}

/// Dates of the `horizon` days following `last`
pub fn future_dates(last: NaiveDate, horizon: usize) -> Result<Vec<NaiveDate>> {
    (1..=horizon).map(|i| offset_date(last, i)).collect()
}

fn offset_date(date: NaiveDate, days: usize) -> Result<NaiveDate> {
    date.checked_add_days(Days::new(days as u64)).ok_or_else(|| {
        ForecastError::DataError(format!("Date overflow adding {} days to {}", days, date))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, 1, 1).unwrap()
    }

    #[test]
    fn test_calendar_features() {
        // 2023-01-01 was a Sunday
        assert_eq!(calendar_features(start()), vec![1.0, 1.0, 6.0]);
        let feb = NaiveDate::from_ymd_opt(2023, 2, 6).unwrap();
        assert_eq!(calendar_features(feb), vec![37.0, 2.0, 0.0]);
    }

    #[test]
    fn test_synthetic_history_is_seeded() {
        let a = DemandHistory::synthetic(start(), 365, 42).unwrap();
        let b = DemandHistory::synthetic(start(), 365, 42).unwrap();
        let c = DemandHistory::synthetic(start(), 365, 7).unwrap();

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 365);
        assert_eq!(a.last_date(), NaiveDate::from_ymd_opt(2023, 12, 31).unwrap());
    }

    #[test]
    fn test_rejects_unsorted_dates() {
        let dates = vec![start(), start()];
        assert!(DemandHistory::new(dates, vec![1.0, 2.0]).is_err());
    }

    #[test]
    fn test_future_dates() {
        let dates = future_dates(NaiveDate::from_ymd_opt(2023, 12, 30).unwrap(), 3).unwrap();
        assert_eq!(dates[2], NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
    }
}
