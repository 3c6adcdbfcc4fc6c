use serde::Serialize;

use crate::services::readings::Reading;

pub fn sum(values: impl IntoIterator<Item = f64>) -> f64 {
    values.into_iter().sum()
}

/// Arithmetic mean; an empty input averages to zero.
pub fn mean(values: impl IntoIterator<Item = f64>) -> f64 {
    let (total, count) = values
        .into_iter()
        .fold((0.0, 0usize), |(total, count), value| (total + value, count + 1));
    if count == 0 {
        0.0
    } else {
        total / count as f64
    }
}

/// `value / target * 100`, unclamped. A non-positive target yields zero.
pub fn percent_of_target(value: f64, target: f64) -> f64 {
    if target <= 0.0 || !target.is_finite() {
        return 0.0;
    }
    value / target * 100.0
}

/// Progress-bar width for a percentage; only the rendering is clamped.
pub fn bar_width(percent: f64) -> f64 {
    if percent.is_nan() {
        return 0.0;
    }
    percent.clamp(0.0, 100.0)
}

pub fn trend_bar_width(trend_percent: f64) -> f64 {
    bar_width(trend_percent.abs() * 2.0)
}

/// Aggregates over one batch of readings.
#[derive(Debug, Clone, PartialEq, Serialize, utoipa::ToSchema)]
pub struct BatchSummary {
    pub reading_count: usize,
    pub total_energy_kwh: f64,
    pub avg_efficiency_percent: f64,
    pub total_pedestrians: i64,
    /// Distinct locations in first-seen order.
    pub locations: Vec<String>,
}

impl BatchSummary {
    pub fn from_readings(readings: &[Reading]) -> Self {
        let mut locations: Vec<String> = Vec::new();
        for reading in readings {
            if !locations.iter().any(|known| known == &reading.location) {
                locations.push(reading.location.clone());
            }
        }
        Self {
            reading_count: readings.len(),
            total_energy_kwh: sum(readings.iter().map(|r| r.daily_energy_kwh)),
            avg_efficiency_percent: mean(readings.iter().map(|r| r.efficiency_percent)),
            total_pedestrians: readings
                .iter()
                .map(|r| r.pedestrians_per_day)
                .fold(0i64, i64::saturating_add),
            locations,
        }
    }

    pub fn active_locations(&self) -> usize {
        self.locations.len()
    }
}
