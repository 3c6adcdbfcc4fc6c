use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::PgPool;
use std::future::Future;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::FetchError;

pub const MAX_RECENT_LIMIT: i64 = 500;

const READING_COLUMNS: &str = "id, lokasi, kota, energi_harian, efisiensi, pejalan_kaki_per_hari, latitude, longitude, created_at";

/// One timestamped aggregate row reported by a sidewalk installation.
///
/// Serialized with the store's column names so rows, insert notifications and
/// generator request bodies share one shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow, utoipa::ToSchema)]
pub struct Reading {
    #[serde(default)]
    pub id: Uuid,
    #[serde(rename = "lokasi", alias = "location")]
    #[sqlx(rename = "lokasi")]
    pub location: String,
    #[serde(rename = "kota", alias = "city", default)]
    #[sqlx(rename = "kota")]
    pub city: String,
    #[serde(
        rename = "energi_harian",
        alias = "dailyEnergyKwh",
        deserialize_with = "lenient_f64"
    )]
    #[sqlx(rename = "energi_harian")]
    pub daily_energy_kwh: f64,
    #[serde(
        rename = "efisiensi",
        alias = "efficiencyPercent",
        deserialize_with = "lenient_f64"
    )]
    #[sqlx(rename = "efisiensi")]
    pub efficiency_percent: f64,
    #[serde(
        rename = "pejalan_kaki_per_hari",
        alias = "pedestriansPerDay",
        deserialize_with = "lenient_i64"
    )]
    #[sqlx(rename = "pejalan_kaki_per_hari")]
    pub pedestrians_per_day: i64,
    #[serde(default)]
    pub latitude: f64,
    #[serde(default)]
    pub longitude: f64,
    #[serde(alias = "createdAt", alias = "timestamp", default)]
    pub created_at: DateTime<Utc>,
}

/// Insert payload posted by field controllers. The store assigns `id` and
/// `created_at`.
#[derive(Debug, Clone, Deserialize, utoipa::ToSchema)]
pub struct NewReading {
    #[serde(rename = "lokasi", alias = "location")]
    pub location: String,
    #[serde(rename = "kota", alias = "city")]
    pub city: String,
    #[serde(
        rename = "energi_harian",
        alias = "dailyEnergyKwh",
        deserialize_with = "lenient_f64"
    )]
    pub daily_energy_kwh: f64,
    #[serde(
        rename = "efisiensi",
        alias = "efficiencyPercent",
        deserialize_with = "lenient_f64"
    )]
    pub efficiency_percent: f64,
    #[serde(
        rename = "pejalan_kaki_per_hari",
        alias = "pedestriansPerDay",
        deserialize_with = "lenient_i64"
    )]
    pub pedestrians_per_day: i64,
    pub latitude: f64,
    pub longitude: f64,
}

impl NewReading {
    pub fn validate(&self) -> Result<(), String> {
        if self.location.trim().is_empty() {
            return Err("lokasi must not be empty".to_string());
        }
        if self.city.trim().is_empty() {
            return Err("kota must not be empty".to_string());
        }
        for (name, value) in [
            ("energi_harian", self.daily_energy_kwh),
            ("efisiensi", self.efficiency_percent),
            ("latitude", self.latitude),
            ("longitude", self.longitude),
        ] {
            if !value.is_finite() {
                return Err(format!("{name} must be a finite number"));
            }
        }
        if self.daily_energy_kwh < 0.0 {
            return Err("energi_harian must not be negative".to_string());
        }
        if self.pedestrians_per_day < 0 {
            return Err("pejalan_kaki_per_hari must not be negative".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecentQuery {
    pub limit: i64,
    pub location: Option<String>,
}

impl RecentQuery {
    pub fn latest(limit: i64) -> Self {
        Self {
            limit: limit.clamp(1, MAX_RECENT_LIMIT),
            location: None,
        }
    }

    pub fn at_location(mut self, location: Option<String>) -> Self {
        self.location = location
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty());
        self
    }

    pub fn matches(&self, reading: &Reading) -> bool {
        self.location
            .as_deref()
            .map_or(true, |location| reading.location == location)
    }
}

/// Ordered, limited access to the most recent readings.
pub trait ReadingSource: Send + Sync + 'static {
    /// Newest first, at most `query.limit` rows.
    fn fetch_recent(
        &self,
        query: &RecentQuery,
    ) -> impl Future<Output = Result<Vec<Reading>, FetchError>> + Send;

    fn latest_for_location(
        &self,
        location: &str,
    ) -> impl Future<Output = Result<Option<Reading>, FetchError>> + Send {
        let query = RecentQuery::latest(1).at_location(Some(location.to_string()));
        async move {
            let rows = self.fetch_recent(&query).await?;
            Ok(rows.into_iter().next())
        }
    }
}

impl<S: ReadingSource> ReadingSource for Arc<S> {
    fn fetch_recent(
        &self,
        query: &RecentQuery,
    ) -> impl Future<Output = Result<Vec<Reading>, FetchError>> + Send {
        self.as_ref().fetch_recent(query)
    }
}

#[derive(Debug, Clone)]
pub struct PgReadingStore {
    pool: PgPool,
}

impl PgReadingStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn insert(&self, reading: &NewReading) -> Result<Reading, FetchError> {
        let row: Reading = sqlx::query_as(&format!(
            r#"
            INSERT INTO sidewalk_data
                (lokasi, kota, energi_harian, efisiensi, pejalan_kaki_per_hari, latitude, longitude)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {READING_COLUMNS}
            "#
        ))
        .bind(reading.location.trim())
        .bind(reading.city.trim())
        .bind(reading.daily_energy_kwh)
        .bind(reading.efficiency_percent)
        .bind(reading.pedestrians_per_day)
        .bind(reading.latitude)
        .bind(reading.longitude)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }
}

impl ReadingSource for PgReadingStore {
    async fn fetch_recent(&self, query: &RecentQuery) -> Result<Vec<Reading>, FetchError> {
        let rows: Vec<Reading> = sqlx::query_as(&format!(
            r#"
            SELECT {READING_COLUMNS}
            FROM sidewalk_data
            WHERE ($2::text IS NULL OR lokasi = $2)
            ORDER BY created_at DESC
            LIMIT $1
            "#
        ))
        .bind(query.limit.clamp(1, MAX_RECENT_LIMIT))
        .bind(query.location.as_deref())
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LenientNumber {
    Int(i64),
    Float(f64),
    Text(String),
}

pub(crate) fn lenient_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    match LenientNumber::deserialize(deserializer)? {
        LenientNumber::Int(value) => Ok(value as f64),
        LenientNumber::Float(value) => Ok(value),
        LenientNumber::Text(text) => text
            .trim()
            .parse::<f64>()
            .map_err(|_| serde::de::Error::custom(format!("invalid number {text:?}"))),
    }
}

pub(crate) fn lenient_i64<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    match LenientNumber::deserialize(deserializer)? {
        LenientNumber::Int(value) => Ok(value),
        LenientNumber::Float(value) if value.is_finite() => Ok(value.round() as i64),
        LenientNumber::Float(value) => Err(serde::de::Error::custom(format!(
            "invalid integer {value}"
        ))),
        LenientNumber::Text(text) => text
            .trim()
            .parse::<i64>()
            .map_err(|_| serde::de::Error::custom(format!("invalid integer {text:?}"))),
    }
}
