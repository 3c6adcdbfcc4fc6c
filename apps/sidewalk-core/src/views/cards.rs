use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::services::insights::InsightReport;
use crate::services::readings::Reading;
use crate::views::catalog::{
    HourlyEnergySeed, LocationSeed, MapSiteSeed, RegionSeed, HOURLY_ENERGY, MAP_SITES, REGIONS,
};
use crate::views::pagination::{paginate, Page};
use crate::views::stats::{bar_width, mean, percent_of_target, sum, trend_bar_width, BatchSummary};
use crate::views::status::{
    efficiency_tone, priority_tone, region_trend_tone, status_badge, trend_tone, StatusBadge,
    StatusScale, Tone,
};

// Full-scale values for the per-row progress bars.
const LOCATION_ENERGY_SCALE_KWH: f64 = 1.0;
const LOCATION_PEDESTRIAN_SCALE: f64 = 1000.0;
const REGION_ENERGY_SCALE_KWH: f64 = 4.0;

/// One live reading as the real-time feed renders it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReadingCard {
    pub id: Uuid,
    pub location: String,
    pub city: String,
    pub created_at: DateTime<Utc>,
    pub energy_kwh: String,
    pub efficiency_percent: f64,
    pub efficiency_tone: Tone,
    pub pedestrians_per_day: i64,
    pub coordinates: String,
}

impl From<&Reading> for ReadingCard {
    fn from(reading: &Reading) -> Self {
        Self {
            id: reading.id,
            location: reading.location.clone(),
            city: reading.city.clone(),
            created_at: reading.created_at,
            energy_kwh: format!("{:.4}", reading.daily_energy_kwh),
            efficiency_percent: reading.efficiency_percent,
            efficiency_tone: efficiency_tone(reading.efficiency_percent),
            pedestrians_per_day: reading.pedestrians_per_day,
            coordinates: format!("{:.4}, {:.4}", reading.latitude, reading.longitude),
        }
    }
}

pub fn reading_cards(readings: &[Reading]) -> Vec<ReadingCard> {
    readings.iter().map(ReadingCard::from).collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocationRow {
    pub id: u32,
    pub name: &'static str,
    pub region: &'static str,
    pub energy_kwh: f64,
    pub energy_bar: f64,
    pub efficiency_percent: f64,
    pub efficiency_bar: f64,
    pub pedestrians_per_day: i64,
    pub pedestrian_bar: f64,
    pub latitude: f64,
    pub longitude: f64,
    pub badge: StatusBadge,
}

impl From<&LocationSeed> for LocationRow {
    fn from(seed: &LocationSeed) -> Self {
        Self {
            id: seed.id,
            name: seed.name,
            region: seed.region,
            energy_kwh: seed.energy_kwh,
            energy_bar: bar_width(percent_of_target(seed.energy_kwh, LOCATION_ENERGY_SCALE_KWH)),
            efficiency_percent: seed.efficiency_percent,
            efficiency_bar: bar_width(seed.efficiency_percent),
            pedestrians_per_day: seed.pedestrians_per_day,
            pedestrian_bar: bar_width(percent_of_target(
                seed.pedestrians_per_day as f64,
                LOCATION_PEDESTRIAN_SCALE,
            )),
            latitude: seed.latitude,
            longitude: seed.longitude,
            badge: status_badge(StatusScale::Performance, seed.status),
        }
    }
}

pub fn locations_page(seeds: &[LocationSeed], page_size: usize, page: i64) -> Page<LocationRow> {
    let rows: Vec<LocationRow> = seeds.iter().map(LocationRow::from).collect();
    paginate(&rows, page_size, page)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionCard {
    pub id: u32,
    pub name: &'static str,
    pub energy_kwh: f64,
    pub energy_bar: f64,
    pub efficiency_percent: f64,
    pub efficiency_bar: f64,
    pub sidewalks: u32,
    pub population: u64,
    pub population_label: String,
    pub trend_percent: f64,
    pub trend_label: String,
    pub trend_tone: Tone,
    pub trend_bar: f64,
    pub badge: StatusBadge,
}

impl From<&RegionSeed> for RegionCard {
    fn from(seed: &RegionSeed) -> Self {
        let sign = if seed.trend_percent >= 0.0 { "+" } else { "" };
        Self {
            id: seed.id,
            name: seed.name,
            energy_kwh: seed.energy_kwh,
            energy_bar: bar_width(percent_of_target(seed.energy_kwh, REGION_ENERGY_SCALE_KWH)),
            efficiency_percent: seed.efficiency_percent,
            efficiency_bar: bar_width(seed.efficiency_percent),
            sidewalks: seed.sidewalks,
            population: seed.population,
            population_label: format!("{:.0}K", seed.population as f64 / 1000.0),
            trend_percent: seed.trend_percent,
            trend_label: format!("{sign}{}%", seed.trend_percent),
            trend_tone: region_trend_tone(seed.trend_percent),
            trend_bar: trend_bar_width(seed.trend_percent),
            badge: status_badge(StatusScale::Performance, seed.status),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionsView {
    pub regions: Vec<RegionCard>,
    pub total_regions: usize,
    pub avg_efficiency_percent: f64,
    pub total_sidewalks: u32,
    pub total_energy_kwh: f64,
}

pub fn regions_view(seeds: &[RegionSeed]) -> RegionsView {
    RegionsView {
        regions: seeds.iter().map(RegionCard::from).collect(),
        total_regions: seeds.len(),
        avg_efficiency_percent: mean(seeds.iter().map(|r| r.efficiency_percent)).round(),
        total_sidewalks: seeds.iter().map(|r| r.sidewalks).sum(),
        total_energy_kwh: round_to(sum(seeds.iter().map(|r| r.energy_kwh)), 1),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapSite {
    pub id: u32,
    pub name: &'static str,
    pub latitude: f64,
    pub longitude: f64,
    pub energy_kwh: f64,
    pub efficiency_percent: f64,
    pub badge: StatusBadge,
}

impl From<&MapSiteSeed> for MapSite {
    fn from(seed: &MapSiteSeed) -> Self {
        Self {
            id: seed.id,
            name: seed.name,
            latitude: seed.latitude,
            longitude: seed.longitude,
            energy_kwh: seed.energy_kwh,
            efficiency_percent: seed.efficiency_percent,
            badge: status_badge(StatusScale::Map, seed.status),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapView {
    pub sites: Vec<MapSite>,
    pub total_sites: usize,
    pub avg_efficiency_percent: f64,
}

pub fn map_view(seeds: &[MapSiteSeed]) -> MapView {
    MapView {
        sites: seeds.iter().map(MapSite::from).collect(),
        total_sites: seeds.len(),
        avg_efficiency_percent: mean(seeds.iter().map(|s| s.efficiency_percent)).round(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPoint {
    pub time: &'static str,
    pub energy_wh: f64,
    pub pedestrians: i64,
}

impl From<&HourlyEnergySeed> for ChartPoint {
    fn from(seed: &HourlyEnergySeed) -> Self {
        Self {
            time: seed.time,
            energy_wh: seed.energy_wh,
            pedestrians: seed.pedestrians,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnergyChartView {
    pub points: Vec<ChartPoint>,
    pub total_energy_wh: f64,
    pub peak: Option<ChartPoint>,
}

pub fn energy_chart_view(seeds: &[HourlyEnergySeed]) -> EnergyChartView {
    let points: Vec<ChartPoint> = seeds.iter().map(ChartPoint::from).collect();
    let peak = points
        .iter()
        .max_by(|a, b| a.energy_wh.total_cmp(&b.energy_wh))
        .cloned();
    EnergyChartView {
        total_energy_wh: sum(points.iter().map(|p| p.energy_wh)),
        points,
        peak,
    }
}

/// Headline cards computed from the most recent batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSummary {
    #[serde(flatten)]
    pub summary: BatchSummary,
    pub active_locations: usize,
    pub energy_target_kwh: f64,
    pub target_progress_percent: f64,
    pub target_bar: f64,
    pub recent: Vec<ReadingCard>,
}

pub fn dashboard_summary(readings: &[Reading], energy_target_kwh: f64) -> DashboardSummary {
    let summary = BatchSummary::from_readings(readings);
    let progress = percent_of_target(summary.total_energy_kwh, energy_target_kwh);
    DashboardSummary {
        active_locations: summary.active_locations(),
        energy_target_kwh,
        target_progress_percent: progress,
        target_bar: bar_width(progress),
        recent: reading_cards(readings),
        summary,
    }
}

/// Badge tones for rendering an insight report.
#[derive(Debug, Clone, PartialEq, Serialize, utoipa::ToSchema)]
pub struct ReportTones {
    pub energy: Tone,
    pub efficiency: Tone,
    pub pedestrians: Tone,
    /// One per action plan, in report order.
    pub action_plans: Vec<Tone>,
}

impl From<&InsightReport> for ReportTones {
    fn from(report: &InsightReport) -> Self {
        Self {
            energy: trend_tone(report.trends.energy),
            efficiency: trend_tone(report.trends.efficiency),
            pedestrians: trend_tone(report.trends.pedestrians),
            action_plans: report
                .action_plans
                .iter()
                .map(|plan| priority_tone(plan.priority))
                .collect(),
        }
    }
}

/// Default seed-backed views, bundled for the dashboard's first paint.
pub fn seeded_regions() -> RegionsView {
    regions_view(&REGIONS)
}

pub fn seeded_map() -> MapView {
    map_view(&MAP_SITES)
}

pub fn seeded_energy_chart() -> EnergyChartView {
    energy_chart_view(&HOURLY_ENERGY)
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
