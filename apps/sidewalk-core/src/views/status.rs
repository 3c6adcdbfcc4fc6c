use serde::{Deserialize, Serialize};

use crate::services::insights::{Priority, Trend};

/// Abstract visual treatment. Clients map tones to their own palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Energy,
    Primary,
    Success,
    Warning,
    Destructive,
    Secondary,
}

/// Installation status as reported by the site catalogs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SiteStatus {
    Optimal,
    Excellent,
    Good,
    Fair,
    Maintenance,
    Unknown,
}

impl SiteStatus {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "optimal" => Self::Optimal,
            "excellent" => Self::Excellent,
            "good" => Self::Good,
            "fair" => Self::Fair,
            "maintenance" => Self::Maintenance,
            _ => Self::Unknown,
        }
    }
}

/// Which label set a view renders statuses with.
///
/// The locations table and region cards use the performance scale
/// (`excellent`..`maintenance`); the map uses its own three-step scale where
/// `fair` is not a recognised state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusScale {
    Performance,
    Map,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusBadge {
    pub status: SiteStatus,
    pub label: &'static str,
    pub tone: Tone,
}

const UNKNOWN_LABEL: &str = "Unknown";

pub fn badge(scale: StatusScale, status: SiteStatus) -> StatusBadge {
    let (label, tone) = match (scale, status) {
        (StatusScale::Performance, SiteStatus::Excellent) => ("Excellent", Tone::Energy),
        (StatusScale::Performance, SiteStatus::Good) => ("Good", Tone::Primary),
        (StatusScale::Performance, SiteStatus::Fair) => ("Fair", Tone::Warning),
        (StatusScale::Performance, SiteStatus::Maintenance) => ("Maintenance", Tone::Destructive),
        (StatusScale::Map, SiteStatus::Optimal) => ("Optimal", Tone::Energy),
        (StatusScale::Map, SiteStatus::Good) => ("Baik", Tone::Primary),
        (StatusScale::Map, SiteStatus::Maintenance) => ("Perlu Maintenance", Tone::Warning),
        _ => (UNKNOWN_LABEL, Tone::Secondary),
    };
    StatusBadge {
        status,
        label,
        tone,
    }
}

pub fn status_badge(scale: StatusScale, raw: &str) -> StatusBadge {
    badge(scale, SiteStatus::parse(raw))
}

/// Reading efficiency badge: green from 90%, amber from 70%.
pub fn efficiency_tone(efficiency_percent: f64) -> Tone {
    if efficiency_percent >= 90.0 {
        Tone::Success
    } else if efficiency_percent >= 70.0 {
        Tone::Warning
    } else {
        Tone::Destructive
    }
}

pub fn region_trend_tone(trend_percent: f64) -> Tone {
    if trend_percent >= 5.0 {
        Tone::Energy
    } else if trend_percent >= 0.0 {
        Tone::Primary
    } else {
        Tone::Destructive
    }
}

pub fn priority_tone(priority: Priority) -> Tone {
    match priority {
        Priority::High => Tone::Destructive,
        Priority::Medium => Tone::Warning,
        Priority::Low => Tone::Success,
        Priority::Unknown => Tone::Secondary,
    }
}

pub fn trend_tone(trend: Trend) -> Tone {
    match trend {
        Trend::Up => Tone::Success,
        Trend::Down => Tone::Destructive,
        Trend::Stable => Tone::Warning,
    }
}
