use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::sync::OnceLock;

use crate::error::{CompletionError, ParseError};
use crate::services::completion::{CompletionClient, CompletionParams};
use crate::services::readings::Reading;
use crate::views::stats::BatchSummary;

pub const ANALYSIS_PARAMS: CompletionParams = CompletionParams {
    max_tokens: 1500,
    temperature: 0.3,
};

const RECENT_ROWS_IN_PROMPT: usize = 10;

const ANALYST_SYSTEM_PROMPT: &str = "Anda adalah data analyst expert yang berpengalaman dalam analisis sistem energy management dan IoT. Berikan analisis yang tajam dan actionable.";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
    #[default]
    #[serde(other)]
    Stable,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Trends {
    #[serde(default)]
    pub energy: Trend,
    #[serde(default)]
    pub efficiency: Trend,
    #[serde(default)]
    pub pedestrians: Trend,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ActionPlan {
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub timeframe: String,
}

impl ActionPlan {
    fn new(priority: Priority, title: &str, description: &str, timeframe: &str) -> Self {
        Self {
            priority,
            title: title.to_string(),
            description: description.to_string(),
            timeframe: timeframe.to_string(),
        }
    }
}

/// Narrative summary of a batch of readings. Built per request and never
/// stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InsightReport {
    pub summary: String,
    #[serde(default)]
    pub trends: Trends,
    #[serde(default)]
    pub insights: Vec<String>,
    #[serde(default)]
    pub action_plans: Vec<ActionPlan>,
    #[serde(default)]
    pub recommendations: Vec<String>,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|item| item.to_string()).collect()
}

/// Deterministic report built from the batch aggregates alone.
pub fn fallback_report(summary: &BatchSummary) -> InsightReport {
    InsightReport {
        summary: "Sistem piezoelectric menunjukkan performa stabil dengan produksi energi yang konsisten."
            .to_string(),
        trends: Trends::default(),
        insights: vec![
            format!(
                "Total energi {:.2} kWh dihasilkan dari {} pejalan kaki",
                summary.total_energy_kwh, summary.total_pedestrians
            ),
            format!(
                "Efisiensi rata-rata sistem {:.1}%",
                summary.avg_efficiency_percent
            ),
            format!(
                "{} lokasi aktif dengan performa yang bervariasi",
                summary.active_locations()
            ),
        ],
        action_plans: vec![
            ActionPlan::new(
                Priority::Medium,
                "Optimisasi Efisiensi",
                "Lakukan kalibrasi sensor untuk meningkatkan akurasi dan efisiensi sistem",
                "2 minggu",
            ),
            ActionPlan::new(
                Priority::Low,
                "Monitoring Rutin",
                "Implementasi jadwal monitoring harian untuk semua lokasi",
                "1 bulan",
            ),
        ],
        recommendations: strings(&[
            "Lakukan maintenance berkala pada sensor piezoelectric",
            "Monitor pola traffic untuk optimisasi penempatan",
            "Implementasi sistem alert untuk efisiensi rendah",
        ]),
    }
}

/// Returned when the request itself could not be read, so no aggregates exist.
pub fn unavailable_report() -> InsightReport {
    InsightReport {
        summary: "Analisis otomatis mengalami kendala teknis. Data masih dapat dipantau secara manual."
            .to_string(),
        trends: Trends::default(),
        insights: strings(&["Sistem monitoring berjalan normal", "Data IoT terus terkumpul"]),
        action_plans: vec![ActionPlan::new(
            Priority::Medium,
            "Perbaikan Sistem Analisis",
            "Perbaiki sistem analisis otomatis untuk laporan yang lebih detail",
            "1 minggu",
        )],
        recommendations: strings(&[
            "Coba refresh analisis dalam beberapa menit",
            "Pastikan koneksi internet stabil",
        ]),
    }
}

/// Shown by the dashboard panel when the readings could not be loaded.
pub fn panel_fallback_report() -> InsightReport {
    InsightReport {
        summary: "Analisis otomatis tidak tersedia. Silakan refresh untuk mencoba lagi.".to_string(),
        trends: Trends::default(),
        insights: strings(&["Data sedang diproses", "Silakan coba lagi dalam beberapa menit"]),
        action_plans: vec![ActionPlan::new(
            Priority::Medium,
            "Monitoring Berkelanjutan",
            "Lakukan monitoring data secara berkala",
            "1 minggu",
        )],
        recommendations: strings(&[
            "Pastikan sensor berfungsi dengan baik",
            "Lakukan kalibrasi berkala",
        ]),
    }
}

pub fn compose_prompt(summary: &BatchSummary, readings: &[Reading]) -> String {
    let mut recent = String::new();
    for (index, reading) in readings.iter().take(RECENT_ROWS_IN_PROMPT).enumerate() {
        if index > 0 {
            recent.push('\n');
        }
        let _ = write!(
            recent,
            "{}. {} - Energi: {}kWh, Efisiensi: {}%, Pejalan kaki: {}",
            index + 1,
            reading.location,
            reading.daily_energy_kwh,
            reading.efficiency_percent,
            reading.pedestrians_per_day
        );
    }

    format!(
        r#"
Analisis data trotoar piezoelectric berikut dan berikan insights yang actionable:

Data Statistik:
- Total energi dihasilkan: {total_energy:.2} kWh
- Rata-rata efisiensi: {avg_efficiency:.1}%
- Total pejalan kaki: {total_pedestrians}
- Jumlah lokasi: {location_count}
- Lokasi: {locations}

Data terbaru (10 record):
{recent}

Berdasarkan data ini, berikan analisis dalam format JSON dengan struktur berikut:
{{
  "summary": "ringkasan singkat kondisi keseluruhan sistem (1-2 kalimat)",
  "trends": {{
    "energy": "up/down/stable",
    "efficiency": "up/down/stable",
    "pedestrians": "up/down/stable"
  }},
  "insights": ["insight 1", "insight 2", "insight 3"],
  "actionPlans": [
    {{
      "priority": "high/medium/low",
      "title": "judul rencana",
      "description": "deskripsi detail",
      "timeframe": "estimasi waktu"
    }}
  ],
  "recommendations": ["rekomendasi 1", "rekomendasi 2", "rekomendasi 3"]
}}

Fokus pada:
1. Performa energi dan efisiensi
2. Pola penggunaan oleh pejalan kaki
3. Potensi optimisasi
4. Maintenance dan perawatan
5. Expansion opportunities

Berikan insight yang spesifik dan actionable, bukan general. Gunakan bahasa Indonesia.
"#,
        total_energy = summary.total_energy_kwh,
        avg_efficiency = summary.avg_efficiency_percent,
        total_pedestrians = summary.total_pedestrians,
        location_count = summary.active_locations(),
        locations = summary.locations.join(", "),
    )
}

fn fenced_json_regex() -> &'static Regex {
    static FENCED_RE: OnceLock<Regex> = OnceLock::new();
    FENCED_RE.get_or_init(|| {
        Regex::new(r"```(?:json)?[ \t]*\r?\n([\s\S]*?)\r?\n[ \t]*```").expect("valid regex")
    })
}

fn bare_object_regex() -> &'static Regex {
    static OBJECT_RE: OnceLock<Regex> = OnceLock::new();
    OBJECT_RE.get_or_init(|| Regex::new(r"\{[\s\S]*\}").expect("valid regex"))
}

/// Pulls a report out of a model reply: a fenced block, else the outermost
/// braces, else the whole reply. The first candidate that parses wins.
pub fn extract_report(reply: &str) -> Result<InsightReport, ParseError> {
    let fenced = fenced_json_regex()
        .captures(reply)
        .and_then(|caps| caps.get(1))
        .map(|inner| inner.as_str());
    let object = bare_object_regex().find(reply).map(|found| found.as_str());

    for candidate in [fenced, object].into_iter().flatten() {
        if let Ok(report) = serde_json::from_str::<InsightReport>(candidate.trim()) {
            return Ok(report);
        }
    }
    serde_json::from_str::<InsightReport>(reply.trim()).map_err(ParseError)
}

/// How a report was produced. Every variant carries a report to show.
#[derive(Debug)]
pub enum AnalysisOutcome {
    Generated(InsightReport),
    ParseFallback {
        error: ParseError,
        report: InsightReport,
    },
    CompletionFailed {
        error: CompletionError,
        report: InsightReport,
    },
}

impl AnalysisOutcome {
    pub fn report(&self) -> &InsightReport {
        match self {
            Self::Generated(report)
            | Self::ParseFallback { report, .. }
            | Self::CompletionFailed { report, .. } => report,
        }
    }

    pub fn into_report(self) -> InsightReport {
        match self {
            Self::Generated(report)
            | Self::ParseFallback { report, .. }
            | Self::CompletionFailed { report, .. } => report,
        }
    }
}

pub async fn analyze(client: &CompletionClient, readings: &[Reading]) -> AnalysisOutcome {
    tracing::info!(records = readings.len(), "analyzing sidewalk data");
    let summary = BatchSummary::from_readings(readings);
    let prompt = compose_prompt(&summary, readings);

    let reply = match client
        .complete(ANALYST_SYSTEM_PROMPT, &prompt, ANALYSIS_PARAMS)
        .await
    {
        Ok(reply) => reply,
        Err(error) => {
            tracing::error!(error = %error, "insight completion failed; using aggregate fallback");
            return AnalysisOutcome::CompletionFailed {
                error,
                report: fallback_report(&summary),
            };
        }
    };
    tracing::debug!(reply = %reply, "raw completion reply");

    match extract_report(&reply) {
        Ok(report) => AnalysisOutcome::Generated(report),
        Err(error) => {
            tracing::warn!(error = %error, "completion reply was not a report; using aggregate fallback");
            AnalysisOutcome::ParseFallback {
                error,
                report: fallback_report(&summary),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{reading, FakeCompletionServer};

    fn batch() -> Vec<Reading> {
        vec![
            reading("Jl. Ahmad Yani", 1.0, 90.0, 100, 2),
            reading("Jl. Sepinggan", 2.0, 80.0, 200, 1),
            reading("Jl. Ahmad Yani", 3.0, 70.0, 300, 0),
        ]
    }

    const FENCED_REPLY: &str = r#"Berikut analisisnya:
```json
{
  "summary": "Produksi energi naik di pusat kota.",
  "trends": {"energy": "up", "efficiency": "down", "pedestrians": "stable"},
  "insights": ["Jl. Ahmad Yani paling produktif"],
  "actionPlans": [
    {"priority": "high", "title": "Kalibrasi", "description": "Kalibrasi ulang sensor", "timeframe": "3 hari"}
  ],
  "recommendations": ["Tambah unit di Sepinggan"]
}
```
Semoga membantu."#;

    #[test]
    fn prompt_carries_aggregates_and_recent_rows() {
        let readings = batch();
        let summary = BatchSummary::from_readings(&readings);
        let prompt = compose_prompt(&summary, &readings);
        assert!(prompt.contains("- Total energi dihasilkan: 6.00 kWh"));
        assert!(prompt.contains("- Rata-rata efisiensi: 80.0%"));
        assert!(prompt.contains("- Total pejalan kaki: 600"));
        assert!(prompt.contains("- Jumlah lokasi: 2"));
        assert!(prompt.contains("- Lokasi: Jl. Ahmad Yani, Jl. Sepinggan"));
        assert!(prompt.contains("1. Jl. Ahmad Yani - Energi: 1kWh, Efisiensi: 90%, Pejalan kaki: 100"));
        assert!(prompt.contains("\"actionPlans\": ["));
    }

    #[test]
    fn prompt_lists_at_most_ten_rows() {
        let readings: Vec<Reading> = (0..15)
            .map(|n| reading(&format!("site-{n}"), 0.1, 80.0, 10, n))
            .collect();
        let summary = BatchSummary::from_readings(&readings);
        let prompt = compose_prompt(&summary, &readings);
        assert!(prompt.contains("\n10. site-9 "));
        assert!(!prompt.contains("11. site-10"));
    }

    #[test]
    fn fenced_reply_parses_losslessly() {
        let report = extract_report(FENCED_REPLY).expect("report");
        assert_eq!(report.summary, "Produksi energi naik di pusat kota.");
        assert_eq!(report.trends.energy, Trend::Up);
        assert_eq!(report.trends.efficiency, Trend::Down);
        assert_eq!(report.trends.pedestrians, Trend::Stable);
        assert_eq!(report.insights, vec!["Jl. Ahmad Yani paling produktif"]);
        assert_eq!(report.action_plans.len(), 1);
        assert_eq!(report.action_plans[0].priority, Priority::High);
        assert_eq!(report.action_plans[0].timeframe, "3 hari");
        assert_eq!(report.recommendations, vec!["Tambah unit di Sepinggan"]);
    }

    #[test]
    fn bare_object_and_raw_replies_parse() {
        let bare = r#"Hasil: {"summary": "Stabil."} selesai"#;
        assert_eq!(extract_report(bare).expect("bare").summary, "Stabil.");
        let raw = r#"{"summary": "Langsung", "trends": {"energy": "naik"}}"#;
        let report = extract_report(raw).expect("raw");
        assert_eq!(report.trends.energy, Trend::Stable);
    }

    #[test]
    fn unparseable_reply_is_a_parse_error() {
        assert!(extract_report("maaf, saya tidak bisa").is_err());
        assert!(extract_report("```json\n{ broken\n```").is_err());
    }

    #[test]
    fn fallback_uses_batch_aggregates() {
        let summary = BatchSummary::from_readings(&batch());
        let report = fallback_report(&summary);
        assert_eq!(
            report.insights,
            vec![
                "Total energi 6.00 kWh dihasilkan dari 600 pejalan kaki",
                "Efisiensi rata-rata sistem 80.0%",
                "2 lokasi aktif dengan performa yang bervariasi",
            ]
        );
        assert_eq!(report.action_plans[0].priority, Priority::Medium);
        assert_eq!(report.trends, Trends::default());
    }

    #[test]
    fn report_serializes_with_camel_case_action_plans() {
        let value = serde_json::to_value(unavailable_report()).expect("json");
        assert!(value.get("actionPlans").is_some());
        assert_eq!(value["trends"]["energy"], "stable");
        assert_eq!(value["actionPlans"][0]["priority"], "medium");
    }

    #[tokio::test]
    async fn generated_report_from_fenced_reply() {
        let server = FakeCompletionServer::reply(FENCED_REPLY).await;
        let outcome = analyze(&server.client(), &batch()).await;
        assert!(matches!(outcome, AnalysisOutcome::Generated(_)));
        assert_eq!(outcome.report().trends.energy, Trend::Up);

        let request = server.last_request().expect("request");
        assert_eq!(request["max_tokens"], 1500);
        assert_eq!(request["temperature"], 0.3);
        assert_eq!(request["messages"][0]["content"], ANALYST_SYSTEM_PROMPT);
    }

    #[tokio::test]
    async fn malformed_reply_falls_back_to_aggregates() {
        let server = FakeCompletionServer::reply("Energi bagus, tidak ada JSON.").await;
        let outcome = analyze(&server.client(), &batch()).await;
        assert!(matches!(outcome, AnalysisOutcome::ParseFallback { .. }));
        let expected = fallback_report(&BatchSummary::from_readings(&batch()));
        assert_eq!(outcome.into_report(), expected);
    }

    #[tokio::test]
    async fn completion_error_falls_back_to_aggregates() {
        let server = FakeCompletionServer::status(500, "upstream down").await;
        let outcome = analyze(&server.client(), &batch()).await;
        match outcome {
            AnalysisOutcome::CompletionFailed { error, report } => {
                assert_eq!(error.to_string(), "completion API error: 500");
                assert_eq!(report, fallback_report(&BatchSummary::from_readings(&batch())));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }
}
