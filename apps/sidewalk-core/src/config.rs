use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use url::Url;

const DEFAULT_SETUP_CONFIG_PATH: &str = "/etc/sidewalk/config.json";
const DEFAULT_COMPLETION_API_BASE_URL: &str = "https://api.openai.com";
const DEFAULT_COMPLETION_MODEL: &str = "gpt-4o-mini";

pub(crate) fn setup_config_path() -> PathBuf {
    if let Ok(path) = std::env::var("SIDEWALK_SETUP_CONFIG_PATH") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return PathBuf::from(trimmed);
        }
    }
    PathBuf::from(DEFAULT_SETUP_CONFIG_PATH)
}

#[derive(Debug, Clone, Default, Deserialize)]
struct SetupConfigOverrides {
    #[serde(default)]
    database_url: Option<String>,
    #[serde(default)]
    completion_api_base_url: Option<String>,
    #[serde(default)]
    completion_api_key: Option<String>,
    #[serde(default)]
    completion_model: Option<String>,
    #[serde(default)]
    live_working_set_cap: Option<usize>,
    #[serde(default)]
    live_dedupe_by_id: Option<bool>,
}

fn load_setup_config_overrides(path: &Path) -> Option<SetupConfigOverrides> {
    if !path.exists() {
        return None;
    }
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) => {
            tracing::warn!(
                path = %path.display(),
                error = %err,
                "failed to read setup config; using env defaults"
            );
            return None;
        }
    };
    match serde_json::from_str(&contents) {
        Ok(value) => Some(value),
        Err(err) => {
            tracing::warn!(
                path = %path.display(),
                error = %err,
                "failed to parse setup config; using env defaults"
            );
            None
        }
    }
}

fn apply_setup_overrides(config: &mut CoreConfig, overrides: &SetupConfigOverrides) {
    if let Some(url) = overrides
        .completion_api_base_url
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
    {
        config.completion_api_base_url = url.trim_end_matches('/').to_string();
    }
    if config.completion_api_key.is_none() {
        config.completion_api_key = overrides
            .completion_api_key
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(|v| v.to_string());
    }
    if let Some(model) = overrides
        .completion_model
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
    {
        config.completion_model = model.to_string();
    }
    if let Some(cap) = overrides.live_working_set_cap.filter(|v| *v != 0) {
        config.live_working_set_cap = cap.min(MAX_WORKING_SET_CAP);
    }
    if let Some(dedupe) = overrides.live_dedupe_by_id {
        config.live_dedupe_by_id = dedupe;
    }
}

const MAX_WORKING_SET_CAP: usize = 500;

#[derive(Debug, Clone)]
pub struct CoreConfig {
    pub database_url: String,
    pub apply_schema_on_startup: bool,
    pub completion_api_base_url: String,
    pub completion_api_key: Option<String>,
    pub completion_model: String,
    pub live_working_set_cap: usize,
    pub live_dedupe_by_id: bool,
    pub live_broadcast_capacity: usize,
    pub recent_readings_limit: i64,
    pub analysis_batch_limit: i64,
    pub locations_page_size: usize,
    pub daily_energy_target_kwh: f64,
}

impl CoreConfig {
    pub fn from_env() -> Result<Self> {
        let setup_overrides = load_setup_config_overrides(&setup_config_path());

        let database_url = env_optional_string("SIDEWALK_DATABASE_URL")
            .or_else(|| env_optional_string("DATABASE_URL"))
            .or_else(|| {
                setup_overrides
                    .as_ref()
                    .and_then(|ov| ov.database_url.as_deref())
                    .map(str::trim)
                    .filter(|value| !value.is_empty())
                    .map(|value| value.to_string())
            })
            .context("SIDEWALK_DATABASE_URL must be set (or present as database_url in the setup config)")?;
        let database_url = normalize_database_url(database_url);

        let completion_api_base_url = env_string(
            "SIDEWALK_COMPLETION_API_BASE_URL",
            DEFAULT_COMPLETION_API_BASE_URL,
        )
        .trim_end_matches('/')
        .to_string();
        let completion_api_key = env_optional_string("SIDEWALK_OPENAI_API_KEY")
            .or_else(|| env_optional_string("OPENAI_API_KEY"));
        let completion_model = env_string("SIDEWALK_COMPLETION_MODEL", DEFAULT_COMPLETION_MODEL);

        let apply_schema_on_startup = env_bool("SIDEWALK_APPLY_SCHEMA", true);
        let live_working_set_cap =
            env_u64("SIDEWALK_LIVE_WORKING_SET_CAP", 10).clamp(1, MAX_WORKING_SET_CAP as u64) as usize;
        let live_dedupe_by_id = env_bool("SIDEWALK_LIVE_DEDUPE_BY_ID", false);
        let live_broadcast_capacity =
            env_u64("SIDEWALK_LIVE_BROADCAST_CAPACITY", 256).clamp(16, 65_536) as usize;
        let recent_readings_limit = env_u64("SIDEWALK_RECENT_READINGS_LIMIT", 10).clamp(1, 500) as i64;
        let analysis_batch_limit = env_u64("SIDEWALK_ANALYSIS_BATCH_LIMIT", 50).clamp(1, 500) as i64;
        let locations_page_size = env_u64("SIDEWALK_LOCATIONS_PAGE_SIZE", 5).clamp(1, 100) as usize;
        let daily_energy_target_kwh = env_f64("SIDEWALK_DAILY_ENERGY_TARGET_KWH", 10.0);

        let mut config = Self {
            database_url,
            apply_schema_on_startup,
            completion_api_base_url,
            completion_api_key,
            completion_model,
            live_working_set_cap,
            live_dedupe_by_id,
            live_broadcast_capacity,
            recent_readings_limit,
            analysis_batch_limit,
            locations_page_size,
            daily_energy_target_kwh,
        };

        if let Some(overrides) = setup_overrides.as_ref() {
            apply_setup_overrides(&mut config, overrides);
        }

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        let url = Url::parse(&self.completion_api_base_url).with_context(|| {
            format!(
                "SIDEWALK_COMPLETION_API_BASE_URL is not a valid URL ({})",
                self.completion_api_base_url
            )
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            anyhow::bail!("SIDEWALK_COMPLETION_API_BASE_URL must use http or https");
        }
        Ok(())
    }
}

fn env_string(key: &str, default: &str) -> String {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn env_optional_string(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn env_bool(key: &str, default: bool) -> bool {
    match std::env::var(key)
        .ok()
        .map(|value| value.trim().to_lowercase())
    {
        Some(value) if value == "1" || value == "true" || value == "yes" => true,
        Some(value) if value == "0" || value == "false" || value == "no" => false,
        _ => default,
    }
}

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|value| value.trim().parse::<u64>().ok())
        .unwrap_or(default)
}

fn env_f64(key: &str, default: f64) -> f64 {
    std::env::var(key)
        .ok()
        .and_then(|value| value.trim().parse::<f64>().ok())
        .filter(|value| value.is_finite() && *value > 0.0)
        .unwrap_or(default)
}

fn normalize_database_url(url: String) -> String {
    if let Some(stripped) = url.strip_prefix("postgres://") {
        return format!("postgresql://{stripped}");
    }
    url
}
