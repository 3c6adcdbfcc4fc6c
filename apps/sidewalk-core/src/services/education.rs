use serde::Deserialize;

use crate::error::CompletionError;
use crate::services::completion::{CompletionClient, CompletionParams};
use crate::services::readings::{lenient_f64, lenient_i64, Reading};

pub const EDUCATION_PARAMS: CompletionParams = CompletionParams {
    max_tokens: 200,
    temperature: 0.8,
};

const COMMUNICATOR_SYSTEM_PROMPT: &str = "Anda adalah ahli komunikasi publik yang pandai menjelaskan teknologi dengan bahasa sederhana dan menarik.";

const UNNAMED_LOCATION: &str = "lokasi ini";

/// Figures of one location's latest reading, as posted by the public page.
#[derive(Debug, Clone, PartialEq, Deserialize, utoipa::ToSchema)]
pub struct EducationRequest {
    #[serde(deserialize_with = "lenient_f64")]
    pub energi: f64,
    #[serde(deserialize_with = "lenient_i64")]
    pub pejalan_kaki: i64,
    pub lokasi: String,
    #[serde(default)]
    pub kota: String,
}

impl From<&Reading> for EducationRequest {
    fn from(reading: &Reading) -> Self {
        Self {
            energi: reading.daily_energy_kwh,
            pejalan_kaki: reading.pedestrians_per_day,
            lokasi: reading.location.clone(),
            kota: reading.city.clone(),
        }
    }
}

pub fn fallback_text(location: Option<&str>) -> String {
    let location = location
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .unwrap_or(UNNAMED_LOCATION);
    format!(
        "Terima kasih telah berkontribusi untuk energi bersih di {location}! Setiap langkah Anda membantu menciptakan masa depan yang lebih hijau."
    )
}

pub fn compose_prompt(request: &EducationRequest) -> String {
    let others = request.pejalan_kaki.saturating_sub(1).max(0);
    format!(
        r#"
Buatkan teks edukasi yang kreatif dan mudah dipahami masyarakat awam tentang kontribusi energi mereka dari berjalan kaki di trotoar piezoelectric.

Data:
- Lokasi: {lokasi}, {kota}
- Energi yang dihasilkan hari ini: {energi} kWh
- Jumlah pejalan kaki: {pejalan_kaki} orang

Buatlah teks yang:
1. Menggunakan bahasa yang ramah dan mudah dipahami
2. Menjelaskan dampak positif secara konkret (jangan hanya sebut angka kWh)
3. Membuat pembaca merasa bangga dengan kontribusinya
4. Memberikan analogi yang mudah dimengerti (seperti berapa lampu yang bisa menyala, dll)
5. Maksimal 2-3 kalimat
6. Gunakan bahasa Indonesia yang natural

Contoh yang baik: "Luar biasa! Berkat langkah kaki Anda dan {others} pejalan kaki lainnya hari ini, energi yang dihasilkan di {lokasi} sudah cukup untuk menyalakan 12 lampu jalan selama semalam penuh. Setiap langkah Anda berkontribusi untuk masa depan yang lebih hijau!"
"#,
        lokasi = request.lokasi,
        kota = request.kota,
        energi = request.energi,
        pejalan_kaki = request.pejalan_kaki,
    )
}

#[derive(Debug)]
pub enum EducationOutcome {
    Generated(String),
    Fallback {
        error: CompletionError,
        text: String,
    },
}

impl EducationOutcome {
    pub fn text(&self) -> &str {
        match self {
            Self::Generated(text) | Self::Fallback { text, .. } => text,
        }
    }

    pub fn into_text(self) -> String {
        match self {
            Self::Generated(text) | Self::Fallback { text, .. } => text,
        }
    }
}

pub async fn generate(client: &CompletionClient, request: &EducationRequest) -> EducationOutcome {
    tracing::info!(
        lokasi = %request.lokasi,
        kota = %request.kota,
        energi = request.energi,
        pejalan_kaki = request.pejalan_kaki,
        "generating education text"
    );
    let prompt = compose_prompt(request);
    match client
        .complete(COMMUNICATOR_SYSTEM_PROMPT, &prompt, EDUCATION_PARAMS)
        .await
    {
        Ok(text) => EducationOutcome::Generated(text),
        Err(error) => {
            tracing::error!(error = %error, "education text completion failed; using fallback");
            EducationOutcome::Fallback {
                error,
                text: fallback_text(Some(&request.lokasi)),
            }
        }
    }
}
