//! Advisory calls against the Generative Language API.
//!
//! Every operation requests structured JSON output against a typed schema
//! and degrades to the deterministic generators in [`fallback`] when the
//! call fails, the response carries no candidate text, or the text does not
//! parse. Callers always get a payload; `Fetched::fallback` marks the
//! substitutes.

pub mod fallback;
pub mod models;

#[cfg(test)]
mod tests;

use crate::core::Fetched;
use crate::models::{Field, TelemetrySnapshot};
use reqwest::header;
use reqwest_middleware::ClientWithMiddleware;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::warn;

use self::models::{
    Content, CropRecommendation, GenerateContentRequest, GenerateContentResponse,
    GenerationConfig, ManagementPrescription, Part, RoadmapStep, Schema, SoilInsight,
};

const GENERATIVE_LANGUAGE_V1_API: &str = "https://generativelanguage.googleapis.com/v1beta";

pub const DEFAULT_MODEL: &str = "gemini-3-flash-preview";

#[derive(Error, Debug)]
pub enum AdvisorError {
    #[error("HTTP Request failed: {0}")]
    RequestError(#[from] reqwest::Error),
    #[error("Middleware error: {0}")]
    MiddlewareError(#[from] reqwest_middleware::Error),
    #[error("API error: {0}")]
    ApiError(String),
    #[error("response did not parse as structured output: {0}")]
    ParseError(String),
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

/// Client for `models/{model}:generateContent`.
#[derive(Clone)]
pub struct AdvisorClient {
    client: ClientWithMiddleware,
    base_url: String,
    model: String,
}

impl AdvisorClient {
    pub fn new(client: ClientWithMiddleware, model: impl Into<String>) -> Self {
        Self {
            client,
            base_url: GENERATIVE_LANGUAGE_V1_API.to_string(),
            model: model.into(),
        }
    }

    /// Creates a client against a custom base URL (useful for testing).
    pub fn new_with_url(
        client: ClientWithMiddleware,
        base_url: String,
        model: impl Into<String>,
    ) -> Self {
        Self {
            client,
            base_url,
            model: model.into(),
        }
    }

    /// Suggests three crops for a field. Fallback: [`fallback::fallback_crops`].
    pub async fn crop_analysis(
        &self,
        field: &Field,
        data: &TelemetrySnapshot,
    ) -> Fetched<Vec<CropRecommendation>> {
        let prompt = format!(
            "Suggest 3 crops based on the available telemetry or regional context. {}",
            format_prompt(field, data)
        );
        match self.generate(prompt, crop_schema()).await {
            Ok(crops) => Fetched::remote(crops),
            Err(e) => {
                warn!("crop analysis degraded to deterministic fallback: {}", e);
                Fetched::fallback(fallback::fallback_crops(data))
            }
        }
    }

    /// Summarizes soil health. Fallback: [`fallback::fallback_soil_insight`].
    pub async fn soil_health_summary(
        &self,
        field: &Field,
        data: &TelemetrySnapshot,
    ) -> Fetched<SoilInsight> {
        let prompt = format!(
            "Provide Soil Restoration Strategy. {}",
            format_prompt(field, data)
        );
        match self.generate(prompt, soil_insight_schema()).await {
            Ok(insight) => Fetched::remote(insight),
            Err(e) => {
                warn!("soil health summary degraded to deterministic fallback: {}", e);
                Fetched::fallback(fallback::fallback_soil_insight(data))
            }
        }
    }

    /// Produces irrigation and nutrient prescriptions. Fallback:
    /// [`fallback::fallback_prescription`].
    pub async fn management_prescriptions(
        &self,
        field: &Field,
        data: &TelemetrySnapshot,
    ) -> Fetched<ManagementPrescription> {
        let prompt = format!(
            "Create management prescriptions based on telemetry or regional baseline. {}",
            format_prompt(field, data)
        );
        match self.generate(prompt, prescription_schema()).await {
            Ok(prescription) => Fetched::remote(prescription),
            Err(e) => {
                warn!("management prescriptions degraded to deterministic fallback: {}", e);
                Fetched::fallback(fallback::fallback_prescription(data))
            }
        }
    }

    /// Builds a step-by-step operational roadmap. Fallback:
    /// [`fallback::fallback_roadmap`].
    pub async fn operational_roadmap(
        &self,
        field: &Field,
        data: &TelemetrySnapshot,
    ) -> Fetched<Vec<RoadmapStep>> {
        let prompt = format!(
            "Build a 4-step Operational Roadmap. {}",
            format_prompt(field, data)
        );
        match self.generate(prompt, roadmap_schema()).await {
            Ok(steps) => Fetched::remote(steps),
            Err(e) => {
                warn!("operational roadmap degraded to deterministic fallback: {}", e);
                Fetched::fallback(fallback::fallback_roadmap(data))
            }
        }
    }

    async fn generate<T: DeserializeOwned>(
        &self,
        prompt: String,
        schema: Schema,
    ) -> Result<T, AdvisorError> {
        let url = format!(
            "{}/models/{}:generateContent",
            self.base_url, self.model
        );

        let request = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json".to_string(),
                response_schema: schema,
            },
        };

        let response = self
            .client
            .post(&url)
            .header(header::CONTENT_TYPE, "application/json")
            .body(serde_json::to_vec(&request)?)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(AdvisorError::ApiError(format!(
                "Generate content failed {}: {}",
                status, text
            )));
        }

        let body: GenerateContentResponse = response.json().await?;
        let text = body
            .text()
            .ok_or_else(|| AdvisorError::ParseError("no candidate text".to_string()))?;

        clean_and_parse(text)
    }
}

/// Strips Markdown code fences the model sometimes wraps around its JSON,
/// then parses the remainder.
fn clean_and_parse<T: DeserializeOwned>(text: &str) -> Result<T, AdvisorError> {
    let clean = text.replace("```json", "").replace("```", "");
    serde_json::from_str(clean.trim()).map_err(|e| AdvisorError::ParseError(e.to_string()))
}

/// Renders the telemetry snapshot and field context into the prompt. Missing
/// channels are spelled out as offline so the model reasons about absence
/// instead of inventing readings.
fn format_prompt(field: &Field, data: &TelemetrySnapshot) -> String {
    let reading = |value: Option<f64>, unit: &str| match value {
        Some(v) => format!("Current Reading: {:.2}{}", v, unit),
        None => "Current Reading: [OFFLINE - DATA UNAVAILABLE]".to_string(),
    };

    let npk_status = match data.npk_n {
        Some(n) => format!(
            "Nitrogen={}, Phosphorus={}, Potassium={}",
            n,
            data.npk_p.map(|v| v.to_string()).unwrap_or_default(),
            data.npk_k.map(|v| v.to_string()).unwrap_or_default()
        ),
        None => "[OFFLINE - DATA UNAVAILABLE]".to_string(),
    };

    let status = if data.has_any() {
        "ACTIVE"
    } else {
        "BASELINE ESTIMATE ONLY"
    };

    format!(
        "\n[TELEMETRY STATUS: {}]\n\n\
         1. MOISTURE: {}\n\
         2. pH LEVEL: {}\n\
         3. NPK PROFILE: {}\n\
         4. TEMPERATURE: {}\n\n\
         FIELD CONTEXT: {} at {}, Soil Type: {}.\n\n\
         INSTRUCTION:\n\
         - If TELEMETRY is ACTIVE, provide precision advice based on the numbers.\n\
         - If TELEMETRY is BASELINE ESTIMATE ONLY, provide regional agricultural \
         best-practices based on the Field Context (Soil Type and Location) and \
         explicitly mention that these are regional estimates.",
        status,
        reading(data.moisture, "%"),
        reading(data.ph_level, ""),
        npk_status,
        reading(data.temperature, "\u{b0}C"),
        field.name,
        field.location,
        field.soil_type.as_deref().unwrap_or("Loamy"),
    )
}

fn crop_schema() -> Schema {
    Schema::array(Schema::object(
        vec![
            ("name", Schema::string()),
            ("suitability", Schema::number()),
            ("yield", Schema::string()),
            ("requirements", Schema::string()),
            ("fertilizer", Schema::string()),
            ("icon", Schema::string()),
        ],
        &["name", "suitability", "yield", "requirements", "fertilizer", "icon"],
    ))
}

fn soil_insight_schema() -> Schema {
    Schema::object(
        vec![
            ("summary", Schema::string()),
            ("soil_fertilizer", Schema::string()),
        ],
        &["summary", "soil_fertilizer"],
    )
}

fn prescription_schema() -> Schema {
    Schema::object(
        vec![
            (
                "irrigation",
                Schema::object(
                    vec![
                        ("needed", Schema::boolean()),
                        ("volume", Schema::string()),
                        ("schedule", Schema::string()),
                    ],
                    &["needed", "volume", "schedule"],
                ),
            ),
            (
                "nutrient",
                Schema::object(
                    vec![
                        ("needed", Schema::boolean()),
                        (
                            "fertilizers",
                            Schema::array(Schema::object(
                                vec![("type", Schema::string()), ("amount", Schema::string())],
                                &["type", "amount"],
                            )),
                        ),
                        ("advice", Schema::string()),
                    ],
                    &["needed", "fertilizers", "advice"],
                ),
            ),
        ],
        &["irrigation", "nutrient"],
    )
}

fn roadmap_schema() -> Schema {
    Schema::array(Schema::object(
        vec![
            ("priority", Schema::string()),
            ("title", Schema::string()),
            ("description", Schema::string()),
            ("icon", Schema::string()),
        ],
        &["priority", "title", "description", "icon"],
    ))
}
