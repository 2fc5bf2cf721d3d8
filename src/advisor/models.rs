use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One suggested crop, ordered by suitability.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CropRecommendation {
    pub name: String,
    /// Suitability score, 0-100.
    pub suitability: f64,
    #[serde(rename = "yield")]
    pub expected_yield: String,
    pub requirements: String,
    pub fertilizer: String,
    pub icon: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SoilInsight {
    pub summary: String,
    pub soil_fertilizer: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ManagementPrescription {
    pub irrigation: IrrigationPlan,
    pub nutrient: NutrientPlan,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct IrrigationPlan {
    pub needed: bool,
    pub volume: String,
    pub schedule: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct NutrientPlan {
    pub needed: bool,
    pub fertilizers: Vec<FertilizerDose>,
    pub advice: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct FertilizerDose {
    #[serde(rename = "type")]
    pub kind: String,
    pub amount: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RoadmapStep {
    pub priority: String,
    pub title: String,
    pub description: String,
    pub icon: String,
}

// --- Generative Language API wire models ---

#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    pub generation_config: GenerationConfig,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Content {
    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Part {
    pub text: String,
}

#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub response_mime_type: String,
    pub response_schema: Schema,
}

#[derive(Deserialize, Debug, Clone)]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct Candidate {
    pub content: Option<Content>,
}

impl GenerateContentResponse {
    /// The text of the first candidate part, if the model produced one.
    pub fn text(&self) -> Option<&str> {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .and_then(|c| c.parts.first())
            .map(|p| p.text.as_str())
    }
}

/// Structured-output schema sent with every advisory request, restricted to
/// the subset of OpenAPI types the advisory payloads need.
#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Schema {
    #[serde(rename = "type")]
    pub schema_type: SchemaType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<BTreeMap<String, Schema>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<Schema>>,
}

#[derive(Serialize, Debug, Clone, Copy)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SchemaType {
    String,
    Number,
    Boolean,
    Object,
    Array,
}

impl Schema {
    fn scalar(schema_type: SchemaType) -> Self {
        Self {
            schema_type,
            properties: None,
            required: None,
            items: None,
        }
    }

    pub fn string() -> Self {
        Self::scalar(SchemaType::String)
    }

    pub fn number() -> Self {
        Self::scalar(SchemaType::Number)
    }

    pub fn boolean() -> Self {
        Self::scalar(SchemaType::Boolean)
    }

    pub fn array(items: Schema) -> Self {
        Self {
            schema_type: SchemaType::Array,
            properties: None,
            required: None,
            items: Some(Box::new(items)),
        }
    }

    pub fn object(properties: Vec<(&str, Schema)>, required: &[&str]) -> Self {
        Self {
            schema_type: SchemaType::Object,
            properties: Some(
                properties
                    .into_iter()
                    .map(|(k, v)| (k.to_string(), v))
                    .collect(),
            ),
            required: Some(required.iter().map(|r| r.to_string()).collect()),
            items: None,
        }
    }
}
