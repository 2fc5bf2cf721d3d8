//! Deterministic, rule-based substitutes for AI-derived advice.
//!
//! Each generator inspects only the telemetry snapshot and produces a fixed
//! payload, so the app keeps rendering sensible advice when the generative
//! API fails or returns garbage. These rules define the observable behavior
//! of the degraded mode and must stay stable.

use super::models::{
    CropRecommendation, IrrigationPlan, ManagementPrescription, NutrientPlan, RoadmapStep,
    SoilInsight,
};
use crate::models::TelemetrySnapshot;

/// Moisture below this percentage counts as a dry field.
pub const DRY_MOISTURE_THRESHOLD: f64 = 20.0;

fn is_dry(data: &TelemetrySnapshot) -> bool {
    matches!(data.moisture, Some(m) if m < DRY_MOISTURE_THRESHOLD)
}

/// Always exactly three suggestions; the top pick flips between a
/// drought-tolerant and a water-intensive crop on the dryness rule.
pub fn fallback_crops(data: &TelemetrySnapshot) -> Vec<CropRecommendation> {
    let dry = is_dry(data);
    vec![
        CropRecommendation {
            name: if dry { "Millets" } else { "Hybrid Rice" }.to_string(),
            suitability: 90.0,
            expected_yield: if dry { "2.0t/ha" } else { "7.5t/ha" }.to_string(),
            requirements: "Resilient to current profile.".to_string(),
            fertilizer: "Urea".to_string(),
            icon: "fa-wheat-awn".to_string(),
        },
        CropRecommendation {
            name: "Potato".to_string(),
            suitability: 82.0,
            expected_yield: "22t/ha".to_string(),
            requirements: "Needs loose soil.".to_string(),
            fertilizer: "MOP".to_string(),
            icon: "fa-potato".to_string(),
        },
        CropRecommendation {
            name: "Eggplant".to_string(),
            suitability: 75.0,
            expected_yield: "18t/ha".to_string(),
            requirements: "High Nitrogen needs.".to_string(),
            fertilizer: "Organic".to_string(),
            icon: "fa-seedling".to_string(),
        },
    ]
}

pub fn fallback_soil_insight(data: &TelemetrySnapshot) -> SoilInsight {
    let has_moisture = data.moisture.is_some();
    let dry = is_dry(data);
    SoilInsight {
        summary: if has_moisture {
            format!(
                "System diagnostics focusing on {}.",
                if dry { "water replenishment" } else { "soil stability" }
            )
        } else {
            "Awaiting primary sensor registration for moisture profiling.".to_string()
        },
        soil_fertilizer: if dry {
            "Priority: Drip irrigation cycle.".to_string()
        } else {
            "Register pH probe for accurate NPK strategy.".to_string()
        },
    }
}

/// Irrigation is prescribed only on a confirmed dry reading; nutrients only
/// when a nitrogen probe reports. No fertilizer quantities can be estimated
/// deterministically, so the dose list stays empty.
pub fn fallback_prescription(data: &TelemetrySnapshot) -> ManagementPrescription {
    let dry = is_dry(data);
    ManagementPrescription {
        irrigation: IrrigationPlan {
            needed: dry,
            volume: if dry { "12,000L/ha" } else { "Monitoring" }.to_string(),
            schedule: "Pre-dawn".to_string(),
        },
        nutrient: NutrientPlan {
            needed: data.npk_n.is_some(),
            fertilizers: Vec::new(),
            advice: "NPK probe required for prescription.".to_string(),
        },
    }
}

/// One step per reporting channel, in fixed priority order. A field with no
/// telemetry at all gets a single urgent install-sensors step instead of an
/// empty roadmap.
pub fn fallback_roadmap(data: &TelemetrySnapshot) -> Vec<RoadmapStep> {
    let mut roadmap = Vec::new();

    if data.moisture.is_some() {
        roadmap.push(RoadmapStep {
            priority: "HIGH".to_string(),
            title: "Moisture Balance".to_string(),
            description: "Correcting water volume based on FDR sensor.".to_string(),
            icon: "fa-droplet".to_string(),
        });
    }
    if data.ph_level.is_some() {
        roadmap.push(RoadmapStep {
            priority: "MEDIUM".to_string(),
            title: "pH Correction".to_string(),
            description: "Neutralizing soil based on probe data.".to_string(),
            icon: "fa-scale-balanced".to_string(),
        });
    }
    if data.npk_n.is_some() {
        roadmap.push(RoadmapStep {
            priority: "MEDIUM".to_string(),
            title: "Nutrient Sync".to_string(),
            description: "Applying supplement based on NPK analyzer.".to_string(),
            icon: "fa-flask".to_string(),
        });
    }

    if roadmap.is_empty() {
        roadmap.push(RoadmapStep {
            priority: "URGENT".to_string(),
            title: "Sensor Installation".to_string(),
            description: "No sensors detected. Please register hardware at the Sensors page."
                .to_string(),
            icon: "fa-satellite-dish".to_string(),
        });
    }
    roadmap
}

#[cfg(test)]
mod tests {
    use super::*;

    fn telemetry(moisture: Option<f64>, ph_level: Option<f64>, npk_n: Option<f64>) -> TelemetrySnapshot {
        TelemetrySnapshot {
            moisture,
            ph_level,
            npk_n,
            ..Default::default()
        }
    }

    #[test]
    fn crop_list_always_has_three_entries() {
        assert_eq!(fallback_crops(&telemetry(None, None, None)).len(), 3);
        assert_eq!(fallback_crops(&telemetry(Some(5.0), None, None)).len(), 3);
        assert_eq!(fallback_crops(&telemetry(Some(80.0), Some(6.5), Some(30.0))).len(), 3);
    }

    #[test]
    fn dry_field_tops_with_drought_tolerant_crop() {
        let crops = fallback_crops(&telemetry(Some(15.0), None, None));
        assert_eq!(crops[0].name, "Millets");
        assert_eq!(crops[0].expected_yield, "2.0t/ha");
    }

    #[test]
    fn moist_or_unknown_field_tops_with_water_intensive_crop() {
        assert_eq!(fallback_crops(&telemetry(Some(45.0), None, None))[0].name, "Hybrid Rice");
        assert_eq!(fallback_crops(&telemetry(None, None, None))[0].name, "Hybrid Rice");
    }

    #[test]
    fn threshold_is_strictly_below_twenty() {
        assert_eq!(fallback_crops(&telemetry(Some(20.0), None, None))[0].name, "Hybrid Rice");
        assert_eq!(fallback_crops(&telemetry(Some(19.99), None, None))[0].name, "Millets");
    }

    #[test]
    fn irrigation_needed_only_on_confirmed_dry_reading() {
        assert!(fallback_prescription(&telemetry(Some(15.0), None, None)).irrigation.needed);
        assert!(!fallback_prescription(&telemetry(Some(25.0), None, None)).irrigation.needed);
        assert!(!fallback_prescription(&telemetry(None, None, None)).irrigation.needed);
    }

    #[test]
    fn nutrient_needed_tracks_nitrogen_presence() {
        let with_n = fallback_prescription(&telemetry(None, None, Some(12.0)));
        assert!(with_n.nutrient.needed);
        assert!(with_n.nutrient.fertilizers.is_empty());

        let without_n = fallback_prescription(&telemetry(Some(10.0), Some(7.0), None));
        assert!(!without_n.nutrient.needed);
    }

    #[test]
    fn soil_insight_branches_on_moisture() {
        let dry = fallback_soil_insight(&telemetry(Some(10.0), None, None));
        assert!(dry.summary.contains("water replenishment"));
        assert_eq!(dry.soil_fertilizer, "Priority: Drip irrigation cycle.");

        let stable = fallback_soil_insight(&telemetry(Some(40.0), None, None));
        assert!(stable.summary.contains("soil stability"));

        let unknown = fallback_soil_insight(&telemetry(None, None, None));
        assert!(unknown.summary.contains("Awaiting primary sensor registration"));
    }

    #[test]
    fn roadmap_emits_one_step_per_present_channel_in_order() {
        let steps = fallback_roadmap(&telemetry(Some(30.0), Some(6.8), Some(20.0)));
        let titles: Vec<&str> = steps.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["Moisture Balance", "pH Correction", "Nutrient Sync"]);
        assert_eq!(steps[0].priority, "HIGH");
        assert_eq!(steps[1].priority, "MEDIUM");
        assert_eq!(steps[2].priority, "MEDIUM");

        let partial = fallback_roadmap(&telemetry(None, Some(6.8), None));
        assert_eq!(partial.len(), 1);
        assert_eq!(partial[0].title, "pH Correction");
    }

    #[test]
    fn empty_telemetry_yields_single_urgent_step() {
        let steps = fallback_roadmap(&telemetry(None, None, None));
        assert_eq!(steps.len(), 1);
        assert_eq!(steps[0].priority, "URGENT");
        assert_eq!(steps[0].title, "Sensor Installation");
    }
}
