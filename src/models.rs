use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};

/// A registered user profile, stored in the `users` collection.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub subscription_plan: String,
    pub subscription_end: String,
}

impl User {
    /// Synthesizes the profile persisted on first login, when no document
    /// exists yet for the authenticated uid: a one-year "basic" subscription,
    /// named after the local part of the email address.
    pub fn default_profile(uid: &str, email: &str) -> Self {
        let name = email.split('@').next().unwrap_or(email).to_string();
        Self {
            id: uid.to_string(),
            name,
            email: email.to_string(),
            subscription_plan: "basic".to_string(),
            subscription_end: (Utc::now() + Duration::days(365)).to_rfc3339(),
        }
    }
}

/// A farm field, stored in the `fields` collection and owned by a user.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Field {
    pub field_id: i64,
    pub user_id: String,
    pub name: String,
    pub location: String,
    pub soil_type: Option<String>,
}

/// A hardware sensor attached to a field, stored in the `sensors` collection
/// and mirrored locally. Measurement channels are `None` when the
/// corresponding probe is not installed; absence is never the same as zero.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Sensor {
    pub sensor_id: i64,
    pub field_id: i64,
    pub name: String,
    pub sensor_type: String,
    pub moisture: Option<f64>,
    pub ph_level: Option<f64>,
    pub npk_n: Option<f64>,
    pub npk_p: Option<f64>,
    pub npk_k: Option<f64>,
    pub temperature: Option<f64>,
}

/// Manually entered readings for a field, stored in `manual_diagnostics`
/// keyed by `field_id`. `updated_at` is stamped on save.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct ManualDiagnostic {
    pub field_id: i64,
    pub moisture: Option<f64>,
    pub ph_level: Option<f64>,
    pub npk_n: Option<f64>,
    pub npk_p: Option<f64>,
    pub npk_k: Option<f64>,
    pub temperature: Option<f64>,
    pub updated_at: Option<String>,
}

/// The currently known readings for a field. Every channel is optional: a
/// missing value means no sensor reports it, and downstream advice must treat
/// that as "unknown" rather than zero.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct TelemetrySnapshot {
    pub moisture: Option<f64>,
    pub ph_level: Option<f64>,
    pub npk_n: Option<f64>,
    pub npk_p: Option<f64>,
    pub npk_k: Option<f64>,
    pub temperature: Option<f64>,
}

impl TelemetrySnapshot {
    /// Folds the sensors attached to `field_id` into a single snapshot.
    /// Later entries win per channel, so callers should pass sensors in
    /// oldest-to-newest order.
    pub fn latest_for_field(sensors: &[Sensor], field_id: i64) -> Self {
        let mut snapshot = Self::default();
        for sensor in sensors.iter().filter(|s| s.field_id == field_id) {
            if sensor.moisture.is_some() {
                snapshot.moisture = sensor.moisture;
            }
            if sensor.ph_level.is_some() {
                snapshot.ph_level = sensor.ph_level;
            }
            if sensor.npk_n.is_some() {
                snapshot.npk_n = sensor.npk_n;
            }
            if sensor.npk_p.is_some() {
                snapshot.npk_p = sensor.npk_p;
            }
            if sensor.npk_k.is_some() {
                snapshot.npk_k = sensor.npk_k;
            }
            if sensor.temperature.is_some() {
                snapshot.temperature = sensor.temperature;
            }
        }
        snapshot
    }

    /// Whether any primary channel reports at all. Moisture, pH and nitrogen
    /// are the channels that drive advice; P/K/temperature never appear alone.
    pub fn has_any(&self) -> bool {
        self.moisture.is_some() || self.ph_level.is_some() || self.npk_n.is_some()
    }
}
