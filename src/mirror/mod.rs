//! Local best-effort mirror of the remote `sensors` collection.
//!
//! The mirror is the read path of last resort: when the remote store is
//! unreachable or denies access, callers degrade to whatever was cached here
//! instead of losing visibility of previously known sensors. Writes are
//! best-effort and never fail the calling operation.

pub mod store;

#[cfg(test)]
mod tests;

pub use self::store::{FileStore, KeyValueStore, MemoryStore};

use crate::models::Sensor;
use tracing::{debug, warn};

/// The single storage key under which the serialized sensor list lives.
pub const MIRROR_KEY: &str = "sensors";

pub struct SensorMirror {
    store: Box<dyn KeyValueStore>,
}

impl SensorMirror {
    pub fn new(store: Box<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Reads the full mirrored sensor list. Missing or unreadable content is
    /// an empty list, never an error: a corrupt cache must not take the data
    /// path down with it.
    pub fn read_all(&self) -> Vec<Sensor> {
        let Some(raw) = self.store.get(MIRROR_KEY) else {
            return Vec::new();
        };
        match serde_json::from_str::<Vec<Sensor>>(&raw) {
            Ok(sensors) => sensors,
            Err(e) => {
                warn!("sensor mirror content unreadable, treating as empty: {}", e);
                Vec::new()
            }
        }
    }

    /// Mirror entries whose `field_id` is in `field_ids`.
    pub fn read_for_fields(&self, field_ids: &[i64]) -> Vec<Sensor> {
        self.read_all()
            .into_iter()
            .filter(|s| field_ids.contains(&s.field_id))
            .collect()
    }

    /// Replaces the mirror wholesale. Persistence failures are swallowed.
    pub fn write_all(&self, sensors: &[Sensor]) {
        match serde_json::to_string(sensors) {
            Ok(raw) => self.store.set(MIRROR_KEY, &raw),
            Err(e) => debug!("failed to serialize sensor mirror: {}", e),
        }
    }

    /// Replaces the entry with a matching `sensor_id` in place, keeping the
    /// order of the other entries; unknown ids are prepended. Persists the
    /// full mirror afterwards.
    pub fn upsert(&self, sensor: Sensor) {
        let mut all = self.read_all();
        if let Some(slot) = all.iter_mut().find(|s| s.sensor_id == sensor.sensor_id) {
            *slot = sensor;
        } else {
            all.insert(0, sensor);
        }
        self.write_all(&all);
    }

    /// Drops the entry with the given id, then persists.
    pub fn remove(&self, sensor_id: i64) {
        let all: Vec<Sensor> = self
            .read_all()
            .into_iter()
            .filter(|s| s.sensor_id != sensor_id)
            .collect();
        self.write_all(&all);
    }

    /// Reconciles the mirror after a successful remote sync of `field_ids`:
    /// the new mirror is the fetched sensors plus every prior entry whose
    /// field was *not* part of the sync. A partial sync therefore never
    /// discards unrelated cached fields.
    pub fn merge_synced(&self, fetched: &[Sensor], field_ids: &[i64]) -> Vec<Sensor> {
        let mut merged: Vec<Sensor> = fetched.to_vec();
        merged.extend(
            self.read_all()
                .into_iter()
                .filter(|s| !field_ids.contains(&s.field_id)),
        );
        self.write_all(&merged);
        merged
    }
}
