//! Firestore-backed remote store for fields, sensors, user profiles and
//! manual diagnostics.
//!
//! Data-fetch operations never raise: a permission denial degrades to the
//! local mirror (sensors) or an empty result, anything else is logged and
//! yields an empty result. Mutations reconcile the mirror after the remote
//! attempt so the fallback read path stays consistent with what the caller
//! last wrote.

pub mod models;
pub mod query;


use crate::core::{classify, ErrorKind, Fetched};
use crate::mirror::SensorMirror;
use crate::models::{Field, ManualDiagnostic, Sensor, User};
use chrono::Utc;
use reqwest::header;
use reqwest_middleware::ClientWithMiddleware;
use std::collections::HashMap;
use thiserror::Error;
use tracing::{error, warn};

use self::models::{fields_to_serde_value, serializable_to_fields, Document};
use self::query::{ExecutableQuery, Query};

const FIRESTORE_V1_API: &str =
    "https://firestore.googleapis.com/v1/projects/{project_id}/databases/(default)/documents";

/// Firestore rejects `IN` filters with more than 10 members, so batch
/// queries are issued in sequential chunks of this size.
pub const IN_QUERY_CHUNK: usize = 10;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("HTTP Request failed: {0}")]
    RequestError(#[from] reqwest::Error),
    #[error("Middleware error: {0}")]
    MiddlewareError(#[from] reqwest_middleware::Error),
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    #[error("API error: {0}")]
    ApiError(String),
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl StoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            StoreError::PermissionDenied(_) => ErrorKind::PermissionDenied,
            _ => ErrorKind::Other,
        }
    }
}

pub(crate) async fn error_from_response(response: reqwest::Response, context: &str) -> StoreError {
    let status = response.status();
    let text = response.text().await.unwrap_or_default();
    match classify(status, &text) {
        ErrorKind::PermissionDenied => {
            StoreError::PermissionDenied(format!("{} {}: {}", context, status, text))
        }
        _ => StoreError::ApiError(format!("{} failed {}: {}", context, status, text)),
    }
}

/// Logs a failed remote operation the way the degradation policy demands:
/// permission denials are warnings (the caller falls back), everything else
/// is an error.
fn log_degraded(e: &StoreError, collection: &str) {
    match e.kind() {
        ErrorKind::PermissionDenied => warn!(
            "permission denied for collection [{}], falling back to local/mock data state",
            collection
        ),
        _ => error!("firestore error in {}: {}", collection, e),
    }
}

/// Client for the Firestore documents REST API.
#[derive(Clone)]
pub struct StoreClient {
    client: ClientWithMiddleware,
    base_url: String,
}

impl StoreClient {
    pub fn new(client: ClientWithMiddleware, project_id: &str) -> Self {
        Self {
            client,
            base_url: FIRESTORE_V1_API.replace("{project_id}", project_id),
        }
    }

    /// Creates a client against a custom base URL (useful for testing).
    pub fn new_with_url(client: ClientWithMiddleware, base_url: String) -> Self {
        Self { client, base_url }
    }

    fn query(&self, query: Query) -> ExecutableQuery<'_> {
        ExecutableQuery::new(&self.client, self.base_url.clone(), query)
    }

    // --- raw document operations ---

    async fn get_doc<T: serde::de::DeserializeOwned>(
        &self,
        document_path: &str,
    ) -> Result<Option<T>, StoreError> {
        let url = format!("{}/{}", self.base_url, document_path);
        let response = self.client.get(&url).send().await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(error_from_response(response, "Get document").await);
        }

        let doc: Document = response.json().await?;
        let serde_value = fields_to_serde_value(doc.fields)?;
        Ok(Some(serde_json::from_value(serde_value)?))
    }

    async fn set_doc<T: serde::Serialize>(
        &self,
        document_path: &str,
        value: &T,
    ) -> Result<(), StoreError> {
        let url = format!("{}/{}", self.base_url, document_path);
        let fields = serializable_to_fields(value)?;
        let body = serde_json::to_vec(&serde_json::json!({ "fields": fields }))?;

        let response = self
            .client
            .patch(&url)
            .header(header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_from_response(response, "Set document").await);
        }
        Ok(())
    }

    async fn delete_doc(&self, document_path: &str) -> Result<(), StoreError> {
        let url = format!("{}/{}", self.base_url, document_path);
        let response = self.client.delete(&url).send().await?;

        if !response.status().is_success() {
            return Err(error_from_response(response, "Delete document").await);
        }
        Ok(())
    }

    // --- user profiles ---

    pub async fn user_profile(&self, uid: &str) -> Result<Option<User>, StoreError> {
        self.get_doc(&format!("users/{}", uid)).await
    }

    pub async fn save_user_profile(&self, user: &User) -> Result<(), StoreError> {
        self.set_doc(&format!("users/{}", user.id), user).await
    }

    // --- fields ---

    /// Fetches the fields owned by `user_id`. Any failure degrades to an
    /// empty fallback list.
    pub async fn sync_fields(&self, user_id: &str) -> Fetched<Vec<Field>> {
        let result = async {
            self.query(Query::new("fields").where_eq("user_id", user_id)?)
                .fetch::<Field>()
                .await
        }
        .await;

        match result {
            Ok(fields) => Fetched::remote(fields),
            Err(e) => {
                log_degraded(&e, "fields");
                Fetched::fallback(Vec::new())
            }
        }
    }

    /// Persists a field. Failures are logged and swallowed.
    pub async fn add_field(&self, field: &Field) {
        if let Err(e) = self
            .set_doc(&format!("fields/{}", field.field_id), field)
            .await
        {
            log_degraded(&e, "fields");
        }
    }

    // --- sensors ---

    /// Fetches the sensors for the given fields and reconciles the mirror.
    ///
    /// On success the mirror is rebuilt as fetched-union-unrelated entries.
    /// A permission denial degrades to the mirror contents for the requested
    /// fields; any other failure degrades to an empty list.
    pub async fn sync_sensors(
        &self,
        mirror: &SensorMirror,
        field_ids: &[i64],
    ) -> Fetched<Vec<Sensor>> {
        if field_ids.is_empty() {
            return Fetched::remote(Vec::new());
        }

        match self.fetch_sensors(field_ids).await {
            Ok(sensors) => {
                mirror.merge_synced(&sensors, field_ids);
                Fetched::remote(sensors)
            }
            Err(e) if e.kind() == ErrorKind::PermissionDenied => {
                log_degraded(&e, "sensors");
                Fetched::fallback(mirror.read_for_fields(field_ids))
            }
            Err(e) => {
                log_degraded(&e, "sensors");
                Fetched::fallback(Vec::new())
            }
        }
    }

    async fn fetch_sensors(&self, field_ids: &[i64]) -> Result<Vec<Sensor>, StoreError> {
        // Sequential chunked sub-requests; one failing chunk fails the
        // whole operation (no partial result is returned).
        let mut sensors = Vec::new();
        for chunk in field_ids.chunks(IN_QUERY_CHUNK) {
            let query = Query::new("sensors").where_in("field_id", chunk)?;
            sensors.extend(self.query(query).fetch::<Sensor>().await?);
        }
        Ok(sensors)
    }

    /// Writes a sensor remotely, then reconciles the mirror with the
    /// mutation regardless of the remote outcome: the local copy is what the
    /// fallback read path will serve. Remote failures are logged, never
    /// raised.
    pub async fn upsert_sensor(&self, mirror: &SensorMirror, sensor: &Sensor) {
        if let Err(e) = self
            .set_doc(&format!("sensors/{}", sensor.sensor_id), sensor)
            .await
        {
            log_degraded(&e, "sensors");
        }
        mirror.upsert(sensor.clone());
    }

    /// Deletes a sensor remotely and drops it from the mirror.
    pub async fn delete_sensor(&self, mirror: &SensorMirror, sensor_id: i64) {
        if let Err(e) = self.delete_doc(&format!("sensors/{}", sensor_id)).await {
            log_degraded(&e, "sensors");
        }
        mirror.remove(sensor_id);
    }

    // --- manual diagnostics ---

    /// Persists manually entered readings for a field, stamping
    /// `updated_at`. Failures are logged and swallowed.
    pub async fn save_manual_diagnostic(&self, field_id: i64, diagnostic: &ManualDiagnostic) {
        let stamped = ManualDiagnostic {
            field_id,
            updated_at: Some(Utc::now().to_rfc3339()),
            ..diagnostic.clone()
        };
        if let Err(e) = self
            .set_doc(&format!("manual_diagnostics/{}", field_id), &stamped)
            .await
        {
            log_degraded(&e, "manual_diagnostics");
        }
    }

    /// Fetches manual diagnostics for the given fields, keyed by `field_id`.
    /// Degrades to an empty map on any failure.
    pub async fn manual_diagnostics_for_fields(
        &self,
        field_ids: &[i64],
    ) -> Fetched<HashMap<i64, ManualDiagnostic>> {
        if field_ids.is_empty() {
            return Fetched::remote(HashMap::new());
        }

        let result = async {
            let mut diagnostics = HashMap::new();
            for chunk in field_ids.chunks(IN_QUERY_CHUNK) {
                let query = Query::new("manual_diagnostics").where_in("field_id", chunk)?;
                for diagnostic in self.query(query).fetch::<ManualDiagnostic>().await? {
                    diagnostics.insert(diagnostic.field_id, diagnostic);
                }
            }
            Ok::<_, StoreError>(diagnostics)
        }
        .await;

        match result {
            Ok(diagnostics) => Fetched::remote(diagnostics),
            Err(e) => {
                log_degraded(&e, "manual_diagnostics");
                Fetched::fallback(HashMap::new())
            }
        }
    }
}
