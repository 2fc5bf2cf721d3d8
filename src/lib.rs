//! Data-access and AI-advisory client for the AgriCare farm-management app.
//!
//! The crate wires three remote services (Identity Toolkit, Firestore, the
//! Generative Language API) and one local key-value mirror behind a single
//! [`AgricareApp`] handle. Data reads degrade gracefully: permission
//! failures fall back to the mirror, AI failures fall back to deterministic
//! generators, and only authentication errors surface to the caller.

pub mod advisor;
pub mod auth;
pub mod core;
pub mod mirror;
pub mod models;
pub mod store;

use crate::advisor::AdvisorClient;
use crate::auth::{AuthClient, AuthError};
use crate::core::middleware::ApiKeyMiddleware;
use crate::core::Fetched;
use crate::mirror::{KeyValueStore, SensorMirror};
use crate::models::{Sensor, User};
use crate::store::StoreClient;
use reqwest::Client;
use reqwest_middleware::ClientBuilder;
use tracing::error;

/// Static configuration for the backing Google project.
#[derive(Debug, Clone)]
pub struct AgricareConfig {
    pub api_key: String,
    pub project_id: String,
}

/// The application handle: one HTTP client and one mirror, constructed once
/// at startup and shared by every operation. No global singletons.
pub struct AgricareApp {
    auth: AuthClient,
    store: StoreClient,
    advisor: AdvisorClient,
    mirror: SensorMirror,
}

impl AgricareApp {
    pub fn new(config: AgricareConfig, mirror_store: Box<dyn KeyValueStore>) -> Self {
        let client = ClientBuilder::new(Client::new())
            .with(ApiKeyMiddleware::new(config.api_key))
            .build();

        Self {
            auth: AuthClient::new(client.clone()),
            store: StoreClient::new(client.clone(), &config.project_id),
            advisor: AdvisorClient::new(client, advisor::DEFAULT_MODEL),
            mirror: SensorMirror::new(mirror_store),
        }
    }

    #[cfg(test)]
    pub(crate) fn with_clients(
        auth: AuthClient,
        store: StoreClient,
        advisor: AdvisorClient,
        mirror: SensorMirror,
    ) -> Self {
        Self {
            auth,
            store,
            advisor,
            mirror,
        }
    }

    pub fn auth(&self) -> &AuthClient {
        &self.auth
    }

    pub fn store(&self) -> &StoreClient {
        &self.store
    }

    pub fn advisor(&self) -> &AdvisorClient {
        &self.advisor
    }

    pub fn mirror(&self) -> &SensorMirror {
        &self.mirror
    }

    /// Signs a user in and loads their profile. On first login, when no
    /// profile document exists yet, a default one-year basic profile is
    /// synthesized and persisted. Failures propagate: authentication must be
    /// visible to the user.
    pub async fn login_user(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let credential = self.auth.sign_in(email, password).await?;

        match self.store.user_profile(&credential.uid).await? {
            Some(user) => Ok(user),
            None => {
                let user = User::default_profile(&credential.uid, &credential.email);
                self.store.save_user_profile(&user).await?;
                Ok(user)
            }
        }
    }

    /// Registers a new user and persists the profile under the new uid.
    /// Failures are logged and re-raised.
    pub async fn register_user(&self, user: &User, password: &str) -> Result<User, AuthError> {
        let credential = self.auth.sign_up(&user.email, password).await?;

        let user = User {
            id: credential.uid,
            ..user.clone()
        };
        self.store.save_user_profile(&user).await.map_err(|e| {
            error!("failed to persist profile for {}: {}", user.email, e);
            AuthError::from(e)
        })?;
        Ok(user)
    }

    /// Fetches sensors for the given fields, reconciling the mirror. See
    /// [`StoreClient::sync_sensors`] for the degradation policy.
    pub async fn sync_sensors(&self, field_ids: &[i64]) -> Fetched<Vec<Sensor>> {
        self.store.sync_sensors(&self.mirror, field_ids).await
    }

    /// Writes a sensor remotely and into the mirror.
    pub async fn upsert_sensor(&self, sensor: &Sensor) {
        self.store.upsert_sensor(&self.mirror, sensor).await
    }

    /// Deletes a sensor remotely and from the mirror.
    pub async fn delete_sensor(&self, sensor_id: i64) {
        self.store.delete_sensor(&self.mirror, sensor_id).await
    }
}
