//! Email/password authentication against the Google Identity Toolkit.
//!
//! Unlike the data-access modules, failures here are always surfaced to the
//! caller: a user who cannot sign in must see the error, not a silently
//! defaulted session.

pub mod models;


use crate::auth::models::{AuthUser, CredentialRequest, CredentialResponse};
use reqwest::header;
use reqwest_middleware::ClientWithMiddleware;
use thiserror::Error;
use tracing::error;

const IDENTITY_TOOLKIT_V1_API: &str = "https://identitytoolkit.googleapis.com/v1";

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("HTTP Request failed: {0}")]
    RequestError(#[from] reqwest::Error),
    #[error("Middleware error: {0}")]
    MiddlewareError(#[from] reqwest_middleware::Error),
    #[error("API error: {0}")]
    ApiError(String),
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
    #[error("Profile store error: {0}")]
    StoreError(#[from] crate::store::StoreError),
}

/// Client for the Identity Toolkit `accounts:*` endpoints.
#[derive(Clone)]
pub struct AuthClient {
    client: ClientWithMiddleware,
    base_url: String,
}

impl AuthClient {
    pub fn new(client: ClientWithMiddleware) -> Self {
        Self {
            client,
            base_url: IDENTITY_TOOLKIT_V1_API.to_string(),
        }
    }

    /// Creates a client against a custom base URL (useful for testing).
    pub fn new_with_url(client: ClientWithMiddleware, base_url: String) -> Self {
        Self { client, base_url }
    }

    /// Signs an existing user in. Failures are logged and re-raised.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<AuthUser, AuthError> {
        self.credential_request("accounts:signInWithPassword", email, password)
            .await
            .map_err(|e| {
                error!("sign-in failed for {}: {}", email, e);
                e
            })
    }

    /// Registers a new identity. Failures are logged and re-raised.
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<AuthUser, AuthError> {
        self.credential_request("accounts:signUp", email, password)
            .await
            .map_err(|e| {
                error!("registration failed for {}: {}", email, e);
                e
            })
    }

    async fn credential_request(
        &self,
        endpoint: &str,
        email: &str,
        password: &str,
    ) -> Result<AuthUser, AuthError> {
        let url = format!("{}/{}", self.base_url, endpoint);
        let request = CredentialRequest {
            email: email.to_string(),
            password: password.to_string(),
            return_secure_token: true,
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
            return Err(AuthError::ApiError(format!(
                "{} failed {}: {}",
                endpoint, status, text
            )));
        }

        let credential: CredentialResponse = response.json().await?;
        Ok(AuthUser {
            uid: credential.local_id,
            email: credential.email,
            id_token: credential.id_token,
        })
    }
}
