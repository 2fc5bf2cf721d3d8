use http::Extensions;
use reqwest::{header, Request, Response};
use reqwest_middleware::{Middleware, Next};

/// Attaches the Google API key to every outgoing request, both as the
/// `key` query parameter (Identity Toolkit, Firestore) and as the
/// `x-goog-api-key` header (Generative Language API).
pub struct ApiKeyMiddleware {
    key: String,
}

impl ApiKeyMiddleware {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }
}

#[async_trait::async_trait]
impl Middleware for ApiKeyMiddleware {
    async fn handle(
        &self,
        mut req: Request,
        extensions: &mut Extensions,
        next: Next<'_>,
    ) -> reqwest_middleware::Result<Response> {
        req.url_mut()
            .query_pairs_mut()
            .append_pair("key", &self.key);

        let value = header::HeaderValue::from_str(&self.key).map_err(|e| {
            reqwest_middleware::Error::Middleware(anyhow::anyhow!(
                "API key is not a valid header value: {}",
                e
            ))
        })?;
        req.headers_mut().insert("x-goog-api-key", value);

        next.run(req, extensions).await
    }
}
