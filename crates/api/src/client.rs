//! Typed client for the kohort REST API.
//!
//! Wraps a [`reqwest::Client`] with base-URL handling, optional bearer-token
//! authentication, and uniform status/decoding error conversion. Callers get
//! generic JSON and form verbs; endpoint paths and payload shapes live with
//! the domain crates.

use {
    reqwest::Method,
    secrecy::{ExposeSecret, Secret},
    serde::{Serialize, de::DeserializeOwned},
};

use crate::error::{ApiError, Result};

/// Asynchronous client for the kohort HTTP API.
#[derive(Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
    token: Option<Secret<String>>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl ApiClient {
    /// Create a client for the given instance URL.
    ///
    /// A trailing slash on `base_url` is stripped. When `token` is set it is
    /// sent as `Authorization: Bearer …` on every request.
    #[must_use]
    pub fn new(base_url: impl Into<String>, token: Option<Secret<String>>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client: reqwest::Client::new(),
            base_url,
            token,
        }
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let mut builder = self.client.request(method, self.endpoint(path));
        if let Some(token) = &self.token {
            builder = builder.bearer_auth(token.expose_secret());
        }
        builder
    }

    /// Send a request and convert non-2xx responses into [`ApiError::Status`].
    async fn send(&self, path: &str, builder: reqwest::RequestBuilder) -> Result<reqwest::Response> {
        let response = builder.send().await.map_err(ApiError::Transport)?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        tracing::warn!(status = status.as_u16(), path, "API request failed");
        Err(ApiError::status(status.as_u16(), &body))
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        let body = response.text().await.map_err(ApiError::Transport)?;
        Ok(serde_json::from_str(&body)?)
    }

    /// GET `path` and decode the JSON response.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self.send(path, self.request(Method::GET, path)).await?;
        Self::decode(response).await
    }

    /// POST a JSON body to `path` and decode the JSON response.
    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self
            .send(path, self.request(Method::POST, path).json(body))
            .await?;
        Self::decode(response).await
    }

    /// POST form-encoded fields to `path` and decode the JSON response.
    pub async fn post_form<T: DeserializeOwned>(
        &self,
        path: &str,
        fields: &[(String, String)],
    ) -> Result<T> {
        let response = self
            .send(path, self.request(Method::POST, path).form(fields))
            .await?;
        Self::decode(response).await
    }

    /// PATCH a JSON body to `path` and decode the JSON response.
    pub async fn patch<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self
            .send(path, self.request(Method::PATCH, path).json(body))
            .await?;
        Self::decode(response).await
    }

    /// PATCH form-encoded fields to `path` and decode the JSON response.
    pub async fn patch_form<T: DeserializeOwned>(
        &self,
        path: &str,
        fields: &[(String, String)],
    ) -> Result<T> {
        let response = self
            .send(path, self.request(Method::PATCH, path).form(fields))
            .await?;
        Self::decode(response).await
    }

    /// DELETE `path`, discarding any response body.
    pub async fn delete(&self, path: &str) -> Result<()> {
        self.send(path, self.request(Method::DELETE, path)).await?;
        Ok(())
    }
}
