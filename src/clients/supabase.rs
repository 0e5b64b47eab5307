//! Thin HTTP client for a hosted Supabase project.
//!
//! Covers the two services the application needs: GoTrue (`/auth/v1`) for
//! identity and PostgREST (`/rest/v1`) for table access. Higher-level
//! semantics live in the auth and store backends built on top of this.

use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::config::BackendConfig;
use crate::models::OAuthProvider;

/// PostgREST code for "new row violates row-level security policy".
pub const RLS_VIOLATION_CODE: &str = "42501";

#[derive(Debug, Error)]
pub enum SupabaseError {
    #[error("Supabase request timed out")]
    Timeout,

    #[error("Supabase network error: {0}")]
    Network(String),

    #[error("{message}")]
    Api {
        status: u16,
        code: Option<String>,
        message: String,
    },

    #[error("Failed to decode Supabase response: {0}")]
    Decode(String),

    #[error("Invalid Supabase URL: {0}")]
    Url(String),
}

impl SupabaseError {
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    #[must_use]
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Api { code, .. } => code.as_deref(),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for SupabaseError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}

#[derive(Clone)]
pub struct SupabaseClient {
    client: Client,
    base: Url,
    anon_key: String,
}

impl SupabaseClient {
    pub fn new(base_url: &str, anon_key: &str, timeout: Duration) -> Result<Self, SupabaseError> {
        let mut base = base_url.trim().to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base = Url::parse(&base).map_err(|e| SupabaseError::Url(e.to_string()))?;

        let client = Client::builder()
            .timeout(timeout)
            .user_agent("animeshelf/0.1")
            .build()
            .map_err(|e| SupabaseError::Network(e.to_string()))?;

        Ok(Self {
            client,
            base,
            anon_key: anon_key.to_string(),
        })
    }

    pub fn from_config(config: &BackendConfig) -> Result<Self, SupabaseError> {
        Self::new(
            &config.supabase_url,
            &config.supabase_anon_key,
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    fn endpoint(&self, path: &str) -> Result<Url, SupabaseError> {
        self.base
            .join(path)
            .map_err(|e| SupabaseError::Url(e.to_string()))
    }

    fn request(&self, method: Method, url: Url, access_token: Option<&str>) -> RequestBuilder {
        let bearer = access_token.unwrap_or(&self.anon_key);
        self.client
            .request(method, url)
            .header("apikey", &self.anon_key)
            .bearer_auth(bearer)
    }

    // ========================================================================
    // GoTrue
    // ========================================================================

    /// POST to an auth endpoint, e.g. `token` with `grant_type=password`.
    pub async fn auth_post<B, T>(
        &self,
        path: &str,
        query: &[(&str, &str)],
        body: &B,
        access_token: Option<&str>,
    ) -> Result<T, SupabaseError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let mut url = self.endpoint(&format!("auth/v1/{path}"))?;
        append_query(&mut url, query);
        debug!(path, "GoTrue request");

        let response = self
            .request(Method::POST, url, access_token)
            .json(body)
            .send()
            .await?;
        decode(response).await
    }

    /// POST that carries no body either way (logout).
    pub async fn auth_post_empty(
        &self,
        path: &str,
        access_token: &str,
    ) -> Result<(), SupabaseError> {
        let url = self.endpoint(&format!("auth/v1/{path}"))?;
        debug!(path, "GoTrue request");

        let response = self
            .request(Method::POST, url, Some(access_token))
            .send()
            .await?;
        check(response).await.map(|_| ())
    }

    pub async fn auth_get<T: DeserializeOwned>(
        &self,
        path: &str,
        access_token: &str,
    ) -> Result<T, SupabaseError> {
        let url = self.endpoint(&format!("auth/v1/{path}"))?;
        debug!(path, "GoTrue request");

        let response = self
            .request(Method::GET, url, Some(access_token))
            .send()
            .await?;
        decode(response).await
    }

    /// Where to send the user to start an OAuth sign-in.
    pub fn authorize_url(
        &self,
        provider: OAuthProvider,
        redirect_to: Option<&str>,
    ) -> Result<Url, SupabaseError> {
        let mut url = self.endpoint("auth/v1/authorize")?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("provider", provider.as_str());
            if let Some(redirect) = redirect_to {
                pairs.append_pair("redirect_to", redirect);
            }
        }
        Ok(url)
    }

    // ========================================================================
    // PostgREST
    // ========================================================================

    /// `GET /rest/v1/<table>` with PostgREST filter pairs such as `("user_id", "eq.<id>")`.
    pub async fn select<T: DeserializeOwned>(
        &self,
        table: &str,
        filters: &[(&str, &str)],
        access_token: &str,
    ) -> Result<Vec<T>, SupabaseError> {
        let mut url = self.endpoint(&format!("rest/v1/{table}"))?;
        append_query(&mut url, filters);
        debug!(table, "PostgREST select");

        let response = self
            .request(Method::GET, url, Some(access_token))
            .send()
            .await?;
        decode(response).await
    }

    pub async fn insert<B, T>(
        &self,
        table: &str,
        rows: &B,
        access_token: &str,
    ) -> Result<Vec<T>, SupabaseError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.endpoint(&format!("rest/v1/{table}"))?;
        debug!(table, "PostgREST insert");

        let response = self
            .request(Method::POST, url, Some(access_token))
            .header("Prefer", "return=representation")
            .json(rows)
            .send()
            .await?;
        decode(response).await
    }

    /// PATCH matching rows; returns the rows that were actually changed.
    pub async fn update<B, T>(
        &self,
        table: &str,
        filters: &[(&str, &str)],
        changes: &B,
        access_token: &str,
    ) -> Result<Vec<T>, SupabaseError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let mut url = self.endpoint(&format!("rest/v1/{table}"))?;
        append_query(&mut url, filters);
        debug!(table, "PostgREST update");

        let response = self
            .request(Method::PATCH, url, Some(access_token))
            .header("Prefer", "return=representation")
            .json(changes)
            .send()
            .await?;
        decode(response).await
    }

    /// DELETE matching rows; returns the rows that were removed.
    pub async fn delete<T: DeserializeOwned>(
        &self,
        table: &str,
        filters: &[(&str, &str)],
        access_token: &str,
    ) -> Result<Vec<T>, SupabaseError> {
        let mut url = self.endpoint(&format!("rest/v1/{table}"))?;
        append_query(&mut url, filters);
        debug!(table, "PostgREST delete");

        let response = self
            .request(Method::DELETE, url, Some(access_token))
            .header("Prefer", "return=representation")
            .send()
            .await?;
        decode(response).await
    }
}

fn append_query(url: &mut Url, pairs: &[(&str, &str)]) {
    if pairs.is_empty() {
        return;
    }
    let mut query = url.query_pairs_mut();
    for (key, value) in pairs {
        query.append_pair(key, value);
    }
}

async fn check(response: reqwest::Response) -> Result<reqwest::Response, SupabaseError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(api_error(status, &body))
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, SupabaseError> {
    let response = check(response).await?;
    response.json::<T>().await.map_err(SupabaseError::from)
}

/// GoTrue and PostgREST report errors with different field names; take whichever is present.
fn api_error(status: StatusCode, body: &str) -> SupabaseError {
    let parsed: Option<serde_json::Value> = serde_json::from_str(body).ok();

    let field = |names: &[&str]| -> Option<String> {
        let value = parsed.as_ref()?;
        names.iter().find_map(|name| match value.get(*name)? {
            serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
            serde_json::Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
    };

    let message = field(&["msg", "message", "error_description", "error"]).unwrap_or_else(|| {
        if body.trim().is_empty() {
            status.canonical_reason().unwrap_or("request failed").to_string()
        } else {
            body.trim().to_string()
        }
    });

    SupabaseError::Api {
        status: status.as_u16(),
        code: field(&["error_code", "code"]),
        message,
    }
}
