use std::env;

use anyhow::{Context, Result, bail};
use reqwest::Client as ReqwestClient;
use serde::Deserialize;
use tracing::{debug, info};

use super::TokenProvider;
use crate::constants::{ENV_ID_TOKEN_REQUEST_TOKEN, ENV_ID_TOKEN_REQUEST_URL};

/// GitHub Actions OIDC token provider.
///
/// The runner exposes a token endpoint and a bearer token authorizing it
/// only when the job has `permissions: id-token: write`.
#[derive(Debug, Clone)]
pub struct GitHubTokenProvider {
    request_url: Option<String>,
    request_token: Option<String>,
    http: ReqwestClient,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    value: Option<String>,
}

impl GitHubTokenProvider {
    pub fn new(request_url: impl Into<String>, request_token: impl Into<String>) -> Self {
        Self {
            request_url: Some(request_url.into()),
            request_token: Some(request_token.into()),
            http: ReqwestClient::new(),
        }
    }

    /// Missing variables are reported when a token is requested, not here.
    pub fn from_env() -> Self {
        Self {
            request_url: env::var(ENV_ID_TOKEN_REQUEST_URL).ok(),
            request_token: env::var(ENV_ID_TOKEN_REQUEST_TOKEN).ok(),
            http: ReqwestClient::new(),
        }
    }
}

impl TokenProvider for GitHubTokenProvider {
    async fn id_token(&self, audience: Option<&str>) -> Result<String> {
        let request_url = self
            .request_url
            .as_deref()
            .with_context(|| format!("Unable to get {ENV_ID_TOKEN_REQUEST_URL} env variable"))?;
        let request_token = self
            .request_token
            .as_deref()
            .with_context(|| format!("Unable to get {ENV_ID_TOKEN_REQUEST_TOKEN} env variable"))?;

        info!("Requesting OIDC token from GitHub Actions");
        debug!("Audience: {}", audience.unwrap_or("(default)"));

        let mut request = self
            .http
            .get(request_url)
            .bearer_auth(request_token)
            .header(reqwest::header::ACCEPT, "application/json");
        if let Some(audience) = audience {
            request = request.query(&[("audience", audience)]);
        }

        let response = request
            .send()
            .await
            .context("Failed to get ID Token")?;

        let status = response.status();
        if !status.is_success() {
            bail!("Failed to get ID Token. Error Code: {}", status.as_u16());
        }

        let token: TokenResponse = response
            .json()
            .await
            .context("Failed to parse ID Token response")?;

        token
            .value
            .filter(|value| !value.is_empty())
            .context("Response json body does not have ID Token field")
    }
}
