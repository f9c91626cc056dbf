use std::{fmt, future::Future};

use anyhow::{Context, Result, anyhow};
use aws_config::{BehaviorVersion, Region, retry::RetryConfig};
use aws_sdk_sts::{Client as StsClient, config::Config as StsConfig, error::DisplayErrorContext};
use tracing::{debug, info};

use super::Credentials;
use crate::constants::{DEFAULT_AWS_REGION, GLOBAL_STS_ENDPOINT};

/// Where the STS call is sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StsEndpoint {
    pub region: String,
    /// Resolve against the partition-global endpoint instead of the regional one
    pub use_global_endpoint: bool,
}

impl StsEndpoint {
    /// An explicit region pins the call to that region. Without one the
    /// baseline region is used together with the global endpoint, so runners
    /// outside that region still succeed.
    pub fn resolve(region_override: Option<&str>) -> Self {
        match region_override {
            Some(region) => Self {
                region: region.to_string(),
                use_global_endpoint: false,
            },
            None => Self {
                region: DEFAULT_AWS_REGION.to_string(),
                use_global_endpoint: true,
            },
        }
    }

    pub fn endpoint_url(&self) -> Option<&'static str> {
        self.use_global_endpoint.then_some(GLOBAL_STS_ENDPOINT)
    }
}

/// Parameters of a single `AssumeRoleWithWebIdentity` call
#[derive(Clone)]
pub struct AssumeRoleRequest {
    pub endpoint: StsEndpoint,
    pub role_arn: String,
    pub role_session_name: String,
    pub duration_seconds: Option<i32>,
    pub web_identity_token: String,
}

impl fmt::Debug for AssumeRoleRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssumeRoleRequest")
            .field("endpoint", &self.endpoint)
            .field("role_arn", &self.role_arn)
            .field("role_session_name", &self.role_session_name)
            .field("duration_seconds", &self.duration_seconds)
            .field("web_identity_token", &"** redacted **")
            .finish()
    }
}

/// Exchanges a web identity token for temporary credentials.
pub trait RoleAssumer {
    fn assume_role_with_web_identity(
        &self,
        request: &AssumeRoleRequest,
    ) -> impl Future<Output = Result<Credentials>>;
}

/// `RoleAssumer` backed by the AWS SDK. The call is unsigned; the web
/// identity token is the only proof of identity.
#[derive(Debug, Clone, Default)]
pub struct StsRoleAssumer {
    endpoint_url: Option<String>,
}

impl StsRoleAssumer {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    fn with_endpoint_url(url: impl Into<String>) -> Self {
        Self {
            endpoint_url: Some(url.into()),
        }
    }

    fn endpoint_url_for<'a>(&'a self, endpoint: &'a StsEndpoint) -> Option<&'a str> {
        self.endpoint_url.as_deref().or(endpoint.endpoint_url())
    }

    fn client_for(&self, endpoint: &StsEndpoint) -> StsClient {
        // A failed exchange is terminal for the run, so the SDK must not retry.
        let mut builder = StsConfig::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(endpoint.region.clone()))
            .retry_config(RetryConfig::disabled());

        if let Some(url) = self.endpoint_url_for(endpoint) {
            debug!("STS endpoint: {}", url);
            builder = builder.endpoint_url(url);
        }

        StsClient::from_conf(builder.build())
    }
}

impl RoleAssumer for StsRoleAssumer {
    async fn assume_role_with_web_identity(
        &self,
        request: &AssumeRoleRequest,
    ) -> Result<Credentials> {
        info!("Calling AWS STS AssumeRoleWithWebIdentity");
        debug!("Role ARN: {}", request.role_arn);
        debug!("Session name: {}", request.role_session_name);
        debug!(
            "Region: {} (global endpoint: {})",
            request.endpoint.region, request.endpoint.use_global_endpoint
        );
        if let Some(duration) = request.duration_seconds {
            debug!("Duration: {} seconds", duration);
        }

        let client = self.client_for(&request.endpoint);

        let response = client
            .assume_role_with_web_identity()
            .role_arn(&request.role_arn)
            .role_session_name(&request.role_session_name)
            .web_identity_token(&request.web_identity_token)
            .set_duration_seconds(request.duration_seconds)
            .send()
            .await
            .map_err(|e| anyhow!("{}", DisplayErrorContext(&e)))
            .context("Failed to assume role with web identity")?;

        let sts_creds = response
            .credentials()
            .context("AWS STS returned no credentials")?;

        let credentials = Credentials {
            access_key_id: sts_creds.access_key_id().to_string(),
            secret_access_key: sts_creds.secret_access_key().to_string(),
            session_token: sts_creds.session_token().to_string(),
            expiration: *sts_creds.expiration(),
        };

        info!("Successfully obtained AWS credentials");
        Ok(credentials)
    }
}
