use thiserror::Error;
use tracing::{debug, info};

use crate::{
    actions::OutputSink,
    aws::{AssumeRoleRequest, Credentials, RoleAssumer, StsEndpoint},
    config::{Config, ConfigError, Inputs},
    constants::{
        ENV_ACCESS_KEY_ID, ENV_SECRET_ACCESS_KEY, ENV_SESSION_TOKEN, OUTPUT_ACCESS_KEY_ID,
        OUTPUT_EXPIRATION, OUTPUT_SECRET_ACCESS_KEY, OUTPUT_SESSION_TOKEN,
    },
    idp::TokenProvider,
};

#[derive(Debug, Error)]
pub enum ExchangeError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Token(anyhow::Error),

    #[error(transparent)]
    Exchange(anyhow::Error),

    #[error(transparent)]
    Publish(anyhow::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Validating,
    AcquiringToken,
    Exchanging,
    Publishing,
}

/// Exchanges a pipeline identity token for temporary AWS credentials and
/// publishes them to the pipeline.
///
/// Nothing is published unless the whole exchange succeeds. The three secret
/// credential fields are masked before they are published anywhere.
pub struct Exchanger<T, R, S> {
    tokens: T,
    sts: R,
    sink: S,
}

impl<T, R, S> Exchanger<T, R, S>
where
    T: TokenProvider,
    R: RoleAssumer,
    S: OutputSink,
{
    pub fn new(tokens: T, sts: R, sink: S) -> Self {
        Self { tokens, sts, sink }
    }

    pub async fn exchange(&mut self, inputs: &Inputs) -> Result<(), ExchangeError> {
        let mut stage = Stage::Validating;
        let result = self.run(inputs, &mut stage).await;

        match &result {
            Ok(()) => debug!("Stage: Done"),
            Err(_) => debug!("Stage: Failed (during {:?})", stage),
        }
        result
    }

    async fn run(&mut self, inputs: &Inputs, stage: &mut Stage) -> Result<(), ExchangeError> {
        debug!("Stage: {:?}", stage);
        let config = Config::resolve(inputs)?;

        enter(stage, Stage::AcquiringToken);
        let token = self
            .tokens
            .id_token(config.audience.as_deref())
            .await
            .map_err(ExchangeError::Token)?;
        self.sink.mask(&token).map_err(ExchangeError::Publish)?;

        enter(stage, Stage::Exchanging);
        let request = AssumeRoleRequest {
            endpoint: StsEndpoint::resolve(config.sts_region.as_deref()),
            role_arn: config.role_arn.clone(),
            role_session_name: config.role_session_name.clone(),
            duration_seconds: config.duration_seconds,
            web_identity_token: token,
        };
        let credentials = self
            .sts
            .assume_role_with_web_identity(&request)
            .await
            .map_err(ExchangeError::Exchange)?;

        enter(stage, Stage::Publishing);
        self.publish(&credentials, config.export_variables)?;

        info!("Credentials for {} published", config.role_arn);
        Ok(())
    }

    fn publish(
        &mut self,
        credentials: &Credentials,
        export_variables: bool,
    ) -> Result<(), ExchangeError> {
        for secret in credentials.secrets() {
            self.sink.mask(secret).map_err(ExchangeError::Publish)?;
        }

        let expiration = credentials
            .expiration_rfc3339()
            .map_err(ExchangeError::Exchange)?;

        let outputs = [
            (OUTPUT_ACCESS_KEY_ID, credentials.access_key_id.as_str()),
            (OUTPUT_SECRET_ACCESS_KEY, credentials.secret_access_key.as_str()),
            (OUTPUT_SESSION_TOKEN, credentials.session_token.as_str()),
            (OUTPUT_EXPIRATION, expiration.as_str()),
        ];
        let variables = [
            (ENV_ACCESS_KEY_ID, credentials.access_key_id.as_str()),
            (ENV_SECRET_ACCESS_KEY, credentials.secret_access_key.as_str()),
            (ENV_SESSION_TOKEN, credentials.session_token.as_str()),
        ];
        let exported: &[(&str, &str)] = if export_variables { &variables } else { &[] };

        self.sink
            .publish(&outputs, exported)
            .map_err(ExchangeError::Publish)?;
        if export_variables {
            info!("Exported AWS credential environment variables");
        }

        info!("Credentials expire at {}", expiration);
        Ok(())
    }
}

fn enter(stage: &mut Stage, next: Stage) {
    *stage = next;
    debug!("Stage: {:?}", next);
}
