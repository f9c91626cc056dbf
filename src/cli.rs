use anyhow::Result;
use clap::{ArgAction, Parser, error::ErrorKind};

use crate::{
    actions::{self, GitHubActions}, aws::StsRoleAssumer, config::Inputs, exchange::Exchanger,
    idp::GitHubTokenProvider,
};

/// Every input can be given as a flag or through the `INPUT_*` variable the
/// Actions runner sets for it.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "oidc-sts",
    version,
    about = "Exchange a GitHub Actions OIDC token for temporary AWS credentials",
    long_about = None
)]
pub struct Cli {
    #[arg(long, env = "INPUT_ROLE-ARN", help = "ARN of the IAM role to assume")]
    pub role_arn: Option<String>,

    #[arg(long, env = "INPUT_AUDIENCE", help = "Audience claim of the OIDC token")]
    pub audience: Option<String>,

    #[arg(
        long,
        env = "INPUT_STS-REGION",
        help = "STS region (default: us-east-1 via the global endpoint)"
    )]
    pub sts_region: Option<String>,

    #[arg(
        long,
        env = "INPUT_ROLE-SESSION-NAME",
        help = "Name of the assumed role session"
    )]
    pub role_session_name: Option<String>,

    #[arg(
        long,
        env = "INPUT_DURATION-SECONDS",
        help = "Requested credential lifetime in seconds"
    )]
    pub duration_seconds: Option<String>,

    #[arg(
        long,
        env = "INPUT_EXPORT-VARIABLES",
        num_args = 0..=1,
        default_missing_value = "true",
        help = "Also export AWS_* environment variables for later steps"
    )]
    pub export_variables: Option<String>,

    #[arg(short = 'v', long, action = ArgAction::Count, help = "Increase verbosity (-v info, -vv debug, -vvv trace)")]
    pub verbose: u8,
}

impl Cli {
    pub fn inputs(&self) -> Inputs {
        Inputs {
            role_arn: self.role_arn.clone(),
            audience: self.audience.clone(),
            sts_region: self.sts_region.clone(),
            role_session_name: self.role_session_name.clone(),
            duration_seconds: self.duration_seconds.clone(),
            export_variables: self.export_variables.clone(),
        }
    }

    pub async fn execute(self) -> Result<()> {
        let mut exchanger = Exchanger::new(
            GitHubTokenProvider::from_env(),
            StsRoleAssumer::new(),
            GitHubActions::from_env(),
        );

        exchanger.exchange(&self.inputs()).await?;
        Ok(())
    }
}

/// Workflow error command for a rejected command line, or `None` when clap
/// only wants to print help or version.
pub fn parse_failure(err: &clap::Error) -> Option<String> {
    match err.kind() {
        ErrorKind::DisplayHelp
        | ErrorKind::DisplayVersion
        | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => None,
        _ => Some(actions::error_command(err.to_string().trim_end())),
    }
}
