/// Action input: target role ARN
pub const INPUT_ROLE_ARN: &str = "role-arn";

/// Action input: OIDC token audience
pub const INPUT_AUDIENCE: &str = "audience";

/// Action input: STS region override
pub const INPUT_STS_REGION: &str = "sts-region";

/// Action input: session name attached to the assumed role
pub const INPUT_ROLE_SESSION_NAME: &str = "role-session-name";

/// Action input: requested credential lifetime in seconds
pub const INPUT_DURATION_SECONDS: &str = "duration-seconds";

/// Action input: whether to export credentials as environment variables
pub const INPUT_EXPORT_VARIABLES: &str = "export-variables";

pub const OUTPUT_ACCESS_KEY_ID: &str = "aws-access-key-id";
pub const OUTPUT_SECRET_ACCESS_KEY: &str = "aws-secret-access-key";
pub const OUTPUT_SESSION_TOKEN: &str = "aws-session-token";
pub const OUTPUT_EXPIRATION: &str = "expiration";

pub const ENV_ACCESS_KEY_ID: &str = "AWS_ACCESS_KEY_ID";
pub const ENV_SECRET_ACCESS_KEY: &str = "AWS_SECRET_ACCESS_KEY";
pub const ENV_SESSION_TOKEN: &str = "AWS_SESSION_TOKEN";

/// Default AWS region for STS operations when no region is configured
pub const DEFAULT_AWS_REGION: &str = "us-east-1";

/// Partition-global STS endpoint, used together with `DEFAULT_AWS_REGION`
pub const GLOBAL_STS_ENDPOINT: &str = "https://sts.amazonaws.com";

/// Session name sent to STS when none is configured
pub const DEFAULT_ROLE_SESSION_NAME: &str = "GitHubActions";

/// Runner-provided URL for requesting an OIDC token
pub const ENV_ID_TOKEN_REQUEST_URL: &str = "ACTIONS_ID_TOKEN_REQUEST_URL";

/// Runner-provided bearer token authorizing the OIDC token request
pub const ENV_ID_TOKEN_REQUEST_TOKEN: &str = "ACTIONS_ID_TOKEN_REQUEST_TOKEN";

/// File the runner reads step outputs from
pub const ENV_GITHUB_OUTPUT: &str = "GITHUB_OUTPUT";

/// File the runner reads exported environment variables from
pub const ENV_GITHUB_ENV: &str = "GITHUB_ENV";
