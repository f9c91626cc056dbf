use std::fmt;

use aws_smithy_types::{DateTime, date_time::Format};

pub mod sts;

pub use sts::{AssumeRoleRequest, RoleAssumer, StsEndpoint, StsRoleAssumer};

/// AWS temporary credentials structure
#[derive(Clone, PartialEq)]
pub struct Credentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: String,
    pub expiration: DateTime,
}

impl Credentials {
    /// Expiration formatted as an RFC 3339 timestamp, e.g. `2026-10-15T12:00:00Z`
    pub fn expiration_rfc3339(&self) -> anyhow::Result<String> {
        self.expiration
            .fmt(Format::DateTime)
            .map_err(|e| anyhow::anyhow!("Failed to format credential expiration: {e}"))
    }

    /// The values that must never reach a log in plaintext.
    pub fn secrets(&self) -> [&str; 3] {
        [
            &self.access_key_id,
            &self.secret_access_key,
            &self.session_token,
        ]
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key_id", &"** redacted **")
            .field("secret_access_key", &"** redacted **")
            .field("session_token", &"** redacted **")
            .field("expiration", &self.expiration)
            .finish()
    }
}
