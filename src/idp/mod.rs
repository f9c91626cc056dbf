pub mod github;

use std::future::Future;

use anyhow::Result;

pub use self::github::GitHubTokenProvider;

/// Source of the short-lived identity token presented to STS.
///
/// Implementations return an opaque bearer string scoped to `audience`,
/// or fail. The token is sensitive and must never be logged.
pub trait TokenProvider {
    fn id_token(&self, audience: Option<&str>) -> impl Future<Output = Result<String>>;
}
