//! Error types shared across the application.
//!
//! The binary edge (`main.rs`) works with `anyhow::Result`; everything that
//! callers need to match on is a variant here.

use thiserror::Error;

/// Errors produced by worklens components.
#[derive(Debug, Error)]
pub enum Error {
    /// A raw API record is missing its `id` field and cannot be normalized.
    #[error("malformed work item record: missing id")]
    MalformedRecord,

    /// The API rejected our credentials (HTTP 401).
    #[error("authentication failed: Azure DevOps rejected the personal access token")]
    Authentication,

    /// Required environment variables are not set.
    #[error("Missing required environment variables: {0}")]
    Configuration(String),

    /// Any other API failure (non-401 status, malformed response body).
    #[error("Azure DevOps API error: {0}")]
    Api(String),
}

impl Error {
    /// Whether this error should be reported as an authentication failure.
    pub fn is_authentication(&self) -> bool {
        matches!(self, Error::Authentication)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_message_names_variables() {
        let err = Error::Configuration("AZURE_DEVOPS_ORG, AZURE_DEVOPS_PAT".to_string());
        let msg = err.to_string();
        assert!(msg.starts_with("Missing required environment variables"));
        assert!(msg.contains("AZURE_DEVOPS_ORG"));
        assert!(msg.contains("AZURE_DEVOPS_PAT"));
    }

    #[test]
    fn test_is_authentication() {
        assert!(Error::Authentication.is_authentication());
        assert!(!Error::MalformedRecord.is_authentication());
    }
}
