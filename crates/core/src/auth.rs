//! Authorization header values for the Cloud Elements API
//!
//! The API authenticates every call with a composite `Authorization` header
//! carrying the organization and user secrets plus, for element-scoped calls,
//! an element instance token. Token acquisition and refresh are the caller's
//! concern; this module only renders the header value.

use serde::{Deserialize, Serialize};

/// Header value sent when a connector has no authorization configured.
/// The server rejects it, which is the intended signal.
pub(crate) const PLACEHOLDER_AUTH_HEADER: &str = "basic empty";

/// Credentials for one Cloud Elements account, optionally bound to an
/// element instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloudAuthorization {
    pub user_secret: String,
    pub organization_secret: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub element_token: Option<String>,
}

impl CloudAuthorization {
    /// Account-level authorization (hub catalog, provisioning)
    pub fn new(user_secret: impl Into<String>, organization_secret: impl Into<String>) -> Self {
        Self {
            user_secret: user_secret.into(),
            organization_secret: organization_secret.into(),
            element_token: None,
        }
    }

    /// Authorization bound to a provisioned element instance
    pub fn with_element_token(mut self, token: impl Into<String>) -> Self {
        self.element_token = Some(token.into());
        self
    }

    /// Render the `Authorization` header value
    pub fn header_value(&self) -> String {
        match &self.element_token {
            Some(token) => format!(
                "User {}, Organization {}, Element {}",
                self.user_secret, self.organization_secret, token
            ),
            None => format!(
                "User {}, Organization {}",
                self.user_secret, self.organization_secret
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_value_without_element_token() {
        let auth = CloudAuthorization::new("usr123", "org456");
        assert_eq!(auth.header_value(), "User usr123, Organization org456");
    }

    #[test]
    fn test_header_value_with_element_token() {
        let auth = CloudAuthorization::new("usr123", "org456").with_element_token("el789");
        assert_eq!(
            auth.header_value(),
            "User usr123, Organization org456, Element el789"
        );
    }
}
