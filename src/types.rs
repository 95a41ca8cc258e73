// types.rs
use serde::{Deserialize, Serialize};

/// One target cluster: where it lives and which stored credential reaches it.
///
/// Optional string fields treat blank values as absent, the way empty form
/// fields arrive from the host.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialRequest {
    #[serde(default)]
    pub server_url: String,
    #[serde(default)]
    pub credential_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ca_certificate: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

impl CredentialRequest {
    pub fn new(server_url: impl Into<String>, credential_id: impl Into<String>) -> Self {
        Self {
            server_url: server_url.into(),
            credential_id: credential_id.into(),
            ..Self::default()
        }
    }

    pub fn with_ca_certificate(mut self, ca: impl Into<String>) -> Self {
        self.ca_certificate = Some(ca.into());
        self
    }

    pub fn with_cluster_name(mut self, name: impl Into<String>) -> Self {
        self.cluster_name = Some(name.into());
        self
    }

    pub fn with_context_name(mut self, name: impl Into<String>) -> Self {
        self.context_name = Some(name.into());
        self
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// The credential id with surrounding whitespace removed.
    pub fn credential_id(&self) -> &str {
        self.credential_id.trim()
    }

    pub fn server_url(&self) -> Option<&str> {
        Some(self.server_url.as_str()).filter(|v| !v.trim().is_empty())
    }

    pub fn ca_certificate(&self) -> Option<&str> {
        non_blank(&self.ca_certificate)
    }

    pub fn cluster_name(&self) -> Option<&str> {
        non_blank(&self.cluster_name)
    }

    pub fn context_name(&self) -> Option<&str> {
        non_blank(&self.context_name)
    }

    pub fn namespace(&self) -> Option<&str> {
        non_blank(&self.namespace)
    }
}
