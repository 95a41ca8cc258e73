// src/kubeconfig/model.rs
//! Serde model of the kubeconfig file format.
//!
//! Collections are keyed by `name`; `upsert_*` edits an existing entry in place,
//! overwriting only the fields the incoming entry actually carries.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

pub type Extra = BTreeMap<String, serde_yaml::Value>;

fn default_api_version() -> String {
    "v1".to_string()
}

fn default_kind() -> String {
    "Config".to_string()
}

/// kubectl writes `users: null` for empty collections.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KubeConfig {
    #[serde(rename = "apiVersion", default = "default_api_version")]
    pub api_version: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub clusters: Vec<NamedCluster>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub contexts: Vec<NamedContext>,
    #[serde(
        rename = "current-context",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub current_context: Option<String>,
    #[serde(default = "default_kind")]
    pub kind: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub users: Vec<NamedUser>,
    /// Keys we do not model (`preferences`, `extensions`, ...), kept as found.
    #[serde(flatten)]
    pub extra: Extra,
}

impl Default for KubeConfig {
    fn default() -> Self {
        Self {
            api_version: default_api_version(),
            clusters: Vec::new(),
            contexts: Vec::new(),
            current_context: None,
            kind: default_kind(),
            users: Vec::new(),
            extra: Extra::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NamedCluster {
    #[serde(default)]
    pub cluster: Cluster,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cluster {
    #[serde(
        rename = "certificate-authority",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub certificate_authority: Option<String>,
    #[serde(
        rename = "certificate-authority-data",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub certificate_authority_data: Option<String>,
    #[serde(
        rename = "insecure-skip-tls-verify",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub insecure_skip_tls_verify: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NamedContext {
    #[serde(default)]
    pub context: Context,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Context {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NamedUser {
    pub name: String,
    #[serde(default)]
    pub user: AuthInfo,
}

#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuthInfo {
    /// Always written, always empty.
    #[serde(rename = "as-user-extra", default, deserialize_with = "null_as_default")]
    pub as_user_extra: BTreeMap<String, Vec<String>>,
    #[serde(
        rename = "client-certificate",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub client_certificate: Option<String>,
    #[serde(
        rename = "client-certificate-data",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub client_certificate_data: Option<String>,
    #[serde(rename = "client-key", default, skip_serializing_if = "Option::is_none")]
    pub client_key: Option<String>,
    #[serde(
        rename = "client-key-data",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub client_key_data: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

impl std::fmt::Debug for AuthInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthInfo")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("client_certificate", &self.client_certificate)
            .field("client_certificate_data", &self.client_certificate_data.is_some())
            .field("client_key", &self.client_key)
            .field("client_key_data", &self.client_key_data.as_ref().map(|_| "[REDACTED]"))
            .field("extra", &self.extra.keys().collect::<Vec<_>>())
            .finish()
    }
}

fn overwrite<T>(target: &mut Option<T>, incoming: Option<T>) {
    if incoming.is_some() {
        *target = incoming;
    }
}

impl Cluster {
    pub fn merge_from(&mut self, incoming: Cluster) {
        overwrite(&mut self.certificate_authority, incoming.certificate_authority);
        overwrite(
            &mut self.certificate_authority_data,
            incoming.certificate_authority_data,
        );
        overwrite(
            &mut self.insecure_skip_tls_verify,
            incoming.insecure_skip_tls_verify,
        );
        overwrite(&mut self.server, incoming.server);
        self.extra.extend(incoming.extra);
    }
}

impl Context {
    pub fn merge_from(&mut self, incoming: Context) {
        overwrite(&mut self.cluster, incoming.cluster);
        overwrite(&mut self.namespace, incoming.namespace);
        overwrite(&mut self.user, incoming.user);
        self.extra.extend(incoming.extra);
    }
}

impl AuthInfo {
    pub fn merge_from(&mut self, incoming: AuthInfo) {
        self.as_user_extra.extend(incoming.as_user_extra);
        overwrite(&mut self.client_certificate, incoming.client_certificate);
        overwrite(
            &mut self.client_certificate_data,
            incoming.client_certificate_data,
        );
        overwrite(&mut self.client_key, incoming.client_key);
        overwrite(&mut self.client_key_data, incoming.client_key_data);
        overwrite(&mut self.password, incoming.password);
        overwrite(&mut self.token, incoming.token);
        overwrite(&mut self.username, incoming.username);
        self.extra.extend(incoming.extra);
    }
}

impl KubeConfig {
    pub fn from_yaml(content: &str) -> Result<Self, serde_yaml::Error> {
        let mut config: KubeConfig = serde_yaml::from_str(content)?;
        if config.current_context.as_deref() == Some("") {
            config.current_context = None;
        }
        Ok(config)
    }

    /// Serializes with every collection sorted by name.
    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        let mut canonical = self.clone();
        canonical.clusters.sort_by(|a, b| a.name.cmp(&b.name));
        canonical.contexts.sort_by(|a, b| a.name.cmp(&b.name));
        canonical.users.sort_by(|a, b| a.name.cmp(&b.name));
        serde_yaml::to_string(&canonical)
    }

    pub fn upsert_cluster(&mut self, incoming: NamedCluster) {
        if let Some(existing) = self.clusters.iter_mut().find(|c| c.name == incoming.name) {
            existing.cluster.merge_from(incoming.cluster);
        } else {
            self.clusters.push(incoming);
        }
    }

    pub fn upsert_context(&mut self, incoming: NamedContext) {
        if let Some(existing) = self.contexts.iter_mut().find(|c| c.name == incoming.name) {
            existing.context.merge_from(incoming.context);
        } else {
            self.contexts.push(incoming);
        }
    }

    pub fn upsert_user(&mut self, incoming: NamedUser) {
        if let Some(existing) = self.users.iter_mut().find(|u| u.name == incoming.name) {
            existing.user.merge_from(incoming.user);
        } else {
            self.users.push(incoming);
        }
    }

    /// Folds every entry of `other` into this document. `current-context` and
    /// the envelope are left alone; unknown top-level keys are added.
    pub fn merge(&mut self, other: KubeConfig) {
        for cluster in other.clusters {
            self.upsert_cluster(cluster);
        }
        for context in other.contexts {
            self.upsert_context(context);
        }
        for user in other.users {
            self.upsert_user(user);
        }
        self.extra.extend(other.extra);
    }

    pub fn cluster(&self, name: &str) -> Option<&Cluster> {
        self.clusters.iter().find(|c| c.name == name).map(|c| &c.cluster)
    }

    pub fn context(&self, name: &str) -> Option<&Context> {
        self.contexts.iter().find(|c| c.name == name).map(|c| &c.context)
    }

    pub fn user(&self, name: &str) -> Option<&AuthInfo> {
        self.users.iter().find(|u| u.name == name).map(|u| &u.user)
    }
}
