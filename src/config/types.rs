// src/config/types.rs
use crate::kubeconfig::Naming;
use crate::types::CredentialRequest;
use serde::{Deserialize, Serialize};
use std::{fs, io, path::Path};

/// How users created from non-raw credentials are named.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UserNaming {
    /// One user per credential, named after the credential id.
    #[default]
    CredentialId,
    /// A single request without `skip_use_context` uses `admin_user_name`.
    SharedAdmin,
}

/// Whether all requests share one document or each gets its own file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Layout {
    #[default]
    Merged,
    PerCredential,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct WriterConfig {
    pub default_cluster_name: String,
    pub default_context_name: String,
    pub admin_user_name: String,
    pub user_naming: UserNaming,
    pub env_variable: String,
    pub temp_prefix: String,
    pub temp_suffix: String,
    pub layout: Layout,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            default_cluster_name: "k8s".to_string(),
            default_context_name: "k8s".to_string(),
            admin_user_name: "cluster-admin".to_string(),
            user_naming: UserNaming::CredentialId,
            env_variable: "KUBECONFIG".to_string(),
            temp_prefix: ".kube".to_string(),
            temp_suffix: "config".to_string(),
            layout: Layout::Merged,
        }
    }
}

impl WriterConfig {
    pub fn load_from_file(path: impl AsRef<Path>) -> io::Result<Self> {
        let config_str = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&config_str)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        config.validate()?;
        Ok(config)
    }

    pub fn save_to_file(&self, path: impl AsRef<Path>) -> io::Result<()> {
        let config_str = serde_json::to_string_pretty(self)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        fs::write(path, config_str)
    }

    pub fn validate(&self) -> io::Result<()> {
        let required = [
            ("default-cluster-name", &self.default_cluster_name),
            ("default-context-name", &self.default_context_name),
            ("admin-user-name", &self.admin_user_name),
            ("env-variable", &self.env_variable),
        ];
        for (key, value) in required {
            if value.trim().is_empty() {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("{} must not be empty", key),
                ));
            }
        }
        if self.env_variable.contains('=') || self.env_variable.contains('\0') {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("invalid environment variable name: {}", self.env_variable),
            ));
        }
        for (key, value) in [("temp-prefix", &self.temp_prefix), ("temp-suffix", &self.temp_suffix)] {
            if value.contains(std::path::is_separator) {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("{} must not contain a path separator", key),
                ));
            }
        }
        Ok(())
    }

    pub fn naming(&self) -> Naming {
        Naming {
            default_cluster_name: self.default_cluster_name.clone(),
            default_context_name: self.default_context_name.clone(),
            admin_user_name: self.admin_user_name.clone(),
            user_naming: self.user_naming,
        }
    }
}

/// Reads the JSON array of credential requests the binding is driven by.
pub fn load_requests(path: impl AsRef<Path>) -> io::Result<Vec<CredentialRequest>> {
    let content = fs::read_to_string(path)?;
    serde_json::from_str(&content).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}
