//! Error taxonomy for kubeconfig assembly.

use std::io;
use thiserror::Error;

/// Boxed cause returned by token producers.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Every failure aborts the unit of work; nothing is retried here.
#[derive(Error, Debug)]
pub enum KubeConfigError {
    #[error("No credentials defined to setup Kubernetes CLI")]
    NoCredentialsConfigured,

    #[error("Unable to find credentials with id '{0}'")]
    CredentialNotFound(String),

    #[error("Unsupported credentials type {kind} (credentials id '{id}')")]
    UnsupportedCredentialKind { id: String, kind: String },

    #[error("Failed to obtain a token from credentials '{id}': {source}")]
    TokenDerivation {
        id: String,
        #[source]
        source: BoxError,
    },

    #[error("Invalid certificate credentials '{id}': {reason}")]
    InvalidCertificate { id: String, reason: String },

    #[error("Malformed kubeconfig in credentials '{id}': {source}")]
    MalformedRawConfig {
        id: String,
        #[source]
        source: BoxError,
    },

    #[error("Context '{context}' not found in kubeconfig from credentials '{id}'")]
    ContextNotFoundForRepoint { id: String, context: String },

    #[error("Kubeconfig setup aborted")]
    Aborted,

    #[error("Failed to serialize kubeconfig: {0}")]
    Serialize(#[source] serde_yaml::Error),

    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, KubeConfigError>;
