// src/kubeconfig/auth.rs
use crate::cert::extract_from_pkcs12;
use crate::credentials::{CertificateSource, StoredCredential};
use crate::error::{KubeConfigError, Result};
use crate::types::CredentialRequest;
use secrecy::{ExposeSecret, SecretString};

/// Authentication material ready to be written into a kubeconfig user entry,
/// or a whole kubeconfig to be used as is.
pub enum KubernetesAuth {
    UsernamePassword {
        username: String,
        password: SecretString,
    },
    Token {
        token: SecretString,
    },
    Certificate {
        certificate: String,
        private_key: SecretString,
    },
    Kubeconfig {
        content: String,
    },
}

impl KubernetesAuth {
    pub fn is_raw(&self) -> bool {
        matches!(self, KubernetesAuth::Kubeconfig { .. })
    }

    pub fn kind(&self) -> &'static str {
        match self {
            KubernetesAuth::UsernamePassword { .. } => "username-password",
            KubernetesAuth::Token { .. } => "token",
            KubernetesAuth::Certificate { .. } => "certificate",
            KubernetesAuth::Kubeconfig { .. } => "kubeconfig",
        }
    }
}

impl std::fmt::Debug for KubernetesAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KubernetesAuth::UsernamePassword { username, .. } => f
                .debug_struct("UsernamePassword")
                .field("username", username)
                .finish_non_exhaustive(),
            other => write!(f, "KubernetesAuth({})", other.kind()),
        }
    }
}

/// Turns a resolved credential into authentication material. Token producers
/// are asked for a fresh token on every call.
pub fn classify(
    credential_id: &str,
    credential: &StoredCredential,
    request: &CredentialRequest,
) -> Result<KubernetesAuth> {
    let auth = match credential {
        StoredCredential::UsernamePassword { username, password } => {
            KubernetesAuth::UsernamePassword {
                username: username.clone(),
                password: SecretString::from(password.expose_secret().to_string()),
            }
        }
        StoredCredential::SecretText { secret } => KubernetesAuth::Token {
            token: SecretString::from(secret.expose_secret().to_string()),
        },
        StoredCredential::TokenProducer(producer) => {
            let ca_certificate = request.ca_certificate();
            let token = producer
                .token(
                    request.server_url().unwrap_or_default(),
                    ca_certificate,
                    ca_certificate.is_none(),
                )
                .map_err(|source| KubeConfigError::TokenDerivation {
                    id: credential_id.to_string(),
                    source,
                })?;
            KubernetesAuth::Token { token }
        }
        StoredCredential::Certificate(CertificateSource::Pem {
            certificate,
            private_key,
        }) => KubernetesAuth::Certificate {
            certificate: certificate.clone(),
            private_key: SecretString::from(private_key.expose_secret().to_string()),
        },
        StoredCredential::Certificate(CertificateSource::Pkcs12 {
            keystore,
            passphrase,
        }) => {
            let pair = extract_from_pkcs12(keystore, passphrase.expose_secret()).map_err(|e| {
                KubeConfigError::InvalidCertificate {
                    id: credential_id.to_string(),
                    reason: e.to_string(),
                }
            })?;
            KubernetesAuth::Certificate {
                certificate: pair.certificate_pem,
                private_key: SecretString::from(pair.private_key_pem),
            }
        }
        StoredCredential::File { content, .. } => KubernetesAuth::Kubeconfig {
            content: String::from_utf8(content.clone()).map_err(|e| {
                KubeConfigError::MalformedRawConfig {
                    id: credential_id.to_string(),
                    source: Box::new(e),
                }
            })?,
        },
        StoredCredential::Other { kind } => {
            return Err(KubeConfigError::UnsupportedCredentialKind {
                id: credential_id.to_string(),
                kind: kind.clone(),
            })
        }
    };
    Ok(auth)
}
