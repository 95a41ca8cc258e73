// src/credentials/store.rs
use super::token::{CommandTokenProducer, TokenProducer};
use anyhow::{bail, Context, Result};
use base64::{engine::general_purpose, Engine as _};
use secrecy::SecretString;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Where the client certificate of a certificate credential comes from.
pub enum CertificateSource {
    /// Certificate and key, either PEM or bare base64 bodies.
    Pem {
        certificate: String,
        private_key: SecretString,
    },
    /// A PKCS#12 keystore protected by a passphrase.
    Pkcs12 {
        keystore: Vec<u8>,
        passphrase: SecretString,
    },
}

/// A credential as held by the store, before classification.
pub enum StoredCredential {
    UsernamePassword {
        username: String,
        password: SecretString,
    },
    /// A bearer token stored as plain secret text.
    SecretText { secret: SecretString },
    TokenProducer(Arc<dyn TokenProducer>),
    Certificate(CertificateSource),
    /// A complete kubeconfig file stored verbatim.
    File { file_name: String, content: Vec<u8> },
    /// Anything else the store knows about (ssh keys, ...).
    Other { kind: String },
}

impl StoredCredential {
    pub fn kind(&self) -> &str {
        match self {
            StoredCredential::UsernamePassword { .. } => "username-password",
            StoredCredential::SecretText { .. } => "secret-text",
            StoredCredential::TokenProducer(_) => "token-producer",
            StoredCredential::Certificate(_) => "certificate",
            StoredCredential::File { .. } => "file",
            StoredCredential::Other { kind } => kind.as_str(),
        }
    }
}

impl std::fmt::Debug for StoredCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoredCredential::UsernamePassword { username, .. } => f
                .debug_struct("UsernamePassword")
                .field("username", username)
                .finish_non_exhaustive(),
            StoredCredential::File { file_name, .. } => f
                .debug_struct("File")
                .field("file_name", file_name)
                .finish_non_exhaustive(),
            other => write!(f, "StoredCredential({})", other.kind()),
        }
    }
}

/// Read-only lookup of credentials by id. Implementations must tolerate
/// concurrent readers.
pub trait CredentialStore: Send + Sync {
    fn resolve(&self, id: &str) -> Option<Arc<StoredCredential>>;
}

#[derive(Debug, Default)]
pub struct InMemoryCredentialStore {
    credentials: HashMap<String, Arc<StoredCredential>>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: impl Into<String>, credential: StoredCredential) {
        self.credentials.insert(id.into(), Arc::new(credential));
    }

    pub fn with(mut self, id: impl Into<String>, credential: StoredCredential) -> Self {
        self.insert(id, credential);
        self
    }

    pub fn len(&self) -> usize {
        self.credentials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.credentials.is_empty()
    }
}

impl CredentialStore for InMemoryCredentialStore {
    fn resolve(&self, id: &str) -> Option<Arc<StoredCredential>> {
        self.credentials.get(id).cloned()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsernamePasswordEntry {
    username: String,
    password: String,
}

#[derive(Debug, Deserialize)]
struct SecretTextEntry {
    secret: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CertificateEntry {
    certificate: Option<String>,
    private_key: Option<String>,
    keystore: Option<PathBuf>,
    keystore_base64: Option<String>,
    #[serde(default)]
    passphrase: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileEntry {
    #[serde(default)]
    file_name: Option<String>,
    content: Option<String>,
    path: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
struct CommandEntry {
    command: String,
    #[serde(default)]
    args: Vec<String>,
}

/// Loads a JSON array of credential entries, each tagged with `id` and `kind`.
/// Relative paths are resolved against the directory holding the store file.
pub struct FileCredentialStore {
    inner: InMemoryCredentialStore,
}

impl FileCredentialStore {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read credentials file: {}", path.display()))?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        Self::from_json(&content, base_dir)
            .with_context(|| format!("Failed to parse credentials from {}", path.display()))
    }

    pub fn from_json(content: &str, base_dir: &Path) -> Result<Self> {
        let entries: Vec<serde_json::Value> = serde_json::from_str(content)?;
        let mut inner = InMemoryCredentialStore::new();

        for entry in entries {
            let id = entry
                .get("id")
                .and_then(|v| v.as_str())
                .context("credential entry without an 'id'")?
                .to_string();
            let kind = entry
                .get("kind")
                .and_then(|v| v.as_str())
                .with_context(|| format!("credential '{}' has no 'kind'", id))?
                .to_string();

            let credential = parse_entry(&kind, entry, base_dir)
                .with_context(|| format!("invalid credential '{}'", id))?;
            tracing::debug!(id = %id, kind = credential.kind(), "Loaded credential");
            inner.insert(id, credential);
        }

        Ok(Self { inner })
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl CredentialStore for FileCredentialStore {
    fn resolve(&self, id: &str) -> Option<Arc<StoredCredential>> {
        self.inner.resolve(id)
    }
}

fn parse_entry(kind: &str, entry: serde_json::Value, base_dir: &Path) -> Result<StoredCredential> {
    let credential = match kind {
        "usernamePassword" => {
            let e: UsernamePasswordEntry = serde_json::from_value(entry)?;
            StoredCredential::UsernamePassword {
                username: e.username,
                password: SecretString::from(e.password),
            }
        }
        "secretText" => {
            let e: SecretTextEntry = serde_json::from_value(entry)?;
            StoredCredential::SecretText {
                secret: SecretString::from(e.secret),
            }
        }
        "certificate" => {
            let e: CertificateEntry = serde_json::from_value(entry)?;
            StoredCredential::Certificate(certificate_source(e, base_dir)?)
        }
        "file" => {
            let e: FileEntry = serde_json::from_value(entry)?;
            let (content, default_name) = match (e.content, e.path) {
                (Some(content), _) => (content.into_bytes(), "kubeconfig".to_string()),
                (None, Some(path)) => {
                    let path = base_dir.join(path);
                    let bytes = fs::read(&path)
                        .with_context(|| format!("Failed to read {}", path.display()))?;
                    let name = path
                        .file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .unwrap_or_default();
                    (bytes, name)
                }
                (None, None) => bail!("file credential needs 'content' or 'path'"),
            };
            StoredCredential::File {
                file_name: e.file_name.unwrap_or(default_name),
                content,
            }
        }
        "command" => {
            let e: CommandEntry = serde_json::from_value(entry)?;
            StoredCredential::TokenProducer(Arc::new(CommandTokenProducer::new(e.command, e.args)))
        }
        other => StoredCredential::Other {
            kind: other.to_string(),
        },
    };
    Ok(credential)
}

fn certificate_source(e: CertificateEntry, base_dir: &Path) -> Result<CertificateSource> {
    if let (Some(certificate), Some(private_key)) = (e.certificate, e.private_key) {
        return Ok(CertificateSource::Pem {
            certificate,
            private_key: SecretString::from(private_key),
        });
    }

    let keystore = match (e.keystore_base64, e.keystore) {
        (Some(encoded), _) => general_purpose::STANDARD
            .decode(encoded.trim())
            .context("keystoreBase64 is not valid base64")?,
        (None, Some(path)) => {
            let path = base_dir.join(path);
            fs::read(&path).with_context(|| format!("Failed to read keystore {}", path.display()))?
        }
        (None, None) => {
            bail!("certificate credential needs 'certificate'+'privateKey' or a keystore")
        }
    };

    Ok(CertificateSource::Pkcs12 {
        keystore,
        passphrase: SecretString::from(e.passphrase),
    })
}
