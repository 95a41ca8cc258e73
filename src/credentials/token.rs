// src/credentials/token.rs
use crate::error::BoxError;
use secrecy::SecretString;
use std::process::Command;

/// A credential that computes its bearer token at resolution time instead of
/// storing it. Implementations may perform I/O; results are not cached.
pub trait TokenProducer: Send + Sync {
    fn token(
        &self,
        server_url: &str,
        ca_certificate: Option<&str>,
        skip_tls_verify: bool,
    ) -> Result<SecretString, BoxError>;
}

pub const SERVER_URL_ENV: &str = "KUBE_SERVER_URL";
pub const CA_CERTIFICATE_ENV: &str = "KUBE_CA_CERTIFICATE";
pub const SKIP_TLS_VERIFY_ENV: &str = "KUBE_SKIP_TLS_VERIFY";

/// Runs an external program and uses its trimmed stdout as the token. The
/// target server is described to the program through `KUBE_*` variables.
#[derive(Debug, Clone)]
pub struct CommandTokenProducer {
    command: String,
    args: Vec<String>,
}

impl CommandTokenProducer {
    pub fn new(command: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            command: command.into(),
            args,
        }
    }
}

impl TokenProducer for CommandTokenProducer {
    fn token(
        &self,
        server_url: &str,
        ca_certificate: Option<&str>,
        skip_tls_verify: bool,
    ) -> Result<SecretString, BoxError> {
        let mut cmd = Command::new(&self.command);
        cmd.args(&self.args)
            .env(SERVER_URL_ENV, server_url)
            .env(SKIP_TLS_VERIFY_ENV, skip_tls_verify.to_string());
        match ca_certificate {
            Some(ca) => cmd.env(CA_CERTIFICATE_ENV, ca),
            None => cmd.env_remove(CA_CERTIFICATE_ENV),
        };

        tracing::debug!(command = %self.command, server_url, "Running token command");
        let output = cmd
            .output()
            .map_err(|e| format!("failed to run '{}': {}", self.command, e))?;

        if !output.status.success() {
            return Err(format!(
                "'{}' exited with {}: {}",
                self.command,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )
            .into());
        }

        let token = String::from_utf8(output.stdout)?.trim().to_string();
        if token.is_empty() {
            return Err(format!("'{}' did not print a token", self.command).into());
        }
        Ok(SecretString::from(token))
    }
}
