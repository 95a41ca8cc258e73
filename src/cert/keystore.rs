// src/cert/keystore.rs
use openssl::pkcs12::Pkcs12;
use thiserror::Error;

/// Certificate and private key pulled out of a keystore, both PEM encoded.
#[derive(Clone)]
pub struct ClientKeyPair {
    pub certificate_pem: String,
    pub private_key_pem: String,
}

impl std::fmt::Debug for ClientKeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientKeyPair")
            .field("certificate_pem", &self.certificate_pem)
            .field("private_key_pem", &"[REDACTED]")
            .finish()
    }
}

#[derive(Error, Debug)]
#[error("{message}")]
pub struct KeystoreError {
    pub message: String,
}

impl From<openssl::error::ErrorStack> for KeystoreError {
    fn from(error: openssl::error::ErrorStack) -> Self {
        KeystoreError {
            message: error.to_string(),
        }
    }
}

fn pem_to_string(bytes: Vec<u8>) -> Result<String, KeystoreError> {
    String::from_utf8(bytes).map_err(|e| KeystoreError {
        message: format!("PEM output is not valid UTF-8: {}", e),
    })
}

/// Opens a PKCS#12 keystore and returns its first certificate and private key.
/// The key is emitted as PKCS#8 (`BEGIN PRIVATE KEY`).
pub fn extract_from_pkcs12(der: &[u8], passphrase: &str) -> Result<ClientKeyPair, KeystoreError> {
    let parsed = Pkcs12::from_der(der)?.parse2(passphrase)?;

    let certificate = parsed.cert.ok_or_else(|| KeystoreError {
        message: "keystore does not contain a certificate".to_string(),
    })?;
    let key = parsed.pkey.ok_or_else(|| KeystoreError {
        message: "keystore does not contain a private key".to_string(),
    })?;

    Ok(ClientKeyPair {
        certificate_pem: pem_to_string(certificate.to_pem()?)?,
        private_key_pem: pem_to_string(key.private_key_to_pem_pkcs8()?)?,
    })
}
