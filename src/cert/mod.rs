// src/cert/mod.rs
pub mod keystore;
pub mod pem;

pub use keystore::{extract_from_pkcs12, ClientKeyPair, KeystoreError};
pub use pem::{encode_pem, wrap, wrap_certificate, wrap_private_key, PemKind};
