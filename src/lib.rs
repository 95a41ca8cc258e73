// src/lib.rs
//! Materializes temporary kubeconfig files from stored credentials and keeps
//! them alive for exactly one unit of work.

pub mod app;
pub mod cert;
pub mod config;
pub mod credentials;
pub mod error;
pub mod kubeconfig;
pub mod types;
pub mod utils;

pub use app::{overlay, run_command, with_kubeconfig, KubeConfigBinding};
pub use config::{Layout, UserNaming, WriterConfig};
pub use error::{KubeConfigError, Result};
pub use kubeconfig::{KubeConfig, KubeConfigWriter};
pub use types::CredentialRequest;
