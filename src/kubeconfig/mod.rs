// src/kubeconfig/mod.rs
mod auth;
mod builder;
pub mod kubectl;
mod model;
mod writer;

pub use auth::{classify, KubernetesAuth};
pub use builder::{AppliedFragment, ConfigBuilder, Naming};
pub use model::{AuthInfo, Cluster, Context, Extra, KubeConfig, NamedCluster, NamedContext, NamedUser};
pub use writer::KubeConfigWriter;
