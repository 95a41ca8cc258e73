// src/kubeconfig/kubectl.rs
//! The `kubectl config ...` command lines equivalent to a fragment, for the
//! build log. Arguments that carry secrets are masked when rendered.

use super::auth::KubernetesAuth;
use super::builder::AppliedFragment;
use crate::cert::{encode_pem, PemKind};
use secrecy::ExposeSecret;
use std::fmt;

const KUBECTL_BINARY: &str = "kubectl";
const MASK: &str = "********";

#[derive(Clone, PartialEq, Eq)]
pub struct KubectlInvocation {
    args: Vec<String>,
    masks: Vec<bool>,
}

impl KubectlInvocation {
    fn config(subcommand: &str) -> Self {
        let mut invocation = Self {
            args: Vec::new(),
            masks: Vec::new(),
        };
        invocation.push(KUBECTL_BINARY.to_string(), false);
        invocation.push("config".to_string(), false);
        invocation.push(subcommand.to_string(), false);
        invocation
    }

    fn push(&mut self, arg: String, masked: bool) {
        self.args.push(arg);
        self.masks.push(masked);
    }

    fn arg(mut self, arg: impl Into<String>) -> Self {
        self.push(arg.into(), false);
        self
    }

    fn secret_arg(mut self, arg: impl Into<String>) -> Self {
        self.push(arg.into(), true);
        self
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn masks(&self) -> &[bool] {
        &self.masks
    }
}

fn quote(arg: &str) -> String {
    if !arg.is_empty() && !arg.chars().any(|c| c.is_whitespace() || c == '"' || c == '\'') {
        return arg.to_string();
    }
    format!("\"{}\"", arg.replace('\\', "\\\\").replace('"', "\\\""))
}

/// Renders the command line with secret positions replaced by a mask.
impl fmt::Display for KubectlInvocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self
            .args
            .iter()
            .zip(&self.masks)
            .map(|(arg, masked)| {
                if *masked {
                    // keep the flag name visible
                    match arg.split_once('=') {
                        Some((flag, _)) if flag.starts_with("--") => format!("{}={}", flag, MASK),
                        _ => MASK.to_string(),
                    }
                } else {
                    quote(arg)
                }
            })
            .collect();
        write!(f, "{}", rendered.join(" "))
    }
}

impl fmt::Debug for KubectlInvocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KubectlInvocation({})", self)
    }
}

pub fn set_cluster(name: &str, server: Option<&str>, ca_certificate: Option<&str>) -> Vec<KubectlInvocation> {
    let mut cluster = KubectlInvocation::config("set-cluster").arg(name);
    if let Some(server) = server {
        cluster = cluster.arg(format!("--server={}", server));
    }
    match ca_certificate {
        None => vec![cluster.arg("--insecure-skip-tls-verify=true")],
        Some(ca) => vec![
            cluster,
            KubectlInvocation::config("set")
                .arg(format!("clusters.{}.certificate-authority-data", name))
                .arg(encode_pem(PemKind::Certificate, ca)),
        ],
    }
}

pub fn set_credentials(user: &str, auth: &KubernetesAuth) -> Vec<KubectlInvocation> {
    match auth {
        KubernetesAuth::UsernamePassword { username, password } => vec![KubectlInvocation::config(
            "set-credentials",
        )
        .arg(user)
        .arg(format!("--username={}", username))
        .secret_arg(format!("--password={}", password.expose_secret()))],
        KubernetesAuth::Token { token } => vec![KubectlInvocation::config("set-credentials")
            .arg(user)
            .secret_arg(format!("--token={}", token.expose_secret()))],
        KubernetesAuth::Certificate {
            certificate,
            private_key,
        } => vec![
            KubectlInvocation::config("set")
                .arg(format!("users.{}.client-certificate-data", user))
                .arg(encode_pem(PemKind::Certificate, certificate)),
            KubectlInvocation::config("set")
                .arg(format!("users.{}.client-key-data", user))
                .secret_arg(encode_pem(PemKind::PrivateKey, private_key.expose_secret())),
        ],
        KubernetesAuth::Kubeconfig { .. } => Vec::new(),
    }
}

pub fn set_context(name: &str, cluster: &str, user: &str, namespace: Option<&str>) -> KubectlInvocation {
    let context = KubectlInvocation::config("set-context")
        .arg(name)
        .arg(format!("--cluster={}", cluster))
        .arg(format!("--user={}", user));
    match namespace {
        Some(namespace) => context.arg(format!("--namespace={}", namespace)),
        None => context,
    }
}

pub fn use_context(name: &str) -> KubectlInvocation {
    KubectlInvocation::config("use-context").arg(name)
}

/// Every invocation that would reproduce `fragment` with `kubectl`.
pub fn equivalent_invocations(fragment: &AppliedFragment, auth: &KubernetesAuth) -> Vec<KubectlInvocation> {
    match fragment {
        AppliedFragment::Raw { repointed } => repointed.iter().map(|c| use_context(c)).collect(),
        AppliedFragment::Synthesized {
            cluster,
            server,
            ca_certificate,
            user,
            context,
            namespace,
            use_context: switch,
        } => {
            let mut invocations = set_cluster(cluster, server.as_deref(), ca_certificate.as_deref());
            invocations.extend(set_credentials(user, auth));
            invocations.push(set_context(context, cluster, user, namespace.as_deref()));
            if *switch {
                invocations.push(use_context(context));
            }
            invocations
        }
    }
}
