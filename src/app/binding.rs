// src/app/binding.rs
use crate::utils::Logger;
use std::{
    collections::BTreeMap,
    env, fs, io,
    path::PathBuf,
};
use tracing::{debug, warn};

/// Returns `base` with every key of `overrides` replaced. Other keys are kept.
pub fn overlay(
    base: &BTreeMap<String, String>,
    overrides: &BTreeMap<String, String>,
) -> BTreeMap<String, String> {
    let mut merged = base.clone();
    merged.extend(overrides.iter().map(|(k, v)| (k.clone(), v.clone())));
    merged
}

/// Owns the kubeconfig files of one unit of work.
///
/// Files are removed exactly once, either by [`KubeConfigBinding::release`] or
/// when the binding is dropped (early return, `?`, panic).
pub struct KubeConfigBinding {
    env_variable: String,
    files: Vec<PathBuf>,
    logger: Box<dyn Logger>,
    released: bool,
}

impl KubeConfigBinding {
    pub fn acquire(env_variable: impl Into<String>, logger: Box<dyn Logger>) -> Self {
        Self {
            env_variable: env_variable.into(),
            files: Vec::new(),
            logger,
            released: false,
        }
    }

    pub fn register(&mut self, path: PathBuf) {
        debug!(path = %path.display(), "kubeconfig registered");
        self.files.push(path);
    }

    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    pub fn env_variable(&self) -> &str {
        &self.env_variable
    }

    pub fn logger_mut(&mut self) -> &mut dyn Logger {
        self.logger.as_mut()
    }

    /// The variable pointing at every registered file, joined with the
    /// platform path-list separator. Empty until a file is registered.
    pub fn overrides(&self) -> io::Result<BTreeMap<String, String>> {
        let mut overrides = BTreeMap::new();
        if self.files.is_empty() {
            return Ok(overrides);
        }
        let joined = env::join_paths(&self.files)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?
            .into_string()
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidData, "kubeconfig path is not valid UTF-8"))?;
        overrides.insert(self.env_variable.clone(), joined);
        Ok(overrides)
    }

    /// `base` with the kubeconfig variable overridden.
    pub fn environment(&self, base: &BTreeMap<String, String>) -> io::Result<BTreeMap<String, String>> {
        Ok(overlay(base, &self.overrides()?))
    }

    pub fn release(mut self) -> io::Result<()> {
        self.cleanup()
    }

    fn cleanup(&mut self) -> io::Result<()> {
        if self.released {
            return Ok(());
        }
        self.released = true;

        let mut failure = None;
        for path in self.files.drain(..) {
            match fs::remove_file(&path) {
                Ok(()) => debug!(path = %path.display(), "kubeconfig removed"),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "failed to remove kubeconfig");
                    failure.get_or_insert(e);
                }
            }
        }
        self.logger.log("kubectl configuration cleaned up");
        failure.map_or(Ok(()), Err)
    }
}

impl Drop for KubeConfigBinding {
    fn drop(&mut self) {
        if let Err(e) = self.cleanup() {
            warn!(error = %e, "kubeconfig cleanup failed");
        }
    }
}
