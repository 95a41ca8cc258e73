// src/kubeconfig/writer.rs
use super::auth::classify;
use super::builder::ConfigBuilder;
use super::kubectl::equivalent_invocations;
use super::model::KubeConfig;
use crate::app::KubeConfigBinding;
use crate::config::WriterConfig;
use crate::credentials::CredentialStore;
use crate::error::{KubeConfigError, Result};
use crate::types::CredentialRequest;
use crate::utils::Logger;
use std::{
    fs, io,
    io::Write,
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};
use tracing::{debug, info};
use uuid::Uuid;

const MAX_NAME_ATTEMPTS: usize = 8;

/// Writes kubeconfig files for a list of requests into a workspace.
pub struct KubeConfigWriter<'a> {
    workspace: PathBuf,
    store: &'a dyn CredentialStore,
    config: WriterConfig,
    abort: Option<Arc<AtomicBool>>,
}

impl<'a> KubeConfigWriter<'a> {
    pub fn new(workspace: impl Into<PathBuf>, store: &'a dyn CredentialStore, config: WriterConfig) -> Self {
        Self {
            workspace: workspace.into(),
            store,
            config,
            abort: None,
        }
    }

    /// Checked before every request; once set the writer stops with `Aborted`.
    pub fn with_abort_flag(mut self, abort: Arc<AtomicBool>) -> Self {
        self.abort = Some(abort);
        self
    }

    pub fn config(&self) -> &WriterConfig {
        &self.config
    }

    pub fn workspace(&self) -> &Path {
        &self.workspace
    }

    /// Folds every request into one document without touching the disk.
    pub fn build_config(&self, requests: &[CredentialRequest], logger: &mut dyn Logger) -> Result<KubeConfig> {
        if requests.is_empty() {
            return Err(KubeConfigError::NoCredentialsConfigured);
        }
        let skip_use_context = requests.len() >= 2;
        let mut builder = ConfigBuilder::new(self.config.naming());
        for request in requests {
            self.check_abort()?;
            self.fold(&mut builder, request, skip_use_context, logger)?;
        }
        Ok(builder.build())
    }

    /// Merges all requests into a single file and returns its absolute path.
    pub fn write(&self, requests: &[CredentialRequest], logger: &mut dyn Logger) -> Result<PathBuf> {
        let config = self.build_config(requests, logger)?;
        let path = self.persist(&config, logger)?;
        info!(path = %path.display(), requests = requests.len(), "kubeconfig written");
        Ok(path)
    }

    /// Writes one file per request. Each file is registered with `binding` as
    /// soon as it exists, so a later failure still gets it removed.
    pub fn write_each(
        &self,
        requests: &[CredentialRequest],
        binding: &mut KubeConfigBinding,
    ) -> Result<Vec<PathBuf>> {
        if requests.is_empty() {
            return Err(KubeConfigError::NoCredentialsConfigured);
        }
        let skip_use_context = requests.len() >= 2;
        let mut paths = Vec::with_capacity(requests.len());
        for request in requests {
            self.check_abort()?;
            let mut builder = ConfigBuilder::new(self.config.naming());
            self.fold(&mut builder, request, skip_use_context, binding.logger_mut())?;
            let path = self.persist(builder.config(), binding.logger_mut())?;
            info!(path = %path.display(), credential_id = request.credential_id(), "kubeconfig written");
            binding.register(path.clone());
            paths.push(path);
        }
        Ok(paths)
    }

    fn check_abort(&self) -> Result<()> {
        match &self.abort {
            Some(flag) if flag.load(Ordering::SeqCst) => Err(KubeConfigError::Aborted),
            _ => Ok(()),
        }
    }

    fn fold(
        &self,
        builder: &mut ConfigBuilder,
        request: &CredentialRequest,
        skip_use_context: bool,
        logger: &mut dyn Logger,
    ) -> Result<()> {
        let id = request.credential_id();
        let credential = Some(id)
            .filter(|id| !id.is_empty())
            .and_then(|id| self.store.resolve(id))
            .ok_or_else(|| KubeConfigError::CredentialNotFound(id.to_string()))?;

        let auth = classify(id, &credential, request)?;
        debug!(credential_id = id, kind = auth.kind(), skip_use_context, "credentials resolved");

        if auth.is_raw() && request.server_url().is_some() {
            logger.log("the serverUrl will be ignored as a raw kubeconfig file was provided");
        }

        let fragment = builder.apply(request, &auth, skip_use_context)?;
        for invocation in equivalent_invocations(&fragment, &auth) {
            logger.debug_log(&invocation.to_string());
        }
        Ok(())
    }

    fn persist(&self, config: &KubeConfig, logger: &mut dyn Logger) -> Result<PathBuf> {
        if !self.workspace.exists() {
            logger.log("creating missing workspace to write kubeconfig");
            fs::create_dir_all(&self.workspace)?;
        }

        let workspace = fs::canonicalize(&self.workspace)?;
        let yaml = config.to_yaml().map_err(KubeConfigError::Serialize)?;
        let mut temp = tempfile::Builder::new()
            .prefix(&self.config.temp_prefix)
            .suffix(".tmp")
            .tempfile_in(&workspace)?;
        temp.write_all(yaml.as_bytes())?;
        temp.as_file().sync_all()?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(temp.path(), fs::Permissions::from_mode(0o600))?;
        }

        for _ in 0..MAX_NAME_ATTEMPTS {
            let target = workspace.join(format!(
                "{}{}{}",
                self.config.temp_prefix,
                Uuid::new_v4().simple(),
                self.config.temp_suffix
            ));
            match temp.persist_noclobber(&target) {
                Ok(_) => return Ok(target),
                Err(err) if err.error.kind() == io::ErrorKind::AlreadyExists => temp = err.file,
                Err(err) => return Err(err.error.into()),
            }
        }
        Err(io::Error::new(io::ErrorKind::AlreadyExists, "no free kubeconfig file name in workspace").into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::{InMemoryCredentialStore, StoredCredential};
    use crate::utils::MemoryLogger;
    use secrecy::SecretString;
    use tempfile::TempDir;

    fn store() -> InMemoryCredentialStore {
        InMemoryCredentialStore::new()
            .with(
                "test-credential",
                StoredCredential::UsernamePassword {
                    username: "bob".into(),
                    password: SecretString::from("s3cr3t".to_string()),
                },
            )
            .with(
                "raw",
                StoredCredential::File {
                    file_name: "config".into(),
                    content: b"clusters:\n- name: raw-cluster\n  cluster:\n    server: https://raw\n".to_vec(),
                },
            )
    }

    fn kubeconfig_files(dir: &Path) -> Vec<PathBuf> {
        fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().path())
            .filter(|p| p.file_name().unwrap().to_string_lossy().starts_with(".kube"))
            .collect()
    }

    #[test]
    fn test_write_creates_single_file() {
        let dir = TempDir::new().unwrap();
        let store = store();
        let writer = KubeConfigWriter::new(dir.path(), &store, WriterConfig::default());
        let mut logger = MemoryLogger::new();

        let path = writer
            .write(&[CredentialRequest::new("https://localhost:6443", "test-credential")], &mut logger)
            .unwrap();

        assert!(path.is_absolute());
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with(".kube") && name.ends_with("config"));
        let files = kubeconfig_files(dir.path());
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].file_name(), path.file_name());

        let written = KubeConfig::from_yaml(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written.current_context.as_deref(), Some("k8s"));
        assert!(!logger.contains("s3cr3t"));
    }

    #[cfg(unix)]
    #[test]
    fn test_written_file_is_private() {
        use std::os::unix::fs::PermissionsExt;
        let dir = TempDir::new().unwrap();
        let store = store();
        let writer = KubeConfigWriter::new(dir.path(), &store, WriterConfig::default());

        let path = writer
            .write(&[CredentialRequest::new("", "test-credential")], &mut MemoryLogger::new())
            .unwrap();
        assert_eq!(fs::metadata(path).unwrap().permissions().mode() & 0o777, 0o600);
    }

    #[test]
    fn test_empty_requests_fail_before_writing() {
        let dir = TempDir::new().unwrap();
        let store = store();
        let writer = KubeConfigWriter::new(dir.path(), &store, WriterConfig::default());

        let err = writer.write(&[], &mut MemoryLogger::new()).unwrap_err();
        assert!(matches!(err, KubeConfigError::NoCredentialsConfigured));
        assert!(kubeconfig_files(dir.path()).is_empty());
    }

    #[test]
    fn test_unknown_and_blank_ids_are_not_found() {
        let dir = TempDir::new().unwrap();
        let store = store();
        let writer = KubeConfigWriter::new(dir.path(), &store, WriterConfig::default());
        let mut logger = MemoryLogger::new();

        let requests = [
            CredentialRequest::new("", "test-credential"),
            CredentialRequest::new("", "missing"),
        ];
        match writer.write(&requests, &mut logger).unwrap_err() {
            KubeConfigError::CredentialNotFound(id) => assert_eq!(id, "missing"),
            other => panic!("unexpected error: {other}"),
        }
        match writer.write(&[CredentialRequest::new("", "  ")], &mut logger).unwrap_err() {
            KubeConfigError::CredentialNotFound(id) => assert_eq!(id, ""),
            other => panic!("unexpected error: {other}"),
        }
        assert!(kubeconfig_files(dir.path()).is_empty());
    }

    #[test]
    fn test_missing_workspace_is_created() {
        let dir = TempDir::new().unwrap();
        let workspace = dir.path().join("nested").join("ws");
        let store = store();
        let writer = KubeConfigWriter::new(&workspace, &store, WriterConfig::default());
        let mut logger = MemoryLogger::new();

        let path = writer
            .write(&[CredentialRequest::new("", "test-credential")], &mut logger)
            .unwrap();
        assert!(path.starts_with(fs::canonicalize(&workspace).unwrap()));
        assert!(logger.contains("creating missing workspace to write kubeconfig"));
    }

    #[test]
    fn test_returned_path_is_already_canonical() {
        let dir = TempDir::new().unwrap();
        let workspace = dir.path().join("ws").join("..").join("ws");
        fs::create_dir_all(&workspace).unwrap();
        let store = store();
        let writer = KubeConfigWriter::new(&workspace, &store, WriterConfig::default());

        let path = writer
            .write(&[CredentialRequest::new("", "test-credential")], &mut MemoryLogger::new())
            .unwrap();
        assert!(path.is_absolute());
        assert_eq!(fs::canonicalize(&path).unwrap(), path);
        assert!(!path.to_string_lossy().contains(".."));
    }

    #[test]
    fn test_raw_config_logs_ignored_server_url() {
        let dir = TempDir::new().unwrap();
        let store = store();
        let writer = KubeConfigWriter::new(dir.path(), &store, WriterConfig::default());
        let mut logger = MemoryLogger::new();

        writer
            .write(&[CredentialRequest::new("https://ignored:6443", "raw")], &mut logger)
            .unwrap();
        assert!(logger.contains("the serverUrl will be ignored as a raw kubeconfig file was provided"));
    }

    #[test]
    fn test_invocations_are_debug_logged_masked() {
        let dir = TempDir::new().unwrap();
        let store = store();
        let writer = KubeConfigWriter::new(dir.path(), &store, WriterConfig::default());
        let mut logger = MemoryLogger::new();

        writer
            .write(&[CredentialRequest::new("https://localhost:6443", "test-credential")], &mut logger)
            .unwrap();
        assert!(logger.contains("[DEBUG] kubectl config set-credentials test-credential --username=bob --password=********"));
        assert!(!logger.contains("s3cr3t"));
    }

    #[test]
    fn test_abort_flag_stops_before_requests() {
        let dir = TempDir::new().unwrap();
        let store = store();
        let abort = Arc::new(AtomicBool::new(true));
        let writer = KubeConfigWriter::new(dir.path(), &store, WriterConfig::default()).with_abort_flag(abort);

        let err = writer
            .write(&[CredentialRequest::new("", "test-credential")], &mut MemoryLogger::new())
            .unwrap_err();
        assert!(matches!(err, KubeConfigError::Aborted));
        assert!(kubeconfig_files(dir.path()).is_empty());
    }

    #[test]
    fn test_write_each_registers_every_file() {
        let dir = TempDir::new().unwrap();
        let store = store();
        let writer = KubeConfigWriter::new(dir.path(), &store, WriterConfig::default());
        let logger = MemoryLogger::new();
        let mut binding = KubeConfigBinding::acquire("KUBECONFIG", Box::new(logger.clone()));

        let paths = writer
            .write_each(
                &[
                    CredentialRequest::new("https://localhost:6443", "test-credential"),
                    CredentialRequest::new("", "raw"),
                ],
                &mut binding,
            )
            .unwrap();
        assert_eq!(paths.len(), 2);
        assert_eq!(binding.files(), paths.as_slice());

        // multiple requests never pick a context
        let first = KubeConfig::from_yaml(&fs::read_to_string(&paths[0]).unwrap()).unwrap();
        assert_eq!(first.current_context, None);

        binding.release().unwrap();
        assert!(kubeconfig_files(dir.path()).is_empty());
        assert!(logger.contains("kubectl configuration cleaned up"));
    }
}
