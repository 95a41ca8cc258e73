// src/app/run.rs
use super::binding::{overlay, KubeConfigBinding};
use crate::config::Layout;
use crate::error::KubeConfigError;
use crate::kubeconfig::KubeConfigWriter;
use crate::types::CredentialRequest;
use crate::utils::Logger;
use std::{
    collections::BTreeMap,
    io,
    process::{Command, ExitStatus},
    sync::atomic::{AtomicBool, Ordering},
    thread,
    time::Duration,
};
use tracing::{debug, info, warn};

/// Runs `body` with kubeconfig files for `requests` in place.
///
/// `body` receives the environment overrides and the build log. The files are
/// removed before returning, whether writing or `body` failed or not.
pub fn with_kubeconfig<T, E, F>(
    writer: &KubeConfigWriter<'_>,
    requests: &[CredentialRequest],
    logger: Box<dyn Logger>,
    body: F,
) -> Result<T, E>
where
    E: From<KubeConfigError> + From<io::Error>,
    F: FnOnce(&BTreeMap<String, String>, &mut dyn Logger) -> Result<T, E>,
{
    let mut binding = KubeConfigBinding::acquire(&writer.config().env_variable, logger);

    let outcome = bind(writer, requests, &mut binding)
        .map_err(E::from)
        .and_then(|()| {
            let overrides = binding.overrides()?;
            body(&overrides, binding.logger_mut())
        });
    let released = binding.release();

    let value = outcome?;
    released?;
    Ok(value)
}

fn bind(
    writer: &KubeConfigWriter<'_>,
    requests: &[CredentialRequest],
    binding: &mut KubeConfigBinding,
) -> Result<(), KubeConfigError> {
    match writer.config().layout {
        Layout::Merged => {
            let path = writer.write(requests, binding.logger_mut())?;
            binding.register(path);
        }
        Layout::PerCredential => {
            writer.write_each(requests, binding)?;
        }
    }
    Ok(())
}

const CHILD_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Runs `command` with `base` overlaid by `overrides` as its whole
/// environment. The current process environment is left untouched.
///
/// Once `abort` is set the child is killed and reaped, so the caller can
/// release its kubeconfig files before exiting.
pub fn run_command(
    command: &[String],
    base: &BTreeMap<String, String>,
    overrides: &BTreeMap<String, String>,
    abort: &AtomicBool,
) -> io::Result<ExitStatus> {
    let (program, args) = command
        .split_first()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "no command given"))?;

    info!(program = %program, args = args.len(), "running command");
    let mut child = Command::new(program)
        .args(args)
        .env_clear()
        .envs(overlay(base, overrides))
        .spawn()?;

    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(status);
        }
        if abort.load(Ordering::SeqCst) {
            warn!(program = %program, "aborted, stopping command");
            // the child may have exited on its own in the meantime
            if let Err(e) = child.kill() {
                debug!(error = %e, "command already stopped");
            }
            return child.wait();
        }
        thread::sleep(CHILD_POLL_INTERVAL);
    }
}
