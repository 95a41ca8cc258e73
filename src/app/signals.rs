// src/app/signals.rs
use std::{
    io,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread,
};
use tokio::runtime::Builder;
use tracing::{info, warn};

#[cfg(unix)]
struct Signals {
    interrupt: tokio::signal::unix::Signal,
    terminate: tokio::signal::unix::Signal,
}

#[cfg(unix)]
impl Signals {
    fn register() -> io::Result<Self> {
        use tokio::signal::unix::{signal, SignalKind};
        Ok(Self {
            interrupt: signal(SignalKind::interrupt())?,
            terminate: signal(SignalKind::terminate())?,
        })
    }

    async fn recv(&mut self) -> Option<&'static str> {
        tokio::select! {
            received = self.interrupt.recv() => received.map(|()| "SIGINT"),
            received = self.terminate.recv() => received.map(|()| "SIGTERM"),
        }
    }
}

#[cfg(not(unix))]
struct Signals;

#[cfg(not(unix))]
impl Signals {
    fn register() -> io::Result<Self> {
        Ok(Self)
    }

    async fn recv(&mut self) -> Option<&'static str> {
        tokio::signal::ctrl_c().await.ok().map(|()| "ctrl-c")
    }
}

/// Sets `abort` whenever the process is asked to stop, instead of letting the
/// default handler kill it with kubeconfig files still on disk.
///
/// The handlers are registered before this returns; a background thread
/// keeps listening for the rest of the process lifetime.
pub fn install_abort_handler(abort: Arc<AtomicBool>) -> io::Result<()> {
    let runtime = Builder::new_current_thread().enable_all().build()?;
    let mut signals = {
        let _guard = runtime.enter();
        Signals::register()?
    };

    thread::Builder::new()
        .name("abort-signal".to_string())
        .spawn(move || {
            runtime.block_on(async move {
                while let Some(signal) = signals.recv().await {
                    info!(signal, "Received shutdown signal, aborting");
                    abort.store(true, Ordering::SeqCst);
                }
                warn!("signal stream closed");
            })
        })?;
    Ok(())
}
