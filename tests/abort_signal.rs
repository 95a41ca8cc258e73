#![cfg(unix)]

use kubeconfig_binder::app::install_abort_handler;
use std::{
    process::{self, Command},
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread,
    time::{Duration, Instant},
};

// Lives in its own test binary: after this the process keeps its SIGTERM handler.
#[test]
fn test_sigterm_sets_abort_flag_instead_of_exiting() {
    let abort = Arc::new(AtomicBool::new(false));
    install_abort_handler(Arc::clone(&abort)).unwrap();

    let status = Command::new("kill")
        .arg("-TERM")
        .arg(process::id().to_string())
        .status()
        .unwrap();
    assert!(status.success());

    let deadline = Instant::now() + Duration::from_secs(10);
    while !abort.load(Ordering::SeqCst) && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(20));
    }
    assert!(abort.load(Ordering::SeqCst));
}
