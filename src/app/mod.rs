mod binding;
mod run;
mod signals;

pub use binding::{overlay, KubeConfigBinding};
pub use run::{run_command, with_kubeconfig};
pub use signals::install_abort_handler;
