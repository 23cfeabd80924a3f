pub mod handoff;
pub mod orchestrator;
pub mod seed;
pub mod signals;
pub mod static_assets;

pub use handoff::{CommandLine, Handoff};
pub use orchestrator::Orchestrator;
pub use signals::{ShutdownSignal, shutdown_signal};
