use finassist_bootstrap::config::{Config, EnvSettings};
use finassist_bootstrap::db::FrameworkAccounts;
use finassist_bootstrap::error::{BootstrapError, EXIT_CONFIG};
use finassist_bootstrap::framework::{DjangoManage, Framework};
use finassist_bootstrap::probe::select_prober;
use finassist_bootstrap::service::{Handoff, Orchestrator, handoff, shutdown_signal};
use mimalloc::MiMalloc;
use std::ffi::OsString;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    let settings = match EnvSettings::from_env() {
        Ok(settings) => settings,
        Err(e) => {
            init_tracing("info");
            error!(error = %e, "invalid environment");
            return ExitCode::from(e.exit_code());
        }
    };
    init_tracing(&settings.log_level);

    let cfg = match Config::from_settings(settings) {
        Ok(cfg) => cfg,
        Err(e) => {
            error!(error = %e, "invalid configuration");
            return ExitCode::from(e.exit_code());
        }
    };

    info!(
        version = env!("CARGO_PKG_VERSION"),
        store = %cfg.store,
        probe = ?cfg.probe,
        run_mode = ?cfg.run.mode,
        app_dir = %cfg.app_dir.display(),
        "finassist-bootstrap starting"
    );

    let trailing: Vec<OsString> = std::env::args_os().skip(1).collect();

    // One thread is enough: every stage runs strictly after the previous one.
    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!(error = %e, "failed to start async runtime");
            return ExitCode::from(EXIT_CONFIG);
        }
    };
    let result = runtime.block_on(bootstrap(&cfg, trailing));
    // Shut the runtime down before the process image is replaced.
    drop(runtime);

    match result {
        Ok(plan) => {
            let err = handoff::exec(&plan.command, &cfg.app_dir);
            error!(command = %plan.command, error = %err, "hand-off failed");
            ExitCode::from(err.exit_code())
        }
        Err(e) => ExitCode::from(e.exit_code()),
    }
}

async fn bootstrap(cfg: &Config, trailing: Vec<OsString>) -> Result<Handoff, BootstrapError> {
    let prober = select_prober(cfg.probe, &cfg.store).inspect_err(|e| {
        error!(error = %e, "no usable readiness probe");
    })?;
    let framework: Arc<dyn Framework> = Arc::new(DjangoManage::from_config(cfg));
    let accounts = FrameworkAccounts::connect_lazy(&cfg.store, framework.clone())
        .inspect_err(|e| error!(error = %e, "invalid database settings"))?;
    let orchestrator = Orchestrator::new(cfg, prober.as_ref(), framework.as_ref(), &accounts);

    let result = tokio::select! {
        res = orchestrator.run(trailing) => res,
        signal = shutdown_signal() => {
            warn!(%signal, stage = %orchestrator.stage(), "termination requested");
            Err(BootstrapError::Interrupted { signal, stage: orchestrator.stage() })
        }
    };

    if let Err(e) = &result {
        error!(
            stage = %orchestrator.stage(),
            exit_code = e.exit_code(),
            error = %e,
            "bootstrap aborted"
        );
    }
    accounts.close().await;
    result
}

fn init_tracing(level: &str) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.to_ascii_lowercase()));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_level(true)
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}
