use crate::config::Config;
use crate::db::AccountStore;
use crate::error::BootstrapError;
use crate::framework::Framework;
use crate::probe::{Prober, wait_for_service, wait_for_store};
use crate::service::handoff::{CommandLine, Handoff};
use crate::service::seed::run_seed_stage;
use crate::service::static_assets::collect_static_assets;
use crate::types::{BootstrapOutcome, ReadinessState, Stage, StageStatus};
use std::cell::Cell;
use std::ffi::OsString;
use tracing::{debug, error, info};

/// Runs the bootstrap stages in order, each at most once:
///
/// `INIT → WAIT_STORE → WAIT_SERVICES → MIGRATE → STATIC → SEED → HANDOFF`
///
/// Only the wait stages retry. An unreachable dependency or a failed
/// migration ends the run; static collection never does; seeding depends on
/// the seed profile.
pub struct Orchestrator<'a> {
    config: &'a Config,
    prober: &'a dyn Prober,
    framework: &'a dyn Framework,
    accounts: &'a dyn AccountStore,
    stage: Cell<Stage>,
}

impl<'a> Orchestrator<'a> {
    pub fn new(
        config: &'a Config,
        prober: &'a dyn Prober,
        framework: &'a dyn Framework,
        accounts: &'a dyn AccountStore,
    ) -> Self {
        Self {
            config,
            prober,
            framework,
            accounts,
            stage: Cell::new(Stage::Init),
        }
    }

    /// Stage currently running (or the last one entered).
    pub fn stage(&self) -> Stage {
        self.stage.get()
    }

    fn enter(&self, stage: Stage) {
        debug!(from = %self.stage.get(), to = %stage, "stage transition");
        self.stage.set(stage);
    }

    /// Run every stage up to hand-off. `trailing` is the operator's command
    /// line, empty when the default server command should be used.
    pub async fn run(&self, trailing: Vec<OsString>) -> Result<Handoff, BootstrapError> {
        let cfg = self.config;
        let mut outcome = BootstrapOutcome::new();
        info!(
            store = %cfg.store,
            services = cfg.services.len(),
            collect_static = cfg.static_assets.enabled,
            seed = cfg.seed.enabled,
            seed_profile = ?cfg.seed.profile,
            "bootstrap starting"
        );

        self.enter(Stage::WaitStore);
        if wait_for_store(self.prober, &cfg.store, cfg.wait).await != ReadinessState::Ready {
            return Err(BootstrapError::Unreachable {
                what: format!("data store {}", cfg.store),
                waited: cfg.wait.timeout,
            });
        }

        if !cfg.services.is_empty() {
            self.enter(Stage::WaitServices);
            for service in &cfg.services {
                if wait_for_service(service, cfg.wait).await != ReadinessState::Ready {
                    return Err(BootstrapError::Unreachable {
                        what: format!("service {service}"),
                        waited: cfg.wait.timeout,
                    });
                }
            }
        }

        self.enter(Stage::Migrate);
        info!("applying migrations");
        if let Err(e) = self.framework.migrate().await {
            error!(error = %e, "migrations failed");
            return Err(BootstrapError::Migration(Box::new(e)));
        }
        outcome.migrations_applied = true;
        info!("migrations applied");

        self.enter(Stage::Static);
        let static_stage = collect_static_assets(&cfg.static_assets, self.framework).await;
        outcome.static_collected = static_stage == StageStatus::Done;
        outcome.static_stage = static_stage;

        self.enter(Stage::Seed);
        let seed_stage =
            run_seed_stage(&cfg.seed, self.framework, self.accounts, &mut outcome).await?;
        outcome.seed_stage = seed_stage;

        self.enter(Stage::Handoff);
        outcome.finish();
        let defaulted = trailing.is_empty();
        let command = CommandLine::resolve(trailing, cfg);
        info!(
            outcome = %serde_json::to_string(&outcome).unwrap_or_default(),
            "bootstrap complete"
        );
        info!(command = %command, defaulted, "handing off");

        Ok(Handoff {
            command,
            defaulted,
            outcome,
        })
    }
}
