use crate::config::{
    DEFAULT_SEED_EMAIL, DEFAULT_SEED_PASSWORD, DEFAULT_SEED_USERNAME, SeedConfig, SeedProfile,
};
use crate::db::AccountStore;
use crate::error::BootstrapError;
use crate::framework::Framework;
use crate::types::{BootstrapOutcome, SeedAccount, SeedResult, StageStatus};
use tracing::{debug, error, info, warn};

/// Build the seed account for the configured profile.
///
/// `full` requires all three fields and reports the missing variables;
/// the other profiles fall back to placeholder values.
pub fn resolve_seed_account(cfg: &SeedConfig) -> Result<SeedAccount, Vec<&'static str>> {
    match cfg.profile {
        SeedProfile::Full => {
            let missing: Vec<&'static str> = [
                ("DJANGO_SUPERUSER_USERNAME", cfg.username.is_none()),
                ("DJANGO_SUPERUSER_EMAIL", cfg.email.is_none()),
                ("DJANGO_SUPERUSER_PASSWORD", cfg.password.is_none()),
            ]
            .into_iter()
            .filter_map(|(name, absent)| absent.then_some(name))
            .collect();
            match (&cfg.username, &cfg.email, &cfg.password) {
                (Some(username), Some(email), Some(password)) => Ok(SeedAccount {
                    username: username.clone(),
                    email: email.clone(),
                    password: password.clone(),
                }),
                _ => Err(missing),
            }
        }
        SeedProfile::Minimal | SeedProfile::Entrypoint => Ok(SeedAccount {
            username: cfg
                .username
                .clone()
                .unwrap_or_else(|| DEFAULT_SEED_USERNAME.to_string()),
            email: cfg
                .email
                .clone()
                .unwrap_or_else(|| DEFAULT_SEED_EMAIL.to_string()),
            password: cfg
                .password
                .clone()
                .unwrap_or_else(|| DEFAULT_SEED_PASSWORD.to_string()),
        }),
    }
}

/// Create `account` unless an account with the same username exists.
pub async fn ensure_seed_account(
    accounts: &dyn AccountStore,
    account: &SeedAccount,
) -> Result<SeedResult, BootstrapError> {
    if accounts.account_exists(&account.username).await? {
        return Ok(SeedResult::AlreadyExists);
    }
    accounts.create_account(account).await?;
    Ok(SeedResult::Created)
}

/// The SEED stage: fixtures, then the privileged account.
///
/// Failures are fatal under `full` and `minimal` and demoted to a warning
/// under `entrypoint`.
pub async fn run_seed_stage(
    cfg: &SeedConfig,
    framework: &dyn Framework,
    accounts: &dyn AccountStore,
    outcome: &mut BootstrapOutcome,
) -> Result<StageStatus, BootstrapError> {
    if !cfg.enabled {
        debug!("seeding disabled");
        return Ok(StageStatus::Skipped);
    }

    let account = match resolve_seed_account(cfg) {
        Ok(account) => account,
        Err(missing) => {
            let reason = format!("{} unset", missing.join(", "));
            info!(profile = ?cfg.profile, result = %SeedResult::Skipped(reason), "seeding skipped");
            return Ok(StageStatus::Skipped);
        }
    };

    info!(
        profile = ?cfg.profile,
        username = %account.username,
        fixtures = cfg.fixtures.len(),
        "seeding"
    );

    let result = async {
        if !cfg.fixtures.is_empty() {
            framework.load_fixtures(&cfg.fixtures).await?;
            outcome.fixtures_loaded = true;
            info!(fixtures = ?cfg.fixtures, "fixtures loaded");
        }
        ensure_seed_account(accounts, &account).await
    }
    .await;

    match result {
        Ok(seeded) => {
            outcome.seed_applied = true;
            outcome.superuser_created = seeded == SeedResult::Created;
            info!(username = %account.username, result = %seeded, "seed account {seeded}");
            Ok(StageStatus::Done)
        }
        Err(e) if cfg.profile.failure_is_fatal() => {
            error!(profile = ?cfg.profile, error = %e, "seeding failed");
            Err(BootstrapError::Seed(Box::new(e)))
        }
        Err(e) => {
            warn!(profile = ?cfg.profile, error = %e, "seeding failed; continuing");
            Ok(StageStatus::Warning(e.to_string()))
        }
    }
}
