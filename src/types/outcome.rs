use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

/// Stages of one bootstrap run, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Init,
    WaitStore,
    WaitServices,
    Migrate,
    Static,
    Seed,
    Handoff,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Init => "init",
            Stage::WaitStore => "wait_store",
            Stage::WaitServices => "wait_services",
            Stage::Migrate => "migrate",
            Stage::Static => "static",
            Stage::Seed => "seed",
            Stage::Handoff => "handoff",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadinessState {
    Waiting,
    Ready,
    TimedOut,
}

/// Recorded result of an optional stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum StageStatus {
    Done,
    Skipped,
    Warning(String),
}

/// Summary of one bootstrap run, logged right before hand-off.
#[derive(Debug, Clone, Serialize)]
pub struct BootstrapOutcome {
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub migrations_applied: bool,
    pub static_collected: bool,
    pub fixtures_loaded: bool,
    pub seed_applied: bool,
    pub superuser_created: bool,
    pub static_stage: StageStatus,
    pub seed_stage: StageStatus,
}

impl BootstrapOutcome {
    pub fn new() -> Self {
        Self {
            started_at: Utc::now(),
            finished_at: None,
            migrations_applied: false,
            static_collected: false,
            fixtures_loaded: false,
            seed_applied: false,
            superuser_created: false,
            static_stage: StageStatus::Skipped,
            seed_stage: StageStatus::Skipped,
        }
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }
}

impl Default for BootstrapOutcome {
    fn default() -> Self {
        Self::new()
    }
}

/// The privileged account created on first boot.
#[derive(Clone, PartialEq, Eq)]
pub struct SeedAccount {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl fmt::Debug for SeedAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SeedAccount")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeedResult {
    Created,
    AlreadyExists,
    Skipped(String),
}

impl fmt::Display for SeedResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SeedResult::Created => f.write_str("created"),
            SeedResult::AlreadyExists => f.write_str("already_exists"),
            SeedResult::Skipped(reason) => write!(f, "skipped ({reason})"),
        }
    }
}
