//! Bootstrap configuration.
//!
//! The environment is read exactly once through figment into [`EnvSettings`],
//! a flat mirror of the recognised variables, and then validated into the
//! explicit [`Config`] that every stage receives by reference.

use crate::error::BootstrapError;
use crate::types::{ConnectionTarget, ServiceTarget, StoreKind};
use figment::{
    Figment,
    providers::{Env, Serialized},
};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_APP_DIR: &str = "/app";
pub const DEFAULT_WAIT_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_WAIT_INTERVAL_SECS: u64 = 2;
pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_GUNICORN_WORKERS: u32 = 3;

pub const DEFAULT_POSTGRES_HOST: &str = "localhost";
pub const DEFAULT_POSTGRES_PORT: u16 = 5432;
pub const DEFAULT_POSTGRES_USER: &str = "postgres";
pub const DEFAULT_POSTGRES_PASSWORD: &str = "postgres";
pub const DEFAULT_POSTGRES_DB: &str = "finassist";

pub const DEFAULT_SEED_USERNAME: &str = "admin";
pub const DEFAULT_SEED_EMAIL: &str = "admin@example.com";
pub const DEFAULT_SEED_PASSWORD: &str = "admin";

/// Environment variables read by the bootstrapper, lower-cased as figment keys.
const ENV_KEYS: &[&str] = &[
    "database_url",
    "postgres_host",
    "postgres_port",
    "postgres_user",
    "postgres_password",
    "postgres_db",
    "bootstrap_probe",
    "bootstrap_wait_timeout",
    "bootstrap_wait_interval",
    "bootstrap_wait_for",
    "bootstrap_collect_static",
    "static_root",
    "bootstrap_seed",
    "bootstrap_seed_profile",
    "bootstrap_fixtures",
    "django_superuser_username",
    "django_superuser_email",
    "django_superuser_password",
    "django_env",
    "port",
    "gunicorn_workers",
    "app_dir",
    "python",
    "log_level",
];

/// Variables whose values are text. figment's `Env` parses values such as
/// `007` or `1e3` into numbers, so these are taken verbatim instead.
const TEXT_KEYS: &[&str] = &[
    "database_url",
    "postgres_host",
    "postgres_user",
    "postgres_password",
    "postgres_db",
    "bootstrap_probe",
    "bootstrap_wait_for",
    "static_root",
    "bootstrap_seed_profile",
    "bootstrap_fixtures",
    "django_superuser_username",
    "django_superuser_email",
    "django_superuser_password",
    "django_env",
    "app_dir",
    "python",
    "log_level",
];

/// Raw view of the environment, before validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvSettings {
    pub database_url: Option<String>,
    pub postgres_host: Option<String>,
    pub postgres_port: Option<u16>,
    pub postgres_user: Option<String>,
    pub postgres_password: Option<String>,
    pub postgres_db: Option<String>,

    pub bootstrap_probe: String,
    pub bootstrap_wait_timeout: u64,
    pub bootstrap_wait_interval: u64,
    pub bootstrap_wait_for: Option<String>,

    #[serde(deserialize_with = "flag")]
    pub bootstrap_collect_static: bool,
    pub static_root: Option<PathBuf>,

    #[serde(deserialize_with = "flag")]
    pub bootstrap_seed: bool,
    pub bootstrap_seed_profile: String,
    pub bootstrap_fixtures: Option<String>,
    pub django_superuser_username: Option<String>,
    pub django_superuser_email: Option<String>,
    pub django_superuser_password: Option<String>,

    pub django_env: String,
    pub port: u16,
    pub gunicorn_workers: u32,
    pub app_dir: PathBuf,
    pub python: String,
    pub log_level: String,
}

impl Default for EnvSettings {
    fn default() -> Self {
        Self {
            database_url: None,
            postgres_host: None,
            postgres_port: None,
            postgres_user: None,
            postgres_password: None,
            postgres_db: None,
            bootstrap_probe: "auto".to_string(),
            bootstrap_wait_timeout: DEFAULT_WAIT_TIMEOUT_SECS,
            bootstrap_wait_interval: DEFAULT_WAIT_INTERVAL_SECS,
            bootstrap_wait_for: None,
            bootstrap_collect_static: true,
            static_root: None,
            bootstrap_seed: true,
            bootstrap_seed_profile: "entrypoint".to_string(),
            bootstrap_fixtures: None,
            django_superuser_username: None,
            django_superuser_email: None,
            django_superuser_password: None,
            django_env: "dev".to_string(),
            port: DEFAULT_PORT,
            gunicorn_workers: DEFAULT_GUNICORN_WORKERS,
            app_dir: PathBuf::from(DEFAULT_APP_DIR),
            python: "python".to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl EnvSettings {
    /// Figment layering defaults under the recognised environment variables.
    pub fn figment() -> Figment {
        Figment::from(Serialized::defaults(EnvSettings::default()))
            .merge(Env::raw().only(ENV_KEYS).ignore(TEXT_KEYS))
            .merge(Serialized::defaults(text_values()))
    }

    pub fn from_env() -> Result<Self, BootstrapError> {
        Ok(Self::figment().extract()?)
    }
}

/// Readiness probe strategy requested by the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeStrategy {
    /// Native driver when one exists for the store kind, TCP otherwise.
    Auto,
    Native,
    Tcp,
}

impl FromStr for ProbeStrategy {
    type Err = BootstrapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" | "" => Ok(ProbeStrategy::Auto),
            "native" => Ok(ProbeStrategy::Native),
            "tcp" => Ok(ProbeStrategy::Tcp),
            other => Err(BootstrapError::Config(format!(
                "BOOTSTRAP_PROBE must be auto, native or tcp (got `{other}`)"
            ))),
        }
    }
}

/// How seeding failures are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SeedProfile {
    /// Seed only with a complete account from the environment; failures are fatal.
    Full,
    /// Placeholder defaults for unset fields; failures are fatal.
    Minimal,
    /// Placeholder defaults for unset fields; failures are warnings.
    Entrypoint,
}

impl SeedProfile {
    pub fn failure_is_fatal(self) -> bool {
        !matches!(self, SeedProfile::Entrypoint)
    }
}

impl FromStr for SeedProfile {
    type Err = BootstrapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "full" => Ok(SeedProfile::Full),
            "minimal" => Ok(SeedProfile::Minimal),
            "entrypoint" | "" => Ok(SeedProfile::Entrypoint),
            other => Err(BootstrapError::Config(format!(
                "BOOTSTRAP_SEED_PROFILE must be full, minimal or entrypoint (got `{other}`)"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    Dev,
    Prod,
}

impl FromStr for RunMode {
    type Err = BootstrapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dev" | "development" | "local" | "" => Ok(RunMode::Dev),
            "prod" | "production" | "staging" => Ok(RunMode::Prod),
            other => Err(BootstrapError::Config(format!(
                "DJANGO_ENV must be dev or prod (got `{other}`)"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitPolicy {
    pub timeout: Duration,
    pub interval: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticConfig {
    pub enabled: bool,
    pub root: PathBuf,
}

#[derive(Clone, PartialEq, Eq)]
pub struct SeedConfig {
    pub enabled: bool,
    pub profile: SeedProfile,
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub fixtures: Vec<String>,
}

impl std::fmt::Debug for SeedConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SeedConfig")
            .field("enabled", &self.enabled)
            .field("profile", &self.profile)
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("fixtures", &self.fixtures)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    pub mode: RunMode,
    pub port: u16,
    pub workers: u32,
}

/// Validated configuration, built once at process start.
#[derive(Debug, Clone)]
pub struct Config {
    pub store: ConnectionTarget,
    pub probe: ProbeStrategy,
    pub wait: WaitPolicy,
    pub services: Vec<ServiceTarget>,
    pub static_assets: StaticConfig,
    pub seed: SeedConfig,
    pub run: RunConfig,
    pub app_dir: PathBuf,
    pub python: String,
    pub log_level: String,
}

impl Config {
    pub fn from_figment(figment: Figment) -> Result<Self, BootstrapError> {
        Self::from_settings(figment.extract()?)
    }

    pub fn from_settings(s: EnvSettings) -> Result<Self, BootstrapError> {
        let store = match s.database_url.as_deref().filter(|u| !u.trim().is_empty()) {
            Some(url) => ConnectionTarget::parse(url, &s.app_dir)?,
            None => ConnectionTarget::from_parts(
                s.postgres_host.as_deref().unwrap_or(DEFAULT_POSTGRES_HOST),
                s.postgres_port.unwrap_or(DEFAULT_POSTGRES_PORT),
                s.postgres_user.as_deref().unwrap_or(DEFAULT_POSTGRES_USER),
                s.postgres_password
                    .as_deref()
                    .unwrap_or(DEFAULT_POSTGRES_PASSWORD),
                s.postgres_db.as_deref().unwrap_or(DEFAULT_POSTGRES_DB),
            )?,
        };

        let probe: ProbeStrategy = s.bootstrap_probe.parse()?;
        if probe == ProbeStrategy::Tcp && store.kind() == StoreKind::Sqlite {
            return Err(BootstrapError::Config(
                "BOOTSTRAP_PROBE=tcp needs a networked database, DATABASE_URL points at sqlite"
                    .to_string(),
            ));
        }

        if s.bootstrap_wait_interval == 0 {
            return Err(BootstrapError::Config(
                "BOOTSTRAP_WAIT_INTERVAL must be at least 1 second".to_string(),
            ));
        }
        let wait = WaitPolicy {
            timeout: Duration::from_secs(s.bootstrap_wait_timeout),
            interval: Duration::from_secs(s.bootstrap_wait_interval),
        };

        let services = split_list(s.bootstrap_wait_for.as_deref())
            .map(|entry| entry.parse::<ServiceTarget>())
            .collect::<Result<Vec<_>, _>>()?;

        let static_assets = StaticConfig {
            enabled: s.bootstrap_collect_static,
            root: s
                .static_root
                .clone()
                .unwrap_or_else(|| s.app_dir.join("staticfiles")),
        };

        let seed = SeedConfig {
            enabled: s.bootstrap_seed,
            profile: s.bootstrap_seed_profile.parse()?,
            username: non_empty(s.django_superuser_username),
            email: non_empty(s.django_superuser_email),
            password: non_empty(s.django_superuser_password),
            fixtures: split_list(s.bootstrap_fixtures.as_deref())
                .map(str::to_string)
                .collect(),
        };

        let run = RunConfig {
            mode: s.django_env.parse()?,
            port: s.port,
            workers: s.gunicorn_workers.max(1),
        };

        Ok(Self {
            store,
            probe,
            wait,
            services,
            static_assets,
            seed,
            run,
            app_dir: s.app_dir,
            python: s.python,
            log_level: s.log_level,
        })
    }
}

/// Raw text of the set [`TEXT_KEYS`] variables, keyed like the figment profile.
fn text_values() -> BTreeMap<String, String> {
    Env::raw()
        .only(TEXT_KEYS)
        .iter()
        .map(|(key, value)| (key.as_str().to_ascii_lowercase(), value))
        .collect()
}

fn split_list(raw: Option<&str>) -> impl Iterator<Item = &str> {
    raw.unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Str(String),
}

/// Accept the usual shell spellings of a boolean.
fn flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    match Scalar::deserialize(deserializer)? {
        Scalar::Bool(b) => Ok(b),
        Scalar::Int(i) => Ok(i != 0),
        Scalar::UInt(u) => Ok(u != 0),
        Scalar::Float(f) => Ok(f != 0.0),
        Scalar::Str(s) => match s.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" | "y" => Ok(true),
            "0" | "false" | "no" | "off" | "n" | "" => Ok(false),
            other => Err(D::Error::custom(format!("`{other}` is not a boolean"))),
        },
    }
}
