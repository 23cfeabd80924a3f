use crate::error::BootstrapError;
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use url::Url;

const POSTGRES_DEFAULT_PORT: u16 = 5432;
const SQLITE_MEMORY_URL: &str = "sqlite://:memory:";

/// Database engines the bootstrapper knows how to reach.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreKind {
    Postgres,
    Sqlite,
}

impl fmt::Display for StoreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreKind::Postgres => f.write_str("postgres"),
            StoreKind::Sqlite => f.write_str("sqlite"),
        }
    }
}

/// A `host:port` pair reachable over TCP.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceTarget {
    pub host: String,
    pub port: u16,
}

impl ServiceTarget {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl FromStr for ServiceTarget {
    type Err = BootstrapError;

    /// Parse `host:port`; IPv6 hosts use the bracketed form `[::1]:6379`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (host, port) = s
            .rsplit_once(':')
            .ok_or_else(|| BootstrapError::Config(format!("`{s}` is not of the form host:port")))?;
        let host = host.trim_start_matches('[').trim_end_matches(']');
        if host.is_empty() {
            return Err(BootstrapError::Config(format!("`{s}` has an empty host")));
        }
        let port = port
            .parse::<u16>()
            .map_err(|e| BootstrapError::Config(format!("`{s}` has an invalid port: {e}")))?;
        Ok(Self::new(host, port))
    }
}

impl fmt::Display for ServiceTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

/// Where the application's database lives.
///
/// Built once from `DATABASE_URL` (or its parts) and never mutated. The
/// driver URL carries credentials, so neither `Display` nor `Debug` print it.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionTarget {
    kind: StoreKind,
    endpoint: Option<ServiceTarget>,
    username: Option<String>,
    database: String,
    driver_url: String,
}

impl ConnectionTarget {
    /// Parse a database URL in the forms accepted by the web application's
    /// settings (`postgres://`, `postgresql://`, `psql://`, `pgsql://`,
    /// `sqlite:///relative.db`, `sqlite:////absolute.db`, `sqlite://:memory:`).
    ///
    /// Relative SQLite paths are resolved against `base_dir`.
    pub fn parse(raw: &str, base_dir: &Path) -> Result<Self, BootstrapError> {
        if raw.trim() == SQLITE_MEMORY_URL {
            return Ok(Self {
                kind: StoreKind::Sqlite,
                endpoint: None,
                username: None,
                database: ":memory:".to_string(),
                driver_url: "sqlite::memory:".to_string(),
            });
        }

        let url = Url::parse(raw.trim())
            .map_err(|e| BootstrapError::Config(format!("invalid DATABASE_URL: {e}")))?;
        match url.scheme() {
            "postgres" | "postgresql" | "psql" | "pgsql" | "postgis" => Self::postgres(url),
            "sqlite" => Self::sqlite(&url, base_dir),
            other => Err(BootstrapError::Config(format!(
                "unsupported database scheme `{other}`"
            ))),
        }
    }

    /// Assemble a PostgreSQL target from individual connection parts.
    pub fn from_parts(
        host: &str,
        port: u16,
        username: &str,
        password: &str,
        database: &str,
    ) -> Result<Self, BootstrapError> {
        let mut url = Url::parse("postgres://localhost/")
            .map_err(|e| BootstrapError::Config(format!("invalid database parts: {e}")))?;
        url.set_host(Some(host))
            .map_err(|e| BootstrapError::Config(format!("invalid database host `{host}`: {e}")))?;
        let invalid = |part: &str| BootstrapError::Config(format!("invalid database {part}"));
        url.set_port(Some(port)).map_err(|_| invalid("port"))?;
        url.set_username(username).map_err(|_| invalid("username"))?;
        if !password.is_empty() {
            url.set_password(Some(password))
                .map_err(|_| invalid("password"))?;
        }
        url.set_path(&format!("/{}", database.trim_start_matches('/')));
        Self::postgres(url)
    }

    fn postgres(mut url: Url) -> Result<Self, BootstrapError> {
        let host = url
            .host_str()
            .filter(|h| !h.is_empty())
            .unwrap_or("localhost")
            .trim_start_matches('[')
            .trim_end_matches(']')
            .to_string();
        let port = url.port().unwrap_or(POSTGRES_DEFAULT_PORT);
        let username = Some(url.username())
            .filter(|u| !u.is_empty())
            .map(str::to_string);
        let database = url.path().trim_start_matches('/').to_string();

        if url.scheme() != "postgres" {
            url.set_scheme("postgres").map_err(|_| {
                BootstrapError::Config(format!("cannot normalise scheme `{}`", url.scheme()))
            })?;
        }

        Ok(Self {
            kind: StoreKind::Postgres,
            endpoint: Some(ServiceTarget::new(host, port)),
            username,
            database,
            driver_url: url.to_string(),
        })
    }

    fn sqlite(url: &Url, base_dir: &Path) -> Result<Self, BootstrapError> {
        // `sqlite:///db.sqlite3` is relative, `sqlite:////app/db.sqlite3` absolute:
        // only the first slash after the authority is a separator.
        let raw_path = url.path().strip_prefix('/').unwrap_or(url.path());
        if raw_path.is_empty() {
            return Err(BootstrapError::Config(
                "sqlite DATABASE_URL has no file path".to_string(),
            ));
        }
        let path = PathBuf::from(raw_path);
        let path = if path.is_absolute() {
            path
        } else {
            base_dir.join(path)
        };
        let database = path.display().to_string();
        let driver_url = format!("sqlite://{database}?mode=rwc");

        Ok(Self {
            kind: StoreKind::Sqlite,
            endpoint: None,
            username: None,
            database,
            driver_url,
        })
    }

    pub fn kind(&self) -> StoreKind {
        self.kind
    }

    /// Network endpoint of the store; `None` for file-backed stores.
    pub fn endpoint(&self) -> Option<&ServiceTarget> {
        self.endpoint.as_ref()
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    /// URL handed to the sqlx driver. Contains credentials; never log it.
    pub fn driver_url(&self) -> &str {
        &self.driver_url
    }
}

impl fmt::Display for ConnectionTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.endpoint, &self.username) {
            (Some(ep), Some(user)) => write!(f, "{}://{}@{}/{}", self.kind, user, ep, self.database),
            (Some(ep), None) => write!(f, "{}://{}/{}", self.kind, ep, self.database),
            (None, _) => write!(f, "{}:{}", self.kind, self.database),
        }
    }
}

impl fmt::Debug for ConnectionTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionTarget")
            .field("kind", &self.kind)
            .field("endpoint", &self.endpoint)
            .field("username", &self.username)
            .field("database", &self.database)
            .field("driver_url", &"<redacted>")
            .finish()
    }
}
