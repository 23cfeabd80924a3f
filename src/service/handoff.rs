use crate::config::{Config, RunMode};
use crate::error::BootstrapError;
use crate::types::BootstrapOutcome;
use std::ffi::OsString;
use std::fmt;
use std::os::unix::process::CommandExt;
use std::path::Path;
use std::process::Command;

/// The long-running command the bootstrapper turns into.
///
/// Arguments are kept as `OsString`: operator-supplied commands need not be UTF-8.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    pub program: OsString,
    pub args: Vec<OsString>,
}

impl CommandLine {
    pub fn new<I, S>(program: impl Into<OsString>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Trailing CLI arguments win verbatim; otherwise the run mode picks a
    /// server command.
    pub fn resolve(trailing: Vec<OsString>, cfg: &Config) -> Self {
        let mut trailing = trailing.into_iter();
        match trailing.next() {
            Some(program) => Self::new(program, trailing),
            None => Self::default_for(cfg),
        }
    }

    pub fn default_for(cfg: &Config) -> Self {
        let bind = format!("0.0.0.0:{}", cfg.run.port);
        match cfg.run.mode {
            RunMode::Dev => Self::new(
                cfg.python.clone(),
                ["manage.py".to_string(), "runserver".to_string(), bind],
            ),
            RunMode::Prod => Self::new(
                "gunicorn",
                [
                    "finassist.wsgi:application".to_string(),
                    "--bind".to_string(),
                    bind,
                    "--workers".to_string(),
                    cfg.run.workers.to_string(),
                ],
            ),
        }
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.to_string_lossy())?;
        for arg in &self.args {
            write!(f, " {}", arg.to_string_lossy())?;
        }
        Ok(())
    }
}

/// Result of a successful bootstrap: what to become.
#[derive(Debug, Clone)]
pub struct Handoff {
    pub command: CommandLine,
    pub defaulted: bool,
    pub outcome: BootstrapOutcome,
}

/// Replace the current process image with `command`, keeping the PID.
///
/// Only returns if the exec itself failed.
pub fn exec(command: &CommandLine, workdir: &Path) -> BootstrapError {
    let mut cmd = Command::new(&command.program);
    cmd.args(&command.args);
    if workdir.is_dir() {
        cmd.current_dir(workdir);
    }
    let source = cmd.exec();
    BootstrapError::Exec {
        command: command.to_string(),
        source,
    }
}
