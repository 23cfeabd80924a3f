use super::Framework;
use crate::config::Config;
use crate::error::BootstrapError;
use crate::types::SeedAccount;
use async_trait::async_trait;
use std::path::PathBuf;
use tokio::process::Command;
use tracing::debug;

/// Runs `python manage.py <command>` in the application directory.
///
/// Child output is inherited so the framework's own messages land in the
/// container log. Children are killed if the bootstrap is interrupted.
#[derive(Debug, Clone)]
pub struct DjangoManage {
    python: String,
    manage_py: PathBuf,
    app_dir: PathBuf,
}

impl DjangoManage {
    pub fn new(python: impl Into<String>, app_dir: impl Into<PathBuf>) -> Self {
        let app_dir = app_dir.into();
        Self {
            python: python.into(),
            manage_py: app_dir.join("manage.py"),
            app_dir,
        }
    }

    pub fn from_config(cfg: &Config) -> Self {
        Self::new(cfg.python.clone(), cfg.app_dir.clone())
    }

    fn command<I, S>(&self, args: I) -> Command
    where
        I: IntoIterator<Item = S>,
        S: AsRef<std::ffi::OsStr>,
    {
        let mut cmd = Command::new(&self.python);
        cmd.arg(&self.manage_py)
            .args(args)
            .current_dir(&self.app_dir)
            .kill_on_drop(true);
        cmd
    }

    async fn run(&self, mut cmd: Command, shown: String) -> Result<(), BootstrapError> {
        debug!(command = %shown, "running management command");
        let status = cmd.status().await?;
        if status.success() {
            Ok(())
        } else {
            Err(BootstrapError::Command {
                command: shown,
                status,
            })
        }
    }
}

#[async_trait]
impl Framework for DjangoManage {
    async fn migrate(&self) -> Result<(), BootstrapError> {
        let cmd = self.command(["migrate", "--noinput"]);
        self.run(cmd, "manage.py migrate --noinput".to_string())
            .await
    }

    async fn collect_static(&self) -> Result<(), BootstrapError> {
        let cmd = self.command(["collectstatic", "--noinput"]);
        self.run(cmd, "manage.py collectstatic --noinput".to_string())
            .await
    }

    async fn load_fixtures(&self, fixtures: &[String]) -> Result<(), BootstrapError> {
        if fixtures.is_empty() {
            return Ok(());
        }
        let mut args = vec!["loaddata".to_string()];
        args.extend(fixtures.iter().cloned());
        let shown = format!("manage.py {}", args.join(" "));
        let cmd = self.command(&args);
        self.run(cmd, shown).await
    }

    async fn create_superuser(&self, account: &SeedAccount) -> Result<(), BootstrapError> {
        let mut cmd = self.command([
            "createsuperuser",
            "--noinput",
            "--username",
            account.username.as_str(),
            "--email",
            account.email.as_str(),
        ]);
        // The password only travels through the child's environment.
        cmd.env("DJANGO_SUPERUSER_PASSWORD", &account.password);
        let shown = format!(
            "manage.py createsuperuser --noinput --username {}",
            account.username
        );
        self.run(cmd, shown).await
    }
}
