use finassist_bootstrap::error::{BootstrapError, EXIT_CONFIG};
use finassist_bootstrap::framework::{DjangoManage, Framework};
use finassist_bootstrap::types::SeedAccount;
use std::fs;
use std::path::Path;

/// Fake `manage.py` run through `sh`: logs its arguments, fails `collectstatic`.
const MANAGE_PY: &str = r#"
echo "$@" >> calls.log
if [ "$1" = "createsuperuser" ]; then
    echo "password=$DJANGO_SUPERUSER_PASSWORD" >> calls.log
fi
if [ "$1" = "collectstatic" ]; then
    exit 3
fi
"#;

fn app_dir() -> tempfile::TempDir {
    let dir = tempfile::tempdir().expect("tempdir");
    fs::write(dir.path().join("manage.py"), MANAGE_PY).expect("write manage.py");
    dir
}

fn calls(dir: &Path) -> Vec<String> {
    fs::read_to_string(dir.join("calls.log"))
        .unwrap_or_default()
        .lines()
        .map(str::to_string)
        .collect()
}

#[tokio::test]
async fn management_commands_run_in_the_app_dir() {
    let dir = app_dir();
    let manage = DjangoManage::new("sh", dir.path());

    manage.migrate().await.expect("migrate succeeds");
    manage
        .load_fixtures(&["categories".to_string(), "currencies".to_string()])
        .await
        .expect("loaddata succeeds");
    manage.load_fixtures(&[]).await.expect("nothing to load");

    assert_eq!(
        calls(dir.path()),
        vec!["migrate --noinput", "loaddata categories currencies"]
    );
}

#[tokio::test]
async fn superuser_password_travels_only_through_the_environment() {
    let dir = app_dir();
    let manage = DjangoManage::new("sh", dir.path());
    let account = SeedAccount {
        username: "owner".to_string(),
        email: "owner@example.com".to_string(),
        password: "s3cret".to_string(),
    };

    manage
        .create_superuser(&account)
        .await
        .expect("createsuperuser succeeds");

    let calls = calls(dir.path());
    assert_eq!(
        calls,
        vec![
            "createsuperuser --noinput --username owner --email owner@example.com",
            "password=s3cret"
        ]
    );
}

#[tokio::test]
async fn non_zero_exit_is_a_command_error() {
    let dir = app_dir();
    let manage = DjangoManage::new("sh", dir.path());

    let err = manage
        .collect_static()
        .await
        .expect_err("collectstatic exits 3");

    match &err {
        BootstrapError::Command { command, status } => {
            assert_eq!(command, "manage.py collectstatic --noinput");
            assert_eq!(status.code(), Some(3));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(err.exit_code(), EXIT_CONFIG);
}

#[tokio::test]
async fn missing_interpreter_is_an_io_error() {
    let dir = app_dir();
    let manage = DjangoManage::new("/nonexistent/python3", dir.path());

    let err = manage.migrate().await.expect_err("no interpreter");
    assert!(matches!(err, BootstrapError::Io(_)));
}
