//! SQL run against the application's own tables.
//! The tables belong to the web framework; the bootstrapper only reads them.

/// Table holding the framework's user accounts.
pub const ACCOUNT_TABLE: &str = "auth_user";

/// Count accounts with a given username.
/// `$1` placeholders are understood by both PostgreSQL and SQLite.
pub fn count_accounts_by_username() -> String {
    format!("SELECT COUNT(*) AS n FROM {ACCOUNT_TABLE} WHERE username = $1")
}
