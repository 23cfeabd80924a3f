//! Database access for seeding.
//!
//! Layout:
//! - `accounts.rs`: the `AccountStore` capability and its SQL-backed implementation
//! - `schema.rs`: the queries run against the framework's tables

pub mod accounts;
pub mod schema;

pub use accounts::{AccountStore, FrameworkAccounts};
pub use schema::{ACCOUNT_TABLE, count_accounts_by_username};
