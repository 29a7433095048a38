//! Account repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide stable CRUD APIs over the owning-account reference table.
//! - Keep SQL details inside the persistence boundary.
//!
//! # Invariants
//! - `email` stays unique; collisions surface as `DuplicateEmail`, not as
//!   opaque SQLite errors.

use crate::db::DbError;
use crate::model::account::{Account, NewAccount};
use crate::model::item::AccountId;
use rusqlite::{params, Connection, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};

const ACCOUNT_SELECT_SQL: &str = "SELECT
    account_id,
    first_name,
    last_name,
    email,
    created_at,
    updated_at
FROM accounts";

pub type AccountRepoResult<T> = Result<T, AccountRepoError>;

/// Errors from account repository operations.
#[derive(Debug)]
pub enum AccountRepoError {
    Db(DbError),
    /// Another account already uses this email.
    DuplicateEmail(String),
    NotFound(AccountId),
}

impl Display for AccountRepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::DuplicateEmail(email) => write!(f, "email already registered: {email}"),
            Self::NotFound(id) => write!(f, "account not found: {id}"),
        }
    }
}

impl Error for AccountRepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::DuplicateEmail(_) => None,
            Self::NotFound(_) => None,
        }
    }
}

impl From<DbError> for AccountRepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for AccountRepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Repository interface for account operations.
pub trait AccountRepository {
    fn create_account(&self, draft: &NewAccount) -> AccountRepoResult<Account>;
    fn get_account(&self, account_id: AccountId) -> AccountRepoResult<Option<Account>>;
    fn get_account_by_email(&self, email: &str) -> AccountRepoResult<Option<Account>>;
    fn list_accounts(&self) -> AccountRepoResult<Vec<Account>>;
}

/// SQLite-backed account repository.
pub struct SqliteAccountRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteAccountRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl AccountRepository for SqliteAccountRepository<'_> {
    fn create_account(&self, draft: &NewAccount) -> AccountRepoResult<Account> {
        let insert = self.conn.execute(
            "INSERT INTO accounts (first_name, last_name, email)
             VALUES (?1, ?2, ?3);",
            params![
                draft.first_name.as_str(),
                draft.last_name.as_str(),
                draft.email.as_str(),
            ],
        );
        if let Err(err) = insert {
            if is_unique_violation(&err) {
                return Err(AccountRepoError::DuplicateEmail(draft.email.clone()));
            }
            return Err(err.into());
        }

        let account_id = self.conn.last_insert_rowid();
        self.get_account(account_id)?
            .ok_or(AccountRepoError::NotFound(account_id))
    }

    fn get_account(&self, account_id: AccountId) -> AccountRepoResult<Option<Account>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{ACCOUNT_SELECT_SQL} WHERE account_id = ?1;"))?;
        let mut rows = stmt.query([account_id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_account_row(row)?));
        }
        Ok(None)
    }

    fn get_account_by_email(&self, email: &str) -> AccountRepoResult<Option<Account>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{ACCOUNT_SELECT_SQL} WHERE email = ?1;"))?;
        let mut rows = stmt.query([email])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_account_row(row)?));
        }
        Ok(None)
    }

    fn list_accounts(&self) -> AccountRepoResult<Vec<Account>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{ACCOUNT_SELECT_SQL} ORDER BY account_id ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut accounts = Vec::new();
        while let Some(row) = rows.next()? {
            accounts.push(parse_account_row(row)?);
        }
        Ok(accounts)
    }
}

fn parse_account_row(row: &Row<'_>) -> AccountRepoResult<Account> {
    Ok(Account {
        account_id: row.get("account_id")?,
        first_name: row.get("first_name")?,
        last_name: row.get("last_name")?,
        email: row.get("email")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(failure, _)
            if failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}
