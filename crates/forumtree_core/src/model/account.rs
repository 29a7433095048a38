//! Account domain model.
//!
//! The engine treats accounts as an external collaborator's data: items carry
//! `owner_id` as an opaque foreign key and core ordering logic never inspects
//! account state. The record lives here because the storage schema enforces
//! the reference.

use crate::model::item::AccountId;
use serde::{Deserialize, Serialize};

/// Authoring account referenced by items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub account_id: AccountId,
    pub first_name: String,
    pub last_name: String,
    /// Unique across all accounts.
    pub email: String,
    /// Unix epoch milliseconds.
    pub created_at: i64,
    /// Unix epoch milliseconds.
    pub updated_at: i64,
}

/// Creation request for one account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAccount {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

impl NewAccount {
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            email: email.into(),
        }
    }
}
