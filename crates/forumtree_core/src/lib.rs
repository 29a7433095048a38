//! Core ordering engine for a forest of discussion items.
//!
//! Items (topics, content, comments) form parent-linked trees; every item
//! carries a globally unique, monotonically increasing sort position, and any
//! subtree can be flattened into exact depth-first, sibling-ordered sequence
//! through a single recursive query over composite path keys.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use logging::{default_log_level, init_logging, logging_status};
pub use model::account::{Account, NewAccount};
pub use model::item::{
    AccountId, Item, ItemCategory, ItemId, NewItem, PathKey, ResolvedItem, ROOT_PARENT,
};
pub use repo::account_repo::{
    AccountRepoError, AccountRepoResult, AccountRepository, SqliteAccountRepository,
};
pub use repo::item_repo::{
    ItemRepoError, ItemRepoResult, ItemRepository, SqliteItemRepository,
};
pub use service::forest_service::{ForestError, ForestService};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
