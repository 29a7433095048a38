//! Forest engine facade.
//!
//! # Responsibility
//! - Expose the two collaborator-facing operations: create one item, resolve
//!   an ordered hierarchy listing.
//! - Apply the bounded retry policy for transient serialization conflicts.
//!
//! # Invariants
//! - Structural/input errors (`ParentNotFound`, `NotFound`) are never retried.
//! - A failed resolve returns no partial sequence.

use crate::model::item::{
    AccountId, Item, ItemCategory, ItemId, NewItem, ResolvedItem, ROOT_PARENT,
};
use crate::repo::item_repo::{ItemRepoError, ItemRepository};
use log::warn;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Attempts per create before a serialization conflict is surfaced.
const CREATE_ATTEMPTS: u32 = 3;

/// Errors from forest engine operations.
#[derive(Debug)]
pub enum ForestError {
    /// Client-input error: referenced parent item does not exist.
    ParentNotFound(ItemId),
    /// Client-input error: referenced owning account does not exist.
    OwnerNotFound(AccountId),
    /// Client-input error: resolve anchor missing or not root-level.
    NotFound(ItemId),
    /// Tree store invariant violation detected during traversal.
    CorruptHierarchy { item_id: ItemId, detail: String },
    /// Retryable-server error: position assignment kept losing the write
    /// race after bounded internal retries.
    SequenceConflict { attempts: u32 },
    /// Retryable-server error: underlying persistence failed.
    Store(ItemRepoError),
}

impl ForestError {
    /// Whether the caller may meaningfully retry the failed operation.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::SequenceConflict { .. } | Self::Store(_))
    }
}

impl Display for ForestError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ParentNotFound(id) => write!(f, "parent item not found: {id}"),
            Self::OwnerNotFound(id) => write!(f, "owning account not found: {id}"),
            Self::NotFound(id) => write!(f, "root item not found: {id}"),
            Self::CorruptHierarchy { item_id, detail } => {
                write!(f, "corrupt hierarchy at item {item_id}: {detail}")
            }
            Self::SequenceConflict { attempts } => write!(
                f,
                "sort position assignment conflicted {attempts} times; try again"
            ),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ForestError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ItemRepoError> for ForestError {
    fn from(value: ItemRepoError) -> Self {
        match value {
            ItemRepoError::ParentNotFound(id) => Self::ParentNotFound(id),
            ItemRepoError::OwnerNotFound(id) => Self::OwnerNotFound(id),
            ItemRepoError::NotFound(id) => Self::NotFound(id),
            ItemRepoError::CorruptHierarchy { item_id, detail } => {
                Self::CorruptHierarchy { item_id, detail }
            }
            ItemRepoError::SequenceConflict => Self::SequenceConflict { attempts: 1 },
            other => Self::Store(other),
        }
    }
}

/// Forest engine service over an item repository.
pub struct ForestService<R: ItemRepository> {
    repo: R,
}

impl<R: ItemRepository> ForestService<R> {
    /// Creates service from repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Creates one item.
    ///
    /// `parent_id = None` (or the root sentinel) creates a new top-level
    /// item. Transient position-assignment conflicts are retried a bounded
    /// number of times before surfacing.
    pub fn create_item(
        &self,
        category: ItemCategory,
        body: impl Into<String>,
        title: Option<String>,
        parent_id: Option<ItemId>,
        owner_id: AccountId,
    ) -> Result<Item, ForestError> {
        let draft = NewItem {
            category,
            parent_id: parent_id.unwrap_or(ROOT_PARENT),
            owner_id,
            title,
            body: body.into(),
        };

        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.repo.create_item(&draft) {
                Ok(item) => return Ok(item),
                Err(ItemRepoError::SequenceConflict) if attempt < CREATE_ATTEMPTS => {
                    warn!(
                        "event=create_item module=service status=retry attempt={attempt} parent_id={}",
                        draft.parent_id
                    );
                }
                Err(ItemRepoError::SequenceConflict) => {
                    return Err(ForestError::SequenceConflict { attempts: attempt });
                }
                Err(other) => return Err(other.into()),
            }
        }
    }

    /// Resolves the depth-first, sibling-ordered listing of matching items.
    ///
    /// `root_id = None` covers the whole forest; otherwise the anchor must be
    /// a root-level item. Items outside `categories` are traversed but
    /// excluded from output, so descendants of filtered-out nodes still
    /// surface.
    pub fn resolve(
        &self,
        categories: &[ItemCategory],
        root_id: Option<ItemId>,
    ) -> Result<Vec<ResolvedItem>, ForestError> {
        self.repo
            .resolve_hierarchy(categories, root_id)
            .map_err(Into::into)
    }

    /// Loads one item by id. Miss is `None`, not an error.
    pub fn get_item(&self, item_id: ItemId) -> Result<Option<Item>, ForestError> {
        self.repo.get_item(item_id).map_err(Into::into)
    }
}
