//! Item domain model and path-key ordering.
//!
//! # Responsibility
//! - Define the canonical forest node record shared by all engine layers.
//! - Define the composite path key that drives depth-first ordering.
//!
//! # Invariants
//! - `item_id` is stable and never reused for another item.
//! - `sort_position` is globally unique, assigned once, never renumbered.
//! - A root item has `parent_id == ROOT_PARENT`, not a null or self reference.

use serde::{Deserialize, Serialize};

/// Stable identifier for every item in the forest.
///
/// Kept as a type alias to make semantic intent explicit in signatures.
pub type ItemId = i64;

/// Stable identifier for an owning account.
pub type AccountId = i64;

/// Reserved `parent_id` value marking a top-level (root) item.
///
/// Distinct from "absent": every item carries a parent reference, and root
/// items point at this sentinel. Real item ids start at 1, so the sentinel
/// can never collide with a persisted row.
pub const ROOT_PARENT: ItemId = 0;

/// Category of a forest item.
///
/// Fixed enumeration; immutable after creation. Used to filter resolver
/// output, never to drive traversal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemCategory {
    /// Top-level discussion subject.
    Topic,
    /// Authored content under a topic.
    Content,
    /// Reader comment under content or another comment.
    Comment,
}

/// Canonical domain record for one forest node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    /// Stable id assigned by the store at creation.
    pub item_id: ItemId,
    /// Parent item id, or `ROOT_PARENT` for top-level items.
    pub parent_id: ItemId,
    /// Opaque reference to the authoring account.
    pub owner_id: AccountId,
    /// Global creation-order position assigned once by the sequencer.
    pub sort_position: i64,
    /// Serialized as `category` to match external schema naming.
    pub category: ItemCategory,
    /// Only meaningful for root items.
    pub title: Option<String>,
    /// Text payload.
    pub body: String,
    /// Unix epoch milliseconds.
    pub created_at: i64,
    /// Unix epoch milliseconds. Not used in ordering.
    pub updated_at: i64,
}

impl Item {
    /// Returns whether this item is a top-level root.
    pub fn is_root(&self) -> bool {
        self.parent_id == ROOT_PARENT
    }
}

/// Creation request for one item.
///
/// The store assigns `item_id`, `sort_position` and timestamps; callers only
/// describe placement and payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewItem {
    pub category: ItemCategory,
    pub parent_id: ItemId,
    pub owner_id: AccountId,
    pub title: Option<String>,
    pub body: String,
}

impl NewItem {
    /// Creates a root-level item draft.
    pub fn root(
        category: ItemCategory,
        owner_id: AccountId,
        title: Option<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            category,
            parent_id: ROOT_PARENT,
            owner_id,
            title,
            body: body.into(),
        }
    }

    /// Creates an item draft under an existing parent.
    pub fn child(
        category: ItemCategory,
        parent_id: ItemId,
        owner_id: AccountId,
        body: impl Into<String>,
    ) -> Self {
        Self {
            category,
            parent_id,
            owner_id,
            title: None,
            body: body.into(),
        }
    }
}

/// Composite ordering key: sort positions from forest root down to one item.
///
/// The derived `Ord` on the inner `Vec<i64>` is component-wise lexicographic
/// comparison where a strict prefix sorts before its extensions, which is
/// exactly depth-first order: a parent immediately precedes its descendants,
/// and siblings compare by creation order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PathKey(Vec<i64>);

impl PathKey {
    /// Creates the one-element key of a root item.
    pub fn root(sort_position: i64) -> Self {
        Self(vec![sort_position])
    }

    /// Creates a key from raw components, root first.
    pub fn from_components(components: Vec<i64>) -> Self {
        Self(components)
    }

    /// Returns a child key extending this one by the child's sort position.
    pub fn child(&self, sort_position: i64) -> Self {
        let mut components = self.0.clone();
        components.push(sort_position);
        Self(components)
    }

    /// Returns the key components, root first.
    pub fn components(&self) -> &[i64] {
        &self.0
    }

    /// Returns the depth encoded by this key (root = 0).
    pub fn depth(&self) -> u32 {
        (self.0.len().saturating_sub(1)) as u32
    }

    /// Returns whether `self` is a strict ancestor key of `other`.
    pub fn is_ancestor_of(&self, other: &PathKey) -> bool {
        other.0.len() > self.0.len() && other.0.starts_with(&self.0)
    }
}

/// One resolver output row: the item plus its ordering annotations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedItem {
    pub item: Item,
    pub path_key: PathKey,
    /// Path-key length minus one; root items have depth 0.
    pub depth: u32,
}

#[cfg(test)]
mod tests {
    use super::{Item, ItemCategory, NewItem, PathKey, ROOT_PARENT};

    #[test]
    fn path_keys_sort_depth_first() {
        let t1 = PathKey::root(0);
        let c1 = t1.child(1);
        let m1 = c1.child(2);
        let t2 = PathKey::root(3);

        let mut keys = vec![t2.clone(), m1.clone(), t1.clone(), c1.clone()];
        keys.sort();
        assert_eq!(keys, vec![t1, c1, m1, t2]);
    }

    #[test]
    fn parent_key_precedes_descendants_regardless_of_digit_width() {
        // Positions spanning digit lengths must still compare numerically.
        let parent = PathKey::root(9);
        let child = parent.child(10);
        let later_root = PathKey::root(10);

        assert!(parent < child);
        assert!(child < later_root);
        assert!(parent.is_ancestor_of(&child));
        assert!(!parent.is_ancestor_of(&later_root));
    }

    #[test]
    fn path_key_depth_counts_from_zero() {
        let root = PathKey::root(5);
        assert_eq!(root.depth(), 0);
        assert_eq!(root.child(6).depth(), 1);
        assert_eq!(root.child(6).child(7).depth(), 2);
    }

    #[test]
    fn new_item_helpers_set_sentinel_parent() {
        let root = NewItem::root(ItemCategory::Topic, 1, Some("T".to_string()), "body");
        assert_eq!(root.parent_id, ROOT_PARENT);

        let child = NewItem::child(ItemCategory::Comment, 7, 1, "reply");
        assert_eq!(child.parent_id, 7);
        assert_eq!(child.title, None);
    }

    #[test]
    fn item_serializes_category_as_snake_case() {
        let item = Item {
            item_id: 1,
            parent_id: ROOT_PARENT,
            owner_id: 1,
            sort_position: 0,
            category: ItemCategory::Topic,
            title: Some("Hello".to_string()),
            body: "first".to_string(),
            created_at: 0,
            updated_at: 0,
        };
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["category"], "topic");
        assert!(item.is_root());
    }
}
