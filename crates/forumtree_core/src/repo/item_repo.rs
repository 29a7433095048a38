//! Item repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide persistence APIs for the forest of discussion items.
//! - Keep SQL details and the depth-first ordering query inside the
//!   repository boundary.
//!
//! # Invariants
//! - `sort_position` assignment and the consuming insert share one immediate
//!   transaction.
//! - The resolver never returns a partial sequence: any corruption or
//!   transport failure aborts the whole call.
//! - Path strings are built from fixed-width components, so their byte order
//!   equals component-wise integer order at every tree depth.

use crate::db::migrations::latest_version;
use crate::db::DbError;
use crate::model::item::{
    AccountId, Item, ItemCategory, ItemId, NewItem, PathKey, ResolvedItem, ROOT_PARENT,
};
use crate::repo::sequencer;
use log::error;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row, Transaction, TransactionBehavior};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

const ITEM_COLUMNS: &str = "item_id,
    parent_id,
    owner_id,
    sort_position,
    category,
    title,
    body,
    created_at,
    updated_at";

/// Fixed render width for one path component.
///
/// Sort positions are non-negative i64, so 19 digits cover every value and
/// all components compare at equal width. The `.` joiner is below `'0'` in
/// ASCII, which keeps a parent's strict-prefix path ahead of its descendants.
const PATH_COMPONENT_FORMAT: &str = "%019d";
const PATH_SEPARATOR: char = '.';

pub type ItemRepoResult<T> = Result<T, ItemRepoError>;

/// Errors from item repository operations.
#[derive(Debug)]
pub enum ItemRepoError {
    /// Underlying SQLite/bootstrap error.
    Db(DbError),
    /// Create referenced a parent item that does not exist.
    ParentNotFound(ItemId),
    /// Create referenced an owning account that does not exist.
    OwnerNotFound(AccountId),
    /// Resolve anchor does not exist or is not a root-level item.
    NotFound(ItemId),
    /// Forced unique-key collision (id or sort position).
    DuplicateKey(String),
    /// Transient serialization failure assigning a sort position.
    SequenceConflict,
    /// Cycle or orphaned-ancestor state detected during traversal.
    CorruptHierarchy { item_id: ItemId, detail: String },
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Required table is missing.
    MissingRequiredTable(&'static str),
    /// Persisted data cannot be converted to a valid read model.
    InvalidData(String),
}

impl Display for ItemRepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::ParentNotFound(id) => write!(f, "parent item not found: {id}"),
            Self::OwnerNotFound(id) => write!(f, "owning account not found: {id}"),
            Self::NotFound(id) => write!(f, "root item not found: {id}"),
            Self::DuplicateKey(detail) => write!(f, "duplicate item key: {detail}"),
            Self::SequenceConflict => {
                write!(f, "sort position assignment lost a write-serialization race")
            }
            Self::CorruptHierarchy { item_id, detail } => {
                write!(f, "corrupt hierarchy at item {item_id}: {detail}")
            }
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "item repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "item repository requires table `{table}`")
            }
            Self::InvalidData(message) => write!(f, "invalid item data: {message}"),
        }
    }
}

impl Error for ItemRepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for ItemRepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for ItemRepoError {
    fn from(value: rusqlite::Error) -> Self {
        if is_busy(&value) {
            return Self::SequenceConflict;
        }
        Self::Db(DbError::Sqlite(value))
    }
}

/// Repository interface for forest item operations.
pub trait ItemRepository {
    /// Creates one item: assigns id and global sort position, persists it.
    fn create_item(&self, draft: &NewItem) -> ItemRepoResult<Item>;
    /// Loads one item by id. Miss is `None`, not an error.
    fn get_item(&self, item_id: ItemId) -> ItemRepoResult<Option<Item>>;
    /// Lists all direct children of one item. No order contract.
    fn list_children(&self, parent_id: ItemId) -> ItemRepoResult<Vec<Item>>;
    /// Lists all root-level items. No order contract.
    fn list_roots(&self) -> ItemRepoResult<Vec<Item>>;
    /// Produces the depth-first, sibling-ordered, category-filtered listing
    /// for the whole forest or one root-anchored subtree.
    fn resolve_hierarchy(
        &self,
        categories: &[ItemCategory],
        root_id: Option<ItemId>,
    ) -> ItemRepoResult<Vec<ResolvedItem>>;
}

/// SQLite-backed item repository.
#[derive(Debug)]
pub struct SqliteItemRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteItemRepository<'conn> {
    /// Creates repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> ItemRepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl ItemRepository for SqliteItemRepository<'_> {
    fn create_item(&self, draft: &NewItem) -> ItemRepoResult<Item> {
        // Immediate mode takes the write lock up front, serializing the
        // read-max-then-insert against every other concurrent creator.
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;

        if draft.parent_id != ROOT_PARENT && !item_exists(&tx, draft.parent_id)? {
            return Err(ItemRepoError::ParentNotFound(draft.parent_id));
        }

        let sort_position = sequencer::next_sort_position(&tx)?;
        let insert = tx.execute(
            "INSERT INTO items (parent_id, owner_id, sort_position, category, title, body)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                draft.parent_id,
                draft.owner_id,
                sort_position,
                category_to_db(draft.category),
                draft.title.as_deref(),
                draft.body.as_str(),
            ],
        );
        if let Err(err) = insert {
            return Err(map_insert_error(err, draft));
        }

        let item_id = tx.last_insert_rowid();
        let item = load_required_item(&tx, item_id)?;
        tx.commit()?;
        Ok(item)
    }

    fn get_item(&self, item_id: ItemId) -> ItemRepoResult<Option<Item>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {ITEM_COLUMNS} FROM items WHERE item_id = ?1;"
        ))?;
        let mut rows = stmt.query([item_id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_item_row(row)?));
        }
        Ok(None)
    }

    fn list_children(&self, parent_id: ItemId) -> ItemRepoResult<Vec<Item>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {ITEM_COLUMNS} FROM items WHERE parent_id = ?1;"
        ))?;
        let mut rows = stmt.query([parent_id])?;
        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            items.push(parse_item_row(row)?);
        }
        Ok(items)
    }

    fn list_roots(&self) -> ItemRepoResult<Vec<Item>> {
        self.list_children(ROOT_PARENT)
    }

    fn resolve_hierarchy(
        &self,
        categories: &[ItemCategory],
        root_id: Option<ItemId>,
    ) -> ItemRepoResult<Vec<ResolvedItem>> {
        // One deferred transaction per resolve call: readers see a consistent
        // snapshot (never a child without its parent) without blocking writers.
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Deferred)?;

        if let Some(root_id) = root_id {
            ensure_root_anchor(&tx, root_id)?;
        }

        let filter = dedup_categories(categories);
        if filter.is_empty() {
            return Ok(Vec::new());
        }

        let item_count: i64 = tx.query_row("SELECT COUNT(*) FROM items;", [], |row| row.get(0))?;
        let rows = run_hierarchy_query(&tx, &filter, root_id, item_count)?;

        let mut seen = HashSet::with_capacity(rows.len());
        for resolved in &rows {
            if resolved.depth as i64 >= item_count {
                return Err(corrupt(
                    resolved.item.item_id,
                    "traversal depth exceeds item count; parent chain loops",
                ));
            }
            if !seen.insert(resolved.item.item_id) {
                return Err(corrupt(
                    resolved.item.item_id,
                    "item reached through two distinct paths",
                ));
            }
        }
        Ok(rows)
    }
}

fn run_hierarchy_query(
    conn: &Connection,
    filter: &[ItemCategory],
    root_id: Option<ItemId>,
    item_count: i64,
) -> ItemRepoResult<Vec<ResolvedItem>> {
    let seed_predicate = if root_id.is_some() {
        "parent_id = 0 AND item_id = ?"
    } else {
        "parent_id = 0"
    };
    let category_placeholders = vec!["?"; filter.len()].join(", ");

    let sql = format!(
        "WITH RECURSIVE hierarchy (
            {ITEM_COLUMNS},
            depth,
            sort_path
        ) AS (
            SELECT {ITEM_COLUMNS},
                   0,
                   printf('{PATH_COMPONENT_FORMAT}', sort_position)
            FROM items
            WHERE {seed_predicate}
            UNION ALL
            SELECT c.item_id,
                   c.parent_id,
                   c.owner_id,
                   c.sort_position,
                   c.category,
                   c.title,
                   c.body,
                   c.created_at,
                   c.updated_at,
                   h.depth + 1,
                   h.sort_path || '{PATH_SEPARATOR}'
                       || printf('{PATH_COMPONENT_FORMAT}', c.sort_position)
            FROM items c
            INNER JOIN hierarchy h ON c.parent_id = h.item_id
            WHERE h.depth + 1 <= ?
        )
        SELECT {ITEM_COLUMNS}, depth, sort_path
        FROM hierarchy
        WHERE category IN ({category_placeholders})
        ORDER BY sort_path ASC;"
    );

    let mut bind_values: Vec<Value> = Vec::new();
    if let Some(root_id) = root_id {
        bind_values.push(Value::Integer(root_id));
    }
    bind_values.push(Value::Integer(item_count));
    for category in filter {
        bind_values.push(Value::Text(category_to_db(*category).to_string()));
    }

    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query(params_from_iter(bind_values))?;
    let mut resolved = Vec::new();
    while let Some(row) = rows.next()? {
        resolved.push(parse_resolved_row(row)?);
    }
    Ok(resolved)
}

fn ensure_root_anchor(conn: &Connection, root_id: ItemId) -> ItemRepoResult<()> {
    let mut stmt =
        conn.prepare(&format!("SELECT {ITEM_COLUMNS} FROM items WHERE item_id = ?1;"))?;
    let mut rows = stmt.query([root_id])?;
    match rows.next()? {
        // Only root-level items may anchor a subtree query; a non-root anchor
        // is reported the same way as a missing one.
        Some(row) => {
            let anchor = parse_item_row(row)?;
            if anchor.is_root() {
                Ok(())
            } else {
                Err(ItemRepoError::NotFound(root_id))
            }
        }
        None => Err(ItemRepoError::NotFound(root_id)),
    }
}

fn item_exists(conn: &Connection, item_id: ItemId) -> ItemRepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM items WHERE item_id = ?1);",
        [item_id],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn load_required_item(conn: &Connection, item_id: ItemId) -> ItemRepoResult<Item> {
    let mut stmt =
        conn.prepare(&format!("SELECT {ITEM_COLUMNS} FROM items WHERE item_id = ?1;"))?;
    let mut rows = stmt.query([item_id])?;
    if let Some(row) = rows.next()? {
        return parse_item_row(row);
    }
    Err(ItemRepoError::InvalidData(format!(
        "freshly inserted item {item_id} not readable in same transaction"
    )))
}

fn dedup_categories(categories: &[ItemCategory]) -> Vec<ItemCategory> {
    let mut seen = HashSet::new();
    categories
        .iter()
        .copied()
        .filter(|category| seen.insert(*category))
        .collect()
}

fn corrupt(item_id: ItemId, detail: &str) -> ItemRepoError {
    // Operator signal: this state should be structurally impossible and
    // points at external tampering with parent links.
    error!("event=resolve_hierarchy module=repo status=error error_code=corrupt_hierarchy item_id={item_id} detail={detail}");
    ItemRepoError::CorruptHierarchy {
        item_id,
        detail: detail.to_string(),
    }
}

fn map_insert_error(err: rusqlite::Error, draft: &NewItem) -> ItemRepoError {
    if let rusqlite::Error::SqliteFailure(failure, ref message) = err {
        match failure.extended_code {
            rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY => {
                return ItemRepoError::OwnerNotFound(draft.owner_id);
            }
            rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
            | rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE => {
                return ItemRepoError::DuplicateKey(
                    message.clone().unwrap_or_else(|| "unique constraint".to_string()),
                );
            }
            _ => {}
        }
    }
    err.into()
}

fn is_busy(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(failure, _)
            if failure.code == rusqlite::ErrorCode::DatabaseBusy
                || failure.code == rusqlite::ErrorCode::DatabaseLocked
    )
}

fn parse_item_row(row: &Row<'_>) -> ItemRepoResult<Item> {
    let category_text: String = row.get("category")?;
    let category = parse_category(&category_text).ok_or_else(|| {
        ItemRepoError::InvalidData(format!(
            "invalid category `{category_text}` in items.category"
        ))
    })?;

    Ok(Item {
        item_id: row.get("item_id")?,
        parent_id: row.get("parent_id")?,
        owner_id: row.get("owner_id")?,
        sort_position: row.get("sort_position")?,
        category,
        title: row.get("title")?,
        body: row.get("body")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn parse_resolved_row(row: &Row<'_>) -> ItemRepoResult<ResolvedItem> {
    let item = parse_item_row(row)?;
    let depth: i64 = row.get("depth")?;
    let sort_path: String = row.get("sort_path")?;
    let path_key = parse_sort_path(&sort_path)?;

    if i64::from(path_key.depth()) != depth {
        return Err(ItemRepoError::InvalidData(format!(
            "path `{sort_path}` does not match depth {depth} for item {}",
            item.item_id
        )));
    }

    Ok(ResolvedItem {
        item,
        path_key,
        depth: depth as u32,
    })
}

fn parse_sort_path(sort_path: &str) -> ItemRepoResult<PathKey> {
    let mut components = Vec::new();
    for component in sort_path.split(PATH_SEPARATOR) {
        let value: i64 = component.parse().map_err(|_| {
            ItemRepoError::InvalidData(format!(
                "invalid path component `{component}` in `{sort_path}`"
            ))
        })?;
        components.push(value);
    }
    Ok(PathKey::from_components(components))
}

fn category_to_db(category: ItemCategory) -> &'static str {
    match category {
        ItemCategory::Topic => "topic",
        ItemCategory::Content => "content",
        ItemCategory::Comment => "comment",
    }
}

fn parse_category(value: &str) -> Option<ItemCategory> {
    match value {
        "topic" => Some(ItemCategory::Topic),
        "content" => Some(ItemCategory::Content),
        "comment" => Some(ItemCategory::Comment),
        _ => None,
    }
}

fn ensure_connection_ready(conn: &Connection) -> ItemRepoResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(ItemRepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    for table in ["items", "accounts"] {
        let exists: i64 = conn.query_row(
            "SELECT EXISTS(
                SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1
            );",
            [table],
            |row| row.get(0),
        )?;
        if exists != 1 {
            return Err(ItemRepoError::MissingRequiredTable(table));
        }
    }

    Ok(())
}
