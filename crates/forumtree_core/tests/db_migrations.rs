use forumtree_core::db::migrations::latest_version;
use forumtree_core::db::{open_db, open_db_in_memory};
use tempfile::TempDir;

#[test]
fn migrations_create_items_and_accounts_tables() {
    let conn = open_db_in_memory().unwrap();

    for table in ["accounts", "items"] {
        let exists: i64 = conn
            .query_row(
                "SELECT EXISTS(
                    SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1
                );",
                [table],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(exists, 1, "missing table {table}");
    }

    let mut stmt = conn.prepare("PRAGMA table_info(items);").unwrap();
    let mut rows = stmt.query([]).unwrap();
    let mut columns = Vec::new();
    while let Some(row) = rows.next().unwrap() {
        let column_name: String = row.get(1).unwrap();
        columns.push(column_name);
    }
    for column in [
        "item_id",
        "parent_id",
        "owner_id",
        "sort_position",
        "category",
        "title",
        "body",
        "created_at",
        "updated_at",
    ] {
        assert!(columns.contains(&column.to_string()), "missing column {column}");
    }
}

#[test]
fn migrations_set_user_version_and_reopen_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("forest.db");

    let conn = open_db(&path).unwrap();
    let version: u32 = conn
        .query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(version, latest_version());
    drop(conn);

    // Second open sees an up-to-date schema and applies nothing.
    let conn = open_db(&path).unwrap();
    let version: u32 = conn
        .query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(version, latest_version());
}

#[test]
fn sort_position_index_is_unique() {
    let conn = open_db_in_memory().unwrap();
    conn.execute(
        "INSERT INTO accounts (first_name, last_name, email)
         VALUES ('Ada', 'L', 'ada@example.com');",
        [],
    )
    .unwrap();
    conn.execute(
        "INSERT INTO items (parent_id, owner_id, sort_position, category, body)
         VALUES (0, 1, 0, 'topic', 'a');",
        [],
    )
    .unwrap();
    let err = conn
        .execute(
            "INSERT INTO items (parent_id, owner_id, sort_position, category, body)
             VALUES (0, 1, 0, 'topic', 'b');",
            [],
        )
        .unwrap_err();
    assert!(err.to_string().contains("UNIQUE"));
}

#[test]
fn category_check_rejects_unknown_kind() {
    let conn = open_db_in_memory().unwrap();
    conn.execute(
        "INSERT INTO accounts (first_name, last_name, email)
         VALUES ('Ada', 'L', 'ada@example.com');",
        [],
    )
    .unwrap();
    let err = conn
        .execute(
            "INSERT INTO items (parent_id, owner_id, sort_position, category, body)
             VALUES (0, 1, 0, 'poll', 'x');",
            [],
        )
        .unwrap_err();
    assert!(err.to_string().contains("CHECK"));
}
