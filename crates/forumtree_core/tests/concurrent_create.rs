use forumtree_core::db::open_db;
use forumtree_core::{
    AccountRepository, ForestService, ItemCategory, NewAccount, SqliteAccountRepository,
    SqliteItemRepository,
};
use std::collections::HashSet;
use std::sync::Arc;
use std::thread;
use tempfile::TempDir;

const WRITERS: usize = 4;
const ITEMS_PER_WRITER: usize = 25;

#[test]
fn concurrent_creators_get_unique_positions_and_serialized_order() {
    let dir = TempDir::new().unwrap();
    let path = Arc::new(dir.path().join("forest.db"));

    // Open once up front so migrations run before writers race.
    let (owner, root_id) = {
        let conn = open_db(path.as_path()).unwrap();
        let owner = SqliteAccountRepository::new(&conn)
            .create_account(&NewAccount::new("Ada", "Lovelace", "ada@example.com"))
            .unwrap()
            .account_id;
        let service = ForestService::new(SqliteItemRepository::try_new(&conn).unwrap());
        let root = service
            .create_item(
                ItemCategory::Topic,
                "shared root",
                Some("Root".to_string()),
                None,
                owner,
            )
            .unwrap();
        (owner, root.item_id)
    };

    let mut handles = Vec::new();
    for writer in 0..WRITERS {
        let path = Arc::clone(&path);
        handles.push(thread::spawn(move || {
            let conn = open_db(path.as_path()).unwrap();
            let service = ForestService::new(SqliteItemRepository::try_new(&conn).unwrap());

            let mut created = Vec::new();
            for index in 0..ITEMS_PER_WRITER {
                let item = service
                    .create_item(
                        ItemCategory::Comment,
                        format!("w{writer} i{index}"),
                        None,
                        Some(root_id),
                        owner,
                    )
                    .unwrap();
                created.push((item.item_id, item.sort_position));
            }
            created
        }));
    }

    let mut all_created = Vec::new();
    for handle in handles {
        let created = handle.join().unwrap();
        // Monotonicity within one writer: each create completed before the
        // next one started, so positions must strictly increase.
        for pair in created.windows(2) {
            assert!(pair[0].1 < pair[1].1);
        }
        all_created.extend(created);
    }
    assert_eq!(all_created.len(), WRITERS * ITEMS_PER_WRITER);

    // Uniqueness across every writer.
    let positions: HashSet<i64> = all_created.iter().map(|(_, position)| *position).collect();
    assert_eq!(positions.len(), all_created.len());

    // Resolve order equals the serialization order the writers observed.
    let conn = open_db(path.as_path()).unwrap();
    let service = ForestService::new(SqliteItemRepository::try_new(&conn).unwrap());
    let resolved = service
        .resolve(&[ItemCategory::Comment], Some(root_id))
        .unwrap();
    assert_eq!(resolved.len(), all_created.len());

    all_created.sort_by_key(|(_, position)| *position);
    let resolved_ids: Vec<i64> = resolved.iter().map(|r| r.item.item_id).collect();
    let committed_ids: Vec<i64> = all_created.iter().map(|(item_id, _)| *item_id).collect();
    assert_eq!(resolved_ids, committed_ids);
    assert!(resolved.iter().all(|r| r.depth == 1));
}
