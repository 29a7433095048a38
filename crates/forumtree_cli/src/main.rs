//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `forumtree_core` linkage.
//! - Keep output deterministic for quick local sanity checks.

use forumtree_core::db::open_db_in_memory;
use forumtree_core::{
    AccountRepository, ForestService, ItemCategory, NewAccount, SqliteAccountRepository,
    SqliteItemRepository,
};

fn main() {
    println!("forumtree_core version={}", forumtree_core::core_version());

    if let Err(err) = run_smoke() {
        eprintln!("smoke run failed: {err}");
        std::process::exit(1);
    }
}

fn run_smoke() -> Result<(), Box<dyn std::error::Error>> {
    let conn = open_db_in_memory()?;

    let author = SqliteAccountRepository::new(&conn)
        .create_account(&NewAccount::new("Ada", "Lovelace", "ada@example.com"))?;

    let service = ForestService::new(SqliteItemRepository::try_new(&conn)?);
    let topic = service.create_item(
        ItemCategory::Topic,
        "First discussion",
        Some("Hello forest".to_string()),
        None,
        author.account_id,
    )?;
    let content = service.create_item(
        ItemCategory::Content,
        "Opening post",
        None,
        Some(topic.item_id),
        author.account_id,
    )?;
    service.create_item(
        ItemCategory::Comment,
        "First reply",
        None,
        Some(content.item_id),
        author.account_id,
    )?;

    for resolved in service.resolve(
        &[
            ItemCategory::Topic,
            ItemCategory::Content,
            ItemCategory::Comment,
        ],
        None,
    )? {
        println!(
            "depth={} position={} id={} body={}",
            resolved.depth, resolved.item.sort_position, resolved.item.item_id, resolved.item.body
        );
    }
    Ok(())
}
