//! Postgres row source tests
//!
//! These need a reachable database and are ignored by default. Run with
//! `PHONEDESK_TEST_DATABASE_URL=postgresql://... cargo test -- --ignored`.

use phonedesk_ingest::source::{PgRowSource, RowSource};
use sqlx::PgPool;

async fn test_pool() -> PgPool {
    let url = std::env::var("PHONEDESK_TEST_DATABASE_URL")
        .expect("PHONEDESK_TEST_DATABASE_URL must be set");
    PgPool::connect(&url).await.expect("Failed to connect")
}

async fn seed_table(pool: &PgPool, table: &str) {
    sqlx::query(&format!("DROP TABLE IF EXISTS {}", table))
        .execute(pool)
        .await
        .unwrap();
    sqlx::query(&format!(
        "CREATE TABLE {} (id INTEGER PRIMARY KEY, name TEXT, needed_by DATE, comments TEXT)",
        table
    ))
    .execute(pool)
    .await
    .unwrap();
    // inserted out of order so paging has to rely on ORDER BY
    for id in [4, 2, 5, 1, 3] {
        sqlx::query(&format!(
            "INSERT INTO {} (id, name, needed_by, comments) VALUES ($1, $2, '2024-04-08', NULL)",
            table
        ))
        .bind(id)
        .bind(format!("Requester {}", id))
        .execute(pool)
        .await
        .unwrap();
    }
}

async fn drop_table(pool: &PgPool, table: &str) {
    sqlx::query(&format!("DROP TABLE IF EXISTS {}", table))
        .execute(pool)
        .await
        .unwrap();
}

#[tokio::test]
#[ignore] // Requires database
async fn test_pages_follow_order_column() {
    let pool = test_pool().await;
    let table = format!("phonedesk_paging_{}", std::process::id());
    seed_table(&pool, &table).await;

    let mut source = PgRowSource::with_pool(pool.clone(), &table, "id").unwrap();
    assert_eq!(source.count().await.unwrap(), 5);

    let mut ids = Vec::new();
    let mut sizes = Vec::new();
    loop {
        let page = source.next_page(2).await.unwrap();
        sizes.push(page.len());
        if page.is_empty() {
            break;
        }
        ids.extend(page.iter().filter_map(|record| record.text("id")));
    }

    assert_eq!(sizes, vec![2, 2, 1, 0]);
    assert_eq!(ids, vec!["1", "2", "3", "4", "5"]);

    drop_table(&pool, &table).await;
}

#[tokio::test]
#[ignore] // Requires database
async fn test_rows_decode_as_text_and_null() {
    let pool = test_pool().await;
    let table = format!("phonedesk_decode_{}", std::process::id());
    seed_table(&pool, &table).await;

    let mut source = PgRowSource::with_pool(pool.clone(), &table, "id").unwrap();
    let page = source.next_page(1).await.unwrap();

    let record = &page[0];
    assert_eq!(record.text("name").as_deref(), Some("Requester 1"));
    assert_eq!(record.text("needed_by").as_deref(), Some("2024-04-08"));
    assert_eq!(record.text("comments"), None);

    drop_table(&pool, &table).await;
}
