//! DB-backed: a full reconcile pass against PgStore + PgOutboxSink.
//!
//! Skipped if CFB_DATABASE_URL is not set. Each test clones the migrated
//! tables into uniquely named scratch tables so passes never touch shared rows.

use anyhow::Result;
use cfb_db::{PgOutboxSink, PgStore, TableNames};
use cfb_reconcile::{reconcile, Store};
use cfb_schemas::{CanonicalRecord, Category, Direction, RecordDetails};
use sqlx::PgPool;
use uuid::Uuid;

async fn pool_or_skip() -> Result<Option<PgPool>> {
    let url = match std::env::var(cfb_db::ENV_DB_URL) {
        Ok(v) => v,
        Err(_) => {
            eprintln!("SKIP: CFB_DATABASE_URL not set");
            return Ok(None);
        }
    };

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(2)
        .connect(&url)
        .await?;

    cfb_db::migrate(&pool).await?;
    Ok(Some(pool))
}

async fn scratch_tables(pool: &PgPool) -> Result<TableNames> {
    let suffix = Uuid::new_v4().simple().to_string();
    let tables = TableNames::new(format!("recruits_t_{suffix}"), format!("portal_t_{suffix}"))?;
    sqlx::query(&format!(
        "create table {} (like recruits including all)",
        tables.recruits
    ))
    .execute(pool)
    .await?;
    sqlx::query(&format!("create table {} (like portal including all)", tables.portal))
        .execute(pool)
        .await?;
    Ok(tables)
}

async fn drop_tables(pool: &PgPool, tables: &TableNames) -> Result<()> {
    for t in [&tables.recruits, &tables.portal] {
        sqlx::query(&format!("drop table if exists {t}"))
            .execute(pool)
            .await?;
    }
    Ok(())
}

fn recruit(name: &str, status: Option<&str>, stars: Option<u8>) -> CanonicalRecord {
    CanonicalRecord {
        id: cfb_identity::derive_id(name),
        name: name.to_string(),
        position: "qb".to_string(),
        status: status.map(str::to_string),
        player_url: None,
        source: "247,on3".to_string(),
        updated_at: None,
        details: RecordDetails::Recruit {
            hometown: Some("Tampa, FL".to_string()),
            stars,
            rating: Some(0.9712),
        },
    }
}

#[tokio::test]
async fn reconcile_pass_persists_and_queues_events() -> Result<()> {
    let Some(pool) = pool_or_skip().await? else {
        return Ok(());
    };
    let tables = scratch_tables(&pool).await?;
    let store = PgStore::new(pool.clone(), tables.clone());
    let team = format!("test-{}", Uuid::new_v4());
    let sink = PgOutboxSink::new(pool.clone(), team.clone());

    let first = reconcile(
        Category::Recruits,
        vec![
            recruit("Keeper Guy", Some("uncommitted"), Some(4)),
            recruit("Changer Guy", Some("uncommitted"), None),
            recruit("Deleter Guy", Some("committed"), Some(3)),
        ],
        &store,
        &sink,
    )
    .await?;
    assert_eq!(first.upserted, 3);
    assert_eq!(first.events_emitted, 3);

    let second = reconcile(
        Category::Recruits,
        vec![
            recruit("Keeper Guy", Some("uncommitted"), Some(4)),
            recruit("Changer Guy", Some("committed"), None),
            recruit("Newbie Guy", Some("uncommitted"), Some(5)),
        ],
        &store,
        &sink,
    )
    .await?;
    assert_eq!(second.upserted, 2);
    assert_eq!(second.deleted, 1);
    assert_eq!(second.events_emitted, 3);

    let stored = store.read_all(Category::Recruits).await?;
    let mut names: Vec<&str> = stored.iter().map(|r| r.name.as_str()).collect();
    names.sort();
    assert_eq!(names, vec!["Changer Guy", "Keeper Guy", "Newbie Guy"]);

    let changer = stored
        .iter()
        .find(|r| r.name == "Changer Guy")
        .expect("changer row");
    assert_eq!(changer.status.as_deref(), Some("committed"));
    assert!(changer.updated_at.is_some());

    let newbie = stored.iter().find(|r| r.name == "Newbie Guy").expect("newbie row");
    assert_eq!(
        newbie.details,
        RecordDetails::Recruit {
            hometown: Some("Tampa, FL".to_string()),
            stars: Some(5),
            rating: Some(0.9712),
        }
    );

    let (queued,): (i64,) =
        sqlx::query_as("select count(*)::bigint from player_events where team = $1")
            .bind(&team)
            .fetch_one(&pool)
            .await?;
    assert_eq!(queued, 6);

    sqlx::query("update player_events set dispatched_at = now() where team = $1")
        .bind(&team)
        .execute(&pool)
        .await?;
    drop_tables(&pool, &tables).await?;
    Ok(())
}

#[tokio::test]
async fn portal_rows_roundtrip_and_empty_batches_are_noops() -> Result<()> {
    let Some(pool) = pool_or_skip().await? else {
        return Ok(());
    };
    let tables = scratch_tables(&pool).await?;
    let store = PgStore::new(pool.clone(), tables.clone());

    store.upsert(Category::Portal, &[]).await?;
    store.delete(Category::Portal, &[]).await?;

    let rec = CanonicalRecord {
        id: cfb_identity::derive_id("Sam Roe"),
        name: "Sam Roe".to_string(),
        position: "cb".to_string(),
        status: Some("entered".to_string()),
        player_url: Some("https://example.test/sam".to_string()),
        source: "on3".to_string(),
        updated_at: None,
        details: RecordDetails::Portal {
            direction: Direction::Outgoing,
            source_school: Some("Temple".to_string()),
        },
    };

    store.upsert(Category::Portal, std::slice::from_ref(&rec)).await?;
    store.upsert(Category::Portal, std::slice::from_ref(&rec)).await?;
    assert_eq!(store.read_all(Category::Portal).await?, vec![rec.clone()]);

    store.delete(Category::Portal, &[rec.id.clone()]).await?;
    assert!(store.read_all(Category::Portal).await?.is_empty());

    let wrong = recruit("Wrong Table", None, None);
    assert!(store.upsert(Category::Portal, &[wrong]).await.is_err());

    drop_tables(&pool, &tables).await?;
    Ok(())
}
