use anyhow::{anyhow, Context, Result};
use cfb_reconcile::Store;
use cfb_schemas::{CanonicalRecord, Category, Direction, RecordDetails};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::debug;

use crate::TableNames;

/// Postgres-backed player tables.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
    tables: TableNames,
}

impl PgStore {
    pub fn new(pool: PgPool, tables: TableNames) -> Self {
        Self { pool, tables }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub fn tables(&self) -> &TableNames {
        &self.tables
    }
}

fn recruit_from_row(row: &PgRow) -> Result<CanonicalRecord> {
    let stars: Option<i16> = row.try_get("stars")?;
    let stars = stars
        .map(u8::try_from)
        .transpose()
        .context("stars column out of range")?;

    Ok(CanonicalRecord {
        id: row.try_get("entry_id")?,
        name: row.try_get("name")?,
        position: row.try_get("position")?,
        status: row.try_get("status")?,
        player_url: row.try_get("player_url")?,
        source: row.try_get("source")?,
        updated_at: row.try_get("updated_at")?,
        details: RecordDetails::Recruit {
            hometown: row.try_get("hometown")?,
            stars,
            rating: row.try_get("rating")?,
        },
    })
}

fn portal_from_row(row: &PgRow) -> Result<CanonicalRecord> {
    let direction: String = row.try_get("direction")?;
    let direction = Direction::parse(&direction)
        .ok_or_else(|| anyhow!("invalid direction in portal row: {direction}"))?;

    Ok(CanonicalRecord {
        id: row.try_get("entry_id")?,
        name: row.try_get("name")?,
        position: row.try_get("position")?,
        status: row.try_get("status")?,
        player_url: row.try_get("player_url")?,
        source: row.try_get("source")?,
        updated_at: row.try_get("updated_at")?,
        details: RecordDetails::Portal {
            direction,
            source_school: row.try_get("source_school")?,
        },
    })
}

#[async_trait::async_trait]
impl Store for PgStore {
    async fn read_all(&self, category: Category) -> Result<Vec<CanonicalRecord>> {
        let table = self.tables.for_category(category);
        let sql = match category {
            Category::Recruits => format!(
                "select entry_id, name, position, hometown, stars, rating, status, source, \
                 player_url, updated_at from {table} order by entry_id"
            ),
            Category::Portal => format!(
                "select entry_id, name, position, direction, source_school, status, source, \
                 player_url, updated_at from {table} order by entry_id"
            ),
        };

        let rows = sqlx::query(&sql)
            .fetch_all(&self.pool)
            .await
            .with_context(|| format!("read_all {table} failed"))?;

        rows.iter()
            .map(|row| match category {
                Category::Recruits => recruit_from_row(row),
                Category::Portal => portal_from_row(row),
            })
            .collect::<Result<Vec<_>>>()
            .with_context(|| format!("decode {table} row failed"))
    }

    async fn upsert(&self, category: Category, records: &[CanonicalRecord]) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }
        let table = self.tables.for_category(category);

        let recruit_sql = format!(
            r#"
            insert into {table} (
              entry_id, name, position, hometown, stars, rating, status, source, player_url, updated_at
            ) values ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10)
            on conflict (entry_id) do update set
              name = excluded.name,
              position = excluded.position,
              hometown = excluded.hometown,
              stars = excluded.stars,
              rating = excluded.rating,
              status = excluded.status,
              source = excluded.source,
              player_url = excluded.player_url,
              updated_at = excluded.updated_at
            "#
        );
        let portal_sql = format!(
            r#"
            insert into {table} (
              entry_id, name, position, direction, source_school, status, source, player_url, updated_at
            ) values ($1,$2,$3,$4,$5,$6,$7,$8,$9)
            on conflict (entry_id) do update set
              name = excluded.name,
              position = excluded.position,
              direction = excluded.direction,
              source_school = excluded.source_school,
              status = excluded.status,
              source = excluded.source,
              player_url = excluded.player_url,
              updated_at = excluded.updated_at
            "#
        );

        let mut tx = self.pool.begin().await.context("begin upsert tx failed")?;

        for rec in records {
            match &rec.details {
                RecordDetails::Recruit {
                    hometown,
                    stars,
                    rating,
                } if category == Category::Recruits => {
                    sqlx::query(&recruit_sql)
                        .bind(&rec.id)
                        .bind(&rec.name)
                        .bind(&rec.position)
                        .bind(hometown)
                        .bind(stars.map(i16::from))
                        .bind(rating)
                        .bind(&rec.status)
                        .bind(&rec.source)
                        .bind(&rec.player_url)
                        .bind(rec.updated_at)
                        .execute(&mut *tx)
                        .await
                        .with_context(|| format!("upsert {table} entry_id={} failed", rec.id))?;
                }
                RecordDetails::Portal {
                    direction,
                    source_school,
                } if category == Category::Portal => {
                    sqlx::query(&portal_sql)
                        .bind(&rec.id)
                        .bind(&rec.name)
                        .bind(&rec.position)
                        .bind(direction.as_str())
                        .bind(source_school)
                        .bind(&rec.status)
                        .bind(&rec.source)
                        .bind(&rec.player_url)
                        .bind(rec.updated_at)
                        .execute(&mut *tx)
                        .await
                        .with_context(|| format!("upsert {table} entry_id={} failed", rec.id))?;
                }
                other => {
                    return Err(anyhow!(
                        "record {} is a {} record, cannot upsert into {category}",
                        rec.id,
                        other.category()
                    ));
                }
            }
        }

        tx.commit().await.context("commit upsert tx failed")?;
        debug!(%category, table, rows = records.len(), "upserted rows");
        Ok(())
    }

    async fn delete(&self, category: Category, ids: &[String]) -> Result<()> {
        if ids.is_empty() {
            return Ok(());
        }
        let table = self.tables.for_category(category);
        let sql = format!("delete from {table} where entry_id = any($1)");

        let res = sqlx::query(&sql)
            .bind(ids)
            .execute(&self.pool)
            .await
            .with_context(|| format!("delete from {table} failed"))?;

        debug!(%category, table, rows = res.rows_affected(), "deleted rows");
        Ok(())
    }
}
