use anyhow::{Context, Result};
use cfb_reconcile::{EmitError, EventSink};
use cfb_schemas::PlayerEvent;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::{PgPool, Row};
use uuid::Uuid;

/// Event sink that appends to the `player_events` outbox. Downstream workers
/// poll with [`outbox_fetch_pending`] and ack with [`outbox_mark_dispatched`].
#[derive(Debug, Clone)]
pub struct PgOutboxSink {
    pool: PgPool,
    team: String,
}

impl PgOutboxSink {
    pub fn new(pool: PgPool, team: impl Into<String>) -> Self {
        Self {
            pool,
            team: team.into(),
        }
    }
}

#[async_trait::async_trait]
impl EventSink for PgOutboxSink {
    async fn emit(&self, event: &PlayerEvent) -> Result<(), EmitError> {
        let payload = serde_json::to_value(event)
            .map_err(|e| EmitError::Rejected(format!("serialize event: {e}")))?;

        sqlx::query(
            r#"
            insert into player_events (
              event_id, category, event_type, entry_id, team, payload
            ) values ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(event.category().as_str())
        .bind(event.event_type())
        .bind(&event.record().id)
        .bind(&self.team)
        .bind(payload)
        .execute(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db) => EmitError::Rejected(db.to_string()),
            other => EmitError::Unavailable(other.to_string()),
        })?;

        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct OutboxRow {
    pub event_id: Uuid,
    pub category: String,
    pub event_type: String,
    pub entry_id: String,
    pub team: String,
    pub payload: Value,
    pub created_at: DateTime<Utc>,
    pub dispatched_at: Option<DateTime<Utc>>,
}

/// Oldest undispatched events first.
pub async fn outbox_fetch_pending(pool: &PgPool, limit: i64) -> Result<Vec<OutboxRow>> {
    let rows = sqlx::query(
        r#"
        select event_id, category, event_type, entry_id, team, payload, created_at, dispatched_at
        from player_events
        where dispatched_at is null
        order by created_at asc, event_id asc
        limit $1
        "#,
    )
    .bind(limit)
    .fetch_all(pool)
    .await
    .context("outbox_fetch_pending failed")?;

    rows.iter()
        .map(|row| -> Result<OutboxRow> {
            Ok(OutboxRow {
                event_id: row.try_get("event_id")?,
                category: row.try_get("category")?,
                event_type: row.try_get("event_type")?,
                entry_id: row.try_get("entry_id")?,
                team: row.try_get("team")?,
                payload: row.try_get("payload")?,
                created_at: row.try_get("created_at")?,
                dispatched_at: row.try_get("dispatched_at")?,
            })
        })
        .collect()
}

/// Mark one event dispatched. Returns false if it was unknown or already acked.
pub async fn outbox_mark_dispatched(pool: &PgPool, event_id: Uuid) -> Result<bool> {
    let res = sqlx::query(
        r#"
        update player_events
        set dispatched_at = now()
        where event_id = $1
          and dispatched_at is null
        "#,
    )
    .bind(event_id)
    .execute(pool)
    .await
    .context("outbox_mark_dispatched failed")?;

    Ok(res.rows_affected() == 1)
}
