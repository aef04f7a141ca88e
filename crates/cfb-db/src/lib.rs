use anyhow::{anyhow, Context, Result};
use sqlx::postgres::PgPoolOptions;

mod outbox;
mod store;

pub use outbox::{outbox_fetch_pending, outbox_mark_dispatched, OutboxRow, PgOutboxSink};
pub use sqlx::PgPool;
pub use store::PgStore;

pub const ENV_DB_URL: &str = "CFB_DATABASE_URL";

/// Connect to Postgres at `url`.
pub async fn connect(url: &str) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(url)
        .await
        .context("failed to connect to Postgres")?;

    Ok(pool)
}

/// Connect to Postgres using CFB_DATABASE_URL.
pub async fn connect_from_env() -> Result<PgPool> {
    let url = std::env::var(ENV_DB_URL)
        .with_context(|| format!("missing env var {ENV_DB_URL}"))?;
    connect(&url).await
}

/// Run embedded SQLx migrations.
pub async fn migrate(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .context("db migrate failed")?;
    Ok(())
}

/// Per-category table names. Both must be plain SQL identifiers since they
/// are spliced into statements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableNames {
    pub recruits: String,
    pub portal: String,
}

impl Default for TableNames {
    fn default() -> Self {
        Self {
            recruits: "recruits".to_string(),
            portal: "portal".to_string(),
        }
    }
}

impl TableNames {
    pub fn new(recruits: impl Into<String>, portal: impl Into<String>) -> Result<Self> {
        let names = Self {
            recruits: recruits.into(),
            portal: portal.into(),
        };
        validate_identifier(&names.recruits)?;
        validate_identifier(&names.portal)?;
        if names.recruits == names.portal {
            return Err(anyhow!(
                "recruits and portal tables must differ (both '{}')",
                names.recruits
            ));
        }
        Ok(names)
    }

    pub fn for_category(&self, category: cfb_schemas::Category) -> &str {
        match category {
            cfb_schemas::Category::Recruits => &self.recruits,
            cfb_schemas::Category::Portal => &self.portal,
        }
    }
}

/// `[A-Za-z_][A-Za-z0-9_]*`, at most 63 bytes (Postgres NAMEDATALEN - 1).
pub fn validate_identifier(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let first_ok = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_');
    if !first_ok || name.len() > 63 || !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(anyhow!("invalid table name: {name:?}"));
    }
    Ok(())
}

/// Simple status query (connectivity + schema presence).
pub async fn status(pool: &PgPool, tables: &TableNames) -> Result<DbStatus> {
    let (one,): (i32,) = sqlx::query_as::<_, (i32,)>("select 1")
        .fetch_one(pool)
        .await
        .context("status connectivity query failed")?;

    Ok(DbStatus {
        ok: one == 1,
        has_recruits_table: table_exists(pool, &tables.recruits).await?,
        has_portal_table: table_exists(pool, &tables.portal).await?,
        has_outbox_table: table_exists(pool, "player_events").await?,
    })
}

async fn table_exists(pool: &PgPool, table: &str) -> Result<bool> {
    let (exists,): (bool,) = sqlx::query_as::<_, (bool,)>(
        r#"
        select exists (
            select 1
            from information_schema.tables
            where table_schema='public' and table_name=$1
        )
        "#,
    )
    .bind(table)
    .fetch_one(pool)
    .await
    .with_context(|| format!("status table-exists query failed for {table}"))?;
    Ok(exists)
}

#[derive(Debug, Clone)]
pub struct DbStatus {
    pub ok: bool,
    pub has_recruits_table: bool,
    pub has_portal_table: bool,
    pub has_outbox_table: bool,
}
