use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use uuid::Uuid;

mod commands;

#[derive(Parser)]
#[command(name = "cfb")]
#[command(about = "CFB recruiting / transfer-portal tracker CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch from every configured provider, merge, and reconcile stored state
    Sync {
        /// Layered config paths in merge order
        #[arg(long = "config", required = true)]
        config_paths: Vec<String>,

        /// Only sync one category (recruits | portal). Default: both, concurrently.
        #[arg(long)]
        category: Option<String>,
    },

    /// Database commands
    Db {
        #[command(subcommand)]
        cmd: DbCmd,
    },

    /// Event outbox commands
    Outbox {
        #[command(subcommand)]
        cmd: OutboxCmd,
    },

    /// Print the normalized name, identity key and id for a player name
    Id {
        /// Raw player name as a provider reports it
        name: String,
    },

    /// Compute layered config hash + print canonical JSON
    ConfigHash {
        /// Paths in merge order (base -> env -> overrides...)
        #[arg(required = true)]
        paths: Vec<String>,
    },
}

#[derive(Subcommand)]
enum DbCmd {
    /// Connectivity + table presence
    Status {
        /// Layered config paths. Without them CFB_DATABASE_URL and default table names are used.
        #[arg(long = "config")]
        config_paths: Vec<String>,
    },

    /// Apply SQL migrations
    Migrate {
        #[arg(long = "config")]
        config_paths: Vec<String>,
    },
}

#[derive(Subcommand)]
enum OutboxCmd {
    /// List undispatched events, oldest first
    Pending {
        #[arg(long = "config")]
        config_paths: Vec<String>,

        /// Max rows to print
        #[arg(long, default_value_t = 50)]
        limit: i64,
    },

    /// Mark one event dispatched
    Ack {
        #[arg(long = "config")]
        config_paths: Vec<String>,

        /// Event id (uuid)
        #[arg(long)]
        event_id: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    init_tracing();

    let cli = Cli::parse();

    match cli.cmd {
        Commands::Sync {
            config_paths,
            category,
        } => {
            commands::sync::run_sync(config_paths, category).await?;
        }

        Commands::Db { cmd } => match cmd {
            DbCmd::Status { config_paths } => {
                let (pool, tables) = commands::connect_db(&config_paths).await?;
                let s = cfb_db::status(&pool, &tables).await?;
                println!(
                    "db_ok={} has_recruits_table={} has_portal_table={} has_outbox_table={}",
                    s.ok, s.has_recruits_table, s.has_portal_table, s.has_outbox_table
                );
            }
            DbCmd::Migrate { config_paths } => {
                let (pool, _tables) = commands::connect_db(&config_paths).await?;
                cfb_db::migrate(&pool).await?;
                println!("migrations_applied=true");
            }
        },

        Commands::Outbox { cmd } => match cmd {
            OutboxCmd::Pending {
                config_paths,
                limit,
            } => {
                if limit <= 0 {
                    anyhow::bail!("--limit must be > 0");
                }
                let (pool, _tables) = commands::connect_db(&config_paths).await?;
                let rows = cfb_db::outbox_fetch_pending(&pool, limit).await?;
                println!("pending={}", rows.len());
                for r in rows {
                    println!(
                        "event_id={} category={} event_type={} entry_id={} team={} created_at={} payload={}",
                        r.event_id,
                        r.category,
                        r.event_type,
                        r.entry_id,
                        r.team,
                        r.created_at.to_rfc3339(),
                        r.payload
                    );
                }
            }
            OutboxCmd::Ack {
                config_paths,
                event_id,
            } => {
                let event_uuid = Uuid::parse_str(&event_id).context("invalid event_id uuid")?;
                let (pool, _tables) = commands::connect_db(&config_paths).await?;
                let acked = cfb_db::outbox_mark_dispatched(&pool, event_uuid).await?;
                println!("acked={} event_id={}", acked, event_uuid);
            }
        },

        Commands::Id { name } => {
            println!("normalized={}", cfb_identity::normalize_name(&name));
            println!("key={}", cfb_identity::name_key(&name));
            println!("id={}", cfb_identity::derive_id(&name));
        }

        Commands::ConfigHash { paths } => {
            let path_refs: Vec<&str> = paths.iter().map(|s| s.as_str()).collect();
            let loaded = cfb_config::load_layered_yaml(&path_refs)?;
            println!("config_hash={}", loaded.config_hash);
            println!("{}", loaded.canonical_json);
        }
    }

    Ok(())
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();
}
