//! Command handler modules for cfb-cli.
//!
//! Shared utilities used by multiple command paths live here.

pub mod sync;

use anyhow::Result;
use cfb_config::{LoadedConfig, TrackerConfig};
use cfb_db::{PgPool, TableNames};

/// Load layered config and parse it into the typed tracker config.
pub fn load_tracker(config_paths: &[String]) -> Result<(LoadedConfig, TrackerConfig)> {
    let path_refs: Vec<&str> = config_paths.iter().map(|s| s.as_str()).collect();
    let loaded = cfb_config::load_layered_yaml(&path_refs)?;
    let cfg = loaded.tracker()?;
    Ok((loaded, cfg))
}

pub fn table_names(cfg: &TrackerConfig) -> Result<TableNames> {
    TableNames::new(&cfg.storage.recruits_table, &cfg.storage.portal_table)
}

/// Connect using config when paths are given, otherwise CFB_DATABASE_URL
/// with default table names.
pub async fn connect_db(config_paths: &[String]) -> Result<(PgPool, TableNames)> {
    if config_paths.is_empty() {
        return Ok((cfb_db::connect_from_env().await?, TableNames::default()));
    }

    let (_loaded, cfg) = load_tracker(config_paths)?;
    let secrets = cfb_config::resolve_secrets(&cfg);
    let pool = cfb_db::connect(secrets.require_database_url()?).await?;
    Ok((pool, table_names(&cfg)?))
}
