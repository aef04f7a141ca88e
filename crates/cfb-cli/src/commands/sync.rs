//! `cfb sync`: one reconcile pass per category.

use anyhow::{bail, Result};
use cfb_config::{ProviderConfig, TrackerConfig};
use cfb_db::{PgOutboxSink, PgStore};
use cfb_md::{HttpJsonProvider, Provider, SnapshotProvider};
use cfb_reconcile::{
    sync_category, DisabledSink, EventSink, MergePolicy, ReconcileError, SyncOutcome,
    SyncReport,
};
use cfb_schemas::Category;
use tracing::{error, info};

use super::{load_tracker, table_names};

pub fn build_providers(cfg: &TrackerConfig) -> Vec<Box<dyn Provider>> {
    cfg.providers
        .iter()
        .map(|p| -> Box<dyn Provider> {
            match p {
                ProviderConfig::Snapshot { tag, path } => {
                    Box::new(SnapshotProvider::new(tag.clone(), path))
                }
                ProviderConfig::Http { tag, base_url } => {
                    Box::new(HttpJsonProvider::new(tag.clone(), base_url.clone()))
                }
            }
        })
        .collect()
}

fn parse_categories(category: Option<&str>) -> Result<Vec<Category>> {
    match category {
        None => Ok(Category::ALL.to_vec()),
        Some(raw) => match Category::parse(raw) {
            Some(c) => Ok(vec![c]),
            None => bail!("invalid --category '{raw}'. expected one of: recruits | portal"),
        },
    }
}

fn print_report(report: &SyncReport) {
    let failed_tags: Vec<&str> = report
        .provider_failures
        .iter()
        .map(|f| f.tag.as_str())
        .collect();

    match report.outcome {
        SyncOutcome::Skipped => println!(
            "category={} outcome=skipped fetched={} merged={} rejected={} provider_failures={:?}",
            report.category, report.fetched, report.merged, report.rejected, failed_tags
        ),
        SyncOutcome::Reconciled(res) => println!(
            "category={} outcome=reconciled fetched={} merged={} rejected={} provider_failures={:?} \
             upserted={} deleted={} events_emitted={} events_failed={}",
            report.category,
            report.fetched,
            report.merged,
            report.rejected,
            failed_tags,
            res.upserted,
            res.deleted,
            res.events_emitted,
            res.events_failed
        ),
    }
}

pub async fn run_sync(config_paths: Vec<String>, category: Option<String>) -> Result<()> {
    let categories = parse_categories(category.as_deref())?;
    let (loaded, cfg) = load_tracker(&config_paths)?;

    let providers = build_providers(&cfg);
    if providers.is_empty() {
        bail!("no providers configured; add at least one entry under `providers`");
    }

    let secrets = cfb_config::resolve_secrets(&cfg);
    let pool = cfb_db::connect(secrets.require_database_url()?).await?;
    let store = PgStore::new(pool.clone(), table_names(&cfg)?);

    let outbox;
    let sink: &dyn EventSink = if cfg.events.enabled {
        outbox = PgOutboxSink::new(pool, cfg.team.clone());
        &outbox
    } else {
        &DisabledSink
    };
    let policy = MergePolicy::new(cfg.merge.authoritative_source.clone());

    info!(
        config_hash = %loaded.config_hash,
        team = %cfg.team,
        providers = providers.len(),
        events_enabled = cfg.events.enabled,
        "sync starting"
    );

    let run = |c: Category| sync_category(c, &providers, &policy, &store, sink);

    let results: Vec<Result<SyncReport, ReconcileError>> = match categories.as_slice() {
        [a, b] => {
            let (ra, rb) = tokio::join!(run(*a), run(*b));
            vec![ra, rb]
        }
        _ => {
            let mut out = Vec::with_capacity(categories.len());
            for c in &categories {
                out.push(run(*c).await);
            }
            out
        }
    };

    println!("config_hash={}", loaded.config_hash);
    let mut failed = 0usize;
    for res in &results {
        match res {
            Ok(report) => print_report(report),
            Err(e) => {
                failed += 1;
                error!(error = %e, "sync pass failed");
                println!("sync_error={e}");
            }
        }
    }

    if failed > 0 {
        bail!("sync did not complete cleanly: {failed} category pass(es) failed");
    }
    Ok(())
}
