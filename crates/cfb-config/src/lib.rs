use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;
use std::fs;

pub mod secrets;

pub use secrets::{resolve_secrets, ResolvedSecrets};

/// Known secret-like prefixes. If any leaf string value in the effective
/// config starts with one of these, loading aborts with CONFIG_SECRET_DETECTED.
const SECRET_PREFIXES: &[&str] = &[
    "sk-",           // OpenAI style
    "sk_live",       // Stripe live
    "sk_test",       // Stripe test
    "AKIA",          // AWS access key ID
    "-----BEGIN",    // PEM private keys
    "ghp_",          // GitHub PAT
    "gho_",          // GitHub OAuth
    "glpat-",        // GitLab PAT
    "xoxb-",         // Slack bot token
    "xoxp-",         // Slack user token
    "postgres://",   // connection strings carry credentials
    "postgresql://",
    "redis://",
    "rediss://",
];

pub const DEFAULT_DATABASE_URL_ENV: &str = "CFB_DATABASE_URL";
pub const DEFAULT_AUTHORITATIVE_SOURCE: &str = "247";

#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config_hash: String,
    pub canonical_json: String,
    pub config_json: Value,
}

impl LoadedConfig {
    /// Deserialize the merged document into the typed tracker config.
    /// Unknown keys are rejected.
    pub fn tracker(&self) -> Result<TrackerConfig> {
        let cfg: TrackerConfig = serde_json::from_value(self.config_json.clone())
            .context("CONFIG_INVALID: config does not match tracker schema")?;
        cfg.validate()?;
        Ok(cfg)
    }
}

pub fn load_layered_yaml(paths: &[&str]) -> Result<LoadedConfig> {
    let mut docs: Vec<String> = Vec::new();
    for p in paths {
        let raw =
            fs::read_to_string(p).with_context(|| format!("failed to read yaml path: {p}"))?;
        docs.push(raw);
    }

    let doc_refs: Vec<&str> = docs.iter().map(|s| s.as_str()).collect();
    load_layered_yaml_from_strings(&doc_refs)
}

/// Merge YAML docs in order: earlier docs are base, later docs override.
pub fn load_layered_yaml_from_strings(yaml_docs: &[&str]) -> Result<LoadedConfig> {
    let mut merged = serde_json::json!({});
    for raw in yaml_docs {
        let v_yaml: serde_yaml::Value = serde_yaml::from_str(raw).context("invalid yaml")?;
        // An empty document parses as null; treat it as an empty layer.
        if v_yaml.is_null() {
            continue;
        }
        let v_json = serde_json::to_value(v_yaml).context("yaml->json conversion failed")?;
        merged = deep_merge(merged, v_json);
    }

    enforce_no_secret_literals(&merged)?;

    let canonical_json = canonicalize_json(&merged)?;
    let config_hash = sha256_hex(canonical_json.as_bytes());
    Ok(LoadedConfig {
        config_hash,
        canonical_json,
        config_json: merged,
    })
}

/// Objects merge key by key; anything else (arrays included) is replaced.
fn deep_merge(a: Value, b: Value) -> Value {
    match (a, b) {
        (Value::Object(mut a_map), Value::Object(b_map)) => {
            for (k, b_val) in b_map {
                let a_val = a_map.remove(&k).unwrap_or(Value::Null);
                a_map.insert(k, deep_merge(a_val, b_val));
            }
            Value::Object(a_map)
        }
        (_, b_other) => b_other,
    }
}

fn canonicalize_json(v: &Value) -> Result<String> {
    // serde_json's default Map is ordered by key, so compact output is canonical.
    let s = serde_json::to_string(v).context("canonical json serialize failed")?;
    Ok(s)
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let out = hasher.finalize();
    hex::encode(out)
}

fn enforce_no_secret_literals(v: &Value) -> Result<()> {
    let mut leaves = Vec::new();
    collect_leaf_pointers(v, "", &mut leaves);

    for ptr in leaves {
        if let Some(val) = v.pointer(&ptr) {
            if let Some(s) = val.as_str() {
                if looks_like_secret(s) {
                    bail!("CONFIG_SECRET_DETECTED leaf={} value=REDACTED", ptr);
                }
            }
        }
    }
    Ok(())
}

fn looks_like_secret(s: &str) -> bool {
    let t = s.trim();
    if t.len() < 8 {
        return false;
    }
    SECRET_PREFIXES.iter().any(|p| t.starts_with(p))
}

fn collect_leaf_pointers(v: &Value, prefix: &str, out: &mut Vec<String>) {
    match v {
        Value::Object(map) => {
            for (k, vv) in map.iter() {
                let next = format!("{}/{}", prefix, escape_pointer_token(k));
                collect_leaf_pointers(vv, &next, out);
            }
        }
        Value::Array(arr) => {
            for (i, vv) in arr.iter().enumerate() {
                let next = format!("{}/{}", prefix, i);
                collect_leaf_pointers(vv, &next, out);
            }
        }
        _ => {
            let p = if prefix.is_empty() {
                "/".to_string()
            } else {
                prefix.to_string()
            };
            out.push(p);
        }
    }
}

fn escape_pointer_token(s: &str) -> String {
    s.replace('~', "~0").replace('/', "~1")
}

// ---------------------------------------------------------------------------
// Typed config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TrackerConfig {
    /// Team slug stamped onto every queued event.
    pub team: String,
    #[serde(default)]
    pub season: Option<u16>,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub merge: MergeConfig,
    #[serde(default)]
    pub events: EventsConfig,
    #[serde(default)]
    pub providers: Vec<ProviderConfig>,
}

impl TrackerConfig {
    fn validate(&self) -> Result<()> {
        if self.team.trim().is_empty() {
            bail!("CONFIG_INVALID: team must not be empty");
        }

        let mut tags = BTreeSet::new();
        for p in &self.providers {
            let tag = p.tag();
            if tag.trim().is_empty() {
                bail!("CONFIG_INVALID: provider tag must not be empty");
            }
            if tag.contains(',') {
                bail!("CONFIG_INVALID: provider tag '{tag}' must not contain ','");
            }
            if !tags.insert(tag) {
                bail!("CONFIG_INVALID: duplicate provider tag '{tag}'");
            }
        }

        if self.merge.authoritative_source.trim().is_empty() {
            bail!("CONFIG_INVALID: merge.authoritative_source must not be empty");
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Name of the env var holding the Postgres URL (never the URL itself).
    #[serde(default = "default_database_url_env")]
    pub database_url_env: String,
    #[serde(default = "default_recruits_table")]
    pub recruits_table: String,
    #[serde(default = "default_portal_table")]
    pub portal_table: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_url_env: default_database_url_env(),
            recruits_table: default_recruits_table(),
            portal_table: default_portal_table(),
        }
    }
}

fn default_database_url_env() -> String {
    DEFAULT_DATABASE_URL_ENV.to_string()
}

fn default_recruits_table() -> String {
    "recruits".to_string()
}

fn default_portal_table() -> String {
    "portal".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MergeConfig {
    #[serde(default = "default_authoritative_source")]
    pub authoritative_source: String,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            authoritative_source: default_authoritative_source(),
        }
    }
}

fn default_authoritative_source() -> String {
    DEFAULT_AUTHORITATIVE_SOURCE.to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EventsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

fn default_true() -> bool {
    true
}

/// One configured provider. Tags are quoted in YAML (`tag: "247"`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case", deny_unknown_fields)]
pub enum ProviderConfig {
    /// Reads `<path>/<category>.json`.
    Snapshot { tag: String, path: String },
    /// GETs `<base_url>/<category>`.
    Http { tag: String, base_url: String },
}

impl ProviderConfig {
    pub fn tag(&self) -> &str {
        match self {
            ProviderConfig::Snapshot { tag, .. } | ProviderConfig::Http { tag, .. } => tag,
        }
    }
}
