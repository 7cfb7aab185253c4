use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use toml::Value;

use crate::error::{Error, Result};
use crate::session::Session;

const DEFAULT_BASE_URL: &str = "http://localhost:9499";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_PAGE_SIZE: u32 = 5;

fn default_base_url() -> String {
    DEFAULT_BASE_URL.into()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    pub base_url_env: Option<String>,
    // Prefix for image filenames; defaults to `<base_url>/`.
    pub resource_base: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            base_url_env: None,
            resource_base: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl ApiConfig {
    pub fn resolved_base_url(&self) -> String {
        env_override(self.base_url_env.as_deref())
            .unwrap_or_else(|| self.base_url.clone())
            .trim_end_matches('/')
            .to_string()
    }

    pub fn resolved_resource_base(&self) -> String {
        match self.resource_base.as_deref().map(str::trim) {
            Some(base) if !base.is_empty() => base.to_string(),
            _ => format!("{}/", self.resolved_base_url()),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    // Kept as strings: the values come from cookies in the browser client and
    // may be garbage.
    pub user_id: Option<String>,
    pub user_id_env: Option<String>,
    pub act_as: Option<String>,
    pub act_as_env: Option<String>,
    pub token: Option<String>,
    pub token_env: Option<String>,
}

impl SessionConfig {
    pub fn session(&self) -> Session {
        let user_id = env_override(self.user_id_env.as_deref()).or_else(|| self.user_id.clone());
        let act_as = env_override(self.act_as_env.as_deref()).or_else(|| self.act_as.clone());
        Session::from_raw(user_id.as_deref(), act_as.as_deref())
    }

    pub fn token(&self) -> Option<String> {
        env_override(self.token_env.as_deref())
            .or_else(|| self.token.clone())
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
    }
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(default)]
pub struct CarouselConfig {
    // None shows every image at once.
    pub num_visible: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// Per-field override of a built-in validation rule. Unset keys keep the
/// built-in value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RuleOverride {
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub regex: Option<String>,
    pub regex_message: Option<String>,
    pub length_message: Option<String>,
}

pub type FormOverrides = BTreeMap<String, RuleOverride>;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StorefrontConfig {
    pub api: ApiConfig,
    pub session: SessionConfig,
    pub carousel: CarouselConfig,
    pub search: SearchConfig,
    pub validation: BTreeMap<String, FormOverrides>,
}

impl StorefrontConfig {
    pub fn from_doc(doc: &ConfigDoc) -> Result<Self> {
        let owned = doc.value.clone();
        owned.try_into().map_err(|e| {
            Error::msg(format!(
                "failed to deserialize config {}: {e}",
                doc.path.display()
            ))
        })
    }

    pub fn validation_overrides(&self, form: &str) -> Option<&FormOverrides> {
        self.validation.get(form)
    }
}

#[derive(Debug, Clone)]
pub struct ConfigDoc {
    pub path: PathBuf,
    pub value: Value,
}

impl ConfigDoc {
    pub fn value_path(&self, path: &str) -> Option<&Value> {
        let path = path.trim();
        if path.is_empty() {
            return Some(&self.value);
        }
        path.split('.')
            .try_fold(&self.value, |cur, seg| cur.as_table()?.get(seg))
    }

    pub fn deserialize_path<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>> {
        let Some(v) = self.value_path(path) else {
            return Ok(None);
        };
        let parsed = v
            .clone()
            .try_into()
            .map_err(|e| Error::msg(format!("failed to deserialize config at '{path}': {e}")))?;
        Ok(Some(parsed))
    }
}

fn env_override(var: Option<&str>) -> Option<String> {
    let var = var?.trim();
    if var.is_empty() {
        return None;
    }
    std::env::var(var)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Deep-merge `overlay` into `base`; tables merge key by key, every other
/// value is replaced.
pub fn merge(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Table(base_tbl), Value::Table(overlay_tbl)) => {
            for (k, v) in overlay_tbl {
                match base_tbl.get_mut(&k) {
                    Some(existing) => merge(existing, v),
                    None => {
                        base_tbl.insert(k, v);
                    }
                }
            }
        }
        (slot, v) => *slot = v,
    }
}

fn resolve_parent_path(from_file: &Path, reference: &str) -> PathBuf {
    let p = PathBuf::from(reference);
    if p.is_absolute() {
        p
    } else {
        from_file.parent().unwrap_or_else(|| Path::new(".")).join(p)
    }
}

fn load_value_inner(path: &Path, stack: &mut HashSet<PathBuf>) -> Result<Value> {
    let canonical = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
    if !stack.insert(canonical.clone()) {
        return Err(Error::msg(format!(
            "config extends cycle detected at {}",
            canonical.display()
        )));
    }

    let data = fs::read_to_string(path)
        .map_err(|e| Error::msg(format!("failed to read config {}: {e}", path.display())))?;
    let mut value: Value = toml::from_str(&data)
        .map_err(|e| Error::msg(format!("TOML parse error in {}: {e}", path.display())))?;

    let mut out = Value::Table(Default::default());
    let parent = value
        .as_table_mut()
        .and_then(|tbl| tbl.remove("extends"));
    match parent {
        Some(Value::String(parent)) => {
            out = load_value_inner(&resolve_parent_path(path, parent.trim()), stack)?;
        }
        Some(_) => {
            return Err(Error::msg(format!(
                "invalid extends in {} (expected string)",
                path.display()
            )));
        }
        None => {}
    }
    merge(&mut out, value);

    stack.remove(&canonical);
    Ok(out)
}

pub fn load(path: &Path) -> Result<ConfigDoc> {
    let mut stack = HashSet::<PathBuf>::new();
    let value = load_value_inner(path, &mut stack)?;
    Ok(ConfigDoc {
        path: path.to_path_buf(),
        value,
    })
}

/// Load `path` when it exists, otherwise fall back to built-in defaults.
pub fn load_or_default(path: &Path) -> Result<StorefrontConfig> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "no config file, using defaults");
        return Ok(StorefrontConfig::default());
    }
    let doc = load(path)?;
    StorefrontConfig::from_doc(&doc)
}
