//! Loader for bot configuration with YAML + environment overlays.
//!
//! A `reclip.yaml` file is merged with `RECLIP_`-prefixed environment
//! variables, `${VAR}` placeholders are expanded recursively, and the result
//! is materialised into strongly typed structs. Missing credentials are a
//! load error, which the binary treats as fatal at startup.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use serde_json::Value;
use std::path::Path;

const MAXIMUM_ENV_EXPANSION_DEPTH: usize = 8;

#[derive(Debug, Deserialize)]
pub struct ReclipConfig {
    pub social: SocialConfig,
    /// Required when the sink is `cloud`; the local sink needs no remote
    /// credentials.
    #[serde(default)]
    pub storage: Option<StorageConfig>,
    #[serde(default)]
    pub poll: PollConfig,
    #[serde(default)]
    pub retention: RetentionConfig,
    #[serde(default)]
    pub pacing: PacingConfig,
    #[serde(default)]
    pub sink: SinkConfig,
    #[serde(default)]
    pub shortener: Option<ShortenerConfig>,
}

#[derive(Debug, Deserialize)]
pub struct SocialConfig {
    #[serde(default = "default_social_api_base")]
    pub api_base: String,
    pub bearer_token: String,
}

#[derive(Debug, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_storage_api_base")]
    pub api_base: String,
    #[serde(default = "default_storage_content_base")]
    pub content_base: String,
    pub access_token: String,
    /// Remote folder uploads land in and the sweeper evicts from.
    #[serde(default = "default_storage_folder")]
    pub folder: String,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct PollConfig {
    /// Seconds between polling cycles.
    pub interval_secs: u64,
    /// Mentions fetched per cycle.
    pub batch_size: u32,
    /// Mentions older than this are skipped. Deployments that only want to
    /// serve near-real-time requests run this as low as 20.
    pub max_mention_age_secs: u64,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_secs: 10,
            batch_size: 10,
            max_mention_age_secs: 100_000,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct RetentionConfig {
    /// Files older than this are evicted by the sweeper.
    pub window_mins: i64,
    /// IANA zone every storage timestamp is converted into before the age
    /// comparison.
    pub reference_zone: String,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            window_mins: 60,
            reference_zone: "America/Argentina/Buenos_Aires".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct PacingConfig {
    /// Pause after each mention fetch, before processing the batch.
    pub after_fetch_ms: u64,
    /// Pause between consecutive write actions (reply, favorite).
    pub between_actions_ms: u64,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            after_fetch_ms: 2000,
            between_actions_ms: 1000,
        }
    }
}

/// Where re-hosted media ends up.
#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SinkConfig {
    /// Upload to cloud storage and reply with temporary links.
    Cloud,
    /// Save under a local directory; the file path stands in for the link.
    Local { path: String },
}

impl Default for SinkConfig {
    fn default() -> Self {
        SinkConfig::Cloud
    }
}

#[derive(Debug, Deserialize)]
pub struct ShortenerConfig {
    /// TinyURL-style endpoint answering `GET {endpoint}?url=...` with bare
    /// text.
    pub endpoint: String,
}

fn default_social_api_base() -> String {
    "https://api.twitter.com".into()
}
fn default_storage_api_base() -> String {
    "https://api.dropboxapi.com".into()
}
fn default_storage_content_base() -> String {
    "https://content.dropboxapi.com".into()
}
fn default_storage_folder() -> String {
    "/destination".into()
}

impl ReclipConfig {
    /// Cross-field checks the type system cannot express.
    fn validate(self) -> Result<Self, ConfigError> {
        if matches!(self.sink, SinkConfig::Cloud) && self.storage.is_none() {
            return Err(ConfigError::Message(
                "sink kind is 'cloud' but no [storage] credentials were provided".into(),
            ));
        }
        if self
            .retention
            .reference_zone
            .parse::<chrono_tz::Tz>()
            .is_err()
        {
            return Err(ConfigError::Message(format!(
                "unknown retention.reference_zone: {}",
                self.retention.reference_zone
            )));
        }
        Ok(self)
    }
}

fn expand_env_in_value(v: &mut Value) {
    match v {
        Value::String(s) => {
            if s.contains('$') {
                let mut cur = std::mem::take(s);
                for _ in 0..MAXIMUM_ENV_EXPANSION_DEPTH {
                    let expanded = match shellexpand::env(&cur) {
                        Ok(cow) => cow.into_owned(),
                        Err(_) => cur.clone(),
                    };
                    if expanded == cur {
                        break;
                    }
                    cur = expanded;
                }
                *s = cur;
            }
        }
        Value::Array(arr) => arr.iter_mut().for_each(expand_env_in_value),
        Value::Object(obj) => obj.values_mut().for_each(expand_env_in_value),
        _ => {}
    }
}

/// Builder hiding the `config` crate wiring (YAML + env overrides).
pub struct ReclipConfigLoader {
    builder: config::ConfigBuilder<config::builder::DefaultState>,
}

impl Default for ReclipConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ReclipConfigLoader {
    /// Start with the defaults: `RECLIP_` env overrides on top of whatever
    /// files get attached.
    pub fn new() -> Self {
        let builder =
            Config::builder().add_source(Environment::with_prefix("RECLIP").separator("__"));
        Self { builder }
    }

    /// Attach a YAML/TOML/JSON file; the `config` crate infers format by
    /// suffix.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self.builder.add_source(File::from(path.as_ref()).required(true));
        self
    }

    /// Merge an inline YAML snippet (tests, CLI overrides).
    pub fn with_yaml_str(mut self, yaml: &str) -> Self {
        self.builder = self
            .builder
            .add_source(File::from_str(yaml, config::FileFormat::Yaml));
        self
    }

    /// Consume the builder and deserialize the merged sources.
    pub fn load(self) -> Result<ReclipConfig, ConfigError> {
        let cfg = self.builder.build()?;

        // Go through serde_json::Value so ${VAR} placeholders can be
        // expanded before the typed deserialize.
        let mut v: Value = cfg.try_deserialize()?;
        expand_env_in_value(&mut v);

        let typed: ReclipConfig =
            serde_json::from_value(v).map_err(|e| ConfigError::Message(e.to_string()))?;
        typed.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn expands_plain_placeholders() {
        temp_env::with_var("RECLIP_TEST_TOKEN", Some("tok-123"), || {
            let mut v = json!({"social": {"bearer_token": "${RECLIP_TEST_TOKEN}"}});
            expand_env_in_value(&mut v);
            assert_eq!(v["social"]["bearer_token"], json!("tok-123"));
        });
    }

    #[test]
    fn expands_through_nested_env_values() {
        temp_env::with_vars(
            [
                ("RECLIP_TEST_INNER", Some("deep")),
                ("RECLIP_TEST_OUTER", Some("x-${RECLIP_TEST_INNER}")),
            ],
            || {
                let mut v = json!("${RECLIP_TEST_OUTER}-y");
                expand_env_in_value(&mut v);
                assert_eq!(v, json!("x-deep-y"));
            },
        );
    }

    #[test]
    fn expansion_terminates_on_cycles() {
        temp_env::with_vars(
            [
                ("RECLIP_TEST_A", Some("${RECLIP_TEST_B}")),
                ("RECLIP_TEST_B", Some("${RECLIP_TEST_A}")),
            ],
            || {
                let mut v = json!("v=${RECLIP_TEST_A}");
                expand_env_in_value(&mut v);
                // The depth cap stops the ping-pong; the unresolved
                // placeholder is left in place.
                assert!(v.as_str().unwrap().contains("${"));
            },
        );
    }

    #[test]
    fn unknown_vars_are_left_as_is() {
        let mut v = json!("hi-${RECLIP_TEST_DOES_NOT_EXIST}");
        expand_env_in_value(&mut v);
        assert_eq!(v, json!("hi-${RECLIP_TEST_DOES_NOT_EXIST}"));
    }
}
