//! Runtime configuration.
//!
//! 読み込み順: デフォルト値 → 環境変数（`HERALD__SIGNED_URL_TTL_SECS` など）。

use std::time::Duration;

use config::{Config, ConfigBuilder, ConfigError, Environment, builder::DefaultState};
use serde::Deserialize;

use crate::impls::MAX_SIGNED_URL_TTL;

#[derive(Debug, Clone, Deserialize)]
pub struct FeedConfig {
    pub app_env: String,
    pub log_level: String,
    pub signer_base_url: String,
    pub signed_url_ttl_secs: u64,
}

impl FeedConfig {
    /// Builder with every default set and no sources added.
    pub fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        Config::builder()
            .set_default("app_env", "development")?
            .set_default("log_level", "info")?
            .set_default("signer_base_url", "http://127.0.0.1:4443/storage")?
            .set_default("signed_url_ttl_secs", 900)
    }

    pub fn load() -> Result<Self, ConfigError> {
        Self::defaults()?
            .add_source(
                Environment::with_prefix("HERALD")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    pub fn is_production(&self) -> bool {
        self.app_env.eq_ignore_ascii_case("production")
    }

    /// Configured TTL, capped at one hour.
    pub fn signed_url_ttl(&self) -> Duration {
        Duration::from_secs(self.signed_url_ttl_secs).min(MAX_SIGNED_URL_TTL)
    }
}
