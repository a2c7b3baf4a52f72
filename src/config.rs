use crate::errors::MyResult;
use config::Config;
use doku::Document;
use serde::Deserialize;
use smart_default::SmartDefault;

#[derive(Debug, Deserialize, PartialEq, Eq, Clone, Document, SmartDefault)]
#[serde(default)]
#[serde(deny_unknown_fields)]
pub struct MemeFactoryConfig {
    /// Where and how to reach the MemeFactory API
    pub api: MemeFactoryConfigApi,
    /// Persistence of the login token
    pub session: MemeFactoryConfigSession,
    pub feed: MemeFactoryConfigFeed,
}

impl MemeFactoryConfig {
    pub fn read() -> MyResult<Self> {
        let config = Config::builder()
            .add_source(config::File::with_name("config.toml").required(false))
            // Cant use _ as separator due to https://github.com/mehcode/config-rs/issues/391
            .add_source(config::Environment::with_prefix("MEMEFACTORY").separator("__"))
            .build()?;

        Ok(config.try_deserialize()?)
    }
}

#[derive(Debug, Deserialize, PartialEq, Eq, Clone, Document, SmartDefault)]
#[serde(default)]
#[serde(deny_unknown_fields)]
pub struct MemeFactoryConfigApi {
    /// Base url which relative API paths are joined to
    #[default("http://localhost:5000")]
    #[doku(example = "https://api.memefactory.example")]
    pub base_url: String,
    /// Timeout for a single HTTP request, in seconds
    #[default(30)]
    #[doku(example = "30")]
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, PartialEq, Eq, Clone, Document, SmartDefault)]
#[serde(default)]
#[serde(deny_unknown_fields)]
pub struct MemeFactoryConfigSession {
    /// File which holds the bearer token between runs
    #[default("memefactory_token.json")]
    #[doku(example = "memefactory_token.json")]
    pub token_path: String,
}

#[derive(Debug, Deserialize, PartialEq, Eq, Clone, Document, SmartDefault)]
#[serde(default)]
#[serde(deny_unknown_fields)]
pub struct MemeFactoryConfigFeed {
    /// Fetch each distinct author only once per page, instead of once per item
    #[default(false)]
    #[doku(example = "false")]
    pub deduplicate_authors: bool,
}
