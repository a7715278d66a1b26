use crate::Error;
use serde::Deserialize;
use shardwise_core::{
    config::EngineConfig,
    engine::ShardingEngine,
    rule::{ShardingRule, ShardingRuleConfig},
};
use std::{fs, path::Path};
use tracing::debug;

///
/// ShardwiseConfig
///
/// Top-level TOML document: a `[rule]` table and an optional `[engine]`
/// table.
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ShardwiseConfig {
    pub rule: ShardingRuleConfig,
    pub engine: EngineConfig,
}

impl ShardwiseConfig {
    pub fn from_toml_str(source: &str) -> Result<Self, Error> {
        Ok(toml::from_str(source)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        debug!(path = %path.display(), "loading shardwise configuration");

        Self::from_toml_str(&fs::read_to_string(path)?)
    }

    /// Validate and resolve the rule set.
    pub fn build_rule(&self) -> Result<ShardingRule, Error> {
        Ok(ShardingRule::from_config(&self.rule)?)
    }

    pub fn build_engine(&self) -> Result<ShardingEngine, Error> {
        Ok(ShardingEngine::new(self.build_rule()?, self.engine.clone()))
    }
}
