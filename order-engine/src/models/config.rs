use crate::book::BookKind;
use crate::io::Args;
use crate::risk_guard::RiskLimits;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

fn default_shards() -> usize {
    1
}

/// Engine configuration, merged from (lowest to highest precedence) builtin
/// defaults, an optional config file, `OMS_`-prefixed environment variables,
/// and command-line flags.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OmsConfig {
    #[serde(default)]
    pub risk: RiskLimits,
    /// Symbol-sharded worker count.
    #[serde(default = "default_shards")]
    pub shards: usize,
    /// Which book implementation to run.
    #[serde(default)]
    pub book: BookKind,
    /// Where to append the JSONL event log. Events go to the process log
    /// when unset.
    #[serde(default)]
    pub event_log: Option<PathBuf>,
}

impl Default for OmsConfig {
    fn default() -> Self {
        Self {
            risk: RiskLimits::default(),
            shards: default_shards(),
            book: BookKind::default(),
            event_log: None,
        }
    }
}

impl OmsConfig {
    pub fn load(path: Option<&Path>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path));
        }
        builder = builder.add_source(config::Environment::with_prefix("OMS").separator("__"));
        builder.build()?.try_deserialize()
    }

    /// Command-line flags win over file and environment values.
    pub fn apply_args(&mut self, args: &Args) {
        if let Some(shards) = args.shards {
            self.shards = shards;
        }
        if let Some(book) = args.book {
            self.book = book;
        }
        if let Some(max) = args.max_order_size {
            self.risk.max_order_size = max;
        }
        if let Some(max) = args.max_position {
            self.risk.max_position = max;
        }
        if let Some(path) = &args.event_log {
            self.event_log = Some(path.clone());
        }
    }
}
