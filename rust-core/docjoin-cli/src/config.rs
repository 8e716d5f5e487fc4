// SPDX-License-Identifier: PMPL-1.0-or-later
//! CLI configuration.
//!
//! Sources, lowest precedence first: built-in defaults, the `--config`
//! JSON file, `DOCJOIN_MAX_DEPTH`, command-line flags.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context};
use docjoin_query::ParserConfig;
use serde::{Deserialize, Serialize};

/// Environment variable overriding [`CliConfig::max_depth`].
pub const MAX_DEPTH_ENV: &str = "DOCJOIN_MAX_DEPTH";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Deepest filter nesting accepted before compiling.
    pub max_depth: usize,
    pub parser: ParserConfig,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            max_depth: 32,
            parser: ParserConfig::default(),
        }
    }
}

impl CliConfig {
    /// Load from a JSON file, or the defaults when no file is given.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    /// Apply the value of [`MAX_DEPTH_ENV`], if set.
    pub fn apply_env(&mut self, max_depth: Option<String>) -> anyhow::Result<()> {
        if let Some(raw) = max_depth {
            self.max_depth = raw
                .trim()
                .parse()
                .with_context(|| format!("{MAX_DEPTH_ENV}={raw} is not a depth"))?;
        }
        Ok(())
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.max_depth == 0 {
            bail!("max_depth must be at least 1");
        }
        self.parser.validate()?;
        Ok(())
    }
}
