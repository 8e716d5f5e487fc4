// SPDX-License-Identifier: PMPL-1.0-or-later
//! docjoin: compile a JSON record filter into match terms, relationship
//! branches and post-join stages, printed as JSON.
//!
//! ```text
//! docjoin --schema schema.json --list Post --filter filter.json
//! echo '{"title_contains": "rust"}' | docjoin --schema schema.json --list Post
//! ```

mod config;

use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use docjoin_mongo::{MongoAdapter, ObjectIdCodec, UuidIdGenerator};
use docjoin_query::{
    ensure_max_depth, IdGenerator, IdentityCodec, PassthroughCodec, QueryError, QueryPath,
    Schema, SequentialIdGenerator, ShortcutMode,
};
use serde_json::Value;

use config::{CliConfig, MAX_DEPTH_ENV};

/// Compile a docjoin filter.
#[derive(Parser, Debug)]
#[command(name = "docjoin", version, about = "Compile record filters into query pipelines")]
struct Cli {
    /// Schema document: `{"lists": [...]}`.
    #[arg(long)]
    schema: PathBuf,

    /// List the filter applies to.
    #[arg(long)]
    list: String,

    /// Filter document. Read from stdin when omitted.
    #[arg(long)]
    filter: Option<PathBuf>,

    /// JSON configuration file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Maximum filter nesting depth.
    #[arg(long)]
    max_depth: Option<usize>,

    /// Which identity-only relationship filters skip the join.
    #[arg(long, value_enum)]
    shortcuts: Option<ShortcutArg>,

    /// How identity values are encoded.
    #[arg(long, value_enum, default_value = "object-id")]
    ids: IdArg,

    /// Number relationship tokens `rel0`, `rel1`, ... instead of using UUIDs.
    #[arg(long)]
    sequential_tokens: bool,

    /// Print on one line.
    #[arg(long)]
    compact: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ShortcutArg {
    Table,
    Strict,
    Disabled,
}

impl From<ShortcutArg> for ShortcutMode {
    fn from(arg: ShortcutArg) -> Self {
        match arg {
            ShortcutArg::Table => ShortcutMode::Table,
            ShortcutArg::Strict => ShortcutMode::Strict,
            ShortcutArg::Disabled => ShortcutMode::Disabled,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum IdArg {
    /// 24-digit hex strings as `{"$oid": ...}`.
    ObjectId,
    /// Identity values used as written.
    Plain,
}

#[derive(Clone, Copy, Debug)]
struct Codec(IdArg);

impl IdentityCodec for Codec {
    fn encode(&self, raw: &Value, path: &QueryPath) -> Result<Value, QueryError> {
        match self.0 {
            IdArg::ObjectId => ObjectIdCodec.encode(raw, path),
            IdArg::Plain => PassthroughCodec.encode(raw, path),
        }
    }
}

enum Tokens {
    Uuid(UuidIdGenerator),
    Sequential(SequentialIdGenerator),
}

impl IdGenerator for Tokens {
    fn generate(&self, seed: &str) -> String {
        match self {
            Tokens::Uuid(ids) => ids.generate(seed),
            Tokens::Sequential(ids) => ids.generate(seed),
        }
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = CliConfig::load(cli.config.as_deref())?;
    config.apply_env(std::env::var(MAX_DEPTH_ENV).ok())?;
    if let Some(max_depth) = cli.max_depth {
        config.max_depth = max_depth;
    }
    if let Some(mode) = cli.shortcuts {
        config.parser.shortcut_mode = mode.into();
    }
    config.validate()?;

    let schema_text = fs::read_to_string(&cli.schema)
        .with_context(|| format!("reading schema {}", cli.schema.display()))?;
    let schema = Schema::from_json(&schema_text)
        .with_context(|| format!("loading schema {}", cli.schema.display()))?;

    let filter_text = match &cli.filter {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("reading filter {}", path.display()))?,
        None => {
            let mut text = String::new();
            io::stdin()
                .read_to_string(&mut text)
                .context("reading filter from stdin")?;
            text
        }
    };
    let filter: Value = serde_json::from_str(&filter_text).context("filter is not valid JSON")?;
    ensure_max_depth(&filter, config.max_depth)?;

    let tokens = if cli.sequential_tokens {
        Tokens::Sequential(SequentialIdGenerator::default())
    } else {
        Tokens::Uuid(UuidIdGenerator)
    };
    let adapter = MongoAdapter::with_parts(Codec(cli.ids), tokens, &config.parser);
    let parser = adapter.parser(&schema, config.parser.clone())?;

    tracing::info!(list = %cli.list, max_depth = config.max_depth, "Compiling");
    let result = parser
        .compile(&cli.list, &filter)
        .with_context(|| format!("compiling filter for {}", cli.list))?;

    let output = if cli.compact {
        serde_json::to_string(&result)?
    } else {
        serde_json::to_string_pretty(&result)?
    };
    println!("{output}");
    Ok(())
}
