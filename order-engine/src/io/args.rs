use crate::book::BookKind;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Config file (TOML); flags below override its values
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Wire input file, one tag=value message per line.
    /// Without it the binary replays a built-in demo session.
    #[arg(long)]
    pub input: Option<PathBuf>,

    /// Append-only JSONL event log to write
    #[arg(long)]
    pub event_log: Option<PathBuf>,

    /// Worker shards; each symbol is pinned to one
    #[arg(long)]
    pub shards: Option<usize>,

    /// Book implementation backing each shard
    #[arg(long, value_enum)]
    pub book: Option<BookKind>,

    /// Largest single order quantity the risk guard admits
    #[arg(long)]
    pub max_order_size: Option<u64>,

    /// Largest absolute net position per symbol
    #[arg(long)]
    pub max_position: Option<u64>,
}
