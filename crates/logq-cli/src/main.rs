//! logq CLI: stream JSONL records through the sort pipe.

use std::collections::HashSet;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde_json::Value;

use logq_core::block::{Block, Column};
use logq_core::cancel::CancelToken;
use logq_core::config::PipelineConfig;
use logq_lang::parse_sort_clause;
use logq_operators::{PipeProcessor, SortPipe, SortPipeProcessor};

#[derive(Parser)]
#[command(name = "logq")]
#[command(about = "Columnar log sorting pipeline", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sort JSONL records with a sort clause
    Sort {
        /// The sort clause, e.g. 'sort by (level desc, _time)'
        #[arg(short, long)]
        query: String,

        /// Input file with one JSON object per line (defaults to stdin)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Pipeline memory allowance in bytes (overrides config)
        #[arg(long)]
        memory: Option<usize>,

        /// Rows per ingest block
        #[arg(long, default_value_t = 1024)]
        batch_rows: usize,
    },

    /// Parse a sort clause and print its canonical form
    Check {
        #[arg(short, long)]
        query: String,
    },
}

fn main() {
    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Sort {
            query,
            input,
            memory,
            batch_rows,
        } => run_sort(&query, input, memory, batch_rows.max(1)),
        Commands::Check { query } => run_check(&query),
    };
    if let Err(msg) = result {
        eprintln!("error: {msg}");
        std::process::exit(1);
    }
}

fn run_check(query: &str) -> Result<(), String> {
    let cfg = parse_sort_clause(query).map_err(|e| format!("cannot parse {query:?}: {e}"))?;
    println!("{cfg}");
    Ok(())
}

fn run_sort(
    query: &str,
    input: Option<PathBuf>,
    memory: Option<usize>,
    batch_rows: usize,
) -> Result<(), String> {
    let pipeline_cfg = PipelineConfig::from_env();
    let allowed = memory.unwrap_or(pipeline_cfg.allowed_memory_bytes);
    let workers = pipeline_cfg.worker_threads.max(1);

    let sort_cfg = parse_sort_clause(query).map_err(|e| format!("cannot parse {query:?}: {e}"))?;
    let downstream: Arc<dyn PipeProcessor> = Arc::new(JsonLineWriter);
    let processor =
        SortPipe::new(sort_cfg).into_processor(workers, allowed, CancelToken::new(), downstream);

    let reader: Box<dyn BufRead> = match input {
        Some(path) => Box::new(BufReader::new(
            File::open(&path).map_err(|e| format!("cannot open {}: {e}", path.display()))?,
        )),
        None => Box::new(BufReader::new(io::stdin())),
    };

    let mut rows: Vec<serde_json::Map<String, Value>> = Vec::new();
    let mut next_worker = 0;
    for line in reader.lines() {
        let line = line.map_err(|e| format!("read error: {e}"))?;
        if line.trim().is_empty() {
            continue;
        }
        let record: serde_json::Map<String, Value> =
            serde_json::from_str(&line).map_err(|e| format!("bad record {line:?}: {e}"))?;
        rows.push(record);

        if rows.len() >= batch_rows {
            write_batch(&processor, next_worker, &mut rows)?;
            next_worker = (next_worker + 1) % workers;
        }
    }
    if !rows.is_empty() {
        write_batch(&processor, next_worker, &mut rows)?;
    }

    processor.flush().map_err(|e| e.to_string())
}

/// Turn buffered records into one ingest block and feed it to `worker`.
fn write_batch(
    processor: &SortPipeProcessor,
    worker: usize,
    rows: &mut Vec<serde_json::Map<String, Value>>,
) -> Result<(), String> {
    let mut names: Vec<&str> = Vec::new();
    let mut seen: HashSet<&str> = HashSet::new();
    for record in rows.iter() {
        for name in record.keys() {
            if seen.insert(name.as_str()) {
                names.push(name.as_str());
            }
        }
    }

    let columns: Vec<Column> = names
        .iter()
        .map(|name| {
            let cells = rows.iter().map(|r| cell_string(r.get(*name))).collect();
            Column::plain(name.to_string(), cells)
        })
        .collect();

    let timestamps = vec![0i64; rows.len()];
    let block = Block::new(timestamps, columns).map_err(|e| e.to_string())?;
    processor.write_block(worker, &block);
    rows.clear();
    Ok(())
}

fn cell_string(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Downstream stage that prints every output row as one JSON line.
struct JsonLineWriter;

impl PipeProcessor for JsonLineWriter {
    fn write_block(&self, _worker_id: usize, block: &Block) {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        let mut line = String::new();
        for row in 0..block.row_count() {
            line.clear();
            line.push('{');
            for (i, column) in block.columns().iter().enumerate() {
                if i > 0 {
                    line.push(',');
                }
                append_json_str(&mut line, &column.name);
                line.push(':');
                append_json_str(&mut line, block.value_at(i, row));
            }
            line.push('}');
            if writeln!(out, "{line}").is_err() {
                // Downstream is gone (closed pipe); nothing useful to do.
                return;
            }
        }
    }

    fn flush(&self) -> logq_operators::traits::Result<()> {
        Ok(())
    }
}

fn append_json_str(dst: &mut String, s: &str) {
    match serde_json::to_string(s) {
        Ok(quoted) => dst.push_str(&quoted),
        Err(_) => dst.push_str("\"\""),
    }
}
