//! anneal-normalize: Reshape JSON records to match a prototype
//!
//! Usage:
//!   # Normalize a single record or an array of records
//!   anneal-normalize --prototype proto.json data.json
//!
//!   # Normalize every page of an NDJSON dump, taking records from `data.items`
//!   anneal-normalize -p proto.json --ndjson --records-field data.items pages.jsonl
//!
//!   # Lenient coercion ("123" -> 123) and verbatim `payload` subtrees
//!   anneal-normalize -p proto.json --lenient --pass-through payload data.json

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use anneal::input::read_json_file;
use anneal::{process_json, NormalizeOptions, Normalizer, Pipeline, Prototype, RowWriter};
use anyhow::{Context, Result};
use clap::Parser;
use std::fs::File;
use std::io::{BufReader, Read};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "anneal-normalize")]
#[command(about = "Reshape JSON records to match a prototype", long_about = None)]
struct Args {
    /// Input file (use stdin if omitted)
    #[arg(value_name = "FILE")]
    input: Option<String>,

    /// Prototype: an example record with the desired shape and leaf types
    #[arg(long, short = 'p')]
    prototype: String,

    /// Process newline-delimited JSON (one page per line)
    #[arg(long)]
    ndjson: bool,

    /// Dotted path of the records list inside each page
    #[arg(long)]
    records_field: Option<String>,

    /// JSON file with normalization options
    #[arg(long)]
    config: Option<String>,

    /// Coerce mismatched leaves instead of failing
    #[arg(long)]
    lenient: bool,

    /// Output key for captured undeclared fields (default: "freestyle_attrs")
    #[arg(long)]
    freestyle_attrs_name: Option<String>,

    /// Comma-separated prototype paths copied verbatim
    #[arg(long)]
    pass_through: Option<String>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    // Build options: config file first, flags override
    let mut options = match &args.config {
        Some(path) => serde_json::from_value::<NormalizeOptions>(read_json_file(path)?)
            .context("Invalid normalization options")?,
        None => NormalizeOptions::default(),
    };
    if args.lenient {
        options.strict_types = false;
    }
    if let Some(name) = args.freestyle_attrs_name {
        options.freestyle_attrs_name = name;
    }
    if let Some(paths) = args.pass_through {
        options
            .pass_through_paths
            .extend(paths.split(',').map(|s| s.trim().to_string()));
    }

    let prototype = Prototype::from_json(&read_json_file(&args.prototype)?)
        .context("Invalid prototype")?;

    let mut pipeline = Pipeline::new().with_normalizer(Normalizer::new(prototype, options));
    if let Some(field) = args.records_field {
        pipeline = pipeline.with_records_field(field);
    }

    let reader = if let Some(file_path) = &args.input {
        Box::new(BufReader::new(File::open(file_path)?)) as Box<dyn Read>
    } else {
        Box::new(std::io::stdin()) as Box<dyn Read>
    };

    let mut writer = RowWriter::new(std::io::stdout().lock());
    let written = process_json(reader, args.ndjson, &mut writer, &pipeline)?;

    if written == 0 {
        eprintln!("Warning: No records found in input");
    }

    Ok(())
}
