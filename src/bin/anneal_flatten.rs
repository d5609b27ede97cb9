//! anneal-flatten: Unroll nested record lists into flat rows
//!
//! Usage:
//!   # One row per toy, carrying its pet's and owner's fields
//!   anneal-flatten --path pets,toys owners.json
//!
//!   # Pages from an API dump, normalized against a prototype first
//!   anneal-flatten --ndjson --records-field entities -p proto.json --path orders pages.jsonl
//!
//!   # Keep some nested structures as JSON strings
//!   anneal-flatten --path items --jsonify-lists --jsonify-dicts meta,items.attrs data.json

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use anneal::input::read_json_file;
use anneal::{
    process_json, FlattenOptions, Flattener, NormalizeOptions, Normalizer, Pipeline, Prototype,
    RowWriter,
};
use anyhow::{Context, Result};
use clap::Parser;
use std::fs::File;
use std::io::{BufReader, Read};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "anneal-flatten")]
#[command(about = "Unroll nested record lists into flat rows", long_about = None)]
struct Args {
    /// Input file (use stdin if omitted)
    #[arg(value_name = "FILE")]
    input: Option<String>,

    /// Comma-separated keys of the nested lists to unroll, outermost first
    #[arg(long)]
    path: Option<String>,

    /// Process newline-delimited JSON (one page per line)
    #[arg(long)]
    ndjson: bool,

    /// Dotted path of the records list inside each page
    #[arg(long)]
    records_field: Option<String>,

    /// JSON file with flattening options
    #[arg(long)]
    config: Option<String>,

    /// Separator for composite column names (default: ".")
    #[arg(long)]
    separator: Option<String>,

    /// Drop records whose unroll target is missing or empty
    #[arg(long)]
    drop_incomplete: bool,

    /// Serialize remaining list values to JSON strings
    #[arg(long)]
    jsonify_lists: bool,

    /// Comma-separated columns whose nested maps are kept as JSON strings
    #[arg(long)]
    jsonify_dicts: Option<String>,

    /// Normalize records against this prototype before flattening
    #[arg(long, short = 'p')]
    prototype: Option<String>,

    /// Coerce mismatched leaves during normalization instead of failing
    #[arg(long, requires = "prototype")]
    lenient: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    // Build options: config file first, flags override
    let mut options = match &args.config {
        Some(path) => serde_json::from_value::<FlattenOptions>(read_json_file(path)?)
            .context("Invalid flattening options")?,
        None => FlattenOptions::default(),
    };
    if let Some(sep) = args.separator {
        options.separator = sep;
    }
    if args.drop_incomplete {
        options.return_incomplete_records = false;
    }
    if args.jsonify_lists {
        options.jsonify_lists = true;
    }
    if let Some(columns) = args.jsonify_dicts {
        options
            .jsonify_dicts
            .extend(columns.split(',').map(|s| s.trim().to_string()));
    }

    let path: Vec<String> = args
        .path
        .as_deref()
        .map(|p| p.split(',').map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect())
        .unwrap_or_default();

    let mut pipeline = Pipeline::new().with_flattener(Flattener::new(path, options));
    if let Some(field) = args.records_field {
        pipeline = pipeline.with_records_field(field);
    }
    if let Some(prototype_path) = &args.prototype {
        let prototype = Prototype::from_json(&read_json_file(prototype_path)?)
            .context("Invalid prototype")?;
        let normalize_options = NormalizeOptions::default().with_strict_types(!args.lenient);
        pipeline = pipeline.with_normalizer(Normalizer::new(prototype, normalize_options));
    }

    let reader = if let Some(file_path) = &args.input {
        Box::new(BufReader::new(File::open(file_path)?)) as Box<dyn Read>
    } else {
        Box::new(std::io::stdin()) as Box<dyn Read>
    };

    let mut writer = RowWriter::new(std::io::stdout().lock());
    let written = process_json(reader, args.ndjson, &mut writer, &pipeline)?;

    if written == 0 {
        eprintln!("Warning: No rows produced");
    }

    Ok(())
}
