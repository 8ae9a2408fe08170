//! Sift CLI
//!
//! Command-line surface for the curation service: report URLs, work the
//! moderation queue, and compile the rule document. Every command speaks
//! the same response envelope the transport layer uses.

use std::fs;
use std::path::Path;
use std::process::exit;
use std::sync::Arc;
use std::time::Instant;

use clap::{Parser, Subcommand};

use sift_core::moderation::Moderator;
use sift_core::tree::MemoryStore;

mod api;

#[derive(Parser)]
#[command(name = "sift")]
#[command(about = "Selector-rule curation: report, moderate, compile")]
struct Cli {
    /// Store file (JSON, created on first write)
    #[arg(short, long, default_value = "sift-store.json")]
    store: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Report a URL for moderation
    Report {
        /// The URL being reported
        #[arg(short, long)]
        url: String,
    },

    /// Show the oldest pending domain with its reports and current rules
    Pending,

    /// Approve a selector for a domain/subdomain/path
    Save {
        #[arg(long)]
        domain: String,
        #[arg(long)]
        subdomain: String,
        #[arg(long)]
        path: String,
        #[arg(long)]
        selector: String,
    },

    /// Drop a reported URL entry
    Remove {
        #[arg(long)]
        domain: String,
        /// Entry id as shown by `pending`
        #[arg(long)]
        entry: String,
    },

    /// Disable a domain in the compiled output
    Disable {
        #[arg(long)]
        domain: String,
    },

    /// Compile the rule store into the versioned rule document
    Compile {
        /// Output file; printed to stdout when omitted
        #[arg(short, long)]
        output: Option<String>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Print the compiled rule document envelope (consumer-facing read)
    Rules,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let store = match MemoryStore::open(Path::new(&cli.store)) {
        Ok(store) => Arc::new(store),
        Err(e) => {
            eprintln!("Error: {e}");
            exit(1);
        }
    };
    let moderator = Moderator::new(store);

    let result = match cli.command {
        Commands::Report { url } => print_envelope(api::report(&moderator, &url)),
        Commands::Pending => print_envelope(api::pending(&moderator)),
        Commands::Save { domain, subdomain, path, selector } => {
            print_envelope(api::save(&moderator, &domain, &subdomain, &path, &selector))
        }
        Commands::Remove { domain, entry } => {
            print_envelope(api::remove(&moderator, &domain, &entry))
        }
        Commands::Disable { domain } => print_envelope(api::disable(&moderator, &domain)),
        Commands::Compile { output, verbose } => cmd_compile(&moderator, output.as_deref(), verbose),
        Commands::Rules => print_envelope(api::fetch(&moderator)),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        exit(1);
    }
}

fn print_envelope(envelope: serde_json::Value) -> Result<(), String> {
    let text = serde_json::to_string_pretty(&envelope)
        .map_err(|e| format!("Failed to render response: {e}"))?;
    println!("{text}");
    Ok(())
}

fn cmd_compile(
    moderator: &Moderator<MemoryStore>,
    output: Option<&str>,
    verbose: bool,
) -> Result<(), String> {
    let start = Instant::now();

    let doc = sift_compiler::compile(moderator.rules())
        .map_err(|e| format!("Compilation failed: {e}"))?;
    let json = serde_json::to_string_pretty(&doc)
        .map_err(|e| format!("Failed to serialize document: {e}"))?;

    // The artifact is a compatibility contract; make sure what we wrote
    // parses back before shipping it.
    serde_json::from_str::<sift_core::types::RuleDocument>(&json)
        .map_err(|e| format!("Generated document failed validation: {e}"))?;

    let selector_count: usize = doc
        .domains
        .values()
        .flat_map(|d| d.sub_domains.values())
        .flat_map(|paths| paths.values())
        .map(Vec::len)
        .sum();

    match output {
        Some(path) => {
            fs::write(path, &json).map_err(|e| format!("Failed to write '{path}': {e}"))?;
            println!("Compiled rule document to '{path}'");
        }
        None => println!("{json}"),
    }

    if verbose || output.is_some() {
        println!("  Schema:    v{}", doc.schema_version);
        println!("  Domains:   {}", doc.domains.len());
        println!("  Selectors: {selector_count}");
        println!("  Size:      {} bytes ({:.1} KB)", json.len(), json.len() as f64 / 1024.0);
        println!("  Time:      {:.1}ms", start.elapsed().as_secs_f64() * 1000.0);
    }

    Ok(())
}
