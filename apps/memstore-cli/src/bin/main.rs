use std::env;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use memstore_core::config::{Config, Settings};
use memstore_core::types::{Record, SearchHit};
use memstore_core::{decode_id, encode_id};
use memstore_embed::get_default_embedder;
use memstore_semantic::{sample_data, sample_data_with_no_mapping, SemanticMemory, README_URL};
use memstore_vector::AzureSearchStore;

const USAGE: &str = "[demo | store [--no-mapping] | get <key> | get-id <id> | delete <key> | search <query> [k] | create-index | drop-index | encode <id> | decode <key>]";

fn parse_args() -> (String, Vec<String>) {
    let mut args: Vec<String> = env::args().collect();
    let prog = args.remove(0);
    if args.first().is_some_and(|a| a == "-h" || a == "--help") { println!("Usage: {} {}", prog, USAGE); std::process::exit(0); }
    let cmd = if args.is_empty() { "demo".to_string() } else { args.remove(0) };
    (cmd, args)
}

fn arg(args: &[String], i: usize, usage: &str) -> String {
    args.get(i).cloned().unwrap_or_else(|| { eprintln!("Usage: memstore {}", usage); std::process::exit(1) })
}

fn memory(settings: &Settings) -> anyhow::Result<SemanticMemory<AzureSearchStore>> {
    let store = AzureSearchStore::from_settings(&settings.search, settings.embedding.dimensions).context("failed to configure search index")?;
    let embedder = get_default_embedder(&settings.embedding).context("failed to configure embedding service")?;
    Ok(SemanticMemory::new(store, embedder, settings.memory.clone()))
}

fn print_record(record: Option<&Record>) {
    match record {
        Some(r) => {
            println!("📄 {}", r.id());
            if let Some(text) = r.text() { println!("   {}", text); }
            if let Some(source) = r.external_source_name() { println!("   source: {} (reference: {})", source, r.is_reference()); }
        }
        None => println!("❌ Not found"),
    }
}

fn print_hits(hits: &[SearchHit]) {
    if hits.is_empty() { println!("No results"); return; }
    for (i, hit) in hits.iter().enumerate() {
        println!("{}. [{:.3}] {}", i + 1, hit.score, hit.record.id());
        if let Some(text) = hit.record.text() { println!("   {}", text); }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    let (cmd, args) = parse_args();

    // pure key utilities need no configuration
    match cmd.as_str() {
        "encode" => { println!("{}", encode_id(Some(&arg(&args, 0, "encode <id>")))); return Ok(()); }
        "decode" => { println!("{}", decode_id(Some(&arg(&args, 0, "decode <key>")))?); return Ok(()); }
        _ => {}
    }

    let config = Config::load().map_err(|e| { eprintln!("Error loading config: {}", e); e })?;
    let settings = config.settings()?;

    match cmd.as_str() {
        "demo" => {
            let banner = "=".repeat(60);
            println!("{}\n======== Semantic Memory using Azure Cognitive Search ========\n{}", banner, banner);
            let memory = memory(&settings)?;
            let key = encode_id(Some(README_URL));
            println!("🔍 Looking up {}", key);
            print_record(memory.get(&key).await?.as_ref());
        }
        "store" => {
            let no_mapping = args.iter().any(|a| a == "--no-mapping");
            let data = if no_mapping { sample_data_with_no_mapping() } else { sample_data() };
            let memory = memory(&settings)?;
            let keys = memory.store_data(&data).await?;
            println!("\n✅ Stored {} records in {}", keys.len(), settings.search.collection);
        }
        "get" => print_record(memory(&settings)?.get(&arg(&args, 0, "get <key>")).await?.as_ref()),
        "get-id" => print_record(memory(&settings)?.get_by_id(&arg(&args, 0, "get-id <id>")).await?.as_ref()),
        "delete" => {
            let key = arg(&args, 0, "delete <key>");
            memory(&settings)?.delete(&key).await?;
            println!("🗑️  Deleted {}", key);
        }
        "search" => {
            let query = arg(&args, 0, "search \"<query>\" [k]");
            let k = args.get(1).map(|s| s.parse::<usize>()).transpose().context("k must be a number")?.unwrap_or(5);
            print_hits(&memory(&settings)?.search(&query, k).await?);
        }
        "create-index" => {
            let store = AzureSearchStore::from_settings(&settings.search, settings.embedding.dimensions)?;
            if store.create_collection_if_not_exists().await? {
                println!("✅ Created index {} ({} dimensions)", settings.search.collection, settings.embedding.dimensions);
            } else {
                println!("Index {} already exists", settings.search.collection);
            }
        }
        "drop-index" => {
            let store = AzureSearchStore::from_settings(&settings.search, settings.embedding.dimensions)?;
            store.delete_collection().await?;
            println!("🗑️  Dropped index {}", settings.search.collection);
        }
        _ => { eprintln!("Unknown command: {}\nUsage: memstore {}", cmd, USAGE); std::process::exit(1); }
    }
    Ok(())
}
