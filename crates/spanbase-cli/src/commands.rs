use std::path::{Path, PathBuf};

use anyhow::Context;
use colored::Colorize;
use spanbase_server::{ServerConfig, SpanbaseServer};
use spanbase_store::{read_object, SpanStore, SqliteSpanStore};
use spanbase_types::{validate_target, validate_upload, FieldValue, FilePart, ObjectPayload, Target};
use tokio::io::AsyncWriteExt;

use crate::cli::*;

/// Database used when neither `--db` nor the config file names one.
const DEFAULT_DB: &str = "spanbase.db";

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(cli.config.as_deref(), cli.db)?;
    match cli.command {
        Command::Put(args) => cmd_put(&open_store(&config)?, args, cli.format).await,
        Command::Get(args) => cmd_get(&open_store(&config)?, args).await,
        Command::List(args) => {
            let limit = args.limit.unwrap_or(config.store.list_limit);
            cmd_list(&open_store(&config)?, limit, cli.format).await
        }
        Command::Stats => cmd_stats(&open_store(&config)?, cli.format).await,
        Command::Serve(args) => cmd_serve(config, args).await,
    }
}

fn open_store(config: &ServerConfig) -> anyhow::Result<SqliteSpanStore> {
    SqliteSpanStore::open(config.store.clone()).context("opening span store")
}

fn load_config(path: Option<&Path>, db: Option<PathBuf>) -> anyhow::Result<ServerConfig> {
    let mut config = match path {
        Some(path) => ServerConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => ServerConfig::default(),
    };
    match db {
        Some(db) => config.store.path = Some(db),
        None if config.store.path.is_none() => config.store.path = Some(PathBuf::from(DEFAULT_DB)),
        None => {}
    }
    Ok(config)
}

/// Validate and store one file. The label defaults to the file name.
pub async fn put_file(
    store: &dyn SpanStore,
    path: &Path,
    text: Option<String>,
) -> anyhow::Result<Target> {
    let data = tokio::fs::read(path)
        .await
        .with_context(|| format!("reading {}", path.display()))?;
    let file_name = path.file_name().map(|n| n.to_string_lossy().into_owned());
    let text = text.or_else(|| file_name.clone()).unwrap_or_default();

    let mut part = FilePart::new(data);
    part.file_name = file_name;
    let upload = validate_upload(Some(&FieldValue::Text(text)), Some(&FieldValue::File(part)))?;

    let target = store
        .put_object(&upload.text, upload.payload.unwrap_or_default())
        .await?;
    Ok(target)
}

/// Validate a textual target and reassemble the object.
pub async fn get_object(store: &dyn SpanStore, target: &str) -> anyhow::Result<ObjectPayload> {
    let target = validate_target(target)?;
    Ok(read_object(store, target).await?)
}

async fn cmd_put(store: &dyn SpanStore, args: PutArgs, format: OutputFormat) -> anyhow::Result<()> {
    let target = put_file(store, &args.path, args.text).await?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::json!({ "target": target })),
        OutputFormat::Text => println!(
            "{} Stored {} as target {}",
            "✓".green().bold(),
            args.path.display().to_string().bold(),
            target.to_string().yellow()
        ),
    }
    Ok(())
}

async fn cmd_get(store: &dyn SpanStore, args: GetArgs) -> anyhow::Result<()> {
    let payload = get_object(store, &args.target).await?;
    match &args.output {
        Some(path) => {
            tokio::fs::write(path, &payload.data)
                .await
                .with_context(|| format!("writing {}", path.display()))?;
            eprintln!(
                "{} Wrote {} bytes of {} to {}",
                "✓".green().bold(),
                payload.content_length(),
                payload.meta.text.cyan(),
                path.display()
            );
        }
        None => {
            let mut stdout = tokio::io::stdout();
            stdout.write_all(&payload.data).await?;
            stdout.flush().await?;
        }
    }
    Ok(())
}

async fn cmd_list(store: &dyn SpanStore, limit: usize, format: OutputFormat) -> anyhow::Result<()> {
    let recent = store.list_recent(limit).await?;
    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&recent)?);
        return Ok(());
    }
    if recent.is_empty() {
        println!("No objects stored.");
    }
    for meta in &recent {
        println!(
            "{:>10}  {:>12}  {}",
            meta.target.to_string().yellow(),
            format!("{} B", meta.len).dimmed(),
            meta.text
        );
    }
    Ok(())
}

async fn cmd_stats(store: &dyn SpanStore, format: OutputFormat) -> anyhow::Result<()> {
    let stats = store.stats().await?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string(&stats)?),
        OutputFormat::Text => {
            println!("Objects: {}", stats.objects.to_string().bold());
            println!("Spans:   {}", stats.spans.to_string().bold());
            println!("Bytes:   {}", stats.span_bytes.to_string().bold());
        }
    }
    Ok(())
}

async fn cmd_serve(mut config: ServerConfig, args: ServeArgs) -> anyhow::Result<()> {
    if let Some(bind) = args.bind {
        config.bind_addr = bind
            .parse()
            .with_context(|| format!("invalid bind address {bind}"))?;
    }
    println!(
        "Spanbase server on {} (db: {})",
        config.bind_addr.to_string().bold(),
        config
            .store
            .path
            .as_deref()
            .map_or_else(|| "in-memory".into(), |p| p.display().to_string())
    );
    SpanbaseServer::open(config)?.serve().await?;
    Ok(())
}
