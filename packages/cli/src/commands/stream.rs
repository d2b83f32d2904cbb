use crate::config::Config;
use anyhow::{anyhow, Result};
use clap::Args;
use colored::Colorize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use waypoint_editor::StreamSession;
use waypoint_parser::{serialize, Document, IdGenerator};
use waypoint_places::{Enricher, GeocodeCache};

#[derive(Debug, Args)]
pub struct StreamArgs {
    /// Markup file to stream
    pub file: PathBuf,

    /// Fragment size in bytes (overrides config)
    #[arg(short, long)]
    pub chunk_size: Option<usize>,

    /// Number of distinct place colors (overrides config)
    #[arg(short, long)]
    pub palette_size: Option<u8>,

    /// Print the document as JSON instead of markup
    #[arg(long)]
    pub json: bool,

    /// Print block ids next to each block
    #[arg(long)]
    pub outline: bool,

    /// Skip geocoding
    #[arg(long)]
    pub no_enrich: bool,
}

pub async fn stream(args: StreamArgs, cwd: &str) -> Result<()> {
    let mut config = Config::load(cwd)?;
    if let Some(chunk_size) = args.chunk_size {
        config.chunk_size = chunk_size;
    }
    if let Some(palette_size) = args.palette_size {
        config.palette_size = palette_size;
    }

    let source = read_source(&args.file, cwd)?;
    let mut session = open_session(&config, cwd, &args.file, !args.no_enrich)?;

    let mut fragments = 0;
    for fragment in chunks(&source, config.chunk_size) {
        let delta = session.consume(fragment)?;
        fragments += 1;
        if !delta.is_empty() {
            tracing::debug!(
                fragment = fragments,
                blocks = session.document().len(),
                pending = delta.pending_bytes,
                "blocks completed"
            );
        }
    }
    session.finish()?;
    tracing::info!(fragments, blocks = session.document().len(), "stream finished");

    let report = session.enrich().await;

    if args.json {
        println!("{}", serde_json::to_string_pretty(session.document())?);
    } else if args.outline {
        print_outline(session.document());
    } else {
        print!("{}", serialize(session.document()));
    }

    if let Some(report) = report {
        if !report.is_complete() {
            eprintln!();
            eprintln!("{}", "⚠️  Unresolved places:".yellow());
            for unresolved in &report.unresolved {
                eprintln!("  {} {}", "✗".red(), unresolved);
            }
        }
    }

    Ok(())
}

pub(crate) fn read_source(file: &Path, cwd: &str) -> Result<String> {
    let path = PathBuf::from(cwd).join(file);
    std::fs::read_to_string(&path).map_err(|e| anyhow!("Cannot read {}: {}", path.display(), e))
}

/// Build a session from config; with `enrich` it geocodes through the
/// configured gazetteer
pub(crate) fn open_session(
    config: &Config,
    cwd: &str,
    file: &Path,
    enrich: bool,
) -> Result<StreamSession> {
    let name = file.display().to_string();
    let mut session = StreamSession::new(name).with_palette(config.palette_size);

    if let Some(seed) = &config.id_seed {
        session = session.with_ids(IdGenerator::from_seed(seed.clone()));
    }

    if enrich {
        let gazetteer = config.load_gazetteer(cwd)?;
        let cache = GeocodeCache::with_ttl(Arc::new(gazetteer), config.cache_ttl());
        session = session.with_enricher(Enricher::new(cache));
    }

    Ok(session)
}

/// Split `text` into fragments of about `size` bytes, never inside a char
pub(crate) fn chunks(text: &str, size: usize) -> Vec<&str> {
    let size = size.max(1);
    let mut out = Vec::new();
    let mut start = 0;

    while start < text.len() {
        let mut end = (start + size).min(text.len());
        while !text.is_char_boundary(end) {
            end += 1;
        }
        out.push(&text[start..end]);
        start = end;
    }
    out
}

pub(crate) fn print_outline(doc: &Document) {
    for node in &doc.children {
        let id = node.id().map(|id| id.to_string()).unwrap_or_default();
        println!(
            "{:>8}  {:<10} {}",
            id.bright_white(),
            node.kind().dimmed(),
            node.text_content()
        );
    }
}
