use super::stream::{open_session, print_outline, read_source};
use crate::config::Config;
use anyhow::{anyhow, Result};
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;
use waypoint_editor::TextEdit;
use waypoint_parser::{parse_fragment, serialize, StableId};

#[derive(Debug, Args)]
pub struct EditArgs {
    /// Markup file to edit
    pub file: PathBuf,

    /// Id of the block before the replaced range (start of document if omitted)
    #[arg(long)]
    pub from: Option<String>,

    /// Id of the block after the replaced range (end of document if omitted)
    #[arg(long)]
    pub to: Option<String>,

    /// Replacement markup
    #[arg(short, long, default_value = "")]
    pub content: String,

    /// Revert the edit after showing it
    #[arg(long)]
    pub revert: bool,

    /// Print the proposal as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn edit(args: EditArgs, cwd: &str) -> Result<()> {
    let config = Config::load(cwd)?;
    let source = read_source(&args.file, cwd)?;

    let mut session = open_session(&config, cwd, &args.file, false)?;
    session.consume(&source)?;
    session.finish()?;

    let content = parse_fragment(&args.content);
    if content.is_empty() && !args.content.trim().is_empty() {
        return Err(anyhow!("Content has no blocks: {:?}", args.content));
    }

    let proposal = session.propose(
        args.from.map(StableId::from),
        args.to.map(StableId::from),
        content,
    )?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&proposal)?);
    }

    let edits = session.preview(&proposal)?;
    println!("{}", "✏️  Proposed edit".bright_blue().bold());
    print_edits(&edits);
    println!();
    print_outline(session.document());
    println!();
    print!("{}", serialize(session.document()));

    if args.revert {
        let undo = session.revert_preview()?;
        println!();
        println!("{}", "↩️  Reverted".bright_blue().bold());
        print_edits(&undo);
        println!();
        print!("{}", serialize(session.document()));
    } else {
        session.accept_preview()?;
    }

    Ok(())
}

fn print_edits(edits: &[TextEdit]) {
    for edit in edits {
        println!(
            "  {} chars {}..{} → {} chars",
            "✓".green(),
            edit.start,
            edit.end,
            edit.inserted_len
        );
    }
}
