use super::show::render;
use crate::config::Config;
use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use redline_editor::{Document, EditIntent, EditSession, SessionContext};
use std::fs;
use std::path::PathBuf;
use tracing::info;

#[derive(Args, Debug)]
pub struct ReplayArgs {
    /// Snapshot to edit
    pub document: PathBuf,

    /// JSON array of edit intents
    pub script: PathBuf,

    /// Author of the edits (defaults to the configured author)
    #[arg(short, long)]
    pub author: Option<String>,

    /// Where to write the edited snapshot (defaults to the input)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Apply the script without writing anything
    #[arg(long)]
    pub dry_run: bool,
}

pub fn replay(args: ReplayArgs, cwd: &str, config: &Config) -> Result<()> {
    let document_path = PathBuf::from(cwd).join(&args.document);
    let script_path = PathBuf::from(cwd).join(&args.script);

    let mut doc = Document::load(&document_path)
        .with_context(|| format!("Failed to load {}", document_path.display()))?;
    let script = fs::read_to_string(&script_path)
        .with_context(|| format!("Failed to read {}", script_path.display()))?;
    let intents: Vec<EditIntent> = serde_json::from_str(&script)
        .with_context(|| format!("Invalid intent script {}", script_path.display()))?;

    let author = args.author.unwrap_or_else(|| config.author.clone());
    println!(
        "✏️  {} {} intents as {}",
        "Replaying".green().bold(),
        intents.len(),
        author.bright_white()
    );

    let caret = apply_script(&mut doc, &author, &intents)?;
    info!(node = %caret.node, offset = caret.offset, "Replay finished");

    println!();
    println!("{}", render(&doc));
    println!();

    if args.dry_run {
        println!("{} Dry run, nothing written", "ℹ".blue());
        return Ok(());
    }

    let output = args
        .output
        .map(|path| PathBuf::from(cwd).join(path))
        .unwrap_or(document_path);
    doc.save(&output, config.pretty)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    println!("  {} Wrote {}", "✓".green(), output.display());

    Ok(())
}

/// Run every intent through one session that starts at the end of `doc`
pub fn apply_script(
    doc: &mut Document,
    author: &str,
    intents: &[EditIntent],
) -> Result<redline_editor::Caret> {
    let mut session = EditSession::at_end(SessionContext::new(author), doc);
    for (index, intent) in intents.iter().enumerate() {
        session
            .apply(doc, intent)
            .with_context(|| format!("Intent #{} ({}) failed", index + 1, intent.name()))?;
    }
    Ok(session.caret())
}
