use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use redline_editor::{Document, NodeKind};
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Snapshot to display
    pub document: PathBuf,

    /// Print every node with its key instead of the rendered text
    #[arg(short, long)]
    pub outline: bool,

    /// Print plain markup without colors
    #[arg(long)]
    pub plain: bool,
}

pub fn show(args: ShowArgs, cwd: &str) -> Result<()> {
    let path = PathBuf::from(cwd).join(&args.document);
    let doc = Document::load(&path)
        .with_context(|| format!("Failed to load {}", path.display()))?;

    if args.outline {
        print!("{}", doc.outline());
    } else if args.plain {
        println!("{}", doc.markup());
    } else {
        println!("{}", render(&doc));
    }
    Ok(())
}

/// Colored rendering: inserts in green, deletions struck through in red
pub fn render(doc: &Document) -> String {
    doc.blocks()
        .iter()
        .map(|&block| {
            doc.children(block)
                .iter()
                .map(|&child| {
                    let text = doc.text_content(child);
                    match doc.kind(child) {
                        Some(NodeKind::Insert(_)) => text.green().underline().to_string(),
                        Some(NodeKind::Delete(_)) => text.red().strikethrough().to_string(),
                        _ => text,
                    }
                })
                .collect::<String>()
        })
        .collect::<Vec<_>>()
        .join("\n")
}
