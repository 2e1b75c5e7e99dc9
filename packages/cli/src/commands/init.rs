use crate::config::{Config, DEFAULT_CONFIG_NAME};
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use redline_editor::Document;
use std::fs;
use std::path::PathBuf;

/// Paragraph the sample document starts with
pub const SAMPLE_TEXT: &str = "Hi there this is an example of an editor with track changes";

#[derive(Debug, Args)]
pub struct InitArgs {
    /// Author recorded on edits
    #[arg(short, long, default_value = "user1")]
    pub author: String,

    /// Sample document to create
    #[arg(short, long, default_value = "document.json")]
    pub document: String,

    /// Force overwrite existing files
    #[arg(short, long)]
    pub force: bool,
}

pub fn init(args: InitArgs, cwd: &str) -> Result<()> {
    let config_path = PathBuf::from(cwd).join(DEFAULT_CONFIG_NAME);

    if config_path.exists() && !args.force {
        println!(
            "{} {} already exists",
            "⚠️".yellow(),
            DEFAULT_CONFIG_NAME.bright_white()
        );
        println!("Use --force to overwrite");
        return Ok(());
    }

    println!("{}", "📝 Initializing Redline project...".bright_blue().bold());

    let config = Config {
        author: args.author.clone(),
        ..Config::default()
    };
    let config_json = serde_json::to_string_pretty(&config)?;
    fs::write(&config_path, config_json)?;
    println!("  {} Created {}", "✓".green(), DEFAULT_CONFIG_NAME);

    let document_path = PathBuf::from(cwd).join(&args.document);
    if !document_path.exists() || args.force {
        let doc = Document::from_paragraphs(&[SAMPLE_TEXT]);
        doc.save(&document_path, config.pretty)?;
        println!("  {} Created {}", "✓".green(), args.document);
    }

    println!();
    println!("{}", "✅ Project initialized!".green().bold());
    println!();
    println!("Next steps:");
    println!("  1. Write an intent script, e.g. edits.json");
    println!("  2. Run: redline replay {} edits.json", args.document);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_writes_config_and_document() {
        let dir = std::env::temp_dir().join("redline_init_test");
        fs::create_dir_all(&dir).unwrap();
        let cwd = dir.display().to_string();

        init(
            InitArgs {
                author: "alice".to_string(),
                document: "document.json".to_string(),
                force: true,
            },
            &cwd,
        )
        .unwrap();

        let config = Config::load(&cwd).unwrap();
        assert_eq!(config.author, "alice");
        let doc = Document::load(dir.join("document.json")).unwrap();
        assert_eq!(doc.plain_text(), SAMPLE_TEXT);
    }
}
