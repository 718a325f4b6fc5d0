// SPDX-License-Identifier: AGPL-3.0-or-later
//! Command-line interface for mdocx
//!
//! Converts one Markdown file (or stdin) into a `.docx` package.
//!
//! Usage:
//!   mdocx --input notes.md --output notes.docx
//!   mdocx --config house-style.toml < notes.md
//!   mdocx --input notes.md --dump-model

use anyhow::{Context, Result};
use clap::Parser;
use mdocx_core::{convert, ConvertConfig, FsImageSource};
use mdocx_package::DocxPackager;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "mdocx", version, about = "Convert Markdown into a Word document")]
struct Args {
    /// Markdown file to convert; reads stdin when omitted
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Path of the generated .docx package
    #[arg(short, long, default_value = "converted.docx")]
    output: PathBuf,

    /// TOML file overriding fonts, colours, TOC title and footer text
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Also print the document model as JSON on stdout
    #[arg(long)]
    dump_model: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    run(&Args::parse())
}

fn run(args: &Args) -> Result<()> {
    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => ConvertConfig::default(),
    };

    let (markdown, images) = match &args.input {
        Some(path) => {
            let markdown = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            (markdown, FsImageSource::for_input(path))
        }
        None => {
            let mut markdown = String::new();
            std::io::stdin()
                .read_to_string(&mut markdown)
                .context("failed to read stdin")?;
            (markdown, FsImageSource::new("."))
        }
    };

    let doc = convert(&markdown, &config, &images).context("conversion failed")?;

    if args.dump_model {
        println!("{}", doc.to_json().context("failed to serialise model")?);
    }

    DocxPackager::new()
        .save(&doc, &args.output)
        .with_context(|| format!("failed to write {}", args.output.display()))?;
    info!(output = %args.output.display(), "done");
    Ok(())
}

fn load_config(path: &Path) -> Result<ConvertConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    toml::from_str(&text).with_context(|| format!("invalid config {}", path.display()))
}
