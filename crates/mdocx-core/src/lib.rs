// SPDX-License-Identifier: AGPL-3.0-or-later
//! mdocx Core - Markdown to word-processing document model
//!
//! This crate provides:
//! - The node event vocabulary a parsed Markdown tree is replayed as
//! - A comrak front-end producing that event stream
//! - A context-stack transducer building an in-memory document model
//! - Style, numbering and front matter bootstrap for every document
//!
//! Serialising the model to a `.docx` package lives in `mdocx-package`.

pub mod ast;
pub mod bootstrap;
pub mod formats;
pub mod images;
pub mod model;
pub mod traits;
pub mod transducer;

pub use ast::{NodeEvent, NodeKind, NodeVisitor, Phase, Position, WalkStatus};
pub use formats::MarkdownSource;
pub use images::{FsImageSource, ImageSource};
pub use model::Document;
pub use traits::{ConversionError, ConvertConfig, Result};
pub use transducer::Transducer;

use tracing::info;

/// Convert Markdown text into a document model
///
/// Image references are resolved through `images`. Any error aborts the
/// whole conversion; no partial document is returned.
pub fn convert(markdown: &str, config: &ConvertConfig, images: &dyn ImageSource) -> Result<Document> {
    info!(bytes = markdown.len(), "converting markdown");
    let mut transducer = Transducer::new(config.clone(), images);
    MarkdownSource::new().walk(markdown, &mut transducer)?;
    let doc = transducer.finish()?;
    info!(
        blocks = doc.body.len(),
        images = doc.images.len(),
        "markdown converted"
    );
    Ok(doc)
}
