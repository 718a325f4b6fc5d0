// SPDX-License-Identifier: AGPL-3.0-or-later
//! Error taxonomy and conversion configuration

use crate::ast::Position;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Optional source position, rendered as ` at line:col` when known
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct At(pub Option<Position>);

impl fmt::Display for At {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(position) => write!(f, " at {position}"),
            None => Ok(()),
        }
    }
}

/// Error type for a conversion; every variant aborts the whole document
#[derive(Debug, thiserror::Error)]
pub enum ConversionError {
    #[error("Unsupported node kind: {kind}{at}")]
    UnsupportedNodeKind { kind: String, at: At },

    #[error("Disallowed content: {kind}{at} cannot be represented in the output document")]
    DisallowedContent { kind: &'static str, at: At },

    #[error("Invariant violation in {kind}{at}: {message}")]
    InvariantViolation {
        kind: &'static str,
        at: At,
        message: String,
    },

    #[error("Resource error in {kind}{at}: cannot load {reference}: {source}")]
    ResourceError {
        kind: &'static str,
        at: At,
        reference: String,
        #[source]
        source: std::io::Error,
    },
}

impl ConversionError {
    /// Short name of the error kind, independent of the offending node
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::UnsupportedNodeKind { .. } => "UnsupportedNodeKind",
            Self::DisallowedContent { .. } => "DisallowedContent",
            Self::InvariantViolation { .. } => "InvariantViolation",
            Self::ResourceError { .. } => "ResourceError",
        }
    }

    /// Name of the node kind the error was raised for
    pub fn node_kind(&self) -> &str {
        match self {
            Self::UnsupportedNodeKind { kind, .. } => kind.as_str(),
            Self::DisallowedContent { kind, .. }
            | Self::InvariantViolation { kind, .. }
            | Self::ResourceError { kind, .. } => *kind,
        }
    }

    pub fn position(&self) -> Option<Position> {
        match self {
            Self::UnsupportedNodeKind { at, .. }
            | Self::DisallowedContent { at, .. }
            | Self::InvariantViolation { at, .. }
            | Self::ResourceError { at, .. } => at.0,
        }
    }
}

pub type Result<T> = std::result::Result<T, ConversionError>;

/// Configuration for the styles and front matter written into every document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvertConfig {
    /// Font family of the body default style and headings
    pub body_font: String,
    /// Font family of code blocks and code spans
    pub code_font: String,
    /// Hex colour of headings and the table of contents label
    pub heading_color: String,
    /// Hex colour of captions and hyperlinks
    pub accent_color: String,
    /// Label printed above the table of contents field
    pub toc_title: String,
    /// Footer text; `{page}` and `{pages}` become page number fields
    pub footer_template: String,
    /// Widest an image may be drawn; larger images are scaled down
    pub image_max_width_inches: f64,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            body_font: "Calibri".to_string(),
            code_font: "Consolas".to_string(),
            heading_color: "0070C0".to_string(),
            accent_color: "1F497D".to_string(),
            toc_title: "Table of Contents".to_string(),
            footer_template: "Page {page} of {pages}".to_string(),
            image_max_width_inches: 6.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_names_kind_and_position() {
        let err = ConversionError::DisallowedContent {
            kind: "ThematicBreak",
            at: At(Some(Position { line: 4, column: 1 })),
        };
        assert_eq!(err.kind_name(), "DisallowedContent");
        assert_eq!(err.node_kind(), "ThematicBreak");
        assert!(err.to_string().contains("ThematicBreak at 4:1"));
    }

    #[test]
    fn test_error_display_without_position() {
        let err = ConversionError::UnsupportedNodeKind {
            kind: "FootnoteDefinition".to_string(),
            at: At(None),
        };
        assert_eq!(err.to_string(), "Unsupported node kind: FootnoteDefinition");
    }

    #[test]
    fn test_config_partial_override() {
        let config: ConvertConfig =
            serde_json::from_str(r#"{"toc_title": "Contents"}"#).expect("deserialize");
        assert_eq!(config.toc_title, "Contents");
        assert_eq!(config.body_font, "Calibri");
    }
}
