// SPDX-License-Identifier: AGPL-3.0-or-later
//! Source node events driving the transducer
//!
//! The walk over a parsed Markdown tree is flattened into a stream of
//! enter/exit events. Each event carries a borrowed view of one node and the
//! kind-specific payload the rules need. Payload borrows live only for the
//! duration of the callback; anything kept past it is copied.

use serde::Serialize;
use std::fmt;

/// Position of a node in the source text (1-based)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Which side of a node the walk is on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Entering,
    Exiting,
}

/// What the walk should do after an enter rule has run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkStatus {
    Continue,
    SkipChildren,
}

/// Closed set of source node kinds with their payloads
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind<'a> {
    Document,
    Heading { level: u8 },
    Blockquote,
    CodeBlock { lines: Vec<&'a str> },
    FencedCodeBlock { lines: Vec<&'a str> },
    HtmlBlock,
    List { ordered: bool },
    ListItem,
    Paragraph,
    TextBlock,
    ThematicBreak,
    AutoLink { url: &'a str, label: &'a str },
    CodeSpan,
    /// Level 1 is `*em*`, level 2 is `**strong**`
    Emphasis { level: u8 },
    Image { destination: &'a str },
    Link { destination: &'a str },
    RawHtml,
    Text { literal: &'a str, hard_break: bool },
    StringLiteral { value: &'a str },
    Table,
    TableHeader,
    TableRow,
    TableCell,
}

impl NodeKind<'_> {
    /// Stable kind name used in logs and error reports
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Document => "Document",
            Self::Heading { .. } => "Heading",
            Self::Blockquote => "Blockquote",
            Self::CodeBlock { .. } => "CodeBlock",
            Self::FencedCodeBlock { .. } => "FencedCodeBlock",
            Self::HtmlBlock => "HTMLBlock",
            Self::List { .. } => "List",
            Self::ListItem => "ListItem",
            Self::Paragraph => "Paragraph",
            Self::TextBlock => "TextBlock",
            Self::ThematicBreak => "ThematicBreak",
            Self::AutoLink { .. } => "AutoLink",
            Self::CodeSpan => "CodeSpan",
            Self::Emphasis { .. } => "Emphasis",
            Self::Image { .. } => "Image",
            Self::Link { .. } => "Link",
            Self::RawHtml => "RawHTML",
            Self::Text { .. } => "Text",
            Self::StringLiteral { .. } => "String",
            Self::Table => "Table",
            Self::TableHeader => "TableHeader",
            Self::TableRow => "TableRow",
            Self::TableCell => "TableCell",
        }
    }

    /// Kinds the target format cannot represent
    pub const fn is_disallowed(&self) -> bool {
        matches!(self, Self::HtmlBlock | Self::RawHtml | Self::ThematicBreak)
    }
}

/// One enter or exit callback of the walk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeEvent<'a> {
    pub node: NodeKind<'a>,
    pub phase: Phase,
    pub position: Option<Position>,
}

impl<'a> NodeEvent<'a> {
    pub fn entering(node: NodeKind<'a>) -> Self {
        Self {
            node,
            phase: Phase::Entering,
            position: None,
        }
    }

    pub fn exiting(node: NodeKind<'a>) -> Self {
        Self {
            node,
            phase: Phase::Exiting,
            position: None,
        }
    }

    pub fn at(mut self, position: Position) -> Self {
        self.position = Some(position);
        self
    }
}

/// Receiver of the enter/exit stream
pub trait NodeVisitor {
    type Error;

    fn visit(&mut self, event: &NodeEvent<'_>) -> Result<WalkStatus, Self::Error>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disallowed_kinds() {
        assert!(NodeKind::HtmlBlock.is_disallowed());
        assert!(NodeKind::RawHtml.is_disallowed());
        assert!(NodeKind::ThematicBreak.is_disallowed());
        assert!(!NodeKind::Paragraph.is_disallowed());
        assert!(!NodeKind::Text {
            literal: "<b>",
            hard_break: false
        }
        .is_disallowed());
    }

    #[test]
    fn test_event_position() {
        let event = NodeEvent::entering(NodeKind::Paragraph).at(Position { line: 3, column: 1 });
        assert_eq!(event.phase, Phase::Entering);
        assert_eq!(event.position.map(|p| p.to_string()), Some("3:1".to_string()));
    }
}
