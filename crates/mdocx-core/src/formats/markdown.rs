// SPDX-License-Identifier: AGPL-3.0-or-later
//! Markdown front-end using comrak
//!
//! Parses Markdown and replays the tree as the enter/exit event stream the
//! transducer consumes. comrak node types that have no counterpart in
//! [`NodeKind`] abort the walk with `UnsupportedNodeKind`.

use crate::ast::{NodeEvent, NodeKind, NodeVisitor, Phase, Position, WalkStatus};
use crate::traits::{At, ConversionError, Result};
use comrak::arena_tree::NodeEdge;
use comrak::nodes::{AstNode, ListType, NodeList, NodeValue};
use comrak::{parse_document, Arena, Options};

/// Markdown source driving a depth-first walk over comrak's tree
pub struct MarkdownSource {
    options: Options<'static>,
}

impl MarkdownSource {
    pub fn new() -> Self {
        Self {
            options: Self::comrak_options(),
        }
    }

    /// Use caller-supplied comrak options instead of the defaults
    pub fn with_options(options: Options<'static>) -> Self {
        Self { options }
    }

    /// CommonMark plus GFM tables
    fn comrak_options() -> Options<'static> {
        let mut options = Options::default();
        options.extension.table = true;
        options
    }

    /// Parse `input` and feed every node's enter/exit events to `visitor`
    ///
    /// A node whose enter event returns [`WalkStatus::SkipChildren`] still
    /// receives its exit event; only its descendants are skipped.
    pub fn walk<V>(&self, input: &str, visitor: &mut V) -> Result<()>
    where
        V: NodeVisitor<Error = ConversionError>,
    {
        let arena = Arena::new();
        let root = parse_document(&arena, input, &self.options);

        let mut skipping: Option<&AstNode<'_>> = None;
        for edge in root.traverse() {
            match edge {
                NodeEdge::Start(node) => {
                    if skipping.is_some() {
                        continue;
                    }
                    if visit(node, Phase::Entering, visitor)? == WalkStatus::SkipChildren {
                        skipping = Some(node);
                    }
                }
                NodeEdge::End(node) => {
                    if let Some(skipped) = skipping {
                        if !std::ptr::eq(skipped, node) {
                            continue;
                        }
                        skipping = None;
                    }
                    visit(node, Phase::Exiting, visitor)?;
                }
            }
        }
        Ok(())
    }
}

impl Default for MarkdownSource {
    fn default() -> Self {
        Self::new()
    }
}

fn visit<'a, V>(node: &'a AstNode<'a>, phase: Phase, visitor: &mut V) -> Result<WalkStatus>
where
    V: NodeVisitor<Error = ConversionError>,
{
    let data = node.data.borrow();
    let position = Position {
        line: data.sourcepos.start.line,
        column: data.sourcepos.start.column,
    };
    let label = match &data.value {
        NodeValue::Link(link) => autolink_label(node, &link.url),
        _ => None,
    };
    let kind = node_kind(node, &data.value, label.as_deref(), position)?;
    let is_autolink = matches!(kind, NodeKind::AutoLink { .. });

    let status = visitor.visit(&NodeEvent {
        node: kind,
        phase,
        position: Some(position),
    })?;

    // comrak keeps code span text on the node itself; replay it as a child
    if let (NodeValue::Code(code), Phase::Entering) = (&data.value, phase) {
        let literal = NodeKind::StringLiteral {
            value: &code.literal,
        };
        visitor.visit(&NodeEvent::entering(literal.clone()).at(position))?;
        visitor.visit(&NodeEvent::exiting(literal).at(position))?;
    }

    // The label already carries an autolink's text
    if is_autolink {
        return Ok(WalkStatus::SkipChildren);
    }
    Ok(status)
}

fn node_kind<'d, 'a>(
    node: &'a AstNode<'a>,
    value: &'d NodeValue,
    autolink_label: Option<&'d str>,
    position: Position,
) -> Result<NodeKind<'d>> {
    let kind = match value {
        NodeValue::Document => NodeKind::Document,
        NodeValue::Heading(heading) => NodeKind::Heading {
            level: heading.level,
        },
        NodeValue::BlockQuote => NodeKind::Blockquote,
        NodeValue::CodeBlock(code) => {
            let lines = code.literal.lines().collect();
            if code.fenced {
                NodeKind::FencedCodeBlock { lines }
            } else {
                NodeKind::CodeBlock { lines }
            }
        }
        NodeValue::HtmlBlock(_) => NodeKind::HtmlBlock,
        NodeValue::List(list) => NodeKind::List {
            ordered: list.list_type == ListType::Ordered,
        },
        NodeValue::Item(_) => NodeKind::ListItem,
        NodeValue::Paragraph => {
            if in_tight_list(node) {
                NodeKind::TextBlock
            } else {
                NodeKind::Paragraph
            }
        }
        NodeValue::ThematicBreak => NodeKind::ThematicBreak,
        NodeValue::Text(text) => NodeKind::Text {
            literal: text,
            hard_break: false,
        },
        NodeValue::SoftBreak => NodeKind::Text {
            literal: " ",
            hard_break: false,
        },
        NodeValue::LineBreak => NodeKind::Text {
            literal: "",
            hard_break: true,
        },
        NodeValue::Code(_) => NodeKind::CodeSpan,
        NodeValue::Emph => NodeKind::Emphasis { level: 1 },
        NodeValue::Strong => NodeKind::Emphasis { level: 2 },
        NodeValue::Link(link) => match autolink_label {
            Some(label) => NodeKind::AutoLink {
                url: &link.url,
                label,
            },
            None => NodeKind::Link {
                destination: &link.url,
            },
        },
        NodeValue::Image(link) => NodeKind::Image {
            destination: &link.url,
        },
        NodeValue::HtmlInline(_) => NodeKind::RawHtml,
        NodeValue::Table(_) => NodeKind::Table,
        NodeValue::TableRow(true) => NodeKind::TableHeader,
        NodeValue::TableRow(false) => NodeKind::TableRow,
        NodeValue::TableCell => NodeKind::TableCell,
        other => {
            return Err(ConversionError::UnsupportedNodeKind {
                kind: comrak_kind_name(other),
                at: At(Some(position)),
            })
        }
    };
    Ok(kind)
}

/// Variant name of a comrak node, without its payload
fn comrak_kind_name(value: &NodeValue) -> String {
    let debug = format!("{value:?}");
    let end = debug
        .find(|c: char| !c.is_ascii_alphanumeric())
        .unwrap_or(debug.len());
    debug[..end].to_string()
}

/// Paragraphs directly inside an item of a tight list render as text blocks
fn in_tight_list<'a>(node: &'a AstNode<'a>) -> bool {
    node.parent()
        .filter(|item| matches!(item.data.borrow().value, NodeValue::Item(_)))
        .and_then(|item| item.parent())
        .is_some_and(|list| {
            matches!(
                list.data.borrow().value,
                NodeValue::List(NodeList { tight: true, .. })
            )
        })
}

/// Text of a link whose only child spells out its own destination
fn autolink_label<'a>(node: &'a AstNode<'a>, url: &str) -> Option<String> {
    let child = node.first_child()?;
    if child.next_sibling().is_some() {
        return None;
    }
    let data = child.data.borrow();
    match &data.value {
        NodeValue::Text(text)
            if text == url || url.strip_prefix("mailto:") == Some(text.as_str()) =>
        {
            Some(text.clone())
        }
        _ => None,
    }
}
