// SPDX-License-Identifier: AGPL-3.0-or-later
//! Context-stack transducer
//!
//! Consumes the enter/exit event stream in document order and builds the
//! document model incrementally. All nesting state lives in explicit slots
//! (current paragraph, run, table, row and cell) and in the stack of active
//! list numbering contexts; the transducer has no recursion of its own.
//!
//! One transducer converts exactly one document. Every rule either succeeds
//! or aborts the whole conversion with a typed [`ConversionError`].

use crate::ast::{NodeEvent, NodeKind, NodeVisitor, Phase, WalkStatus};
use crate::bootstrap;
use crate::images::{self, ImageSource};
use crate::model::{
    self, Alignment, AnchoredDrawing, Border, Borders, Cell, CellHandle, Document, NumberingId,
    NumberingRef, Paragraph, ParagraphHandle, RowHandle, RunHandle, RunProperties, Table,
    TableHandle, TextWrap,
};
use crate::traits::{At, ConversionError, ConvertConfig, Result};
use tracing::{debug, trace};

const EMU_PER_INCH: u64 = 914_400;
/// Pixels are laid out at 96 dpi
const EMU_PER_PIXEL: u64 = 9_525;

/// Streaming tree-to-document transducer
pub struct Transducer<'s> {
    doc: Document,
    config: ConvertConfig,
    images: &'s dyn ImageSource,
    state: Lifecycle,
    numbering: Option<NumberingId>,
    current_paragraph: Option<ParagraphHandle>,
    current_run: Option<RunHandle>,
    current_table: Option<TableHandle>,
    current_row: Option<RowHandle>,
    /// Number of row-opening nodes currently entered; a TableRow nested in a
    /// TableHeader shares the header's row
    row_depth: usize,
    current_cell: Option<CellHandle>,
    list_stack: Vec<NumberingId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lifecycle {
    Fresh,
    Open,
    Closed,
}

impl<'s> Transducer<'s> {
    pub fn new(config: ConvertConfig, images: &'s dyn ImageSource) -> Self {
        Self {
            doc: Document::new(),
            config,
            images,
            state: Lifecycle::Fresh,
            numbering: None,
            current_paragraph: None,
            current_run: None,
            current_table: None,
            current_row: None,
            row_depth: 0,
            current_cell: None,
            list_stack: Vec::new(),
        }
    }

    /// Current list nesting depth
    pub fn list_depth(&self) -> usize {
        self.list_stack.len()
    }

    /// Hand the finished model over to the encoder
    pub fn finish(self) -> Result<Document> {
        if self.state != Lifecycle::Closed {
            return Err(violation(
                "Document",
                At(None),
                "walk ended before the Document node was exited",
            ));
        }
        Ok(self.doc)
    }

    fn enter(&mut self, node: &NodeKind<'_>, at: At) -> Result<WalkStatus> {
        let kind = node.name();
        match node {
            NodeKind::Document => {
                if self.state != Lifecycle::Fresh {
                    return Err(violation(kind, at, "document already bootstrapped"));
                }
                self.numbering = Some(bootstrap::bootstrap(&mut self.doc, &self.config));
                self.state = Lifecycle::Open;
            }

            NodeKind::Heading { level } => {
                self.require_no_paragraph(kind, at)?;
                if !(1..=bootstrap::MAX_HEADING_LEVEL).contains(level) {
                    return Err(violation(
                        kind,
                        at,
                        format!("heading level {level} has no style"),
                    ));
                }
                self.open_paragraph(Paragraph::styled(&model::heading_style(*level)));
            }

            NodeKind::Blockquote => {
                self.require_no_paragraph(kind, at)?;
                self.open_paragraph(Paragraph::styled(model::CAPTION));
            }

            NodeKind::CodeBlock { lines } | NodeKind::FencedCodeBlock { lines } => {
                self.require_no_paragraph(kind, at)?;
                let para = self.open_paragraph(Paragraph::styled(model::CODE));
                for line in lines {
                    let run = self
                        .doc
                        .add_run(para, RunProperties::default())
                        .ok_or_else(|| stale(kind, at))?;
                    let run = self.doc.run_mut(run).ok_or_else(|| stale(kind, at))?;
                    run.add_text(line);
                    run.add_break();
                }
            }

            // Rejected in `visit` before dispatch
            NodeKind::HtmlBlock | NodeKind::ThematicBreak | NodeKind::RawHtml => {}

            NodeKind::List { ordered } => {
                let numbering = self
                    .numbering
                    .ok_or_else(|| violation(kind, at, "no numbering definition registered"))?;
                // Ordered and unordered lists share the heading numbering definition
                trace!(ordered, depth = self.list_stack.len() + 1, "list opened");
                self.list_stack.push(numbering);
            }

            NodeKind::ListItem => {
                let definition = *self
                    .list_stack
                    .last()
                    .ok_or_else(|| violation(kind, at, "list item outside of a list"))?;
                let level = u8::try_from(self.list_stack.len() - 1)
                    .map_err(|_| violation(kind, at, "list nesting too deep"))?;
                let mut para = Paragraph::default();
                para.properties.numbering = Some(NumberingRef { definition, level });
                self.open_paragraph(para);
            }

            NodeKind::Paragraph => {
                if self.current_paragraph.is_none() {
                    self.open_paragraph(Paragraph::styled(model::BODY_DEFAULT));
                }
            }

            NodeKind::TextBlock => {
                self.ensure_run(kind, at)?;
            }

            NodeKind::AutoLink { url, label } => {
                let para = self.ensure_paragraph();
                let run = self
                    .doc
                    .add_hyperlink(para, url, RunProperties::styled(model::HYPERLINK))
                    .ok_or_else(|| stale(kind, at))?;
                self.doc
                    .run_mut(run)
                    .ok_or_else(|| stale(kind, at))?
                    .add_text(label);
            }

            NodeKind::CodeSpan => {
                let para = self.ensure_paragraph();
                let properties = RunProperties {
                    font: Some(self.config.code_font.clone()),
                    size: Some(10),
                    ..RunProperties::default()
                };
                let run = self
                    .doc
                    .add_run(para, properties)
                    .ok_or_else(|| stale(kind, at))?;
                self.current_run = Some(run);
            }

            NodeKind::Emphasis { .. } => {
                let para = self.ensure_paragraph();
                let properties = RunProperties {
                    bold: true,
                    ..RunProperties::default()
                };
                let run = self
                    .doc
                    .add_run(para, properties)
                    .ok_or_else(|| stale(kind, at))?;
                self.current_run = Some(run);
            }

            NodeKind::Link { destination } => {
                let para = self.ensure_paragraph();
                let target = escape_destination(destination);
                let run = self
                    .doc
                    .add_hyperlink(para, &target, RunProperties::styled(model::HYPERLINK))
                    .ok_or_else(|| stale(kind, at))?;
                self.current_run = Some(run);
            }

            NodeKind::Image { destination } => {
                self.add_image(destination, kind, at)?;
                return Ok(WalkStatus::SkipChildren);
            }

            NodeKind::Text {
                literal,
                hard_break,
            } => {
                let run = self.ensure_run(kind, at)?;
                let run = self.doc.run_mut(run).ok_or_else(|| stale(kind, at))?;
                if !literal.is_empty() {
                    run.add_text(literal);
                }
                if *hard_break {
                    run.add_break();
                }
            }

            NodeKind::StringLiteral { value } => {
                let run = self.ensure_run(kind, at)?;
                self.doc
                    .run_mut(run)
                    .ok_or_else(|| stale(kind, at))?
                    .add_text(value);
            }

            NodeKind::Table => {
                if self.current_table.is_some() {
                    return Err(violation(kind, at, "table opened inside another table"));
                }
                let table = self.doc.add_table(Table {
                    style: Some(model::TABLE_NORMAL.to_string()),
                    rows: Vec::new(),
                });
                self.current_table = Some(table);
            }

            NodeKind::TableHeader | NodeKind::TableRow => {
                let table = self
                    .current_table
                    .ok_or_else(|| violation(kind, at, "row outside of a table"))?;
                if self.current_row.is_none() {
                    let row = self.doc.add_row(table).ok_or_else(|| stale(kind, at))?;
                    self.current_row = Some(row);
                }
                self.row_depth += 1;
            }

            NodeKind::TableCell => {
                let row = match (self.current_table, self.current_row) {
                    (Some(_), Some(row)) => row,
                    _ => return Err(violation(kind, at, "cell outside of a table row")),
                };
                let cell = self
                    .doc
                    .add_cell(
                        row,
                        Cell {
                            borders: Some(Borders::all(Border::single("000000", 1))),
                            paragraphs: Vec::new(),
                        },
                    )
                    .ok_or_else(|| stale(kind, at))?;
                let para = self
                    .doc
                    .add_cell_paragraph(cell, Paragraph::default())
                    .ok_or_else(|| stale(kind, at))?;
                self.current_cell = Some(cell);
                self.current_paragraph = Some(para);
                self.current_run = None;
            }
        }
        Ok(WalkStatus::Continue)
    }

    fn exit(&mut self, node: &NodeKind<'_>, at: At) -> Result<()> {
        let kind = node.name();
        match node {
            NodeKind::Document => {
                if !self.list_stack.is_empty() || self.current_table.is_some() {
                    return Err(violation(kind, at, "containers still open at end of document"));
                }
                self.close_paragraph();
                self.state = Lifecycle::Closed;
            }

            NodeKind::Heading { .. }
            | NodeKind::Blockquote
            | NodeKind::CodeBlock { .. }
            | NodeKind::FencedCodeBlock { .. }
            | NodeKind::ListItem
            | NodeKind::Paragraph => self.close_paragraph(),

            // Rejected in `visit` before dispatch
            NodeKind::HtmlBlock | NodeKind::ThematicBreak | NodeKind::RawHtml => {}

            NodeKind::List { .. } => {
                if self.list_stack.pop().is_none() {
                    return Err(violation(kind, at, "list exited more often than entered"));
                }
            }

            NodeKind::TextBlock => {
                self.ensure_run(kind, at)?;
                self.current_run = None;
            }

            NodeKind::CodeSpan
            | NodeKind::Emphasis { .. }
            | NodeKind::Link { .. }
            | NodeKind::Text { .. } => self.current_run = None,

            NodeKind::AutoLink { .. } | NodeKind::Image { .. } | NodeKind::StringLiteral { .. } => {}

            NodeKind::Table => {
                self.current_table = None;
                self.current_row = None;
                self.row_depth = 0;
                self.current_cell = None;
            }

            NodeKind::TableHeader | NodeKind::TableRow => {
                self.row_depth = self
                    .row_depth
                    .checked_sub(1)
                    .ok_or_else(|| violation(kind, at, "row exited more often than entered"))?;
                if self.row_depth == 0 {
                    self.current_row = None;
                    self.current_cell = None;
                }
            }

            NodeKind::TableCell => {
                self.current_cell = None;
                self.close_paragraph();
            }
        }
        Ok(())
    }

    fn require_no_paragraph(&self, kind: &'static str, at: At) -> Result<()> {
        if self.current_paragraph.is_some() {
            return Err(violation(kind, at, "a paragraph is already open"));
        }
        Ok(())
    }

    fn open_paragraph(&mut self, paragraph: Paragraph) -> ParagraphHandle {
        let handle = self.doc.add_paragraph(paragraph);
        self.current_paragraph = Some(handle);
        self.current_run = None;
        handle
    }

    fn close_paragraph(&mut self) {
        self.current_paragraph = None;
        self.current_run = None;
    }

    /// The open paragraph, creating a default-styled one if none is open
    fn ensure_paragraph(&mut self) -> ParagraphHandle {
        match self.current_paragraph {
            Some(handle) => handle,
            None => self.open_paragraph(Paragraph::styled(model::BODY_DEFAULT)),
        }
    }

    /// The open run, creating one in the open paragraph if none is open
    fn ensure_run(&mut self, kind: &'static str, at: At) -> Result<RunHandle> {
        let para = self.ensure_paragraph();
        if let Some(run) = self.current_run {
            if run.paragraph() != para {
                return Err(violation(kind, at, "open run belongs to another paragraph"));
            }
            return Ok(run);
        }
        let run = self
            .doc
            .add_run(para, RunProperties::default())
            .ok_or_else(|| stale(kind, at))?;
        self.current_run = Some(run);
        Ok(run)
    }

    fn add_image(&mut self, destination: &str, kind: &'static str, at: At) -> Result<()> {
        let resource = |source| ConversionError::ResourceError {
            kind,
            at,
            reference: destination.to_string(),
            source,
        };
        let bytes = self.images.load(destination).map_err(resource)?;
        let info = images::sniff(&bytes).map_err(resource)?;
        let (width_emu, height_emu) = drawing_extent(
            info.width,
            info.height,
            self.config.image_max_width_inches,
        );
        let image = self
            .doc
            .add_image(info.format, info.width, info.height, bytes);
        debug!(destination, width = info.width, height = info.height, "image registered");

        let para = self.ensure_paragraph();
        let run = self
            .doc
            .add_run(para, RunProperties::default())
            .ok_or_else(|| stale(kind, at))?;
        self.doc
            .run_mut(run)
            .ok_or_else(|| stale(kind, at))?
            .add_drawing(AnchoredDrawing {
                image,
                width_emu,
                height_emu,
                horizontal: Alignment::Center,
                wrap: TextWrap::TopAndBottom,
            });
        Ok(())
    }
}

impl NodeVisitor for Transducer<'_> {
    type Error = ConversionError;

    fn visit(&mut self, event: &NodeEvent<'_>) -> Result<WalkStatus> {
        let at = At(event.position);
        let kind = event.node.name();
        match (self.state, &event.node) {
            (Lifecycle::Fresh, NodeKind::Document) | (Lifecycle::Open, _) => {}
            (Lifecycle::Fresh, _) => {
                return Err(violation(kind, at, "content before the Document node"));
            }
            (Lifecycle::Closed, _) => {
                return Err(violation(kind, at, "document already finished"));
            }
        }
        if event.node.is_disallowed() {
            return Err(ConversionError::DisallowedContent { kind, at });
        }

        debug!(
            kind,
            phase = ?event.phase,
            lists = self.list_stack.len(),
            "node event"
        );
        match event.phase {
            Phase::Entering => self.enter(&event.node, at),
            Phase::Exiting => self.exit(&event.node, at).map(|()| WalkStatus::Continue),
        }
    }
}

fn violation(kind: &'static str, at: At, message: impl Into<String>) -> ConversionError {
    ConversionError::InvariantViolation {
        kind,
        at,
        message: message.into(),
    }
}

fn stale(kind: &'static str, at: At) -> ConversionError {
    violation(kind, at, "open element no longer addressable")
}

/// Drawing size in EMU, scaled down to fit the maximum width
fn drawing_extent(width_px: u32, height_px: u32, max_width_inches: f64) -> (u64, u64) {
    let width = u64::from(width_px) * EMU_PER_PIXEL;
    let height = u64::from(height_px) * EMU_PER_PIXEL;
    let max_width = (max_width_inches * EMU_PER_INCH as f64) as u64;
    if width > max_width && width > 0 {
        let scaled = (height as f64 * max_width as f64 / width as f64).round() as u64;
        (max_width, scaled)
    } else {
        (width, height)
    }
}

fn is_url_safe(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || "-_.!~*'();/?:@&=+$,#[]".contains(ch)
}

/// Percent-escape a link destination, keeping reserved characters and
/// existing `%XX` escapes intact
pub fn escape_destination(destination: &str) -> String {
    let bytes = destination.as_bytes();
    let mut out = String::with_capacity(destination.len());
    for (i, ch) in destination.char_indices() {
        let is_escape = ch == '%'
            && bytes
                .get(i + 1..i + 3)
                .is_some_and(|hex| hex.iter().all(u8::is_ascii_hexdigit));
        if is_url_safe(ch) || is_escape {
            out.push(ch);
        } else {
            let mut buf = [0u8; 4];
            out.push_str(&urlencoding::encode(ch.encode_utf8(&mut buf)));
        }
    }
    out
}


#[cfg(test)]
mod proptests {
    use super::*;
    use crate::images::tests::MemoryImages;
    use crate::model::BodyElement;
    use proptest::prelude::*;

    /// Shape of a randomly generated block
    #[derive(Debug, Clone)]
    enum Shape {
        Para,
        List(bool, Vec<Vec<Shape>>),
        Quote,
        Disallowed(u8),
    }

    fn shape_strategy() -> impl Strategy<Value = Shape> {
        let leaf = prop_oneof![Just(Shape::Para), Just(Shape::Quote)];
        leaf.prop_recursive(4, 32, 4, |inner| {
            (
                any::<bool>(),
                prop::collection::vec(prop::collection::vec(inner, 0..3), 1..3),
            )
                .prop_map(|(ordered, items)| Shape::List(ordered, items))
        })
    }

    fn emit(shape: &Shape, out: &mut Vec<NodeEvent<'static>>) {
        let text = NodeKind::Text {
            literal: "t",
            hard_break: false,
        };
        match shape {
            Shape::Para => {
                out.push(NodeEvent::entering(NodeKind::Paragraph));
                out.push(NodeEvent::entering(text.clone()));
                out.push(NodeEvent::exiting(text));
                out.push(NodeEvent::exiting(NodeKind::Paragraph));
            }
            Shape::Quote => {
                out.push(NodeEvent::entering(NodeKind::Blockquote));
                out.push(NodeEvent::entering(text.clone()));
                out.push(NodeEvent::exiting(text));
                out.push(NodeEvent::exiting(NodeKind::Blockquote));
            }
            Shape::List(ordered, items) => {
                let list = NodeKind::List { ordered: *ordered };
                out.push(NodeEvent::entering(list.clone()));
                for item in items {
                    out.push(NodeEvent::entering(NodeKind::ListItem));
                    // Loose item: its own paragraph closes before nested blocks
                    emit(&Shape::Para, out);
                    for child in item {
                        emit(child, out);
                    }
                    out.push(NodeEvent::exiting(NodeKind::ListItem));
                }
                out.push(NodeEvent::exiting(list));
            }
            Shape::Disallowed(which) => {
                let node = match which % 3 {
                    0 => NodeKind::ThematicBreak,
                    1 => NodeKind::RawHtml,
                    _ => NodeKind::HtmlBlock,
                };
                out.push(NodeEvent::entering(node.clone()));
                out.push(NodeEvent::exiting(node));
            }
        }
    }

    fn events_for(shapes: &[Shape]) -> Vec<NodeEvent<'static>> {
        let mut events = vec![NodeEvent::entering(NodeKind::Document)];
        for shape in shapes {
            emit(shape, &mut events);
        }
        events.push(NodeEvent::exiting(NodeKind::Document));
        events
    }

    /// Insert a disallowed node at `position` inside the nth list item, or at top level
    fn with_disallowed(mut shapes: Vec<Shape>, which: u8, position: usize) -> Vec<Shape> {
        fn insert(shapes: &mut Vec<Shape>, node: Shape, position: usize) -> bool {
            for shape in shapes.iter_mut() {
                if let Shape::List(_, items) = shape {
                    let count = items.len().max(1);
                    if let Some(item) = items.get_mut(position % count) {
                        if !insert(item, node.clone(), position / 2) {
                            item.push(node);
                        }
                        return true;
                    }
                }
            }
            false
        }
        let node = Shape::Disallowed(which);
        if !insert(&mut shapes, node.clone(), position) {
            let at = position % (shapes.len() + 1);
            shapes.insert(at, node);
        }
        shapes
    }

    proptest! {
        // List stack depth tracks open List ancestors and is empty at the end
        #[test]
        fn prop_list_stack_balanced(shapes in prop::collection::vec(shape_strategy(), 0..5)) {
            let images = MemoryImages::default();
            let mut transducer = Transducer::new(ConvertConfig::default(), &images);
            let mut open_lists = 0usize;
            for event in events_for(&shapes) {
                if let NodeKind::List { .. } = event.node {
                    if event.phase == Phase::Entering { open_lists += 1 } else { open_lists -= 1 }
                }
                transducer.visit(&event).unwrap();
                prop_assert_eq!(transducer.list_depth(), open_lists);
            }
            prop_assert_eq!(transducer.list_depth(), 0);
            prop_assert!(transducer.finish().is_ok());
        }

        // List item paragraphs carry level = depth - 1 of the sole definition
        #[test]
        fn prop_list_levels_match_depth(shapes in prop::collection::vec(shape_strategy(), 0..5)) {
            let images = MemoryImages::default();
            let mut transducer = Transducer::new(ConvertConfig::default(), &images);
            let mut expected_levels = Vec::new();
            let mut depth = 0usize;
            for event in events_for(&shapes) {
                match (&event.node, event.phase) {
                    (NodeKind::List { .. }, Phase::Entering) => depth += 1,
                    (NodeKind::List { .. }, Phase::Exiting) => depth -= 1,
                    (NodeKind::ListItem, Phase::Entering) => expected_levels.push(depth as u8 - 1),
                    _ => {}
                }
                transducer.visit(&event).unwrap();
            }
            let doc = transducer.finish().unwrap();
            let sole = doc.numbering.definitions()[0].id;
            let levels: Vec<u8> = doc
                .paragraphs()
                .filter_map(|p| p.properties.numbering)
                .map(|n| {
                    assert_eq!(n.definition, sole);
                    n.level
                })
                .collect();
            prop_assert_eq!(levels, expected_levels);
        }

        // A disallowed node anywhere aborts with DisallowedContent
        #[test]
        fn prop_disallowed_anywhere(
            shapes in prop::collection::vec(shape_strategy(), 0..4),
            which in 0u8..3,
            position in 0usize..16,
        ) {
            let shapes = with_disallowed(shapes, which, position);
            let images = MemoryImages::default();
            let mut transducer = Transducer::new(ConvertConfig::default(), &images);
            let outcome = events_for(&shapes)
                .iter()
                .try_for_each(|event| transducer.visit(event).map(|_| ()));
            let err = outcome.unwrap_err();
            prop_assert_eq!(err.kind_name(), "DisallowedContent");
        }

        // Every run lands in the paragraph that was open when its text arrived
        #[test]
        fn prop_runs_stay_in_their_paragraph(
            blocks in prop::collection::vec(block_strategy(), 0..6),
        ) {
            let words: Vec<String> = (0..blocks.iter().map(Block::word_count).sum::<usize>())
                .map(|i| format!("<{i}>"))
                .collect();
            let mut events = vec![NodeEvent::entering(NodeKind::Document)];
            let mut expected = Vec::new();
            let mut next = 0;
            for block in &blocks {
                emit_block(block, &words, &mut next, &mut events, &mut expected);
            }
            events.push(NodeEvent::exiting(NodeKind::Document));

            let images = MemoryImages::default();
            let mut transducer = Transducer::new(ConvertConfig::default(), &images);
            for event in &events {
                transducer.visit(event).unwrap();
            }
            let doc = transducer.finish().unwrap();
            prop_assert_eq!(paragraph_texts(&doc), expected);
        }
    }

    /// Inline content; every leaf carries one distinct word
    #[derive(Debug, Clone)]
    enum Inline {
        Text,
        Emphasis(usize),
        Link(usize),
        Code,
    }

    #[derive(Debug, Clone)]
    enum Block {
        Para(Vec<Inline>),
        Table(Vec<Vec<Vec<Inline>>>),
    }

    impl Inline {
        fn word_count(&self) -> usize {
            match self {
                Self::Text | Self::Code => 1,
                Self::Emphasis(n) | Self::Link(n) => *n,
            }
        }
    }

    impl Block {
        fn word_count(&self) -> usize {
            match self {
                Self::Para(inlines) => inlines.iter().map(Inline::word_count).sum(),
                Self::Table(rows) => rows.iter().flatten().flatten().map(Inline::word_count).sum(),
            }
        }
    }

    fn inline_strategy() -> impl Strategy<Value = Inline> {
        prop_oneof![
            Just(Inline::Text),
            (1usize..3).prop_map(Inline::Emphasis),
            (1usize..3).prop_map(Inline::Link),
            Just(Inline::Code),
        ]
    }

    fn block_strategy() -> impl Strategy<Value = Block> {
        let inlines = || prop::collection::vec(inline_strategy(), 0..4);
        prop_oneof![
            inlines().prop_map(Block::Para),
            prop::collection::vec(prop::collection::vec(inlines(), 1..3), 1..3)
                .prop_map(Block::Table),
        ]
    }

    fn emit_inlines<'a>(
        inlines: &[Inline],
        words: &'a [String],
        next: &mut usize,
        out: &mut Vec<NodeEvent<'a>>,
    ) -> String {
        let mut take = |out: &mut Vec<NodeEvent<'a>>, literal: bool| {
            let word = words[*next].as_str();
            *next += 1;
            let node = if literal {
                NodeKind::StringLiteral { value: word }
            } else {
                NodeKind::Text {
                    literal: word,
                    hard_break: false,
                }
            };
            out.push(NodeEvent::entering(node.clone()));
            out.push(NodeEvent::exiting(node));
            word
        };
        let mut text = String::new();
        for inline in inlines {
            let wrapper = match inline {
                Inline::Text => None,
                Inline::Code => Some(NodeKind::CodeSpan),
                Inline::Emphasis(_) => Some(NodeKind::Emphasis { level: 1 }),
                Inline::Link(_) => Some(NodeKind::Link {
                    destination: "https://example.com",
                }),
            };
            if let Some(node) = &wrapper {
                out.push(NodeEvent::entering(node.clone()));
            }
            match inline {
                Inline::Text => text.push_str(take(out, false)),
                Inline::Code => text.push_str(take(out, true)),
                Inline::Emphasis(n) | Inline::Link(n) => {
                    for _ in 0..*n {
                        text.push_str(take(out, false));
                    }
                }
            }
            if let Some(node) = wrapper {
                out.push(NodeEvent::exiting(node));
            }
        }
        text
    }

    fn emit_block<'a>(
        block: &Block,
        words: &'a [String],
        next: &mut usize,
        out: &mut Vec<NodeEvent<'a>>,
        expected: &mut Vec<String>,
    ) {
        match block {
            Block::Para(inlines) => {
                out.push(NodeEvent::entering(NodeKind::Paragraph));
                expected.push(emit_inlines(inlines, words, next, out));
                out.push(NodeEvent::exiting(NodeKind::Paragraph));
            }
            Block::Table(rows) => {
                out.push(NodeEvent::entering(NodeKind::Table));
                for (index, row) in rows.iter().enumerate() {
                    let row_kind = if index == 0 {
                        NodeKind::TableHeader
                    } else {
                        NodeKind::TableRow
                    };
                    out.push(NodeEvent::entering(row_kind.clone()));
                    for cell in row {
                        out.push(NodeEvent::entering(NodeKind::TableCell));
                        expected.push(emit_inlines(cell, words, next, out));
                        out.push(NodeEvent::exiting(NodeKind::TableCell));
                    }
                    out.push(NodeEvent::exiting(row_kind));
                }
                out.push(NodeEvent::exiting(NodeKind::Table));
            }
        }
    }

    /// Texts of content paragraphs and table cell paragraphs in document order
    fn paragraph_texts(doc: &Document) -> Vec<String> {
        // Bootstrap writes three front matter paragraphs
        doc.body[3..]
            .iter()
            .flat_map(|element| match element {
                BodyElement::Paragraph(p) => vec![p.text()],
                BodyElement::Table(t) => t
                    .rows
                    .iter()
                    .flat_map(|row| row.cells.iter())
                    .flat_map(|cell| cell.paragraphs.iter().map(|p| p.text()))
                    .collect(),
            })
            .collect()
    }
}
