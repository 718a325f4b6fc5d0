// SPDX-License-Identifier: AGPL-3.0-or-later
//! Word-processing document model
//!
//! The model mirrors the shape of a WordprocessingML package: a body of
//! paragraphs and tables, a style registry, numbering definitions, a footer
//! and document settings. The transducer only ever writes into it; open
//! elements are addressed through small `Copy` handles rather than borrows so
//! that the transducer can keep several "current" slots at once.

use serde::Serialize;

/// Id of the style applied to ordinary body paragraphs
pub const BODY_DEFAULT: &str = "BodyDefault";
pub const CAPTION: &str = "Caption";
pub const CODE: &str = "Code";
pub const HYPERLINK: &str = "Hyperlink";
pub const TABLE_NORMAL: &str = "TableNormal";

/// Id of the paragraph style for a heading level
pub fn heading_style(level: u8) -> String {
    format!("Heading{level}")
}

/// The root of the output document
#[derive(Debug, Clone, Default, Serialize)]
pub struct Document {
    pub settings: Settings,
    pub styles: StyleRegistry,
    pub numbering: Numbering,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub footer: Option<Footer>,
    pub body: Vec<BodyElement>,
    pub images: Vec<ImageData>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Settings {
    /// Ask the word processor to recompute fields (TOC, page numbers) on open
    pub update_fields_on_open: bool,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Footer {
    pub paragraphs: Vec<Paragraph>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BodyElement {
    Paragraph(Paragraph),
    Table(Table),
}

// ---------------------------------------------------------------------------
// Styles
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StyleKind {
    Paragraph,
    Character,
    Table,
}

#[derive(Debug, Clone, Serialize)]
pub struct Style {
    pub id: String,
    pub name: String,
    pub kind: StyleKind,
    /// Marks the default style of its kind
    pub is_default: bool,
    pub based_on: Option<String>,
    pub next: Option<String>,
    pub paragraph: ParagraphProperties,
    pub run: RunProperties,
}

impl Style {
    pub fn new(id: &str, kind: StyleKind) -> Self {
        Self {
            id: id.to_string(),
            name: id.to_string(),
            kind,
            is_default: false,
            based_on: None,
            next: None,
            paragraph: ParagraphProperties::default(),
            run: RunProperties::default(),
        }
    }
}

/// Named styles in registration order
#[derive(Debug, Clone, Default, Serialize)]
pub struct StyleRegistry {
    styles: Vec<Style>,
}

impl StyleRegistry {
    /// Register a style, replacing any previous style with the same id
    pub fn add(&mut self, style: Style) -> &mut Style {
        let index = match self.styles.iter().position(|s| s.id == style.id) {
            Some(index) => {
                self.styles[index] = style;
                index
            }
            None => {
                self.styles.push(style);
                self.styles.len() - 1
            }
        };
        &mut self.styles[index]
    }

    pub fn get(&self, id: &str) -> Option<&Style> {
        self.styles.iter().find(|s| s.id == id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Style> {
        self.styles.iter_mut().find(|s| s.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Style> {
        self.styles.iter()
    }

    pub fn len(&self) -> usize {
        self.styles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.styles.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Numbering
// ---------------------------------------------------------------------------

/// Reference to a numbering definition registered in [`Numbering`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct NumberingId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NumberFormat {
    Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct NumberingLevel {
    /// Zero-based level index (`ilvl`)
    pub level: u8,
    pub format: NumberFormat,
    /// Display text with `%n` placeholders for ancestor counters
    pub text: String,
    pub alignment: Alignment,
    /// Paragraph style bound to this level
    pub style: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NumberingDefinition {
    pub id: NumberingId,
    pub levels: Vec<NumberingLevel>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Numbering {
    definitions: Vec<NumberingDefinition>,
}

impl Numbering {
    pub fn add_definition(&mut self) -> &mut NumberingDefinition {
        let id = NumberingId(self.definitions.len() + 1);
        self.definitions.push(NumberingDefinition {
            id,
            levels: Vec::new(),
        });
        let last = self.definitions.len() - 1;
        &mut self.definitions[last]
    }

    pub fn definitions(&self) -> &[NumberingDefinition] {
        &self.definitions
    }

    pub fn get(&self, id: NumberingId) -> Option<&NumberingDefinition> {
        self.definitions.iter().find(|d| d.id == id)
    }
}

/// Numbering applied to one paragraph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NumberingRef {
    pub definition: NumberingId,
    pub level: u8,
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BorderStyle {
    Single,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Border {
    pub style: BorderStyle,
    pub color: String,
    /// Width in points
    pub width: u32,
}

impl Border {
    pub fn single(color: &str, width: u32) -> Self {
        Self {
            style: BorderStyle::Single,
            color: color.to_string(),
            width,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Borders {
    pub top: Border,
    pub bottom: Border,
    pub left: Border,
    pub right: Border,
}

impl Borders {
    pub fn all(border: Border) -> Self {
        Self {
            top: border.clone(),
            bottom: border.clone(),
            left: border.clone(),
            right: border,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Spacing {
    pub before: u32,
    pub after: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TabStop {
    pub position_inches: f64,
    pub alignment: Alignment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionBreak {
    NextPage,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ParagraphProperties {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alignment: Option<Alignment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spacing: Option<Spacing>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub borders: Option<Borders>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub numbering: Option<NumberingRef>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub page_break_before: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tab_stops: Vec<TabStop>,
    /// Ends the current section after this paragraph
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section_break: Option<SectionBreak>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Underline {
    pub color: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunProperties {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font: Option<String>,
    /// Size in points
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u32>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub bold: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub italic: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub underline: Option<Underline>,
}

impl RunProperties {
    pub fn styled(style: &str) -> Self {
        Self {
            style: Some(style.to_string()),
            ..Self::default()
        }
    }
}

// ---------------------------------------------------------------------------
// Paragraphs and runs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    CurrentPage,
    NumberOfPages,
    TableOfContents,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ImageId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TextWrap {
    TopAndBottom,
}

/// Image floating in the page, anchored to its run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnchoredDrawing {
    pub image: ImageId,
    pub width_emu: u64,
    pub height_emu: u64,
    pub horizontal: Alignment,
    pub wrap: TextWrap,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum RunContent {
    Text(String),
    Break,
    Tab,
    Field(FieldKind),
    Drawing(AnchoredDrawing),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Run {
    pub properties: RunProperties,
    pub content: Vec<RunContent>,
}

impl Run {
    pub fn with_properties(properties: RunProperties) -> Self {
        Self {
            properties,
            content: Vec::new(),
        }
    }

    pub fn add_text(&mut self, text: &str) {
        // Adjacent text appends merge so a run reads as one span
        if let Some(RunContent::Text(existing)) = self.content.last_mut() {
            existing.push_str(text);
        } else {
            self.content.push(RunContent::Text(text.to_string()));
        }
    }

    pub fn add_break(&mut self) {
        self.content.push(RunContent::Break);
    }

    pub fn add_tab(&mut self) {
        self.content.push(RunContent::Tab);
    }

    pub fn add_field(&mut self, field: FieldKind) {
        self.content.push(RunContent::Field(field));
    }

    pub fn add_drawing(&mut self, drawing: AnchoredDrawing) {
        self.content.push(RunContent::Drawing(drawing));
    }

    /// Concatenated text content
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(|c| match c {
                RunContent::Text(t) => Some(t.as_str()),
                _ => None,
            })
            .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Hyperlink {
    pub target: String,
    pub runs: Vec<Run>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ParagraphChild {
    Run(Run),
    Hyperlink(Hyperlink),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Paragraph {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    pub properties: ParagraphProperties,
    pub children: Vec<ParagraphChild>,
}

impl Paragraph {
    pub fn styled(style: &str) -> Self {
        Self {
            style: Some(style.to_string()),
            ..Self::default()
        }
    }

    pub fn add_run(&mut self, properties: RunProperties) -> &mut Run {
        self.children
            .push(ParagraphChild::Run(Run::with_properties(properties)));
        match self.children.last_mut() {
            Some(ParagraphChild::Run(run)) => run,
            _ => unreachable!("a run was just pushed"),
        }
    }

    /// All runs, including those nested in hyperlinks, in document order
    pub fn runs(&self) -> impl Iterator<Item = &Run> {
        self.children.iter().flat_map(|child| match child {
            ParagraphChild::Run(run) => std::slice::from_ref(run).iter(),
            ParagraphChild::Hyperlink(link) => link.runs.iter(),
        })
    }

    /// Concatenated text of every run
    pub fn text(&self) -> String {
        self.runs().map(Run::text).collect()
    }
}

// ---------------------------------------------------------------------------
// Tables
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Cell {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub borders: Option<Borders>,
    pub paragraphs: Vec<Paragraph>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Row {
    pub cells: Vec<Cell>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Table {
    pub style: Option<String>,
    pub rows: Vec<Row>,
}

// ---------------------------------------------------------------------------
// Images
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Png,
    Jpeg,
    Gif,
}

impl ImageFormat {
    pub const fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpeg",
            Self::Gif => "gif",
        }
    }

    pub const fn content_type(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::Gif => "image/gif",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageData {
    pub id: ImageId,
    pub format: ImageFormat,
    pub width_px: u32,
    pub height_px: u32,
    #[serde(skip)]
    pub bytes: Vec<u8>,
}

impl ImageData {
    /// Part name inside the package's media folder
    pub fn file_name(&self) -> String {
        format!("image{}.{}", self.id.0, self.format.extension())
    }
}

// ---------------------------------------------------------------------------
// Handles
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableHandle(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowHandle {
    table: usize,
    row: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellHandle {
    table: usize,
    row: usize,
    cell: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParagraphHandle {
    Body(usize),
    Cell { cell: CellHandle, paragraph: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunSlot {
    Direct(usize),
    Hyperlink { child: usize, run: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunHandle {
    paragraph: ParagraphHandle,
    slot: RunSlot,
}

impl RunHandle {
    /// Paragraph the run was created in
    pub fn paragraph(&self) -> ParagraphHandle {
        self.paragraph
    }
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a body paragraph
    pub fn add_paragraph(&mut self, paragraph: Paragraph) -> ParagraphHandle {
        self.body.push(BodyElement::Paragraph(paragraph));
        ParagraphHandle::Body(self.body.len() - 1)
    }

    pub fn paragraph_mut(&mut self, handle: ParagraphHandle) -> Option<&mut Paragraph> {
        match handle {
            ParagraphHandle::Body(index) => match self.body.get_mut(index)? {
                BodyElement::Paragraph(p) => Some(p),
                BodyElement::Table(_) => None,
            },
            ParagraphHandle::Cell { cell, paragraph } => {
                self.cell_mut(cell)?.paragraphs.get_mut(paragraph)
            }
        }
    }

    /// Append a run to an open paragraph
    pub fn add_run(
        &mut self,
        paragraph: ParagraphHandle,
        properties: RunProperties,
    ) -> Option<RunHandle> {
        let p = self.paragraph_mut(paragraph)?;
        p.add_run(properties);
        Some(RunHandle {
            paragraph,
            slot: RunSlot::Direct(p.children.len() - 1),
        })
    }

    /// Append a hyperlink holding one run with the given properties
    pub fn add_hyperlink(
        &mut self,
        paragraph: ParagraphHandle,
        target: &str,
        properties: RunProperties,
    ) -> Option<RunHandle> {
        let p = self.paragraph_mut(paragraph)?;
        p.children.push(ParagraphChild::Hyperlink(Hyperlink {
            target: target.to_string(),
            runs: vec![Run::with_properties(properties)],
        }));
        Some(RunHandle {
            paragraph,
            slot: RunSlot::Hyperlink {
                child: p.children.len() - 1,
                run: 0,
            },
        })
    }

    pub fn run_mut(&mut self, handle: RunHandle) -> Option<&mut Run> {
        let p = self.paragraph_mut(handle.paragraph)?;
        match handle.slot {
            RunSlot::Direct(index) => match p.children.get_mut(index)? {
                ParagraphChild::Run(run) => Some(run),
                ParagraphChild::Hyperlink(_) => None,
            },
            RunSlot::Hyperlink { child, run } => match p.children.get_mut(child)? {
                ParagraphChild::Hyperlink(link) => link.runs.get_mut(run),
                ParagraphChild::Run(_) => None,
            },
        }
    }

    pub fn add_table(&mut self, table: Table) -> TableHandle {
        self.body.push(BodyElement::Table(table));
        TableHandle(self.body.len() - 1)
    }

    fn table_mut(&mut self, handle: TableHandle) -> Option<&mut Table> {
        match self.body.get_mut(handle.0)? {
            BodyElement::Table(t) => Some(t),
            BodyElement::Paragraph(_) => None,
        }
    }

    pub fn add_row(&mut self, table: TableHandle) -> Option<RowHandle> {
        let t = self.table_mut(table)?;
        t.rows.push(Row::default());
        Some(RowHandle {
            table: table.0,
            row: t.rows.len() - 1,
        })
    }

    pub fn add_cell(&mut self, row: RowHandle, cell: Cell) -> Option<CellHandle> {
        let r = self.table_mut(TableHandle(row.table))?.rows.get_mut(row.row)?;
        r.cells.push(cell);
        Some(CellHandle {
            table: row.table,
            row: row.row,
            cell: r.cells.len() - 1,
        })
    }

    fn cell_mut(&mut self, handle: CellHandle) -> Option<&mut Cell> {
        self.table_mut(TableHandle(handle.table))?
            .rows
            .get_mut(handle.row)?
            .cells
            .get_mut(handle.cell)
    }

    /// Append a paragraph inside a table cell
    pub fn add_cell_paragraph(
        &mut self,
        cell: CellHandle,
        paragraph: Paragraph,
    ) -> Option<ParagraphHandle> {
        let c = self.cell_mut(cell)?;
        c.paragraphs.push(paragraph);
        Some(ParagraphHandle::Cell {
            cell,
            paragraph: c.paragraphs.len() - 1,
        })
    }

    /// Register image bytes with the document
    pub fn add_image(
        &mut self,
        format: ImageFormat,
        width_px: u32,
        height_px: u32,
        bytes: Vec<u8>,
    ) -> ImageId {
        let id = ImageId(self.images.len() + 1);
        self.images.push(ImageData {
            id,
            format,
            width_px,
            height_px,
            bytes,
        });
        id
    }

    /// Body paragraphs in order, skipping tables
    pub fn paragraphs(&self) -> impl Iterator<Item = &Paragraph> {
        self.body.iter().filter_map(|e| match e {
            BodyElement::Paragraph(p) => Some(p),
            BodyElement::Table(_) => None,
        })
    }

    /// Body tables in order
    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.body.iter().filter_map(|e| match e {
            BodyElement::Table(t) => Some(t),
            BodyElement::Paragraph(_) => None,
        })
    }

    /// Pretty JSON rendering of the model, for inspection
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_text_merges_appends() {
        let mut doc = Document::new();
        let p = doc.add_paragraph(Paragraph::styled(BODY_DEFAULT));
        let run = doc.add_run(p, RunProperties::default()).unwrap();
        doc.run_mut(run).unwrap().add_text("hel");
        doc.run_mut(run).unwrap().add_text("lo");

        let para = doc.paragraphs().next().unwrap();
        assert_eq!(para.children.len(), 1);
        assert_eq!(para.text(), "hello");
    }

    #[test]
    fn test_hyperlink_run_handle() {
        let mut doc = Document::new();
        let p = doc.add_paragraph(Paragraph::default());
        let run = doc
            .add_hyperlink(p, "https://example.com", RunProperties::styled(HYPERLINK))
            .unwrap();
        doc.run_mut(run).unwrap().add_text("example");

        let para = doc.paragraphs().next().unwrap();
        match &para.children[0] {
            ParagraphChild::Hyperlink(link) => {
                assert_eq!(link.target, "https://example.com");
                assert_eq!(link.runs[0].text(), "example");
            }
            other => panic!("Expected hyperlink, got {other:?}"),
        }
    }

    #[test]
    fn test_cell_paragraph_handles() {
        let mut doc = Document::new();
        let table = doc.add_table(Table::default());
        let row = doc.add_row(table).unwrap();
        let cell = doc.add_cell(row, Cell::default()).unwrap();
        let p = doc.add_cell_paragraph(cell, Paragraph::default()).unwrap();
        let run = doc.add_run(p, RunProperties::default()).unwrap();
        doc.run_mut(run).unwrap().add_text("x");

        let t = doc.tables().next().unwrap();
        assert_eq!(t.rows[0].cells[0].paragraphs[0].text(), "x");
    }

    #[test]
    fn test_stale_handle_is_none() {
        let mut doc = Document::new();
        let table = doc.add_table(Table::default());
        // A table slot is not a paragraph
        assert!(doc.paragraph_mut(ParagraphHandle::Body(0)).is_none());
        assert!(doc.add_row(table).is_some());
        assert!(doc.add_row(TableHandle(7)).is_none());
    }

    #[test]
    fn test_style_registry_replaces_by_id() {
        let mut styles = StyleRegistry::default();
        styles.add(Style::new(CODE, StyleKind::Paragraph));
        styles.add(Style::new(CODE, StyleKind::Character));
        assert_eq!(styles.len(), 1);
        assert_eq!(styles.get(CODE).unwrap().kind, StyleKind::Character);
    }
}
