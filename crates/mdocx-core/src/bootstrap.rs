// SPDX-License-Identifier: AGPL-3.0-or-later
//! Styles, heading numbering and fixed front/back matter
//!
//! Runs once per document, on the Document node's enter event, before any
//! content rule can reference a style or the numbering definition.

use crate::model::{
    self, Alignment, Border, Borders, Document, FieldKind, Footer, NumberFormat, NumberingId,
    NumberingLevel, NumberingRef, Paragraph, RunProperties, SectionBreak, Spacing, Style,
    StyleKind, TabStop, Underline,
};
use crate::traits::ConvertConfig;
use tracing::debug;

/// Deepest heading level that gets a style and a numbering level
pub const MAX_HEADING_LEVEL: u8 = 7;

/// Display text of a numbering level: `%1.%2.…%n.`
pub fn level_text(level: u8) -> String {
    (1..=level).map(|i| format!("%{i}.")).collect()
}

/// Populate a fresh document; returns the shared numbering definition
pub fn bootstrap(doc: &mut Document, config: &ConvertConfig) -> NumberingId {
    register_styles(doc, config);
    let numbering = register_heading_numbering(doc);
    add_footer(doc, config);
    doc.settings.update_fields_on_open = true;
    add_table_of_contents(doc, config);
    debug!(styles = doc.styles.len(), "document bootstrapped");
    numbering
}

fn register_styles(doc: &mut Document, config: &ConvertConfig) {
    let body = doc
        .styles
        .add(Style::new(model::BODY_DEFAULT, StyleKind::Paragraph));
    body.name = "Normal".to_string();
    body.is_default = true;
    body.run.font = Some(config.body_font.clone());

    let code = doc.styles.add(Style::new(model::CODE, StyleKind::Paragraph));
    code.based_on = Some(model::BODY_DEFAULT.to_string());
    code.run.font = Some(config.code_font.clone());
    code.run.size = Some(10);
    code.paragraph.spacing = Some(Spacing {
        before: 0,
        after: 0,
    });
    code.paragraph.borders = Some(Borders::all(Border::single("auto", 1)));

    let caption = doc
        .styles
        .add(Style::new(model::CAPTION, StyleKind::Paragraph));
    caption.based_on = Some(model::BODY_DEFAULT.to_string());
    caption.next = Some(model::BODY_DEFAULT.to_string());
    caption.paragraph.alignment = Some(Alignment::Center);
    caption.run.italic = true;
    caption.run.size = Some(9);
    caption.run.color = Some(config.accent_color.clone());

    let link = doc
        .styles
        .add(Style::new(model::HYPERLINK, StyleKind::Character));
    link.based_on = Some(model::BODY_DEFAULT.to_string());
    link.run.underline = Some(Underline {
        color: config.accent_color.clone(),
    });
    link.run.color = Some(config.accent_color.clone());

    let table = doc
        .styles
        .add(Style::new(model::TABLE_NORMAL, StyleKind::Table));
    table.name = "Normal Table".to_string();
    table.is_default = true;

    for level in 1..=MAX_HEADING_LEVEL {
        let id = model::heading_style(level);
        let heading = doc.styles.add(Style::new(&id, StyleKind::Paragraph));
        heading.name = format!("heading {level}");
        heading.based_on = Some(model::BODY_DEFAULT.to_string());
        heading.next = Some(model::BODY_DEFAULT.to_string());
        heading.run.font = Some(config.body_font.clone());
        heading.run.color = Some(config.heading_color.clone());
        if level == 1 {
            heading.run.bold = true;
            heading.paragraph.page_break_before = true;
        }
    }
}

fn register_heading_numbering(doc: &mut Document) -> NumberingId {
    let definition = doc.numbering.add_definition();
    let id = definition.id;
    for level in 1..=MAX_HEADING_LEVEL {
        definition.levels.push(NumberingLevel {
            level: level - 1,
            format: NumberFormat::Decimal,
            text: level_text(level),
            alignment: Alignment::Left,
            style: Some(model::heading_style(level)),
        });
    }

    for level in 1..=MAX_HEADING_LEVEL {
        if let Some(style) = doc.styles.get_mut(&model::heading_style(level)) {
            style.paragraph.numbering = Some(NumberingRef {
                definition: id,
                level: level - 1,
            });
        }
    }
    id
}

/// Split a footer template around its `{page}` and `{pages}` placeholders
fn footer_parts(template: &str) -> Vec<FooterPart<'_>> {
    let mut parts = Vec::new();
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        let (field, len) = if rest[start..].starts_with("{pages}") {
            (FieldKind::NumberOfPages, "{pages}".len())
        } else if rest[start..].starts_with("{page}") {
            (FieldKind::CurrentPage, "{page}".len())
        } else {
            parts.push(FooterPart::Text(&rest[..=start]));
            rest = &rest[start + 1..];
            continue;
        };
        if start > 0 {
            parts.push(FooterPart::Text(&rest[..start]));
        }
        parts.push(FooterPart::Field(field));
        rest = &rest[start + len..];
    }
    if !rest.is_empty() {
        parts.push(FooterPart::Text(rest));
    }
    parts
}

#[derive(Debug, PartialEq)]
enum FooterPart<'a> {
    Text(&'a str),
    Field(FieldKind),
}

fn add_footer(doc: &mut Document, config: &ConvertConfig) {
    let mut para = Paragraph::default();
    para.properties.tab_stops.push(TabStop {
        position_inches: 6.0,
        alignment: Alignment::Right,
    });
    let run = para.add_run(RunProperties::default());
    run.add_tab();
    for part in footer_parts(&config.footer_template) {
        match part {
            FooterPart::Text(text) => run.add_text(text),
            FooterPart::Field(field) => run.add_field(field),
        }
    }
    doc.footer = Some(Footer {
        paragraphs: vec![para],
    });
}

fn add_table_of_contents(doc: &mut Document, config: &ConvertConfig) {
    let mut label = Paragraph::default();
    label
        .add_run(RunProperties {
            size: Some(16),
            bold: true,
            color: Some(config.heading_color.clone()),
            ..RunProperties::default()
        })
        .add_text(&config.toc_title);
    doc.add_paragraph(label);

    let mut toc = Paragraph::default();
    toc.add_run(RunProperties::default())
        .add_field(FieldKind::TableOfContents);
    doc.add_paragraph(toc);

    let mut section = Paragraph::default();
    section.properties.section_break = Some(SectionBreak::NextPage);
    doc.add_paragraph(section);
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        // Level i reads "%1." through "%i." concatenated
        #[test]
        fn prop_level_text_concatenates_ancestors(level in 1u8..=MAX_HEADING_LEVEL) {
            let (doc, id) = {
                let mut doc = Document::new();
                let id = bootstrap(&mut doc, &ConvertConfig::default());
                (doc, id)
            };
            let definition = doc.numbering.get(id).unwrap();
            let expected: String = (1..=level).map(|j| format!("%{}.", j)).collect();
            prop_assert_eq!(&definition.levels[usize::from(level - 1)].text, &expected);
            prop_assert_eq!(expected.matches('%').count(), usize::from(level));
        }
    }
}
