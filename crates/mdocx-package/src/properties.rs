// SPDX-License-Identifier: AGPL-3.0-or-later
//! `w:pPr`, `w:rPr` and `w:sectPr` writers shared by every part
//!
//! Child elements are written in the order the WordprocessingML schema
//! requires; Word rejects properties that appear out of sequence.

use mdocx_core::model::{
    Alignment, Border, BorderStyle, Borders, ParagraphProperties, RunProperties, SectionBreak,
};

use crate::xml::XmlPart;
use crate::Result;

const TWIPS_PER_INCH: f64 = 1440.0;

/// US Letter, one-inch margins, in twips
const PAGE_WIDTH: &str = "12240";
const PAGE_HEIGHT: &str = "15840";
const PAGE_MARGIN: &str = "1440";
const HEADER_FOOTER_MARGIN: &str = "720";

pub(crate) fn alignment_value(alignment: Alignment) -> &'static str {
    match alignment {
        Alignment::Left => "left",
        Alignment::Center => "center",
        Alignment::Right => "right",
    }
}

pub(crate) fn inches_to_twips(inches: f64) -> String {
    ((inches * TWIPS_PER_INCH).round() as i64).to_string()
}

pub(crate) fn paragraph_properties(
    part: &mut XmlPart,
    style: Option<&str>,
    props: &ParagraphProperties,
    footer: Option<&str>,
) -> Result<()> {
    if style.is_none() && *props == ParagraphProperties::default() {
        return Ok(());
    }
    part.element("w:pPr", &[], |part| {
        if let Some(style) = style {
            part.val("w:pStyle", style)?;
        }
        if props.page_break_before {
            part.empty("w:pageBreakBefore", &[])?;
        }
        if let Some(numbering) = &props.numbering {
            part.element("w:numPr", &[], |part| {
                part.val("w:ilvl", &numbering.level.to_string())?;
                part.val("w:numId", &numbering.definition.0.to_string())
            })?;
        }
        if let Some(borders) = &props.borders {
            write_borders(part, "w:pBdr", borders)?;
        }
        if !props.tab_stops.is_empty() {
            part.element("w:tabs", &[], |part| {
                for tab in &props.tab_stops {
                    part.empty(
                        "w:tab",
                        &[
                            ("w:val", alignment_value(tab.alignment)),
                            ("w:pos", &inches_to_twips(tab.position_inches)),
                        ],
                    )?;
                }
                Ok(())
            })?;
        }
        if let Some(spacing) = &props.spacing {
            part.empty(
                "w:spacing",
                &[
                    ("w:before", &spacing.before.to_string()),
                    ("w:after", &spacing.after.to_string()),
                ],
            )?;
        }
        if let Some(alignment) = props.alignment {
            part.val("w:jc", alignment_value(alignment))?;
        }
        if let Some(section) = props.section_break {
            section_properties(part, Some(section), footer)?;
        }
        Ok(())
    })
}

pub(crate) fn run_properties(part: &mut XmlPart, props: &RunProperties) -> Result<()> {
    if *props == RunProperties::default() {
        return Ok(());
    }
    part.element("w:rPr", &[], |part| {
        if let Some(style) = &props.style {
            part.val("w:rStyle", style)?;
        }
        if let Some(font) = &props.font {
            part.empty(
                "w:rFonts",
                &[("w:ascii", font), ("w:hAnsi", font), ("w:cs", font)],
            )?;
        }
        if props.bold {
            part.empty("w:b", &[])?;
        }
        if props.italic {
            part.empty("w:i", &[])?;
        }
        if let Some(color) = &props.color {
            part.val("w:color", color)?;
        }
        if let Some(size) = props.size {
            // Half-points
            let half_points = (size * 2).to_string();
            part.val("w:sz", &half_points)?;
            part.val("w:szCs", &half_points)?;
        }
        if let Some(underline) = &props.underline {
            part.empty(
                "w:u",
                &[("w:val", "single"), ("w:color", underline.color.as_str())],
            )?;
        }
        Ok(())
    })
}

pub(crate) fn write_borders(part: &mut XmlPart, name: &str, borders: &Borders) -> Result<()> {
    part.element(name, &[], |part| {
        write_border(part, "w:top", &borders.top)?;
        write_border(part, "w:left", &borders.left)?;
        write_border(part, "w:bottom", &borders.bottom)?;
        write_border(part, "w:right", &borders.right)
    })
}

fn write_border(part: &mut XmlPart, name: &str, border: &Border) -> Result<()> {
    let style = match border.style {
        BorderStyle::Single => "single",
    };
    // Eighths of a point
    let size = (border.width * 8).to_string();
    part.empty(
        name,
        &[
            ("w:val", style),
            ("w:sz", &size),
            ("w:space", "0"),
            ("w:color", border.color.as_str()),
        ],
    )
}

/// Page setup for a section; `kind` is `None` for the body's final section
pub(crate) fn section_properties(
    part: &mut XmlPart,
    kind: Option<SectionBreak>,
    footer: Option<&str>,
) -> Result<()> {
    part.element("w:sectPr", &[], |part| {
        if let Some(id) = footer {
            part.empty("w:footerReference", &[("w:type", "default"), ("r:id", id)])?;
        }
        if let Some(SectionBreak::NextPage) = kind {
            part.val("w:type", "nextPage")?;
        }
        part.empty("w:pgSz", &[("w:w", PAGE_WIDTH), ("w:h", PAGE_HEIGHT)])?;
        part.empty(
            "w:pgMar",
            &[
                ("w:top", PAGE_MARGIN),
                ("w:right", PAGE_MARGIN),
                ("w:bottom", PAGE_MARGIN),
                ("w:left", PAGE_MARGIN),
                ("w:header", HEADER_FOOTER_MARGIN),
                ("w:footer", HEADER_FOOTER_MARGIN),
                ("w:gutter", "0"),
            ],
        )
    })
}
