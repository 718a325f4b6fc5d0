// SPDX-License-Identifier: AGPL-3.0-or-later
//! `word/styles.xml` and `word/numbering.xml`

use mdocx_core::model::{Document, NumberFormat, StyleKind};

use crate::properties::{alignment_value, paragraph_properties, run_properties};
use crate::xml::{XmlPart, NS_W};
use crate::Result;

fn style_type(kind: StyleKind) -> &'static str {
    match kind {
        StyleKind::Paragraph => "paragraph",
        StyleKind::Character => "character",
        StyleKind::Table => "table",
    }
}

pub(crate) fn styles(doc: &Document) -> Result<Vec<u8>> {
    let mut part = XmlPart::new()?;
    part.element("w:styles", &[("xmlns:w", NS_W)], |part| {
        for style in doc.styles.iter() {
            let mut attrs = vec![
                ("w:type", style_type(style.kind)),
                ("w:styleId", style.id.as_str()),
            ];
            if style.is_default {
                attrs.push(("w:default", "1"));
            }
            part.element("w:style", &attrs, |part| {
                part.val("w:name", &style.name)?;
                if let Some(based_on) = &style.based_on {
                    part.val("w:basedOn", based_on)?;
                }
                if let Some(next) = &style.next {
                    part.val("w:next", next)?;
                }
                part.empty("w:qFormat", &[])?;
                if style.kind != StyleKind::Character {
                    paragraph_properties(part, None, &style.paragraph, None)?;
                }
                run_properties(part, &style.run)
            })?;
        }
        Ok(())
    })?;
    Ok(part.into_bytes())
}

pub(crate) fn numbering(doc: &Document) -> Result<Vec<u8>> {
    let definitions = doc.numbering.definitions();
    let mut part = XmlPart::new()?;
    part.element("w:numbering", &[("xmlns:w", NS_W)], |part| {
        // Every abstract definition must precede the first w:num
        for definition in definitions {
            let id = definition.id.0.to_string();
            part.element("w:abstractNum", &[("w:abstractNumId", &id)], |part| {
                part.val("w:multiLevelType", "multilevel")?;
                for level in &definition.levels {
                    let ilvl = level.level.to_string();
                    part.element("w:lvl", &[("w:ilvl", &ilvl)], |part| {
                        part.val("w:start", "1")?;
                        let format = match level.format {
                            NumberFormat::Decimal => "decimal",
                        };
                        part.val("w:numFmt", format)?;
                        if let Some(style) = &level.style {
                            part.val("w:pStyle", style)?;
                        }
                        part.val("w:lvlText", &level.text)?;
                        part.val("w:lvlJc", alignment_value(level.alignment))
                    })?;
                }
                Ok(())
            })?;
        }
        for definition in definitions {
            let id = definition.id.0.to_string();
            part.element("w:num", &[("w:numId", &id)], |part| {
                part.val("w:abstractNumId", &id)
            })?;
        }
        Ok(())
    })?;
    Ok(part.into_bytes())
}
