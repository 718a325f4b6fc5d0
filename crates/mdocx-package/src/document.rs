// SPDX-License-Identifier: AGPL-3.0-or-later
//! `word/document.xml` and `word/footer1.xml`

use mdocx_core::model::{
    AnchoredDrawing, BodyElement, Document, FieldKind, Footer, Paragraph, ParagraphChild, Run,
    RunContent, Table, TextWrap,
};

use crate::parts::{DocumentLinks, RelationshipKind, Relationships};
use crate::properties::{
    alignment_value, paragraph_properties, run_properties, section_properties, write_borders,
};
use crate::xml::{XmlPart, NS_A, NS_PIC, NS_R, NS_W, NS_WP};
use crate::{PackageError, Result};

/// Usable width of a Letter page with one-inch margins, in twips
const TEXT_WIDTH_TWIPS: usize = 9360;

fn field_instruction(field: FieldKind) -> &'static str {
    match field {
        FieldKind::CurrentPage => " PAGE ",
        FieldKind::NumberOfPages => " NUMPAGES ",
        FieldKind::TableOfContents => r#" TOC \o "1-7" \h \z \u "#,
    }
}

/// Writes body content, registering hyperlink targets as it goes
struct BodyWriter<'d> {
    links: &'d mut DocumentLinks,
    /// `wp:docPr` ids must be unique across the part
    next_drawing_id: usize,
}

impl BodyWriter<'_> {
    fn paragraph(&mut self, part: &mut XmlPart, para: &Paragraph) -> Result<()> {
        let footer = self.links.footer.clone();
        part.element("w:p", &[], |part| {
            paragraph_properties(part, para.style.as_deref(), &para.properties, footer.as_deref())?;
            for child in &para.children {
                match child {
                    ParagraphChild::Run(run) => self.run(part, run)?,
                    ParagraphChild::Hyperlink(link) => {
                        let id = self
                            .links
                            .rels
                            .add_external(RelationshipKind::Hyperlink, &link.target);
                        part.element("w:hyperlink", &[("r:id", &id)], |part| {
                            for run in &link.runs {
                                self.run(part, run)?;
                            }
                            Ok(())
                        })?;
                    }
                }
            }
            Ok(())
        })
    }

    fn run(&mut self, part: &mut XmlPart, run: &Run) -> Result<()> {
        part.element("w:r", &[], |part| {
            run_properties(part, &run.properties)?;
            for content in &run.content {
                match content {
                    RunContent::Text(text) => {
                        part.text("w:t", &[("xml:space", "preserve")], text)?
                    }
                    RunContent::Break => part.empty("w:br", &[])?,
                    RunContent::Tab => part.empty("w:tab", &[])?,
                    RunContent::Field(field) => {
                        part.empty("w:fldChar", &[("w:fldCharType", "begin")])?;
                        part.text(
                            "w:instrText",
                            &[("xml:space", "preserve")],
                            field_instruction(*field),
                        )?;
                        part.empty("w:fldChar", &[("w:fldCharType", "separate")])?;
                        part.empty("w:fldChar", &[("w:fldCharType", "end")])?;
                    }
                    RunContent::Drawing(drawing) => self.drawing(part, drawing)?,
                }
            }
            Ok(())
        })
    }

    fn drawing(&mut self, part: &mut XmlPart, drawing: &AnchoredDrawing) -> Result<()> {
        let embed = self
            .links
            .images
            .get(&drawing.image)
            .cloned()
            .ok_or(PackageError::MissingImage(drawing.image.0))?;
        let doc_pr_id = self.next_drawing_id.to_string();
        self.next_drawing_id += 1;
        let name = format!("Picture {doc_pr_id}");
        let cx = drawing.width_emu.to_string();
        let cy = drawing.height_emu.to_string();

        part.element("w:drawing", &[], |part| {
            part.element(
                "wp:anchor",
                &[
                    ("distT", "0"),
                    ("distB", "0"),
                    ("distL", "0"),
                    ("distR", "0"),
                    ("simplePos", "0"),
                    ("relativeHeight", &doc_pr_id),
                    ("behindDoc", "0"),
                    ("locked", "0"),
                    ("layoutInCell", "1"),
                    ("allowOverlap", "1"),
                ],
                |part| {
                    part.empty("wp:simplePos", &[("x", "0"), ("y", "0")])?;
                    part.element("wp:positionH", &[("relativeFrom", "column")], |part| {
                        part.text("wp:align", &[], alignment_value(drawing.horizontal))
                    })?;
                    part.element("wp:positionV", &[("relativeFrom", "paragraph")], |part| {
                        part.text("wp:posOffset", &[], "0")
                    })?;
                    part.empty("wp:extent", &[("cx", &cx), ("cy", &cy)])?;
                    part.empty(
                        "wp:effectExtent",
                        &[("l", "0"), ("t", "0"), ("r", "0"), ("b", "0")],
                    )?;
                    match drawing.wrap {
                        TextWrap::TopAndBottom => part.empty("wp:wrapTopAndBottom", &[])?,
                    }
                    part.empty("wp:docPr", &[("id", &doc_pr_id), ("name", &name)])?;
                    part.element("wp:cNvGraphicFramePr", &[], |part| {
                        part.empty("a:graphicFrameLocks", &[("noChangeAspect", "1")])
                    })?;
                    part.element("a:graphic", &[], |part| {
                        part.element("a:graphicData", &[("uri", NS_PIC)], |part| {
                            picture(part, &name, &embed, &cx, &cy)
                        })
                    })
                },
            )
        })
    }

    fn table(&mut self, part: &mut XmlPart, table: &Table) -> Result<()> {
        let columns = table.rows.iter().map(|r| r.cells.len()).max().unwrap_or(0);
        let column_width = (TEXT_WIDTH_TWIPS / columns.max(1)).to_string();
        part.element("w:tbl", &[], |part| {
            part.element("w:tblPr", &[], |part| {
                if let Some(style) = &table.style {
                    part.val("w:tblStyle", style)?;
                }
                part.empty("w:tblW", &[("w:w", "0"), ("w:type", "auto")])
            })?;
            part.element("w:tblGrid", &[], |part| {
                for _ in 0..columns {
                    part.empty("w:gridCol", &[("w:w", &column_width)])?;
                }
                Ok(())
            })?;
            for row in &table.rows {
                part.element("w:tr", &[], |part| {
                    for cell in &row.cells {
                        part.element("w:tc", &[], |part| {
                            part.element("w:tcPr", &[], |part| {
                                part.empty("w:tcW", &[("w:w", &column_width), ("w:type", "dxa")])?;
                                match &cell.borders {
                                    Some(borders) => write_borders(part, "w:tcBorders", borders),
                                    None => Ok(()),
                                }
                            })?;
                            // A cell must end with a paragraph
                            if cell.paragraphs.is_empty() {
                                part.empty("w:p", &[])?;
                            }
                            for para in &cell.paragraphs {
                                self.paragraph(part, para)?;
                            }
                            Ok(())
                        })?;
                    }
                    Ok(())
                })?;
            }
            Ok(())
        })
    }
}

fn picture(part: &mut XmlPart, name: &str, embed: &str, cx: &str, cy: &str) -> Result<()> {
    part.element("pic:pic", &[], |part| {
        part.element("pic:nvPicPr", &[], |part| {
            part.empty("pic:cNvPr", &[("id", "0"), ("name", name)])?;
            part.empty("pic:cNvPicPr", &[])
        })?;
        part.element("pic:blipFill", &[], |part| {
            part.empty("a:blip", &[("r:embed", embed)])?;
            part.element("a:stretch", &[], |part| part.empty("a:fillRect", &[]))
        })?;
        part.element("pic:spPr", &[], |part| {
            part.element("a:xfrm", &[], |part| {
                part.empty("a:off", &[("x", "0"), ("y", "0")])?;
                part.empty("a:ext", &[("cx", cx), ("cy", cy)])
            })?;
            part.element("a:prstGeom", &[("prst", "rect")], |part| {
                part.empty("a:avLst", &[])
            })
        })
    })
}

const ROOT_NAMESPACES: [(&str, &str); 5] = [
    ("xmlns:w", NS_W),
    ("xmlns:r", NS_R),
    ("xmlns:wp", NS_WP),
    ("xmlns:a", NS_A),
    ("xmlns:pic", NS_PIC),
];

/// `word/document.xml`; hyperlink relationships are added to `links`
pub(crate) fn document(doc: &Document, links: &mut DocumentLinks) -> Result<Vec<u8>> {
    let footer = links.footer.clone();
    let mut writer = BodyWriter {
        links,
        next_drawing_id: 1,
    };
    let mut part = XmlPart::new()?;
    part.element("w:document", &ROOT_NAMESPACES, |part| {
        part.element("w:body", &[], |part| {
            for element in &doc.body {
                match element {
                    BodyElement::Paragraph(para) => writer.paragraph(part, para)?,
                    BodyElement::Table(table) => writer.table(part, table)?,
                }
            }
            section_properties(part, None, footer.as_deref())
        })
    })?;
    Ok(part.into_bytes())
}

/// `word/footer1.xml` with the relationships of its own hyperlinks
pub(crate) fn footer(footer: &Footer) -> Result<(Vec<u8>, Relationships)> {
    let mut links = DocumentLinks::default();
    let mut writer = BodyWriter {
        links: &mut links,
        next_drawing_id: 1,
    };
    let mut part = XmlPart::new()?;
    part.element("w:ftr", &ROOT_NAMESPACES, |part| {
        for para in &footer.paragraphs {
            writer.paragraph(part, para)?;
        }
        Ok(())
    })?;
    Ok((part.into_bytes(), links.rels))
}

#[cfg(test)]
mod tests {
    use super::*;
    use mdocx_core::model::{
        Alignment, Cell, Hyperlink, ImageFormat, RunProperties, Row, SectionBreak,
    };

    fn render(doc: &Document) -> (String, DocumentLinks) {
        let mut links = DocumentLinks::for_document(doc);
        let xml = document(doc, &mut links).unwrap();
        (String::from_utf8(xml).unwrap(), links)
    }

    fn text_paragraph(text: &str) -> Paragraph {
        let mut para = Paragraph::styled("BodyDefault");
        para.add_run(RunProperties::default()).add_text(text);
        para
    }

    #[test]
    fn test_paragraph_text_is_preserved_and_escaped() {
        let mut doc = Document::new();
        doc.add_paragraph(text_paragraph(" a <b> "));
        let (xml, _) = render(&doc);
        assert!(xml.contains(r#"<w:pStyle w:val="BodyDefault"/>"#));
        assert!(xml.contains(r#"<w:t xml:space="preserve"> a &lt;b&gt; </w:t>"#));
        assert!(xml.ends_with("</w:sectPr></w:body></w:document>"));
    }

    #[test]
    fn test_hyperlink_gets_external_relationship() {
        let mut doc = Document::new();
        let mut para = Paragraph::default();
        para.children.push(ParagraphChild::Hyperlink(Hyperlink {
            target: "https://example.com".to_string(),
            runs: vec![Run::default()],
        }));
        doc.add_paragraph(para);
        let (xml, links) = render(&doc);
        assert!(xml.contains(r#"<w:hyperlink r:id="rId4">"#));
        let rels = String::from_utf8(links.rels.to_xml().unwrap()).unwrap();
        assert!(rels.contains(r#"Target="https://example.com" TargetMode="External""#));
    }

    #[test]
    fn test_fields_use_complex_field_chars() {
        let mut doc = Document::new();
        let mut para = Paragraph::default();
        para.add_run(RunProperties::default())
            .add_field(FieldKind::TableOfContents);
        doc.add_paragraph(para);
        let (xml, _) = render(&doc);
        assert!(xml.contains(r#"<w:fldChar w:fldCharType="begin"/>"#));
        assert!(xml.contains("TOC"));
        assert!(xml.contains(r#"<w:fldChar w:fldCharType="end"/>"#));
    }

    #[test]
    fn test_anchored_drawing_embeds_image_relationship() {
        let mut doc = Document::new();
        let image = doc.add_image(ImageFormat::Png, 10, 20, vec![1, 2, 3]);
        let mut para = Paragraph::default();
        para.add_run(RunProperties::default())
            .add_drawing(AnchoredDrawing {
                image,
                width_emu: 95_250,
                height_emu: 190_500,
                horizontal: Alignment::Center,
                wrap: TextWrap::TopAndBottom,
            });
        doc.add_paragraph(para);
        let (xml, _) = render(&doc);
        assert!(xml.contains(r#"<a:blip r:embed="rId4"/>"#));
        assert!(xml.contains(r#"<wp:extent cx="95250" cy="190500"/>"#));
        assert!(xml.contains("<wp:align>center</wp:align>"));
        assert!(xml.contains("<wp:wrapTopAndBottom/>"));
    }

    #[test]
    fn test_drawing_of_unregistered_image_fails() {
        let mut doc = Document::new();
        let mut para = Paragraph::default();
        para.add_run(RunProperties::default())
            .add_drawing(AnchoredDrawing {
                image: mdocx_core::model::ImageId(9),
                width_emu: 1,
                height_emu: 1,
                horizontal: Alignment::Center,
                wrap: TextWrap::TopAndBottom,
            });
        doc.add_paragraph(para);
        let mut links = DocumentLinks::for_document(&doc);
        assert!(matches!(
            document(&doc, &mut links),
            Err(PackageError::MissingImage(9))
        ));
    }

    #[test]
    fn test_table_grid_and_empty_cell() {
        let mut doc = Document::new();
        doc.body.push(BodyElement::Table(Table {
            style: Some("TableNormal".to_string()),
            rows: vec![Row {
                cells: vec![
                    Cell {
                        borders: None,
                        paragraphs: vec![text_paragraph("x")],
                    },
                    Cell::default(),
                ],
            }],
        }));
        let (xml, _) = render(&doc);
        assert_eq!(xml.matches("<w:gridCol ").count(), 2);
        assert!(xml.contains(r#"<w:tblStyle w:val="TableNormal"/>"#));
        assert!(xml.contains("<w:p/></w:tc>"));
    }

    #[test]
    fn test_section_break_paragraph_and_final_section_share_footer() {
        let mut doc = Document::new();
        doc.footer = Some(Footer::default());
        let mut para = Paragraph::default();
        para.properties.section_break = Some(SectionBreak::NextPage);
        doc.add_paragraph(para);
        let (xml, _) = render(&doc);
        assert_eq!(xml.matches(r#"<w:footerReference w:type="default" r:id="rId4"/>"#).count(), 2);
    }
}
