// SPDX-License-Identifier: AGPL-3.0-or-later
//! Package plumbing: content types, relationships and settings

use mdocx_core::model::{Document, ImageFormat, ImageId};
use std::collections::HashMap;

use crate::xml::{XmlPart, NS_W};
use crate::Result;

pub(crate) const DOCUMENT_PART: &str = "word/document.xml";
pub(crate) const STYLES_PART: &str = "word/styles.xml";
pub(crate) const NUMBERING_PART: &str = "word/numbering.xml";
pub(crate) const SETTINGS_PART: &str = "word/settings.xml";
pub(crate) const FOOTER_PART: &str = "word/footer1.xml";
pub(crate) const DOCUMENT_RELS_PART: &str = "word/_rels/document.xml.rels";

const NS_PACKAGE_RELS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
const NS_CONTENT_TYPES: &str = "http://schemas.openxmlformats.org/package/2006/content-types";
const REL_BASE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const CT_BASE: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RelationshipKind {
    OfficeDocument,
    Styles,
    Numbering,
    Settings,
    Footer,
    Image,
    Hyperlink,
}

impl RelationshipKind {
    fn type_uri(self) -> String {
        let name = match self {
            Self::OfficeDocument => "officeDocument",
            Self::Styles => "styles",
            Self::Numbering => "numbering",
            Self::Settings => "settings",
            Self::Footer => "footer",
            Self::Image => "image",
            Self::Hyperlink => "hyperlink",
        };
        format!("{REL_BASE}/{name}")
    }
}

#[derive(Debug, Clone)]
struct Relationship {
    id: String,
    kind: RelationshipKind,
    target: String,
    external: bool,
}

/// Relationships of one source part, numbered `rId1`, `rId2`, … in insertion order
#[derive(Debug, Default)]
pub(crate) struct Relationships {
    entries: Vec<Relationship>,
}

impl Relationships {
    pub fn add(&mut self, kind: RelationshipKind, target: &str) -> String {
        self.push(kind, target, false)
    }

    pub fn add_external(&mut self, kind: RelationshipKind, target: &str) -> String {
        self.push(kind, target, true)
    }

    fn push(&mut self, kind: RelationshipKind, target: &str, external: bool) -> String {
        let id = format!("rId{}", self.entries.len() + 1);
        self.entries.push(Relationship {
            id: id.clone(),
            kind,
            target: target.to_string(),
            external,
        });
        id
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn to_xml(&self) -> Result<Vec<u8>> {
        let mut part = XmlPart::new()?;
        part.element("Relationships", &[("xmlns", NS_PACKAGE_RELS)], |part| {
            for rel in &self.entries {
                let type_uri = rel.kind.type_uri();
                let mut attrs = vec![
                    ("Id", rel.id.as_str()),
                    ("Type", type_uri.as_str()),
                    ("Target", rel.target.as_str()),
                ];
                if rel.external {
                    attrs.push(("TargetMode", "External"));
                }
                part.empty("Relationship", &attrs)?;
            }
            Ok(())
        })?;
        Ok(part.into_bytes())
    }
}

/// Relationship ids the document part needs while its body is written
#[derive(Debug, Default)]
pub(crate) struct DocumentLinks {
    pub rels: Relationships,
    pub footer: Option<String>,
    pub images: HashMap<ImageId, String>,
}

impl DocumentLinks {
    /// Register every part the document part points at
    pub fn for_document(doc: &Document) -> Self {
        let mut rels = Relationships::default();
        rels.add(RelationshipKind::Styles, "styles.xml");
        rels.add(RelationshipKind::Numbering, "numbering.xml");
        rels.add(RelationshipKind::Settings, "settings.xml");
        let footer = doc
            .footer
            .as_ref()
            .map(|_| rels.add(RelationshipKind::Footer, "footer1.xml"));
        let images = doc
            .images
            .iter()
            .map(|image| {
                let target = format!("media/{}", image.file_name());
                (image.id, rels.add(RelationshipKind::Image, &target))
            })
            .collect();
        Self {
            rels,
            footer,
            images,
        }
    }
}

/// `_rels/.rels`
pub(crate) fn package_relationships() -> Result<Vec<u8>> {
    let mut rels = Relationships::default();
    rels.add(RelationshipKind::OfficeDocument, DOCUMENT_PART);
    rels.to_xml()
}

/// `[Content_Types].xml`
pub(crate) fn content_types(doc: &Document) -> Result<Vec<u8>> {
    let mut formats: Vec<ImageFormat> = Vec::new();
    for image in &doc.images {
        if !formats.contains(&image.format) {
            formats.push(image.format);
        }
    }

    let mut overrides = vec![
        (DOCUMENT_PART, format!("{CT_BASE}.document.main+xml")),
        (STYLES_PART, format!("{CT_BASE}.styles+xml")),
        (NUMBERING_PART, format!("{CT_BASE}.numbering+xml")),
        (SETTINGS_PART, format!("{CT_BASE}.settings+xml")),
    ];
    if doc.footer.is_some() {
        overrides.push((FOOTER_PART, format!("{CT_BASE}.footer+xml")));
    }

    let mut part = XmlPart::new()?;
    part.element("Types", &[("xmlns", NS_CONTENT_TYPES)], |part| {
        part.empty(
            "Default",
            &[
                ("Extension", "rels"),
                ("ContentType", "application/vnd.openxmlformats-package.relationships+xml"),
            ],
        )?;
        part.empty(
            "Default",
            &[("Extension", "xml"), ("ContentType", "application/xml")],
        )?;
        for format in &formats {
            part.empty(
                "Default",
                &[
                    ("Extension", format.extension()),
                    ("ContentType", format.content_type()),
                ],
            )?;
        }
        for (name, content_type) in &overrides {
            let part_name = format!("/{name}");
            part.empty(
                "Override",
                &[
                    ("PartName", part_name.as_str()),
                    ("ContentType", content_type.as_str()),
                ],
            )?;
        }
        Ok(())
    })?;
    Ok(part.into_bytes())
}

/// `word/settings.xml`
pub(crate) fn settings(doc: &Document) -> Result<Vec<u8>> {
    let mut part = XmlPart::new()?;
    part.element("w:settings", &[("xmlns:w", NS_W)], |part| {
        if doc.settings.update_fields_on_open {
            part.val("w:updateFields", "true")?;
        }
        Ok(())
    })?;
    Ok(part.into_bytes())
}
