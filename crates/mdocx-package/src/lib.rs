// SPDX-License-Identifier: AGPL-3.0-or-later
//! mdocx Package - Office Open XML encoder
//!
//! Serialises a finished [`Document`] model into a `.docx` zip package:
//! content types, package and document relationships, the document,
//! styles, numbering, settings and footer parts, and embedded media.

mod document;
mod parts;
mod properties;
mod styles;
mod xml;

use mdocx_core::Document;
use std::fs::File;
use std::io::{BufWriter, Seek, Write};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Errors that can occur while writing a package
#[derive(Error, Debug)]
pub enum PackageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("drawing references unregistered image {0}")]
    MissingImage(usize),
}

pub type Result<T> = std::result::Result<T, PackageError>;

/// Writes document models as `.docx` packages
#[derive(Clone)]
pub struct DocxPackager {
    options: FileOptions,
}

impl Default for DocxPackager {
    fn default() -> Self {
        Self::new()
    }
}

impl DocxPackager {
    pub fn new() -> Self {
        Self {
            options: FileOptions::default().compression_method(CompressionMethod::Deflated),
        }
    }

    /// Write the package to any seekable sink
    pub fn write<W: Write + Seek>(&self, doc: &Document, sink: W) -> Result<W> {
        let mut zip = ZipWriter::new(sink);

        let mut links = parts::DocumentLinks::for_document(doc);
        // The body registers hyperlink relationships, so it goes before the rels part
        let body = document::document(doc, &mut links)?;

        self.add(&mut zip, "[Content_Types].xml", &parts::content_types(doc)?)?;
        self.add(&mut zip, "_rels/.rels", &parts::package_relationships()?)?;
        self.add(&mut zip, parts::DOCUMENT_PART, &body)?;
        self.add(&mut zip, parts::DOCUMENT_RELS_PART, &links.rels.to_xml()?)?;
        self.add(&mut zip, parts::STYLES_PART, &styles::styles(doc)?)?;
        self.add(&mut zip, parts::NUMBERING_PART, &styles::numbering(doc)?)?;
        self.add(&mut zip, parts::SETTINGS_PART, &parts::settings(doc)?)?;

        if let Some(footer) = &doc.footer {
            let (xml, rels) = document::footer(footer)?;
            self.add(&mut zip, parts::FOOTER_PART, &xml)?;
            if !rels.is_empty() {
                self.add(&mut zip, "word/_rels/footer1.xml.rels", &rels.to_xml()?)?;
            }
        }

        for image in &doc.images {
            let name = format!("word/media/{}", image.file_name());
            self.add(&mut zip, &name, &image.bytes)?;
        }

        Ok(zip.finish()?)
    }

    /// Write the package to `path`
    ///
    /// The document is encoded in memory first so a failed encode leaves no
    /// file behind.
    pub fn save(&self, doc: &Document, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let bytes = self.write(doc, std::io::Cursor::new(Vec::new()))?.into_inner();
        let mut file = BufWriter::new(File::create(path)?);
        file.write_all(&bytes)?;
        file.flush()?;
        info!(path = %path.display(), bytes = bytes.len(), "package saved");
        Ok(())
    }

    fn add<W: Write + Seek>(&self, zip: &mut ZipWriter<W>, name: &str, bytes: &[u8]) -> Result<()> {
        debug!(part = name, bytes = bytes.len(), "writing part");
        zip.start_file(name, self.options)?;
        zip.write_all(bytes)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mdocx_core::images::{FsImageSource, ImageSource};
    use mdocx_core::{convert, ConvertConfig};
    use pretty_assertions::assert_eq;
    use std::io::{Cursor, Read};
    use zip::ZipArchive;

    struct NoImages;

    impl ImageSource for NoImages {
        fn load(&self, reference: &str) -> std::io::Result<Vec<u8>> {
            Err(std::io::Error::new(std::io::ErrorKind::NotFound, reference.to_string()))
        }
    }

    fn package(markdown: &str) -> ZipArchive<Cursor<Vec<u8>>> {
        let doc = convert(markdown, &ConvertConfig::default(), &NoImages).unwrap();
        let bytes = DocxPackager::new()
            .write(&doc, Cursor::new(Vec::new()))
            .unwrap()
            .into_inner();
        ZipArchive::new(Cursor::new(bytes)).unwrap()
    }

    fn read_part(archive: &mut ZipArchive<Cursor<Vec<u8>>>, name: &str) -> String {
        let mut text = String::new();
        archive
            .by_name(name)
            .unwrap()
            .read_to_string(&mut text)
            .unwrap();
        text
    }

    #[test]
    fn test_package_contains_every_part() {
        let archive = package("# Intro\n\nhello\n");
        let mut names: Vec<&str> = archive.file_names().collect();
        names.sort_unstable();
        assert_eq!(
            names,
            vec![
                "[Content_Types].xml",
                "_rels/.rels",
                "word/_rels/document.xml.rels",
                "word/document.xml",
                "word/footer1.xml",
                "word/numbering.xml",
                "word/settings.xml",
                "word/styles.xml",
            ]
        );
    }

    #[test]
    fn test_document_part_carries_content() {
        let mut archive = package("# Intro\n\nsee <https://example.com>\n");
        let body = read_part(&mut archive, "word/document.xml");
        assert!(body.contains(r#"<w:pStyle w:val="Heading1"/>"#));
        assert!(body.contains(">Intro</w:t>"));
        assert!(body.contains("Table of Contents"));

        let rels = read_part(&mut archive, "word/_rels/document.xml.rels");
        assert!(rels.contains(r#"Target="https://example.com" TargetMode="External""#));
    }

    #[test]
    fn test_footer_has_page_fields() {
        let mut archive = package("text\n");
        let footer = read_part(&mut archive, "word/footer1.xml");
        assert!(footer.contains(" PAGE "));
        assert!(footer.contains(" NUMPAGES "));
    }

    #[test]
    fn test_save_with_embedded_image() {
        let dir = tempfile::tempdir().unwrap();
        // 1x1 PNG header is all the sniffer reads
        let mut png = b"\x89PNG\r\n\x1a\n".to_vec();
        png.extend_from_slice(&13u32.to_be_bytes());
        png.extend_from_slice(b"IHDR");
        png.extend_from_slice(&1u32.to_be_bytes());
        png.extend_from_slice(&1u32.to_be_bytes());
        std::fs::write(dir.path().join("dot.png"), &png).unwrap();

        let input = dir.path().join("doc.md");
        let images = FsImageSource::for_input(&input);
        let doc = convert("![dot](dot.png)\n", &ConvertConfig::default(), &images).unwrap();

        let output = dir.path().join("out.docx");
        DocxPackager::new().save(&doc, &output).unwrap();

        let mut archive = ZipArchive::new(File::open(&output).unwrap()).unwrap();
        let mut media = Vec::new();
        archive
            .by_name("word/media/image1.png")
            .unwrap()
            .read_to_end(&mut media)
            .unwrap();
        assert_eq!(media, png);
        let mut types = String::new();
        archive
            .by_name("[Content_Types].xml")
            .unwrap()
            .read_to_string(&mut types)
            .unwrap();
        assert!(types.contains(r#"Extension="png""#));
    }
}
