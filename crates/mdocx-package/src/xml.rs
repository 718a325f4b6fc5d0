// SPDX-License-Identifier: AGPL-3.0-or-later
//! Thin element-level wrapper over `quick_xml::Writer`

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use crate::Result;

pub(crate) const NS_W: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
pub(crate) const NS_R: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
pub(crate) const NS_WP: &str =
    "http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing";
pub(crate) const NS_A: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
pub(crate) const NS_PIC: &str = "http://schemas.openxmlformats.org/drawingml/2006/picture";

/// One XML part being written into memory
pub(crate) struct XmlPart {
    writer: Writer<Vec<u8>>,
}

impl XmlPart {
    /// Start a standalone UTF-8 part
    pub fn new() -> Result<Self> {
        let mut writer = Writer::new(Vec::new());
        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))?;
        Ok(Self { writer })
    }

    pub fn open(&mut self, name: &str, attrs: &[(&str, &str)]) -> Result<()> {
        let start = BytesStart::new(name).with_attributes(attrs.iter().copied());
        self.writer.write_event(Event::Start(start))?;
        Ok(())
    }

    pub fn close(&mut self, name: &str) -> Result<()> {
        self.writer.write_event(Event::End(BytesEnd::new(name)))?;
        Ok(())
    }

    pub fn empty(&mut self, name: &str, attrs: &[(&str, &str)]) -> Result<()> {
        let start = BytesStart::new(name).with_attributes(attrs.iter().copied());
        self.writer.write_event(Event::Empty(start))?;
        Ok(())
    }

    /// `<name attrs>text</name>` with the text escaped
    pub fn text(&mut self, name: &str, attrs: &[(&str, &str)], text: &str) -> Result<()> {
        self.open(name, attrs)?;
        self.writer.write_event(Event::Text(BytesText::new(text)))?;
        self.close(name)
    }

    /// `<name w:val="value"/>`, the most common WordprocessingML shape
    pub fn val(&mut self, name: &str, value: &str) -> Result<()> {
        self.empty(name, &[("w:val", value)])
    }

    /// Wrap whatever `body` writes in `<name attrs>…</name>`
    pub fn element<F>(&mut self, name: &str, attrs: &[(&str, &str)], body: F) -> Result<()>
    where
        F: FnOnce(&mut Self) -> Result<()>,
    {
        self.open(name, attrs)?;
        body(self)?;
        self.close(name)
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.writer.into_inner()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn body(bytes: Vec<u8>) -> String {
        let xml = String::from_utf8(bytes).unwrap();
        let (_, rest) = xml.split_once("?>").unwrap();
        rest.to_string()
    }

    #[test]
    fn test_nested_elements_and_escaping() {
        let mut part = XmlPart::new().unwrap();
        part.element("w:p", &[], |p| {
            p.val("w:pStyle", "Code")?;
            p.text("w:t", &[("xml:space", "preserve")], "a < b & c")
        })
        .unwrap();
        assert_eq!(
            body(part.into_bytes()),
            r#"<w:p><w:pStyle w:val="Code"/><w:t xml:space="preserve">a &lt; b &amp; c</w:t></w:p>"#
        );
    }

    #[test]
    fn test_declaration_is_standalone() {
        let xml = String::from_utf8(XmlPart::new().unwrap().into_bytes()).unwrap();
        assert_eq!(xml, r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    }
}
