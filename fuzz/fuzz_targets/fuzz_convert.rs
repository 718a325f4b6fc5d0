// SPDX-License-Identifier: AGPL-3.0-or-later
#![no_main]

use libfuzzer_sys::fuzz_target;
use mdocx_core::{convert, ConvertConfig, ImageSource};
use mdocx_package::DocxPackager;
use std::io::{self, Cursor};

struct NoImages;

impl ImageSource for NoImages {
    fn load(&self, reference: &str) -> io::Result<Vec<u8>> {
        Err(io::Error::new(io::ErrorKind::NotFound, reference.to_string()))
    }
}

// Any input either fails conversion with a typed error or packages cleanly
fuzz_target!(|data: &[u8]| {
    if let Ok(markdown) = std::str::from_utf8(data) {
        if let Ok(doc) = convert(markdown, &ConvertConfig::default(), &NoImages) {
            DocxPackager::new()
                .write(&doc, Cursor::new(Vec::new()))
                .unwrap();
        }
    }
});
