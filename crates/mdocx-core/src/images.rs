// SPDX-License-Identifier: AGPL-3.0-or-later
//! Image loading side-channel
//!
//! Image nodes carry a literal path reference. The transducer resolves it
//! synchronously through an [`ImageSource`] while handling the node's enter
//! event, then sniffs the format and pixel size so the drawing can be sized.

use crate::model::ImageFormat;
use std::io;
use std::path::{Path, PathBuf};

/// Resolves a path reference from an Image node to its bytes
pub trait ImageSource {
    fn load(&self, reference: &str) -> io::Result<Vec<u8>>;
}

/// Reads images from disk, resolving relative references against a base directory
#[derive(Debug, Clone)]
pub struct FsImageSource {
    base_dir: PathBuf,
}

impl FsImageSource {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// Base directory taken from the Markdown file's own location
    pub fn for_input(input: &Path) -> Self {
        let base = input
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        Self::new(base)
    }

    pub fn resolve(&self, reference: &str) -> PathBuf {
        let path = Path::new(reference);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }
}

impl ImageSource for FsImageSource {
    fn load(&self, reference: &str) -> io::Result<Vec<u8>> {
        std::fs::read(self.resolve(reference))
    }
}

/// Format and pixel dimensions read from an image header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageInfo {
    pub format: ImageFormat,
    pub width: u32,
    pub height: u32,
}

const PNG_SIGNATURE: &[u8] = b"\x89PNG\r\n\x1a\n";

/// Identify a PNG, JPEG or GIF image and read its size
pub fn sniff(bytes: &[u8]) -> io::Result<ImageInfo> {
    if bytes.starts_with(PNG_SIGNATURE) {
        sniff_png(bytes)
    } else if bytes.starts_with(&[0xFF, 0xD8]) {
        sniff_jpeg(bytes)
    } else if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
        sniff_gif(bytes)
    } else {
        Err(invalid("unrecognised image format"))
    }
}

fn invalid(message: &str) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, message.to_string())
}

fn be_u16(bytes: &[u8], at: usize) -> Option<u32> {
    let b = bytes.get(at..at + 2)?;
    Some(u32::from(u16::from_be_bytes([b[0], b[1]])))
}

fn be_u32(bytes: &[u8], at: usize) -> Option<u32> {
    let b = bytes.get(at..at + 4)?;
    Some(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
}

fn sniff_png(bytes: &[u8]) -> io::Result<ImageInfo> {
    // IHDR is always the first chunk: length(4) type(4) width(4) height(4)
    if bytes.get(12..16) != Some(b"IHDR".as_slice()) {
        return Err(invalid("PNG without IHDR chunk"));
    }
    let width = be_u32(bytes, 16).ok_or_else(|| invalid("truncated PNG header"))?;
    let height = be_u32(bytes, 20).ok_or_else(|| invalid("truncated PNG header"))?;
    Ok(ImageInfo {
        format: ImageFormat::Png,
        width,
        height,
    })
}

fn sniff_jpeg(bytes: &[u8]) -> io::Result<ImageInfo> {
    let mut at = 2;
    while at + 4 <= bytes.len() {
        if bytes[at] != 0xFF {
            return Err(invalid("corrupt JPEG marker"));
        }
        let marker = bytes[at + 1];
        // Standalone markers carry no length
        if marker == 0xFF || (0xD0..=0xD9).contains(&marker) || marker == 0x01 {
            at += if marker == 0xFF { 1 } else { 2 };
            continue;
        }
        let length = be_u16(bytes, at + 2).ok_or_else(|| invalid("truncated JPEG"))? as usize;
        let is_sof = matches!(marker, 0xC0..=0xCF) && !matches!(marker, 0xC4 | 0xC8 | 0xCC);
        if is_sof {
            let height = be_u16(bytes, at + 5).ok_or_else(|| invalid("truncated JPEG"))?;
            let width = be_u16(bytes, at + 7).ok_or_else(|| invalid("truncated JPEG"))?;
            return Ok(ImageInfo {
                format: ImageFormat::Jpeg,
                width,
                height,
            });
        }
        at += 2 + length;
    }
    Err(invalid("JPEG without frame header"))
}

fn sniff_gif(bytes: &[u8]) -> io::Result<ImageInfo> {
    let b = bytes.get(6..10).ok_or_else(|| invalid("truncated GIF header"))?;
    Ok(ImageInfo {
        format: ImageFormat::Gif,
        width: u32::from(u16::from_le_bytes([b[0], b[1]])),
        height: u32::from(u16::from_le_bytes([b[2], b[3]])),
    })
}
