//! Content-based file type detection.

use std::path::Path;

use crate::{BlobError, BlobResult};

/// Bytes needed before [`detect_type`] will look at a buffer.
pub const MIN_SNIFF_BYTES: usize = 8;

/// Media type and canonical extension (with leading dot) of a detected file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileType {
    pub media_type: &'static str,
    pub extension: &'static str,
}

impl FileType {
    pub const PDF: FileType = FileType::new("application/pdf", ".pdf");
    pub const TIFF: FileType = FileType::new("image/tiff", ".tiff");
    pub const PNG: FileType = FileType::new("image/png", ".png");
    pub const JPEG: FileType = FileType::new("image/jpeg", ".jpg");
    pub const BMP: FileType = FileType::new("image/bmp", ".bmp");

    const fn new(media_type: &'static str, extension: &'static str) -> Self {
        Self {
            media_type,
            extension,
        }
    }

    /// Extension without the leading dot, as used in object paths.
    pub fn bare_extension(&self) -> &'static str {
        self.extension.trim_start_matches('.')
    }
}

// First match wins.
const SIGNATURES: &[(&[u8], FileType)] = &[
    (b"%PDF", FileType::PDF),
    (&[0x49, 0x49, 0x2A, 0x00], FileType::TIFF),
    (&[0x4D, 0x4D, 0x00, 0x2A], FileType::TIFF),
    (&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A], FileType::PNG),
    (&[0xFF, 0xD8, 0xFF], FileType::JPEG),
    (b"BM", FileType::BMP),
];

/// Identify a file from its leading bytes.
pub fn detect_type(data: &[u8]) -> BlobResult<FileType> {
    if data.len() < MIN_SNIFF_BYTES {
        return Err(BlobError::InsufficientData {
            needed: MIN_SNIFF_BYTES,
            got: data.len(),
        });
    }

    SIGNATURES
        .iter()
        .find(|(magic, _)| data.starts_with(magic))
        .map(|(_, file_type)| *file_type)
        .ok_or_else(|| {
            let head: Vec<String> = data[..4].iter().map(|b| format!("{b:02x}")).collect();
            BlobError::unknown_type(format!("leading bytes {}", head.join(" ")))
        })
}

/// Canonical extension for a file name (or a dotted extension like `.JPEG`).
///
/// `.jpeg .jpe .jif .jfif` become `.jpg`, `.tif` becomes `.tiff`, the
/// supported extensions pass through lower-cased, anything else is `.bin`.
pub fn normalize_extension(name: &str) -> &'static str {
    let ext = Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .or_else(|| {
            // `Path` treats ".pdf" as a hidden file with no extension.
            name.strip_prefix('.')
                .filter(|rest| !rest.contains('.'))
                .map(str::to_ascii_lowercase)
        });

    match ext.as_deref() {
        Some("jpg" | "jpeg" | "jpe" | "jif" | "jfif") => ".jpg",
        Some("tif" | "tiff") => ".tiff",
        Some("pdf") => ".pdf",
        Some("png") => ".png",
        Some("bmp") => ".bmp",
        _ => ".bin",
    }
}
