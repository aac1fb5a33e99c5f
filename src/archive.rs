//! Archive inspection module
//!
//! Subtitles on legendas.tv are distributed as RAR or ZIP archives, and the
//! declared file extension is not trustworthy. The format is therefore
//! detected from the content itself before any reader touches it.

use crate::temp::stage_bytes;
use std::fmt;
use std::io::{self, Cursor, Read};
use thiserror::Error;
use zip::ZipArchive;
use zip::result::ZipError;

/// File extensions recognized as subtitles
pub const SUBTITLE_EXTENSIONS: [&str; 7] = [".srt", ".sub", ".smi", ".txt", ".ssa", ".ass", ".mpl"];

/// Marker carried by the site's own signature files inside archives
pub const WATERMARK: &str = "legendas.tv";

/// Errors that can occur while reading an archive
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// Failed to stage the archive for a path-based reader
    #[error("Failed to stage archive: {0}")]
    Staging(#[from] io::Error),

    /// The content looks like an archive but cannot be read
    #[error("Corrupt {format} archive: {reason}")]
    Corrupt {
        format: ArchiveFormat,
        reason: String,
    },

    /// A recognized archive does not contain the requested member
    #[error("Archive member not found: {0}")]
    MemberNotFound(String),
}

/// Archive format detected from content
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    Rar,
    Zip,
    /// Neither RAR nor ZIP; such content holds no usable subtitle
    Unrecognized,
}

impl fmt::Display for ArchiveFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArchiveFormat::Rar => write!(f, "RAR"),
            ArchiveFormat::Zip => write!(f, "ZIP"),
            ArchiveFormat::Unrecognized => write!(f, "unrecognized"),
        }
    }
}

/// Decides which archive member names are subtitles worth offering
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameFilter {
    /// Lowercase extensions including the leading dot
    pub extensions: Vec<String>,
    /// Lowercase marker of site signature files
    pub watermark: String,
}

impl Default for NameFilter {
    fn default() -> Self {
        Self {
            extensions: SUBTITLE_EXTENSIONS.iter().map(|ext| ext.to_string()).collect(),
            watermark: WATERMARK.to_string(),
        }
    }
}

impl NameFilter {
    /// Returns true for subtitle files that are not site signatures
    pub fn accepts(&self, name: &str) -> bool {
        let lower = name.to_lowercase();

        if !self.watermark.is_empty() && lower.contains(&self.watermark) {
            return false;
        }

        self.extensions.iter().any(|ext| lower.ends_with(ext.as_str()))
    }
}

/// Sniffs the archive format, probing RAR before ZIP
pub fn detect_format(content: &[u8]) -> ArchiveFormat {
    if infer::archive::is_rar(content) {
        ArchiveFormat::Rar
    } else if infer::archive::is_zip(content) {
        ArchiveFormat::Zip
    } else {
        ArchiveFormat::Unrecognized
    }
}

/// Lists the subtitle files inside an archive
///
/// Unrecognized content yields an empty list rather than an error, since
/// listing entries sometimes point at files that are not archives at all.
///
/// # Errors
///
/// Returns an error if the content is recognized as an archive but cannot
/// be read.
pub fn list_subtitle_names(content: &[u8], filter: &NameFilter) -> Result<Vec<String>, ArchiveError> {
    let names = match detect_format(content) {
        ArchiveFormat::Rar => rar_member_names(content)?,
        ArchiveFormat::Zip => zip_member_names(content)?,
        ArchiveFormat::Unrecognized => return Ok(Vec::new()),
    };

    Ok(names.into_iter().filter(|name| filter.accepts(name)).collect())
}

/// Extracts one member from an archive with line endings normalized
///
/// Returns `Ok(None)` if the content is not a recognized archive.
///
/// # Errors
///
/// Returns [`ArchiveError::MemberNotFound`] if the archive is recognized but
/// lacks `name`, and [`ArchiveError::Corrupt`] if it cannot be read.
pub fn extract_subtitle(content: &[u8], name: &str) -> Result<Option<Vec<u8>>, ArchiveError> {
    let raw = match detect_format(content) {
        ArchiveFormat::Rar => extract_rar_member(content, name)?,
        ArchiveFormat::Zip => extract_zip_member(content, name)?,
        ArchiveFormat::Unrecognized => return Ok(None),
    };

    Ok(Some(fix_line_endings(&raw)))
}

/// Converts CRLF line endings to LF
pub fn fix_line_endings(content: &[u8]) -> Vec<u8> {
    let mut fixed = Vec::with_capacity(content.len());
    let mut bytes = content.iter().copied().peekable();

    while let Some(byte) = bytes.next() {
        if byte == b'\r' && bytes.peek() == Some(&b'\n') {
            continue;
        }
        fixed.push(byte);
    }

    fixed
}

fn corrupt(format: ArchiveFormat, reason: impl fmt::Display) -> ArchiveError {
    ArchiveError::Corrupt {
        format,
        reason: reason.to_string(),
    }
}

fn open_zip(content: &[u8]) -> Result<ZipArchive<Cursor<&[u8]>>, ArchiveError> {
    ZipArchive::new(Cursor::new(content)).map_err(|e| corrupt(ArchiveFormat::Zip, e))
}

fn zip_member_names(content: &[u8]) -> Result<Vec<String>, ArchiveError> {
    let mut archive = open_zip(content)?;

    (0..archive.len())
        .map(|index| {
            archive
                .by_index_raw(index)
                .map(|file| file.name().to_string())
                .map_err(|e| corrupt(ArchiveFormat::Zip, e))
        })
        .collect()
}

fn extract_zip_member(content: &[u8], name: &str) -> Result<Vec<u8>, ArchiveError> {
    let mut archive = open_zip(content)?;

    let mut file = archive.by_name(name).map_err(|e| match e {
        ZipError::FileNotFound => ArchiveError::MemberNotFound(name.to_string()),
        other => corrupt(ArchiveFormat::Zip, other),
    })?;

    let mut data = Vec::new();
    file.read_to_end(&mut data)
        .map_err(|e| corrupt(ArchiveFormat::Zip, e))?;

    Ok(data)
}

fn rar_member_names(content: &[u8]) -> Result<Vec<String>, ArchiveError> {
    let staged = stage_bytes("legendastv", "rar", content)?;

    let archive = unrar::Archive::new(staged.path())
        .open_for_listing()
        .map_err(|e| corrupt(ArchiveFormat::Rar, e))?;

    let mut names = Vec::new();
    for header in archive {
        let header = header.map_err(|e| corrupt(ArchiveFormat::Rar, e))?;
        names.push(header.filename.to_string_lossy().into_owned());
    }

    Ok(names)
}

fn extract_rar_member(content: &[u8], name: &str) -> Result<Vec<u8>, ArchiveError> {
    let staged = stage_bytes("legendastv", "rar", content)?;

    let mut archive = unrar::Archive::new(staged.path())
        .open_for_processing()
        .map_err(|e| corrupt(ArchiveFormat::Rar, e))?;

    while let Some(header) = archive
        .read_header()
        .map_err(|e| corrupt(ArchiveFormat::Rar, e))?
    {
        if header.entry().filename.to_string_lossy() == name {
            let (data, _rest) = header.read().map_err(|e| corrupt(ArchiveFormat::Rar, e))?;
            return Ok(data);
        }
        archive = header.skip().map_err(|e| corrupt(ArchiveFormat::Rar, e))?;
    }

    Err(ArchiveError::MemberNotFound(name.to_string()))
}
