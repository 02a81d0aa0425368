/*!
 * Archive codec for ZIP-of-XML document containers.
 *
 * The container is held as an ordered, in-memory part table. Parts are opaque
 * byte blobs keyed by path; nothing here interprets XML. Parts that are never
 * replaced are written back with their original bytes and compression method.
 */

use std::io::{Cursor, Read, Write};

use log::debug;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::errors::ArchiveError;

/// Upper bound on the buffer reserved from an entry's declared size
const MAX_PART_PREALLOCATION: usize = 8 * 1024 * 1024;

/// A single named member of the container
#[derive(Debug, Clone)]
pub struct ContainerPart {
    /// Path of the part inside the archive
    pub path: String,

    /// Uncompressed part bytes
    pub data: Vec<u8>,

    /// Compression method used when the part was read
    compression: CompressionMethod,

    /// Whether the entry is a directory marker
    is_dir: bool,

    /// Whether the part was replaced since opening
    modified: bool,
}

/// Mutable in-memory part table for one translation run
#[derive(Debug, Clone, Default)]
pub struct Container {
    parts: Vec<ContainerPart>,
}

impl Container {
    /// Open a container from raw archive bytes
    pub fn open(bytes: &[u8]) -> Result<Self, ArchiveError> {
        let mut archive = ZipArchive::new(Cursor::new(bytes))
            .map_err(|e| ArchiveError::Corrupt(e.to_string()))?;

        let mut parts = Vec::with_capacity(archive.len());
        for index in 0..archive.len() {
            let mut file = archive
                .by_index(index)
                .map_err(|e| ArchiveError::Corrupt(format!("entry {}: {}", index, e)))?;

            let mut data = Vec::with_capacity(read_capacity(file.size()));
            file.read_to_end(&mut data)
                .map_err(|e| ArchiveError::Corrupt(format!("{}: {}", file.name(), e)))?;

            parts.push(ContainerPart {
                path: file.name().to_string(),
                data,
                compression: file.compression(),
                is_dir: file.is_dir(),
                modified: false,
            });
        }

        debug!("Opened container with {} parts", parts.len());
        Ok(Self { parts })
    }

    /// Get the bytes of a part, if present
    pub fn part(&self, path: &str) -> Option<&[u8]> {
        self.parts
            .iter()
            .find(|p| p.path == path)
            .map(|p| p.data.as_slice())
    }

    /// Replace a part's bytes, or append a new part
    pub fn set_part(&mut self, path: &str, bytes: Vec<u8>) {
        if let Some(part) = self.parts.iter_mut().find(|p| p.path == path) {
            part.data = bytes;
            part.modified = true;
            return;
        }

        self.parts.push(ContainerPart {
            path: path.to_string(),
            data: bytes,
            compression: CompressionMethod::Deflated,
            is_dir: false,
            modified: true,
        });
    }

    /// Part paths in archive order
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.parts.iter().filter(|p| !p.is_dir).map(|p| p.path.as_str())
    }

    /// Whether a part was replaced since the container was opened
    pub fn is_modified(&self, path: &str) -> bool {
        self.parts.iter().any(|p| p.path == path && p.modified)
    }

    /// Number of entries in the container
    pub fn len(&self) -> usize {
        self.parts.len()
    }

    /// Whether the container has no entries
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Serialize the container back into archive bytes
    pub fn commit(&self) -> Result<Vec<u8>, ArchiveError> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));

        for part in &self.parts {
            let method = match part.compression {
                CompressionMethod::Stored => CompressionMethod::Stored,
                _ => CompressionMethod::Deflated,
            };
            let options = SimpleFileOptions::default().compression_method(method);

            if part.is_dir {
                writer
                    .add_directory(part.path.as_str(), options)
                    .map_err(|e| ArchiveError::Write(format!("{}: {}", part.path, e)))?;
                continue;
            }

            writer
                .start_file(part.path.as_str(), options)
                .map_err(|e| ArchiveError::Write(format!("{}: {}", part.path, e)))?;
            writer
                .write_all(&part.data)
                .map_err(|e| ArchiveError::Write(format!("{}: {}", part.path, e)))?;
        }

        let cursor = writer
            .finish()
            .map_err(|e| ArchiveError::Write(e.to_string()))?;
        Ok(cursor.into_inner())
    }
}

/// Buffer size to reserve for an entry; the header value is untrusted
fn read_capacity(declared: u64) -> usize {
    usize::try_from(declared)
        .unwrap_or(usize::MAX)
        .min(MAX_PART_PREALLOCATION)
}
