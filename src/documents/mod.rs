// src/documents/mod.rs
//! ODT, DOCX and print-HTML rendering of CV data

pub mod docx;
pub mod generator;
pub mod html;
pub mod odt;
pub mod outline;

pub use generator::{DocumentFormat, DocumentGenerator, GeneratedFile};
pub use outline::DocumentOutline;

use anyhow::{Context, Result};
use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::richtext::{Block, BlockKind};

/// Consecutive list items are emitted as one list
pub(crate) enum BlockGroup<'a> {
    Paragraph(&'a Block),
    List(BlockKind, Vec<&'a Block>),
}

pub(crate) fn group_blocks(blocks: &[Block]) -> Vec<BlockGroup<'_>> {
    let mut groups: Vec<BlockGroup<'_>> = Vec::new();

    for block in blocks {
        if block.kind == BlockKind::Paragraph {
            groups.push(BlockGroup::Paragraph(block));
            continue;
        }
        match groups.last_mut() {
            Some(BlockGroup::List(kind, items)) if *kind == block.kind => items.push(block),
            _ => groups.push(BlockGroup::List(block.kind, vec![block])),
        }
    }

    groups
}

/// One file inside an ODT/DOCX package
pub(crate) struct PackageEntry {
    pub name: &'static str,
    pub content: String,
    pub stored: bool,
}

impl PackageEntry {
    pub fn deflated(name: &'static str, content: String) -> Self {
        Self {
            name,
            content,
            stored: false,
        }
    }

    pub fn stored(name: &'static str, content: String) -> Self {
        Self {
            name,
            content,
            stored: true,
        }
    }
}

/// Write entries into a zip archive in the given order
pub(crate) fn write_package(entries: Vec<PackageEntry>) -> Result<Vec<u8>> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));

    for entry in entries {
        let method = if entry.stored {
            CompressionMethod::Stored
        } else {
            CompressionMethod::Deflated
        };
        let options = SimpleFileOptions::default().compression_method(method);
        zip.start_file(entry.name, options)
            .with_context(|| format!("Failed to start package entry {}", entry.name))?;
        zip.write_all(entry.content.as_bytes())
            .with_context(|| format!("Failed to write package entry {}", entry.name))?;
    }

    let cursor = zip.finish().context("Failed to finish package")?;
    Ok(cursor.into_inner())
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::io::{Cursor, Read};

    use zip::ZipArchive;

    pub fn entry_names(bytes: &[u8]) -> Vec<String> {
        let archive = ZipArchive::new(Cursor::new(bytes.to_vec())).unwrap();
        archive.file_names().map(str::to_string).collect()
    }

    pub fn read_entry(bytes: &[u8], name: &str) -> String {
        let mut archive = ZipArchive::new(Cursor::new(bytes.to_vec())).unwrap();
        let mut file = archive.by_name(name).unwrap();
        let mut content = String::new();
        file.read_to_string(&mut content).unwrap();
        content
    }

    pub fn first_entry(bytes: &[u8]) -> (String, zip::CompressionMethod) {
        let mut archive = ZipArchive::new(Cursor::new(bytes.to_vec())).unwrap();
        let file = archive.by_index(0).unwrap();
        (file.name().to_string(), file.compression())
    }
}
