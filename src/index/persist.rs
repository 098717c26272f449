//! On-disk index format
//!
//! An index directory holds two files:
//! - `index.bin`: little-endian binary with a magic header, the model id and
//!   every chunk with its vector
//! - `manifest.json`: summary plus a blake3 checksum of `index.bin`
//!
//! Both are written to temporary files and renamed into place.

use super::{ChunkId, VectorIndex};
use crate::chunk::{ChunkSource, Passage, SourceKind};
use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const INDEX_FILE: &str = "index.bin";
pub const MANIFEST_FILE: &str = "manifest.json";
pub const FORMAT_VERSION: u16 = 1;

const MAGIC: &[u8; 4] = b"OQIX";

/// Summary written next to the binary index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexManifest {
    pub format_version: u16,
    pub model: String,
    pub dimension: usize,
    pub chunk_count: usize,
    pub built_at: DateTime<Utc>,
    /// blake3 hex digest of `index.bin`
    pub checksum: String,
}

impl IndexManifest {
    /// Read the manifest of an index directory
    pub fn load(dir: &Path) -> Result<Self> {
        let path = dir.join(MANIFEST_FILE);
        let content = std::fs::read_to_string(&path).map_err(|e| {
            Error::IndexUnavailable(format!("cannot read {}: {}", path.display(), e))
        })?;
        serde_json::from_str(&content).map_err(|e| {
            Error::IndexUnavailable(format!("invalid manifest {}: {}", path.display(), e))
        })
    }
}

impl VectorIndex {
    /// Serialize the index to its binary form
    ///
    /// Fails when a length does not fit the format's `u32` fields.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        out.extend_from_slice(MAGIC);
        out.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
        put_u32(&mut out, self.dimension, "dimension")?;
        put_bytes(&mut out, self.model.as_bytes(), "model name")?;
        put_u32(&mut out, self.chunks.len(), "chunk count")?;

        for chunk in &self.chunks {
            out.extend_from_slice(&chunk.id.to_le_bytes());
            out.push(kind_tag(chunk.kind()));
            put_bytes(&mut out, chunk.text.as_bytes(), "chunk text")?;
            if let Some(extra) = chunk.extra() {
                put_bytes(&mut out, extra.as_bytes(), "chunk source")?;
            }
            for value in &chunk.embedding {
                out.extend_from_slice(&value.to_le_bytes());
            }
        }

        Ok(out)
    }

    /// Parse the binary form produced by [`VectorIndex::to_bytes`]
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut reader = ByteReader::new(bytes);

        if reader.array::<4>()? != *MAGIC {
            return Err(corrupt("bad magic"));
        }
        let version = u16::from_le_bytes(reader.array()?);
        if version != FORMAT_VERSION {
            return Err(Error::IndexUnavailable(format!(
                "unsupported index format version {}",
                version
            )));
        }

        let dimension = reader.u32()? as usize;
        let model = reader.string()?;
        let count = reader.u32()?;

        let mut index = VectorIndex::new(dimension, model);
        for expected_id in 0..count {
            let id: ChunkId = reader.u32()?;
            if id != expected_id {
                return Err(corrupt(&format!(
                    "chunk id {} found where {} was expected",
                    id, expected_id
                )));
            }

            let kind = tag_kind(reader.u8()?)?;
            let text = reader.string()?;
            let source = match kind {
                SourceKind::Site => ChunkSource::Site,
                SourceKind::FaqAnswer => ChunkSource::FaqAnswer {
                    question: reader.string()?,
                },
                SourceKind::FaqQuestion => ChunkSource::FaqQuestion {
                    answer: reader.string()?,
                },
            };

            let mut embedding = Vec::with_capacity(dimension);
            for _ in 0..dimension {
                embedding.push(f32::from_le_bytes(reader.array()?));
            }
            index.add(Passage::new(text, source), embedding)?;
        }

        if !reader.is_exhausted() {
            return Err(corrupt("trailing bytes after last chunk"));
        }

        Ok(index)
    }

    /// Write `index.bin` and `manifest.json` into `dir`
    pub fn save(&self, dir: &Path) -> Result<IndexManifest> {
        std::fs::create_dir_all(dir)?;

        let bytes = self.to_bytes()?;
        let manifest = IndexManifest {
            format_version: FORMAT_VERSION,
            model: self.model.clone(),
            dimension: self.dimension,
            chunk_count: self.len(),
            built_at: Utc::now(),
            checksum: blake3::hash(&bytes).to_hex().to_string(),
        };
        let manifest_json = serde_json::to_string_pretty(&manifest)?;

        let index_tmp = temp_path(dir, INDEX_FILE);
        let manifest_tmp = temp_path(dir, MANIFEST_FILE);
        std::fs::write(&index_tmp, &bytes)?;
        std::fs::write(&manifest_tmp, manifest_json)?;
        std::fs::rename(&index_tmp, dir.join(INDEX_FILE))?;
        std::fs::rename(&manifest_tmp, dir.join(MANIFEST_FILE))?;

        info!(
            "Saved index with {} chunks ({} bytes) to {}",
            manifest.chunk_count,
            bytes.len(),
            dir.display()
        );
        Ok(manifest)
    }

    /// Load and verify an index directory
    pub fn load(dir: &Path) -> Result<Self> {
        let index_path = dir.join(INDEX_FILE);
        if !index_path.exists() {
            return Err(Error::IndexUnavailable(format!(
                "no index found at {}; run the build first",
                dir.display()
            )));
        }

        let manifest = IndexManifest::load(dir)?;
        if manifest.format_version != FORMAT_VERSION {
            return Err(Error::IndexUnavailable(format!(
                "unsupported manifest format version {}",
                manifest.format_version
            )));
        }

        let bytes = std::fs::read(&index_path).map_err(|e| {
            Error::IndexUnavailable(format!("cannot read {}: {}", index_path.display(), e))
        })?;
        let checksum = blake3::hash(&bytes).to_hex().to_string();
        if checksum != manifest.checksum {
            return Err(corrupt("checksum does not match manifest"));
        }

        let index = Self::from_bytes(&bytes)?;
        if index.dimension != manifest.dimension {
            return Err(Error::DimensionMismatch {
                expected: manifest.dimension,
                actual: index.dimension,
            });
        }
        if index.model != manifest.model || index.len() != manifest.chunk_count {
            return Err(corrupt("manifest disagrees with index contents"));
        }

        debug!(
            "Loaded index: {} chunks, dimension {}, model {}",
            index.len(),
            index.dimension,
            index.model
        );
        Ok(index)
    }
}

fn temp_path(dir: &Path, name: &str) -> PathBuf {
    dir.join(format!(".{}.tmp", name))
}

fn corrupt(detail: &str) -> Error {
    Error::IndexUnavailable(format!("corrupt index: {}", detail))
}

fn kind_tag(kind: SourceKind) -> u8 {
    match kind {
        SourceKind::Site => 0,
        SourceKind::FaqAnswer => 1,
        SourceKind::FaqQuestion => 2,
    }
}

fn tag_kind(tag: u8) -> Result<SourceKind> {
    match tag {
        0 => Ok(SourceKind::Site),
        1 => Ok(SourceKind::FaqAnswer),
        2 => Ok(SourceKind::FaqQuestion),
        other => Err(corrupt(&format!("unknown chunk kind {}", other))),
    }
}

fn put_u32(out: &mut Vec<u8>, value: usize, field: &str) -> Result<()> {
    let value = u32::try_from(value).map_err(|_| {
        Error::IndexUnavailable(format!("{} of {} does not fit the index format", field, value))
    })?;
    out.extend_from_slice(&value.to_le_bytes());
    Ok(())
}

fn put_bytes(out: &mut Vec<u8>, bytes: &[u8], field: &str) -> Result<()> {
    put_u32(out, bytes.len(), field)?;
    out.extend_from_slice(bytes);
    Ok(())
}

struct ByteReader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|end| *end <= self.bytes.len())
            .ok_or_else(|| corrupt("unexpected end of file"))?;
        let slice = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    fn u8(&mut self) -> Result<u8> {
        Ok(self.array::<1>()?[0])
    }

    fn u32(&mut self) -> Result<u32> {
        Ok(u32::from_le_bytes(self.array()?))
    }

    fn string(&mut self) -> Result<String> {
        let len = self.u32()? as usize;
        let bytes = self.take(len)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| corrupt("text is not valid UTF-8"))
    }

    fn is_exhausted(&self) -> bool {
        self.pos == self.bytes.len()
    }
}
