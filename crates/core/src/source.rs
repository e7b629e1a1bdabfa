//! Byte sources for the tokenizer and the file loader.
//!
//! The parser only ever pulls one byte at a time and occasionally seeks, so
//! anything that can do both can feed it. Two providers ship here: an
//! in-memory buffer (optionally backed by a memory map) and a buffered file.

use crate::error::Result;
use bytes::Bytes;
use memmap2::Mmap;
use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;

/// Pull interface over a seekable byte sequence.
pub trait DataSource {
    /// Next byte, or `None` at end of source.
    fn next_byte(&mut self) -> Option<u8>;

    /// Total length in bytes.
    fn len(&self) -> usize;

    /// Move the read position. Positions past the end clamp to the end.
    fn seek(&mut self, pos: usize);

    /// Position of the byte the next `next_byte` call returns.
    fn position(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Read up to `count` bytes. Returns fewer only at end of source.
    fn read_bytes(&mut self, count: usize) -> Vec<u8> {
        let mut out = Vec::with_capacity(count.min(self.len()));
        for _ in 0..count {
            match self.next_byte() {
                Some(b) => out.push(b),
                None => break,
            }
        }
        out
    }
}

impl<S: DataSource + ?Sized> DataSource for &mut S {
    fn next_byte(&mut self) -> Option<u8> {
        (**self).next_byte()
    }

    fn len(&self) -> usize {
        (**self).len()
    }

    fn seek(&mut self, pos: usize) {
        (**self).seek(pos);
    }

    fn position(&self) -> usize {
        (**self).position()
    }
}

/// In-memory source over shared bytes.
#[derive(Debug, Clone)]
pub struct BufferSource {
    data: Bytes,
    pos: usize,
}

impl BufferSource {
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self {
            data: data.into(),
            pos: 0,
        }
    }

    /// Copies `data` into owned storage.
    pub fn from_slice(data: &[u8]) -> Self {
        Self::new(Bytes::copy_from_slice(data))
    }

    /// Zero-copy source over a memory-mapped file.
    pub fn from_mmap(mmap: Mmap) -> Self {
        Self::new(Bytes::from_owner(mmap))
    }

    /// Memory-map `path` and wrap it.
    pub fn map_file(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        // SAFETY: the mapping is read-only and the loader copies out every
        // value it keeps; truncation by another process is not defended against.
        let mmap = unsafe { Mmap::map(&file) }?;
        Ok(Self::from_mmap(mmap))
    }

    pub fn bytes(&self) -> &Bytes {
        &self.data
    }
}

impl DataSource for BufferSource {
    fn next_byte(&mut self) -> Option<u8> {
        let b = self.data.get(self.pos).copied()?;
        self.pos += 1;
        Some(b)
    }

    fn len(&self) -> usize {
        self.data.len()
    }

    fn seek(&mut self, pos: usize) {
        self.pos = pos.min(self.data.len());
    }

    fn position(&self) -> usize {
        self.pos
    }

    fn read_bytes(&mut self, count: usize) -> Vec<u8> {
        let end = self.pos.saturating_add(count).min(self.data.len());
        let out = self.data[self.pos..end].to_vec();
        self.pos = end;
        out
    }
}

/// Buffered reader over an open file.
///
/// Read errors are logged and reported as end of source, which the parser
/// turns into an error token.
#[derive(Debug)]
pub struct FileSource {
    reader: BufReader<File>,
    pos: usize,
    len: usize,
}

impl FileSource {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        Self::new(file)
    }

    pub fn new(file: File) -> Result<Self> {
        let len = usize::try_from(file.metadata()?.len()).unwrap_or(usize::MAX);
        Ok(Self {
            reader: BufReader::new(file),
            pos: 0,
            len,
        })
    }
}

impl DataSource for FileSource {
    fn next_byte(&mut self) -> Option<u8> {
        if self.pos >= self.len {
            return None;
        }
        let mut buf = [0u8; 1];
        match self.reader.read(&mut buf) {
            Ok(1) => {
                self.pos += 1;
                Some(buf[0])
            }
            Ok(_) => None,
            Err(e) => {
                tracing::warn!(pos = self.pos, error = %e, "read failed");
                None
            }
        }
    }

    fn len(&self) -> usize {
        self.len
    }

    fn seek(&mut self, pos: usize) {
        let pos = pos.min(self.len);
        match self.reader.seek(SeekFrom::Start(pos as u64)) {
            Ok(_) => self.pos = pos,
            Err(e) => tracing::warn!(pos, error = %e, "seek failed"),
        }
    }

    fn position(&self) -> usize {
        self.pos
    }
}
