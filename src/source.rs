//! The Byte Source Adapter: a uniform abstraction over seekable and
//! non-seekable input.

use crate::error::{Error, Result};
use std::fmt::Debug;
use std::fs::File;
use std::io::{Cursor, Read, Seek, SeekFrom};

/// An opaque source position. Two positions compare equal only if they were
/// observed from the same source and no intervening write changed its length.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position(pub(crate) u64);

/// A uniform abstraction over the byte source backing a [`crate::reader::Reader`].
///
/// Implementations are free to be seekable (file, in-memory buffer) or
/// non-seekable (pipe, already-open stream handle passed in by the caller).
/// A non-seekable source reports `is_seekable() == false` and `pos()` always
/// returns `None`; callers on such a source must request eager binary
/// materialization and full recursive population, since lazy re-reads are
/// unavailable.
pub trait Source: Debug {
    /// Read exactly `n` bytes, or fail (including with end-of-stream).
    fn read(&mut self, n: usize) -> Result<Vec<u8>>;

    /// Read a single byte.
    fn read_one(&mut self) -> Result<u8> {
        let mut buf = [0u8; 1];
        self.read_exact_into(&mut buf)?;
        Ok(buf[0])
    }

    /// Advance the stream by `n` bytes, discarding their content.
    fn skip(&mut self, n: u64) -> Result<()>;

    /// Whether the source is at end-of-stream.
    fn eof(&mut self) -> Result<bool>;

    /// Whether this source supports `pos`/`seek`.
    fn is_seekable(&self) -> bool {
        false
    }

    /// The current position, if the source is seekable.
    fn pos(&mut self) -> Option<Position> {
        None
    }

    /// Reposition to `pos`. Only meaningful when `is_seekable()` is true.
    ///
    /// Implementations must verify (via a follow-up `pos()`) that the seek
    /// landed exactly where requested, returning
    /// [`Error::SeekInconsistent`] otherwise.
    fn seek(&mut self, pos: Position) -> Result<()> {
        let _ = pos;
        Err(Error::SeekInconsistent)
    }

    /// Read `n` bytes into a caller-supplied buffer. Default implementation
    /// built on `read`; seekable sources may override for fewer allocations.
    fn read_exact_into(&mut self, buf: &mut [u8]) -> Result<()> {
        let bytes = self.read(buf.len())?;
        buf.copy_from_slice(&bytes);
        Ok(())
    }
}

/// A seekable source backed by an open [`File`], used for the filesystem-path
/// form of `open`. Opened in raw byte mode: no text translation of any kind.
#[derive(Debug)]
pub struct FileSource {
    file: File,
    len: u64,
}

impl FileSource {
    /// Open a filesystem path as a raw, seekable byte source.
    pub fn open(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let file = File::open(path)?;
        let len = file.metadata()?.len();
        Ok(Self { file, len })
    }
}

impl Source for FileSource {
    fn read(&mut self, n: usize) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; n];
        self.file.read_exact(&mut buf)?;
        Ok(buf)
    }

    fn skip(&mut self, n: u64) -> Result<()> {
        self.file.seek(SeekFrom::Current(n as i64))?;
        Ok(())
    }

    fn eof(&mut self) -> Result<bool> {
        let pos = self.file.stream_position()?;
        Ok(pos >= self.len)
    }

    fn is_seekable(&self) -> bool {
        true
    }

    fn pos(&mut self) -> Option<Position> {
        self.file.stream_position().ok().map(Position)
    }

    fn seek(&mut self, pos: Position) -> Result<()> {
        self.file.seek(SeekFrom::Start(pos.0))?;
        let landed = self.pos();
        if landed != Some(pos) {
            return Err(Error::SeekInconsistent);
        }
        Ok(())
    }
}

/// A seekable source backed by an in-memory byte buffer.
#[derive(Debug)]
pub struct MemorySource {
    cursor: Cursor<Vec<u8>>,
}

impl MemorySource {
    /// Wrap an in-memory buffer as a seekable source.
    pub fn new(buf: Vec<u8>) -> Self {
        Self {
            cursor: Cursor::new(buf),
        }
    }
}

impl Source for MemorySource {
    fn read(&mut self, n: usize) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; n];
        self.cursor.read_exact(&mut buf)?;
        Ok(buf)
    }

    fn skip(&mut self, n: u64) -> Result<()> {
        self.cursor.seek(SeekFrom::Current(n as i64))?;
        Ok(())
    }

    fn eof(&mut self) -> Result<bool> {
        Ok(self.cursor.position() >= self.cursor.get_ref().len() as u64)
    }

    fn is_seekable(&self) -> bool {
        true
    }

    fn pos(&mut self) -> Option<Position> {
        Some(Position(self.cursor.position()))
    }

    fn seek(&mut self, pos: Position) -> Result<()> {
        self.cursor.seek(SeekFrom::Start(pos.0))?;
        if self.cursor.position() != pos.0 {
            return Err(Error::SeekInconsistent);
        }
        Ok(())
    }
}

/// A non-seekable source wrapping an already-open `Read` handle (a pipe, a
/// socket, a caller-owned stream). Used in place, never duplicated; dropping
/// it (via `Reader::close`) closes the handle.
///
/// `eof()` must peek a byte to answer honestly, so one byte of lookahead is
/// buffered here and drained before the next real read.
pub struct StreamSource<R> {
    inner: R,
    peeked: Option<u8>,
    at_eof: bool,
}

impl<R: Read> StreamSource<R> {
    /// Wrap an already-open reader as a non-seekable source.
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            peeked: None,
            at_eof: false,
        }
    }

    fn read_into(&mut self, buf: &mut [u8]) -> Result<()> {
        let mut filled = 0;
        if let Some(b) = self.peeked.take() {
            buf[0] = b;
            filled = 1;
        }
        if filled < buf.len() {
            self.inner.read_exact(&mut buf[filled..])?;
        }
        Ok(())
    }
}

impl<R> Debug for StreamSource<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamSource")
            .field("at_eof", &self.at_eof)
            .field("peeked", &self.peeked)
            .finish()
    }
}

impl<R: Read> Source for StreamSource<R> {
    fn read(&mut self, n: usize) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; n];
        self.read_into(&mut buf)?;
        Ok(buf)
    }

    fn skip(&mut self, n: u64) -> Result<()> {
        let mut n = n;
        if let Some(_) = self.peeked.take() {
            n = n.saturating_sub(1);
        }
        let mut sink = std::io::sink();
        let copied = std::io::copy(&mut (&mut self.inner).take(n), &mut sink)?;
        if copied != n {
            self.at_eof = true;
        }
        Ok(())
    }

    fn eof(&mut self) -> Result<bool> {
        if self.peeked.is_some() {
            return Ok(false);
        }
        if self.at_eof {
            return Ok(true);
        }
        let mut probe = [0u8; 1];
        match self.inner.read(&mut probe) {
            Ok(0) => {
                self.at_eof = true;
                Ok(true)
            }
            Ok(_) => {
                self.peeked = Some(probe[0]);
                Ok(false)
            }
            Err(e) => Err(e.into()),
        }
    }
}
