//! Reader lifecycle: owns the Byte Source Adapter and hands out Elements
//! holding a weak, observable back-reference to it.

use crate::element::{self, Element};
use crate::error::{Error, Result};
use crate::source::{FileSource, MemorySource, Source, StreamSource};
use std::cell::RefCell;
use std::io::Read;
use std::path::Path;
use std::rc::{Rc, Weak};

/// Shared, interior-mutable state behind a `Reader`. Kept in its own type so
/// that `Weak<RefCell<Inner>>` can be handed to Elements without handing them
/// ownership of the source.
pub(crate) struct Inner {
    source: Option<Box<dyn Source>>,
}

/// Owns exactly one Byte Source Adapter and is the entry point for obtaining
/// the root Element.
///
/// `Reader` is cheap to clone: clones share the same underlying source via
/// `Rc`, matching the single-threaded, single-owner tree this crate models
/// (see the crate's concurrency notes). Elements produced by a `Reader` hold
/// only a `Weak` reference to it, so closing the `Reader` is observable from
/// every Element descended from it rather than silently leaving them
/// operable.
#[derive(Clone)]
pub struct Reader {
    inner: Rc<RefCell<Inner>>,
}

impl std::fmt::Debug for Reader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reader")
            .field("open", &self.inner.borrow().source.is_some())
            .finish()
    }
}

impl Reader {
    fn from_source(source: impl Source + 'static) -> Self {
        Reader {
            inner: Rc::new(RefCell::new(Inner {
                source: Some(Box::new(source)),
            })),
        }
    }

    /// Open a filesystem path in raw byte mode. Seekable.
    pub fn open_path(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::from_source(FileSource::open(path)?))
    }

    /// Open an in-memory byte buffer. Seekable.
    pub fn open_memory(buf: Vec<u8>) -> Self {
        Self::from_source(MemorySource::new(buf))
    }

    /// Adopt an already-open byte stream handle. Used in place, never
    /// duplicated; non-seekable. Closing the `Reader` closes the handle by
    /// dropping it.
    pub fn open_handle(handle: impl Read + 'static) -> Self {
        Self::from_source(StreamSource::new(handle))
    }

    /// Close the underlying source. Any Element descended from this Reader
    /// will surface [`Error::ReaderGone`] from lazy operations thereafter.
    pub fn close(&self) {
        self.inner.borrow_mut().source = None;
    }

    /// Read one element at the current source position: the Element Reader
    /// entry point. Returns `None` at end-of-stream.
    pub fn read_element(&self, eager_binary: bool) -> Result<Option<Element>> {
        element::read_element(self.weak(), eager_binary)
    }

    pub(crate) fn weak(&self) -> Weak<RefCell<Inner>> {
        Rc::downgrade(&self.inner)
    }
}

/// Run `f` against the live source behind `weak`, failing with
/// [`Error::ReaderGone`] if the owning `Reader` was dropped or closed.
pub(crate) fn with_source<T>(
    weak: &Weak<RefCell<Inner>>,
    f: impl FnOnce(&mut dyn Source) -> Result<T>,
) -> Result<T> {
    let rc = weak.upgrade().ok_or(Error::ReaderGone)?;
    let mut inner = rc.borrow_mut();
    let source = inner.source.as_deref_mut().ok_or(Error::ReaderGone)?;
    f(source)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn close_poisons_weak_handles() {
        let reader = Reader::open_memory(vec![0x1A, 0x45, 0xDF, 0xA3, 0x80]);
        let weak = reader.weak();
        reader.close();
        let err = with_source(&weak, |_| Ok(())).unwrap_err();
        assert!(matches!(err, Error::ReaderGone));
    }

    #[test]
    fn drop_poisons_weak_handles() {
        let reader = Reader::open_memory(vec![0x80]);
        let weak = reader.weak();
        drop(reader);
        let err = with_source(&weak, |_| Ok(())).unwrap_err();
        assert!(matches!(err, Error::ReaderGone));
    }
}
