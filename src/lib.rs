#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]

//! A lazy, navigable reader for EBML and Matroska/WebM containers.
//!
//! `ebml-tree` opens a file, in-memory buffer, or arbitrary byte stream and
//! walks it one element at a time against a static schema of known EBML and
//! Matroska IDs. Container elements are populated on demand rather than all
//! at once: call [`Element::next_child`] to pull children one at a time, or
//! [`Element::populate_children`] to drain a subtree eagerly.
//!
//! ```no_run
//! use ebml_tree::Reader;
//!
//! let reader = Reader::open_path("movie.mkv")?;
//! let mut root = reader.read_element(false)?.expect("non-empty file");
//! while let Some(mut child) = root.next_child(false)? {
//!     println!("{:?}: {:?}", child.name, child.value);
//! }
//! # Ok::<(), ebml_tree::Error>(())
//! ```

/// Error types for this crate.
mod error;
pub use error::*;

/// The Byte Source Adapter: uniform access over seekable and non-seekable input.
mod source;
pub use source::{FileSource, MemorySource, Position, Source, StreamSource};

/// The Primitive Decoder: VINT and scalar decoding.
mod decode;

/// The Schema Registry: the static table of known EBML/Matroska IDs.
mod schema;
pub use schema::{is_known, lookup, value_type_of, SchemaEntry, ValueType};

/// Reader lifecycle and the Element Reader entry point.
mod reader;
pub use reader::Reader;

/// Element body: the runtime `Element` and `Value` types.
mod element;
pub use element::{Element, Value};

/// Element Tree / Iterator: lazy child traversal and lookup.
mod tree;

/// A prelude for common types and traits.
pub mod prelude {
    pub use crate::element::{Element, Value};
    pub use crate::error::{Error, Result};
    pub use crate::reader::Reader;
    pub use crate::schema::{SchemaEntry, ValueType};
    pub use crate::source::{Position, Source};
}
