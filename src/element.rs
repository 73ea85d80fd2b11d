//! The Element Reader and the runtime `Element` / `Value` types.

use crate::decode;
use crate::error::{Error, Result};
use crate::reader::{with_source, Inner};
use crate::schema::{self, SchemaEntry, ValueType};
use crate::source::Position;
use std::cell::RefCell;
use std::rc::Weak;

/// The decoded value of an `Element`, tagged by its schema's `value_type`.
///
/// `Binary` and `EbmlId` carry an inner `Option` because their payload may be
/// legitimately absent: a non-eagerly-read `Binary` element retains only its
/// `data_pos` until [`Element::get_value`] is called, and a nested EBML ID
/// that does not resolve through the Schema Registry has no referent.
#[derive(Debug, Clone)]
pub enum Value {
    /// No decoded value: the element is unknown to the schema, was skipped,
    /// or (for `Binary`) was read non-eagerly and not yet fetched.
    None,
    /// A decoded UTF-8 string.
    Str(String),
    /// A decoded unsigned integer (widths 1-8 fit in a `u64`).
    Uint(u64),
    /// A decoded signed integer (widths 1-8 fit in an `i64`).
    Sint(i64),
    /// A decoded IEEE 754 float, widened to `f64`.
    Float(f64),
    /// Raw bytes, present only once materialized (eagerly or via
    /// `get_value`).
    Binary(Vec<u8>),
    /// A nested EBML ID, resolved against the Schema Registry. `None` if the
    /// nested ID is itself unknown to the registry.
    EbmlId(Option<&'static SchemaEntry>),
    /// Materialized children of a `Sub` element.
    Children(Vec<Element>),
}

/// The runtime realization of one parsed EBML element header, plus whatever
/// of its content has been decoded or materialized so far.
#[derive(Debug, Clone)]
pub struct Element {
    /// The element's ID as a lowercase hex string; its byte length is
    /// `id_hex.len() / 2`.
    pub id_hex: String,
    /// The element's name, if its ID is known to the Schema Registry.
    pub name: Option<&'static str>,
    /// The element's value type, if its ID is known to the Schema Registry.
    pub value_type: Option<ValueType>,
    /// Number of bytes occupied by the VINT size field.
    pub size_len: u8,
    /// Declared number of content bytes.
    pub content_len: u64,
    /// `id bytes + size_len + content_len`.
    pub full_len: u64,
    /// Zero at the root; a child's depth is its parent's plus one.
    pub depth: u32,
    /// Saved source position at the start of the header, if the source is
    /// seekable.
    pub elem_pos: Option<Position>,
    /// Saved source position at the first content byte, if the source is
    /// seekable.
    pub data_pos: Option<Position>,
    /// The decoded (or not-yet-decoded) value.
    pub value: Value,

    pub(crate) remaining_len: Option<u64>,
    pub(crate) pos_offset: u64,
    pub(crate) all_children_read: bool,
    pub(crate) child_cursor: usize,
    pub(crate) reader: Weak<RefCell<Inner>>,
}

impl Element {
    /// Whether this is (or, once materialized, will expose children as) a
    /// `Sub` container element.
    pub fn is_container(&self) -> bool {
        matches!(self.value_type, Some(ValueType::Sub))
    }
}

/// Read one element header at the current source position, decoding scalar
/// content inline and leaving container content for the Element Tree to
/// populate on demand. Returns `None` at end-of-stream.
pub(crate) fn read_element(weak: Weak<RefCell<Inner>>, eager_binary: bool) -> Result<Option<Element>> {
    if with_source(&weak, |s| s.eof())? {
        return Ok(None);
    }

    let elem_pos = with_source(&weak, |s| Ok(s.pos()))?;
    let id_hex = with_source(&weak, |s| decode::read_id(s))?;
    let (size_len, content_len) = with_source(&weak, |s| decode::read_size(s))?;

    if is_unknown_size(size_len, content_len) {
        return Err(Error::UnknownSizeUnsupported(id_hex));
    }

    let id_byte_count = (id_hex.len() / 2) as u64;
    let full_len = id_byte_count + u64::from(size_len) + content_len;
    let data_pos = with_source(&weak, |s| Ok(s.pos()))?;

    let schema = schema::lookup(&id_hex);
    let value = decode_value(&weak, &id_hex, schema, content_len, eager_binary)?;

    Ok(Some(Element {
        id_hex,
        name: schema.map(|e| e.name),
        value_type: schema.map(|e| e.value_type),
        size_len,
        content_len,
        full_len,
        depth: 0,
        elem_pos,
        data_pos,
        value,
        remaining_len: None,
        pos_offset: 0,
        all_children_read: false,
        child_cursor: 0,
        reader: weak,
    }))
}

fn decode_value(
    weak: &Weak<RefCell<Inner>>,
    id_hex: &str,
    schema: Option<&'static SchemaEntry>,
    content_len: u64,
    eager_binary: bool,
) -> Result<Value> {
    let Some(entry) = schema else {
        with_source(weak, |s| s.skip(content_len))?;
        log::warn!("skipping element with unknown ID {id_hex} ({content_len}B)");
        return Ok(Value::None);
    };

    let value = match entry.value_type {
        ValueType::Sub => Value::Children(Vec::new()),
        ValueType::Skip => {
            with_source(weak, |s| s.skip(content_len))?;
            Value::None
        }
        ValueType::Str => {
            let bytes = with_source(weak, |s| s.read(content_len as usize))?;
            Value::Str(decode::decode_str(&bytes)?)
        }
        ValueType::Uint => {
            let bytes = with_source(weak, |s| s.read(content_len as usize))?;
            Value::Uint(decode::decode_uint(&bytes))
        }
        ValueType::Sint => {
            let bytes = with_source(weak, |s| s.read(content_len as usize))?;
            Value::Sint(decode::decode_sint(&bytes))
        }
        ValueType::Float => {
            let bytes = with_source(weak, |s| s.read(content_len as usize))?;
            Value::Float(decode::decode_float(&bytes)?)
        }
        ValueType::EbmlId => {
            let bytes = with_source(weak, |s| s.read(content_len as usize))?;
            let nested_hex = bytes.iter().map(|b| format!("{b:02x}")).collect::<String>();
            Value::EbmlId(schema::lookup(&nested_hex))
        }
        ValueType::Binary => {
            if eager_binary {
                let bytes = with_source(weak, |s| s.read(content_len as usize))?;
                Value::Binary(bytes)
            } else {
                with_source(weak, |s| s.skip(content_len))?;
                Value::None
            }
        }
    };

    if matches!(entry.name, "Void" | "CRC32") {
        log::info!("encountered {name} padding/integrity element ({content_len}B)", name = entry.name);
    } else if matches!(entry.value_type, ValueType::Skip) {
        log::debug!("skipped element {id_hex} ({content_len}B, type Skip)");
    } else {
        log::debug!(
            "read element {id_hex} ({name}, {content_len}B)",
            name = entry.name
        );
    }

    Ok(value)
}

/// Whether a decoded size VINT is the reserved "unknown length" form: every
/// payload bit set to 1. Treated as out of scope per the crate's design
/// notes, rather than guessed at.
fn is_unknown_size(size_len: u8, content_len: u64) -> bool {
    let payload_bits = u32::from(size_len) * 7;
    if payload_bits >= 64 {
        content_len == u64::MAX
    } else {
        content_len == (1u64 << payload_bits) - 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::Reader;

    #[test]
    fn ebml_header_from_truncated_stream() {
        // 1A 45 DF A3 <size=0x23> then nothing: header parses fine even
        // though the declared content is absent from the buffer.
        let reader = Reader::open_memory(vec![0x1A, 0x45, 0xDF, 0xA3, 0xA3]);
        let el = reader.read_element(false).unwrap().unwrap();
        assert_eq!(el.id_hex, "1a45dfa3");
        assert_eq!(el.name, Some("EBML"));
        assert_eq!(el.value_type, Some(ValueType::Sub));
        assert_eq!(el.depth, 0);
        assert_eq!(el.content_len, 0x23);
        assert!(matches!(el.value, Value::Children(ref c) if c.is_empty()));
    }

    #[test]
    fn unknown_id_is_skipped() {
        // A made-up 2-byte unknown ID (0x4FFF) with 2 bytes of content.
        let reader = Reader::open_memory(vec![0x4F, 0xFF, 0x82, 0xAA, 0xBB, 0x80]);
        let el = reader.read_element(false).unwrap().unwrap();
        assert_eq!(el.name, None);
        assert_eq!(el.value_type, None);
        assert!(matches!(el.value, Value::None));
        // source left at the next element boundary: one more header (0x80) to read.
        let next = reader.read_element(false).unwrap().unwrap();
        assert_eq!(next.id_hex, "80");
    }

    #[test]
    fn eof_returns_none() {
        let reader = Reader::open_memory(vec![]);
        assert!(reader.read_element(false).unwrap().is_none());
    }

    #[test]
    fn binary_non_eager_has_no_inline_value() {
        // SimpleBlock (id a3), size 3, content "xyz".
        let reader = Reader::open_memory(vec![0xA3, 0x83, b'x', b'y', b'z']);
        let el = reader.read_element(false).unwrap().unwrap();
        assert_eq!(el.id_hex, "a3");
        assert!(matches!(el.value, Value::None));
        assert_eq!(el.content_len, 3);
    }

    #[test]
    fn binary_eager_has_inline_value() {
        let reader = Reader::open_memory(vec![0xA3, 0x83, b'x', b'y', b'z']);
        let el = reader.read_element(true).unwrap().unwrap();
        match el.value {
            Value::Binary(ref b) => assert_eq!(b, b"xyz"),
            other => panic!("expected Binary, got {other:?}"),
        }
    }

    #[test]
    fn unknown_size_is_rejected() {
        // DocType (id 4282) with a 1-byte unknown-size marker (0xFF).
        let reader = Reader::open_memory(vec![0x42, 0x82, 0xFF]);
        let err = reader.read_element(false).unwrap_err();
        assert!(matches!(err, Error::UnknownSizeUnsupported(_)));
    }
}
