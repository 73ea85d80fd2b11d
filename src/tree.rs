//! The Element Tree / Iterator: lazy child traversal, name-based lookup
//! against already-materialized children, and lazy binary payload fetch.

use crate::element::{self, Element, Value};
use crate::error::{Error, Result};
use crate::reader::with_source;
use crate::schema::ValueType;
use crate::source::Position;

impl Element {
    /// Advance the container's child iterator by one and return the next
    /// child, or `None` once its declared content is exhausted.
    ///
    /// Non-container elements always yield `None`. Once a container has been
    /// iterated all the way through, the next call restarts from the first
    /// child rather than staying exhausted — iteration is replayable from the
    /// cache built up on the first pass, not re-read from the source.
    pub fn next_child(&mut self, eager_binary: bool) -> Result<Option<Element>> {
        if !self.is_container() {
            return Ok(None);
        }

        if self.remaining_len.is_none() {
            self.remaining_len = Some(self.content_len);
        }

        if self.all_children_read {
            return Ok(self.replay_cached_child());
        }

        let remaining = self.remaining_len.unwrap_or(0);
        if remaining == 0 {
            self.all_children_read = true;
            self.child_cursor = 0;
            return Ok(None);
        }

        let seekable = with_source(&self.reader, |s| Ok(s.is_seekable()))?;
        if seekable {
            if let Some(data_pos) = self.data_pos {
                with_source(&self.reader, |s| {
                    s.seek(data_pos)?;
                    s.skip(self.pos_offset)
                })?;
            }
        }

        let Some(mut child) = element::read_element(self.reader.clone(), eager_binary)? else {
            self.all_children_read = true;
            self.child_cursor = 0;
            return Ok(None);
        };

        if child.full_len > remaining {
            return Err(Error::BudgetOverrun(self.id_hex.clone()));
        }

        child.depth = self.depth + 1;

        // The Element Reader never consumes a `Sub` child's content, so on a
        // non-seekable source the stream would be left sitting inside the
        // child's own children rather than at this child's next sibling.
        // Seekable sources recover by reseeking before the next read (above);
        // non-seekable ones must drain the child's subtree now instead.
        if !seekable && child.is_container() {
            child.populate_children(true, eager_binary)?;
        }

        self.remaining_len = Some(remaining - child.full_len);
        self.pos_offset += child.full_len;

        if let Value::Children(ref mut kids) = self.value {
            kids.push(child.clone());
        }
        self.child_cursor += 1;

        Ok(Some(child))
    }

    /// Serve the next child from the `Children` cache by `child_cursor`.
    /// When the cursor runs off the end, it resets to zero and this call
    /// itself returns `None` — the actual restart happens on the call after
    /// that, per the documented restart-on-exhaustion behavior.
    fn replay_cached_child(&mut self) -> Option<Element> {
        let Value::Children(ref kids) = self.value else {
            return None;
        };
        if kids.is_empty() {
            return None;
        }
        if self.child_cursor >= kids.len() {
            self.child_cursor = 0;
            return None;
        }
        let child = kids[self.child_cursor].clone();
        self.child_cursor += 1;
        Some(child)
    }

    /// Drain the container's child iterator into its `Children` cache. With
    /// `recurse`, every descendant container is populated too.
    pub fn populate_children(&mut self, recurse: bool, eager_binary: bool) -> Result<()> {
        if !self.is_container() {
            return Ok(());
        }
        while !self.all_children_read {
            if self.next_child(eager_binary)?.is_none() {
                break;
            }
        }
        if recurse {
            if let Value::Children(ref mut kids) = self.value {
                for child in kids.iter_mut() {
                    child.populate_children(true, eager_binary)?;
                }
            }
        }
        Ok(())
    }

    /// Already-materialized children with the given schema name. Does not
    /// trigger further reads: call [`Element::populate_children`] first if
    /// the container hasn't been fully walked yet.
    pub fn children_by_name(&self, name: &str) -> Vec<&Element> {
        match &self.value {
            Value::Children(kids) => kids.iter().filter(|c| c.name == Some(name)).collect(),
            _ => Vec::new(),
        }
    }

    /// Fetch this element's raw content bytes, seeking back to `data_pos` if
    /// necessary. With `keep`, the bytes are cached on the element so a
    /// second call is free; without it, the element's `value` is left as-is.
    ///
    /// Only meaningful for `Binary` elements; fails on a non-seekable source
    /// once the bytes were not read eagerly, since there is nothing to seek
    /// back to.
    pub fn get_value(&mut self, keep: bool) -> Result<Vec<u8>> {
        if self.value_type != Some(ValueType::Binary) {
            return Err(Error::UnrecognizedValueType(format!(
                "get_value called on non-Binary element {}",
                self.id_hex
            )));
        }
        if let Value::Binary(ref bytes) = self.value {
            return Ok(bytes.clone());
        }
        let data_pos = self.data_pos.ok_or(Error::SeekInconsistent)?;
        with_source(&self.reader, |s| s.seek(data_pos))?;
        let bytes = with_source(&self.reader, |s| s.read(self.content_len as usize))?;
        if keep {
            self.value = Value::Binary(bytes.clone());
        }
        Ok(bytes)
    }

    /// Skip past this element's content, positioning the source at the start
    /// of its next sibling.
    ///
    /// Only legal immediately after `read_element`, before any read has
    /// moved the source past `data_pos` — i.e. before any `next_child` or
    /// `get_value` call on this element. On a seekable source that
    /// precondition is verified directly against the current position;
    /// otherwise it is checked as best-effort against this element's own
    /// bookkeeping. Fails with [`Error::SkipTooLate`] otherwise.
    pub fn skip(&mut self) -> Result<()> {
        if self.remaining_len.is_some() {
            return Err(Error::SkipTooLate);
        }
        if let Some(pos) = with_source(&self.reader, |s| Ok(s.pos()))? {
            if Some(pos) != self.data_pos {
                return Err(Error::SkipTooLate);
            }
        }
        with_source(&self.reader, |s| s.skip(self.content_len))?;
        self.remaining_len = Some(0);
        self.all_children_read = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::reader::Reader;

    fn segment_bytes() -> Vec<u8> {
        // Segment (18538067) containing two top-level children: Info (1549a966, empty)
        // and a Void (ec) padding element of 2 bytes.
        let mut v = vec![0x18, 0x53, 0x80, 0x67];
        let content: Vec<u8> = {
            let mut c = Vec::new();
            c.extend([0x15, 0x49, 0xA9, 0x66, 0x80]); // Info, size 0
            c.extend([0xEC, 0x82, 0x00, 0x00]); // Void, size 2
            c
        };
        v.push(0x80 | content.len() as u8); // size VINT, 1 byte
        v.extend(content);
        v
    }

    /// A Segment whose first child, `Info`, is itself non-empty (carries a
    /// `TimecodeScale`) — the case where a naive iterator reads the
    /// grandchild as if it were `Info`'s sibling.
    fn segment_with_nonempty_info_bytes() -> Vec<u8> {
        let info_content = vec![0x2A, 0xD7, 0xB1, 0x83, 0x0F, 0x42, 0x40]; // TimecodeScale = 1_000_000
        let mut info = vec![0x15, 0x49, 0xA9, 0x66, 0x80 | info_content.len() as u8];
        info.extend(info_content);

        let void = vec![0xEC, 0x82, 0x00, 0x00];

        let mut content = Vec::new();
        content.extend(&info);
        content.extend(&void);

        let mut v = vec![0x18, 0x53, 0x80, 0x67];
        v.push(0x80 | content.len() as u8);
        v.extend(content);
        v
    }

    #[test]
    fn next_child_skips_past_nonempty_container_sibling() {
        let reader = Reader::open_memory(segment_with_nonempty_info_bytes());
        let mut segment = reader.read_element(false).unwrap().unwrap();

        let info = segment.next_child(false).unwrap().unwrap();
        assert_eq!(info.name, Some("Info"));

        // Without repositioning, this would read `TimecodeScale` (Info's
        // grandchild) as Segment's second child and trip a budget overrun.
        let second = segment.next_child(false).unwrap().unwrap();
        assert_eq!(second.name, Some("Void"));
        assert!(segment.next_child(false).unwrap().is_none());
    }

    #[test]
    fn non_seekable_source_drains_container_children_eagerly() {
        // `open_handle` always wraps its handle in a non-seekable `StreamSource`,
        // even though `Cursor` itself would support seeking.
        let reader = Reader::open_handle(std::io::Cursor::new(segment_with_nonempty_info_bytes()));
        let mut segment = reader.read_element(false).unwrap().unwrap();
        segment.populate_children(false, false).unwrap();

        let info = &segment.children_by_name("Info")[0];
        let scale = &info.children_by_name("TimecodeScale")[0];
        assert!(matches!(scale.value, crate::element::Value::Uint(1_000_000)));
        assert_eq!(segment.children_by_name("Void").len(), 1);
    }

    #[test]
    fn iterates_children_and_caches_them() {
        let reader = Reader::open_memory(segment_bytes());
        let mut segment = reader.read_element(false).unwrap().unwrap();
        assert_eq!(segment.name, Some("Segment"));

        let first = segment.next_child(false).unwrap().unwrap();
        assert_eq!(first.name, Some("Info"));
        assert_eq!(first.depth, 1);

        let second = segment.next_child(false).unwrap().unwrap();
        assert_eq!(second.name, Some("Void"));

        assert!(segment.next_child(false).unwrap().is_none());
        assert!(segment.all_children_read);
    }

    #[test]
    fn restarts_after_exhaustion() {
        let reader = Reader::open_memory(segment_bytes());
        let mut segment = reader.read_element(false).unwrap().unwrap();
        // populate_children drives next_child all the way to its internal
        // sentinel None, so the very next call is already the restart.
        segment.populate_children(false, false).unwrap();

        let restarted = segment.next_child(false).unwrap().unwrap();
        assert_eq!(restarted.name, Some("Info"));

        let second = segment.next_child(false).unwrap().unwrap();
        assert_eq!(second.name, Some("Void"));

        assert!(segment.next_child(false).unwrap().is_none());
    }

    #[test]
    fn children_by_name_only_sees_materialized() {
        let reader = Reader::open_memory(segment_bytes());
        let mut segment = reader.read_element(false).unwrap().unwrap();
        assert!(segment.children_by_name("Info").is_empty());
        segment.populate_children(false, false).unwrap();
        assert_eq!(segment.children_by_name("Info").len(), 1);
        assert_eq!(segment.children_by_name("Void").len(), 1);
    }

    #[test]
    fn get_value_fetches_lazily_and_caches() {
        let bytes = vec![0xA3, 0x83, b'x', b'y', b'z'];
        let reader = Reader::open_memory(bytes);
        let mut el = reader.read_element(false).unwrap().unwrap();
        let v = el.get_value(true).unwrap();
        assert_eq!(v, b"xyz");
        // second call is served from cache, no further source interaction needed.
        assert_eq!(el.get_value(false).unwrap(), b"xyz");
    }

    #[test]
    fn skip_lands_on_next_sibling() {
        let reader = Reader::open_memory(segment_bytes());
        let mut segment = reader.read_element(false).unwrap().unwrap();
        let mut info = segment.next_child(false).unwrap().unwrap();
        info.skip().unwrap();
        let next = segment.next_child(false).unwrap().unwrap();
        assert_eq!(next.name, Some("Void"));
    }
}
