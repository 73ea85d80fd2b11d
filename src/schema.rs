//! The Schema Registry: a static, declarative table of every known EBML ID,
//! consumed by the Element Reader and Element Tree.
//!
//! The table is data, not code: every entry is a `SchemaEntry` literal, and
//! [`lookup`] resolves a lowercase hex ID string against it in O(1) via a
//! lazily-built index. Unknown IDs are legal; `lookup` returning `None` is
//! how the Element Reader decides to skip rather than decode.

use std::collections::HashMap;
use std::sync::OnceLock;

/// The decoded representation an element's content takes, driven entirely by
/// its schema entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    /// A container: content is itself a sequence of child elements.
    Sub,
    /// UTF-8 text.
    Str,
    /// Unsigned integer, 1-8 bytes big-endian.
    Uint,
    /// Signed (two's-complement) integer, 1-8 bytes big-endian. Also used
    /// for Matroska's `date` type, which is a signed integer in this schema.
    Sint,
    /// IEEE 754 float, 4 or 8 bytes.
    Float,
    /// Raw bytes, materialized eagerly or lazily per the caller's request.
    Binary,
    /// A nested EBML ID (e.g. `SeekID`), resolved back through this same
    /// registry.
    EbmlId,
    /// Content with no interesting value; skipped without decoding.
    Skip,
}

/// A single schema entry: everything the Element Reader needs to know about
/// one EBML ID.
#[derive(Debug, Clone, Copy)]
pub struct SchemaEntry {
    /// Lowercase hex encoding of the canonical ID bytes (marker bit included).
    pub id_hex: &'static str,
    /// The element's name, as used by `children_by_name`.
    pub name: &'static str,
    /// How to decode this element's content.
    pub value_type: ValueType,
    /// Whether this element may repeat as a sibling under the same parent.
    pub multiple: bool,
    /// Immediate children, as `id_hex` strings. Empty for non-`Sub` entries.
    pub children: &'static [&'static str],
}

macro_rules! se {
    ($id:literal, $name:literal, $ty:ident, $multiple:literal, [$($child:literal),* $(,)?]) => {
        SchemaEntry {
            id_hex: $id,
            name: $name,
            value_type: ValueType::$ty,
            multiple: $multiple,
            children: &[$($child),*],
        }
    };
}

/// The full declarative schema: the EBML header and the Matroska body
/// documented in the crate's specification, §6.3 and §6.4.
static REGISTRY: &[SchemaEntry] = &[
    // --- EBML header ---------------------------------------------------
    se!("1a45dfa3", "EBML", Sub, false, ["4286", "42f7", "42f2", "42f3", "4282", "4287", "4285", "ec", "bf"]),
    se!("4286", "EBMLVersion", Uint, false, []),
    se!("42f7", "EBMLReadVersion", Uint, false, []),
    se!("42f2", "EBMLMaxIDLength", Uint, false, []),
    se!("42f3", "EBMLMaxSizeLength", Uint, false, []),
    se!("4282", "DocType", Str, false, []),
    se!("4287", "DocTypeVersion", Uint, false, []),
    se!("4285", "DocTypeReadVersion", Uint, false, []),

    // --- Generic top-level / inherited from EBML ------------------------
    se!("bf", "CRC32", Binary, false, []),
    se!("ec", "Void", Binary, false, []),

    // --- Segment ---------------------------------------------------------
    se!("18538067", "Segment", Sub, true, [
        "114d9b74", "1549a966", "1f43b675", "1654ae6b", "1c53bb6b",
        "1941a469", "1043a770", "1254c367", "ec", "bf",
    ]),

    // SeekHead
    se!("114d9b74", "SeekHead", Sub, false, ["4dbb"]),
    se!("4dbb", "Seek", Sub, true, ["53ab", "53ac"]),
    se!("53ab", "SeekID", EbmlId, false, []),
    se!("53ac", "SeekPosition", Uint, false, []),

    // Info
    se!("1549a966", "Info", Sub, false, [
        "2ad7b1", "4489", "4461", "73a4", "3ba9", "3cb923", "3c83ab",
        "3eb923", "3e83bb", "7ba9", "4d80", "5741",
    ]),
    se!("2ad7b1", "TimecodeScale", Uint, false, []),
    se!("4489", "Duration", Float, false, []),
    se!("4461", "DateUTC", Sint, false, []),
    se!("73a4", "SegmentUID", Binary, false, []),
    se!("3ba9", "SegmentFilename", Str, false, []),
    se!("3cb923", "PrevUID", Binary, false, []),
    se!("3c83ab", "PrevFilename", Str, false, []),
    se!("3eb923", "NextUID", Binary, false, []),
    se!("3e83bb", "NextFilename", Str, false, []),
    se!("7ba9", "Title", Str, false, []),
    se!("4d80", "MuxingApp", Str, false, []),
    se!("5741", "WritingApp", Str, false, []),

    // Cluster
    se!("1f43b675", "Cluster", Sub, true, ["e7", "ab", "a3", "a0", "bf", "ec"]),
    se!("e7", "Timecode", Uint, false, []),
    se!("ab", "PrevSize", Uint, false, []),
    se!("a3", "SimpleBlock", Binary, true, []),
    se!("a0", "BlockGroup", Sub, true, ["a1", "fb", "9b", "75a2", "75a1"]),
    se!("a1", "Block", Binary, false, []),
    se!("fb", "ReferenceBlock", Sint, true, []),
    se!("9b", "BlockDuration", Uint, false, []),
    se!("75a2", "DiscardPadding", Sint, false, []),
    se!("75a1", "BlockAdditions", Sub, false, ["a6"]),
    se!("a6", "BlockMore", Sub, true, ["ee", "a5"]),
    se!("ee", "BlockAddID", Uint, false, []),
    se!("a5", "BlockAdditional", Binary, false, []),

    // Tracks
    se!("1654ae6b", "Tracks", Sub, false, ["ae"]),
    se!("ae", "TrackEntry", Sub, true, [
        "d7", "73c5", "83", "b9", "88", "55aa", "55ab", "55ac", "55ad",
        "55ae", "55af", "9c", "23e383", "536e", "22b59c", "86", "63a2",
        "258688", "56aa", "56bb", "e0", "e1", "6d80",
    ]),
    se!("d7", "TrackNumber", Uint, false, []),
    se!("73c5", "TrackUID", Uint, false, []),
    se!("83", "TrackType", Uint, false, []),
    se!("b9", "FlagEnabled", Uint, false, []),
    se!("88", "FlagDefault", Uint, false, []),
    se!("55aa", "FlagForced", Uint, false, []),
    se!("55ab", "FlagHearingImpaired", Uint, false, []),
    se!("55ac", "FlagVisualImpaired", Uint, false, []),
    se!("55ad", "FlagTextDescriptions", Uint, false, []),
    se!("55ae", "FlagOriginal", Uint, false, []),
    se!("55af", "FlagCommentary", Uint, false, []),
    se!("9c", "FlagLacing", Uint, false, []),
    se!("23e383", "DefaultDuration", Uint, false, []),
    se!("536e", "Name", Str, false, []),
    se!("22b59c", "Language", Str, false, []),
    se!("86", "CodecID", Str, false, []),
    se!("63a2", "CodecPrivate", Binary, false, []),
    se!("258688", "CodecName", Str, false, []),
    se!("56aa", "CodecDelay", Uint, false, []),
    se!("56bb", "SeekPreRoll", Uint, false, []),

    // Video
    se!("e0", "Video", Sub, false, [
        "9a", "53b8", "53c0", "b0", "ba", "54aa", "54bb", "54cc", "54dd",
        "54b0", "54ba", "54b2", "54b3", "55b0",
    ]),
    se!("9a", "FlagInterlaced", Uint, false, []),
    se!("53b8", "StereoMode", Uint, false, []),
    se!("53c0", "AlphaMode", Uint, false, []),
    se!("b0", "PixelWidth", Uint, false, []),
    se!("ba", "PixelHeight", Uint, false, []),
    se!("54aa", "PixelCropBottom", Uint, false, []),
    se!("54bb", "PixelCropTop", Uint, false, []),
    se!("54cc", "PixelCropLeft", Uint, false, []),
    se!("54dd", "PixelCropRight", Uint, false, []),
    se!("54b0", "DisplayWidth", Uint, false, []),
    se!("54ba", "DisplayHeight", Uint, false, []),
    se!("54b2", "DisplayUnit", Uint, false, []),
    se!("54b3", "AspectRatioType", Uint, false, []),

    // Colour / HDR metadata
    se!("55b0", "Colour", Sub, false, ["55b1", "55b2", "55b9", "55ba", "55bb", "55bc", "55bd"]),
    se!("55b1", "MatrixCoefficients", Uint, false, []),
    se!("55b2", "BitsPerChannel", Uint, false, []),
    se!("55b9", "Range", Uint, false, []),
    se!("55ba", "TransferCharacteristics", Uint, false, []),
    se!("55bb", "Primaries", Uint, false, []),
    se!("55bc", "MaxCLL", Uint, false, []),
    se!("55bd", "MaxFALL", Uint, false, []),

    // Audio
    se!("e1", "Audio", Sub, false, ["b5", "78b5", "9f", "6264"]),
    se!("b5", "SamplingFrequency", Float, false, []),
    se!("78b5", "OutputSamplingFrequency", Float, false, []),
    se!("9f", "Channels", Uint, false, []),
    se!("6264", "BitDepth", Uint, false, []),

    // Content encoding / encryption
    se!("6d80", "ContentEncodings", Sub, false, ["6240"]),
    se!("6240", "ContentEncoding", Sub, true, ["5031", "5032", "5033", "5035"]),
    se!("5031", "ContentEncodingOrder", Uint, false, []),
    se!("5032", "ContentEncodingScope", Uint, false, []),
    se!("5033", "ContentEncodingType", Uint, false, []),
    se!("5035", "ContentEncryption", Sub, false, ["47e1", "47e2"]),
    se!("47e1", "ContentEncAlgo", Uint, false, []),
    se!("47e2", "ContentEncKeyID", Binary, false, []),

    // Cues
    se!("1c53bb6b", "Cues", Sub, false, ["bb"]),
    se!("bb", "CuePoint", Sub, true, ["b3", "b7"]),
    se!("b3", "CueTime", Uint, false, []),
    se!("b7", "CueTrackPositions", Sub, true, ["f7", "f1", "f0", "b2", "5378"]),
    se!("f7", "CueTrack", Uint, false, []),
    se!("f1", "CueClusterPosition", Uint, false, []),
    se!("f0", "CueRelativePosition", Uint, false, []),
    se!("b2", "CueDuration", Uint, false, []),
    se!("5378", "CueBlockNumber", Uint, false, []),

    // Attachments
    se!("1941a469", "Attachments", Sub, false, ["61a7"]),
    se!("61a7", "AttachedFile", Sub, true, ["467e", "466e", "4660", "465c", "46ae"]),
    se!("467e", "FileDescription", Str, false, []),
    se!("466e", "FileName", Str, false, []),
    se!("4660", "FileMimeType", Str, false, []),
    se!("465c", "FileData", Binary, false, []),
    se!("46ae", "FileUID", Uint, false, []),

    // Chapters
    se!("1043a770", "Chapters", Sub, false, ["45b9"]),
    se!("45b9", "EditionEntry", Sub, true, ["b6"]),
    se!("b6", "ChapterAtom", Sub, true, ["73c4", "5654", "91", "92", "80"]),
    se!("73c4", "ChapterUID", Uint, false, []),
    se!("5654", "ChapterStringUID", Str, false, []),
    se!("91", "ChapterTimeStart", Uint, false, []),
    se!("92", "ChapterTimeEnd", Uint, false, []),
    se!("80", "ChapterDisplay", Sub, true, ["85", "437c"]),
    se!("85", "ChapString", Str, false, []),
    se!("437c", "ChapLanguage", Str, false, []),

    // Tags
    se!("1254c367", "Tags", Sub, false, ["7373"]),
    se!("7373", "Tag", Sub, true, ["63c0", "67c8"]),
    se!("63c0", "Targets", Sub, false, ["68ca", "63ca"]),
    se!("68ca", "TargetTypeValue", Uint, false, []),
    se!("63ca", "TargetType", Str, false, []),
    se!("67c8", "SimpleTag", Sub, true, ["45a3", "447a", "4484", "4487", "4485"]),
    se!("45a3", "TagName", Str, false, []),
    se!("447a", "TagLanguage", Str, false, []),
    se!("4484", "TagDefault", Uint, false, []),
    se!("4487", "TagString", Str, false, []),
    se!("4485", "TagBinary", Binary, false, []),
];

static INDEX: OnceLock<HashMap<&'static str, &'static SchemaEntry>> = OnceLock::new();

fn index() -> &'static HashMap<&'static str, &'static SchemaEntry> {
    INDEX.get_or_init(|| REGISTRY.iter().map(|e| (e.id_hex, e)).collect())
}

/// Look up a schema entry by its lowercase hex ID. Unknown IDs are legal and
/// return `None`; the Element Reader treats that as an instruction to skip.
pub fn lookup(id_hex: &str) -> Option<&'static SchemaEntry> {
    index().get(id_hex).copied()
}

/// Whether `id_hex` is present in the registry.
pub fn is_known(id_hex: &str) -> bool {
    lookup(id_hex).is_some()
}

/// The `value_type` a known ID would decode as, without needing to unpack a
/// full `SchemaEntry` first.
pub fn value_type_of(id_hex: &str) -> Option<ValueType> {
    lookup(id_hex).map(|e| e.value_type)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ebml_header_is_known() {
        let entry = lookup("1a45dfa3").unwrap();
        assert_eq!(entry.name, "EBML");
        assert_eq!(entry.value_type, ValueType::Sub);
        assert!(entry.children.contains(&"4282"));
    }

    #[test]
    fn doc_type_is_a_string() {
        let entry = lookup("4282").unwrap();
        assert_eq!(entry.name, "DocType");
        assert_eq!(entry.value_type, ValueType::Str);
    }

    #[test]
    fn unknown_id_is_absent() {
        assert!(lookup("ffffff").is_none());
        assert!(!is_known("ffffff"));
    }

    #[test]
    fn seek_id_is_nested_ebml_id() {
        assert_eq!(lookup("53ab").unwrap().value_type, ValueType::EbmlId);
    }

    #[test]
    fn multiple_flag_on_repeating_siblings() {
        assert!(lookup("a3").unwrap().multiple); // SimpleBlock
        assert!(!lookup("e7").unwrap().multiple); // Timecode
    }
}
