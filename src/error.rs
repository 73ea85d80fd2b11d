/// Error types for this crate.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The underlying byte source failed (read, seek, open, close) for a
    /// reason other than running past the end of the stream.
    #[error("I/O error: {0}")]
    Io(std::io::Error),

    /// A structural read ran past the end of the stream.
    #[error("end of stream")]
    EndOfStream,

    /// First byte of a VINT was `0x00`: a width of more than 8 bytes was implied.
    #[error("invalid variable-length integer encoding, leading byte 0x00")]
    InvalidVInt,

    /// A float element declared a width other than 4 or 8 bytes.
    #[error("invalid float width {0}, expected 4 or 8")]
    InvalidFloatWidth(u64),

    /// An element's content was not valid UTF-8.
    #[error("invalid UTF-8 in string element {0}")]
    InvalidUtf8(String),

    /// A child's `full_len` would drive a container's `remaining_len` negative.
    #[error("child element overruns the byte budget of parent {0}")]
    BudgetOverrun(String),

    /// `seek` left the source at a position other than the one requested.
    #[error("seek landed at an unexpected position")]
    SeekInconsistent,

    /// The reader backing this element has been closed.
    #[error("reader gone: the owning Reader has been closed")]
    ReaderGone,

    /// `skip` was called after the source position had already moved past `data_pos`.
    #[error("skip called after the element's data position had already been read past")]
    SkipTooLate,

    /// An element declared an "unknown size" VINT (`0xFF` all-ones payload); out of scope.
    #[error("unknown-size element encountered, ID: {0}")]
    UnknownSizeUnsupported(String),

    /// A schema entry named a `value_type` the Element Reader does not recognize.
    #[error("schema/implementation mismatch: unrecognized value type for element {0}")]
    UnrecognizedValueType(String),
}

/// Result type for this crate.
pub type Result<T> = std::result::Result<T, Error>;

impl From<std::io::Error> for Error {
    /// A short read that ran past the end of the stream is a distinguishable,
    /// non-fatal sentinel (§7); every other I/O failure stays `Error::Io`.
    fn from(err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::UnexpectedEof {
            Error::EndOfStream
        } else {
            Error::Io(err)
        }
    }
}
