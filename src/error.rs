//! Structured error types for officeview.
//!
//! Only container and top-level part failures surface here. Anything that
//! goes wrong inside a style table, theme or merge list degrades instead.

/// All errors that can abort a conversion.
#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    /// XML parsing error from quick-xml.
    #[error("XML parsing: {0}")]
    Xml(#[from] quick_xml::Error),

    /// ZIP archive error.
    #[error("ZIP archive: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A part the document cannot be read without is absent or unreadable.
    #[error("Missing part: {0}")]
    MissingPart(String),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ConvertError>;
