//! Error types for the recent presentations registry.

/// Error raised by the XML tree adapter.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum TreeError {
    /// XML parsing error.
    #[error("XML parse error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// XML attribute error.
    #[error("XML attribute error: {0}")]
    XmlAttr(#[from] quick_xml::events::attributes::AttrError),

    /// Encoding error during XML parsing.
    #[error("encoding error: {0}")]
    Encoding(#[from] quick_xml::encoding::EncodingError),

    /// The input is XML-like but does not form a single well-formed document.
    #[error("malformed document: {0}")]
    Malformed(String),

    /// I/O error while reading or writing the document.
    #[error("I/O error")]
    Io(#[from] std::io::Error),
}

/// Error from registry operations.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum RegistryError {
    /// The context file content can not be parsed as a registry document.
    #[error("malformed context file")]
    MalformedDocument(#[source] TreeError),

    /// A caller supplied an unusable value.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// I/O error.
    #[error("I/O error")]
    Io(#[from] std::io::Error),

    /// The rewritten context file could not replace the previous one.
    #[error("failed to replace context file")]
    Persist(#[from] tempfile::PersistError),
}

impl From<TreeError> for RegistryError {
    fn from(err: TreeError) -> Self {
        match err {
            TreeError::Io(err) => Self::Io(err),
            other => Self::MalformedDocument(other),
        }
    }
}
