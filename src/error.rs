use std::fmt;

#[derive(Debug)]
pub enum Error {
    Io(std::io::Error),
    InvalidDocx(String),
    Xml(roxmltree::Error),
    Zip(zip::result::ZipError),
    /// Template missing, unreadable as a document, or without a table.
    Template(String),
    /// Generation was asked to build a report with no photos.
    EmptyReport,
    /// A photo could not be decoded or re-encoded.
    Image {
        filename: String,
        source: image::ImageError,
    },
    Generation(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(e) => write!(f, "I/O error: {e}"),
            Error::InvalidDocx(msg) => write!(f, "invalid DOCX: {msg}"),
            Error::Xml(e) => write!(f, "XML parse error: {e}"),
            Error::Zip(e) => write!(f, "ZIP error: {e}"),
            Error::Template(msg) => write!(f, "template error: {msg}"),
            Error::EmptyReport => write!(f, "no photos to place in the report"),
            Error::Image { filename, source } => {
                write!(f, "failed to process photo '{filename}': {source}")
            }
            Error::Generation(msg) => write!(f, "report generation failed: {msg}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            Error::Xml(e) => Some(e),
            Error::Zip(e) => Some(e),
            Error::Image { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}

impl From<roxmltree::Error> for Error {
    fn from(e: roxmltree::Error) -> Self {
        Error::Xml(e)
    }
}

impl From<zip::result::ZipError> for Error {
    fn from(e: zip::result::ZipError) -> Self {
        Error::Zip(e)
    }
}
