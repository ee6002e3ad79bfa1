use std::io;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("endpoint returned HTTP {code} for {url}")]
    Endpoint { code: u16, url: String },

    #[error("stream incomplete: expected {expected} bytes, read {read}")]
    IncompleteStream { expected: u64, read: u64 },

    #[error("invalid range header: {0}")]
    InvalidRange(String),

    #[error("invalid query: {0}")]
    InvalidQuery(String),

    #[error("malformed ticket: {0}")]
    MalformedTicket(#[from] serde_json::Error),

    #[error("invalid url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("invalid data URI: {0}")]
    InvalidDataUri(String),

    #[error("invalid configuration: {0}")]
    Config(#[from] serde_yaml::Error),

    #[error("transport error: {0}")]
    Transport(#[from] Box<ureq::Error>),

    #[error("io error: {0}")]
    Io(io::Error),
}

impl Error {
    /// Carry this error across a `std::io::Read` boundary. The original
    /// kind can be recovered on the other side via `From<io::Error>`.
    pub(crate) fn into_io(self) -> io::Error {
        match self {
            Error::Io(e) => e,
            Error::IncompleteStream { .. } => io::Error::new(io::ErrorKind::UnexpectedEof, self),
            other => io::Error::other(other),
        }
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        // Recover a crate error smuggled through the Read trait.
        if e.get_ref().is_some_and(|inner| inner.is::<Error>()) {
            match e.into_inner().map(|inner| inner.downcast::<Error>()) {
                Some(Ok(err)) => *err,
                _ => unreachable!("downcast checked above"),
            }
        } else {
            Error::Io(e)
        }
    }
}

impl From<ureq::Error> for Error {
    fn from(e: ureq::Error) -> Self {
        Error::Transport(Box::new(e))
    }
}
