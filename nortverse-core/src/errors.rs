use std::num::ParseIntError;

use reqwest::StatusCode;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("request cancelled")]
    Cancelled,

    #[error("status code error: {0}")]
    Status(StatusCode),

    #[error("flaresolverr error: {0}")]
    FlareSolverr(String),

    #[error("{url} - {source}")]
    Issue { url: String, source: Box<Error> },

    #[error("unable to download {url}: {source}")]
    Page { url: String, source: Box<Error> },

    #[error("downloading image {url}: {source}")]
    Image { url: String, source: Box<Error> },

    #[error("unable to parse shortlink {value}: {source}")]
    Shortlink {
        value: String,
        source: url::ParseError,
    },

    #[error("unable to get issue id from {value}: {source}")]
    IssueId {
        value: String,
        source: ParseIntError,
    },

    #[error("unable to parse date {value}: {source}")]
    Date {
        value: String,
        source: chrono::ParseError,
    },

    #[error("invalid selector {selector}: {message}")]
    Selector { selector: String, message: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("cbz error: {0}")]
    Cbz(#[from] cbz::Error),

    #[error("reqwest error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("url parse error: {0}")]
    UrlParse(#[from] url::ParseError),
}

impl Error {
    pub(crate) fn issue(url: impl Into<String>, source: Error) -> Self {
        Self::Issue {
            url: url.into(),
            source: Box::new(source),
        }
    }

    pub(crate) fn page(url: impl Into<String>, source: Error) -> Self {
        Self::Page {
            url: url.into(),
            source: Box::new(source),
        }
    }

    pub(crate) fn image(url: impl Into<String>, source: Error) -> Self {
        Self::Image {
            url: url.into(),
            source: Box::new(source),
        }
    }

    /// Whether the error comes from a cancelled token, possibly wrapped
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        match self {
            Self::Cancelled => true,
            Self::Issue { source, .. } | Self::Page { source, .. } | Self::Image { source, .. } => {
                source.is_cancelled()
            }
            _ => false,
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
