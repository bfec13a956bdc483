use std::fmt;

/// How a fetch ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchStatus {
    /// The server answered with this status code
    Http(u16),

    /// No response: connect, DNS, TLS, timeout, redirect or body error
    Failed(String),
}

impl FetchStatus {
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    pub fn code(&self) -> Option<u16> {
        match self {
            Self::Http(code) => Some(*code),
            Self::Failed(_) => None,
        }
    }
}

/// One completed fetch, in completion order
///
/// The ordinal is the number of fetches completed before this one, so
/// records from one run number `0, 1, 2, ...` in the order the transport
/// finished them, not the order the links were discovered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputRecord {
    pub ordinal: usize,

    /// Effective URL after redirects (the requested URL for failures)
    pub url: String,

    pub status: FetchStatus,
}

impl OutputRecord {
    pub fn new(ordinal: usize, url: impl Into<String>, status: FetchStatus) -> Self {
        Self {
            ordinal,
            url: url.into(),
            status,
        }
    }

    pub fn is_failure(&self) -> bool {
        self.status.is_failure()
    }
}

/// Formats the line written for this record
///
/// Responses render as `[<ordinal>]: <url>`, failures as
/// `[<ordinal>] Connection failure: <url>`.
impl fmt::Display for OutputRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            FetchStatus::Http(_) => write!(f, "[{}]: {}", self.ordinal, self.url),
            FetchStatus::Failed(_) => {
                write!(f, "[{}] Connection failure: {}", self.ordinal, self.url)
            }
        }
    }
}
