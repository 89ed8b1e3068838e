use std::io;

use thiserror::Error;

use crate::Token;

/// Result type used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned while driving a connect scenario.
///
/// Every variant is terminal for the run: none of them are retried and the
/// binary exits with a non-zero status when one reaches `main`. An
/// unsupported async connect is *not* an error, see
/// [`Outcome::Unsupported`](crate::connect::Outcome::Unsupported).
#[derive(Debug, Error)]
pub enum Error {
    /// `socket(2)` failed.
    #[error("unable to create socket: {0}")]
    SocketCreate(#[source] io::Error),
    /// A socket setup call (`bind`, `listen`, `setsockopt`, ...) failed.
    #[error("{op}: {source}")]
    Setup {
        op: &'static str,
        #[source]
        source: io::Error,
    },
    /// The completion queue could not be created.
    #[error("unable to set up completion queue: {0}")]
    QueueInit(#[source] io::Error),
    /// Submitting to, or waiting on, the completion queue failed.
    #[error("completion queue: {0}")]
    Queue(#[from] io::Error),
    /// No submission slot could be obtained.
    #[error("unable to get a submission slot")]
    SubmissionFull,
    /// Fewer operations were handed to the kernel than were pushed.
    #[error("submitted {submitted} operations, wanted {wanted}")]
    ShortSubmit { submitted: usize, wanted: usize },
    /// A completion arrived that nobody was waiting for.
    #[error("unexpected completion for {token:?} with result {result}")]
    UnexpectedCompletion { token: Token, result: i32 },
    /// The readiness watch completed with an error.
    #[error("poll failed with {0}")]
    PollFailed(i32),
    /// The readiness watch completed without write, hangup or error set.
    #[error("poll returned invalid readiness {0:#x}")]
    InvalidReadiness(u32),
    /// A connect resolved to a code the scenario does not accept.
    #[error("{scenario}: connect failed with {code}")]
    UnexpectedResolution { scenario: &'static str, code: i32 },
    /// One half of a linked connect/timeout pair resolved to the wrong code.
    #[error("completion {token:?} resolved to {got}, wanted {wanted}")]
    LinkCancellationMismatch { token: Token, got: i32, wanted: i32 },
    /// Invalid configuration value.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl Error {
    pub(crate) fn setup(op: &'static str) -> impl FnOnce(io::Error) -> Error {
        move |source| Error::Setup { op, source }
    }
}
