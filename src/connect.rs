//! Asynchronous connect with a readiness fallback.
//!
//! A connect submitted to the queue is not guaranteed to finish
//! synchronously, not even for a loopback address. When its completion
//! reports `EINPROGRESS` the socket is watched for writability, hangup or
//! error and the final result is read from the pending socket error.
//! Both paths end in a single [`Resolution`].

use std::net::SocketAddrV4;
use std::os::fd::AsRawFd;

use log::{debug, trace};

use crate::op::Operation;
use crate::queue::submit_one;
use crate::sys::Socket;
use crate::{poll, Error, Interest, Queue, Readiness, Result, Token};

/// Readiness that ends an in-progress connect.
pub const CONNECT_READINESS: Interest =
    Interest::WRITABLE.add(Interest::HUP).add(Interest::ERROR);

/// State of one connection attempt.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Attempt {
    /// Connect pushed, completion not yet seen.
    Submitted,
    /// The completion reported `EINPROGRESS`.
    InProgress,
    /// A readiness watch was pushed for the socket.
    AwaitingReadiness,
    /// Final code, zero or a negated errno.
    Resolved(i32),
}

impl Attempt {
    /// Advance on the connect's completion result.
    fn on_connect(self, result: i32) -> Attempt {
        debug_assert_eq!(self, Attempt::Submitted);
        if result == -libc::EINPROGRESS {
            Attempt::InProgress
        } else {
            Attempt::Resolved(result)
        }
    }
}

/// How a connect reached its final code.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Resolution {
    /// The connect completion carried the final code.
    Immediate(i32),
    /// The connect was in progress; the code was read after `readiness`.
    Awaited { readiness: Readiness, code: i32 },
}

impl Resolution {
    /// Final code: zero on success, a negated errno otherwise.
    pub fn code(&self) -> i32 {
        match *self {
            Resolution::Immediate(code) => code,
            Resolution::Awaited { code, .. } => code,
        }
    }

    pub fn outcome(&self) -> Outcome {
        Outcome::classify(self.code())
    }
}

/// Classification of a resolved connect.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    Connected,
    /// Nothing is listening on the address.
    Refused,
    /// The queue does not implement asynchronous connect.
    Unsupported,
    Failed(i32),
}

impl Outcome {
    pub fn classify(code: i32) -> Outcome {
        match code.wrapping_neg() {
            0 => Outcome::Connected,
            libc::ECONNREFUSED => Outcome::Refused,
            libc::EINVAL | libc::EBADF | libc::EOPNOTSUPP => Outcome::Unsupported,
            _ => Outcome::Failed(code),
        }
    }
}

/// Prepare `socket` for connecting to the fixed address: enable
/// `SO_REUSEPORT` and `SO_REUSEADDR`.
pub fn configure(socket: &Socket) -> Result<()> {
    socket
        .set_reuse_port(true)
        .map_err(Error::setup("setsockopt(SO_REUSEPORT)"))?;
    socket
        .set_reuse_addr(true)
        .map_err(Error::setup("setsockopt(SO_REUSEADDR)"))?;
    Ok(())
}

/// Connect `socket` to `addr` through `queue`.
pub fn connect<Q>(queue: &mut Q, socket: &Socket, addr: SocketAddrV4) -> Result<Resolution>
where
    Q: Queue + ?Sized,
{
    configure(socket)?;

    let fd = socket.as_raw_fd();
    queue.push(Operation::connect(fd, addr, Token::CONNECT))?;
    let mut attempt = Attempt::Submitted;

    let completion = submit_one(queue)?;
    if completion.token() != Token::CONNECT {
        return Err(Error::UnexpectedCompletion {
            token: completion.token(),
            result: completion.result(),
        });
    }
    attempt = attempt.on_connect(completion.result());
    trace!("connect to {}: {:?}", addr, attempt);

    if let Attempt::Resolved(code) = attempt {
        return Ok(Resolution::Immediate(code));
    }

    attempt = Attempt::AwaitingReadiness;
    trace!("connect to {}: {:?}", addr, attempt);
    let readiness = poll::wait_for(queue, fd, CONNECT_READINESS)?;
    if !readiness.intersects(CONNECT_READINESS) {
        return Err(Error::InvalidReadiness(readiness.as_raw()));
    }

    // `SO_ERROR` holds a positive errno, completions a negative one.
    let code = -socket
        .take_error()
        .map_err(Error::setup("getsockopt(SO_ERROR)"))?;
    debug!("connect to {} resolved after {:?}: {}", addr, readiness, code);
    Ok(Resolution::Awaited { readiness, code })
}
