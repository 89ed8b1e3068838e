//! Operations submitted to, and completions reaped from, a [`Queue`].
//!
//! [`Queue`]: crate::Queue

use std::net::SocketAddrV4;
use std::os::fd::RawFd;
use std::time::Duration;

use crate::{Interest, Token};

/// What an [`Operation`] asks the kernel to do.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Opcode {
    /// `connect(2)` the descriptor to an address.
    Connect { fd: RawFd, addr: SocketAddrV4 },
    /// Watch the descriptor for readiness, one shot.
    Poll { fd: RawFd, interest: Interest },
    /// Time out the operation this one is linked behind.
    LinkTimeout { timeout: Duration },
}

/// One asynchronous request.
///
/// # Notes
///
/// A link flag only takes effect when another operation is pushed after this
/// one and both are submitted in the same batch. The pair then forms a chain:
/// if the first fails or is cancelled the second is affected, and a
/// link-timeout cancels the operation in front of it when it fires first.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Operation {
    opcode: Opcode,
    token: Token,
    linked: bool,
}

impl Operation {
    /// Asynchronous connect of `fd` to `addr`.
    pub fn connect(fd: RawFd, addr: SocketAddrV4, token: Token) -> Operation {
        Operation::new(Opcode::Connect { fd, addr }, token)
    }

    /// One-shot readiness watch of `fd`.
    pub fn poll(fd: RawFd, interest: Interest, token: Token) -> Operation {
        Operation::new(Opcode::Poll { fd, interest }, token)
    }

    /// Timeout for the previously pushed, linked, operation.
    pub fn link_timeout(timeout: Duration, token: Token) -> Operation {
        Operation::new(Opcode::LinkTimeout { timeout }, token)
    }

    fn new(opcode: Opcode, token: Token) -> Operation {
        Operation {
            opcode,
            token,
            linked: false,
        }
    }

    /// Chain this operation to the next one pushed.
    pub fn linked(mut self) -> Operation {
        self.linked = true;
        self
    }

    pub fn opcode(&self) -> Opcode {
        self.opcode
    }

    pub fn token(&self) -> Token {
        self.token
    }

    pub fn is_linked(&self) -> bool {
        self.linked
    }
}

/// The result of one completed [`Operation`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Completion {
    token: Token,
    result: i32,
}

impl Completion {
    pub fn new(token: Token, result: i32) -> Completion {
        Completion { token, result }
    }

    /// Token of the operation this completes.
    pub fn token(&self) -> Token {
        self.token
    }

    /// Raw result: zero or positive on success, a negated errno on failure.
    pub fn result(&self) -> i32 {
        self.result
    }

    /// Returns true if the result carries an error code.
    pub fn is_error(&self) -> bool {
        self.result < 0
    }
}
