//! A connect chained to a timeout that cancels it.
//!
//! The connect is pushed with the link flag set and a link-timeout right
//! behind it, and both go to the kernel in one batch. If the timer fires
//! before the connect finishes the kernel cancels the connect, so the pair
//! completes as `-ECANCELED` for the connect and `-ETIME` for the timeout.
//! The order in which those two completions arrive is not defined.

use std::net::SocketAddrV4;
use std::os::fd::AsRawFd;
use std::time::Duration;

use log::{debug, trace};

use crate::op::{Completion, Operation};
use crate::sys::Socket;
use crate::{Error, Queue, Result, Token};

/// Expected disposition of one half of the pair.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Expect {
    /// Cancelled because the timeout behind it fired (`-ECANCELED`).
    Canceled,
    /// The timer ran out (`-ETIME`).
    TimerExpired,
}

impl Expect {
    /// Completion result this disposition corresponds to.
    pub fn code(self) -> i32 {
        match self {
            Expect::Canceled => -libc::ECANCELED,
            Expect::TimerExpired => -libc::ETIME,
        }
    }
}

#[derive(Debug)]
struct Slot {
    token: Token,
    expect: Expect,
    seen: bool,
}

/// Correlation table for a submitted connect/timeout pair.
///
/// Completions are matched by token, never by arrival order.
#[derive(Debug)]
pub struct TimeoutLink {
    slots: [Slot; 2],
}

impl TimeoutLink {
    /// Push a linked connect of `socket` to `addr` followed by a `timeout`
    /// and submit both in one batch.
    pub fn submit<Q>(
        queue: &mut Q,
        socket: &Socket,
        addr: SocketAddrV4,
        timeout: Duration,
    ) -> Result<TimeoutLink>
    where
        Q: Queue + ?Sized,
    {
        let connect = Operation::connect(socket.as_raw_fd(), addr, Token::CONNECT).linked();
        let timer = Operation::link_timeout(timeout, Token::TIMEOUT);
        queue.push(connect)?;
        queue.push(timer)?;

        let submitted = queue.submit()?;
        if submitted != 2 {
            return Err(Error::ShortSubmit {
                submitted,
                wanted: 2,
            });
        }
        debug!("submitted connect to {} linked to {:?} timeout", addr, timeout);

        Ok(TimeoutLink::new(Token::CONNECT, Token::TIMEOUT))
    }

    fn new(connect: Token, timeout: Token) -> TimeoutLink {
        TimeoutLink {
            slots: [
                Slot {
                    token: connect,
                    expect: Expect::Canceled,
                    seen: false,
                },
                Slot {
                    token: timeout,
                    expect: Expect::TimerExpired,
                    seen: false,
                },
            ],
        }
    }

    /// Check one completion against the table.
    pub fn check(&mut self, completion: Completion) -> Result<()> {
        let token = completion.token();
        let slot = self
            .slots
            .iter_mut()
            .find(|slot| slot.token == token && !slot.seen)
            .ok_or(Error::UnexpectedCompletion {
                token,
                result: completion.result(),
            })?;
        slot.seen = true;

        let wanted = slot.expect.code();
        if completion.result() != wanted {
            return Err(Error::LinkCancellationMismatch {
                token,
                got: completion.result(),
                wanted,
            });
        }
        trace!("{:?} resolved as {:?}", token, slot.expect);
        Ok(())
    }

    /// Returns true once both completions have been checked.
    pub fn is_complete(&self) -> bool {
        self.slots.iter().all(|slot| slot.seen)
    }

    /// Wait for both completions and check them.
    pub fn verify<Q>(mut self, queue: &mut Q) -> Result<()>
    where
        Q: Queue + ?Sized,
    {
        while !self.is_complete() {
            let completion = queue.reap()?;
            self.check(completion)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::net::Ipv4Addr;

    use super::*;
    use crate::op::Opcode;
    use crate::queue::Scripted;

    const TIMEOUT: Duration = Duration::from_nanos(100_000);

    fn addr() -> SocketAddrV4 {
        SocketAddrV4::new(Ipv4Addr::LOCALHOST, 4660)
    }

    fn cancelled_pair() -> Scripted {
        Scripted::new()
            .on(Token::CONNECT, -libc::ECANCELED)
            .on(Token::TIMEOUT, -libc::ETIME)
    }

    #[test]
    fn submits_linked_pair_in_one_batch() {
        let socket = Socket::stream_v4().unwrap();
        let mut queue = cancelled_pair();

        let link = TimeoutLink::submit(&mut queue, &socket, addr(), TIMEOUT).unwrap();
        match queue.submitted() {
            [connect, timer] => {
                assert_eq!(connect.token(), Token::CONNECT);
                assert!(connect.is_linked());
                assert!(matches!(connect.opcode(), Opcode::Connect { .. }));
                assert_eq!(timer.token(), Token::TIMEOUT);
                assert!(!timer.is_linked());
                assert_eq!(timer.opcode(), Opcode::LinkTimeout { timeout: TIMEOUT });
            }
            ops => panic!("unexpected submissions: {:?}", ops),
        }

        link.verify(&mut queue).unwrap();
        assert_eq!(queue.consumed(), 2);
    }

    #[test]
    fn completion_order_does_not_matter() {
        let socket = Socket::stream_v4().unwrap();
        let mut queue = cancelled_pair().reversed();

        let link = TimeoutLink::submit(&mut queue, &socket, addr(), TIMEOUT).unwrap();
        assert_eq!(queue.peek().map(|c| c.token()), Some(Token::TIMEOUT));
        link.verify(&mut queue).unwrap();
    }

    #[test]
    fn connect_winning_the_race() {
        let socket = Socket::stream_v4().unwrap();
        let mut queue = Scripted::new()
            .on(Token::CONNECT, 0)
            .on(Token::TIMEOUT, -libc::ECANCELED);

        let link = TimeoutLink::submit(&mut queue, &socket, addr(), TIMEOUT).unwrap();
        match link.verify(&mut queue) {
            Err(Error::LinkCancellationMismatch { token, got, wanted }) => {
                assert_eq!(token, Token::CONNECT);
                assert_eq!(got, 0);
                assert_eq!(wanted, -libc::ECANCELED);
            }
            res => panic!("unexpected result: {:?}", res),
        }
    }

    #[test]
    fn timer_not_expired() {
        let mut link = TimeoutLink::new(Token::CONNECT, Token::TIMEOUT);
        link.check(Completion::new(Token::CONNECT, -libc::ECANCELED))
            .unwrap();
        assert!(!link.is_complete());
        assert!(matches!(
            link.check(Completion::new(Token::TIMEOUT, 0)),
            Err(Error::LinkCancellationMismatch { token, .. }) if token == Token::TIMEOUT
        ));
    }

    #[test]
    fn duplicate_and_unknown_completions() {
        let mut link = TimeoutLink::new(Token::CONNECT, Token::TIMEOUT);
        link.check(Completion::new(Token::TIMEOUT, -libc::ETIME))
            .unwrap();
        assert!(matches!(
            link.check(Completion::new(Token::TIMEOUT, -libc::ETIME)),
            Err(Error::UnexpectedCompletion { .. })
        ));
        assert!(matches!(
            link.check(Completion::new(Token(99), 0)),
            Err(Error::UnexpectedCompletion { token: Token(99), .. })
        ));
        assert!(!link.is_complete());
    }

    #[test]
    fn second_slot_unavailable() {
        let socket = Socket::stream_v4().unwrap();
        let mut queue = cancelled_pair().capacity(1);
        assert!(matches!(
            TimeoutLink::submit(&mut queue, &socket, addr(), TIMEOUT),
            Err(Error::SubmissionFull)
        ));
    }
}
