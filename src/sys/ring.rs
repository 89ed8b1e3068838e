use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::io;
use std::time::Duration;

use io_uring::types::{Fd, Timespec};
use io_uring::{opcode, squeue, IoUring};
use log::trace;

use crate::op::{Completion, Opcode, Operation};
use crate::sys::net::socket_addr;
use crate::{Error, Queue, Result, Token};

/// Memory an in-flight operation points into.
///
/// The kernel reads it at some point after submission, so it must stay put
/// until the operation's completion has been consumed.
#[allow(dead_code)] // Only held, never read.
enum Pinned {
    Addr(Box<libc::sockaddr_in>),
    Timespec(Box<Timespec>),
}

/// `Queue` backed by an io_uring instance.
///
/// Completions are moved out of the kernel's completion ring as soon as they
/// are observed and kept in order until [`consume`](Queue::consume)d, at
/// which point any memory pinned for the operation is released.
///
/// Linked operations are held back until the operation closing their chain
/// is pushed, then the whole chain goes into the submission ring at once or
/// not at all.
pub struct Ring {
    // Dropped first, the kernel must be done with `in_flight` memory.
    ring: IoUring,
    in_flight: HashMap<Token, Option<Pinned>>,
    completed: VecDeque<Completion>,
    /// Entries of the open chain, in push order.
    chain: Vec<(Token, squeue::Entry)>,
}

impl Ring {
    /// Create a ring with room for `entries` submissions.
    pub fn new(entries: u32) -> Result<Ring> {
        let ring = IoUring::new(entries).map_err(Error::QueueInit)?;
        Ok(Ring {
            ring,
            in_flight: HashMap::new(),
            completed: VecDeque::new(),
            chain: Vec::new(),
        })
    }

    fn build(op: &Operation) -> (squeue::Entry, Option<Pinned>) {
        let (entry, pinned) = match op.opcode() {
            Opcode::Connect { fd, addr } => {
                let (raw, len) = socket_addr(&addr);
                let raw = Box::new(raw);
                let entry = opcode::Connect::new(
                    Fd(fd),
                    &*raw as *const libc::sockaddr_in as *const libc::sockaddr,
                    len,
                )
                .build();
                (entry, Some(Pinned::Addr(raw)))
            }
            Opcode::Poll { fd, interest } => {
                let entry = opcode::PollAdd::new(Fd(fd), interest.to_poll_mask()).build();
                (entry, None)
            }
            Opcode::LinkTimeout { timeout } => {
                let ts = Box::new(timespec(timeout));
                let entry = opcode::LinkTimeout::new(&*ts as *const Timespec).build();
                (entry, Some(Pinned::Timespec(ts)))
            }
        };

        let entry = entry.user_data(u64::from(op.token()));
        if op.is_linked() {
            (entry.flags(squeue::Flags::IO_LINK), pinned)
        } else {
            (entry, pinned)
        }
    }

    fn free_slots(&mut self) -> usize {
        let submission = self.ring.submission();
        submission.capacity() - submission.len()
    }

    /// Move the held chain into the submission ring, flushing it first if
    /// the chain doesn't fit. The chain is dropped if it still doesn't.
    fn push_chain(&mut self) -> Result<()> {
        let needed = self.chain.len();
        if self.free_slots() < needed {
            self.ring.submit()?;
        }
        if self.free_slots() < needed {
            self.abandon_chain();
            return Err(Error::SubmissionFull);
        }

        let entries: Vec<squeue::Entry> =
            self.chain.iter().map(|(_, entry)| entry.clone()).collect();
        // SAFETY: memory referenced by the entries is held in `in_flight`
        // until their completions are consumed. The descriptors are owned by
        // the caller for the lifetime of the operations.
        if unsafe { self.ring.submission().push_multiple(&entries) }.is_err() {
            self.abandon_chain();
            return Err(Error::SubmissionFull);
        }
        self.chain.clear();
        Ok(())
    }

    fn abandon_chain(&mut self) {
        for (token, _) in self.chain.drain(..) {
            self.in_flight.remove(&token);
        }
    }

    /// Move everything the kernel completed into `completed`.
    fn drain_completions(&mut self) {
        for cqe in self.ring.completion() {
            let completion = Completion::new(Token(cqe.user_data()), cqe.result());
            trace!("completion: {:?}", completion);
            self.completed.push_back(completion);
        }
    }
}

fn timespec(timeout: Duration) -> Timespec {
    Timespec::new()
        .sec(timeout.as_secs())
        .nsec(timeout.subsec_nanos())
}

impl Queue for Ring {
    /// Push one operation.
    ///
    /// A linked operation is held until its chain is closed by an unlinked
    /// one. If the closed chain doesn't fit, even after flushing, every
    /// operation of it is dropped and [`Error::SubmissionFull`] returned.
    fn push(&mut self, op: Operation) -> Result<Token> {
        let token = op.token();
        if self.in_flight.contains_key(&token) {
            return Err(Error::Queue(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("{:?} is already in flight", token),
            )));
        }

        let (entry, pinned) = Ring::build(&op);
        self.in_flight.insert(token, pinned);
        self.chain.push((token, entry));
        trace!("pushed {:?}", op);
        if op.is_linked() {
            return Ok(token);
        }
        self.push_chain()?;
        Ok(token)
    }

    /// Submit what is in the submission ring. An open chain stays held.
    fn submit(&mut self) -> Result<usize> {
        Ok(self.ring.submit()?)
    }

    fn submit_and_wait(&mut self, want: usize) -> Result<usize> {
        Ok(self.ring.submit_and_wait(want)?)
    }

    fn wait_one(&mut self) -> Result<Completion> {
        loop {
            if let Some(completion) = self.peek() {
                return Ok(completion);
            }
            self.submit_and_wait(1)?;
        }
    }

    fn peek(&mut self) -> Option<Completion> {
        if self.completed.is_empty() {
            self.drain_completions();
        }
        self.completed.front().copied()
    }

    fn consume(&mut self) {
        if let Some(completion) = self.completed.pop_front() {
            self.in_flight.remove(&completion.token());
        }
    }
}

impl fmt::Debug for Ring {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ring")
            .field("in_flight", &self.in_flight.len())
            .field("completed", &self.completed.len())
            .field("chain", &self.chain.len())
            .finish()
    }
}
